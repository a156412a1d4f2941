//! `tile` command: load one tile through the texture pipeline.

use std::io::{Cursor, Write};

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use image::{ColorType, ImageFormat};
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use tessera_core::{
    MIN_TILE_BLOB_LEN, MbtilesStore, OpenMode, SoftwareDevice, SoftwareView, StoreOptions,
    Texture, TileKey, load_tile_texture,
};

use crate::{
    ARG_COLUMN, ARG_MBTILES, ARG_MIN_TILE_LEN, ARG_OUTPUT, ARG_ROW, ARG_ZOOM, CliError,
    ENV_TILE_COLUMN, ENV_TILE_MBTILES, ENV_TILE_ROW, ENV_TILE_ZOOM, require_existing,
};

/// CLI arguments for the `tile` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "tile",
    about = "Load one tile and report its texture",
    long_about = "Fetch the tile at the given address, decode it and upload \
                 it to a software texture device. Rows are in TMS order \
                 unless --xyz is given. The decoded pixels can be written \
                 out as PNG."
)]
#[ortho_config(prefix = "TESSERA")]
pub(crate) struct TileArgs {
    /// Path to the MBTiles package.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) mbtiles: Option<Utf8PathBuf>,
    /// Zoom level.
    #[arg(long = ARG_ZOOM, value_name = "z")]
    #[serde(default)]
    pub(crate) zoom: Option<u8>,
    /// Tile column.
    #[arg(long = ARG_COLUMN, value_name = "x")]
    #[serde(default)]
    pub(crate) column: Option<u32>,
    /// Tile row.
    #[arg(long = ARG_ROW, value_name = "y")]
    #[serde(default)]
    pub(crate) row: Option<u32>,
    /// Interpret the row as web-map (XYZ) order, row 0 at the north.
    #[arg(long)]
    #[serde(default)]
    pub(crate) xyz: bool,
    /// Blobs with at most this many bytes are treated as missing.
    #[arg(long = ARG_MIN_TILE_LEN, value_name = "bytes")]
    #[serde(default)]
    pub(crate) min_tile_len: Option<usize>,
    /// Write the decoded tile as PNG to this path.
    #[arg(long = ARG_OUTPUT, value_name = "path")]
    #[serde(default)]
    pub(crate) output: Option<Utf8PathBuf>,
}

impl TileArgs {
    fn into_config(self) -> Result<TileConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        TileConfig::try_from(merged)
    }
}

/// Resolved `tile` configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TileConfig {
    pub(crate) mbtiles: Utf8PathBuf,
    /// Address in TMS order.
    pub(crate) key: TileKey,
    pub(crate) min_tile_len: usize,
    pub(crate) output: Option<Utf8PathBuf>,
}

impl TryFrom<TileArgs> for TileConfig {
    type Error = CliError;

    fn try_from(args: TileArgs) -> Result<Self, Self::Error> {
        let mbtiles = args.mbtiles.ok_or(CliError::MissingArgument {
            field: ARG_MBTILES,
            env: ENV_TILE_MBTILES,
        })?;
        let zoom = args.zoom.ok_or(CliError::MissingArgument {
            field: ARG_ZOOM,
            env: ENV_TILE_ZOOM,
        })?;
        let column = args.column.ok_or(CliError::MissingArgument {
            field: ARG_COLUMN,
            env: ENV_TILE_COLUMN,
        })?;
        let row = args.row.ok_or(CliError::MissingArgument {
            field: ARG_ROW,
            env: ENV_TILE_ROW,
        })?;
        let key = if args.xyz {
            TileKey::from_xyz(zoom, column, row)?
        } else {
            TileKey::new(zoom, column, row)
        };
        Ok(Self {
            mbtiles,
            key,
            min_tile_len: args.min_tile_len.unwrap_or(MIN_TILE_BLOB_LEN),
            output: args.output,
        })
    }
}

pub(crate) fn run_tile(args: TileArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = args.into_config()?;
    run_tile_with(&config, writer)
}

pub(crate) fn run_tile_with(config: &TileConfig, writer: &mut dyn Write) -> Result<(), CliError> {
    require_existing(&config.mbtiles, ARG_MBTILES)?;
    let options = StoreOptions {
        mode: OpenMode::ReadOnly,
        min_tile_len: config.min_tile_len,
    };
    let store = MbtilesStore::open_with_options(&config.mbtiles, options)
        .map_err(|source| CliError::store(&config.mbtiles, source))?;
    let device = SoftwareDevice::new();

    let texture =
        load_tile_texture(&store, &device, config.key)?.ok_or_else(|| CliError::TileNotFound {
            key: config.key,
            path: config.mbtiles.clone(),
        })?;
    let (width, height) = texture.dimensions();
    writeln!(writer, "tile {}: {width}x{height} RGBA texture", config.key)
        .map_err(CliError::WriteStdout)?;

    if let Some(output) = &config.output {
        export_png(&texture, output)?;
        writeln!(writer, "wrote {output}").map_err(CliError::WriteStdout)?;
    }
    Ok(())
}

fn export_png(texture: &Texture<SoftwareView>, output: &Utf8Path) -> Result<(), CliError> {
    let view = texture.view();
    let mut bytes = Cursor::new(Vec::new());
    image::write_buffer_with_format(
        &mut bytes,
        view.pixels(),
        view.width(),
        view.height(),
        ColorType::Rgba8,
        ImageFormat::Png,
    )
    .map_err(CliError::EncodePng)?;
    tessera_fs::write_file(output, bytes.get_ref()).map_err(|source| CliError::WriteOutput {
        path: output.to_path_buf(),
        source,
    })?;
    info!("wrote {} bytes to {output}", bytes.get_ref().len());
    Ok(())
}
