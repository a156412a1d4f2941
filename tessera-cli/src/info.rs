//! `info` command: summarise an MBTiles package.

use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use tessera_core::{
    Bounds, MbtilesStore, MetadataEntry, OpenMode, StoreError, StoreOptions, TileStore,
};

use crate::{ARG_MBTILES, CliError, ENV_INFO_MBTILES, require_existing};

/// CLI arguments for the `info` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "info",
    about = "Summarise an MBTiles package",
    long_about = "Print the tables, metadata entries, tile count and bounds \
                 of an MBTiles package. The package is opened read-only."
)]
#[ortho_config(prefix = "TESSERA")]
pub(crate) struct InfoArgs {
    /// Path to the MBTiles package.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) mbtiles: Option<Utf8PathBuf>,
    /// Print the summary as JSON.
    #[arg(long)]
    #[serde(default)]
    pub(crate) json: bool,
}

impl InfoArgs {
    fn into_config(self) -> Result<InfoConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        InfoConfig::try_from(merged)
    }
}

/// Resolved `info` configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct InfoConfig {
    pub(crate) mbtiles: Utf8PathBuf,
    pub(crate) json: bool,
}

impl TryFrom<InfoArgs> for InfoConfig {
    type Error = CliError;

    fn try_from(args: InfoArgs) -> Result<Self, Self::Error> {
        let mbtiles = args.mbtiles.ok_or(CliError::MissingArgument {
            field: ARG_MBTILES,
            env: ENV_INFO_MBTILES,
        })?;
        Ok(Self {
            mbtiles,
            json: args.json,
        })
    }
}

/// Everything `info` reports about a package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct PackageSummary {
    pub(crate) path: Utf8PathBuf,
    pub(crate) tables: Vec<String>,
    pub(crate) tile_count: u64,
    pub(crate) bounds: Option<Bounds>,
    pub(crate) metadata: Vec<MetadataEntry>,
}

impl PackageSummary {
    pub(crate) fn collect<S>(path: &Utf8Path, store: &S) -> Result<Self, StoreError>
    where
        S: TileStore + ?Sized,
    {
        let bounds = match store.bounds() {
            Ok(bounds) => Some(bounds),
            Err(StoreError::MetadataMissing { .. }) => None,
            Err(err) => return Err(err),
        };
        Ok(Self {
            path: path.to_path_buf(),
            tables: store.list_tables()?,
            tile_count: store.tile_count()?,
            bounds,
            metadata: store.list_metadata()?,
        })
    }

    fn write_text(&self, writer: &mut dyn Write) -> std::io::Result<()> {
        writeln!(writer, "package: {}", self.path)?;
        writeln!(writer, "tables: {}", self.tables.join(", "))?;
        writeln!(writer, "tiles: {}", self.tile_count)?;
        match self.bounds {
            Some(Bounds {
                left,
                bottom,
                right,
                top,
            }) => writeln!(writer, "bounds: {left},{bottom},{right},{top}")?,
            None => writeln!(writer, "bounds: (none)")?,
        }
        writeln!(writer, "metadata:")?;
        for entry in &self.metadata {
            writeln!(writer, "  {entry}")?;
        }
        Ok(())
    }
}

pub(crate) fn run_info(args: InfoArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = args.into_config()?;
    run_info_with(&config, writer)
}

pub(crate) fn run_info_with(config: &InfoConfig, writer: &mut dyn Write) -> Result<(), CliError> {
    require_existing(&config.mbtiles, ARG_MBTILES)?;
    let options = StoreOptions {
        mode: OpenMode::ReadOnly,
        ..StoreOptions::default()
    };
    let store = MbtilesStore::open_with_options(&config.mbtiles, options)
        .map_err(|source| CliError::store(&config.mbtiles, source))?;
    let summary = PackageSummary::collect(&config.mbtiles, &store)
        .map_err(|source| CliError::store(&config.mbtiles, source))?;

    if config.json {
        let payload =
            serde_json::to_string_pretty(&summary).map_err(CliError::SerialiseReport)?;
        writeln!(writer, "{payload}").map_err(CliError::WriteStdout)
    } else {
        summary.write_text(writer).map_err(CliError::WriteStdout)
    }
}
