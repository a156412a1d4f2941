//! Command-line interface for inspecting MBTiles packages.
//!
//! `tessera info` summarises a package; `tessera tile` loads one tile
//! through the texture pipeline and can export the decoded pixels.
#![forbid(unsafe_code)]

use camino::Utf8Path;
use clap::{Parser, Subcommand};

mod error;
mod info;
mod logging;
mod tile;

pub use error::CliError;
pub use logging::init_logging;

use info::InfoArgs;
use tile::TileArgs;

pub(crate) const ARG_MBTILES: &str = "mbtiles";
pub(crate) const ARG_ZOOM: &str = "zoom";
pub(crate) const ARG_COLUMN: &str = "column";
pub(crate) const ARG_ROW: &str = "row";
pub(crate) const ARG_MIN_TILE_LEN: &str = "min-tile-len";
pub(crate) const ARG_OUTPUT: &str = "output";
pub(crate) const ENV_INFO_MBTILES: &str = "TESSERA_CMDS_INFO_MBTILES";
pub(crate) const ENV_TILE_MBTILES: &str = "TESSERA_CMDS_TILE_MBTILES";
pub(crate) const ENV_TILE_ZOOM: &str = "TESSERA_CMDS_TILE_ZOOM";
pub(crate) const ENV_TILE_COLUMN: &str = "TESSERA_CMDS_TILE_COLUMN";
pub(crate) const ENV_TILE_ROW: &str = "TESSERA_CMDS_TILE_ROW";

/// Run the CLI with the current process arguments and environment.
///
/// # Errors
///
/// Returns [`CliError`] when arguments or configuration are invalid or the
/// selected command fails.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    let mut stdout = std::io::stdout().lock();
    match cli.command {
        Command::Info(args) => info::run_info(args, &mut stdout),
        Command::Tile(args) => tile::run_tile(args, &mut stdout),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "tessera",
    about = "Inspect MBTiles packages and decode their tiles",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Summarise tables, metadata, tile count and bounds.
    Info(InfoArgs),
    /// Load one tile and report the decoded texture.
    Tile(TileArgs),
}

/// Check that `path` names an existing regular file.
pub(crate) fn require_existing(path: &Utf8Path, field: &'static str) -> Result<(), CliError> {
    match tessera_fs::file_is_file(path) {
        Ok(true) => Ok(()),
        Ok(false) => Err(CliError::SourcePathNotFile {
            field,
            path: path.to_path_buf(),
        }),
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
            Err(CliError::MissingSourceFile {
                field,
                path: path.to_path_buf(),
            })
        }
        Err(source) => Err(CliError::InspectSourcePath {
            field,
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests;
