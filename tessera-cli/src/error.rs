//! Error type emitted by the `tessera` CLI.
//!
//! Store and loader errors are boxed: many helpers return
//! `Result<_, CliError>` and the workspace enables `clippy::result_large_err`.

use std::sync::Arc;

use camino::Utf8PathBuf;
use tessera_core::{StoreError, TileKey, TileKeyError, TileTextureError};
use thiserror::Error;

/// Errors emitted by the `tessera` CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        /// Flag name without leading dashes.
        field: &'static str,
        /// Environment variable that can supply the value.
        env: &'static str,
    },
    /// A referenced input path does not exist.
    #[error("{field} path {path:?} does not exist")]
    MissingSourceFile {
        /// Flag that supplied the path.
        field: &'static str,
        /// Path as given.
        path: Utf8PathBuf,
    },
    /// A referenced input path exists but is not a regular file.
    #[error("{field} path {path:?} is not a file")]
    SourcePathNotFile {
        /// Flag that supplied the path.
        field: &'static str,
        /// Path as given.
        path: Utf8PathBuf,
    },
    /// A referenced input path could not be inspected.
    #[error("failed to inspect {field} path {path:?}: {source}")]
    InspectSourcePath {
        /// Flag that supplied the path.
        field: &'static str,
        /// Path as given.
        path: Utf8PathBuf,
        /// IO failure.
        #[source]
        source: std::io::Error,
    },
    /// The requested coordinates do not address a tile.
    #[error(transparent)]
    InvalidTile(#[from] TileKeyError),
    /// The tile package could not be opened or queried.
    #[error("tile package {path:?}: {source}")]
    Store {
        /// Package path.
        path: Utf8PathBuf,
        /// Store failure.
        #[source]
        source: Box<StoreError>,
    },
    /// The tile could not be turned into a texture.
    #[error(transparent)]
    LoadTile(Box<TileTextureError>),
    /// The package holds no usable tile at the requested address.
    #[error("tile {key} is not present in {path:?}")]
    TileNotFound {
        /// Requested tile (TMS order).
        key: TileKey,
        /// Package path.
        path: Utf8PathBuf,
    },
    /// Encoding the exported PNG failed.
    #[error("failed to encode PNG: {0}")]
    EncodePng(#[source] image::ImageError),
    /// Writing the exported PNG failed.
    #[error("failed to write {path:?}: {source}")]
    WriteOutput {
        /// Destination path.
        path: Utf8PathBuf,
        /// IO failure.
        #[source]
        source: std::io::Error,
    },
    /// Serialising the JSON report failed.
    #[error("failed to serialise report: {0}")]
    SerialiseReport(#[source] serde_json::Error),
    /// Writing to standard output failed.
    #[error("failed to write output: {0}")]
    WriteStdout(#[source] std::io::Error),
}

impl CliError {
    pub(crate) fn store(path: &camino::Utf8Path, source: StoreError) -> Self {
        Self::Store {
            path: path.to_path_buf(),
            source: Box::new(source),
        }
    }
}

impl From<TileTextureError> for CliError {
    fn from(err: TileTextureError) -> Self {
        Self::LoadTile(Box::new(err))
    }
}
