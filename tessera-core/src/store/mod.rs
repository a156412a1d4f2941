//! Read access to tile packages.
//!
//! The `TileStore` trait is the read-only interface over a tile database.
//! `MbtilesStore` binds one MBTiles (SQLite) file; tests use the in-memory
//! `MemoryTileStore` from the `test-support` feature.

#[cfg(feature = "store-sqlite")]
use std::path::PathBuf;

use thiserror::Error;

use crate::metadata::BOUNDS_KEY;
use crate::{Bounds, BoundsParseError, ErrorKind, MetadataEntry, TileBlob, TileKey, TilesetMetadata};

#[cfg(feature = "store-sqlite")]
mod sqlite;

#[cfg(feature = "store-sqlite")]
pub use sqlite::{MbtilesStore, OpenMode, StoreOptions};

/// Error raised by [`TileStore`] operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The database file could not be opened.
    #[cfg(feature = "store-sqlite")]
    #[error("failed to open tile store at {path}: {source}")]
    Open {
        /// Location of the tile package on disk.
        path: PathBuf,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// The database opened but its schema lists no tables.
    #[cfg(feature = "store-sqlite")]
    #[error("no tables found in tile store at {path}")]
    EmptySchema {
        /// Location of the tile package on disk.
        path: PathBuf,
    },
    /// A statement did not compile against the schema.
    #[cfg(feature = "store-sqlite")]
    #[error("failed to prepare `{statement}`: {source}")]
    Prepare {
        /// SQL text that failed to compile.
        statement: &'static str,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// A prepared statement failed while stepping through rows.
    #[cfg(feature = "store-sqlite")]
    #[error("failed to execute `{statement}`: {source}")]
    Query {
        /// SQL text being executed.
        statement: &'static str,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// A required metadata entry does not exist.
    #[error("metadata entry `{name}` is missing")]
    MetadataMissing {
        /// Metadata key that was looked up.
        name: &'static str,
    },
    /// The `bounds` metadata value was malformed.
    #[error("invalid bounds metadata: {0}")]
    BoundsParse(#[from] BoundsParseError),
}

impl StoreError {
    /// Failure category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            #[cfg(feature = "store-sqlite")]
            Self::Open { .. } | Self::EmptySchema { .. } | Self::Query { .. } => {
                ErrorKind::StoreUnavailable
            }
            #[cfg(feature = "store-sqlite")]
            Self::Prepare { .. } => ErrorKind::QueryPrepare,
            Self::MetadataMissing { .. } => ErrorKind::MetadataMissing,
            Self::BoundsParse(_) => ErrorKind::BoundsParse,
        }
    }

    /// Whether the store itself is unusable.
    ///
    /// Only a failed open is fatal. Query, metadata and parse failures are
    /// scoped to the call that raised them, so a renderer can skip the tile
    /// and keep using the store.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        match self {
            #[cfg(feature = "store-sqlite")]
            Self::Open { .. } | Self::EmptySchema { .. } => true,
            _ => false,
        }
    }
}

/// Read-only access to one tile package.
///
/// Implementations answer single-shot point lookups and full scans. Tiles
/// whose payload is too small to be an image are reported as absent rather
/// than as errors, so callers can treat `Ok(None)` uniformly as "skip this
/// tile".
///
/// # Examples
///
/// ```rust
/// use tessera_core::test_support::MemoryTileStore;
/// use tessera_core::{MetadataEntry, TileKey, TileStore};
///
/// let store = MemoryTileStore::default()
///     .with_metadata(MetadataEntry::new("bounds", "-122.5,37.0,-122.0,37.8"));
///
/// let bounds = store.bounds()?;
/// assert_eq!(bounds.left, -122.5);
/// assert!(store.get_tile(TileKey::new(0, 0, 0))?.is_none());
/// # Ok::<(), tessera_core::StoreError>(())
/// ```
pub trait TileStore {
    /// Names of every table in the store, in store-native order.
    fn list_tables(&self) -> Result<Vec<String>, StoreError>;

    /// Every metadata row, in store-native order.
    ///
    /// Implementations emit each pair as a diagnostic log record.
    fn list_metadata(&self) -> Result<Vec<MetadataEntry>, StoreError>;

    /// Value of the metadata entry called `name`, if present.
    fn metadata_value(&self, name: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .list_metadata()?
            .into_iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.value))
    }

    /// Snapshot of the metadata relation with typed accessors.
    fn metadata(&self) -> Result<TilesetMetadata, StoreError> {
        self.list_metadata().map(TilesetMetadata::from_entries)
    }

    /// Parse the `bounds` metadata entry as `left,bottom,right,top`.
    fn bounds(&self) -> Result<Bounds, StoreError> {
        let value = self
            .metadata_value(BOUNDS_KEY)?
            .ok_or(StoreError::MetadataMissing { name: BOUNDS_KEY })?;
        Ok(value.parse::<Bounds>()?)
    }

    /// Number of rows in the tiles relation.
    fn tile_count(&self) -> Result<u64, StoreError>;

    /// Fetch the payload stored for `key`.
    ///
    /// Returns `Ok(None)` when no row matches or when the payload is too
    /// small to be a real image.
    fn get_tile(&self, key: TileKey) -> Result<Option<TileBlob>, StoreError>;
}
