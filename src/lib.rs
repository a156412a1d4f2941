//! Facade crate for reading MBTiles packages and materialising tile textures.
//!
//! This crate re-exports the core types and exposes the SQLite store behind
//! a feature flag.

#![forbid(unsafe_code)]

pub use tessera_core::{
    Bounds, BoundsParseError, DeviceError, DeviceOperation, ErrorKind, MAX_ZOOM,
    MIN_TILE_BLOB_LEN, MaterializeError, MetadataEntry, SoftwareDevice, SoftwareView, StoreError,
    Texture, TextureDevice, TileBlob, TileFormat, TileKey, TileKeyError, TileStore,
    TileTextureError, TilesetMetadata, load_tile_texture, load_tile_texture_or_skip, materialize,
    texture,
};

#[cfg(feature = "store-sqlite")]
pub use tessera_core::{MbtilesStore, OpenMode, StoreOptions};
