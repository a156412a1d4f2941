//! Core types for reading MBTiles packages and turning tiles into textures.
//!
//! The crate is split along the two responsibilities of a tile viewer:
//!
//! - [`TileStore`] answers read queries against a tile package. The
//!   [`MbtilesStore`] implementation binds one SQLite file.
//! - [`materialize`] decodes a compressed tile image and uploads it through a
//!   caller-supplied [`TextureDevice`].
//!
//! [`load_tile_texture`] chains the two. There is no global state: every
//! store owns its own connection and the device is always passed in.
//!
//! # Examples
//!
//! ```
//! use tessera_core::test_support::{MemoryTileStore, noise_png};
//! use tessera_core::{SoftwareDevice, TileKey, load_tile_texture};
//!
//! # fn main() -> Result<(), tessera_core::TileTextureError> {
//! let key = TileKey::new(3, 4, 2);
//! let store = MemoryTileStore::default().with_tile(key, noise_png(32, 16));
//! let device = SoftwareDevice::new();
//!
//! let texture = load_tile_texture(&store, &device, key)?.expect("tile is present");
//! assert_eq!(texture.dimensions(), (32, 16));
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod bounds;
mod error;
mod loader;
mod metadata;
pub mod store;
#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-support")))]
pub mod test_support;
pub mod texture;
mod tile;

pub use bounds::{Bounds, BoundsParseError};
pub use error::ErrorKind;
pub use loader::{TileTextureError, load_tile_texture, load_tile_texture_or_skip};
pub use metadata::{MetadataEntry, TileFormat, TilesetMetadata};
pub use store::{StoreError, TileStore};
pub use texture::{
    DeviceError, DeviceOperation, MaterializeError, SoftwareDevice, SoftwareView, Texture,
    TextureDevice, materialize,
};
pub use tile::{MAX_ZOOM, MIN_TILE_BLOB_LEN, TileBlob, TileKey, TileKeyError};

#[cfg(feature = "store-sqlite")]
pub use store::{MbtilesStore, OpenMode, StoreOptions};
