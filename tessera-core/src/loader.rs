//! Fetch a tile from a store and turn it into a texture in one call.

use log::{debug, warn};
use thiserror::Error;

use crate::{
    ErrorKind, MaterializeError, StoreError, Texture, TextureDevice, TileKey, TileStore,
    materialize,
};

/// Error raised by [`load_tile_texture`].
#[derive(Debug, Error)]
pub enum TileTextureError {
    /// The store lookup failed.
    #[error("failed to read tile {key}: {source}")]
    Store {
        /// Tile being loaded.
        key: TileKey,
        /// Store failure.
        #[source]
        source: StoreError,
    },
    /// The tile bytes could not become a texture.
    #[error("failed to materialize tile {key}: {source}")]
    Materialize {
        /// Tile being loaded.
        key: TileKey,
        /// Materializer failure.
        #[source]
        source: MaterializeError,
    },
}

impl TileTextureError {
    /// Failure category of the underlying error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Store { source, .. } => source.kind(),
            Self::Materialize { source, .. } => source.kind(),
        }
    }

    /// Whether the store behind the lookup is unusable.
    ///
    /// Decode and device failures never are; the next tile may load fine.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        match self {
            Self::Store { source, .. } => source.is_fatal(),
            Self::Materialize { .. } => false,
        }
    }

    /// Tile the failure relates to.
    #[must_use]
    pub const fn key(&self) -> TileKey {
        match self {
            Self::Store { key, .. } | Self::Materialize { key, .. } => *key,
        }
    }
}

/// Look up `key` in `store` and materialize it on `device`.
///
/// Returns `Ok(None)` when the store has no usable tile for `key`; the
/// device is not touched in that case.
///
/// # Errors
///
/// Returns [`TileTextureError::Store`] when the lookup fails and
/// [`TileTextureError::Materialize`] when decoding or upload fails.
pub fn load_tile_texture<S, D>(
    store: &S,
    device: &D,
    key: TileKey,
) -> Result<Option<Texture<D::View>>, TileTextureError>
where
    S: TileStore + ?Sized,
    D: TextureDevice + ?Sized,
{
    let Some(blob) = store
        .get_tile(key)
        .map_err(|source| TileTextureError::Store { key, source })?
    else {
        debug!("tile {key} is absent");
        return Ok(None);
    };
    materialize(device, blob.as_bytes())
        .map(Some)
        .map_err(|source| TileTextureError::Materialize { key, source })
}

/// Like [`load_tile_texture`], but every failure becomes `None`.
///
/// Failures are logged at warn level so a render loop can skip the tile and
/// carry on.
pub fn load_tile_texture_or_skip<S, D>(store: &S, device: &D, key: TileKey) -> Option<Texture<D::View>>
where
    S: TileStore + ?Sized,
    D: TextureDevice + ?Sized,
{
    match load_tile_texture(store, device, key) {
        Ok(texture) => texture,
        Err(err) => {
            warn!("skipping tile {key} ({}): {err}", err.kind());
            None
        }
    }
}
