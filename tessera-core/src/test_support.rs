//! Fixtures shared by unit tests, behaviour tests and doctests.
//!
//! Compiled for this crate's own tests and, for downstream test suites,
//! behind the `test-support` feature.
//!
//! Nothing here is meant for production use: the in-memory store scans
//! linearly and the failing device exists only to inject errors.

use std::cell::Cell;
use std::collections::BTreeMap;
use std::io::Cursor;

use image::{ImageFormat, RgbaImage};
use log::info;

use crate::texture::{
    DeviceError, DeviceOperation, ShaderResourceViewDescriptor, SoftwareDevice, SoftwareTexture,
    SoftwareView, SubresourceData, TextureDescriptor, TextureDevice,
};
use crate::{MIN_TILE_BLOB_LEN, MetadataEntry, StoreError, TileBlob, TileKey, TileStore};

/// In-memory [`TileStore`] with the same placeholder rule as the SQLite
/// store.
#[derive(Debug, Clone)]
pub struct MemoryTileStore {
    tables: Vec<String>,
    metadata: Vec<MetadataEntry>,
    tiles: BTreeMap<TileKey, Vec<u8>>,
    min_tile_len: usize,
}

impl Default for MemoryTileStore {
    fn default() -> Self {
        Self {
            tables: vec![String::from("metadata"), String::from("tiles")],
            metadata: Vec::new(),
            tiles: BTreeMap::new(),
            min_tile_len: MIN_TILE_BLOB_LEN,
        }
    }
}

impl MemoryTileStore {
    /// Append a metadata row.
    #[must_use]
    pub fn with_metadata(mut self, entry: MetadataEntry) -> Self {
        self.metadata.push(entry);
        self
    }

    /// Insert or replace the payload for `key`.
    #[must_use]
    pub fn with_tile(mut self, key: TileKey, data: Vec<u8>) -> Self {
        self.tiles.insert(key, data);
        self
    }

    /// Override the placeholder threshold.
    #[must_use]
    pub const fn with_min_tile_len(mut self, min_tile_len: usize) -> Self {
        self.min_tile_len = min_tile_len;
        self
    }
}

impl TileStore for MemoryTileStore {
    fn list_tables(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.tables.clone())
    }

    fn list_metadata(&self) -> Result<Vec<MetadataEntry>, StoreError> {
        for entry in &self.metadata {
            info!("{entry}");
        }
        Ok(self.metadata.clone())
    }

    fn tile_count(&self) -> Result<u64, StoreError> {
        Ok(self.tiles.len() as u64)
    }

    fn get_tile(&self, key: TileKey) -> Result<Option<TileBlob>, StoreError> {
        Ok(self
            .tiles
            .get(&key)
            .map(|data| TileBlob::new(key, data.clone()))
            .filter(|blob| blob.is_plausible(self.min_tile_len)))
    }
}

/// Encode a `width` x `height` PNG of deterministic noise.
///
/// Noise does not compress, so even small images stay above
/// [`MIN_TILE_BLOB_LEN`] once they reach a few dozen pixels.
///
/// # Panics
///
/// Panics if the PNG encoder rejects the image, which only happens for a
/// zero-sized extent.
#[must_use]
#[expect(clippy::expect_used, reason = "fixtures should fail fast during setup")]
pub fn noise_png(width: u32, height: u32) -> Vec<u8> {
    let mut state: u32 = width.wrapping_mul(31).wrapping_add(height);
    let image = RgbaImage::from_fn(width, height, |_, _| {
        let mut channel = || {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            u8::try_from(state >> 24).unwrap_or(u8::MAX)
        };
        image::Rgba([channel(), channel(), channel(), channel()])
    });
    let mut bytes = Cursor::new(Vec::new());
    image
        .write_to(&mut bytes, ImageFormat::Png)
        .expect("encode noise PNG");
    bytes.into_inner()
}

/// Create an MBTiles package at `path` holding `metadata` and `tiles`.
///
/// The schema matches the MBTiles 1.3 layout: a `metadata(name, value)`
/// table and a `tiles(zoom_level, tile_column, tile_row, tile_data)` table
/// with a unique index on the address columns.
///
/// # Errors
///
/// Propagates any `rusqlite` failure.
#[cfg(feature = "store-sqlite")]
pub fn write_mbtiles(
    path: impl AsRef<std::path::Path>,
    metadata: &[MetadataEntry],
    tiles: &[(TileKey, Vec<u8>)],
) -> rusqlite::Result<()> {
    use rusqlite::{Connection, params};

    let mut connection = Connection::open(path)?;
    let tx = connection.transaction()?;
    tx.execute_batch(
        "CREATE TABLE metadata (name TEXT, value TEXT);
         CREATE TABLE tiles (
             zoom_level INTEGER,
             tile_column INTEGER,
             tile_row INTEGER,
             tile_data BLOB
         );
         CREATE UNIQUE INDEX tile_index ON tiles (zoom_level, tile_column, tile_row);",
    )?;
    {
        let mut insert_metadata =
            tx.prepare("INSERT INTO metadata (name, value) VALUES (?1, ?2)")?;
        for entry in metadata {
            insert_metadata.execute(params![entry.name, entry.value])?;
        }
        let mut insert_tile = tx.prepare(
            "INSERT INTO tiles (zoom_level, tile_column, tile_row, tile_data) \
             VALUES (?1, ?2, ?3, ?4)",
        )?;
        for (key, data) in tiles {
            insert_tile.execute(params![key.zoom, key.column, key.row, data])?;
        }
    }
    tx.commit()
}

/// Texture device that refuses one kind of call.
///
/// Calls before the failing one are forwarded to a [`SoftwareDevice`], so
/// allocations can still be observed through [`FailingDevice::live_textures`].
#[derive(Debug)]
pub struct FailingDevice {
    inner: SoftwareDevice,
    fail_on: DeviceOperation,
    calls: Cell<usize>,
}

impl FailingDevice {
    fn failing(fail_on: DeviceOperation) -> Self {
        Self {
            inner: SoftwareDevice::new(),
            fail_on,
            calls: Cell::new(0),
        }
    }

    /// Device whose texture creation fails.
    #[must_use]
    pub fn texture() -> Self {
        Self::failing(DeviceOperation::CreateTexture)
    }

    /// Device whose view creation fails.
    #[must_use]
    pub fn view() -> Self {
        Self::failing(DeviceOperation::CreateShaderResourceView)
    }

    /// Number of device calls attempted so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    /// Textures still allocated on the forwarding device.
    #[must_use]
    pub fn live_textures(&self) -> usize {
        self.inner.live_textures()
    }

    fn attempt(&self, operation: DeviceOperation) -> Result<(), DeviceError> {
        self.calls.set(self.calls.get() + 1);
        if operation == self.fail_on {
            return Err(DeviceError::new(operation, "injected failure"));
        }
        Ok(())
    }
}

impl TextureDevice for FailingDevice {
    type Texture = SoftwareTexture;
    type View = SoftwareView;

    fn create_texture_2d(
        &self,
        descriptor: &TextureDescriptor,
        initial: &SubresourceData<'_>,
    ) -> Result<SoftwareTexture, DeviceError> {
        self.attempt(DeviceOperation::CreateTexture)?;
        self.inner.create_texture_2d(descriptor, initial)
    }

    fn create_shader_resource_view(
        &self,
        texture: &SoftwareTexture,
        descriptor: &ShaderResourceViewDescriptor,
    ) -> Result<SoftwareView, DeviceError> {
        self.attempt(DeviceOperation::CreateShaderResourceView)?;
        self.inner.create_shader_resource_view(texture, descriptor)
    }
}
