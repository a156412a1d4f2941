//! Tile addressing and raw tile payloads.

use std::fmt;

use thiserror::Error;

/// Blobs at or below this many bytes are placeholder rows, not images.
///
/// Tile packages commonly pad sparse pyramids with tiny filler entries. A
/// blob this small cannot hold a useful raster, so stores report the tile as
/// absent rather than handing it to the decoder.
pub const MIN_TILE_BLOB_LEN: usize = 100;

/// Highest zoom level whose grid still fits `u32` column and row indices.
pub const MAX_ZOOM: u8 = 31;

/// Address of one tile in TMS order (row 0 is the southern-most row).
///
/// MBTiles packages store rows in TMS order. Use [`TileKey::from_xyz`] when
/// the caller thinks in web-map (XYZ) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TileKey {
    /// Zoom level.
    pub zoom: u8,
    /// Tile column (x).
    pub column: u32,
    /// Tile row in TMS order.
    pub row: u32,
}

/// Errors returned by [`TileKey::from_xyz`] and [`TileKey::to_xyz`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TileKeyError {
    /// The zoom level exceeds [`MAX_ZOOM`].
    #[error("zoom level {zoom} exceeds the maximum of {max}", max = MAX_ZOOM)]
    ZoomOutOfRange {
        /// Requested zoom level.
        zoom: u8,
    },
    /// The column or row lies outside the `2^zoom` grid.
    #[error("tile {column}/{row} lies outside the {extent}x{extent} grid at zoom {zoom}")]
    OutsideGrid {
        /// Requested zoom level.
        zoom: u8,
        /// Requested column.
        column: u32,
        /// Requested row.
        row: u32,
        /// Number of tiles per side at this zoom.
        extent: u64,
    },
}

impl TileKey {
    /// Construct a key from TMS coordinates as stored in the package.
    #[must_use]
    pub const fn new(zoom: u8, column: u32, row: u32) -> Self {
        Self { zoom, column, row }
    }

    /// Convert web-map (XYZ, row 0 at the north) coordinates into a TMS key.
    ///
    /// # Examples
    ///
    /// ```
    /// use tessera_core::TileKey;
    ///
    /// # fn main() -> Result<(), tessera_core::TileKeyError> {
    /// let key = TileKey::from_xyz(2, 1, 0)?;
    /// assert_eq!(key, TileKey::new(2, 1, 3));
    /// assert_eq!(key.to_xyz()?, (2, 1, 0));
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_xyz(zoom: u8, x: u32, y: u32) -> Result<Self, TileKeyError> {
        let row = flip_row(zoom, x, y)?;
        Ok(Self::new(zoom, x, row))
    }

    /// Convert this TMS key into web-map (XYZ) coordinates.
    pub fn to_xyz(self) -> Result<(u8, u32, u32), TileKeyError> {
        let y = flip_row(self.zoom, self.column, self.row)?;
        Ok((self.zoom, self.column, y))
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.column, self.row)
    }
}

/// Mirror a row index within the grid at `zoom`; the operation is its own
/// inverse.
fn flip_row(zoom: u8, column: u32, row: u32) -> Result<u32, TileKeyError> {
    if zoom > MAX_ZOOM {
        return Err(TileKeyError::ZoomOutOfRange { zoom });
    }
    let extent = 1_u64 << zoom;
    if u64::from(column) >= extent || u64::from(row) >= extent {
        return Err(TileKeyError::OutsideGrid {
            zoom,
            column,
            row,
            extent,
        });
    }
    let flipped = extent - 1 - u64::from(row);
    u32::try_from(flipped).map_err(|_| TileKeyError::OutsideGrid {
        zoom,
        column,
        row,
        extent,
    })
}

/// Compressed image payload read for a [`TileKey`].
#[derive(Clone, PartialEq, Eq)]
pub struct TileBlob {
    key: TileKey,
    data: Vec<u8>,
}

impl fmt::Debug for TileBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TileBlob")
            .field("key", &self.key)
            .field("len", &self.data.len())
            .finish()
    }
}

impl TileBlob {
    /// Wrap bytes read for `key`.
    #[must_use]
    pub const fn new(key: TileKey, data: Vec<u8>) -> Self {
        Self { key, data }
    }

    /// Key the payload was read for.
    #[must_use]
    pub const fn key(&self) -> TileKey {
        self.key
    }

    /// Raw compressed bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8] {
        self.data.as_slice()
    }

    /// Payload length in bytes.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the payload is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Whether the payload is large enough to be worth decoding.
    #[must_use]
    pub const fn is_plausible(&self, min_len: usize) -> bool {
        self.data.len() > min_len
    }

    /// Consume the blob, returning the raw bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}
