//! Name/value metadata describing a whole tileset.

use std::fmt;

use crate::{Bounds, StoreError};

/// Metadata key holding the tileset extent.
pub(crate) const BOUNDS_KEY: &str = "bounds";

/// One row of the metadata relation.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MetadataEntry {
    /// Metadata key.
    pub name: String,
    /// Raw value text.
    pub value: String,
}

impl MetadataEntry {
    /// Construct an entry.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for MetadataEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} | {}", self.name, self.value)
    }
}

/// Image encoding declared by the `format` metadata key.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TileFormat {
    /// PNG raster tiles.
    Png,
    /// JPEG raster tiles.
    Jpeg,
    /// WebP raster tiles.
    Webp,
    /// Gzipped Mapbox vector tiles.
    Pbf,
    /// Anything else, kept verbatim.
    Other(String),
}

impl TileFormat {
    /// Interpret a `format` metadata value.
    #[must_use]
    pub fn from_metadata(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "png" => Self::Png,
            "jpg" | "jpeg" => Self::Jpeg,
            "webp" => Self::Webp,
            "pbf" => Self::Pbf,
            _ => Self::Other(value.to_owned()),
        }
    }

    /// Whether tiles of this format can be decoded into pixels.
    #[must_use]
    pub const fn is_raster(&self) -> bool {
        matches!(self, Self::Png | Self::Jpeg | Self::Webp)
    }
}

/// Snapshot of every metadata entry in a tileset.
///
/// Entries keep store order. Lookups scan linearly; the relation is small.
///
/// # Examples
///
/// ```
/// use tessera_core::{MetadataEntry, TileFormat, TilesetMetadata};
///
/// let metadata = TilesetMetadata::from_entries([
///     MetadataEntry::new("format", "png"),
///     MetadataEntry::new("minzoom", "0"),
///     MetadataEntry::new("maxzoom", "14"),
/// ]);
/// assert_eq!(metadata.format(), Some(TileFormat::Png));
/// assert_eq!(metadata.zoom_range(), Some((0, 14)));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TilesetMetadata {
    entries: Vec<MetadataEntry>,
}

impl TilesetMetadata {
    /// Collect metadata rows.
    #[must_use]
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = MetadataEntry>,
    {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// All entries in store order.
    #[must_use]
    pub const fn entries(&self) -> &[MetadataEntry] {
        self.entries.as_slice()
    }

    /// Whether the tileset declares no metadata at all.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Value of the first entry called `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.value.as_str())
    }

    /// Human-readable tileset name.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.get("name")
    }

    /// Free-form description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.get("description")
    }

    /// Attribution string to show alongside the map.
    #[must_use]
    pub fn attribution(&self) -> Option<&str> {
        self.get("attribution")
    }

    /// Declared tile encoding.
    #[must_use]
    pub fn format(&self) -> Option<TileFormat> {
        self.get("format").map(TileFormat::from_metadata)
    }

    /// Inclusive zoom range, when both ends are present and numeric.
    #[must_use]
    pub fn zoom_range(&self) -> Option<(u8, u8)> {
        let min = self.get("minzoom")?.trim().parse().ok()?;
        let max = self.get("maxzoom")?.trim().parse().ok()?;
        Some((min, max))
    }

    /// Parse the `bounds` entry.
    pub fn bounds(&self) -> Result<Bounds, StoreError> {
        let value = self.get(BOUNDS_KEY).ok_or(StoreError::MetadataMissing {
            name: BOUNDS_KEY,
        })?;
        Ok(value.parse::<Bounds>()?)
    }
}

impl IntoIterator for TilesetMetadata {
    type Item = MetadataEntry;
    type IntoIter = std::vec::IntoIter<MetadataEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
