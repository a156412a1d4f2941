//! Fixture packages shared by CLI unit and behaviour tests.

use camino::{Utf8Path, Utf8PathBuf};
use tempfile::TempDir;
use tessera_core::test_support::{noise_png, write_mbtiles};
use tessera_core::{MetadataEntry, TileKey};

/// Tile stored at this TMS address decodes to [`TILE_SIZE`] square.
pub(super) const STORED_TILE: TileKey = TileKey::new(2, 1, 2);
/// 50-byte filler row.
pub(super) const PLACEHOLDER_TILE: TileKey = TileKey::new(2, 3, 3);
pub(super) const TILE_SIZE: u32 = 64;

/// Temporary directory holding fixture packages.
#[derive(Debug)]
pub(super) struct Workspace {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl Workspace {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 workspace");
        Self { _dir: dir, root }
    }

    pub(super) fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Write the standard fixture package and return its path.
    pub(super) fn package(&self) -> Utf8PathBuf {
        let path = self.root.join("fixture.mbtiles");
        write_mbtiles(
            &path,
            &[
                MetadataEntry::new("name", "fixture"),
                MetadataEntry::new("format", "png"),
                MetadataEntry::new("bounds", "-122.5,37.0,-122.0,37.8"),
            ],
            &[
                (STORED_TILE, noise_png(TILE_SIZE, TILE_SIZE)),
                (PLACEHOLDER_TILE, vec![0x11; 50]),
            ],
        )
        .expect("write fixture package");
        path
    }

    /// Package without a `bounds` entry.
    pub(super) fn package_without_bounds(&self) -> Utf8PathBuf {
        let path = self.root.join("unbounded.mbtiles");
        write_mbtiles(&path, &[MetadataEntry::new("name", "unbounded")], &[])
            .expect("write fixture package");
        path
    }
}
