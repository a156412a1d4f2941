//! SQLite-backed store for MBTiles packages.

use std::{
    fmt,
    path::{Path, PathBuf},
};

use log::{debug, info};
use rusqlite::{Connection, OpenFlags, OptionalExtension, Statement, types::ValueRef};

use crate::{MIN_TILE_BLOB_LEN, MetadataEntry, TileBlob, TileKey};

use super::{StoreError, TileStore};

const LIST_TABLES: &str = "SELECT name FROM sqlite_master WHERE type = 'table'";
const LIST_METADATA: &str = "SELECT name, value FROM metadata";
const METADATA_VALUE: &str = "SELECT value FROM metadata WHERE name = ?1";
const TILE_COUNT: &str = "SELECT COUNT(*) FROM tiles";
const TILE_DATA: &str =
    "SELECT tile_data FROM tiles WHERE zoom_level = ?1 AND tile_column = ?2 AND tile_row = ?3";

/// How the database file is opened.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OpenMode {
    /// Open for reading and writing. The file must already exist.
    #[default]
    ReadWrite,
    /// Open for reading only.
    ReadOnly,
}

impl OpenMode {
    fn flags(self) -> OpenFlags {
        let access = match self {
            Self::ReadWrite => OpenFlags::SQLITE_OPEN_READ_WRITE,
            Self::ReadOnly => OpenFlags::SQLITE_OPEN_READ_ONLY,
        };
        access | OpenFlags::SQLITE_OPEN_URI | OpenFlags::SQLITE_OPEN_NO_MUTEX
    }
}

/// Tunables for [`MbtilesStore::open_with_options`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOptions {
    /// Access mode for the connection.
    pub mode: OpenMode,
    /// Blobs with at most this many bytes are reported as absent.
    pub min_tile_len: usize,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            mode: OpenMode::default(),
            min_tile_len: MIN_TILE_BLOB_LEN,
        }
    }
}

/// Tile store bound to a single MBTiles file.
///
/// Each store owns its connection, so several packages can be open at once.
/// The connection is not shared between threads; callers serialise access.
///
/// # Examples
///
/// ```no_run
/// use tessera_core::{MbtilesStore, TileKey, TileStore};
///
/// # fn main() -> Result<(), tessera_core::StoreError> {
/// let store = MbtilesStore::open("bay-area.mbtiles")?;
/// println!("{} tiles", store.tile_count()?);
/// if let Some(blob) = store.get_tile(TileKey::new(12, 655, 2580))? {
///     println!("{} bytes", blob.len());
/// }
/// # Ok(())
/// # }
/// ```
pub struct MbtilesStore {
    connection: Connection,
    path: PathBuf,
    options: StoreOptions,
}

impl fmt::Debug for MbtilesStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MbtilesStore")
            .field("path", &self.path)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl MbtilesStore {
    /// Open an existing tile package for reading and writing.
    pub fn open<P>(path: P) -> Result<Self, StoreError>
    where
        P: AsRef<Path>,
    {
        Self::open_with_options(path, StoreOptions::default())
    }

    /// Open an existing tile package with explicit options.
    ///
    /// Fails when the file is missing, is not a SQLite database, or lists no
    /// tables. The file is never created.
    pub fn open_with_options<P>(path: P, options: StoreOptions) -> Result<Self, StoreError>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let open_failed = |source| StoreError::Open {
            path: path.to_path_buf(),
            source,
        };

        let connection =
            Connection::open_with_flags(path, options.mode.flags()).map_err(open_failed)?;
        // SQLite defers reading the header until the first statement runs,
        // so listing tables doubles as the format check.
        let tables = table_names(&connection).map_err(open_failed)?;
        if tables.is_empty() {
            return Err(StoreError::EmptySchema {
                path: path.to_path_buf(),
            });
        }
        info!(
            "opened tile store {} with tables [{}]",
            path.display(),
            tables.join(", ")
        );

        Ok(Self {
            connection,
            path: path.to_path_buf(),
            options,
        })
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Options the store was opened with.
    #[must_use]
    pub const fn options(&self) -> StoreOptions {
        self.options
    }

    fn prepare(&self, statement: &'static str) -> Result<Statement<'_>, StoreError> {
        self.connection
            .prepare(statement)
            .map_err(|source| StoreError::Prepare { statement, source })
    }
}

fn table_names(connection: &Connection) -> rusqlite::Result<Vec<String>> {
    let mut statement = connection.prepare(LIST_TABLES)?;
    let names = statement.query_map([], |row| row.get(0))?;
    names.collect()
}

/// Render any column value as text, the way `sqlite3_column_text` does.
///
/// Untyped metadata tables often hold numbers such as `maxzoom`; NULL reads
/// as the empty string.
fn value_text(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => String::new(),
        ValueRef::Integer(number) => number.to_string(),
        ValueRef::Real(number) => number.to_string(),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            String::from_utf8_lossy(bytes).into_owned()
        }
    }
}

/// Raw bytes of a tile payload, the way `sqlite3_column_blob` reads them.
fn value_bytes(value: ValueRef<'_>) -> Vec<u8> {
    match value {
        ValueRef::Null => Vec::new(),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => bytes.to_vec(),
        ValueRef::Integer(_) | ValueRef::Real(_) => value_text(value).into_bytes(),
    }
}

fn query_failed(statement: &'static str) -> impl FnOnce(rusqlite::Error) -> StoreError {
    move |source| StoreError::Query { statement, source }
}

impl TileStore for MbtilesStore {
    fn list_tables(&self) -> Result<Vec<String>, StoreError> {
        let mut statement = self.prepare(LIST_TABLES)?;
        let names = statement
            .query_map([], |row| row.get(0))
            .map_err(query_failed(LIST_TABLES))?;
        names
            .collect::<rusqlite::Result<Vec<String>>>()
            .map_err(query_failed(LIST_TABLES))
    }

    fn list_metadata(&self) -> Result<Vec<MetadataEntry>, StoreError> {
        let mut statement = self.prepare(LIST_METADATA)?;
        let mut rows = statement.query([]).map_err(query_failed(LIST_METADATA))?;
        let mut entries = Vec::new();

        while let Some(row) = rows.next().map_err(query_failed(LIST_METADATA))? {
            let name = row.get_ref(0).map_err(query_failed(LIST_METADATA))?;
            let value = row.get_ref(1).map_err(query_failed(LIST_METADATA))?;
            let entry = MetadataEntry::new(value_text(name), value_text(value));
            info!("{entry}");
            entries.push(entry);
        }

        Ok(entries)
    }

    fn metadata_value(&self, name: &str) -> Result<Option<String>, StoreError> {
        let mut statement = self.prepare(METADATA_VALUE)?;
        statement
            .query_row([name], |row| row.get_ref(0).map(value_text))
            .optional()
            .map_err(query_failed(METADATA_VALUE))
    }

    fn tile_count(&self) -> Result<u64, StoreError> {
        let mut statement = self.prepare(TILE_COUNT)?;
        let count: i64 = statement
            .query_row([], |row| row.get(0))
            .map_err(query_failed(TILE_COUNT))?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    fn get_tile(&self, key: TileKey) -> Result<Option<TileBlob>, StoreError> {
        let mut statement = self.prepare(TILE_DATA)?;
        let data = statement
            .query_row((key.zoom, key.column, key.row), |row| {
                row.get_ref(0).map(value_bytes)
            })
            .optional()
            .map_err(query_failed(TILE_DATA))?;

        let Some(data) = data else {
            debug!("tile {key} not found");
            return Ok(None);
        };
        let blob = TileBlob::new(key, data);
        debug!("tile {key}: blob is {} bytes", blob.len());

        if blob.is_plausible(self.options.min_tile_len) {
            Ok(Some(blob))
        } else {
            debug!(
                "tile {key}: {} bytes is at or below the {} byte placeholder threshold",
                blob.len(),
                self.options.min_tile_len
            );
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use crate::test_support::{noise_png, write_mbtiles};
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        path: PathBuf,
        tile: (TileKey, Vec<u8>),
    }

    #[fixture]
    fn temp_dir() -> TempDir {
        TempDir::new().expect("create temp dir")
    }

    #[fixture]
    fn package(temp_dir: TempDir) -> Fixture {
        let path = temp_dir.path().join("tiles.mbtiles");
        let tile = (TileKey::new(1, 0, 1), noise_png(8, 8));
        let metadata = [
            MetadataEntry::new("name", "fixture"),
            MetadataEntry::new("format", "png"),
            MetadataEntry::new("bounds", "-122.5,37.0,-122.0,37.8"),
        ];
        let tiles = [
            tile.clone(),
            (TileKey::new(1, 1, 1), vec![0x2a; 50]),
            (TileKey::new(0, 0, 0), noise_png(16, 16)),
        ];
        write_mbtiles(&path, &metadata, &tiles).expect("write fixture package");
        Fixture {
            _dir: temp_dir,
            path,
            tile,
        }
    }

    #[rstest]
    fn open_fails_for_missing_file(temp_dir: TempDir) {
        let path = temp_dir.path().join("absent.mbtiles");
        let err = MbtilesStore::open(&path).expect_err("missing file should fail");
        assert!(matches!(err, StoreError::Open { .. }));
        assert_eq!(err.kind(), ErrorKind::StoreUnavailable);
        assert!(err.is_fatal());
        assert!(!path.exists(), "open must not create the file");
    }

    #[rstest]
    fn open_fails_for_non_database_file(temp_dir: TempDir) {
        let path = temp_dir.path().join("garbage.mbtiles");
        std::fs::write(&path, vec![0xa5; 4096]).expect("write garbage");
        let err = MbtilesStore::open(&path).expect_err("garbage should fail");
        assert_eq!(err.kind(), ErrorKind::StoreUnavailable);
    }

    #[rstest]
    fn open_fails_for_database_without_tables(temp_dir: TempDir) {
        let path = temp_dir.path().join("empty.mbtiles");
        Connection::open(&path)
            .and_then(|conn| conn.execute_batch("PRAGMA user_version = 1;"))
            .expect("create empty database");
        let err = MbtilesStore::open(&path).expect_err("empty schema should fail");
        assert!(matches!(err, StoreError::EmptySchema { .. }));
        assert!(err.is_fatal());
    }

    #[rstest]
    fn lists_tables(package: Fixture) {
        let store = MbtilesStore::open(&package.path).expect("open store");
        let tables = store.list_tables().expect("list tables");
        assert!(tables.contains(&String::from("metadata")));
        assert!(tables.contains(&String::from("tiles")));
    }

    #[rstest]
    fn lists_metadata_in_insertion_order(package: Fixture) {
        let store = MbtilesStore::open(&package.path).expect("open store");
        let names: Vec<_> = store
            .list_metadata()
            .expect("list metadata")
            .into_iter()
            .map(|entry| entry.name)
            .collect();
        assert_eq!(names, ["name", "format", "bounds"]);
    }

    #[rstest]
    fn reads_bounds(package: Fixture) {
        let store = MbtilesStore::open(&package.path).expect("open store");
        let bounds = store.bounds().expect("bounds");
        assert_eq!(bounds.left, -122.5);
        assert_eq!(bounds.bottom, 37.0);
        assert_eq!(bounds.right, -122.0);
        assert_eq!(bounds.top, 37.8);
    }

    #[rstest]
    fn metadata_value_is_a_point_lookup(package: Fixture) {
        let store = MbtilesStore::open(&package.path).expect("open store");
        assert_eq!(
            store.metadata_value("format").expect("lookup"),
            Some(String::from("png"))
        );
        assert_eq!(store.metadata_value("maxzoom").expect("lookup"), None);
    }

    #[rstest]
    fn counts_every_tile_row(package: Fixture) {
        let store = MbtilesStore::open(&package.path).expect("open store");
        assert_eq!(store.tile_count().expect("count"), 3);
    }

    #[rstest]
    fn fetches_tile_by_exact_key(package: Fixture) {
        let store = MbtilesStore::open(&package.path).expect("open store");
        let (key, bytes) = package.tile;
        let blob = store.get_tile(key).expect("query").expect("tile present");
        assert_eq!(blob.key(), key);
        assert_eq!(blob.as_bytes(), bytes.as_slice());
    }

    #[rstest]
    fn missing_tile_is_absent(package: Fixture) {
        let store = MbtilesStore::open(&package.path).expect("open store");
        assert!(store.get_tile(TileKey::new(9, 9, 9)).expect("query").is_none());
    }

    #[rstest]
    fn placeholder_tile_is_absent(package: Fixture) {
        let store = MbtilesStore::open(&package.path).expect("open store");
        assert!(store.get_tile(TileKey::new(1, 1, 1)).expect("query").is_none());
    }

    #[rstest]
    fn threshold_is_configurable(package: Fixture) {
        let options = StoreOptions {
            mode: OpenMode::ReadOnly,
            min_tile_len: 0,
        };
        let store = MbtilesStore::open_with_options(&package.path, options).expect("open store");
        let blob = store
            .get_tile(TileKey::new(1, 1, 1))
            .expect("query")
            .expect("small tile present");
        assert_eq!(blob.len(), 50);
    }

    #[rstest]
    fn null_tile_data_is_absent(temp_dir: TempDir) {
        let path = temp_dir.path().join("null.mbtiles");
        write_mbtiles(&path, &[], &[]).expect("write package");
        Connection::open(&path)
            .and_then(|conn| {
                conn.execute(
                    "INSERT INTO tiles (zoom_level, tile_column, tile_row, tile_data) \
                     VALUES (0, 0, 0, NULL)",
                    [],
                )
            })
            .expect("insert null tile");
        let store = MbtilesStore::open(&path).expect("open store");
        assert!(store.get_tile(TileKey::new(0, 0, 0)).expect("query").is_none());
    }

    #[rstest]
    fn empty_metadata_table_lists_nothing(temp_dir: TempDir) {
        let path = temp_dir.path().join("bare.mbtiles");
        write_mbtiles(&path, &[], &[]).expect("write package");
        let store = MbtilesStore::open(&path).expect("open store");
        assert!(store.list_metadata().expect("list metadata").is_empty());
        assert_eq!(store.tile_count().expect("count"), 0);
    }

    #[rstest]
    fn missing_metadata_table_fails_to_prepare(temp_dir: TempDir) {
        let path = temp_dir.path().join("tiles-only.mbtiles");
        Connection::open(&path)
            .and_then(|conn| {
                conn.execute_batch(
                    "CREATE TABLE tiles (zoom_level INTEGER, tile_column INTEGER, \
                     tile_row INTEGER, tile_data BLOB);",
                )
            })
            .expect("create tiles table");
        let store = MbtilesStore::open(&path).expect("open store");

        let err = store.list_metadata().expect_err("metadata table absent");
        assert!(matches!(
            err,
            StoreError::Prepare {
                statement: LIST_METADATA,
                ..
            }
        ));
        assert_eq!(err.kind(), ErrorKind::QueryPrepare);
        assert_eq!(
            store.bounds().expect_err("bounds unavailable").kind(),
            ErrorKind::QueryPrepare
        );
    }

    fn untyped_package(dir: &TempDir, name: &str, rows: &str) -> PathBuf {
        let path = dir.path().join(name);
        Connection::open(&path)
            .and_then(|conn| {
                conn.execute_batch(&format!(
                    "CREATE TABLE metadata (name, value); \
                     CREATE TABLE tiles (zoom_level, tile_column, tile_row, tile_data); \
                     {rows}"
                ))
            })
            .expect("create untyped package");
        path
    }

    #[rstest]
    fn untyped_metadata_values_read_as_text(temp_dir: TempDir) {
        let path = untyped_package(
            &temp_dir,
            "untyped.mbtiles",
            "INSERT INTO metadata VALUES ('maxzoom', 14); \
             INSERT INTO metadata VALUES ('scale', 1.5); \
             INSERT INTO metadata VALUES ('name', X'74696c6573'); \
             INSERT INTO metadata VALUES ('description', NULL);",
        );
        let store = MbtilesStore::open(&path).expect("open store");

        let entries = store.list_metadata().expect("list metadata");
        assert_eq!(
            entries,
            vec![
                MetadataEntry::new("maxzoom", "14"),
                MetadataEntry::new("scale", "1.5"),
                MetadataEntry::new("name", "tiles"),
                MetadataEntry::new("description", ""),
            ]
        );
        assert_eq!(
            store.metadata_value("maxzoom").expect("lookup"),
            Some(String::from("14"))
        );
    }

    #[rstest]
    fn text_tile_data_reads_as_bytes(temp_dir: TempDir) {
        let payload = "x".repeat(200);
        let path = untyped_package(
            &temp_dir,
            "text-tile.mbtiles",
            &format!("INSERT INTO tiles VALUES (0, 0, 0, '{payload}');"),
        );
        let store = MbtilesStore::open(&path).expect("open store");

        let blob = store
            .get_tile(TileKey::new(0, 0, 0))
            .expect("text payload is readable")
            .expect("tile present");
        assert_eq!(blob.as_bytes(), payload.as_bytes());
    }

    #[rstest]
    fn per_tile_failures_are_not_fatal(temp_dir: TempDir) {
        let path = untyped_package(&temp_dir, "no-tiles.mbtiles", "DROP TABLE tiles;");
        let store = MbtilesStore::open(&path).expect("open store");
        let err = store
            .get_tile(TileKey::new(0, 0, 0))
            .expect_err("tiles table is absent");
        assert_eq!(err.kind(), ErrorKind::QueryPrepare);
        assert!(!err.is_fatal());

        let row_failure = StoreError::Query {
            statement: TILE_DATA,
            source: rusqlite::Error::InvalidColumnType(
                0,
                String::from("tile_data"),
                rusqlite::types::Type::Integer,
            ),
        };
        assert_eq!(row_failure.kind(), ErrorKind::StoreUnavailable);
        assert!(!row_failure.is_fatal());
    }

    #[rstest]
    fn stores_coexist(temp_dir: TempDir) {
        let first = temp_dir.path().join("first.mbtiles");
        let second = temp_dir.path().join("second.mbtiles");
        let key = TileKey::new(0, 0, 0);
        write_mbtiles(&first, &[], &[(key, noise_png(16, 16))]).expect("write first");
        write_mbtiles(&second, &[], &[]).expect("write second");

        let first_store = MbtilesStore::open(&first).expect("open first");
        let second_store = MbtilesStore::open(&second).expect("open second");
        assert!(first_store.get_tile(key).expect("query").is_some());
        assert!(second_store.get_tile(key).expect("query").is_none());
    }
}
