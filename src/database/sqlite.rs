// src/database/sqlite.rs

//! SQLite-backed cook database

use super::schema;
use super::timestamp::{directory_file_count, modified_time};
use super::{COOKER_VERSION, CookDatabase, CookSource, Freshness, SourceKind, data_version};
use crate::content::{ContentPaths, FilePath, FileType};
use crate::error::{Error, Result};
use rusqlite::{Connection, OptionalExtension, params};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Mutex;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

struct Metadata {
    cooker_version: u32,
    data_version: u32,
    cooked_timestamp: u64,
    dependencies: Vec<(CookSource, u64)>,
}

/// Cook database stored in a single SQLite file
///
/// Positive freshness answers are cached for the lifetime of the value;
/// [`CookDatabase::on_file_change`] drops a cached answer.
pub struct SqliteCookDatabase {
    conn: Mutex<Connection>,
    paths: ContentPaths,
    up_to_date: Mutex<HashSet<FilePath>>,
}

impl SqliteCookDatabase {
    /// Open (creating if needed) the database at `db_path`
    pub fn open(db_path: &Path, paths: ContentPaths) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(db_path)?;
        Self::with_connection(conn, paths)
    }

    pub fn open_in_memory(paths: ContentPaths) -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?, paths)
    }

    fn with_connection(conn: Connection, paths: ContentPaths) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        schema::migrate(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            paths,
            up_to_date: Mutex::new(HashSet::new()),
        })
    }

    /// Delete cooked outputs of one-to-one types whose recorded versions differ
    /// from the built-in ones
    ///
    /// A type seen for the first time only records its versions. Returns the
    /// number of cooked files deleted.
    pub fn process_one_to_one_versions(&self) -> Result<usize> {
        let conn = self.conn.lock()?;
        let mut deleted = 0;

        for file_type in FileType::COOKABLE.iter().copied().filter(|t| t.is_one_to_one()) {
            let expected = (COOKER_VERSION, data_version(file_type));
            let stored: Option<(u32, u32)> = conn
                .query_row(
                    "SELECT cooker_version, data_version FROM type_versions WHERE file_type = ?1",
                    [file_type.as_str()],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;

            match stored {
                Some(versions) if versions == expected => continue,
                Some((cooker, data)) => {
                    info!(
                        "{} versions changed (cooker {} -> {}, data {} -> {}), deleting cooked files",
                        file_type, cooker, expected.0, data, expected.1
                    );
                    deleted += self.delete_cooked_of_type(file_type)?;
                }
                None => debug!("Recording initial versions for {}", file_type),
            }

            conn.execute(
                "INSERT INTO type_versions (file_type, cooker_version, data_version)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(file_type) DO UPDATE SET
                    cooker_version = excluded.cooker_version,
                    data_version = excluded.data_version",
                params![file_type.as_str(), expected.0, expected.1],
            )?;
        }

        if deleted > 0 {
            self.up_to_date.lock()?.clear();
        }
        Ok(deleted)
    }

    fn delete_cooked_of_type(&self, file_type: FileType) -> Result<usize> {
        let root = self.paths.platform_content_dir();
        if !root.is_dir() {
            return Ok(0);
        }

        let ext = file_type.cooked_extension();
        let mut deleted = 0;
        for entry in WalkDir::new(&root).into_iter().filter_map(|e| e.ok()) {
            let matches = entry.file_type().is_file()
                && entry
                    .path()
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case(ext));
            if matches {
                fs::remove_file(entry.path())?;
                deleted += 1;
            }
        }
        Ok(deleted)
    }

    fn load_metadata(&self, path: &FilePath) -> Result<Option<Metadata>> {
        let conn = self.conn.lock()?;
        let key = (path.relative(), path.file_type().as_str());

        let header: Option<(u32, u32, i64)> = conn
            .query_row(
                "SELECT cooker_version, data_version, cooked_timestamp
                 FROM cook_metadata WHERE path = ?1 AND file_type = ?2",
                params![key.0, key.1],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        let Some((cooker_version, data_version, cooked_timestamp)) = header else {
            return Ok(None);
        };

        let mut stmt = conn.prepare(
            "SELECT source, kind, value FROM cook_sources WHERE path = ?1 AND file_type = ?2",
        )?;
        let rows = stmt.query_map(params![key.0, key.1], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?, row.get::<_, i64>(2)?))
        })?;

        let mut dependencies = Vec::new();
        for row in rows {
            let (relative, kind, value) = row?;
            let kind = SourceKind::from_str(&kind).map_err(|_| Error::Metadata {
                file: path.to_string(),
                reason: format!("unknown dependency kind '{}'", kind),
            })?;
            dependencies.push((CookSource { relative, kind }, value as u64));
        }

        Ok(Some(Metadata {
            cooker_version,
            data_version,
            cooked_timestamp: cooked_timestamp as u64,
            dependencies,
        }))
    }

    fn observe(&self, source: &CookSource) -> u64 {
        match source.kind {
            SourceKind::Source => modified_time(&self.source_path(&source.relative)),
            SourceKind::Sibling => modified_time(&self.paths.platform_content_dir().join(&source.relative)),
            SourceKind::Directory => directory_file_count(&self.source_path(&source.relative)),
        }
    }

    fn source_path(&self, relative: &str) -> PathBuf {
        self.paths.source_dir().join(relative)
    }

    fn evaluate(&self, path: &FilePath) -> Result<Freshness> {
        if path.file_type().is_one_to_one() {
            let cooked = modified_time(&self.paths.cooked_path(path));
            let source = modified_time(&self.paths.source_path(path));
            return Ok(if cooked != 0 && cooked == source {
                Freshness::UpToDate
            } else {
                Freshness::Stale {
                    changed: vec![path.relative_source()],
                }
            });
        }

        let global = Freshness::Stale { changed: Vec::new() };
        let Some(metadata) = self.load_metadata(path)? else {
            return Ok(global);
        };
        if metadata.cooker_version != COOKER_VERSION
            || metadata.data_version != data_version(path.file_type())
        {
            return Ok(global);
        }
        let cooked = modified_time(&self.paths.cooked_path(path));
        if cooked == 0 || metadata.cooked_timestamp != cooked {
            return Ok(global);
        }

        let changed: Vec<String> = metadata
            .dependencies
            .iter()
            .filter(|(source, recorded)| self.observe(source) != *recorded)
            .map(|(source, _)| source.relative.clone())
            .collect();

        Ok(if changed.is_empty() {
            Freshness::UpToDate
        } else {
            Freshness::Stale { changed }
        })
    }
}

impl CookDatabase for SqliteCookDatabase {
    fn check_up_to_date(&self, path: &FilePath) -> Result<bool> {
        Ok(self.check_up_to_date_with_details(path)?.is_up_to_date())
    }

    fn check_up_to_date_with_details(&self, path: &FilePath) -> Result<Freshness> {
        if self.up_to_date.lock()?.contains(path) {
            return Ok(Freshness::UpToDate);
        }

        let freshness = self.evaluate(path)?;
        if freshness.is_up_to_date() {
            self.up_to_date.lock()?.insert(path.clone());
        }
        Ok(freshness)
    }

    fn update_metadata(&self, path: &FilePath, cooked_timestamp: u64, sources: &[CookSource]) -> Result<()> {
        if path.file_type().is_one_to_one() {
            return Ok(());
        }

        let observed: Vec<(&CookSource, u64)> = sources.iter().map(|s| (s, self.observe(s))).collect();
        let key = (path.relative(), path.file_type().as_str());

        {
            let mut conn = self.conn.lock()?;
            let tx = conn.transaction()?;
            tx.execute(
                "DELETE FROM cook_sources WHERE path = ?1 AND file_type = ?2",
                params![key.0, key.1],
            )?;
            tx.execute(
                "INSERT INTO cook_metadata (path, file_type, cooker_version, data_version, cooked_timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(path, file_type) DO UPDATE SET
                    cooker_version = excluded.cooker_version,
                    data_version = excluded.data_version,
                    cooked_timestamp = excluded.cooked_timestamp,
                    updated_at = CURRENT_TIMESTAMP",
                params![
                    key.0,
                    key.1,
                    COOKER_VERSION,
                    data_version(path.file_type()),
                    cooked_timestamp as i64
                ],
            )?;
            for (source, value) in &observed {
                tx.execute(
                    "INSERT INTO cook_sources (path, file_type, source, kind, value)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![key.0, key.1, source.relative, source.kind.as_ref(), *value as i64],
                )?;
            }
            tx.commit()?;
        }

        if observed.iter().any(|(s, v)| s.kind != SourceKind::Directory && *v == 0) {
            warn!("{}: recorded a dependency that does not exist", path);
        }
        self.up_to_date.lock()?.insert(path.clone());
        Ok(())
    }

    fn on_file_change(&self, path: &FilePath) {
        if let Ok(mut cache) = self.up_to_date.lock() {
            cache.remove(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::Platform;
    use crate::database::timestamp::copy_modified_time;
    use filetime::FileTime;
    use tempfile::TempDir;

    fn setup() -> (TempDir, ContentPaths, SqliteCookDatabase) {
        let temp = TempDir::new().unwrap();
        let paths = ContentPaths::new(temp.path().join("Source"), temp.path().join("Content"), Platform::PC);
        fs::create_dir_all(paths.source_dir()).unwrap();
        fs::create_dir_all(paths.platform_content_dir()).unwrap();
        let db = SqliteCookDatabase::open(&temp.path().join("cook.db"), paths.clone()).unwrap();
        (temp, paths, db)
    }

    fn write(path: &Path, bytes: &[u8], secs: i64) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, bytes).unwrap();
        filetime::set_file_mtime(path, FileTime::from_unix_time(secs, 0)).unwrap();
    }

    #[test]
    fn test_one_to_one_freshness_follows_timestamps() {
        let (_temp, paths, db) = setup();
        let script = FilePath::parse("Scripts/Main.lua").unwrap();

        write(&paths.source_path(&script), b"print(1)", 1_000);
        assert!(!db.check_up_to_date(&script).unwrap());

        write(&paths.cooked_path(&script), b"bc", 2_000);
        assert!(!db.check_up_to_date(&script).unwrap());

        copy_modified_time(&paths.source_path(&script), &paths.cooked_path(&script)).unwrap();
        assert!(db.check_up_to_date(&script).unwrap());

        // Cached until told otherwise.
        write(&paths.source_path(&script), b"print(2)", 3_000);
        assert!(db.check_up_to_date(&script).unwrap());
        db.on_file_change(&script);
        assert!(!db.check_up_to_date(&script).unwrap());
    }

    #[test]
    fn test_many_to_one_tracks_dependencies() {
        let (_temp, paths, db) = setup();
        let movie = FilePath::parse("UI/Menu.swf").unwrap();
        let image = FilePath::parse("GeneratedPC/UIImages/UI/Menu/Button.png").unwrap();

        write(&paths.source_path(&movie), b"swf", 1_000);
        write(&paths.source_path(&image), b"png", 1_000);
        write(&paths.cooked_path(&movie), b"fcn", 1_000);

        let details = db.check_up_to_date_with_details(&movie).unwrap();
        assert_eq!(details, Freshness::Stale { changed: Vec::new() });

        let sources = vec![
            CookSource::source(&movie),
            CookSource::source(&image),
            CookSource::directory("GeneratedPC/UIImages/UI/Menu"),
        ];
        let cooked = modified_time(&paths.cooked_path(&movie));
        db.update_metadata(&movie, cooked, &sources).unwrap();
        assert!(db.check_up_to_date(&movie).unwrap());

        write(&paths.source_path(&image), b"png2", 5_000);
        db.on_file_change(&movie);
        match db.check_up_to_date_with_details(&movie).unwrap() {
            Freshness::Stale { changed } => {
                assert_eq!(changed, vec!["GeneratedPC/UIImages/UI/Menu/Button.png".to_string()]);
            }
            other => panic!("expected stale, got {:?}", other),
        }

        let extra = paths.source_dir().join("GeneratedPC/UIImages/UI/Menu/Extra.png");
        write(&extra, b"png", 1_000);
        db.update_metadata(&movie, cooked, &sources).unwrap();
        fs::remove_file(&extra).unwrap();
        db.on_file_change(&movie);
        match db.check_up_to_date_with_details(&movie).unwrap() {
            Freshness::Stale { changed } => {
                assert_eq!(changed, vec!["GeneratedPC/UIImages/UI/Menu".to_string()]);
            }
            other => panic!("expected stale, got {:?}", other),
        }
    }

    #[test]
    fn test_one_to_one_version_processing() {
        let (_temp, paths, db) = setup();
        let font = FilePath::parse("Fonts/Body.ttf").unwrap();
        write(&paths.cooked_path(&font), b"sff", 1_000);

        // First run only records versions.
        assert_eq!(db.process_one_to_one_versions().unwrap(), 0);
        assert!(paths.cooked_path(&font).exists());

        db.conn
            .lock()
            .unwrap()
            .execute("UPDATE type_versions SET data_version = 0 WHERE file_type = 'Font'", [])
            .unwrap();

        assert_eq!(db.process_one_to_one_versions().unwrap(), 1);
        assert!(!paths.cooked_path(&font).exists());
        assert_eq!(db.process_one_to_one_versions().unwrap(), 0);
    }
}
