// src/database/schema.rs

//! SQLite schema for the cook database and its migrations

use crate::error::Result;
use rusqlite::Connection;
use tracing::{debug, info};

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

fn init_schema_version(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;
    Ok(())
}

/// Get the current schema version from the database
pub fn get_schema_version(conn: &Connection) -> Result<i32> {
    init_schema_version(conn)?;

    let version = conn
        .query_row(
            "SELECT version FROM schema_version ORDER BY version DESC LIMIT 1",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    Ok(version)
}

fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}

/// Apply all pending migrations
pub fn migrate(conn: &Connection) -> Result<()> {
    let current_version = get_schema_version(conn)?;
    debug!("Cook database schema version: {}", current_version);

    if current_version >= SCHEMA_VERSION {
        return Ok(());
    }

    for version in (current_version + 1)..=SCHEMA_VERSION {
        info!("Applying cook database migration to version {}", version);
        match version {
            1 => migrate_v1(conn)?,
            _ => unreachable!("no migration for version {}", version),
        }
        set_schema_version(conn, version)?;
    }

    Ok(())
}

/// Initial schema
///
/// - cook_metadata: one row per cooked many-to-one file
/// - cook_sources: the dependencies recorded for that row
/// - type_versions: last versions used to cook each one-to-one type
fn migrate_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE cook_metadata (
            path TEXT NOT NULL,
            file_type TEXT NOT NULL,
            cooker_version INTEGER NOT NULL,
            data_version INTEGER NOT NULL,
            cooked_timestamp INTEGER NOT NULL,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (path, file_type)
        );

        CREATE TABLE cook_sources (
            path TEXT NOT NULL,
            file_type TEXT NOT NULL,
            source TEXT NOT NULL,
            kind TEXT NOT NULL CHECK(kind IN ('source', 'sibling', 'directory')),
            value INTEGER NOT NULL,
            FOREIGN KEY (path, file_type) REFERENCES cook_metadata(path, file_type) ON DELETE CASCADE
        );

        CREATE INDEX idx_cook_sources_owner ON cook_sources(path, file_type);
        CREATE INDEX idx_cook_sources_source ON cook_sources(source);

        CREATE TABLE type_versions (
            file_type TEXT PRIMARY KEY,
            cooker_version INTEGER NOT NULL,
            data_version INTEGER NOT NULL
        );
        ",
    )?;
    Ok(())
}
