//! SQLite store for remembered devices.
//!
//! One small table plus a `meta` table holding the schema version. Unlike a cache, this data
//! belongs to the user, so a version mismatch is reported instead of wiping the file.

use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;

use super::{DeviceRecord, RegistryError};

const SCHEMA_VERSION: &str = "1";

const CREATE_TABLES_SQL: &str = "
    CREATE TABLE IF NOT EXISTS devices (
        id            INTEGER PRIMARY KEY AUTOINCREMENT,
        unique_id     TEXT    NOT NULL,
        friendly_name TEXT    NOT NULL DEFAULT '',
        size          INTEGER NOT NULL DEFAULT 0,
        icon          TEXT    NOT NULL DEFAULT ''
    );

    CREATE TABLE IF NOT EXISTS meta (
        key   TEXT PRIMARY KEY,
        value TEXT NOT NULL
    ) WITHOUT ROWID;
";

/// Owns the registry connection. Lives on the registry worker thread.
pub struct DeviceStore {
    conn: Connection,
}

impl DeviceStore {
    /// Open (or create) the registry at `db_path`, creating parent directories as needed.
    pub fn open(db_path: &Path) -> Result<Self, RegistryError> {
        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(db_path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;
        Self::init(conn)
    }

    /// Registry that lives only as long as the store. For tests and ephemeral sessions.
    pub fn open_in_memory() -> Result<Self, RegistryError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, RegistryError> {
        conn.execute_batch(CREATE_TABLES_SQL)?;

        let version: Option<String> = conn
            .query_row("SELECT value FROM meta WHERE key = 'schema_version'", [], |row| row.get(0))
            .optional()?;
        match version {
            Some(v) if v == SCHEMA_VERSION => {}
            Some(found) => {
                return Err(RegistryError::SchemaMismatch {
                    expected: SCHEMA_VERSION.to_string(),
                    found,
                });
            }
            None => {
                conn.execute(
                    "INSERT INTO meta (key, value) VALUES ('schema_version', ?1)",
                    params![SCHEMA_VERSION],
                )?;
            }
        }

        Ok(Self { conn })
    }

    pub fn get_all_devices(&self) -> Result<Vec<DeviceRecord>, RegistryError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, unique_id, friendly_name, size, icon FROM devices ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            let size: i64 = row.get(3)?;
            Ok(DeviceRecord {
                id: row.get(0)?,
                unique_id: row.get(1)?,
                friendly_name: row.get(2)?,
                size: u64::try_from(size).unwrap_or(0),
                icon_name: row.get(4)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn add_device(&self, record: &DeviceRecord) -> Result<i64, RegistryError> {
        self.conn.execute(
            "INSERT INTO devices (unique_id, friendly_name, size, icon) VALUES (?1, ?2, ?3, ?4)",
            params![
                record.unique_id,
                record.friendly_name,
                i64::try_from(record.size).unwrap_or(i64::MAX),
                record.icon_name
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn remove_device(&self, id: i64) -> Result<(), RegistryError> {
        self.conn.execute("DELETE FROM devices WHERE id = ?1", params![id])?;
        Ok(())
    }

    pub fn set_device_identity(&self, id: i64, friendly_name: &str, icon_name: &str) -> Result<(), RegistryError> {
        self.conn.execute(
            "UPDATE devices SET friendly_name = ?1, icon = ?2 WHERE id = ?3",
            params![friendly_name, icon_name, id],
        )?;
        Ok(())
    }
}
