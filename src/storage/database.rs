use rusqlite::{Connection, Result as SqlResult};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Base database connection wrapper
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) a database file, creating its parent directory.
    pub fn new<P: AsRef<Path>>(path: P) -> SqlResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(err) = fs::create_dir_all(parent) {
                    log::warn!("Unable to create {}: {err}", parent.display());
                }
            }
        }

        let conn = Connection::open(path)?;
        // Another client window may hold the file briefly.
        conn.busy_timeout(Duration::from_secs(2))?;
        Ok(Self { conn })
    }

    pub fn in_memory() -> SqlResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}
