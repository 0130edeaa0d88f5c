use rusqlite::{OptionalExtension, Result as SqlResult, params};
use std::path::Path;

use super::database::Database;
use super::models::AuthContext;

const TOKEN_KEY: &str = "token";
const USERNAME_KEY: &str = "username";

/// Persisted key-value store holding the signed-in session.
pub struct SessionStore {
    db: Database,
}

impl SessionStore {
    /// Open the store at a custom path
    pub fn with_path<P: AsRef<Path>>(path: P) -> SqlResult<Self> {
        let db = Database::new(path)?;
        let store = Self { db };
        store.init_schema()?;
        Ok(store)
    }

    pub fn in_memory() -> SqlResult<Self> {
        let store = Self {
            db: Database::in_memory()?,
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> SqlResult<()> {
        self.db.connection().execute(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
            )",
            [],
        )?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> SqlResult<Option<String>> {
        self.db
            .connection()
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()
    }

    /// Insert or replace a value
    pub fn set(&self, key: &str, value: &str) -> SqlResult<()> {
        self.db.connection().execute(
            "INSERT OR REPLACE INTO kv (key, value, updated_at)
             VALUES (?1, ?2, strftime('%s', 'now'))",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn remove(&self, key: &str) -> SqlResult<()> {
        self.db
            .connection()
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    /// The current session, if both token and username are present.
    pub fn load_auth(&self) -> SqlResult<Option<AuthContext>> {
        let token = self.get(TOKEN_KEY)?;
        let username = self.get(USERNAME_KEY)?;
        Ok(match (token, username) {
            (Some(token), Some(username)) => AuthContext::new(&token, &username),
            _ => None,
        })
    }

    pub fn save_session(&self, username: &str, token: &str) -> SqlResult<()> {
        self.set(USERNAME_KEY, username.trim())?;
        self.set(TOKEN_KEY, token.trim())
    }

    pub fn clear_session(&self) -> SqlResult<()> {
        self.remove(TOKEN_KEY)?;
        self.remove(USERNAME_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_store_has_no_session() {
        let store = SessionStore::in_memory().unwrap();
        assert_eq!(store.load_auth().unwrap(), None);
        assert_eq!(store.get("token").unwrap(), None);
    }

    #[test]
    fn session_round_trips_and_clears() {
        let store = SessionStore::in_memory().unwrap();
        store.save_session(" alice ", "tok-123").unwrap();

        let auth = store.load_auth().unwrap().unwrap();
        assert_eq!(auth.username(), "alice");
        assert_eq!(auth.token(), "tok-123");

        store.clear_session().unwrap();
        assert_eq!(store.load_auth().unwrap(), None);
    }

    #[test]
    fn set_replaces_existing_values() {
        let store = SessionStore::in_memory().unwrap();
        store.set("token", "old").unwrap();
        store.set("token", "new").unwrap();
        assert_eq!(store.get("token").unwrap().as_deref(), Some("new"));
    }

    #[test]
    fn session_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.db");

        SessionStore::with_path(&path)
            .unwrap()
            .save_session("bob", "tok")
            .unwrap();

        let reopened = SessionStore::with_path(&path).unwrap();
        assert_eq!(
            reopened.load_auth().unwrap().map(|a| a.username().to_string()),
            Some("bob".to_string())
        );
    }
}
