//! SQLite-backed local store for profiles, leads, reminders and local auth.
//!
//! The database lives at `~/.leaddesk/leaddesk.db` unless the config points
//! elsewhere. It mirrors the hosted tables column for column so the same
//! page commands run against either backend.

use std::path::PathBuf;

use rusqlite::Connection;

mod auth;
mod leads;
mod profiles;
mod reminders;
pub mod types;

pub use auth::{DbUser, SESSION_TTL_SECS};
pub use types::*;

pub struct LocalDb {
    conn: Connection,
}

impl LocalDb {
    /// Borrow the underlying connection for ad-hoc queries.
    pub fn conn_ref(&self) -> &Connection {
        &self.conn
    }

    /// Execute a closure within a SQLite transaction.
    /// Commits on Ok, rolls back on Err.
    pub fn with_transaction<F, T>(&self, f: F) -> Result<T, DbError>
    where
        F: FnOnce(&Self) -> Result<T, DbError>,
    {
        self.conn.execute_batch("BEGIN IMMEDIATE")?;
        match f(self) {
            Ok(val) => {
                self.conn.execute_batch("COMMIT")?;
                Ok(val)
            }
            Err(e) => {
                let _ = self.conn.execute_batch("ROLLBACK");
                Err(e)
            }
        }
    }

    /// Open (or create) the database at `~/.leaddesk/leaddesk.db` and apply the schema.
    pub fn open() -> Result<Self, DbError> {
        let path = Self::db_path()?;
        Self::open_at(path)
    }

    /// Open a database at an explicit path.
    pub fn open_at(path: PathBuf) -> Result<Self, DbError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(DbError::CreateDir)?;
            }
        }

        let conn = Connection::open(&path)?;

        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        crate::migrations::run_migrations(&conn).map_err(DbError::Migration)?;

        // Assignee and lead references must point at existing rows.
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        Ok(Self { conn })
    }

    /// Resolve the default database path: `~/.leaddesk/leaddesk.db`.
    pub fn db_path() -> Result<PathBuf, DbError> {
        let home = dirs::home_dir().ok_or(DbError::HomeDirNotFound)?;
        Ok(home.join(".leaddesk").join("leaddesk.db"))
    }
}

// =============================================================================
// Shared test utilities
// =============================================================================


// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::test_utils::{sample_lead, sample_profile, test_db};
    use super::*;
    use crate::types::Role;

    #[test]
    fn test_open_creates_tables() {
        let db = test_db();
        let count: i32 = db
            .conn
            .query_row("SELECT COUNT(*) FROM leads", [], |row| row.get(0))
            .expect("leads table should exist");
        assert_eq!(count, 0);
    }

    #[test]
    fn test_transaction_rolls_back_on_error() {
        let db = test_db();
        db.insert_profile(&sample_profile("p1", "Pat", Role::Admin))
            .expect("profile");

        let result: Result<(), DbError> = db.with_transaction(|tx| {
            tx.insert_lead("lead-1", &sample_lead("Acme", "p1"))?;
            Err(DbError::Migration("forced".into()))
        });
        assert!(result.is_err());
        assert!(db.get_lead("lead-1").expect("query").is_none());
    }

    #[test]
    fn test_foreign_keys_enforced() {
        let db = test_db();
        let mut lead = sample_lead("Acme", "p1");
        lead.assigned_to = Some("ghost".into());
        assert!(db.insert_lead("lead-1", &lead).is_err());
    }
}
