//! Subscriber phone number storage (SQLite)

use crate::error::Result;
use rusqlite::{params, Connection, ErrorCode};
use std::fs;
use std::path::Path;
use tracing::{error, info};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS phone_numbers (
    phone_number TEXT NOT NULL UNIQUE
);
"#;

/// Single-table store of subscribed phone numbers
pub struct NumberStore {
    conn: Connection,
}

impl NumberStore {
    /// Open (or create) the database file and apply the schema
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Add a number. Already present counts as success.
    pub fn add(&self, number: &str) -> Result<()> {
        let result = self.conn.execute(
            "INSERT INTO phone_numbers (phone_number) VALUES (?1)",
            params![number],
        );

        match result {
            Ok(_) => {
                info!(number = %number, "Number added to database.");
                Ok(())
            }
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == ErrorCode::ConstraintViolation =>
            {
                info!(number = %number, "Number already in database, not adding.");
                Ok(())
            }
            Err(e) => {
                error!(number = %number, error = %e, "Number couldn't be added to database.");
                Err(e.into())
            }
        }
    }

    /// Delete a number. Deleting an absent number is not an error.
    pub fn remove(&self, number: &str) -> Result<()> {
        match self.conn.execute(
            "DELETE FROM phone_numbers WHERE phone_number = ?1",
            params![number],
        ) {
            Ok(rows) => {
                info!(number = %number, rows, "Deleted number from database");
                Ok(())
            }
            Err(e) => {
                error!(number = %number, error = %e, "Error deleting number from database.");
                Err(e.into())
            }
        }
    }

    /// All stored numbers, in whatever order SQLite returns them
    pub fn list(&self) -> Result<Vec<String>> {
        let fetch = || -> rusqlite::Result<Vec<String>> {
            let mut stmt = self.conn.prepare("SELECT phone_number FROM phone_numbers")?;
            let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
            rows.collect()
        };

        fetch().map_err(|e| {
            error!(error = %e, "Failed to fetch numbers from database.");
            e.into()
        })
    }

    #[cfg(test)]
    pub(crate) fn drop_table_for_test(&self) {
        self.conn
            .execute_batch("DROP TABLE phone_numbers")
            .expect("drop phone_numbers");
    }
}
