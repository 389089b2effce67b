use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::data::Coin;

/// Key under which the whole collection is stored
pub const COLLECTION_KEY: &str = "coinCollection";

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("failed to serialize collection: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to create data directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// The Library is the collection's persistent store.
///
/// It is a string key-value store on top of SQLite: one table, one row per
/// key. The collection lives under a single key as a JSON array, and every
/// save overwrites it whole.
pub struct Library {
    conn: Connection,
    db_path: Option<PathBuf>,
}

impl Library {
    /// Open (or create) the library database at `db_path`.
    ///
    /// The parent directory is created if it does not exist yet.
    pub fn open(db_path: &Path) -> Result<Self, LibraryError> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| LibraryError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let conn = Connection::open(db_path)?;
        info!("📁 Library opened at {}", db_path.display());

        let library = Library {
            conn,
            db_path: Some(db_path.to_path_buf()),
        };
        library.init_schema()?;

        Ok(library)
    }

    /// A library that lives only in memory (used by tests)
    pub fn in_memory() -> Result<Self, LibraryError> {
        let library = Library {
            conn: Connection::open_in_memory()?,
            db_path: None,
        };
        library.init_schema()?;
        Ok(library)
    }

    /// Create the key-value table if it doesn't exist
    fn init_schema(&self) -> Result<(), LibraryError> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS kv (
                key     TEXT PRIMARY KEY,
                value   TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    /// Path of the database file, `None` for in-memory libraries
    pub fn path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// Read the raw string stored under `key`
    pub fn get_item(&self, key: &str) -> Result<Option<String>, LibraryError> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    /// Overwrite the string stored under `key`
    pub fn set_item(&self, key: &str, value: &str) -> Result<(), LibraryError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// Load the stored collection.
    ///
    /// Nothing stored yields an empty collection. So does a stored value
    /// that no longer parses: it is logged and left in place until the next
    /// save overwrites it.
    pub fn load(&self) -> Result<Vec<Coin>, LibraryError> {
        let Some(raw) = self.get_item(COLLECTION_KEY)? else {
            debug!("No stored collection, starting empty");
            return Ok(Vec::new());
        };

        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }

        match serde_json::from_str::<Vec<Coin>>(&raw) {
            Ok(coins) => {
                debug!("Loaded {} coins from library", coins.len());
                Ok(coins)
            }
            Err(e) => {
                warn!("⚠️  Stored collection is unreadable, treating it as empty: {}", e);
                Ok(Vec::new())
            }
        }
    }

    /// Serialize the whole collection and overwrite the stored copy
    pub fn save(&self, coins: &[Coin]) -> Result<(), LibraryError> {
        let json = serde_json::to_string(coins)?;
        self.set_item(COLLECTION_KEY, &json)?;
        debug!("Saved {} coins ({} bytes)", coins.len(), json.len());
        Ok(())
    }
}

// Implement Debug for better error messages
impl std::fmt::Debug for Library {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Library")
            .field("db_path", &self.db_path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::data::NewCoin;
    use chrono::Utc;
    use tempfile::TempDir;

    fn coin(id: i64, name: &str) -> Coin {
        NewCoin {
            name: name.to_string(),
            date: "100 BC".to_string(),
            ..Default::default()
        }
        .into_coin(id, Utc::now())
    }

    #[test]
    fn test_empty_library_loads_nothing() {
        let library = Library::in_memory().unwrap();
        assert!(library.load().unwrap().is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let library = Library::in_memory().unwrap();
        let coins = vec![coin(1, "Denarius"), coin(2, "Drachm")];

        library.save(&coins).unwrap();
        assert_eq!(library.load().unwrap(), coins);

        // Saving overwrites, it doesn't append
        library.save(&coins[..1]).unwrap();
        assert_eq!(library.load().unwrap(), coins[..1].to_vec());
    }

    #[test]
    fn test_corrupt_value_loads_as_empty() {
        let library = Library::in_memory().unwrap();
        library.set_item(COLLECTION_KEY, "{not json").unwrap();

        assert!(library.load().unwrap().is_empty());

        // The next save replaces the corrupt value
        library.save(&[coin(3, "Obol")]).unwrap();
        assert_eq!(library.load().unwrap().len(), 1);
    }

    #[test]
    fn test_blank_value_loads_as_empty() {
        let library = Library::in_memory().unwrap();
        library.set_item(COLLECTION_KEY, "  ").unwrap();
        assert!(library.load().unwrap().is_empty());
    }

    #[test]
    fn test_persists_across_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("nested").join("coins.db");

        {
            let library = Library::open(&db_path).unwrap();
            assert_eq!(library.path(), Some(db_path.as_path()));
            library.save(&[coin(1, "Tetradrachm")]).unwrap();
        }

        let reopened = Library::open(&db_path).unwrap();
        let coins = reopened.load().unwrap();
        assert_eq!(coins.len(), 1);
        assert_eq!(coins[0].name, "Tetradrachm");
    }
}
