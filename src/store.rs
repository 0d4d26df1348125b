//! Persistence for the session token.
//!
//! The session token survives process restarts through a small key-value
//! store. [`TokenStore`] abstracts the mechanism; the default implementation
//! keeps a versioned JSON file on disk. Writes are last-writer-wins: only one
//! session manager is active per process, so no locking is required.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{from_reader, to_writer_pretty};

use crate::error::{Error, Result};

/// Key-value persistence for the opaque session token.
pub trait TokenStore: Send {
    /// Returns the persisted token, if any.
    fn get(&self) -> Result<Option<String>>;

    /// Persists the token, overwriting any previous value.
    fn set(&mut self, token: &str) -> Result<()>;

    /// Removes the persisted token. Removing an absent token is not an error.
    fn remove(&mut self) -> Result<()>;
}

#[derive(Serialize, Deserialize)]
struct TokenFile {
    version: u8,
    chat_session_id: Option<String>,
}

impl TokenFile {
    fn new(token: &str) -> Self {
        Self {
            version: 1,
            chat_session_id: Some(token.to_string()),
        }
    }
}

/// Token store backed by a JSON file.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Creates a store reading and writing the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Returns the path this store persists to.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self) -> Result<Option<String>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(Error::io("failed to open session file", err)),
        };
        let reader = BufReader::new(file);
        let token_file: TokenFile = from_reader(reader).map_err(|err| {
            Error::serialization("failed to parse session file", Some(Box::new(err)))
        })?;
        Ok(token_file.chat_session_id)
    }

    fn set(&mut self, token: &str) -> Result<()> {
        let file = File::create(&self.path)
            .map_err(|err| Error::io("failed to create session file", err))?;
        let writer = BufWriter::new(file);
        to_writer_pretty(writer, &TokenFile::new(token)).map_err(|err| {
            Error::serialization("failed to serialize session file", Some(Box::new(err)))
        })
    }

    fn remove(&mut self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(Error::io("failed to remove session file", err)),
        }
    }
}

/// In-memory token store, mostly useful for tests.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Option<String>,
}

impl MemoryTokenStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-seeded with a token.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Result<Option<String>> {
        Ok(self.token.clone())
    }

    fn set(&mut self, token: &str) -> Result<()> {
        self.token = Some(token.to_string());
        Ok(())
    }

    fn remove(&mut self) -> Result<()> {
        self.token = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_round_trip() {
        let mut store = MemoryTokenStore::new();
        assert_eq!(store.get().unwrap(), None);

        store.set("abc-123").unwrap();
        assert_eq!(store.get().unwrap(), Some("abc-123".to_string()));

        store.remove().unwrap();
        assert_eq!(store.get().unwrap(), None);
    }

    #[test]
    fn file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let mut store = FileTokenStore::new(&path);

        assert_eq!(store.get().unwrap(), None);

        store.set("tok-1").unwrap();
        assert_eq!(store.get().unwrap(), Some("tok-1".to_string()));

        store.set("tok-2").unwrap();
        assert_eq!(store.get().unwrap(), Some("tok-2".to_string()));

        store.remove().unwrap();
        assert_eq!(store.get().unwrap(), None);
        // Removing again is fine.
        store.remove().unwrap();
    }
}
