//! JSON file storage for tokens and cached collections.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind as IoErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use toolshelf_core::error::{Error, StorageError};
use toolshelf_core::{Result, TokenStore};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

fn map_io(err: std::io::Error) -> Error {
    Error::Storage(StorageError::Unavailable {
        message: format!("IO error: {}", err),
    })
}

/// On-disk layout of the store file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreDocument {
    updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    entries: BTreeMap<String, String>,
}

/// A [`TokenStore`] persisted as a single JSON file.
///
/// Every operation takes an advisory lock on a sibling `.lock` file, so
/// several processes sharing one store see whole writes only. Writes go to a
/// temporary file that is renamed over the original, and on Unix the file is
/// readable by its owner only.
///
/// A missing file is an empty store. A file that exists but cannot be parsed
/// is reported as [`StorageError::Corrupt`] rather than silently replaced.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Use the store file at `path`. Nothing is touched until first use.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the store file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        self.path.with_extension("lock")
    }

    fn temp_path(&self) -> PathBuf {
        self.path.with_extension("tmp")
    }

    fn open_lock(&self) -> Result<File> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(map_io)?;
        }

        OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(self.lock_path())
            .map_err(map_io)
    }

    fn read_document(&self) -> Result<StoreDocument> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == IoErrorKind::NotFound => return Ok(StoreDocument::default()),
            Err(e) => return Err(map_io(e)),
        };

        serde_json::from_str(&content).map_err(|e| {
            Error::Storage(StorageError::Corrupt {
                message: format!("{}: {}", self.path.display(), e),
            })
        })
    }

    fn write_document(&self, document: &mut StoreDocument) -> Result<()> {
        document.updated_at = Some(Utc::now());
        let content = serde_json::to_string_pretty(document).map_err(|e| {
            Error::Storage(StorageError::Unavailable {
                message: e.to_string(),
            })
        })?;

        let temp_path = self.temp_path();
        let mut file = File::create(&temp_path).map_err(map_io)?;

        #[cfg(unix)]
        {
            let mut perms = file.metadata().map_err(map_io)?.permissions();
            perms.set_mode(0o600);
            file.set_permissions(perms).map_err(map_io)?;
        }

        file.write_all(content.as_bytes()).map_err(map_io)?;
        file.sync_data().map_err(map_io)?;
        fs::rename(&temp_path, &self.path).map_err(map_io)?;

        Ok(())
    }

    /// Read-modify-write under the exclusive lock. `f` returns whether it
    /// changed anything; unchanged documents are not rewritten.
    fn modify(&self, f: impl FnOnce(&mut BTreeMap<String, String>) -> bool) -> Result<()> {
        let lock = self.open_lock()?;
        lock.lock_exclusive().map_err(map_io)?;

        let result = self.read_document().and_then(|mut document| {
            if f(&mut document.entries) {
                self.write_document(&mut document)
            } else {
                Ok(())
            }
        });

        lock.unlock().map_err(map_io)?;
        result
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let lock = self.open_lock()?;
        lock.lock_shared().map_err(map_io)?;
        let document = self.read_document();
        lock.unlock().map_err(map_io)?;

        Ok(document?.entries.get(key).cloned())
    }

    #[instrument(skip(self, value), fields(path = %self.path.display()))]
    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.modify(|entries| {
            let previous = entries.insert(key.to_string(), value.to_string());
            previous.as_deref() != Some(value)
        })?;
        debug!("Stored value");
        Ok(())
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn remove(&self, key: &str) -> Result<()> {
        self.modify(|entries| entries.remove(key).is_some())?;
        debug!("Removed value");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use toolshelf_core::store::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
    use toolshelf_core::{AccessToken, ErrorKind, RefreshToken, StoredTokens};

    fn store_in(dir: &TempDir) -> FileTokenStore {
        FileTokenStore::new(dir.path().join("nested").join("store.json"))
    }

    #[test]
    fn missing_file_is_an_empty_store() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        assert_eq!(store.get(ACCESS_TOKEN_KEY).unwrap(), None);
        store.remove(ACCESS_TOKEN_KEY).unwrap();
        assert!(!store.path().exists());
    }

    #[test]
    fn values_survive_a_new_handle() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.set(ACCESS_TOKEN_KEY, "a1").unwrap();
        store.set(REFRESH_TOKEN_KEY, "r1").unwrap();

        let reopened = store_in(&dir);
        let tokens = StoredTokens::load(&reopened).unwrap();
        assert_eq!(tokens.access_token, Some(AccessToken::new("a1").unwrap()));
        assert_eq!(tokens.refresh_token, Some(RefreshToken::new("r1").unwrap()));

        reopened.remove(ACCESS_TOKEN_KEY).unwrap();
        assert_eq!(store.get(ACCESS_TOKEN_KEY).unwrap(), None);
        assert_eq!(store.get(REFRESH_TOKEN_KEY).unwrap().as_deref(), Some("r1"));
    }

    #[test]
    fn file_records_update_time_and_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.set("userState", r#"{"tools":["t1"]}"#).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert!(raw["updated_at"].is_string());
        assert_eq!(raw["entries"]["userState"], r#"{"tools":["t1"]}"#);
        assert!(!store.temp_path().exists());
    }

    #[test]
    fn unparseable_file_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "not json").unwrap();

        let err = store.get(ACCESS_TOKEN_KEY).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Storage);
        assert!(store.set(ACCESS_TOKEN_KEY, "a1").is_err());
        assert_eq!(fs::read_to_string(store.path()).unwrap(), "not json");
    }

    #[cfg(unix)]
    #[test]
    fn store_file_is_private() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.set(ACCESS_TOKEN_KEY, "a1").unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
