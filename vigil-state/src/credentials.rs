//! Persisted session credentials
//!
//! The session is stored as four string keys. They are written together on
//! login and removed together on logout; a store that cannot write the
//! whole group must leave none of it behind.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::error::{Result, StateError};

/// Credential keys
pub mod keys {
    pub const TOKEN: &str = "token";
    pub const USER_ID: &str = "userId";
    pub const USERNAME: &str = "username";
    pub const EMAIL: &str = "email";

    /// Every key written on login
    pub const ALL: [&str; 4] = [TOKEN, USER_ID, USERNAME, EMAIL];
}

/// Key/value capability backing the persisted session
///
/// Implementations are synchronous; they are expected to touch local
/// storage only.
pub trait CredentialStore: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<String>>;

    fn write(&self, key: &str, value: &str) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;

    /// Write a group of entries, all or nothing
    ///
    /// The default writes one key at a time and removes the keys it already
    /// wrote if a later write fails.
    fn write_all(&self, entries: &[(&str, String)]) -> Result<()> {
        for (index, (key, value)) in entries.iter().enumerate() {
            if let Err(err) = self.write(key, value) {
                for (written, _) in &entries[..index] {
                    if let Err(rollback) = self.remove(written) {
                        warn!(key = %written, error = %rollback, "failed to roll back credential write");
                    }
                }
                return Err(err);
            }
        }
        Ok(())
    }

    /// Remove a group of keys, attempting every key
    ///
    /// Returns the first failure after all removals have been tried.
    fn remove_all(&self, keys: &[&str]) -> Result<()> {
        let mut first_error = None;
        for key in keys {
            if let Err(err) = self.remove(key) {
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

/// Process-local credential store
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.lock().is_empty()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.lock().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        self.values.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.values.lock().remove(key);
        Ok(())
    }

    fn write_all(&self, entries: &[(&str, String)]) -> Result<()> {
        let mut values = self.values.lock();
        for (key, value) in entries {
            values.insert((*key).to_string(), value.clone());
        }
        Ok(())
    }
}

/// Credential store backed by a JSON file
///
/// Every change rewrites the whole file through a temporary sibling and a
/// rename, so a crash never leaves a half-written group on disk. On Unix the
/// file is created readable by its owner only.
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Store at `<config dir>/vigil/credentials.json`
    pub fn at_default_location() -> Result<Self> {
        default_path()
            .map(Self::new)
            .ok_or_else(|| StateError::Persistence("no user configuration directory available".to_string()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) if contents.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(err) => Err(err.into()),
        }
    }

    fn save(&self, values: &BTreeMap<String, String>) -> Result<()> {
        if values.is_empty() {
            return match fs::remove_file(&self.path) {
                Err(err) if err.kind() != std::io::ErrorKind::NotFound => Err(err.into()),
                _ => Ok(()),
            };
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(values)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, contents)?;
        restrict_permissions(&tmp)?;
        fs::rename(&tmp, &self.path)?;

        debug!(path = %self.path.display(), keys = values.len(), "saved credentials");
        Ok(())
    }

    fn modify(&self, f: impl FnOnce(&mut BTreeMap<String, String>)) -> Result<()> {
        let _guard = self.lock.lock();
        let mut values = self.load()?;
        f(&mut values);
        self.save(&values)
    }
}

impl CredentialStore for FileCredentialStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock.lock();
        Ok(self.load()?.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        self.modify(|values| {
            values.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.modify(|values| {
            values.remove(key);
        })
    }

    fn write_all(&self, entries: &[(&str, String)]) -> Result<()> {
        self.modify(|values| {
            for (key, value) in entries {
                values.insert((*key).to_string(), value.clone());
            }
        })
    }

    fn remove_all(&self, keys: &[&str]) -> Result<()> {
        self.modify(|values| {
            for key in keys {
                values.remove(*key);
            }
        })
    }
}

/// Default credential file location, if the platform has a config directory
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("vigil").join("credentials.json"))
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}
