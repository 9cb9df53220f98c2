use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::error::AuthError;

const TOKEN_FILE_NAME: &str = "tokens.toml";
const TOKEN_FILE_VERSION: u32 = 1;

/// Key/value storage for session credentials.
///
/// Keys are the fixed constants in [`crate::auth::token`].
pub trait TokenStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, AuthError>;
    fn set(&self, key: &str, value: &str) -> Result<(), AuthError>;
    fn remove(&self, key: &str) -> Result<(), AuthError>;
}

/// Which backend a client persists its tokens to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum StorageKind {
    /// File under the user's home directory; survives restarts.
    #[default]
    Local,
    /// File under the OS temp directory; survives until the OS clears it.
    Session,
    /// Process memory only.
    Memory,
}

impl StorageKind {
    /// Build the store for this kind. File-backed kinds degrade to memory.
    pub fn open(self, dir: Option<PathBuf>) -> Arc<dyn TokenStore> {
        match self {
            Self::Memory => Arc::new(MemoryTokenStore::new()),
            Self::Local => {
                let dir = dir.unwrap_or_else(default_plinto_dir);
                Arc::new(FallbackTokenStore::new(FileTokenStore::new(dir)))
            }
            Self::Session => {
                let dir = dir.unwrap_or_else(|| std::env::temp_dir().join("plinto-session"));
                Arc::new(FallbackTokenStore::new(FileTokenStore::new(dir)))
            }
        }
    }
}

/// Process-local token store.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // A panicking writer cannot leave a HashMap half-updated.
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, key: &str) -> Result<Option<String>, AuthError> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AuthError> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), AuthError> {
        self.entries().remove(key);
        Ok(())
    }
}

/// File-backed token store: one TOML file holding every key.
///
/// # Example
/// ```no_run
/// use plinto::auth::{FileTokenStore, TokenStore};
///
/// let store = FileTokenStore::new(std::path::PathBuf::from("/tmp/plinto"));
/// store.set("plinto_access_token", "access")?;
/// # Ok::<(), plinto::auth::AuthError>(())
/// ```
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileTokenStore {
    pub fn new(base_dir: PathBuf) -> Self {
        Self {
            path: base_dir.join(TOKEN_FILE_NAME),
            write_lock: Mutex::new(()),
        }
    }

    pub fn new_default() -> Self {
        Self::new(default_plinto_dir())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_file(&self) -> Result<BTreeMap<String, String>, AuthError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(err) => return Err(AuthError::Io(err.to_string())),
        };
        let file: TokenFile = toml::from_str(&raw)?;
        Ok(file.entries)
    }

    /// A corrupt file holds no usable session; treat it as empty so the next
    /// write replaces it instead of disabling persistence.
    fn load_entries(&self) -> Result<BTreeMap<String, String>, AuthError> {
        match self.read_file() {
            Err(AuthError::Serialization(reason)) => {
                tracing::warn!(
                    path = %self.path.display(),
                    %reason,
                    "Token file is corrupt, ignoring its contents"
                );
                Ok(BTreeMap::new())
            }
            other => other,
        }
    }

    fn write_file(&self, entries: BTreeMap<String, String>) -> Result<(), AuthError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = TokenFile {
            version: TOKEN_FILE_VERSION,
            saved_at: Utc::now(),
            entries,
        };
        write_owner_only(&self.path, toml::to_string(&file)?.as_bytes())
    }

    fn update(
        &self,
        apply: impl FnOnce(&mut BTreeMap<String, String>),
    ) -> Result<(), AuthError> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut entries = self.load_entries()?;
        apply(&mut entries);
        if entries.is_empty() {
            return match fs::remove_file(&self.path) {
                Ok(()) => Ok(()),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(err) => Err(AuthError::Io(err.to_string())),
            };
        }
        self.write_file(entries)
    }
}

/// Write to a sibling temp file created `0600`, then rename it over `path`,
/// so readers see either the old file or the new one.
fn write_owner_only(path: &Path, data: &[u8]) -> Result<(), AuthError> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| TOKEN_FILE_NAME.to_string());
    let nonce = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let temp_path = path.with_file_name(format!(
        ".{file_name}.tmp-{}-{nonce}",
        std::process::id()
    ));

    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let written = (|| -> std::io::Result<()> {
        let mut temp_file = options.open(&temp_path)?;
        temp_file.write_all(data)?;
        temp_file.sync_all()
    })();
    if let Err(err) = written {
        let _ = fs::remove_file(&temp_path);
        return Err(err.into());
    }
    if let Err(err) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(err.into());
    }
    Ok(())
}

impl TokenStore for FileTokenStore {
    fn get(&self, key: &str) -> Result<Option<String>, AuthError> {
        Ok(self.load_entries()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AuthError> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<(), AuthError> {
        self.update(|entries| {
            entries.remove(key);
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TokenFile {
    version: u32,
    saved_at: DateTime<Utc>,
    #[serde(default)]
    entries: BTreeMap<String, String>,
}

/// Wraps a store and switches to memory for the rest of the process the
/// first time the wrapped store fails.
pub struct FallbackTokenStore<S> {
    primary: S,
    memory: MemoryTokenStore,
    degraded: AtomicBool,
}

impl<S: TokenStore> FallbackTokenStore<S> {
    pub fn new(primary: S) -> Self {
        Self {
            primary,
            memory: MemoryTokenStore::new(),
            degraded: AtomicBool::new(false),
        }
    }

    /// Whether the wrapped store has failed and memory is in use.
    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::Acquire)
    }

    fn degrade(&self, op: &str, error: &AuthError) {
        if !self.degraded.swap(true, Ordering::AcqRel) {
            tracing::warn!(
                operation = op,
                error = %error,
                "Token storage unavailable, falling back to in-memory storage"
            );
        }
    }
}

impl<S: TokenStore> TokenStore for FallbackTokenStore<S> {
    fn get(&self, key: &str) -> Result<Option<String>, AuthError> {
        if !self.is_degraded() {
            match self.primary.get(key) {
                Ok(value) => return Ok(value),
                Err(err) => self.degrade("get", &err),
            }
        }
        self.memory.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AuthError> {
        if !self.is_degraded() {
            match self.primary.set(key, value) {
                Ok(()) => return Ok(()),
                Err(err) => self.degrade("set", &err),
            }
        }
        self.memory.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), AuthError> {
        if !self.is_degraded() {
            match self.primary.remove(key) {
                Ok(()) => return Ok(()),
                Err(err) => self.degrade("remove", &err),
            }
        }
        self.memory.remove(key)
    }
}

fn default_plinto_dir() -> PathBuf {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().join(".plinto"))
        .unwrap_or_else(|| PathBuf::from(".plinto"))
}
