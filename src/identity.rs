use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::warn;
use uuid::Uuid;

const USER_KEY: &str = "com.nexters.donmani.app.persistentUUID";
const USER_NAME_KEY: &str = "com.nexters.donmani.app.UserName";

/// Owner-only JSON keystore for the persistent user key and display name.
pub struct IdentityStore {
    path: PathBuf,
    lock: Mutex<()>,
}

#[derive(Debug)]
pub enum IdentityError {
    Io { path: PathBuf, source: std::io::Error },
    Json(serde_json::Error),
}

impl fmt::Display for IdentityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityError::Io { path, source } => {
                write!(f, "identity store '{}': {}", path.display(), source)
            }
            IdentityError::Json(err) => write!(f, "identity store is corrupt: {}", err),
        }
    }
}

impl Error for IdentityError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            IdentityError::Io { source, .. } => Some(source),
            IdentityError::Json(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for IdentityError {
    fn from(value: serde_json::Error) -> Self {
        IdentityError::Json(value)
    }
}

impl IdentityStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Keeps an existing user key; creates and stores one otherwise.
    pub fn generate_uuid(&self) -> Result<String, IdentityError> {
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut entries = self.read_entries()?;
        if let Some(existing) = entries.get(USER_KEY).filter(|key| !key.is_empty()) {
            return Ok(existing.clone());
        }
        let key = Uuid::now_v7().to_string().to_uppercase();
        entries.insert(USER_KEY.to_string(), key.clone());
        self.write_entries(&entries)?;
        Ok(key)
    }

    /// The stored user key, or an empty string before registration.
    pub fn user_key(&self) -> String {
        self.get(USER_KEY)
    }

    pub fn user_name(&self) -> String {
        self.get(USER_NAME_KEY)
    }

    pub fn set_user_name(&self, name: &str) {
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let result = self.read_entries().and_then(|mut entries| {
            entries.insert(USER_NAME_KEY.to_string(), name.to_string());
            self.write_entries(&entries)
        });
        if let Err(err) = result {
            warn!(error = %err, "failed to store user name");
        }
    }

    fn get(&self, key: &str) -> String {
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        match self.read_entries() {
            Ok(entries) => entries.get(key).cloned().unwrap_or_default(),
            Err(err) => {
                warn!(error = %err, "failed to read identity store");
                String::new()
            }
        }
    }

    fn read_entries(&self) -> Result<BTreeMap<String, String>, IdentityError> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(source) => Err(IdentityError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<(), IdentityError> {
        let io_err = |source| IdentityError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(io_err)?;
            }
        }
        let body = serde_json::to_vec_pretty(entries)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, body).map_err(io_err)?;
        restrict_permissions(&tmp).map_err(io_err)?;
        std::fs::rename(&tmp, &self.path).map_err(io_err)?;
        Ok(())
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
