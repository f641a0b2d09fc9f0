use std::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use rusqlite::Connection;

use crate::db;

pub mod records;
pub mod resources;
pub mod rewards;

/// Shared handle over the local SQLite cache and the resource directory.
/// Every local data source borrows the connection through it.
pub struct LocalStore {
    conn: Mutex<Connection>,
    resource_dir: PathBuf,
}

#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    Db(rusqlite::Error),
    InvalidPath(PathBuf),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io(err) => write!(f, "I/O error: {}", err),
            StoreError::Db(err) => write!(f, "database error: {}", err),
            StoreError::InvalidPath(path) => {
                write!(f, "path '{}' is not valid UTF-8", path.display())
            }
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            StoreError::Io(err) => Some(err),
            StoreError::Db(err) => Some(err),
            StoreError::InvalidPath(_) => None,
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        StoreError::Io(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        StoreError::Db(value)
    }
}

impl LocalStore {
    pub fn open(db_path: &Path, resource_dir: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::create_dir_all(resource_dir)?;
        let path = db_path
            .to_str()
            .ok_or_else(|| StoreError::InvalidPath(db_path.to_path_buf()))?;
        let conn = db::open_connection(path)?;
        Ok(Self {
            conn: Mutex::new(conn),
            resource_dir: resource_dir.to_path_buf(),
        })
    }

    pub fn resource_dir(&self) -> &Path {
        &self.resource_dir
    }

    pub(crate) fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::PathBuf;
    use std::sync::Arc;

    use uuid::Uuid;

    use super::LocalStore;

    pub struct TempStore {
        pub root: PathBuf,
        pub store: Arc<LocalStore>,
    }

    impl TempStore {
        pub fn new() -> Self {
            let root = std::env::temp_dir().join(format!("donmani-store-{}", Uuid::now_v7()));
            let store = LocalStore::open(&root.join("donmani.sqlite"), &root.join("resources"))
                .expect("temp store should open");
            Self {
                root,
                store: Arc::new(store),
            }
        }
    }

    impl Drop for TempStore {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.root);
        }
    }
}
