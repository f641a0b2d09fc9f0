use std::error::Error;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use super::LocalStore;
use crate::db;

/// Downloaded reward payloads (images, effect JSON, sounds) kept on disk
/// under content-addressed names.
#[derive(Clone)]
pub struct ResourceStore {
    store: Arc<LocalStore>,
}

#[derive(Debug)]
pub enum ResourceError {
    Io { path: PathBuf, source: std::io::Error },
    Db(rusqlite::Error),
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::Io { path, source } => {
                write!(f, "failed to write resource '{}': {}", path.display(), source)
            }
            ResourceError::Db(err) => write!(f, "resource index error: {}", err),
        }
    }
}

impl Error for ResourceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ResourceError::Io { source, .. } => Some(source),
            ResourceError::Db(err) => Some(err),
        }
    }
}

impl From<rusqlite::Error> for ResourceError {
    fn from(value: rusqlite::Error) -> Self {
        ResourceError::Db(value)
    }
}

impl ResourceStore {
    pub fn new(store: Arc<LocalStore>) -> Self {
        Self { store }
    }

    pub fn save(&self, url: &str, bytes: &[u8]) -> Result<PathBuf, ResourceError> {
        let file_name = resource_file_name(url);
        let path = self.store.resource_dir().join(&file_name);
        std::fs::write(&path, bytes).map_err(|source| ResourceError::Io {
            path: path.clone(),
            source,
        })?;
        let conn = self.store.conn();
        db::put_resource_entry(&conn, url, &file_name)?;
        debug!(url, file = %file_name, bytes = bytes.len(), "cached reward resource");
        Ok(path)
    }

    pub fn load(&self, url: &str) -> Option<Vec<u8>> {
        let file_name = {
            let conn = self.store.conn();
            match db::get_resource_entry(&conn, url) {
                Ok(entry) => entry?,
                Err(err) => {
                    warn!(url, error = %err, "failed to read resource index");
                    return None;
                }
            }
        };
        let path = self.store.resource_dir().join(file_name);
        match std::fs::read(&path) {
            Ok(bytes) => Some(bytes),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "cached resource is unreadable");
                None
            }
        }
    }

    pub fn contains(&self, url: &str) -> bool {
        let conn = self.store.conn();
        matches!(db::get_resource_entry(&conn, url), Ok(Some(_)))
    }
}

/// SHA-256 of the URL plus the URL's extension, if it has a short one.
pub fn resource_file_name(url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    let mut out = String::with_capacity(digest.len() * 2 + 8);
    for byte in digest {
        use std::fmt::Write as _;
        let _ = write!(out, "{:02x}", byte);
    }
    let path = url.split(['?', '#']).next().unwrap_or(url);
    if let Some((_, ext)) = path.rsplit_once('.') {
        if !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()) {
            out.push('.');
            out.push_str(&ext.to_ascii_lowercase());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{resource_file_name, ResourceStore};
    use crate::store::test_support::TempStore;

    #[test]
    fn file_names_are_stable_and_keep_extension() {
        let a = resource_file_name("https://cdn.example/bg/1.PNG?v=2");
        let b = resource_file_name("https://cdn.example/bg/1.PNG?v=2");
        assert_eq!(a, b);
        assert!(a.ends_with(".png"));
        assert_eq!(a.len(), 64 + 4);
        assert_eq!(resource_file_name("https://cdn.example/effect").len(), 64);
    }

    #[test]
    fn saves_and_loads_bytes_by_url() {
        let temp = TempStore::new();
        let resources = ResourceStore::new(temp.store.clone());
        let url = "https://cdn.example/effect/7.json";
        assert!(!resources.contains(url));
        assert_eq!(resources.load(url), None);

        let path = resources.save(url, b"{\"frames\":[]}").unwrap();
        assert!(path.starts_with(temp.store.resource_dir()));
        assert!(resources.contains(url));
        assert_eq!(resources.load(url).unwrap(), b"{\"frames\":[]}".to_vec());
    }
}
