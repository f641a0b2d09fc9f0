use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::network::{DonmaniApi, NetworkError};
use crate::store::resources::ResourceStore;

/// Reward resource payloads: remote download plus the on-disk cache.
#[async_trait]
pub trait FileRepository: Send + Sync {
    async fn download(&self, url: &str) -> Result<Vec<u8>, NetworkError>;
    fn save(&self, url: &str, bytes: &[u8]);
    fn load(&self, url: &str) -> Option<Vec<u8>>;
    fn contains(&self, url: &str) -> bool;
}

pub struct DefaultFileRepository {
    api: Arc<DonmaniApi>,
    store: ResourceStore,
}

impl DefaultFileRepository {
    pub fn new(api: Arc<DonmaniApi>, store: ResourceStore) -> Self {
        Self { api, store }
    }
}

#[async_trait]
impl FileRepository for DefaultFileRepository {
    async fn download(&self, url: &str) -> Result<Vec<u8>, NetworkError> {
        self.api.download(url).await
    }

    fn save(&self, url: &str, bytes: &[u8]) {
        if let Err(err) = self.store.save(url, bytes) {
            warn!(url, error = %err, "failed to cache resource");
        }
    }

    fn load(&self, url: &str) -> Option<Vec<u8>> {
        self.store.load(url)
    }

    fn contains(&self, url: &str) -> bool {
        self.store.contains(url)
    }
}
