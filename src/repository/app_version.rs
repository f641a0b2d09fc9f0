use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::summary::AppVersionInfo;
use crate::network::{DonmaniApi, NetworkError};

#[async_trait]
pub trait AppVersionRepository: Send + Sync {
    async fn get_latest_app_version(&self) -> Result<AppVersionInfo, NetworkError>;
    fn current_app_version(&self) -> String;
}

pub struct DefaultAppVersionRepository {
    api: Arc<DonmaniApi>,
}

impl DefaultAppVersionRepository {
    pub fn new(api: Arc<DonmaniApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl AppVersionRepository for DefaultAppVersionRepository {
    async fn get_latest_app_version(&self) -> Result<AppVersionInfo, NetworkError> {
        Ok(self.api.get_app_version().await?.into_domain())
    }

    fn current_app_version(&self) -> String {
        env!("CARGO_PKG_VERSION").to_string()
    }
}
