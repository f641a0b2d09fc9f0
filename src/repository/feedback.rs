use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::summary::{FeedbackCard, FeedbackInfo};
use crate::identity::IdentityStore;
use crate::network::{DonmaniApi, NetworkError};

#[async_trait]
pub trait FeedbackRepository: Send + Sync {
    async fn get_feedback_state(&self) -> Result<FeedbackInfo, NetworkError>;
    async fn get_feedback_card(&self) -> Result<FeedbackCard, NetworkError>;
}

pub struct DefaultFeedbackRepository {
    api: Arc<DonmaniApi>,
    identity: Arc<IdentityStore>,
}

impl DefaultFeedbackRepository {
    pub fn new(api: Arc<DonmaniApi>, identity: Arc<IdentityStore>) -> Self {
        Self { api, identity }
    }
}

#[async_trait]
impl FeedbackRepository for DefaultFeedbackRepository {
    async fn get_feedback_state(&self) -> Result<FeedbackInfo, NetworkError> {
        Ok(self
            .api
            .get_feedback_state(&self.identity.user_key())
            .await?
            .into_domain())
    }

    async fn get_feedback_card(&self) -> Result<FeedbackCard, NetworkError> {
        Ok(self
            .api
            .get_feedback_card(&self.identity.user_key())
            .await?
            .into_domain())
    }
}
