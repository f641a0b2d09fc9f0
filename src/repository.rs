use std::sync::Arc;

use crate::domain::clock::Clock;
use crate::identity::IdentityStore;
use crate::network::DonmaniApi;
use crate::store::records::RecordStore;
use crate::store::resources::ResourceStore;
use crate::store::rewards::RewardStore;
use crate::store::LocalStore;

pub mod app_version;
pub mod feedback;
pub mod file;
pub mod record;
pub mod reward;
pub mod user;

#[cfg(test)]
pub mod fake;

pub use app_version::{AppVersionRepository, DefaultAppVersionRepository};
pub use feedback::{DefaultFeedbackRepository, FeedbackRepository};
pub use file::{DefaultFileRepository, FileRepository};
pub use record::{DefaultRecordRepository, RecordRepository};
pub use reward::{DefaultRewardRepository, RewardRepository};
pub use user::{DefaultUserRepository, UserRepository};

/// Everything a reducer's effects may reach. Cheap to clone; handed to every
/// reducer and captured by async effects.
#[derive(Clone)]
pub struct Dependencies {
    pub records: Arc<dyn RecordRepository>,
    pub rewards: Arc<dyn RewardRepository>,
    pub users: Arc<dyn UserRepository>,
    pub feedback: Arc<dyn FeedbackRepository>,
    pub files: Arc<dyn FileRepository>,
    pub app_version: Arc<dyn AppVersionRepository>,
    pub clock: Arc<dyn Clock>,
}

impl Dependencies {
    pub fn live(
        api: Arc<DonmaniApi>,
        store: Arc<LocalStore>,
        identity: Arc<IdentityStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            records: Arc::new(DefaultRecordRepository::new(
                api.clone(),
                identity.clone(),
                RecordStore::new(store.clone()),
            )),
            rewards: Arc::new(DefaultRewardRepository::new(
                api.clone(),
                identity.clone(),
                RewardStore::new(store.clone()),
            )),
            users: Arc::new(DefaultUserRepository::new(api.clone(), identity.clone())),
            feedback: Arc::new(DefaultFeedbackRepository::new(api.clone(), identity)),
            files: Arc::new(DefaultFileRepository::new(
                api.clone(),
                ResourceStore::new(store),
            )),
            app_version: Arc::new(DefaultAppVersionRepository::new(api)),
            clock,
        }
    }
}
