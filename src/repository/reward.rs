use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::reward::{group_by_category, EquippedRewards, Reward, RewardsByCategory};
use crate::identity::IdentityStore;
use crate::network::dto::{rewards_into_domain, RewardSaveRequest};
use crate::network::{DonmaniApi, NetworkError};
use crate::store::rewards::RewardStore;

/// Ids of the four slots saved for a month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EquippedIds {
    pub background_id: i64,
    pub effect_id: i64,
    pub decoration_id: i64,
    pub bottle_id: i64,
}

#[async_trait]
pub trait RewardRepository: Send + Sync {
    fn save_equipped_items(&self, year: i32, month: u8, items: &[Reward]);
    fn load_equipped_items(&self, year: i32, month: u8) -> EquippedRewards;
    fn save_reward(&self, item: &Reward);
    fn save_rewards(&self, items: &[Reward]);
    fn load_rewards(&self) -> RewardsByCategory;
    fn mark_hidden_read(&self, id: i64);

    async fn get_user_reward_items(&self) -> Result<RewardsByCategory, NetworkError>;
    async fn get_not_open_reward_count(&self) -> Result<i64, NetworkError>;
    async fn get_monthly_reward_item(&self, year: i32, month: u8)
        -> Result<Vec<Reward>, NetworkError>;
    async fn put_hidden_read(&self, year: i32, month: u8) -> Result<(), NetworkError>;
    async fn put_open_reward(&self) -> Result<Vec<Reward>, NetworkError>;
    async fn put_save_reward(
        &self,
        year: i32,
        month: u8,
        ids: EquippedIds,
    ) -> Result<(), NetworkError>;
}

pub struct DefaultRewardRepository {
    api: Arc<DonmaniApi>,
    identity: Arc<IdentityStore>,
    store: RewardStore,
}

impl DefaultRewardRepository {
    pub fn new(api: Arc<DonmaniApi>, identity: Arc<IdentityStore>, store: RewardStore) -> Self {
        Self {
            api,
            identity,
            store,
        }
    }
}

#[async_trait]
impl RewardRepository for DefaultRewardRepository {
    fn save_equipped_items(&self, year: i32, month: u8, items: &[Reward]) {
        self.store.save_equipped(year, month, items);
    }

    fn load_equipped_items(&self, year: i32, month: u8) -> EquippedRewards {
        self.store.load_equipped(year, month)
    }

    fn save_reward(&self, item: &Reward) {
        self.store.save(item);
    }

    fn save_rewards(&self, items: &[Reward]) {
        self.store.save_all(items);
    }

    fn load_rewards(&self) -> RewardsByCategory {
        self.store.load_all()
    }

    fn mark_hidden_read(&self, id: i64) {
        self.store.mark_hidden_read(id);
    }

    async fn get_user_reward_items(&self) -> Result<RewardsByCategory, NetworkError> {
        let dtos = self.api.get_user_rewards(&self.identity.user_key()).await?;
        Ok(group_by_category(rewards_into_domain(dtos)))
    }

    async fn get_not_open_reward_count(&self) -> Result<i64, NetworkError> {
        self.api
            .get_not_opened_reward_count(&self.identity.user_key())
            .await
    }

    async fn get_monthly_reward_item(
        &self,
        year: i32,
        month: u8,
    ) -> Result<Vec<Reward>, NetworkError> {
        let dtos = self
            .api
            .get_monthly_rewards(&self.identity.user_key(), year, month)
            .await?;
        Ok(rewards_into_domain(dtos))
    }

    async fn put_hidden_read(&self, year: i32, month: u8) -> Result<(), NetworkError> {
        self.api
            .put_hidden_read(&self.identity.user_key(), year, month)
            .await
    }

    async fn put_open_reward(&self) -> Result<Vec<Reward>, NetworkError> {
        let dtos = self.api.put_open_reward(&self.identity.user_key()).await?;
        Ok(rewards_into_domain(dtos))
    }

    async fn put_save_reward(
        &self,
        year: i32,
        month: u8,
        ids: EquippedIds,
    ) -> Result<(), NetworkError> {
        let user_key = self.identity.user_key();
        self.api
            .put_save_reward(&RewardSaveRequest {
                user_key: &user_key,
                year,
                month,
                background_id: ids.background_id,
                effect_id: ids.effect_id,
                decoration_id: ids.decoration_id,
                byeoltong_case_id: ids.bottle_id,
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::{DefaultRewardRepository, RewardRepository};
    use crate::domain::reward::RewardCategory;
    use crate::identity::IdentityStore;
    use crate::network::{DonmaniApi, Gateway};
    use crate::store::rewards::RewardStore;
    use crate::store::test_support::TempStore;
    use std::sync::Arc;
    use std::time::Duration;
    use wiremock::matchers::{method, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn user_items_group_by_category_and_skip_unknown() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path_regex(r"^/reward/[0-9A-F-]+$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                { "id": 1, "category": "BACKGROUND", "name": "night" },
                { "id": 2, "category": "BACKGROUND", "name": "day" },
                { "id": 24, "category": "CASE", "name": "bead" },
                { "id": 99, "category": "HAT", "name": "??" }
            ])))
            .mount(&server)
            .await;

        let temp = TempStore::new();
        let identity = Arc::new(IdentityStore::new(temp.root.join("identity.json")));
        identity.generate_uuid().unwrap();
        let repo = DefaultRewardRepository::new(
            Arc::new(DonmaniApi::new(Gateway::new(&server.uri(), Duration::from_secs(2)).unwrap())),
            identity,
            RewardStore::new(temp.store.clone()),
        );
        let owned = repo.get_user_reward_items().await.unwrap();
        assert_eq!(owned[&RewardCategory::Background].len(), 2);
        assert_eq!(owned[&RewardCategory::Bottle][0].id, 24);
        assert_eq!(owned.values().map(Vec::len).sum::<usize>(), 3);
        assert!(repo.load_rewards().is_empty());
    }
}
