use std::str::FromStr;
use std::sync::Arc;

use tracing::warn;

use super::LocalStore;
use crate::db::{self, RewardRow};
use crate::domain::reward::{
    equipped_from_list, group_by_category, EquippedRewards, Reward, RewardCategory,
    RewardsByCategory,
};

/// Local cache of owned rewards and of the rewards equipped per month.
#[derive(Clone)]
pub struct RewardStore {
    store: Arc<LocalStore>,
}

impl RewardStore {
    pub fn new(store: Arc<LocalStore>) -> Self {
        Self { store }
    }

    pub fn save(&self, reward: &Reward) {
        let conn = self.store.conn();
        if let Err(err) = db::upsert_reward(&conn, &to_row(reward)) {
            warn!(reward_id = reward.id, error = %err, "failed to cache reward");
        }
    }

    pub fn save_all(&self, rewards: &[Reward]) {
        for reward in rewards {
            self.save(reward);
        }
    }

    pub fn get(&self, id: i64) -> Option<Reward> {
        let conn = self.store.conn();
        match db::get_reward(&conn, id) {
            Ok(row) => row.and_then(from_row),
            Err(err) => {
                warn!(reward_id = id, error = %err, "failed to read cached reward");
                None
            }
        }
    }

    pub fn load_all(&self) -> RewardsByCategory {
        let conn = self.store.conn();
        match db::list_rewards(&conn) {
            Ok(rows) => group_by_category(rows.into_iter().filter_map(from_row).collect()),
            Err(err) => {
                warn!(error = %err, "failed to read cached rewards");
                RewardsByCategory::new()
            }
        }
    }

    /// Replaces the month's equipped set. The rewards themselves are cached
    /// too so the join on read always resolves.
    pub fn save_equipped(&self, year: i32, month: u8, items: &[Reward]) {
        self.save_all(items);
        let equipped = equipped_from_list(items)
            .into_iter()
            .map(|(category, reward)| (category.as_str().to_string(), reward.id))
            .collect::<Vec<_>>();
        let mut conn = self.store.conn();
        if let Err(err) = db::replace_equipped(&mut conn, year, month, &equipped) {
            warn!(year, month, error = %err, "failed to cache equipped rewards");
        }
    }

    pub fn load_equipped(&self, year: i32, month: u8) -> EquippedRewards {
        let conn = self.store.conn();
        match db::list_equipped(&conn, year, month) {
            Ok(rows) => {
                let rewards: Vec<Reward> = rows.into_iter().filter_map(from_row).collect();
                equipped_from_list(&rewards)
            }
            Err(err) => {
                warn!(year, month, error = %err, "failed to read equipped rewards");
                EquippedRewards::new()
            }
        }
    }

    pub fn mark_hidden_read(&self, id: i64) {
        if let Some(mut reward) = self.get(id) {
            reward.hidden_read = true;
            self.save(&reward);
        }
    }
}

fn to_row(reward: &Reward) -> RewardRow {
    RewardRow {
        id: reward.id,
        category: reward.category.as_str().to_string(),
        name: reward.name.clone(),
        image_url: reward.image_url.clone(),
        json_url: reward.json_url.clone(),
        sound_url: reward.sound_url.clone(),
        hidden: reward.hidden,
        hidden_read: reward.hidden_read,
    }
}

fn from_row(row: RewardRow) -> Option<Reward> {
    let category = match RewardCategory::from_str(&row.category) {
        Ok(category) => category,
        Err(err) => {
            warn!(reward_id = row.id, error = %err, "skipping cached reward");
            return None;
        }
    };
    Some(Reward {
        id: row.id,
        category,
        name: row.name,
        image_url: row.image_url,
        json_url: row.json_url,
        sound_url: row.sound_url,
        hidden: row.hidden,
        hidden_read: row.hidden_read,
    })
}
