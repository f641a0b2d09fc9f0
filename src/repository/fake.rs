//! In-memory stand-in for every repository, used by reducer and
//! coordinator tests.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::reward::EquippedIds;
use super::{
    AppVersionRepository, Dependencies, FeedbackRepository, FileRepository, RecordRepository,
    RewardRepository, UserRepository,
};
use crate::domain::clock::Clock;
use crate::domain::day::Day;
use crate::domain::record::Record;
use crate::domain::reward::{
    equipped_from_list, group_by_category, EquippedRewards, Reward, RewardsByCategory,
};
use crate::domain::summary::{
    AppVersionInfo, CategoryStatistics, FeedbackCard, FeedbackInfo, MonthlyRecordState,
    RecordCountSummary, RecordStatistics, User,
};
use crate::network::NetworkError;

#[derive(Default)]
pub struct FakeData {
    pub local_records: BTreeMap<Day, Record>,
    pub posted: Vec<Record>,
    pub remote_months: BTreeMap<(i32, u8), MonthlyRecordState>,
    pub summary: RecordCountSummary,
    pub equipped: BTreeMap<(i32, u8), EquippedRewards>,
    pub owned_local: Vec<Reward>,
    pub owned_remote: Vec<Reward>,
    pub monthly_remote: Vec<Reward>,
    pub not_opened_count: i64,
    pub openable: Vec<Reward>,
    pub saved_equipped: Vec<(i32, u8, EquippedIds)>,
    pub hidden_reads: Vec<(i32, u8)>,
    pub user: Option<User>,
    pub user_name: String,
    pub notice_read: bool,
    pub reward_checked: bool,
    pub feedback_info: FeedbackInfo,
    pub feedback_card: Option<FeedbackCard>,
    pub local_files: BTreeMap<String, Vec<u8>>,
    pub remote_files: BTreeMap<String, Vec<u8>>,
    pub latest_version: Option<AppVersionInfo>,
    pub calls: Vec<String>,
}

#[derive(Default)]
pub struct FakeBackend {
    pub data: Mutex<FakeData>,
    offline: AtomicBool,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn with<T>(&self, f: impl FnOnce(&mut FakeData) -> T) -> T {
        let mut data = self.data.lock().unwrap_or_else(|p| p.into_inner());
        f(&mut data)
    }

    pub fn calls(&self) -> Vec<String> {
        self.with(|data| data.calls.clone())
    }

    fn remote(&self, name: &str) -> Result<(), NetworkError> {
        self.with(|data| data.calls.push(name.to_string()));
        if self.offline.load(Ordering::SeqCst) {
            Err(NetworkError::RequestFailed)
        } else {
            Ok(())
        }
    }

    pub fn dependencies(self: &Arc<Self>, clock: Arc<dyn Clock>) -> Dependencies {
        Dependencies {
            records: self.clone(),
            rewards: self.clone(),
            users: self.clone(),
            feedback: self.clone(),
            files: self.clone(),
            app_version: self.clone(),
            clock,
        }
    }
}

#[async_trait]
impl RecordRepository for FakeBackend {
    fn save(&self, record: &Record) {
        self.with(|data| data.local_records.insert(record.day, record.clone()));
    }

    fn load(&self, day: Day) -> Option<Record> {
        self.with(|data| data.local_records.get(&day).cloned())
    }

    fn save_records(&self, records: &[Record]) {
        for record in records {
            RecordRepository::save(self, record);
        }
    }

    fn load_records(&self, year: i32, month: u8) -> Option<Vec<Record>> {
        let records: Vec<Record> = self.with(|data| {
            data.local_records
                .values()
                .filter(|record| record.day.year == year && record.day.month == month)
                .cloned()
                .collect()
        });
        if records.is_empty() {
            None
        } else {
            Some(records)
        }
    }

    async fn post_record(&self, record: &Record) -> Result<(), NetworkError> {
        self.remote("post_record")?;
        self.with(|data| data.posted.push(record.clone()));
        Ok(())
    }

    async fn get_monthly_record_list(
        &self,
        year: i32,
        month: u8,
    ) -> Result<MonthlyRecordState, NetworkError> {
        self.remote("get_monthly_record_list")?;
        Ok(self.with(|data| {
            data.remote_months
                .get(&(year, month))
                .cloned()
                .unwrap_or_default()
        }))
    }

    async fn get_monthly_record_calendar(
        &self,
        year: i32,
        month: u8,
    ) -> Result<MonthlyRecordState, NetworkError> {
        self.remote("get_monthly_record_calendar")?;
        Ok(self.with(|data| {
            data.remote_months
                .get(&(year, month))
                .cloned()
                .unwrap_or_default()
        }))
    }

    async fn get_monthly_record_statistics(
        &self,
        year: i32,
        month: u8,
    ) -> Result<RecordStatistics, NetworkError> {
        self.remote("get_monthly_record_statistics")?;
        Ok(RecordStatistics {
            year,
            month,
            ..RecordStatistics::default()
        })
    }

    async fn get_monthly_category_statistics(
        &self,
        year: i32,
        month: u8,
    ) -> Result<CategoryStatistics, NetworkError> {
        self.remote("get_monthly_category_statistics")?;
        let records = self.load_records(year, month).unwrap_or_default();
        Ok(CategoryStatistics::from_records(year, month, &records))
    }

    async fn get_yearly_record_summary(
        &self,
        year: i32,
    ) -> Result<RecordCountSummary, NetworkError> {
        self.remote("get_yearly_record_summary")?;
        Ok(self.with(|data| {
            let mut summary = data.summary.clone();
            summary.year = year;
            summary
        }))
    }
}

#[async_trait]
impl RewardRepository for FakeBackend {
    fn save_equipped_items(&self, year: i32, month: u8, items: &[Reward]) {
        self.with(|data| {
            data.equipped.insert((year, month), equipped_from_list(items));
        });
    }

    fn load_equipped_items(&self, year: i32, month: u8) -> EquippedRewards {
        self.with(|data| data.equipped.get(&(year, month)).cloned().unwrap_or_default())
    }

    fn save_reward(&self, item: &Reward) {
        self.with(|data| {
            data.owned_local.retain(|owned| owned.id != item.id);
            data.owned_local.push(item.clone());
        });
    }

    fn save_rewards(&self, items: &[Reward]) {
        for item in items {
            self.save_reward(item);
        }
    }

    fn load_rewards(&self) -> RewardsByCategory {
        self.with(|data| group_by_category(data.owned_local.clone()))
    }

    fn mark_hidden_read(&self, id: i64) {
        self.with(|data| {
            for reward in data.owned_local.iter_mut().filter(|reward| reward.id == id) {
                reward.hidden_read = true;
            }
        });
    }

    async fn get_user_reward_items(&self) -> Result<RewardsByCategory, NetworkError> {
        self.remote("get_user_reward_items")?;
        Ok(self.with(|data| group_by_category(data.owned_remote.clone())))
    }

    async fn get_not_open_reward_count(&self) -> Result<i64, NetworkError> {
        self.remote("get_not_open_reward_count")?;
        Ok(self.with(|data| data.not_opened_count))
    }

    async fn get_monthly_reward_item(
        &self,
        _year: i32,
        _month: u8,
    ) -> Result<Vec<Reward>, NetworkError> {
        self.remote("get_monthly_reward_item")?;
        Ok(self.with(|data| data.monthly_remote.clone()))
    }

    async fn put_hidden_read(&self, year: i32, month: u8) -> Result<(), NetworkError> {
        self.remote("put_hidden_read")?;
        self.with(|data| data.hidden_reads.push((year, month)));
        Ok(())
    }

    async fn put_open_reward(&self) -> Result<Vec<Reward>, NetworkError> {
        self.remote("put_open_reward")?;
        Ok(self.with(|data| {
            let opened = std::mem::take(&mut data.openable);
            data.owned_remote.extend(opened.iter().cloned());
            data.not_opened_count = 0;
            opened
        }))
    }

    async fn put_save_reward(
        &self,
        year: i32,
        month: u8,
        ids: EquippedIds,
    ) -> Result<(), NetworkError> {
        self.remote("put_save_reward")?;
        self.with(|data| data.saved_equipped.push((year, month, ids)));
        Ok(())
    }
}

#[async_trait]
impl UserRepository for FakeBackend {
    async fn register_user(&self) -> Result<User, NetworkError> {
        self.remote("register_user")?;
        Ok(self.with(|data| {
            let user = data.user.clone().unwrap_or(User {
                user_key: "FAKE-KEY".to_string(),
                user_name: "별별이".to_string(),
                is_new: false,
            });
            data.user_name = user.user_name.clone();
            user
        }))
    }

    fn get_user_name(&self) -> String {
        self.with(|data| data.user_name.clone())
    }

    async fn update_user_name(&self, new_user_name: &str) -> Result<User, NetworkError> {
        self.remote("update_user_name")?;
        Ok(self.with(|data| {
            data.user_name = new_user_name.to_string();
            User {
                user_key: "FAKE-KEY".to_string(),
                user_name: new_user_name.to_string(),
                is_new: false,
            }
        }))
    }

    async fn post_update_token(&self, token: &str) -> Result<String, NetworkError> {
        self.remote("post_update_token")?;
        Ok(token.to_string())
    }

    async fn put_last_login(&self) -> Result<(), NetworkError> {
        self.remote("put_last_login")
    }

    async fn put_notice_status(&self) -> Result<(), NetworkError> {
        self.remote("put_notice_status")?;
        self.with(|data| data.notice_read = true);
        Ok(())
    }

    async fn get_notice_status(&self) -> Result<bool, NetworkError> {
        self.remote("get_notice_status")?;
        Ok(self.with(|data| data.notice_read))
    }

    async fn put_reward_status(&self) -> Result<(), NetworkError> {
        self.remote("put_reward_status")?;
        self.with(|data| data.reward_checked = true);
        Ok(())
    }

    async fn get_reward_status(&self) -> Result<bool, NetworkError> {
        self.remote("get_reward_status")?;
        Ok(self.with(|data| data.reward_checked))
    }
}

#[async_trait]
impl FeedbackRepository for FakeBackend {
    async fn get_feedback_state(&self) -> Result<FeedbackInfo, NetworkError> {
        self.remote("get_feedback_state")?;
        Ok(self.with(|data| data.feedback_info))
    }

    async fn get_feedback_card(&self) -> Result<FeedbackCard, NetworkError> {
        self.remote("get_feedback_card")?;
        self.with(|data| data.feedback_card.clone())
            .ok_or(NetworkError::ServerError { status_code: 404 })
    }
}

#[async_trait]
impl FileRepository for FakeBackend {
    async fn download(&self, url: &str) -> Result<Vec<u8>, NetworkError> {
        self.remote("download")?;
        self.with(|data| data.remote_files.get(url).cloned())
            .ok_or(NetworkError::ServerError { status_code: 404 })
    }

    fn save(&self, url: &str, bytes: &[u8]) {
        self.with(|data| data.local_files.insert(url.to_string(), bytes.to_vec()));
    }

    fn load(&self, url: &str) -> Option<Vec<u8>> {
        self.with(|data| data.local_files.get(url).cloned())
    }

    fn contains(&self, url: &str) -> bool {
        self.with(|data| data.local_files.contains_key(url))
    }
}

#[async_trait]
impl AppVersionRepository for FakeBackend {
    async fn get_latest_app_version(&self) -> Result<AppVersionInfo, NetworkError> {
        self.remote("get_latest_app_version")?;
        self.with(|data| data.latest_version.clone())
            .ok_or(NetworkError::ServerError { status_code: 404 })
    }

    fn current_app_version(&self) -> String {
        "1.0.0".to_string()
    }
}
