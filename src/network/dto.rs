//! Wire shapes of the remote API and their conversion into domain values.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::day::Day;
use crate::domain::record::{
    Record, RecordCategory, RecordContent, RecordContentType, RecordEntries,
};
use crate::domain::reward::{equipped_from_list, Reward, RewardCategory};
use crate::domain::summary::{
    AppVersionInfo, CategoryStatistics, FeedbackCard, FeedbackInfo, MonthlyRecordCount,
    MonthlyRecordState, RecordCountSummary, RecordStatistics, User,
};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserKeyRequest<'a> {
    pub user_key: &'a str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserNameRequest<'a> {
    pub user_key: &'a str,
    pub new_user_name: &'a str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTokenRequest<'a> {
    pub user_key: &'a str,
    pub token: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub user_key: String,
    pub user_name: String,
    #[serde(default)]
    pub is_new: bool,
}

impl UserResponse {
    pub fn into_domain(self) -> User {
        User {
            user_key: self.user_key,
            user_name: self.user_name,
            is_new: self.is_new,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NoticeStatusResponse {
    pub read: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RewardStatusResponse {
    pub checked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordContentDto {
    pub flag: RecordContentType,
    pub category: RecordCategory,
    #[serde(default)]
    pub memo: String,
}

/// One day on the wire. `contents == None` is the no-spending marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordDto {
    pub date: String,
    #[serde(default)]
    pub contents: Option<Vec<RecordContentDto>>,
}

impl RecordDto {
    pub fn from_domain(record: &Record) -> Self {
        Self {
            date: record.day.yyyymmdd(),
            contents: record.records.as_ref().map(|entries| {
                entries
                    .iter()
                    .map(|content| RecordContentDto {
                        flag: content.flag,
                        category: content.category,
                        memo: content.memo.clone(),
                    })
                    .collect()
            }),
        }
    }

    /// `None` when the date does not parse; the record is dropped.
    pub fn into_domain(self) -> Option<Record> {
        let day = match Day::from_str(&self.date) {
            Ok(day) => day,
            Err(err) => {
                warn!(error = %err, "dropping record with unparseable date");
                return None;
            }
        };
        let records = self.contents.map(|contents| {
            let mut entries = RecordEntries::default();
            for dto in contents {
                entries.set(RecordContent::new(dto.flag, dto.category, &dto.memo));
            }
            entries
        });
        Some(Record { day, records })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordRequest<'a> {
    pub user_key: &'a str,
    pub records: Vec<RecordDto>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardDto {
    pub id: i64,
    pub category: String,
    pub name: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub json_url: Option<String>,
    #[serde(default)]
    pub sound_url: Option<String>,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub hidden_read: bool,
}

impl RewardDto {
    pub fn into_domain(self) -> Option<Reward> {
        let category = match RewardCategory::from_str(&self.category) {
            Ok(category) => category,
            Err(err) => {
                warn!(reward_id = self.id, error = %err, "dropping reward with unknown category");
                return None;
            }
        };
        Some(Reward {
            id: self.id,
            category,
            name: self.name,
            image_url: self.image_url,
            json_url: self.json_url,
            sound_url: self.sound_url,
            hidden: self.hidden,
            hidden_read: self.hidden_read,
        })
    }
}

pub fn rewards_into_domain(dtos: Vec<RewardDto>) -> Vec<Reward> {
    dtos.into_iter().filter_map(RewardDto::into_domain).collect()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyRecordResponse {
    #[serde(default)]
    pub records: Option<Vec<RecordDto>>,
    #[serde(default)]
    pub decoration_items: Vec<RewardDto>,
    #[serde(default)]
    pub save_items: Vec<RewardDto>,
}

impl MonthlyRecordResponse {
    pub fn into_domain(self) -> MonthlyRecordState {
        let decoration = rewards_into_domain(self.decoration_items);
        MonthlyRecordState {
            records: self.records.map(|records| {
                let mut records: Vec<Record> =
                    records.into_iter().filter_map(RecordDto::into_domain).collect();
                records.sort_by_key(|record| record.day);
                records
            }),
            decoration_item: equipped_from_list(&decoration),
            save_items: rewards_into_domain(self.save_items),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordStatisticsResponse {
    pub year: i32,
    pub month: u8,
    pub good_count: i64,
    pub bad_count: i64,
}

impl RecordStatisticsResponse {
    pub fn into_domain(self) -> RecordStatistics {
        RecordStatistics {
            year: self.year,
            month: self.month,
            good_count: self.good_count,
            bad_count: self.bad_count,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStatisticsResponse {
    pub year: i32,
    pub month: u8,
    #[serde(default)]
    pub category_counts: BTreeMap<String, i64>,
}

impl CategoryStatisticsResponse {
    /// Unknown category names fold into `none`.
    pub fn into_domain(self) -> CategoryStatistics {
        let mut counts = BTreeMap::new();
        for (name, count) in self.category_counts {
            *counts.entry(RecordCategory::from_wire(&name)).or_insert(0) += count;
        }
        CategoryStatistics {
            year: self.year,
            month: self.month,
            counts,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyCountDto {
    pub record_count: i64,
    #[serde(default)]
    pub total_days_count: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearlySummaryResponse {
    pub year: i32,
    #[serde(default)]
    pub monthly_records: BTreeMap<u8, MonthlyCountDto>,
}

impl YearlySummaryResponse {
    pub fn into_domain(self) -> RecordCountSummary {
        RecordCountSummary {
            year: self.year,
            monthly_records: self
                .monthly_records
                .into_iter()
                .filter(|(month, _)| (1..=12).contains(month))
                .map(|(month, dto)| {
                    (
                        month,
                        MonthlyRecordCount {
                            record_count: dto.record_count,
                            total_days_count: dto.total_days_count,
                        },
                    )
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotOpenedCountResponse {
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardSaveRequest<'a> {
    pub user_key: &'a str,
    pub year: i32,
    pub month: u8,
    pub background_id: i64,
    pub effect_id: i64,
    pub decoration_id: i64,
    pub byeoltong_case_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackStateResponse {
    pub is_not_opened: bool,
    pub is_first_open: bool,
    pub total_count: i64,
}

impl FeedbackStateResponse {
    pub fn into_domain(self) -> FeedbackInfo {
        FeedbackInfo {
            is_not_opened: self.is_not_opened,
            is_first_open: self.is_first_open,
            total_count: self.total_count,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackCardResponse {
    pub category: String,
    pub title: String,
    pub content: String,
    pub flag_type: bool,
}

impl FeedbackCardResponse {
    pub fn into_domain(self) -> FeedbackCard {
        FeedbackCard {
            category: RecordCategory::from_wire(&self.category),
            title: self.title,
            content: self.content,
            prefix: if self.flag_type { "오늘은" } else { "요즘은" }.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppVersionResponse {
    pub latest_version: String,
    #[serde(default)]
    pub forced_update_yn: String,
}

impl AppVersionResponse {
    pub fn into_domain(self) -> AppVersionInfo {
        AppVersionInfo {
            latest_version: self.latest_version,
            is_update_required: self.forced_update_yn.eq_ignore_ascii_case("y"),
        }
    }
}
