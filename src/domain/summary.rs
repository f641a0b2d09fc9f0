use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::record::{Record, RecordCategory, RecordContentType};
use super::reward::{EquippedRewards, Reward};

/// Month records plus the rewards equipped for that month.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonthlyRecordState {
    pub records: Option<Vec<Record>>,
    pub decoration_item: EquippedRewards,
    pub save_items: Vec<Reward>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyRecordCount {
    pub record_count: i64,
    pub total_days_count: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordCountSummary {
    pub year: i32,
    pub monthly_records: BTreeMap<u8, MonthlyRecordCount>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordStatistics {
    pub year: i32,
    pub month: u8,
    pub good_count: i64,
    pub bad_count: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryStatistics {
    pub year: i32,
    pub month: u8,
    pub counts: BTreeMap<RecordCategory, i64>,
}

impl CategoryStatistics {
    /// Category counts of a record list, computed locally.
    pub fn from_records(year: i32, month: u8, records: &[Record]) -> Self {
        let mut counts = BTreeMap::new();
        for record in records {
            for content in record.contents() {
                *counts.entry(content.category).or_insert(0) += 1;
            }
        }
        Self {
            year,
            month,
            counts,
        }
    }

    /// Categories of one flag ordered by count, most frequent first.
    pub fn ranked(&self, flag: RecordContentType) -> Vec<(RecordCategory, i64)> {
        let mut ranked = RecordCategory::cases(flag)
            .iter()
            .map(|category| (*category, self.counts.get(category).copied().unwrap_or(0)))
            .filter(|(_, count)| *count > 0)
            .collect::<Vec<_>>();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackCard {
    pub category: RecordCategory,
    pub title: String,
    pub content: String,
    pub prefix: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackInfo {
    pub is_not_opened: bool,
    pub is_first_open: bool,
    pub total_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_key: String,
    pub user_name: String,
    pub is_new: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppVersionInfo {
    pub latest_version: String,
    pub is_update_required: bool,
}

/// Compares dotted numeric versions; missing components count as zero.
pub fn is_latest_version(store_version: &str, current_version: &str) -> bool {
    let parse = |raw: &str| -> Vec<u64> {
        raw.trim()
            .split('.')
            .map(|part| part.trim().parse::<u64>().unwrap_or(0))
            .collect()
    };
    let store = parse(store_version);
    let current = parse(current_version);
    let len = store.len().max(current.len());
    for index in 0..len {
        let s = store.get(index).copied().unwrap_or(0);
        let c = current.get(index).copied().unwrap_or(0);
        if c != s {
            return c > s;
        }
    }
    true
}
