use std::error::Error;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use crate::db;
use crate::domain::day::Day;
use crate::store::LocalStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlagKind {
    Bool,
    Int,
    Day,
    Text,
}

impl FlagKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FlagKind::Bool => "bool",
            FlagKind::Int => "int",
            FlagKind::Day => "day",
            FlagKind::Text => "text",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlagKey {
    ShouldShowOnboarding,
    ApnsToken,
    FirebaseToken,
    ShouldShowAppStoreReviewRequest,
    LastRecordDay,
    SecondToLastRecordDay,
    ShouldShowEmptyRecordToolTip,
    ShouldShowBottleCalendarTopBanner,
    ShouldShowRequestNotificationPermission,
    ShouldShowBottleCalendarToolTip,
    StreakSubmitCount,
    ShouldShowRewardEventBottomSheet,
    ShouldShowDecorationGuideBottomSheet,
    ShouldShowDecorationSaveAlert,
    LastNewBottleGuideDay,
    ShouldShowRewardToolTip,
    ShouldShowRecordGuideBottomSheet,
    AppVersion,
}

impl FlagKey {
    pub const ALL: [FlagKey; 18] = [
        FlagKey::ShouldShowOnboarding,
        FlagKey::ApnsToken,
        FlagKey::FirebaseToken,
        FlagKey::ShouldShowAppStoreReviewRequest,
        FlagKey::LastRecordDay,
        FlagKey::SecondToLastRecordDay,
        FlagKey::ShouldShowEmptyRecordToolTip,
        FlagKey::ShouldShowBottleCalendarTopBanner,
        FlagKey::ShouldShowRequestNotificationPermission,
        FlagKey::ShouldShowBottleCalendarToolTip,
        FlagKey::StreakSubmitCount,
        FlagKey::ShouldShowRewardEventBottomSheet,
        FlagKey::ShouldShowDecorationGuideBottomSheet,
        FlagKey::ShouldShowDecorationSaveAlert,
        FlagKey::LastNewBottleGuideDay,
        FlagKey::ShouldShowRewardToolTip,
        FlagKey::ShouldShowRecordGuideBottomSheet,
        FlagKey::AppVersion,
    ];

    /// Storage key. The first three keep their legacy upper-case names.
    pub fn key(self) -> &'static str {
        match self {
            FlagKey::ShouldShowOnboarding => "IS_SHOWN_ONBOARDING",
            FlagKey::ApnsToken => "APNS_TOKEN",
            FlagKey::FirebaseToken => "FIREBASE_TOKEN",
            FlagKey::ShouldShowAppStoreReviewRequest => "shouldShowAppStoreReviewRequest",
            FlagKey::LastRecordDay => "lastRecordDay",
            FlagKey::SecondToLastRecordDay => "secondToLastRecordDay",
            FlagKey::ShouldShowEmptyRecordToolTip => "shouldShowEmptyRecordToolTip",
            FlagKey::ShouldShowBottleCalendarTopBanner => "shouldShowBottleCalendarTopBanner",
            FlagKey::ShouldShowRequestNotificationPermission => {
                "shouldShowRequestNotificationPermission"
            }
            FlagKey::ShouldShowBottleCalendarToolTip => "shouldShowBottleCalendarToolTip",
            FlagKey::StreakSubmitCount => "streakSubmitCount",
            FlagKey::ShouldShowRewardEventBottomSheet => "shouldShowRewardEventBottomSheet",
            FlagKey::ShouldShowDecorationGuideBottomSheet => {
                "shouldShowDecorationGuideBottomSheet"
            }
            FlagKey::ShouldShowDecorationSaveAlert => "shouldShowDecorationSaveAlert",
            FlagKey::LastNewBottleGuideDay => "lastNewBottleGuideDay",
            FlagKey::ShouldShowRewardToolTip => "shouldShowRewardToolTip",
            FlagKey::ShouldShowRecordGuideBottomSheet => "shouldShowRecordGuideBottomSheet",
            FlagKey::AppVersion => "appVersion",
        }
    }

    pub fn kind(self) -> FlagKind {
        match self {
            FlagKey::ApnsToken | FlagKey::FirebaseToken | FlagKey::AppVersion => FlagKind::Text,
            FlagKey::LastRecordDay
            | FlagKey::SecondToLastRecordDay
            | FlagKey::LastNewBottleGuideDay => FlagKind::Day,
            FlagKey::StreakSubmitCount => FlagKind::Int,
            _ => FlagKind::Bool,
        }
    }

    pub fn default_value(self) -> &'static str {
        match self {
            FlagKey::ShouldShowOnboarding | FlagKey::ShouldShowRewardToolTip => "false",
            FlagKey::ApnsToken | FlagKey::FirebaseToken => "",
            FlagKey::LastRecordDay
            | FlagKey::SecondToLastRecordDay
            | FlagKey::LastNewBottleGuideDay => "0000-00-00",
            FlagKey::StreakSubmitCount => "0",
            FlagKey::AppVersion => "0.0.0",
            _ => "true",
        }
    }
}

impl fmt::Display for FlagKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for FlagKey {
    type Err = FlagError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        FlagKey::ALL
            .iter()
            .copied()
            .find(|key| key.key().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| FlagError::UnknownKey(value.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlagError {
    UnknownKey(String),
    InvalidValue {
        key: FlagKey,
        value: String,
    },
}

impl fmt::Display for FlagError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlagError::UnknownKey(key) => write!(f, "unknown flag '{}'", key),
            FlagError::InvalidValue { key, value } => write!(
                f,
                "invalid value '{}' for flag '{}': expected {}",
                value,
                key,
                key.kind().as_str()
            ),
        }
    }
}

impl Error for FlagError {}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FlagEntry {
    pub key: &'static str,
    pub kind: &'static str,
    pub value: String,
    pub is_default: bool,
}

/// Typed view over the persistent `flags` table. Reads fall back to the
/// key's default; write failures are logged and dropped.
#[derive(Clone)]
pub struct Settings {
    store: Arc<LocalStore>,
}

impl Settings {
    pub fn new(store: Arc<LocalStore>) -> Self {
        Self { store }
    }

    fn raw(&self, key: FlagKey) -> Option<String> {
        let conn = self.store.conn();
        match db::get_flag(&conn, key.key()) {
            Ok(value) => value,
            Err(err) => {
                warn!(flag = key.key(), error = %err, "failed to read flag");
                None
            }
        }
    }

    fn write(&self, key: FlagKey, value: &str) {
        let conn = self.store.conn();
        if let Err(err) = db::set_flag(&conn, key.key(), value) {
            warn!(flag = key.key(), error = %err, "failed to write flag");
        }
    }

    pub fn get_text(&self, key: FlagKey) -> String {
        self.raw(key)
            .unwrap_or_else(|| key.default_value().to_string())
    }

    pub fn set_text(&self, key: FlagKey, value: &str) {
        self.write(key, value);
    }

    pub fn get_bool(&self, key: FlagKey) -> bool {
        self.raw(key)
            .and_then(|raw| raw.parse::<bool>().ok())
            .unwrap_or(key.default_value() == "true")
    }

    pub fn set_bool(&self, key: FlagKey, value: bool) {
        self.write(key, if value { "true" } else { "false" });
    }

    pub fn get_int(&self, key: FlagKey) -> i64 {
        self.raw(key)
            .and_then(|raw| raw.parse::<i64>().ok())
            .unwrap_or_else(|| key.default_value().parse().unwrap_or(0))
    }

    pub fn set_int(&self, key: FlagKey, value: i64) {
        self.write(key, &value.to_string());
    }

    pub fn get_day(&self, key: FlagKey) -> Day {
        self.raw(key)
            .and_then(|raw| Day::from_str(&raw).ok())
            .unwrap_or(Day::MIN)
    }

    pub fn set_day(&self, key: FlagKey, value: Day) {
        self.write(key, &value.yyyymmdd());
    }

    /// Validates `value` against the key's kind before storing it.
    pub fn set_raw(&self, key: FlagKey, value: &str) -> Result<(), FlagError> {
        let invalid = || FlagError::InvalidValue {
            key,
            value: value.to_string(),
        };
        let normalized = match key.kind() {
            FlagKind::Bool => value.trim().parse::<bool>().map_err(|_| invalid())?.to_string(),
            FlagKind::Int => value.trim().parse::<i64>().map_err(|_| invalid())?.to_string(),
            FlagKind::Day => Day::from_str(value).map_err(|_| invalid())?.yyyymmdd(),
            FlagKind::Text => value.to_string(),
        };
        self.write(key, &normalized);
        Ok(())
    }

    pub fn entries(&self) -> Vec<FlagEntry> {
        FlagKey::ALL
            .iter()
            .map(|key| {
                let stored = self.raw(*key);
                FlagEntry {
                    key: key.key(),
                    kind: key.kind().as_str(),
                    is_default: stored.is_none(),
                    value: stored.unwrap_or_else(|| key.default_value().to_string()),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{FlagError, FlagKey, Settings};
    use crate::domain::day::Day;
    use crate::store::test_support::TempStore;
    use std::str::FromStr;

    #[test]
    fn unset_flags_read_their_defaults() {
        let temp = TempStore::new();
        let settings = Settings::new(temp.store.clone());
        assert!(!settings.get_bool(FlagKey::ShouldShowOnboarding));
        assert!(settings.get_bool(FlagKey::ShouldShowAppStoreReviewRequest));
        assert!(!settings.get_bool(FlagKey::ShouldShowRewardToolTip));
        assert_eq!(settings.get_int(FlagKey::StreakSubmitCount), 0);
        assert_eq!(settings.get_day(FlagKey::LastRecordDay), Day::MIN);
        assert_eq!(settings.get_text(FlagKey::AppVersion), "0.0.0");
        assert_eq!(settings.get_text(FlagKey::FirebaseToken), "");
    }

    #[test]
    fn typed_writes_round_trip() {
        let temp = TempStore::new();
        let settings = Settings::new(temp.store.clone());
        let day = Day::new(2025, 5, 9).unwrap();
        settings.set_bool(FlagKey::ShouldShowBottleCalendarTopBanner, false);
        settings.set_int(FlagKey::StreakSubmitCount, 4);
        settings.set_day(FlagKey::LastRecordDay, day);

        assert!(!settings.get_bool(FlagKey::ShouldShowBottleCalendarTopBanner));
        assert_eq!(settings.get_int(FlagKey::StreakSubmitCount), 4);
        assert_eq!(settings.get_day(FlagKey::LastRecordDay), day);
    }

    #[test]
    fn raw_writes_are_validated_by_kind() {
        let temp = TempStore::new();
        let settings = Settings::new(temp.store.clone());
        assert!(matches!(
            settings.set_raw(FlagKey::StreakSubmitCount, "many"),
            Err(FlagError::InvalidValue { .. })
        ));
        settings
            .set_raw(FlagKey::LastNewBottleGuideDay, "2025-04-01")
            .unwrap();
        assert_eq!(
            settings.get_day(FlagKey::LastNewBottleGuideDay),
            Day::new(2025, 4, 1).unwrap()
        );
    }

    #[test]
    fn keys_parse_by_storage_name() {
        assert_eq!(
            FlagKey::from_str("IS_SHOWN_ONBOARDING").unwrap(),
            FlagKey::ShouldShowOnboarding
        );
        assert_eq!(
            FlagKey::from_str("streaksubmitcount").unwrap(),
            FlagKey::StreakSubmitCount
        );
        assert!(FlagKey::from_str("nope").is_err());
    }

    #[test]
    fn entries_list_every_key_once() {
        let temp = TempStore::new();
        let settings = Settings::new(temp.store.clone());
        settings.set_bool(FlagKey::ShouldShowOnboarding, true);
        let entries = settings.entries();
        assert_eq!(entries.len(), FlagKey::ALL.len());
        let onboarding = entries
            .iter()
            .find(|entry| entry.key == "IS_SHOWN_ONBOARDING")
            .unwrap();
        assert!(!onboarding.is_default);
        assert_eq!(onboarding.value, "true");
    }
}
