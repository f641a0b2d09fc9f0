//! Notification payloads and where opening one leads.

use serde::{Deserialize, Serialize};

use crate::domain::day::DayType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PushDestination {
    Today,
    Yesterday,
    Main,
}

impl PushDestination {
    pub fn as_str(self) -> &'static str {
        match self {
            PushDestination::Today => "today",
            PushDestination::Yesterday => "yesterday",
            PushDestination::Main => "main",
        }
    }

    /// Whether opening the notification should land on the record entry.
    pub fn opens_record_entry(self) -> bool {
        !matches!(self, PushDestination::Main)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushPayload {
    #[serde(default)]
    pub destination: Option<PushDestination>,
    #[serde(default)]
    pub title: Option<String>,
}

impl PushPayload {
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// The typed field wins. Older payloads only carry a title, which is
    /// matched against the day labels.
    pub fn destination(&self) -> PushDestination {
        if let Some(destination) = self.destination {
            return destination;
        }
        match self.title.as_deref() {
            Some(title) if title.contains(DayType::Yesterday.title()) => {
                PushDestination::Yesterday
            }
            Some(_) => PushDestination::Today,
            None => PushDestination::Main,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{PushDestination, PushPayload};

    #[test]
    fn typed_destination_wins_over_title() {
        let payload =
            PushPayload::parse(r#"{"destination":"main","title":"어제 기록을 잊지 마세요"}"#).unwrap();
        assert_eq!(payload.destination(), PushDestination::Main);
        assert!(!payload.destination().opens_record_entry());
    }

    #[test]
    fn legacy_payloads_fall_back_to_the_title() {
        let yesterday = PushPayload::parse(r#"{"title":"어제 소비 정리해 볼까요?"}"#).unwrap();
        assert_eq!(yesterday.destination(), PushDestination::Yesterday);
        let today = PushPayload::parse(r#"{"title":"오늘 하루 어땠나요?"}"#).unwrap();
        assert_eq!(today.destination(), PushDestination::Today);
        assert_eq!(PushPayload::parse("{}").unwrap().destination(), PushDestination::Main);
    }

    #[test]
    fn unknown_destination_is_rejected() {
        assert!(PushPayload::parse(r#"{"destination":"tomorrow"}"#).is_err());
    }
}
