use std::error::Error;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::day::Day;

pub const MEMO_MAX_CHARS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordContentType {
    Good,
    Bad,
}

impl RecordContentType {
    pub const ALL: [RecordContentType; 2] = [RecordContentType::Good, RecordContentType::Bad];

    pub fn as_str(self) -> &'static str {
        match self {
            RecordContentType::Good => "good",
            RecordContentType::Bad => "bad",
        }
    }

    pub fn wire(self) -> &'static str {
        match self {
            RecordContentType::Good => "GOOD",
            RecordContentType::Bad => "BAD",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            RecordContentType::Good => "행복",
            RecordContentType::Bad => "후회",
        }
    }
}

impl fmt::Display for RecordContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordContentType {
    type Err = ParseRecordCategoryError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "good" => Ok(RecordContentType::Good),
            "bad" => Ok(RecordContentType::Bad),
            _ => Err(ParseRecordCategoryError {
                value: value.to_string(),
            }),
        }
    }
}

impl Serialize for RecordContentType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.wire())
    }
}

impl<'de> Deserialize<'de> for RecordContentType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        RecordContentType::from_str(&raw).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordCategory {
    Energy,
    Growth,
    Healing,
    Happiness,
    Flex,
    Dignity,
    Affection,
    Health,
    Saving,
    Greed,
    Addiction,
    Laziness,
    Impulse,
    Meaninglessness,
    Boastfulness,
    Habit,
    Overfrugality,
    Miss,
    None,
}

impl RecordCategory {
    pub const GOOD: [RecordCategory; 9] = [
        RecordCategory::Energy,
        RecordCategory::Growth,
        RecordCategory::Healing,
        RecordCategory::Happiness,
        RecordCategory::Flex,
        RecordCategory::Dignity,
        RecordCategory::Affection,
        RecordCategory::Health,
        RecordCategory::Saving,
    ];

    pub const BAD: [RecordCategory; 9] = [
        RecordCategory::Greed,
        RecordCategory::Addiction,
        RecordCategory::Laziness,
        RecordCategory::Impulse,
        RecordCategory::Meaninglessness,
        RecordCategory::Boastfulness,
        RecordCategory::Habit,
        RecordCategory::Overfrugality,
        RecordCategory::Miss,
    ];

    pub fn cases(flag: RecordContentType) -> &'static [RecordCategory; 9] {
        match flag {
            RecordContentType::Good => &Self::GOOD,
            RecordContentType::Bad => &Self::BAD,
        }
    }

    /// The flag a category belongs to; `None` belongs to neither.
    pub fn flag(self) -> Option<RecordContentType> {
        if Self::GOOD.contains(&self) {
            Some(RecordContentType::Good)
        } else if Self::BAD.contains(&self) {
            Some(RecordContentType::Bad)
        } else {
            None
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RecordCategory::Energy => "energy",
            RecordCategory::Growth => "growth",
            RecordCategory::Healing => "healing",
            RecordCategory::Happiness => "happiness",
            RecordCategory::Flex => "flex",
            RecordCategory::Dignity => "dignity",
            RecordCategory::Affection => "affection",
            RecordCategory::Health => "health",
            RecordCategory::Saving => "saving",
            RecordCategory::Greed => "greed",
            RecordCategory::Addiction => "addiction",
            RecordCategory::Laziness => "laziness",
            RecordCategory::Impulse => "impulse",
            RecordCategory::Meaninglessness => "meaninglessness",
            RecordCategory::Boastfulness => "boastfulness",
            RecordCategory::Habit => "habit",
            RecordCategory::Overfrugality => "overfrugality",
            RecordCategory::Miss => "miss",
            RecordCategory::None => "none",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            RecordCategory::Energy => "활력",
            RecordCategory::Growth => "성장",
            RecordCategory::Healing => "힐링",
            RecordCategory::Happiness => "소확행",
            RecordCategory::Flex => "플렉스",
            RecordCategory::Dignity => "품위유지",
            RecordCategory::Affection => "마음전달",
            RecordCategory::Health => "건강",
            RecordCategory::Saving => "절약",
            RecordCategory::Greed => "욕심",
            RecordCategory::Addiction => "중독",
            RecordCategory::Laziness => "게으름",
            RecordCategory::Impulse => "충동",
            RecordCategory::Meaninglessness => "무의미",
            RecordCategory::Boastfulness => "과시",
            RecordCategory::Habit => "습관반복",
            RecordCategory::Overfrugality => "과한절약",
            RecordCategory::Miss => "선택미스",
            RecordCategory::None => "무소비",
        }
    }

    /// Lenient parse used for server payloads: unknown names become `None`.
    pub fn from_wire(raw: &str) -> Self {
        RecordCategory::from_str(raw).unwrap_or(RecordCategory::None)
    }
}

impl fmt::Display for RecordCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordCategory {
    type Err = ParseRecordCategoryError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::GOOD
            .iter()
            .chain(Self::BAD.iter())
            .chain(std::iter::once(&RecordCategory::None))
            .copied()
            .find(|category| category.as_str() == normalized)
            .ok_or_else(|| ParseRecordCategoryError {
                value: value.to_string(),
            })
    }
}

impl Serialize for RecordCategory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_str().to_ascii_uppercase())
    }
}

impl<'de> Deserialize<'de> for RecordCategory {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(RecordCategory::from_wire(&raw))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRecordCategoryError {
    value: String,
}

impl fmt::Display for ParseRecordCategoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid record category or flag '{}'", self.value)
    }
}

impl Error for ParseRecordCategoryError {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordContent {
    pub flag: RecordContentType,
    pub category: RecordCategory,
    pub memo: String,
}

impl RecordContent {
    /// Builds a content, cutting the memo down to `MEMO_MAX_CHARS`.
    pub fn new(flag: RecordContentType, category: RecordCategory, memo: &str) -> Self {
        Self {
            flag,
            category,
            memo: truncate_memo(memo),
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.category.flag() == Some(self.flag)
    }
}

pub fn truncate_memo(memo: &str) -> String {
    memo.chars().take(MEMO_MAX_CHARS).collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordEntries {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub good: Option<RecordContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bad: Option<RecordContent>,
}

impl RecordEntries {
    pub fn get(&self, flag: RecordContentType) -> Option<&RecordContent> {
        match flag {
            RecordContentType::Good => self.good.as_ref(),
            RecordContentType::Bad => self.bad.as_ref(),
        }
    }

    pub fn set(&mut self, content: RecordContent) {
        match content.flag {
            RecordContentType::Good => self.good = Some(content),
            RecordContentType::Bad => self.bad = Some(content),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.good.is_none() && self.bad.is_none()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RecordContent> {
        self.good.iter().chain(self.bad.iter())
    }
}

/// One calendar day's entry. `records == None` is the explicit no-spending
/// marker; a day without any `Record` has not been written yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub day: Day,
    pub records: Option<RecordEntries>,
}

impl Record {
    /// Builds a record from drafted contents. An empty list becomes the
    /// no-spending marker; a later content of the same flag replaces the
    /// earlier one.
    pub fn new(day: Day, contents: Vec<RecordContent>) -> Self {
        if contents.is_empty() {
            return Self::empty(day);
        }
        let mut entries = RecordEntries::default();
        for content in contents {
            entries.set(content);
        }
        Self {
            day,
            records: Some(entries),
        }
    }

    pub fn empty(day: Day) -> Self {
        Self {
            day,
            records: None,
        }
    }

    pub fn is_empty_marker(&self) -> bool {
        self.records.is_none()
    }

    pub fn content(&self, flag: RecordContentType) -> Option<&RecordContent> {
        self.records.as_ref().and_then(|entries| entries.get(flag))
    }

    pub fn contents(&self) -> Vec<&RecordContent> {
        self.records
            .as_ref()
            .map(|entries| entries.iter().collect())
            .unwrap_or_default()
    }
}
