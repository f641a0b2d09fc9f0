use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::record::Record;

/// Id of the built-in "no decoration" item.
pub const DEFAULT_DECORATION_ID: i64 = 3;
/// Id of the hidden reward that is marked read as soon as it is tried on.
pub const HIDDEN_DECORATION_ID: i64 = 23;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RewardCategory {
    Background,
    Effect,
    Decoration,
    Bottle,
    Sound,
}

impl RewardCategory {
    pub const ALL: [RewardCategory; 5] = [
        RewardCategory::Background,
        RewardCategory::Effect,
        RewardCategory::Decoration,
        RewardCategory::Bottle,
        RewardCategory::Sound,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RewardCategory::Background => "background",
            RewardCategory::Effect => "effect",
            RewardCategory::Decoration => "decoration",
            RewardCategory::Bottle => "bottle",
            RewardCategory::Sound => "sound",
        }
    }

    pub fn wire(self) -> &'static str {
        match self {
            RewardCategory::Background => "BACKGROUND",
            RewardCategory::Effect => "EFFECT",
            RewardCategory::Decoration => "DECORATION",
            RewardCategory::Bottle => "CASE",
            RewardCategory::Sound => "BGM",
        }
    }
}

impl fmt::Display for RewardCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RewardCategory {
    type Err = ParseRewardCategoryError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "background" => Ok(RewardCategory::Background),
            "effect" => Ok(RewardCategory::Effect),
            "decoration" => Ok(RewardCategory::Decoration),
            "bottle" | "case" | "byeoltong" => Ok(RewardCategory::Bottle),
            "sound" | "bgm" => Ok(RewardCategory::Sound),
            _ => Err(ParseRewardCategoryError {
                value: value.to_string(),
            }),
        }
    }
}

impl Serialize for RewardCategory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.wire())
    }
}

impl<'de> Deserialize<'de> for RewardCategory {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        RewardCategory::from_str(&raw).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRewardCategoryError {
    value: String,
}

impl fmt::Display for ParseRewardCategoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid reward category '{}': expected one of {}",
            self.value,
            RewardCategory::ALL
                .iter()
                .map(|category| category.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

impl Error for ParseRewardCategoryError {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reward {
    pub id: i64,
    pub category: RewardCategory,
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

impl Reward {
    pub fn resource_url(&self, kind: ResourceKind) -> Option<&str> {
        match kind {
            ResourceKind::Image => self.image_url.as_deref(),
            ResourceKind::Json => self.json_url.as_deref(),
            ResourceKind::Sound => self.sound_url.as_deref(),
        }
    }

    pub fn is_unread_hidden(&self) -> bool {
        self.hidden && !self.hidden_read
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Image,
    Json,
    Sound,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 3] = [ResourceKind::Image, ResourceKind::Json, ResourceKind::Sound];

    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Image => "image",
            ResourceKind::Json => "json",
            ResourceKind::Sound => "sound",
        }
    }
}

pub type RewardsByCategory = BTreeMap<RewardCategory, Vec<Reward>>;
pub type EquippedRewards = BTreeMap<RewardCategory, Reward>;

/// Keeps the last reward of each category.
pub fn equipped_from_list(rewards: &[Reward]) -> EquippedRewards {
    rewards
        .iter()
        .map(|reward| (reward.category, reward.clone()))
        .collect()
}

pub fn group_by_category(rewards: Vec<Reward>) -> RewardsByCategory {
    let mut grouped = RewardsByCategory::new();
    for reward in rewards {
        grouped.entry(reward.category).or_default().push(reward);
    }
    grouped
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BottleShape {
    #[default]
    Default,
    Bead,
    Heart,
}

impl BottleShape {
    pub fn from_reward_id(id: i64) -> Self {
        match id {
            24 => BottleShape::Bead,
            25 => BottleShape::Heart,
            _ => BottleShape::Default,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BottleShape::Default => "default",
            BottleShape::Bead => "bead",
            BottleShape::Heart => "heart",
        }
    }
}

/// Asset name the renderer uses for an equipped decoration.
pub fn decoration_resource_name(id: i64) -> String {
    format!("reward_decoration_{id}")
}

/// Equipped rewards joined with their cached resource payloads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecorationData {
    pub background_reward_data: Option<Vec<u8>>,
    pub effect_reward_data: Option<Vec<u8>>,
    pub decoration_reward_name: Option<String>,
    pub decoration_reward_id: Option<i64>,
    pub bottle_reward_id: Option<i64>,
    pub bottle_shape: BottleShape,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewardItemData {
    pub background_item: Option<Vec<u8>>,
    pub effect_item: Option<Vec<u8>>,
    pub decoration_item_id: Option<i64>,
    pub decoration_item_name: Option<String>,
    pub bottle_item_id: Option<i64>,
    pub bottle_shape: Option<BottleShape>,
}

/// The single pending value handed to the star-bottle renderer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StarBottleAction {
    AddNewStar(Record),
    ChangeRewardItem(RewardItemData),
    ChangeBackgroundItem(Vec<u8>),
    ChangeEffectItem(Option<Vec<u8>>),
    ChangeDecorationItem(Option<i64>, Option<String>),
    ChangeBottleItem(i64, BottleShape),
    #[default]
    None,
}
