//! Small orchestrations over the repositories that several features share.

use tracing::{debug, warn};

use crate::domain::clock::Clock;
use crate::domain::reward::{
    decoration_resource_name, BottleShape, DecorationData, EquippedRewards, ResourceKind, Reward,
    RewardCategory, RewardItemData, RewardsByCategory, DEFAULT_DECORATION_ID,
};
use crate::feature::record_entry::Context as RecordEntryContext;
use crate::flags::{FlagKey, Settings};
use crate::repository::{FileRepository, RecordRepository};

/// Whether today's and yesterday's records exist locally.
pub fn written_days(records: &dyn RecordRepository, clock: &dyn Clock) -> (bool, bool) {
    (
        records.load(clock.today()).is_some(),
        records.load(clock.yesterday()).is_some(),
    )
}

pub fn record_entry_context(records: &dyn RecordRepository, clock: &dyn Clock) -> RecordEntryContext {
    let (today, yesterday) = written_days(records, clock);
    RecordEntryContext::new(today, yesterday)
}

/// A record can be written while today or yesterday is still open.
pub fn can_write_record(records: &dyn RecordRepository, clock: &dyn Clock) -> bool {
    let (today, yesterday) = written_days(records, clock);
    !(today && yesterday)
}

/// Bumps the submit streak when the previous write happened yesterday and
/// remembers today as the latest write day.
pub fn update_streak(settings: &Settings, clock: &dyn Clock) {
    let today = clock.today();
    let last = settings.get_day(FlagKey::LastRecordDay);
    if last == today {
        return;
    }
    let streak = if last == clock.yesterday() {
        settings.get_int(FlagKey::StreakSubmitCount) + 1
    } else {
        1
    };
    settings.set_int(FlagKey::StreakSubmitCount, streak);
    settings.set_day(FlagKey::SecondToLastRecordDay, last);
    settings.set_day(FlagKey::LastRecordDay, today);
}

fn resource(files: &dyn FileRepository, reward: &Reward, kind: ResourceKind) -> Option<Vec<u8>> {
    reward.resource_url(kind).and_then(|url| files.load(url))
}

/// Asset name for an equipped decoration; the built-in default has none.
pub fn decoration_name(reward: &Reward) -> Option<String> {
    (reward.id != DEFAULT_DECORATION_ID)
        .then(|| decoration_resource_name(reward.id))
}

pub fn decoration_data(equipped: &EquippedRewards, files: &dyn FileRepository) -> DecorationData {
    let background = equipped.get(&RewardCategory::Background);
    let effect = equipped.get(&RewardCategory::Effect);
    let decoration = equipped.get(&RewardCategory::Decoration);
    let bottle_id = equipped.get(&RewardCategory::Bottle).map(|reward| reward.id);
    DecorationData {
        background_reward_data: background.and_then(|r| resource(files, r, ResourceKind::Image)),
        effect_reward_data: effect.and_then(|r| resource(files, r, ResourceKind::Json)),
        decoration_reward_name: decoration.and_then(decoration_name),
        decoration_reward_id: decoration.map(|reward| reward.id),
        bottle_reward_id: bottle_id,
        bottle_shape: bottle_id
            .map(BottleShape::from_reward_id)
            .unwrap_or_default(),
    }
}

pub fn reward_item_data(equipped: &EquippedRewards, files: &dyn FileRepository) -> RewardItemData {
    let decoration = equipped.get(&RewardCategory::Decoration);
    let bottle = equipped.get(&RewardCategory::Bottle);
    RewardItemData {
        background_item: equipped
            .get(&RewardCategory::Background)
            .and_then(|r| resource(files, r, ResourceKind::Image)),
        effect_item: equipped
            .get(&RewardCategory::Effect)
            .and_then(|r| resource(files, r, ResourceKind::Json)),
        decoration_item_id: decoration.map(|reward| reward.id),
        decoration_item_name: decoration.and_then(decoration_name),
        bottle_item_id: bottle.map(|reward| reward.id),
        bottle_shape: bottle.map(|reward| BottleShape::from_reward_id(reward.id)),
    }
}

pub fn owned_reward_count(rewards: &RewardsByCategory) -> usize {
    rewards.values().map(Vec::len).sum()
}

/// Downloads every missing resource of `rewards` into the file cache.
/// A failing download is logged and skipped. Returns how many files were
/// stored.
pub async fn download_reward_resources(files: &dyn FileRepository, rewards: &[Reward]) -> usize {
    let mut stored = 0;
    for reward in rewards {
        for kind in ResourceKind::ALL {
            let Some(url) = reward.resource_url(kind) else {
                continue;
            };
            if files.contains(url) {
                continue;
            }
            match files.download(url).await {
                Ok(bytes) => {
                    files.save(url, &bytes);
                    stored += 1;
                    debug!(reward = %reward.name, kind = kind.as_str(), "downloaded reward resource");
                }
                Err(err) => {
                    warn!(reward = %reward.name, kind = kind.as_str(), error = %err, "reward resource download failed");
                }
            }
        }
    }
    stored
}
