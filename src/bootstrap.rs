//! Startup sync run behind the splash screen: identify the user, warm the
//! local caches for the current month and check the app version.

use tracing::{debug, info, warn};

use crate::domain::clock::Clock;
use crate::domain::day::Day;
use crate::domain::summary::is_latest_version;
use crate::flags::{FlagKey, Settings};
use crate::network::NetworkError;
use crate::repository::Dependencies;
use crate::usecase;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchOutcome {
    Ready { is_new_user: bool },
    /// The store demands an update this build does not satisfy; the app
    /// stays on the splash screen.
    UpdateRequired { latest_version: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchReport {
    pub records_cached: usize,
    pub rewards_cached: usize,
    pub resources_stored: usize,
}

/// Runs every startup step in order. Any failing step up to the reward
/// download aborts the launch; resource downloads and the version check
/// only log.
pub async fn sync_on_launch(
    deps: &Dependencies,
    settings: &Settings,
) -> Result<(LaunchOutcome, LaunchReport), NetworkError> {
    let mut report = LaunchReport::default();

    let user = deps.users.register_user().await?;
    if user.is_new {
        settings.set_bool(FlagKey::ShouldShowOnboarding, true);
    }
    info!(user = %user.user_name, is_new = user.is_new, "user registered");
    report_login(deps, settings).await;

    let today = deps.clock.today();
    if today.day == 1 {
        report.records_cached += cache_month(deps, deps.clock.yesterday()).await?;
    }
    report.records_cached += cache_month(deps, today).await?;

    let equipped = deps
        .rewards
        .get_monthly_reward_item(today.year, today.month)
        .await?;
    deps.rewards
        .save_equipped_items(today.year, today.month, &equipped);

    let owned = deps.rewards.get_user_reward_items().await?;
    for items in owned.values() {
        deps.rewards.save_rewards(items);
        report.rewards_cached += items.len();
        report.resources_stored += usecase::download_reward_resources(deps.files.as_ref(), items).await;
    }

    let outcome = check_app_version(deps, settings, user.is_new).await;
    Ok((outcome, report))
}

async fn cache_month(deps: &Dependencies, day: Day) -> Result<usize, NetworkError> {
    let month = deps
        .records
        .get_monthly_record_list(day.year, day.month)
        .await?;
    let records = month.records.unwrap_or_default();
    deps.records.save_records(&records);
    debug!(year = day.year, month = day.month, count = records.len(), "month cached");
    Ok(records.len())
}

async fn report_login(deps: &Dependencies, settings: &Settings) {
    if let Err(err) = deps.users.put_last_login().await {
        warn!(error = %err, "last login not recorded");
    }
    let token = settings.get_text(FlagKey::FirebaseToken);
    if token.is_empty() {
        return;
    }
    if let Err(err) = deps.users.post_update_token(&token).await {
        warn!(error = %err, "push token not updated");
    }
}

async fn check_app_version(deps: &Dependencies, settings: &Settings, is_new_user: bool) -> LaunchOutcome {
    let current = deps.app_version.current_app_version();
    settings.set_text(FlagKey::AppVersion, &current);
    let info = match deps.app_version.get_latest_app_version().await {
        Ok(info) => info,
        Err(err) => {
            warn!(error = %err, "version check skipped");
            return LaunchOutcome::Ready { is_new_user };
        }
    };
    if info.is_update_required && !is_latest_version(&info.latest_version, &current) {
        warn!(current = %current, latest = %info.latest_version, "update required");
        return LaunchOutcome::UpdateRequired {
            latest_version: info.latest_version,
        };
    }
    LaunchOutcome::Ready { is_new_user }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::{sync_on_launch, LaunchOutcome};
    use crate::domain::clock::Clock;
    use crate::domain::day::Day;
    use crate::domain::record::Record;
    use crate::domain::reward::{Reward, RewardCategory};
    use crate::domain::summary::{AppVersionInfo, MonthlyRecordState, User};
    use crate::feature::test_support::Harness;
    use crate::flags::FlagKey;
    use crate::repository::{FileRepository, RecordRepository, RewardRepository};

    fn reward(id: i64, category: RewardCategory, image: Option<&str>) -> Reward {
        Reward {
            id,
            category,
            name: format!("reward-{id}"),
            image_url: image.map(str::to_string),
            json_url: None,
            sound_url: None,
            hidden: false,
            hidden_read: false,
        }
    }

    fn month(records: Vec<Record>) -> MonthlyRecordState {
        MonthlyRecordState {
            records: Some(records),
            ..MonthlyRecordState::default()
        }
    }

    #[tokio::test]
    async fn new_user_sync_fills_every_cache() {
        let h = Harness::new();
        let today = h.clock.today();
        h.backend.with(|data| {
            data.user = Some(User {
                user_key: "KEY".to_string(),
                user_name: "새별".to_string(),
                is_new: true,
            });
            data.remote_months
                .insert((2025, 5), month(vec![Record::empty(Day::new(2025, 5, 3).unwrap())]));
            data.monthly_remote = vec![reward(24, RewardCategory::Bottle, None)];
            data.owned_remote = vec![
                reward(5, RewardCategory::Background, Some("https://cdn.test/bg.png")),
                reward(6, RewardCategory::Background, Some("https://cdn.test/missing.png")),
            ];
            data.remote_files
                .insert("https://cdn.test/bg.png".to_string(), vec![1, 2, 3]);
        });

        let (outcome, report) = sync_on_launch(&h.deps, &h.ctx.settings).await.unwrap();
        assert_eq!(outcome, LaunchOutcome::Ready { is_new_user: true });
        assert_eq!(report.records_cached, 1);
        assert_eq!(report.rewards_cached, 2);
        assert_eq!(report.resources_stored, 1);

        assert!(h.ctx.settings.get_bool(FlagKey::ShouldShowOnboarding));
        assert_eq!(h.ctx.settings.get_text(FlagKey::AppVersion), "1.0.0");
        assert!(RecordRepository::load(h.backend.as_ref(), Day::new(2025, 5, 3).unwrap()).is_some());
        let equipped = h.backend.load_equipped_items(today.year, today.month);
        assert_eq!(equipped[&RewardCategory::Bottle].id, 24);
        assert_eq!(h.backend.load_rewards()[&RewardCategory::Background].len(), 2);
        assert!(h.backend.contains("https://cdn.test/bg.png"));
        assert!(h.backend.calls().contains(&"put_last_login".to_string()));
    }

    #[tokio::test]
    async fn first_of_the_month_also_caches_last_month() {
        let h = Harness::at(datetime!(2025-06-01 08:00:00 +09:00));
        h.backend.with(|data| {
            data.remote_months
                .insert((2025, 5), month(vec![Record::empty(Day::new(2025, 5, 31).unwrap())]));
        });
        let (_, report) = sync_on_launch(&h.deps, &h.ctx.settings).await.unwrap();
        assert_eq!(report.records_cached, 1);
        assert!(RecordRepository::load(h.backend.as_ref(), Day::new(2025, 5, 31).unwrap()).is_some());
        assert!(!h.ctx.settings.get_bool(FlagKey::ShouldShowOnboarding));
    }

    #[tokio::test]
    async fn required_update_blocks_the_launch() {
        let h = Harness::new();
        h.backend.with(|data| {
            data.latest_version = Some(AppVersionInfo {
                latest_version: "1.2.0".to_string(),
                is_update_required: true,
            });
        });
        let (outcome, _) = sync_on_launch(&h.deps, &h.ctx.settings).await.unwrap();
        assert_eq!(
            outcome,
            LaunchOutcome::UpdateRequired {
                latest_version: "1.2.0".to_string()
            }
        );

        h.backend.with(|data| {
            data.latest_version = Some(AppVersionInfo {
                latest_version: "1.2.0".to_string(),
                is_update_required: false,
            });
        });
        let (outcome, _) = sync_on_launch(&h.deps, &h.ctx.settings).await.unwrap();
        assert_eq!(outcome, LaunchOutcome::Ready { is_new_user: false });
    }

    #[tokio::test]
    async fn offline_launch_fails() {
        let h = Harness::new();
        h.backend.set_offline(true);
        assert!(sync_on_launch(&h.deps, &h.ctx.settings).await.is_err());
        assert!(h.backend.load_records(2025, 5).is_none());
    }
}
