//! Command-level service. Opens the local stores once and drives the real
//! coordinator for each CLI command, the way a host screen would.

use std::error::Error;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::cli::ContentArg;
use crate::config::{AppConfig, ConfigError};
use crate::domain::clock::{Clock, SystemClock};
use crate::domain::day::{Day, DayType};
use crate::domain::record::{Record, RecordCategory, RecordContentType};
use crate::domain::reward::{Reward, RewardCategory, RewardsByCategory};
use crate::feature::navigation::{
    self, Destination, MainNavigationReducer, PathAction, PathState, StackElementId,
};
use crate::feature::root::{self, MainRoute, RootReducer, Route};
use crate::feature::setting::SettingMenu;
use crate::feature::{
    decoration, main, record_entry, record_list, record_writing, reward_receive, setting,
    statistics, AppContext, Store, ToastType,
};
use crate::flags::{FlagEntry, FlagError, FlagKey, Settings};
use crate::identity::IdentityStore;
use crate::network::{DonmaniApi, Gateway, NetworkError};
use crate::push::{PushDestination, PushPayload};
use crate::repository::Dependencies;
use crate::store::{LocalStore, StoreError};

#[derive(Debug)]
pub enum AppError {
    Io(std::io::Error),
    Store(StoreError),
    Config(ConfigError),
    Network(NetworkError),
    Flag(FlagError),
    InvalidArgument(String),
    Unavailable(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Io(err) => write!(f, "I/O error: {}", err),
            AppError::Store(err) => write!(f, "local store error: {}", err),
            AppError::Config(err) => write!(f, "{}", err),
            AppError::Network(err) => write!(f, "network error: {}", err),
            AppError::Flag(err) => write!(f, "{}", err),
            AppError::InvalidArgument(message) => write!(f, "{}", message),
            AppError::Unavailable(message) => write!(f, "{}", message),
        }
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            AppError::Io(err) => Some(err),
            AppError::Store(err) => Some(err),
            AppError::Config(err) => Some(err),
            AppError::Network(err) => Some(err),
            AppError::Flag(err) => Some(err),
            AppError::InvalidArgument(_) | AppError::Unavailable(_) => None,
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        AppError::Io(value)
    }
}

impl From<StoreError> for AppError {
    fn from(value: StoreError) -> Self {
        AppError::Store(value)
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        AppError::Config(value)
    }
}

impl From<NetworkError> for AppError {
    fn from(value: NetworkError) -> Self {
        AppError::Network(value)
    }
}

impl From<FlagError> for AppError {
    fn from(value: FlagError) -> Self {
        AppError::Flag(value)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LaunchView {
    pub route: &'static str,
    pub user_name: String,
    pub onboarded: bool,
    pub required_version: Option<String>,
    pub records_this_month: usize,
    pub new_star_bottle: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordRequest {
    pub day: DayType,
    pub good: Option<ContentArg>,
    pub bad: Option<ContentArg>,
    pub empty: bool,
}

impl RecordRequest {
    fn contents(&self) -> impl Iterator<Item = (RecordContentType, &ContentArg)> {
        [
            (RecordContentType::Good, self.good.as_ref()),
            (RecordContentType::Bad, self.bad.as_ref()),
        ]
        .into_iter()
        .filter_map(|(flag, content)| content.map(|content| (flag, content)))
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.empty {
            if self.good.is_some() || self.bad.is_some() {
                return Err(AppError::InvalidArgument(
                    "an empty day cannot carry spending".into(),
                ));
            }
            return Ok(());
        }
        if self.good.is_none() && self.bad.is_none() {
            return Err(AppError::InvalidArgument(
                "nothing to record: pass --good, --bad or --empty".into(),
            ));
        }
        for (flag, content) in self.contents() {
            if !RecordCategory::cases(flag).contains(&content.category) {
                return Err(AppError::InvalidArgument(format!(
                    "'{}' is not a {} category",
                    content.category, flag
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MonthView {
    pub day: Day,
    pub records: Vec<Record>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CategoryCount {
    pub category: RecordCategory,
    pub title: &'static str,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StatsView {
    pub year: i32,
    pub month: u8,
    pub good: Vec<CategoryCount>,
    pub bad: Vec<CategoryCount>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct MonthStars {
    pub month: u8,
    /// `None` for a month that has not started.
    pub stars: Option<i64>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CalendarView {
    pub year: i32,
    pub months: Vec<MonthStars>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RewardStatusView {
    pub record_count: i64,
    pub title: String,
    pub sub_title: String,
    pub is_full_reward: bool,
    pub not_opened: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DecorateView {
    pub changed: bool,
    pub equipped: Vec<Reward>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PushView {
    pub destination: PushDestination,
    pub route: &'static str,
    pub screen: Option<&'static str>,
    pub day: Option<Day>,
    pub already_written: bool,
}

pub struct App {
    deps: Dependencies,
    ctx: AppContext,
}

fn path(id: StackElementId, action: PathAction) -> navigation::Action {
    navigation::Action::Path(id, action)
}

fn top(store: &Store<MainNavigationReducer>) -> Option<(StackElementId, &PathState)> {
    store
        .state()
        .last()
        .map(|element| (element.id, &element.state))
}

impl App {
    pub fn open(config: &AppConfig, data_dir: &Path) -> Result<Self, AppError> {
        let paths = config.storage.resolve(data_dir);
        std::fs::create_dir_all(&paths.data_dir)?;
        let store = Arc::new(LocalStore::open(&paths.db_path, &paths.resource_dir)?);
        let identity = Arc::new(IdentityStore::new(&paths.identity_path));
        let gateway = Gateway::new(&config.api.base_url, config.api.timeout())?;
        let api = Arc::new(DonmaniApi::new(gateway));
        let clock: Arc<dyn Clock> =
            Arc::new(SystemClock::with_offset_hours(config.clock.utc_offset_hours));
        debug!(data_dir = %paths.data_dir.display(), base_url = %config.api.base_url, "opening app");
        let deps = Dependencies::live(api, store.clone(), identity, clock);
        Ok(Self::with_parts(deps, AppContext::new(Settings::new(store))))
    }

    pub fn with_parts(deps: Dependencies, ctx: AppContext) -> Self {
        Self { deps, ctx }
    }

    async fn navigation(&self) -> Store<MainNavigationReducer> {
        let state = root::main_navigation_state(&self.deps, &self.ctx.settings).await;
        Store::new(
            MainNavigationReducer::new(self.deps.clone()),
            state,
            self.ctx.clone(),
        )
    }

    /// Splash sync followed by onboarding, which the CLI accepts on the
    /// user's behalf.
    pub async fn launch(&self) -> Result<LaunchView, AppError> {
        let mut store = Store::new(
            RootReducer::new(self.deps.clone()),
            root::State::default(),
            self.ctx.clone(),
        );
        store.send(root::Action::StartSplash);
        store.settle().await;

        let mut onboarded = false;
        if store.state().route == Route::Onboarding {
            onboarded = true;
            store.send(root::Action::CompleteOnboarding(MainRoute::Main));
            store.settle().await;
        }

        let mut view = LaunchView {
            route: store.state().route.id(),
            user_name: self.deps.users.get_user_name(),
            onboarded,
            required_version: None,
            records_this_month: 0,
            new_star_bottle: false,
        };
        match &store.state().route {
            Route::Splash(splash) if splash.toast == ToastType::SplashNetworkError => {
                Err(AppError::Unavailable(
                    "startup sync failed; check the connection and try again".into(),
                ))
            }
            Route::Splash(splash) => {
                view.required_version = splash.required_version.clone();
                Ok(view)
            }
            Route::Onboarding => Ok(view),
            Route::Main(navigation) => {
                view.records_this_month = navigation.main.records.len();
                view.new_star_bottle = navigation.main.is_presenting_new_star_bottle;
                Ok(view)
            }
        }
    }

    pub async fn record(&self, request: RecordRequest) -> Result<Record, AppError> {
        request.validate()?;
        let mut store = self.navigation().await;
        store.send(navigation::Action::Main(main::Action::TouchRecordButton));
        let (id, day_type) = match top(&store) {
            Some((id, PathState::RecordEntry(entry))) => (id, entry.day_type),
            _ => {
                return Err(AppError::InvalidArgument(
                    "today and yesterday are both recorded already".into(),
                ))
            }
        };
        if day_type != request.day {
            store.send(path(
                id,
                PathAction::RecordEntry(record_entry::Action::TouchDayTypeToggleButton),
            ));
        }
        let day = match store.state().element(id) {
            Some(PathState::RecordEntry(entry)) if entry.day_type == request.day => {
                entry.selected_day
            }
            _ => {
                return Err(AppError::InvalidArgument(format!(
                    "{} is recorded already",
                    request.day
                )))
            }
        };
        let entry = |action| path(id, PathAction::RecordEntry(action));

        if request.empty {
            store.send(entry(record_entry::Action::TouchEmptyRecordButton));
            store.send(entry(record_entry::Action::RecordEmpty));
        }
        for (flag, content) in request.contents() {
            store.send(entry(record_entry::Action::TouchRecordContent(flag)));
            let Some((writing_id, PathState::RecordWriting(_))) = top(&store) else {
                return Err(AppError::InvalidArgument(format!(
                    "the {} record cannot be written",
                    flag
                )));
            };
            let writing = |action| path(writing_id, PathAction::RecordWriting(action));
            store.send(writing(record_writing::Action::SelectCategory(
                content.category,
            )));
            store.send(writing(record_writing::Action::SaveCategory));
            if !content.memo.is_empty() {
                store.send(writing(record_writing::Action::TextChanged(
                    content.memo.clone(),
                )));
            }
            store.send(writing(record_writing::Action::CompleteWrite));
            if store.state().contains(writing_id) {
                return Err(AppError::InvalidArgument(format!(
                    "the {} record was rejected",
                    flag
                )));
            }
        }

        store.send(entry(record_entry::Action::ReadyToSave));
        store.send(entry(record_entry::Action::CompleteWrite));
        store.settle().await;
        if store.state().contains(id) {
            return Err(AppError::Unavailable(format!("the record for {day} was not saved")));
        }
        info!(day = %day, "record written");
        self.deps
            .records
            .load(day)
            .ok_or_else(|| AppError::Unavailable(format!("the record for {day} was not saved")))
    }

    async fn record_list(&self) -> Result<(Store<MainNavigationReducer>, StackElementId), AppError> {
        let mut store = self.navigation().await;
        store.send(navigation::Action::Main(main::Action::TouchRecordListButton));
        store.settle().await;
        match top(&store) {
            Some((id, PathState::RecordList(_))) => Ok((store, id)),
            _ => Err(AppError::Unavailable("the record list could not be opened".into())),
        }
    }

    pub async fn month(&self) -> Result<MonthView, AppError> {
        let (store, _) = self.record_list().await?;
        match top(&store) {
            Some((_, PathState::RecordList(list))) => Ok(MonthView {
                day: list.day,
                records: list.records.clone(),
            }),
            _ => Err(AppError::Unavailable("the record list could not be opened".into())),
        }
    }

    pub async fn statistics(&self) -> Result<StatsView, AppError> {
        let (mut store, list_id) = self.record_list().await?;
        let day = match top(&store) {
            Some((_, PathState::RecordList(list))) if list.records.is_empty() => {
                return Ok(StatsView {
                    year: list.day.year,
                    month: list.day.month,
                    good: Vec::new(),
                    bad: Vec::new(),
                })
            }
            Some((_, PathState::RecordList(list))) => list.day,
            _ => return Err(AppError::Unavailable("the record list could not be opened".into())),
        };
        store.send(path(
            list_id,
            PathAction::RecordList(record_list::Action::TouchStatisticsView),
        ));
        store.settle().await;
        let Some((id, PathState::Statistics(_))) = top(&store) else {
            return Err(AppError::Unavailable(format!(
                "statistics for {}-{:02} need a connection",
                day.year, day.month
            )));
        };
        store.send(path(id, PathAction::Statistics(statistics::Action::OnAppear)));
        store.settle().await;

        let Some(PathState::Statistics(child)) = store.state().element(id) else {
            return Err(AppError::Unavailable("statistics were closed".into()));
        };
        let counts = |flag| -> Vec<CategoryCount> {
            child
                .statistics
                .ranked(flag)
                .into_iter()
                .map(|(category, count)| CategoryCount {
                    category,
                    title: category.title(),
                    count,
                })
                .collect()
        };
        Ok(StatsView {
            year: child.day.year,
            month: child.day.month,
            good: counts(RecordContentType::Good),
            bad: counts(RecordContentType::Bad),
        })
    }

    pub async fn calendar(&self) -> Result<CalendarView, AppError> {
        let (mut store, list_id) = self.record_list().await?;
        store.send(path(
            list_id,
            PathAction::RecordList(record_list::Action::PushBottleCalendarView),
        ));
        store.settle().await;
        let Some((_, PathState::BottleCalendar(calendar))) = top(&store) else {
            return Err(AppError::Unavailable("the yearly summary needs a connection".into()));
        };
        Ok(CalendarView {
            year: calendar.year,
            months: calendar
                .star_counts
                .iter()
                .map(|&(month, stars)| MonthStars {
                    month,
                    stars: (stars >= 0).then_some(stars),
                })
                .collect(),
        })
    }

    pub async fn reward_status(&self) -> Result<RewardStatusView, AppError> {
        let not_opened = self.deps.rewards.get_not_open_reward_count().await?;
        let mut store = self.navigation().await;
        store.send(navigation::Action::Main(main::Action::TouchRewardButton));
        store.settle().await;
        let Some((_, PathState::RewardStart(start))) = top(&store) else {
            return Err(AppError::Unavailable("reward progress needs a connection".into()));
        };
        Ok(RewardStatusView {
            record_count: start.record_count,
            title: start.title.clone(),
            sub_title: start.sub_title.clone(),
            is_full_reward: start.is_full_reward,
            not_opened,
        })
    }

    pub async fn open_rewards(&self) -> Result<Vec<Reward>, AppError> {
        let count = self.deps.rewards.get_not_open_reward_count().await?;
        if count <= 0 {
            return Ok(Vec::new());
        }
        let mut store = self.navigation().await;
        store.send(navigation::Action::Push(Destination::RewardReceive(count)));
        let Some((id, _)) = top(&store) else {
            return Err(AppError::Unavailable("the gift screen could not be opened".into()));
        };
        store.send(path(
            id,
            PathAction::RewardReceive(reward_receive::Action::TouchOpenButton),
        ));
        store.settle().await;
        match store.state().element(id) {
            Some(PathState::RewardReceive(child)) if child.is_opened => Ok(child.rewards.clone()),
            _ => Err(AppError::Unavailable("gifts could not be opened".into())),
        }
    }

    pub fn owned_rewards(&self) -> RewardsByCategory {
        self.deps.rewards.load_rewards()
    }

    pub async fn decorate(&self, category: RewardCategory, item_id: i64) -> Result<DecorateView, AppError> {
        let mut store = self.navigation().await;
        store.send(navigation::Action::Main(main::Action::TouchSettingButton));
        let Some((setting_id, PathState::Setting(_))) = top(&store) else {
            return Err(AppError::Unavailable("settings could not be opened".into()));
        };
        store.send(path(
            setting_id,
            PathAction::Setting(setting::Action::TouchMenu(SettingMenu::Decoration)),
        ));
        store.settle().await;
        let Some((id, PathState::Decoration(decorating))) = top(&store) else {
            return Err(AppError::Unavailable("owned items need a connection".into()));
        };
        let item = decorating
            .owned
            .get(&category)
            .and_then(|items| items.iter().find(|item| item.id == item_id))
            .cloned()
            .ok_or_else(|| {
                AppError::InvalidArgument(format!("no owned {} item with id {}", category, item_id))
            })?;
        let today = self.deps.clock.today();
        match decorating.selected.get(&category) {
            None => {
                return Err(AppError::Unavailable(format!(
                    "no {} slot is equipped this month",
                    category
                )))
            }
            Some(current) if current.id == item_id => {
                return Ok(DecorateView {
                    changed: false,
                    equipped: self.equipped(today),
                })
            }
            Some(_) => {}
        }

        let decorate = |action| path(id, PathAction::Decoration(action));
        store.send(decorate(decoration::Action::TouchRewardItem(category, item)));
        store.send(decorate(decoration::Action::TouchSaveButton));
        if matches!(
            store.state().element(id),
            Some(PathState::Decoration(child)) if child.is_presenting_save_alert
        ) {
            store.send(decorate(decoration::Action::SaveDecorationItem));
        }
        store.settle().await;
        if store.state().contains(id) {
            return Err(AppError::Unavailable("the decoration was not saved".into()));
        }
        Ok(DecorateView {
            changed: true,
            equipped: self.equipped(today),
        })
    }

    fn equipped(&self, today: Day) -> Vec<Reward> {
        self.deps
            .rewards
            .load_equipped_items(today.year, today.month)
            .into_values()
            .collect()
    }

    pub async fn rename(&self, name: Option<&str>) -> Result<String, AppError> {
        let mut store = self.navigation().await;
        store.send(navigation::Action::Main(main::Action::TouchSettingButton));
        let Some((id, PathState::Setting(current))) = top(&store) else {
            return Err(AppError::Unavailable("settings could not be opened".into()));
        };
        let Some(name) = name.map(str::trim) else {
            return Ok(current.user_name.clone());
        };
        if current.user_name == name {
            return Ok(current.user_name.clone());
        }

        let setting = |action| path(id, PathAction::Setting(action));
        store.send(setting(setting::Action::TouchEditName));
        store.send(setting(setting::Action::EditNameChanged(name.to_string())));
        let enabled = matches!(
            store.state().element(id),
            Some(PathState::Setting(child)) if child.is_save_enabled() && child.edit_user_name == name
        );
        if !enabled {
            return Err(AppError::InvalidArgument(format!(
                "'{name}' is not a valid nickname: use up to {} Hangul, letters, digits or spaces",
                setting::NICKNAME_MAX_CHARS
            )));
        }
        store.send(setting(setting::Action::SaveUserName));
        store.settle().await;
        match store.state().element(id) {
            Some(PathState::Setting(child)) if child.user_name == name => Ok(child.user_name.clone()),
            _ => Err(AppError::Unavailable("the nickname was not saved".into())),
        }
    }

    pub fn flags(&self) -> Vec<FlagEntry> {
        self.ctx.settings.entries()
    }

    pub fn set_flag(&self, key: &str, value: &str) -> Result<FlagEntry, AppError> {
        let key = FlagKey::from_str(key)?;
        self.ctx.settings.set_raw(key, value)?;
        self.flags()
            .into_iter()
            .find(|entry| entry.key == key.key())
            .ok_or_else(|| AppError::InvalidArgument(format!("unknown flag '{}'", key)))
    }

    /// Opens a notification on top of a launched app.
    pub async fn open_push(&self, raw: &str) -> Result<PushView, AppError> {
        let payload = PushPayload::parse(raw)
            .map_err(|err| AppError::InvalidArgument(format!("invalid push payload: {err}")))?;
        let destination = payload.destination();
        let main = root::main_navigation_state(&self.deps, &self.ctx.settings).await;
        let mut store = Store::new(
            RootReducer::new(self.deps.clone()),
            root::State {
                route: Route::Main(Box::new(main)),
            },
            self.ctx.clone(),
        );
        store.send(root::Action::OpenPush(destination));
        store.settle().await;

        let state = store.state();
        let navigation = state.navigation();
        let last = navigation.and_then(|navigation| navigation.last());
        Ok(PushView {
            destination,
            route: state.route.id(),
            screen: last.map(|element| element.state.name()),
            day: last.and_then(|element| match &element.state {
                PathState::RecordEntry(entry) => Some(entry.selected_day),
                _ => None,
            }),
            already_written: navigation
                .map(|navigation| navigation.main.is_presenting_already_write)
                .unwrap_or(false),
        })
    }
}
