//! Stack coordinator for everything reachable from the home screen. It owns
//! the main state and an ordered stack of child screens, scopes actions into
//! the matching reducer and turns child delegates into pushes and pops.

use tracing::{debug, info};

use super::{
    bottle_calendar, decoration, main, monthly_star_bottle, record_entry, record_list,
    record_writing, reward_receive, reward_start, setting, statistics, AppContext, Effect,
    Reducer,
};
use crate::domain::clock::Clock;
use crate::domain::day::Day;
use crate::domain::record::{Record, RecordContent, RecordContentType};
use crate::domain::reward::{equipped_from_list, Reward, StarBottleAction};
use crate::domain::summary::{FeedbackInfo, RecordCountSummary};
use crate::flags::{FlagKey, Settings};
use crate::repository::Dependencies;
use crate::usecase;

mod routes;

pub type StackElementId = u64;

/// The reward hint stays up until the user owns more items than this.
pub const REWARD_TOOL_TIP_MAX_ITEMS: usize = 15;

/// Cancellation scope of every effect a stack element emits.
pub fn element_scope(id: StackElementId) -> String {
    format!("path-{id}")
}

#[derive(Debug, Clone, PartialEq)]
pub enum PathState {
    Setting(setting::State),
    RecordEntry(record_entry::State),
    RecordWriting(record_writing::State),
    RecordList(record_list::State),
    Statistics(statistics::State),
    BottleCalendar(bottle_calendar::State),
    MonthlyStarBottle(monthly_star_bottle::State),
    RewardStart(reward_start::State),
    RewardReceive(reward_receive::State),
    Decoration(decoration::State),
}

impl PathState {
    pub fn name(&self) -> &'static str {
        match self {
            PathState::Setting(_) => "setting",
            PathState::RecordEntry(_) => "record_entry",
            PathState::RecordWriting(_) => "record_writing",
            PathState::RecordList(_) => "record_list",
            PathState::Statistics(_) => "statistics",
            PathState::BottleCalendar(_) => "bottle_calendar",
            PathState::MonthlyStarBottle(_) => "monthly_star_bottle",
            PathState::RewardStart(_) => "reward_start",
            PathState::RewardReceive(_) => "reward_receive",
            PathState::Decoration(_) => "decoration",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PathAction {
    Setting(setting::Action),
    RecordEntry(record_entry::Action),
    RecordWriting(record_writing::Action),
    RecordList(record_list::Action),
    Statistics(statistics::Action),
    BottleCalendar(bottle_calendar::Action),
    MonthlyStarBottle(monthly_star_bottle::Action),
    RewardStart(reward_start::Action),
    RewardReceive(reward_receive::Action),
    Decoration(decoration::Action),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PathElement {
    pub id: StackElementId,
    pub state: PathState,
}

/// Where a push goes, carrying only data the caller already holds.
#[derive(Debug, Clone, PartialEq)]
pub enum Destination {
    Setting(String),
    RecordEntry(record_entry::Context),
    RecordWriting(RecordContentType, Option<RecordContent>),
    /// `true` shows the bottle calendar shortcut.
    MonthlyRecordList(Day, Vec<Record>, bool),
    BottleCalendar(RecordCountSummary),
    Statistics(Day, Vec<Record>),
    MonthlyStarBottle(Day, Vec<Record>, Vec<Reward>),
    /// Feedback summary plus whether today and yesterday are written.
    RewardStart(FeedbackInfo, bool, bool),
    RewardReceive(i64),
    Decoration(decoration::Context),
}

#[derive(Debug, Clone, PartialEq)]
pub struct State {
    pub main: main::State,
    pub path: Vec<PathElement>,
    /// Set after the first completed record; consumed by a review request.
    pub is_app_review_ready: bool,
    pub is_requesting_app_review: bool,
    next_id: StackElementId,
}

impl State {
    pub fn new(main: main::State) -> Self {
        Self {
            main,
            path: Vec::new(),
            is_app_review_ready: false,
            is_requesting_app_review: false,
            next_id: 0,
        }
    }

    pub fn ids(&self) -> Vec<StackElementId> {
        self.path.iter().map(|element| element.id).collect()
    }

    pub fn last(&self) -> Option<&PathElement> {
        self.path.last()
    }

    pub fn element(&self, id: StackElementId) -> Option<&PathState> {
        self.path
            .iter()
            .find(|element| element.id == id)
            .map(|element| &element.state)
    }

    pub fn contains(&self, id: StackElementId) -> bool {
        self.element(id).is_some()
    }

    pub fn push(&mut self, state: PathState) -> StackElementId {
        let id = self.next_id;
        self.next_id += 1;
        debug!(id, screen = state.name(), "push");
        self.path.push(PathElement { id, state });
        id
    }

    /// Drops the element `id` and everything above it.
    pub fn pop_from(&mut self, id: StackElementId) -> Effect<Action> {
        match self.path.iter().position(|element| element.id == id) {
            Some(index) => self.truncate(index),
            None => Effect::none(),
        }
    }

    /// Drops everything above `id`, keeping `id` on top.
    pub fn pop_to(&mut self, id: StackElementId) -> Effect<Action> {
        match self.path.iter().position(|element| element.id == id) {
            Some(index) => self.truncate(index + 1),
            None => Effect::none(),
        }
    }

    pub fn pop_last(&mut self) -> Effect<Action> {
        match self.path.len() {
            0 => Effect::none(),
            len => self.truncate(len - 1),
        }
    }

    pub fn remove_all(&mut self) -> Effect<Action> {
        self.truncate(0)
    }

    fn truncate(&mut self, len: usize) -> Effect<Action> {
        if len >= self.path.len() {
            return Effect::none();
        }
        let popped = self.path.split_off(len);
        Effect::merge(popped.into_iter().map(|element| {
            debug!(id = element.id, screen = element.state.name(), "pop");
            Effect::CancelScope(element_scope(element.id))
        }))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Main(main::Action),
    Path(StackElementId, PathAction),

    Push(Destination),
    PopLast,
    PopFrom(StackElementId),
    PopTo(StackElementId),
    RemoveAll,

    CompleteWriteRecordContent(RecordContent),
    CompleteWriteRecord(Record),
    UpdateRewardToolTip(bool),

    RequestAppStoreReview,
    PresentCancelBottom,
    ChangeStarBottleOpacity,
}

/// Builds child states for a [`Destination`].
pub struct StateFactory {
    deps: Dependencies,
}

impl StateFactory {
    pub fn new(deps: Dependencies) -> Self {
        Self { deps }
    }

    pub fn make(&self, destination: Destination, settings: &Settings) -> PathState {
        match destination {
            Destination::Setting(user_name) => {
                PathState::Setting(setting::State::new(setting::Context { user_name }))
            }
            Destination::RecordEntry(context) => PathState::RecordEntry(record_entry::State::new(
                context,
                self.deps.clock.as_ref(),
                settings,
            )),
            Destination::RecordWriting(flag, content) => PathState::RecordWriting(
                record_writing::State::new(record_writing::Context { flag, content }),
            ),
            Destination::MonthlyRecordList(day, records, is_show_bottle_calendar) => {
                PathState::RecordList(record_list::State::new(
                    record_list::Context {
                        day,
                        records,
                        is_show_bottle_calendar,
                    },
                    settings,
                ))
            }
            Destination::BottleCalendar(summary) => {
                PathState::BottleCalendar(bottle_calendar::State::new(
                    bottle_calendar::Context {
                        summary,
                        today: self.deps.clock.today(),
                    },
                    settings,
                ))
            }
            Destination::Statistics(day, records) => PathState::Statistics(
                statistics::State::new(statistics::Context { day, records }),
            ),
            Destination::MonthlyStarBottle(day, records, items) => {
                let decoration_data =
                    usecase::decoration_data(&equipped_from_list(&items), self.deps.files.as_ref());
                PathState::MonthlyStarBottle(monthly_star_bottle::State::new(
                    monthly_star_bottle::Context {
                        day,
                        records,
                        decoration_data,
                    },
                ))
            }
            Destination::RewardStart(info, has_today_record, has_yesterday_record) => {
                PathState::RewardStart(reward_start::State::new(reward_start::Context {
                    record_count: info.total_count,
                    is_not_opened: info.is_not_opened,
                    user_name: self.deps.users.get_user_name(),
                    has_today_record,
                    has_yesterday_record,
                }))
            }
            Destination::RewardReceive(not_opened_count) => PathState::RewardReceive(
                reward_receive::State::new(reward_receive::Context { not_opened_count }),
            ),
            Destination::Decoration(context) => {
                PathState::Decoration(decoration::State::new(context, settings))
            }
        }
    }
}

pub struct MainNavigationReducer {
    deps: Dependencies,
    factory: StateFactory,
    main: main::MainReducer,
    setting: setting::SettingReducer,
    record_entry: record_entry::RecordEntryReducer,
    record_writing: record_writing::RecordWritingReducer,
    record_list: record_list::RecordListReducer,
    statistics: statistics::StatisticsReducer,
    bottle_calendar: bottle_calendar::BottleCalendarReducer,
    monthly_star_bottle: monthly_star_bottle::MonthlyStarBottleReducer,
    reward_start: reward_start::RewardStartReducer,
    reward_receive: reward_receive::RewardReceiveReducer,
    decoration: decoration::DecorationReducer,
}

impl MainNavigationReducer {
    pub fn new(deps: Dependencies) -> Self {
        Self {
            factory: StateFactory::new(deps.clone()),
            main: main::MainReducer::new(deps.clone()),
            setting: setting::SettingReducer::new(deps.clone()),
            record_entry: record_entry::RecordEntryReducer::new(deps.clone()),
            record_writing: record_writing::RecordWritingReducer,
            record_list: record_list::RecordListReducer::new(deps.clone()),
            statistics: statistics::StatisticsReducer::new(deps.clone()),
            bottle_calendar: bottle_calendar::BottleCalendarReducer::new(deps.clone()),
            monthly_star_bottle: monthly_star_bottle::MonthlyStarBottleReducer,
            reward_start: reward_start::RewardStartReducer::new(deps.clone()),
            reward_receive: reward_receive::RewardReceiveReducer::new(deps.clone()),
            decoration: decoration::DecorationReducer::new(deps.clone()),
            deps,
        }
    }

    pub fn factory(&self) -> &StateFactory {
        &self.factory
    }

    /// Returns to the home screen with the new star dropping in, then
    /// refreshes the reward hint from the owned item count.
    fn complete_write_record(
        &self,
        state: &mut State,
        record: Record,
        ctx: &AppContext,
    ) -> Effect<Action> {
        state.is_app_review_ready = true;
        ctx.navigation.block_swipe(false);
        let pop = state.remove_all();
        info!(day = %record.day, "record completed");
        state.main.records.push(record.clone());
        state.main.can_write_record =
            usecase::can_write_record(self.deps.records.as_ref(), self.deps.clock.as_ref());
        state.main.is_new_star += 1;
        state.main.star_bottle_action = StarBottleAction::AddNewStar(record);

        let rewards = self.deps.rewards.clone();
        let refresh = Effect::run(move |send| async move {
            let owned = rewards.get_user_reward_items().await?;
            let count = usecase::owned_reward_count(&owned);
            send.send(Action::UpdateRewardToolTip(count <= REWARD_TOOL_TIP_MAX_ITEMS));
            Ok(())
        });
        Effect::merge([pop, refresh])
    }

    fn reduce_element(
        &self,
        state: &mut State,
        id: StackElementId,
        action: PathAction,
        ctx: &AppContext,
    ) -> Effect<Action> {
        let Some(element) = state.path.iter_mut().find(|element| element.id == id) else {
            debug!(id, "action for a screen no longer on the stack");
            return Effect::none();
        };

        macro_rules! child {
            ($reducer:expr, $child:expr, $action:expr, $variant:ident) => {
                $reducer
                    .reduce($child, $action, ctx)
                    .map(move |action| Action::Path(id, PathAction::$variant(action)))
            };
        }

        let effect = match (&mut element.state, action) {
            (PathState::Setting(child), PathAction::Setting(action)) => {
                child!(self.setting, child, action, Setting)
            }
            (PathState::RecordEntry(child), PathAction::RecordEntry(action)) => {
                child!(self.record_entry, child, action, RecordEntry)
            }
            (PathState::RecordWriting(child), PathAction::RecordWriting(action)) => {
                child!(self.record_writing, child, action, RecordWriting)
            }
            (PathState::RecordList(child), PathAction::RecordList(action)) => {
                child!(self.record_list, child, action, RecordList)
            }
            (PathState::Statistics(child), PathAction::Statistics(action)) => {
                child!(self.statistics, child, action, Statistics)
            }
            (PathState::BottleCalendar(child), PathAction::BottleCalendar(action)) => {
                child!(self.bottle_calendar, child, action, BottleCalendar)
            }
            (PathState::MonthlyStarBottle(child), PathAction::MonthlyStarBottle(action)) => {
                child!(self.monthly_star_bottle, child, action, MonthlyStarBottle)
            }
            (PathState::RewardStart(child), PathAction::RewardStart(action)) => {
                child!(self.reward_start, child, action, RewardStart)
            }
            (PathState::RewardReceive(child), PathAction::RewardReceive(action)) => {
                child!(self.reward_receive, child, action, RewardReceive)
            }
            (PathState::Decoration(child), PathAction::Decoration(action)) => {
                child!(self.decoration, child, action, Decoration)
            }
            (other, action) => {
                debug!(id, screen = other.name(), ?action, "action does not match the screen");
                return Effect::none();
            }
        };
        effect.scoped(&element_scope(id))
    }
}

impl Reducer for MainNavigationReducer {
    type State = State;
    type Action = Action;

    fn reduce(&self, state: &mut State, action: Action, ctx: &AppContext) -> Effect<Action> {
        match action {
            Action::Main(main::Action::Delegate(delegate)) => {
                return self.route_main(state, delegate, ctx);
            }
            Action::Main(action) => {
                return self
                    .main
                    .reduce(&mut state.main, action, ctx)
                    .map(Action::Main);
            }
            Action::Path(id, action) => {
                if !state.contains(id) {
                    debug!(id, "action for a screen no longer on the stack");
                    return Effect::none();
                }
                return match routes::delegate(action) {
                    Ok(delegate) => self.route_path(state, delegate, ctx),
                    Err(action) => self.reduce_element(state, id, action, ctx),
                };
            }
            Action::Push(destination) => {
                let child = self.factory.make(destination, &ctx.settings);
                state.push(child);
            }
            Action::PopLast => return state.pop_last(),
            Action::PopFrom(id) => return state.pop_from(id),
            Action::PopTo(id) => return state.pop_to(id),
            Action::RemoveAll => return state.remove_all(),
            Action::CompleteWriteRecordContent(content) => {
                ctx.navigation.block_swipe(true);
                let pop = match state.last() {
                    Some(PathElement {
                        state: PathState::RecordWriting(_),
                        ..
                    }) => state.pop_last(),
                    _ => Effect::none(),
                };
                if let Some(PathElement {
                    state: PathState::RecordEntry(entry),
                    ..
                }) = state.path.last_mut()
                {
                    entry.update_record_content(content);
                }
                return pop;
            }
            Action::CompleteWriteRecord(record) => return self.complete_write_record(state, record, ctx),
            Action::UpdateRewardToolTip(flag) => {
                state.main.is_presenting_reward_tool_tip = flag;
            }
            Action::RequestAppStoreReview => {
                if state.is_app_review_ready
                    && ctx.settings.get_bool(FlagKey::ShouldShowAppStoreReviewRequest)
                {
                    state.is_app_review_ready = false;
                    state.is_requesting_app_review = true;
                    ctx.settings
                        .set_bool(FlagKey::ShouldShowAppStoreReviewRequest, false);
                }
            }
            Action::PresentCancelBottom => match state.path.last_mut().map(|e| &mut e.state) {
                Some(PathState::RecordEntry(child)) => child.is_presenting_cancel = true,
                Some(PathState::RecordWriting(child)) => child.is_presenting_cancel = true,
                _ => {}
            },
            Action::ChangeStarBottleOpacity => state.main.star_bottle_opacity = 1.0,
        }
        Effect::none()
    }
}
