//! Home screen: the star bottle of the current month and the entry points
//! to every other flow.

use std::time::Duration;

use super::{AppContext, Effect, Reducer, ToastType};
use crate::domain::clock::Clock;
use crate::domain::day::Day;
use crate::domain::record::Record;
use crate::domain::reward::{DecorationData, RewardItemData, StarBottleAction};
use crate::domain::summary::RecordCountSummary;
use crate::flags::{FlagKey, Settings};
use crate::repository::Dependencies;
use crate::usecase;

pub const SHAKE_LIMIT: u8 = 6;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    pub records: Vec<Record>,
    pub has_today_record: bool,
    pub has_yesterday_record: bool,
    pub is_presenting_new_star_bottle: bool,
    pub decoration_data: DecorationData,
}

#[derive(Debug, Clone, PartialEq)]
pub struct State {
    pub user_name: String,
    pub day: Day,
    pub records: Vec<Record>,
    pub decoration_data: DecorationData,
    pub can_write_record: bool,

    pub is_presenting_record_yesterday_tool_tip: bool,
    pub is_presenting_already_write: bool,
    pub is_presenting_new_star_bottle: bool,
    pub is_presenting_reward_tool_tip: bool,
    pub is_loading: bool,

    pub star_bottle_opacity: f64,
    pub y_offset: f64,
    pub shake_count: u8,
    pub is_new_star: u32,
    pub star_bottle_action: StarBottleAction,
    pub toast: ToastType,
}

impl State {
    pub fn new(context: Context, clock: &dyn Clock, settings: &Settings) -> Self {
        Self {
            user_name: String::new(),
            day: clock.today(),
            records: context.records,
            decoration_data: context.decoration_data,
            can_write_record: !(context.has_today_record && context.has_yesterday_record),
            is_presenting_record_yesterday_tool_tip: false,
            is_presenting_already_write: false,
            is_presenting_new_star_bottle: context.is_presenting_new_star_bottle,
            is_presenting_reward_tool_tip: settings.get_bool(FlagKey::ShouldShowRewardToolTip),
            is_loading: false,
            star_bottle_opacity: 1.0,
            y_offset: 0.0,
            shake_count: 0,
            is_new_star: 0,
            star_bottle_action: StarBottleAction::None,
            toast: ToastType::None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    OnAppear,
    FetchRewardItem(DecorationData),
    UpdateRewardUI(RewardItemData),
    ConsumeStarBottleAction,

    ClosePopover,
    CheckToolTip,
    DismissNewStarBottleView,
    DismissAlreadyWrite,
    CompleteShowToast,
    Shake,

    TouchRecordButton,
    TouchRecordListButton,
    TouchRewardButton,
    TouchSettingButton,

    Delegate(Delegate),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Delegate {
    PushSetting,
    PushRecordEntry,
    PushRecordList,
    PushBottleCalendar(RecordCountSummary),
    PushRewardStart,
}

pub struct MainReducer {
    deps: Dependencies,
}

impl MainReducer {
    pub fn new(deps: Dependencies) -> Self {
        Self { deps }
    }

    fn load_equipped(&self) -> Effect<Action> {
        let deps = self.deps.clone();
        Effect::run(move |send| async move {
            let today = deps.clock.today();
            let items = deps.rewards.load_equipped_items(today.year, today.month);
            send.send(Action::FetchRewardItem(usecase::decoration_data(
                &items,
                deps.files.as_ref(),
            )));
            send.send(Action::UpdateRewardUI(usecase::reward_item_data(
                &items,
                deps.files.as_ref(),
            )));
            let (today_written, yesterday_written) =
                usecase::written_days(deps.records.as_ref(), deps.clock.as_ref());
            if today_written && !yesterday_written {
                send.send(Action::CheckToolTip);
            }
            Ok(())
        })
    }
}

impl Reducer for MainReducer {
    type State = State;
    type Action = Action;

    fn reduce(&self, state: &mut State, action: Action, ctx: &AppContext) -> Effect<Action> {
        match action {
            Action::OnAppear => {
                state.user_name = self.deps.users.get_user_name();
                state.can_write_record =
                    usecase::can_write_record(self.deps.records.as_ref(), self.deps.clock.as_ref());
                return self.load_equipped();
            }
            Action::FetchRewardItem(data) => {
                state.decoration_data = data;
            }
            Action::UpdateRewardUI(items) => {
                state.star_bottle_action = StarBottleAction::ChangeRewardItem(items);
            }
            Action::ConsumeStarBottleAction => {
                state.star_bottle_action = StarBottleAction::None;
            }
            Action::ClosePopover => {
                state.is_presenting_record_yesterday_tool_tip = false;
            }
            Action::CheckToolTip => {
                state.is_presenting_record_yesterday_tool_tip = true;
            }
            Action::DismissNewStarBottleView => {
                state.is_presenting_new_star_bottle = false;
                ctx.navigation.block_swipe(false);
                let records = self.deps.records.clone();
                let year = state.day.year;
                return Effect::run(move |send| async move {
                    let summary = records.get_yearly_record_summary(year).await?;
                    send.send(Action::Delegate(Delegate::PushBottleCalendar(summary)));
                    Ok(())
                });
            }
            Action::DismissAlreadyWrite => {
                state.is_presenting_already_write = false;
            }
            Action::CompleteShowToast => state.toast = ToastType::None,
            Action::Shake => {
                if state.shake_count >= SHAKE_LIMIT {
                    state.shake_count = 0;
                    return Effect::none();
                }
                state.shake_count += 1;
                state.y_offset = if state.shake_count % 2 == 0 { 10.0 } else { 0.0 };
                return Effect::run(|send| async move {
                    tokio::time::sleep(Duration::from_millis(500)).await;
                    send.send(Action::Shake);
                    Ok(())
                });
            }
            Action::TouchRecordButton => {
                if state.can_write_record {
                    return Effect::send(Action::Delegate(Delegate::PushRecordEntry));
                }
                state.is_presenting_already_write = true;
            }
            Action::TouchRecordListButton => {
                return Effect::send(Action::Delegate(Delegate::PushRecordList));
            }
            Action::TouchRewardButton => {
                if state.is_presenting_reward_tool_tip {
                    state.is_presenting_reward_tool_tip = false;
                    ctx.settings.set_bool(FlagKey::ShouldShowRewardToolTip, false);
                }
                return Effect::send(Action::Delegate(Delegate::PushRewardStart));
            }
            Action::TouchSettingButton => {
                return Effect::send(Action::Delegate(Delegate::PushSetting));
            }
            Action::Delegate(_) => {}
        }
        Effect::none()
    }
}

#[cfg(test)]
mod tests {
    use super::{Action, Context, MainReducer, State, SHAKE_LIMIT};
    use crate::domain::clock::Clock;
    use crate::domain::record::Record;
    use crate::domain::reward::{BottleShape, Reward, RewardCategory, StarBottleAction};
    use crate::feature::test_support::Harness;
    use crate::feature::{Reducer, Store};
    use crate::flags::FlagKey;
    use crate::repository::{RecordRepository, RewardRepository};

    fn main_state(h: &Harness) -> State {
        State::new(Context::default(), h.clock.as_ref(), &h.ctx.settings)
    }

    #[tokio::test(start_paused = true)]
    async fn shake_stops_after_six_rounds_and_resets() {
        let h = Harness::new();
        let mut store = Store::new(MainReducer::new(h.deps.clone()), main_state(&h), h.ctx.clone());
        store.send(Action::Shake);
        assert_eq!(store.state().shake_count, 1);
        assert!(store.run_until(|state| state.shake_count == SHAKE_LIMIT).await);
        assert_eq!(store.state().y_offset, 10.0);

        store.settle().await;
        assert_eq!(store.state().shake_count, 0);
        assert_eq!(store.in_flight(), 0);
    }

    #[tokio::test]
    async fn appearing_loads_equipped_items_and_yesterday_hint() {
        let h = Harness::new();
        let today = h.clock.today();
        RecordRepository::save(h.backend.as_ref(), &Record::empty(today));
        h.backend.with(|data| data.user_name = "별별이".to_string());
        let bottle = Reward {
            id: 24,
            category: RewardCategory::Bottle,
            name: "beads".to_string(),
            image_url: None,
            json_url: None,
            sound_url: None,
            hidden: false,
            hidden_read: false,
        };
        h.backend.save_equipped_items(today.year, today.month, &[bottle]);

        let mut store = Store::new(MainReducer::new(h.deps.clone()), main_state(&h), h.ctx.clone());
        store.send(Action::OnAppear);
        store.settle().await;

        let state = store.state();
        assert_eq!(state.user_name, "별별이");
        assert!(state.can_write_record);
        assert!(state.is_presenting_record_yesterday_tool_tip);
        assert_eq!(state.decoration_data.bottle_shape, BottleShape::Bead);
        match &state.star_bottle_action {
            StarBottleAction::ChangeRewardItem(items) => {
                assert_eq!(items.bottle_item_id, Some(24));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn record_button_is_refused_once_both_days_are_written() {
        let h = Harness::new();
        let reducer = MainReducer::new(h.deps.clone());
        let mut state = State::new(
            Context {
                records: Vec::new(),
                has_today_record: true,
                has_yesterday_record: true,
                is_presenting_new_star_bottle: false,
                decoration_data: Default::default(),
            },
            h.clock.as_ref(),
            &h.ctx.settings,
        );
        let effect = reducer.reduce(&mut state, Action::TouchRecordButton, &h.ctx);
        assert!(effect.is_none());
        assert!(state.is_presenting_already_write);
    }

    #[test]
    fn reward_button_retires_the_tool_tip() {
        let h = Harness::new();
        h.ctx.settings.set_bool(FlagKey::ShouldShowRewardToolTip, true);
        let reducer = MainReducer::new(h.deps.clone());
        let mut state = main_state(&h);
        assert!(state.is_presenting_reward_tool_tip);
        reducer.reduce(&mut state, Action::TouchRewardButton, &h.ctx);
        assert!(!state.is_presenting_reward_tool_tip);
        assert!(!h.ctx.settings.get_bool(FlagKey::ShouldShowRewardToolTip));
    }
}
