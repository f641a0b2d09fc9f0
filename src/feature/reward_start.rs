//! Reward entry screen: progress towards the twelve gifts and the feedback
//! card shown before a reward is handed out.

use std::time::Duration;

use super::{decoration, AppContext, Effect, Reducer};
use crate::domain::reward::RewardCategory;
use crate::domain::summary::FeedbackCard;
use crate::flags::FlagKey;
use crate::repository::Dependencies;

/// Records needed for the full set of rewards.
pub const FULL_REWARD_COUNT: i64 = 12;

pub const FEEDBACK_CARD_DELAY: Duration = Duration::from_millis(500);
pub const FEEDBACK_TITLE_DELAY: Duration = Duration::from_millis(600);
pub const FEEDBACK_STEP_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    pub record_count: i64,
    pub is_not_opened: bool,
    pub user_name: String,
    pub has_today_record: bool,
    pub has_yesterday_record: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct State {
    pub record_count: i64,
    pub user_name: String,

    pub title: String,
    pub sub_title: String,
    pub button_title: String,

    pub is_full_reward: bool,
    pub is_enabled_button: bool,
    pub enabled_write_record: bool,
    pub is_presenting_guide_bottom_sheet: bool,

    pub feedback_card: Option<FeedbackCard>,
    pub day_title: String,
    pub is_presenting_feedback_start_view: bool,
    pub is_presenting_feedback_title: bool,
    pub is_presenting_feedback_card: bool,
    pub is_presenting_button: bool,
    pub is_presenting_reward_feedback_view: bool,
}

impl State {
    pub fn new(context: Context) -> Self {
        let mut state = Self {
            record_count: context.record_count,
            user_name: context.user_name,
            title: "앗! 아직 기록을 작성하지 않았어요".to_string(),
            sub_title: "오늘부터 기록하고 숨겨진 12개 선물을 받아 보세요!".to_string(),
            button_title: "기록하러 가기".to_string(),
            is_full_reward: false,
            is_enabled_button: true,
            enabled_write_record: false,
            is_presenting_guide_bottom_sheet: false,
            feedback_card: None,
            day_title: "요즘".to_string(),
            is_presenting_feedback_start_view: true,
            is_presenting_feedback_title: false,
            is_presenting_feedback_card: false,
            is_presenting_button: true,
            is_presenting_reward_feedback_view: false,
        };
        let progress = format!(
            "기록하고 토비 선물받기 🎁\n지금까지 {}번 기록 중",
            context.record_count
        );
        if context.record_count >= FULL_REWARD_COUNT {
            if context.is_not_opened {
                state.title = progress;
                state.sub_title = "12번 기록하면 특별한 선물을 받아요".to_string();
                state.button_title = "지금 선물받기".to_string();
            } else {
                state.title = "준비한 선물을 모두 받았어요!\n이번 선물 어떠셨나요?".to_string();
                state.sub_title = "다섯 분을 선정해 스타벅스 기프티콘을 드려요".to_string();
                state.is_full_reward = true;
                state.is_enabled_button = false;
            }
        } else if context.record_count > 0 {
            state.title = progress;
            state.sub_title = "12번 기록하면 특별한 선물을 받아요".to_string();
            state.button_title = "지금 선물받기".to_string();
            if !context.is_not_opened {
                if context.has_today_record && context.has_yesterday_record {
                    state.title = "오늘까지 받을 수 있는 선물을\n모두 받았어요".to_string();
                    state.is_enabled_button = false;
                } else {
                    state.button_title = "기록하러 가기".to_string();
                    state.enabled_write_record = true;
                }
            }
        } else {
            state.enabled_write_record = true;
        }
        state
    }

    fn wants_feedback_card(&self) -> bool {
        self.record_count > 0 && self.is_enabled_button && !self.enabled_write_record
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    ToggleGuideBottomSheet,
    TouchGuideBottomSheetButton,

    TouchNextButton,
    TouchReviewButton,
    TouchDecorationButton,

    RequestFeedbackCard,
    ReceivedFeedbackCard(FeedbackCard),
    PresentFeedbackTitle,
    PresentFeedbackCard,
    PresentNextButton,

    Delegate(Delegate),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Delegate {
    PushRewardReceive(i64),
    PushRecordEntry,
    PushDecoration(decoration::Context),
}

pub struct RewardStartReducer {
    deps: Dependencies,
}

impl RewardStartReducer {
    pub fn new(deps: Dependencies) -> Self {
        Self { deps }
    }
}

/// The guide sheet only ever opens on the first visit.
fn toggle_guide(state: &mut State, ctx: &AppContext) {
    let settings = &ctx.settings;
    if settings.get_bool(FlagKey::ShouldShowRewardEventBottomSheet) {
        settings.set_bool(FlagKey::ShouldShowRewardEventBottomSheet, false);
        state.is_presenting_guide_bottom_sheet = !state.is_presenting_guide_bottom_sheet;
        if !state.is_presenting_guide_bottom_sheet {
            ctx.navigation.block_swipe(false);
        }
    } else if state.is_presenting_guide_bottom_sheet {
        state.is_presenting_guide_bottom_sheet = false;
        ctx.navigation.block_swipe(false);
    }
}

impl Reducer for RewardStartReducer {
    type State = State;
    type Action = Action;

    fn reduce(&self, state: &mut State, action: Action, ctx: &AppContext) -> Effect<Action> {
        match action {
            Action::ToggleGuideBottomSheet => toggle_guide(state, ctx),
            Action::TouchGuideBottomSheetButton => {
                let toggle = Effect::send(Action::ToggleGuideBottomSheet);
                if state.wants_feedback_card() {
                    return Effect::merge([toggle, Effect::send(Action::RequestFeedbackCard)]);
                }
                return toggle;
            }
            Action::TouchNextButton => {
                if state.enabled_write_record {
                    return Effect::send(Action::Delegate(Delegate::PushRecordEntry));
                }
                if state.feedback_card.is_none() {
                    return Effect::send(Action::RequestFeedbackCard);
                }
                ctx.navigation.block_swipe(true);
                let rewards = self.deps.rewards.clone();
                return Effect::run(move |send| async move {
                    let count = rewards.get_not_open_reward_count().await?;
                    send.send(Action::Delegate(Delegate::PushRewardReceive(count)));
                    Ok(())
                });
            }
            Action::TouchReviewButton => state.is_presenting_reward_feedback_view = true,
            Action::TouchDecorationButton => {
                let deps = self.deps.clone();
                return Effect::run(move |send| async move {
                    let context = decoration::load_context(&deps, RewardCategory::Background).await?;
                    send.send(Action::Delegate(Delegate::PushDecoration(context)));
                    Ok(())
                });
            }
            Action::RequestFeedbackCard => {
                let feedback = self.deps.feedback.clone();
                return Effect::run(move |send| async move {
                    tokio::time::sleep(FEEDBACK_CARD_DELAY).await;
                    let card = feedback.get_feedback_card().await?;
                    send.send(Action::ReceivedFeedbackCard(card));
                    Ok(())
                })
                .cancellable("reward-start-feedback", true);
            }
            Action::ReceivedFeedbackCard(card) => {
                state.day_title = card.prefix.clone();
                state.feedback_card = Some(card);
                state.is_presenting_feedback_start_view = false;
                state.is_presenting_button = false;
                return Effect::run(|send| async move {
                    tokio::time::sleep(FEEDBACK_TITLE_DELAY).await;
                    send.send(Action::PresentFeedbackTitle);
                    tokio::time::sleep(FEEDBACK_STEP_DELAY).await;
                    send.send(Action::PresentFeedbackCard);
                    tokio::time::sleep(FEEDBACK_STEP_DELAY).await;
                    send.send(Action::PresentNextButton);
                    Ok(())
                });
            }
            Action::PresentFeedbackTitle => state.is_presenting_feedback_title = true,
            Action::PresentFeedbackCard => {
                state.is_presenting_feedback_card = true;
                state.button_title = "다음".to_string();
            }
            Action::PresentNextButton => state.is_presenting_button = true,
            Action::Delegate(_) => {}
        }
        Effect::none()
    }
}

#[cfg(test)]
mod tests {
    use super::{Action, Context, Delegate, RewardStartReducer, State};
    use crate::domain::record::RecordCategory;
    use crate::domain::summary::FeedbackCard;
    use crate::feature::test_support::{collect, Harness};
    use crate::feature::{Effect, Reducer, Store};
    use crate::flags::FlagKey;

    fn context(record_count: i64, is_not_opened: bool, today: bool, yesterday: bool) -> Context {
        Context {
            record_count,
            is_not_opened,
            user_name: "별별이".to_string(),
            has_today_record: today,
            has_yesterday_record: yesterday,
        }
    }

    fn card() -> FeedbackCard {
        FeedbackCard {
            category: RecordCategory::Flex,
            title: "플렉스한 하루".to_string(),
            content: "멋진 소비였어요".to_string(),
            prefix: "오늘은".to_string(),
        }
    }

    #[test]
    fn copy_follows_record_count_and_open_state() {
        let fresh = State::new(context(0, false, false, false));
        assert!(fresh.enabled_write_record);
        assert_eq!(fresh.button_title, "기록하러 가기");

        let waiting = State::new(context(5, true, true, false));
        assert_eq!(waiting.title, "기록하고 토비 선물받기 🎁\n지금까지 5번 기록 중");
        assert_eq!(waiting.button_title, "지금 선물받기");
        assert!(!waiting.enabled_write_record);

        let done_for_today = State::new(context(5, false, true, true));
        assert!(!done_for_today.is_enabled_button);

        let can_write = State::new(context(5, false, true, false));
        assert!(can_write.enabled_write_record);
        assert_eq!(can_write.button_title, "기록하러 가기");

        let full = State::new(context(12, false, true, true));
        assert!(full.is_full_reward);
        assert!(!full.is_enabled_button);

        let full_unopened = State::new(context(14, true, true, true));
        assert!(!full_unopened.is_full_reward);
        assert_eq!(full_unopened.button_title, "지금 선물받기");
    }

    #[test]
    fn guide_sheet_opens_only_on_the_first_visit() {
        let h = Harness::new();
        let reducer = RewardStartReducer::new(h.deps.clone());
        let mut state = State::new(context(5, true, true, false));
        reducer.reduce(&mut state, Action::ToggleGuideBottomSheet, &h.ctx);
        assert!(state.is_presenting_guide_bottom_sheet);
        assert!(!h.ctx.settings.get_bool(FlagKey::ShouldShowRewardEventBottomSheet));

        reducer.reduce(&mut state, Action::ToggleGuideBottomSheet, &h.ctx);
        assert!(!state.is_presenting_guide_bottom_sheet);
        reducer.reduce(&mut state, Action::ToggleGuideBottomSheet, &h.ctx);
        assert!(!state.is_presenting_guide_bottom_sheet);
    }

    #[test]
    fn next_button_routes_to_writing_when_nothing_is_earned() {
        let h = Harness::new();
        let reducer = RewardStartReducer::new(h.deps.clone());
        let mut state = State::new(context(0, false, false, false));
        assert!(matches!(
            reducer.reduce(&mut state, Action::TouchNextButton, &h.ctx),
            Effect::Send(Action::Delegate(Delegate::PushRecordEntry))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn feedback_card_reveals_in_order() {
        let h = Harness::new();
        h.backend.with(|data| data.feedback_card = Some(card()));
        let mut store = Store::new(
            RewardStartReducer::new(h.deps.clone()),
            State::new(context(5, true, true, false)),
            h.ctx.clone(),
        );
        store.send(Action::TouchNextButton);
        assert!(store.run_until(|state| state.feedback_card.is_some()).await);
        let state = store.state();
        assert_eq!(state.day_title, "오늘은");
        assert!(!state.is_presenting_feedback_start_view);
        assert!(!state.is_presenting_button);
        assert!(!state.is_presenting_feedback_title);

        assert!(store.run_until(|state| state.is_presenting_feedback_title).await);
        assert!(!store.state().is_presenting_feedback_card);
        assert!(store.run_until(|state| state.is_presenting_feedback_card).await);
        assert_eq!(store.state().button_title, "다음");
        assert!(!store.state().is_presenting_button);
        store.settle().await;
        assert!(store.state().is_presenting_button);
    }

    #[tokio::test(start_paused = true)]
    async fn next_after_the_card_opens_the_reward_receive_screen() {
        let h = Harness::new();
        h.backend.with(|data| data.not_opened_count = 2);
        let reducer = RewardStartReducer::new(h.deps.clone());
        let mut state = State::new(context(5, true, true, false));
        state.feedback_card = Some(card());
        let emitted = collect(reducer.reduce(&mut state, Action::TouchNextButton, &h.ctx)).await;
        assert_eq!(emitted, vec![Action::Delegate(Delegate::PushRewardReceive(2))]);
        assert!(h.ctx.navigation.is_swipe_blocked());
    }
}
