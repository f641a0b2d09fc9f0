//! Day-level entry screen: pick today or yesterday, draft the good and bad
//! contents (or mark the day as no-spending), confirm and save.

use std::time::Duration;

use time::OffsetDateTime;
use tracing::{debug, warn};

use super::{AppContext, Effect, Reducer};
use crate::domain::clock::{next_midnight, seconds_until, Clock};
use crate::domain::day::{Day, DayType};
use crate::domain::record::{Record, RecordContent, RecordContentType};
use crate::flags::{FlagKey, Settings};
use crate::network::NetworkError;
use crate::repository::Dependencies;
use crate::usecase;

pub const TIMER_ID: &str = "record-entry-timer";

/// Which of the two writable days already hold a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Context {
    pub is_complete_today: bool,
    pub is_complete_yesterday: bool,
}

impl Context {
    pub fn new(is_complete_today: bool, is_complete_yesterday: bool) -> Self {
        Self {
            is_complete_today,
            is_complete_yesterday,
        }
    }

    pub fn day_type(&self) -> DayType {
        if self.is_complete_today {
            DayType::Yesterday
        } else {
            DayType::Today
        }
    }

    pub fn day_title(&self) -> &'static str {
        match (self.is_complete_today, self.is_complete_yesterday) {
            (false, false) => "하루",
            (true, _) => "어제",
            _ => "오늘",
        }
    }

    /// Only a fresh pair of days lets the user switch between them.
    pub fn is_day_toggle_enabled(&self) -> bool {
        !(self.is_complete_today || self.is_complete_yesterday)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    SelectingDayType,
    WritingGood,
    WritingBad,
    CheckedEmpty,
    ReadyToSave,
    Saving,
    Saved,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct State {
    pub is_complete_today: bool,
    pub is_complete_yesterday: bool,

    pub record: Option<Record>,
    pub good_record: Option<RecordContent>,
    pub bad_record: Option<RecordContent>,
    pub is_checked_empty_record: bool,

    pub selected_day: Day,
    pub day_type: DayType,
    pub is_changing_day_type: bool,

    pub is_presenting_cancel: bool,
    pub is_presenting_record_empty: bool,
    pub is_presenting_record_guide: bool,
    pub is_presenting_day_toggle: bool,
    pub is_presenting_empty_record_tool_tip: bool,

    pub title: String,
    pub day_title: &'static str,
    /// Midnight following the moment the screen opened.
    pub deadline: Option<OffsetDateTime>,
    pub remaining_time: i64,

    pub is_save_enabled: bool,
    pub is_ready_to_save: bool,
    pub is_full_writing: bool,
    pub is_loading: bool,
    pub is_saved: bool,
    pub is_error: bool,
}

impl State {
    pub fn new(context: Context, clock: &dyn Clock, settings: &Settings) -> Self {
        let day_type = context.day_type();
        let day_title = context.day_title();
        let deadline = next_midnight(clock);
        Self {
            is_complete_today: context.is_complete_today,
            is_complete_yesterday: context.is_complete_yesterday,
            record: None,
            good_record: None,
            bad_record: None,
            is_checked_empty_record: false,
            selected_day: day_for(day_type, clock),
            day_type,
            is_changing_day_type: false,
            is_presenting_cancel: false,
            is_presenting_record_empty: false,
            is_presenting_record_guide: settings.get_bool(FlagKey::ShouldShowRecordGuideBottomSheet),
            is_presenting_day_toggle: context.is_day_toggle_enabled(),
            is_presenting_empty_record_tool_tip: false,
            title: format!("{day_title} 소비 정리해 볼까요?"),
            day_title,
            deadline,
            remaining_time: deadline.map_or(0, |deadline| seconds_until(clock, deadline)),
            is_save_enabled: false,
            is_ready_to_save: false,
            is_full_writing: false,
            is_loading: false,
            is_saved: false,
            is_error: false,
        }
    }

    /// Stores a finished content from the writing screen. A later content
    /// of the same flag replaces the earlier one.
    pub fn update_record_content(&mut self, content: RecordContent) {
        match content.flag {
            RecordContentType::Good => self.good_record = Some(content),
            RecordContentType::Bad => self.bad_record = Some(content),
        }
        self.is_checked_empty_record = false;
        self.is_save_enabled = true;
    }

    /// Drafts are frozen from the save confirmation on; only `CancelSave`
    /// reopens them, and only before saving starts.
    pub fn is_content_locked(&self) -> bool {
        self.is_ready_to_save || self.is_loading || self.is_saved
    }

    pub fn has_draft(&self) -> bool {
        self.good_record.is_some() || self.bad_record.is_some()
    }

    pub fn draft(&self, flag: RecordContentType) -> Option<&RecordContent> {
        match flag {
            RecordContentType::Good => self.good_record.as_ref(),
            RecordContentType::Bad => self.bad_record.as_ref(),
        }
    }

    pub fn phase(&self) -> Phase {
        if self.is_loading {
            Phase::Saving
        } else if self.is_saved {
            Phase::Saved
        } else if self.is_error {
            Phase::Error
        } else if self.is_ready_to_save {
            Phase::ReadyToSave
        } else if self.is_checked_empty_record {
            Phase::CheckedEmpty
        } else if self.bad_record.is_some() {
            Phase::WritingBad
        } else if self.good_record.is_some() {
            Phase::WritingGood
        } else {
            Phase::SelectingDayType
        }
    }

    /// Banner under the title. Yesterday's record counts down to midnight.
    pub fn guide(&self) -> String {
        if self.day_type == DayType::Today || self.remaining_time > 7200 {
            return "기록하고 별사탕 받자!".to_string();
        }
        if self.remaining_time <= 0 {
            return "기록을 마무리하면 별사탕을 받을 수 있어요!".to_string();
        }
        let hours = self.remaining_time / 3600;
        let minutes = (self.remaining_time % 3600) / 60;
        let seconds = self.remaining_time % 60;
        let text = format!("{seconds}초 안에 별사탕 받자!");
        if hours > 0 {
            format!("{hours}시간 {minutes}분 {text}")
        } else if minutes > 0 {
            format!("{minutes}분 {text}")
        } else {
            text
        }
    }
}

fn day_for(day_type: DayType, clock: &dyn Clock) -> Day {
    match day_type {
        DayType::Today => clock.today(),
        DayType::Yesterday => clock.yesterday(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    ShowCancelRecordBottomSheet,
    DismissCancelRecordBottomSheet,
    CancelRecording,
    DismissRecordGuideBottomSheet,

    TouchDayTypeToggleButton,
    ToggleDayType,

    TouchEmptyRecordButton,
    ClosePopover,
    DismissEmptyRecordBottomSheet,
    RecordEmpty,

    TouchRecordContent(RecordContentType),
    UpdateRecordContent(RecordContent),

    ReadyToSave,
    CancelSave,
    CompleteWrite,
    Saved,
    ErrorSave(NetworkError),

    StartTimer,
    CheckRemainingTime,
    UpdateTime(i64),

    Delegate(Delegate),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delegate {
    PushRecordWriting(RecordContentType, Option<RecordContent>),
    PopToMain,
    /// The record is stored locally; `synced` tells whether the server
    /// accepted it too.
    Completed { record: Record, synced: bool },
}

pub struct RecordEntryReducer {
    deps: Dependencies,
}

impl RecordEntryReducer {
    pub fn new(deps: Dependencies) -> Self {
        Self { deps }
    }

    fn complete_write(&self, state: &mut State, ctx: &AppContext) -> Effect<Action> {
        if !state.is_save_enabled || state.is_loading {
            return Effect::none();
        }
        state.is_loading = true;
        let contents: Vec<RecordContent> = state
            .good_record
            .iter()
            .chain(state.bad_record.iter())
            .cloned()
            .collect();
        let record = Record::new(state.selected_day, contents);
        usecase::update_streak(&ctx.settings, self.deps.clock.as_ref());
        state.record = Some(record.clone());
        self.deps.records.save(&record);
        state.is_error = false;

        let records = self.deps.records.clone();
        Effect::run(move |send| async move {
            match records.post_record(&record).await {
                Ok(()) => send.send(Action::Saved),
                Err(err) => send.send(Action::ErrorSave(err)),
            }
            Ok(())
        })
    }

    /// Counts down to a fixed deadline, so a tick landing past midnight
    /// reads 0 instead of a fresh day's worth of seconds.
    fn timer(&self, deadline: Option<OffsetDateTime>) -> Effect<Action> {
        let clock = self.deps.clock.clone();
        let Some(deadline) = deadline else {
            return Effect::send(Action::UpdateTime(0));
        };
        Effect::run(move |send| async move {
            loop {
                let remaining = seconds_until(clock.as_ref(), deadline);
                send.send(Action::UpdateTime(remaining));
                if remaining == 0 {
                    break;
                }
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
            Ok(())
        })
        .cancellable(TIMER_ID, true)
    }
}

impl Reducer for RecordEntryReducer {
    type State = State;
    type Action = Action;

    fn reduce(&self, state: &mut State, action: Action, ctx: &AppContext) -> Effect<Action> {
        let edits_draft = matches!(
            action,
            Action::TouchDayTypeToggleButton
                | Action::ToggleDayType
                | Action::TouchEmptyRecordButton
                | Action::RecordEmpty
                | Action::TouchRecordContent(_)
                | Action::UpdateRecordContent(_)
        );
        if edits_draft && state.is_content_locked() {
            debug!(phase = ?state.phase(), "draft is locked; ignoring edit");
            return Effect::none();
        }
        match action {
            Action::ShowCancelRecordBottomSheet => {
                state.is_presenting_cancel = true;
            }
            Action::DismissCancelRecordBottomSheet => {
                state.is_presenting_cancel = false;
                state.is_changing_day_type = false;
                ctx.navigation.block_swipe(false);
            }
            Action::CancelRecording => {
                state.is_presenting_cancel = false;
                if state.is_changing_day_type {
                    return Effect::send(Action::ToggleDayType);
                }
                ctx.navigation.block_swipe(false);
                return Effect::send(Action::Delegate(Delegate::PopToMain));
            }
            Action::DismissRecordGuideBottomSheet => {
                state.is_presenting_record_guide = false;
                ctx.settings
                    .set_bool(FlagKey::ShouldShowRecordGuideBottomSheet, false);
            }
            Action::TouchDayTypeToggleButton => {
                if !state.is_presenting_day_toggle {
                    return Effect::none();
                }
                if state.is_checked_empty_record || state.has_draft() {
                    state.is_changing_day_type = true;
                    state.is_presenting_cancel = true;
                } else {
                    return Effect::send(Action::ToggleDayType);
                }
            }
            Action::ToggleDayType => {
                state.is_changing_day_type = false;
                state.day_type = state.day_type.toggled();
                state.selected_day = day_for(state.day_type, self.deps.clock.as_ref());
                state.is_checked_empty_record = false;
                state.good_record = None;
                state.bad_record = None;
                state.is_save_enabled = false;
                ctx.navigation.block_swipe(false);
            }
            Action::TouchEmptyRecordButton => {
                state.is_presenting_empty_record_tool_tip = false;
                if state.is_checked_empty_record {
                    state.is_checked_empty_record = false;
                    state.is_save_enabled = false;
                    ctx.navigation.block_swipe(false);
                } else {
                    state.is_presenting_record_empty = true;
                }
            }
            Action::ClosePopover => {
                state.is_presenting_empty_record_tool_tip = false;
                ctx.settings
                    .set_bool(FlagKey::ShouldShowEmptyRecordToolTip, false);
            }
            Action::DismissEmptyRecordBottomSheet => {
                state.is_presenting_record_empty = false;
                ctx.navigation.block_swipe(false);
            }
            Action::RecordEmpty => {
                state.is_checked_empty_record = true;
                state.is_save_enabled = true;
                state.is_presenting_record_empty = false;
                state.good_record = None;
                state.bad_record = None;
                ctx.navigation.block_swipe(true);
            }
            Action::TouchRecordContent(flag) => {
                let existing = state.draft(flag).cloned();
                return Effect::send(Action::Delegate(Delegate::PushRecordWriting(
                    flag, existing,
                )));
            }
            Action::UpdateRecordContent(content) => {
                state.update_record_content(content);
                ctx.navigation.block_swipe(true);
            }
            Action::ReadyToSave => {
                if !state.is_save_enabled {
                    return Effect::none();
                }
                state.is_ready_to_save = true;
                state.is_full_writing = state.is_checked_empty_record
                    || (state.good_record.is_some() && state.bad_record.is_some());
            }
            Action::CancelSave => {
                if state.is_loading || state.is_saved {
                    return Effect::none();
                }
                state.is_ready_to_save = false;
            }
            Action::CompleteWrite => return self.complete_write(state, ctx),
            Action::Saved => {
                state.is_loading = false;
                state.is_saved = true;
                if let Some(record) = state.record.clone() {
                    return Effect::send(Action::Delegate(Delegate::Completed {
                        record,
                        synced: true,
                    }));
                }
            }
            Action::ErrorSave(err) => {
                warn!(error = %err, day = %state.selected_day, "record kept locally; upload failed");
                state.is_loading = false;
                state.is_error = true;
                if let Some(record) = state.record.clone() {
                    return Effect::send(Action::Delegate(Delegate::Completed {
                        record,
                        synced: false,
                    }));
                }
            }
            Action::StartTimer => {
                state.is_presenting_empty_record_tool_tip = ctx
                    .settings
                    .get_bool(FlagKey::ShouldShowEmptyRecordToolTip);
                ctx.navigation.block_swipe(state.has_draft());
                return self.timer(state.deadline);
            }
            Action::CheckRemainingTime => {
                let remaining = state
                    .deadline
                    .map_or(0, |deadline| seconds_until(self.deps.clock.as_ref(), deadline));
                return Effect::send(Action::UpdateTime(remaining));
            }
            Action::UpdateTime(seconds) => {
                state.remaining_time = seconds;
                if seconds == 0 {
                    return Effect::cancel(TIMER_ID);
                }
            }
            Action::Delegate(_) => {}
        }
        Effect::none()
    }
}
