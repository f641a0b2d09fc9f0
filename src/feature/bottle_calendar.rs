//! Year grid of star bottles, one per month.

use tracing::warn;

use super::{AppContext, Effect, Reducer, ToastType};
use crate::domain::day::Day;
use crate::domain::record::Record;
use crate::domain::reward::Reward;
use crate::domain::summary::RecordCountSummary;
use crate::flags::{FlagKey, Settings};
use crate::repository::Dependencies;
use crate::usecase;

/// First month the service kept records for. Earlier months are not shown.
pub const SERVICE_START: (i32, u8) = (2025, 3);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    pub summary: RecordCountSummary,
    pub today: Day,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct State {
    pub year: i32,
    /// `(month, stars)`; `-1` marks a month that has not started yet.
    pub star_counts: Vec<(u8, i64)>,
    pub is_presenting_top_banner: bool,
    pub is_loading: bool,
    pub toast: ToastType,
}

impl State {
    pub fn new(context: Context, settings: &Settings) -> Self {
        Self {
            year: context.summary.year,
            star_counts: star_counts(&context.summary, context.today),
            is_presenting_top_banner: settings.get_bool(FlagKey::ShouldShowBottleCalendarTopBanner),
            is_loading: false,
            toast: ToastType::None,
        }
    }

    pub fn stars(&self, month: u8) -> Option<i64> {
        self.star_counts
            .iter()
            .find(|(m, _)| *m == month)
            .map(|(_, count)| *count)
    }
}

fn star_counts(summary: &RecordCountSummary, today: Day) -> Vec<(u8, i64)> {
    let first = if summary.year == SERVICE_START.0 {
        SERVICE_START.1
    } else {
        1
    };
    (first..=12)
        .map(|month| {
            let started = (summary.year, month) <= (today.year, today.month);
            let count = match summary.monthly_records.get(&month) {
                Some(count) => count.record_count,
                None if started => 0,
                None => -1,
            };
            (month, count)
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    OnAppear,
    CloseTopBanner,
    TouchStarBottle(u8),
    ShowEmptyBottleToast,
    CompleteShowToast,
    ShowLoading,
    HideLoading,
    FetchMonthlyRecord(i32, u8),
    Delegate(Delegate),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Delegate {
    PushMonthlyBottle(Day, Vec<Record>, Vec<Reward>),
}

pub struct BottleCalendarReducer {
    deps: Dependencies,
}

impl BottleCalendarReducer {
    pub fn new(deps: Dependencies) -> Self {
        Self { deps }
    }

    fn fetch_month(&self, year: i32, month: u8) -> Effect<Action> {
        let deps = self.deps.clone();
        Effect::run(move |send| async move {
            let state = match deps.records.get_monthly_record_list(year, month).await {
                Ok(state) => state,
                Err(err) => {
                    send.send(Action::HideLoading);
                    return Err(err.into());
                }
            };
            let items: Vec<Reward> = state.decoration_item.values().cloned().collect();
            let stored = usecase::download_reward_resources(deps.files.as_ref(), &items).await;
            if stored < items.len() {
                warn!(year, month, stored, "not every decoration resource was cached");
            }
            let records = state.records.unwrap_or_default();
            deps.records.save_records(&records);
            send.send(Action::HideLoading);
            if let Ok(first) = Day::month_start(year, month) {
                send.send(Action::Delegate(Delegate::PushMonthlyBottle(
                    first,
                    records,
                    state.save_items,
                )));
            }
            Ok(())
        })
    }
}

impl Reducer for BottleCalendarReducer {
    type State = State;
    type Action = Action;

    fn reduce(&self, state: &mut State, action: Action, ctx: &AppContext) -> Effect<Action> {
        match action {
            Action::OnAppear => {
                state.is_presenting_top_banner = ctx
                    .settings
                    .get_bool(FlagKey::ShouldShowBottleCalendarTopBanner);
            }
            Action::CloseTopBanner => {
                state.is_presenting_top_banner = false;
                ctx.settings
                    .set_bool(FlagKey::ShouldShowBottleCalendarTopBanner, false);
            }
            Action::TouchStarBottle(month) => match state.stars(month) {
                Some(0) => return Effect::send(Action::ShowEmptyBottleToast),
                Some(count) if count > 0 => {
                    return Effect::merge([
                        Effect::send(Action::ShowLoading),
                        Effect::send(Action::FetchMonthlyRecord(state.year, month)),
                    ]);
                }
                _ => {}
            },
            Action::ShowEmptyBottleToast => state.toast = ToastType::EmptyRecordMonth,
            Action::CompleteShowToast => state.toast = ToastType::None,
            Action::ShowLoading => state.is_loading = true,
            Action::HideLoading => state.is_loading = false,
            Action::FetchMonthlyRecord(year, month) => return self.fetch_month(year, month),
            Action::Delegate(_) => {}
        }
        Effect::none()
    }
}
