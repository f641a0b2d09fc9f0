//! Month record list with the good/bad ratio bar.

use std::collections::BTreeSet;

use super::{AppContext, Effect, Reducer};
use crate::domain::day::Day;
use crate::domain::record::{Record, RecordContentType};
use crate::domain::summary::RecordCountSummary;
use crate::flags::{FlagKey, Settings};
use crate::repository::Dependencies;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    pub day: Day,
    pub records: Vec<Record>,
    pub is_show_bottle_calendar: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct State {
    pub day: Day,
    pub records: Vec<Record>,
    pub is_show_bottle_calendar: bool,
    pub good_count: usize,
    pub bad_count: usize,
    /// Share of good contents in `0.0..=1.0`; `-1.0` while nothing is counted.
    pub progress_point: f64,
    pub is_presenting_bottle_calendar_tool_tip: bool,
    pub date_set: BTreeSet<Day>,
}

impl State {
    pub fn new(context: Context, settings: &Settings) -> Self {
        let mut records = context.records;
        records.sort_by(|a, b| b.day.cmp(&a.day));
        let (good_count, bad_count) = count_flags(&records);
        Self {
            day: context.day,
            records,
            is_show_bottle_calendar: context.is_show_bottle_calendar,
            good_count,
            bad_count,
            progress_point: progress_point(good_count, bad_count),
            is_presenting_bottle_calendar_tool_tip: settings
                .get_bool(FlagKey::ShouldShowBottleCalendarToolTip),
            date_set: BTreeSet::new(),
        }
    }

    pub fn title(&self) -> String {
        format!("{}년 {}월 기록", self.day.year, self.day.month)
    }
}

fn count_flags(records: &[Record]) -> (usize, usize) {
    records
        .iter()
        .fold((0, 0), |(good, bad), record| {
            (
                good + usize::from(record.content(RecordContentType::Good).is_some()),
                bad + usize::from(record.content(RecordContentType::Bad).is_some()),
            )
        })
}

fn progress_point(good: usize, bad: usize) -> f64 {
    let total = good + bad;
    if total == 0 {
        -1.0
    } else {
        good as f64 / total as f64
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    OnAppear,
    CloseBottleCalendarToolTip,
    AddAppearCardView(Day),

    TouchRecordButton,
    TouchStatisticsView,
    PushStatisticsView,
    PushBottleCalendarView,

    Delegate(Delegate),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Delegate {
    PushRecordEntry,
    PushBottleCalendar(RecordCountSummary),
    PushStatistics(Day, Vec<Record>),
}

pub struct RecordListReducer {
    deps: Dependencies,
}

impl RecordListReducer {
    pub fn new(deps: Dependencies) -> Self {
        Self { deps }
    }
}

impl Reducer for RecordListReducer {
    type State = State;
    type Action = Action;

    fn reduce(&self, state: &mut State, action: Action, ctx: &AppContext) -> Effect<Action> {
        match action {
            Action::OnAppear => {
                state.is_presenting_bottle_calendar_tool_tip = ctx
                    .settings
                    .get_bool(FlagKey::ShouldShowBottleCalendarToolTip);
            }
            Action::CloseBottleCalendarToolTip => {
                state.is_presenting_bottle_calendar_tool_tip = false;
                ctx.settings
                    .set_bool(FlagKey::ShouldShowBottleCalendarToolTip, false);
            }
            Action::AddAppearCardView(day) => {
                state.date_set.insert(day);
            }
            Action::TouchRecordButton => {
                return Effect::send(Action::Delegate(Delegate::PushRecordEntry));
            }
            Action::TouchStatisticsView => {
                if !state.records.is_empty() {
                    return Effect::send(Action::PushStatisticsView);
                }
            }
            Action::PushStatisticsView => {
                let records = self.deps.records.clone();
                let day = state.day;
                return Effect::run(move |send| async move {
                    let month = records.get_monthly_record_list(day.year, day.month).await?;
                    let list = month.records.unwrap_or_default();
                    send.send(Action::Delegate(Delegate::PushStatistics(day, list)));
                    Ok(())
                });
            }
            Action::PushBottleCalendarView => {
                state.is_presenting_bottle_calendar_tool_tip = false;
                ctx.settings
                    .set_bool(FlagKey::ShouldShowBottleCalendarToolTip, false);
                let records = self.deps.records.clone();
                let year = state.day.year;
                return Effect::run(move |send| async move {
                    let summary = records.get_yearly_record_summary(year).await?;
                    send.send(Action::Delegate(Delegate::PushBottleCalendar(summary)));
                    Ok(())
                });
            }
            Action::Delegate(_) => {}
        }
        Effect::none()
    }
}

#[cfg(test)]
mod tests {
    use super::{Action, Context, Delegate, RecordListReducer, State};
    use crate::domain::day::Day;
    use crate::domain::record::{Record, RecordCategory, RecordContent, RecordContentType};
    use crate::domain::summary::MonthlyRecordState;
    use crate::feature::test_support::{collect, Harness};
    use crate::feature::Reducer;
    use crate::flags::FlagKey;

    fn day(d: u8) -> Day {
        Day::new(2025, 5, d).unwrap()
    }

    fn sample_records() -> Vec<Record> {
        vec![
            Record::new(
                day(1),
                vec![
                    RecordContent::new(RecordContentType::Good, RecordCategory::Flex, "shoes"),
                    RecordContent::new(RecordContentType::Bad, RecordCategory::Greed, "cake"),
                ],
            ),
            Record::new(
                day(3),
                vec![RecordContent::new(
                    RecordContentType::Good,
                    RecordCategory::Healing,
                    "bath",
                )],
            ),
            Record::empty(day(2)),
        ]
    }

    #[test]
    fn counts_and_ratio_come_from_the_records() {
        let h = Harness::new();
        let state = State::new(
            Context {
                day: day(10),
                records: sample_records(),
                is_show_bottle_calendar: true,
            },
            &h.ctx.settings,
        );
        assert_eq!((state.good_count, state.bad_count), (2, 1));
        assert!((state.progress_point - 2.0 / 3.0).abs() < f64::EPSILON);
        assert_eq!(state.records[0].day, day(3));
        assert_eq!(state.title(), "2025년 5월 기록");

        let empty = State::new(
            Context {
                day: day(10),
                records: vec![Record::empty(day(4))],
                is_show_bottle_calendar: false,
            },
            &h.ctx.settings,
        );
        assert_eq!(empty.progress_point, -1.0);
    }

    #[test]
    fn statistics_need_at_least_one_record() {
        let h = Harness::new();
        let reducer = RecordListReducer::new(h.deps.clone());
        let mut state = State::new(
            Context {
                day: day(10),
                records: Vec::new(),
                is_show_bottle_calendar: true,
            },
            &h.ctx.settings,
        );
        assert!(reducer
            .reduce(&mut state, Action::TouchStatisticsView, &h.ctx)
            .is_none());
    }

    #[tokio::test]
    async fn statistics_fetch_the_month_before_delegating() {
        let h = Harness::new();
        h.backend.with(|data| {
            data.remote_months.insert(
                (2025, 5),
                MonthlyRecordState {
                    records: Some(sample_records()),
                    ..MonthlyRecordState::default()
                },
            );
        });
        let reducer = RecordListReducer::new(h.deps.clone());
        let mut state = State::new(
            Context {
                day: day(10),
                records: sample_records(),
                is_show_bottle_calendar: true,
            },
            &h.ctx.settings,
        );
        let effect = reducer.reduce(&mut state, Action::PushStatisticsView, &h.ctx);
        let mut emitted = collect(effect).await;
        match emitted.remove(0) {
            Action::Delegate(Delegate::PushStatistics(month, records)) => {
                assert_eq!(month, day(10));
                assert_eq!(records.len(), 3);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn opening_the_calendar_retires_its_tool_tip() {
        let h = Harness::new();
        let reducer = RecordListReducer::new(h.deps.clone());
        let mut state = State::new(
            Context {
                day: day(10),
                records: Vec::new(),
                is_show_bottle_calendar: true,
            },
            &h.ctx.settings,
        );
        assert!(state.is_presenting_bottle_calendar_tool_tip);
        reducer.reduce(&mut state, Action::PushBottleCalendarView, &h.ctx);
        assert!(!state.is_presenting_bottle_calendar_tool_tip);
        assert!(!h.ctx.settings.get_bool(FlagKey::ShouldShowBottleCalendarToolTip));

        reducer.reduce(&mut state, Action::AddAppearCardView(day(3)), &h.ctx);
        reducer.reduce(&mut state, Action::AddAppearCardView(day(3)), &h.ctx);
        assert_eq!(state.date_set.len(), 1);
    }
}
