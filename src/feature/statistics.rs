use super::{AppContext, Effect, Reducer};
use crate::domain::day::Day;
use crate::domain::record::{Record, RecordCategory, RecordContentType};
use crate::domain::summary::CategoryStatistics;
use crate::repository::Dependencies;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    pub day: Day,
    pub records: Vec<Record>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct State {
    pub day: Day,
    pub records: Vec<Record>,
    pub statistics: CategoryStatistics,
    pub is_presenting_propose_function: bool,
}

impl State {
    pub fn new(context: Context) -> Self {
        let statistics =
            CategoryStatistics::from_records(context.day.year, context.day.month, &context.records);
        Self {
            day: context.day,
            records: context.records,
            statistics,
            is_presenting_propose_function: false,
        }
    }

    pub fn count(&self, flag: RecordContentType) -> i64 {
        self.ranked(flag).iter().map(|(_, count)| count).sum()
    }

    /// Categories of `flag` with at least one content, most frequent first.
    pub fn ranked(&self, flag: RecordContentType) -> Vec<(RecordCategory, i64)> {
        self.statistics.ranked(flag)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    OnAppear,
    UpdateStatistics(CategoryStatistics),
    TouchProposeFunction,
    CloseProposeFunction,
}

pub struct StatisticsReducer {
    deps: Dependencies,
}

impl StatisticsReducer {
    pub fn new(deps: Dependencies) -> Self {
        Self { deps }
    }
}

impl Reducer for StatisticsReducer {
    type State = State;
    type Action = Action;

    fn reduce(&self, state: &mut State, action: Action, _ctx: &AppContext) -> Effect<Action> {
        match action {
            Action::OnAppear => {
                let records = self.deps.records.clone();
                let day = state.day;
                return Effect::run(move |send| async move {
                    let statistics = records
                        .get_monthly_category_statistics(day.year, day.month)
                        .await?;
                    send.send(Action::UpdateStatistics(statistics));
                    Ok(())
                });
            }
            // An empty server answer keeps the locally derived counts.
            Action::UpdateStatistics(statistics) => {
                if !statistics.counts.is_empty() {
                    state.statistics = statistics;
                }
            }
            Action::TouchProposeFunction => state.is_presenting_propose_function = true,
            Action::CloseProposeFunction => state.is_presenting_propose_function = false,
        }
        Effect::none()
    }
}
