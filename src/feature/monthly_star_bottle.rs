//! A past month's star bottle, rendered with the rewards saved for it.

use super::{AppContext, Effect, Reducer};
use crate::domain::day::Day;
use crate::domain::record::Record;
use crate::domain::reward::{DecorationData, StarBottleAction};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    pub day: Day,
    pub records: Vec<Record>,
    pub decoration_data: DecorationData,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct State {
    pub day: Day,
    pub records: Vec<Record>,
    pub decoration_data: DecorationData,
    pub star_bottle_action: StarBottleAction,
}

impl State {
    pub fn new(context: Context) -> Self {
        Self {
            day: context.day,
            records: context.records,
            decoration_data: context.decoration_data,
            star_bottle_action: StarBottleAction::None,
        }
    }

    pub fn title(&self) -> String {
        format!("{}년 {}월의 별통이", self.day.year, self.day.month)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Hands the stars to the renderer one record at a time.
    DropStar(usize),
    ConsumeStarBottleAction,
    TouchRecordListButton,
    TouchBackButton,
    Delegate(Delegate),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delegate {
    PushRecordList(Day, Vec<Record>),
    Pop,
}

#[derive(Debug, Default)]
pub struct MonthlyStarBottleReducer;

impl Reducer for MonthlyStarBottleReducer {
    type State = State;
    type Action = Action;

    fn reduce(&self, state: &mut State, action: Action, _ctx: &AppContext) -> Effect<Action> {
        match action {
            Action::DropStar(index) => {
                if let Some(record) = state.records.get(index) {
                    state.star_bottle_action = StarBottleAction::AddNewStar(record.clone());
                }
            }
            Action::ConsumeStarBottleAction => state.star_bottle_action = StarBottleAction::None,
            Action::TouchRecordListButton => {
                return Effect::send(Action::Delegate(Delegate::PushRecordList(
                    state.day,
                    state.records.clone(),
                )));
            }
            Action::TouchBackButton => return Effect::send(Action::Delegate(Delegate::Pop)),
            Action::Delegate(_) => {}
        }
        Effect::none()
    }
}

#[cfg(test)]
mod tests {
    use super::{Action, Context, Delegate, MonthlyStarBottleReducer, State};
    use crate::domain::day::Day;
    use crate::domain::record::Record;
    use crate::domain::reward::StarBottleAction;
    use crate::feature::test_support::Harness;
    use crate::feature::{Effect, Reducer};

    #[test]
    fn stars_drop_one_by_one_and_list_opens_for_the_month() {
        let h = Harness::new();
        let day = Day::new(2025, 3, 1).unwrap();
        let mut state = State::new(Context {
            day,
            records: vec![Record::empty(Day::new(2025, 3, 2).unwrap())],
            decoration_data: Default::default(),
        });
        assert_eq!(state.title(), "2025년 3월의 별통이");

        let reducer = MonthlyStarBottleReducer;
        reducer.reduce(&mut state, Action::DropStar(5), &h.ctx);
        assert_eq!(state.star_bottle_action, StarBottleAction::None);
        reducer.reduce(&mut state, Action::DropStar(0), &h.ctx);
        assert!(matches!(state.star_bottle_action, StarBottleAction::AddNewStar(_)));

        match reducer.reduce(&mut state, Action::TouchRecordListButton, &h.ctx) {
            Effect::Send(Action::Delegate(Delegate::PushRecordList(month, records))) => {
                assert_eq!(month, day);
                assert_eq!(records.len(), 1);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
