//! Where every child delegate leads: a push, a pop or a change to a sibling
//! screen.

use tracing::{info, warn};

use super::{Action, Destination, MainNavigationReducer, PathAction, State};
use crate::domain::clock::Clock;
use crate::feature::{
    bottle_calendar, decoration, main, monthly_star_bottle, record_entry, record_list,
    record_writing, reward_receive, reward_start, setting, AppContext, Effect, ToastType,
};
use crate::usecase;

#[derive(Debug)]
pub(super) enum PathDelegate {
    Setting(setting::Delegate),
    RecordEntry(record_entry::Delegate),
    RecordWriting(record_writing::Delegate),
    RecordList(record_list::Delegate),
    BottleCalendar(bottle_calendar::Delegate),
    MonthlyStarBottle(monthly_star_bottle::Delegate),
    RewardStart(reward_start::Delegate),
    RewardReceive(reward_receive::Delegate),
    Decoration(decoration::Delegate),
}

/// Splits delegate actions off; everything else goes to the child reducer.
pub(super) fn delegate(action: PathAction) -> Result<PathDelegate, PathAction> {
    match action {
        PathAction::Setting(setting::Action::Delegate(d)) => Ok(PathDelegate::Setting(d)),
        PathAction::RecordEntry(record_entry::Action::Delegate(d)) => {
            Ok(PathDelegate::RecordEntry(d))
        }
        PathAction::RecordWriting(record_writing::Action::Delegate(d)) => {
            Ok(PathDelegate::RecordWriting(d))
        }
        PathAction::RecordList(record_list::Action::Delegate(d)) => Ok(PathDelegate::RecordList(d)),
        PathAction::BottleCalendar(bottle_calendar::Action::Delegate(d)) => {
            Ok(PathDelegate::BottleCalendar(d))
        }
        PathAction::MonthlyStarBottle(monthly_star_bottle::Action::Delegate(d)) => {
            Ok(PathDelegate::MonthlyStarBottle(d))
        }
        PathAction::RewardStart(reward_start::Action::Delegate(d)) => {
            Ok(PathDelegate::RewardStart(d))
        }
        PathAction::RewardReceive(reward_receive::Action::Delegate(d)) => {
            Ok(PathDelegate::RewardReceive(d))
        }
        PathAction::Decoration(decoration::Action::Delegate(d)) => Ok(PathDelegate::Decoration(d)),
        other => Err(other),
    }
}

fn push(destination: Destination) -> Effect<Action> {
    Effect::send(Action::Push(destination))
}

impl MainNavigationReducer {
    fn record_entry_destination(&self) -> Destination {
        Destination::RecordEntry(usecase::record_entry_context(
            self.deps.records.as_ref(),
            self.deps.clock.as_ref(),
        ))
    }

    pub(super) fn route_main(
        &self,
        _state: &mut State,
        delegate: main::Delegate,
        _ctx: &AppContext,
    ) -> Effect<Action> {
        match delegate {
            main::Delegate::PushSetting => {
                push(Destination::Setting(self.deps.users.get_user_name()))
            }
            main::Delegate::PushRecordEntry => push(self.record_entry_destination()),
            main::Delegate::PushRecordList => {
                let records = self.deps.records.clone();
                let today = self.deps.clock.today();
                Effect::run(move |send| async move {
                    let list = match records.get_monthly_record_list(today.year, today.month).await {
                        Ok(month) => month.records.unwrap_or_default(),
                        Err(err) => {
                            warn!(error = %err, "month list unavailable; showing local records");
                            records.load_records(today.year, today.month).unwrap_or_default()
                        }
                    };
                    send.send(Action::Push(Destination::MonthlyRecordList(today, list, true)));
                    Ok(())
                })
            }
            main::Delegate::PushBottleCalendar(summary) => {
                push(Destination::BottleCalendar(summary))
            }
            main::Delegate::PushRewardStart => {
                let deps = self.deps.clone();
                Effect::run(move |send| async move {
                    let info = deps.feedback.get_feedback_state().await?;
                    let (today, yesterday) =
                        usecase::written_days(deps.records.as_ref(), deps.clock.as_ref());
                    send.send(Action::Push(Destination::RewardStart(info, today, yesterday)));
                    Ok(())
                })
            }
        }
    }

    pub(super) fn route_path(
        &self,
        state: &mut State,
        delegate: PathDelegate,
        _ctx: &AppContext,
    ) -> Effect<Action> {
        match delegate {
            PathDelegate::Setting(setting::Delegate::PushDecoration(context)) => {
                push(Destination::Decoration(context))
            }

            PathDelegate::RecordEntry(delegate) => match delegate {
                record_entry::Delegate::PushRecordWriting(flag, content) => {
                    push(Destination::RecordWriting(flag, content))
                }
                record_entry::Delegate::PopToMain => state.remove_all(),
                record_entry::Delegate::Completed { record, synced } => {
                    if !synced {
                        info!(day = %record.day, "record saved offline");
                    }
                    Effect::send(Action::CompleteWriteRecord(record))
                }
            },
            PathDelegate::RecordWriting(delegate) => match delegate {
                record_writing::Delegate::CompleteWrite(content) => {
                    Effect::send(Action::CompleteWriteRecordContent(content))
                }
                record_writing::Delegate::Cancel => state.pop_last(),
            },

            PathDelegate::RecordList(delegate) => match delegate {
                record_list::Delegate::PushRecordEntry => push(self.record_entry_destination()),
                record_list::Delegate::PushBottleCalendar(summary) => {
                    push(Destination::BottleCalendar(summary))
                }
                record_list::Delegate::PushStatistics(day, records) => {
                    push(Destination::Statistics(day, records))
                }
            },
            PathDelegate::BottleCalendar(bottle_calendar::Delegate::PushMonthlyBottle(
                day,
                records,
                items,
            )) => push(Destination::MonthlyStarBottle(day, records, items)),
            PathDelegate::MonthlyStarBottle(delegate) => match delegate {
                monthly_star_bottle::Delegate::PushRecordList(day, records) => {
                    push(Destination::MonthlyRecordList(day, records, false))
                }
                monthly_star_bottle::Delegate::Pop => state.pop_last(),
            },

            PathDelegate::RewardStart(delegate) => match delegate {
                reward_start::Delegate::PushRewardReceive(count) => {
                    push(Destination::RewardReceive(count))
                }
                reward_start::Delegate::PushRecordEntry => push(self.record_entry_destination()),
                reward_start::Delegate::PushDecoration(context) => {
                    push(Destination::Decoration(context))
                }
            },
            PathDelegate::RewardReceive(delegate) => match delegate {
                reward_receive::Delegate::PushDecoration(context) => {
                    push(Destination::Decoration(context))
                }
                reward_receive::Delegate::Pop => state.pop_last(),
            },
            PathDelegate::Decoration(decoration::Delegate::Pop(saved)) => {
                let pop = state.pop_last();
                if !saved {
                    return pop;
                }
                state.main.toast = ToastType::SuccessSaveDecoration;
                Effect::merge([pop, Effect::send(Action::Main(main::Action::OnAppear))])
            }
        }
    }
}
