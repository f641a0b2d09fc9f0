//! Top of the app: splash sync, onboarding and then the home coordinator.

use tracing::{debug, warn};

use super::navigation::{self, Destination, MainNavigationReducer};
use super::{main, AppContext, Effect, Reducer, ToastType};
use crate::bootstrap::{self, LaunchOutcome};
use crate::domain::clock::Clock;
use crate::domain::day::Day;
use crate::flags::{FlagKey, Settings};
use crate::push::PushDestination;
use crate::repository::Dependencies;
use crate::usecase;

/// Where the app lands once splash and onboarding are done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MainRoute {
    Main,
    RecordEntry,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplashState {
    pub is_loading: bool,
    pub toast: ToastType,
    /// Set when the store requires a newer build than this one.
    pub required_version: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    Splash(SplashState),
    Onboarding,
    Main(Box<navigation::State>),
}

impl Route {
    pub fn id(&self) -> &'static str {
        match self {
            Route::Splash(_) => "splash",
            Route::Onboarding => "onboarding",
            Route::Main(_) => "main",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct State {
    pub route: Route,
}

impl Default for State {
    fn default() -> Self {
        Self {
            route: Route::Splash(SplashState::default()),
        }
    }
}

impl State {
    pub fn navigation(&self) -> Option<&navigation::State> {
        match &self.route {
            Route::Main(navigation) => Some(navigation),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    StartSplash,
    SplashFinished(LaunchOutcome),
    SplashFailed,
    CompleteShowSplashToast,
    CompleteSplash,
    CompleteOnboarding(MainRoute),
    PresentRecordEntryPointView,
    PresentMainView(Box<navigation::State>, MainRoute),
    OpenPush(PushDestination),
    Navigation(navigation::Action),
}

pub struct RootReducer {
    deps: Dependencies,
    navigation: MainNavigationReducer,
}

impl RootReducer {
    pub fn new(deps: Dependencies) -> Self {
        Self {
            navigation: MainNavigationReducer::new(deps.clone()),
            deps,
        }
    }

    fn load_main(&self, settings: Settings, route: MainRoute) -> Effect<Action> {
        let deps = self.deps.clone();
        Effect::run(move |send| async move {
            let state = main_navigation_state(&deps, &settings).await;
            send.send(Action::PresentMainView(Box::new(state), route));
            Ok(())
        })
    }
}

/// Builds the home coordinator for the current month. The server's month
/// list is preferred; without a connection the local cache stands in.
pub async fn main_navigation_state(deps: &Dependencies, settings: &Settings) -> navigation::State {
    let today = deps.clock.today();
    let (records, equipped) = match deps
        .records
        .get_monthly_record_list(today.year, today.month)
        .await
    {
        Ok(month) => (month.records.unwrap_or_default(), month.decoration_item),
        Err(err) => {
            warn!(error = %err, "month list unavailable; using the local cache");
            (
                deps.records
                    .load_records(today.year, today.month)
                    .unwrap_or_default(),
                deps.rewards.load_equipped_items(today.year, today.month),
            )
        }
    };
    let (has_today_record, has_yesterday_record) =
        usecase::written_days(deps.records.as_ref(), deps.clock.as_ref());
    let context = main::Context {
        records,
        has_today_record,
        has_yesterday_record,
        is_presenting_new_star_bottle: take_new_bottle_guide(settings, today),
        decoration_data: usecase::decoration_data(&equipped, deps.files.as_ref()),
    };
    navigation::State::new(main::State::new(context, deps.clock.as_ref(), settings))
}

/// The new bottle guide shows once per month, on the first launch after
/// the month turned.
fn take_new_bottle_guide(settings: &Settings, today: Day) -> bool {
    let last = settings.get_day(FlagKey::LastNewBottleGuideDay);
    if today > last && !today.is_same_month(last) {
        settings.set_day(FlagKey::LastNewBottleGuideDay, today);
        return true;
    }
    false
}

impl Reducer for RootReducer {
    type State = State;
    type Action = Action;

    fn reduce(&self, state: &mut State, action: Action, ctx: &AppContext) -> Effect<Action> {
        match action {
            Action::StartSplash => {
                let Route::Splash(splash) = &mut state.route else {
                    return Effect::none();
                };
                if splash.is_loading {
                    return Effect::none();
                }
                splash.is_loading = true;
                splash.toast = ToastType::None;
                let deps = self.deps.clone();
                let settings = ctx.settings.clone();
                return Effect::run(move |send| async move {
                    match bootstrap::sync_on_launch(&deps, &settings).await {
                        Ok((outcome, _)) => {
                            send.send(Action::SplashFinished(outcome));
                            Ok(())
                        }
                        Err(err) => {
                            send.send(Action::SplashFailed);
                            Err(err.into())
                        }
                    }
                });
            }
            Action::SplashFinished(outcome) => {
                if let Route::Splash(splash) = &mut state.route {
                    splash.is_loading = false;
                    match outcome {
                        LaunchOutcome::Ready { .. } => return Effect::send(Action::CompleteSplash),
                        LaunchOutcome::UpdateRequired { latest_version } => {
                            splash.required_version = Some(latest_version);
                        }
                    }
                }
            }
            Action::SplashFailed => {
                if let Route::Splash(splash) = &mut state.route {
                    splash.is_loading = false;
                    splash.toast = ToastType::SplashNetworkError;
                }
            }
            Action::CompleteShowSplashToast => {
                if let Route::Splash(splash) = &mut state.route {
                    splash.toast = ToastType::None;
                }
            }
            Action::CompleteSplash => {
                if ctx.settings.get_bool(FlagKey::ShouldShowOnboarding) {
                    state.route = Route::Onboarding;
                } else {
                    return Effect::send(Action::CompleteOnboarding(MainRoute::Main));
                }
            }
            Action::CompleteOnboarding(route) => {
                ctx.settings.set_bool(FlagKey::ShouldShowOnboarding, false);
                ctx.navigation.block_swipe(false);
                return match route {
                    MainRoute::RecordEntry => Effect::send(Action::PresentRecordEntryPointView),
                    MainRoute::Main => self.load_main(ctx.settings.clone(), MainRoute::Main),
                };
            }
            Action::PresentRecordEntryPointView => {
                return self.load_main(ctx.settings.clone(), MainRoute::RecordEntry);
            }
            Action::PresentMainView(mut navigation, route) => {
                if route == MainRoute::RecordEntry {
                    let context = usecase::record_entry_context(
                        self.deps.records.as_ref(),
                        self.deps.clock.as_ref(),
                    );
                    if context.is_complete_today && context.is_complete_yesterday {
                        navigation.main.is_presenting_already_write = true;
                    } else {
                        let entry = self
                            .navigation
                            .factory()
                            .make(Destination::RecordEntry(context), &ctx.settings);
                        navigation.push(entry);
                        navigation.main.star_bottle_opacity = 0.0;
                    }
                }
                state.route = Route::Main(navigation);
            }
            Action::OpenPush(destination) => {
                if let Route::Splash(_) = state.route {
                    debug!(destination = destination.as_str(), "push opened before launch finished");
                    return Effect::none();
                }
                let route = if destination.opens_record_entry() {
                    MainRoute::RecordEntry
                } else {
                    MainRoute::Main
                };
                return Effect::send(Action::CompleteOnboarding(route));
            }
            Action::Navigation(action) => {
                let Route::Main(navigation) = &mut state.route else {
                    debug!(route = state.route.id(), "navigation action outside main");
                    return Effect::none();
                };
                return self
                    .navigation
                    .reduce(navigation, action, ctx)
                    .map(Action::Navigation);
            }
        }
        Effect::none()
    }
}
