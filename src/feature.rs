//! Screen state machines. Every feature is a `State` plus an `Action` enum
//! and a reducer that mutates the state and returns an [`Effect`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::flags::Settings;

pub mod bottle_calendar;
pub mod decoration;
pub mod effect;
pub mod main;
pub mod navigation;
pub mod monthly_star_bottle;
pub mod record_entry;
pub mod record_list;
pub mod record_writing;
pub mod reward_receive;
pub mod reward_start;
pub mod root;
pub mod setting;
pub mod statistics;
pub mod store;
pub mod toast;

pub use effect::{Effect, Sender};
pub use store::Store;
pub use toast::ToastType;

pub trait Reducer: Send + Sync + 'static {
    type State: Send + 'static;
    type Action: Send + 'static;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        ctx: &AppContext,
    ) -> Effect<Self::Action>;
}

/// Whether the host should ignore the back-swipe gesture. Set while a
/// screen holds unsaved input.
#[derive(Debug, Clone, Default)]
pub struct NavigationFlags {
    swipe_blocked: Arc<AtomicBool>,
}

impl NavigationFlags {
    pub fn block_swipe(&self, blocked: bool) {
        self.swipe_blocked.store(blocked, Ordering::SeqCst);
    }

    pub fn is_swipe_blocked(&self) -> bool {
        self.swipe_blocked.load(Ordering::SeqCst)
    }
}

/// Process-wide state shared by every reducer: persisted flags and the
/// navigation gesture lock.
#[derive(Clone)]
pub struct AppContext {
    pub settings: Settings,
    pub navigation: NavigationFlags,
}

impl AppContext {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            navigation: NavigationFlags::default(),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use time::macros::datetime;
    use time::OffsetDateTime;

    use super::{AppContext, Effect, Sender};
    use crate::domain::clock::FixedClock;
    use crate::flags::Settings;
    use crate::repository::fake::FakeBackend;
    use crate::repository::Dependencies;
    use crate::store::test_support::TempStore;

    /// Fake repositories, a temp flag store and a clock pinned to
    /// 2025-05-10 21:00 KST.
    pub struct Harness {
        pub temp: TempStore,
        pub backend: Arc<FakeBackend>,
        pub clock: Arc<FixedClock>,
        pub deps: Dependencies,
        pub ctx: AppContext,
    }

    impl Harness {
        pub fn new() -> Self {
            Self::at(datetime!(2025-05-10 21:00:00 +09:00))
        }

        pub fn at(now: OffsetDateTime) -> Self {
            let temp = TempStore::new();
            let backend = FakeBackend::new();
            let clock = Arc::new(FixedClock::new(now));
            let deps = backend.dependencies(clock.clone());
            let ctx = AppContext::new(Settings::new(temp.store.clone()));
            Self {
                temp,
                backend,
                clock,
                deps,
                ctx,
            }
        }
    }

    /// Runs an effect to completion outside a store and returns every
    /// action it emitted, in emission order. Cancellation ids are ignored.
    pub async fn collect<A: Send + 'static>(effect: Effect<A>) -> Vec<A> {
        let (tx, rx) = std::sync::mpsc::channel();
        let mut pending = vec![effect];
        let mut emitted = Vec::new();
        while let Some(effect) = pending.pop() {
            match effect {
                Effect::None | Effect::Cancel(_) | Effect::CancelScope(_) => {}
                Effect::Send(action) => emitted.push(action),
                Effect::Run(task) => {
                    let tx = tx.clone();
                    let sender = Sender::new(move |action| {
                        let _ = tx.send(action);
                    });
                    if let Err(err) = task(sender).await {
                        tracing::debug!(error = %err, "collected effect failed");
                    }
                    emitted.extend(rx.try_iter());
                }
                Effect::Cancellable { effect, .. } => pending.push(*effect),
                Effect::Merge(effects) => pending.extend(effects.into_iter().rev()),
            }
        }
        emitted
    }
}
