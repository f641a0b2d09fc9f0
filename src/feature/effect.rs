use std::error::Error;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub type TaskResult = Result<(), Box<dyn Error + Send + Sync>>;
pub type TaskFuture = Pin<Box<dyn Future<Output = TaskResult> + Send>>;
pub type Task<A> = Box<dyn FnOnce(Sender<A>) -> TaskFuture + Send>;

/// Handle an async effect uses to feed actions back into its store.
pub struct Sender<A> {
    inner: Arc<dyn Fn(A) + Send + Sync>,
}

impl<A> Clone for Sender<A> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<A: 'static> Sender<A> {
    pub fn new(send: impl Fn(A) + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(send),
        }
    }

    pub fn send(&self, action: A) {
        (self.inner)(action);
    }

    fn map_from<B: 'static>(self, f: Arc<dyn Fn(B) -> A + Send + Sync>) -> Sender<B> {
        Sender::new(move |action| self.send(f(action)))
    }
}

/// What a reducer asks the runtime to do after a state transition.
pub enum Effect<A> {
    None,
    Send(A),
    Run(Task<A>),
    Cancel(String),
    /// Cancels every effect whose id lives under `scope/`.
    CancelScope(String),
    Cancellable {
        id: String,
        cancel_in_flight: bool,
        effect: Box<Effect<A>>,
    },
    Merge(Vec<Effect<A>>),
}

impl<A> fmt::Debug for Effect<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Effect::None => write!(f, "None"),
            Effect::Send(_) => write!(f, "Send(..)"),
            Effect::Run(_) => write!(f, "Run(..)"),
            Effect::Cancel(id) => write!(f, "Cancel({id})"),
            Effect::CancelScope(scope) => write!(f, "CancelScope({scope})"),
            Effect::Cancellable {
                id,
                cancel_in_flight,
                effect,
            } => write!(f, "Cancellable({id}, {cancel_in_flight}, {effect:?})"),
            Effect::Merge(effects) => write!(f, "Merge({effects:?})"),
        }
    }
}

impl<A: Send + 'static> Effect<A> {
    pub fn none() -> Self {
        Effect::None
    }

    pub fn send(action: A) -> Self {
        Effect::Send(action)
    }

    pub fn run<F, Fut>(task: F) -> Self
    where
        F: FnOnce(Sender<A>) -> Fut + Send + 'static,
        Fut: Future<Output = TaskResult> + Send + 'static,
    {
        Effect::Run(Box::new(move |sender| Box::pin(task(sender))))
    }

    pub fn cancel(id: impl Into<String>) -> Self {
        Effect::Cancel(id.into())
    }

    pub fn merge(effects: impl IntoIterator<Item = Effect<A>>) -> Self {
        let effects: Vec<_> = effects
            .into_iter()
            .filter(|effect| !matches!(effect, Effect::None))
            .collect();
        match effects.len() {
            0 => Effect::None,
            _ => Effect::Merge(effects),
        }
    }

    pub fn cancellable(self, id: impl Into<String>, cancel_in_flight: bool) -> Self {
        Effect::Cancellable {
            id: id.into(),
            cancel_in_flight,
            effect: Box::new(self),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Effect::None)
    }

    pub fn map<B: Send + 'static>(self, f: impl Fn(A) -> B + Send + Sync + 'static) -> Effect<B> {
        self.map_arc(Arc::new(f))
    }

    fn map_arc<B: Send + 'static>(self, f: Arc<dyn Fn(A) -> B + Send + Sync>) -> Effect<B> {
        match self {
            Effect::None => Effect::None,
            Effect::Send(action) => Effect::Send(f(action)),
            Effect::Run(task) => Effect::Run(Box::new(move |sender: Sender<B>| {
                task(sender.map_from(f))
            })),
            Effect::Cancel(id) => Effect::Cancel(id),
            Effect::CancelScope(scope) => Effect::CancelScope(scope),
            Effect::Cancellable {
                id,
                cancel_in_flight,
                effect,
            } => Effect::Cancellable {
                id,
                cancel_in_flight,
                effect: Box::new(effect.map_arc(f)),
            },
            Effect::Merge(effects) => {
                Effect::Merge(effects.into_iter().map(|e| e.map_arc(f.clone())).collect())
            }
        }
    }

    /// Moves every id under `scope/` and gives anonymous tasks a scoped id,
    /// so `Effect::CancelScope(scope)` stops all of them.
    pub fn scoped(self, scope: &str) -> Self {
        self.scoped_inner(scope, false)
    }

    fn scoped_inner(self, scope: &str, covered: bool) -> Self {
        match self {
            Effect::None => Effect::None,
            Effect::Send(action) => Effect::Send(action),
            Effect::Run(task) if covered => Effect::Run(task),
            Effect::Run(task) => Effect::Cancellable {
                id: format!("{scope}/*"),
                cancel_in_flight: false,
                effect: Box::new(Effect::Run(task)),
            },
            Effect::Cancel(id) => Effect::Cancel(format!("{scope}/{id}")),
            Effect::CancelScope(inner) => Effect::CancelScope(format!("{scope}/{inner}")),
            Effect::Cancellable {
                id,
                cancel_in_flight,
                effect,
            } => Effect::Cancellable {
                id: format!("{scope}/{id}"),
                cancel_in_flight,
                effect: Box::new(effect.scoped_inner(scope, true)),
            },
            Effect::Merge(effects) => Effect::Merge(
                effects
                    .into_iter()
                    .map(|effect| effect.scoped_inner(scope, covered))
                    .collect(),
            ),
        }
    }
}

impl<A> Default for Effect<A> {
    fn default() -> Self {
        Effect::None
    }
}

#[cfg(test)]
mod tests {
    use super::Effect;

    #[test]
    fn merge_drops_empty_effects() {
        let merged: Effect<u8> = Effect::merge([Effect::none(), Effect::none()]);
        assert!(merged.is_none());
        let merged = Effect::merge([Effect::none(), Effect::send(1u8)]);
        assert!(matches!(merged, Effect::Merge(ref effects) if effects.len() == 1));
    }

    #[test]
    fn map_rewrites_synchronous_actions() {
        let mapped = Effect::send(2u8).map(|n| u16::from(n) * 10);
        assert!(matches!(mapped, Effect::Send(20)));
    }

    #[test]
    fn scoping_prefixes_ids_and_covers_anonymous_tasks() {
        let effect: Effect<u8> = Effect::merge([
            Effect::run(|_| async { Ok(()) }),
            Effect::run(|_| async { Ok(()) }).cancellable("timer", true),
            Effect::cancel("timer"),
        ])
        .scoped("path-3");

        let Effect::Merge(effects) = effect else {
            panic!("expected merge");
        };
        assert!(matches!(&effects[0], Effect::Cancellable { id, .. } if id == "path-3/*"));
        match &effects[1] {
            Effect::Cancellable { id, effect, .. } => {
                assert_eq!(id, "path-3/timer");
                assert!(matches!(**effect, Effect::Run(_)));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(&effects[2], Effect::Cancel(id) if id == "path-3/timer"));
    }
}
