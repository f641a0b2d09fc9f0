use std::collections::{HashMap, VecDeque};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::effect::{Effect, Sender, Task};
use super::{AppContext, Reducer};

enum Message<A> {
    Action(A),
    Finished(u64),
}

struct RunningTask {
    cancel_id: Option<String>,
    handle: JoinHandle<()>,
}

/// Single-writer runtime for one reducer. Actions are reduced strictly in
/// the order they are sent; synchronous follow-ups queue behind them and
/// async effects report back through a channel drained by [`Store::settle`]
/// or [`Store::run_until`]. Must live inside a tokio runtime.
pub struct Store<R: Reducer> {
    reducer: R,
    state: R::State,
    ctx: AppContext,
    queue: VecDeque<R::Action>,
    tx: mpsc::UnboundedSender<Message<R::Action>>,
    rx: mpsc::UnboundedReceiver<Message<R::Action>>,
    tasks: HashMap<u64, RunningTask>,
    next_task: u64,
}

impl<R: Reducer> Store<R> {
    pub fn new(reducer: R, state: R::State, ctx: AppContext) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            reducer,
            state,
            ctx,
            queue: VecDeque::new(),
            tx,
            rx,
            tasks: HashMap::new(),
            next_task: 0,
        }
    }

    pub fn state(&self) -> &R::State {
        &self.state
    }

    pub fn context(&self) -> &AppContext {
        &self.ctx
    }

    pub fn reducer(&self) -> &R {
        &self.reducer
    }

    pub fn send(&mut self, action: R::Action) {
        self.queue.push_back(action);
        while let Some(action) = self.queue.pop_front() {
            let effect = self.reducer.reduce(&mut self.state, action, &self.ctx);
            self.apply(effect, None);
        }
    }

    /// Drives async effects until none is left running.
    pub async fn settle(&mut self) {
        loop {
            self.drain_ready();
            if self.tasks.is_empty() {
                return;
            }
            match self.rx.recv().await {
                Some(message) => self.handle(message),
                None => return,
            }
        }
    }

    /// Drives async effects until `done` holds for the state. Returns false
    /// when every effect finished first.
    pub async fn run_until(&mut self, mut done: impl FnMut(&R::State) -> bool) -> bool {
        loop {
            self.drain_ready();
            if done(&self.state) {
                return true;
            }
            if self.tasks.is_empty() {
                return false;
            }
            match self.rx.recv().await {
                Some(message) => self.handle(message),
                None => return false,
            }
        }
    }

    pub fn is_running(&self, cancel_id: &str) -> bool {
        self.tasks.values().any(|task| {
            task.cancel_id.as_deref() == Some(cancel_id) && !task.handle.is_finished()
        })
    }

    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    pub fn cancel_all(&mut self) {
        for (_, task) in self.tasks.drain() {
            task.handle.abort();
        }
    }

    fn drain_ready(&mut self) {
        while let Ok(message) = self.rx.try_recv() {
            self.handle(message);
        }
    }

    fn handle(&mut self, message: Message<R::Action>) {
        match message {
            Message::Action(action) => self.send(action),
            Message::Finished(task_id) => {
                self.tasks.remove(&task_id);
            }
        }
    }

    fn apply(&mut self, effect: Effect<R::Action>, cancel_id: Option<&str>) {
        match effect {
            Effect::None => {}
            Effect::Send(action) => self.queue.push_back(action),
            Effect::Run(task) => self.spawn(task, cancel_id.map(str::to_string)),
            Effect::Cancel(id) => self.cancel_matching(|task_id| task_id == id),
            Effect::CancelScope(scope) => {
                let prefix = format!("{scope}/");
                self.cancel_matching(|task_id| task_id.starts_with(&prefix));
            }
            Effect::Cancellable {
                id,
                cancel_in_flight,
                effect,
            } => {
                if cancel_in_flight {
                    self.cancel_matching(|task_id| task_id == id);
                }
                self.apply(*effect, Some(&id));
            }
            Effect::Merge(effects) => {
                for effect in effects {
                    self.apply(effect, cancel_id);
                }
            }
        }
    }

    fn spawn(&mut self, task: Task<R::Action>, cancel_id: Option<String>) {
        let task_id = self.next_task;
        self.next_task += 1;

        let tx = self.tx.clone();
        let sender = Sender::new(move |action| {
            let _ = tx.send(Message::Action(action));
        });
        let done = self.tx.clone();
        let future = task(sender);
        let label = cancel_id.clone().unwrap_or_default();
        let handle = tokio::spawn(async move {
            if let Err(err) = future.await {
                warn!(task = %label, error = %err, "effect failed");
            }
            let _ = done.send(Message::Finished(task_id));
        });
        self.tasks.insert(task_id, RunningTask { cancel_id, handle });
    }

    fn cancel_matching(&mut self, matches: impl Fn(&str) -> bool) {
        let cancelled: Vec<u64> = self
            .tasks
            .iter()
            .filter(|(_, task)| task.cancel_id.as_deref().is_some_and(&matches))
            .map(|(task_id, _)| *task_id)
            .collect();
        for task_id in cancelled {
            if let Some(task) = self.tasks.remove(&task_id) {
                debug!(task = ?task.cancel_id, "cancelling effect");
                task.handle.abort();
            }
        }
    }
}

impl<R: Reducer> Drop for Store<R> {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
