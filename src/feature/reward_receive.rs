use tracing::info;

use super::{decoration, AppContext, Effect, Reducer};
use crate::domain::reward::{Reward, RewardCategory};
use crate::repository::Dependencies;
use crate::usecase;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Context {
    pub not_opened_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct State {
    pub not_opened_count: i64,
    pub rewards: Vec<Reward>,
    pub is_loading: bool,
    pub is_opened: bool,
}

impl State {
    pub fn new(context: Context) -> Self {
        Self {
            not_opened_count: context.not_opened_count,
            rewards: Vec::new(),
            is_loading: false,
            is_opened: false,
        }
    }

    pub fn title(&self) -> String {
        if self.is_opened {
            format!("선물 {}개를 받았어요", self.rewards.len())
        } else {
            format!("받지 않은 선물이 {}개 있어요", self.not_opened_count)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    TouchOpenButton,
    Opened(Vec<Reward>),
    OpenFailed,
    TouchDecorationButton,
    TouchBackButton,
    Delegate(Delegate),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Delegate {
    PushDecoration(decoration::Context),
    Pop,
}

pub struct RewardReceiveReducer {
    deps: Dependencies,
}

impl RewardReceiveReducer {
    pub fn new(deps: Dependencies) -> Self {
        Self { deps }
    }
}

impl Reducer for RewardReceiveReducer {
    type State = State;
    type Action = Action;

    fn reduce(&self, state: &mut State, action: Action, ctx: &AppContext) -> Effect<Action> {
        match action {
            Action::TouchOpenButton => {
                if state.is_opened || state.is_loading || state.not_opened_count <= 0 {
                    return Effect::none();
                }
                state.is_loading = true;
                let deps = self.deps.clone();
                return Effect::run(move |send| async move {
                    let opened = match deps.rewards.put_open_reward().await {
                        Ok(opened) => opened,
                        Err(err) => {
                            send.send(Action::OpenFailed);
                            return Err(err.into());
                        }
                    };
                    deps.rewards.save_rewards(&opened);
                    let stored = usecase::download_reward_resources(deps.files.as_ref(), &opened).await;
                    info!(count = opened.len(), stored, "opened rewards");
                    send.send(Action::Opened(opened));
                    Ok(())
                });
            }
            Action::Opened(rewards) => {
                state.is_loading = false;
                state.is_opened = true;
                state.not_opened_count = 0;
                state.rewards = rewards;
                ctx.navigation.block_swipe(false);
            }
            Action::OpenFailed => {
                state.is_loading = false;
                ctx.navigation.block_swipe(false);
            }
            Action::TouchDecorationButton => {
                let deps = self.deps.clone();
                return Effect::run(move |send| async move {
                    let context = decoration::load_context(&deps, RewardCategory::Background).await?;
                    send.send(Action::Delegate(Delegate::PushDecoration(context)));
                    Ok(())
                });
            }
            Action::TouchBackButton => return Effect::send(Action::Delegate(Delegate::Pop)),
            Action::Delegate(_) => {}
        }
        Effect::none()
    }
}

#[cfg(test)]
mod tests {
    use super::{Action, Context, RewardReceiveReducer, State};
    use crate::domain::reward::{Reward, RewardCategory};
    use crate::feature::test_support::Harness;
    use crate::feature::Store;
    use crate::repository::{FileRepository, RewardRepository};

    fn gift() -> Reward {
        Reward {
            id: 11,
            category: RewardCategory::Effect,
            name: "snow".to_string(),
            image_url: None,
            json_url: Some("https://cdn.test/snow.json".to_string()),
            sound_url: None,
            hidden: false,
            hidden_read: false,
        }
    }

    #[tokio::test]
    async fn opening_caches_rewards_and_resources() {
        let h = Harness::new();
        h.backend.with(|data| {
            data.openable = vec![gift()];
            data.not_opened_count = 1;
            data.remote_files
                .insert("https://cdn.test/snow.json".to_string(), b"{}".to_vec());
        });
        h.ctx.navigation.block_swipe(true);
        let mut store = Store::new(
            RewardReceiveReducer::new(h.deps.clone()),
            State::new(Context { not_opened_count: 1 }),
            h.ctx.clone(),
        );
        assert_eq!(store.state().title(), "받지 않은 선물이 1개 있어요");
        store.send(Action::TouchOpenButton);
        store.send(Action::TouchOpenButton);
        store.settle().await;

        let state = store.state();
        assert!(state.is_opened);
        assert_eq!(state.rewards, vec![gift()]);
        assert_eq!(state.title(), "선물 1개를 받았어요");
        assert!(!h.ctx.navigation.is_swipe_blocked());
        assert_eq!(h.backend.load_rewards()[&RewardCategory::Effect].len(), 1);
        assert!(h.backend.contains("https://cdn.test/snow.json"));
        let opens = h
            .backend
            .calls()
            .iter()
            .filter(|call| *call == "put_open_reward")
            .count();
        assert_eq!(opens, 1);
    }

    #[tokio::test]
    async fn failed_open_can_be_retried() {
        let h = Harness::new();
        h.backend.set_offline(true);
        let mut store = Store::new(
            RewardReceiveReducer::new(h.deps.clone()),
            State::new(Context { not_opened_count: 2 }),
            h.ctx.clone(),
        );
        store.send(Action::TouchOpenButton);
        store.settle().await;
        assert!(!store.state().is_loading);
        assert!(!store.state().is_opened);
        assert_eq!(store.state().not_opened_count, 2);
    }
}
