//! Trying on owned rewards and saving them as this month's bottle.

use tracing::{debug, warn};

use super::{AppContext, Effect, Reducer, ToastType};
use crate::domain::record::Record;
use crate::domain::reward::{
    equipped_from_list, BottleShape, DecorationData, EquippedRewards, ResourceKind, Reward,
    RewardCategory, RewardsByCategory, StarBottleAction, HIDDEN_DECORATION_ID,
};
use crate::flags::{FlagKey, Settings};
use crate::network::NetworkError;
use crate::repository::reward::EquippedIds;
use crate::repository::Dependencies;
use crate::usecase;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    pub records: Vec<Record>,
    pub owned: RewardsByCategory,
    pub equipped: EquippedRewards,
    pub category: RewardCategory,
    pub decoration_data: DecorationData,
}

/// Gathers what the decoration screen opens with: the owned rewards (also
/// cached locally), the rewards the server has equipped for this month and
/// the month's local records.
pub async fn load_context(
    deps: &Dependencies,
    category: RewardCategory,
) -> Result<Context, NetworkError> {
    let today = deps.clock.today();
    let owned = deps.rewards.get_user_reward_items().await?;
    let monthly = deps
        .rewards
        .get_monthly_reward_item(today.year, today.month)
        .await?;
    let records = deps
        .records
        .load_records(today.year, today.month)
        .unwrap_or_default();
    let all: Vec<Reward> = owned.values().flatten().cloned().collect();
    deps.rewards.save_rewards(&all);

    let equipped = equipped_from_list(&monthly);
    let decoration_data = usecase::decoration_data(&equipped, deps.files.as_ref());
    Ok(Context {
        records,
        owned,
        equipped,
        category,
        decoration_data,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct State {
    pub records: Vec<Record>,
    pub owned: RewardsByCategory,
    pub selected: EquippedRewards,
    pub previous: EquippedRewards,
    pub category: RewardCategory,
    pub decoration_data: DecorationData,

    pub is_presenting_guide_bottom_sheet: bool,
    pub is_presenting_final_bottom_sheet: bool,
    pub is_presenting_save_alert: bool,
    pub is_save_disabled: bool,
    pub is_saving: bool,
    pub star_bottle_action: StarBottleAction,
    pub toast: ToastType,
}

impl State {
    pub fn new(context: Context, settings: &Settings) -> Self {
        let has_unread_hidden = context
            .owned
            .get(&RewardCategory::Decoration)
            .is_some_and(|items| items.iter().any(Reward::is_unread_hidden));
        Self {
            records: context.records,
            owned: context.owned,
            selected: context.equipped.clone(),
            previous: context.equipped,
            category: context.category,
            decoration_data: context.decoration_data,
            is_presenting_guide_bottom_sheet: settings
                .get_bool(FlagKey::ShouldShowDecorationGuideBottomSheet),
            is_presenting_final_bottom_sheet: has_unread_hidden,
            is_presenting_save_alert: false,
            is_save_disabled: true,
            is_saving: false,
            star_bottle_action: StarBottleAction::None,
            toast: ToastType::None,
        }
    }

    pub fn items(&self) -> &[Reward] {
        self.owned
            .get(&self.category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn bottle_shape(&self) -> BottleShape {
        self.selected
            .get(&RewardCategory::Bottle)
            .map(|reward| BottleShape::from_reward_id(reward.id))
            .unwrap_or_default()
    }

    fn selection_changed(&self) -> bool {
        self.previous.iter().any(|(category, before)| {
            self.selected.get(category).map(|reward| reward.id) != Some(before.id)
        })
    }

    fn equipped_ids(&self) -> EquippedIds {
        let id = |category: RewardCategory| self.selected.get(&category).map_or(0, |reward| reward.id);
        EquippedIds {
            background_id: id(RewardCategory::Background),
            effect_id: id(RewardCategory::Effect),
            decoration_id: id(RewardCategory::Decoration),
            bottle_id: id(RewardCategory::Bottle),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    TouchGuideBottomSheetButton,
    TouchFinalBottomSheetButton,

    TouchRewardItemCategoryButton(RewardCategory),
    TouchRewardItem(RewardCategory, Reward),
    ChangeItem(RewardCategory, Reward),
    ConsumeStarBottleAction,

    TouchBackButton,
    TouchSaveButton,
    CancelSave,
    SaveDecorationItem,
    SaveFailed,
    ShowSaveSuccessToast,

    Delegate(Delegate),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delegate {
    /// `true` once the selection was saved.
    Pop(bool),
}

pub struct DecorationReducer {
    deps: Dependencies,
}

impl DecorationReducer {
    pub fn new(deps: Dependencies) -> Self {
        Self { deps }
    }

    fn put_hidden_read(&self) -> Effect<Action> {
        let deps = self.deps.clone();
        Effect::run(move |_| async move {
            let today = deps.clock.today();
            deps.rewards.put_hidden_read(today.year, today.month).await?;
            Ok(())
        })
    }

    fn change_item(&self, state: &mut State, category: RewardCategory, item: &Reward) {
        let files = self.deps.files.as_ref();
        let action = match category {
            RewardCategory::Background => {
                let data = item
                    .resource_url(ResourceKind::Image)
                    .and_then(|url| files.load(url));
                state.decoration_data.background_reward_data = data.clone();
                match data {
                    Some(bytes) => StarBottleAction::ChangeBackgroundItem(bytes),
                    None => {
                        warn!(reward = item.id, "background resource is not cached");
                        return;
                    }
                }
            }
            RewardCategory::Effect => {
                let data = item
                    .resource_url(ResourceKind::Json)
                    .and_then(|url| files.load(url));
                state.decoration_data.effect_reward_data = data.clone();
                StarBottleAction::ChangeEffectItem(data)
            }
            RewardCategory::Decoration => {
                let name = usecase::decoration_name(item);
                let id = name.as_ref().map(|_| item.id);
                state.decoration_data.decoration_reward_id = Some(item.id);
                state.decoration_data.decoration_reward_name = name.clone();
                StarBottleAction::ChangeDecorationItem(id, name)
            }
            RewardCategory::Bottle => {
                let shape = BottleShape::from_reward_id(item.id);
                state.decoration_data.bottle_reward_id = Some(item.id);
                state.decoration_data.bottle_shape = shape;
                StarBottleAction::ChangeBottleItem(item.id, shape)
            }
            RewardCategory::Sound => return,
        };
        state.star_bottle_action = action;
    }
}

impl Reducer for DecorationReducer {
    type State = State;
    type Action = Action;

    fn reduce(&self, state: &mut State, action: Action, ctx: &AppContext) -> Effect<Action> {
        match action {
            Action::TouchGuideBottomSheetButton => {
                if state.is_presenting_guide_bottom_sheet {
                    state.is_presenting_guide_bottom_sheet = false;
                    ctx.settings
                        .set_bool(FlagKey::ShouldShowDecorationGuideBottomSheet, false);
                    ctx.navigation.block_swipe(false);
                }
            }
            Action::TouchFinalBottomSheetButton => {
                state.is_presenting_final_bottom_sheet = false;
                ctx.navigation.block_swipe(false);
                return self.put_hidden_read();
            }
            Action::TouchRewardItemCategoryButton(category) => state.category = category,
            Action::TouchRewardItem(category, item) => {
                let Some(current) = state.selected.get(&category) else {
                    return Effect::none();
                };
                if current.id == item.id {
                    return Effect::none();
                }
                state.selected.insert(category, item.clone());
                state.is_save_disabled = !state.selection_changed();
                let mut effects = Vec::new();
                if item.id == HIDDEN_DECORATION_ID && !item.hidden_read {
                    self.deps.rewards.mark_hidden_read(item.id);
                    effects.push(self.put_hidden_read());
                }
                effects.push(Effect::send(Action::ChangeItem(category, item)));
                return Effect::merge(effects);
            }
            Action::ChangeItem(category, item) => self.change_item(state, category, &item),
            Action::ConsumeStarBottleAction => state.star_bottle_action = StarBottleAction::None,
            Action::TouchBackButton => return Effect::send(Action::Delegate(Delegate::Pop(false))),
            Action::TouchSaveButton => {
                if state.is_save_disabled || state.is_saving {
                    return Effect::none();
                }
                if ctx.settings.get_bool(FlagKey::ShouldShowDecorationSaveAlert) {
                    state.is_presenting_save_alert = true;
                } else {
                    return Effect::send(Action::SaveDecorationItem);
                }
            }
            Action::CancelSave => state.is_presenting_save_alert = false,
            Action::SaveDecorationItem => {
                state.is_presenting_save_alert = false;
                state.is_saving = true;
                ctx.settings
                    .set_bool(FlagKey::ShouldShowDecorationSaveAlert, false);

                let today = self.deps.clock.today();
                let items: Vec<Reward> = state.selected.values().cloned().collect();
                self.deps
                    .rewards
                    .save_equipped_items(today.year, today.month, &items);
                debug!(year = today.year, month = today.month, count = items.len(), "saved equipped rewards");

                let rewards = self.deps.rewards.clone();
                let ids = state.equipped_ids();
                return Effect::run(move |send| async move {
                    match rewards.put_save_reward(today.year, today.month, ids).await {
                        Ok(()) => {
                            send.send(Action::ShowSaveSuccessToast);
                            Ok(())
                        }
                        Err(err) => {
                            send.send(Action::SaveFailed);
                            Err(err.into())
                        }
                    }
                });
            }
            Action::SaveFailed => state.is_saving = false,
            Action::ShowSaveSuccessToast => {
                state.is_saving = false;
                state.previous = state.selected.clone();
                state.is_save_disabled = true;
                state.toast = ToastType::SuccessSaveDecoration;
                return Effect::send(Action::Delegate(Delegate::Pop(true)));
            }
            Action::Delegate(_) => {}
        }
        Effect::none()
    }
}
