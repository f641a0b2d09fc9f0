use tracing::warn;

use super::{decoration, AppContext, Effect, Reducer, ToastType};
use crate::domain::reward::RewardCategory;
use crate::repository::Dependencies;

pub const NICKNAME_MIN_CHARS: usize = 2;
pub const NICKNAME_MAX_CHARS: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingMenu {
    Decoration,
    Notification,
    Notice,
    RecordGuide,
    Feedback,
    PrivacyPolicy,
}

impl SettingMenu {
    pub const ALL: [SettingMenu; 6] = [
        SettingMenu::Decoration,
        SettingMenu::Notification,
        SettingMenu::Notice,
        SettingMenu::RecordGuide,
        SettingMenu::Feedback,
        SettingMenu::PrivacyPolicy,
    ];

    pub fn title(self) -> &'static str {
        match self {
            SettingMenu::Decoration => "별통이 꾸미기",
            SettingMenu::Notification => "앱 푸시 알림",
            SettingMenu::Notice => "공지사항",
            SettingMenu::RecordGuide => "모으기 규칙",
            SettingMenu::Feedback => "피드백 남기기",
            SettingMenu::PrivacyPolicy => "개인정보 처리방침",
        }
    }
}

/// Hangul jamo and syllables, ASCII letters and digits, and whitespace.
fn is_nickname_char(c: char) -> bool {
    matches!(c, '\u{3131}'..='\u{3163}' | '\u{AC00}'..='\u{D7A3}')
        || c.is_ascii_alphanumeric()
        || c.is_whitespace()
}

pub fn is_valid_nickname(name: &str) -> bool {
    let count = name.chars().count();
    (NICKNAME_MIN_CHARS..=NICKNAME_MAX_CHARS).contains(&count) && name.chars().all(is_nickname_char)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    pub user_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct State {
    pub user_name: String,
    pub edit_user_name: String,
    pub is_presenting_edit_name: bool,
    pub is_saving_name: bool,
    pub is_notice_not_read: bool,
    pub is_decoration_not_read: bool,
    pub presented_menu: Option<SettingMenu>,
    pub toast: ToastType,
}

impl State {
    pub fn new(context: Context) -> Self {
        Self {
            user_name: context.user_name,
            edit_user_name: String::new(),
            is_presenting_edit_name: false,
            is_saving_name: false,
            is_notice_not_read: false,
            is_decoration_not_read: false,
            presented_menu: None,
            toast: ToastType::None,
        }
    }

    pub fn is_save_enabled(&self) -> bool {
        !self.is_saving_name && is_valid_nickname(&self.edit_user_name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    OnAppear,
    UpdateBadges {
        notice_not_read: Option<bool>,
        decoration_not_read: Option<bool>,
    },

    TouchEditName,
    EditNameChanged(String),
    CancelEditName,
    SaveUserName,
    UserNameUpdated(String),
    SaveUserNameFailed,
    CompleteShowToast,

    TouchMenu(SettingMenu),
    DismissMenu,

    Delegate(Delegate),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Delegate {
    PushDecoration(decoration::Context),
}

pub struct SettingReducer {
    deps: Dependencies,
}

impl SettingReducer {
    pub fn new(deps: Dependencies) -> Self {
        Self { deps }
    }
}

impl Reducer for SettingReducer {
    type State = State;
    type Action = Action;

    fn reduce(&self, state: &mut State, action: Action, ctx: &AppContext) -> Effect<Action> {
        match action {
            Action::OnAppear => {
                let users = self.deps.users.clone();
                return Effect::run(move |send| async move {
                    let notice_not_read = match users.get_notice_status().await {
                        Ok(read) => Some(!read),
                        Err(err) => {
                            warn!(error = %err, "notice status unavailable");
                            None
                        }
                    };
                    let decoration_not_read = match users.get_reward_status().await {
                        Ok(unread) => Some(unread),
                        Err(err) => {
                            warn!(error = %err, "reward status unavailable");
                            None
                        }
                    };
                    send.send(Action::UpdateBadges {
                        notice_not_read,
                        decoration_not_read,
                    });
                    Ok(())
                });
            }
            Action::UpdateBadges {
                notice_not_read,
                decoration_not_read,
            } => {
                if let Some(value) = notice_not_read {
                    state.is_notice_not_read = value;
                }
                if let Some(value) = decoration_not_read {
                    state.is_decoration_not_read = value;
                }
            }
            Action::TouchEditName => {
                state.edit_user_name = state.user_name.clone();
                state.is_presenting_edit_name = true;
                ctx.navigation.block_swipe(true);
            }
            Action::EditNameChanged(text) => {
                if text.chars().count() > NICKNAME_MAX_CHARS {
                    state.edit_user_name = text.chars().take(NICKNAME_MAX_CHARS).collect();
                    state.toast = ToastType::MaxNicknameLengthExceeded;
                } else {
                    state.edit_user_name = text;
                }
                if !state.edit_user_name.chars().all(is_nickname_char) {
                    state.toast = ToastType::SpecialCharactersNotAllowed;
                }
            }
            Action::CancelEditName => {
                state.is_presenting_edit_name = false;
                ctx.navigation.block_swipe(false);
            }
            Action::SaveUserName => {
                if !state.is_save_enabled() {
                    return Effect::none();
                }
                state.is_saving_name = true;
                let users = self.deps.users.clone();
                let name = state.edit_user_name.clone();
                return Effect::run(move |send| async move {
                    match users.update_user_name(&name).await {
                        Ok(user) => {
                            send.send(Action::UserNameUpdated(user.user_name));
                            Ok(())
                        }
                        Err(err) => {
                            send.send(Action::SaveUserNameFailed);
                            Err(err.into())
                        }
                    }
                });
            }
            Action::UserNameUpdated(name) => {
                state.user_name = name;
                state.is_saving_name = false;
                state.is_presenting_edit_name = false;
                ctx.navigation.block_swipe(false);
            }
            Action::SaveUserNameFailed => state.is_saving_name = false,
            Action::CompleteShowToast => state.toast = ToastType::None,
            Action::TouchMenu(SettingMenu::Decoration) => {
                state.is_decoration_not_read = false;
                let deps = self.deps.clone();
                return Effect::run(move |send| async move {
                    if let Err(err) = deps.users.put_reward_status().await {
                        warn!(error = %err, "could not mark rewards as checked");
                    }
                    let context = decoration::load_context(&deps, RewardCategory::Background).await?;
                    send.send(Action::Delegate(Delegate::PushDecoration(context)));
                    Ok(())
                });
            }
            Action::TouchMenu(SettingMenu::Notice) => {
                state.is_notice_not_read = false;
                state.presented_menu = Some(SettingMenu::Notice);
                let users = self.deps.users.clone();
                return Effect::run(move |_| async move {
                    users.put_notice_status().await?;
                    Ok(())
                });
            }
            Action::TouchMenu(menu) => state.presented_menu = Some(menu),
            Action::DismissMenu => state.presented_menu = None,
            Action::Delegate(_) => {}
        }
        Effect::none()
    }
}
