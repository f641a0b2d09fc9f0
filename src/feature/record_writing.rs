use super::{AppContext, Effect, Reducer, ToastType};
use crate::domain::record::{
    truncate_memo, RecordCategory, RecordContent, RecordContentType, MEMO_MAX_CHARS,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    pub flag: RecordContentType,
    pub content: Option<RecordContent>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct State {
    pub flag: RecordContentType,
    pub selected_category: Option<RecordCategory>,
    pub saved_category: Option<RecordCategory>,
    pub text: String,
    pub record_content: Option<RecordContent>,

    pub is_presenting_select_category: bool,
    pub is_presenting_cancel: bool,
    pub is_presenting_text_guide: bool,
    pub is_save_enabled: bool,
    pub toast: ToastType,
}

impl State {
    pub fn new(context: Context) -> Self {
        let saved_category = context.content.as_ref().map(|content| content.category);
        let text = context
            .content
            .as_ref()
            .map(|content| content.memo.clone())
            .unwrap_or_default();
        Self {
            flag: context.flag,
            selected_category: saved_category,
            saved_category,
            is_presenting_select_category: text.is_empty(),
            text,
            record_content: None,
            is_presenting_cancel: false,
            is_presenting_text_guide: false,
            is_save_enabled: saved_category.is_some(),
            toast: ToastType::None,
        }
    }

    pub fn title(&self) -> String {
        format!("{} 소비", self.flag.title())
    }

    pub fn categories(&self) -> &'static [RecordCategory] {
        RecordCategory::cases(self.flag)
    }

    pub fn text_count(&self) -> usize {
        self.text.chars().count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    OpenCategory,
    SelectCategory(RecordCategory),
    SaveCategory,
    CloseCategory,
    TextChanged(String),
    CompleteShowToast,

    ShowCancelRecordBottomSheet,
    DismissCancelRecordBottomSheet,
    CancelWriting,
    CompleteWrite,

    Delegate(Delegate),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delegate {
    CompleteWrite(RecordContent),
    Cancel,
}

#[derive(Debug, Default)]
pub struct RecordWritingReducer;

impl Reducer for RecordWritingReducer {
    type State = State;
    type Action = Action;

    fn reduce(&self, state: &mut State, action: Action, ctx: &AppContext) -> Effect<Action> {
        match action {
            Action::OpenCategory => {
                state.selected_category = state.saved_category;
                state.is_presenting_select_category = true;
            }
            Action::SelectCategory(category) => {
                if category.flag() == Some(state.flag) {
                    state.selected_category = Some(category);
                }
            }
            Action::SaveCategory => {
                if state.selected_category.is_some() {
                    state.saved_category = state.selected_category;
                    state.is_presenting_select_category = false;
                    state.is_save_enabled = true;
                }
            }
            Action::CloseCategory => {
                state.selected_category = state.saved_category;
                state.is_presenting_select_category = false;
            }
            Action::TextChanged(text) => {
                if text.chars().count() > MEMO_MAX_CHARS {
                    state.text = truncate_memo(&text);
                    state.is_presenting_text_guide = true;
                    state.toast = ToastType::MaxLengthExceeded;
                } else {
                    state.text = text;
                    state.is_presenting_text_guide = false;
                }
                ctx.navigation.block_swipe(!state.text.is_empty());
            }
            Action::CompleteShowToast => {
                state.toast = ToastType::None;
                state.is_presenting_text_guide = false;
            }
            Action::ShowCancelRecordBottomSheet => {
                if state.text.is_empty() {
                    return Effect::send(Action::Delegate(Delegate::Cancel));
                }
                state.is_presenting_cancel = true;
            }
            Action::DismissCancelRecordBottomSheet => {
                state.is_presenting_cancel = false;
            }
            Action::CancelWriting => {
                state.is_presenting_cancel = false;
                ctx.navigation.block_swipe(false);
                return Effect::send(Action::Delegate(Delegate::Cancel));
            }
            Action::CompleteWrite => {
                let Some(category) = state.saved_category else {
                    return Effect::none();
                };
                let content = RecordContent::new(state.flag, category, &state.text);
                state.record_content = Some(content.clone());
                return Effect::send(Action::Delegate(Delegate::CompleteWrite(content)));
            }
            Action::Delegate(_) => {}
        }
        Effect::none()
    }
}

#[cfg(test)]
mod tests {
    use super::{Action, Context, Delegate, RecordWritingReducer, State};
    use crate::domain::record::{RecordCategory, RecordContent, RecordContentType};
    use crate::feature::test_support::Harness;
    use crate::feature::{Effect, Reducer, ToastType};

    fn new_state(flag: RecordContentType) -> State {
        State::new(Context {
            flag,
            content: None,
        })
    }

    #[test]
    fn fresh_screen_opens_the_category_sheet() {
        let state = new_state(RecordContentType::Bad);
        assert!(state.is_presenting_select_category);
        assert!(!state.is_save_enabled);
        assert_eq!(state.categories().len(), 9);
        assert_eq!(state.title(), "후회 소비");
    }

    #[test]
    fn categories_of_the_other_flag_are_ignored() {
        let h = Harness::new();
        let mut state = new_state(RecordContentType::Good);
        let reducer = RecordWritingReducer;
        reducer.reduce(&mut state, Action::SelectCategory(RecordCategory::Greed), &h.ctx);
        assert_eq!(state.selected_category, None);
        reducer.reduce(&mut state, Action::SaveCategory, &h.ctx);
        assert!(state.is_presenting_select_category);

        reducer.reduce(&mut state, Action::SelectCategory(RecordCategory::Flex), &h.ctx);
        reducer.reduce(&mut state, Action::SaveCategory, &h.ctx);
        assert_eq!(state.saved_category, Some(RecordCategory::Flex));
        assert!(state.is_save_enabled);
    }

    #[test]
    fn over_long_memo_is_cut_and_reported() {
        let h = Harness::new();
        let mut state = new_state(RecordContentType::Good);
        let reducer = RecordWritingReducer;
        reducer.reduce(&mut state, Action::TextChanged("가".repeat(101)), &h.ctx);
        assert_eq!(state.text_count(), 100);
        assert_eq!(state.toast, ToastType::MaxLengthExceeded);
        assert!(h.ctx.navigation.is_swipe_blocked());

        reducer.reduce(&mut state, Action::CompleteShowToast, &h.ctx);
        assert!(state.toast.is_none());
    }

    #[test]
    fn completing_delegates_the_content() {
        let h = Harness::new();
        let existing = RecordContent::new(RecordContentType::Good, RecordCategory::Flex, "tea");
        let mut state = State::new(Context {
            flag: RecordContentType::Good,
            content: Some(existing),
        });
        assert!(state.is_save_enabled);
        let reducer = RecordWritingReducer;
        reducer.reduce(&mut state, Action::TextChanged("coffee".to_string()), &h.ctx);
        let effect = reducer.reduce(&mut state, Action::CompleteWrite, &h.ctx);
        match effect {
            Effect::Send(Action::Delegate(Delegate::CompleteWrite(content))) => {
                assert_eq!(content.category, RecordCategory::Flex);
                assert_eq!(content.memo, "coffee");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn backing_out_of_an_empty_memo_skips_the_confirmation() {
        let h = Harness::new();
        let mut state = new_state(RecordContentType::Bad);
        let reducer = RecordWritingReducer;
        let effect = reducer.reduce(&mut state, Action::ShowCancelRecordBottomSheet, &h.ctx);
        assert!(matches!(effect, Effect::Send(Action::Delegate(Delegate::Cancel))));

        reducer.reduce(&mut state, Action::TextChanged("x".to_string()), &h.ctx);
        let effect = reducer.reduce(&mut state, Action::ShowCancelRecordBottomSheet, &h.ctx);
        assert!(effect.is_none());
        assert!(state.is_presenting_cancel);
    }
}
