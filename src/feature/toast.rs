use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToastType {
    MaxLengthExceeded,
    MaxNicknameLengthExceeded,
    SpecialCharactersNotAllowed,
    SuccessSaveDecoration,
    EmptyRecordMonth,
    SplashNetworkError,
    #[default]
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToastPosition {
    Top,
    Bottom,
}

impl ToastType {
    pub fn title(self) -> &'static str {
        match self {
            ToastType::MaxLengthExceeded | ToastType::MaxNicknameLengthExceeded => {
                "최대로 작성했어요"
            }
            ToastType::SpecialCharactersNotAllowed => "특수문자는 입력할 수 없어요",
            ToastType::SuccessSaveDecoration => "꾸미기를 반영했어요",
            ToastType::EmptyRecordMonth => "앗! 이달은 기록이 없어요",
            ToastType::SplashNetworkError => {
                "별통이 데이터를 불러오지 못했어요.\n잠시 후 다시 시도해 주세요."
            }
            ToastType::None => "",
        }
    }

    pub fn position(self) -> Option<ToastPosition> {
        match self {
            ToastType::SuccessSaveDecoration => Some(ToastPosition::Top),
            ToastType::None => None,
            _ => Some(ToastPosition::Bottom),
        }
    }

    pub fn is_none(self) -> bool {
        self == ToastType::None
    }
}
