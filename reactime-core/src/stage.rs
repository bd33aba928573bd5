use serde::{Deserialize, Serialize};

/// Session stage. Governs what a response means.
#[derive(Copy, Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Stage {
    #[default]
    Idle,
    Waiting,
    Go,
    TooSoon,
    Done,
}

impl Stage {
    /// Stages in which a response has no meaning and is dropped.
    pub fn is_inert(&self) -> bool {
        matches!(self, Self::Idle | Self::TooSoon | Self::Done)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Waiting => "waiting",
            Self::Go => "go",
            Self::TooSoon => "tooSoon",
            Self::Done => "done",
        }
    }
}
