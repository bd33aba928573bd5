use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Named classifier scores for one frame, e.g. `jawOpen -> 0.73`.
pub type Scores = HashMap<String, f32>;

/// Detectable gesture kinds.
#[derive(Copy, Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GestureMode {
    #[default]
    Mouth,
    Blink,
}

impl GestureMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mouth => "mouth",
            Self::Blink => "blink",
        }
    }
}

impl std::fmt::Display for GestureMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
