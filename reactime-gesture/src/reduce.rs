use reactime_core::{GestureMode, Scores};

/// Score names accepted for mouth opening, in priority order.
pub const MOUTH_ALIASES: [&str; 3] = ["mouthOpen", "jawOpen", "lipsParted"];
pub const BLINK_KEYS: [&str; 2] = ["eyeBlinkLeft", "eyeBlinkRight"];

/// Looks up the first name present in `scores`, comparing case-insensitively.
pub fn pick_score(scores: &Scores, names: &[&str]) -> Option<f32> {
    names.iter().find_map(|want| {
        scores
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(want))
            .map(|(_, score)| *score)
    })
}

/// Collapses a frame's named scores into the single score for `mode`.
///
/// Mouth takes the first alias found, not the largest. Blink takes the
/// larger eye so that closing either eye counts.
pub fn reduce_scores(mode: GestureMode, scores: &Scores) -> f32 {
    match mode {
        GestureMode::Mouth => pick_score(scores, &MOUTH_ALIASES).unwrap_or(0.0),
        GestureMode::Blink => BLINK_KEYS
            .iter()
            .filter_map(|key| pick_score(scores, &[*key]))
            .fold(0.0, f32::max),
    }
}
