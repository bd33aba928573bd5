use serde::{Deserialize, Serialize};

/// Recorded result per trial. Timestamps are nanoseconds on the session clock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trial {
    pub index: usize,
    pub cue_at: u64,
    pub react_at: Option<u64>,
    pub latency_ms: Option<u64>,
    pub early: bool,
}

impl Trial {
    /// Builds the record for a response at `react_at` to the cue at `cue_at`.
    /// The latency is rounded to the nearest millisecond and never negative.
    pub fn finalized(index: usize, cue_at: u64, react_at: u64) -> Self {
        let elapsed_ns = react_at.saturating_sub(cue_at);
        let latency_ms = (elapsed_ns + 500_000) / 1_000_000;
        Self {
            index,
            cue_at,
            react_at: Some(react_at),
            latency_ms: Some(latency_ms),
            early: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    pub min: Option<u64>,
    pub avg: Option<u64>,
}

impl SessionStats {
    /// Min and rounded mean over every trial that carries a latency.
    pub fn from_trials(trials: &[Trial]) -> Self {
        let latencies: Vec<u64> = trials.iter().filter_map(|t| t.latency_ms).collect();
        if latencies.is_empty() {
            return Self::default();
        }
        let sum: u64 = latencies.iter().sum();
        let avg = (sum as f64 / latencies.len() as f64).round() as u64;
        Self {
            min: latencies.iter().copied().min(),
            avg: Some(avg),
        }
    }
}

/// Final, immutable outcome of a finished session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub trials: Vec<Trial>,
    pub stats: SessionStats,
}

impl SessionSummary {
    pub fn new(trials: Vec<Trial>) -> Self {
        let stats = SessionStats::from_trials(&trials);
        Self { trials, stats }
    }
}
