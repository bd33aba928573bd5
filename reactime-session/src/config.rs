use serde::{Deserialize, Serialize};

/// How responses reach the session.
#[derive(Copy, Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputMode {
    #[default]
    Tap,
    Gesture,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub total_trials: usize,
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
    /// Post-cue window in which responses are discarded as jitter.
    pub cooldown_ms: u64,
    pub too_soon_hold_ms: u64,
    /// Auto-fires a response this long after the cue. `None` waits forever.
    pub response_timeout_ms: Option<u64>,
    pub input: InputMode,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            total_trials: 1,
            min_delay_ms: 1500,
            max_delay_ms: 4000,
            cooldown_ms: 120,
            too_soon_hold_ms: 450,
            response_timeout_ms: Some(10_000),
            input: InputMode::Tap,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("total_trials must be at least 1")]
    NoTrials,
    #[error("min_delay_ms ({min}) exceeds max_delay_ms ({max})")]
    InvertedDelayRange { min: u64, max: u64 },
    #[error("cooldown_ms ({cooldown}) must be shorter than min_delay_ms ({min_delay})")]
    CooldownTooLong { cooldown: u64, min_delay: u64 },
    #[error("response_timeout_ms ({timeout}) must be longer than cooldown_ms ({cooldown})")]
    TimeoutWithinCooldown { timeout: u64, cooldown: u64 },
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.total_trials == 0 {
            return Err(ConfigError::NoTrials);
        }
        if self.min_delay_ms > self.max_delay_ms {
            return Err(ConfigError::InvertedDelayRange {
                min: self.min_delay_ms,
                max: self.max_delay_ms,
            });
        }
        if self.cooldown_ms >= self.min_delay_ms {
            return Err(ConfigError::CooldownTooLong {
                cooldown: self.cooldown_ms,
                min_delay: self.min_delay_ms,
            });
        }
        if let Some(timeout) = self.response_timeout_ms {
            if timeout <= self.cooldown_ms {
                return Err(ConfigError::TimeoutWithinCooldown {
                    timeout,
                    cooldown: self.cooldown_ms,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(SessionConfig::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_inverted_range_and_long_cooldown() {
        let config = SessionConfig {
            min_delay_ms: 2000,
            max_delay_ms: 1000,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvertedDelayRange {
                min: 2000,
                max: 1000
            })
        );

        let config = SessionConfig {
            cooldown_ms: 1500,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::CooldownTooLong { .. })
        ));
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: SessionConfig =
            serde_json::from_str(r#"{ "total_trials": 5, "input": "gesture" }"#).unwrap();
        assert_eq!(config.total_trials, 5);
        assert_eq!(config.input, InputMode::Gesture);
        assert_eq!(config.min_delay_ms, 1500);
        assert_eq!(config.response_timeout_ms, Some(10_000));
    }
}
