use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use reactime_core::GestureMode;
use reactime_gesture::GestureConfig;
use reactime_session::{InputMode, SessionConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug, Default)]
#[command(name = "reactime", about = "Measure reaction time by tap or facial gesture")]
pub struct Cli {
    /// JSON configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Number of trials in the session
    #[arg(long)]
    pub trials: Option<usize>,
    #[arg(long, value_enum)]
    pub input: Option<InputArg>,
    /// Gesture used when input is `gesture`
    #[arg(long, value_enum)]
    pub mode: Option<ModeArg>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum InputArg {
    Tap,
    Gesture,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Mouth,
    Blink,
}

impl From<InputArg> for InputMode {
    fn from(arg: InputArg) -> Self {
        match arg {
            InputArg::Tap => InputMode::Tap,
            InputArg::Gesture => InputMode::Gesture,
        }
    }
}

impl From<ModeArg> for GestureMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Mouth => GestureMode::Mouth,
            ModeArg::Blink => GestureMode::Blink,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub session: SessionConfig,
    pub gesture: GestureConfig,
}

impl AppConfig {
    /// Defaults, then the config file, then command-line overrides.
    pub fn load(cli: &Cli) -> Result<Self> {
        let mut config = match &cli.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply(cli);
        config
            .session
            .validate()
            .context("Invalid session configuration")?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))
    }

    fn apply(&mut self, cli: &Cli) {
        if let Some(trials) = cli.trials {
            self.session.total_trials = trials;
        }
        if let Some(input) = cli.input {
            self.session.input = input.into();
        }
        if let Some(mode) = cli.mode {
            self.gesture.mode = mode.into();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_overrides_defaults() {
        let cli = Cli::parse_from(["reactime", "--trials", "5", "--input", "gesture", "--mode", "blink"]);
        let config = AppConfig::load(&cli).unwrap();
        assert_eq!(config.session.total_trials, 5);
        assert_eq!(config.session.input, InputMode::Gesture);
        assert_eq!(config.gesture.mode, GestureMode::Blink);
        assert_eq!(config.session.min_delay_ms, 1500);
    }

    #[test]
    fn zero_trials_rejected() {
        let cli = Cli {
            trials: Some(0),
            ..Default::default()
        };
        assert!(AppConfig::load(&cli).is_err());
    }

    #[test]
    fn nested_json_sections() {
        let config: AppConfig = serde_json::from_str(
            r#"{ "session": { "total_trials": 3, "max_delay_ms": 2500 }, "gesture": { "dead_time_ms": 500 } }"#,
        )
        .unwrap();
        assert_eq!(config.session.total_trials, 3);
        assert_eq!(config.session.max_delay_ms, 2500);
        assert_eq!(config.gesture.dead_time_ms, 500);
        assert_eq!(config.gesture.consecutive_frames, 2);
    }

    #[test]
    fn missing_file_is_reported() {
        let cli = Cli {
            config: Some(PathBuf::from("/nonexistent/reactime.json")),
            ..Default::default()
        };
        let err = AppConfig::load(&cli).unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }
}
