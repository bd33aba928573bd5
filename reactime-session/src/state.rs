use super::config::{ConfigError, InputMode, SessionConfig};
use super::trial::OpenTrial;
use reactime_core::{SessionStats, SessionSummary, Stage, Trial};
use reactime_timing::{Timer, TimerSlot, ms_to_ns};
use rand::Rng;
use std::time::Duration;
use tracing::{debug, info};

/// The single timer a session can have pending at any moment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingTimer {
    Cue,
    TooSoonHold,
    ResponseTimeout,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Started { total_trials: usize },
    CueShown { index: usize, at: u64 },
    TooSoon { index: usize },
    Retrying { index: usize },
    ResponseTimedOut { index: usize },
    TrialRecorded(Trial),
    Finished(SessionSummary),
}

/// What a single response did to the session.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseOutcome {
    /// The stage gives responses no meaning.
    Ignored(Stage),
    /// Landed inside the post-cue lockout; the trial stays open.
    LockedOut,
    TooSoon,
    Recorded(Trial),
    Finished(SessionSummary),
}

pub struct ReactionSession<T, R>
where
    T: Timer,
    R: Rng,
{
    pub timer: T,
    pub rng: R,
    config: SessionConfig,
    stage: Stage,
    trial_index: usize,
    trials: Vec<Trial>,
    open: Option<OpenTrial>,
    slot: TimerSlot<PendingTimer>,
    events: Vec<SessionEvent>,
    summary: Option<SessionSummary>,
}

impl<T, R> ReactionSession<T, R>
where
    T: Timer<Timestamp = u64>,
    R: Rng,
{
    /// Builds an idle session. Fails if `config` does not validate.
    pub fn new(config: SessionConfig, timer: T, rng: R) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            timer,
            rng,
            config,
            stage: Stage::Idle,
            trial_index: 0,
            trials: Vec::new(),
            open: None,
            slot: TimerSlot::new(),
            events: Vec::new(),
            summary: None,
        })
    }

    /// Starts (or restarts) a session from trial zero.
    pub fn start(&mut self) {
        self.slot.cancel();
        self.trials.clear();
        self.trial_index = 0;
        self.open = None;
        self.summary = None;
        self.events.push(SessionEvent::Started {
            total_trials: self.config.total_trials,
        });
        info!("Session started: {} trial(s)", self.config.total_trials);
        self.schedule_cue();
    }

    /// Cancels everything pending and returns to `Idle`.
    pub fn abort(&mut self) {
        if let Some(kind) = self.slot.cancel() {
            debug!("Abort cancelled pending {:?}", kind);
        }
        self.open = None;
        self.stage = Stage::Idle;
    }

    /// Fires due timers. Call once per host frame; returns every event
    /// produced since the previous call, responses included.
    pub fn update(&mut self) -> Vec<SessionEvent> {
        let now = self.timer.now();
        if let Some(kind) = self.slot.poll(now) {
            match kind {
                PendingTimer::Cue => self.show_cue(now),
                PendingTimer::TooSoonHold => {
                    self.events.push(SessionEvent::Retrying {
                        index: self.trial_index,
                    });
                    self.schedule_cue();
                }
                PendingTimer::ResponseTimeout => {
                    self.events.push(SessionEvent::ResponseTimedOut {
                        index: self.trial_index,
                    });
                    debug!("Trial {} timed out, auto-responding", self.trial_index);
                    self.react_at(now);
                }
            }
        }
        std::mem::take(&mut self.events)
    }

    /// Manual response at the current time.
    pub fn react(&mut self) -> ResponseOutcome {
        let now = self.timer.now();
        self.react_at(now)
    }

    /// Response observed at `at`, e.g. a confirmed gesture's frame time.
    pub fn react_at(&mut self, at: u64) -> ResponseOutcome {
        if self.stage.is_inert() {
            return ResponseOutcome::Ignored(self.stage);
        }
        match self.stage {
            Stage::Waiting => {
                self.too_soon();
                ResponseOutcome::TooSoon
            }
            Stage::Go => {
                let Some(open) = self.open else {
                    return ResponseOutcome::Ignored(self.stage);
                };
                if !open.accepts(at) {
                    debug!(
                        "Response {:.1} ms after cue inside lockout, ignored",
                        at.saturating_sub(open.cue_at) as f64 / 1_000_000.0
                    );
                    return ResponseOutcome::LockedOut;
                }
                self.finalize(open, at)
            }
            stage => ResponseOutcome::Ignored(stage),
        }
    }

    fn schedule_cue(&mut self) {
        self.stage = Stage::Waiting;
        let delay_ms = self
            .rng
            .random_range(self.config.min_delay_ms..=self.config.max_delay_ms);
        let now = self.timer.now();
        self.slot
            .arm(PendingTimer::Cue, now, Duration::from_millis(delay_ms));
        debug!("Trial {} cue scheduled in {} ms", self.trial_index, delay_ms);
    }

    fn show_cue(&mut self, now: u64) {
        self.open = Some(OpenTrial {
            index: self.trial_index,
            cue_at: now,
            locked_until: now.saturating_add(ms_to_ns(self.config.cooldown_ms)),
        });
        self.stage = Stage::Go;
        if let Some(timeout_ms) = self.config.response_timeout_ms {
            self.slot.arm(
                PendingTimer::ResponseTimeout,
                now,
                Duration::from_millis(timeout_ms),
            );
        }
        self.events.push(SessionEvent::CueShown {
            index: self.trial_index,
            at: now,
        });
        debug!("Cue shown for trial {} at {} ns", self.trial_index, now);
    }

    fn too_soon(&mut self) {
        self.slot.cancel();
        self.open = None;
        self.stage = Stage::TooSoon;
        let now = self.timer.now();
        self.slot.arm(
            PendingTimer::TooSoonHold,
            now,
            Duration::from_millis(self.config.too_soon_hold_ms),
        );
        self.events.push(SessionEvent::TooSoon {
            index: self.trial_index,
        });
        info!("Trial {} too soon, retrying", self.trial_index);
    }

    fn finalize(&mut self, open: OpenTrial, at: u64) -> ResponseOutcome {
        self.slot.cancel();
        self.open = None;

        let trial = Trial::finalized(open.index, open.cue_at, at);
        info!(
            "Trial {} recorded: {} ms",
            trial.index,
            trial.latency_ms.unwrap_or_default()
        );
        self.trials.push(trial.clone());
        self.events.push(SessionEvent::TrialRecorded(trial.clone()));

        if self.trials.len() >= self.config.total_trials {
            self.stage = Stage::Done;
            let summary = SessionSummary::new(self.trials.clone());
            info!(
                "Session finished: min {:?} ms, avg {:?} ms",
                summary.stats.min, summary.stats.avg
            );
            self.summary = Some(summary.clone());
            self.events.push(SessionEvent::Finished(summary.clone()));
            ResponseOutcome::Finished(summary)
        } else {
            self.trial_index += 1;
            self.schedule_cue();
            ResponseOutcome::Recorded(trial)
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn trial_index(&self) -> usize {
        self.trial_index
    }

    pub fn remaining(&self) -> usize {
        self.config.total_trials.saturating_sub(self.trials.len())
    }

    pub fn trials(&self) -> &[Trial] {
        &self.trials
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats::from_trials(&self.trials)
    }

    /// Present only once the session is `Done`.
    pub fn summary(&self) -> Option<&SessionSummary> {
        self.summary.as_ref()
    }

    pub fn open_trial(&self) -> Option<&OpenTrial> {
        self.open.as_ref()
    }

    pub fn pending_timer(&self) -> Option<PendingTimer> {
        self.slot.pending()
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.slot.due_at()
    }

    /// True exactly while a gesture-driven session is in `Go`.
    pub fn is_armed(&self) -> bool {
        self.config.input == InputMode::Gesture && self.stage == Stage::Go
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use reactime_timing::ManualTimer;

    const MS: u64 = 1_000_000;

    fn fixed(total: usize, delay_ms: u64) -> SessionConfig {
        SessionConfig {
            total_trials: total,
            min_delay_ms: delay_ms,
            max_delay_ms: delay_ms,
            ..Default::default()
        }
    }

    fn session(config: SessionConfig) -> (ReactionSession<ManualTimer, StdRng>, ManualTimer) {
        let timer = ManualTimer::new();
        let s = ReactionSession::new(config, timer.clone(), StdRng::seed_from_u64(7)).unwrap();
        (s, timer)
    }

    #[test]
    fn responses_ignored_while_idle() {
        let (mut s, _timer) = session(fixed(1, 1500));
        assert_eq!(s.react(), ResponseOutcome::Ignored(Stage::Idle));
        assert!(s.trials().is_empty());
        assert!(s.update().is_empty());
    }

    #[test]
    fn cue_fires_after_delay() {
        let (mut s, timer) = session(fixed(1, 1500));
        s.start();
        assert_eq!(s.stage(), Stage::Waiting);
        assert_eq!(s.pending_timer(), Some(PendingTimer::Cue));

        timer.advance_ms(1499);
        let events = s.update();
        assert_eq!(events, vec![SessionEvent::Started { total_trials: 1 }]);
        assert_eq!(s.stage(), Stage::Waiting);

        timer.advance_ms(1);
        let events = s.update();
        assert_eq!(
            events,
            vec![SessionEvent::CueShown {
                index: 0,
                at: 1500 * MS
            }]
        );
        assert_eq!(s.stage(), Stage::Go);
        assert_eq!(s.pending_timer(), Some(PendingTimer::ResponseTimeout));
    }

    #[test]
    fn response_inside_cooldown_is_noop() {
        let (mut s, timer) = session(fixed(1, 1500));
        s.start();
        timer.advance_ms(1500);
        s.update();

        timer.advance_ms(119);
        assert_eq!(s.react(), ResponseOutcome::LockedOut);
        assert_eq!(s.stage(), Stage::Go);
        assert!(s.trials().is_empty());
        assert_eq!(s.open_trial().map(|t| t.index), Some(0));

        timer.advance_ms(1);
        assert!(matches!(s.react(), ResponseOutcome::Finished(_)));
        assert_eq!(s.trials()[0].latency_ms, Some(120));
    }

    #[test]
    fn early_response_retries_same_index() {
        let (mut s, timer) = session(fixed(2, 1500));
        s.start();
        timer.advance_ms(1460);
        s.update();

        assert_eq!(s.react(), ResponseOutcome::TooSoon);
        assert_eq!(s.stage(), Stage::TooSoon);
        assert_eq!(s.trial_index(), 0);
        assert!(s.trials().is_empty());
        assert_eq!(s.pending_timer(), Some(PendingTimer::TooSoonHold));

        // The superseded cue must not fire at its original deadline.
        timer.advance_ms(40);
        s.update();
        assert_eq!(s.stage(), Stage::TooSoon);

        // Taps during the hold mean nothing.
        assert_eq!(s.react(), ResponseOutcome::Ignored(Stage::TooSoon));

        timer.advance_ms(410);
        let events = s.update();
        assert!(events.contains(&SessionEvent::Retrying { index: 0 }));
        assert_eq!(s.stage(), Stage::Waiting);
        assert_eq!(s.next_deadline(), Some((1460 + 450 + 1500) * MS));
    }

    #[test]
    fn finishes_after_configured_trials() {
        let (mut s, timer) = session(fixed(2, 1000));
        s.start();
        for i in 0..2 {
            timer.advance_ms(1000);
            s.update();
            assert_eq!(s.stage(), Stage::Go);
            timer.advance_ms(200 + i * 100);
            s.react();
        }
        assert_eq!(s.stage(), Stage::Done);
        assert_eq!(s.remaining(), 0);
        let summary = s.summary().expect("summary once done");
        assert_eq!(summary.trials.len(), 2);
        assert_eq!(summary.stats.min, Some(200));
        assert_eq!(summary.stats.avg, Some(250));

        assert_eq!(s.react(), ResponseOutcome::Ignored(Stage::Done));
        assert_eq!(s.pending_timer(), None);
        timer.advance_ms(60_000);
        s.update();
        assert_eq!(s.trials().len(), 2);
    }

    #[test]
    fn timeout_auto_fires_response() {
        let (mut s, timer) = session(SessionConfig {
            response_timeout_ms: Some(10_000),
            ..fixed(1, 1500)
        });
        s.start();
        timer.advance_ms(1500);
        s.update();
        timer.advance_ms(10_000);
        let events = s.update();
        assert!(events.contains(&SessionEvent::ResponseTimedOut { index: 0 }));
        assert_eq!(s.stage(), Stage::Done);
        assert_eq!(s.trials()[0].latency_ms, Some(10_000));
    }

    #[test]
    fn restart_cancels_pending_cue() {
        let (mut s, timer) = session(SessionConfig {
            min_delay_ms: 1500,
            max_delay_ms: 4000,
            ..Default::default()
        });
        s.start();
        timer.advance_ms(1000);
        s.start();
        let deadline = s.next_deadline().unwrap();
        assert!(deadline >= 2500 * MS && deadline <= 5000 * MS);
    }

    #[test]
    fn armed_only_in_go_for_gesture_input() {
        let (mut s, timer) = session(SessionConfig {
            input: InputMode::Gesture,
            ..fixed(1, 1500)
        });
        s.start();
        assert!(!s.is_armed());
        timer.advance_ms(1500);
        s.update();
        assert!(s.is_armed());
        timer.advance_ms(300);
        s.react_at(timer.now());
        assert!(!s.is_armed());

        let (mut tap, timer) = session(fixed(1, 1500));
        tap.start();
        timer.advance_ms(1500);
        tap.update();
        assert!(!tap.is_armed());
    }

    #[test]
    fn random_delays_stay_in_range() {
        let (mut s, timer) = session(SessionConfig {
            total_trials: 50,
            min_delay_ms: 1500,
            max_delay_ms: 1600,
            response_timeout_ms: None,
            ..Default::default()
        });
        s.start();
        for _ in 0..50 {
            let start = timer.now();
            let due = s.next_deadline().unwrap();
            let delay_ms = (due - start) / MS;
            assert!((1500..=1600).contains(&delay_ms));
            timer.set_ms(due / MS);
            s.update();
            timer.advance_ms(250);
            s.react();
        }
        assert_eq!(s.stage(), Stage::Done);
    }

    #[test]
    fn inverted_delay_range_is_rejected() {
        let result = ReactionSession::new(
            SessionConfig {
                min_delay_ms: 2000,
                max_delay_ms: 1000,
                ..Default::default()
            },
            ManualTimer::new(),
            StdRng::seed_from_u64(7),
        );
        assert_eq!(
            result.err(),
            Some(ConfigError::InvertedDelayRange {
                min: 2000,
                max: 1000
            })
        );
    }

    #[test]
    fn zero_trials_is_rejected() {
        let result =
            ReactionSession::new(fixed(0, 1500), ManualTimer::new(), StdRng::seed_from_u64(7));
        assert_eq!(result.err(), Some(ConfigError::NoTrials));
    }
}
