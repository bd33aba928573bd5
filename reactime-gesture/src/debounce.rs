use reactime_timing::ms_to_ns;

/// Decides which frames get classified. A frame passes only when both the
/// minimum inference spacing and the every-Nth-frame gate agree.
#[derive(Debug, Clone)]
pub struct Throttle {
    budget_ns: u64,
    every_n: u32,
    frame_count: u64,
    last_inference: Option<u64>,
}

impl Throttle {
    pub fn new(budget_ns: u64, every_n: u32) -> Self {
        Self {
            budget_ns,
            every_n: every_n.max(1),
            frame_count: 0,
            last_inference: None,
        }
    }

    /// Counts a frame and reports whether it should be classified.
    pub fn admit(&mut self, now: u64) -> bool {
        self.frame_count += 1;
        let slot_free = self
            .last_inference
            .is_none_or(|last| now.saturating_sub(last) >= self.budget_ns);
        let sampled = self.frame_count % u64::from(self.every_n) == 0;
        if slot_free && sampled {
            self.last_inference = Some(now);
            true
        } else {
            false
        }
    }

    /// Forgets the last inference time; the frame counter keeps running.
    pub fn reset(&mut self) {
        self.last_inference = None;
    }
}

/// Consecutive-frame confirmation with a post-confirmation dead time.
#[derive(Debug, Clone)]
pub struct Debouncer {
    required: u32,
    dead_time_ns: u64,
    consecutive: u32,
    locked_until: u64,
}

impl Debouncer {
    pub fn new(required: u32, dead_time_ms: u64) -> Self {
        Self {
            required: required.max(1),
            dead_time_ns: ms_to_ns(dead_time_ms),
            consecutive: 0,
            locked_until: 0,
        }
    }

    /// Feeds one reduced score. Returns true on the frame that confirms.
    /// Frames inside the dead time leave the counter untouched.
    pub fn observe(&mut self, score: f32, threshold: f32, now: u64) -> bool {
        if now < self.locked_until {
            return false;
        }
        if score < threshold {
            self.consecutive = 0;
            return false;
        }
        self.consecutive += 1;
        if self.consecutive >= self.required {
            self.consecutive = 0;
            self.locked_until = now.saturating_add(self.dead_time_ns);
            return true;
        }
        false
    }

    pub fn reset(&mut self) {
        self.consecutive = 0;
    }
}
