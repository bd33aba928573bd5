//! Cancellable one-shot timers for poll-driven state machines.
//!
//! A `TimerSlot` holds at most one pending timer. Arming a slot replaces
//! (and thereby cancels) whatever was pending, so a superseded timer can
//! never fire into a later state.

use std::fmt::Debug;
use std::time::Duration;
use tracing::trace;

/// Identifies one arming of a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerHandle(u64);

#[derive(Debug, Clone)]
struct Pending<K> {
    kind: K,
    due_ns: u64,
    handle: TimerHandle,
}

#[derive(Debug, Clone)]
pub struct TimerSlot<K> {
    pending: Option<Pending<K>>,
    generation: u64,
}

impl<K> Default for TimerSlot<K> {
    fn default() -> Self {
        Self {
            pending: None,
            generation: 0,
        }
    }
}

impl<K: Copy + Debug> TimerSlot<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `kind` to fire `delay` after `now_ns`, cancelling any
    /// timer that was still pending.
    pub fn arm(&mut self, kind: K, now_ns: u64, delay: Duration) -> TimerHandle {
        if let Some(old) = self.pending.take() {
            trace!("timer {:?} superseded by {:?}", old.kind, kind);
        }
        self.generation += 1;
        let handle = TimerHandle(self.generation);
        self.pending = Some(Pending {
            kind,
            due_ns: now_ns.saturating_add(delay.as_nanos() as u64),
            handle,
        });
        handle
    }

    /// Drops the pending timer, returning what it would have fired.
    pub fn cancel(&mut self) -> Option<K> {
        self.pending.take().map(|p| p.kind)
    }

    /// Cancels only if `handle` is still the pending arming.
    pub fn cancel_handle(&mut self, handle: TimerHandle) -> bool {
        if self.pending.as_ref().is_some_and(|p| p.handle == handle) {
            self.pending = None;
            true
        } else {
            false
        }
    }

    /// Fires the pending timer once its deadline has been reached.
    pub fn poll(&mut self, now_ns: u64) -> Option<K> {
        match &self.pending {
            Some(p) if now_ns >= p.due_ns => self.pending.take().map(|p| p.kind),
            _ => None,
        }
    }

    pub fn pending(&self) -> Option<K> {
        self.pending.as_ref().map(|p| p.kind)
    }

    pub fn due_at(&self) -> Option<u64> {
        self.pending.as_ref().map(|p| p.due_ns)
    }

    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Kind {
        A,
        B,
    }

    #[test]
    fn fires_once_at_deadline() {
        let mut slot = TimerSlot::new();
        slot.arm(Kind::A, 0, Duration::from_millis(10));
        assert_eq!(slot.poll(9_999_999), None);
        assert_eq!(slot.poll(10_000_000), Some(Kind::A));
        assert_eq!(slot.poll(20_000_000), None);
        assert!(!slot.is_armed());
    }

    #[test]
    fn rearming_cancels_previous_timer() {
        let mut slot = TimerSlot::new();
        slot.arm(Kind::A, 0, Duration::from_millis(5));
        slot.arm(Kind::B, 0, Duration::from_millis(50));
        assert_eq!(slot.poll(10_000_000), None);
        assert_eq!(slot.pending(), Some(Kind::B));
        assert_eq!(slot.poll(50_000_000), Some(Kind::B));
    }

    #[test]
    fn stale_handle_does_not_cancel_newer_timer() {
        let mut slot = TimerSlot::new();
        let stale = slot.arm(Kind::A, 0, Duration::from_millis(5));
        let fresh = slot.arm(Kind::B, 0, Duration::from_millis(5));
        assert!(!slot.cancel_handle(stale));
        assert!(slot.is_armed());
        assert!(slot.cancel_handle(fresh));
        assert_eq!(slot.cancel(), None);
    }
}
