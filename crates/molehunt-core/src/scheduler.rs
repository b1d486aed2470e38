use std::collections::BTreeMap;
use std::time::Duration;

/// Which engine timer a token belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimerKind {
    /// Periodic countdown sampling.
    Countdown,
    /// Hides the visible target when its time is up.
    Despawn,
    /// Spawns the next target after the inter-spawn delay.
    Respawn,
}

/// Handle for one armed timer. Sequence numbers are never reused within an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerToken {
    pub seq: u64,
    pub kind: TimerKind,
}

/// Timer source the round engine runs on.
///
/// Implementations deliver a scheduled token back to the engine's
/// `on_timer` once `delay` has elapsed, unless it was cancelled first.
pub trait Scheduler {
    /// Monotonic time since the scheduler was created.
    fn now(&self) -> Duration;

    fn schedule(&mut self, delay: Duration, token: TimerToken);

    fn cancel(&mut self, token: TimerToken);
}

/// Deterministic scheduler driven by an explicit virtual clock.
#[derive(Debug, Default)]
pub struct VirtualScheduler {
    now: Duration,
    pending: BTreeMap<(Duration, u64), TimerToken>,
}

impl VirtualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of armed timers.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn is_armed(&self, token: TimerToken) -> bool {
        self.pending.values().any(|t| *t == token)
    }

    /// Due time of the earliest armed timer.
    pub fn next_due(&self) -> Option<Duration> {
        self.pending.keys().next().map(|(due, _)| *due)
    }

    /// Pop the earliest timer due at or before `until`, moving the clock to its due time.
    pub fn pop_due(&mut self, until: Duration) -> Option<TimerToken> {
        let (&key, _) = self.pending.iter().next()?;
        if key.0 > until {
            return None;
        }
        let token = self.pending.remove(&key)?;
        self.now = self.now.max(key.0);
        Some(token)
    }

    /// Move the clock forward without firing anything.
    pub fn set_now(&mut self, now: Duration) {
        self.now = self.now.max(now);
    }
}

impl Scheduler for VirtualScheduler {
    fn now(&self) -> Duration {
        self.now
    }

    fn schedule(&mut self, delay: Duration, token: TimerToken) {
        self.pending.insert((self.now + delay, token.seq), token);
    }

    fn cancel(&mut self, token: TimerToken) {
        self.pending.retain(|_, t| *t != token);
    }
}
