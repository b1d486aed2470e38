pub mod config;
pub mod notify;
pub mod observer;
pub mod round;
pub mod scheduler;
pub mod service;
pub mod target;
pub mod time;

pub use config::RoundConfig;
pub use observer::{EventLog, NoopObserver, RoundEvent, RoundObserver};
pub use round::{HitOutcome, RoundEngine, RoundPhase, RoundResult, StartRefused};
pub use scheduler::{Scheduler, TimerKind, TimerToken, VirtualScheduler};
pub use target::{SlotIndex, Target, TargetKind};

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    use std::time::Duration;

    use crate::config::RoundConfig;
    use crate::observer::{EventLog, RoundObserver};
    use crate::round::{RoundEngine, RoundResult};
    use crate::scheduler::{Scheduler, VirtualScheduler};
    use crate::target::SlotIndex;

    /// Engine on a virtual clock that records every observer callback.
    pub type TestEngine = RoundEngine<VirtualScheduler, EventLog>;

    /// Default round config with the given slot count and bonus probability.
    pub fn test_config(slot_count: usize, bonus_chance: f64) -> RoundConfig {
        RoundConfig {
            slot_count,
            bonus_chance,
            ..RoundConfig::default()
        }
    }

    /// Create a seeded test engine. Panics on an invalid config.
    pub fn make_engine(config: RoundConfig, seed: u64) -> TestEngine {
        RoundEngine::with_seed(config, VirtualScheduler::new(), EventLog::new(), seed)
            .expect("test config must be valid")
    }

    /// Fire every timer due within `by`, in order.
    ///
    /// Stops early, with the clock at the end instant, if the round ends.
    pub fn advance<O: RoundObserver>(
        engine: &mut RoundEngine<VirtualScheduler, O>,
        by: Duration,
    ) -> Option<RoundResult> {
        let until = engine.scheduler().now() + by;
        while let Some(token) = engine.scheduler_mut().pop_due(until) {
            if let Some(result) = engine.on_timer(token) {
                return Some(result);
            }
        }
        engine.scheduler_mut().set_now(until);
        None
    }

    /// Fire timers until a target is visible, for at most `limit` of virtual time.
    pub fn advance_until_visible<O: RoundObserver>(
        engine: &mut RoundEngine<VirtualScheduler, O>,
        limit: Duration,
    ) -> Option<SlotIndex> {
        if engine.active_slot().is_some() {
            return engine.active_slot();
        }
        let until = engine.scheduler().now() + limit;
        while let Some(token) = engine.scheduler_mut().pop_due(until) {
            engine.on_timer(token);
            if engine.active_slot().is_some() {
                return engine.active_slot();
            }
            if !engine.is_running() {
                return None;
            }
        }
        None
    }

    /// Fire timers until the round ends. Returns `None` if nothing is armed.
    pub fn run_to_end<O: RoundObserver>(
        engine: &mut RoundEngine<VirtualScheduler, O>,
    ) -> Option<RoundResult> {
        loop {
            let due = engine.scheduler().next_due()?;
            let token = engine.scheduler_mut().pop_due(due)?;
            if let Some(result) = engine.on_timer(token) {
                return Some(result);
            }
        }
    }
}
