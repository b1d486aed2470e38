use std::time::Duration;

use crate::round::{HitOutcome, RoundResult};
use crate::target::{SlotIndex, Target};

/// Callbacks the round engine invokes on state transitions.
///
/// Every method defaults to a no-op so front ends only implement what they draw.
pub trait RoundObserver {
    fn on_start(&mut self, _remaining: Duration) {}

    fn on_spawn(&mut self, _slot: SlotIndex, _target: &Target) {}

    /// A target left its slot without being hit (timeout, pre-spawn clear, or round end).
    fn on_despawn(&mut self, _slot: SlotIndex) {}

    fn on_hit(&mut self, _outcome: &HitOutcome) {}

    fn on_tick(&mut self, _remaining: Duration) {}

    fn on_pause(&mut self, _remaining: Duration) {}

    fn on_resume(&mut self, _remaining: Duration) {}

    fn on_round_end(&mut self, _result: &RoundResult) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl RoundObserver for NoopObserver {}

/// One recorded observer callback.
#[derive(Debug, Clone, PartialEq)]
pub enum RoundEvent {
    Started { remaining: Duration },
    Spawned { slot: SlotIndex, target: Target },
    Despawned { slot: SlotIndex },
    Hit(HitOutcome),
    Tick { remaining: Duration },
    Paused { remaining: Duration },
    Resumed { remaining: Duration },
    Ended(RoundResult),
}

/// Observer that records every callback, for headless tests and replays.
#[derive(Debug, Default, Clone)]
pub struct EventLog {
    events: Vec<RoundEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[RoundEvent] {
        &self.events
    }

    pub fn results(&self) -> Vec<&RoundResult> {
        self.events
            .iter()
            .filter_map(|e| match e {
                RoundEvent::Ended(result) => Some(result),
                _ => None,
            })
            .collect()
    }

    pub fn spawn_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, RoundEvent::Spawned { .. }))
            .count()
    }
}

impl RoundObserver for EventLog {
    fn on_start(&mut self, remaining: Duration) {
        self.events.push(RoundEvent::Started { remaining });
    }

    fn on_spawn(&mut self, slot: SlotIndex, target: &Target) {
        self.events.push(RoundEvent::Spawned {
            slot,
            target: *target,
        });
    }

    fn on_despawn(&mut self, slot: SlotIndex) {
        self.events.push(RoundEvent::Despawned { slot });
    }

    fn on_hit(&mut self, outcome: &HitOutcome) {
        self.events.push(RoundEvent::Hit(outcome.clone()));
    }

    fn on_tick(&mut self, remaining: Duration) {
        self.events.push(RoundEvent::Tick { remaining });
    }

    fn on_pause(&mut self, remaining: Duration) {
        self.events.push(RoundEvent::Paused { remaining });
    }

    fn on_resume(&mut self, remaining: Duration) {
        self.events.push(RoundEvent::Resumed { remaining });
    }

    fn on_round_end(&mut self, result: &RoundResult) {
        self.events.push(RoundEvent::Ended(result.clone()));
    }
}
