use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::config::{ConfigError, RoundConfig};
use crate::observer::{NoopObserver, RoundObserver};
use crate::scheduler::{Scheduler, TimerKind, TimerToken};
use crate::target::{SlotIndex, Target, TargetKind};
use crate::time::timestamp_now;

/// Lifecycle phase of the engine's current round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundPhase {
    Idle,
    Running,
    Paused,
    Ended,
}

/// Why `start` did not start a round. Nothing changes when this is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum StartRefused {
    #[error("not enough coins: have {balance}, need {cost}")]
    InsufficientCoins { balance: u32, cost: u32 },
    #[error("a round is already in progress")]
    RoundInProgress,
}

/// Final numbers of a round, produced once when it ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundResult {
    pub score: u32,
    pub bonus_hits: u32,
    /// Configured round duration (bonus extensions are not counted).
    pub duration_secs: u64,
    #[serde(with = "time::serde::rfc3339")]
    pub started_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub ended_at: OffsetDateTime,
}

/// What a successful hit did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HitOutcome {
    pub slot: SlotIndex,
    pub kind: TargetKind,
    /// Points added by this hit.
    pub points: u32,
    /// Score after the hit.
    pub score: u32,
    pub bonus_hits: u32,
    /// Countdown after any bonus extension.
    pub remaining: Duration,
    /// Coins the caller should credit to the player.
    pub coins_awarded: u32,
}

#[derive(Debug, Default)]
struct ArmedTimers {
    countdown: Option<TimerToken>,
    despawn: Option<TimerToken>,
    respawn: Option<TimerToken>,
}

impl ArmedTimers {
    fn slot(&mut self, kind: TimerKind) -> &mut Option<TimerToken> {
        match kind {
            TimerKind::Countdown => &mut self.countdown,
            TimerKind::Despawn => &mut self.despawn,
            TimerKind::Respawn => &mut self.respawn,
        }
    }
}

/// Round lifecycle and scoring state machine.
///
/// The engine never reads a wall clock for timing: all deadlines come from
/// the [`Scheduler`], which calls back into [`RoundEngine::on_timer`]. Every
/// public operation is a no-op outside the phases it applies to.
pub struct RoundEngine<S, O = NoopObserver> {
    config: RoundConfig,
    scheduler: S,
    observer: O,
    rng: StdRng,
    phase: RoundPhase,
    score: u32,
    bonus_hits: u32,
    started_at: Option<OffsetDateTime>,
    /// Countdown deadline on the scheduler clock while running.
    ends_at: Duration,
    /// Remaining time at the last sample; authoritative while paused or ended.
    remaining: Duration,
    slots: Vec<Option<Target>>,
    active_slot: Option<SlotIndex>,
    /// Scheduler time at which the visible target times out.
    target_deadline: Duration,
    /// Visible time the target had left when the round was paused.
    target_left: Option<Duration>,
    timers: ArmedTimers,
    next_seq: u64,
    last_result: Option<RoundResult>,
}

impl<S: Scheduler, O: RoundObserver> RoundEngine<S, O> {
    /// Create an engine seeded from OS entropy.
    pub fn new(config: RoundConfig, scheduler: S, observer: O) -> Result<Self, ConfigError> {
        Self::with_rng(config, scheduler, observer, StdRng::from_os_rng())
    }

    /// Create an engine with a deterministic spawn sequence.
    pub fn with_seed(
        config: RoundConfig,
        scheduler: S,
        observer: O,
        seed: u64,
    ) -> Result<Self, ConfigError> {
        Self::with_rng(config, scheduler, observer, StdRng::seed_from_u64(seed))
    }

    fn with_rng(
        config: RoundConfig,
        scheduler: S,
        observer: O,
        rng: StdRng,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let remaining = config.round_duration();
        Ok(Self {
            slots: vec![None; config.slot_count],
            config,
            scheduler,
            observer,
            rng,
            phase: RoundPhase::Idle,
            score: 0,
            bonus_hits: 0,
            started_at: None,
            ends_at: Duration::ZERO,
            remaining,
            active_slot: None,
            target_deadline: Duration::ZERO,
            target_left: None,
            timers: ArmedTimers::default(),
            next_seq: 0,
            last_result: None,
        })
    }

    pub fn config(&self) -> &RoundConfig {
        &self.config
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == RoundPhase::Running
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn bonus_hits(&self) -> u32 {
        self.bonus_hits
    }

    pub fn started_at(&self) -> Option<OffsetDateTime> {
        self.started_at
    }

    /// Time left on the countdown, sampled from the scheduler clock while running.
    pub fn remaining(&self) -> Duration {
        match self.phase {
            RoundPhase::Running => self.ends_at.saturating_sub(self.scheduler.now()),
            RoundPhase::Idle | RoundPhase::Paused | RoundPhase::Ended => self.remaining,
        }
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Target currently in `slot`, if any.
    pub fn slot(&self, slot: SlotIndex) -> Option<&Target> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    pub fn active_slot(&self) -> Option<SlotIndex> {
        self.active_slot
    }

    /// Number of occupied slots. Never more than one.
    pub fn visible_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Result of the most recently ended round.
    pub fn last_result(&self) -> Option<&RoundResult> {
        self.last_result.as_ref()
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    /// Start a fresh round, charging the entry cost from `balance`.
    ///
    /// Returns the balance after the charge.
    pub fn start(&mut self, balance: u32) -> Result<u32, StartRefused> {
        if matches!(self.phase, RoundPhase::Running | RoundPhase::Paused) {
            tracing::debug!(phase = ?self.phase, "Start ignored, round in progress");
            return Err(StartRefused::RoundInProgress);
        }
        let cost = self.config.entry_cost;
        if balance < cost {
            tracing::debug!(balance, cost, "Start refused, insufficient coins");
            return Err(StartRefused::InsufficientCoins { balance, cost });
        }

        self.disarm_all();
        self.slots.iter_mut().for_each(|s| *s = None);
        self.active_slot = None;
        self.target_left = None;
        self.score = 0;
        self.bonus_hits = 0;
        self.last_result = None;
        self.started_at = Some(timestamp_now());

        let full = self.config.round_duration();
        self.remaining = full;
        self.ends_at = self.scheduler.now() + full;
        self.phase = RoundPhase::Running;

        tracing::info!(
            duration_ms = self.config.round_duration_ms,
            slots = self.slots.len(),
            "Round started"
        );
        self.observer.on_start(full);
        self.arm(TimerKind::Countdown, self.config.tick_interval());
        self.spawn();

        Ok(balance - cost)
    }

    /// Deliver a fired timer. Tokens that are no longer armed are ignored.
    ///
    /// Returns the round result when this timer ended the round.
    pub fn on_timer(&mut self, token: TimerToken) -> Option<RoundResult> {
        let armed = self.timers.slot(token.kind);
        if *armed != Some(token) {
            tracing::trace!(?token, "Ignoring stale timer");
            return None;
        }
        *armed = None;

        match token.kind {
            TimerKind::Countdown => self.sample_countdown(),
            TimerKind::Despawn => {
                self.despawn_timeout();
                None
            },
            TimerKind::Respawn => {
                self.spawn();
                None
            },
        }
    }

    /// Hit `slot`. Ignored unless the round is running and the slot holds a target.
    pub fn hit(&mut self, slot: SlotIndex) -> Option<HitOutcome> {
        if self.phase != RoundPhase::Running {
            return None;
        }
        let now = self.scheduler.now();
        if self.ends_at <= now {
            // Countdown already hit zero; the pending sample will end the round.
            return None;
        }
        let target = self.slots.get_mut(slot)?.take()?;
        self.active_slot = None;
        self.disarm(TimerKind::Despawn);

        let mut coins_awarded = 0;
        let points = match target.kind {
            TargetKind::Ordinary => 1,
            TargetKind::Bonus => {
                self.bonus_hits += 1;
                coins_awarded = self.config.bonus_coins;
                let left = self.ends_at - now;
                let extended = (left + Duration::from_millis(self.config.bonus_time_ms))
                    .min(self.config.round_duration());
                self.ends_at = now + extended;
                self.config.bonus_score
            },
        };
        self.score += points;
        self.remaining = self.ends_at - now;

        let outcome = HitOutcome {
            slot,
            kind: target.kind,
            points,
            score: self.score,
            bonus_hits: self.bonus_hits,
            remaining: self.remaining,
            coins_awarded,
        };
        tracing::debug!(slot, points, score = self.score, "Target hit");
        self.observer.on_hit(&outcome);
        self.arm(TimerKind::Respawn, self.config.respawn_delay());
        Some(outcome)
    }

    /// Freeze the countdown and cancel pending timers. Only valid while running.
    pub fn pause(&mut self) -> bool {
        if self.phase != RoundPhase::Running {
            return false;
        }
        let now = self.scheduler.now();
        self.remaining = self.ends_at.saturating_sub(now);
        self.target_left = self
            .active_slot
            .map(|_| self.target_deadline.saturating_sub(now));
        self.disarm_all();
        self.phase = RoundPhase::Paused;

        tracing::info!(remaining_ms = self.remaining.as_millis() as u64, "Round paused");
        self.observer.on_pause(self.remaining);
        true
    }

    /// Restart the countdown from the frozen remaining time. Only valid while paused.
    pub fn resume(&mut self) -> bool {
        if self.phase != RoundPhase::Paused {
            return false;
        }
        let now = self.scheduler.now();
        self.ends_at = now + self.remaining;
        self.phase = RoundPhase::Running;

        tracing::info!(remaining_ms = self.remaining.as_millis() as u64, "Round resumed");
        self.observer.on_resume(self.remaining);
        self.arm(TimerKind::Countdown, self.config.tick_interval());

        match (self.active_slot, self.target_left.take()) {
            (Some(_), Some(left)) if !left.is_zero() => {
                self.target_deadline = now + left;
                self.arm(TimerKind::Despawn, left);
            },
            (Some(_), _) => self.despawn_timeout(),
            (None, _) => self.spawn(),
        }
        true
    }

    /// Pause when running, resume when paused.
    pub fn toggle_pause(&mut self) -> bool {
        match self.phase {
            RoundPhase::Running => self.pause(),
            RoundPhase::Paused => self.resume(),
            RoundPhase::Idle | RoundPhase::Ended => false,
        }
    }

    /// End the round early (e.g. the player backed out).
    ///
    /// Returns `None` if no round is running or paused, so a round is only ever
    /// reported once.
    pub fn end_round(&mut self) -> Option<RoundResult> {
        if !matches!(self.phase, RoundPhase::Running | RoundPhase::Paused) {
            tracing::debug!(phase = ?self.phase, "End ignored, no round in progress");
            return None;
        }
        Some(self.finish())
    }

    fn sample_countdown(&mut self) -> Option<RoundResult> {
        if self.phase != RoundPhase::Running {
            return None;
        }
        let remaining = self.ends_at.saturating_sub(self.scheduler.now());
        self.remaining = remaining;
        self.observer.on_tick(remaining);
        if remaining.is_zero() {
            return Some(self.finish());
        }
        self.arm(TimerKind::Countdown, self.config.tick_interval());
        None
    }

    fn spawn(&mut self) {
        if self.phase != RoundPhase::Running {
            return;
        }
        self.clear_target();
        self.disarm(TimerKind::Despawn);

        let slot = self.rng.random_range(0..self.slots.len());
        let target = if self.rng.random_bool(self.config.bonus_chance) {
            Target::bonus(Duration::from_millis(self.config.bonus_visible_ms))
        } else {
            let durations = &self.config.target_durations_ms;
            let idx = self.rng.random_range(0..durations.len());
            Target::ordinary(Duration::from_millis(durations[idx]))
        };

        self.slots[slot] = Some(target);
        self.active_slot = Some(slot);
        self.target_deadline = self.scheduler.now() + target.visible;
        tracing::debug!(slot, kind = ?target.kind, visible_ms = target.visible.as_millis() as u64, "Target spawned");
        self.observer.on_spawn(slot, &target);
        self.arm(TimerKind::Despawn, target.visible);
    }

    fn despawn_timeout(&mut self) {
        if self.phase != RoundPhase::Running {
            return;
        }
        self.clear_target();
        self.arm(TimerKind::Respawn, self.config.respawn_delay());
    }

    /// Remove the visible target without scoring it.
    fn clear_target(&mut self) {
        if let Some(slot) = self.active_slot.take() {
            self.slots[slot] = None;
            self.observer.on_despawn(slot);
        }
    }

    fn finish(&mut self) -> RoundResult {
        if self.phase == RoundPhase::Running {
            self.remaining = self.ends_at.saturating_sub(self.scheduler.now());
        }
        self.disarm_all();
        self.clear_target();
        self.target_left = None;
        self.phase = RoundPhase::Ended;

        let ended_at = timestamp_now();
        let result = RoundResult {
            score: self.score,
            bonus_hits: self.bonus_hits,
            duration_secs: self.config.duration_secs(),
            started_at: self.started_at.unwrap_or(ended_at),
            ended_at,
        };
        tracing::info!(
            score = result.score,
            bonus_hits = result.bonus_hits,
            "Round ended"
        );
        self.last_result = Some(result.clone());
        self.observer.on_round_end(&result);
        result
    }

    fn arm(&mut self, kind: TimerKind, delay: Duration) {
        self.disarm(kind);
        self.next_seq += 1;
        let token = TimerToken {
            seq: self.next_seq,
            kind,
        };
        self.scheduler.schedule(delay, token);
        *self.timers.slot(kind) = Some(token);
    }

    fn disarm(&mut self, kind: TimerKind) {
        if let Some(token) = self.timers.slot(kind).take() {
            self.scheduler.cancel(token);
        }
    }

    fn disarm_all(&mut self) {
        self.disarm(TimerKind::Countdown);
        self.disarm(TimerKind::Despawn);
        self.disarm(TimerKind::Respawn);
    }
}
