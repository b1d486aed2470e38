use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use molehunt_core::scheduler::{Scheduler, TimerToken};

/// Real-time [`Scheduler`] backed by tokio timers.
///
/// Each armed timer is a sleeping task that sends its token on the channel
/// returned by [`TokioScheduler::new`]. The owner feeds received tokens back
/// into the engine, so engine state is only ever touched from one task.
/// Must be used inside a tokio runtime.
pub struct TokioScheduler {
    origin: Instant,
    tx: mpsc::UnboundedSender<TimerToken>,
    tasks: HashMap<TimerToken, JoinHandle<()>>,
}

impl TokioScheduler {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TimerToken>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let scheduler = Self {
            origin: Instant::now(),
            tx,
            tasks: HashMap::new(),
        };
        (scheduler, rx)
    }

    /// Timers that have not fired or been cancelled yet.
    pub fn armed(&self) -> usize {
        self.tasks.values().filter(|h| !h.is_finished()).count()
    }
}

impl Scheduler for TokioScheduler {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn schedule(&mut self, delay: Duration, token: TimerToken) {
        self.tasks.retain(|_, handle| !handle.is_finished());
        let tx = self.tx.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Receiver gone means the session was torn down.
            let _ = tx.send(token);
        });
        self.tasks.insert(token, handle);
    }

    fn cancel(&mut self, token: TimerToken) {
        if let Some(handle) = self.tasks.remove(&token) {
            handle.abort();
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        for (_, handle) in self.tasks.drain() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use molehunt_core::scheduler::TimerKind;

    fn token(seq: u64, kind: TimerKind) -> TimerToken {
        TimerToken { seq, kind }
    }

    #[tokio::test(start_paused = true)]
    async fn fires_in_due_order() {
        let (mut sched, mut rx) = TokioScheduler::new();
        sched.schedule(Duration::from_millis(500), token(1, TimerKind::Despawn));
        sched.schedule(Duration::from_millis(10), token(2, TimerKind::Countdown));

        assert_eq!(rx.recv().await, Some(token(2, TimerKind::Countdown)));
        assert_eq!(sched.now(), Duration::from_millis(10));
        assert_eq!(rx.recv().await, Some(token(1, TimerKind::Despawn)));
        assert_eq!(sched.now(), Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_timer_never_fires() {
        let (mut sched, mut rx) = TokioScheduler::new();
        sched.schedule(Duration::from_millis(100), token(1, TimerKind::Despawn));
        sched.schedule(Duration::from_millis(200), token(2, TimerKind::Respawn));
        sched.cancel(token(1, TimerKind::Despawn));

        assert_eq!(rx.recv().await, Some(token(2, TimerKind::Respawn)));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn finished_timers_are_pruned() {
        let (mut sched, mut rx) = TokioScheduler::new();
        sched.schedule(Duration::from_millis(10), token(1, TimerKind::Countdown));
        rx.recv().await.unwrap();
        tokio::task::yield_now().await;
        assert_eq!(sched.armed(), 0);

        sched.schedule(Duration::from_millis(10), token(2, TimerKind::Countdown));
        assert_eq!(sched.armed(), 1);
        assert_eq!(sched.tasks.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn drop_aborts_pending_timers() {
        let (mut sched, mut rx) = TokioScheduler::new();
        sched.schedule(Duration::from_millis(100), token(1, TimerKind::Despawn));
        drop(sched);
        assert_eq!(rx.recv().await, None);
    }
}
