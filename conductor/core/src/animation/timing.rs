//! Timing primitives
//!
//! Jittered tick ranges, cancellable task handles and the one-shot
//! "fire an event after a delay" scheduler shared by the conversation beats
//! and both typewriter loops.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Bounded jitter range for per-character ticks (inclusive, milliseconds)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickRange {
    /// Shortest delay
    pub min_ms: u64,
    /// Longest delay
    pub max_ms: u64,
}

/// Reveal speed for bot replies
pub const REPLY_REVEAL: TickRange = TickRange::new(30, 60);

/// Reveal speed for the background tagline
pub const TAGLINE_REVEAL: TickRange = TickRange::new(50, 130);

/// Erase speed for the background tagline
pub const TAGLINE_ERASE: TickRange = TickRange::new(30, 80);

impl TickRange {
    /// Create a range; callers validate `min_ms <= max_ms`
    #[must_use]
    pub const fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    /// Whether the bounds are ordered
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.min_ms <= self.max_ms
    }

    /// Draw one delay uniformly from the range
    pub fn sample<R: Rng>(&self, rng: &mut R) -> Duration {
        let ms = if self.min_ms >= self.max_ms {
            self.min_ms
        } else {
            rng.gen_range(self.min_ms..=self.max_ms)
        };
        Duration::from_millis(ms)
    }
}

/// Identifier for a typewriter run, beat timer or request
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub u64);

impl RunId {
    /// Generate a new unique id
    pub fn new() -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::SeqCst))
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

/// Owned handle to a spawned task. Dropping it aborts the task.
#[derive(Debug)]
pub struct TaskHandle {
    handle: JoinHandle<()>,
}

impl TaskHandle {
    /// Wrap a spawned task
    #[must_use]
    pub fn new(handle: JoinHandle<()>) -> Self {
        Self { handle }
    }

    /// Stop the task; pending ticks never fire
    pub fn cancel(&self) {
        self.handle.abort();
    }

    /// Whether the task has run to completion or been aborted
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Deliver `event` on `tx` once `delay` has elapsed
pub fn schedule<E>(delay: Duration, event: E, tx: mpsc::UnboundedSender<E>) -> TaskHandle
where
    E: Send + 'static,
{
    TaskHandle::new(tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        // Receiver gone means the conductor was dropped
        let _ = tx.send(event);
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_sample_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let d = TAGLINE_REVEAL.sample(&mut rng).as_millis() as u64;
            assert!((50..=130).contains(&d), "{d} out of range");
        }
    }

    #[test]
    fn test_degenerate_range() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(
            TickRange::new(40, 40).sample(&mut rng),
            Duration::from_millis(40)
        );
        assert!(!TickRange::new(9, 3).is_valid());
    }

    #[test]
    fn test_run_id_unique() {
        assert_ne!(RunId::new(), RunId::new());
    }

    #[tokio::test(start_paused = true)]
    async fn test_schedule_fires_after_delay() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _handle = schedule(Duration::from_millis(1000), "beat", tx);

        tokio::time::sleep(Duration::from_millis(999)).await;
        assert!(rx.try_recv().is_err());

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(rx.try_recv().ok(), Some("beat"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_suppresses_event() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = schedule(Duration::from_millis(500), 1u8, tx);
        handle.cancel();

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_aborts() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        drop(schedule(Duration::from_millis(500), 1u8, tx));

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(rx.try_recv().is_err());
    }
}
