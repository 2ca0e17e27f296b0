//! Background Tagline Looper
//!
//! Cycles a fixed list of phrases forever: type a phrase in, hold it, erase
//! it, move to the next one. The looper is decoration only. It owns no
//! session state and publishes frames straight to the surface channel,
//! dropping a frame rather than queueing it when the surface is behind.
//! Frames never take the last [`FRAME_HEADROOM`] slots of the channel, so
//! a stalled surface can't starve the Conductor's own messages.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::mpsc::{self, error::TrySendError};

use super::timing::{TaskHandle, TickRange, TAGLINE_ERASE, TAGLINE_REVEAL};
use super::typewriter::{Direction, TypewriterRun};
use crate::messages::ConductorMessage;

/// Pause with a phrase fully shown before it is erased
pub const DEFAULT_TAGLINE_PAUSE: Duration = Duration::from_millis(2000);

/// Channel slots animation frames never take, kept for the Conductor's
/// state messages
pub const FRAME_HEADROOM: usize = 32;

/// Speeds for the looper
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TaglineTimings {
    /// Per-character reveal delay
    pub reveal: TickRange,
    /// Per-character erase delay
    pub erase: TickRange,
    /// Hold time once a phrase is fully revealed
    pub pause: Duration,
}

impl Default for TaglineTimings {
    fn default() -> Self {
        Self {
            reveal: TAGLINE_REVEAL,
            erase: TAGLINE_ERASE,
            pause: DEFAULT_TAGLINE_PAUSE,
        }
    }
}

/// Where the looper is in its cycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaglinePhase {
    /// Revealing a phrase
    Typing {
        /// Phrase position in the list
        index: usize,
        /// Characters shown
        pos: usize,
    },
    /// Holding a fully revealed phrase
    Pausing {
        /// Phrase position in the list
        index: usize,
    },
    /// Erasing a phrase
    Erasing {
        /// Phrase position in the list
        index: usize,
        /// Characters still shown
        pos: usize,
    },
}

/// Pure tagline state machine
#[derive(Clone, Debug)]
pub struct TaglineState {
    phrases: Vec<String>,
    index: usize,
    run: TypewriterRun,
    pausing: bool,
    timings: TaglineTimings,
}

impl TaglineState {
    /// Start at the first phrase. Returns `None` for an empty list.
    #[must_use]
    pub fn new(phrases: Vec<String>, timings: TaglineTimings) -> Option<Self> {
        let first = phrases.first()?.clone();
        Some(Self {
            run: TypewriterRun::reveal(first, timings.reveal),
            phrases,
            index: 0,
            pausing: false,
            timings,
        })
    }

    /// Current position in the cycle
    #[must_use]
    pub fn phase(&self) -> TaglinePhase {
        let index = self.index;
        let pos = self.run.revealed();
        if self.pausing {
            TaglinePhase::Pausing { index }
        } else {
            match self.run.direction() {
                Direction::Revealing => TaglinePhase::Typing { index, pos },
                Direction::Erasing => TaglinePhase::Erasing { index, pos },
            }
        }
    }

    /// Perform one step: returns the text to show now and how long to wait
    /// before the next step.
    pub fn step<R: Rng>(&mut self, rng: &mut R) -> (String, Duration) {
        if self.pausing {
            self.pausing = false;
            self.run = TypewriterRun::erase(self.phrases[self.index].clone(), self.timings.erase);
            return self.erase_one(rng);
        }

        match self.run.direction() {
            Direction::Revealing => {
                self.run.advance();
                let text = self.run.visible_text();
                if self.run.is_complete() {
                    self.pausing = true;
                    (text, self.timings.pause)
                } else {
                    (text, self.timings.reveal.sample(rng))
                }
            }
            Direction::Erasing => self.erase_one(rng),
        }
    }

    fn erase_one<R: Rng>(&mut self, rng: &mut R) -> (String, Duration) {
        self.run.advance();
        let text = self.run.visible_text();
        if self.run.is_complete() {
            self.index = (self.index + 1) % self.phrases.len();
            self.run = TypewriterRun::reveal(self.phrases[self.index].clone(), self.timings.reveal);
        }
        (text, self.timings.erase.sample(rng))
    }
}

/// Handle to the running looper. Dropping it stops the loop.
#[derive(Debug)]
pub struct TaglineLooper {
    task: Option<TaskHandle>,
}

impl TaglineLooper {
    /// Start cycling `phrases`, publishing `Tagline` frames on `tx`.
    ///
    /// An empty phrase list yields a looper that never publishes.
    pub fn spawn(
        phrases: Vec<String>,
        timings: TaglineTimings,
        tx: mpsc::Sender<ConductorMessage>,
    ) -> Self {
        let Some(mut state) = TaglineState::new(phrases, timings) else {
            tracing::debug!("No tagline phrases configured; looper disabled");
            return Self { task: None };
        };

        let task = tokio::spawn(async move {
            let mut rng = StdRng::from_entropy();
            loop {
                let (text, delay) = state.step(&mut rng);
                if tx.is_closed() {
                    return;
                }
                if tx.capacity() > FRAME_HEADROOM {
                    match tx.try_send(ConductorMessage::Tagline { text }) {
                        Ok(()) | Err(TrySendError::Full(_)) => {}
                        Err(TrySendError::Closed(_)) => return,
                    }
                }
                tokio::time::sleep(delay).await;
            }
        });

        Self {
            task: Some(TaskHandle::new(task)),
        }
    }

    /// Stop the loop; no further frames are published
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.cancel();
        }
    }

    /// Whether frames are still being produced
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn phrases(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_full_cycle() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut state = TaglineState::new(phrases(&["ab", "c"]), TaglineTimings::default())
            .unwrap();

        let mut shown = Vec::new();
        let mut pause_seen = false;
        for _ in 0..8 {
            let (text, delay) = state.step(&mut rng);
            if delay == DEFAULT_TAGLINE_PAUSE {
                pause_seen = true;
            }
            shown.push(text);
        }

        // "ab" in, held, out; then "c" in, held, out; wraps to "ab"
        assert_eq!(shown, vec!["a", "ab", "a", "", "c", "", "a", "ab"]);
        assert!(pause_seen);
        assert_eq!(state.phase(), TaglinePhase::Pausing { index: 0 });
    }

    #[test]
    fn test_erase_finishes_before_advancing() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut state =
            TaglineState::new(phrases(&["xyz", "next"]), TaglineTimings::default()).unwrap();

        for _ in 0..3 {
            state.step(&mut rng);
        }
        assert_eq!(state.phase(), TaglinePhase::Pausing { index: 0 });

        state.step(&mut rng);
        assert_eq!(state.phase(), TaglinePhase::Erasing { index: 0, pos: 2 });
        state.step(&mut rng);
        let (text, _) = state.step(&mut rng);
        assert_eq!(text, "");
        assert_eq!(state.phase(), TaglinePhase::Typing { index: 1, pos: 0 });
    }

    #[test]
    fn test_delays_follow_direction() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut state =
            TaglineState::new(phrases(&["hello"]), TaglineTimings::default()).unwrap();

        let (_, first) = state.step(&mut rng);
        assert!((50..=130).contains(&(first.as_millis() as u64)));

        for _ in 0..4 {
            state.step(&mut rng);
        }
        let (_, erase) = state.step(&mut rng);
        assert!((30..=80).contains(&(erase.as_millis() as u64)));
    }

    #[test]
    fn test_empty_phrase_list_disables() {
        assert!(TaglineState::new(Vec::new(), TaglineTimings::default()).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_looper_publishes_frames() {
        let (tx, mut rx) = mpsc::channel(64);
        let looper = TaglineLooper::spawn(phrases(&["Hi"]), TaglineTimings::default(), tx);

        let first = rx.recv().await;
        let second = rx.recv().await;
        assert!(matches!(first, Some(ConductorMessage::Tagline { ref text }) if text == "H"));
        assert!(matches!(second, Some(ConductorMessage::Tagline { ref text }) if text == "Hi"));
        assert!(looper.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_looper_is_silent() {
        let (tx, mut rx) = mpsc::channel(64);
        let mut looper = TaglineLooper::spawn(phrases(&["Hi"]), TaglineTimings::default(), tx);

        let _ = rx.recv().await;
        looper.cancel();
        while rx.try_recv().is_ok() {}

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(rx.try_recv().is_err());
        assert!(!looper.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_channel_drops_frames() {
        let (tx, mut rx) = mpsc::channel(FRAME_HEADROOM + 1);
        let _looper = TaglineLooper::spawn(phrases(&["abcdef"]), TaglineTimings::default(), tx);

        tokio::time::sleep(Duration::from_secs(1)).await;
        // Only the first frame fit; later ones were dropped, not queued
        assert!(matches!(rx.try_recv(), Ok(ConductorMessage::Tagline { ref text }) if text == "a"));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_undrained_channel_keeps_headroom() {
        let (tx, _rx) = mpsc::channel(FRAME_HEADROOM + 10);
        let spare_tx = tx.clone();
        let _looper = TaglineLooper::spawn(phrases(&["abcdef"]), TaglineTimings::default(), tx);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(spare_tx.capacity(), FRAME_HEADROOM);
    }
}
