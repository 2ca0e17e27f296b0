//! Typewriter Engine
//!
//! Reveals (or erases) a string one character per tick, with each tick's
//! delay drawn independently from a [`TickRange`]. Positions count Unicode
//! scalar values, so multi-byte characters are never split.
//!
//! [`TypewriterRun`] is the pure state; it doubles as a lazy iterator of
//! [`TypewriterFrame`]s. [`Typewriter::spawn`] drives a run on the tokio
//! runtime and reports progress as [`TypewriterEvent`]s. The engine knows
//! nothing about the transcript: committing the finished text is the
//! receiver's job.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::mpsc;

use super::timing::{RunId, TaskHandle, TickRange};

/// Which way a run moves
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Adding characters
    Revealing,
    /// Removing characters
    Erasing,
}

/// One step of a run: wait `delay`, then show `text`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypewriterFrame {
    /// Time to wait before showing this frame
    pub delay: Duration,
    /// Partial text after this tick
    pub text: String,
}

/// Animation state for one piece of text
#[derive(Clone, Debug)]
pub struct TypewriterRun {
    full_text: String,
    char_count: usize,
    revealed: usize,
    direction: Direction,
    tick_range: TickRange,
    rng: StdRng,
}

impl TypewriterRun {
    /// A run that reveals `text` from nothing
    pub fn reveal(text: impl Into<String>, tick_range: TickRange) -> Self {
        let mut run = Self {
            full_text: String::new(),
            char_count: 0,
            revealed: 0,
            direction: Direction::Revealing,
            tick_range,
            rng: StdRng::from_entropy(),
        };
        run.start(text);
        run
    }

    /// A run that erases `text` from fully shown
    pub fn erase(text: impl Into<String>, tick_range: TickRange) -> Self {
        let mut run = Self::reveal(text, tick_range);
        run.direction = Direction::Erasing;
        run.revealed = run.char_count;
        run
    }

    /// Use a fixed seed for the tick jitter
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Restart revealing `text` from the first character
    pub fn start(&mut self, text: impl Into<String>) {
        self.full_text = text.into();
        self.char_count = self.full_text.chars().count();
        self.revealed = 0;
        self.direction = Direction::Revealing;
    }

    /// Move one character in the run's direction.
    ///
    /// Returns `false` when already complete.
    pub fn advance(&mut self) -> bool {
        if self.is_complete() {
            return false;
        }
        match self.direction {
            Direction::Revealing => self.revealed += 1,
            Direction::Erasing => self.revealed -= 1,
        }
        true
    }

    /// Text currently shown
    #[must_use]
    pub fn visible_text(&self) -> String {
        self.full_text.chars().take(self.revealed).collect()
    }

    /// Whether the run has reached its end
    #[must_use]
    pub fn is_complete(&self) -> bool {
        match self.direction {
            Direction::Revealing => self.revealed >= self.char_count,
            Direction::Erasing => self.revealed == 0,
        }
    }

    /// Delay before the next tick
    pub fn next_delay<R: Rng>(&self, rng: &mut R) -> Duration {
        self.tick_range.sample(rng)
    }

    /// The complete text
    #[must_use]
    pub fn full_text(&self) -> &str {
        &self.full_text
    }

    /// Characters currently shown
    #[must_use]
    pub fn revealed(&self) -> usize {
        self.revealed
    }

    /// Current direction
    #[must_use]
    pub fn direction(&self) -> Direction {
        self.direction
    }
}

impl Iterator for TypewriterRun {
    type Item = TypewriterFrame;

    fn next(&mut self) -> Option<Self::Item> {
        if self.is_complete() {
            return None;
        }
        let delay = self.tick_range.sample(&mut self.rng);
        self.advance();
        Some(TypewriterFrame {
            delay,
            text: self.visible_text(),
        })
    }
}

/// Progress reported by a spawned run
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypewriterEvent {
    /// One more character is visible
    Typing {
        /// Run that produced the frame
        run_id: RunId,
        /// Partial text
        text: String,
    },
    /// The run revealed its whole text
    Complete {
        /// Run that finished
        run_id: RunId,
        /// The full text, ready to be committed
        text: String,
    },
}

/// Handle to a spawned run. Dropping it cancels the run.
#[derive(Debug)]
pub struct TypewriterHandle {
    run_id: RunId,
    task: TaskHandle,
}

impl TypewriterHandle {
    /// Id carried by this run's events
    #[must_use]
    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    /// Stop future ticks
    pub fn cancel(&self) {
        self.task.cancel();
    }
}

/// Spawner for foreground reveal runs
pub struct Typewriter;

impl Typewriter {
    /// Reveal `text` on the runtime, sending a `Typing` event per tick and a
    /// final `Complete` event.
    pub fn spawn<E>(
        run_id: RunId,
        text: impl Into<String>,
        tick_range: TickRange,
        tx: mpsc::UnboundedSender<E>,
    ) -> TypewriterHandle
    where
        E: From<TypewriterEvent> + Send + 'static,
    {
        let run = TypewriterRun::reveal(text, tick_range);
        let task = tokio::spawn(async move {
            let full_text = run.full_text().to_string();
            for frame in run {
                tokio::time::sleep(frame.delay).await;
                let event = TypewriterEvent::Typing {
                    run_id,
                    text: frame.text,
                };
                if tx.send(event.into()).is_err() {
                    return;
                }
            }
            let _ = tx.send(
                TypewriterEvent::Complete {
                    run_id,
                    text: full_text,
                }
                .into(),
            );
        });

        TypewriterHandle {
            run_id,
            task: TaskHandle::new(task),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::timing::REPLY_REVEAL;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_reveal_frames() {
        let frames: Vec<_> = TypewriterRun::reveal("Hello", REPLY_REVEAL)
            .with_seed(3)
            .collect();
        let texts: Vec<_> = frames.iter().map(|f| f.text.as_str()).collect();

        assert_eq!(texts, vec!["H", "He", "Hel", "Hell", "Hello"]);
        for frame in &frames {
            let ms = frame.delay.as_millis() as u64;
            assert!((30..=60).contains(&ms));
        }
    }

    #[test]
    fn test_erase_reaches_zero() {
        let mut run = TypewriterRun::erase("abc", REPLY_REVEAL);
        assert_eq!(run.visible_text(), "abc");
        assert!(!run.is_complete());

        let texts: Vec<_> = run.by_ref().map(|f| f.text).collect();
        assert_eq!(texts, vec!["ab", "a", ""]);
        assert_eq!(run.revealed(), 0);
        assert!(run.is_complete());
    }

    #[test]
    fn test_multibyte_characters_are_not_split() {
        let run = TypewriterRun::reveal("Awesome 😇!", REPLY_REVEAL);
        let last = run.last().map(|f| f.text);
        assert_eq!(last.as_deref(), Some("Awesome 😇!"));

        let mut run = TypewriterRun::reveal("😇x", REPLY_REVEAL);
        run.advance();
        assert_eq!(run.visible_text(), "😇");
    }

    #[test]
    fn test_empty_text_is_complete() {
        let mut run = TypewriterRun::reveal("", REPLY_REVEAL);
        assert!(run.is_complete());
        assert!(!run.advance());
        assert!(run.next().is_none());
    }

    #[test]
    fn test_start_restarts() {
        let mut run = TypewriterRun::erase("old", REPLY_REVEAL);
        run.start("new");
        assert_eq!(run.direction(), Direction::Revealing);
        assert_eq!(run.visible_text(), "");
        assert_eq!(run.full_text(), "new");
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawned_run_reports_progress() {
        let (tx, mut rx) = mpsc::unbounded_channel::<TypewriterEvent>();
        let run_id = RunId::new();
        let _handle = Typewriter::spawn(run_id, "Hi", REPLY_REVEAL, tx);

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            let done = matches!(event, TypewriterEvent::Complete { .. });
            events.push(event);
            if done {
                break;
            }
        }

        assert_eq!(
            events,
            vec![
                TypewriterEvent::Typing {
                    run_id,
                    text: "H".to_string()
                },
                TypewriterEvent::Typing {
                    run_id,
                    text: "Hi".to_string()
                },
                TypewriterEvent::Complete {
                    run_id,
                    text: "Hi".to_string()
                },
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_run_goes_quiet() {
        let (tx, mut rx) = mpsc::unbounded_channel::<TypewriterEvent>();
        let handle = Typewriter::spawn(RunId::new(), "Hello there", REPLY_REVEAL, tx);

        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.cancel();
        while rx.try_recv().is_ok() {}

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(rx.try_recv().is_err());
    }
}
