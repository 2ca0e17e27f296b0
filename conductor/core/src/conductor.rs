//! Conductor - The Conversation Core
//!
//! The Conductor is the "brain" of ArtBot. It owns the session and
//! orchestrates:
//! - the conversation state machine (greeting, mode choice, prompting)
//! - the foreground typewriter and the timed conversation beats
//! - the background tagline looper
//! - generation and voice transcription requests
//! - communication with the widget shell
//!
//! # Design Philosophy
//!
//! The Conductor is UI-agnostic. It communicates through:
//! - `SurfaceEvent`: visitor intents received FROM the shell
//! - `ConductorMessage`: changes sent TO the shell
//!
//! Everything asynchronous (timers, typewriter ticks, service calls) runs on
//! spawned tasks that report back on an internal channel. Those reports are
//! applied one at a time by [`Conductor::poll_internal`] or
//! [`Conductor::step`], so session state is only ever touched from the
//! caller's task. Each report carries the id of the run, timer or request
//! that produced it; reports from anything that has since been cancelled or
//! replaced are ignored.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::animation::{
    schedule, RunId, TaglineLooper, TaglineTimings, TaskHandle, TickRange, Typewriter,
    TypewriterEvent, TypewriterHandle, FRAME_HEADROOM, REPLY_REVEAL,
};
use crate::backend::{BackendError, GenerationBackend, GenerationOutput, TranscriptionBackend};
use crate::config::DEFAULT_REQUEST_TIMEOUT_MS;
use crate::events::SurfaceEvent;
use crate::generation::{generate_with_timeout, GenerationOrchestrator, RequestId, SubmitError};
use crate::messages::ConductorMessage;
use crate::script::{self, Line, DEFAULT_TAGLINES};
use crate::session::{Mode, Session, SessionPhase};
use crate::transcript::ChatMessage;

/// Delays of the scripted conversation beats
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timings {
    /// Loading screen on first open
    pub initial_loading: Duration,
    /// Pause between "Hello" and the mode question
    pub greeting_pause: Duration,
    /// Loading interstitial after a mode is chosen
    pub mode_interstitial: Duration,
    /// Pause before "Hello again" after going back
    pub back_pause: Duration,
    /// Per-character reveal speed for bot replies
    pub reply_reveal: TickRange,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            initial_loading: Duration::from_millis(1000),
            greeting_pause: Duration::from_millis(500),
            mode_interstitial: Duration::from_millis(1000),
            back_pause: Duration::from_millis(500),
            reply_reveal: REPLY_REVEAL,
        }
    }
}

/// Conductor configuration
#[derive(Clone, Debug)]
pub struct ConductorConfig {
    /// Conversation beat delays
    pub timings: Timings,
    /// Background phrases (empty disables the looper)
    pub tagline_phrases: Vec<String>,
    /// Background looper speeds
    pub tagline_timings: TaglineTimings,
    /// Generation request timeout (`None` waits forever)
    pub request_timeout: Option<Duration>,
}

impl Default for ConductorConfig {
    fn default() -> Self {
        Self {
            timings: Timings::default(),
            tagline_phrases: DEFAULT_TAGLINES.iter().map(|s| (*s).to_string()).collect(),
            tagline_timings: TaglineTimings::default(),
            request_timeout: Some(Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS)),
        }
    }
}

/// Reports from spawned tasks back to the Conductor
#[derive(Debug)]
enum InternalEvent {
    /// A scheduled beat came due
    BeatFired { id: RunId },
    /// Foreground typewriter progress
    Typewriter(TypewriterEvent),
    /// A generation request settled
    GenerationSettled {
        id: RequestId,
        outcome: Result<GenerationOutput, BackendError>,
    },
    /// A transcription settled
    TranscriptionSettled {
        id: RunId,
        result: Result<String, BackendError>,
    },
}

impl From<TypewriterEvent> for InternalEvent {
    fn from(event: TypewriterEvent) -> Self {
        Self::Typewriter(event)
    }
}

/// What a scheduled beat does when it fires
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Beat {
    /// First-open loading screen is over; say hello
    InitialLoadingDone,
    /// Mode interstitial is over; record the mode and ask for a prompt
    ModeInterstitialDone(Mode),
    /// Type a line
    Type(Line),
}

impl Beat {
    fn shows_loading(self) -> bool {
        matches!(self, Self::InitialLoadingDone | Self::ModeInterstitialDone(_))
    }
}

struct PendingBeat {
    id: RunId,
    beat: Beat,
    delay: Duration,
    _task: TaskHandle,
}

struct ActiveLine {
    line: Line,
    handle: TypewriterHandle,
}

/// Work cut short by closing the window, replayed on reopen
#[derive(Clone, Copy, Debug)]
enum Interrupted {
    Beat(Beat, Duration),
    Line(Line),
}

/// The Conductor - headless conversation core
pub struct Conductor<B> {
    /// Configuration
    config: ConductorConfig,
    /// Generation and transcription backend
    backend: Arc<B>,
    /// The live conversation
    session: Session,
    /// In-flight request bookkeeping
    orchestrator: GenerationOrchestrator,
    /// Channel to send messages to the shell
    tx: mpsc::Sender<ConductorMessage>,
    /// Reports from spawned tasks
    internal_tx: mpsc::UnboundedSender<InternalEvent>,
    internal_rx: mpsc::UnboundedReceiver<InternalEvent>,
    /// Whether the widget is mounted
    mounted: bool,
    /// Whether the one-time loading screen has been shown this mount
    greeted: bool,
    /// Foreground typewriter run
    typewriter: Option<ActiveLine>,
    /// Next conversation beat
    pending_beat: Option<PendingBeat>,
    /// Work to replay on reopen
    interrupted: Option<Interrupted>,
    /// Background looper
    tagline: Option<TaglineLooper>,
    /// Task running the in-flight generation request
    request_task: Option<TaskHandle>,
    /// Task running the in-flight transcription
    transcription: Option<(RunId, TaskHandle)>,
}

impl<B> Conductor<B>
where
    B: GenerationBackend + TranscriptionBackend + 'static,
{
    /// Create a new Conductor with the given backend
    pub fn new(backend: B, config: ConductorConfig, tx: mpsc::Sender<ConductorMessage>) -> Self {
        let (internal_tx, internal_rx) = mpsc::unbounded_channel();
        Self {
            config,
            backend: Arc::new(backend),
            session: Session::new(),
            orchestrator: GenerationOrchestrator::new(),
            tx,
            internal_tx,
            internal_rx,
            mounted: false,
            greeted: false,
            typewriter: None,
            pending_beat: None,
            interrupted: None,
            tagline: None,
            request_task: None,
            transcription: None,
        }
    }

    /// The live session
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Current phase
    pub fn phase(&self) -> SessionPhase {
        self.session.phase
    }

    /// Whether the widget is mounted
    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Whether a foreground typewriter run is active
    pub fn typing_active(&self) -> bool {
        self.typewriter.is_some()
    }

    /// Whether a generation request is in flight
    pub fn generation_in_flight(&self) -> bool {
        self.orchestrator.is_busy()
    }

    /// Whether a voice recording is in progress
    pub fn recording(&self) -> bool {
        self.transcription.is_some()
    }

    /// Whether the background looper is running
    pub fn tagline_running(&self) -> bool {
        self.tagline.as_ref().is_some_and(TaglineLooper::is_running)
    }

    /// Mount the widget: start the tagline and report the closed window
    pub async fn start(&mut self) -> anyhow::Result<()> {
        if self.mounted {
            return Ok(());
        }
        self.mounted = true;
        self.greeted = false;
        self.session = Session::new();
        self.tagline = Some(TaglineLooper::spawn(
            self.config.tagline_phrases.clone(),
            self.config.tagline_timings,
            self.tx.clone(),
        ));

        tracing::info!(backend = %self.backend.name(), "Widget mounted");
        self.send(ConductorMessage::State {
            phase: self.session.phase,
        })
        .await;
        self.send(ConductorMessage::Visibility { open: false }).await;
        Ok(())
    }

    /// Handle an intent from the shell
    pub async fn handle_event(&mut self, event: SurfaceEvent) -> anyhow::Result<()> {
        if !self.mounted {
            tracing::debug!(event = event.name(), "Ignoring event while unmounted");
            return Ok(());
        }
        let open_only = !matches!(event, SurfaceEvent::Toggle | SurfaceEvent::Unmount);
        if open_only && !self.session.open {
            tracing::debug!(event = event.name(), "Ignoring event while window is closed");
            return Ok(());
        }

        match event {
            SurfaceEvent::Toggle => {
                if self.session.open {
                    self.close().await;
                } else {
                    self.open().await;
                }
            }

            SurfaceEvent::Unmount => self.unmount().await,

            SurfaceEvent::ModeChosen { mode } => self.choose_mode(mode).await,

            SurfaceEvent::DraftEdited { text } => {
                self.session.draft_prompt.clone_from(&text);
                self.send(ConductorMessage::Draft { text }).await;
            }

            SurfaceEvent::EnterPressed { shift: true } => {
                self.session.draft_prompt.push('\n');
                self.send(ConductorMessage::Draft {
                    text: self.session.draft_prompt.clone(),
                })
                .await;
            }

            SurfaceEvent::EnterPressed { shift: false } | SurfaceEvent::Submit => {
                self.submit().await;
            }

            SurfaceEvent::Back => self.back().await,

            SurfaceEvent::VoiceInput => self.start_voice_input().await,
        }

        Ok(())
    }

    /// Apply every report already queued by spawned tasks, without waiting.
    ///
    /// Returns the number of reports applied.
    pub async fn poll_internal(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.internal_rx.try_recv() {
            self.process_internal(event).await;
            applied += 1;
        }
        applied
    }

    /// Wait for the next report from a spawned task and apply it
    pub async fn step(&mut self) {
        if let Some(event) = self.internal_rx.recv().await {
            self.process_internal(event).await;
        }
    }

    // ------------------------------------------------------------------
    // Window
    // ------------------------------------------------------------------

    async fn open(&mut self) {
        self.session.show();
        self.send(ConductorMessage::Visibility { open: true }).await;

        if !self.greeted {
            self.greeted = true;
            self.set_phase(SessionPhase::Greeting).await;
            self.send(ConductorMessage::Loading { visible: true }).await;
            self.schedule_beat(Beat::InitialLoadingDone, self.config.timings.initial_loading);
            tracing::info!("Widget opened for the first time");
            return;
        }

        self.send(ConductorMessage::State {
            phase: self.session.phase,
        })
        .await;

        match self.interrupted.take() {
            Some(Interrupted::Line(line)) => self.start_line(line).await,
            Some(Interrupted::Beat(beat, delay)) => {
                if beat.shows_loading() {
                    self.send(ConductorMessage::Loading { visible: true }).await;
                }
                self.schedule_beat(beat, delay);
            }
            None => {}
        }
    }

    async fn close(&mut self) {
        if let Some(active) = self.typewriter.take() {
            active.handle.cancel();
            self.interrupted = Some(Interrupted::Line(active.line));
            self.send(ConductorMessage::TypingStopped).await;
        }
        if let Some(pending) = self.pending_beat.take() {
            if pending.beat.shows_loading() {
                self.send(ConductorMessage::Loading { visible: false }).await;
            }
            self.interrupted = Some(Interrupted::Beat(pending.beat, pending.delay));
        }

        self.session.hide();
        self.send(ConductorMessage::Visibility { open: false }).await;
        self.send(ConductorMessage::State {
            phase: self.session.phase,
        })
        .await;
    }

    async fn unmount(&mut self) {
        if let Some(mut tagline) = self.tagline.take() {
            tagline.cancel();
        }
        if let Some(active) = self.typewriter.take() {
            active.handle.cancel();
        }
        self.pending_beat = None;
        self.interrupted = None;
        self.request_task = None;
        self.transcription = None;
        if let Some(id) = self.orchestrator.abandon() {
            tracing::debug!(request_id = id.0, "Abandoned in-flight request on unmount");
        }
        while self.internal_rx.try_recv().is_ok() {}

        self.session = Session::new();
        self.mounted = false;
        tracing::info!("Widget unmounted");
        self.send(ConductorMessage::Unmounted).await;
    }

    // ------------------------------------------------------------------
    // Conversation
    // ------------------------------------------------------------------

    async fn choose_mode(&mut self, mode: Mode) {
        if !self.session.awaiting_mode_choice {
            tracing::debug!(%mode, "Ignoring mode choice; buttons not on offer");
            return;
        }

        self.set_mode_choice(false).await;
        self.session.log.clear();
        self.send(ConductorMessage::TranscriptCleared).await;
        self.append(ChatMessage::user(script::mode_choice_echo(mode)))
            .await;
        self.set_phase(SessionPhase::AwaitingPrompt).await;

        self.send(ConductorMessage::Loading { visible: true }).await;
        self.schedule_beat(
            Beat::ModeInterstitialDone(mode),
            self.config.timings.mode_interstitial,
        );
        tracing::info!(%mode, "Mode chosen");
    }

    async fn submit(&mut self) {
        let Some(mode) = self.session.selected_mode else {
            tracing::debug!("Ignoring submit; no mode selected");
            return;
        };

        let prompt = self.session.draft_prompt.clone();
        match self.orchestrator.begin(&mut self.session.log, mode, &prompt) {
            Err(SubmitError::RequestInProgress) => {
                tracing::debug!("Dropping duplicate submit while a request is in flight");
            }
            Err(SubmitError::EmptyPrompt) => {
                self.append(ChatMessage::bot(script::EMPTY_PROMPT)).await;
            }
            Ok(ticket) => {
                for index in [ticket.prompt_index, ticket.placeholder_index] {
                    if let Some(message) = self.session.log.get(index).cloned() {
                        self.send(ConductorMessage::MessageAppended { index, message })
                            .await;
                    }
                }
                self.set_phase(SessionPhase::Generating).await;

                let backend = Arc::clone(&self.backend);
                let timeout = self.config.request_timeout;
                let tx = self.internal_tx.clone();
                let id = ticket.id;
                let request = ticket.request;
                self.request_task = Some(TaskHandle::new(tokio::spawn(async move {
                    let outcome = generate_with_timeout(backend.as_ref(), &request, timeout).await;
                    let _ = tx.send(InternalEvent::GenerationSettled { id, outcome });
                })));
            }
        }
    }

    async fn back(&mut self) {
        if !matches!(
            self.session.phase,
            SessionPhase::AwaitingPrompt | SessionPhase::Generating
        ) {
            tracing::debug!(phase = ?self.session.phase, "Ignoring back; no mode in play");
            return;
        }

        self.stop_typing().await;
        if let Some(pending) = self.pending_beat.take() {
            if pending.beat.shows_loading() {
                self.send(ConductorMessage::Loading { visible: false }).await;
            }
        }
        if self.orchestrator.abandon().is_some() {
            self.request_task = None;
        }
        if self.transcription.take().is_some() {
            self.send(ConductorMessage::Recording { active: false }).await;
        }

        let buttons_were_visible = self.session.awaiting_mode_choice;
        self.session.reset_conversation();
        if buttons_were_visible {
            self.send(ConductorMessage::ModeChoice { visible: false })
                .await;
        }
        self.send(ConductorMessage::ModeSelected { mode: None }).await;
        self.send(ConductorMessage::Draft {
            text: String::new(),
        })
        .await;
        self.send(ConductorMessage::TranscriptCleared).await;
        self.set_phase(SessionPhase::Greeting).await;

        self.schedule_beat(Beat::Type(Line::HelloAgain), self.config.timings.back_pause);
        tracing::info!("Back to mode choice");
    }

    async fn start_voice_input(&mut self) {
        if self.session.selected_mode.is_none()
            || self.orchestrator.is_busy()
            || self.transcription.is_some()
        {
            tracing::debug!("Ignoring voice input in current state");
            return;
        }

        let id = RunId::new();
        let backend = Arc::clone(&self.backend);
        let tx = self.internal_tx.clone();
        let task = TaskHandle::new(tokio::spawn(async move {
            let result = backend.transcribe().await;
            let _ = tx.send(InternalEvent::TranscriptionSettled { id, result });
        }));
        self.transcription = Some((id, task));
        self.send(ConductorMessage::Recording { active: true }).await;
    }

    // ------------------------------------------------------------------
    // Internal events
    // ------------------------------------------------------------------

    async fn process_internal(&mut self, event: InternalEvent) {
        if !self.mounted {
            tracing::debug!("Ignoring internal event after unmount");
            return;
        }

        match event {
            InternalEvent::BeatFired { id } => {
                if self.pending_beat.as_ref().map(|p| p.id) != Some(id) {
                    tracing::debug!(beat_id = id.0, "Ignoring stale beat");
                    return;
                }
                if let Some(pending) = self.pending_beat.take() {
                    self.run_beat(pending.beat).await;
                }
            }

            InternalEvent::Typewriter(TypewriterEvent::Typing { run_id, text }) => {
                if self.is_current_run(run_id) {
                    self.send_frame(ConductorMessage::TypingFrame { text });
                }
            }

            InternalEvent::Typewriter(TypewriterEvent::Complete { run_id, text }) => {
                if !self.is_current_run(run_id) {
                    tracing::debug!(run_id = run_id.0, "Ignoring stale typewriter completion");
                    return;
                }
                if let Some(active) = self.typewriter.take() {
                    self.commit_line(active.line, text).await;
                }
            }

            InternalEvent::GenerationSettled { id, outcome } => {
                let Some(settled) = self
                    .orchestrator
                    .resolve(&mut self.session.log, id, outcome)
                else {
                    return;
                };
                self.request_task = None;
                if let Some(index) = settled.index {
                    self.send(ConductorMessage::MessageReplaced {
                        index,
                        message: settled.message,
                    })
                    .await;
                }
                self.session.draft_prompt.clear();
                self.send(ConductorMessage::Draft {
                    text: String::new(),
                })
                .await;
                self.set_phase(SessionPhase::AwaitingPrompt).await;
            }

            InternalEvent::TranscriptionSettled { id, result } => {
                if self.transcription.as_ref().map(|(current, _)| *current) != Some(id) {
                    tracing::debug!(run_id = id.0, "Ignoring stale transcription");
                    return;
                }
                self.transcription = None;
                self.send(ConductorMessage::Recording { active: false }).await;
                match result {
                    Ok(text) => {
                        self.session.draft_prompt.clone_from(&text);
                        self.send(ConductorMessage::Draft { text }).await;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Voice transcription failed");
                    }
                }
            }
        }
    }

    async fn run_beat(&mut self, beat: Beat) {
        match beat {
            Beat::InitialLoadingDone => {
                self.send(ConductorMessage::Loading { visible: false }).await;
                self.start_line(Line::Hello).await;
            }
            Beat::ModeInterstitialDone(mode) => {
                self.send(ConductorMessage::Loading { visible: false }).await;
                self.session.selected_mode = Some(mode);
                self.send(ConductorMessage::ModeSelected { mode: Some(mode) })
                    .await;
                self.start_line(Line::PromptRequest(mode)).await;
            }
            Beat::Type(line) => self.start_line(line).await,
        }
    }

    /// Commit a fully typed line and queue whatever follows it
    async fn commit_line(&mut self, line: Line, text: String) {
        self.append(ChatMessage::bot(text)).await;
        self.send(ConductorMessage::TypingStopped).await;

        match line {
            Line::Hello if self.session.log.len() == 1 => {
                self.schedule_beat(
                    Beat::Type(Line::ModeQuestion),
                    self.config.timings.greeting_pause,
                );
            }
            line if line.offers_mode_choice() => {
                self.set_mode_choice(true).await;
                self.set_phase(SessionPhase::AwaitingModeChoice).await;
            }
            _ => {}
        }
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    async fn start_line(&mut self, line: Line) {
        self.stop_typing().await;
        self.set_mode_choice(false).await;

        let handle = Typewriter::spawn(
            RunId::new(),
            line.text(),
            self.config.timings.reply_reveal,
            self.internal_tx.clone(),
        );
        self.typewriter = Some(ActiveLine { line, handle });
    }

    async fn stop_typing(&mut self) {
        if let Some(active) = self.typewriter.take() {
            active.handle.cancel();
            self.send(ConductorMessage::TypingStopped).await;
        }
    }

    fn is_current_run(&self, run_id: RunId) -> bool {
        self.typewriter
            .as_ref()
            .is_some_and(|active| active.handle.run_id() == run_id)
    }

    fn schedule_beat(&mut self, beat: Beat, delay: Duration) {
        let id = RunId::new();
        let task = schedule(delay, InternalEvent::BeatFired { id }, self.internal_tx.clone());
        self.pending_beat = Some(PendingBeat {
            id,
            beat,
            delay,
            _task: task,
        });
    }

    async fn set_mode_choice(&mut self, visible: bool) {
        if self.session.awaiting_mode_choice != visible {
            self.session.awaiting_mode_choice = visible;
            self.send(ConductorMessage::ModeChoice { visible }).await;
        }
    }

    async fn append(&mut self, message: ChatMessage) {
        let index = self.session.log.append(message.clone());
        self.send(ConductorMessage::MessageAppended { index, message })
            .await;
    }

    /// Set phase and notify the shell if the visible phase changed
    async fn set_phase(&mut self, phase: SessionPhase) {
        let before = self.session.phase;
        self.session.set_phase(phase);
        if self.session.phase != before {
            self.send(ConductorMessage::State {
                phase: self.session.phase,
            })
            .await;
        }
    }

    /// Send an animation frame; the next frame supersedes it, so drop it
    /// rather than wait when the shell is behind
    fn send_frame(&self, msg: ConductorMessage) {
        if self.tx.capacity() <= FRAME_HEADROOM {
            tracing::debug!("Surface channel nearly full; dropping typing frame");
            return;
        }
        match self.tx.try_send(msg) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::debug!("Surface channel full; dropping typing frame");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::warn!("Failed to send message to surface: channel closed");
            }
        }
    }

    /// Send a message to the shell
    async fn send(&self, msg: ConductorMessage) {
        if let Err(e) = self.tx.send(msg).await {
            tracing::warn!("Failed to send message to surface: {}", e);
        }
    }
}
