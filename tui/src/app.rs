//! Main Application
//!
//! The App struct manages the TUI lifecycle as a thin display client:
//! - Event loop (keyboard, resize)
//! - ConductorClient for orchestration
//! - DisplayState for rendering
//!
//! The App:
//! 1. Converts terminal events to SurfaceEvents
//! 2. Sends events to the embedded Conductor via ConductorClient
//! 3. Receives ConductorMessages and updates DisplayState
//! 4. Renders based on DisplayState

use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::StreamExt;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Layout, Margin, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::{Frame, Terminal};
use unicode_width::UnicodeWidthStr;

use artbot_core::{
    Author, ConductorMessage, GenerationBackend, GenerationResult, Mode, SurfaceEvent,
    TranscriptionBackend,
};

use crate::conductor_client::ConductorClient;
use crate::display::DisplayState;
use crate::images::ImageSaver;
use crate::theme::Theme;

/// Input box height (lines) for text wrapping
const INPUT_HEIGHT: u16 = 4;

/// Largest chat window
const WINDOW_MAX: (u16, u16) = (64, 30);

/// Frame budget
const FRAME_DURATION: Duration = Duration::from_millis(33);

/// Brand on the page behind the chat window
const BRAND: &str = "GenArtVerse";

/// Title of the first-open loading screen
const LOADING_TITLE: &str = "Text to Art Generator";

/// What a key press means for the app
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KeyAction {
    /// Forward to the Conductor
    Surface(SurfaceEvent),
    /// Switch light/dark palette
    ToggleTheme,
    /// Scroll the transcript (positive = towards older lines)
    Scroll(i32),
    /// Unmount and exit
    Quit,
    /// Nothing
    Ignore,
}

/// Translate a key press given what is currently on screen
pub fn map_key(key: KeyEvent, display: &DisplayState) -> KeyAction {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        KeyCode::Esc => return KeyAction::Quit,
        KeyCode::Char('c') if ctrl => return KeyAction::Quit,
        KeyCode::Char('o') if ctrl => return KeyAction::Surface(SurfaceEvent::Toggle),
        KeyCode::Char('t') if ctrl => return KeyAction::ToggleTheme,
        _ => {}
    }

    if !display.open {
        return KeyAction::Ignore;
    }

    match key.code {
        KeyCode::Char('b') if ctrl && display.back_available() => {
            return KeyAction::Surface(SurfaceEvent::Back)
        }
        KeyCode::Char('r') if ctrl && display.input_visible() && !display.recording => {
            return KeyAction::Surface(SurfaceEvent::VoiceInput)
        }
        KeyCode::PageUp => return KeyAction::Scroll(5),
        KeyCode::PageDown => return KeyAction::Scroll(-5),
        _ => {}
    }

    if display.mode_choice_visible {
        return match key.code {
            KeyCode::Char('1') => KeyAction::Surface(SurfaceEvent::ModeChosen { mode: Mode::Poem }),
            KeyCode::Char('2') => KeyAction::Surface(SurfaceEvent::ModeChosen {
                mode: Mode::Image,
            }),
            _ => KeyAction::Ignore,
        };
    }

    if !display.input_visible() || ctrl {
        return KeyAction::Ignore;
    }

    match key.code {
        KeyCode::Enter => {
            let shift = key
                .modifiers
                .intersects(KeyModifiers::SHIFT | KeyModifiers::ALT);
            KeyAction::Surface(SurfaceEvent::EnterPressed { shift })
        }
        KeyCode::Char(c) => {
            let mut text = display.draft.clone();
            text.push(c);
            KeyAction::Surface(SurfaceEvent::DraftEdited { text })
        }
        KeyCode::Backspace => {
            let mut text = display.draft.clone();
            if text.pop().is_none() {
                return KeyAction::Ignore;
            }
            KeyAction::Surface(SurfaceEvent::DraftEdited { text })
        }
        _ => KeyAction::Ignore,
    }
}

/// Main application state
pub struct App<B> {
    // === Core State ===
    /// Is the app still running?
    running: bool,

    // === Conductor Integration ===
    /// Client for communicating with the embedded Conductor
    conductor: ConductorClient<B>,
    /// Display state derived from ConductorMessages
    display: DisplayState,

    // === Shell-local State ===
    /// Current palette
    theme: Theme,
    /// Where image results go
    images: ImageSaver,
    /// Scroll offset (lines from bottom, 0 = latest)
    scroll_offset: usize,
    /// Total rendered transcript lines (for scroll bounds)
    total_lines: usize,
}

impl<B> App<B>
where
    B: GenerationBackend + TranscriptionBackend + 'static,
{
    /// Create a new App instance
    pub fn new(conductor: ConductorClient<B>, theme: Theme, images: ImageSaver) -> Self {
        Self {
            running: true,
            conductor,
            display: DisplayState::new(),
            theme,
            images,
            scroll_offset: 0,
            total_lines: 0,
        }
    }

    /// Current display state
    pub fn display(&self) -> &DisplayState {
        &self.display
    }

    /// Whether the event loop should keep going
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Current palette
    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// Mount the widget; the chat window stays closed until toggled
    pub async fn start(&mut self) -> anyhow::Result<()> {
        self.conductor.start().await?;
        self.pump().await;
        Ok(())
    }

    /// Main event loop
    pub async fn run(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> anyhow::Result<()> {
        let mut event_stream = EventStream::new();

        self.start().await?;
        terminal.draw(|frame| self.render(frame))?;

        while self.running {
            let frame_start = Instant::now();

            tokio::select! {
                biased;

                // Terminal events - highest priority
                maybe_event = event_stream.next() => {
                    match maybe_event {
                        Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                            self.handle_key(key).await;
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            tracing::warn!("Terminal event error: {}", e);
                        }
                        None => self.running = false,
                    }
                }

                // Frame tick
                () = tokio::time::sleep(Duration::from_millis(16)) => {}
            }

            self.pump().await;
            terminal.draw(|frame| self.render(frame))?;

            // Frame rate limiting
            let elapsed = frame_start.elapsed();
            if elapsed < FRAME_DURATION {
                tokio::time::sleep(FRAME_DURATION - elapsed).await;
            }
        }

        Ok(())
    }

    /// Apply Conductor work and fold its messages into the display
    pub async fn pump(&mut self) {
        self.conductor.poll().await;
        for msg in self.conductor.recv_all() {
            self.apply(msg).await;
        }
    }

    async fn apply(&mut self, msg: ConductorMessage) {
        let saved_image = match &msg {
            ConductorMessage::MessageAppended { index, message }
            | ConductorMessage::MessageReplaced { index, message } => match &message.result {
                Some(GenerationResult::Image(payload)) => Some((*index, payload.clone())),
                _ => None,
            },
            _ => None,
        };
        if matches!(
            msg,
            ConductorMessage::MessageAppended { .. } | ConductorMessage::TranscriptCleared
        ) {
            self.scroll_offset = 0;
        }

        self.display.apply_message(msg);

        if let Some((index, payload)) = saved_image {
            match self.images.save(&payload).await {
                Ok(Some(path)) => self.display.set_saved_path(index, path),
                Ok(None) => {}
                Err(e) => tracing::warn!("Failed to save image: {:#}", e),
            }
        }
    }

    /// Handle keyboard input
    pub async fn handle_key(&mut self, key: KeyEvent) {
        match map_key(key, &self.display) {
            KeyAction::Surface(event) => {
                if let Err(e) = self.conductor.send_event(event).await {
                    tracing::warn!("Conductor rejected event: {}", e);
                }
            }
            KeyAction::ToggleTheme => self.theme = self.theme.toggled(),
            KeyAction::Scroll(delta) => {
                let max_scroll = self.total_lines.saturating_sub(1);
                self.scroll_offset = self
                    .scroll_offset
                    .saturating_add_signed(delta as isize)
                    .min(max_scroll);
            }
            KeyAction::Quit => {
                if let Err(e) = self.conductor.unmount().await {
                    tracing::warn!("Unmount failed: {}", e);
                }
                self.pump().await;
                self.running = false;
            }
            KeyAction::Ignore => {}
        }
    }

    // ------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------

    /// Render the UI
    pub fn render(&mut self, frame: &mut Frame) {
        let area = frame.area();
        self.render_background(frame, area);

        if self.display.open {
            let window = chat_window_rect(area);
            frame.render_widget(Clear, window);
            self.render_window(frame, window);
        }
    }

    /// Brand, tagline and key hints behind the window
    fn render_background(&self, frame: &mut Frame, area: Rect) {
        let page = Block::default().style(Style::default().bg(self.theme.background));
        frame.render_widget(page, area);

        let [brand_area, tagline_area, _, hint_area] = Layout::vertical([
            Constraint::Length(2),
            Constraint::Length(2),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .areas(area);

        frame.render_widget(
            Paragraph::new(BRAND).style(self.theme.brand()),
            brand_area.inner(Margin::new(2, 0)),
        );
        frame.render_widget(
            Paragraph::new(format!("{}|", self.display.tagline))
                .style(Style::default().fg(self.theme.secondary).bg(self.theme.background)),
            tagline_area.inner(Margin::new(2, 0)),
        );

        let toggle = if self.display.open { "Ctrl+O close" } else { "Ctrl+O chat" };
        let hints = format!(" {toggle} | Ctrl+T theme | Esc quit");
        frame.render_widget(
            Paragraph::new(hints).style(Style::default().fg(self.theme.secondary_text).bg(self.theme.background)),
            hint_area,
        );
    }

    fn render_window(&mut self, frame: &mut Frame, window: Rect) {
        let input_height = if self.display.input_visible() {
            INPUT_HEIGHT
        } else {
            0
        };
        let [header, body, input] = Layout::vertical([
            Constraint::Length(2),
            Constraint::Min(3),
            Constraint::Length(input_height),
        ])
        .areas(window);

        self.render_header(frame, header);

        if self.display.loading {
            self.render_loading(frame, body);
            return;
        }

        self.render_transcript(frame, body);
        if input_height > 0 {
            self.render_input(frame, input);
        }
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let style = self.theme.header_style();
        let mut title = vec![];
        if self.display.back_available() {
            title.push(Span::styled("← Back (Ctrl+B)  ", style));
        }
        title.push(Span::styled("ArtBot", style));

        let status = if self.display.is_typing() {
            "typing..."
        } else {
            ""
        };
        let mode = if self.theme.dark { "🌙" } else { "☀️" };

        let lines = vec![
            Line::from(title),
            Line::from(vec![
                Span::styled(status, style),
                Span::styled(format!("  {mode}"), style),
            ]),
        ];
        frame.render_widget(Paragraph::new(lines).style(style), area);
    }

    fn render_loading(&self, frame: &mut Frame, area: Rect) {
        let style = self.theme.header_style();
        let mid = area.height / 2;
        let lines: Vec<Line> = (0..area.height)
            .map(|row| {
                if row == mid.saturating_sub(1) {
                    Line::from(LOADING_TITLE)
                } else if row == mid + 1 {
                    Line::from(spinner_frame())
                } else {
                    Line::default()
                }
            })
            .collect();
        frame.render_widget(
            Paragraph::new(lines)
                .alignment(Alignment::Center)
                .style(style),
            area,
        );
    }

    fn render_transcript(&mut self, frame: &mut Frame, area: Rect) {
        let width = area.width.saturating_sub(2) as usize;
        if width < 10 || area.height < 2 {
            return;
        }

        let lines = transcript_lines(&self.display, &self.theme, width);
        self.total_lines = lines.len();

        let height = area.height as usize;
        let max_scroll = self.total_lines.saturating_sub(height);
        self.scroll_offset = self.scroll_offset.min(max_scroll);

        let visible_end = self.total_lines.saturating_sub(self.scroll_offset);
        let visible_start = visible_end.saturating_sub(height);
        let visible: Vec<Line> = lines[visible_start..visible_end].to_vec();

        frame.render_widget(
            Paragraph::new(visible).block(
                Block::default()
                    .borders(Borders::LEFT | Borders::RIGHT)
                    .style(Style::default().bg(self.theme.paper)),
            ),
            area,
        );
    }

    fn render_input(&self, frame: &mut Frame, area: Rect) {
        let draft = if self.display.draft.is_empty() {
            Span::styled(self.display.input_placeholder(), self.theme.dim_style())
        } else {
            Span::styled(
                format!("{}_", self.display.draft),
                Style::default().fg(self.theme.text).bg(self.theme.paper),
            )
        };
        let mic = if self.display.recording {
            " 🎙 listening... "
        } else {
            " 🎙 Ctrl+R "
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .title(Span::styled(mic, self.theme.button_style(self.display.recording)))
            .title_bottom(Line::from(" Enter send | Shift+Enter newline ").right_aligned())
            .style(Style::default().bg(self.theme.paper));
        frame.render_widget(
            Paragraph::new(Line::from(draft))
                .block(block)
                .wrap(Wrap { trim: false }),
            area,
        );
    }
}

/// Centered window, capped at [`WINDOW_MAX`]
fn chat_window_rect(area: Rect) -> Rect {
    let width = area.width.saturating_sub(4).min(WINDOW_MAX.0);
    let height = area.height.saturating_sub(6).min(WINDOW_MAX.1);
    Rect::new(
        area.x + area.width.saturating_sub(width + 2),
        area.y + area.height.saturating_sub(height + 2),
        width,
        height,
    )
}

fn spinner_frame() -> &'static str {
    const FRAMES: [&str; 4] = ["◐", "◓", "◑", "◒"];
    let tick = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() / 150)
        .unwrap_or(0);
    FRAMES[(tick % 4) as usize]
}

/// Wrap the transcript, the typing bubble and the mode buttons into lines
pub fn transcript_lines(display: &DisplayState, theme: &Theme, width: usize) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();

    for msg in &display.messages {
        let style = if msg.is_error() {
            theme.error_style()
        } else {
            match msg.author() {
                Author::Bot => theme.bot_style(),
                Author::User => theme.user_style(),
            }
        };

        let mut text = format!("{}{}", msg.prefix(), msg.message.text);
        if msg.is_loading() {
            text.push_str(&loading_dots());
        }
        for line in textwrap::wrap(&text, width) {
            lines.push(Line::styled(line.into_owned(), style));
        }
        for line in msg.result_lines() {
            for wrapped in textwrap::wrap(&line, width.saturating_sub(2).max(1)) {
                lines.push(Line::styled(format!("  {wrapped}"), style));
            }
        }

        let time = msg.time_label();
        let pad = width.saturating_sub(time.width());
        lines.push(Line::styled(
            format!("{}{}", " ".repeat(pad), time),
            theme.dim_style(),
        ));
    }

    if let Some(partial) = &display.typing {
        let text = format!("ArtBot: {partial}");
        for line in textwrap::wrap(&text, width) {
            lines.push(Line::styled(line.into_owned(), theme.bot_style()));
        }
        lines.push(Line::default());
    }

    if display.mode_choice_visible {
        lines.push(Line::from(vec![
            Span::styled(" [1] Generate Poem ", theme.button_style(false)),
            Span::raw("  "),
            Span::styled(" [2] Generate Image ", theme.button_style(false)),
        ]));
    }

    lines
}

fn loading_dots() -> String {
    let tick = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() / 400)
        .unwrap_or(0);
    ".".repeat((tick % 3) as usize + 1)
}
