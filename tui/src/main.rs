//! ArtBot TUI Entry Point
//!
//! Launches the terminal chat widget for the text-to-art generator.
//!
//! Usage:
//!   artbot-tui [OPTIONS]
//!
//! Options:
//!   -c, --config <FILE>            Configuration file
//!   -u, --api-url <URL>            Generation service root
//!       --request-timeout-ms <MS>  Generation timeout (0 = none)
//!       --dark                     Start with the dark palette
//!       --image-dir <DIR>          Where generated images are saved
//!
//! Logs go to `$TMPDIR/artbot-tui.log`; set `RUST_LOG` to change the level.

use std::fs::File;
use std::io;
use std::panic;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::Context;
use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use artbot_core::{load_config_from_path, ArtbotConfig, ConfigOverrides, HttpBackend};
use artbot_tui::{App, ConductorClient, ImageSaver, Theme};

/// ArtBot - chat with a bot that writes poems and paints pictures
#[derive(Parser, Debug)]
#[command(name = "artbot-tui")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short = 'c', long, env = "ARTBOT_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Generation service root URL
    #[arg(short = 'u', long, value_name = "URL")]
    api_url: Option<String>,

    /// Generation request timeout in milliseconds (0 disables it)
    #[arg(long, value_name = "MS")]
    request_timeout_ms: Option<u64>,

    /// Start with the dark palette
    #[arg(long)]
    dark: bool,

    /// Directory for generated images
    #[arg(long, value_name = "DIR")]
    image_dir: Option<PathBuf>,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        let mut overrides = ConfigOverrides::new();
        if let Some(url) = &self.api_url {
            overrides = overrides.with_api_url(url.clone());
        }
        if let Some(ms) = self.request_timeout_ms {
            overrides = overrides.with_request_timeout_ms(ms);
        }
        if self.dark {
            overrides = overrides.with_dark_mode(true);
        }
        if let Some(dir) = &self.image_dir {
            overrides = overrides.with_image_dir(dir.clone());
        }
        overrides
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Logs can't share the screen with the UI
    let log_path = std::env::temp_dir().join("artbot-tui.log");
    let log_file = File::create(&log_path)
        .with_context(|| format!("creating log file {}", log_path.display()))?;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(log_file)),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut config = load_config_from_path(args.config.clone())?;
    args.overrides().apply(&mut config)?;
    tracing::info!(
        base_url = %config.base_url,
        source = ?config.source(),
        "Configuration loaded"
    );

    // Check if we have a TTY before attempting initialization
    use std::io::IsTerminal;

    if !io::stdin().is_terminal() || !io::stdout().is_terminal() {
        eprintln!("Error: artbot-tui requires a terminal (TTY)");
        eprintln!();
        eprintln!("This usually means stdin/stdout are piped, or SSH ran without -t.");
        std::process::exit(1);
    }

    // Set up panic hook to restore terminal
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    // Initialize terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run_app(&mut terminal, &config).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    config: &ArtbotConfig,
) -> anyhow::Result<()> {
    let backend = HttpBackend::new(config.base_url.clone());
    let client = ConductorClient::new(backend, config.conductor_config());
    let mut app = App::new(
        client,
        Theme::for_mode(config.dark_mode),
        ImageSaver::new(config.image_dir.clone()),
    );
    app.run(terminal).await
}
