//! TOML Configuration File Support
//!
//! Centralized configuration loading for ArtBot, with an optional TOML file
//! at `~/.config/artbot/artbot.toml`.
//!
//! # Configuration Priority
//!
//! Configuration values are loaded with the following priority (highest first):
//! 1. CLI arguments (applied by the shell through [`ConfigOverrides`])
//! 2. Environment variables
//! 3. TOML configuration file
//! 4. Default values
//!
//! # XDG Base Directory Compliance
//!
//! - `$XDG_CONFIG_HOME/artbot/artbot.toml` (typically `~/.config/artbot/artbot.toml`)
//!
//! # Example Configuration
//!
//! ```toml
//! [service]
//! base_url = "http://localhost:8000"
//! request_timeout_ms = 120000   # 0 disables the timeout
//!
//! [timing]
//! initial_loading_ms = 1000
//! greeting_pause_ms = 500
//! mode_interstitial_ms = 1000
//! back_pause_ms = 500
//! tagline_pause_ms = 2000
//! reply_tick_min_ms = 30
//! reply_tick_max_ms = 60
//!
//! [tagline]
//! phrases = ["Hi There!! Welcome to GenArtVerse"]
//!
//! [shell]
//! dark_mode = true
//! image_dir = "/home/me/Pictures/artbot"
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::animation::{TaglineTimings, TickRange, REPLY_REVEAL};
use crate::backend::DEFAULT_BASE_URL;
use crate::conductor::{ConductorConfig, Timings};
use crate::script::DEFAULT_TAGLINES;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Tracks where a configuration value came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value from command-line argument
    Cli,
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// Service section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceToml {
    /// Generation service root URL
    pub base_url: Option<String>,

    /// Generation request timeout in milliseconds (0 = no timeout)
    pub request_timeout_ms: Option<u64>,
}

/// Timing section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingToml {
    /// Loading screen shown on first open
    pub initial_loading_ms: Option<u64>,

    /// Pause between "Hello" and the mode question
    pub greeting_pause_ms: Option<u64>,

    /// Loading interstitial after a mode is chosen
    pub mode_interstitial_ms: Option<u64>,

    /// Pause before "Hello again" after going back
    pub back_pause_ms: Option<u64>,

    /// Hold time of a fully shown tagline phrase
    pub tagline_pause_ms: Option<u64>,

    /// Fastest reply character tick
    pub reply_tick_min_ms: Option<u64>,

    /// Slowest reply character tick
    pub reply_tick_max_ms: Option<u64>,
}

/// Tagline section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TaglineToml {
    /// Phrases cycled in the background (empty disables the looper)
    pub phrases: Option<Vec<String>>,
}

/// Shell section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellToml {
    /// Start in dark mode
    pub dark_mode: Option<bool>,

    /// Where generated images are written
    pub image_dir: Option<PathBuf>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtbotToml {
    /// Service configuration section
    pub service: ServiceToml,

    /// Timing configuration section
    pub timing: TimingToml,

    /// Tagline configuration section
    pub tagline: TaglineToml,

    /// Shell configuration section
    pub shell: ShellToml,
}

// =============================================================================
// Main Configuration Struct
// =============================================================================

/// Effective configuration after all layers are applied
#[derive(Clone, Debug)]
pub struct ArtbotConfig {
    /// Generation service root URL
    pub base_url: String,

    /// Generation request timeout in milliseconds (0 = none)
    pub request_timeout_ms: u64,

    /// Conversation beat delays
    pub timings: Timings,

    /// Tagline hold time
    pub tagline_pause: Duration,

    /// Background phrases
    pub tagline_phrases: Vec<String>,

    /// Start in dark mode
    pub dark_mode: bool,

    /// Where generated images are written
    pub image_dir: PathBuf,

    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,

    /// Source of configuration values
    source: ConfigSource,
}

/// Default generation request timeout
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 120_000;

impl Default for ArtbotConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            timings: Timings::default(),
            tagline_pause: TaglineTimings::default().pause,
            tagline_phrases: DEFAULT_TAGLINES.iter().map(|s| (*s).to_string()).collect(),
            dark_mode: false,
            image_dir: default_image_dir(),
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl ArtbotConfig {
    /// Create a new configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the primary source of this configuration
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Request timeout, `None` when disabled
    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_ms > 0).then(|| Duration::from_millis(self.request_timeout_ms))
    }

    /// Conductor settings derived from this configuration
    #[must_use]
    pub fn conductor_config(&self) -> ConductorConfig {
        ConductorConfig {
            timings: self.timings,
            tagline_phrases: self.tagline_phrases.clone(),
            tagline_timings: TaglineTimings {
                pause: self.tagline_pause,
                ..TaglineTimings::default()
            },
            request_timeout: self.request_timeout(),
        }
    }

    /// Check values that cannot be represented as "invalid" by their types
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] for an empty base URL or an
    /// inverted reply tick range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "service base_url must not be empty".to_string(),
            ));
        }
        let range = self.timings.reply_reveal;
        if !range.is_valid() {
            return Err(ConfigError::ValidationError(format!(
                "reply tick range is inverted ({} > {})",
                range.min_ms, range.max_ms
            )));
        }
        Ok(())
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/artbot/artbot.toml` or
/// `~/.config/artbot/artbot.toml` if `XDG_CONFIG_HOME` is not set.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("artbot").join("artbot.toml"))
}

/// Default directory for saved images
#[must_use]
pub fn default_image_dir() -> PathBuf {
    dirs::picture_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("artbot")
}

/// Load configuration from all sources with proper priority
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed, or if
/// the resulting values fail validation. A missing config file is not an
/// error (defaults are used).
pub fn load_config() -> Result<ArtbotConfig, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from a specific path
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read or parsed,
/// or if the resulting values fail validation.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<ArtbotConfig, ConfigError> {
    load_config_with_env(path, |key| std::env::var(key).ok())
}

/// Load configuration, reading environment values through `env`
fn load_config_with_env<F>(path: Option<PathBuf>, env: F) -> Result<ArtbotConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = ArtbotConfig::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: ArtbotToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config);
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            tracing::info!(
                path = %config_path.display(),
                "Loaded configuration from file"
            );
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    apply_env_config(&mut config, env);
    config.validate()?;

    Ok(config)
}

/// Apply TOML configuration values to the config struct
fn apply_toml_config(config: &mut ArtbotConfig, toml: &ArtbotToml) {
    // Service settings
    if let Some(ref url) = toml.service.base_url {
        config.base_url.clone_from(url);
    }
    if let Some(timeout) = toml.service.request_timeout_ms {
        config.request_timeout_ms = timeout;
    }

    // Timing settings
    let timing = &toml.timing;
    if let Some(ms) = timing.initial_loading_ms {
        config.timings.initial_loading = Duration::from_millis(ms);
    }
    if let Some(ms) = timing.greeting_pause_ms {
        config.timings.greeting_pause = Duration::from_millis(ms);
    }
    if let Some(ms) = timing.mode_interstitial_ms {
        config.timings.mode_interstitial = Duration::from_millis(ms);
    }
    if let Some(ms) = timing.back_pause_ms {
        config.timings.back_pause = Duration::from_millis(ms);
    }
    if let Some(ms) = timing.tagline_pause_ms {
        config.tagline_pause = Duration::from_millis(ms);
    }
    if timing.reply_tick_min_ms.is_some() || timing.reply_tick_max_ms.is_some() {
        config.timings.reply_reveal = TickRange::new(
            timing.reply_tick_min_ms.unwrap_or(REPLY_REVEAL.min_ms),
            timing.reply_tick_max_ms.unwrap_or(REPLY_REVEAL.max_ms),
        );
    }

    // Tagline settings
    if let Some(ref phrases) = toml.tagline.phrases {
        config.tagline_phrases.clone_from(phrases);
    }

    // Shell settings
    if let Some(dark) = toml.shell.dark_mode {
        config.dark_mode = dark;
    }
    if let Some(ref dir) = toml.shell.image_dir {
        config.image_dir.clone_from(dir);
    }
}

/// Apply environment variable overrides to the config
fn apply_env_config<F>(config: &mut ArtbotConfig, env: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = env("ARTBOT_API_URL") {
        config.base_url = url;
        config.source = ConfigSource::Env;
    }
    if let Some(timeout) = env("ARTBOT_REQUEST_TIMEOUT_MS") {
        if let Ok(ms) = timeout.parse::<u64>() {
            config.request_timeout_ms = ms;
            config.source = ConfigSource::Env;
        } else {
            tracing::warn!(value = %timeout, "Ignoring non-numeric ARTBOT_REQUEST_TIMEOUT_MS");
        }
    }
    if let Some(dark) = env("ARTBOT_DARK_MODE") {
        config.dark_mode = dark == "1" || dark.eq_ignore_ascii_case("true");
        config.source = ConfigSource::Env;
    }
    if let Some(dir) = env("ARTBOT_IMAGE_DIR") {
        config.image_dir = PathBuf::from(dir);
        config.source = ConfigSource::Env;
    }
}

// =============================================================================
// CLI Override Support
// =============================================================================

/// Builder for applying CLI overrides to configuration
///
/// Use this after [`load_config`] to apply command-line argument overrides.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Service URL override
    pub api_url: Option<String>,

    /// Request timeout override (milliseconds)
    pub request_timeout_ms: Option<u64>,

    /// Dark mode override
    pub dark_mode: Option<bool>,

    /// Image directory override
    pub image_dir: Option<PathBuf>,
}

impl ConfigOverrides {
    /// Create a new empty set of overrides
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set service URL override
    #[must_use]
    pub fn with_api_url(mut self, url: String) -> Self {
        self.api_url = Some(url);
        self
    }

    /// Set request timeout override
    #[must_use]
    pub fn with_request_timeout_ms(mut self, ms: u64) -> Self {
        self.request_timeout_ms = Some(ms);
        self
    }

    /// Set dark mode override
    #[must_use]
    pub fn with_dark_mode(mut self, dark: bool) -> Self {
        self.dark_mode = Some(dark);
        self
    }

    /// Set image directory override
    #[must_use]
    pub fn with_image_dir(mut self, dir: PathBuf) -> Self {
        self.image_dir = Some(dir);
        self
    }

    /// Apply overrides to a configuration
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] if an override produces an
    /// invalid configuration (e.g. an empty URL).
    pub fn apply(&self, config: &mut ArtbotConfig) -> Result<(), ConfigError> {
        if self.api_url.is_some()
            || self.request_timeout_ms.is_some()
            || self.dark_mode.is_some()
            || self.image_dir.is_some()
        {
            config.source = ConfigSource::Cli;
        }

        if let Some(ref url) = self.api_url {
            config.base_url.clone_from(url);
        }
        if let Some(ms) = self.request_timeout_ms {
            config.request_timeout_ms = ms;
        }
        if let Some(dark) = self.dark_mode {
            config.dark_mode = dark;
        }
        if let Some(ref dir) = self.image_dir {
            config.image_dir.clone_from(dir);
        }

        config.validate()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn write_toml(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    // =========================================================================
    // Default Configuration Tests
    // =========================================================================

    #[test]
    fn test_default_config() {
        let config = ArtbotConfig::default();

        assert_eq!(config.base_url, "http://localhost:8000");
        assert_eq!(config.request_timeout_ms, 120_000);
        assert_eq!(config.timings.initial_loading, Duration::from_millis(1000));
        assert_eq!(config.timings.greeting_pause, Duration::from_millis(500));
        assert_eq!(config.timings.mode_interstitial, Duration::from_millis(1000));
        assert_eq!(config.timings.back_pause, Duration::from_millis(500));
        assert_eq!(config.tagline_pause, Duration::from_millis(2000));
        assert_eq!(config.tagline_phrases.len(), 4);
        assert!(!config.dark_mode);
        assert_eq!(config.source(), ConfigSource::Default);
    }

    #[test]
    fn test_request_timeout_zero_disables() {
        let mut config = ArtbotConfig::default();
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(120)));

        config.request_timeout_ms = 0;
        assert_eq!(config.request_timeout(), None);
        assert_eq!(config.conductor_config().request_timeout, None);
    }

    // =========================================================================
    // TOML Parsing Tests
    // =========================================================================

    #[test]
    fn test_parse_full_toml() {
        let file = write_toml(
            r#"
[service]
base_url = "http://gen.local:9000"
request_timeout_ms = 5000

[timing]
initial_loading_ms = 10
greeting_pause_ms = 20
mode_interstitial_ms = 30
back_pause_ms = 40
tagline_pause_ms = 50
reply_tick_min_ms = 1
reply_tick_max_ms = 2

[tagline]
phrases = ["one", "two"]

[shell]
dark_mode = true
image_dir = "/tmp/artbot-images"
"#,
        );

        let config = load_config_with_env(Some(file.path().to_path_buf()), no_env).unwrap();

        assert_eq!(config.base_url, "http://gen.local:9000");
        assert_eq!(config.request_timeout_ms, 5000);
        assert_eq!(config.timings.initial_loading, Duration::from_millis(10));
        assert_eq!(config.timings.greeting_pause, Duration::from_millis(20));
        assert_eq!(config.timings.mode_interstitial, Duration::from_millis(30));
        assert_eq!(config.timings.back_pause, Duration::from_millis(40));
        assert_eq!(config.tagline_pause, Duration::from_millis(50));
        assert_eq!(config.timings.reply_reveal, TickRange::new(1, 2));
        assert_eq!(config.tagline_phrases, vec!["one", "two"]);
        assert!(config.dark_mode);
        assert_eq!(config.image_dir, PathBuf::from("/tmp/artbot-images"));
        assert_eq!(config.source(), ConfigSource::File);
        assert_eq!(config.config_file_path, Some(file.path().to_path_buf()));
    }

    #[test]
    fn test_parse_partial_toml() {
        let file = write_toml(
            r#"
[service]
request_timeout_ms = 0
"#,
        );

        let config = load_config_with_env(Some(file.path().to_path_buf()), no_env).unwrap();

        assert_eq!(config.request_timeout(), None);
        assert_eq!(config.base_url, "http://localhost:8000");
        assert_eq!(config.tagline_phrases.len(), 4);
    }

    #[test]
    fn test_empty_phrase_list_is_allowed() {
        let file = write_toml("[tagline]\nphrases = []\n");
        let config = load_config_with_env(Some(file.path().to_path_buf()), no_env).unwrap();
        assert!(config.tagline_phrases.is_empty());
    }

    #[test]
    fn test_missing_file_graceful() {
        let path = PathBuf::from("/nonexistent/path/artbot.toml");
        let config = load_config_with_env(Some(path), no_env).unwrap();

        assert_eq!(config.source(), ConfigSource::Default);
        assert!(config.config_file_path.is_none());
    }

    #[test]
    fn test_malformed_toml_error() {
        let file = write_toml("[service\nbase_url = 3\n");

        let result = load_config_with_env(Some(file.path().to_path_buf()), no_env);
        assert!(matches!(result.unwrap_err(), ConfigError::ParseError(_)));
    }

    #[test]
    fn test_inverted_tick_range_rejected() {
        let file = write_toml("[timing]\nreply_tick_min_ms = 90\nreply_tick_max_ms = 10\n");

        let result = load_config_with_env(Some(file.path().to_path_buf()), no_env);
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::ValidationError(_)
        ));
    }

    // =========================================================================
    // Priority Ordering Tests
    // =========================================================================

    #[test]
    fn test_env_overrides_file() {
        let file = write_toml(
            r#"
[service]
base_url = "http://file:1"
request_timeout_ms = 10

[shell]
dark_mode = false
"#,
        );
        let env: HashMap<&str, &str> = [
            ("ARTBOT_API_URL", "http://env:2"),
            ("ARTBOT_REQUEST_TIMEOUT_MS", "20"),
            ("ARTBOT_DARK_MODE", "true"),
            ("ARTBOT_IMAGE_DIR", "/tmp/env-images"),
        ]
        .into_iter()
        .collect();

        let config = load_config_with_env(Some(file.path().to_path_buf()), |key| {
            env.get(key).map(|v| (*v).to_string())
        })
        .unwrap();

        assert_eq!(config.base_url, "http://env:2");
        assert_eq!(config.request_timeout_ms, 20);
        assert!(config.dark_mode);
        assert_eq!(config.image_dir, PathBuf::from("/tmp/env-images"));
        assert_eq!(config.source(), ConfigSource::Env);
    }

    #[test]
    fn test_bad_env_timeout_ignored() {
        let config = load_config_with_env(None, |key| {
            (key == "ARTBOT_REQUEST_TIMEOUT_MS").then(|| "soon".to_string())
        })
        .unwrap();
        assert_eq!(config.request_timeout_ms, 120_000);
        assert_eq!(config.source(), ConfigSource::Default);
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = ArtbotConfig::default();
        ConfigOverrides::new()
            .with_api_url("http://cli:3".to_string())
            .with_request_timeout_ms(7)
            .with_dark_mode(true)
            .with_image_dir(PathBuf::from("/tmp/cli"))
            .apply(&mut config)
            .unwrap();

        assert_eq!(config.base_url, "http://cli:3");
        assert_eq!(config.request_timeout_ms, 7);
        assert!(config.dark_mode);
        assert_eq!(config.image_dir, PathBuf::from("/tmp/cli"));
        assert_eq!(config.source(), ConfigSource::Cli);
    }

    #[test]
    fn test_empty_overrides_keep_source() {
        let mut config = ArtbotConfig::default();
        ConfigOverrides::new().apply(&mut config).unwrap();
        assert_eq!(config.source(), ConfigSource::Default);
    }

    #[test]
    fn test_empty_url_override_rejected() {
        let mut config = ArtbotConfig::default();
        let result = ConfigOverrides::new()
            .with_api_url("  ".to_string())
            .apply(&mut config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_config_source_display() {
        assert_eq!(ConfigSource::Cli.to_string(), "CLI");
        assert_eq!(ConfigSource::Env.to_string(), "environment");
        assert_eq!(ConfigSource::File.to_string(), "config file");
        assert_eq!(ConfigSource::Default.to_string(), "default");
    }
}
