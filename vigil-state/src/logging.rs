//! Opt-in log output
//!
//! Nothing here runs unless the application asks for it: the SDK itself
//! only emits `tracing` events. Call one initialiser once, before the
//! session is restored, to see them.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

pub const LOG_MODE_VAR: &str = "VIGIL_LOG_MODE";
pub const LOG_LEVEL_VAR: &str = "VIGIL_LOG_LEVEL";

type OutputLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Where log output goes and how it looks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggingMode {
    /// No subscriber is installed
    Silent,
    /// One compact line per event on stderr, `info` and up
    Development,
    /// Multi-line events with thread ids and source locations, `debug` and up
    Debug,
    /// Newline-delimited JSON, `info` and up
    Json,
}

impl LoggingMode {
    /// Mode named by a `VIGIL_LOG_MODE` value; unknown names mean silent
    pub fn from_env_value(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => LoggingMode::Development,
            "debug" => LoggingMode::Debug,
            "json" => LoggingMode::Json,
            _ => LoggingMode::Silent,
        }
    }

    fn default_level(self) -> &'static str {
        match self {
            LoggingMode::Debug => "debug",
            _ => "info",
        }
    }

    fn output_layer(self) -> Option<OutputLayer> {
        let layer: OutputLayer = match self {
            LoggingMode::Silent => return None,
            LoggingMode::Development => Box::new(fmt::layer().with_target(false).compact()),
            LoggingMode::Debug => Box::new(
                fmt::layer()
                    .pretty()
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true),
            ),
            LoggingMode::Json => Box::new(fmt::layer().json().with_current_span(false)),
        };
        Some(layer)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Failed to initialize tracing subscriber: {0}")]
    TracingInit(String),

    #[error("Invalid log filter '{directives}': {reason}")]
    InvalidFilter { directives: String, reason: String },
}

/// Install a global subscriber for `mode`
///
/// The level filter comes from `VIGIL_LOG_LEVEL`, else `RUST_LOG`, else the
/// mode's default. Fails if a subscriber is already installed.
///
/// ```rust,ignore
/// vigil_state::init_logging(LoggingMode::Development)?;
/// ```
pub fn init_logging(mode: LoggingMode) -> Result<(), LoggingError> {
    let Some(output) = mode.output_layer() else {
        return Ok(());
    };
    let filter = level_filter(mode.default_level(), |key| std::env::var(key).ok())?;

    Registry::default()
        .with(output)
        .with(filter)
        .try_init()
        .map_err(|e| LoggingError::TracingInit(e.to_string()))
}

/// [`init_logging`] with the mode read from `VIGIL_LOG_MODE`
pub fn init_logging_from_env() -> Result<(), LoggingError> {
    let mode = std::env::var(LOG_MODE_VAR)
        .map(|value| LoggingMode::from_env_value(&value))
        .unwrap_or(LoggingMode::Silent);
    init_logging(mode)
}

fn level_filter(default_level: &str, lookup: impl Fn(&str) -> Option<String>) -> Result<EnvFilter, LoggingError> {
    let directives = lookup(LOG_LEVEL_VAR)
        .or_else(|| lookup("RUST_LOG"))
        .unwrap_or_else(|| default_level.to_string());

    EnvFilter::try_new(&directives).map_err(|e| LoggingError::InvalidFilter {
        reason: e.to_string(),
        directives,
    })
}
