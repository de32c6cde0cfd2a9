//! Tracing subscriber configuration.
//!
//! The library crates only emit `tracing` events; applications decide where
//! they go. [`TracingConfig`] installs a `tracing-subscriber` pipeline with a
//! level, an optional target filter, and an output format.
//!
//! # Example
//!
//! ```
//! use tessera::diagnostics::{TracingConfig, TracingFormat};
//! use tracing::Level;
//!
//! // Development: pretty output with debug level
//! let dev = TracingConfig::default()
//!     .with_level(Level::DEBUG)
//!     .with_format(TracingFormat::Pretty);
//!
//! // Production: JSON output, quieter signal resolution
//! let prod = TracingConfig::default()
//!     .with_format(TracingFormat::Json)
//!     .with_env_filter("tessera_signal=warn,tessera_tool=info");
//!
//! # let _ = (dev, prod);
//! ```

use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};

/// Tracing output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TracingFormat {
    /// Human-readable colored output (default).
    #[default]
    Pretty,
    /// Compact single-line output.
    Compact,
    /// JSON structured output for log aggregation.
    Json,
}

/// Settings for the global tracing subscriber.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Maximum log level, used when no filter is given or the filter is invalid.
    pub level: Level,
    /// Output format.
    pub format: TracingFormat,
    /// Target filter (e.g., `"tessera_signal=debug,tessera_tool=warn"`).
    pub env_filter: Option<String>,
    /// Whether to include span enter/exit events.
    pub span_events: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: TracingFormat::Pretty,
            env_filter: None,
            span_events: false,
        }
    }
}

impl TracingConfig {
    /// Creates a configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum log level.
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Sets the output format.
    #[must_use]
    pub fn with_format(mut self, format: TracingFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets a target filter.
    ///
    /// Format: `target=level,target=level,...`
    #[must_use]
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Enables span enter/exit events in output.
    #[must_use]
    pub fn with_span_events(mut self, enabled: bool) -> Self {
        self.span_events = enabled;
        self
    }

    fn filter(&self) -> EnvFilter {
        match &self.env_filter {
            Some(filter) => {
                EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new(self.level.as_str()))
            }
            None => EnvFilter::new(self.level.as_str()),
        }
    }

    /// Installs the subscriber globally.
    ///
    /// # Errors
    ///
    /// Fails if a global subscriber is already installed.
    pub fn try_init(&self) -> Result<(), TryInitError> {
        let span_events = if self.span_events {
            FmtSpan::ENTER | FmtSpan::EXIT
        } else {
            FmtSpan::NONE
        };

        let registry = tracing_subscriber::registry().with(self.filter());
        match self.format {
            TracingFormat::Pretty => registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .pretty()
                        .with_span_events(span_events),
                )
                .try_init()?,
            TracingFormat::Compact => registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .compact()
                        .with_span_events(span_events),
                )
                .try_init()?,
            TracingFormat::Json => registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_span_events(span_events),
                )
                .try_init()?,
        }

        tracing::info!(level = %self.level, format = ?self.format, "tracing initialized");
        Ok(())
    }

    /// Installs the subscriber globally, leaving any existing one in place.
    ///
    /// Returns `true` if this call installed it.
    pub fn init(&self) -> bool {
        self.try_init().is_ok()
    }
}
