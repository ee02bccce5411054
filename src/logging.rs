//! Global tracing subscriber setup.
//!
//! Events go to stdout either as flattened JSON lines with RFC 3339 UTC
//! timestamps or as compact human-readable text.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Output encoding of log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    /// Parse a `LOG_FORMAT` value, case-insensitively.
    ///
    /// `text` and `compact` are accepted as aliases of `pretty`. Unknown
    /// values yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "pretty" | "compact" | "text" => Some(Self::Pretty),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Pretty => "pretty",
        }
    }
}

/// Install the global subscriber. `RUST_LOG` takes precedence over `log_level`.
/// An unknown `log_format` falls back to JSON.
pub fn init(log_format: &str, log_level: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let format = LogFormat::parse(log_format);
    let registry = tracing_subscriber::registry().with(env_filter);

    match format.unwrap_or(LogFormat::Json) {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_target(true)
                    .with_timer(fmt::time::UtcTime::rfc_3339()),
            )
            .init(),
        LogFormat::Pretty => registry.with(fmt::layer().compact()).init(),
    }

    if format.is_none() {
        tracing::warn!(
            log_format,
            "Unknown log format, using json (valid: json, pretty)"
        );
    }
    tracing::debug!(
        log_format = format.unwrap_or(LogFormat::Json).as_str(),
        log_level,
        "Logging initialized"
    );
}
