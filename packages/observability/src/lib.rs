//! Tracing setup shared by every studio process.
//!
//! The library crates only emit `tracing` events. The embedding binary calls
//! [`init_with_config`] once; later calls are ignored.
//!
//! With the `dev` feature (default) events go to `~/.studio/logs/dev.jsonl`
//! as [`LogEntry`] lines, optionally mirrored to stderr. Try
//! `tail -f ~/.studio/logs/dev.jsonl | jq`. Without it a compact stderr
//! subscriber is installed.
//!
//! Credential-looking field values are replaced with `[REDACTED]`.

#[cfg(feature = "dev")]
mod dev;

mod json_layer;
mod redact;

use std::path::PathBuf;

pub use json_layer::{JsonLayer, LogEntry};
pub use redact::{is_sensitive_key, sanitize_value};

/// What a process passes to [`init_with_config`].
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Written into every line as `service`.
    pub service: String,
    /// Filter used when `RUST_LOG` is unset or invalid.
    pub level: String,
    /// Defaults to `~/.studio/logs/dev.jsonl`.
    pub file: Option<PathBuf>,
    pub mirror_stderr: bool,
}

impl LogConfig {
    pub fn for_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            level: "info".to_string(),
            file: None,
            mirror_stderr: false,
        }
    }
}

/// Install the global subscriber. Only the first call in a process wins.
pub fn init_with_config(config: LogConfig) {
    #[cfg(feature = "dev")]
    dev::init_dev_subscriber(&config);

    #[cfg(not(feature = "dev"))]
    install_stderr_only(&config.level);
}

/// Compact stderr output; also the fallback when the log file cannot open.
pub(crate) fn install_stderr_only(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}
