//! Process-wide logging setup on top of the observability crate.
//!
//! Lines go to [`Paths::log_file`], so `STUDIO_HOME` moves the logs along
//! with the rest of the data directory. `RUST_LOG` overrides the level and
//! `STUDIO_LOG_STDERR=1` mirrors events to stderr.

use crate::Paths;
use observability::LogConfig;
use tracing::Level;

/// Install logging for the studio client.
///
/// ```ignore
/// let config = studio_core::Config::new();
/// studio_core::init_logging(&config.log_level);
/// tracing::info!("client ready");
/// ```
pub fn init_logging(level: &str) {
    init_logging_for_service("studio-client", level);
}

pub fn init_logging_for_service(service_name: &str, level: &str) {
    observability::init_with_config(LogConfig {
        level: directive(parse_level(level)),
        file: Paths::new().ok().map(|paths| paths.log_file()),
        mirror_stderr: stderr_requested(std::env::var("STUDIO_LOG_STDERR").ok().as_deref()),
        ..LogConfig::for_service(service_name)
    });
}

/// Lenient level parsing; `warning` is accepted and anything unknown is INFO.
pub fn parse_level(level: &str) -> Level {
    let level = level.trim();
    if level.eq_ignore_ascii_case("warning") {
        return Level::WARN;
    }
    level.parse().unwrap_or(Level::INFO)
}

fn directive(level: Level) -> String {
    level.as_str().to_ascii_lowercase()
}

fn stderr_requested(flag: Option<&str>) -> bool {
    matches!(flag, Some(v) if v == "1" || v.eq_ignore_ascii_case("true"))
}
