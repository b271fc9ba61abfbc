//! Client configuration.

use crate::{CoreResult, Paths};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default PostgREST endpoint root (compile-time `STUDIO_REST_URL`).
pub const DEFAULT_REST_URL: &str = match option_env!("STUDIO_REST_URL") {
    Some(url) => url,
    None => "",
};

/// Default upload/auth backend root (compile-time `STUDIO_BACKEND_URL`).
pub const DEFAULT_BACKEND_URL: &str = match option_env!("STUDIO_BACKEND_URL") {
    Some(url) => url,
    None => "",
};

/// Default static service API key (compile-time `STUDIO_API_KEY`).
pub const DEFAULT_API_KEY: &str = match option_env!("STUDIO_API_KEY") {
    Some(key) => key,
    None => "",
};

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Client configuration, supplied once at process start.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// PostgREST endpoint root, e.g. `https://db.example.com/rest/v1`.
    #[serde(default = "default_rest_url")]
    pub rest_url: String,
    /// Root of the custom backend serving `/api/auth/*`, `/api/upload` and `/files`.
    #[serde(default = "default_backend_url")]
    pub backend_url: String,
    /// Static service credential sent to PostgREST as a bearer token.
    #[serde(default = "default_api_key")]
    pub api_key: String,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_rest_url() -> String {
    DEFAULT_REST_URL.to_string()
}

fn default_backend_url() -> String {
    DEFAULT_BACKEND_URL.to_string()
}

fn default_api_key() -> String {
    DEFAULT_API_KEY.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            rest_url: default_rest_url(),
            backend_url: default_backend_url(),
            api_key: default_api_key(),
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("log_level", &self.log_level)
            .field("rest_url", &self.rest_url)
            .field("backend_url", &self.backend_url)
            .field("api_key_set", &!self.api_key.trim().is_empty())
            .finish()
    }
}

impl Config {
    /// Defaults with `STUDIO_*` environment overrides applied.
    pub fn new() -> Self {
        let mut config = Self::default();
        config.load_from_env();
        config
    }

    /// `config.json` under `paths` (defaults when absent), then environment overrides.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        config.load_from_env();
        Ok(config)
    }

    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let raw = std::fs::read(path)?;
        Ok(serde_json::from_slice(&raw)?)
    }

    /// Write `config.json`, creating the data directory if needed.
    pub fn save(&self, paths: &Paths) -> CoreResult<()> {
        paths.ensure_dirs()?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(paths.config_file(), content)?;
        Ok(())
    }

    fn load_from_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Apply `STUDIO_*` overrides from a variable lookup. Blank values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let Some(level) = read("STUDIO_LOG_LEVEL") {
            self.log_level = level;
        }
        if let Some(url) = read("STUDIO_REST_URL") {
            self.rest_url = url;
        }
        if let Some(url) = read("STUDIO_BACKEND_URL") {
            self.backend_url = url;
        }
        if let Some(key) = read("STUDIO_API_KEY") {
            self.api_key = key;
        }
    }

    /// Names of required settings that are empty.
    pub fn missing_settings(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.rest_url.trim().is_empty() {
            missing.push("rest_url");
        }
        if self.backend_url.trim().is_empty() {
            missing.push("backend_url");
        }
        if self.api_key.trim().is_empty() {
            missing.push("api_key");
        }
        missing
    }

    /// Log a warning for each missing setting. Returns true when nothing is missing.
    pub fn warn_if_incomplete(&self) -> bool {
        let missing = self.missing_settings();
        for setting in &missing {
            tracing::warn!(setting = %setting, "Studio client setting is not configured");
        }
        missing.is_empty()
    }
}
