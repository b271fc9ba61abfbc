//! Dev-mode subscriber: JSONL to a shared file, optional compact stderr.
//!
//! Several processes may append to the same file. Each event is buffered
//! and handed to the OS in a single `write_all` on an `O_APPEND` handle, so
//! lines from different writers do not interleave.

use crate::json_layer::JsonLayer;
use crate::LogConfig;
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// `~/.studio/logs/dev.jsonl`, under the temp dir when there is no home.
fn default_log_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(".studio")
        .join("logs")
        .join("dev.jsonl")
}

/// Append-only log file handle shared by all events of this process.
#[derive(Clone)]
pub struct LogFile {
    file: Arc<Mutex<File>>,
}

impl LogFile {
    pub fn open(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Arc::new(Mutex::new(file)),
        })
    }
}

/// Per-event buffer; written out when dropped.
pub struct LineWriter {
    buf: Vec<u8>,
    file: Arc<Mutex<File>>,
}

impl Write for LineWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for LineWriter {
    fn drop(&mut self) {
        if !self.buf.is_empty() {
            let _ = self.file.lock().write_all(&self.buf);
        }
    }
}

impl<'a> MakeWriter<'a> for LogFile {
    type Writer = LineWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LineWriter {
            buf: Vec::with_capacity(256),
            file: self.file.clone(),
        }
    }
}

/// `RUST_LOG` when set and valid, else the configured level.
fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Install the dev subscriber. An unwritable log file degrades to a
/// compact stderr subscriber.
pub fn init_dev_subscriber(config: &LogConfig) {
    let log_path = config.file.clone().unwrap_or_else(default_log_path);

    let log_file = match LogFile::open(&log_path) {
        Ok(log_file) => log_file,
        Err(e) => {
            eprintln!(
                "observability: cannot open {} ({}), logging to stderr",
                log_path.display(),
                e
            );
            crate::install_stderr_only(&config.level);
            return;
        }
    };

    let file_layer = JsonLayer::new(config.service.clone(), log_file)
        .with_filter(env_filter(&config.level));
    let stderr_layer = config.mirror_stderr.then(|| {
        tracing_subscriber::fmt::layer()
            .compact()
            .with_writer(io::stderr)
            .with_filter(env_filter(&config.level))
    });

    if tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .is_ok()
    {
        tracing::debug!(log_path = %log_path.display(), service = %config.service, "Logging initialized");
    }
}
