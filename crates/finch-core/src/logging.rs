//! Logging init: append to `finch.log` in the state dir, or fall back to stderr.

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

use crate::config;

const DEFAULT_FILTER: &str = "info,finch=debug,finch_core=debug";

/// Per-event writer: the shared log file, or stderr when the handle can't be cloned.
enum LogSink {
    File(File),
    Stderr,
}

impl io::Write for LogSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            LogSink::File(f) => f.write(buf),
            LogSink::Stderr => io::stderr().lock().write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            LogSink::File(f) => f.flush(),
            LogSink::Stderr => io::stderr().lock().flush(),
        }
    }
}

struct LogFileWriter(File);

impl<'a> MakeWriter<'a> for LogFileWriter {
    type Writer = LogSink;

    fn make_writer(&'a self) -> Self::Writer {
        self.0
            .try_clone()
            .map(LogSink::File)
            .unwrap_or(LogSink::Stderr)
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Path of the log file under the state dir.
pub fn log_file_path() -> Result<PathBuf> {
    Ok(config::state_dir()?.join("finch.log"))
}

fn open_log_file(path: &Path) -> Result<File> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("create log dir: {}", dir.display()))?;
    }
    fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open log file: {}", path.display()))
}

/// Initialize structured logging to `~/.local/state/finch/finch.log`.
/// Returns Err if the file can't be opened so the caller can fall back to stderr.
pub fn init_logging() -> Result<()> {
    let path = log_file_path()?;
    let file = open_log_file(&path)?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(BoxMakeWriter::new(LogFileWriter(file)))
        .with_ansi(false)
        .init();

    tracing::info!("finch logging initialized at {}", path.display());
    Ok(())
}

/// Initialize logging to stderr only (no file).
pub fn init_logging_stderr() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();
}

/// File logging if possible, stderr otherwise. Never fails.
pub fn init_logging_or_stderr() {
    if let Err(e) = init_logging() {
        init_logging_stderr();
        tracing::warn!("file logging unavailable, using stderr: {:#}", e);
    }
}
