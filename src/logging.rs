//! Log output setup.
//!
//! Logs go to stderr unless `log_file` is configured, in which case they are
//! appended there. `RUST_LOG` overrides the configured level.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Mutex;

use tracing::warn;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// Local wall-clock timestamps, e.g. `2024/05/01 13:37:00`.
struct LocalTime;

impl FormatTime for LocalTime {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%Y/%m/%d %H:%M:%S"))
    }
}

fn open_log(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// Install the global subscriber.
pub fn init(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let (writer, fallback) = match config.log_file.as_deref().map(open_log) {
        Some(Ok(file)) => (BoxMakeWriter::new(Mutex::new(file)), None),
        Some(Err(e)) => (BoxMakeWriter::new(io::stderr), Some(e)),
        None => (BoxMakeWriter::new(io::stderr), None),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(LocalTime)
        .with_target(false)
        .with_ansi(false)
        .with_writer(writer)
        .init();

    if let (Some(e), Some(path)) = (fallback, config.log_file.as_ref()) {
        warn!("cannot open {}: {}; logging to stderr", path.display(), e);
    }
}
