//! Logging system initialization
//!
//! Sets up the tracing subscriber from `LoggingConfig`: console or file
//! output, optional daily rotation, text or JSON formatting.

use tracing_appender::rolling;

use crate::config::LoggingConfig;

/// Build the writer the subscriber logs through
fn build_writer(config: &LoggingConfig) -> Box<dyn std::io::Write + Send + Sync> {
    let Some(log_file) = config.logging_file() else {
        return Box::new(std::io::stdout());
    };

    let path = std::path::Path::new(log_file);
    if config.enable_rotation {
        let dir = path.parent().unwrap_or(std::path::Path::new("."));
        let prefix = path
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("urlshortener.log")
            .trim_end_matches(".log")
            .to_string();

        match rolling::Builder::new()
            .rotation(rolling::Rotation::DAILY)
            .filename_prefix(prefix)
            .filename_suffix("log")
            .max_log_files(config.max_backups as usize)
            .build(dir)
        {
            Ok(appender) => return Box::new(appender),
            Err(e) => eprintln!("[WARN] Failed to create rolling log appender: {}", e),
        }
    } else {
        match std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
        {
            Ok(file) => return Box::new(file),
            Err(e) => eprintln!("[WARN] Failed to open log file {}: {}", log_file, e),
        }
    }

    Box::new(std::io::stdout())
}

impl LoggingConfig {
    fn logging_file(&self) -> Option<&str> {
        self.file.as_deref().filter(|f| !f.is_empty())
    }
}

/// Initialize logging based on configuration
///
/// Call once during startup. Falls back to stdout when the configured file
/// cannot be opened.
///
/// # Returns
/// * `WorkerGuard` - keep alive for the whole program so buffered lines are flushed
///
/// # Panics
/// * If a global subscriber has already been installed
pub fn init_logging(config: &LoggingConfig) -> tracing_appender::non_blocking::WorkerGuard {
    let writer = build_writer(config);
    let to_console = config.logging_file().is_none();

    let (non_blocking_writer, guard) = tracing_appender::non_blocking(writer);
    let filter = tracing_subscriber::EnvFilter::new(config.level.clone());

    let subscriber_builder = tracing_subscriber::fmt()
        .with_writer(non_blocking_writer)
        .with_env_filter(filter)
        .with_level(true)
        .with_ansi(to_console);

    if config.format == "json" {
        subscriber_builder.json().init();
    } else {
        subscriber_builder.init();
    }

    guard
}
