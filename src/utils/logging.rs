use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const LOG_DIR: &str = "logs";
const LOG_FILE_PREFIX: &str = "swarmflow.log";

/// Builds the env filter for `log_level`, falling back to `info` when invalid.
pub fn build_filter(log_level: &str) -> EnvFilter {
    match EnvFilter::try_new(log_level) {
        Ok(f) => f,
        Err(_) => {
            eprintln!("Invalid log level '{}', defaulting to 'info'", log_level);
            EnvFilter::new("info")
        }
    }
}

/// Initialize the global subscriber for the `swarmflow` binary.
///
/// Logs go to stdout; with `with_file` they are also written to daily
/// rotating files under `logs/`. The library itself never calls this.
///
/// # Arguments
///
/// * `log_level` - Filter directive such as `"info"` or `"swarmflow=debug"`
/// * `with_file` - Whether to also log to a rotating file
pub fn init_logging(log_level: &str, with_file: bool) {
    let filter = build_filter(log_level);
    let stdout_layer = fmt::layer().with_line_number(true).with_target(false);

    if with_file {
        let file_appender = RollingFileAppender::new(Rotation::DAILY, LOG_DIR, LOG_FILE_PREFIX);
        let file_layer = fmt::layer()
            .with_line_number(true)
            .with_ansi(false)
            .with_writer(file_appender);

        tracing_subscriber::registry()
            .with(filter)
            .with(stdout_layer)
            .with(file_layer)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(stdout_layer)
            .init();
    }
}
