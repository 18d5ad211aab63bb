//! Tracing subscriber setup shared by the binaries.

use crate::config::LoggingConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Prefix of the daily log files under the logs dir.
pub const LOG_FILE_PREFIX: &str = "tasknudge";

/// Where console logs go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    Stdout,
    /// Used when stdout carries a protocol.
    Stderr,
}

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `config.level`. When `config.file` is set, logs are
/// also written to a daily-rolling file; keep the returned guard alive for
/// the life of the process or buffered lines are lost.
pub fn init(config: &LoggingConfig, target: LogTarget) -> Option<WorkerGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let console = match target {
        LogTarget::Stdout => BoxMakeWriter::new(std::io::stdout),
        LogTarget::Stderr => BoxMakeWriter::new(std::io::stderr),
    };

    let (file_layer, guard) = if config.file {
        match file_appender() {
            Ok(appender) => {
                let (writer, guard) = tracing_appender::non_blocking(appender);
                (
                    Some(fmt::layer().with_ansi(false).with_writer(writer)),
                    Some(guard),
                )
            }
            Err(e) => {
                eprintln!("tasknudge: file logging disabled: {e}");
                (None, None)
            }
        }
    } else {
        (None, None)
    };

    // Already initialised (tests, embedding) is fine.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(console))
        .with(file_layer)
        .try_init();

    guard
}

fn file_appender() -> Result<RollingFileAppender, tracing_appender::rolling::InitError> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix("log")
        .build(crate::nudge_dirs::logs_dir())
}
