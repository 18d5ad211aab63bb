//! Headless host bridge binary for stdin/stdout JSON communication.
//!
//! This binary reads `CommandEnvelope` messages as newline-delimited JSON
//! from stdin, dispatches them through the host command channel, and writes
//! `ResponseEnvelope` and `EventEnvelope` messages to stdout.
//!
//! All tracing/diagnostic output goes to stderr so that stdout remains a
//! clean JSON protocol channel.

use tasknudge::host::stdio::run_stdio_bridge;
use tasknudge::logging::{self, LogTarget};
use tasknudge::{NudgeConfig, TaskServices};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args_os().nth(1).map(std::path::PathBuf::from);
    let config = NudgeConfig::load_or_default(config_path.as_deref())?;
    let _log_guard = logging::init(&config.logging, LogTarget::Stderr);

    tracing::info!("tasknudge-host starting");

    let (services, due_rx) = TaskServices::from_config(&config)?;
    if config.scheduler.autostart {
        services.start_scheduler()?;
    }

    run_stdio_bridge(services, due_rx).await.map_err(|e| {
        tracing::error!(error = %e, "tasknudge-host exited with error");
        anyhow::anyhow!("tasknudge-host failed: {e}")
    })?;

    tracing::info!("tasknudge-host shut down cleanly");
    Ok(())
}
