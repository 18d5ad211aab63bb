//! CLI binary for tasknudge.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tasknudge::logging::{self, LogTarget};
use tasknudge::scheduler::runner::{SchedulerEvent, StartOutcome};
use tasknudge::{AddRequest, DueAlert, NudgeConfig, Task, TaskServices};
use tracing::info;

/// tasknudge: personal task and reminder manager.
#[derive(Parser)]
#[command(name = "tasknudge", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Command,
}

/// Available commands.
#[derive(Subcommand)]
enum Command {
    /// Add a task from free text, e.g. "Call mom in 20 minutes".
    Add {
        /// Task description; keywords set delay, category and priority.
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
        /// Reminder delay in minutes, overriding the text.
        #[arg(short, long)]
        minutes: Option<String>,
        /// Recurrence: None, Daily, Weekly or Monthly.
        #[arg(short, long)]
        recurrence: Option<String>,
    },

    /// List all tasks.
    List,

    /// Delete every completed task.
    DeleteCompleted,

    /// Delete every task.
    Clear,

    /// Export tasks as CSV.
    Export {
        /// Destination file (defaults to the configured export path).
        #[arg(short, long)]
        path: Option<PathBuf>,
    },

    /// Run one due check now and print any alerts.
    Check,

    /// Add the demo tasks.
    Demo,

    /// Run the scheduler in the foreground and print alerts until Ctrl+C.
    Watch,

    /// Serve the browser dashboard.
    Dashboard {
        /// Bind host (overrides config).
        #[arg(long)]
        host: Option<String>,
        /// Bind port (overrides config).
        #[arg(long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = NudgeConfig::load_or_default(cli.config.as_deref())?;

    // Long-running commands log to stdout; one-shot commands keep stdout for
    // their own output.
    let target = match cli.command {
        Command::Watch | Command::Dashboard { .. } => LogTarget::Stdout,
        _ => LogTarget::Stderr,
    };
    let _log_guard = logging::init(&config.logging, target);

    let (services, due_rx) = TaskServices::from_config(&config)?;

    match cli.command {
        Command::Add {
            text,
            minutes,
            recurrence,
        } => {
            let request = AddRequest {
                text: text.join(" "),
                minutes,
                recurrence,
            };
            let task = services.add(&request)?;
            println!("Added: {}", describe(&task));
        }
        Command::List => print_tasks(&services.list()),
        Command::DeleteCompleted => {
            let removed = services.delete_completed()?;
            println!("Deleted {removed} completed task(s).");
        }
        Command::Clear => {
            let removed = services.clear()?;
            println!("Cleared {removed} task(s).");
        }
        Command::Export { path } => {
            let (rows, path) = services.export(path.as_deref())?;
            println!("Exported {rows} task(s) to {}", path.display());
        }
        Command::Check => {
            let report = services.check_now();
            if report.fired.is_empty() {
                println!("Nothing due.");
            }
            print_alerts(&report.fired);
            for id in &report.skipped {
                println!("Skipped {id}: unreadable due time");
            }
        }
        Command::Demo => {
            for task in services.add_demo()? {
                println!("Added: {}", describe(&task));
            }
        }
        Command::Watch => {
            if services.start_scheduler()? == StartOutcome::Started {
                println!(
                    "Watching {} task(s). Press Ctrl+C to stop.",
                    services.book().len()
                );
            }
            let printed = watch_alerts(due_rx, tokio::signal::ctrl_c()).await;
            info!(printed, "watch finished");
            services.scheduler().shutdown().await;
        }
        Command::Dashboard { host, port } => {
            let mut dashboard = config.dashboard.clone();
            if let Some(host) = host {
                dashboard.host = host;
            }
            if let Some(port) = port {
                dashboard.port = port;
            }
            if config.scheduler.autostart {
                services.start_scheduler()?;
            }
            tasknudge::dashboard::run_dashboard(&dashboard, services, due_rx).await?;
        }
    }

    Ok(())
}

/// Print alerts until `shutdown` resolves or the channel closes. Returns the
/// number of alerts printed.
async fn watch_alerts<F>(
    mut due_rx: tokio::sync::mpsc::UnboundedReceiver<SchedulerEvent>,
    shutdown: F,
) -> usize
where
    F: std::future::Future,
{
    tokio::pin!(shutdown);
    let mut printed = 0;

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("received Ctrl+C, shutting down...");
                break;
            }
            event = due_rx.recv() => match event {
                Some(SchedulerEvent::Due(alerts)) => {
                    print_alerts(&alerts);
                    printed += alerts.len();
                }
                None => break,
            },
        }
    }

    printed
}

fn describe(task: &Task) -> String {
    format!(
        "{} (due {}) [{}, {}, {}]",
        task.description,
        task.due_time,
        task.category,
        task.priority,
        task.recurrence
    )
}

fn print_tasks(tasks: &[Task]) {
    if tasks.is_empty() {
        println!("No tasks added yet.");
        return;
    }
    for task in tasks {
        let status = if task.completed { "done" } else { "    " };
        let short_id: String = task.id.chars().take(8).collect();
        println!("{short_id} [{status}] {}", describe(task));
    }
}

fn print_alerts(alerts: &[DueAlert]) {
    for alert in alerts {
        match &alert.next_due_time {
            Some(next) => println!("{} (next: {next})", alert.message()),
            None => println!("{}", alert.message()),
        }
    }
}
