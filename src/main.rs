use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use stock_watcher::{AppConfig, CheckOutcome, LogEntry, Target, TargetManager};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "stock-watcher",
    version,
    about = "Watch product pages and email when their stock state changes"
)]
struct Cli {
    /// Print results as JSON instead of plain lines.
    #[arg(long, global = true, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start tracking a page, or update an existing one.
    Add {
        url: String,

        #[arg(long, default_value_t = 5)]
        interval_minutes: u64,

        /// Comma-separated email addresses.
        #[arg(long, value_delimiter = ',')]
        recipients: Vec<String>,
    },
    /// Check one page now.
    Check { url: String },
    /// Check every tracked page once, in URL order.
    CheckAll,
    /// List tracked pages in URL order.
    List,
    /// Show the latest log entries of a page, newest first.
    Logs { url: String },
    /// Stop tracking a page and drop its history.
    Remove { url: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::from_env().context("failed to load configuration")?;
    let _guard = init_tracing(&config)?;

    let manager = TargetManager::from_config(&config)?;
    info!("Using snapshot at {}", config.store.path);

    match cli.command {
        Command::Add {
            url,
            interval_minutes,
            recipients,
        } => {
            let interval_sec = interval_minutes
                .checked_mul(60)
                .context("interval is too large")?;
            let target = manager.register_or_update(&url, interval_sec, recipients).await?;
            print(cli.json, &target, describe_target)?;
        }
        Command::Check { url } => {
            let outcome = manager.check_one(&url).await?;
            print(cli.json, &outcome, describe_outcome)?;
        }
        Command::CheckAll => {
            let failures = manager.check_all().await?;
            let targets = manager.list_targets().await;
            print(cli.json, &targets, |targets| {
                let mut lines: Vec<String> = targets.iter().map(describe_target).collect();
                lines.push(format!("{} checked, {} failed", targets.len(), failures));
                lines.join("\n")
            })?;
        }
        Command::List => {
            let targets = manager.list_targets().await;
            print(cli.json, &targets, |targets| {
                if targets.is_empty() {
                    return "No targets tracked".to_string();
                }
                targets.iter().map(describe_target).collect::<Vec<_>>().join("\n")
            })?;
        }
        Command::Logs { url } => {
            let entries = manager.get_logs(&url).await?;
            print(cli.json, &entries, |entries| {
                entries.iter().map(describe_entry).collect::<Vec<_>>().join("\n")
            })?;
        }
        Command::Remove { url } => {
            let removed = manager.remove_target(&url).await?;
            print(cli.json, &removed, |t| format!("Removed {}", t.url))?;
        }
    }

    Ok(())
}

/// Console logging filtered by `RUST_LOG`, plus a daily file when a log directory is configured.
fn init_tracing(config: &AppConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("stock_watcher=info"))?;

    let (file_layer, guard) = match &config.logging.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, &config.logging.file_prefix);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()
        .context("failed to install tracing subscriber")?;

    Ok(guard)
}

fn print<T: Serialize + ?Sized>(json: bool, value: &T, plain: impl FnOnce(&T) -> String) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", plain(value));
    }
    Ok(())
}

fn describe_target(target: &Target) -> String {
    let last_checked = target
        .last_checked
        .map(|at| at.to_rfc3339())
        .unwrap_or_else(|| "never".to_string());

    let mut line = format!(
        "{} [{}] every {}s, checked {}, {} ok / {} failed / {} changes",
        target.url,
        target.last_status,
        target.interval_sec,
        last_checked,
        target.success_count,
        target.fail_count,
        target.change_count
    );
    if !target.last_error.is_empty() {
        line.push_str(&format!(", last error: {}", target.last_error));
    }
    line
}

fn describe_outcome(outcome: &CheckOutcome) -> String {
    let mut line = format!("{} is {}", outcome.target.url, outcome.status);
    if outcome.changed {
        line.push_str(" (changed)");
    }
    if !outcome.target.last_error.is_empty() {
        line.push_str(&format!(": {}", outcome.target.last_error));
    }
    line
}

fn describe_entry(entry: &LogEntry) -> String {
    match &entry.error {
        Some(error) => format!("{} {} {} {}", entry.at.to_rfc3339(), entry.event, entry.status, error),
        None => format!("{} {} {}", entry.at.to_rfc3339(), entry.event, entry.status),
    }
}
