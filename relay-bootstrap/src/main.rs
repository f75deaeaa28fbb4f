use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

#[derive(Parser, Debug)]
#[command(name = "scum-relay")]
#[command(about = "SCUM server telemetry relay", long_about = None)]
struct Args {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Also write daily-rolling log files into this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Emit JSON log lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the ingestion gateway (HTTP + retention sweeps)
    Gateway,
    /// Run the panel and feed relay
    Relay,
    /// Queue an in-game announcement on a running gateway
    Announce {
        message: String,
    },
}

fn init_tracing(log_dir: Option<&Path>, json: bool) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let console = if json {
        fmt::layer().json().boxed()
    } else {
        fmt::layer().boxed()
    };
    let (file, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "scum-relay.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_writer(writer).with_ansi(false)), Some(guard))
        }
        None => (None, None),
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .init();
    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let _log_guard = init_tracing(args.log_dir.as_deref(), args.json_logs);

    if let Some(config) = args.config {
        std::env::set_var(relay_infrastructure::CONFIG_PATH_ENV, config);
    }

    match args.command {
        Command::Gateway => relay_bootstrap::run_gateway().await,
        Command::Relay => relay_bootstrap::run_relay().await,
        Command::Announce { message } => relay_bootstrap::run_announce(message).await,
    }
}
