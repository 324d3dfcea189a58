//! Resource Watcher - republishes orchestrator watch events onto a work queue.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tokio::sync::mpsc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use resource_watcher::config::{ConfigError, ConfigLoader, WatcherConfig};
use resource_watcher::dispatch::{QueueMessage, Watcher};
use resource_watcher::watch::{HttpTransport, ReconnectingSource};

/// Capacity of the queue between the watcher task and the printer.
const QUEUE_CAPACITY: usize = 64;

#[derive(Parser)]
#[command(
    name = "resource-watcher",
    about = "Watch an orchestrator resource collection and print queue messages",
    version
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Config file to load instead of the default search paths.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address of the API server.
    #[arg(short, long)]
    server: Option<String>,

    /// API version to use when talking to the server.
    #[arg(long)]
    api_version: Option<String>,

    /// Resource collection to watch.
    #[arg(short, long)]
    resource: Option<String>,

    /// Seconds to wait before reconnecting.
    #[arg(short = 'i', long)]
    reconnect_interval: Option<u64>,
}

impl Cli {
    fn load_config(&self) -> Result<WatcherConfig, ConfigError> {
        let loader = match &self.config {
            Some(path) => ConfigLoader::with_path(path.clone()),
            None => ConfigLoader::new(),
        };
        let mut config = loader.load()?;

        if let Some(server) = &self.server {
            config.endpoint.clone_from(server);
        }
        if let Some(api_version) = &self.api_version {
            config.api_version.clone_from(api_version);
        }
        if let Some(resource) = &self.resource {
            config.resource.clone_from(resource);
        }
        if let Some(interval) = self.reconnect_interval {
            config.reconnect_interval_secs = interval;
        }

        config.validate()?;
        Ok(config)
    }
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn print_message(message: &QueueMessage) {
    match serde_json::to_string_pretty(message) {
        Ok(json) => println!("{json}"),
        Err(e) => tracing::warn!(error = %e, "Failed to format message"),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match cli.load_config() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };
    let url = match config.watch_url() {
        Ok(url) => url,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(
        url = %url,
        reconnect_interval_secs = config.reconnect_interval_secs,
        "Starting resource watcher"
    );

    let (tx, mut rx) = mpsc::channel(QUEUE_CAPACITY);
    let source = ReconnectingSource::new(HttpTransport::new(), url, config.reconnect_interval());
    let watcher_task = tokio::spawn(async move {
        let mut watcher = Watcher::new(source, tx);
        if let Err(e) = watcher.run().await {
            tracing::info!(error = %e, "Watcher stopped");
        }
    });

    loop {
        tokio::select! {
            message = rx.recv() => match message {
                Some(message) => print_message(&message),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, shutting down");
                break;
            }
        }
    }

    watcher_task.abort();
    ExitCode::SUCCESS
}
