// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all
)]
#![allow(clippy::multiple_crate_versions)]

use chrono::Utc;
use clap::Parser;
use lunchegram::channel::TELEGRAM_API_URL;
use lunchegram::directory::HR_API_URL;
use lunchegram::{
    ChatChannel, HrDirectoryClient, LoggingChannel, Orchestrator, PipelineConfig,
    TelegramChannel, Worker, sync_directory,
};
use lunchegram_domain::{DEFAULT_PROBE_MESSAGE, parse_timezone};
use lunchegram_persistence::{Persistence, PersistenceError};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

/// Lunchegram - schedules random lunches and announces partners over Telegram
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the `SQLite` database file. If not provided, uses in-memory database.
    #[arg(short, long, env = "LUNCHEGRAM_DATABASE")]
    database: Option<String>,

    /// `MySQL`/`MariaDB` connection URL; takes precedence over `--database`.
    #[cfg(feature = "mysql")]
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: Option<String>,

    /// Telegram bot token. Required unless `--dry-run` is given.
    #[arg(long, env = "LUNCHEGRAM_TELEGRAM_TOKEN", hide_env_values = true)]
    telegram_token: Option<String>,

    /// Telegram Bot API server.
    #[arg(long, env = "LUNCHEGRAM_TELEGRAM_API_URL", default_value = TELEGRAM_API_URL)]
    telegram_api_url: String,

    /// HR directory API key. Directory sync is skipped without one.
    #[arg(long, env = "LUNCHEGRAM_HR_API_KEY", hide_env_values = true)]
    hr_api_key: Option<String>,

    /// HR directory API base URL.
    #[arg(long, env = "LUNCHEGRAM_HR_API_URL", default_value = HR_API_URL)]
    hr_api_url: String,

    /// IANA time zone in which lunch dates are computed.
    #[arg(long, env = "LUNCHEGRAM_TIME_ZONE", default_value = "UTC")]
    time_zone: String,

    /// Seconds between scheduling ticks.
    #[arg(long, env = "LUNCHEGRAM_TICK_INTERVAL_SECS", default_value_t = 86_400)]
    tick_interval_secs: u64,

    /// Jobs run concurrently.
    #[arg(long, env = "LUNCHEGRAM_CONCURRENCY", default_value_t = 8)]
    concurrency: usize,

    /// Attempts per job before it is given up.
    #[arg(long, env = "LUNCHEGRAM_MAX_ATTEMPTS", default_value_t = 5)]
    max_attempts: i32,

    /// Milliseconds between queue polls while idle.
    #[arg(long, default_value_t = 1_000)]
    poll_interval_ms: u64,

    /// External profile link template; `{id}` is replaced by the directory id.
    #[arg(long, env = "LUNCHEGRAM_PROFILE_URL_TEMPLATE")]
    profile_url_template: Option<String>,

    /// Text of the reachability probe.
    #[arg(long, env = "LUNCHEGRAM_PROBE_MESSAGE", default_value = DEFAULT_PROBE_MESSAGE)]
    probe_message: String,

    /// Run a single tick, drain the queue and exit.
    #[arg(long)]
    run_once: bool,

    /// Log messages instead of sending them.
    #[arg(long)]
    dry_run: bool,
}

impl Args {
    fn pipeline_config(&self) -> Result<PipelineConfig, Box<dyn std::error::Error>> {
        let config: PipelineConfig = PipelineConfig {
            tick_interval: Duration::from_secs(self.tick_interval_secs),
            time_zone: parse_timezone(&self.time_zone)?,
            concurrency: self.concurrency,
            max_attempts: self.max_attempts,
            idle_poll_interval: Duration::from_millis(self.poll_interval_ms),
            profile_url_template: self.profile_url_template.clone(),
            probe_message: self.probe_message.clone(),
            ..PipelineConfig::default()
        };
        config.validate()?;
        Ok(config)
    }

    fn chat_channel(&self) -> Result<Arc<dyn ChatChannel>, Box<dyn std::error::Error>> {
        if self.dry_run {
            info!("Dry run: messages are logged, not sent");
            return Ok(Arc::new(LoggingChannel::new()));
        }
        let Some(token) = &self.telegram_token else {
            return Err("a Telegram bot token is required unless --dry-run is given".into());
        };
        Ok(Arc::new(TelegramChannel::with_api_url(
            self.telegram_api_url.as_str(),
            token.as_str(),
        )?))
    }

    fn directory_client(&self) -> Result<Option<HrDirectoryClient>, Box<dyn std::error::Error>> {
        self.hr_api_key
            .as_deref()
            .map(|key| HrDirectoryClient::new(self.hr_api_url.as_str(), key))
            .transpose()
            .map_err(Into::into)
    }

    fn open_persistence(&self) -> Result<Persistence, PersistenceError> {
        #[cfg(feature = "mysql")]
        if let Some(url) = &self.database_url {
            info!("Using MySQL database");
            return Persistence::new_with_mysql(url);
        }

        if let Some(db_path) = &self.database {
            info!("Using file-based database at: {}", db_path);
            Persistence::new_with_file(db_path)
        } else {
            warn!("Using in-memory database; nothing survives a restart");
            Persistence::new_in_memory()
        }
    }
}

/// Syncs the directory, if configured, then queues today's lunch run.
///
/// A failed sync is logged and the run goes ahead with the stored directory.
async fn run_tick(
    store: &Mutex<Persistence>,
    orchestrator: &Orchestrator,
    directory: Option<&HrDirectoryClient>,
) -> Result<(), lunchegram::PipelineError> {
    if let Some(client) = directory {
        if let Err(e) = sync_directory(store, client).await {
            warn!(error = %e, "Directory sync failed; using stored directory");
        }
    }
    orchestrator.tick(Utc::now()).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command-line arguments
    let args: Args = Args::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Initializing Lunchegram");

    let config: PipelineConfig = args.pipeline_config()?;
    let store: Arc<Mutex<Persistence>> = Arc::new(Mutex::new(args.open_persistence()?));
    let channel: Arc<dyn ChatChannel> = args.chat_channel()?;
    let directory: Option<HrDirectoryClient> = args.directory_client()?;

    let orchestrator: Orchestrator = Orchestrator::new(Arc::clone(&store), config.clone())?;
    let worker: Worker = Worker::new(Arc::clone(&store), channel, config.clone())?;

    if args.run_once {
        run_tick(&store, &orchestrator, directory.as_ref()).await?;
        let ran: usize = worker.run_until_idle().await?;
        info!(ran, "Run complete");
        return Ok(());
    }

    let shutdown = worker.shutdown_handle();
    let scheduler = async {
        let mut ticks = tokio::time::interval(config.tick_interval);
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);
        loop {
            tokio::select! {
                _ = ticks.tick() => {
                    if let Err(e) = run_tick(&store, &orchestrator, directory.as_ref()).await {
                        error!(error = %e, "Scheduling tick failed");
                    }
                }
                _ = &mut ctrl_c => {
                    info!("Shutdown requested");
                    shutdown.store(true, Ordering::SeqCst);
                    break;
                }
            }
        }
    };

    let (worker_result, ()) = tokio::join!(worker.run(), scheduler);
    worker_result?;
    Ok(())
}
