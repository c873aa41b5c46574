mod reconcile;
mod scheduler;
mod stats;
#[cfg(test)]
mod testing;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use pogo_core::AppConfig;
use pogo_qr::{CodeImager, QrWriter};
use pogo_scraper::PageClient;
use pogo_store::CsvStore;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use crate::scheduler::{CycleOutcome, PollSettings, Scheduler, TokioSleeper};

#[derive(Debug, Parser)]
#[command(name = "pogo-cli")]
#[command(about = "Collects Pokemon GO friend codes from a public listing page")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Poll the listing page until interrupted (default)
    Run,
    /// Run a single collection cycle and exit
    Once,
    /// Summarise the stored friend codes
    Stats {
        /// Print machine-readable JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = pogo_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let store = Arc::new(CsvStore::new(&config.store_path));

    match cli.command {
        Some(Commands::Stats { json }) => stats::print_stats(store.as_ref(), json),
        Some(Commands::Once) => {
            let scheduler = build_scheduler(&config, store, CancellationToken::new())?;
            match scheduler.run_cycle().await {
                CycleOutcome::FetchFailed => anyhow::bail!("fetching {} failed", config.target_url),
                CycleOutcome::Completed { .. } | CycleOutcome::Cancelled => Ok(()),
            }
        }
        Some(Commands::Run) | None => {
            let cancel = CancellationToken::new();
            let scheduler = build_scheduler(&config, store, cancel.clone())?;
            tokio::spawn(async move {
                shutdown_signal().await;
                cancel.cancel();
            });
            scheduler.run().await;
            Ok(())
        }
    }
}

fn build_scheduler(
    config: &AppConfig,
    store: Arc<CsvStore>,
    cancel: CancellationToken,
) -> anyhow::Result<Scheduler> {
    let fetcher = Arc::new(PageClient::new(
        config.request_timeout_secs,
        &config.user_agent,
    )?);
    let imager: Option<Arc<dyn CodeImager>> = if config.qr_enabled {
        Some(Arc::new(QrWriter::new(&config.qr_base_path)))
    } else {
        tracing::info!("QR output disabled");
        None
    };

    Ok(Scheduler::new(
        fetcher,
        store,
        imager,
        Arc::new(TokioSleeper),
        PollSettings::from(config),
        cancel,
    ))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, finishing current step");
}
