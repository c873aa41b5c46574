//! Poll loop driving fetch → extract → reconcile.
//!
//! Each cycle walks [`CyclePhase`] from `WarmUp` to `Report`; between cycles
//! the scheduler sleeps for a jittered interval. Every suspension point
//! (delays, requests, the inter-cycle sleep) races the cancellation token,
//! so shutdown does not wait out a full sleep.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use pogo_core::{AppConfig, SleepWindow};
use pogo_qr::CodeImager;
use pogo_scraper::{extract_friend_records, PageFetcher, ScraperError};
use pogo_store::RecordStore;
use tokio_util::sync::CancellationToken;

use crate::reconcile::{reconcile, ReconcileSummary};

/// Timer used for every pause the scheduler takes.
#[async_trait]
pub(crate) trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

pub(crate) struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CyclePhase {
    WarmUp,
    Fetch,
    Extract,
    Reconcile,
    Report,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CycleOutcome {
    /// The cycle ran to the end. `total` is `None` when the store could not
    /// be counted.
    Completed {
        summary: ReconcileSummary,
        total: Option<usize>,
    },
    FetchFailed,
    Cancelled,
}

/// Timing and target for the poll loop, taken from [`AppConfig`].
#[derive(Debug, Clone)]
pub(crate) struct PollSettings {
    pub target_url: String,
    pub warm_up_delay: Duration,
    pub settle_delay: Duration,
    pub sleep_window: SleepWindow,
}

impl From<&AppConfig> for PollSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            target_url: config.target_url.clone(),
            warm_up_delay: config.warm_up_delay(),
            settle_delay: config.settle_delay(),
            sleep_window: config.sleep_window,
        }
    }
}

pub(crate) struct Scheduler {
    fetcher: Arc<dyn PageFetcher>,
    store: Arc<dyn RecordStore>,
    imager: Option<Arc<dyn CodeImager>>,
    sleeper: Arc<dyn Sleeper>,
    settings: PollSettings,
    cancel: CancellationToken,
    today: fn() -> NaiveDate,
}

fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

impl Scheduler {
    pub(crate) fn new(
        fetcher: Arc<dyn PageFetcher>,
        store: Arc<dyn RecordStore>,
        imager: Option<Arc<dyn CodeImager>>,
        sleeper: Arc<dyn Sleeper>,
        settings: PollSettings,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            fetcher,
            store,
            imager,
            sleeper,
            settings,
            cancel,
            today: local_today,
        }
    }

    /// Overrides the date stamped on new rows.
    #[cfg(test)]
    pub(crate) fn with_today(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Polls until cancelled, returning the number of cycles that completed.
    pub(crate) async fn run(&self) -> usize {
        tracing::info!(url = %self.settings.target_url, "poller started");
        let mut completed = 0usize;

        loop {
            match self.run_cycle().await {
                CycleOutcome::Completed { .. } => completed += 1,
                CycleOutcome::FetchFailed => {}
                CycleOutcome::Cancelled => break,
            }

            let pause = self.settings.sleep_window.draw(&mut rand::rng());
            tracing::debug!(pause_secs = pause.as_secs(), "sleeping until next cycle");
            if !self.pause(pause).await {
                break;
            }
        }

        tracing::info!(completed, "poller stopped");
        completed
    }

    /// Runs a single cycle without the trailing inter-cycle sleep.
    pub(crate) async fn run_cycle(&self) -> CycleOutcome {
        let url = self.settings.target_url.as_str();
        let mut phase = CyclePhase::WarmUp;
        let mut markup = String::new();
        let mut candidates = Vec::new();
        let mut summary = ReconcileSummary::default();

        loop {
            if self.cancel.is_cancelled() {
                return CycleOutcome::Cancelled;
            }
            tracing::debug!(?phase, "cycle phase");

            phase = match phase {
                CyclePhase::WarmUp => {
                    if !self.pause(self.settings.warm_up_delay).await {
                        return CycleOutcome::Cancelled;
                    }
                    match self.fetch(url).await {
                        None => return CycleOutcome::Cancelled,
                        Some(Err(e)) => {
                            tracing::warn!(url, error = %e, "warm-up request failed");
                        }
                        Some(Ok(_)) => {}
                    }
                    if !self.pause(self.settings.settle_delay).await {
                        return CycleOutcome::Cancelled;
                    }
                    CyclePhase::Fetch
                }
                CyclePhase::Fetch => match self.fetch(url).await {
                    None => return CycleOutcome::Cancelled,
                    Some(Ok(body)) => {
                        markup = body;
                        CyclePhase::Extract
                    }
                    Some(Err(e)) => {
                        tracing::warn!(url, error = %e, "fetch failed — skipping cycle");
                        return CycleOutcome::FetchFailed;
                    }
                },
                CyclePhase::Extract => {
                    candidates = extract_friend_records(&markup);
                    CyclePhase::Reconcile
                }
                CyclePhase::Reconcile => {
                    summary = reconcile(
                        self.store.as_ref(),
                        self.imager.as_deref(),
                        std::mem::take(&mut candidates),
                        (self.today)(),
                    );
                    CyclePhase::Report
                }
                CyclePhase::Report => {
                    let total = match self.store.count() {
                        Ok(n) => Some(n),
                        Err(e) => {
                            tracing::warn!(error = %e, "could not count stored records");
                            None
                        }
                    };
                    report(&summary, total);
                    return CycleOutcome::Completed { summary, total };
                }
            };
        }
    }

    /// Fetches `url`, or returns `None` if cancelled first.
    async fn fetch(&self, url: &str) -> Option<Result<String, ScraperError>> {
        tokio::select! {
            () = self.cancel.cancelled() => None,
            result = self.fetcher.fetch(url) => Some(result),
        }
    }

    /// Sleeps for `duration`; returns `false` if cancelled.
    async fn pause(&self, duration: Duration) -> bool {
        if duration.is_zero() {
            return !self.cancel.is_cancelled();
        }
        tokio::select! {
            () = self.cancel.cancelled() => false,
            () = self.sleeper.sleep(duration) => !self.cancel.is_cancelled(),
        }
    }
}

fn report(summary: &ReconcileSummary, total: Option<usize>) {
    let now = Local::now().format("%H:%M:%S");
    match total {
        Some(total) => println!("{now} >> Pokemon Go Friends ({total} in total)"),
        None => println!("{now} >> Pokemon Go Friends (total unavailable)"),
    }
    tracing::info!(
        persisted = summary.persisted,
        known = summary.known,
        invalid = summary.invalid,
        store_failures = summary.store_failures,
        qr_failures = summary.qr_failures,
        total = ?total,
        "cycle complete"
    );
}

#[cfg(test)]
#[path = "scheduler_test.rs"]
mod tests;
