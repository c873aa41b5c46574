//! In-memory stand-ins for the collector's collaborators.

use std::collections::{HashSet, VecDeque};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use pogo_core::{FriendRecord, StampedFriend, Team};
use pogo_qr::{CodeImager, QrError};
use pogo_scraper::{PageFetcher, ScraperError};
use pogo_store::{RecordStore, StoreError};
use tokio_util::sync::CancellationToken;

use crate::scheduler::Sleeper;

pub(crate) fn candidate(code: &str, name: &str) -> FriendRecord {
    FriendRecord {
        name: name.to_owned(),
        level: "30".to_owned(),
        code: code.to_owned(),
        location: "Kanto".to_owned(),
        team: Team::Unknown,
    }
}

fn corrupt() -> StoreError {
    StoreError::Corrupt {
        path: PathBuf::from("memory"),
        reason: "simulated".to_owned(),
    }
}

/// Store that keeps rows in memory and panics on a duplicate append.
#[derive(Default)]
pub(crate) struct MemoryStore {
    pub rows: Mutex<Vec<StampedFriend>>,
    pub fail_reads: bool,
    pub fail_append_codes: HashSet<String>,
}

impl MemoryStore {
    pub(crate) fn with_rows(rows: Vec<StampedFriend>) -> Self {
        Self {
            rows: Mutex::new(rows),
            ..Self::default()
        }
    }

    pub(crate) fn rows(&self) -> Vec<StampedFriend> {
        self.rows.lock().unwrap().clone()
    }

    pub(crate) fn codes(&self) -> Vec<String> {
        self.rows().into_iter().map(|f| f.record.code).collect()
    }
}

impl RecordStore for MemoryStore {
    fn all_codes(&self) -> Result<HashSet<String>, StoreError> {
        if self.fail_reads {
            return Err(corrupt());
        }
        Ok(self.codes().into_iter().collect())
    }

    fn append(&self, friend: &StampedFriend) -> Result<(), StoreError> {
        if self.fail_append_codes.contains(&friend.record.code) {
            return Err(corrupt());
        }
        let mut rows = self.rows.lock().unwrap();
        // With reads failing the reconciler cannot know what is stored.
        assert!(
            self.fail_reads || !rows.iter().any(|r| r.record.code == friend.record.code),
            "duplicate append of {}",
            friend.record.code
        );
        rows.push(friend.clone());
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<StampedFriend>, StoreError> {
        if self.fail_reads {
            return Err(corrupt());
        }
        Ok(self.rows())
    }
}

/// Imager that records what it was asked to emit and fails for chosen names.
#[derive(Default)]
pub(crate) struct RecordingImager {
    pub emitted: Mutex<Vec<(String, String)>>,
    pub fail_names: HashSet<String>,
}

impl CodeImager for RecordingImager {
    fn emit(&self, payload: &str, suggested_name: &str) -> Result<PathBuf, QrError> {
        if self.fail_names.contains(suggested_name) {
            return Err(QrError::Io {
                path: PathBuf::from(suggested_name),
                source: std::io::Error::other("simulated disk full"),
            });
        }
        self.emitted
            .lock()
            .unwrap()
            .push((payload.to_owned(), suggested_name.to_owned()));
        Ok(PathBuf::from(format!("{suggested_name}.png")))
    }
}

/// Fetcher that replays scripted responses; the warm-up request consumes one
/// entry like any other fetch. Once the script runs out it keeps failing.
pub(crate) struct ScriptedFetcher {
    responses: Mutex<VecDeque<Result<String, ScraperError>>>,
    pub calls: AtomicUsize,
}

impl ScriptedFetcher {
    pub(crate) fn new(responses: Vec<Result<String, ScraperError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

pub(crate) fn unavailable() -> ScraperError {
    ScraperError::UnexpectedStatus {
        status: 503,
        url: "http://test.invalid/".to_owned(),
    }
}

#[async_trait]
impl PageFetcher for ScriptedFetcher {
    async fn fetch(&self, _url: &str) -> Result<String, ScraperError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(unavailable()))
    }
}

/// Fetcher that never answers, for exercising cancellation mid-request.
pub(crate) struct HangingFetcher;

#[async_trait]
impl PageFetcher for HangingFetcher {
    async fn fetch(&self, _url: &str) -> Result<String, ScraperError> {
        std::future::pending().await
    }
}

/// Sleeper that returns immediately, records each requested pause and
/// cancels `token` once `cancel_after` pauses have been requested.
pub(crate) struct InstantSleeper {
    pub pauses: Mutex<Vec<Duration>>,
    cancel_after: usize,
    token: CancellationToken,
}

impl InstantSleeper {
    pub(crate) fn new(token: CancellationToken, cancel_after: usize) -> Self {
        Self {
            pauses: Mutex::new(Vec::new()),
            cancel_after,
            token,
        }
    }

    pub(crate) fn pauses(&self) -> Vec<Duration> {
        self.pauses.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for InstantSleeper {
    async fn sleep(&self, duration: Duration) {
        let count = {
            let mut pauses = self.pauses.lock().unwrap();
            pauses.push(duration);
            pauses.len()
        };
        if count >= self.cancel_after {
            self.token.cancel();
        }
        tokio::task::yield_now().await;
    }
}
