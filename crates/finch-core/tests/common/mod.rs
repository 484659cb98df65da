#![allow(dead_code)]

pub mod seed_server;

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use finch_core::clock::{Clock, ManualClock};
use finch_core::config::FetcherSettings;
use finch_core::downloader::{DownloadError, Downloader, SeedFetchInfo, SeedRequest};
use finch_core::fetcher::SeedFetcher;
use finch_core::platform::{DbJobScheduler, InMemoryJobScheduler, JobScheduler};
use finch_core::stamp::SeedStamp;
use finch_core::state_db::StateDb;
use tempfile::TempDir;

pub const HOUR_MS: i64 = 60 * 60 * 1000;
pub const DAY_MS: i64 = 24 * HOUR_MS;

/// Arbitrary fixed "now" for tests.
pub const T0: i64 = 1_700_000_000_000;

/// Downloader answering from a script of result codes. Each call advances the
/// clock by `fetch_ms` to simulate download time.
pub struct ScriptedDownloader {
    codes: Mutex<VecDeque<Result<i64, String>>>,
    calls: AtomicUsize,
    clock: Arc<ManualClock>,
    fetch_ms: i64,
}

impl ScriptedDownloader {
    pub fn new(clock: Arc<ManualClock>, fetch_ms: i64) -> Self {
        Self {
            codes: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
            clock,
            fetch_ms,
        }
    }

    pub fn push_code(&self, code: i64) {
        self.codes.lock().unwrap().push_back(Ok(code));
    }

    pub fn push_error(&self, msg: &str) {
        self.codes.lock().unwrap().push_back(Err(msg.to_string()));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Downloader for ScriptedDownloader {
    fn download(&self, _request: &SeedRequest) -> Result<SeedFetchInfo, DownloadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.clock.advance(self.fetch_ms);
        let next = self.codes.lock().unwrap().pop_front().unwrap_or(Ok(200));
        match next {
            Ok(code) => Ok(SeedFetchInfo {
                result_code: code,
                payload: None,
            }),
            Err(msg) => Err(DownloadError::Transport(msg)),
        }
    }
}

/// Settings with a complete request environment.
pub fn settings() -> FetcherSettings {
    FetcherSettings {
        milestone: Some(120),
        channel: Some("stable".into()),
        ..FetcherSettings::default()
    }
}

/// A fetcher over a temp state dir, a job scheduler and a manual clock.
pub struct Harness {
    pub dir: TempDir,
    pub clock: Arc<ManualClock>,
    pub db: StateDb,
    pub stamp: SeedStamp,
    pub scheduler: Arc<dyn JobScheduler>,
    /// Set when jobs live in the in-process scheduler.
    pub memory: Option<Arc<InMemoryJobScheduler>>,
    pub downloader: Arc<ScriptedDownloader>,
    pub fetcher: Arc<SeedFetcher>,
}

impl Harness {
    pub async fn new(settings: FetcherSettings) -> Self {
        Self::with_fetch_ms(settings, 0).await
    }

    /// Persistent scheduler backed by the state DB.
    pub async fn with_fetch_ms(settings: FetcherSettings, fetch_ms: i64) -> Self {
        Self::build(settings, fetch_ms, false).await
    }

    /// In-process single-slot scheduler; nothing about the job is persisted.
    pub async fn in_memory(settings: FetcherSettings) -> Self {
        Self::build(settings, 0, true).await
    }

    async fn build(settings: FetcherSettings, fetch_ms: i64, in_memory: bool) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(ManualClock::new(T0));
        let db = StateDb::open_at(&dir.path().join("state.db")).await.unwrap();
        let stamp = SeedStamp::in_dir(dir.path());
        let memory = in_memory.then(|| Arc::new(InMemoryJobScheduler::new(clock.clone())));
        let scheduler: Arc<dyn JobScheduler> = match &memory {
            Some(m) => m.clone(),
            None => Arc::new(DbJobScheduler::new(db.clone(), clock.clone())),
        };
        let downloader = Arc::new(ScriptedDownloader::new(clock.clone(), fetch_ms));
        let fetcher = Arc::new(SeedFetcher::new(
            settings,
            db.clone(),
            stamp.clone(),
            scheduler.clone(),
            downloader.clone() as Arc<dyn Downloader>,
            clock.clone() as Arc<dyn Clock>,
        ));
        Self {
            dir,
            clock,
            db,
            stamp,
            scheduler,
            memory,
            downloader,
            fetcher,
        }
    }

    /// Same state dir and DB, new settings (e.g. different command-line flags).
    pub fn refetcher(&self, settings: FetcherSettings) -> SeedFetcher {
        SeedFetcher::new(
            settings,
            self.db.clone(),
            self.stamp.clone(),
            self.scheduler.clone(),
            self.downloader.clone() as Arc<dyn Downloader>,
            self.clock.clone() as Arc<dyn Clock>,
        )
    }
}
