//! Shared state for command handlers: config, state dir, DB and the fetcher wiring.

use anyhow::Result;
use finch_core::bridge;
use finch_core::clock::{Clock, SystemClock};
use finch_core::config::{FetcherSettings, FinchConfig, FlagOverrides};
use finch_core::downloader::{Downloader, HttpSeedDownloader, SEED_FILE_NAME};
use finch_core::fetcher::SeedFetcher;
use finch_core::platform::{DbJobScheduler, JobScheduler};
use finch_core::stamp::SeedStamp;
use finch_core::state_db::{StateDb, STATE_DB_FILE_NAME};
use std::path::PathBuf;
use std::sync::Arc;

pub struct Context {
    pub cfg: FinchConfig,
    pub settings: FetcherSettings,
    pub state_dir: PathBuf,
    pub db: StateDb,
    pub stamp: SeedStamp,
    pub scheduler: Arc<DbJobScheduler>,
    pub clock: Arc<dyn Clock>,
}

impl Context {
    pub async fn open(cfg: FinchConfig, flags: FlagOverrides, state_dir: PathBuf) -> Result<Self> {
        let settings = cfg.fetcher_settings(&flags);
        let db = StateDb::open_at(state_dir.join(STATE_DB_FILE_NAME)).await?;
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let scheduler = Arc::new(DbJobScheduler::new(db.clone(), Arc::clone(&clock)));
        Ok(Self {
            cfg,
            settings,
            stamp: SeedStamp::in_dir(&state_dir),
            state_dir,
            db,
            scheduler,
            clock,
        })
    }

    pub fn fetcher(&self) -> SeedFetcher {
        let downloader = HttpSeedDownloader::new(
            self.cfg.seed_url.clone(),
            self.state_dir.join(SEED_FILE_NAME),
        );
        SeedFetcher::new(
            self.settings.clone(),
            self.db.clone(),
            self.stamp.clone(),
            self.scheduler.clone() as Arc<dyn JobScheduler>,
            Arc::new(downloader) as Arc<dyn Downloader>,
            Arc::clone(&self.clock),
        )
    }

    pub fn records_path(&self) -> PathBuf {
        bridge::records_path(&self.state_dir)
    }

    pub fn socket_path(&self) -> PathBuf {
        bridge::socket_path(&self.state_dir)
    }
}
