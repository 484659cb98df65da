pub mod config;
pub mod logging;

pub mod bridge;
pub mod clock;
pub mod downloader;
pub mod fetcher;
pub mod platform;
pub mod stamp;
pub mod state_db;
