//! Seed download collaborator.
//!
//! The scheduler only needs a status code back; how the seed bytes travel and
//! where they are stored is the downloader's business. `HttpSeedDownloader` is
//! the production implementation (libcurl); tests supply their own.

mod http;

pub use http::{HttpSeedDownloader, SEED_FILE_NAME};

/// Platform identifier sent with every seed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariationsPlatform {
    AndroidWebview,
}

impl VariationsPlatform {
    /// Value of the `osname` query parameter.
    pub fn as_str(self) -> &'static str {
        match self {
            VariationsPlatform::AndroidWebview => "android_webview",
        }
    }
}

/// Parameters of one seed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedRequest {
    pub platform: VariationsPlatform,
    pub restrict_mode: Option<String>,
    /// Browser milestone; always positive.
    pub milestone: u32,
    pub channel: String,
}

/// What came back from one download attempt.
#[derive(Debug, Clone, Default)]
pub struct SeedFetchInfo {
    /// HTTP-style status: 0 or positive on completion, negative on transport failure.
    pub result_code: i64,
    /// Response body, if the downloader kept it.
    pub payload: Option<Vec<u8>>,
}

/// Failure of the download itself (as opposed to a non-success status code).
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("seed request transport failed: {0}")]
    Transport(String),
    #[error("invalid seed request: {0}")]
    InvalidRequest(String),
    #[error("storing seed failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Fetches a seed. Blocking; async callers run it under `spawn_blocking`.
pub trait Downloader: Send + Sync {
    fn download(&self, request: &SeedRequest) -> Result<SeedFetchInfo, DownloadError>;
}
