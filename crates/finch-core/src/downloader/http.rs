//! HTTP seed download over libcurl.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::{DownloadError, Downloader, SeedFetchInfo, SeedRequest};

/// File name of the stored seed under the state dir.
pub const SEED_FILE_NAME: &str = "variations_seed";

/// Fetches the seed with a GET and stores a 200 body at `seed_path`.
#[derive(Debug, Clone)]
pub struct HttpSeedDownloader {
    seed_url: Option<String>,
    seed_path: PathBuf,
}

impl HttpSeedDownloader {
    pub fn new(seed_url: Option<String>, seed_path: impl Into<PathBuf>) -> Self {
        Self {
            seed_url,
            seed_path: seed_path.into(),
        }
    }

    /// Full request URL with the platform, milestone, channel and restrict parameters.
    pub fn request_url(&self, request: &SeedRequest) -> Result<url::Url, DownloadError> {
        let base = self
            .seed_url
            .as_deref()
            .ok_or_else(|| DownloadError::InvalidRequest("no seed_url configured".into()))?;
        let mut url = url::Url::parse(base)
            .map_err(|e| DownloadError::InvalidRequest(format!("{base}: {e}")))?;
        {
            let mut q = url.query_pairs_mut();
            q.append_pair("osname", request.platform.as_str());
            q.append_pair("milestone", &request.milestone.to_string());
            q.append_pair("channel", &request.channel);
            if let Some(restrict) = request.restrict_mode.as_deref().filter(|r| !r.is_empty()) {
                q.append_pair("restrict", restrict);
            }
        }
        Ok(url)
    }
}

impl Downloader for HttpSeedDownloader {
    fn download(&self, request: &SeedRequest) -> Result<SeedFetchInfo, DownloadError> {
        let url = self.request_url(request)?;
        let mut body: Vec<u8> = Vec::new();

        let mut easy = curl::easy::Easy::new();
        let transport = |e: curl::Error| DownloadError::Transport(e.to_string());
        easy.url(url.as_str()).map_err(transport)?;
        easy.follow_location(true).map_err(transport)?;
        easy.connect_timeout(Duration::from_secs(15)).map_err(transport)?;
        easy.timeout(Duration::from_secs(60)).map_err(transport)?;
        {
            let mut transfer = easy.transfer();
            transfer
                .write_function(|data| {
                    body.extend_from_slice(data);
                    Ok(data.len())
                })
                .map_err(transport)?;
            transfer.perform().map_err(transport)?;
        }
        let code = easy.response_code().map_err(transport)?;
        tracing::debug!(url = %url, code, bytes = body.len(), "seed request finished");

        if code == 200 {
            store_atomically(&self.seed_path, &body)?;
            tracing::info!(path = %self.seed_path.display(), bytes = body.len(), "stored new seed");
            return Ok(SeedFetchInfo {
                result_code: code as i64,
                payload: Some(body),
            });
        }
        Ok(SeedFetchInfo {
            result_code: code as i64,
            payload: None,
        })
    }
}

/// Write to a temp file beside `path`, then rename over it.
fn store_atomically(path: &Path, data: &[u8]) -> Result<(), DownloadError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| DownloadError::Io(e.error))?;
    Ok(())
}
