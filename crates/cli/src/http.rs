//! Image downloads for markdown rendering.

use roadmap_core::{Error, ImageBlob, ImageFetcher, Result};
use std::time::Duration;

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Downloads images over HTTP with a blocking client.
pub struct HttpImageFetcher {
    client: reqwest::blocking::Client,
}

impl HttpImageFetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| Error::HttpError(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

impl ImageFetcher for HttpImageFetcher {
    fn fetch(&self, url: &str) -> Result<ImageBlob> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| Error::HttpError(format!("GET {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpError(format!("GET {}: HTTP {}", url, status)));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response
            .bytes()
            .map_err(|e| Error::HttpError(format!("failed to read {}: {}", url, e)))?;

        log::debug!("Downloaded {} ({} bytes)", url, bytes.len());
        Ok(ImageBlob::from_bytes(bytes.to_vec(), content_type))
    }
}
