//! Error types for lyrnet-crawler

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned status {status} for {url}")]
    Status { status: u16, url: String },

    #[error("Unexpected API response for {request}: {message}")]
    Response { request: String, message: String },

    #[error("Cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid range: left {left} must not exceed right {right}")]
    InvalidRange { left: u64, right: u64 },
}
