//! lyrnet-crawler library interface
//!
//! Downloads song metadata and lyrics from the WASABI song index into the
//! tab-separated table read by the network builder.

pub mod config;
pub mod crawler;
pub mod error;
pub mod services;

pub use crate::config::CrawlerConfig;
pub use crate::crawler::{CrawlSummary, Crawler};
pub use crate::error::CrawlError;
