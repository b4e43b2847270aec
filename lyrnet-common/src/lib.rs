//! # lyrnet Common Library
//!
//! Shared code for the lyrnet binaries including:
//! - Error type used across crates
//! - Configuration loading and root folder resolution
//! - Song dataset column schema (written by the crawler, read by the builder)
//! - Atomic file creation helpers

pub mod config;
pub mod error;
pub mod fs;
pub mod song;

pub use error::{Error, Result};
