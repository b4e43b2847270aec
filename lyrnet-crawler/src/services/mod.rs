//! Crawl stages: API access, genre resolution, table output

pub mod dataset_writer;
pub mod genre_resolver;
pub mod wasabi_client;
