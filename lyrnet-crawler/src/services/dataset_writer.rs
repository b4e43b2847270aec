//! Crawl output table
//!
//! Rows accumulate in memory and the whole table is rewritten at each
//! checkpoint. Output is tab separated with a header row; fields holding
//! tabs, quotes or newlines are quoted.

use crate::error::CrawlError;
use lyrnet_common::fs::replace_atomic;
use lyrnet_common::song::{COL_GENRES, CRAWL_OUTPUT_FILE_NAME};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// `wasabi_songs_<start>.csv`
pub fn checkpoint_path(dir: &Path, start: u64) -> PathBuf {
    dir.join(format!("wasabi_songs_{}.csv", start))
}

/// `wasabi_songs.csv`
pub fn final_path(dir: &Path) -> PathBuf {
    dir.join(CRAWL_OUTPUT_FILE_NAME)
}

#[derive(Debug, Clone)]
pub struct SongTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl SongTable {
    /// Requested fields followed by the resolved `genres` column
    pub fn new(fields: &[&str]) -> Self {
        let mut columns: Vec<String> = fields.iter().map(|f| f.to_string()).collect();
        columns.push(COL_GENRES.to_string());
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        debug_assert_eq!(row.len(), self.columns.len());
        self.rows.push(row);
    }

    pub fn write_tsv<W: Write>(&self, writer: W) -> io::Result<()> {
        let mut wtr = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .from_writer(writer);
        wtr.write_record(&self.columns)?;
        for row in &self.rows {
            wtr.write_record(row)?;
        }
        wtr.flush()
    }

    /// Atomically replace `path` with the current table
    pub fn save(&self, path: &Path) -> Result<(), CrawlError> {
        replace_atomic(path, |w| self.write_tsv(w)).map_err(|source| CrawlError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!(path = %path.display(), rows = self.len(), "Song table written");
        Ok(())
    }
}
