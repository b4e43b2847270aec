//! CMU Pronouncing Dictionary
//!
//! Format: one entry per line, `word PH1 PH2 ...`; alternate pronunciations
//! are listed as `word(2) ...`; lines starting with `;;;` are comments and a
//! trailing `# ...` is an inline comment. Lookups are case-insensitive and
//! variants keep file order, so the first listed pronunciation is always the
//! same one.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DictionaryError {
    #[error("Dictionary not found: {0}")]
    NotFound(PathBuf),

    #[error("Dictionary read error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Dictionary contains no entries")]
    Empty,
}

/// Word -> pronunciations, each a list of phoneme symbols (stress marks kept)
#[derive(Debug, Clone, Default)]
pub struct PronouncingDictionary {
    entries: HashMap<String, Vec<Vec<String>>>,
}

impl PronouncingDictionary {
    pub fn load(path: &Path) -> Result<Self, DictionaryError> {
        if !path.is_file() {
            return Err(DictionaryError::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        let dictionary = Self::parse(&content)?;

        tracing::info!(
            path = %path.display(),
            words = dictionary.len(),
            "Pronouncing dictionary loaded"
        );
        Ok(dictionary)
    }

    /// Parse dictionary text; malformed lines are skipped
    pub fn parse(content: &str) -> Result<Self, DictionaryError> {
        let mut entries: HashMap<String, Vec<Vec<String>>> = HashMap::new();
        let mut skipped = 0usize;

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with(";;;") {
                continue;
            }
            let line = match line.find('#') {
                Some(idx) => line[..idx].trim_end(),
                None => line,
            };

            let mut parts = line.split_whitespace();
            let Some(word_raw) = parts.next() else {
                continue;
            };
            let phonemes: Vec<String> = parts.map(str::to_string).collect();
            if phonemes.is_empty() {
                skipped += 1;
                continue;
            }

            entries
                .entry(strip_variant(word_raw).to_lowercase())
                .or_default()
                .push(phonemes);
        }

        if skipped > 0 {
            tracing::debug!(skipped, "Skipped dictionary lines without phonemes");
        }
        if entries.is_empty() {
            return Err(DictionaryError::Empty);
        }
        Ok(Self { entries })
    }

    /// All pronunciations of `word`, in file order
    pub fn pronunciations(&self, word: &str) -> &[Vec<String>] {
        self.entries
            .get(&word.to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// First listed pronunciation of `word`
    pub fn first_pronunciation(&self, word: &str) -> Option<&[String]> {
        self.pronunciations(word).first().map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// `word(2)` -> `word`
fn strip_variant(word: &str) -> &str {
    match word.find('(') {
        Some(idx) if word.ends_with(')') && idx > 0 => &word[..idx],
        _ => word,
    }
}
