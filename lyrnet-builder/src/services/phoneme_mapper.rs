//! Lyrics -> flat phoneme sequence
//!
//! Each token contributes the phonemes of its first dictionary
//! pronunciation; tokens the dictionary does not know contribute nothing.
//! A token with a leading apostrophe ("'cause") is looked up as written
//! first, then without the apostrophe.

use super::pronouncing_dictionary::PronouncingDictionary;
use super::tokenizer::tokenize;
use std::sync::Arc;

/// Token counts for one mapping
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MappingStats {
    pub tokens: usize,
    pub recognized: usize,
}

/// Shared read-only across workers
#[derive(Debug, Clone)]
pub struct PhonemeMapper {
    dictionary: Arc<PronouncingDictionary>,
}

impl PhonemeMapper {
    pub fn new(dictionary: Arc<PronouncingDictionary>) -> Self {
        Self { dictionary }
    }

    /// Tokenize and map normalized lyrics
    pub fn phonemes_for(&self, lyrics: &str) -> (Vec<String>, MappingStats) {
        let tokens = tokenize(lyrics);
        self.map_tokens(&tokens)
    }

    pub fn map_tokens(&self, tokens: &[String]) -> (Vec<String>, MappingStats) {
        let mut phonemes = Vec::new();
        let mut stats = MappingStats {
            tokens: tokens.len(),
            recognized: 0,
        };

        for token in tokens {
            if let Some(pronunciation) = self.lookup(token) {
                stats.recognized += 1;
                phonemes.extend(pronunciation.iter().cloned());
            }
        }

        (phonemes, stats)
    }

    fn lookup(&self, token: &str) -> Option<&[String]> {
        self.dictionary.first_pronunciation(token).or_else(|| {
            token
                .strip_prefix('\'')
                .filter(|bare| !bare.is_empty())
                .and_then(|bare| self.dictionary.first_pronunciation(bare))
        })
    }
}
