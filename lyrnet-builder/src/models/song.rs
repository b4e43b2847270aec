//! Song records as read from the dataset

/// One usable dataset row, immutable after loading
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongRecord {
    /// Opaque unique identifier, also the artifact file stem
    pub id: String,
    /// Normalized lyrics (lowercased, markup stripped, entities decoded)
    pub lyrics: String,
    pub language: Option<String>,
    pub language_detect: Option<String>,
    pub title: Option<String>,
}

impl SongRecord {
    pub fn new(id: impl Into<String>, lyrics: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            lyrics: lyrics.into(),
            language: None,
            language_detect: None,
            title: None,
        }
    }
}
