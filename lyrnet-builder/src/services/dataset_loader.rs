//! Song dataset loader
//!
//! Reads the tab-separated song table, keeps rows with lyrics whose declared
//! language is `eng` or detected language is `english`, and normalizes the
//! lyric text. Rows are filtered before any defaulting, so a row without
//! lyrics never reaches the pipeline as an empty string.

use crate::models::SongRecord;
use lyrnet_common::song::{
    is_missing, COL_ID, COL_LANGUAGE, COL_LANGUAGE_DETECT, COL_LYRICS, LANGUAGE_DETECT_ENGLISH,
    LANGUAGE_ENGLISH,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Markup-like tags, non-greedy, never spanning a newline
static TAG_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"<.*?>").expect("valid tag regex"));

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Dataset not found: {0}")]
    NotFound(PathBuf),

    #[error("Dataset is missing required column '{0}'")]
    MissingColumn(&'static str),

    #[error("Dataset parse error at line {line}: {message}")]
    Parse { line: u64, message: String },

    #[error("Dataset read error: {0}")]
    Io(#[from] std::io::Error),
}

/// Raw row; every column may be absent or hold a missing-value marker
#[derive(Debug, Deserialize)]
struct RawSongRow {
    #[serde(rename = "_id")]
    id: Option<String>,
    lyrics: Option<String>,
    language: Option<String>,
    language_detect: Option<String>,
    title: Option<String>,
}

/// Row counts from one load
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub total_rows: usize,
    pub kept: usize,
    pub dropped_missing_lyrics: usize,
    pub dropped_language: usize,
    pub dropped_missing_id: usize,
}

/// Load and filter the dataset file
pub fn load_songs(path: &Path) -> Result<(Vec<SongRecord>, LoadStats), DatasetError> {
    if !path.is_file() {
        return Err(DatasetError::NotFound(path.to_path_buf()));
    }
    let file = std::fs::File::open(path)?;
    let (songs, stats) = load_songs_from_reader(file)?;

    tracing::info!(
        path = %path.display(),
        total = stats.total_rows,
        kept = stats.kept,
        no_lyrics = stats.dropped_missing_lyrics,
        other_language = stats.dropped_language,
        no_id = stats.dropped_missing_id,
        "Dataset loaded"
    );

    Ok((songs, stats))
}

/// Load and filter from any reader (tab separated, header row)
pub fn load_songs_from_reader<R: Read>(
    reader: R,
) -> Result<(Vec<SongRecord>, LoadStats), DatasetError> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .from_reader(reader);

    let headers = rdr.headers().map_err(csv_error)?.clone();
    for required in [COL_ID, COL_LYRICS] {
        if !headers.iter().any(|h| h == required) {
            return Err(DatasetError::MissingColumn(required));
        }
    }
    if !headers
        .iter()
        .any(|h| h == COL_LANGUAGE || h == COL_LANGUAGE_DETECT)
    {
        return Err(DatasetError::MissingColumn(COL_LANGUAGE));
    }

    let mut songs = Vec::new();
    let mut stats = LoadStats::default();

    for result in rdr.deserialize::<RawSongRow>() {
        let row = result.map_err(csv_error)?;
        stats.total_rows += 1;

        let Some(lyrics) = present(row.lyrics) else {
            stats.dropped_missing_lyrics += 1;
            continue;
        };

        let language = present(row.language);
        let language_detect = present(row.language_detect);
        if !is_english(language.as_deref(), language_detect.as_deref()) {
            stats.dropped_language += 1;
            continue;
        }

        let Some(id) = present(row.id) else {
            tracing::warn!(row = stats.total_rows, "Skipping row without song id");
            stats.dropped_missing_id += 1;
            continue;
        };

        songs.push(SongRecord {
            id,
            lyrics: normalize_lyrics(&lyrics),
            language,
            language_detect,
            title: present(row.title),
        });
    }

    stats.kept = songs.len();
    Ok((songs, stats))
}

/// Inclusive OR of the two language tags
pub fn is_english(language: Option<&str>, language_detect: Option<&str>) -> bool {
    language == Some(LANGUAGE_ENGLISH) || language_detect == Some(LANGUAGE_DETECT_ENGLISH)
}

/// Lowercase, replace tags with a space, decode HTML entities
pub fn normalize_lyrics(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    let stripped = TAG_PATTERN.replace_all(&lowered, " ");
    htmlize::unescape(&*stripped).into_owned()
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !is_missing(v))
}

fn csv_error(e: csv::Error) -> DatasetError {
    let line = e.position().map(|p| p.line()).unwrap_or(0);
    match e.into_kind() {
        csv::ErrorKind::Io(io) => DatasetError::Io(io),
        kind => DatasetError::Parse {
            line,
            message: format!("{:?}", kind),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "_id\ttitle\tlyrics\tlanguage\tlanguage_detect\tbpm\n";

    fn load(body: &str) -> (Vec<SongRecord>, LoadStats) {
        let data = format!("{}{}", HEADER, body);
        load_songs_from_reader(data.as_bytes()).unwrap()
    }

    #[test]
    fn test_language_filter_is_inclusive_or() {
        let (songs, stats) = load(
            "a\tA\tla la\teng\tfrench\t120\n\
             b\tB\tla la\tfra\tenglish\t120\n\
             c\tC\tla la\tfra\tfrench\t120\n\
             d\tD\tla la\t\t\t120\n",
        );

        let ids: Vec<&str> = songs.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(stats.dropped_language, 2);
        assert_eq!(stats.total_rows, 4);
    }

    #[test]
    fn test_missing_lyrics_dropped_before_defaulting() {
        let (songs, stats) = load(
            "a\tA\t\teng\tenglish\t1\n\
             b\tB\tNaN\teng\tenglish\t1\n\
             c\tC\tyes\teng\tenglish\t1\n",
        );

        assert_eq!(songs.len(), 1);
        assert_eq!(songs[0].id, "c");
        assert_eq!(stats.dropped_missing_lyrics, 2);
    }

    #[test]
    fn test_normalization_order() {
        assert_eq!(normalize_lyrics("Hello<br>World"), "hello world");
        assert_eq!(normalize_lyrics("Rock &AMP; Roll"), "rock & roll");
        assert_eq!(normalize_lyrics("it&#39;s <i>fine</i>"), "it's  fine ");
        // legacy entities without a trailing semicolon
        assert_eq!(
            normalize_lyrics("rock &amp roll &copy 2000 &#39;em"),
            "rock & roll \u{a9} 2000 'em"
        );
        // tags never span lines
        assert_eq!(normalize_lyrics("a <b\nc> d"), "a <b\nc> d");
    }

    #[test]
    fn test_missing_column_is_fatal() {
        let data = "_id\ttitle\tlanguage\n1\tx\teng\n";
        let err = load_songs_from_reader(data.as_bytes()).unwrap_err();
        assert!(matches!(err, DatasetError::MissingColumn("lyrics")));
    }

    #[test]
    fn test_ragged_row_is_parse_error() {
        let data = format!("{}a\tA\tla\teng\n", HEADER);
        let err = load_songs_from_reader(data.as_bytes()).unwrap_err();
        assert!(matches!(err, DatasetError::Parse { .. }));
    }

    #[test]
    fn test_missing_file() {
        let err = load_songs(Path::new("/nonexistent/songs.csv")).unwrap_err();
        assert!(matches!(err, DatasetError::NotFound(_)));
    }
}
