//! Song dataset schema
//!
//! The crawler writes these columns and the network builder reads them, so
//! the names live in one place.

/// Dataset file consumed by the network builder
pub const DATASET_FILE_NAME: &str = "wasabi_songs_without_genre_final.csv";

/// Final crawler output file
pub const CRAWL_OUTPUT_FILE_NAME: &str = "wasabi_songs.csv";

pub const COL_ID: &str = "_id";
pub const COL_LYRICS: &str = "lyrics";
pub const COL_LANGUAGE: &str = "language";
pub const COL_LANGUAGE_DETECT: &str = "language_detect";
pub const COL_TITLE: &str = "title";
pub const COL_ALBUM_ID: &str = "id_album";
pub const COL_GENRE: &str = "genre";
pub const COL_GENRES: &str = "genres";

/// Declared language accepted by the loader
pub const LANGUAGE_ENGLISH: &str = "eng";
/// Detected language accepted by the loader
pub const LANGUAGE_DETECT_ENGLISH: &str = "english";

/// Fields requested from the song index, in output column order
pub const CRAWL_FIELDS: &[&str] = &[
    "_id",
    "position",
    "lengthAlbum",
    "lyrics",
    "urlWikipedia",
    "id_album",
    "isClassic",
    "title",
    "publicationDateAlbum",
    "albumTitle",
    "deezer_mapping",
    "id_song_deezer",
    "isrc",
    "length",
    "explicitLyrics",
    "rank",
    "bpm",
    "gain",
    "preview",
    "publicationDate",
    "urlITunes",
    "urlSpotify",
    "urlYouTube",
    "urlAmazon",
    "urlLastFm",
    "language",
    "id_artist_deezer",
    "id_album_deezer",
    "urlDeezer",
    "language_detect",
    "name",
    "title_accent_fold",
    "explicit_content_lyrics",
    "chords_metadata",
];

/// Markers the tabular reader treats as a missing value
pub const MISSING_VALUE_MARKERS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "NULL", "null", "None", "<NA>", "#N/A",
];

/// Whether a raw field should be read as missing
pub fn is_missing(value: &str) -> bool {
    MISSING_VALUE_MARKERS.contains(&value)
}
