//! Genre lookup for crawled songs
//!
//! The song's own genre wins; otherwise the genre of its album is used.
//! Album genres are cached for the whole crawl (including empty ones) so each
//! album is requested at most once.

use super::wasabi_client::{field_text, SongApi};
use crate::error::CrawlError;
use lyrnet_common::song::{COL_ALBUM_ID, COL_GENRE};
use std::collections::HashMap;

/// Album id -> genre, owned by one crawl run
#[derive(Debug, Default)]
pub struct AlbumGenreCache {
    genres: HashMap<String, String>,
    hits: usize,
}

impl AlbumGenreCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, album_id: &str) -> Option<&str> {
        let genre = self.genres.get(album_id)?;
        self.hits += 1;
        Some(genre.as_str())
    }

    pub fn insert(&mut self, album_id: &str, genre: String) {
        self.genres.insert(album_id.to_string(), genre);
    }

    pub fn len(&self) -> usize {
        self.genres.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genres.is_empty()
    }

    /// Lookups answered without a request
    pub fn hits(&self) -> usize {
        self.hits
    }
}

/// Genre for `song_id`: song genre, else album genre, else empty
pub async fn resolve_genre<A>(
    api: &A,
    cache: &mut AlbumGenreCache,
    song_id: &str,
) -> Result<String, CrawlError>
where
    A: SongApi + ?Sized,
{
    if song_id.is_empty() {
        return Ok(String::new());
    }

    let (genre, album_id) = match api.song(song_id).await? {
        Some(song) => (field_text(&song, COL_GENRE), field_text(&song, COL_ALBUM_ID)),
        None => (String::new(), String::new()),
    };
    if !genre.is_empty() || album_id.is_empty() {
        return Ok(genre);
    }

    if let Some(cached) = cache.get(&album_id) {
        return Ok(cached.to_string());
    }

    let album_genre = api
        .album(&album_id)
        .await?
        .map(|album| field_text(&album, COL_GENRE))
        .unwrap_or_default();
    cache.insert(&album_id, album_genre.clone());
    tracing::debug!(album_id = %album_id, genre = %album_genre, "Album genre cached");

    Ok(album_genre)
}
