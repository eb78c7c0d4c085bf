use async_trait::async_trait;
use guess_that_song_core::{PoolError, Track, TrackPool};
use thiserror::Error;

mod itunes;

pub use itunes::ItunesCatalog;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search term is empty")]
    EmptyTerm,

    #[error("invalid search url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("search request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("search endpoint returned HTTP {0}")]
    Status(u16),

    #[error("search response could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("only {found} playable tracks found, need at least {required}")]
    NotEnoughTracks { found: usize, required: usize },
}

impl SearchError {
    /// True for the "not enough results" outcome; every other kind is a
    /// failed fetch.
    pub fn is_insufficient(&self) -> bool {
        matches!(self, SearchError::NotEnoughTracks { .. })
    }
}

impl From<PoolError> for SearchError {
    fn from(err: PoolError) -> Self {
        match err {
            PoolError::TooSmall { found, required } => {
                SearchError::NotEnoughTracks { found, required }
            }
        }
    }
}

/// Source of playable tracks for a quiz. Each call to `search` is one
/// independent attempt.
#[async_trait]
pub trait TrackCatalog: Send + Sync {
    fn name(&self) -> &'static str;
    async fn search(&self, term: &str) -> Result<TrackPool, SearchError>;
}

/// In-memory catalog that matches a term against title, artist or album.
pub struct StaticCatalog {
    tracks: Vec<Track>,
}

impl StaticCatalog {
    pub fn new(tracks: Vec<Track>) -> Self {
        Self { tracks }
    }

    /// Built-in catalog for playing without the search endpoint. Its preview
    /// URLs do not resolve, so rounds run silently.
    pub fn demo() -> Self {
        let rows: [(u64, &str, &str, &str); 6] = [
            (1001, "Bohemian Rhapsody", "Queen", "A Night at the Opera"),
            (1002, "Don't Stop Me Now", "Queen", "Jazz"),
            (1003, "Under Pressure", "Queen", "Hot Space"),
            (1004, "Another One Bites the Dust", "Queen", "The Game"),
            (1005, "Radio Ga Ga", "Queen", "The Works"),
            (1006, "Killer Queen", "Queen", "Sheer Heart Attack"),
        ];
        let tracks = rows
            .into_iter()
            .map(|(id, title, artist, album)| Track {
                id,
                title: title.to_string(),
                artist: artist.to_string(),
                album: Some(album.to_string()),
                preview_url: format!("https://audio.example.invalid/previews/{id}.m4a"),
            })
            .collect();
        Self::new(tracks)
    }
}

#[async_trait]
impl TrackCatalog for StaticCatalog {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn search(&self, term: &str) -> Result<TrackPool, SearchError> {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return Err(SearchError::EmptyTerm);
        }

        let matches = self
            .tracks
            .iter()
            .filter(|t| {
                t.title.to_lowercase().contains(&needle)
                    || t.artist.to_lowercase().contains(&needle)
                    || t.album
                        .as_deref()
                        .map(|a| a.to_lowercase().contains(&needle))
                        .unwrap_or(false)
            })
            .cloned()
            .collect();

        Ok(TrackPool::new(matches)?)
    }
}
