use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

/// Rounds played per game.
pub const TOTAL_ROUNDS: u32 = 10;

/// One correct answer plus two distractors.
pub const MIN_POOL_SIZE: usize = 3;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Track {
    pub id: u64,
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    pub preview_url: String,
}

impl Track {
    pub fn is_playable(&self) -> bool {
        !self.preview_url.trim().is_empty()
    }
}

/// Answer choice shown to the player. Carries no preview URL so an option
/// can never be used to play its own audio.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrackOption {
    pub id: u64,
    pub title: String,
    pub artist: String,
}

impl From<&Track> for TrackOption {
    fn from(track: &Track) -> Self {
        Self {
            id: track.id,
            title: track.title.clone(),
            artist: track.artist.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    #[error("only {found} playable tracks found, need at least {required}")]
    TooSmall { found: usize, required: usize },
}

/// Playable tracks returned by one search. Built once and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackPool {
    tracks: Vec<Track>,
}

impl TrackPool {
    /// Keeps playable candidates in their original order, dropping repeated
    /// ids after the first, and requires at least [`MIN_POOL_SIZE`] tracks.
    pub fn new(candidates: Vec<Track>) -> Result<Self, PoolError> {
        let mut seen = HashSet::new();
        let tracks: Vec<Track> = candidates
            .into_iter()
            .filter(Track::is_playable)
            .filter(|t| seen.insert(t.id))
            .collect();

        if tracks.len() < MIN_POOL_SIZE {
            return Err(PoolError::TooSmall {
                found: tracks.len(),
                required: MIN_POOL_SIZE,
            });
        }

        Ok(Self { tracks })
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn get(&self, id: u64) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == id)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    Setup,
    Playing,
    Correct,
    Wrong,
    GameOver,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Setup => "setup",
            Phase::Playing => "playing",
            Phase::Correct => "correct",
            Phase::Wrong => "wrong",
            Phase::GameOver => "gameOver",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::{Phase, PoolError, Track, TrackOption, TrackPool};

    fn track(id: u64, preview: &str) -> Track {
        Track {
            id,
            title: format!("Title {id}"),
            artist: "Artist".to_string(),
            album: None,
            preview_url: preview.to_string(),
        }
    }

    #[test]
    fn pool_drops_tracks_without_preview() {
        let pool = TrackPool::new(vec![
            track(1, "https://example.com/1.m4a"),
            track(2, ""),
            track(3, "https://example.com/3.m4a"),
            track(4, "   "),
            track(5, "https://example.com/5.m4a"),
        ])
        .unwrap();

        let ids: Vec<u64> = pool.tracks().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 3, 5]);
        assert!(pool.tracks().iter().all(Track::is_playable));
    }

    #[test]
    fn pool_rejects_fewer_than_three_playable() {
        let err = TrackPool::new(vec![
            track(1, "https://example.com/1.m4a"),
            track(2, "https://example.com/2.m4a"),
            track(3, ""),
        ])
        .unwrap_err();

        assert_eq!(
            err,
            PoolError::TooSmall {
                found: 2,
                required: 3
            }
        );
    }

    #[test]
    fn pool_keeps_first_of_duplicate_ids() {
        let mut dup = track(1, "https://example.com/dup.m4a");
        dup.title = "Duplicate".to_string();
        let err = TrackPool::new(vec![
            track(1, "https://example.com/1.m4a"),
            dup,
            track(2, "https://example.com/2.m4a"),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            PoolError::TooSmall {
                found: 2,
                required: 3
            }
        );

        let pool = TrackPool::new(vec![
            track(1, "https://example.com/1.m4a"),
            track(1, "https://example.com/dup.m4a"),
            track(2, "https://example.com/2.m4a"),
            track(3, "https://example.com/3.m4a"),
        ])
        .unwrap();
        assert_eq!(pool.len(), 3);
        assert_eq!(
            pool.get(1).map(|t| t.preview_url.as_str()),
            Some("https://example.com/1.m4a")
        );
    }

    #[test]
    fn option_strips_preview_url() {
        let t = track(7, "https://example.com/7.m4a");
        let opt = TrackOption::from(&t);
        assert_eq!(opt.id, 7);
        assert_eq!(opt.title, "Title 7");
        assert_eq!(opt.artist, "Artist");
    }

    #[test]
    fn phase_display_matches_glossary() {
        assert_eq!(Phase::Setup.to_string(), "setup");
        assert_eq!(Phase::GameOver.to_string(), "gameOver");
    }
}
