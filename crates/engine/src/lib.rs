use guess_that_song_catalog::SearchError;
use guess_that_song_core::{Phase, Track, TrackOption, TrackPool, TOTAL_ROUNDS};
use rand::Rng;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

mod round;

pub use round::Round;

/// User-facing notice raised when a search attempt ends without a game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    NotEnoughTracks { found: usize },
    FetchFailed,
}

impl Notice {
    pub fn message(&self) -> &'static str {
        match self {
            Notice::NotEnoughTracks { .. } => {
                "Not enough songs found. Try a different search term!"
            }
            Notice::FetchFailed => "Failed to fetch songs. Please try again!",
        }
    }
}

impl From<&SearchError> for Notice {
    fn from(err: &SearchError) -> Self {
        match err {
            SearchError::NotEnoughTracks { found, .. } => Notice::NotEnoughTracks { found: *found },
            SearchError::EmptyTerm => Notice::NotEnoughTracks { found: 0 },
            _ => Notice::FetchFailed,
        }
    }
}

/// Side effects a transition asks the caller to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineAction {
    PlayPreview { url: String },
    StopPlayback,
    Notice(Notice),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Perfect,
    Great,
    KeepPracticing,
}

impl Verdict {
    pub fn from_score(score: u32, total: u32) -> Self {
        if score >= total {
            Verdict::Perfect
        } else if score >= 3 {
            Verdict::Great
        } else {
            Verdict::KeepPracticing
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Verdict::Perfect => "Perfect score! You're a music master!",
            Verdict::Great => "Great job! You know your music!",
            Verdict::KeepPracticing => "Keep practicing! Music is fun!",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("cannot {event} during the {phase} phase")]
    InvalidPhase { event: &'static str, phase: Phase },

    #[error("search query is empty")]
    EmptyQuery,

    #[error("a search is already in progress")]
    SearchInFlight,

    #[error("no search is in progress")]
    NoSearchInFlight,

    #[error("no track pool to draw a round from")]
    MissingPool,
}

/// Result of a transition: the next session plus the effects to apply, in
/// order.
#[derive(Debug, Clone)]
pub struct Step {
    pub session: GameSession,
    pub actions: Vec<EngineAction>,
}

impl Step {
    fn quiet(session: GameSession) -> Self {
        Self {
            session,
            actions: Vec::new(),
        }
    }
}

/// Complete quiz state. Transitions never mutate a session in place; they
/// return the next one inside a [`Step`].
#[derive(Debug, Clone)]
pub struct GameSession {
    phase: Phase,
    score: u32,
    round: u32,
    query: String,
    loading: bool,
    pool: Option<Arc<TrackPool>>,
    current: Option<Round>,
    pending_preview: Option<String>,
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new()
    }
}

impl GameSession {
    pub fn new() -> Self {
        Self {
            phase: Phase::Setup,
            score: 0,
            round: 1,
            query: String::new(),
            loading: false,
            pool: None,
            current: None,
            pending_preview: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn total_rounds(&self) -> u32 {
        TOTAL_ROUNDS
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn pool(&self) -> Option<&TrackPool> {
        self.pool.as_deref()
    }

    pub fn current_round(&self) -> Option<&Round> {
        self.current.as_ref()
    }

    pub fn options(&self) -> &[TrackOption] {
        self.current
            .as_ref()
            .map(|r| r.options().as_slice())
            .unwrap_or(&[])
    }

    /// The track that was playing, once the player has answered.
    pub fn reveal(&self) -> Option<&Track> {
        match self.phase {
            Phase::Correct | Phase::Wrong => self.current.as_ref().map(Round::correct),
            _ => None,
        }
    }

    pub fn verdict(&self) -> Option<Verdict> {
        (self.phase == Phase::GameOver).then(|| Verdict::from_score(self.score, TOTAL_ROUNDS))
    }

    /// True when advancing from the current result screen ends the game.
    pub fn is_last_round(&self) -> bool {
        self.round >= TOTAL_ROUNDS
    }

    pub fn set_query(&self, query: impl Into<String>) -> Result<Step, EngineError> {
        self.expect_phase(Phase::Setup, "edit the query")?;
        if self.loading {
            return Err(EngineError::SearchInFlight);
        }
        let mut next = self.clone();
        next.query = query.into();
        Ok(Step::quiet(next))
    }

    /// Marks a search as in flight. The caller runs the search for
    /// `session.query()` and reports back with `search_succeeded` or
    /// `search_failed`.
    pub fn begin_search(&self) -> Result<Step, EngineError> {
        self.expect_phase(Phase::Setup, "start a search")?;
        if self.loading {
            return Err(EngineError::SearchInFlight);
        }
        if self.query.trim().is_empty() {
            return Err(EngineError::EmptyQuery);
        }
        let mut next = self.clone();
        next.loading = true;
        Ok(Step::quiet(next))
    }

    pub fn search_succeeded<R: Rng>(
        &self,
        pool: TrackPool,
        rng: &mut R,
    ) -> Result<Step, EngineError> {
        self.expect_phase(Phase::Setup, "start a game")?;
        if !self.loading {
            return Err(EngineError::NoSearchInFlight);
        }
        info!(query = %self.query, pool = pool.len(), "starting game");

        let mut next = self.clone();
        next.loading = false;
        next.score = 0;
        next.round = 1;
        next.load_round(Arc::new(pool), rng);
        Ok(Step::quiet(next))
    }

    pub fn search_failed(&self, err: &SearchError) -> Result<Step, EngineError> {
        if !self.loading {
            return Err(EngineError::NoSearchInFlight);
        }
        let mut next = self.clone();
        next.loading = false;
        Ok(Step {
            session: next,
            actions: vec![EngineAction::Notice(Notice::from(err))],
        })
    }

    /// Signals that the round is on screen. Releases the pending preview,
    /// once.
    pub fn surface_ready(&self) -> Step {
        if self.phase != Phase::Playing {
            return Step::quiet(self.clone());
        }
        let mut next = self.clone();
        match next.pending_preview.take() {
            Some(url) => Step {
                session: next,
                actions: vec![EngineAction::PlayPreview { url }],
            },
            None => Step::quiet(next),
        }
    }

    pub fn answer(&self, option_id: u64) -> Result<Step, EngineError> {
        self.expect_phase(Phase::Playing, "answer")?;
        let Some(round) = self.current.as_ref() else {
            return Err(EngineError::InvalidPhase {
                event: "answer",
                phase: self.phase,
            });
        };

        let mut next = self.clone();
        next.pending_preview = None;
        if round.is_correct(option_id) {
            next.score += 1;
            next.phase = Phase::Correct;
        } else {
            next.phase = Phase::Wrong;
        }
        debug!(round = next.round, score = next.score, phase = %next.phase, "answer evaluated");

        Ok(Step {
            session: next,
            actions: vec![EngineAction::StopPlayback],
        })
    }

    pub fn advance<R: Rng>(&self, rng: &mut R) -> Result<Step, EngineError> {
        if !matches!(self.phase, Phase::Correct | Phase::Wrong) {
            return Err(EngineError::InvalidPhase {
                event: "advance",
                phase: self.phase,
            });
        }

        let mut next = self.clone();
        if self.round >= TOTAL_ROUNDS {
            next.phase = Phase::GameOver;
            next.current = None;
            info!(score = next.score, total = TOTAL_ROUNDS, "game over");
        } else {
            let pool = self.pool.clone().ok_or(EngineError::MissingPool)?;
            next.round += 1;
            next.load_round(pool, rng);
        }
        Ok(Step::quiet(next))
    }

    pub fn restart(&self) -> Step {
        Step {
            session: GameSession::new(),
            actions: vec![EngineAction::StopPlayback],
        }
    }

    fn load_round<R: Rng>(&mut self, pool: Arc<TrackPool>, rng: &mut R) {
        let round = Round::draw(&pool, rng);
        debug!(round = self.round, correct = round.correct().id, "round drawn");
        self.pending_preview = Some(round.correct().preview_url.clone());
        self.current = Some(round);
        self.pool = Some(pool);
        self.phase = Phase::Playing;
    }

    fn expect_phase(&self, phase: Phase, event: &'static str) -> Result<(), EngineError> {
        if self.phase == phase {
            Ok(())
        } else {
            Err(EngineError::InvalidPhase {
                event,
                phase: self.phase,
            })
        }
    }
}
