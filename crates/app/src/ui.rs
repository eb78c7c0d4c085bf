use guess_that_song_core::Phase;
use guess_that_song_engine::{GameSession, Notice};
use std::fmt::Write;

pub const TITLE: &str = "🎵 Song Guessing Game";

/// What the player typed at an in-game prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    /// Zero-based option index.
    Pick(usize),
    Continue,
    Restart,
    Quit,
    Yes,
    No,
    Invalid,
}

pub fn parse_reply(line: &str) -> Reply {
    match line.trim().to_lowercase().as_str() {
        "" => Reply::Continue,
        "r" | "restart" => Reply::Restart,
        "q" | "quit" => Reply::Quit,
        "y" | "yes" => Reply::Yes,
        "n" | "no" => Reply::No,
        other => other
            .parse::<usize>()
            .ok()
            .filter(|n| (1..=3).contains(n))
            .map(|n| Reply::Pick(n - 1))
            .unwrap_or(Reply::Invalid),
    }
}

pub fn setup_screen() -> String {
    format!(
        "\n{TITLE}\nEnter an artist name or genre to start the game!\n(e.g., Taylor Swift, Rock, Pop... Ctrl-D quits)\n"
    )
}

pub fn round_screen(session: &GameSession) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "\nRound: {}/{}    Score: {}",
        session.round(),
        session.total_rounds(),
        session.score()
    );
    let _ = writeln!(out, "🎧 Listen and guess the song!");
    for (idx, option) in session.options().iter().enumerate() {
        let _ = writeln!(out, "  {}) {}  ({})", idx + 1, option.title, option.artist);
    }
    out
}

pub fn result_screen(session: &GameSession) -> String {
    let mut out = String::new();
    let Some(track) = session.reveal() else {
        return out;
    };
    match session.phase() {
        Phase::Correct => {
            let _ = writeln!(out, "\n✅ Correct!");
        }
        _ => {
            let _ = writeln!(out, "\n❌ Wrong!");
            let _ = writeln!(out, "The correct answer was:");
        }
    }
    let _ = writeln!(out, "{}", track.title);
    let _ = writeln!(out, "by {}", track.artist);
    out
}

pub fn continue_label(session: &GameSession) -> &'static str {
    if session.is_last_round() {
        "See Results"
    } else {
        "Next Round"
    }
}

pub fn game_over_screen(session: &GameSession) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\n🎉 Game Over!");
    let _ = writeln!(
        out,
        "Final Score: {}/{}",
        session.score(),
        session.total_rounds()
    );
    if let Some(verdict) = session.verdict() {
        let _ = writeln!(out, "{}", verdict.message());
    }
    out
}

pub fn notice(notice: &Notice) -> String {
    format!("⚠ {}", notice.message())
}
