use crate::ui::{self, Reply};
use anyhow::{anyhow, Context, Result};
use guess_that_song_catalog::TrackCatalog;
use guess_that_song_core::Phase;
use guess_that_song_engine::{EngineAction, GameSession, Notice, Step};
use guess_that_song_playback::PreviewPlayer;
use rand::rngs::StdRng;
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::Notify;
use tracing::{debug, info, warn};

/// Owns the session and carries out the effects each transition asks for.
pub struct Game {
    session: GameSession,
    catalog: Box<dyn TrackCatalog>,
    player: Box<dyn PreviewPlayer>,
    rng: StdRng,
}

impl Game {
    pub fn new(
        catalog: Box<dyn TrackCatalog>,
        player: Box<dyn PreviewPlayer>,
        rng: StdRng,
    ) -> Self {
        Self {
            session: GameSession::new(),
            catalog,
            player,
            rng,
        }
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub async fn search(&mut self, query: &str) -> Result<Vec<Notice>> {
        self.session = self.session.set_query(query)?.session;
        self.session = self.session.begin_search()?.session;

        let term = self.session.query().to_string();
        let step = match self.catalog.search(&term).await {
            Ok(pool) => self.session.search_succeeded(pool, &mut self.rng)?,
            Err(err) => {
                debug!(error=%err, catalog = self.catalog.name(), "search attempt ended without a game");
                self.session.search_failed(&err)?
            }
        };
        Ok(self.apply(step).await)
    }

    /// Call once the round's options are on screen.
    pub async fn present_round(&mut self) {
        let step = self.session.surface_ready();
        self.apply(step).await;
    }

    pub async fn answer(&mut self, index: usize) -> Result<()> {
        let option_id = self
            .session
            .options()
            .get(index)
            .map(|o| o.id)
            .ok_or_else(|| anyhow!("no answer option {}", index + 1))?;
        let step = self.session.answer(option_id)?;
        self.apply(step).await;
        Ok(())
    }

    pub async fn advance(&mut self) -> Result<()> {
        let step = self.session.advance(&mut self.rng)?;
        self.apply(step).await;
        Ok(())
    }

    pub async fn restart(&mut self) {
        let step = self.session.restart();
        self.apply(step).await;
    }

    pub async fn shutdown(&mut self) {
        if !self.player.is_playing() {
            return;
        }
        debug!(player = self.player.name(), "stopping preview on exit");
        if let Err(err) = self.player.stop().await {
            warn!(error=%err, "failed to stop preview on exit");
        }
    }

    async fn apply(&mut self, step: Step) -> Vec<Notice> {
        self.session = step.session;
        let mut notices = Vec::new();
        for action in step.actions {
            match action {
                EngineAction::PlayPreview { url } => {
                    if let Err(err) = self.player.play(&url).await {
                        warn!(error=%err, player = self.player.name(), "preview playback failed; round continues");
                    }
                }
                EngineAction::StopPlayback => {
                    if let Err(err) = self.player.stop().await {
                        warn!(error=%err, player = self.player.name(), "failed to stop preview");
                    }
                }
                EngineAction::Notice(notice) => notices.push(notice),
            }
        }
        notices
    }
}

/// Request to leave the game. A trigger that arrives while nobody waits is
/// kept until the next wait.
#[derive(Clone, Default)]
pub struct Interrupt {
    notify: Arc<Notify>,
}

impl Interrupt {
    /// Fires on every Ctrl-C for the rest of the process.
    pub fn ctrl_c() -> Self {
        let interrupt = Self::default();
        let notify = Arc::clone(&interrupt.notify);
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                notify.notify_one();
            }
        });
        interrupt
    }

    pub fn trigger(&self) {
        self.notify.notify_one();
    }

    pub async fn wait(&self) {
        self.notify.notified().await;
    }
}

/// Line-oriented input that gives up when interrupted. Bytes that are not
/// UTF-8 are replaced rather than rejected.
pub struct Prompt<R> {
    reader: R,
    interrupt: Interrupt,
}

impl<R: AsyncBufRead + Unpin> Prompt<R> {
    pub fn new(reader: R, interrupt: Interrupt) -> Self {
        Self { reader, interrupt }
    }

    pub fn interrupt(&self) -> &Interrupt {
        &self.interrupt
    }

    pub async fn read<W: Write>(&mut self, out: &mut W, prompt: &str) -> Result<Option<String>> {
        write!(out, "{prompt}")?;
        out.flush()?;

        let mut buf = Vec::new();
        let read = tokio::select! {
            n = self.reader.read_until(b'\n', &mut buf) => Some(n),
            _ = self.interrupt.wait() => None,
        };
        let Some(read) = read else {
            writeln!(out)?;
            info!("interrupted; leaving game");
            return Ok(None);
        };
        if read.context("failed to read input")? == 0 {
            return Ok(None);
        }

        let line = String::from_utf8_lossy(&buf);
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}

/// Drives one interactive session until the player quits or input ends.
pub async fn run<R, W>(
    game: &mut Game,
    prompt: &mut Prompt<R>,
    out: &mut W,
    initial_query: Option<String>,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut queued = initial_query;

    loop {
        match game.session().phase() {
            Phase::Setup => {
                let query = match queued.take() {
                    Some(q) => q,
                    None => {
                        write!(out, "{}", ui::setup_screen())?;
                        match prompt.read(out, "Search> ").await? {
                            Some(line) => line,
                            None => break,
                        }
                    }
                };
                if query.trim().is_empty() {
                    continue;
                }
                writeln!(out, "Loading...")?;
                let searched = tokio::select! {
                    notices = game.search(&query) => Some(notices?),
                    _ = prompt.interrupt().wait() => None,
                };
                let Some(notices) = searched else {
                    writeln!(out)?;
                    info!("interrupted during search; leaving game");
                    break;
                };
                for notice in notices {
                    writeln!(out, "{}", ui::notice(&notice))?;
                }
            }
            Phase::Playing => {
                write!(out, "{}", ui::round_screen(game.session()))?;
                game.present_round().await;
                loop {
                    let Some(line) = prompt.read(out, "Your guess [1-3]> ").await? else {
                        return Ok(());
                    };
                    match ui::parse_reply(&line) {
                        Reply::Pick(index) => {
                            game.answer(index).await?;
                            break;
                        }
                        Reply::Restart => {
                            game.restart().await;
                            break;
                        }
                        Reply::Quit => return Ok(()),
                        _ => writeln!(out, "Pick 1, 2 or 3 (r restarts, q quits).")?,
                    }
                }
            }
            Phase::Correct | Phase::Wrong => {
                write!(out, "{}", ui::result_screen(game.session()))?;
                let label = format!("[Enter] {} > ", ui::continue_label(game.session()));
                let Some(line) = prompt.read(out, &label).await? else {
                    break;
                };
                match ui::parse_reply(&line) {
                    Reply::Restart => game.restart().await,
                    Reply::Quit => break,
                    _ => game.advance().await?,
                }
            }
            Phase::GameOver => {
                write!(out, "{}", ui::game_over_screen(game.session()))?;
                let Some(line) = prompt.read(out, "Play Again? [Y/n] > ").await? else {
                    break;
                };
                match ui::parse_reply(&line) {
                    Reply::No | Reply::Quit => break,
                    _ => game.restart().await,
                }
            }
        }
    }

    Ok(())
}
