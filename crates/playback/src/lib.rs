use anyhow::{Context, Result};
use async_trait::async_trait;
use guess_that_song_core::PlaybackConfig;
use std::process::Stdio;
use tokio::process::{Child, Command};
use tracing::debug;

/// The single playback handle of a game. `stop` must be safe to call when
/// nothing is playing.
#[async_trait]
pub trait PreviewPlayer: Send {
    fn name(&self) -> &'static str;
    async fn play(&mut self, url: &str) -> Result<()>;
    async fn stop(&mut self) -> Result<()>;
    fn is_playing(&mut self) -> bool;
}

/// Plays previews by handing the URL to an external player process.
pub struct CommandPlayer {
    command: String,
    args: Vec<String>,
    child: Option<Child>,
}

impl CommandPlayer {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
            child: None,
        }
    }

    pub fn from_config(cfg: &PlaybackConfig) -> Self {
        Self::new(cfg.command.clone(), cfg.args.clone())
    }

    pub fn command(&self) -> &str {
        &self.command
    }
}

#[async_trait]
impl PreviewPlayer for CommandPlayer {
    fn name(&self) -> &'static str {
        "command"
    }

    async fn play(&mut self, url: &str) -> Result<()> {
        self.stop().await?;

        let child = Command::new(&self.command)
            .args(&self.args)
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to start player `{}`", self.command))?;

        debug!(pid = ?child.id(), url, "preview started");
        self.child = Some(child);
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        if child.try_wait()?.is_none() {
            child
                .kill()
                .await
                .with_context(|| format!("failed to stop player `{}`", self.command))?;
            debug!("preview stopped");
        }
        Ok(())
    }

    fn is_playing(&mut self) -> bool {
        match self.child.as_mut() {
            Some(child) => matches!(child.try_wait(), Ok(None)),
            None => false,
        }
    }
}

/// Player used when audio is disabled.
#[derive(Default)]
pub struct SilentPlayer {
    current: Option<String>,
}

impl SilentPlayer {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PreviewPlayer for SilentPlayer {
    fn name(&self) -> &'static str {
        "silent"
    }

    async fn play(&mut self, url: &str) -> Result<()> {
        debug!(url, "playback disabled; skipping preview");
        self.current = Some(url.to_string());
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        self.current = None;
        Ok(())
    }

    fn is_playing(&mut self) -> bool {
        self.current.is_some()
    }
}

pub fn build_player(cfg: &PlaybackConfig, mute: bool) -> Box<dyn PreviewPlayer> {
    if mute || !cfg.enabled || cfg.command.trim().is_empty() {
        Box::new(SilentPlayer::new())
    } else {
        Box::new(CommandPlayer::from_config(cfg))
    }
}
