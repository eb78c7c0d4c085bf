use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use guess_that_song_catalog::{ItunesCatalog, SearchError, StaticCatalog, TrackCatalog};
use guess_that_song_core::{AppConfig, TrackPool};
use guess_that_song_engine::Notice;
use guess_that_song_playback::{build_player, CommandPlayer};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tracing::info;

mod game;
mod ui;

#[derive(Parser, Debug)]
#[command(
    name = "guess-that-song",
    about = "Guess the song from its preview, ten rounds per game"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Play a game (default)
    Play {
        /// Artist or genre to search for right away
        #[arg(long)]
        query: Option<String>,

        /// Do not play previews
        #[arg(long)]
        mute: bool,

        /// Use the built-in offline catalog
        #[arg(long)]
        demo: bool,
    },
    /// List the playable tracks a search returns
    Search { query: String },
    Doctor,
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cmd = cli.command.unwrap_or(Commands::Play {
        query: None,
        mute: false,
        demo: false,
    });
    let cfg_path = cli.config.unwrap_or_else(default_config_path);

    match cmd {
        Commands::Config {
            action: ConfigAction::Init,
        } => {
            init_config(&cfg_path)?;
            println!("Initialized config at {}", cfg_path.display());
            Ok(())
        }
        Commands::Doctor => {
            let cfg = load_or_default(&cfg_path)?;
            init_logging(&cfg.log_level);
            doctor(&cfg, &cfg_path).await
        }
        Commands::Search { query } => {
            let cfg = load_or_default(&cfg_path)?;
            init_logging(&cfg.log_level);
            search(&cfg, &query).await
        }
        Commands::Play { query, mute, demo } => {
            let cfg = load_or_default(&cfg_path)?;
            init_logging(&cfg.log_level);
            play(&cfg, query, mute, demo).await
        }
    }
}

async fn play(cfg: &AppConfig, query: Option<String>, mute: bool, demo: bool) -> Result<()> {
    let catalog: Box<dyn TrackCatalog> = if demo {
        Box::new(StaticCatalog::demo())
    } else {
        Box::new(ItunesCatalog::new(&cfg.search).context("failed to build search client")?)
    };
    let player = build_player(&cfg.playback, mute);
    info!(catalog = catalog.name(), player = player.name(), "guess-that-song started");

    let mut game = game::Game::new(catalog, player, StdRng::from_entropy());
    let mut prompt = game::Prompt::new(
        tokio::io::BufReader::new(tokio::io::stdin()),
        game::Interrupt::ctrl_c(),
    );
    let mut out = std::io::stdout();

    let result = game::run(&mut game, &mut prompt, &mut out, query).await;
    game.shutdown().await;
    result
}

async fn search(cfg: &AppConfig, query: &str) -> Result<()> {
    let catalog = ItunesCatalog::new(&cfg.search).context("failed to build search client")?;
    let result = catalog.search(query).await;
    print_search(&mut std::io::stdout(), query, result)
}

/// Lists the pool, or prints the notice and fails so scripts see a non-zero
/// exit.
fn print_search<W: Write>(
    out: &mut W,
    query: &str,
    result: Result<TrackPool, SearchError>,
) -> Result<()> {
    match result {
        Ok(pool) => {
            writeln!(out, "{} playable tracks for \"{}\"", pool.len(), query.trim())?;
            for track in pool.tracks() {
                writeln!(out, "{:>12}  {} - {}", track.id, track.artist, track.title)?;
            }
            Ok(())
        }
        Err(err) => {
            writeln!(out, "{}", ui::notice(&Notice::from(&err)))?;
            Err(err).with_context(|| format!("search for \"{}\" failed", query.trim()))
        }
    }
}

async fn doctor(cfg: &AppConfig, cfg_path: &Path) -> Result<()> {
    println!("== guess-that-song doctor ==");
    println!(
        "Config file: {} ({})",
        cfg_path.display(),
        if cfg_path.exists() { "found" } else { "defaults" }
    );

    let catalog = ItunesCatalog::new(&cfg.search).context("failed to build search client")?;
    println!("Search URL: {}", catalog.search_url("Taylor Swift")?);

    if cfg.playback.enabled {
        let player = CommandPlayer::from_config(&cfg.playback);
        println!(
            "Player `{}`: {}",
            player.command(),
            if player_available(player.command()).await {
                "available"
            } else {
                "not found (previews will be skipped)"
            }
        );
    } else {
        println!("Player: disabled");
    }

    match catalog.search("Taylor Swift").await {
        Ok(pool) => println!("Search endpoint: reachable ({} playable tracks)", pool.len()),
        Err(err) => println!("Search endpoint: {err}"),
    }

    Ok(())
}

async fn player_available(command: &str) -> bool {
    let probe = tokio::process::Command::new(command)
        .arg("-version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .status();
    matches!(
        tokio::time::timeout(Duration::from_secs(3), probe).await,
        Ok(Ok(_))
    )
}

fn default_config_path() -> PathBuf {
    let base = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("guess-that-song").join("config.toml")
}

fn init_config(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {}", parent.display()))?;
    }
    let cfg = AppConfig::default();
    let toml = toml::to_string_pretty(&cfg)?;
    std::fs::write(path, toml)
        .with_context(|| format!("failed to write config file {}", path.display()))?;
    Ok(())
}

fn load_or_default(path: &Path) -> Result<AppConfig> {
    let mut cfg = if !path.exists() {
        AppConfig::default()
    } else {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&data).with_context(|| format!("failed to parse {}", path.display()))?
    };
    apply_env_overrides(&mut cfg, |key| std::env::var(key).ok());
    Ok(cfg)
}

fn init_logging(log_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_new(log_level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init();
}

fn apply_env_overrides(cfg: &mut AppConfig, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("GUESS_THAT_SONG_LOG_LEVEL") {
        if !v.trim().is_empty() {
            cfg.log_level = v;
        }
    }
    if let Some(v) = var("GUESS_THAT_SONG_SEARCH_URL") {
        if !v.trim().is_empty() {
            cfg.search.base_url = v;
        }
    }
    if let Some(v) = var("GUESS_THAT_SONG_PLAYER") {
        if !v.trim().is_empty() {
            cfg.playback.command = v;
        }
    }
}
