mod app;
mod config;
mod feed;
mod input;
mod player;
mod storage;
mod tui;
mod youtube;

use anyhow::Context;
use clap::{Parser, Subcommand};
use feed::Aggregator;
use std::path::Path;
use time::format_description::well_known::Rfc3339;

#[derive(Debug, Parser)]
#[command(name = "subfeed", version, about = "Latest-uploads feed for your YouTube subscriptions")]
struct Cli {
    /// Override config file path.
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the interactive TUI (default).
    Tui,
    /// Print the aggregated feed to stdout (headless).
    Videos {
        /// Drop the video cache and refetch.
        #[arg(long)]
        force: bool,
    },
    /// Print subscribed channel details to stdout (headless).
    Channels,
    /// Subscribe to a channel by ID.
    Add { channel_id: String },
    /// Unsubscribe from a channel.
    Remove { channel_id: String },
    /// Play a video in mpv.
    Play { video_id: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let cfg = config::load(cli.config.as_deref()).context("load config")?;

    match cli.command.unwrap_or(Command::Tui) {
        Command::Tui => {
            require_api_key(&cfg, cli.config.as_deref())?;
            let mut terminal = tui::TerminalGuard::enter().context("init terminal")?;
            let mut app = app::App::new(cfg, cli.config.clone());
            app.run(terminal.terminal_mut()).await?;
        }
        Command::Videos { force } => {
            require_api_key(&cfg, cli.config.as_deref())?;
            let mut feed = make_feed(&cfg, cli.config.as_deref());
            if force {
                feed.clear_video_cache();
            }
            let videos = feed.latest_videos().await?;
            let watched = feed.watched_ids().await.unwrap_or_default();
            for (i, v) in videos.iter().enumerate() {
                let mark = if watched.contains(&v.id) { "*" } else { " " };
                let when = v
                    .published_at
                    .format(&Rfc3339)
                    .unwrap_or_else(|_| "?".to_string());
                println!(
                    "{:02}.{} {}  — {}  ({}, video_id={})",
                    i + 1,
                    mark,
                    v.title,
                    v.channel_name,
                    when,
                    v.id
                );
            }
        }
        Command::Channels => {
            require_api_key(&cfg, cli.config.as_deref())?;
            let mut feed = make_feed(&cfg, cli.config.as_deref());
            let subs = feed.subscription_info().await?;
            for (i, s) in subs.iter().enumerate() {
                println!(
                    "{:02}. {}  ({} subscribers, {} videos, id={})",
                    i + 1,
                    s.title,
                    s.subscriber_count,
                    s.video_count,
                    s.id
                );
            }
        }
        Command::Add { channel_id } => {
            require_api_key(&cfg, cli.config.as_deref())?;
            let mut feed = make_feed(&cfg, cli.config.as_deref());
            feed.add_subscription(&channel_id).await?;
            println!("Subscribed to {channel_id}.");
        }
        Command::Remove { channel_id } => {
            let mut feed = make_feed(&cfg, cli.config.as_deref());
            feed.remove_subscription(&channel_id)?;
            println!("Unsubscribed from {channel_id}.");
        }
        Command::Play { video_id } => {
            let feed = make_feed(&cfg, cli.config.as_deref());
            if cfg.player.mark_as_watched {
                feed.mark_watched(&video_id).await?;
            }
            feed.play(&video_id)?;
        }
    }

    Ok(())
}

fn make_feed(cfg: &config::Config, config_path: Option<&Path>) -> Aggregator<youtube::api::Client> {
    let api = youtube::api::Client::new(&cfg.api.key);
    let store = config::ConfigStore::new(config_path);
    let watched = storage::StorageHandle::new(cfg.database_path());
    Aggregator::new(cfg, api, Box::new(store), watched)
}

/// A freshly created config still carries the placeholder key; refuse to
/// start hitting the API with it.
fn require_api_key(cfg: &config::Config, config_path: Option<&Path>) -> anyhow::Result<()> {
    if cfg.api.is_configured() {
        return Ok(());
    }
    let path = match config_path {
        Some(p) => p.to_path_buf(),
        None => config::default_config_path()?,
    };
    anyhow::bail!(
        "no YouTube API key configured; set api.key in {}",
        path.display()
    );
}
