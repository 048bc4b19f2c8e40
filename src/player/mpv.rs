use crate::config::PlayerConfig;
use anyhow::Context;
use tokio::process::Command;

/// Launch mpv detached on a video. Playback runs on its own; exit status
/// and errors after startup never report back here.
pub fn play(video_id: &str, cfg: &PlayerConfig) -> anyhow::Result<()> {
    Command::new("mpv")
        .arg(ytdl_format(cfg.max_resolution))
        .arg(watch_url(video_id))
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn()
        .context("spawn mpv")?;
    Ok(())
}

/// yt-dlp format selector capping the stream height.
fn ytdl_format(cap: u32) -> String {
    format!("--ytdl-format=bestvideo[height<={cap}]+bestaudio/best[height<={cap}]")
}

fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={video_id}")
}
