//! Local Player - mpv/VLC playback support
//!
//! Opens a movie's video URL in mpv or VLC. For mpv the player's JSON IPC
//! socket is polled once a second to report position, duration and the
//! end of the media. VLC is run with `--play-and-exit`, so a clean exit
//! counts as reaching the end and anything else as an early close.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::tracker::PlaybackEvent;
use crate::models::Movie;

/// Interval between IPC position polls
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Supported local players
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerType {
    /// mpv media player (default, reports progress)
    #[default]
    Mpv,
    /// VLC media player
    Vlc,
}

impl PlayerType {
    /// Get the command name for this player
    pub fn command(&self) -> &'static str {
        match self {
            PlayerType::Vlc => {
                // On macOS, VLC is an app bundle - check for it
                #[cfg(target_os = "macos")]
                if std::path::Path::new("/Applications/VLC.app").exists() {
                    return "/Applications/VLC.app/Contents/MacOS/VLC";
                }
                "vlc"
            }
            PlayerType::Mpv => "mpv",
        }
    }

    /// Get a display name for this player
    pub fn display_name(&self) -> &'static str {
        match self {
            PlayerType::Vlc => "VLC",
            PlayerType::Mpv => "mpv",
        }
    }

    /// Whether position updates are available
    pub fn reports_progress(&self) -> bool {
        matches!(self, PlayerType::Mpv) && cfg!(unix)
    }
}

impl std::fmt::Display for PlayerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for PlayerType {
    type Err = PlayerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mpv" => Ok(PlayerType::Mpv),
            "vlc" => Ok(PlayerType::Vlc),
            other => Err(PlayerError::Unsupported(other.to_string())),
        }
    }
}

/// Errors from local player operations
#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("Player '{0}' not found. Install it first.")]
    NotFound(String),
    #[error("Failed to start player: {0}")]
    StartFailed(#[from] std::io::Error),
    #[error("Unsupported player '{0}' (use mpv or vlc)")]
    Unsupported(String),
    #[error("Movie has no video URL")]
    NoVideo,
}

/// A running player plus the stream of events it reports.
///
/// Dropping the handle stops the watcher, which kills the player process.
pub struct PlayerHandle {
    events: mpsc::Receiver<PlaybackEvent>,
    watcher: JoinHandle<()>,
}

impl PlayerHandle {
    /// Non-blocking poll used by the TUI loop
    pub fn try_next_event(&mut self) -> Option<PlaybackEvent> {
        self.events.try_recv().ok()
    }

    /// Event channel, for draining with [`super::session::drive`]
    pub fn events_mut(&mut self) -> &mut mpsc::Receiver<PlaybackEvent> {
        &mut self.events
    }

    /// Stop watching and kill the player
    pub fn stop(&self) {
        self.watcher.abort();
    }
}

impl Drop for PlayerHandle {
    fn drop(&mut self) {
        self.watcher.abort();
    }
}

/// Local player for catalog videos
pub struct LocalPlayer {
    player_type: PlayerType,
}

impl LocalPlayer {
    /// Create a new local player with the specified type
    pub fn new(player_type: PlayerType) -> Self {
        Self { player_type }
    }

    /// Get the player type
    pub fn player_type(&self) -> PlayerType {
        self.player_type
    }

    /// Check if the player is available on the system
    pub async fn is_available(&self) -> bool {
        let cmd = self.player_type.command();

        // Full path means a macOS app bundle
        if cmd.starts_with('/') {
            return Path::new(cmd).exists();
        }

        Command::new("which")
            .arg(cmd)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }

    /// Build the player command line for a movie
    pub fn command_for(&self, movie: &Movie, start_at: Option<f64>, ipc_socket: Option<&Path>) -> Command {
        let mut cmd = Command::new(self.player_type.command());
        let title = window_title(movie);

        match self.player_type {
            PlayerType::Mpv => {
                cmd.arg(&movie.video_url);
                cmd.arg(format!("--force-media-title={}", title));
                if let Some(start) = start_at {
                    cmd.arg(format!("--start={:.3}", start));
                }
                if let Some(socket) = ipc_socket {
                    cmd.arg(format!("--input-ipc-server={}", socket.display()));
                    cmd.arg("--keep-open=yes");
                }
                cmd.arg("--force-window=immediate");
            }
            PlayerType::Vlc => {
                cmd.arg(&movie.video_url);
                cmd.arg(format!("--meta-title={}", title));
                if let Some(start) = start_at {
                    cmd.arg(format!("--start-time={:.3}", start));
                }
                cmd.arg("--play-and-exit");
            }
        }

        cmd.stdout(Stdio::null());
        cmd.stderr(Stdio::null());
        cmd.kill_on_drop(true);
        cmd
    }

    /// Launch the player, already seeked to `start_at`, and start watching it
    pub fn play(&self, movie: &Movie, start_at: Option<f64>) -> Result<PlayerHandle, PlayerError> {
        if movie.video_url.trim().is_empty() {
            return Err(PlayerError::NoVideo);
        }

        let socket = self.player_type.reports_progress().then(ipc_socket_path);
        if let Some(ref path) = socket {
            let _ = std::fs::remove_file(path);
        }

        let child = self
            .command_for(movie, start_at, socket.as_deref())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    PlayerError::NotFound(self.player_type.command().to_string())
                } else {
                    PlayerError::StartFailed(e)
                }
            })?;
        debug!(player = %self.player_type, movie_id = %movie.id, start_at = ?start_at, "player started");

        let (tx, rx) = mpsc::channel(32);
        let watcher = tokio::spawn(watch(child, socket, tx));
        Ok(PlayerHandle {
            events: rx,
            watcher,
        })
    }
}

/// Window title: movie title plus available subtitle labels
fn window_title(movie: &Movie) -> String {
    if movie.subtitles.is_empty() {
        movie.to_string()
    } else {
        format!("{} [subs: {}]", movie, movie.subtitles.join(", "))
    }
}

fn ipc_socket_path() -> PathBuf {
    std::env::temp_dir().join(format!("moviestream-mpv-{}.sock", std::process::id()))
}

// =============================================================================
// Watcher
// =============================================================================

async fn watch(mut child: Child, socket: Option<PathBuf>, tx: mpsc::Sender<PlaybackEvent>) {
    #[cfg(unix)]
    if let Some(path) = socket {
        ipc::watch(&mut child, &path, &tx).await;
        let _ = std::fs::remove_file(&path);
        return;
    }

    #[cfg(not(unix))]
    let _ = socket;

    let event = match child.wait().await {
        Ok(status) => exit_event(status.success()),
        Err(e) => {
            warn!(error = %e, "waiting for player failed");
            PlaybackEvent::Closed
        }
    };
    let _ = tx.send(event).await;
}

/// Event for a player that only reports its exit status
fn exit_event(success: bool) -> PlaybackEvent {
    if success {
        PlaybackEvent::Ended
    } else {
        PlaybackEvent::Closed
    }
}

#[cfg(unix)]
mod ipc {
    //! mpv JSON IPC: one JSON object per line in both directions.

    use super::*;
    use serde_json::{json, Value};
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::net::UnixStream;

    const REPLY_TIMEOUT: Duration = Duration::from_millis(500);

    pub(super) async fn watch(child: &mut Child, path: &Path, tx: &mpsc::Sender<PlaybackEvent>) {
        let mut conn: Option<BufReader<UnixStream>> = None;
        let mut request_id: u64 = 0;

        loop {
            match child.try_wait() {
                Ok(Some(_)) | Err(_) => {
                    let _ = tx.send(PlaybackEvent::Closed).await;
                    return;
                }
                Ok(None) => {}
            }

            if conn.is_none() {
                conn = UnixStream::connect(path).await.ok().map(BufReader::new);
            }

            if let Some(stream) = conn.as_mut() {
                match poll(stream, &mut request_id).await {
                    Some(Poll::Eof) => {
                        let _ = tx.send(PlaybackEvent::Ended).await;
                        let _ = send_command(stream, json!(["quit"]), &mut request_id).await;
                        let _ = child.wait().await;
                        return;
                    }
                    Some(Poll::Position(current_time, duration)) => {
                        if tx
                            .send(PlaybackEvent::Progress {
                                current_time,
                                duration,
                            })
                            .await
                            .is_err()
                        {
                            return;
                        }
                    }
                    Some(Poll::Unknown) => {}
                    None => {
                        debug!("mpv IPC connection lost");
                        conn = None;
                    }
                }
            }

            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    enum Poll {
        Eof,
        Position(f64, f64),
        Unknown,
    }

    /// `None` means the connection is broken
    async fn poll(stream: &mut BufReader<UnixStream>, request_id: &mut u64) -> Option<Poll> {
        let eof = get_property(stream, "eof-reached", request_id).await?;
        if eof.as_bool() == Some(true) {
            return Some(Poll::Eof);
        }

        let time_pos = get_property(stream, "time-pos", request_id).await?;
        let duration = get_property(stream, "duration", request_id).await?;
        match (time_pos.as_f64(), duration.as_f64()) {
            (Some(t), Some(d)) => Some(Poll::Position(t, d)),
            (Some(t), None) => Some(Poll::Position(t, 0.0)),
            _ => Some(Poll::Unknown),
        }
    }

    async fn get_property(
        stream: &mut BufReader<UnixStream>,
        name: &str,
        request_id: &mut u64,
    ) -> Option<Value> {
        send_command(stream, json!(["get_property", name]), request_id).await
    }

    /// Send one command and wait for its reply. Property errors (e.g.
    /// `time-pos` before the file is loaded) yield `Value::Null`.
    async fn send_command(
        stream: &mut BufReader<UnixStream>,
        command: Value,
        request_id: &mut u64,
    ) -> Option<Value> {
        *request_id += 1;
        let id = *request_id;
        let mut line = json!({ "command": command, "request_id": id }).to_string();
        line.push('\n');
        stream.get_mut().write_all(line.as_bytes()).await.ok()?;

        let reply = tokio::time::timeout(REPLY_TIMEOUT, async {
            let mut buf = String::new();
            loop {
                buf.clear();
                if stream.read_line(&mut buf).await.ok()? == 0 {
                    return None;
                }
                let Ok(msg) = serde_json::from_str::<Value>(&buf) else {
                    continue;
                };
                // Unsolicited events carry no request_id
                if msg.get("request_id").and_then(Value::as_u64) == Some(id) {
                    return Some(msg);
                }
            }
        })
        .await;

        match reply {
            Ok(Some(msg)) => Some(msg.get("data").cloned().unwrap_or(Value::Null)),
            Ok(None) => None,
            Err(_) => Some(Value::Null),
        }
    }
}
