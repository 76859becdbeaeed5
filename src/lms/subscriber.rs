//! Player event subscription over the server's line-oriented CLI port.
//!
//! One task owns the connection: it resolves the player, sends a single
//! `subscribe` request, then forwards every decoded event to the session
//! controller. Stopping is cooperative: connecting, reading and the
//! reconnect back-off are all raced against the stop signal, so the socket
//! is always shut down before the task returns.

use crate::app::events::{PlayerEvent, PlayerEventKind};
use crate::lms::models::PlayerHandle;
use crate::lms::{LmsClient, PlayerClient};
use anyhow::Context;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const RECONNECT_DELAY: Duration = Duration::from_secs(5);
const CATEGORIES: &str = "pause,stop,play,playlist newsong";

/// Decode one raw feed line (percent-escaped, newline stripped).
pub fn decode_line(raw: &str) -> String {
    let trimmed = raw.trim();
    match urlencoding::decode(trimmed) {
        Ok(s) => s.into_owned(),
        Err(_) => String::from_utf8_lossy(&urlencoding::decode_binary(trimmed.as_bytes()))
            .into_owned(),
    }
}

/// Parse a decoded line `<player-id> <category> [args...]`.
///
/// Lines with fewer than two tokens and unknown categories yield nothing.
pub fn parse_event(line: &str) -> Vec<PlayerEvent> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let [player_id, category, args @ ..] = parts.as_slice() else {
        debug!(line, "unrecognised event format");
        return Vec::new();
    };
    let has = |token: &str| args.contains(&token);

    let mut kinds = Vec::new();
    match *category {
        "playlist" => {
            if has("newsong") {
                kinds.push(PlayerEventKind::NewSong);
            }
            if has("stop") {
                kinds.push(PlayerEventKind::Stop);
            }
        }
        "play" => kinds.push(PlayerEventKind::Play),
        "pause" => kinds.push(PlayerEventKind::Pause { resumed: !has("1") }),
        _ => {}
    }

    kinds
        .into_iter()
        .map(|kind| PlayerEvent {
            player_id: player_id.to_string(),
            kind,
        })
        .collect()
}

fn subscribe_request(player_id: &str) -> String {
    format!("{} subscribe {CATEGORIES}\n", urlencoding::encode(player_id))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionEnd {
    Stopped,
    Disconnected,
}

/// Handle to the running subscriber task.
#[derive(Debug)]
pub struct SubscriberHandle {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SubscriberHandle {
    /// Raise the stop signal and wait for the connection to close.
    pub async fn stop(self) {
        let _ = self.stop.send(true);
        if let Err(e) = self.task.await {
            warn!("event subscriber task ended abnormally: {e}");
        }
    }
}

pub fn spawn(
    client: LmsClient,
    host: String,
    port: u16,
    events: mpsc::Sender<PlayerEvent>,
) -> SubscriberHandle {
    spawn_with_delay(client, host, port, events, RECONNECT_DELAY)
}

fn spawn_with_delay(
    client: LmsClient,
    host: String,
    port: u16,
    events: mpsc::Sender<PlayerEvent>,
    reconnect_delay: Duration,
) -> SubscriberHandle {
    let (stop_tx, stop_rx) = watch::channel(false);
    let subscriber = Subscriber {
        client,
        host,
        port,
        events,
        stop: stop_rx,
        reconnect_delay,
    };
    SubscriberHandle {
        stop: stop_tx,
        task: tokio::spawn(subscriber.run()),
    }
}

struct Subscriber {
    client: LmsClient,
    host: String,
    port: u16,
    events: mpsc::Sender<PlayerEvent>,
    stop: watch::Receiver<bool>,
    reconnect_delay: Duration,
}

impl Subscriber {
    async fn run(mut self) {
        loop {
            if *self.stop.borrow() {
                break;
            }
            match self.session().await {
                Ok(SessionEnd::Stopped) => break,
                Ok(SessionEnd::Disconnected) => warn!("event feed closed by server"),
                Err(e) => warn!("event subscription failed: {e:#}"),
            }

            tokio::select! {
                _ = tokio::time::sleep(self.reconnect_delay) => {}
                changed = self.stop.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        debug!("event subscriber stopped");
    }

    /// Resolve the player and open the CLI socket. `None` once stop is raised.
    async fn connect(&mut self) -> anyhow::Result<Option<(PlayerHandle, TcpStream)>> {
        let Self {
            client,
            host,
            port,
            stop,
            ..
        } = self;
        let connect = async {
            let player = client
                .resolve_player()
                .await
                .context("resolve player for event feed")?;
            let stream = TcpStream::connect((host.as_str(), *port))
                .await
                .with_context(|| format!("connect to {host}:{port}"))?;
            Ok::<_, anyhow::Error>((player, stream))
        };
        tokio::pin!(connect);

        loop {
            tokio::select! {
                changed = stop.changed() => {
                    if changed.is_err() || *stop.borrow() {
                        return Ok(None);
                    }
                }
                connected = &mut connect => return connected.map(Some),
            }
        }
    }

    async fn session(&mut self) -> anyhow::Result<SessionEnd> {
        let Some((player, stream)) = self.connect().await? else {
            return Ok(SessionEnd::Stopped);
        };
        let (reader, mut writer) = stream.into_split();
        writer
            .write_all(subscribe_request(&player.id).as_bytes())
            .await
            .context("send subscribe request")?;
        info!(player_id = %player.id, "subscribed to player events");

        let mut lines = BufReader::new(reader).lines();
        let end = loop {
            tokio::select! {
                changed = self.stop.changed() => {
                    if changed.is_err() || *self.stop.borrow() {
                        break SessionEnd::Stopped;
                    }
                }
                line = lines.next_line() => {
                    let Some(raw) = line.context("read event feed")? else {
                        break SessionEnd::Disconnected;
                    };
                    if !self.forward(&player.id, &raw).await {
                        break SessionEnd::Stopped;
                    }
                }
            }
        };

        let _ = writer.shutdown().await;
        debug!(player_id = %player.id, "event connection closed");
        Ok(end)
    }

    /// Returns false once the controller is gone.
    async fn forward(&self, player_id: &str, raw: &str) -> bool {
        let line = decode_line(raw);
        debug!(line = %line, "received event");
        for event in parse_event(&line) {
            if event.player_id != player_id {
                debug!(source = %event.player_id, "event for another player ignored");
                continue;
            }
            if self.events.send(event).await.is_err() {
                return false;
            }
        }
        true
    }
}
