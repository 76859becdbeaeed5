mod app;
mod artwork;
mod config;
mod display;
mod input;
mod lms;

use anyhow::Context;
use app::Session;
use clap::{Parser, Subcommand};
use display::terminal::TerminalPanel;
use lms::{LmsClient, PlayerClient};
use tokio::sync::{mpsc, watch};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "inkplayer", version, about = "E-paper now-playing remote for Lyrion Music Server")]
struct Cli {
    /// Override config file path.
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the panel session (default).
    Run,
    /// Print the favorites sequence (headless).
    Favorites,
    /// Print the current track (headless).
    Track,
    /// Print player events until Ctrl-C (headless).
    Events,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load(cli.config.as_deref()).context("load config")?;
    let command = cli.command.unwrap_or(Command::Run);

    init_logging(&cfg, matches!(command, Command::Run))?;

    let client = LmsClient::new(&cfg).context("create media server client")?;
    match command {
        Command::Run => run(&cfg, client).await?,
        Command::Favorites => {
            let favorites = client.list_favorites().await?;
            if favorites.is_empty() {
                println!("No favorites for {:?}.", cfg.favorites.user);
            }
            for (i, f) in favorites.iter().enumerate() {
                println!(
                    "{:02}. [{}] {} - {}  ({})",
                    i + 1,
                    f.kind.label(),
                    f.title,
                    f.subtitle,
                    f.url
                );
            }
        }
        Command::Track => match client.refresh_current_track().await? {
            Some(t) => {
                let duration = t
                    .duration_seconds
                    .map(|d| format!("{:.0}s", d))
                    .unwrap_or_else(|| "-".to_string());
                println!("{} - {} ({})", t.title, t.artist, t.album);
                println!("elapsed {:.0}s of {}", t.elapsed_seconds, duration);
            }
            None => println!("Nothing queued on {:?}.", cfg.player.name),
        },
        Command::Events => {
            let player = client.resolve_player().await?;
            println!("Listening for events from {} ({})", player.name, player.id);
            let (tx, mut rx) = mpsc::channel(64);
            let subscriber =
                lms::subscriber::spawn(client, cfg.server.host.clone(), cfg.server.cli_port, tx);
            loop {
                tokio::select! {
                    ev = rx.recv() => match ev {
                        Some(ev) => println!("{} {:?}", ev.player_id, ev.kind),
                        None => break,
                    },
                    _ = tokio::signal::ctrl_c() => break,
                }
            }
            subscriber.stop().await;
        }
    }

    Ok(())
}

/// The panel owns the terminal during `run`, so logs go to a file there.
fn init_logging(cfg: &config::Config, to_file: bool) -> anyhow::Result<()> {
    // HTTP client internals are noisy at debug.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{},hyper_util=warn,hyper=warn,reqwest=warn",
            cfg.log.level
        ))
    });

    if to_file {
        let dir = &cfg.paths.data_dir;
        std::fs::create_dir_all(dir).with_context(|| format!("create dir {}", dir.display()))?;
        let path = dir.join("inkplayer.log");
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("open {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(file)
            .with_ansi(false)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    }
    Ok(())
}

async fn run(cfg: &config::Config, client: LmsClient) -> anyhow::Result<()> {
    let player = client
        .resolve_player()
        .await
        .context("resolve player")?;
    info!(player_id = %player.id, name = %player.name, "player resolved");

    let (event_tx, event_rx) = mpsc::channel(64);
    let subscriber = lms::subscriber::spawn(
        client.clone(),
        cfg.server.host.clone(),
        cfg.server.cli_port,
        event_tx,
    );

    let (touch_tx, touch_rx) = watch::channel(None);
    let (quit_tx, quit_rx) = watch::channel(false);
    let panel = match TerminalPanel::open(&cfg.display, touch_rx) {
        Ok(panel) => panel,
        Err(e) => {
            subscriber.stop().await;
            return Err(e).context("open panel");
        }
    };
    let sampler = input::spawn_touch_sampler(touch_tx, quit_tx);

    let mut session = Session::new(client, panel, event_rx);
    let outcome = match session.start().await {
        Ok(()) => tokio::select! {
            res = session.run(quit_rx) => res,
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                Ok(())
            }
        },
        Err(e) => Err(e),
    };
    if let Err(e) = &outcome {
        error!("session ended: {e}");
    }

    session.shutdown();
    // Dropping the panel restores the terminal and ends the sampler.
    drop(session);
    subscriber.stop().await;
    let _ = sampler.await;

    outcome.context("session")
}
