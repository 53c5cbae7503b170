//! Fourfall - four in a row for the terminal
//!
//! Play locally, against the computer, or against another player over TCP.
//! The board is drawn on stdout; logs go to stderr (`RUST_LOG=fourfall=debug`).

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use fourfall_core::{AdversaryLevel, GameState, Mode, SaveFile};
use fourfall_net::{Listener, SyncNotice};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod error;
mod session;
mod terminal;

use config::AppConfig;
use error::{AppError, Result};
use session::Session;
use terminal::Command as Input;

const TICK: Duration = Duration::from_millis(50);

#[derive(Parser, Debug)]
#[command(name = "fourfall")]
#[command(about = "Four in a row, local or over TCP", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Two players sharing this terminal
    Local,

    /// Play against the computer
    Adversary {
        /// easy, medium (med) or hard; defaults to the configured level
        #[arg(short, long)]
        level: Option<AdversaryLevel>,
    },

    /// Host an online match and wait for one opponent
    Host {
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Join a hosted match at HOST[:PORT]
    Join { addr: String },

    /// Continue the saved local or computer match
    Resume,
}

fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!("Failed to create tokio runtime: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(run(cli)) {
        tracing::error!("{}", e);
        eprintln!("fourfall: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = match cli.config {
        Some(path) => path,
        None => config::default_config_path()?,
    };
    let config = AppConfig::load_or_default(&config_path)?;
    let save_file = SaveFile::new(config.save_path()?);
    let auto_save = config.save.auto_save_interval();

    tracing::info!(command = ?cli.command, save = %save_file.path().display(), "Starting fourfall");

    let session = match cli.command {
        Command::Local => Session::new(GameState::new(Mode::Local), save_file, auto_save),
        Command::Adversary { level } => {
            let level = level.unwrap_or(config.adversary.level);
            Session::new(GameState::vs_adversary(level), save_file, auto_save)
        }
        Command::Host { port } => {
            let port = port.unwrap_or(config.network.port);
            let listener = Listener::bind(SocketAddr::from(([0, 0, 0, 0], port))).await?;
            println!(
                "Waiting for an opponent on port {}...",
                listener.local_addr().port()
            );
            Session::host(listener, save_file, auto_save).await?
        }
        Command::Join { addr } => {
            let addr = resolve(&addr, config.network.port).await?;
            println!("Connecting to {}...", addr);
            Session::join(addr, config.network.connect_timeout(), save_file, auto_save).await?
        }
        Command::Resume => Session::resume(save_file, auto_save)?,
    };

    play(session).await
}

/// `HOST:PORT`, or `HOST` with the configured port
async fn resolve(addr: &str, default_port: u16) -> Result<SocketAddr> {
    if let Ok(addr) = addr.parse::<SocketAddr>() {
        return Ok(addr);
    }
    let target = if addr.contains(':') {
        addr.to_string()
    } else {
        format!("{}:{}", addr, default_port)
    };
    let found = tokio::net::lookup_host(target.as_str()).await?.next();
    found.ok_or_else(|| {
        AppError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Could not resolve {}", addr),
        ))
    })
}

/// Main loop: input lines, network events and a tick for search and auto-save
async fn play(mut session: Session) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut tick = tokio::time::interval(TICK);
    let mut shown: Option<(Arc<GameState>, bool)> = None;

    println!("{}", terminal::HELP);

    loop {
        let state = session.state();
        let thinking = session.is_thinking();
        let changed = match &shown {
            Some((last, was_thinking)) => !Arc::ptr_eq(last, &state) || *was_thinking != thinking,
            None => true,
        };
        if changed {
            print!("\n{}", terminal::render_board(&state));
            println!("{}", terminal::status_line(&state, thinking));
            shown = Some((state, thinking));
        }

        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                match terminal::parse_command(&line) {
                    Ok(Input::Drop(column)) => {
                        if let Err(e) = session.submit_move(column).await {
                            println!("{}", e);
                        }
                    }
                    Ok(Input::Save) => match session.save() {
                        Ok(()) => println!("Saved to {}", session.save_file().path().display()),
                        Err(e) => println!("Save failed: {}", e),
                    },
                    Ok(Input::Quit) => break,
                    Ok(Input::Help) => println!("{}", terminal::HELP),
                    Err(msg) => println!("{}", msg),
                }
            }
            Some(event) = session.next_net_event() => {
                match session.on_net_event(event).await {
                    Some(SyncNotice::PeerJoined) => println!("Opponent joined."),
                    Some(SyncNotice::Joined) => println!("Joined the match."),
                    Some(SyncNotice::MoveRejected(reason)) => println!("Move rejected: {}", reason),
                    Some(SyncNotice::Error(message)) => println!("Error: {}", message),
                    Some(SyncNotice::Disconnected) => println!("Opponent disconnected. Press q to return."),
                    Some(SyncNotice::StateReplaced) | None => {}
                }
            }
            _ = tick.tick() => {
                session.poll_search().await;
                if let Err(e) = session.maybe_autosave(Instant::now()) {
                    tracing::warn!(error = %e, "Auto-save failed");
                }
            }
        }
    }

    session.quit().await
}
