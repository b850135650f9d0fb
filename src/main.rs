//! Mech Duel - console frontend for the artillery duel
//!
//! Reads commands from stdin, drives the match loop at a fixed frame rate and
//! writes events as JSON lines to stdout. Logs go to stderr. When stdin ends
//! the shots in flight and the AI's reply are played out before exiting;
//! `quit` exits at once.

use std::io::{BufRead, Write};

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tracing::{info, trace, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mech_duel::config::Config;
use mech_duel::console::parse_command;
use mech_duel::game::GameMatch;
use mech_duel::protocol::{Command, MatchUpdate};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    init_tracing(&config.log_level);

    info!(
        frame_rate = config.frame_rate,
        seed = ?config.game.seed,
        "Starting Mech Duel"
    );

    let (game_match, handle) = GameMatch::new(&config)?;
    let mut updates = handle.subscribe();

    let mut runner = tokio::spawn(game_match.run());

    let printer = tokio::spawn(async move {
        loop {
            match updates.recv().await {
                Ok(MatchUpdate::Snapshot { snapshot }) => {
                    trace!(tick = snapshot.tick, scene = ?snapshot.scene, "Snapshot");
                }
                Ok(update) => print_update(&update),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Output lagged behind the match loop");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let mut lines = spawn_stdin_reader();
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    let mut input_closed = false;
    loop {
        tokio::select! {
            line = lines.recv() => {
                let Some(line) = line else {
                    info!("Input closed, finishing pending turns");
                    input_closed = true;
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match parse_command(&line) {
                    Ok(Command::Shutdown) => break,
                    Ok(command) => {
                        if handle.send(command).await.is_err() {
                            warn!("Match loop is gone");
                            break;
                        }
                    }
                    Err(e) => warn!(input = %line.trim(), error = %e, "Ignoring input"),
                }
            }
            _ = &mut shutdown => break,
        }
    }

    // The loop may already have stopped; a failed send is fine here.
    let stop = if input_closed {
        Command::Finish
    } else {
        Command::Shutdown
    };
    let _ = handle.send(stop).await;

    tokio::select! {
        result = &mut runner => result?,
        _ = &mut shutdown, if input_closed => {
            let _ = handle.send(Command::Shutdown).await;
            runner.await?;
        }
    }

    // Closing the last sender lets the printer drain what is already queued.
    drop(handle);
    printer.await?;

    info!("Mech Duel shutdown complete");
    Ok(())
}

/// Stdin is read on a plain thread; the runtime must not wait on a blocking read at exit
fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(64);
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.blocking_send(line).is_err() {
                break;
            }
        }
    });
    rx
}

fn print_update(update: &MatchUpdate) {
    match serde_json::to_string(update) {
        Ok(json) => {
            let mut stdout = std::io::stdout().lock();
            if writeln!(stdout, "{json}").and_then(|_| stdout.flush()).is_err() {
                warn!("Failed to write to stdout");
            }
        }
        Err(e) => warn!(error = %e, "Failed to encode update"),
    }
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .init();
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        }
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        }
    }
}
