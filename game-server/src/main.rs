use anyhow::Context;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use game_core::{SystemClock, WordList, WordSolver};
use game_persistence::connection::connect_and_migrate;
use game_persistence::repositories::{
    DictionaryRepository, ScoreHistoryRepository, SessionRepository,
};
use game_server::{config::Config, coordinator::SessionCoordinator, create_routes};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting Word Hunt session coordinator...");

    let config = Config::new();

    // Initialize database connection and run migrations
    let db = connect_and_migrate(&config.database_url)
        .await
        .with_context(|| format!("failed to open database {}", config.database_url))?;

    let dictionary = DictionaryRepository::new(db.clone());
    seed_dictionary(&dictionary, config.words_file.as_deref()).await?;

    let solver = WordSolver::new(Arc::new(dictionary)).with_min_length(config.min_word_length);
    let coordinator = Arc::new(SessionCoordinator::new(
        SessionRepository::new(db.clone()),
        ScoreHistoryRepository::new(db),
        solver,
        Arc::new(SystemClock),
        config.coordinator_settings(),
    ));

    let routes = create_routes(coordinator.clone());

    // Start cleanup task
    let sweep_interval = config.sweep_interval();
    let sweeper = coordinator.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(sweep_interval);
        loop {
            interval.tick().await;
            if let Err(e) = sweeper.sweep().await {
                warn!("Session sweep failed: {}", e);
            }
        }
    });

    let ip: std::net::IpAddr = config
        .host
        .parse()
        .with_context(|| format!("invalid HOST '{}'", config.host))?;
    info!("Server starting on {}:{}", ip, config.port);

    let (addr, server) = warp::serve(routes)
        .try_bind_with_graceful_shutdown((ip, config.port), shutdown_signal())
        .context("failed to bind listener")?;

    info!("Server started successfully on {}. Press Ctrl+C to stop.", addr);
    server.await;
    info!("Server shutdown complete.");
    Ok(())
}

/// Load `words_file` into the dictionary table when given. Without one, an
/// empty dictionary gets the bundled fallback list so rounds can start.
async fn seed_dictionary(
    dictionary: &DictionaryRepository,
    words_file: Option<&str>,
) -> anyhow::Result<()> {
    if let Some(path) = words_file {
        info!("Loading words from {}", path);
        let contents = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read word file {}", path))?;
        let inserted = dictionary
            .seed(contents.split_whitespace())
            .await
            .context("failed to seed dictionary")?;
        info!("Dictionary seeded with {} new words", inserted);
        return Ok(());
    }

    let existing = dictionary
        .count()
        .await
        .context("failed to count dictionary words")?;
    if existing == 0 {
        let inserted = dictionary
            .seed_word_list(&WordList::fallback())
            .await
            .context("failed to seed fallback dictionary")?;
        warn!(
            "Dictionary was empty; seeded {} bundled words. Set WORDS_FILE for a full dictionary.",
            inserted
        );
    } else {
        info!("Dictionary holds {} words", existing);
    }
    Ok(())
}

async fn shutdown_signal() {
    // Wait for SIGINT (Ctrl+C) or SIGTERM
    #[cfg(unix)]
    {
        use signal::unix::{SignalKind, signal as unix_signal};

        match (
            unix_signal(SignalKind::interrupt()),
            unix_signal(SignalKind::terminate()),
        ) {
            (Ok(mut sigint), Ok(mut sigterm)) => {
                tokio::select! {
                    _ = sigint.recv() => info!("Received SIGINT, shutting down gracefully..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down gracefully..."),
                }
                return;
            }
            (Err(e), _) | (_, Err(e)) => {
                error!("Failed to install signal handlers ({}), falling back to Ctrl+C", e);
            }
        }
    }

    match signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, shutting down gracefully..."),
        Err(e) => error!("Failed to listen for Ctrl+C: {}", e),
    }
}
