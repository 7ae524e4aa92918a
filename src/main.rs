//! Movie Cache - debug host for the cache layer
//!
//! Runs one cache or data command against the configured store, API and
//! database, then exits.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use movie_cache::{debug, AppState, Config};

#[derive(Parser, Debug)]
#[command(name = "movie_cache")]
#[command(about = "Inspect and exercise the movie cache")]
#[command(version)]
struct Cli {
    /// Skip cached entries and fetch fresh data
    #[arg(long, global = true)]
    refresh: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Show cache inventory and lookup counters
    Info,
    /// Print one cached payload
    Inspect { key: String },
    /// Wipe the whole store
    Clear,
    /// Drop listing, search and details entries
    ClearMovies,
    /// Drop the trending list
    ClearTrending,
    /// Delete expired entries
    Sweep,
    /// Fetch a popular listing page
    Popular { page: Option<u32> },
    /// Fetch a search results page
    Search { query: String, page: Option<u32> },
    /// Fetch movie details
    Details { id: String },
    /// Fetch the trending list
    Trending,
    /// Fetch the saved-movies list
    Saved,
}

/// Main entry point for the cache debug tool.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Parse arguments and load configuration from environment variables
/// 3. Build the application state (store, API client, database client)
/// 4. Run the requested command
/// 5. Tear the state down
#[tokio::main]
async fn main() -> ExitCode {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "movie_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::from_env();
    let state = AppState::from_config(&config)
        .await
        .context("failed to open cache store")?;

    let outcome = dispatch(&state, cli.command, cli.refresh).await;
    state.shutdown();
    outcome
}

async fn dispatch(state: &AppState, command: Command, force_refresh: bool) -> Result<()> {
    match command {
        Command::Info => {
            debug::debug_cache(&state.cache).await;
        }
        Command::Inspect { key } => {
            debug::inspect_cache(&state.cache, &key).await;
        }
        Command::Clear => debug::reset_cache(&state.cache).await,
        Command::ClearMovies => {
            debug::clear_movie_cache(&state.cache).await;
        }
        Command::ClearTrending => {
            debug::clear_trending_cache(&state.cache).await;
        }
        Command::Sweep => {
            let removed = state.cache.sweep_expired().await;
            info!("Removed {} expired entries", removed);
        }
        Command::Popular { page } => {
            let movies = state
                .movies
                .fetch_movies_cached("", page.unwrap_or(1), force_refresh)
                .await?;
            print_json(&movies)?;
        }
        Command::Search { query, page } => {
            let movies = state
                .movies
                .fetch_movies_cached(&query, page.unwrap_or(1), force_refresh)
                .await?;
            print_json(&movies)?;
        }
        Command::Details { id } => {
            let details = state
                .movies
                .fetch_movie_details_cached(&id, force_refresh)
                .await?;
            print_json(&details)?;
        }
        Command::Trending => {
            let trending = state.metrics.get_trending_movies(force_refresh).await?;
            print_json(&trending)?;
        }
        Command::Saved => {
            let saved = state.metrics.get_saved_movies(force_refresh).await?;
            print_json(&saved)?;
        }
    }
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
