use std::sync::Arc;

use chrono::Local;
use futures::FutureExt;
use tokio::sync::watch;

use lyceum::api::{self, AppState};
use lyceum::config::Config;
use lyceum::db::Repository;
use lyceum::error::{AppError, Result};
use lyceum::rotation::Today;
use lyceum::sync::{ContemplationWatcher, ContentClient, PollCoordinator, PollOptions, Visibility};
use lyceum::votes::{FileVoteStore, VoteTracker};

#[tokio::main]
async fn main() -> Result<()> {
    // Request logs and lifecycle events at info unless RUST_LOG says otherwise
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let config = Config::load()?;

    match args.get(1).map(String::as_str) {
        None | Some("--serve") => serve(&config).await,
        Some("--today") => match args.get(2) {
            Some(base_url) => print_remote_today(base_url).await,
            None => print_today(&config).await,
        },
        Some("--watch") => {
            let base_url = args.get(2).ok_or_else(|| usage("--watch <base-url>"))?;
            watch_contemplations(&config, base_url).await
        }
        Some("--vote") => {
            let (Some(id), Some(base_url)) = (args.get(2), args.get(3)) else {
                return Err(usage("--vote <id> <base-url>"));
            };
            let id = id
                .parse::<i64>()
                .map_err(|_| AppError::validation(format!("Not a contemplation id: {id}")))?;
            cast_vote(&config, id, base_url).await
        }
        Some(other) => Err(usage(&format!("unknown option {other}"))),
    }
}

fn usage(detail: &str) -> AppError {
    AppError::Config(format!(
        "{detail}\nusage: lyceum [--serve | --today [base-url] | --watch <base-url> | --vote <id> <base-url>]"
    ))
}

async fn serve(config: &Config) -> Result<()> {
    let repo = Repository::new(&config.db_path).await?;
    let state = Arc::new(AppState::new(repo, config)?);
    api::serve(state, &config.bind_address).await
}

/// Headless: print what the front page would show right now.
async fn print_today(config: &Config) -> Result<()> {
    let repo = Repository::new(&config.db_path).await?;
    let today = Today::select(
        &Local::now(),
        &repo.list_active_contemplations().await?,
        &repo.list_active_intentions().await?,
        &repo.list_active_quotes().await?,
        config.rotation_offset,
    );
    println!("{}", serde_json::to_string_pretty(&today)?);
    Ok(())
}

/// Ask a running server instead of the local store.
async fn print_remote_today(base_url: &str) -> Result<()> {
    let today = ContentClient::new(base_url)?.today().await?;
    println!("{}", serde_json::to_string_pretty(&today)?);
    Ok(())
}

/// Follow a running server and log whenever today's contemplation changes.
async fn watch_contemplations(config: &Config, base_url: &str) -> Result<()> {
    let client = ContentClient::new(base_url)?;
    let votes = VoteTracker::open(
        FileVoteStore::new(&config.votes_path),
        config.vote_baseline_min,
        config.vote_baseline_max,
    );
    let watcher = ContemplationWatcher::new(votes, config.rotation_offset);

    let options = PollOptions {
        interval: config.poll_interval(),
        background_interval: config.background_poll_interval(),
    };
    // A terminal is always in view; the sender stays alive for the whole run.
    let (_visibility_tx, visibility_rx) = watch::channel(Visibility::Visible);

    let handle = PollCoordinator::start(
        options,
        move || {
            let client = client.clone();
            async move { client.contemplations().await }.boxed()
        },
        watcher,
        visibility_rx,
    );

    tracing::info!("Watching {} (Ctrl-C to stop)", base_url);
    tokio::signal::ctrl_c().await?;
    handle.stop();
    Ok(())
}

async fn cast_vote(config: &Config, id: i64, base_url: &str) -> Result<()> {
    let client = ContentClient::new(base_url)?;
    let mut tracker = VoteTracker::open(
        FileVoteStore::new(&config.votes_path),
        config.vote_baseline_min,
        config.vote_baseline_max,
    );

    let server = client.vote_counts().await?;
    let ids: Vec<i64> = server.keys().copied().collect();
    tracker.seed(&server, &ids, &mut rand::rng());

    if !tracker.has_voted(id) && !server.contains_key(&id) {
        return Err(AppError::not_found(format!("Contemplation {id}")));
    }

    match tracker.vote_with(id, |id| client.vote(id)).await? {
        Some(total) => println!("Voted for contemplation {id}: {total} votes on the server"),
        None => {
            let votes = tracker.votes(&server);
            println!(
                "Already voted for contemplation {id} ({} votes)",
                votes.get(&id).copied().unwrap_or(0)
            );
        }
    }
    Ok(())
}
