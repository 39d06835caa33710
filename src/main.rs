// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Park Quest replay runner
//!
//! Replays a recorded track through a live challenge session, settling the
//! result against the configured backend (or offline when none is set).

use futures_util::{stream, StreamExt};
use park_quest::{
    config::Config,
    db::SupabaseDb,
    error::AppError,
    models::{Challenge, Coordinate, ParkRow, PlayerProfile},
    services::{
        park, run_session, ChallengeSession, SessionCommand, SessionEvent, StreamFeed,
    },
};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FIXTURE: &str = "data/sample_challenge.json";

/// A recorded challenge attempt.
#[derive(Debug, Deserialize)]
struct ReplayFixture {
    challenge: Challenge,
    player: PlayerProfile,
    park: ParkRow,
    track: Vec<Coordinate>,
    #[serde(default = "default_fix_interval_ms")]
    fix_interval_ms: u64,
}

fn default_fix_interval_ms() -> u64 {
    1000
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let config = Config::from_env()?;
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_FIXTURE.to_string());
    tracing::info!(path = %path, "Loading replay fixture");
    let fixture: ReplayFixture = serde_json::from_str(&std::fs::read_to_string(&path)?)?;

    let geometry = Arc::new(park::from_park_row(fixture.park)?);
    let store = SupabaseDb::from_config(&config);

    // Replay the track at the recorded fix interval
    let fix_interval = Duration::from_millis(fixture.fix_interval_ms);
    let track = fixture.track.clone();
    let feed = StreamFeed::new(move || {
        stream::iter(track.clone()).then(move |position| async move {
            tokio::time::sleep(fix_interval).await;
            Ok::<_, AppError>(position)
        })
    });

    let (mut session, mut events) = ChallengeSession::new(
        fixture.challenge,
        fixture.player,
        config.session_config(),
        feed,
        store,
    );
    session.load_geometry(geometry)?;

    let logger = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            log_event(event);
        }
    });

    let (commands, rx) = mpsc::channel(8);
    commands
        .send(SessionCommand::Start {
            current_position: fixture.track.first().copied(),
        })
        .await?;

    // End one interval after the last fix
    let run_for = fix_interval * (fixture.track.len() as u32 + 1);
    tokio::spawn(async move {
        tokio::time::sleep(run_for).await;
        let _ = commands.send(SessionCommand::End).await;
    });

    let record = run_session(&mut session, rx).await;
    tracing::info!(points = session.player().points, "Player points");
    drop(session);
    logger.await?;

    match record {
        Some(record) => {
            let encoded = record.encoded_route()?;
            tracing::info!(
                challenge_id = record.challenge_id,
                total_reward = record.total_reward,
                distance_m = record.distance_meters,
                elapsed_s = record.elapsed_seconds,
                route = %encoded,
                "Replay finished"
            );
        }
        None => tracing::warn!("Replay ended without completing the challenge"),
    }
    Ok(())
}

fn log_event(event: SessionEvent) {
    match event {
        SessionEvent::StateChanged(snapshot) => {
            let bar = snapshot.status_bar();
            tracing::debug!(
                time = %bar.time,
                distance = %bar.distance,
                reward = bar.reward,
                paused = bar.paused,
                "Status"
            );
        }
        SessionEvent::SpawnPointReached(point) => {
            tracing::info!(key = %point.key, "You have reached a diamond spot!");
        }
        SessionEvent::ChallengeCompleted { summary, .. } => {
            tracing::info!(
                title = %summary.challenge_title,
                distance = %summary.distance,
                rewards = summary.rewards,
                completed = %summary.completion_time,
                "Activity summary"
            );
        }
        SessionEvent::Alert(message) => tracing::warn!(%message, "Alert"),
    }
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("park_quest=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
