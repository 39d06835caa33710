// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Challenge session tests: rewards, pause semantics, completion and reuse.

use park_quest::models::Coordinate;
use park_quest::services::{distance, ChannelFeed, SessionConfig, SessionEvent, SessionStatus};

mod common;
use common::{drain_reached, geometry_with_spawn_points, test_session, RecordingStore};

const TWO_POINTS: &str = "[[1.30,103.80],[1.31,103.81]]";

#[tokio::test]
async fn test_two_spawn_point_scenario() {
    let store = RecordingStore::default();
    let (mut session, mut events) =
        test_session(SessionConfig::default(), 5, ChannelFeed::new(), store.clone());
    session
        .load_geometry(geometry_with_spawn_points(TWO_POINTS))
        .unwrap();
    session.start(None).unwrap();

    // Approach point 1: ~44 m, then ~5.6 m
    assert!(session
        .on_position_update(Coordinate::new(1.2996, 103.80))
        .is_none());
    let reached = session.on_position_update(Coordinate::new(1.29995, 103.80));
    assert_eq!(reached.map(|p| p.key), Some("1.3,103.8".to_string()));

    // Standing on it again is not rewarded twice
    assert!(session
        .on_position_update(Coordinate::new(1.30, 103.80))
        .is_none());
    assert_eq!(session.reward_points(), 10);

    // ~500 m south of point 2
    assert!(session
        .on_position_update(Coordinate::new(1.3055, 103.81))
        .is_none());
    assert_eq!(drain_reached(&mut events), 1);

    let record = session.end().await.expect("end should succeed");

    assert_eq!(record.session_reward, 10);
    assert_eq!(record.total_reward, 15);
    assert_eq!(record.route.len(), 3);
    assert_eq!(session.status(), SessionStatus::Completed);

    let completions = store.completions();
    assert_eq!(completions.len(), 1);
    assert_eq!(completions[0].challenge_id, 42);
    assert_eq!(completions[0].challenge_points, 15);
    assert_eq!(completions[0].user_id, "user-123");

    let profiles = store.profiles();
    assert_eq!(profiles.len(), 1);
    assert_eq!(profiles[0].points, 115);
    assert_eq!(session.player().points, 115);
}

#[tokio::test]
async fn test_distance_accumulates_route_segments() {
    let (mut session, _events) = test_session(
        SessionConfig::default(),
        0,
        ChannelFeed::new(),
        RecordingStore::default(),
    );
    session.load_geometry(geometry_with_spawn_points("[]")).unwrap();
    session.start(None).unwrap();

    let a = Coordinate::new(1.300, 103.800);
    let b = Coordinate::new(1.301, 103.800);
    let c = Coordinate::new(1.301, 103.801);
    session.on_position_update(a);
    assert_eq!(session.distance_meters(), 0.0);
    assert!(session.route().is_empty());

    session.on_position_update(b);
    session.on_position_update(c);

    let expected = distance(a, b) + distance(b, c);
    assert!((session.distance_meters() - expected).abs() < 1e-9);
    assert_eq!(session.route(), &[b, c]);
}

#[tokio::test]
async fn test_pause_freezes_and_resume_continues() {
    let (mut session, _events) = test_session(
        SessionConfig::default(),
        0,
        ChannelFeed::new(),
        RecordingStore::default(),
    );
    session
        .load_geometry(geometry_with_spawn_points(TWO_POINTS))
        .unwrap();
    session.start(None).unwrap();

    session.on_position_update(Coordinate::new(1.298, 103.80));
    session.on_position_update(Coordinate::new(1.299, 103.80));
    session.tick();
    session.tick();
    let frozen = session.snapshot();
    assert!(frozen.distance_meters > 0.0);

    session.toggle_pause().unwrap();
    assert_eq!(session.status(), SessionStatus::Paused);
    assert!(session.snapshot().status_bar().paused);

    // Walking over a spawn point while paused earns nothing
    assert!(session
        .on_position_update(Coordinate::new(1.30, 103.80))
        .is_none());
    session.tick();
    assert_eq!(session.snapshot(), {
        let mut expected = frozen.clone();
        expected.status = SessionStatus::Paused;
        expected
    });

    session.toggle_pause().unwrap();
    session.tick();
    session.on_position_update(Coordinate::new(1.2995, 103.80));

    assert_eq!(session.elapsed_seconds(), frozen.elapsed_seconds + 1);
    assert!(session.distance_meters() > frozen.distance_meters);
    assert_eq!(session.reward_points(), 0);
}

#[tokio::test]
async fn test_end_resets_for_a_fresh_attempt() {
    let (mut session, _events) = test_session(
        SessionConfig::default(),
        5,
        ChannelFeed::new(),
        RecordingStore::default(),
    );
    session
        .load_geometry(geometry_with_spawn_points(TWO_POINTS))
        .unwrap();
    session.start(None).unwrap();
    session.on_position_update(Coordinate::new(1.30, 103.80));
    session.tick();
    session.end().await.unwrap();

    let snapshot = session.snapshot();
    assert_eq!(snapshot.reward_points, 0);
    assert_eq!(snapshot.claimed_points, 0);
    assert_eq!(snapshot.elapsed_seconds, 0);
    assert_eq!(snapshot.distance_meters, 0.0);
    assert_eq!(snapshot.route_len, 0);
    assert!(!session.is_subscribed());

    // Same point pays out again in the next attempt
    session.start(None).unwrap();
    assert!(session
        .on_position_update(Coordinate::new(1.30, 103.80))
        .is_some());
    assert_eq!(session.reward_points(), 10);
}

#[tokio::test]
async fn test_settlement_failure_still_completes() {
    let store = RecordingStore::failing();
    let (mut session, mut events) =
        test_session(SessionConfig::default(), 5, ChannelFeed::new(), store.clone());
    session
        .load_geometry(geometry_with_spawn_points(TWO_POINTS))
        .unwrap();
    session.start(None).unwrap();
    session.on_position_update(Coordinate::new(1.30, 103.80));

    let record = session.end().await.expect("local completion is not rolled back");

    assert_eq!(record.total_reward, 15);
    assert_eq!(session.player().points, 115);
    assert!(store.completions().is_empty());
    assert_eq!(session.snapshot().reward_points, 0);

    let completed = std::iter::from_fn(|| events.try_recv().ok())
        .find(|e| matches!(e, SessionEvent::ChallengeCompleted { .. }));
    match completed {
        Some(SessionEvent::ChallengeCompleted { summary, .. }) => {
            assert_eq!(summary.rewards, 15);
            assert_eq!(summary.challenge_title, "Bishan Park Diamond Walk");
        }
        _ => panic!("expected a ChallengeCompleted event"),
    }
}

#[tokio::test]
async fn test_end_unsubscribes_feed() {
    let feed = ChannelFeed::new();
    let (mut session, _events) = test_session(
        SessionConfig::default(),
        0,
        feed.clone(),
        RecordingStore::default(),
    );
    session.load_geometry(geometry_with_spawn_points("[]")).unwrap();
    session.start(None).unwrap();
    assert_eq!(feed.active_subscriptions(), 1);
    assert_eq!(feed.last_options(), Some(SessionConfig::default().feed));

    session.pause().unwrap();
    session.end().await.unwrap();

    assert_eq!(feed.active_subscriptions(), 0);
}

#[tokio::test]
async fn test_abandon_skips_settlement() {
    let feed = ChannelFeed::new();
    let store = RecordingStore::default();
    let (mut session, _events) =
        test_session(SessionConfig::default(), 5, feed.clone(), store.clone());
    session
        .load_geometry(geometry_with_spawn_points(TWO_POINTS))
        .unwrap();
    session.start(None).unwrap();
    session.on_position_update(Coordinate::new(1.30, 103.80));

    session.abandon();

    assert_eq!(session.status(), SessionStatus::NotStarted);
    assert_eq!(session.reward_points(), 0);
    assert_eq!(feed.active_subscriptions(), 0);
    assert!(store.completions().is_empty());
    assert_eq!(session.player().points, 100);
}

#[tokio::test]
async fn test_corrupt_fixes_earn_nothing() {
    let (mut session, _events) = test_session(
        SessionConfig::default(),
        5,
        ChannelFeed::new(),
        RecordingStore::default(),
    );
    session
        .load_geometry(geometry_with_spawn_points(TWO_POINTS))
        .unwrap();
    session.start(None).unwrap();

    assert!(session
        .on_position_update(Coordinate::new(f64::NAN, f64::NAN))
        .is_none());
    assert!(session
        .on_position_update(Coordinate::new(f64::INFINITY, 103.80))
        .is_none());
    assert!(session
        .on_position_update(Coordinate::new(1.30, 190.0))
        .is_none());

    assert_eq!(session.reward_points(), 0);
    assert!(session.route().is_empty());

    // The next good fix still pays out and starts the route
    assert!(session
        .on_position_update(Coordinate::new(1.30, 103.80))
        .is_some());
    let record = session.end().await.unwrap();
    assert_eq!(record.total_reward, 15);
    assert!(record.encoded_route().is_ok());
}

#[tokio::test]
async fn test_huge_base_reward_saturates() {
    let store = RecordingStore::default();
    let (mut session, _events) = test_session(
        SessionConfig::default(),
        u32::MAX,
        ChannelFeed::new(),
        store.clone(),
    );
    session
        .load_geometry(geometry_with_spawn_points(TWO_POINTS))
        .unwrap();
    session.start(None).unwrap();
    session.on_position_update(Coordinate::new(1.30, 103.80));

    let record = session.end().await.expect("end should not overflow");

    assert_eq!(record.session_reward, 10);
    assert_eq!(record.total_reward, u32::MAX);
    assert_eq!(store.completions()[0].challenge_points, u32::MAX);
    assert_eq!(store.profiles()[0].points, u32::MAX);
}
