// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use park_quest::db::{GeometrySource, SettlementStore};
use park_quest::error::{AppError, Result};
use park_quest::models::{
    CameraFraming, CameraRow, Challenge, ChallengeKind, CompletedChallenge, Coordinate,
    ParkGeometry, ParkRow, PlayerProfile, ProfileUpdate, ShapeRow,
};
use park_quest::services::{ChallengeSession, ChannelFeed, SessionConfig, SessionEvent, SessionStatus};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// Settlement store that records writes in memory and can be told to fail.
#[derive(Clone, Default)]
pub struct RecordingStore {
    pub completions: Arc<Mutex<Vec<CompletedChallenge>>>,
    pub profiles: Arc<Mutex<Vec<ProfileUpdate>>>,
    pub fail_writes: bool,
}

#[allow(dead_code)]
impl RecordingStore {
    pub fn failing() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    pub fn completions(&self) -> Vec<CompletedChallenge> {
        self.completions.lock().unwrap().clone()
    }

    pub fn profiles(&self) -> Vec<ProfileUpdate> {
        self.profiles.lock().unwrap().clone()
    }
}

impl SettlementStore for RecordingStore {
    async fn insert_completed_challenge(&self, row: &CompletedChallenge) -> Result<()> {
        if self.fail_writes {
            return Err(AppError::PersistenceFailure("insert rejected".to_string()));
        }
        self.completions.lock().unwrap().push(row.clone());
        Ok(())
    }

    async fn upsert_profile(&self, update: &ProfileUpdate) -> Result<()> {
        if self.fail_writes {
            return Err(AppError::PersistenceFailure("upsert rejected".to_string()));
        }
        self.profiles.lock().unwrap().push(update.clone());
        Ok(())
    }
}

/// Geometry source backed by in-memory rows.
#[allow(dead_code)]
#[derive(Default)]
pub struct FixtureSource {
    pub parks: HashMap<u64, ParkRow>,
    pub shapes: HashMap<u64, ShapeRow>,
    pub cameras: HashMap<u64, CameraRow>,
    /// Keyed by `bucket/path`
    pub objects: HashMap<String, String>,
}

#[allow(dead_code)]
fn not_found(what: &str, id: impl std::fmt::Display) -> AppError {
    AppError::GeometryUnavailable(format!("{} {} not found", what, id))
}

impl GeometrySource for FixtureSource {
    async fn fetch_park(&self, park_id: u64) -> Result<ParkRow> {
        self.parks.get(&park_id).cloned().ok_or_else(|| not_found("park", park_id))
    }

    async fn fetch_shape(&self, shape_id: u64) -> Result<ShapeRow> {
        self.shapes.get(&shape_id).cloned().ok_or_else(|| not_found("shape", shape_id))
    }

    async fn fetch_camera(&self, camera_id: u64) -> Result<CameraRow> {
        self.cameras
            .get(&camera_id)
            .cloned()
            .ok_or_else(|| not_found("camera", camera_id))
    }

    async fn fetch_object(&self, bucket: &str, path: &str) -> Result<String> {
        let key = format!("{}/{}", bucket, path);
        self.objects.get(&key).cloned().ok_or_else(|| not_found("object", key))
    }
}

#[allow(dead_code)]
pub fn test_challenge(base_reward: u32) -> Challenge {
    Challenge {
        id: 42,
        title: "Bishan Park Diamond Walk".to_string(),
        kind: ChallengeKind::Park { park_id: 3 },
        base_reward,
    }
}

#[allow(dead_code)]
pub fn test_player() -> PlayerProfile {
    PlayerProfile {
        user_id: "user-123".to_string(),
        username: "walker".to_string(),
        points: 100,
        avatar_url: Some("avatars/walker.png".to_string()),
    }
}

/// Geometry with no boundary, centered on the first sample spawn point.
#[allow(dead_code)]
pub fn geometry_with_spawn_points(spawn_points: &str) -> Arc<ParkGeometry> {
    Arc::new(ParkGeometry {
        overlay: geojson::FeatureCollection {
            bbox: None,
            features: vec![],
            foreign_members: None,
        },
        boundary: vec![],
        spawn_points: Some(spawn_points.to_string()),
        camera: CameraFraming {
            center: Coordinate::new(1.30, 103.80),
            pitch: 0.0,
            heading: 150.0,
            altitude: 1000.0,
            zoom: 16.0,
        },
    })
}

/// Park row from the committed sample fixture.
#[allow(dead_code)]
pub fn sample_park_row() -> ParkRow {
    let fixture = std::fs::read_to_string("data/sample_challenge.json")
        .expect("Failed to read sample fixture - is data/ committed?");
    let value: serde_json::Value = serde_json::from_str(&fixture).expect("valid fixture JSON");
    serde_json::from_value(value["park"].clone()).expect("valid park row")
}

/// Session over a channel feed and a recording store.
#[allow(dead_code)]
pub fn test_session(
    config: SessionConfig,
    base_reward: u32,
    feed: ChannelFeed,
    store: RecordingStore,
) -> (
    ChallengeSession<ChannelFeed, RecordingStore>,
    mpsc::UnboundedReceiver<SessionEvent>,
) {
    ChallengeSession::new(test_challenge(base_reward), test_player(), config, feed, store)
}

/// Drain events until the session reports `status`.
#[allow(dead_code)]
pub async fn wait_for_status(
    events: &mut mpsc::UnboundedReceiver<SessionEvent>,
    status: SessionStatus,
) {
    loop {
        match events.recv().await {
            Some(SessionEvent::StateChanged(snapshot)) if snapshot.status == status => return,
            Some(_) => continue,
            None => panic!("event channel closed before {:?}", status),
        }
    }
}

/// Count spawn point events currently queued.
#[allow(dead_code)]
pub fn drain_reached(events: &mut mpsc::UnboundedReceiver<SessionEvent>) -> usize {
    let mut reached = 0;
    while let Ok(event) = events.try_recv() {
        if matches!(event, SessionEvent::SpawnPointReached(_)) {
            reached += 1;
        }
    }
    reached
}
