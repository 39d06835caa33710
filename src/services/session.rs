// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Live challenge session.
//!
//! Owns the per-attempt state and drives it from three inputs:
//! 1. Position fixes from the feed (route, distance, spawn point rewards)
//! 2. The 1 Hz ticker (elapsed time)
//! 3. User actions (start, pause/resume, end)
//!
//! Pausing suppresses accumulation only. The feed subscription and the
//! ticker keep running and their inputs are discarded while paused.

use crate::db::SettlementStore;
use crate::error::{AppError, Result};
use crate::models::{
    ActivitySummary, Challenge, CompletionRecord, Coordinate, ParkGeometry, PlayerProfile,
    SpawnPoint,
};
use crate::services::distance::distance;
use crate::services::position_feed::{FeedOptions, PositionFeed, Subscription};
use crate::services::route::RouteAccumulator;
use crate::services::settlement::settle;
use crate::services::spawn_points::{SpawnPointRegistry, PROXIMITY_RADIUS_M};
use crate::time_utils::{format_distance, format_time};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, Interval, MissedTickBehavior};

/// Points awarded for reaching a spawn point.
pub const SPAWN_POINT_REWARD: u32 = 10;

/// Distance from the park center accepted by the containment checks.
pub const DEFAULT_CONTAINMENT_THRESHOLD_M: f64 = 2000.0;

const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Check applied before a session may start.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ContainmentPolicy {
    /// Start anywhere
    #[default]
    Disabled,
    /// Start within `threshold_m` of the park's camera center
    NearCenter { threshold_m: f64 },
    /// Start inside a polygonal part of the boundary. Boundaries without
    /// area (shape outlines) fall back to the default center threshold.
    InsideBoundary,
}

/// Per-session tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionConfig {
    pub proximity_radius_m: f64,
    pub spawn_point_reward: u32,
    pub containment: ContainmentPolicy,
    pub feed: FeedOptions,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            proximity_radius_m: PROXIMITY_RADIUS_M,
            spawn_point_reward: SPAWN_POINT_REWARD,
            containment: ContainmentPolicy::Disabled,
            feed: FeedOptions::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionStatus {
    NotStarted,
    InProgress,
    Paused,
    Completed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::NotStarted => "not started",
            SessionStatus::InProgress => "in progress",
            SessionStatus::Paused => "paused",
            SessionStatus::Completed => "completed",
        }
    }
}

/// Point-in-time view of a session for rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub status: SessionStatus,
    pub elapsed_seconds: u64,
    pub distance_meters: f64,
    /// Spawn point rewards only; the base reward is added on completion
    pub reward_points: u32,
    pub claimed_points: usize,
    pub route_len: usize,
}

impl SessionSnapshot {
    pub fn status_bar(&self) -> StatusBarView {
        StatusBarView {
            time: format_time(self.elapsed_seconds),
            distance: format_distance(self.distance_meters),
            reward: self.reward_points,
            paused: self.status == SessionStatus::Paused,
        }
    }
}

/// Formatted values for the in-challenge status bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusBarView {
    pub time: String,
    pub distance: String,
    pub reward: u32,
    /// Show the play icon instead of pause
    pub paused: bool,
}

/// Notifications for the UI collaborator.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    StateChanged(SessionSnapshot),
    SpawnPointReached(SpawnPoint),
    ChallengeCompleted {
        record: CompletionRecord,
        summary: ActivitySummary,
    },
    /// A user-facing failure to show as an alert
    Alert(String),
}

/// Something for the session to process, produced by [`ChallengeSession::next_input`].
#[derive(Debug)]
pub enum SessionInput {
    Tick,
    Position(Coordinate),
    PositionError(AppError),
    FirstFixTimeout,
    FeedClosed,
}

/// One challenge attempt with its injected collaborators.
pub struct ChallengeSession<F: PositionFeed, S: SettlementStore> {
    challenge: Challenge,
    player: PlayerProfile,
    config: SessionConfig,
    feed: F,
    store: S,
    events: mpsc::UnboundedSender<SessionEvent>,

    geometry: Option<Arc<ParkGeometry>>,
    registry: SpawnPointRegistry,
    route: RouteAccumulator,

    status: SessionStatus,
    elapsed_seconds: u64,
    distance_meters: f64,
    reward_points: u32,

    ticker: Option<Interval>,
    subscription: Option<Subscription>,
    feed_closed: bool,
    first_fix_deadline: Option<Instant>,
}

impl<F: PositionFeed, S: SettlementStore> ChallengeSession<F, S> {
    /// Create a session and the receiver for its UI events.
    pub fn new(
        challenge: Challenge,
        player: PlayerProfile,
        config: SessionConfig,
        feed: F,
        store: S,
    ) -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let session = Self {
            challenge,
            player,
            config,
            feed,
            store,
            events,
            geometry: None,
            registry: SpawnPointRegistry::new(),
            route: RouteAccumulator::new(),
            status: SessionStatus::NotStarted,
            elapsed_seconds: 0,
            distance_meters: 0.0,
            reward_points: 0,
            ticker: None,
            subscription: None,
            feed_closed: false,
            first_fix_deadline: None,
        };
        (session, rx)
    }

    // ─── Accessors ───────────────────────────────────────────────

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    pub fn distance_meters(&self) -> f64 {
        self.distance_meters
    }

    pub fn reward_points(&self) -> u32 {
        self.reward_points
    }

    pub fn route(&self) -> &[Coordinate] {
        self.route.path()
    }

    pub fn spawn_points(&self) -> &[SpawnPoint] {
        self.registry.points()
    }

    pub fn player(&self) -> &PlayerProfile {
        &self.player
    }

    pub fn challenge(&self) -> &Challenge {
        &self.challenge
    }

    pub fn geometry(&self) -> Option<&ParkGeometry> {
        self.geometry.as_deref()
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            status: self.status,
            elapsed_seconds: self.elapsed_seconds,
            distance_meters: self.distance_meters,
            reward_points: self.reward_points,
            claimed_points: self.registry.claimed_count(),
            route_len: self.route.path().len(),
        }
    }

    // ─── Lifecycle ───────────────────────────────────────────────

    /// Install the challenge geometry and its spawn points.
    pub fn load_geometry(&mut self, geometry: Arc<ParkGeometry>) -> Result<()> {
        if self.is_active() {
            return Err(self.surface(self.invalid("load geometry for")));
        }

        let raw = geometry.spawn_points.as_deref().unwrap_or("[]");
        if let Err(e) = self.registry.load_str(raw) {
            self.geometry = None;
            return Err(self.surface(e));
        }

        tracing::info!(
            challenge_id = self.challenge.id,
            spawn_points = self.registry.points().len(),
            "Challenge geometry loaded"
        );
        self.geometry = Some(geometry);
        Ok(())
    }

    /// Begin tracking. `current_position` feeds the containment check.
    ///
    /// Allowed from `NotStarted`, and from `Completed` to run a fresh attempt.
    pub fn start(&mut self, current_position: Option<Coordinate>) -> Result<()> {
        if !matches!(
            self.status,
            SessionStatus::NotStarted | SessionStatus::Completed
        ) {
            return Err(self.surface(self.invalid("start")));
        }
        let Some(geometry) = self.geometry.clone() else {
            return Err(self.surface(AppError::GeometryNotLoaded));
        };
        if let Err(e) = self.check_containment(&geometry, current_position) {
            return Err(self.surface(e));
        }

        let subscription = match self.feed.subscribe(self.config.feed) {
            Ok(subscription) => subscription,
            Err(e) => return Err(self.surface(e)),
        };

        self.reset_progress();
        self.subscription = Some(subscription);
        self.feed_closed = false;

        let mut ticker = tokio::time::interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.ticker = Some(ticker);

        self.first_fix_deadline = (self.config.feed.timeout_ms > 0)
            .then(|| Instant::now() + Duration::from_millis(self.config.feed.timeout_ms));

        self.status = SessionStatus::InProgress;
        tracing::info!(
            challenge_id = self.challenge.id,
            user_id = %self.player.user_id,
            "Challenge started"
        );
        self.emit_state();
        Ok(())
    }

    pub fn pause(&mut self) -> Result<()> {
        if self.status != SessionStatus::InProgress {
            return Err(self.surface(self.invalid("pause")));
        }
        self.status = SessionStatus::Paused;
        tracing::info!(challenge_id = self.challenge.id, "Challenge paused");
        self.emit_state();
        Ok(())
    }

    pub fn resume(&mut self) -> Result<()> {
        if self.status != SessionStatus::Paused {
            return Err(self.surface(self.invalid("resume")));
        }
        self.status = SessionStatus::InProgress;
        tracing::info!(challenge_id = self.challenge.id, "Challenge resumed");
        self.emit_state();
        Ok(())
    }

    /// The pause/play button.
    pub fn toggle_pause(&mut self) -> Result<()> {
        match self.status {
            SessionStatus::Paused => self.resume(),
            _ => self.pause(),
        }
    }

    /// Finish the attempt, settle rewards and reset for reuse.
    ///
    /// Settlement is best-effort: storage failures are logged and the local
    /// reset proceeds regardless.
    pub async fn end(&mut self) -> Result<CompletionRecord> {
        if !self.is_active() {
            return Err(self.surface(self.invalid("end")));
        }

        self.status = SessionStatus::Completed;
        self.teardown();

        let session_reward = self.reward_points;
        let record = CompletionRecord {
            challenge_id: self.challenge.id,
            session_reward,
            total_reward: session_reward.saturating_add(self.challenge.base_reward),
            distance_meters: self.distance_meters,
            elapsed_seconds: self.elapsed_seconds,
            route: self.route.path().to_vec(),
            completed_at: Utc::now(),
        };

        let report = settle(&self.store, &self.player, &record).await;
        self.player.points = report.new_points;

        tracing::info!(
            challenge_id = record.challenge_id,
            total_reward = record.total_reward,
            distance_m = record.distance_meters,
            elapsed_s = record.elapsed_seconds,
            completion_persisted = report.completion_persisted,
            profile_persisted = report.profile_persisted,
            "Challenge completed"
        );

        let summary = record.summary(&self.challenge.title);
        self.send(SessionEvent::ChallengeCompleted {
            record: record.clone(),
            summary,
        });

        self.reset_progress();
        self.emit_state();
        Ok(record)
    }

    /// Tear down without settling, e.g. when the screen is left mid-challenge.
    pub fn abandon(&mut self) {
        if self.is_active() {
            tracing::info!(challenge_id = self.challenge.id, "Challenge abandoned");
        }
        self.teardown();
        self.reset_progress();
        self.status = SessionStatus::NotStarted;
    }

    // ─── Inputs ──────────────────────────────────────────────────

    /// Process a fix. Returns the spawn point reached, if any.
    ///
    /// Fixes outside the WGS84 ranges are treated as sensor errors.
    pub fn on_position_update(&mut self, position: Coordinate) -> Option<SpawnPoint> {
        if !position.is_valid() {
            self.on_position_error(AppError::PositionUnavailable(format!(
                "invalid fix ({}, {})",
                position.latitude, position.longitude
            )));
            return None;
        }
        self.first_fix_deadline = None;
        if self.status != SessionStatus::InProgress {
            return None;
        }

        self.distance_meters += self.route.append(position);

        let reached = self
            .registry
            .check_proximity(position, self.config.proximity_radius_m)
            .cloned();
        if let Some(point) = &reached {
            self.registry.claim(point);
            self.reward_points = self
                .reward_points
                .saturating_add(self.config.spawn_point_reward);
            tracing::info!(
                challenge_id = self.challenge.id,
                key = %point.key,
                reward_points = self.reward_points,
                "Spawn point reached"
            );
            self.send(SessionEvent::SpawnPointReached(point.clone()));
        }

        self.emit_state();
        reached
    }

    /// Sensor errors are logged; the session keeps its last known position.
    pub fn on_position_error(&mut self, error: AppError) {
        error.log();
    }

    /// One ticker period elapsed.
    pub fn tick(&mut self) {
        if self.status != SessionStatus::InProgress {
            return;
        }
        self.elapsed_seconds += 1;
        self.emit_state();
    }

    /// Wait for the next ticker or feed input. `None` when not tracking.
    pub async fn next_input(&mut self) -> Option<SessionInput> {
        let (Some(ticker), Some(subscription)) = (self.ticker.as_mut(), self.subscription.as_mut())
        else {
            return None;
        };
        let feed_open = !self.feed_closed;
        let deadline = self.first_fix_deadline;

        let input = tokio::select! {
            _ = ticker.tick() => SessionInput::Tick,
            update = subscription.updates.recv(), if feed_open => match update {
                Some(Ok(position)) => SessionInput::Position(position),
                Some(Err(e)) => SessionInput::PositionError(e),
                None => SessionInput::FeedClosed,
            },
            _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                SessionInput::FirstFixTimeout
            }
        };
        Some(input)
    }

    /// Apply an input from [`ChallengeSession::next_input`].
    pub fn handle(&mut self, input: SessionInput) {
        match input {
            SessionInput::Tick => self.tick(),
            SessionInput::Position(position) => {
                self.on_position_update(position);
            }
            SessionInput::PositionError(e) => self.on_position_error(e),
            SessionInput::FirstFixTimeout => {
                self.first_fix_deadline = None;
                self.on_position_error(AppError::PositionUnavailable(format!(
                    "no fix within {} ms",
                    self.config.feed.timeout_ms
                )));
            }
            SessionInput::FeedClosed => {
                tracing::warn!(challenge_id = self.challenge.id, "Position feed closed");
                self.feed_closed = true;
            }
        }
    }

    // ─── Internals ───────────────────────────────────────────────

    fn is_active(&self) -> bool {
        matches!(
            self.status,
            SessionStatus::InProgress | SessionStatus::Paused
        )
    }

    fn invalid(&self, action: &'static str) -> AppError {
        AppError::InvalidTransition {
            from: self.status.as_str(),
            action,
        }
    }

    fn check_containment(
        &self,
        geometry: &ParkGeometry,
        current_position: Option<Coordinate>,
    ) -> Result<()> {
        let policy = self.config.containment;
        if policy == ContainmentPolicy::Disabled {
            return Ok(());
        }
        let position = current_position.filter(Coordinate::is_valid).ok_or_else(|| {
            AppError::PositionUnavailable("no valid current position for park check".to_string())
        })?;
        let distance_m = distance(position, geometry.center());

        let inside = match policy {
            ContainmentPolicy::Disabled => true,
            ContainmentPolicy::NearCenter { threshold_m } => distance_m < threshold_m,
            ContainmentPolicy::InsideBoundary if geometry.has_area() => {
                geometry.contains(position)
            }
            ContainmentPolicy::InsideBoundary => distance_m < DEFAULT_CONTAINMENT_THRESHOLD_M,
        };
        if inside {
            Ok(())
        } else {
            Err(AppError::OutsidePark { distance_m })
        }
    }

    /// Stop the ticker and release the feed subscription.
    fn teardown(&mut self) {
        self.ticker = None;
        self.first_fix_deadline = None;
        if let Some(subscription) = self.subscription.take() {
            self.feed.unsubscribe(subscription.handle);
        }
    }

    fn reset_progress(&mut self) {
        self.registry.reset_claims();
        self.route.reset();
        self.elapsed_seconds = 0;
        self.distance_meters = 0.0;
        self.reward_points = 0;
    }

    /// Log a user-facing failure and alert the UI.
    fn surface(&self, error: AppError) -> AppError {
        tracing::warn!(challenge_id = self.challenge.id, error = %error, "Challenge action failed");
        self.send(SessionEvent::Alert(error.to_string()));
        error
    }

    fn emit_state(&self) {
        self.send(SessionEvent::StateChanged(self.snapshot()));
    }

    fn send(&self, event: SessionEvent) {
        // The UI may have gone away; the session keeps working without it.
        let _ = self.events.send(event);
    }
}

impl<F: PositionFeed, S: SettlementStore> Drop for ChallengeSession<F, S> {
    fn drop(&mut self) {
        self.teardown();
    }
}
