// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Challenge, player and completion models.

use crate::error::{AppError, Result};
use crate::models::Coordinate;
use crate::time_utils::{format_date_time, format_distance, format_utc_rfc3339};
use chrono::{DateTime, Utc};
use geo::Coord;
use serde::{Deserialize, Serialize};

/// Polyline precision used for stored routes.
const ROUTE_PRECISION: u32 = 5;

/// Where a challenge's geometry comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ChallengeKind {
    /// Walk inside a park boundary
    Park { park_id: u64 },
    /// Trace a geometric shape
    Shape { shape_id: u64 },
}

/// A challenge as listed on the home screen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Challenge {
    pub id: u64,
    pub title: String,
    pub kind: ChallengeKind,
    /// Static diamond count awarded on completion
    pub base_reward: u32,
}

/// The signed-in player's profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub user_id: String,
    pub username: String,
    pub points: u32,
    pub avatar_url: Option<String>,
}

/// Immutable summary of one finished challenge attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRecord {
    pub challenge_id: u64,
    /// Points earned from spawn points during the session
    pub session_reward: u32,
    /// `session_reward` plus the challenge's base reward
    pub total_reward: u32,
    pub distance_meters: f64,
    pub elapsed_seconds: u64,
    pub route: Vec<Coordinate>,
    pub completed_at: DateTime<Utc>,
}

impl CompletionRecord {
    /// Encode the walked route as a polyline for storage and replay.
    pub fn encoded_route(&self) -> Result<String> {
        polyline::encode_coordinates(
            self.route.iter().map(|c| Coord::<f64>::from(*c)),
            ROUTE_PRECISION,
        )
        .map_err(|e| AppError::MalformedGeometry(format!("Route encoding failed: {}", e)))
    }

    /// Decode a route previously produced by [`CompletionRecord::encoded_route`].
    pub fn decode_route(encoded: &str) -> Result<Vec<Coordinate>> {
        let line = polyline::decode_polyline(encoded, ROUTE_PRECISION)
            .map_err(|e| AppError::MalformedGeometry(format!("Route decoding failed: {}", e)))?;
        Ok(line.0.into_iter().map(Coordinate::from).collect())
    }

    /// Row appended to the completed-challenges table.
    pub fn to_completed_challenge(&self, user_id: &str) -> CompletedChallenge {
        CompletedChallenge {
            user_id: user_id.to_string(),
            challenge_id: self.challenge_id,
            completion_date_time: format_utc_rfc3339(self.completed_at),
            challenge_points: self.total_reward,
        }
    }

    /// View model for the activity summary screen.
    pub fn summary(&self, challenge_title: &str) -> ActivitySummary {
        ActivitySummary {
            challenge_title: challenge_title.to_string(),
            distance: format_distance(self.distance_meters),
            rewards: self.total_reward,
            route: self.route.clone(),
            completion_time: format_date_time(self.completed_at),
            elapsed_seconds: self.elapsed_seconds,
        }
    }
}

/// Row in `CompletedChallenges_v2`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedChallenge {
    #[serde(rename = "userID")]
    pub user_id: String,
    #[serde(rename = "challengeID")]
    pub challenge_id: u64,
    #[serde(rename = "completionDateTime")]
    pub completion_date_time: String,
    #[serde(rename = "challengePoints")]
    pub challenge_points: u32,
}

/// Upsert body for the `profiles` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub id: String,
    pub username: String,
    pub points: u32,
    pub avatar_url: Option<String>,
    pub updated_at: String,
}

/// Data shown after a challenge ends.
#[derive(Debug, Clone, Serialize)]
pub struct ActivitySummary {
    pub challenge_title: String,
    pub distance: String,
    pub rewards: u32,
    pub route: Vec<Coordinate>,
    pub completion_time: String,
    pub elapsed_seconds: u64,
}
