// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Completion settlement: persist the completed challenge and the new points
//! total.
//!
//! The two writes are issued independently. If one fails the other is not
//! rolled back, and the caller's local points are updated either way, so the
//! hosted profile can lag behind what the player saw. Failures are logged.

use crate::db::SettlementStore;
use crate::models::{CompletionRecord, PlayerProfile, ProfileUpdate};
use crate::time_utils::format_utc_rfc3339;

/// Outcome of a settlement attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettlementReport {
    /// Points the player now holds locally
    pub new_points: u32,
    pub completion_persisted: bool,
    pub profile_persisted: bool,
}

/// Profile upsert that adds `record.total_reward` to the player's points.
pub fn profile_update(player: &PlayerProfile, record: &CompletionRecord) -> ProfileUpdate {
    ProfileUpdate {
        id: player.user_id.clone(),
        username: player.username.clone(),
        points: player.points.saturating_add(record.total_reward),
        avatar_url: player.avatar_url.clone(),
        updated_at: format_utc_rfc3339(record.completed_at),
    }
}

/// Write the completion row and the profile update, best-effort.
pub async fn settle<S: SettlementStore>(
    store: &S,
    player: &PlayerProfile,
    record: &CompletionRecord,
) -> SettlementReport {
    let row = record.to_completed_challenge(&player.user_id);
    let update = profile_update(player, record);

    let (completion, profile) = tokio::join!(
        store.insert_completed_challenge(&row),
        store.upsert_profile(&update)
    );

    if let Err(e) = &completion {
        tracing::error!(
            challenge_id = record.challenge_id,
            error = %e,
            "Failed to persist completed challenge"
        );
    }
    if let Err(e) = &profile {
        tracing::error!(
            user_id = %player.user_id,
            points = update.points,
            error = %e,
            "Failed to persist profile points"
        );
    }

    SettlementReport {
        new_points: update.points,
        completion_persisted: completion.is_ok(),
        profile_persisted: profile.is_ok(),
    }
}
