// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod challenge;
pub mod coordinate;
pub mod park;

pub use challenge::{
    ActivitySummary, Challenge, ChallengeKind, CompletedChallenge, CompletionRecord,
    PlayerProfile, ProfileUpdate,
};
pub use coordinate::{Coordinate, SpawnPoint};
pub use park::{CameraFraming, CameraRow, ParkGeometry, ParkRow, ShapeRow};
