// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Spawn point registry: which rewardable points exist and which are claimed.

use crate::error::{AppError, Result};
use crate::models::{Coordinate, SpawnPoint};
use crate::services::distance::distance;
use serde_json::Value;
use std::collections::HashSet;

/// Radius within which a spawn point counts as reached.
pub const PROXIMITY_RADIUS_M: f64 = 10.0;

/// Spawn points for the active challenge and the keys already rewarded.
#[derive(Debug, Default, Clone)]
pub struct SpawnPointRegistry {
    points: Vec<SpawnPoint>,
    claimed: HashSet<String>,
}

impl SpawnPointRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load spawn points from their stored string form, e.g. `"[[1.3,103.8]]"`.
    pub fn load_str(&mut self, raw: &str) -> Result<()> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| AppError::MalformedGeometry(format!("Spawn points: {}", e)))?;
        self.load(&value)
    }

    /// Replace the point set with `[lat, lon]` pairs and clear all claims.
    ///
    /// Repeated coordinates collapse onto the first occurrence so keys stay
    /// unique.
    pub fn load(&mut self, raw: &Value) -> Result<()> {
        let pairs = raw.as_array().ok_or_else(|| {
            AppError::MalformedGeometry("Spawn points must be an array".to_string())
        })?;

        let mut points = Vec::with_capacity(pairs.len());
        let mut keys = HashSet::with_capacity(pairs.len());
        for (index, pair) in pairs.iter().enumerate() {
            let point = parse_pair(pair).ok_or_else(|| {
                AppError::MalformedGeometry(format!(
                    "Spawn point {} is not a [lat, lon] pair: {}",
                    index, pair
                ))
            })?;
            if keys.insert(point.key.clone()) {
                points.push(point);
            } else {
                tracing::warn!(key = %point.key, "Ignoring duplicate spawn point");
            }
        }

        tracing::info!(count = points.len(), "Loaded spawn points");
        self.points = points;
        self.claimed.clear();
        Ok(())
    }

    /// First unclaimed point within `threshold_m` of `position`, in load order.
    pub fn check_proximity(&self, position: Coordinate, threshold_m: f64) -> Option<&SpawnPoint> {
        self.points.iter().find(|p| {
            !self.claimed.contains(&p.key) && distance(p.coordinate, position) <= threshold_m
        })
    }

    /// Mark a point as rewarded. Returns `false` if it was already claimed.
    pub fn claim(&mut self, point: &SpawnPoint) -> bool {
        self.claimed.insert(point.key.clone())
    }

    pub fn is_claimed(&self, point: &SpawnPoint) -> bool {
        self.claimed.contains(&point.key)
    }

    /// Forget all claims, keeping the loaded points.
    pub fn reset_claims(&mut self) {
        self.claimed.clear();
    }

    pub fn points(&self) -> &[SpawnPoint] {
        &self.points
    }

    pub fn claimed_count(&self) -> usize {
        self.claimed.len()
    }
}

fn parse_pair(value: &Value) -> Option<SpawnPoint> {
    match value.as_array()?.as_slice() {
        [lat, lon] => {
            let point = SpawnPoint::new(lat.as_f64()?, lon.as_f64()?);
            point.coordinate.is_valid().then_some(point)
        }
        _ => None,
    }
}
