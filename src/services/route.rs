// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Walked-route accumulation.

use crate::models::Coordinate;
use crate::services::distance::distance_or_zero;

/// Append-only path of accepted fixes plus the last known position.
///
/// The first fix only sets the anchor; a segment is recorded once a second
/// fix arrives.
#[derive(Debug, Default, Clone)]
pub struct RouteAccumulator {
    path: Vec<Coordinate>,
    anchor: Option<Coordinate>,
}

impl RouteAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a fix and return the distance walked since the previous one.
    pub fn append(&mut self, position: Coordinate) -> f64 {
        let Some(previous) = self.anchor.replace(position) else {
            return 0.0;
        };
        self.path.push(position);
        distance_or_zero(Some(previous), Some(position))
    }

    pub fn reset(&mut self) {
        self.path.clear();
        self.anchor = None;
    }

    pub fn path(&self) -> &[Coordinate] {
        &self.path
    }

    pub fn last_position(&self) -> Option<Coordinate> {
        self.anchor
    }
}
