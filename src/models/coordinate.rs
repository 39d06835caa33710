// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Coordinates and spawn points.

use geo::{Coord, Point};
use serde::{Deserialize, Serialize};

/// A WGS84 position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Finite and within WGS84 latitude/longitude ranges.
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

// geo uses x = longitude, y = latitude.
impl From<Coordinate> for Point<f64> {
    fn from(c: Coordinate) -> Self {
        Point::new(c.longitude, c.latitude)
    }
}

impl From<Coordinate> for Coord<f64> {
    fn from(c: Coordinate) -> Self {
        Coord {
            x: c.longitude,
            y: c.latitude,
        }
    }
}

impl From<Coord<f64>> for Coordinate {
    fn from(c: Coord<f64>) -> Self {
        Coordinate::new(c.y, c.x)
    }
}

/// A rewardable location inside a challenge area.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpawnPoint {
    pub coordinate: Coordinate,
    /// Stable set-membership key, `"lat,lon"`.
    pub key: String,
}

impl SpawnPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            coordinate: Coordinate::new(latitude, longitude),
            key: format!("{},{}", latitude, longitude),
        }
    }
}
