// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Great-circle distance between coordinates.

use crate::models::Coordinate;
use geo::{Distance, Haversine, Point};

/// Haversine distance in meters on a spherical Earth.
///
/// Returns 0 for coincident points and for any non-finite result.
pub fn distance(a: Coordinate, b: Coordinate) -> f64 {
    if a == b {
        return 0.0;
    }
    let meters = Haversine.distance(Point::from(a), Point::from(b));
    if meters.is_finite() {
        meters
    } else {
        0.0
    }
}

/// Distance where a missing endpoint means nothing was traversed yet.
pub fn distance_or_zero(a: Option<Coordinate>, b: Option<Coordinate>) -> f64 {
    match (a, b) {
        (Some(a), Some(b)) => distance(a, b),
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coincident_points() {
        let a = Coordinate::new(1.3, 103.8);
        assert_eq!(distance(a, a), 0.0);
    }

    #[test]
    fn test_missing_endpoint() {
        let a = Coordinate::new(1.3, 103.8);
        assert_eq!(distance_or_zero(None, Some(a)), 0.0);
        assert_eq!(distance_or_zero(Some(a), None), 0.0);
        assert_eq!(distance_or_zero(None, None), 0.0);
    }

    #[test]
    fn test_symmetry() {
        let a = Coordinate::new(37.3318, -122.0312);
        let b = Coordinate::new(37.3230, -122.0090);
        assert!((distance(a, b) - distance(b, a)).abs() < 1e-9);
    }

    #[test]
    fn test_one_millidegree_latitude() {
        // 0.001 deg of latitude is ~111 m anywhere on the sphere
        let d = distance(Coordinate::new(1.300, 103.8), Coordinate::new(1.301, 103.8));
        assert!((d - 111.2).abs() < 0.5, "got {}", d);
    }

    #[test]
    fn test_nan_input_is_zero() {
        let d = distance(Coordinate::new(f64::NAN, 0.0), Coordinate::new(1.0, 1.0));
        assert_eq!(d, 0.0);
    }
}
