// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Park/shape geometry and the storage rows it is built from.

use crate::models::Coordinate;
use geo::{Contains, Geometry, Point};
use serde::{Deserialize, Serialize};

/// Initial map camera for a challenge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraFraming {
    pub center: Coordinate,
    pub pitch: f64,
    pub heading: f64,
    pub altitude: f64,
    pub zoom: f64,
}

/// Everything a session needs about the challenge area, loaded once per
/// screen mount and read-only afterwards.
#[derive(Debug, Clone)]
pub struct ParkGeometry {
    /// GeoJSON handed to the map overlay as-is
    pub overlay: geojson::FeatureCollection,
    /// Parsed boundary parts (polygons, multipolygons, shape outlines)
    pub boundary: Vec<Geometry<f64>>,
    /// Raw spawn point list as stored, e.g. `"[[1.30,103.80]]"`
    pub spawn_points: Option<String>,
    pub camera: CameraFraming,
}

impl ParkGeometry {
    /// Reference point used by the distance-to-park check.
    pub fn center(&self) -> Coordinate {
        self.camera.center
    }

    /// Whether the boundary has any polygonal part. Shape outlines do not.
    pub fn has_area(&self) -> bool {
        self.boundary
            .iter()
            .any(|g| matches!(g, Geometry::Polygon(_) | Geometry::MultiPolygon(_)))
    }

    /// Whether any polygonal part of the boundary contains `position`.
    ///
    /// Line outlines (shape challenges) never contain a point.
    pub fn contains(&self, position: Coordinate) -> bool {
        let point: Point<f64> = position.into();
        self.boundary.iter().any(|geometry| match geometry {
            Geometry::Polygon(p) => p.contains(&point),
            Geometry::MultiPolygon(mp) => mp.contains(&point),
            _ => false,
        })
    }
}

/// Row from the `Parks_v3` table.
#[derive(Debug, Clone, Deserialize)]
pub struct ParkRow {
    pub id: u64,
    #[serde(rename = "FilteredData")]
    pub filtered_data: serde_json::Value,
    #[serde(rename = "spawnPoints")]
    pub spawn_points: Option<String>,
    #[serde(rename = "initialLatitude")]
    pub initial_latitude: f64,
    #[serde(rename = "initialLongitude")]
    pub initial_longitude: f64,
    pub zoom: f64,
}

/// Row from the `Shapes` table.
#[derive(Debug, Clone, Deserialize)]
pub struct ShapeRow {
    pub id: u64,
    /// `bucket/file` path of the shape GeoJSON in object storage
    #[serde(rename = "shapeFilePath")]
    pub shape_file_path: String,
    pub spawn_points: Option<String>,
    #[serde(rename = "cameraId")]
    pub camera_id: u64,
}

/// Row from the `Cameras_Shapes` table.
#[derive(Debug, Clone, Deserialize)]
pub struct CameraRow {
    pub id: u64,
    pub latitude: f64,
    pub longitude: f64,
    pub pitch: f64,
    pub heading: f64,
    pub altitude: f64,
    pub zoom: f64,
}

impl From<CameraRow> for CameraFraming {
    fn from(row: CameraRow) -> Self {
        Self {
            center: Coordinate::new(row.latitude, row.longitude),
            pitch: row.pitch,
            heading: row.heading,
            altitude: row.altitude,
            zoom: row.zoom,
        }
    }
}
