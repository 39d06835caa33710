// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Park and shape geometry loading.

use crate::db::GeometrySource;
use crate::error::{AppError, Result};
use crate::models::{
    CameraFraming, CameraRow, ChallengeKind, Coordinate, ParkGeometry, ParkRow, ShapeRow,
};
use geo::Geometry;
use geojson::{Feature, FeatureCollection, GeoJson};

/// Camera used for park challenges, which only store a center and zoom.
const PARK_CAMERA_PITCH: f64 = 0.0;
const PARK_CAMERA_HEADING: f64 = 150.0;
const PARK_CAMERA_ALTITUDE: f64 = 1000.0;

/// Loads a challenge's geometry from the storage collaborator.
pub struct ParkLoader<'a, G> {
    source: &'a G,
}

impl<'a, G: GeometrySource + Sync> ParkLoader<'a, G> {
    pub fn new(source: &'a G) -> Self {
        Self { source }
    }

    /// Fetch and assemble geometry for either kind of challenge.
    pub async fn load(&self, kind: ChallengeKind) -> Result<ParkGeometry> {
        match kind {
            ChallengeKind::Park { park_id } => {
                let row = self.source.fetch_park(park_id).await?;
                from_park_row(row)
            }
            ChallengeKind::Shape { shape_id } => {
                let shape = self.source.fetch_shape(shape_id).await?;
                let (bucket, path) = split_storage_path(&shape.shape_file_path)?;
                let shape_json = self.source.fetch_object(bucket, path).await?;
                let camera = self.source.fetch_camera(shape.camera_id).await?;
                from_shape(shape, &shape_json, camera)
            }
        }
    }
}

/// Build geometry for a park challenge.
pub fn from_park_row(row: ParkRow) -> Result<ParkGeometry> {
    let geojson = GeoJson::from_json_value(row.filtered_data)
        .map_err(|e| AppError::MalformedGeometry(format!("Park {}: {}", row.id, e)))?;
    let overlay = into_feature_collection(geojson);
    let boundary = convert_features(&overlay)?;

    tracing::info!(park_id = row.id, parts = boundary.len(), "Loaded park geometry");
    Ok(ParkGeometry {
        overlay,
        boundary,
        spawn_points: row.spawn_points,
        camera: CameraFraming {
            center: Coordinate::new(row.initial_latitude, row.initial_longitude),
            pitch: PARK_CAMERA_PITCH,
            heading: PARK_CAMERA_HEADING,
            altitude: PARK_CAMERA_ALTITUDE,
            zoom: row.zoom,
        },
    })
}

/// Build geometry for a shape challenge from its row, GeoJSON file and camera.
pub fn from_shape(row: ShapeRow, shape_json: &str, camera: CameraRow) -> Result<ParkGeometry> {
    let geojson: GeoJson = shape_json
        .parse()
        .map_err(|e: geojson::Error| AppError::MalformedGeometry(format!("Shape {}: {}", row.id, e)))?;
    let overlay = into_feature_collection(geojson);
    let boundary = convert_features(&overlay)?;

    tracing::info!(shape_id = row.id, parts = boundary.len(), "Loaded shape geometry");
    Ok(ParkGeometry {
        overlay,
        boundary,
        spawn_points: row.spawn_points,
        camera: camera.into(),
    })
}

/// Keep only features whose `Description` mentions `park_name`.
pub fn filter_features(collection: &FeatureCollection, park_name: &str) -> FeatureCollection {
    let features = collection
        .features
        .iter()
        .filter(|f| {
            f.property("Description")
                .and_then(|v| v.as_str())
                .is_some_and(|d| d.contains(park_name))
        })
        .cloned()
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

/// Split a `bucket/file` storage path.
fn split_storage_path(path: &str) -> Result<(&str, &str)> {
    match path.split_once('/') {
        Some((bucket, file)) if !bucket.is_empty() && !file.is_empty() => Ok((bucket, file)),
        _ => Err(AppError::MalformedGeometry(format!(
            "Invalid storage path: {}",
            path
        ))),
    }
}

fn into_feature_collection(geojson: GeoJson) -> FeatureCollection {
    match geojson {
        GeoJson::FeatureCollection(collection) => collection,
        GeoJson::Feature(feature) => FeatureCollection {
            bbox: None,
            features: vec![feature],
            foreign_members: None,
        },
        GeoJson::Geometry(geometry) => FeatureCollection {
            bbox: None,
            features: vec![Feature::from(geometry)],
            foreign_members: None,
        },
    }
}

/// Convert every feature geometry to our internal format.
fn convert_features(collection: &FeatureCollection) -> Result<Vec<Geometry<f64>>> {
    collection
        .features
        .iter()
        .filter_map(|f| f.geometry.as_ref())
        .map(|geom| {
            Geometry::<f64>::try_from(geom.value.clone())
                .map_err(|e| AppError::MalformedGeometry(e.to_string()))
        })
        .collect()
}
