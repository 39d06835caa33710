//! Storage layer (hosted PostgREST tables and object storage).

pub mod supabase;

pub use supabase::SupabaseDb;

use crate::error::Result;
use crate::models::{CameraRow, CompletedChallenge, ParkRow, ProfileUpdate, ShapeRow};
use std::future::Future;

/// Table names as constants.
pub mod tables {
    pub const PARKS: &str = "Parks_v3";
    pub const SHAPES: &str = "Shapes";
    pub const CAMERAS: &str = "Cameras_Shapes";
    pub const COMPLETED_CHALLENGES: &str = "CompletedChallenges_v2";
    pub const PROFILES: &str = "profiles";
}

/// Read side: challenge geometry.
pub trait GeometrySource {
    fn fetch_park(&self, park_id: u64) -> impl Future<Output = Result<ParkRow>> + Send;
    fn fetch_shape(&self, shape_id: u64) -> impl Future<Output = Result<ShapeRow>> + Send;
    fn fetch_camera(&self, camera_id: u64) -> impl Future<Output = Result<CameraRow>> + Send;
    /// Fetch a text object (shape GeoJSON) from a storage bucket.
    fn fetch_object(&self, bucket: &str, path: &str)
        -> impl Future<Output = Result<String>> + Send;
}

/// Write side: challenge settlement.
///
/// The two writes are independent; there is no transaction spanning them.
pub trait SettlementStore {
    fn insert_completed_challenge(
        &self,
        row: &CompletedChallenge,
    ) -> impl Future<Output = Result<()>> + Send;
    fn upsert_profile(&self, update: &ProfileUpdate) -> impl Future<Output = Result<()>> + Send;
}
