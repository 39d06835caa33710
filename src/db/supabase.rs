// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Hosted backend client (PostgREST tables + public object storage).
//!
//! Provides typed operations for:
//! - Parks, shapes and cameras (challenge geometry)
//! - Shape GeoJSON files in storage buckets
//! - Completed challenges and profile points (settlement)

use crate::config::Config;
use crate::db::{tables, GeometrySource, SettlementStore};
use crate::error::{AppError, Result};
use crate::models::{CameraRow, CompletedChallenge, ParkRow, ProfileUpdate, ShapeRow};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Hosted backend client.
#[derive(Clone)]
pub struct SupabaseDb {
    client: Option<RestClient>,
}

#[derive(Clone)]
struct RestClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    /// Signed-in user's JWT; falls back to the anon key
    access_token: Option<String>,
}

impl SupabaseDb {
    /// Create a client for the project at `base_url`.
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            client: Some(RestClient {
                http: reqwest::Client::new(),
                base_url: base_url.trim_end_matches('/').to_string(),
                api_key: api_key.to_string(),
                access_token: None,
            }),
        }
    }

    /// Create a client from configuration, offline if credentials are absent.
    pub fn from_config(config: &Config) -> Self {
        match (&config.supabase_url, &config.supabase_anon_key) {
            (Some(url), Some(key)) => {
                tracing::info!(
                    url = %url,
                    signed_in = config.supabase_access_token.is_some(),
                    "Using hosted storage"
                );
                let db = Self::new(url, key);
                match &config.supabase_access_token {
                    Some(token) => db.with_access_token(token),
                    None => db,
                }
            }
            _ => {
                tracing::warn!("Storage not configured, running offline");
                Self::new_mock()
            }
        }
    }

    /// Create a mock client for testing (offline mode).
    ///
    /// All operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Authenticate requests as the signed-in user.
    pub fn with_access_token(mut self, token: &str) -> Self {
        if let Some(client) = self.client.as_mut() {
            client.access_token = Some(token.to_string());
        }
        self
    }

    pub fn is_offline(&self) -> bool {
        self.client.is_none()
    }

    fn get_client(&self) -> Option<&RestClient> {
        self.client.as_ref()
    }

    // ─── Table Operations ────────────────────────────────────────

    /// Select the row with `id` from a table.
    async fn select_by_id<T: DeserializeOwned>(&self, table: &str, id: u64) -> Result<T> {
        let client = self
            .get_client()
            .ok_or_else(|| AppError::GeometryUnavailable("offline mode".to_string()))?;

        let url = format!("{}/rest/v1/{}", client.base_url, table);
        let response = client
            .authorize(client.http.get(&url))
            .query(&[("id", format!("eq.{}", id)), ("select", "*".to_string())])
            .send()
            .await
            .map_err(|e| AppError::GeometryUnavailable(e.to_string()))?;

        let response = check_response(response)
            .await
            .map_err(AppError::GeometryUnavailable)?;
        let rows: Vec<T> = response
            .json()
            .await
            .map_err(|e| AppError::MalformedGeometry(format!("{} row: {}", table, e)))?;

        rows.into_iter()
            .next()
            .ok_or_else(|| AppError::GeometryUnavailable(format!("{} {} not found", table, id)))
    }

    /// Insert (or upsert) a row into a table.
    async fn insert<T: Serialize + Sync>(&self, table: &str, row: &T, upsert: bool) -> Result<()> {
        let client = self
            .get_client()
            .ok_or_else(|| AppError::PersistenceFailure("offline mode".to_string()))?;

        let prefer = if upsert {
            "return=minimal,resolution=merge-duplicates"
        } else {
            "return=minimal"
        };

        let url = format!("{}/rest/v1/{}", client.base_url, table);
        let response = client
            .authorize(client.http.post(&url))
            .header("Prefer", prefer)
            .json(row)
            .send()
            .await
            .map_err(|e| AppError::PersistenceFailure(e.to_string()))?;

        check_response(response)
            .await
            .map_err(AppError::PersistenceFailure)?;
        tracing::debug!(table, upsert, "Row written");
        Ok(())
    }
}

impl RestClient {
    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let token = self.access_token.as_deref().unwrap_or(&self.api_key);
        request.header("apikey", &self.api_key).bearer_auth(token)
    }
}

/// Check response status and return the body text as the error if not successful.
async fn check_response(
    response: reqwest::Response,
) -> std::result::Result<reqwest::Response, String> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(format!("HTTP {}: {}", status, body))
}

impl GeometrySource for SupabaseDb {
    async fn fetch_park(&self, park_id: u64) -> Result<ParkRow> {
        self.select_by_id(tables::PARKS, park_id).await
    }

    async fn fetch_shape(&self, shape_id: u64) -> Result<ShapeRow> {
        self.select_by_id(tables::SHAPES, shape_id).await
    }

    async fn fetch_camera(&self, camera_id: u64) -> Result<CameraRow> {
        self.select_by_id(tables::CAMERAS, camera_id).await
    }

    async fn fetch_object(&self, bucket: &str, path: &str) -> Result<String> {
        let client = self
            .get_client()
            .ok_or_else(|| AppError::GeometryUnavailable("offline mode".to_string()))?;

        let url = format!(
            "{}/storage/v1/object/public/{}/{}",
            client.base_url, bucket, path
        );
        let response = client
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::GeometryUnavailable(e.to_string()))?;

        check_response(response)
            .await
            .map_err(AppError::GeometryUnavailable)?
            .text()
            .await
            .map_err(|e| AppError::GeometryUnavailable(e.to_string()))
    }
}

impl SettlementStore for SupabaseDb {
    async fn insert_completed_challenge(&self, row: &CompletedChallenge) -> Result<()> {
        self.insert(tables::COMPLETED_CHALLENGES, row, false).await
    }

    async fn upsert_profile(&self, update: &ProfileUpdate) -> Result<()> {
        self.insert(tables::PROFILES, update, true).await
    }
}
