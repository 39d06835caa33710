//! Application configuration loaded from environment variables.
//!
//! Storage credentials are optional: without them the app runs against an
//! offline store and completions are only kept locally.

use crate::services::position_feed::FeedOptions;
use crate::services::session::{
    ContainmentPolicy, SessionConfig, DEFAULT_CONTAINMENT_THRESHOLD_M,
};
use std::env;
use std::str::FromStr;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Hosted storage ---
    /// Base URL of the hosted backend (e.g. `https://xyz.supabase.co`)
    pub supabase_url: Option<String>,
    /// Anonymous API key sent with every request
    pub supabase_anon_key: Option<String>,
    /// Signed-in user's JWT, required by row-level security on writes
    pub supabase_access_token: Option<String>,

    // --- Challenge tuning ---
    /// Radius within which a spawn point counts as reached
    pub spawn_point_radius_m: f64,
    /// Points awarded per spawn point
    pub spawn_point_reward: u32,
    /// Check applied before a challenge may start
    pub containment: ContainmentPolicy,

    // --- Position feed ---
    pub feed: FeedOptions,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            supabase_url: None,
            supabase_anon_key: None,
            supabase_access_token: None,
            spawn_point_radius_m: 10.0,
            spawn_point_reward: 10,
            containment: ContainmentPolicy::Disabled,
            feed: FeedOptions::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let containment = match env::var("CONTAINMENT_CHECK")
            .unwrap_or_else(|_| "off".to_string())
            .trim()
        {
            "off" | "" => ContainmentPolicy::Disabled,
            "center" => ContainmentPolicy::NearCenter {
                threshold_m: parse_var("CONTAINMENT_THRESHOLD_M", DEFAULT_CONTAINMENT_THRESHOLD_M)?,
            },
            "boundary" => ContainmentPolicy::InsideBoundary,
            _ => return Err(ConfigError::Invalid("CONTAINMENT_CHECK")),
        };

        let supabase_url = env::var("SUPABASE_URL")
            .ok()
            .map(|v| v.trim().trim_end_matches('/').to_string());
        let supabase_anon_key = env::var("SUPABASE_ANON_KEY")
            .ok()
            .map(|v| v.trim().to_string());
        let supabase_access_token = env::var("SUPABASE_ACCESS_TOKEN")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        // A URL without a key would fail every request
        if supabase_url.is_some() && supabase_anon_key.is_none() {
            return Err(ConfigError::Missing("SUPABASE_ANON_KEY"));
        }

        Ok(Self {
            supabase_url,
            supabase_anon_key,
            supabase_access_token,
            spawn_point_radius_m: parse_var("SPAWN_POINT_RADIUS_M", 10.0)?,
            spawn_point_reward: parse_var("SPAWN_POINT_REWARD", 10)?,
            containment,
            feed: FeedOptions {
                high_accuracy: parse_var("GPS_HIGH_ACCURACY", true)?,
                timeout_ms: parse_var("GPS_TIMEOUT_MS", 20_000)?,
                max_age_ms: parse_var("GPS_MAX_AGE_MS", 500)?,
                min_distance_m: parse_var("GPS_MIN_DISTANCE_M", 1.0)?,
            },
        })
    }

    /// Session tuning derived from this configuration.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            proximity_radius_m: self.spawn_point_radius_m,
            spawn_point_reward: self.spawn_point_reward,
            containment: self.containment,
            feed: self.feed,
        }
    }

    /// Whether hosted storage credentials are present.
    pub fn has_storage(&self) -> bool {
        self.supabase_url.is_some() && self.supabase_anon_key.is_some()
    }
}

/// Parse an optional environment variable, falling back to a default.
fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value.trim().parse().map_err(|_| ConfigError::Invalid(name)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
