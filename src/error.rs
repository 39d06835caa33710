// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types shared by the tracking engine and its collaborators.

/// Application error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Malformed geometry: {0}")]
    MalformedGeometry(String),

    #[error("Unable to get park data: {0}")]
    GeometryUnavailable(String),

    #[error("Challenge geometry has not been loaded")]
    GeometryNotLoaded,

    #[error("Position unavailable: {0}")]
    PositionUnavailable(String),

    #[error("Persistence failure: {0}")]
    PersistenceFailure(String),

    #[error("Cannot {action} a session that is {from}")]
    InvalidTransition {
        from: &'static str,
        action: &'static str,
    },

    #[error("You are not inside the park ({distance_m:.0} m away)")]
    OutsidePark { distance_m: f64 },

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Log a background failure at the appropriate level.
    ///
    /// Position and persistence failures are never shown as alerts.
    pub fn log(&self) {
        match self {
            AppError::PositionUnavailable(msg) => {
                tracing::warn!(error = %msg, "Position unavailable")
            }
            AppError::PersistenceFailure(msg) => {
                tracing::error!(error = %msg, "Persistence failure")
            }
            AppError::Internal(err) => tracing::error!(error = %err, "Internal error"),
            other => tracing::info!(error = %other, "Challenge error"),
        }
    }
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, AppError>;
