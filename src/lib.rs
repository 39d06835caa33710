// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Park Quest: geofenced park challenges with spawn point rewards
//!
//! This crate provides the live challenge-tracking engine: GPS ingestion,
//! walked distance, spawn point rewards, pause/resume and settlement of the
//! completed challenge to the hosted backend.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod time_utils;
