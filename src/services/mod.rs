// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - challenge tracking engine and its adapters.

pub mod distance;
pub mod driver;
pub mod park;
pub mod position_feed;
pub mod route;
pub mod session;
pub mod settlement;
pub mod spawn_points;

pub use distance::distance;
pub use driver::{run_session, SessionCommand};
pub use park::ParkLoader;
pub use position_feed::{ChannelFeed, FeedOptions, PositionFeed, StreamFeed};
pub use route::RouteAccumulator;
pub use session::{
    ChallengeSession, ContainmentPolicy, SessionConfig, SessionEvent, SessionSnapshot,
    SessionStatus,
};
pub use settlement::{settle, SettlementReport};
pub use spawn_points::{SpawnPointRegistry, PROXIMITY_RADIUS_M};
