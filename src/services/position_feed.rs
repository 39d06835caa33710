// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Position feed contract and adapters.
//!
//! A feed hands each subscriber an unbounded channel of fixes. Fixes are
//! delivered in sensor order; the session processes each one before taking
//! the next.

use crate::error::{AppError, Result};
use crate::models::Coordinate;
use crate::services::distance::distance;
use futures_util::{Stream, StreamExt};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// One delivery from the feed: a fix or a sensor error.
pub type PositionUpdate = Result<Coordinate>;

/// Options passed to the location source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeedOptions {
    pub high_accuracy: bool,
    /// Time allowed for the first fix after subscribing (0 disables)
    pub timeout_ms: u64,
    pub max_age_ms: u64,
    /// Fixes closer than this to the previous one are suppressed
    pub min_distance_m: f64,
}

impl Default for FeedOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout_ms: 20_000,
            max_age_ms: 500,
            min_distance_m: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(u64);

/// An active subscription. Dropping `updates` without unsubscribing leaves
/// the source running, so always hand the handle back.
#[derive(Debug)]
pub struct Subscription {
    pub handle: SubscriptionHandle,
    pub updates: mpsc::UnboundedReceiver<PositionUpdate>,
}

/// A continuous location source.
pub trait PositionFeed {
    fn subscribe(&mut self, options: FeedOptions) -> Result<Subscription>;
    fn unsubscribe(&mut self, handle: SubscriptionHandle);
}

// ─── Channel Feed ────────────────────────────────────────────────

/// Feed driven by pushing fixes from outside, e.g. a platform bridge or a test.
///
/// Clones share the same subscribers.
#[derive(Debug, Clone, Default)]
pub struct ChannelFeed {
    inner: Arc<Mutex<ChannelFeedInner>>,
}

#[derive(Debug, Default)]
struct ChannelFeedInner {
    next_handle: u64,
    subscribers: HashMap<SubscriptionHandle, mpsc::UnboundedSender<PositionUpdate>>,
    last_options: Option<FeedOptions>,
}

impl ChannelFeed {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ChannelFeedInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Deliver a fix to every subscriber. Returns how many received it.
    pub fn push(&self, position: Coordinate) -> usize {
        self.broadcast(|| Ok(position))
    }

    /// Deliver a sensor error to every subscriber.
    pub fn push_error(&self, message: &str) -> usize {
        self.broadcast(|| Err(AppError::PositionUnavailable(message.to_string())))
    }

    fn broadcast(&self, update: impl Fn() -> PositionUpdate) -> usize {
        let mut inner = self.lock();
        inner.subscribers.retain(|_, tx| tx.send(update()).is_ok());
        inner.subscribers.len()
    }

    /// Drop every subscriber's sender, ending their streams.
    pub fn close(&self) {
        self.lock().subscribers.clear();
    }

    pub fn active_subscriptions(&self) -> usize {
        self.lock().subscribers.len()
    }

    pub fn last_options(&self) -> Option<FeedOptions> {
        self.lock().last_options
    }
}

impl PositionFeed for ChannelFeed {
    fn subscribe(&mut self, options: FeedOptions) -> Result<Subscription> {
        let (tx, updates) = mpsc::unbounded_channel();
        let mut inner = self.lock();
        let handle = SubscriptionHandle(inner.next_handle);
        inner.next_handle += 1;
        inner.subscribers.insert(handle, tx);
        inner.last_options = Some(options);
        tracing::debug!(handle = handle.0, "Channel feed subscribed");
        Ok(Subscription { handle, updates })
    }

    fn unsubscribe(&mut self, handle: SubscriptionHandle) {
        if self.lock().subscribers.remove(&handle).is_some() {
            tracing::debug!(handle = handle.0, "Channel feed unsubscribed");
        }
    }
}

// ─── Stream Feed ─────────────────────────────────────────────────

/// Feed backed by a stream of fixes, forwarded by a spawned task.
///
/// `make_stream` is called on every subscribe so a session can be restarted.
/// Requires a running tokio runtime.
pub struct StreamFeed<M> {
    make_stream: M,
    next_handle: u64,
    tasks: HashMap<SubscriptionHandle, JoinHandle<()>>,
}

impl<M, S> StreamFeed<M>
where
    M: FnMut() -> S,
    S: Stream<Item = PositionUpdate> + Send + 'static,
{
    pub fn new(make_stream: M) -> Self {
        Self {
            make_stream,
            next_handle: 0,
            tasks: HashMap::new(),
        }
    }
}

impl<M, S> PositionFeed for StreamFeed<M>
where
    M: FnMut() -> S,
    S: Stream<Item = PositionUpdate> + Send + 'static,
{
    fn subscribe(&mut self, options: FeedOptions) -> Result<Subscription> {
        let (tx, updates) = mpsc::unbounded_channel();
        let stream = (self.make_stream)();
        let handle = SubscriptionHandle(self.next_handle);
        self.next_handle += 1;

        let task = tokio::spawn(forward(stream, options, tx));
        self.tasks.insert(handle, task);
        Ok(Subscription { handle, updates })
    }

    fn unsubscribe(&mut self, handle: SubscriptionHandle) {
        if let Some(task) = self.tasks.remove(&handle) {
            task.abort();
            tracing::debug!(handle = handle.0, "Stream feed unsubscribed");
        }
    }
}

impl<M> Drop for StreamFeed<M> {
    fn drop(&mut self) {
        for (_, task) in self.tasks.drain() {
            task.abort();
        }
    }
}

/// Forward fixes until the stream ends or the subscriber goes away,
/// applying the minimum-distance filter.
async fn forward<S>(stream: S, options: FeedOptions, tx: mpsc::UnboundedSender<PositionUpdate>)
where
    S: Stream<Item = PositionUpdate> + Send + 'static,
{
    let mut stream = Box::pin(stream);
    let mut last: Option<Coordinate> = None;

    while let Some(update) = stream.next().await {
        if let Ok(position) = &update {
            if let Some(previous) = last {
                if distance(previous, *position) < options.min_distance_m {
                    continue;
                }
            }
            last = Some(*position);
        }
        if tx.send(update).is_err() {
            break;
        }
    }
}
