use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::body::Bytes;
use chrono::{DateTime, Utc};
#[cfg(test)]
use mockall::automock;
use tracing::info;

use crate::feed::EMPTY_FEED;

/// Produces a complete, well-formed feed document
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait FeedSource: Send + Sync + 'static {
    async fn render_feed(&self) -> Vec<u8>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedState {
    /// No refresh has completed; the placeholder feed is served
    Empty,
    Published,
}

/// Immutable feed body as handed to HTTP clients
#[derive(Debug, Clone)]
pub struct FeedSnapshot {
    body: Bytes,
    generated_at: Option<DateTime<Utc>>,
}

impl FeedSnapshot {
    pub fn placeholder() -> Self {
        Self {
            body: Bytes::from_static(EMPTY_FEED.as_bytes()),
            generated_at: None,
        }
    }

    pub fn published(body: Vec<u8>, generated_at: DateTime<Utc>) -> Self {
        Self {
            body: Bytes::from(body),
            generated_at: Some(generated_at),
        }
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn generated_at(&self) -> Option<DateTime<Utc>> {
        self.generated_at
    }

    pub fn state(&self) -> FeedState {
        match self.generated_at {
            Some(_) => FeedState::Published,
            None => FeedState::Empty,
        }
    }
}

/// Owns the currently published feed
///
/// Readers clone an `Arc` under a short lock; a refresh builds the next
/// snapshot without holding it and swaps it in once complete.
pub struct FeedServer<S> {
    source: S,
    current: Mutex<Arc<FeedSnapshot>>,
}

impl<S: FeedSource> FeedServer<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            current: Mutex::new(Arc::new(FeedSnapshot::placeholder())),
        }
    }

    fn lock_current(&self) -> MutexGuard<'_, Arc<FeedSnapshot>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn current(&self) -> Arc<FeedSnapshot> {
        self.lock_current().clone()
    }

    pub fn state(&self) -> FeedState {
        self.current().state()
    }

    /// Rebuilds the feed and publishes it
    pub async fn refresh(&self) {
        let body = self.source.render_feed().await;
        let snapshot = Arc::new(FeedSnapshot::published(body, Utc::now()));
        info!("Published feed ({} bytes)", snapshot.body().len());
        *self.lock_current() = snapshot;
    }
}
