//! Feed publication over HTTP
//!
//! - [`state`]: [`FeedServer`] holding the published snapshot
//! - [`scheduler`]: periodic refresh driven by a tokio interval
//! - [`http`]: axum router exposing `/feed.xml`

pub mod http;
pub mod scheduler;
pub mod state;

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use crate::config::ServerConfig;

pub use scheduler::{RefreshSchedule, run_scheduler, spawn_scheduler};
pub use state::{FeedServer, FeedSnapshot, FeedSource, FeedState};

/// Binds the listen address, starts the scheduler and serves until failure
///
/// Binding happens first so an unusable address fails before any registry
/// traffic.
pub async fn run<S: FeedSource>(
    server: Arc<FeedServer<S>>,
    config: &ServerConfig,
) -> std::io::Result<()> {
    let listener = TcpListener::bind(config.listen_addr()).await?;
    info!(
        "Refreshing every {:?}, checking every {:?}",
        config.refresh_interval(),
        config.poll_interval()
    );
    let scheduler = spawn_scheduler(
        server.clone(),
        config.poll_interval(),
        config.refresh_interval(),
    );
    let result = http::serve(listener, server).await;
    scheduler.abort();
    result
}
