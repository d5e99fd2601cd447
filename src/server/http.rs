use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::{Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::server::state::{FeedServer, FeedSource};

pub const FEED_PATH: &str = "/feed.xml";
pub const FEED_CONTENT_TYPE: &str = "application/xml";

pub fn router<S: FeedSource>(server: Arc<FeedServer<S>>) -> Router {
    Router::new()
        .route(FEED_PATH, any(serve_feed::<S>))
        .with_state(server)
}

async fn serve_feed<S: FeedSource>(
    State(server): State<Arc<FeedServer<S>>>,
    method: Method,
) -> Response {
    if method != Method::GET && method != Method::HEAD {
        warn!("Rejecting {} {}", method, FEED_PATH);
        return StatusCode::BAD_REQUEST.into_response();
    }

    let snapshot = server.current();
    (
        [(header::CONTENT_TYPE, FEED_CONTENT_TYPE)],
        snapshot.body().clone(),
    )
        .into_response()
}

/// Serves the feed on `listener` until the server fails
pub async fn serve<S: FeedSource>(
    listener: TcpListener,
    server: Arc<FeedServer<S>>,
) -> std::io::Result<()> {
    info!(
        "Serving feed on http://{}{}",
        listener.local_addr()?,
        FEED_PATH
    );
    axum::serve(listener, router(server)).await
}
