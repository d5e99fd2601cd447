//! Watches container registries and publishes tag and digest changes as an
//! RSS feed.

pub mod config;
pub mod error;
pub mod feed;
pub mod logging;
pub mod registry;
pub mod server;
pub mod version;
