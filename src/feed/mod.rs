//! RSS feed construction
//!
//! [`FeedBuilder`] queries every configured watch, turns tag listings and
//! resolved digests into [`FeedItem`]s and renders them with the `rss` crate.
//! Item guids are content hashes, so an unchanged registry produces an
//! unchanged feed.

pub mod builder;
pub mod description;
pub mod guid;
pub mod links;
pub mod render;

pub use builder::FeedBuilder;
pub use render::{EMPTY_FEED, FeedDocument, FeedItem};
