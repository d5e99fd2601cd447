use std::io::Write;

use chrono::{DateTime, Utc};
use rss::{Channel, Guid, Item};
use tracing::error;

use crate::config::AGENT;
use crate::error::RenderError;

/// Served before the first refresh and whenever rendering fails
pub const EMPTY_FEED: &str = concat!(
    r#"<?xml version="1.0" encoding="utf-8"?>"#,
    r#"<rss version="2.0"><channel>"#,
    "<title>Docker registry tags</title>",
    "<link>https://hub.docker.com/</link>",
    "<description>No tags available</description>",
    "<generator>tagwatch/",
    env!("CARGO_PKG_VERSION"),
    "</generator>",
    "</channel></rss>"
);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    /// HTML, already escaped
    pub description: String,
    pub guid: String,
}

#[derive(Debug, Clone)]
pub struct FeedDocument {
    pub title: String,
    pub link: String,
    pub description: String,
    pub items: Vec<FeedItem>,
    pub built_at: DateTime<Utc>,
}

fn to_rss_item(item: &FeedItem) -> Item {
    let mut guid = Guid::default();
    guid.set_value(item.guid.clone());
    guid.set_permalink(false);

    let mut rss_item = Item::default();
    rss_item.set_title(Some(item.title.clone()));
    rss_item.set_link(Some(item.link.clone()));
    rss_item.set_description(Some(item.description.clone()));
    rss_item.set_guid(Some(guid));
    rss_item
}

/// Serializes `document` as an RSS 2.0 document into `writer`
pub fn render_into<W: Write>(document: &FeedDocument, writer: W) -> Result<W, RenderError> {
    let mut channel = Channel::default();
    channel.set_title(document.title.clone());
    channel.set_link(document.link.clone());
    channel.set_description(document.description.clone());
    channel.set_generator(Some(AGENT.to_string()));
    channel.set_last_build_date(Some(document.built_at.to_rfc2822()));
    channel.set_items(document.items.iter().map(to_rss_item).collect::<Vec<_>>());

    Ok(channel.write_to(writer)?)
}

pub fn render(document: &FeedDocument) -> Result<Vec<u8>, RenderError> {
    render_into(document, Vec::new())
}

/// Like [`render`], falling back to [`EMPTY_FEED`] on failure
///
/// An in-memory buffer does not fail on write, so in practice this only
/// triggers on serializer errors.
pub fn render_or_placeholder(document: &FeedDocument) -> Vec<u8> {
    or_placeholder(render(document))
}

fn or_placeholder(rendered: Result<Vec<u8>, RenderError>) -> Vec<u8> {
    match rendered {
        Ok(bytes) => bytes,
        Err(e) => {
            error!("Failed to render feed, serving placeholder: {}", e);
            EMPTY_FEED.as_bytes().to_vec()
        }
    }
}
