use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use tracing::{debug, error, info, warn};

use crate::config::{Config, FeedConfig, RegistryEndpoint, WatchSpec};
use crate::error::RegistryError;
use crate::feed::description::{channel_description, digest_description, tags_description};
use crate::feed::guid::{digest_guid, tags_guid};
use crate::feed::links::{digest_link, tags_link};
use crate::feed::render::{FeedDocument, FeedItem, render_or_placeholder};
use crate::registry::{Registry, RegistryClient, TagDigest};
use crate::server::FeedSource;
use crate::version::sort_descending;

/// Turns the configured watches into a rendered RSS document
pub struct FeedBuilder {
    watches: Vec<WatchSpec>,
    feed: FeedConfig,
    registries: HashMap<RegistryEndpoint, Arc<dyn Registry>>,
}

impl FeedBuilder {
    /// Creates one registry client per distinct endpoint in `config`
    pub fn from_config(config: &Config) -> Result<Self, RegistryError> {
        let mut registries: HashMap<RegistryEndpoint, Arc<dyn Registry>> = HashMap::new();
        for watch in &config.watches {
            if registries.contains_key(&watch.registry) {
                continue;
            }
            let client = RegistryClient::new(watch.registry.clone(), &config.fetch)?;
            registries.insert(watch.registry.clone(), Arc::new(client));
        }
        info!(
            "Watching {} repositories across {} registries",
            config.watches.len(),
            registries.len()
        );
        Ok(Self::build(
            config.watches.clone(),
            config.feed.clone(),
            registries,
        ))
    }

    pub fn build(
        watches: Vec<WatchSpec>,
        feed: FeedConfig,
        registries: HashMap<RegistryEndpoint, Arc<dyn Registry>>,
    ) -> Self {
        Self {
            watches,
            feed,
            registries,
        }
    }

    /// Builds the feed as of `now`
    ///
    /// Watches are queried concurrently; items keep configuration order.
    /// Never fails: unreachable repositories contribute no items and a
    /// rendering failure yields the placeholder feed.
    pub async fn make_feed_at(&self, now: DateTime<Utc>) -> Vec<u8> {
        let groups = join_all(self.watches.iter().map(|watch| self.items_for(watch))).await;
        let document = FeedDocument {
            title: self.feed.title.clone(),
            link: self.feed.link.clone(),
            description: channel_description(&self.watches),
            items: groups.into_iter().flatten().collect(),
            built_at: now,
        };
        debug!("Rendering feed with {} items", document.items.len());
        render_or_placeholder(&document)
    }

    pub async fn make_feed(&self) -> Vec<u8> {
        self.make_feed_at(Utc::now()).await
    }

    async fn items_for(&self, watch: &WatchSpec) -> Vec<FeedItem> {
        let Some(registry) = self.registries.get(&watch.registry) else {
            warn!("No registry client for {}", watch.registry.base_url);
            return Vec::new();
        };

        let mut tags = match registry.list_tags(&watch.repo).await {
            Ok(tags) => tags,
            Err(e) => {
                error!("Failed to list tags for {}: {}", watch.repo, e);
                return Vec::new();
            }
        };
        sort_descending(&mut tags);

        let mut items = Vec::new();
        if watch.watch_new {
            items.push(tags_item(watch, &tags));
        }

        let batch = registry
            .fetch_manifests(&watch.repo, &watch.arch, &tags, &watch.tags)
            .await;
        for failure in &batch.failures {
            warn!(
                "Skipping {}:{} ({}): {}",
                watch.repo, failure.tag, watch.arch, failure.error
            );
        }
        items.extend(batch.digests.iter().map(|td| digest_item(watch, td)));
        items
    }
}

#[async_trait::async_trait]
impl FeedSource for FeedBuilder {
    async fn render_feed(&self) -> Vec<u8> {
        self.make_feed().await
    }
}

fn tags_item(watch: &WatchSpec, tags: &[String]) -> FeedItem {
    FeedItem {
        title: format!("Available tags of {} have changed", watch.repo),
        link: tags_link(&watch.registry, &watch.repo),
        description: tags_description(&watch.repo, tags),
        guid: tags_guid(&watch.repo, tags),
    }
}

fn digest_item(watch: &WatchSpec, tag_digest: &TagDigest) -> FeedItem {
    let title = format!("{}:{} ({})", watch.repo, tag_digest.tag, watch.arch);
    FeedItem {
        link: digest_link(&watch.registry, &watch.repo, tag_digest),
        description: digest_description(&title, &tag_digest.digest),
        guid: digest_guid(
            &watch.registry.base_url,
            &watch.repo,
            &tag_digest.tag,
            &watch.arch,
            &tag_digest.digest,
        ),
        title,
    }
}
