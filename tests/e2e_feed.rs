//! Feed construction against an HTTP registry

mod helper;

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use chrono::{TimeZone, Utc};
use rss::Channel;
use tower::ServiceExt;

use helper::{FakeRegistry, StaticRegistry, endpoint, single_watch_config};
use tagwatch::config::{FeedConfig, RegistryEndpoint, WatchSpec};
use tagwatch::feed::FeedBuilder;
use tagwatch::feed::guid::digest_guid;
use tagwatch::registry::Registry;
use tagwatch::server::{FeedServer, FeedState, http};

fn parse(bytes: &[u8]) -> Channel {
    Channel::read_from(bytes).unwrap()
}

fn guids(channel: &Channel) -> Vec<String> {
    channel
        .items()
        .iter()
        .filter_map(|i| i.guid().map(|g| g.value().to_string()))
        .collect()
}

#[tokio::test]
async fn publishes_one_item_for_the_matching_tag() {
    let mut registry = FakeRegistry::start().await;
    let tags = registry
        .with_tags("library/ubuntu", &["20.04", "22.04", "latest"])
        .await;
    let (head, get) = registry
        .with_manifest(
            "library/ubuntu",
            "20.04",
            "sha256:list",
            &[("sha256:aaa", "amd64"), ("sha256:bbb", "arm64")],
            1,
            1,
        )
        .await;
    let forbidden_jammy = registry.forbid_manifest("library/ubuntu", "22.04").await;
    let forbidden_latest = registry.forbid_manifest("library/ubuntu", "latest").await;

    let base_url = registry.base_url();
    let config = single_watch_config(&base_url, "library/ubuntu", "amd64", r"20\.04", false);
    let builder = FeedBuilder::from_config(&config).unwrap();

    let feed = builder
        .make_feed_at(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap())
        .await;

    tags.assert_async().await;
    head.assert_async().await;
    get.assert_async().await;
    for mock in forbidden_jammy.iter().chain(&forbidden_latest) {
        mock.assert_async().await;
    }

    let channel = parse(&feed);
    assert_eq!(channel.items().len(), 1);
    assert_eq!(
        channel.items()[0].title(),
        Some("library/ubuntu:20.04 (amd64)")
    );
    assert_eq!(
        guids(&channel),
        vec![digest_guid(
            &base_url,
            "library/ubuntu",
            "20.04",
            "amd64",
            "sha256:aaa"
        )]
    );
    assert_eq!(
        channel.items()[0].link(),
        Some(format!("{}library/ubuntu/manifests/20.04", base_url).as_str())
    );
}

#[tokio::test]
async fn unchanged_registry_yields_identical_feed_without_redownloading() {
    let mut registry = FakeRegistry::start().await;
    let _tags = registry.with_tags("org/app", &["1.0", "1.1"]).await;
    let (head_old, get_old) = registry
        .with_manifest("org/app", "1.0", "sha256:l0", &[("sha256:a0", "amd64")], 2, 1)
        .await;
    let (head_new, get_new) = registry
        .with_manifest("org/app", "1.1", "sha256:l1", &[("sha256:a1", "amd64")], 2, 1)
        .await;

    let config = single_watch_config(&registry.base_url(), "org/app", "amd64", r"^1\.", true);
    let builder = FeedBuilder::from_config(&config).unwrap();
    let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

    let first = builder.make_feed_at(now).await;
    let second = builder.make_feed_at(now).await;

    assert_eq!(first, second);
    let channel = parse(&first);
    let titles: Vec<&str> = channel.items().iter().filter_map(|i| i.title()).collect();
    assert_eq!(
        titles,
        vec![
            "Available tags of org/app have changed",
            "org/app:1.1 (amd64)",
            "org/app:1.0 (amd64)"
        ]
    );

    head_old.assert_async().await;
    get_old.assert_async().await;
    head_new.assert_async().await;
    get_new.assert_async().await;
}

#[tokio::test]
async fn changed_digest_produces_new_guid() {
    let mut registry = FakeRegistry::start().await;
    let _tags = registry.with_tags("org/app", &["stable"]).await;
    let (head, get) = registry
        .with_manifest("org/app", "stable", "sha256:l0", &[("sha256:a0", "amd64")], 1, 1)
        .await;

    let config = single_watch_config(&registry.base_url(), "org/app", "amd64", "stable", false);
    let builder = FeedBuilder::from_config(&config).unwrap();
    let before = guids(&parse(&builder.make_feed().await));

    head.remove_async().await;
    get.remove_async().await;
    registry
        .with_manifest("org/app", "stable", "sha256:l1", &[("sha256:a1", "amd64")], 1, 1)
        .await;
    let after = guids(&parse(&builder.make_feed().await));

    assert_eq!(before.len(), 1);
    assert_eq!(after.len(), 1);
    assert_ne!(before, after);
}

#[tokio::test]
async fn unreachable_registry_still_yields_valid_feed() {
    let config = single_watch_config("http://127.0.0.1:1/v2/", "org/app", "amd64", ".", true);
    let builder = FeedBuilder::from_config(&config).unwrap();

    let channel = parse(&builder.make_feed().await);

    assert!(channel.items().is_empty());
    assert_eq!(channel.title(), "Docker registry tags");
}

#[tokio::test]
async fn server_publishes_built_feed_over_http() {
    let base_url = "https://registry.example/v2/";
    let watch = WatchSpec {
        repo: "library/ubuntu".to_string(),
        arch: "amd64".to_string(),
        tags: vec![r"20\.04".to_string()],
        watch_new: false,
        registry: endpoint(base_url),
    };
    let registry = StaticRegistry::new()
        .with_tags("library/ubuntu", &["20.04", "22.04", "latest"])
        .with_digest("library/ubuntu", "20.04", "sha256:aaa")
        .with_digest("library/ubuntu", "22.04", "sha256:ccc");
    let registries: HashMap<RegistryEndpoint, Arc<dyn Registry>> =
        HashMap::from([(endpoint(base_url), Arc::new(registry) as Arc<dyn Registry>)]);
    let server = Arc::new(FeedServer::new(FeedBuilder::build(
        vec![watch],
        FeedConfig::default(),
        registries,
    )));
    let app = http::router(server.clone());

    let before = app
        .clone()
        .oneshot(Request::get("/feed.xml").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let before = to_bytes(before.into_body(), usize::MAX).await.unwrap();
    assert!(parse(&before).items().is_empty());

    server.refresh().await;
    assert_eq!(server.state(), FeedState::Published);

    let response = app
        .oneshot(Request::get("/feed.xml").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();

    assert_eq!(
        guids(&parse(&body)),
        vec![digest_guid(
            base_url,
            "library/ubuntu",
            "20.04",
            "amd64",
            "sha256:aaa"
        )]
    );
}
