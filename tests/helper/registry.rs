//! Registry test utilities

use std::collections::HashMap;

use async_trait::async_trait;
use mockito::{Mock, Server, ServerGuard};
use serde_json::json;

use tagwatch::config::{Config, RegistryEndpoint};
use tagwatch::error::RegistryError;
use tagwatch::registry::{ManifestBatch, Registry, TagDigest};

pub const LIST_TYPE: &str = "application/vnd.docker.distribution.manifest.list.v2+json";

/// Registry v2 API served by a local mockito server under `/v2/`
pub struct FakeRegistry {
    pub server: ServerGuard,
}

impl FakeRegistry {
    pub async fn start() -> Self {
        Self {
            server: Server::new_async().await,
        }
    }

    pub fn base_url(&self) -> String {
        format!("{}/v2/", self.server.url())
    }

    pub async fn with_tags(&mut self, repo: &str, tags: &[&str]) -> Mock {
        self.server
            .mock("GET", format!("/v2/{}/tags/list", repo).as_str())
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({"name": repo, "tags": tags}).to_string())
            .create_async()
            .await
    }

    /// Serves a manifest list for `repo:tag` advertised under `list_digest`
    ///
    /// Returns the HEAD and GET mocks, expecting `probes` HEAD requests and
    /// `downloads` GET requests.
    pub async fn with_manifest(
        &mut self,
        repo: &str,
        tag: &str,
        list_digest: &str,
        entries: &[(&str, &str)],
        probes: usize,
        downloads: usize,
    ) -> (Mock, Mock) {
        let path = format!("/v2/{}/manifests/{}", repo, tag);
        let head = self
            .server
            .mock("HEAD", path.as_str())
            .with_status(200)
            .with_header("docker-content-digest", list_digest)
            .expect(probes)
            .create_async()
            .await;
        let get = self
            .server
            .mock("GET", path.as_str())
            .with_status(200)
            .with_header("content-type", LIST_TYPE)
            .with_header("docker-content-digest", list_digest)
            .with_body(manifest_list(entries))
            .expect(downloads)
            .create_async()
            .await;
        (head, get)
    }

    /// Fails the test if `repo:tag` is ever requested
    pub async fn forbid_manifest(&mut self, repo: &str, tag: &str) -> Vec<Mock> {
        let path = format!("/v2/{}/manifests/{}", repo, tag);
        let mut mocks = Vec::new();
        for method in ["HEAD", "GET"] {
            mocks.push(
                self.server
                    .mock(method, path.as_str())
                    .with_status(500)
                    .expect(0)
                    .create_async()
                    .await,
            );
        }
        mocks
    }
}

/// Manifest list JSON with one entry per `(digest, architecture)`
pub fn manifest_list(entries: &[(&str, &str)]) -> String {
    let manifests: Vec<_> = entries
        .iter()
        .map(|(digest, arch)| {
            json!({
                "digest": digest,
                "platform": {"architecture": arch, "os": "linux"},
                "size": 529
            })
        })
        .collect();
    json!({"schemaVersion": 2, "mediaType": LIST_TYPE, "manifests": manifests}).to_string()
}

/// Configuration with a single watch against `base_url`
pub fn single_watch_config(
    base_url: &str,
    repo: &str,
    arch: &str,
    pattern: &str,
    watch_new: bool,
) -> Config {
    let yaml = format!(
        r#"
tagwatch:
  - repo: {repo}
    arch: {arch}
    watch_new: {watch_new}
    tags: ['{pattern}']
    registry:
      base_url: {base_url}
fetch:
  timeout_secs: 5
"#
    );
    Config::from_yaml(&yaml).unwrap()
}

pub fn endpoint(base_url: &str) -> RegistryEndpoint {
    RegistryEndpoint {
        base_url: base_url.to_string(),
        auth: false,
        username: None,
        password: None,
        auth_url: None,
    }
}

/// In-memory registry returning fixed tags and digests
#[derive(Default)]
pub struct StaticRegistry {
    tags: HashMap<String, Vec<String>>,
    digests: HashMap<(String, String), String>,
}

impl StaticRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tags(mut self, repo: &str, tags: &[&str]) -> Self {
        self.tags
            .insert(repo.to_string(), tags.iter().map(|t| t.to_string()).collect());
        self
    }

    pub fn with_digest(mut self, repo: &str, tag: &str, digest: &str) -> Self {
        self.digests
            .insert((repo.to_string(), tag.to_string()), digest.to_string());
        self
    }
}

#[async_trait]
impl Registry for StaticRegistry {
    async fn list_tags(&self, repo: &str) -> Result<Vec<String>, RegistryError> {
        self.tags
            .get(repo)
            .cloned()
            .ok_or_else(|| RegistryError::Protocol(format!("unknown repository {}", repo)))
    }

    async fn fetch_manifests(
        &self,
        repo: &str,
        _architecture: &str,
        tags: &[String],
        patterns: &[String],
    ) -> ManifestBatch {
        let patterns = tagwatch::registry::pattern::TagPatterns::compile(patterns);
        let digests = patterns
            .select(tags)
            .into_iter()
            .filter_map(|tag| {
                self.digests
                    .get(&(repo.to_string(), tag.clone()))
                    .map(|digest| TagDigest::new(tag.clone(), digest.clone()))
            })
            .collect();
        ManifestBatch {
            digests,
            failures: Vec::new(),
        }
    }
}
