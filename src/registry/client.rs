//! Docker Registry v2 API client

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::join_all;
use reqwest::header::{ACCEPT, LINK};
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

use crate::config::{AGENT, FetchConfig, RegistryEndpoint};
use crate::error::RegistryError;
use crate::registry::cache::ManifestCache;
use crate::registry::pattern::TagPatterns;
use crate::registry::traits::Registry;
use crate::registry::types::{
    AuthResponse, AuthToken, ManifestBatch, ManifestList, TagDigest, TagFailure, TagsResponse,
};

/// Media types accepted for manifest requests
pub const MANIFEST_ACCEPT: &str = "application/vnd.docker.distribution.manifest.list.v2+json, \
     application/vnd.oci.image.index.v1+json";

/// Header carrying the registry's digest of a manifest
const CONTENT_DIGEST_HEADER: &str = "docker-content-digest";

/// Guard against registries whose pagination links loop
const MAX_TAG_PAGES: usize = 100;

/// Client for one registry endpoint
///
/// Cloning is cheap and clones share the manifest cache and token store, which
/// is how per-tag fetch tasks reach them.
#[derive(Clone)]
pub struct RegistryClient {
    http: reqwest::Client,
    endpoint: Arc<RegistryEndpoint>,
    cache: Arc<ManifestCache>,
    tokens: Arc<Mutex<HashMap<String, AuthToken>>>,
    max_concurrent_fetches: usize,
}

impl RegistryClient {
    pub fn new(endpoint: RegistryEndpoint, fetch: &FetchConfig) -> Result<Self, RegistryError> {
        let http = reqwest::Client::builder()
            .user_agent(AGENT)
            .timeout(fetch.timeout())
            .build()?;

        Ok(Self {
            http,
            endpoint: Arc::new(endpoint),
            cache: Arc::new(ManifestCache::new()),
            tokens: Arc::new(Mutex::new(HashMap::new())),
            max_concurrent_fetches: fetch
                .max_concurrent_fetches
                .clamp(1, Semaphore::MAX_PERMITS),
        })
    }

    pub fn cache(&self) -> &ManifestCache {
        &self.cache
    }

    fn lock_tokens(&self) -> MutexGuard<'_, HashMap<String, AuthToken>> {
        self.tokens.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn token_for(&self, repo: &str) -> Option<AuthToken> {
        self.lock_tokens().get(repo).cloned()
    }

    /// Exchanges credentials for a pull token scoped to `repo`
    ///
    /// No-op for endpoints without token auth. The held token stays usable by
    /// concurrent requests until the exchange finishes; it is replaced on
    /// success and dropped on failure.
    async fn login(&self, repo: &str) -> Result<(), RegistryError> {
        let Some(auth_url) = self.endpoint.token_url() else {
            return Ok(());
        };

        match self.request_token(auth_url, repo).await {
            Ok(token) => {
                debug!("Obtained pull token for {}", repo);
                self.lock_tokens().insert(repo.to_string(), token);
                Ok(())
            }
            Err(e) => {
                self.lock_tokens().remove(repo);
                Err(e)
            }
        }
    }

    async fn request_token(&self, auth_url: &str, repo: &str) -> Result<AuthToken, RegistryError> {
        let url = format!("{}&scope=repository:{}:pull", auth_url, repo);
        let mut request = self.http.get(&url);
        if let Some((username, password)) = self.endpoint.credentials() {
            request = request.basic_auth(username, Some(password));
        }

        let response: AuthResponse = self
            .send_json(request, &url)
            .await
            .map_err(|e| RegistryError::Auth {
                repo: repo.to_string(),
                reason: e.to_string(),
            })?;
        response.into_token(repo)
    }

    /// Builds a request carrying the agent's Accept header and credentials
    fn request(&self, method: Method, url: &str, repo: &str) -> RequestBuilder {
        let mut request = self
            .http
            .request(method, url)
            .header(ACCEPT, MANIFEST_ACCEPT);

        if let Some(token) = self.token_for(repo) {
            request = request.bearer_auth(token.as_str());
        } else if self.endpoint.token_url().is_none() {
            if let Some((username, password)) = self.endpoint.credentials() {
                request = request.basic_auth(username, Some(password));
            }
        }

        request
    }

    async fn send(&self, request: RequestBuilder, url: &str) -> Result<Response, RegistryError> {
        let response = request.send().await?;
        let status = response.status();

        if status != StatusCode::OK {
            return Err(RegistryError::Protocol(format!(
                "unexpected status {} for {}",
                status, url
            )));
        }

        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        url: &str,
    ) -> Result<T, RegistryError> {
        let response = self.send(request, url).await?;
        parse_json(response, url).await
    }

    /// Reads the digest the registry advertises for `url` without
    /// downloading the manifest body
    async fn probe_digest(&self, url: &str, repo: &str) -> Result<Option<String>, RegistryError> {
        let response = self
            .send(self.request(Method::HEAD, url, repo), url)
            .await?;

        Ok(response
            .headers()
            .get(CONTENT_DIGEST_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(str::to_string))
    }

    async fn download_manifest(&self, url: &str, repo: &str) -> Result<ManifestList, RegistryError> {
        self.send_json(self.request(Method::GET, url, repo), url)
            .await
    }

    /// Fetches the manifest of `repo:tag`, reusing the cached body while the
    /// registry still reports the same content digest
    pub async fn fetch_manifest(
        &self,
        repo: &str,
        tag: &str,
    ) -> Result<Arc<ManifestList>, RegistryError> {
        let url = self.endpoint.url(&format!("{}/manifests/{}", repo, tag));

        let digest = match self.probe_digest(&url, repo).await {
            Ok(Some(digest)) => digest,
            Ok(None) => {
                debug!("No content digest for {}, fetching without cache", url);
                return self.download_manifest(&url, repo).await.map(Arc::new);
            }
            Err(e) => {
                debug!("HEAD {} failed ({}), fetching without cache", url, e);
                return self.download_manifest(&url, repo).await.map(Arc::new);
            }
        };

        if let Some(manifest) = self.cache.get(&url, &digest) {
            return Ok(manifest);
        }

        let manifest = Arc::new(self.download_manifest(&url, repo).await?);
        self.cache.insert(&url, &digest, manifest.clone());
        Ok(manifest)
    }
}

async fn parse_json<T: DeserializeOwned>(response: Response, url: &str) -> Result<T, RegistryError> {
    response.json().await.map_err(|e| {
        warn!("Failed to parse registry response from {}: {}", url, e);
        RegistryError::Protocol(format!("invalid response body from {}: {}", url, e))
    })
}

/// Resolves the `rel="next"` target of a `Link` header against the request URL
///
/// Targets outside the origin of `base_url` are not followed, since requests
/// to them would carry the repository's credentials.
fn next_page(response: &Response, base_url: &str) -> Option<String> {
    let link = response.headers().get(LINK)?.to_str().ok()?;
    let next = link.split(',').find(|part| part.contains("rel=\"next\""))?;
    let start = next.find('<')? + 1;
    let end = next.find('>')?;
    let target = response.url().join(next.get(start..end)?).ok()?;

    let base = Url::parse(base_url).ok()?;
    if target.origin() != base.origin() {
        warn!("Ignoring pagination link to foreign origin {}", target);
        return None;
    }
    Some(target.to_string())
}

#[async_trait::async_trait]
impl Registry for RegistryClient {
    async fn list_tags(&self, repo: &str) -> Result<Vec<String>, RegistryError> {
        self.login(repo).await?;

        let mut next_url = Some(self.endpoint.url(&format!("{}/tags/list", repo)));
        let mut tags = Vec::new();
        let mut pages = 0;

        while let Some(url) = next_url.take() {
            if pages == MAX_TAG_PAGES {
                warn!(
                    "Stopped listing tags for {} after {} pages, list is truncated at {}",
                    repo, MAX_TAG_PAGES, url
                );
                break;
            }
            pages += 1;

            let response = self
                .send(self.request(Method::GET, &url, repo), &url)
                .await?;
            next_url = next_page(&response, &self.endpoint.base_url);
            let page: TagsResponse = parse_json(response, &url).await?;
            tags.extend(page.tags.unwrap_or_default());
        }

        info!("Listed {} tags for {}", tags.len(), repo);
        Ok(tags)
    }

    async fn fetch_manifests(
        &self,
        repo: &str,
        architecture: &str,
        tags: &[String],
        patterns: &[String],
    ) -> ManifestBatch {
        let patterns = TagPatterns::compile(patterns);
        let selected: Vec<String> = patterns.select(tags).into_iter().cloned().collect();

        if selected.is_empty() {
            debug!("No tags of {} match the configured patterns", repo);
            return ManifestBatch::default();
        }

        if let Err(e) = self.login(repo).await {
            warn!(
                "Login for {} failed, fetching manifests without a token: {}",
                repo, e
            );
        }

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent_fetches));
        let handles = selected.iter().map(|tag| {
            let client = self.clone();
            let semaphore = semaphore.clone();
            let repo = repo.to_string();
            let tag = tag.clone();
            tokio::spawn(async move {
                // The semaphore is never closed, so acquire only fails on shutdown
                let _permit = semaphore.acquire().await.ok();
                client.fetch_manifest(&repo, &tag).await
            })
        });
        let results = join_all(handles).await;

        // Walk results in tag order so the feed does not depend on completion order
        let mut batch = ManifestBatch::default();
        for (tag, result) in selected.into_iter().zip(results) {
            match result {
                Ok(Ok(manifest)) => {
                    batch.digests.extend(
                        manifest
                            .digests_for(architecture)
                            .map(|digest| TagDigest::new(tag.clone(), digest)),
                    );
                }
                Ok(Err(error)) => {
                    warn!("Failed to fetch manifest for {}:{}: {}", repo, tag, error);
                    batch.failures.push(TagFailure { tag, error });
                }
                Err(e) => {
                    error!("Manifest task for {}:{} panicked: {}", repo, tag, e);
                    batch.failures.push(TagFailure {
                        tag: tag.clone(),
                        error: RegistryError::TaskAborted {
                            tag,
                            reason: e.to_string(),
                        },
                    });
                }
            }
        }

        info!(
            "Resolved {} digests for {} ({}), {} tags failed",
            batch.digests.len(),
            repo,
            architecture,
            batch.failures.len()
        );
        batch
    }
}
