//! Links from feed items to human-readable registry pages

use crate::config::RegistryEndpoint;
use crate::registry::TagDigest;

/// Docker Hub's registry API; items for it link to the hub website instead
pub const DOCKER_HUB_BASE_URL: &str = "https://registry.hub.docker.com/v2/";

fn is_docker_hub(endpoint: &RegistryEndpoint) -> bool {
    endpoint.base_url == DOCKER_HUB_BASE_URL
}

/// Page listing all tags of `repo`
pub fn tags_link(endpoint: &RegistryEndpoint, repo: &str) -> String {
    if !is_docker_hub(endpoint) {
        return endpoint.url(&format!("{}/tags/list", repo));
    }
    match repo.strip_prefix("library/") {
        Some(name) => format!("https://hub.docker.com/_/{}?tab=tags", name),
        None => format!("https://hub.docker.com/r/{}/tags", repo),
    }
}

/// Page describing the image behind `tag_digest`
pub fn digest_link(endpoint: &RegistryEndpoint, repo: &str, tag_digest: &TagDigest) -> String {
    if !is_docker_hub(endpoint) {
        return endpoint.url(&format!("{}/manifests/{}", repo, tag_digest.tag));
    }
    let path = match repo.strip_prefix("library/") {
        Some(name) => format!("{}/{}", name, repo),
        None => repo.to_string(),
    };
    format!(
        "https://hub.docker.com/layers/{}/{}/images/{}?context=explore",
        path,
        tag_digest.tag,
        tag_digest.digest.replacen(':', "-", 1)
    )
}
