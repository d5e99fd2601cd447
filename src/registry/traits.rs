//! Registry trait for fetching tags and manifests

#[cfg(test)]
use mockall::automock;

use crate::error::RegistryError;
use crate::registry::types::ManifestBatch;

/// Read access to one container registry
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait Registry: Send + Sync {
    /// Lists all tags of a repository in registry order
    ///
    /// # Arguments
    /// * `repo` - Repository path, e.g. "library/ubuntu"
    async fn list_tags(&self, repo: &str) -> Result<Vec<String>, RegistryError>;

    /// Resolves every tag matching one of `patterns` to the digests built
    /// for `architecture`
    ///
    /// Never fails as a whole: tags that cannot be resolved are reported in
    /// [`ManifestBatch::failures`] and the remaining tags are still returned.
    /// Digests follow the order of `tags`.
    async fn fetch_manifests(
        &self,
        repo: &str,
        architecture: &str,
        tags: &[String],
        patterns: &[String],
    ) -> ManifestBatch;
}
