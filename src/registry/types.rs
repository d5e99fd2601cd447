use serde::Deserialize;

use crate::error::RegistryError;

/// Response from `GET <base>/<repo>/tags/list`
#[derive(Debug, Deserialize)]
pub(crate) struct TagsResponse {
    /// Registries return `null` for repositories without tags
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

/// Response from the bearer-token exchange
#[derive(Debug, Deserialize)]
pub(crate) struct AuthResponse {
    #[serde(default)]
    pub token: Option<String>,
    /// Some token servers (OAuth2-style) only send `access_token`
    #[serde(default)]
    pub access_token: Option<String>,
}

impl AuthResponse {
    pub fn into_token(self, repo: &str) -> Result<AuthToken, RegistryError> {
        self.token
            .or(self.access_token)
            .filter(|t| !t.is_empty())
            .map(AuthToken)
            .ok_or_else(|| RegistryError::Auth {
                repo: repo.to_string(),
                reason: "token response did not contain a token".to_string(),
            })
    }
}

/// Bearer token scoped to one repository
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AuthToken(***)")
    }
}

/// Manifest list (Docker) or image index (OCI)
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestList {
    #[serde(default)]
    pub schema_version: u32,
    #[serde(default)]
    pub media_type: Option<String>,
    /// Empty for single-platform manifests
    #[serde(default)]
    pub manifests: Vec<PlatformManifest>,
}

impl ManifestList {
    /// Digests of all entries built for `architecture`
    pub fn digests_for<'a>(&'a self, architecture: &'a str) -> impl Iterator<Item = &'a str> {
        self.manifests
            .iter()
            .filter(move |m| m.platform.architecture == architecture)
            .map(|m| m.digest.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PlatformManifest {
    pub digest: String,
    #[serde(default)]
    pub platform: Platform,
    #[serde(default)]
    pub size: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Platform {
    #[serde(default)]
    pub architecture: String,
    #[serde(default)]
    pub os: String,
    #[serde(default)]
    pub variant: Option<String>,
}

/// A tag resolved to the content digest of one platform image
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TagDigest {
    pub tag: String,
    pub digest: String,
}

impl TagDigest {
    pub fn new(tag: impl Into<String>, digest: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            digest: digest.into(),
        }
    }
}

/// A tag whose manifest could not be resolved
#[derive(Debug)]
pub struct TagFailure {
    pub tag: String,
    pub error: RegistryError,
}

/// Outcome of resolving manifests for a set of tags
///
/// `digests` follow the order of the requested tags, not completion order.
#[derive(Debug, Default)]
pub struct ManifestBatch {
    pub digests: Vec<TagDigest>,
    pub failures: Vec<TagFailure>,
}
