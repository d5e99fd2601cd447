//! Stable feed item identifiers
//!
//! A guid is the hex SHA-256 of its identifying fields concatenated without
//! separators, so the same inputs always produce the same identifier and feed
//! readers show an item once per genuinely new state.

use sha2::{Digest, Sha256};

pub fn make_guid<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_ref().as_bytes());
    }
    hex::encode(hasher.finalize())
}

/// Identifier of a "digest changed" item
pub fn digest_guid(base_url: &str, repo: &str, tag: &str, arch: &str, digest: &str) -> String {
    make_guid([base_url, repo, tag, arch, digest])
}

/// Identifier of a "tags changed" item; `tags` in feed order
pub fn tags_guid(repo: &str, tags: &[String]) -> String {
    make_guid(std::iter::once(repo).chain(tags.iter().map(String::as_str)))
}
