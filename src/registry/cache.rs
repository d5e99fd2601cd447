use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::registry::types::ManifestList;

#[derive(Debug, Clone)]
struct CachedManifest {
    digest: String,
    manifest: Arc<ManifestList>,
}

/// Parsed manifests keyed by manifest URL
///
/// An entry is only served while the registry still advertises the digest it
/// was stored with. There is no eviction: the key set is bounded by the
/// configured watches.
#[derive(Debug, Default)]
pub struct ManifestCache {
    entries: Mutex<HashMap<String, CachedManifest>>,
}

impl ManifestCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_entries(&self) -> MutexGuard<'_, HashMap<String, CachedManifest>> {
        // Entries are replaced whole, so a poisoned map is still consistent
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the cached manifest if it was stored under `digest`
    pub fn get(&self, url: &str, digest: &str) -> Option<Arc<ManifestList>> {
        let entries = self.lock_entries();
        match entries.get(url) {
            Some(entry) if entry.digest == digest => {
                debug!("Manifest cache hit for {} ({})", url, digest);
                Some(entry.manifest.clone())
            }
            Some(entry) => {
                debug!(
                    "Manifest cache stale for {}: cached {}, registry {}",
                    url, entry.digest, digest
                );
                None
            }
            None => None,
        }
    }

    /// Stores `manifest` for `url`, replacing any previous entry
    pub fn insert(&self, url: &str, digest: &str, manifest: Arc<ManifestList>) {
        self.lock_entries().insert(
            url.to_string(),
            CachedManifest {
                digest: digest.to_string(),
                manifest,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.lock_entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
