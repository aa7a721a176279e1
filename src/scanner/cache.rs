//! Manifest cache - fallback descriptors for tool directories without a manifest
//!
//! A tool checked out from a source that doesn't ship `.kitcmd.json` stays
//! discoverable through `<root>/manifest_cache.json`:
//!
//! ```json
//! { "cached_manifests": { "textkit:split": { "name": "split", ... } } }
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;

use crate::error::{KitcmdError, Result};

/// File name of the manifest cache, relative to the project root
pub const CACHE_FILE: &str = "manifest_cache.json";

#[derive(Debug, Default, Deserialize)]
struct CacheFile {
    #[serde(default)]
    cached_manifests: HashMap<String, Value>,
}

/// Cached manifest documents keyed by `namespace:tool`
#[derive(Debug, Default)]
pub struct ManifestCache {
    path: PathBuf,
    entries: HashMap<String, Value>,
}

impl ManifestCache {
    /// Load the cache; a missing file is an empty cache
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.is_file() {
            return Ok(Self {
                path,
                entries: HashMap::new(),
            });
        }

        let content = std::fs::read_to_string(&path)?;
        let file: CacheFile = serde_json::from_str(&content).map_err(|e| KitcmdError::ManifestParse {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        log::debug!("Loaded {} cached manifest(s) from {}", file.cached_manifests.len(), path.display());

        Ok(Self {
            path,
            entries: file.cached_manifests,
        })
    }

    /// Cached document for a tool directory, if any
    pub fn get(&self, namespace: &str, tool: &str) -> Option<&Value> {
        self.entries.get(&format!("{}:{}", namespace, tool))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Source recorded for one cached manifest: `<cache file>#namespace:tool`
    pub fn entry_source(&self, namespace: &str, tool: &str) -> PathBuf {
        let mut source = self.path.clone().into_os_string();
        source.push(format!("#{}:{}", namespace, tool));
        PathBuf::from(source)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
