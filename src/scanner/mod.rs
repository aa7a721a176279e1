//! Filesystem Scanner - discovers tool manifests under `projects/<namespace>/<tool>/`
//!
//! One malformed tool never stops the scan: each failure becomes a
//! [`Warning`] keyed by the offending file and the walk continues.

mod cache;

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{KitcmdError, Result, Warning};
use crate::manifest::{MANIFEST_FILE, Manifest, ManifestOrigin};

pub use cache::{CACHE_FILE, ManifestCache};

/// Manifests found by a scan plus everything that went wrong along the way
#[derive(Debug, Default)]
pub struct ScanResult {
    pub manifests: Vec<Manifest>,
    pub warnings: Vec<Warning>,
}

/// Walks a projects directory two levels deep looking for manifests
#[derive(Debug, Clone)]
pub struct Scanner {
    projects_dir: PathBuf,
    cache_file: Option<PathBuf>,
}

impl Scanner {
    pub fn new(projects_dir: impl AsRef<Path>) -> Self {
        Self {
            projects_dir: projects_dir.as_ref().to_path_buf(),
            cache_file: None,
        }
    }

    /// Consult a manifest cache for tool directories without a manifest
    pub fn with_cache(mut self, cache_file: impl AsRef<Path>) -> Self {
        self.cache_file = Some(cache_file.as_ref().to_path_buf());
        self
    }

    pub fn projects_dir(&self) -> &Path {
        &self.projects_dir
    }

    /// Scan the projects directory.
    ///
    /// Fails only when the projects directory itself is missing or unreadable.
    pub fn scan(&self) -> Result<ScanResult> {
        if !self.projects_dir.is_dir() {
            return Err(KitcmdError::RootNotFound(format!(
                "projects directory {} does not exist",
                self.projects_dir.display()
            )));
        }
        let namespaces = sorted_subdirs(&self.projects_dir).map_err(|e| {
            KitcmdError::RootNotFound(format!("cannot read {}: {}", self.projects_dir.display(), e))
        })?;

        let mut result = ScanResult::default();
        let cache = self.load_cache(&mut result.warnings);

        for ns_dir in namespaces {
            let Some(namespace) = dir_name(&ns_dir) else {
                continue;
            };

            let tools = match sorted_subdirs(&ns_dir) {
                Ok(tools) => tools,
                Err(e) => {
                    log::warn!("Cannot read namespace {}: {}", ns_dir.display(), e);
                    result.warnings.push(Warning::at(&ns_dir, KitcmdError::Io(e)));
                    continue;
                }
            };

            for tool_dir in tools {
                let Some(tool) = dir_name(&tool_dir) else {
                    continue;
                };
                match self.load_tool(&namespace, &tool, &tool_dir, cache.as_ref()) {
                    Ok(Some(manifest)) => {
                        log::debug!("Discovered {} at {}", manifest.qualified_name(), manifest.source.display());
                        result.manifests.push(manifest);
                    }
                    Ok(None) => log::debug!("No manifest for {}/{}, skipping", namespace, tool),
                    Err(e) => {
                        log::warn!("{}", e);
                        let path = tool_dir.join(MANIFEST_FILE);
                        result.warnings.push(Warning::at(path, e));
                    }
                }
            }
        }

        log::info!(
            "Scanned {}: {} manifest(s), {} warning(s)",
            self.projects_dir.display(),
            result.manifests.len(),
            result.warnings.len()
        );
        Ok(result)
    }

    fn load_cache(&self, warnings: &mut Vec<Warning>) -> Option<ManifestCache> {
        let path = self.cache_file.as_ref()?;
        match ManifestCache::load(path) {
            Ok(cache) => Some(cache),
            Err(e) => {
                log::warn!("Ignoring manifest cache {}: {}", path.display(), e);
                warnings.push(Warning::at(path, e));
                None
            }
        }
    }

    fn load_tool(
        &self,
        namespace: &str,
        tool: &str,
        tool_dir: &Path,
        cache: Option<&ManifestCache>,
    ) -> Result<Option<Manifest>> {
        let manifest_path = tool_dir.join(MANIFEST_FILE);
        if manifest_path.is_file() {
            return Manifest::load_from_file(&manifest_path, Some(namespace)).map(Some);
        }

        let Some(cache) = cache else {
            return Ok(None);
        };
        let Some(doc) = cache.get(namespace, tool) else {
            return Ok(None);
        };
        let source = cache.entry_source(namespace, tool);
        let origin = ManifestOrigin {
            source: &source,
            dir: tool_dir,
            namespace: Some(namespace),
            cached: true,
        };
        Manifest::from_value(doc.clone(), &origin).map(Some)
    }
}

/// Non-hidden subdirectories of `dir`, sorted by name
fn sorted_subdirs(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut dirs: Vec<PathBuf> = fs::read_dir(dir)?
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .filter(|path| dir_name(path).is_some_and(|name| !name.starts_with('.')))
        .collect();
    dirs.sort();
    Ok(dirs)
}

fn dir_name(path: &Path) -> Option<String> {
    path.file_name().and_then(|n| n.to_str()).map(str::to_string)
}
