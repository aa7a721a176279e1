//! Discovery - from a project root to a ready command table
//!
//! Scans manifests, loads kits, resolves activation and builds the
//! registry. Everything non-fatal along the way is handed back as warnings.

use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::{KitcmdError, Result, Warning};
use crate::kits::{KitResolver, KitSelection, discover_kits};
use crate::manifest::Os;
use crate::registry::Registry;
use crate::scanner::{CACHE_FILE, Scanner};

/// How many directories above a starting point to look for a project root
const ROOT_SEARCH_DEPTH: usize = 5;

/// Where to discover from and which kits to activate
#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    pub root: PathBuf,
    pub projects_dir: PathBuf,
    pub kits_dir: PathBuf,
    pub selection: KitSelection,
    pub host: Os,
}

impl DiscoveryOptions {
    /// Defaults: `projects/` and `kits/` under `root`, `standard` kit, this host
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::from_config(root, &Config::default(), &[], &[])
    }

    pub fn from_config(root: impl Into<PathBuf>, config: &Config, enable: &[String], disable: &[String]) -> Self {
        Self {
            root: root.into(),
            projects_dir: config.projects_dir.clone(),
            kits_dir: config.kits_dir.clone(),
            selection: config.kit_selection(enable, disable),
            host: Os::current(),
        }
    }

    pub fn with_selection(mut self, selection: KitSelection) -> Self {
        self.selection = selection;
        self
    }

    pub fn with_host(mut self, host: Os) -> Self {
        self.host = host;
        self
    }
}

/// Result of discovery: the command table plus collected warnings
#[derive(Debug)]
pub struct Discovery {
    pub registry: Registry,
    pub warnings: Vec<Warning>,
}

/// Run discovery end to end.
///
/// Fatal only for a missing projects directory or an active name collision.
pub fn discover(options: &DiscoveryOptions) -> Result<Discovery> {
    let root = options
        .root
        .canonicalize()
        .map_err(|e| KitcmdError::RootNotFound(format!("{}: {}", options.root.display(), e)))?;
    log::debug!("Discovering tools under {}", root.display());

    let scan = Scanner::new(root.join(&options.projects_dir))
        .with_cache(root.join(CACHE_FILE))
        .scan()?;
    let mut warnings = scan.warnings;

    let (kits, kit_warnings) = discover_kits(&root.join(&options.kits_dir));
    warnings.extend(kit_warnings);

    let (activation, activation_warnings) = KitResolver::new(kits).resolve(&options.selection);
    warnings.extend(activation_warnings);

    let (registry, registry_warnings) = Registry::build(scan.manifests, activation, options.host.clone())?;
    warnings.extend(registry_warnings);

    Ok(Discovery { registry, warnings })
}

/// Resolve the project root: explicit path, then configured path, then a search
/// upwards from the current directory and from the executable.
pub fn resolve_root(explicit: Option<&Path>, config: &Config) -> Result<PathBuf> {
    if let Some(root) = explicit.or(config.root.as_deref()) {
        if root.is_dir() {
            return Ok(root.to_path_buf());
        }
        return Err(KitcmdError::RootNotFound(format!("{} is not a directory", root.display())));
    }

    let starts = [
        std::env::current_dir().ok(),
        std::env::current_exe().ok().and_then(|exe| exe.parent().map(Path::to_path_buf)),
    ];
    for start in starts.iter().flatten() {
        if let Some(root) = find_root(start, config) {
            log::debug!("Found project root {}", root.display());
            return Ok(root);
        }
    }

    Err(KitcmdError::RootNotFound(format!(
        "no directory containing {}/ and {}/ found; use --root",
        config.projects_dir.display(),
        config.kits_dir.display()
    )))
}

/// First of `start` and its ancestors holding both the projects and kits directories
pub fn find_root(start: &Path, config: &Config) -> Option<PathBuf> {
    start
        .ancestors()
        .take(ROOT_SEARCH_DEPTH + 1)
        .find(|dir| dir.join(&config.projects_dir).is_dir() && dir.join(&config.kits_dir).is_dir())
        .map(Path::to_path_buf)
}
