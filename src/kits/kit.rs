//! Kit descriptors and their tool references

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{KitcmdError, Result, Warning};

/// Suffix identifying kit files in the kits directory
pub const KIT_SUFFIX: &str = ".kit.json";

/// A kit member: one tool, or every tool in a namespace
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolRef {
    /// `namespace:tool`
    Tool { namespace: String, name: String },
    /// `namespace:*`
    Namespace(String),
    /// Bare `tool`, matching that name in any namespace
    AnyNamespace(String),
}

impl ToolRef {
    /// Parse `namespace:tool`, `namespace:*` or a bare tool name (`/` also separates)
    pub fn parse(s: &str) -> std::result::Result<Self, String> {
        let s = s.trim();
        let split = s.split_once(':').or_else(|| s.split_once('/'));
        match split {
            Some((ns, tool)) => {
                let (ns, tool) = (ns.trim(), tool.trim());
                if ns.is_empty() || tool.is_empty() {
                    return Err(format!("invalid tool reference '{}'", s));
                }
                if tool == "*" {
                    Ok(Self::Namespace(ns.to_string()))
                } else {
                    Ok(Self::Tool {
                        namespace: ns.to_string(),
                        name: tool.to_string(),
                    })
                }
            }
            None if s.is_empty() || s == "*" => Err(format!("invalid tool reference '{}'", s)),
            None => Ok(Self::AnyNamespace(s.to_string())),
        }
    }

    pub fn matches(&self, namespace: &str, name: &str) -> bool {
        match self {
            Self::Tool { namespace: ns, name: n } => ns == namespace && n == name,
            Self::Namespace(ns) => ns == namespace,
            Self::AnyNamespace(n) => n == name,
        }
    }
}

impl fmt::Display for ToolRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tool { namespace, name } => write!(f, "{}:{}", namespace, name),
            Self::Namespace(ns) => write!(f, "{}:*", ns),
            Self::AnyNamespace(name) => write!(f, "{}", name),
        }
    }
}

/// JSON representation of a kit file
#[derive(Debug, Deserialize)]
struct RawKit {
    name: String,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    description: String,
    #[serde(default)]
    tools: Vec<String>,
    #[serde(default)]
    always_active: bool,
}

/// A named set of tools toggled as a group
#[derive(Debug, Clone)]
pub struct Kit {
    pub name: String,
    pub version: Option<String>,
    pub description: String,
    pub tools: Vec<ToolRef>,
    /// Kit file asks to be active regardless of selection
    pub always_active: bool,
    pub source: PathBuf,
}

impl Kit {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| KitcmdError::KitParse {
            path: path.to_path_buf(),
            reason: format!("cannot read file: {}", e),
        })?;
        Self::from_json(&content, path)
    }

    pub fn from_json(content: &str, source: &Path) -> Result<Self> {
        let invalid = |reason: String| KitcmdError::KitParse {
            path: source.to_path_buf(),
            reason,
        };

        let raw: RawKit = serde_json::from_str(content).map_err(|e| invalid(e.to_string()))?;
        if raw.name.trim().is_empty() {
            return Err(invalid("kit name must not be empty".to_string()));
        }
        let tools = raw
            .tools
            .iter()
            .map(|t| ToolRef::parse(t))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(invalid)?;

        Ok(Self {
            name: raw.name,
            version: raw.version,
            description: raw.description,
            tools,
            always_active: raw.always_active,
            source: source.to_path_buf(),
        })
    }

    /// Whether any reference in this kit covers the tool
    pub fn covers(&self, namespace: &str, name: &str) -> bool {
        self.tools.iter().any(|r| r.matches(namespace, name))
    }
}

/// Load every `*.kit.json` in `kits_dir`, sorted by file name.
///
/// A missing directory yields no kits. Malformed files and duplicate kit
/// names become warnings; the first file defining a name wins.
pub fn discover_kits(kits_dir: &Path) -> (Vec<Kit>, Vec<Warning>) {
    let mut kits: Vec<Kit> = Vec::new();
    let mut warnings = Vec::new();

    if !kits_dir.is_dir() {
        log::debug!("Kits directory {} does not exist", kits_dir.display());
        return (kits, warnings);
    }

    let pattern = format!(
        "{}/*{}",
        glob::Pattern::escape(&kits_dir.to_string_lossy()),
        KIT_SUFFIX
    );
    let mut paths: Vec<PathBuf> = match glob::glob(&pattern) {
        Ok(paths) => paths.flatten().filter(|p| p.is_file()).collect(),
        Err(e) => {
            warnings.push(Warning::at(
                kits_dir,
                KitcmdError::Config(format!("bad kit pattern {}: {}", pattern, e)),
            ));
            return (kits, warnings);
        }
    };
    paths.sort();

    for path in paths {
        match Kit::load_from_file(&path) {
            Ok(kit) => {
                if let Some(existing) = kits.iter().find(|k| k.name == kit.name) {
                    let reason = format!("kit '{}' is already defined by {}", kit.name, existing.source.display());
                    log::warn!("{}: {}", path.display(), reason);
                    warnings.push(Warning::at(&path, KitcmdError::KitParse { path: path.clone(), reason }));
                    continue;
                }
                log::debug!("Loaded kit '{}' ({} reference(s))", kit.name, kit.tools.len());
                kits.push(kit);
            }
            Err(e) => {
                log::warn!("{}", e);
                warnings.push(Warning::at(&path, e));
            }
        }
    }

    (kits, warnings)
}
