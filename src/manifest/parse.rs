//! Manifest parsing and load-time validation
//!
//! Parsing happens in three steps so errors land in the right bucket:
//! JSON syntax (`ManifestParse`), shape and types (`ManifestValidation`),
//! then the semantic rules on names, runtimes and platforms.

use std::path::{Component, Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;

use crate::error::{KitcmdError, Result};

use super::definition::{DEFAULT_ENTRY_POINT, DEFAULT_INTERPRETER, DEFAULT_SHELL, Manifest, Runtime, Taxonomy};
use super::platform::validate_platform;

/// JSON representation of a runtime descriptor
#[derive(Debug, Deserialize)]
struct RawRuntime {
    #[serde(rename = "type")]
    kind: String,
    script_path: Option<String>,
    path: Option<String>,
    entry_point: Option<String>,
    shell: Option<String>,
    interpreter: Option<String>,
    #[serde(default)]
    pass_through: bool,
}

/// JSON representation of a taxonomy block
#[derive(Debug, Deserialize)]
struct RawTaxonomy {
    category: String,
    tags: Vec<String>,
}

/// JSON representation of a manifest file
#[derive(Debug, Deserialize)]
struct RawManifest {
    name: String,
    version: String,
    description: String,
    namespace: String,
    language: String,
    platform: String,
    platforms: Vec<String>,
    runtime: RawRuntime,
    taxonomy: RawTaxonomy,
    #[serde(default)]
    pass_through: bool,
}

/// Where a manifest came from and which directory it describes
#[derive(Debug, Clone)]
pub struct ManifestOrigin<'a> {
    /// File to blame in errors
    pub source: &'a Path,
    /// Tool directory
    pub dir: &'a Path,
    /// Namespace directory the tool lives in, when known
    pub namespace: Option<&'a str>,
    pub cached: bool,
}

/// Check a tool name is usable as a command and as a path segment
pub fn is_filesystem_safe(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.starts_with('-')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

impl Manifest {
    /// Read and validate a manifest file
    pub fn load_from_file(path: &Path, namespace: Option<&str>) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| KitcmdError::ManifestParse {
            path: path.to_path_buf(),
            reason: format!("cannot read file: {}", e),
        })?;
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_json(
            &content,
            &ManifestOrigin {
                source: path,
                dir,
                namespace,
                cached: false,
            },
        )
    }

    /// Parse and validate manifest JSON text
    pub fn from_json(content: &str, origin: &ManifestOrigin<'_>) -> Result<Self> {
        let value: Value = serde_json::from_str(content).map_err(|e| KitcmdError::ManifestParse {
            path: origin.source.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_value(value, origin)
    }

    /// Validate an already-parsed manifest document
    pub fn from_value(value: Value, origin: &ManifestOrigin<'_>) -> Result<Self> {
        let invalid = |reason: String| KitcmdError::ManifestValidation {
            path: origin.source.to_path_buf(),
            reason,
        };

        if !value.is_object() {
            return Err(invalid("manifest must be a JSON object".to_string()));
        }
        let raw: RawManifest = serde_json::from_value(value).map_err(|e| invalid(e.to_string()))?;

        if !is_filesystem_safe(&raw.name) {
            return Err(invalid(format!(
                "name '{}' must be non-empty and contain only letters, digits, '-', '_' or '.'",
                raw.name
            )));
        }
        if let Some(expected) = origin.namespace
            && raw.namespace != expected
        {
            return Err(invalid(format!(
                "namespace '{}' does not match directory namespace '{}'",
                raw.namespace, expected
            )));
        }
        validate_platform(&raw.platform).map_err(invalid)?;

        let pass_through = raw.pass_through || raw.runtime.pass_through;
        let runtime = convert_runtime(raw.runtime, pass_through).map_err(invalid)?;

        Ok(Self {
            name: raw.name,
            version: raw.version,
            description: raw.description,
            namespace: raw.namespace,
            language: raw.language,
            platform: raw.platform,
            platforms: raw.platforms,
            runtime,
            taxonomy: Taxonomy {
                category: raw.taxonomy.category,
                tags: raw.taxonomy.tags,
            },
            dir: origin.dir.to_path_buf(),
            source: origin.source.to_path_buf(),
            cached: origin.cached,
        })
    }
}

/// Convert the JSON runtime block into its tagged form
fn convert_runtime(raw: RawRuntime, pass_through: bool) -> std::result::Result<Runtime, String> {
    let target = match raw.kind.as_str() {
        "binary" => raw.script_path.as_deref().or(raw.path.as_deref()),
        _ => raw.script_path.as_deref(),
    };

    let runtime = match raw.kind.as_str() {
        "python" => {
            let script_path = relative_target(target, &raw.kind)?;
            if pass_through {
                Runtime::PassThrough {
                    script_path,
                    interpreter: raw.interpreter,
                }
            } else {
                Runtime::Embedded {
                    script_path,
                    entry_point: raw.entry_point.unwrap_or_else(|| DEFAULT_ENTRY_POINT.to_string()),
                }
            }
        }
        "shell" => Runtime::Shell {
            script_path: relative_target(target, &raw.kind)?,
            shell: raw.shell.unwrap_or_else(|| DEFAULT_SHELL.to_string()),
        },
        "script" => Runtime::Script {
            script_path: relative_target(target, &raw.kind)?,
            interpreter: raw.interpreter.unwrap_or_else(|| DEFAULT_INTERPRETER.to_string()),
        },
        "binary" => Runtime::Binary {
            path: relative_target(target, &raw.kind)?,
        },
        other => {
            return Err(format!(
                "unknown runtime type '{}' (expected python, shell, script or binary)",
                other
            ));
        }
    };

    if let Runtime::Embedded { entry_point, .. } = &runtime
        && entry_point.trim().is_empty()
    {
        return Err("runtime.entry_point must not be empty".to_string());
    }

    Ok(runtime)
}

/// A runtime target must stay inside its own tool directory
fn relative_target(target: Option<&str>, kind: &str) -> std::result::Result<PathBuf, String> {
    let target = target
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| format!("runtime.script_path is required for '{}' runtimes", kind))?;
    let path = PathBuf::from(target);

    if path.is_absolute() || target.starts_with('/') || target.starts_with('\\') {
        return Err(format!("runtime target '{}' must be a relative path", target));
    }
    if path
        .components()
        .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)))
    {
        return Err(format!("runtime target '{}' must not leave the tool directory", target));
    }
    Ok(path)
}
