//! Manifest and runtime descriptor types
//!
//! A `Manifest` is the validated, immutable form of one tool's `.kitcmd.json`.

use std::fmt;
use std::path::{Path, PathBuf};

use super::platform::{self, Os};

/// File name of a tool manifest inside `projects/<namespace>/<tool>/`
pub const MANIFEST_FILE: &str = ".kitcmd.json";

/// Entry symbol used by embedded Python tools that don't declare one
pub const DEFAULT_ENTRY_POINT: &str = "main";

/// Shell used by `shell` runtimes that don't declare one
pub const DEFAULT_SHELL: &str = "bash";

/// Interpreter used by `script` runtimes that don't declare one
pub const DEFAULT_INTERPRETER: &str = "python";

/// How a tool is executed. Each variant carries only what its strategy needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Runtime {
    /// Python module loaded and called in-process through an entry symbol
    Embedded { script_path: PathBuf, entry_point: String },
    /// Python script run as a child of an interpreter, arguments untouched
    PassThrough {
        script_path: PathBuf,
        interpreter: Option<String>,
    },
    /// Shell script run by the declared shell
    Shell { script_path: PathBuf, shell: String },
    /// Script run by an explicit interpreter
    Script {
        script_path: PathBuf,
        interpreter: String,
    },
    /// Executable run directly
    Binary { path: PathBuf },
}

impl Runtime {
    /// The `runtime.type` value this variant was declared with
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Embedded { .. } | Self::PassThrough { .. } => "python",
            Self::Shell { .. } => "shell",
            Self::Script { .. } => "script",
            Self::Binary { .. } => "binary",
        }
    }

    /// Path of the code this runtime executes, relative to the tool directory
    pub fn target(&self) -> &Path {
        match self {
            Self::Embedded { script_path, .. }
            | Self::PassThrough { script_path, .. }
            | Self::Shell { script_path, .. }
            | Self::Script { script_path, .. } => script_path,
            Self::Binary { path } => path,
        }
    }

    pub fn is_pass_through(&self) -> bool {
        !matches!(self, Self::Embedded { .. })
    }
}

impl fmt::Display for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Embedded { entry_point, .. } => write!(f, "python (embedded, entry point '{}')", entry_point),
            Self::PassThrough { .. } => write!(f, "python (pass-through)"),
            Self::Shell { shell, .. } => write!(f, "shell ({})", shell),
            Self::Script { interpreter, .. } => write!(f, "script ({})", interpreter),
            Self::Binary { .. } => write!(f, "binary"),
        }
    }
}

/// Classification used only by `list` and `info`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Taxonomy {
    pub category: String,
    pub tags: Vec<String>,
}

impl Taxonomy {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }
}

/// A validated tool manifest
#[derive(Debug, Clone)]
pub struct Manifest {
    /// Dispatch key, unique among active tools
    pub name: String,
    pub version: String,
    pub description: String,
    pub namespace: String,
    pub language: String,
    /// Coarse platform summary
    pub platform: String,
    /// Verified OS identifiers
    pub platforms: Vec<String>,
    pub runtime: Runtime,
    pub taxonomy: Taxonomy,
    /// Tool directory; runtime targets resolve against it
    pub dir: PathBuf,
    /// File the manifest was read from
    pub source: PathBuf,
    /// True when read from the manifest cache instead of the tool directory
    pub cached: bool,
}

impl Manifest {
    /// `namespace:name`, the form kits use to reference tools
    pub fn qualified_name(&self) -> String {
        format!("{}:{}", self.namespace, self.name)
    }

    /// Absolute path of the runtime target
    pub fn target_path(&self) -> PathBuf {
        self.dir.join(self.runtime.target())
    }

    pub fn is_compatible_with(&self, host: &Os) -> bool {
        platform::is_compatible(&self.platform, &self.platforms, host)
    }

    /// Platforms to report when refusing to run on the wrong host
    pub fn declared_platforms(&self) -> Vec<String> {
        if self.platforms.is_empty() {
            platform::platform_parts(&self.platform)
        } else {
            self.platforms.clone()
        }
    }
}
