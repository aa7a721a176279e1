//! Error types for kitcmd
//!
//! Centralized error handling using thiserror. Discovery-phase problems are
//! mostly collected as [`Warning`]s; dispatch-phase errors end the invocation.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// All error types that can occur in kitcmd
#[derive(Debug, Error)]
pub enum KitcmdError {
    /// Manifest document could not be parsed
    #[error("Malformed manifest {}: {reason}", path.display())]
    ManifestParse { path: PathBuf, reason: String },

    /// Manifest parsed but violates the schema
    #[error("Invalid manifest {}: {reason}", path.display())]
    ManifestValidation { path: PathBuf, reason: String },

    /// Kit document could not be parsed
    #[error("Malformed kit {}: {reason}", path.display())]
    KitParse { path: PathBuf, reason: String },

    /// Two active tools declare the same name
    #[error("Tool name '{name}' is declared by both {} and {}", first.display(), second.display())]
    NameCollision {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },

    /// A kit was requested that no kit file defines
    #[error("Unknown kit: {0}")]
    UnknownKit(String),

    /// Project root (or one of its required directories) is missing
    #[error("Project root not found: {0}")]
    RootNotFound(String),

    /// No tool with this name was discovered
    #[error("Unknown tool '{name}'{}", suggestion_suffix(suggestions))]
    UnknownTool {
        name: String,
        suggestions: Vec<String>,
    },

    /// Tool exists but none of its kits are active
    #[error("Tool '{name}' is not active{}", kit_hint(kits))]
    ToolNotActive { name: String, kits: Vec<String> },

    /// Tool does not run on this host
    #[error("Tool '{name}' does not support {host} (supports: {})", declared.join(", "))]
    PlatformMismatch {
        name: String,
        declared: Vec<String>,
        host: String,
    },

    /// Tool was reached but could not be run, or faulted while running
    #[error("Error running '{name}': {reason}")]
    ToolExecution { name: String, reason: String },

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn suggestion_suffix(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else {
        format!(" (did you mean: {}?)", suggestions.join(", "))
    }
}

fn kit_hint(kits: &[String]) -> String {
    if kits.is_empty() {
        " (it is not part of any kit)".to_string()
    } else {
        format!(" (enable one of: {})", kits.join(", "))
    }
}

impl KitcmdError {
    /// Process exit code reported when this error ends an invocation
    pub fn exit_code(&self) -> i32 {
        1
    }

    /// Whether this error belongs to the dispatch phase
    pub fn is_dispatch_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownTool { .. } | Self::ToolNotActive { .. } | Self::PlatformMismatch { .. } | Self::ToolExecution { .. }
        )
    }
}

/// Result type alias for kitcmd operations
pub type Result<T> = std::result::Result<T, KitcmdError>;

/// A non-fatal problem found during discovery, keyed by the file it came from
#[derive(Debug)]
pub struct Warning {
    pub path: Option<PathBuf>,
    pub error: KitcmdError,
}

impl Warning {
    pub fn new(error: KitcmdError) -> Self {
        Self { path: None, error }
    }

    pub fn at(path: impl Into<PathBuf>, error: KitcmdError) -> Self {
        Self {
            path: Some(path.into()),
            error,
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_tool_without_suggestions() {
        let err = KitcmdError::UnknownTool {
            name: "frob".to_string(),
            suggestions: vec![],
        };
        assert_eq!(err.to_string(), "Unknown tool 'frob'");
    }

    #[test]
    fn test_unknown_tool_with_suggestions() {
        let err = KitcmdError::UnknownTool {
            name: "splt".to_string(),
            suggestions: vec!["split".to_string(), "spit".to_string()],
        };
        assert_eq!(err.to_string(), "Unknown tool 'splt' (did you mean: split, spit?)");
    }

    #[test]
    fn test_tool_not_active_names_kits() {
        let err = KitcmdError::ToolNotActive {
            name: "rn".to_string(),
            kits: vec!["extras".to_string()],
        };
        assert_eq!(err.to_string(), "Tool 'rn' is not active (enable one of: extras)");

        let orphan = KitcmdError::ToolNotActive {
            name: "rn".to_string(),
            kits: vec![],
        };
        assert!(orphan.to_string().contains("not part of any kit"));
    }

    #[test]
    fn test_platform_mismatch_message() {
        let err = KitcmdError::PlatformMismatch {
            name: "reg".to_string(),
            declared: vec!["windows".to_string()],
            host: "linux".to_string(),
        };
        assert_eq!(err.to_string(), "Tool 'reg' does not support linux (supports: windows)");
    }

    #[test]
    fn test_name_collision_names_both_paths() {
        let err = KitcmdError::NameCollision {
            name: "split".to_string(),
            first: PathBuf::from("projects/a/split/.kitcmd.json"),
            second: PathBuf::from("projects/b/split/.kitcmd.json"),
        };
        let msg = err.to_string();
        assert!(msg.contains("projects/a/split/.kitcmd.json"));
        assert!(msg.contains("projects/b/split/.kitcmd.json"));
    }

    #[test]
    fn test_dispatch_errors_exit_nonzero() {
        let err = KitcmdError::ToolExecution {
            name: "x".to_string(),
            reason: "boom".to_string(),
        };
        assert!(err.is_dispatch_error());
        assert_ne!(err.exit_code(), 0);
        assert!(!KitcmdError::UnknownKit("extras".to_string()).is_dispatch_error());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: KitcmdError = io_err.into();
        assert!(matches!(err, KitcmdError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid").unwrap_err();
        let err: KitcmdError = json_err.into();
        assert!(matches!(err, KitcmdError::Json(_)));
    }

    #[test]
    fn test_warning_keeps_path() {
        let warning = Warning::at("kits/bad.kit.json", KitcmdError::UnknownKit("bad".to_string()));
        assert_eq!(warning.path, Some(PathBuf::from("kits/bad.kit.json")));
        assert_eq!(warning.to_string(), "Unknown kit: bad");
    }
}
