//! Host platform detection and platform-compatibility checks

use std::fmt;

/// Coarse platform categories accepted in a manifest's `platform` field
pub const PLATFORM_CATEGORIES: &[&str] = &["cross-platform", "windows", "linux", "macos"];

/// Operating system identifier, normalized from the spellings manifests use
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Os {
    Linux,
    Macos,
    Windows,
    Other(String),
}

impl Os {
    /// The OS this process is running on
    pub fn current() -> Self {
        Self::parse(std::env::consts::OS)
    }

    /// Parse an OS identifier, accepting common aliases
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "linux" => Self::Linux,
            "macos" | "darwin" | "osx" | "mac" => Self::Macos,
            "windows" | "win32" | "win64" | "win" => Self::Windows,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Linux => "linux",
            Self::Macos => "macos",
            Self::Windows => "windows",
            Self::Other(s) => s,
        }
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Split a coarse `platform` value ("linux", "linux,macos", "linux/macos") into parts
pub fn platform_parts(platform: &str) -> Vec<String> {
    platform
        .split([',', '/', '+', ' '])
        .map(|p| p.trim().to_lowercase())
        .filter(|p| !p.is_empty())
        .collect()
}

/// Check that a coarse `platform` value only names known categories
pub fn validate_platform(platform: &str) -> Result<(), String> {
    let parts = platform_parts(platform);
    if parts.is_empty() {
        return Err("'platform' must not be empty".to_string());
    }
    for part in &parts {
        if !PLATFORM_CATEGORIES.contains(&part.as_str()) {
            return Err(format!(
                "unknown platform '{}' (expected one of: {})",
                part,
                PLATFORM_CATEGORIES.join(", ")
            ));
        }
    }
    Ok(())
}

/// Decide whether a tool can run on `host`.
///
/// `platforms` is the verified set and wins whenever it is non-empty; the
/// coarse `platform` summary is consulted only when `platforms` is empty.
pub fn is_compatible(platform: &str, platforms: &[String], host: &Os) -> bool {
    if !platforms.is_empty() {
        return platforms.iter().any(|p| {
            let p = p.trim().to_lowercase();
            p == "any" || p == "cross-platform" || Os::parse(&p) == *host
        });
    }

    platform_parts(platform)
        .iter()
        .any(|p| p == "cross-platform" || Os::parse(p) == *host)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_os_parse_aliases() {
        assert_eq!(Os::parse("darwin"), Os::Macos);
        assert_eq!(Os::parse("MacOS"), Os::Macos);
        assert_eq!(Os::parse("win32"), Os::Windows);
        assert_eq!(Os::parse("linux"), Os::Linux);
        assert_eq!(Os::parse("freebsd"), Os::Other("freebsd".to_string()));
    }

    #[test]
    fn test_os_current_matches_consts() {
        assert_eq!(Os::current(), Os::parse(std::env::consts::OS));
    }

    #[test]
    fn test_platform_parts_combination() {
        assert_eq!(platform_parts("linux, macos"), vec!["linux", "macos"]);
        assert_eq!(platform_parts("Linux/MacOS"), vec!["linux", "macos"]);
    }

    #[test]
    fn test_validate_platform() {
        assert!(validate_platform("cross-platform").is_ok());
        assert!(validate_platform("linux,macos").is_ok());
        assert!(validate_platform("").is_err());
        assert!(validate_platform("amiga").is_err());
    }

    #[test]
    fn test_platforms_list_is_authoritative() {
        // Summary claims cross-platform, verified list says windows only
        assert!(!is_compatible("cross-platform", &list(&["windows"]), &Os::Linux));
        assert!(is_compatible("windows", &list(&["windows", "linux"]), &Os::Linux));
    }

    #[test]
    fn test_falls_back_to_platform_summary() {
        assert!(is_compatible("cross-platform", &[], &Os::Macos));
        assert!(is_compatible("linux,macos", &[], &Os::Macos));
        assert!(!is_compatible("windows", &[], &Os::Linux));
    }

    #[test]
    fn test_platforms_any() {
        assert!(is_compatible("linux", &list(&["any"]), &Os::Windows));
    }
}
