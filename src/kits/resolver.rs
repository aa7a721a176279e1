//! Kit Resolver - decides which kits, and therefore which tools, are active

use std::collections::BTreeSet;

use crate::error::{KitcmdError, Warning};

use super::kit::Kit;

/// Kit holding the framework's bundled tools; always active
pub const CORE_KIT: &str = "core";

/// User choices feeding kit resolution
#[derive(Debug, Clone, Default)]
pub struct KitSelection {
    /// Designated default kit, always active alongside `core`
    pub default_kit: Option<String>,
    /// Opt-in kits to enable
    pub enable: Vec<String>,
    /// Opt-in kits to disable, applied after `enable`
    pub disable: Vec<String>,
}

impl KitSelection {
    pub fn new(default_kit: impl Into<String>) -> Self {
        Self {
            default_kit: Some(default_kit.into()),
            ..Default::default()
        }
    }

    pub fn enable(mut self, kit: impl Into<String>) -> Self {
        self.enable.push(kit.into());
        self
    }

    pub fn disable(mut self, kit: impl Into<String>) -> Self {
        self.disable.push(kit.into());
        self
    }
}

/// Result of kit resolution: every known kit plus which of them are active
#[derive(Debug, Clone, Default)]
pub struct Activation {
    kits: Vec<Kit>,
    active: BTreeSet<String>,
    pinned: BTreeSet<String>,
}

impl Activation {
    /// Every discovered kit, in discovery order
    pub fn kits(&self) -> &[Kit] {
        &self.kits
    }

    pub fn kit(&self, name: &str) -> Option<&Kit> {
        self.kits.iter().find(|k| k.name == name)
    }

    pub fn is_kit_active(&self, name: &str) -> bool {
        self.active.contains(name)
    }

    /// Active regardless of user selection
    pub fn is_kit_pinned(&self, name: &str) -> bool {
        self.pinned.contains(name)
    }

    /// Names of active kits, in discovery order
    pub fn active_kits(&self) -> Vec<&str> {
        self.kits
            .iter()
            .filter(|k| self.active.contains(&k.name))
            .map(|k| k.name.as_str())
            .collect()
    }

    /// Names of every kit covering the tool
    pub fn covering_kits(&self, namespace: &str, name: &str) -> Vec<String> {
        self.kits
            .iter()
            .filter(|k| k.covers(namespace, name))
            .map(|k| k.name.clone())
            .collect()
    }

    /// A tool is active when any kit covering it is active
    pub fn is_tool_active(&self, namespace: &str, name: &str) -> bool {
        self.kits
            .iter()
            .any(|k| self.active.contains(&k.name) && k.covers(namespace, name))
    }
}

/// Computes an [`Activation`] from discovered kits and a [`KitSelection`]
#[derive(Debug)]
pub struct KitResolver {
    kits: Vec<Kit>,
}

impl KitResolver {
    pub fn new(kits: Vec<Kit>) -> Self {
        Self { kits }
    }

    /// Resolve active kits.
    ///
    /// `core`, the default kit and kits flagged `always_active` are pinned
    /// first; `enable` then adds opt-in kits and `disable` removes them.
    /// Unknown kit names and attempts to disable a pinned kit are warnings.
    pub fn resolve(self, selection: &KitSelection) -> (Activation, Vec<Warning>) {
        let mut warnings = Vec::new();
        let known = |name: &str| self.kits.iter().any(|k| k.name == name);

        let mut pinned = BTreeSet::new();
        if known(CORE_KIT) {
            pinned.insert(CORE_KIT.to_string());
        }
        if let Some(default_kit) = &selection.default_kit {
            if known(default_kit) {
                pinned.insert(default_kit.clone());
            } else {
                log::debug!("Default kit '{}' is not defined", default_kit);
            }
        }
        for kit in self.kits.iter().filter(|k| k.always_active) {
            pinned.insert(kit.name.clone());
        }

        let mut active = pinned.clone();
        for name in &selection.enable {
            if known(name) {
                active.insert(name.clone());
            } else {
                log::warn!("Cannot enable unknown kit '{}'", name);
                warnings.push(Warning::new(KitcmdError::UnknownKit(name.clone())));
            }
        }
        for name in &selection.disable {
            if !known(name) {
                log::warn!("Cannot disable unknown kit '{}'", name);
                warnings.push(Warning::new(KitcmdError::UnknownKit(name.clone())));
            } else if pinned.contains(name) {
                log::warn!("Kit '{}' is always active and cannot be disabled", name);
                warnings.push(Warning::new(KitcmdError::Config(format!(
                    "kit '{}' is always active and cannot be disabled",
                    name
                ))));
            } else {
                active.remove(name);
            }
        }

        log::info!("Active kits: {}", active.iter().cloned().collect::<Vec<_>>().join(", "));
        let activation = Activation {
            kits: self.kits,
            active,
            pinned,
        };
        (activation, warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn kit(name: &str, tools: &[&str]) -> Kit {
        let doc = serde_json::json!({"name": name, "tools": tools});
        Kit::from_json(&doc.to_string(), Path::new("kits/test.kit.json")).unwrap()
    }

    fn kits() -> Vec<Kit> {
        vec![
            kit("core", &["core:*"]),
            kit("standard", &["textkit:split"]),
            kit("extras", &["textkit:split", "textkit:srch-path"]),
            kit("media", &["media:*"]),
        ]
    }

    #[test]
    fn test_core_and_default_active_by_default() {
        let (activation, warnings) = KitResolver::new(kits()).resolve(&KitSelection::new("standard"));
        assert!(warnings.is_empty());
        assert_eq!(activation.active_kits(), vec!["core", "standard"]);
        assert!(activation.is_tool_active("core", "rn"));
        assert!(activation.is_tool_active("textkit", "split"));
        assert!(!activation.is_tool_active("textkit", "srch-path"));
        assert!(!activation.is_tool_active("media", "ffprobe"));
    }

    #[test]
    fn test_enable_opt_in_kit() {
        let selection = KitSelection::new("standard").enable("media");
        let (activation, _) = KitResolver::new(kits()).resolve(&selection);
        assert!(activation.is_kit_active("media"));
        assert!(activation.is_tool_active("media", "ffprobe"));
    }

    #[test]
    fn test_union_semantics() {
        // split is covered by both standard (active) and extras (inactive)
        let (activation, _) = KitResolver::new(kits()).resolve(&KitSelection::new("standard"));
        assert!(!activation.is_kit_active("extras"));
        assert!(activation.is_tool_active("textkit", "split"));
        assert_eq!(activation.covering_kits("textkit", "split"), vec!["standard", "extras"]);
    }

    #[test]
    fn test_disable_after_enable() {
        let selection = KitSelection::new("standard").enable("media").disable("media");
        let (activation, warnings) = KitResolver::new(kits()).resolve(&selection);
        assert!(!activation.is_kit_active("media"));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_pinned_kits_cannot_be_disabled() {
        let selection = KitSelection::new("standard").disable("standard").disable("core");
        let (activation, warnings) = KitResolver::new(kits()).resolve(&selection);
        assert!(activation.is_tool_active("core", "rn"));
        assert!(activation.is_kit_active("standard"));
        assert!(activation.is_kit_pinned("core"));
        assert_eq!(warnings.len(), 2);
    }

    #[test]
    fn test_core_survives_missing_default() {
        let (activation, warnings) = KitResolver::new(kits()).resolve(&KitSelection::new("nonexistent"));
        assert!(warnings.is_empty());
        assert_eq!(activation.active_kits(), vec!["core"]);
        assert!(activation.is_tool_active("core", "rn"));
    }

    #[test]
    fn test_unknown_kit_is_warning() {
        let selection = KitSelection::new("standard").enable("medai");
        let (activation, warnings) = KitResolver::new(kits()).resolve(&selection);
        assert_eq!(warnings.len(), 1);
        assert!(matches!(&warnings[0].error, KitcmdError::UnknownKit(name) if name == "medai"));
        assert_eq!(activation.active_kits(), vec!["core", "standard"]);
    }

    #[test]
    fn test_always_active_flag_pins_kit() {
        let mut all = kits();
        all[3].always_active = true;
        let selection = KitSelection::new("standard").disable("media");
        let (activation, warnings) = KitResolver::new(all).resolve(&selection);
        assert!(activation.is_kit_active("media"));
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_no_kits_nothing_active() {
        let (activation, _) = KitResolver::new(vec![]).resolve(&KitSelection::default());
        assert!(activation.active_kits().is_empty());
        assert!(!activation.is_tool_active("core", "rn"));
        assert!(activation.kit("core").is_none());
    }
}
