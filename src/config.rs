//! Global configuration.
//!
//! Loaded from --config, ./kitcmd.yml or ~/.config/kitcmd/kitcmd.yml

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::dispatch::default_python;
use crate::kits::KitSelection;

/// Default kit activated alongside `core`.
pub const DEFAULT_KIT: &str = "standard";

/// Global configuration for kitcmd.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Project root holding `projects/` and `kits/`.
    pub root: Option<PathBuf>,

    /// Projects directory, relative to the root.
    #[serde(rename = "projects-dir")]
    pub projects_dir: PathBuf,

    /// Kits directory, relative to the root.
    #[serde(rename = "kits-dir")]
    pub kits_dir: PathBuf,

    /// Kit that is always active alongside `core`.
    #[serde(rename = "default-kit")]
    pub default_kit: String,

    /// Opt-in kits to enable.
    #[serde(rename = "enabled-kits")]
    pub enabled_kits: Vec<String>,

    /// Opt-in kits to disable.
    #[serde(rename = "disabled-kits")]
    pub disabled_kits: Vec<String>,

    /// Python interpreter for pass-through and embedded tools.
    pub python: String,

    /// `list` output settings.
    pub list: ListConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: None,
            projects_dir: PathBuf::from("projects"),
            kits_dir: PathBuf::from("kits"),
            default_kit: DEFAULT_KIT.to_string(),
            enabled_kits: Vec::new(),
            disabled_kits: Vec::new(),
            python: default_python().to_string(),
            list: ListConfig::default(),
        }
    }
}

/// `list` output settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ListConfig {
    /// Show tools that cannot run on this host.
    #[serde(rename = "show-incompatible")]
    pub show_incompatible: bool,
}

impl Config {
    /// Load configuration with fallback chain.
    ///
    /// Search order:
    /// 1. Explicit path if provided
    /// 2. kitcmd.yml in current directory
    /// 3. ~/.config/kitcmd/kitcmd.yml
    /// 4. Defaults
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        let project_name = env!("CARGO_PKG_NAME");
        let project_config = PathBuf::from(format!("{}.yml", project_name));
        if project_config.exists() {
            match Self::load_from_file(&project_config) {
                Ok(config) => {
                    log::info!("Loaded config from {}", project_config.display());
                    return Ok(config);
                }
                Err(e) => {
                    log::warn!("Failed to load {}: {}", project_config.display(), e);
                }
            }
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join(project_name).join(format!("{}.yml", project_name));
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => {
                        log::info!("Loaded config from {}", user_config.display());
                        return Ok(config);
                    }
                    Err(e) => {
                        log::warn!("Failed to load {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;
        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.projects_dir.as_os_str().is_empty() {
            eyre::bail!("projects-dir must not be empty");
        }
        if self.kits_dir.as_os_str().is_empty() {
            eyre::bail!("kits-dir must not be empty");
        }
        if self.python.trim().is_empty() {
            eyre::bail!("python must not be empty");
        }
        Ok(())
    }

    /// Kit selection from config plus per-invocation additions and removals
    pub fn kit_selection(&self, enable: &[String], disable: &[String]) -> KitSelection {
        let default_kit = Some(self.default_kit.clone()).filter(|k| !k.is_empty());
        KitSelection {
            default_kit,
            enable: self.enabled_kits.iter().chain(enable).cloned().collect(),
            disable: self.disabled_kits.iter().chain(disable).cloned().collect(),
        }
    }
}
