//! Registry - the read-only command table dispatch works from
//!
//! Built once per process from scanned manifests, kit activation and the
//! host platform. Holds inactive tools too, so dispatch can tell "not
//! active" apart from "unknown".

mod entry;
mod suggest;

use std::collections::HashMap;

use crate::error::{KitcmdError, Result, Warning};
use crate::kits::Activation;
use crate::manifest::{Manifest, Os};

pub use entry::{Entry, KitMember, KitSummary, ListFilter};
pub use suggest::{MAX_SUGGESTION_DISTANCE, edit_distance, suggest};

/// Command names owned by the dispatcher itself; tools may not use them
pub const RESERVED_NAMES: &[&str] = &["list", "info", "kit", "version", "help"];

/// Resolved command table
#[derive(Debug)]
pub struct Registry {
    tools: HashMap<String, Entry>,
    activation: Activation,
    host: Os,
}

impl Registry {
    /// Assemble the command table.
    ///
    /// Fails with `NameCollision` when two active manifests share a name. An
    /// inactive manifest never collides: it yields to an active one and is
    /// otherwise kept only if it is the first with its name.
    pub fn build(manifests: Vec<Manifest>, activation: Activation, host: Os) -> Result<(Self, Vec<Warning>)> {
        let mut tools: HashMap<String, Entry> = HashMap::new();
        let mut warnings = Vec::new();

        for manifest in manifests {
            if RESERVED_NAMES.contains(&manifest.name.as_str()) {
                let reason = format!("'{}' is a reserved command name", manifest.name);
                log::warn!("{}: {}", manifest.source.display(), reason);
                warnings.push(Warning::at(
                    &manifest.source,
                    KitcmdError::ManifestValidation {
                        path: manifest.source.clone(),
                        reason,
                    },
                ));
                continue;
            }

            let entry = Entry {
                active: activation.is_tool_active(&manifest.namespace, &manifest.name),
                platform_compatible: manifest.is_compatible_with(&host),
                kits: activation.covering_kits(&manifest.namespace, &manifest.name),
                manifest,
            };

            match tools.get(entry.name()) {
                Some(existing) if existing.active && entry.active => {
                    return Err(KitcmdError::NameCollision {
                        name: entry.name().to_string(),
                        first: existing.manifest.source.clone(),
                        second: entry.manifest.source.clone(),
                    });
                }
                Some(existing) if existing.active || !entry.active => {
                    log::debug!(
                        "Inactive {} shadowed by {}",
                        entry.manifest.qualified_name(),
                        existing.manifest.qualified_name()
                    );
                }
                _ => {
                    tools.insert(entry.name().to_string(), entry);
                }
            }
        }

        let active = tools.values().filter(|e| e.active).count();
        log::info!("Registry built: {} tool(s), {} active, host {}", tools.len(), active, host);
        Ok((Self { tools, activation, host }, warnings))
    }

    /// Look up a tool by name, active or not
    pub fn get(&self, name: &str) -> Option<&Entry> {
        self.tools.get(name)
    }

    /// Active tools matching `filter`, ordered by namespace then name
    pub fn list(&self, filter: &ListFilter) -> Vec<&Entry> {
        let mut entries: Vec<&Entry> = self.tools.values().filter(|e| filter.matches(e)).collect();
        entries.sort_by_key(|e| e.sort_key());
        entries
    }

    /// Summaries of every known kit
    pub fn all_kits(&self) -> Vec<KitSummary> {
        self.activation
            .kits()
            .iter()
            .map(|kit| KitSummary {
                name: kit.name.clone(),
                description: kit.description.clone(),
                tool_count: kit.tools.len(),
                active: self.activation.is_kit_active(&kit.name),
                pinned: self.activation.is_kit_pinned(&kit.name),
            })
            .collect()
    }

    /// Resolve one kit's references against the table; `None` for an unknown kit
    pub fn kit_members(&self, kit_name: &str) -> Option<Vec<KitMember<'_>>> {
        let kit = self.activation.kit(kit_name)?;
        let mut members = Vec::new();

        for reference in &kit.tools {
            let mut matched: Vec<&Entry> = self
                .tools
                .values()
                .filter(|e| reference.matches(e.namespace(), e.name()))
                .collect();
            matched.sort_by_key(|e| e.sort_key());

            if matched.is_empty() {
                members.push(KitMember {
                    reference: reference.to_string(),
                    entry: None,
                });
            }
            for entry in matched {
                members.push(KitMember {
                    reference: reference.to_string(),
                    entry: Some(entry),
                });
            }
        }
        Some(members)
    }

    /// Active tool names close to `name`
    pub fn suggestions(&self, name: &str) -> Vec<String> {
        suggest(name, self.tools.values().filter(|e| e.active).map(|e| e.name()))
    }

    pub fn activation(&self) -> &Activation {
        &self.activation
    }

    pub fn host(&self) -> &Os {
        &self.host
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
