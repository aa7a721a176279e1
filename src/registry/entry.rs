//! Registry entries and the views built from them

use crate::manifest::{Manifest, platform};

/// A discovered tool annotated with its activation and platform state
#[derive(Debug, Clone)]
pub struct Entry {
    pub manifest: Manifest,
    /// Covered by at least one active kit
    pub active: bool,
    /// Runs on the current host
    pub platform_compatible: bool,
    /// Every kit that references this tool, active or not
    pub kits: Vec<String>,
}

impl Entry {
    pub fn name(&self) -> &str {
        &self.manifest.name
    }

    pub fn namespace(&self) -> &str {
        &self.manifest.namespace
    }

    /// Sort key: namespace, then name, case-insensitive
    pub(crate) fn sort_key(&self) -> (String, String) {
        (self.namespace().to_lowercase(), self.name().to_lowercase())
    }
}

/// Filters for `list`
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    pub namespace: Option<String>,
    pub kit: Option<String>,
    pub tag: Option<String>,
    /// Coarse platform category, matched against the manifest's `platform`
    pub platform: Option<String>,
    /// Also list active tools that cannot run on this host
    pub include_incompatible: bool,
}

impl ListFilter {
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn kit(mut self, kit: impl Into<String>) -> Self {
        self.kit = Some(kit.into());
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }

    pub fn include_incompatible(mut self, include: bool) -> Self {
        self.include_incompatible = include;
        self
    }

    pub(crate) fn matches(&self, entry: &Entry) -> bool {
        if !entry.active {
            return false;
        }
        if !self.include_incompatible && !entry.platform_compatible {
            return false;
        }
        if let Some(ns) = &self.namespace
            && !entry.namespace().eq_ignore_ascii_case(ns)
        {
            return false;
        }
        if let Some(kit) = &self.kit
            && !entry.kits.iter().any(|k| k == kit)
        {
            return false;
        }
        if let Some(tag) = &self.tag
            && !entry.manifest.taxonomy.has_tag(tag)
        {
            return false;
        }
        if let Some(wanted) = &self.platform {
            let wanted = wanted.to_lowercase();
            if !platform::platform_parts(&entry.manifest.platform).contains(&wanted) {
                return false;
            }
        }
        true
    }
}

/// One line of `kit list`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KitSummary {
    pub name: String,
    pub description: String,
    /// Number of references in the kit file
    pub tool_count: usize,
    pub active: bool,
    /// Active regardless of selection (core, default, `always_active`)
    pub pinned: bool,
}

/// One resolved reference of `kit list <kit>`
#[derive(Debug, Clone)]
pub struct KitMember<'a> {
    /// The reference as written in the kit file
    pub reference: String,
    /// Matching tool, `None` when nothing was discovered for the reference
    pub entry: Option<&'a Entry>,
}
