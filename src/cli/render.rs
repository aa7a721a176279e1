//! Terminal output for the built-in commands

use colored::*;
use std::fmt::Write;

use kitcmd::error::Warning;
use kitcmd::registry::{Entry, KitMember, KitSummary, Registry};

/// Tools grouped under a namespace heading
pub fn tool_list(entries: &[&Entry]) -> String {
    if entries.is_empty() {
        return format!("{}\n", "No tools found".yellow());
    }

    let width = entries.iter().map(|e| e.name().len()).max().unwrap_or(0);
    let mut out = String::new();
    let mut current_ns: Option<&str> = None;

    for entry in entries {
        if current_ns != Some(entry.namespace()) {
            if current_ns.is_some() {
                out.push('\n');
            }
            let _ = writeln!(out, "{}", entry.namespace().cyan().bold());
            current_ns = Some(entry.namespace());
        }
        let name = format!("{:<width$}", entry.name(), width = width);
        let mut line = format!("  {}  {}", name.green(), entry.manifest.description);
        if !entry.platform_compatible {
            let _ = write!(line, " {}", format!("[{}]", entry.manifest.platform).red());
        }
        let _ = writeln!(out, "{}", line);
    }

    let _ = writeln!(out, "\n{} tool(s)", entries.len());
    out
}

/// Everything known about one tool
pub fn tool_info(entry: &Entry) -> String {
    let m = &entry.manifest;
    let mut out = String::new();

    let _ = writeln!(out, "{} {}", m.qualified_name().green().bold(), m.version.dimmed());
    if !m.description.is_empty() {
        let _ = writeln!(out, "  {}", m.description);
    }
    let _ = writeln!(out);

    let mut field = |label: &str, value: String| {
        let _ = writeln!(out, "  {:<11} {}", format!("{}:", label).bold(), value);
    };
    field("Language", m.language.clone());
    field("Platform", m.platform.clone());
    if !m.platforms.is_empty() {
        field("Platforms", m.platforms.join(", "));
    }
    field("Runtime", m.runtime.to_string());
    field("Target", m.target_path().display().to_string());
    if !m.taxonomy.category.is_empty() {
        field("Category", m.taxonomy.category.clone());
    }
    if !m.taxonomy.tags.is_empty() {
        field("Tags", m.taxonomy.tags.join(", "));
    }
    field("Kits", if entry.kits.is_empty() { "-".to_string() } else { entry.kits.join(", ") });
    field("Active", yes_no(entry.active));
    field("Compatible", yes_no(entry.platform_compatible));
    let source = if m.cached {
        format!("{} (cached)", m.source.display())
    } else {
        m.source.display().to_string()
    };
    field("Source", source);

    out
}

/// Every known kit with its state
pub fn kit_list(kits: &[KitSummary]) -> String {
    if kits.is_empty() {
        return format!("{}\n", "No kits found".yellow());
    }

    let width = kits.iter().map(|k| k.name.len()).max().unwrap_or(0);
    let mut out = String::new();
    for kit in kits {
        let name = format!("{:<width$}", kit.name, width = width);
        let state = if kit.pinned {
            "always".cyan()
        } else if kit.active {
            "active".green()
        } else {
            "off".dimmed()
        };
        let _ = writeln!(
            out,
            "  {}  {:>3} tool(s)  {:<6}  {}",
            name.bold(),
            kit.tool_count,
            state,
            kit.description
        );
    }
    out
}

/// One kit's references and what they resolved to
pub fn kit_members(kit: &str, members: &[KitMember<'_>]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", kit.cyan().bold());
    if members.is_empty() {
        let _ = writeln!(out, "  {}", "(empty)".dimmed());
    }
    for member in members {
        match member.entry {
            Some(entry) => {
                let marker = if entry.active { "+".green() } else { "-".dimmed() };
                let mut line = format!("  {} {}  {}", marker, entry.manifest.qualified_name(), entry.manifest.description);
                if !entry.platform_compatible {
                    let _ = write!(line, " {}", "[incompatible]".red());
                }
                let _ = writeln!(out, "{}", line);
            }
            None => {
                let _ = writeln!(out, "  {} {}  {}", "?".red(), member.reference, "not found".red());
            }
        }
    }
    out
}

/// Active kits and how many discovered tools each contributes
pub fn kit_status(registry: &Registry) -> String {
    let activation = registry.activation();
    let active = activation.active_kits();
    if active.is_empty() {
        return format!("{}\n", "No active kits".yellow());
    }

    let width = active.iter().map(|k| k.len()).max().unwrap_or(0);
    let mut out = format!("{}\n", "Active kits:".bold());
    for kit in active {
        let tools = registry
            .kit_members(kit)
            .map(|members| members.iter().filter(|m| m.entry.is_some()).count())
            .unwrap_or(0);
        let pinned = if activation.is_kit_pinned(kit) {
            " (always active)".dimmed().to_string()
        } else {
            String::new()
        };
        let name = format!("{:<width$}", kit, width = width);
        let _ = writeln!(out, "  {}  {} tool(s){}", name.green(), tools, pinned);
    }
    out
}

/// A discovery warning, prefixed by the file it came from
pub fn warning(warning: &Warning) -> String {
    match &warning.path {
        Some(path) => format!("{} {}: {}", "warning:".yellow().bold(), path.display(), warning),
        None => format!("{} {}", "warning:".yellow().bold(), warning),
    }
}

fn yes_no(value: bool) -> String {
    if value { "yes".green().to_string() } else { "no".red().to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kitcmd::error::KitcmdError;
    use kitcmd::kits::{Kit, KitResolver, KitSelection};
    use kitcmd::manifest::{Manifest, Os, Runtime, Taxonomy};
    use kitcmd::registry::ListFilter;
    use std::path::{Path, PathBuf};

    fn manifest(namespace: &str, name: &str, platforms: &[&str]) -> Manifest {
        let dir = PathBuf::from(format!("/p/projects/{}/{}", namespace, name));
        Manifest {
            name: name.to_string(),
            version: "1.2.0".to_string(),
            description: format!("{} things", name),
            namespace: namespace.to_string(),
            language: "shell".to_string(),
            platform: "linux".to_string(),
            platforms: platforms.iter().map(|s| s.to_string()).collect(),
            runtime: Runtime::Shell {
                script_path: PathBuf::from("run.sh"),
                shell: "bash".to_string(),
            },
            taxonomy: Taxonomy {
                category: "text".to_string(),
                tags: vec!["files".to_string()],
            },
            source: dir.join(".kitcmd.json"),
            dir,
            cached: false,
        }
    }

    fn registry() -> Registry {
        let core = Kit::from_json(
            r#"{"name": "core", "tools": ["core:*", "core:gone"]}"#,
            Path::new("kits/core.kit.json"),
        )
        .unwrap();
        let extras = Kit::from_json(
            r#"{"name": "extras", "description": "Extra bits", "tools": ["extras:*"]}"#,
            Path::new("kits/extras.kit.json"),
        )
        .unwrap();
        let (activation, _) = KitResolver::new(vec![core, extras]).resolve(&KitSelection::default());
        let manifests = vec![
            manifest("core", "rn", &[]),
            manifest("core", "winreg", &["windows"]),
            manifest("extras", "hidden", &[]),
        ];
        Registry::build(manifests, activation, Os::Linux).unwrap().0
    }

    #[test]
    fn test_tool_list_groups_by_namespace() {
        let reg = registry();
        let entries = reg.list(&ListFilter::default().include_incompatible(true));
        let out = tool_list(&entries);
        assert!(out.contains("core"));
        assert!(out.contains("rn"));
        assert!(out.contains("winreg"));
        assert!(out.contains("2 tool(s)"));
        assert!(!out.contains("hidden"));
    }

    #[test]
    fn test_tool_list_empty() {
        assert!(tool_list(&[]).contains("No tools found"));
    }

    #[test]
    fn test_tool_info_fields() {
        let reg = registry();
        let out = tool_info(reg.get("winreg").unwrap());
        assert!(out.contains("core:winreg"));
        assert!(out.contains("windows"));
        assert!(out.contains("shell (bash)"));
        assert!(out.contains("/p/projects/core/winreg/run.sh"));
        assert!(out.contains("files"));
    }

    #[test]
    fn test_kit_list_and_members() {
        let reg = registry();
        let out = kit_list(&reg.all_kits());
        assert!(out.contains("core"));
        assert!(out.contains("Extra bits"));

        let members = reg.kit_members("core").unwrap();
        let out = kit_members("core", &members);
        assert!(out.contains("core:rn"));
        assert!(out.contains("core:gone"));
        assert!(out.contains("not found"));
        assert!(out.contains("[incompatible]"));
    }

    #[test]
    fn test_kit_status_counts_discovered_tools() {
        let out = kit_status(&registry());
        assert!(out.contains("core"));
        assert!(out.contains("2 tool(s)"));
        assert!(!out.contains("extras"));
    }

    #[test]
    fn test_warning_includes_path() {
        let w = Warning::at("/p/projects/core/bad/.kitcmd.json", KitcmdError::UnknownKit("media".to_string()));
        let out = warning(&w);
        assert!(out.contains("/p/projects/core/bad/.kitcmd.json"));
        assert!(out.contains("Unknown kit: media"));
    }
}
