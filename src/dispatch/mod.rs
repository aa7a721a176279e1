//! Dispatcher - runs one registry entry with a raw argument vector
//!
//! Exactly one execution per call: an embedded invocation or one child
//! process. No retries, and no fallback from one strategy to another.

mod embedded;
mod process;

use std::any::Any;
use std::ffi::OsString;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use crate::error::{KitcmdError, Result};
use crate::manifest::Runtime;
use crate::registry::{Entry, Registry};

pub use embedded::{
    EmbeddedLoader, InProcessLoader, Invoke, InvokeResult, PythonBridge, ToolFault, default_python,
};
pub use process::{CALLER_CWD_ENV, TOOL_ENV, build_command, exit_code};

/// Executes tools from a registry
pub struct Dispatcher<'r> {
    registry: &'r Registry,
    /// Embedded loader; a [`PythonBridge`] on `python` when unset
    loader: Option<Box<dyn EmbeddedLoader>>,
    python: String,
    caller_cwd: Option<PathBuf>,
}

impl<'r> Dispatcher<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self {
            registry,
            loader: None,
            python: default_python().to_string(),
            caller_cwd: std::env::current_dir().ok(),
        }
    }

    /// Interpreter for pass-through tools, and for embedded tools unless a loader is set
    pub fn with_python(mut self, python: impl Into<String>) -> Self {
        self.python = python.into();
        self
    }

    /// Replace how embedded tools are loaded
    pub fn with_loader(mut self, loader: impl EmbeddedLoader + 'static) -> Self {
        self.loader = Some(Box::new(loader));
        self
    }

    /// Check a tool can be dispatched: known, active and built for this host
    pub fn resolve(&self, tool_name: &str) -> Result<&'r Entry> {
        let registry = self.registry;
        let entry = registry.get(tool_name).ok_or_else(|| KitcmdError::UnknownTool {
            name: tool_name.to_string(),
            suggestions: registry.suggestions(tool_name),
        })?;

        if !entry.active {
            return Err(KitcmdError::ToolNotActive {
                name: tool_name.to_string(),
                kits: entry.kits.clone(),
            });
        }

        if !entry.platform_compatible {
            return Err(KitcmdError::PlatformMismatch {
                name: tool_name.to_string(),
                declared: entry.manifest.declared_platforms(),
                host: registry.host().to_string(),
            });
        }

        Ok(entry)
    }

    /// Run `tool_name` with `argv`, returning the exit code to report.
    ///
    /// Child exit codes come back unchanged, whatever their value.
    pub fn dispatch(&self, tool_name: &str, argv: &[OsString]) -> Result<i32> {
        let entry = self.resolve(tool_name)?;
        let manifest = &entry.manifest;

        let target = manifest.target_path();
        if !target.is_file() {
            return Err(KitcmdError::ToolExecution {
                name: manifest.name.clone(),
                reason: format!("target not found: {}", target.display()),
            });
        }

        log::info!("Dispatching {} via {} with {} arg(s)", manifest.qualified_name(), manifest.runtime, argv.len());

        match &manifest.runtime {
            Runtime::Embedded { entry_point, .. } => self.invoke_embedded(entry, &target, entry_point, argv),
            runtime => self.spawn(entry, runtime, argv),
        }
    }

    fn invoke_embedded(&self, entry: &Entry, script: &Path, entry_point: &str, argv: &[OsString]) -> Result<i32> {
        let fault = |reason: String| KitcmdError::ToolExecution {
            name: entry.manifest.name.clone(),
            reason,
        };

        let loaded = match &self.loader {
            Some(loader) => loader.load(&entry.manifest, script, entry_point),
            None => PythonBridge::new(self.python.clone()).load(&entry.manifest, script, entry_point),
        };
        let unit = loaded.map_err(|e| fault(e.to_string()))?;

        match panic::catch_unwind(AssertUnwindSafe(|| unit.invoke(argv))) {
            Ok(Ok(code)) => {
                let code = code.unwrap_or(0);
                log::info!("{} returned {}", entry.name(), code);
                Ok(code)
            }
            Ok(Err(e)) => Err(fault(e.to_string())),
            Err(payload) => Err(fault(panic_message(payload.as_ref()))),
        }
    }

    fn spawn(&self, entry: &Entry, runtime: &Runtime, argv: &[OsString]) -> Result<i32> {
        let manifest = &entry.manifest;
        let Some(cmd) = build_command(runtime, &manifest.dir, &self.python) else {
            return Err(KitcmdError::ToolExecution {
                name: manifest.name.clone(),
                reason: format!("runtime {} cannot run as a subprocess", runtime),
            });
        };
        let program = cmd.get_program().to_string_lossy().to_string();

        let status = process::run_foreground(cmd, argv, &manifest.dir, &manifest.name, self.caller_cwd.as_deref())
            .map_err(|e| KitcmdError::ToolExecution {
                name: manifest.name.clone(),
                reason: format!("failed to start {}: {}", program, e),
            })?;

        let code = exit_code(status);
        log::info!("{} exited with {}", manifest.name, code);
        Ok(code)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "tool panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kits::{Kit, KitResolver, KitSelection};
    use crate::manifest::{Manifest, Os, Taxonomy};
    use std::cell::Cell;
    use std::rc::Rc;
    use tempfile::TempDir;

    fn manifest(dir: &Path, name: &str, runtime: Runtime, platforms: &[&str]) -> Manifest {
        Manifest {
            name: name.to_string(),
            version: "1.0.0".to_string(),
            description: String::new(),
            namespace: "demo".to_string(),
            language: "python".to_string(),
            platform: "cross-platform".to_string(),
            platforms: platforms.iter().map(|s| s.to_string()).collect(),
            runtime,
            taxonomy: Taxonomy::default(),
            dir: dir.to_path_buf(),
            source: dir.join(".kitcmd.json"),
            cached: false,
        }
    }

    fn embedded(script: &str) -> Runtime {
        Runtime::Embedded {
            script_path: PathBuf::from(script),
            entry_point: "main".to_string(),
        }
    }

    fn registry(manifests: Vec<Manifest>, kit_tools: &str) -> Registry {
        let kit = Kit::from_json(
            &serde_json::json!({"name": "core", "tools": kit_tools.split(',').collect::<Vec<_>>()}).to_string(),
            Path::new("kits/core.kit.json"),
        )
        .unwrap();
        let (activation, _) = KitResolver::new(vec![kit]).resolve(&KitSelection::default());
        Registry::build(manifests, activation, Os::Linux).unwrap().0
    }

    fn args(items: &[&str]) -> Vec<OsString> {
        items.iter().map(OsString::from).collect()
    }

    #[test]
    fn test_unknown_tool_with_suggestions() {
        let temp = TempDir::new().unwrap();
        let reg = registry(vec![manifest(temp.path(), "split", embedded("split.py"), &[])], "demo:*");
        let err = Dispatcher::new(&reg).dispatch("splt", &[]).unwrap_err();
        match err {
            KitcmdError::UnknownTool { name, suggestions } => {
                assert_eq!(name, "splt");
                assert_eq!(suggestions, vec!["split"]);
            }
            other => panic!("Expected UnknownTool, got {:?}", other),
        }

        let err = Dispatcher::new(&reg).dispatch("zzzzzz", &[]).unwrap_err();
        assert!(matches!(err, KitcmdError::UnknownTool { suggestions, .. } if suggestions.is_empty()));
    }

    #[test]
    fn test_inactive_tool_refused() {
        let temp = TempDir::new().unwrap();
        let reg = registry(vec![manifest(temp.path(), "split", embedded("split.py"), &[])], "other:*");
        let err = Dispatcher::new(&reg).dispatch("split", &[]).unwrap_err();
        assert!(matches!(err, KitcmdError::ToolNotActive { .. }));
    }

    #[test]
    fn test_platform_mismatch_never_invokes() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("split.py"), "").unwrap();
        let reg = registry(
            vec![manifest(temp.path(), "split", embedded("split.py"), &["windows"])],
            "demo:*",
        );
        let called = Rc::new(Cell::new(false));
        let seen = Rc::clone(&called);
        let loader = InProcessLoader::new().register("split", "main", move |_: &[OsString]| {
            seen.set(true);
            Ok(None)
        });

        let err = Dispatcher::new(&reg).with_loader(loader).dispatch("split", &[]).unwrap_err();
        match err {
            KitcmdError::PlatformMismatch { declared, host, .. } => {
                assert_eq!(declared, vec!["windows"]);
                assert_eq!(host, "linux");
            }
            other => panic!("Expected PlatformMismatch, got {:?}", other),
        }
        assert!(!called.get());
    }

    #[test]
    fn test_missing_target_is_execution_error() {
        let temp = TempDir::new().unwrap();
        let reg = registry(vec![manifest(temp.path(), "split", embedded("split.py"), &[])], "demo:*");
        let err = Dispatcher::new(&reg).dispatch("split", &[]).unwrap_err();
        assert!(matches!(err, KitcmdError::ToolExecution { reason, .. } if reason.contains("target not found")));
    }

    #[test]
    fn test_embedded_return_value_is_exit_code() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("split.py"), "").unwrap();
        let reg = registry(vec![manifest(temp.path(), "split", embedded("split.py"), &[])], "demo:*");
        let loader = InProcessLoader::new().register("split", "main", |argv: &[OsString]| Ok(Some(argv.len() as i32)));

        let code = Dispatcher::new(&reg)
            .with_loader(loader)
            .dispatch("split", &args(&["a", "b", "c"]))
            .unwrap();
        assert_eq!(code, 3);
    }

    #[test]
    fn test_with_python_keeps_custom_loader() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("split.py"), "").unwrap();
        let reg = registry(vec![manifest(temp.path(), "split", embedded("split.py"), &[])], "demo:*");
        let loader = InProcessLoader::new().register("split", "main", |_: &[OsString]| Ok(Some(4)));

        let code = Dispatcher::new(&reg)
            .with_loader(loader)
            .with_python("no-such-python")
            .dispatch("split", &[])
            .unwrap();
        assert_eq!(code, 4);
    }

    #[test]
    fn test_embedded_non_integer_result_is_success() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("split.py"), "").unwrap();
        let reg = registry(vec![manifest(temp.path(), "split", embedded("split.py"), &[])], "demo:*");
        let loader = InProcessLoader::new().register("split", "main", |_: &[OsString]| Ok(None));
        assert_eq!(Dispatcher::new(&reg).with_loader(loader).dispatch("split", &[]).unwrap(), 0);
    }

    #[test]
    fn test_embedded_fault_surfaces_original_message() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("split.py"), "").unwrap();
        let reg = registry(vec![manifest(temp.path(), "split", embedded("split.py"), &[])], "demo:*");
        let loader = InProcessLoader::new().register("split", "main", |_: &[OsString]| {
            Err(ToolFault("ValueError: bad chunk size".to_string()))
        });

        let err = Dispatcher::new(&reg).with_loader(loader).dispatch("split", &[]).unwrap_err();
        assert!(err.to_string().contains("ValueError: bad chunk size"));
        assert_ne!(err.exit_code(), 0);
    }

    #[test]
    fn test_embedded_panic_is_caught() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("split.py"), "").unwrap();
        let reg = registry(vec![manifest(temp.path(), "split", embedded("split.py"), &[])], "demo:*");
        let loader = InProcessLoader::new().register("split", "main", |_: &[OsString]| -> InvokeResult {
            panic!("index out of range")
        });

        let err = Dispatcher::new(&reg).with_loader(loader).dispatch("split", &[]).unwrap_err();
        assert!(matches!(err, KitcmdError::ToolExecution { reason, .. } if reason.contains("index out of range")));
    }

    #[test]
    fn test_embedded_missing_entry_point() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("split.py"), "").unwrap();
        let reg = registry(vec![manifest(temp.path(), "split", embedded("split.py"), &[])], "demo:*");
        let loader = InProcessLoader::new().register("split", "run", |_: &[OsString]| Ok(None));

        let err = Dispatcher::new(&reg).with_loader(loader).dispatch("split", &[]).unwrap_err();
        assert!(err.to_string().contains("has no 'main' function"));
    }

    #[cfg(unix)]
    #[test]
    fn test_shell_exit_code_and_raw_args() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("run.sh"),
            "[ \"$1\" = \"--help\" ] && [ \"$2\" = \"-x y\" ] && exit 7\nexit 1\n",
        )
        .unwrap();
        let rt = Runtime::Shell {
            script_path: PathBuf::from("run.sh"),
            shell: "sh".to_string(),
        };
        let reg = registry(vec![manifest(temp.path(), "runner", rt, &[])], "demo:*");

        let code = Dispatcher::new(&reg).dispatch("runner", &args(&["--help", "-x y"])).unwrap();
        assert_eq!(code, 7);
    }

    #[cfg(unix)]
    #[test]
    fn test_binary_spawn_failure_is_execution_error() {
        let temp = TempDir::new().unwrap();
        // Not executable, so spawning fails
        std::fs::write(temp.path().join("tool"), "not a program").unwrap();
        let rt = Runtime::Binary {
            path: PathBuf::from("tool"),
        };
        let reg = registry(vec![manifest(temp.path(), "tool", rt, &[])], "demo:*");

        let err = Dispatcher::new(&reg).dispatch("tool", &[]).unwrap_err();
        assert!(matches!(err, KitcmdError::ToolExecution { reason, .. } if reason.contains("failed to start")));
    }

    #[test]
    fn test_panic_message_variants() {
        let owned: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(owned.as_ref()), "owned");
        let other: Box<dyn Any + Send> = Box::new(42);
        assert_eq!(panic_message(other.as_ref()), "tool panicked");
    }
}
