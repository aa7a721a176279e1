//! Embedded execution - loading a tool's code as a callable unit
//!
//! The dispatcher never knows how an embedded tool is loaded. It asks an
//! [`EmbeddedLoader`] for something that implements [`Invoke`] and calls it.

use std::collections::HashMap;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::rc::Rc;

use thiserror::Error;

use crate::manifest::Manifest;

use super::process::{CALLER_CWD_ENV, TOOL_ENV, exit_code};

/// An unhandled failure inside an embedded tool
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ToolFault(pub String);

/// Outcome of an embedded call: `Some(code)` for an integer result, `None` otherwise
pub type InvokeResult = std::result::Result<Option<i32>, ToolFault>;

/// A loaded unit of tool code that can be called with an argument vector
pub trait Invoke {
    fn invoke(&self, argv: &[OsString]) -> InvokeResult;
}

impl<F> Invoke for F
where
    F: Fn(&[OsString]) -> InvokeResult,
{
    fn invoke(&self, argv: &[OsString]) -> InvokeResult {
        self(argv)
    }
}

/// Turns an embedded runtime descriptor into an [`Invoke`]
pub trait EmbeddedLoader {
    /// Load `script` and locate `entry_point` in it
    fn load(&self, manifest: &Manifest, script: &Path, entry_point: &str) -> Result<Box<dyn Invoke>, ToolFault>;
}

type UnitFn = dyn Fn(&[OsString]) -> InvokeResult;

/// Loader for Rust functions registered in-process, keyed by tool and entry symbol
#[derive(Default)]
pub struct InProcessLoader {
    units: HashMap<(String, String), Rc<UnitFn>>,
}

impl InProcessLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `f` as `entry_point` of the tool named `tool`
    pub fn register<F>(mut self, tool: impl Into<String>, entry_point: impl Into<String>, f: F) -> Self
    where
        F: Fn(&[OsString]) -> InvokeResult + 'static,
    {
        self.units.insert((tool.into(), entry_point.into()), Rc::new(f));
        self
    }
}

struct SharedUnit(Rc<UnitFn>);

impl Invoke for SharedUnit {
    fn invoke(&self, argv: &[OsString]) -> InvokeResult {
        (self.0)(argv)
    }
}

impl EmbeddedLoader for InProcessLoader {
    fn load(&self, manifest: &Manifest, script: &Path, entry_point: &str) -> Result<Box<dyn Invoke>, ToolFault> {
        let key = (manifest.name.clone(), entry_point.to_string());
        let unit = self
            .units
            .get(&key)
            .ok_or_else(|| ToolFault(format!("{} has no '{}' function", script.display(), entry_point)))?;
        Ok(Box::new(SharedUnit(Rc::clone(unit))))
    }
}

/// Python interpreter used when nothing else is configured
pub fn default_python() -> &'static str {
    if cfg!(windows) { "python" } else { "python3" }
}

/// Imports the tool's script as a module, finds the entry symbol and calls it.
///
/// argv: `[script, entry_point, tool_name, fault_file, tool args...]`. An
/// unhandled exception or a missing entry symbol is written to `fault_file`
/// as well as stderr.
const BOOTSTRAP: &str = r#"
import importlib.util, inspect, os, sys, traceback

_FAULT_FILE = sys.argv[4]

def _report_fault(text):
    sys.stderr.write(text if text.endswith("\n") else text + "\n")
    try:
        with open(_FAULT_FILE, "w") as f:
            f.write(text)
    except OSError:
        pass

def _accepts_args(func):
    try:
        params = [p for p in inspect.signature(func).parameters.values() if p.name != "self"]
    except (TypeError, ValueError):
        return False
    return len(params) > 0

def _run():
    script, entry, tool = sys.argv[1:4]
    argv = sys.argv[5:]
    module_dir = os.path.dirname(os.path.abspath(script))
    if module_dir not in sys.path:
        sys.path.insert(0, module_dir)
    name = os.path.splitext(os.path.basename(script))[0]
    spec = importlib.util.spec_from_file_location(name, script)
    module = importlib.util.module_from_spec(spec)
    sys.modules[name] = module
    spec.loader.exec_module(module)
    func = getattr(module, entry, None)
    if func is None:
        _report_fault("%s has no '%s' function" % (script, entry))
        return 1
    sys.argv = [tool] + argv
    result = func(argv) if _accepts_args(func) else func()
    if isinstance(result, int):
        return int(result)
    return 0

try:
    code = _run()
except KeyboardInterrupt:
    code = 130
except SystemExit:
    raise
except Exception:
    _report_fault(traceback.format_exc())
    code = 1
sys.exit(code)
"#;

/// File name of the fault report inside the per-call scratch directory
const FAULT_FILE: &str = "fault.txt";

/// Loader that hosts embedded Python tools in an interpreter.
///
/// The entry symbol's integer result becomes the exit status. An uncaught
/// exception prints its traceback on stderr and comes back as a [`ToolFault`]
/// carrying the same traceback.
#[derive(Debug, Clone)]
pub struct PythonBridge {
    interpreter: String,
    caller_cwd: Option<PathBuf>,
}

impl PythonBridge {
    pub fn new(interpreter: impl Into<String>) -> Self {
        Self {
            interpreter: interpreter.into(),
            caller_cwd: std::env::current_dir().ok(),
        }
    }
}

impl Default for PythonBridge {
    fn default() -> Self {
        Self::new(default_python())
    }
}

impl EmbeddedLoader for PythonBridge {
    fn load(&self, manifest: &Manifest, script: &Path, entry_point: &str) -> Result<Box<dyn Invoke>, ToolFault> {
        Ok(Box::new(PythonUnit {
            interpreter: self.interpreter.clone(),
            caller_cwd: self.caller_cwd.clone(),
            script: script.to_path_buf(),
            entry_point: entry_point.to_string(),
            tool: manifest.name.clone(),
            dir: manifest.dir.clone(),
        }))
    }
}

struct PythonUnit {
    interpreter: String,
    caller_cwd: Option<PathBuf>,
    script: PathBuf,
    entry_point: String,
    tool: String,
    dir: PathBuf,
}

impl Invoke for PythonUnit {
    fn invoke(&self, argv: &[OsString]) -> InvokeResult {
        let scratch = tempfile::Builder::new()
            .prefix("kitcmd-")
            .tempdir()
            .map_err(|e| ToolFault(format!("cannot create scratch directory: {}", e)))?;
        let fault_file = scratch.path().join(FAULT_FILE);

        let mut cmd = Command::new(&self.interpreter);
        cmd.arg("-c")
            .arg(BOOTSTRAP)
            .arg(&self.script)
            .arg(&self.entry_point)
            .arg(&self.tool)
            .arg(&fault_file)
            .args(argv)
            .current_dir(&self.dir)
            .env(TOOL_ENV, &self.tool);
        if let Some(cwd) = &self.caller_cwd {
            cmd.env(CALLER_CWD_ENV, cwd);
        }

        let status = cmd
            .status()
            .map_err(|e| ToolFault(format!("failed to start {}: {}", self.interpreter, e)))?;

        // Only written when the entry point faulted
        let fault = fs::read_to_string(&fault_file).unwrap_or_default();
        if !fault.trim().is_empty() {
            return Err(ToolFault(fault.trim_end().to_string()));
        }
        Ok(Some(exit_code(status)))
    }
}
