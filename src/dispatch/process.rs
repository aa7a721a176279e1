//! Subprocess execution for pass-through, shell, script and binary runtimes

use std::ffi::OsString;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};

use crate::manifest::Runtime;

/// Directory the dispatcher was invoked from, exported to every tool
pub const CALLER_CWD_ENV: &str = "KITCMD_CALLER_CWD";

/// Name of the tool being run, exported to every tool
pub const TOOL_ENV: &str = "KITCMD_TOOL";

/// Build the child command for a subprocess runtime; `None` for embedded runtimes
pub fn build_command(runtime: &Runtime, dir: &Path, python: &str) -> Option<Command> {
    let cmd = match runtime {
        Runtime::Embedded { .. } => return None,
        Runtime::PassThrough {
            script_path,
            interpreter,
        } => {
            let mut cmd = Command::new(interpreter.as_deref().unwrap_or(python));
            cmd.arg(dir.join(script_path));
            cmd
        }
        Runtime::Shell { script_path, shell } => {
            let script = dir.join(script_path);
            match shell.as_str() {
                "cmd" => {
                    let mut cmd = Command::new("cmd");
                    cmd.arg("/c").arg(script);
                    cmd
                }
                "pwsh" | "powershell" => {
                    let mut cmd = Command::new("pwsh");
                    cmd.arg("-File").arg(script);
                    cmd
                }
                other => {
                    let mut cmd = Command::new(other);
                    cmd.arg(script);
                    cmd
                }
            }
        }
        Runtime::Script {
            script_path,
            interpreter,
        } => {
            let mut cmd = Command::new(interpreter);
            cmd.arg(dir.join(script_path));
            cmd
        }
        Runtime::Binary { path } => Command::new(dir.join(path)),
    };
    Some(cmd)
}

/// Run `cmd` in the foreground with inherited stdio and wait for it
pub fn run_foreground(
    mut cmd: Command,
    argv: &[OsString],
    dir: &Path,
    tool: &str,
    caller_cwd: Option<&Path>,
) -> std::io::Result<ExitStatus> {
    cmd.args(argv)
        .current_dir(dir)
        .env(TOOL_ENV, tool)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());
    if let Some(cwd) = caller_cwd {
        cmd.env(CALLER_CWD_ENV, cwd);
    }
    cmd.status()
}

/// Exit code of a finished child; death by signal N reports 128 + N
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}
