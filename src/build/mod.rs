//! Running the build tool against a synthesized project.
//!
//! The child inherits stdout/stderr so restore progress shows up in the
//! session, and the call blocks until it exits. There is no timeout: a
//! restore can take minutes on a cold package cache. Killing a hung child
//! is up to the caller.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Serialize;
use tracing::{debug, warn};

use crate::project::{directives_path, TARGET_NAME};
use crate::toolchain::{ResolvedTool, RuntimeFlavor};

#[cfg(test)]
mod tests;

const RESTORE_FLAG: &str = "-restore";
/// Writes `msbuild.binlog` next to the working directory.
const DIAGNOSTIC_LOG_FLAG: &str = "-bl";

// ─── Process Runner ────────────────────────────────────────────────

/// Runs a program to completion and reports its exit code.
pub trait ProcessRunner {
    fn run(&self, program: &Path, args: &[OsString]) -> io::Result<i32>;
}

/// Spawns real child processes with inherited stdio.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, program: &Path, args: &[OsString]) -> io::Result<i32> {
        let status = Command::new(program).args(args).status()?;
        // Killed by a signal: there is no exit code, report a failure.
        Ok(status.code().unwrap_or(-1))
    }
}

// ─── Invocation ────────────────────────────────────────────────────

/// The exact program and argument vector for one build.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildInvocation {
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

impl BuildInvocation {
    /// `[msbuild] -restore [-bl] <description> -t:ScriptDependencies`
    ///
    /// The `dotnet` host needs the `msbuild` verb first; a framework
    /// `MSBuild.exe` takes the flags directly.
    pub fn new(tool: &ResolvedTool, description_path: &Path, diagnostic_log: bool) -> Self {
        let mut args: Vec<OsString> = Vec::new();
        if tool.flavor == RuntimeFlavor::Host {
            args.push("msbuild".into());
        }
        args.push(RESTORE_FLAG.into());
        if diagnostic_log {
            args.push(DIAGNOSTIC_LOG_FLAG.into());
        }
        args.push(description_path.as_os_str().to_os_string());
        args.push(format!("-t:{}", TARGET_NAME).into());

        BuildInvocation {
            program: tool.path.clone(),
            args,
        }
    }
}

/// Renders as a shell-style command line, quoting arguments with spaces.
impl fmt::Display for BuildInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", quote(self.program.as_os_str()))?;
        for arg in &self.args {
            write!(f, " {}", quote(arg))?;
        }
        Ok(())
    }
}

fn quote(arg: &OsStr) -> String {
    let s = arg.to_string_lossy();
    if s.is_empty() || s.contains(char::is_whitespace) {
        format!("\"{}\"", s)
    } else {
        s.into_owned()
    }
}

// ─── Execution ─────────────────────────────────────────────────────

/// Result of one build.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BuildOutcome {
    /// Exit code 0 and the directive file exists.
    pub success: bool,
    /// The directive file; set only on success.
    pub output_path: Option<PathBuf>,
    /// `None` when no process ran (no tool, or spawn failure).
    pub exit_code: Option<i32>,
}

impl BuildOutcome {
    fn not_run() -> Self {
        BuildOutcome {
            success: false,
            output_path: None,
            exit_code: None,
        }
    }
}

/// Build `description_path` with `tool` and check for the directive file.
///
/// With no tool this returns a failed outcome without touching `runner`.
pub fn execute(
    runner: &dyn ProcessRunner,
    tool: Option<&ResolvedTool>,
    description_path: &Path,
    diagnostic_log: bool,
) -> BuildOutcome {
    let Some(tool) = tool else {
        debug!("no build tool; skipping build");
        return BuildOutcome::not_run();
    };

    let invocation = BuildInvocation::new(tool, description_path, diagnostic_log);
    debug!(command = %invocation, "running build");

    let exit_code = match runner.run(&invocation.program, &invocation.args) {
        Ok(code) => code,
        Err(e) => {
            warn!(program = %invocation.program.display(), error = %e, "cannot start build tool");
            return BuildOutcome::not_run();
        }
    };

    let output = directives_path(description_path);
    let success = exit_code == 0 && output.is_file();
    debug!(exit_code, success, output = %output.display(), "build finished");

    BuildOutcome {
        success,
        output_path: success.then_some(output),
        exit_code: Some(exit_code),
    }
}
