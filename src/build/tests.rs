use std::cell::{Cell, RefCell};
use std::fs;

use super::*;

/// Records calls; optionally writes the directive file before "exiting".
struct FakeRunner {
    exit_code: i32,
    write_output: bool,
    spawns: Cell<usize>,
    last_args: RefCell<Vec<OsString>>,
}

impl FakeRunner {
    fn new(exit_code: i32, write_output: bool) -> Self {
        FakeRunner {
            exit_code,
            write_output,
            spawns: Cell::new(0),
            last_args: RefCell::new(Vec::new()),
        }
    }
}

impl ProcessRunner for FakeRunner {
    fn run(&self, _program: &Path, args: &[OsString]) -> io::Result<i32> {
        self.spawns.set(self.spawns.get() + 1);
        *self.last_args.borrow_mut() = args.to_vec();
        if self.write_output {
            // The description path is the argument just before the target.
            let description = &args[args.len() - 2];
            fs::write(directives_path(Path::new(description)), "#r @\"/x.dll\"\n")?;
        }
        Ok(self.exit_code)
    }
}

struct FailingRunner;

impl ProcessRunner for FailingRunner {
    fn run(&self, _program: &Path, _args: &[OsString]) -> io::Result<i32> {
        Err(io::Error::new(io::ErrorKind::NotFound, "no such file"))
    }
}

fn host_tool() -> ResolvedTool {
    ResolvedTool {
        path: PathBuf::from("/usr/bin/dotnet"),
        flavor: RuntimeFlavor::Host,
    }
}

fn framework_tool() -> ResolvedTool {
    ResolvedTool {
        path: PathBuf::from("C:/VS/MSBuild/Current/Bin/MSBuild.exe"),
        flavor: RuntimeFlavor::Framework,
    }
}

fn strings(args: &[OsString]) -> Vec<String> {
    args.iter().map(|a| a.to_string_lossy().into_owned()).collect()
}

// ── invocation ─────────────────────────────────────────────

#[test]
fn test_invocation_host_shape() {
    let inv = BuildInvocation::new(&host_tool(), Path::new("/tmp/p/Project.fsproj"), false);
    assert_eq!(inv.program, PathBuf::from("/usr/bin/dotnet"));
    assert_eq!(
        strings(&inv.args),
        vec![
            "msbuild",
            "-restore",
            "/tmp/p/Project.fsproj",
            "-t:ScriptDependencies"
        ]
    );
}

#[test]
fn test_invocation_framework_with_diagnostics() {
    let inv = BuildInvocation::new(&framework_tool(), Path::new("p.fsproj"), true);
    assert_eq!(
        strings(&inv.args),
        vec!["-restore", "-bl", "p.fsproj", "-t:ScriptDependencies"]
    );
}

#[test]
fn test_invocation_display_quotes_spaces() {
    let inv = BuildInvocation::new(&host_tool(), Path::new("/tmp/my dir/Project.fsproj"), false);
    assert_eq!(
        inv.to_string(),
        "/usr/bin/dotnet msbuild -restore \"/tmp/my dir/Project.fsproj\" -t:ScriptDependencies"
    );
}

// ── execute ────────────────────────────────────────────────

#[test]
fn test_execute_without_tool_never_spawns() {
    let runner = FakeRunner::new(0, true);
    let outcome = execute(&runner, None, Path::new("/nowhere/Project.fsproj"), false);
    assert_eq!(
        outcome,
        BuildOutcome {
            success: false,
            output_path: None,
            exit_code: None
        }
    );
    assert_eq!(runner.spawns.get(), 0);
}

#[test]
fn test_execute_success() {
    let dir = tempfile::tempdir().unwrap();
    let description = dir.path().join("Project.fsproj");
    let runner = FakeRunner::new(0, true);

    let outcome = execute(&runner, Some(&host_tool()), &description, true);
    assert!(outcome.success);
    assert_eq!(outcome.output_path, Some(directives_path(&description)));
    assert_eq!(outcome.exit_code, Some(0));
    assert_eq!(runner.spawns.get(), 1);
    assert!(strings(&runner.last_args.borrow()).contains(&"-bl".to_string()));
}

#[test]
fn test_execute_nonzero_exit_fails_even_with_output() {
    let dir = tempfile::tempdir().unwrap();
    let description = dir.path().join("Project.fsproj");
    let runner = FakeRunner::new(1, true);

    let outcome = execute(&runner, Some(&host_tool()), &description, false);
    assert!(!outcome.success);
    assert_eq!(outcome.output_path, None);
    assert_eq!(outcome.exit_code, Some(1));
}

#[test]
fn test_execute_zero_exit_without_output_fails() {
    let dir = tempfile::tempdir().unwrap();
    let description = dir.path().join("Project.fsproj");
    let runner = FakeRunner::new(0, false);

    let outcome = execute(&runner, Some(&host_tool()), &description, false);
    assert!(!outcome.success);
    assert_eq!(outcome.output_path, None);
    assert_eq!(outcome.exit_code, Some(0));
}

#[test]
fn test_execute_spawn_failure() {
    let outcome = execute(&FailingRunner, Some(&host_tool()), Path::new("p.fsproj"), false);
    assert!(!outcome.success);
    assert_eq!(outcome.exit_code, None);
}

#[test]
fn test_system_runner_reports_spawn_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("definitely-not-a-tool");
    assert!(SystemRunner.run(&missing, &[]).is_err());
}
