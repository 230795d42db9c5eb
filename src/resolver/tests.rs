use std::cell::Cell;
use std::ffi::OsString;
use std::path::Path;
use std::rc::Rc;

use super::*;
use crate::project::{directives_path, SOURCE_FILE_NAME};

struct FixedLocator(Option<ResolvedTool>);

impl ToolLocator for FixedLocator {
    fn flavor(&self) -> RuntimeFlavor {
        RuntimeFlavor::Host
    }

    fn locate(&self, _env: &Environment) -> Option<ResolvedTool> {
        self.0.clone()
    }
}

/// Writes `output` (if any) as the directive file and exits with `exit_code`.
struct ScriptedRunner {
    exit_code: i32,
    output: Option<String>,
    spawns: Rc<Cell<usize>>,
}

impl ProcessRunner for ScriptedRunner {
    fn run(&self, _program: &Path, args: &[OsString]) -> io::Result<i32> {
        self.spawns.set(self.spawns.get() + 1);
        if let Some(output) = &self.output {
            let description = Path::new(&args[args.len() - 2]);
            fs::write(directives_path(description), output)?;
        }
        Ok(self.exit_code)
    }
}

fn tool() -> ResolvedTool {
    ResolvedTool {
        path: PathBuf::from("/usr/bin/dotnet"),
        flavor: RuntimeFlavor::Host,
    }
}

fn resolver(
    tool: Option<ResolvedTool>,
    exit_code: i32,
    output: Option<&str>,
) -> (Resolver, Rc<Cell<usize>>) {
    let spawns = Rc::new(Cell::new(0));
    let runner = ScriptedRunner {
        exit_code,
        output: output.map(str::to_string),
        spawns: Rc::clone(&spawns),
    };
    let resolver = Resolver::new(
        Environment::default(),
        Box::new(FixedLocator(tool)),
        Box::new(runner),
    );
    (resolver, spawns)
}

const ARTIFACT: &str = "#r @\"/nuget/foo/1.0.0/lib/net8.0/Foo.dll\"\n#load @\"/nuget/foo/1.0.0/content/Foo.dll.fsx\"\n";

// ── context ────────────────────────────────────────────────

#[test]
fn test_context_from_environment() {
    let env = Environment::default()
        .with_var(HOME_VAR, "/srv/deps")
        .with_var(TARGET_FRAMEWORK_VAR, "net6.0")
        .with_var(DIAGNOSTICS_VAR, "TRUE");
    let ctx = ResolutionContext::from_environment(&env);
    assert_eq!(ctx.root, PathBuf::from("/srv/deps"));
    assert_eq!(ctx.target_framework, "net6.0");
    assert!(ctx.diagnostic_log);
    assert_eq!(ctx.cleanup, CleanupPolicy::Keep);
}

#[test]
fn test_context_defaults() {
    let ctx = ResolutionContext::from_environment(&Environment::default());
    assert!(ctx.root.ends_with("scriptdeps"));
    assert_eq!(ctx.target_framework, DEFAULT_TARGET_FRAMEWORK);
    assert!(!ctx.diagnostic_log);
}

#[test]
fn test_description_path_is_stable_per_request() {
    let ctx = ResolutionContext::new("/r");
    let a = ctx.description_path("net8.0", "Foo, 1.0");
    assert_eq!(a, ctx.description_path("net8.0", "Foo, 1.0"));
    assert_ne!(a, ctx.description_path("net8.0", "Foo, 2.0"));
    assert_ne!(a, ctx.description_path("net6.0", "Foo, 1.0"));
    assert!(a.starts_with("/r"));
    assert!(a.ends_with(PROJECT_FILE_NAME));
    let key = a.parent().unwrap().file_name().unwrap().to_str().unwrap();
    assert_eq!(key.len(), 16);
    assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
}

// ── prepare ────────────────────────────────────────────────

#[test]
fn test_prepare_writes_project() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = ResolutionContext::new(dir.path());

    let prepared = prepare("Foo, 1.0, framework=net6.0", &ctx).unwrap();
    assert_eq!(prepared.target_framework, "net6.0");
    assert!(prepared.description_path.is_absolute());
    assert!(prepared.written.description);

    let description = fs::read_to_string(&prepared.description_path).unwrap();
    assert!(description.contains("<TargetFramework>net6.0</TargetFramework>"));
    assert!(description.contains("Include=\"Foo\" Version=\"1.0\""));
    assert!(prepared
        .description_path
        .with_file_name(SOURCE_FILE_NAME)
        .is_file());

    let again = prepare("Foo, 1.0, framework=net6.0", &ctx).unwrap();
    assert_eq!(again.description_path, prepared.description_path);
    assert!(!again.written.any());
}

#[test]
fn test_prepare_rejects_empty_spec() {
    let dir = tempfile::tempdir().unwrap();
    let err = prepare(" , ", &ResolutionContext::new(dir.path())).unwrap_err();
    assert!(matches!(err, ResolveError::NoPackages(_)));
    assert_eq!(err.stage(), "parse");
}

// ── resolve ────────────────────────────────────────────────

#[test]
fn test_resolve_returns_artifact_lines_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = ResolutionContext::new(dir.path());
    let (resolver, spawns) = resolver(Some(tool()), 0, Some(ARTIFACT));

    let result = resolver.resolve("Foo, 1.0.0", &ctx).unwrap();
    assert_eq!(
        result.lines,
        vec![
            "#r @\"/nuget/foo/1.0.0/lib/net8.0/Foo.dll\"",
            "#load @\"/nuget/foo/1.0.0/content/Foo.dll.fsx\"",
        ]
    );
    assert_eq!(
        result.references(),
        vec![PathBuf::from("/nuget/foo/1.0.0/lib/net8.0/Foo.dll")]
    );
    assert_eq!(
        result.loads(),
        vec![PathBuf::from("/nuget/foo/1.0.0/content/Foo.dll.fsx")]
    );
    assert!(result.artifact.is_file());
    assert_eq!(spawns.get(), 1);
}

#[test]
fn test_resolve_tool_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let (resolver, spawns) = resolver(None, 0, Some(ARTIFACT));

    let err = resolver
        .resolve("Foo", &ResolutionContext::new(dir.path()))
        .unwrap_err();
    assert!(matches!(
        err,
        ResolveError::ToolNotFound {
            flavor: RuntimeFlavor::Host
        }
    ));
    assert!(!err.is_build_failure());
    assert_eq!(spawns.get(), 0);
}

#[test]
fn test_resolve_build_failed() {
    let dir = tempfile::tempdir().unwrap();
    let (resolver, _) = resolver(Some(tool()), 1, Some(ARTIFACT));

    let err = resolver
        .resolve("Foo", &ResolutionContext::new(dir.path()))
        .unwrap_err();
    assert!(matches!(
        err,
        ResolveError::BuildFailed {
            exit_code: Some(1),
            ..
        }
    ));
    assert!(err.is_build_failure());
    assert!(err.to_string().contains("exit code 1"));
}

#[test]
fn test_resolve_output_missing() {
    let dir = tempfile::tempdir().unwrap();
    let (resolver, _) = resolver(Some(tool()), 0, None);

    let err = resolver
        .resolve("Foo", &ResolutionContext::new(dir.path()))
        .unwrap_err();
    assert!(matches!(err, ResolveError::OutputMissing { .. }));
    assert!(err.is_build_failure());
    assert_eq!(err.stage(), "output");
}

#[test]
fn test_resolve_keeps_project_by_default() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = ResolutionContext::new(dir.path());
    let (resolver, _) = resolver(Some(tool()), 0, Some(ARTIFACT));

    let result = resolver.resolve("Foo", &ctx).unwrap();
    assert!(result.artifact.is_file());
    assert!(result.artifact.parent().unwrap().join(PROJECT_FILE_NAME).is_file());
}

#[test]
fn test_resolve_remove_project_cleanup() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = ResolutionContext::new(dir.path()).with_cleanup(CleanupPolicy::RemoveProject);
    let (resolver, _) = resolver(Some(tool()), 0, Some(ARTIFACT));

    let result = resolver.resolve("Foo", &ctx).unwrap();
    assert_eq!(result.lines.len(), 2);
    assert!(!result.artifact.exists());
    assert!(!result.artifact.parent().unwrap().exists());
    assert!(dir.path().exists());
}

#[test]
fn test_resolve_failure_keeps_project_even_with_cleanup() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = ResolutionContext::new(dir.path()).with_cleanup(CleanupPolicy::RemoveProject);
    let (resolver, _) = resolver(Some(tool()), 2, None);

    let err = resolver.resolve("Foo", &ctx).unwrap_err();
    let ResolveError::BuildFailed { description, .. } = &err else {
        panic!("expected BuildFailed, got {:?}", err);
    };
    assert!(description.is_file());
}

// ── directives ─────────────────────────────────────────────

#[test]
fn test_directive_parse() {
    assert_eq!(
        Directive::parse("#r @\"C:\\nuget\\a.dll\""),
        Directive::Reference(PathBuf::from("C:\\nuget\\a.dll"))
    );
    assert_eq!(
        Directive::parse("  #load \"/x/init.fsx\"  "),
        Directive::Load(PathBuf::from("/x/init.fsx"))
    );
    assert_eq!(
        Directive::parse("// Host: /usr/bin/dotnet"),
        Directive::Comment(" Host: /usr/bin/dotnet".to_string())
    );
    assert_eq!(
        Directive::parse("#region x"),
        Directive::Other("#region x".to_string())
    );
    assert_eq!(Directive::parse("#r @\"\""), Directive::Other("#r @\"\"".to_string()));
}

#[test]
fn test_directive_to_line() {
    let line = "#r @\"/a/b.dll\"";
    assert_eq!(Directive::parse(line).to_line(), line);
    for comment in ["//foo", "// Host: /usr/bin/dotnet", "//  indented"] {
        assert_eq!(Directive::parse(comment).to_line(), comment);
    }
    assert_eq!(
        Directive::Load(PathBuf::from("/a/b.fsx")).to_line(),
        "#load @\"/a/b.fsx\""
    );
}
