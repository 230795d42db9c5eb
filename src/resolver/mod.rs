//! The resolution pipeline: spec → project → tool → build → directives.
//!
//! ```text
//! "Newtonsoft.Json, 13.0.3"
//!   → PackageRequest            (options)
//!   → <root>/<hash>/Project.fsproj  (project)
//!   → dotnet / MSBuild.exe      (toolchain)
//!   → restore + ScriptDependencies (build)
//!   → Project.fsproj.fsx lines  (here)
//! ```
//!
//! Every request runs synchronously on the calling thread. Requests for
//! the same spec and framework share a project directory; callers running
//! them concurrently must use distinct roots.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, warn};

use crate::build::{self, BuildOutcome, ProcessRunner, SystemRunner};
use crate::options::PackageRequest;
use crate::project::{self, WriteReport, PROJECT_FILE_NAME};
use crate::toolchain::{Environment, ResolvedTool, RuntimeFlavor, ToolLocator};

mod directive;
mod error;

pub use directive::Directive;
pub use error::ResolveError;

#[cfg(test)]
mod tests;

/// Root directory for request projects.
pub const HOME_VAR: &str = "SCRIPTDEPS_HOME";
/// Target framework used when the spec does not name one.
pub const TARGET_FRAMEWORK_VAR: &str = "SCRIPTDEPS_TARGET_FRAMEWORK";
/// `1`/`true` asks the build for a binary diagnostic log.
pub const DIAGNOSTICS_VAR: &str = "SCRIPTDEPS_DIAGNOSTICS";

pub const DEFAULT_TARGET_FRAMEWORK: &str = "net8.0";

// ─── Context ───────────────────────────────────────────────────────

/// What happens to a request's project directory once its directives have
/// been read.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CleanupPolicy {
    /// Leave everything on disk. Repeated requests reuse the restore.
    #[default]
    Keep,
    /// Delete the request directory after a successful read. Failed
    /// requests are always kept for inspection.
    RemoveProject,
}

/// Per-request settings.
#[derive(Clone, Debug)]
pub struct ResolutionContext {
    /// Parent of the per-request project directories.
    pub root: PathBuf,
    pub target_framework: String,
    pub diagnostic_log: bool,
    pub cleanup: CleanupPolicy,
}

impl ResolutionContext {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        ResolutionContext {
            root: root.into(),
            target_framework: DEFAULT_TARGET_FRAMEWORK.to_string(),
            diagnostic_log: false,
            cleanup: CleanupPolicy::Keep,
        }
    }

    /// Settings from the environment.
    ///
    /// Priority for the root:
    /// 1. `$SCRIPTDEPS_HOME`
    /// 2. `<temp dir>/scriptdeps`
    pub fn from_environment(env: &Environment) -> Self {
        let root = env
            .var(HOME_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join("scriptdeps"));
        let target_framework = env
            .var(TARGET_FRAMEWORK_VAR)
            .unwrap_or(DEFAULT_TARGET_FRAMEWORK)
            .to_string();
        let diagnostic_log = env
            .var(DIAGNOSTICS_VAR)
            .is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"));

        ResolutionContext {
            root,
            target_framework,
            diagnostic_log,
            cleanup: CleanupPolicy::Keep,
        }
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    pub fn with_target_framework(mut self, target_framework: impl Into<String>) -> Self {
        self.target_framework = target_framework.into();
        self
    }

    pub fn with_diagnostic_log(mut self, diagnostic_log: bool) -> Self {
        self.diagnostic_log = diagnostic_log;
        self
    }

    pub fn with_cleanup(mut self, cleanup: CleanupPolicy) -> Self {
        self.cleanup = cleanup;
        self
    }

    /// `<root>/<key>/Project.fsproj`, where the key is a BLAKE3 prefix of
    /// the framework and spec. Identical requests land in the same place.
    pub fn description_path(&self, target_framework: &str, spec: &str) -> PathBuf {
        self.root
            .join(request_key(target_framework, spec))
            .join(PROJECT_FILE_NAME)
    }
}

fn request_key(target_framework: &str, spec: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(target_framework.as_bytes());
    hasher.update(&[0]);
    hasher.update(spec.as_bytes());
    hasher.finalize().to_hex().as_str()[..16].to_string()
}

// ─── Results ───────────────────────────────────────────────────────

/// A project written to disk, ready to build.
#[derive(Clone, Debug)]
pub struct PreparedProject {
    pub request: PackageRequest,
    /// Effective framework: the spec's override, else the context's.
    pub target_framework: String,
    pub description_path: PathBuf,
    pub written: WriteReport,
}

/// Directive lines read back from a successful build.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ResolutionResult {
    /// The directive file the lines came from. Gone again if the context
    /// asked for [`CleanupPolicy::RemoveProject`].
    pub artifact: PathBuf,
    /// Lines in file order, without terminators.
    pub lines: Vec<String>,
}

impl ResolutionResult {
    pub fn directives(&self) -> impl Iterator<Item = Directive> + '_ {
        self.lines.iter().map(|line| Directive::parse(line))
    }

    /// Paths of all `#r` directives, in order.
    pub fn references(&self) -> Vec<PathBuf> {
        self.directives()
            .filter_map(|d| match d {
                Directive::Reference(path) => Some(path),
                _ => None,
            })
            .collect()
    }

    /// Paths of all `#load` directives, in order.
    pub fn loads(&self) -> Vec<PathBuf> {
        self.directives()
            .filter_map(|d| match d {
                Directive::Load(path) => Some(path),
                _ => None,
            })
            .collect()
    }
}

// ─── Pipeline ──────────────────────────────────────────────────────

/// Parse `spec`, render its project and write it under `ctx.root`.
pub fn prepare(spec: &str, ctx: &ResolutionContext) -> Result<PreparedProject, ResolveError> {
    let request = PackageRequest::from_spec(spec);
    if request.is_empty() {
        return Err(ResolveError::NoPackages(spec.to_string()));
    }

    let target_framework = request
        .target_framework
        .clone()
        .unwrap_or_else(|| ctx.target_framework.clone());

    let relative = ctx.description_path(&target_framework, spec);
    // MSBuild names the directive file after the absolute project path.
    let description_path = std::path::absolute(&relative).map_err(|source| {
        ResolveError::Project {
            path: relative.clone(),
            source,
        }
    })?;

    let rendered = project::render(&target_framework, &request.packages);
    let written = rendered
        .write(&description_path)
        .map_err(|source| ResolveError::Project {
            path: description_path.clone(),
            source,
        })?;

    debug!(
        packages = request.packages.len(),
        framework = %target_framework,
        path = %description_path.display(),
        "prepared project"
    );

    Ok(PreparedProject {
        request,
        target_framework,
        description_path,
        written,
    })
}

/// Drives one request through the whole pipeline.
pub struct Resolver {
    env: Environment,
    locator: Box<dyn ToolLocator>,
    runner: Box<dyn ProcessRunner>,
}

impl Resolver {
    pub fn new(
        env: Environment,
        locator: Box<dyn ToolLocator>,
        runner: Box<dyn ProcessRunner>,
    ) -> Self {
        Resolver {
            env,
            locator,
            runner,
        }
    }

    /// Detect the runtime flavor from `env` and spawn real processes.
    pub fn from_environment(env: Environment) -> Self {
        let flavor = RuntimeFlavor::detect(&env);
        Self::with_flavor(env, flavor)
    }

    pub fn with_flavor(env: Environment, flavor: RuntimeFlavor) -> Self {
        Resolver::new(env, flavor.locator(), Box::new(SystemRunner))
    }

    pub fn flavor(&self) -> RuntimeFlavor {
        self.locator.flavor()
    }

    pub fn locate(&self) -> Option<ResolvedTool> {
        self.locator.locate(&self.env)
    }

    /// Resolve `spec` into directive lines.
    pub fn resolve(
        &self,
        spec: &str,
        ctx: &ResolutionContext,
    ) -> Result<ResolutionResult, ResolveError> {
        let prepared = prepare(spec, ctx)?;

        let tool = self.locate().ok_or(ResolveError::ToolNotFound {
            flavor: self.flavor(),
        })?;

        let outcome = build::execute(
            self.runner.as_ref(),
            Some(&tool),
            &prepared.description_path,
            ctx.diagnostic_log,
        );
        let artifact = match outcome {
            BuildOutcome {
                success: true,
                output_path: Some(path),
                ..
            } => path,
            BuildOutcome {
                exit_code: Some(0), ..
            } => {
                return Err(ResolveError::OutputMissing {
                    path: project::directives_path(&prepared.description_path),
                })
            }
            BuildOutcome { exit_code, .. } => {
                return Err(ResolveError::BuildFailed {
                    description: prepared.description_path,
                    exit_code,
                })
            }
        };

        let lines = read_lines(&artifact)?;
        debug!(lines = lines.len(), path = %artifact.display(), "read directives");

        if ctx.cleanup == CleanupPolicy::RemoveProject {
            remove_project(&prepared.description_path);
        }

        Ok(ResolutionResult { artifact, lines })
    }
}

fn read_lines(path: &Path) -> Result<Vec<String>, ResolveError> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(content.lines().map(str::to_string).collect()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(ResolveError::OutputMissing {
            path: path.to_path_buf(),
        }),
        Err(source) => Err(ResolveError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Best effort: the directives are already in memory.
fn remove_project(description_path: &Path) {
    let Some(dir) = description_path.parent() else {
        return;
    };
    match fs::remove_dir_all(dir) {
        Ok(()) => debug!(path = %dir.display(), "removed project"),
        Err(e) => warn!(path = %dir.display(), error = %e, "cannot remove project"),
    }
}
