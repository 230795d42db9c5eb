use std::io;
use std::path::PathBuf;

use crate::toolchain::RuntimeFlavor;

/// Why a resolution request produced no directives.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("no packages requested in '{0}'")]
    NoPackages(String),

    #[error("cannot find a build tool for the {flavor} runtime")]
    ToolNotFound { flavor: RuntimeFlavor },

    #[error("build of '{}' failed{}", .description.display(), exit_suffix(.exit_code))]
    BuildFailed {
        description: PathBuf,
        /// `None` when the tool could not be started at all.
        exit_code: Option<i32>,
    },

    #[error("build reported success but '{}' was not written", .path.display())]
    OutputMissing { path: PathBuf },

    #[error("cannot write project '{}': {source}", .path.display())]
    Project {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot read '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ResolveError {
    /// Short name of the failing stage, for logs and JSON output.
    pub fn stage(&self) -> &'static str {
        match self {
            ResolveError::NoPackages(_) => "parse",
            ResolveError::Project { .. } => "render",
            ResolveError::ToolNotFound { .. } => "locate",
            ResolveError::BuildFailed { .. } => "build",
            ResolveError::OutputMissing { .. } => "output",
            ResolveError::Read { .. } => "read",
        }
    }

    /// The build ran and did not produce directives. Callers treat a
    /// failed exit and a missing artifact the same way.
    pub fn is_build_failure(&self) -> bool {
        matches!(
            self,
            ResolveError::BuildFailed { .. } | ResolveError::OutputMissing { .. }
        )
    }
}

fn exit_suffix(exit_code: &Option<i32>) -> String {
    match *exit_code {
        Some(code) => format!(" (exit code {})", code),
        None => " (tool could not be started)".to_string(),
    }
}
