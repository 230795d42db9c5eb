use std::path::{Path, PathBuf};

use tracing::debug;

use super::{Environment, ResolvedTool, RuntimeFlavor, ToolLocator, APP_DIR_VAR, INSTALL_DIR_VAR};

/// Finds `MSBuild.exe` inside a Visual Studio install.
#[derive(Clone, Debug)]
pub struct FrameworkLocator {
    /// Tool path relative to an install root.
    pub relative_tool: PathBuf,
    /// How many directories to walk up from the component's own directory
    /// to reach the install root.
    pub parent_levels: usize,
}

impl Default for FrameworkLocator {
    fn default() -> Self {
        FrameworkLocator {
            relative_tool: Path::new("MSBuild")
                .join("Current")
                .join("Bin")
                .join("MSBuild.exe"),
            parent_levels: 3,
        }
    }
}

impl FrameworkLocator {
    /// Install roots to probe, in priority order:
    ///   1. the component's directory, `parent_levels` up
    ///   2. the grandparent of `$VSAPPIDDIR` (`<root>/Common7/IDE`)
    ///   3. `$VSINSTALLDIR`
    pub fn candidate_roots(&self, env: &Environment) -> Vec<PathBuf> {
        let mut roots = Vec::new();

        if let Some(root) = env
            .component_path()
            .and_then(Path::parent)
            .and_then(|dir| dir.ancestors().nth(self.parent_levels))
        {
            roots.push(root.to_path_buf());
        }
        if let Some(root) = env
            .var(APP_DIR_VAR)
            .and_then(|dir| Path::new(dir).ancestors().nth(2))
        {
            roots.push(root.to_path_buf());
        }
        if let Some(root) = env.var(INSTALL_DIR_VAR) {
            roots.push(PathBuf::from(root));
        }

        roots
    }
}

impl ToolLocator for FrameworkLocator {
    fn flavor(&self) -> RuntimeFlavor {
        RuntimeFlavor::Framework
    }

    fn locate(&self, env: &Environment) -> Option<ResolvedTool> {
        for root in self.candidate_roots(env) {
            let candidate = root.join(&self.relative_tool);
            if candidate.is_file() {
                debug!(path = %candidate.display(), "found msbuild");
                return Some(ResolvedTool {
                    path: candidate,
                    flavor: RuntimeFlavor::Framework,
                });
            }
            debug!(path = %candidate.display(), "no msbuild at candidate");
        }
        None
    }
}
