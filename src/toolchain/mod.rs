//! Locating the MSBuild host for the current runtime.
//!
//! Two runtime flavors, detected once from an [`Environment`]:
//!   - **Framework**: a Visual Studio install ships `MSBuild.exe` under
//!     `MSBuild/Current/Bin/`; probe a fixed list of install roots.
//!   - **Host**: a self-contained .NET runtime; the `dotnet` muxer
//!     itself runs `dotnet msbuild`.
//!
//! Absence of a tool is a normal outcome (`None`), never an error.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Serialize;

mod framework;
mod host;

pub use framework::FrameworkLocator;
pub use host::HostLocator;


/// Explicit path to the `dotnet` host, set by the SDK for child processes.
pub const HOST_PATH_VAR: &str = "DOTNET_HOST_PATH";
/// IDE application directory (`<install>/Common7/IDE/`).
pub const APP_DIR_VAR: &str = "VSAPPIDDIR";
/// Visual Studio install root.
pub const INSTALL_DIR_VAR: &str = "VSINSTALLDIR";
/// Forces a runtime flavor: `framework` or `host`.
pub const RUNTIME_OVERRIDE_VAR: &str = "SCRIPTDEPS_RUNTIME";

/// File name prefix of the .NET runtime host executable.
const HOST_NAME: &str = "dotnet";

// ─── Environment ───────────────────────────────────────────────────

/// Snapshot of the environment variables and process metadata the
/// locators are allowed to look at.
#[derive(Clone, Debug, Default)]
pub struct Environment {
    vars: BTreeMap<String, String>,
    /// Executable this component runs from.
    component_path: Option<PathBuf>,
    /// Main executable module of the current process.
    main_module: Option<PathBuf>,
}

impl Environment {
    /// Capture the real process environment.
    ///
    /// Variables that are not valid UTF-8 are skipped.
    pub fn capture() -> Self {
        let vars = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect();
        let exe = std::env::current_exe().ok();
        Environment {
            vars,
            component_path: exe.clone(),
            main_module: exe,
        }
    }

    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    pub fn with_component_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.component_path = Some(path.into());
        self
    }

    pub fn with_main_module(mut self, path: impl Into<PathBuf>) -> Self {
        self.main_module = Some(path.into());
        self
    }

    /// Value of `name`. Empty values count as unset.
    pub fn var(&self, name: &str) -> Option<&str> {
        self.vars
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn component_path(&self) -> Option<&Path> {
        self.component_path.as_deref()
    }

    pub fn main_module(&self) -> Option<&Path> {
        self.main_module.as_deref()
    }
}

// ─── Runtime Flavor ────────────────────────────────────────────────

/// Which kind of runtime the resolver is running under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeFlavor {
    /// Desktop framework with a Visual Studio MSBuild install.
    Framework,
    /// Self-contained .NET runtime driven through the `dotnet` host.
    Host,
}

impl RuntimeFlavor {
    /// Detect the flavor from an environment snapshot.
    ///
    /// Priority:
    /// 1. `$SCRIPTDEPS_RUNTIME` (`framework` or `host`)
    /// 2. `$DOTNET_HOST_PATH`, or a `dotnet*` main module → Host
    /// 3. `$VSAPPIDDIR` or `$VSINSTALLDIR` → Framework
    /// 4. Host
    pub fn detect(env: &Environment) -> RuntimeFlavor {
        if let Some(forced) = env
            .var(RUNTIME_OVERRIDE_VAR)
            .and_then(|v| v.parse::<RuntimeFlavor>().ok())
        {
            return forced;
        }
        if env.var(HOST_PATH_VAR).is_some() || env.main_module().is_some_and(is_host_module) {
            return RuntimeFlavor::Host;
        }
        if env.var(APP_DIR_VAR).is_some() || env.var(INSTALL_DIR_VAR).is_some() {
            return RuntimeFlavor::Framework;
        }
        RuntimeFlavor::Host
    }

    /// The locator strategy for this flavor.
    pub fn locator(self) -> Box<dyn ToolLocator> {
        match self {
            RuntimeFlavor::Framework => Box::new(FrameworkLocator::default()),
            RuntimeFlavor::Host => Box::new(HostLocator),
        }
    }
}

impl fmt::Display for RuntimeFlavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeFlavor::Framework => write!(f, "framework"),
            RuntimeFlavor::Host => write!(f, "host"),
        }
    }
}

impl FromStr for RuntimeFlavor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "framework" => Ok(RuntimeFlavor::Framework),
            "host" => Ok(RuntimeFlavor::Host),
            other => Err(format!(
                "unknown runtime '{}' (expected 'framework' or 'host')",
                other
            )),
        }
    }
}

// ─── Locators ──────────────────────────────────────────────────────

/// A build tool found on disk, with the flavor that found it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ResolvedTool {
    pub path: PathBuf,
    pub flavor: RuntimeFlavor,
}

/// Strategy for finding the build tool.
pub trait ToolLocator {
    fn flavor(&self) -> RuntimeFlavor;

    /// Find the tool, or `None` when nothing usable exists.
    fn locate(&self, env: &Environment) -> Option<ResolvedTool>;
}

/// Detect the flavor and locate the tool in one step.
pub fn locate(env: &Environment) -> Option<ResolvedTool> {
    RuntimeFlavor::detect(env).locator().locate(env)
}

/// Does this executable path name the .NET host (`dotnet`, `dotnet.exe`)?
fn is_host_module(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.to_ascii_lowercase().starts_with(HOST_NAME))
}
