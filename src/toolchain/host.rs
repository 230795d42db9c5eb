use std::path::PathBuf;

use tracing::debug;

use super::{is_host_module, Environment, ResolvedTool, RuntimeFlavor, ToolLocator, HOST_PATH_VAR};

/// Finds the `dotnet` host of a self-contained runtime.
///
/// `$DOTNET_HOST_PATH` wins when set. Otherwise the current process is
/// used if it is itself the host (`dotnet fsi`, `dotnet run`, ...).
#[derive(Clone, Copy, Debug, Default)]
pub struct HostLocator;

impl ToolLocator for HostLocator {
    fn flavor(&self) -> RuntimeFlavor {
        RuntimeFlavor::Host
    }

    fn locate(&self, env: &Environment) -> Option<ResolvedTool> {
        let path = match env.var(HOST_PATH_VAR) {
            Some(explicit) => PathBuf::from(explicit),
            None => env
                .main_module()
                .filter(|module| is_host_module(module))?
                .to_path_buf(),
        };
        debug!(path = %path.display(), "using dotnet host");
        Some(ResolvedTool {
            path,
            flavor: RuntimeFlavor::Host,
        })
    }
}
