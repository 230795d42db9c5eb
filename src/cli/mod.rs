pub mod locate;
pub mod parse;
pub mod render;
pub mod resolve;

use std::path::PathBuf;
use std::process;

use clap::Args;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use scriptdeps::{Environment, ResolutionContext, Resolver, RuntimeFlavor};

/// Log filter variable, e.g. `SCRIPTDEPS_LOG=scriptdeps=debug`.
const LOG_VAR: &str = "SCRIPTDEPS_LOG";

/// Install the stderr log subscriber. Defaults to warnings only.
pub fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_VAR).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Where and for which framework a request's project is written.
#[derive(Args)]
pub struct ContextArgs {
    /// Root for request projects (default: $SCRIPTDEPS_HOME or <tmp>/scriptdeps)
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,
    /// Target framework when the spec names none (default: $SCRIPTDEPS_TARGET_FRAMEWORK or net8.0)
    #[arg(long, value_name = "TFM")]
    pub framework: Option<String>,
}

impl ContextArgs {
    /// Environment-derived context with command-line overrides applied.
    pub fn context(&self, env: &Environment) -> ResolutionContext {
        let mut ctx = ResolutionContext::from_environment(env);
        if let Some(root) = &self.root {
            ctx = ctx.with_root(root);
        }
        if let Some(framework) = &self.framework {
            ctx = ctx.with_target_framework(framework);
        }
        ctx
    }
}

/// A resolver for `env`, with the runtime flavor forced if requested.
pub fn resolver(env: Environment, runtime: Option<RuntimeFlavor>) -> Resolver {
    match runtime {
        Some(flavor) => Resolver::with_flavor(env, flavor),
        None => Resolver::from_environment(env),
    }
}

/// Print a value as pretty JSON on stdout, exiting on error.
pub fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("error: cannot serialize output: {}", e);
            process::exit(1);
        }
    }
}

/// Render an optional value for human-readable output.
pub fn or_none(value: Option<&str>) -> &str {
    value.unwrap_or("<none>")
}
