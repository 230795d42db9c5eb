use std::process;

use clap::Args;
use serde::Serialize;

use scriptdeps::{CleanupPolicy, Directive, Environment, ResolutionResult, RuntimeFlavor};

use super::{print_json, resolver, ContextArgs};

#[derive(Args)]
pub struct ResolveArgs {
    /// Reference spec, e.g. "Newtonsoft.Json, 13.0.3"
    pub spec: String,
    #[command(flatten)]
    pub context: ContextArgs,
    /// Ask the build for a binary diagnostic log (msbuild.binlog)
    #[arg(long)]
    pub diag: bool,
    /// Delete the request project after reading its directives
    #[arg(long)]
    pub cleanup: bool,
    /// Force the runtime flavor: framework or host (default: detect)
    #[arg(long)]
    pub runtime: Option<RuntimeFlavor>,
    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct ResolveReport<'a> {
    #[serde(flatten)]
    result: &'a ResolutionResult,
    directives: Vec<Directive>,
}

pub fn cmd_resolve(args: ResolveArgs) {
    let env = Environment::capture();
    let mut ctx = args.context.context(&env);
    if args.diag {
        ctx = ctx.with_diagnostic_log(true);
    }
    if args.cleanup {
        ctx = ctx.with_cleanup(CleanupPolicy::RemoveProject);
    }

    let resolver = resolver(env, args.runtime);
    let result = match resolver.resolve(&args.spec, &ctx) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {}", e);
            if e.is_build_failure() {
                eprintln!("hint: rerun with --diag to capture msbuild.binlog");
            }
            process::exit(1);
        }
    };

    if args.json {
        print_json(&ResolveReport {
            result: &result,
            directives: result.directives().collect(),
        });
        return;
    }

    for line in &result.lines {
        println!("{}", line);
    }
}
