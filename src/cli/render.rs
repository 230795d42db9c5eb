use std::process;

use clap::Args;

use scriptdeps::{prepare, Environment};

use super::ContextArgs;

#[derive(Args)]
pub struct RenderArgs {
    /// Reference spec, e.g. "Newtonsoft.Json, 13.0.3"
    pub spec: String,
    #[command(flatten)]
    pub context: ContextArgs,
}

pub fn cmd_render(args: RenderArgs) {
    let ctx = args.context.context(&Environment::capture());

    let prepared = match prepare(&args.spec, &ctx) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    };

    let state = if prepared.written.any() {
        "written"
    } else {
        "unchanged"
    };
    eprintln!(
        "Project for {} package(s), {} ({})",
        prepared.request.packages.len(),
        prepared.target_framework,
        state
    );
    println!("{}", prepared.description_path.display());
}
