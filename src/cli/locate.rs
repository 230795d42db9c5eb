use std::process;

use clap::Args;

use scriptdeps::{Environment, RuntimeFlavor};

use super::{print_json, resolver};

#[derive(Args)]
pub struct LocateArgs {
    /// Force the runtime flavor: framework or host (default: detect)
    #[arg(long)]
    pub runtime: Option<RuntimeFlavor>,
    /// Print the located tool as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn cmd_locate(args: LocateArgs) {
    let resolver = resolver(Environment::capture(), args.runtime);
    let tool = resolver.locate();

    if args.json {
        print_json(&tool);
    } else if let Some(tool) = &tool {
        println!("{} ({})", tool.path.display(), tool.flavor);
    }

    if tool.is_none() {
        eprintln!(
            "error: no build tool found for the {} runtime",
            resolver.flavor()
        );
        eprintln!("hint: install the .NET SDK or set DOTNET_HOST_PATH");
        process::exit(1);
    }
}
