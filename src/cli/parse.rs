use clap::Args;
use serde::Serialize;

use scriptdeps::{PackageRequest, ParsedOption};

use super::{or_none, print_json};

#[derive(Args)]
pub struct ParseArgs {
    /// Reference spec, e.g. "Newtonsoft.Json, 13.0.3"
    pub spec: String,
    /// Print tokens and packages as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct ParseReport {
    tokens: Vec<ParsedOption>,
    request: PackageRequest,
}

pub fn cmd_parse(args: ParseArgs) {
    let tokens: Vec<ParsedOption> = scriptdeps::parse(&args.spec).collect();
    let request = PackageRequest::from_options(tokens.iter().cloned());

    if args.json {
        print_json(&ParseReport { tokens, request });
        return;
    }

    println!("Tokens ({}):", tokens.len());
    for (i, token) in tokens.iter().enumerate() {
        println!(
            "  [{}] name={} value={}",
            i,
            or_none(token.name.as_deref()),
            or_none(token.value.as_deref())
        );
    }

    println!("\nPackages ({}):", request.packages.len());
    for package in &request.packages {
        print!(
            "  {} {}",
            package.id,
            package.version.as_deref().unwrap_or("*")
        );
        for (key, value) in &package.metadata {
            print!(" {}={}", key, value);
        }
        println!();
    }

    if let Some(framework) = &request.target_framework {
        println!("\nFramework: {}", framework);
    }
}
