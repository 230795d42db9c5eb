use clap::{Parser, Subcommand};

mod cli;

#[derive(Parser)]
#[command(
    name = "scriptdeps",
    version,
    about = "Resolve inline package references into script directives"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show how a reference spec is tokenized and grouped
    Parse(cli::parse::ParseArgs),
    /// Find the build tool for the current runtime
    Locate(cli::locate::LocateArgs),
    /// Write the ephemeral project for a spec without building it
    Render(cli::render::RenderArgs),
    /// Resolve a spec into #r / #load directives
    Resolve(cli::resolve::ResolveArgs),
}

fn main() {
    cli::init_logging();
    let cli = Cli::parse();

    match cli.command {
        Command::Parse(args) => cli::parse::cmd_parse(args),
        Command::Locate(args) => cli::locate::cmd_locate(args),
        Command::Render(args) => cli::render::cmd_render(args),
        Command::Resolve(args) => cli::resolve::cmd_resolve(args),
    }
}
