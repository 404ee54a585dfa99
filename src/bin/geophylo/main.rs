mod optimize;
mod output;
mod parse;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "geophylo",
    about = "Crossing-minimal phylogeographic layout from the command line"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build an instance JSON from a Newick tree and a geo file
    Parse(parse::ParseArgs),
    /// Solve an instance JSON into a solution JSON
    Optimize(optimize::OptimizeArgs),
}

fn main() {
    env_logger::init();

    let result = match Cli::parse().command {
        Commands::Parse(args) => parse::run(args),
        Commands::Optimize(args) => optimize::run(args),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(e.exit_code());
    }
}
