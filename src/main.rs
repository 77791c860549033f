use clap::Parser;
use miette::Result;
use psdpack::cli::{Cli, Commands};
use psdpack::output::Printer;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let printer = Printer::new();

    match cli.command {
        Commands::Export(args) => psdpack::cli::export::run(args, &printer)?,
        Commands::Gather(args) => psdpack::cli::gather::run(args, &printer)?,
        Commands::Blueprint(args) => psdpack::cli::blueprint::run(args, &printer)?,
        Commands::Validate(args) => psdpack::cli::validate::run(args, &printer)?,
        Commands::Completions(args) => psdpack::cli::completions::run(args)?,
    }

    Ok(())
}
