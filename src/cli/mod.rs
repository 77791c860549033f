pub mod blueprint;
pub mod completions;
pub mod export;
pub mod gather;
pub mod validate;

use clap::{Parser, Subcommand};

/// psdpack - PSD to isometric sprite asset pack exporter
#[derive(Parser, Debug)]
#[command(name = "psdpack")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export sprites from a PSD as an asset pack
    Export(export::ExportArgs),

    /// Gather exported sprites into one sheet and index
    Gather(gather::GatherArgs),

    /// Build an island blueprint from a layout document
    Blueprint(blueprint::BlueprintArgs),

    /// Check PSD documents without exporting
    Validate(validate::ValidateArgs),

    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_export() {
        let cli = Cli::parse_from(["psdpack", "export", "island.psd", "-o", "out", "--layout", "--filter", "lanczos3"]);
        let Commands::Export(args) = cli.command else {
            panic!("expected export");
        };
        assert_eq!(args.input.to_str(), Some("island.psd"));
        assert_eq!(args.output.to_str(), Some("out"));
        assert!(args.layout);
        assert!(!args.clean);
        assert_eq!(args.filter, Some(crate::discovery::ResizeFilter::Lanczos3));
    }

    #[test]
    fn test_parse_gather_list_only() {
        let cli = Cli::parse_from(["psdpack", "gather", "packs", "-l", "--ignore", "ignore.txt"]);
        let Commands::Gather(args) = cli.command else {
            panic!("expected gather");
        };
        assert!(args.list_only);
        assert_eq!(args.output.to_str(), Some("gathered"));
    }
}
