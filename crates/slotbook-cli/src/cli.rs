use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "slotbook",
    about = "Inspect and verify slotbook container files",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Registry settings in TOML
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Write a new container holding only the root element
    Init(InitArgs),
    /// Show the super header and block directory
    Inspect(InspectArgs),
    /// Print the element hierarchy from the root
    Tree(TreeArgs),
    /// Load a container and report reference integrity
    Verify(VerifyArgs),
}

#[derive(Args)]
pub struct InitArgs {
    pub path: PathBuf,
    /// Overwrite an existing file
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args)]
pub struct InspectArgs {
    pub path: PathBuf,
}

#[derive(Args)]
pub struct TreeArgs {
    pub path: PathBuf,
    /// Stop descending below this depth
    #[arg(short = 'd', long)]
    pub max_depth: Option<usize>,
}

#[derive(Args)]
pub struct VerifyArgs {
    pub path: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_init() {
        let cli = Cli::try_parse_from(["slotbook", "init", "book.slot"]).unwrap();
        if let Command::Init(args) = cli.command {
            assert_eq!(args.path, PathBuf::from("book.slot"));
            assert!(!args.force);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_init_force() {
        let cli = Cli::try_parse_from(["slotbook", "init", "-f", "book.slot"]).unwrap();
        if let Command::Init(args) = cli.command {
            assert!(args.force);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn init_requires_path() {
        assert!(Cli::try_parse_from(["slotbook", "init"]).is_err());
    }

    #[test]
    fn parse_inspect() {
        let cli = Cli::try_parse_from(["slotbook", "inspect", "a.slot"]).unwrap();
        assert!(matches!(cli.command, Command::Inspect(_)));
    }

    #[test]
    fn parse_tree_depth() {
        let cli = Cli::try_parse_from(["slotbook", "tree", "a.slot", "-d", "3"]).unwrap();
        if let Command::Tree(args) = cli.command {
            assert_eq!(args.max_depth, Some(3));
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_verify() {
        let cli = Cli::try_parse_from(["slotbook", "verify", "a.slot"]).unwrap();
        assert!(matches!(cli.command, Command::Verify(_)));
    }

    #[test]
    fn parse_verbose() {
        let cli = Cli::try_parse_from(["slotbook", "--verbose", "verify", "a.slot"]).unwrap();
        assert!(cli.verbose);
    }

    #[test]
    fn parse_json_format() {
        let cli = Cli::try_parse_from(["slotbook", "--format", "json", "inspect", "a.slot"]).unwrap();
        assert!(matches!(cli.format, OutputFormat::Json));
    }

    #[test]
    fn parse_config_after_subcommand() {
        let cli =
            Cli::try_parse_from(["slotbook", "tree", "a.slot", "--config", "cfg.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("cfg.toml")));
    }
}
