use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "depgraph",
    version,
    about = "Go module dependency graphs",
    long_about = "Scan directories of Go modules (one input group per directory) or load a records inventory, then render the dependency graph as Graphviz DOT/SVG or as leaves-first levels. Manifest discovery respects .gitignore and .ignore; use --no-ignore to bypass them."
)]
pub struct Cli {
    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
    /// More logging (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Where the module records come from, plus graph options shared by every
/// rendering subcommand.
#[derive(Debug, Clone, Args)]
pub struct InputArgs {
    /// Directories to scan for go.mod files; each one is an input group
    #[arg(value_name = "ROOT", required_unless_present = "records", conflicts_with = "records")]
    pub roots: Vec<PathBuf>,
    /// Load module records from a JSON inventory instead of scanning
    #[arg(long, value_name = "FILE")]
    pub records: Option<PathBuf>,
    /// Path to a TOML configuration file (default: ./depgraph.toml if present)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// Leave out modules without a scanned declaration and unqualified forks
    /// (`--no-ext=false` overrides `[graph] exclude_external = true`)
    #[arg(
        long = "no-ext",
        value_name = "BOOL",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        action = clap::ArgAction::Set
    )]
    pub no_ext: Option<bool>,
    /// Include manifests even if matched by .gitignore/.ignore
    #[arg(long, default_value_t = false)]
    pub no_ignore: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Render the dependency graph as Graphviz DOT (or SVG)
    Graph {
        #[command(flatten)]
        input: InputArgs,
        /// Lay the graph out left to right instead of top down
        #[arg(long, default_value_t = false)]
        left_to_right: bool,
        /// Render SVG through Graphviz `dot` instead of printing DOT
        #[arg(long, default_value_t = false)]
        svg: bool,
        /// Write to a file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Print modules in dependency levels, leaves first
    Levels {
        #[command(flatten)]
        input: InputArgs,
        /// Output format (default: text, or [output] default_format)
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
        /// Write to a file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// List groups of modules that depend on each other in a cycle
    Cycles {
        #[command(flatten)]
        input: InputArgs,
        /// Output format (default: text, or [output] default_format)
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
    },
    /// Generate shell completions
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn roots_and_records_conflict() {
        let err = Cli::try_parse_from(["depgraph", "levels", "a", "--records", "r.json"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn input_is_required() {
        let err = Cli::try_parse_from(["depgraph", "graph"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["depgraph", "levels", "--records", "r.json", "-vv"]).unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Levels { input, format, .. } => {
                assert_eq!(input.records, Some(PathBuf::from("r.json")));
                assert!(format.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
