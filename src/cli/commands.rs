use crate::config::{SprintSettings, TeamCapacity};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "groom")]
#[command(
    author,
    version,
    about = "A CLI backlog groomer that turns raw tracker tickets into a scored, sprint-ready backlog"
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to config file (searches upward for .groom.yml by default)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Also write JSON logs to this file (rotated daily)
    #[arg(long, global = true, env = "GROOM_LOG_FILE")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a groom project config in the current directory
    Init {
        /// Story points the team completes per sprint
        #[arg(long, default_value_t = TeamCapacity::default().velocity)]
        velocity: u32,

        /// Number of people on the team
        #[arg(long, default_value_t = TeamCapacity::default().team_size)]
        team_size: u32,

        /// Largest effort that still counts as sprint-ready
        #[arg(long, default_value_t = SprintSettings::default().ready_max_effort)]
        ready_max_effort: u32,

        /// Sprint goal (repeatable)
        #[arg(long)]
        goal: Vec<String>,

        /// Overwrite an existing config
        #[arg(short, long)]
        force: bool,
    },

    /// Groom a raw ticket export (.json, .yaml, .yml or .csv)
    #[command(visible_alias = "r")]
    Run {
        /// Input file
        file: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,

        /// Sprint goal for this run, replacing configured goals (repeatable)
        #[arg(long)]
        goal: Vec<String>,

        /// Override team velocity
        #[arg(long)]
        velocity: Option<u32>,

        /// Only show items matching a query (e.g. "epic:checkout", "type:bug")
        #[arg(long)]
        filter: Option<String>,

        /// Number of items in the digest
        #[arg(long, default_value_t = 5)]
        top: usize,

        /// Also print a next-sprint recommendation
        #[arg(long)]
        recommend: bool,

        /// Push items to a directory-backed tracker
        #[arg(long)]
        push_dir: Option<String>,

        /// Give records without an id a generated one instead of rejecting them
        #[arg(long)]
        generate_ids: bool,

        /// Process items on a single thread
        #[arg(long)]
        sequential: bool,
    },

    /// Show a raw ticket next to the item(s) it became
    #[command(visible_alias = "src")]
    Source {
        /// Input file
        file: String,

        /// Raw ticket id, or the id of a decomposed part
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Colored terminal table
    Table,
    /// Result boundary object
    Json,
    /// Tracker import CSV
    Csv,
    /// Chat-style digest of the top items
    Digest,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_flags() {
        let cli = Cli::parse_from([
            "groom", "run", "backlog.json", "--format", "json", "--goal", "a", "--goal", "b",
            "--velocity", "30", "-v",
        ]);
        assert!(cli.verbose);
        match cli.command {
            Commands::Run {
                file,
                format,
                goal,
                velocity,
                top,
                ..
            } => {
                assert_eq!(file, "backlog.json");
                assert_eq!(format, OutputFormat::Json);
                assert_eq!(goal, vec!["a", "b"]);
                assert_eq!(velocity, Some(30));
                assert_eq!(top, 5);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_init_defaults_follow_config() {
        let cli = Cli::parse_from(["groom", "init"]);
        match cli.command {
            Commands::Init {
                velocity,
                team_size,
                ready_max_effort,
                ..
            } => {
                assert_eq!(velocity, 45);
                assert_eq!(team_size, 8);
                assert_eq!(ready_max_effort, 8);
            }
            _ => panic!("expected init"),
        }
    }
}
