use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// jobwatch - start a remote collection job and follow it to completion
#[derive(Parser, Debug)]
#[command(name = "jobwatch", version, about = "Start and monitor a remote collection job")]
pub struct Cli {
    /// Settings file (RON); defaults apply when it does not exist
    #[arg(short, long, default_value = "jobwatch.ron")]
    pub config: PathBuf,

    /// Override the job service base URL
    #[arg(long)]
    pub base_url: Option<String>,

    /// Override the poll interval in milliseconds
    #[arg(long)]
    pub interval_ms: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start a job and follow it until it finishes
    Run {
        /// What to search for
        #[arg(short, long)]
        query: String,

        /// Where to search
        #[arg(short, long)]
        location: String,

        /// Maximum number of results (clamped to the configured range)
        #[arg(long)]
        limit: Option<u32>,

        /// Where to save the export (default: results_<timestamp>.xlsx)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Fetch and classify the current progress once
    Status,

    /// Ask the service to stop the running job
    Stop,

    /// Stop and clear the job on the service
    Reset,

    /// Check that the service is up
    Health,

    /// Save the export of the last finished job
    Download {
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
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
    fn run_parses_with_overrides() {
        let cli = Cli::try_parse_from([
            "jobwatch",
            "--interval-ms",
            "2000",
            "run",
            "-q",
            "plumbers",
            "-l",
            "Leeds",
            "--limit",
            "200",
        ])
        .unwrap();
        assert_eq!(cli.interval_ms, Some(2000));
        match cli.command {
            Command::Run {
                query,
                location,
                limit,
                out,
            } => {
                assert_eq!(query, "plumbers");
                assert_eq!(location, "Leeds");
                assert_eq!(limit, Some(200));
                assert_eq!(out, None);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn run_requires_query_and_location() {
        assert!(Cli::try_parse_from(["jobwatch", "run", "-q", "plumbers"]).is_err());
    }
}
