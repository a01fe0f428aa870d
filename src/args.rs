//! Code to parse the command line using `clap`, and definitions of the parsed
//! result
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::ServerConfig;

/// Returns the parsed command line
#[must_use]
pub fn parsed() -> Args {
    Args::parse()
}

/// `Args` contains the parsed command line.
#[derive(Debug, Parser)]
#[command(name = "listset", version, about)]
pub struct Args {
    /// `command` is the subcommand requested
    #[command(subcommand)]
    pub command: Command,
}

/// The subcommands `listset` understands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve the comparison API and pages over HTTP
    Serve(ServerConfig),
    /// Compare the members in a CSV or Excel member table, printing JSON
    Compare {
        /// A `.csv`, `.xlsx`, or `.xls` file with `member` and `items` columns
        #[arg(name = "FILE")]
        file: PathBuf,
    },
    /// Print a sample member table in CSV form
    Template,
}

#[allow(clippy::pedantic)]
#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn compare_takes_a_file() {
        let args = Args::try_parse_from(["listset", "compare", "team.csv"]).unwrap();
        match args.command {
            Command::Compare { file } => assert_eq!(file, PathBuf::from("team.csv")),
            other => panic!("expected Compare, got {other:?}"),
        }
    }

    #[test]
    fn a_subcommand_is_required() {
        assert!(Args::try_parse_from(["listset"]).is_err());
    }
}
