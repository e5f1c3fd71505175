use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::types::ProfileKind;

/// clusterspec - CloudLab cluster profiles as request RSpecs
#[derive(Parser, Debug)]
#[command(name = "clusterspec")]
#[command(about = "Build a CloudLab request RSpec for a parameterized compute cluster")]
#[command(version)]
pub struct Cli {
    /// Profile to evaluate
    #[arg(short, long, global = true, value_enum)]
    pub profile: Option<ProfileKind>,

    /// Increase log verbosity (-v info, -vv debug); logs go to stderr
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Parameter sources shared by `build` and `validate`
#[derive(clap::Args, Debug, Default, Clone)]
pub struct ParamArgs {
    /// JSON parameter file
    #[arg(long)]
    pub params: Option<PathBuf>,

    /// Set a parameter, e.g. `--set machineNum=3` (repeatable, overrides the file)
    #[arg(short, long = "set", value_name = "NAME=VALUE", value_parser = parse_assignment)]
    pub set: Vec<(String, String)>,

    /// Treat parameter warnings as errors
    #[arg(long)]
    pub warnings_as_errors: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Bind and verify parameters, then print the request RSpec (default)
    Build {
        #[command(flatten)]
        params: ParamArgs,

        /// Write the RSpec to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Bind and verify parameters, printing the validation report
    Validate {
        #[command(flatten)]
        params: ParamArgs,

        /// Save the effective parameter values to a file
        #[arg(long)]
        save: Option<PathBuf>,
    },
    /// Print the profile's parameter declarations as JSON
    Params,
}

/// Parse a `NAME=VALUE` assignment
pub fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected NAME=VALUE, got '{}'", raw)),
    }
}

impl Cli {
    pub fn parse_args() -> Self {
        <Self as clap::Parser>::parse()
    }
}
