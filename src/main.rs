//! clusterspec - Main entry point
//!
//! Binds profile parameters, verifies them, and prints the request RSpec.
//! stdout carries only the document (or JSON for `validate`/`params`);
//! logs and validation reports go to stderr.

use std::collections::BTreeMap;
use std::fs;
use std::io::IsTerminal;
use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use clusterspec::cli::{Cli, Commands, ParamArgs};
use clusterspec::{
    declare, evaluate, render, ParamsFile, ProfileError, ProfileKind, ValidationReport,
    VerifiedParameters,
};

/// Initialize the tracing subscriber; `RUST_LOG` overrides `-v`
fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse_args();
    init_logging(cli.verbose);
    debug!("CLI arguments parsed: {:?}", cli);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<ProfileError>().and_then(ProfileError::report) {
                Some(report) => {
                    // stderr carries only the JSON report on this path
                    debug!("Parameter validation failed: {}", report);
                    match serde_json::to_string_pretty(report) {
                        Ok(json) => eprintln!("{}", json),
                        Err(_) => eprintln!("{}", report),
                    }
                }
                None => {
                    error!("{:#}", e);
                    eprintln!("✗ {:#}", e);
                }
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Commands::Build { params, output }) => {
            let (profile, input) = load_input(cli.profile, &params)?;
            let verified = verify_input(profile, &input, params.warnings_as_errors)?;
            let document = render(&verified.params)?;
            match output {
                Some(path) => {
                    fs::write(&path, document)
                        .with_context(|| format!("Failed to write RSpec to {:?}", path))?;
                    info!("RSpec written to {:?}", path);
                }
                None => print!("{}", document),
            }
        }
        Some(Commands::Validate { params, save }) => {
            let (profile, input) = load_input(cli.profile, &params)?;
            let verified = verify_input(profile, &input, params.warnings_as_errors)?;
            let report = ValidationReport {
                errors: Vec::new(),
                warnings: verified.warnings.clone(),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
            if let Some(path) = save {
                ParamsFile::from_bound(&verified.bound).save_to_file(&path)?;
                info!("Parameters saved to {:?}", path);
            }
        }
        Some(Commands::Params) => {
            let profile = cli.profile.unwrap_or_default();
            println!("{}", serde_json::to_string_pretty(&declare(profile))?);
        }
        None => {
            let params = ParamArgs::default();
            let (profile, input) = load_input(cli.profile, &params)?;
            let verified = verify_input(profile, &input, false)?;
            print!("{}", render(&verified.params)?);
        }
    }
    Ok(())
}

/// Merge the parameter file and `--set` overrides, and settle the profile
fn load_input(
    profile: Option<ProfileKind>,
    args: &ParamArgs,
) -> Result<(ProfileKind, BTreeMap<String, serde_json::Value>)> {
    let file = match &args.params {
        Some(path) => {
            info!("Loading parameters from {:?}", path);
            ParamsFile::load_from_file(path)?
        }
        None => ParamsFile::default(),
    };

    let profile = profile.or(file.profile).unwrap_or_default();
    let file = file.with_overrides(&args.set);
    debug!("Profile {} with {} bound inputs", profile, file.parameters.len());
    Ok((profile, file.parameters))
}

fn verify_input(
    profile: ProfileKind,
    input: &BTreeMap<String, serde_json::Value>,
    warnings_as_errors: bool,
) -> Result<VerifiedParameters> {
    let verified = evaluate(profile, input).map_err(ProfileError::from)?;

    if warnings_as_errors && !verified.warnings.is_empty() {
        let report = ValidationReport {
            errors: Vec::new(),
            warnings: verified.warnings,
        };
        return Err(ProfileError::from(report.promote_warnings()).into());
    }
    for issue in &verified.warnings {
        warn!("Parameter warning: {}", issue);
    }

    info!("Parameters verified for the {} profile", profile);
    Ok(verified)
}
