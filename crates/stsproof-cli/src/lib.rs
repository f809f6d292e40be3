//! Command-line front end for the stsproof protocol.
//!
//! `stsproof prepare` signs an identity-check request with the caller's
//! environment credentials and prints the resulting tuple as JSON.
//! `stsproof verify` reads such a tuple and prints the identity STS reports
//! for it.

pub mod config;

use config::Config;
use std::io::Read;
use std::path::PathBuf;
use stsproof_aws::{ClientError, Credentials, CredentialsError, StsClient};
use stsproof_core::{IdentityVerificationError, SignatureCreationError};
use stsproof_types::IdentityTuple;
use thiserror::Error;

/// Usage text printed for `help` and on usage errors.
pub const USAGE: &str = "\
usage: stsproof [--config PATH] <command>

commands:
  prepare          sign an identity-check request with AWS_ACCESS_KEY_ID /
                   AWS_SECRET_ACCESS_KEY and print the identity tuple as JSON
  verify [PATH|-]  read an identity tuple (JSON) from PATH or stdin and print
                   the caller identity STS reports for it
  help             print this message";

/// Where a tuple is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Stdin,
    File(PathBuf),
}

/// A parsed subcommand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Prepare,
    Verify(Input),
    Help,
}

/// A parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Value of `--config`, if given.
    pub config_path: Option<String>,
    pub command: Command,
}

/// The command line could not be understood.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UsageError {
    #[error("missing command")]
    MissingCommand,
    #[error("unknown command `{0}`")]
    UnknownCommand(String),
    #[error("`--config` requires a path")]
    MissingConfigPath,
    #[error("unexpected argument `{0}`")]
    UnexpectedArgument(String),
}

/// Errors surfaced by a command.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Credentials(#[from] CredentialsError),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    SignatureCreation(#[from] SignatureCreationError),

    #[error(transparent)]
    IdentityVerification(#[from] IdentityVerificationError),

    #[error("invalid identity tuple: {0}")]
    InvalidTuple(#[source] serde_json::Error),

    #[error("failed to encode output: {0}")]
    Output(#[source] serde_json::Error),

    #[error("failed to read identity tuple: {0}")]
    Io(#[from] std::io::Error),
}

/// Parses the arguments that follow the program name.
///
/// # Errors
///
/// Returns [`UsageError`] for a missing or unknown command, a dangling
/// `--config`, or surplus arguments.
pub fn parse_args<I>(args: I) -> Result<Invocation, UsageError>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let mut config_path = None;

    let command = loop {
        match args.next() {
            Some(flag) if flag == "--config" => {
                let path = args
                    .next()
                    .filter(|p| !p.trim().is_empty())
                    .ok_or(UsageError::MissingConfigPath)?;
                config_path = Some(path);
            }
            Some(command) => break command,
            None => return Err(UsageError::MissingCommand),
        }
    };

    let command = match command.as_str() {
        "prepare" => Command::Prepare,
        "verify" => match args.next() {
            None => Command::Verify(Input::Stdin),
            Some(path) if path == "-" => Command::Verify(Input::Stdin),
            Some(path) => Command::Verify(Input::File(PathBuf::from(path))),
        },
        "help" | "--help" | "-h" => Command::Help,
        other => return Err(UsageError::UnknownCommand(other.to_string())),
    };

    if let Some(extra) = args.next() {
        return Err(UsageError::UnexpectedArgument(extra));
    }

    Ok(Invocation {
        config_path,
        command,
    })
}

/// Extracts an identity tuple with environment credentials.
///
/// Returns the tuple as pretty-printed JSON.
///
/// # Errors
///
/// Returns [`CliError`] if credentials are missing, the client cannot be
/// built, or signing fails.
pub fn prepare(config: &Config) -> Result<String, CliError> {
    let credentials = Credentials::from_env()?;
    tracing::debug!(access_key_id = %credentials.access_key_id(), "loaded credentials");

    let client = StsClient::new(&config.sts, Some(credentials))?;
    let tuple = stsproof_core::extract(&client)?;

    serde_json::to_string_pretty(&tuple).map_err(CliError::Output)
}

/// Verifies the JSON-encoded tuple in `input`.
///
/// Returns the caller identity as pretty-printed JSON. The verifier never
/// loads local credentials.
///
/// # Errors
///
/// Returns [`CliError`] if `input` is not a tuple, the client cannot be
/// built, or the provider does not confirm the tuple.
pub fn verify(config: &Config, input: &str) -> Result<String, CliError> {
    let tuple: IdentityTuple = serde_json::from_str(input).map_err(CliError::InvalidTuple)?;

    let client = StsClient::new(&config.sts, None)?;
    let identity = stsproof_core::verify(&client, &tuple)?;

    serde_json::to_string_pretty(&identity).map_err(CliError::Output)
}

/// Reads the whole of `input`.
///
/// # Errors
///
/// Returns [`CliError::Io`] if the file or stdin cannot be read.
pub fn read_input(input: &Input) -> Result<String, CliError> {
    match input {
        Input::Stdin => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
        Input::File(path) => Ok(std::fs::read_to_string(path)?),
    }
}
