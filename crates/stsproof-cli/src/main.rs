//! `stsproof` binary: assert or verify an AWS caller identity.
//!
//! Logs go to stderr so stdout carries only the JSON result.

use std::process::ExitCode;
use stsproof_cli::config::{self, LoggingConfig, DEFAULT_CONFIG_PATH};
use stsproof_cli::{parse_args, Command, USAGE};
use tracing_subscriber::EnvFilter;

fn resolve_config_path(flag: Option<String>) -> (String, &'static str) {
    if let Some(path) = flag {
        return (path, "cli-arg");
    }

    if let Ok(path) = std::env::var("STSPROOF_CONFIG_PATH") {
        if !path.trim().is_empty() {
            return (path, "env-var");
        }
    }

    (DEFAULT_CONFIG_PATH.to_string(), "default")
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_new(&logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn main() -> ExitCode {
    let invocation = match parse_args(std::env::args().skip(1)) {
        Ok(invocation) => invocation,
        Err(e) => {
            eprintln!("stsproof: {e}\n\n{USAGE}");
            return ExitCode::from(2);
        }
    };

    if invocation.command == Command::Help {
        println!("{USAGE}");
        return ExitCode::SUCCESS;
    }

    let (config_path, config_source) = resolve_config_path(invocation.config_path);
    let config = match config::load_config(Some(config_path.as_str())) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("stsproof: {e}");
            return ExitCode::FAILURE;
        }
    };

    init_tracing(&config.logging);

    tracing::debug!(
        source = config_source,
        path = %config_path,
        endpoint = %config.sts.endpoint,
        "resolved configuration"
    );

    let result = match &invocation.command {
        Command::Prepare => stsproof_cli::prepare(&config),
        Command::Verify(input) => {
            stsproof_cli::read_input(input).and_then(|raw| stsproof_cli::verify(&config, &raw))
        }
        Command::Help => unreachable!("help is handled before configuration is loaded"),
    };

    match result {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("stsproof: {e}");
            ExitCode::FAILURE
        }
    }
}
