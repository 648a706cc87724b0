//! # hubarchive
//!
//! Support library for archiving registry repositories through the web
//! console: second-factor codes for the login, environment configuration,
//! and the repository manifest the archival loop walks.

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod manifest;

pub use error::{AppError, AppResult};
pub use hubarchive_totp::totp;

use clap::Parser;
use std::process::ExitCode;

/// Parse arguments, install logging, run the chosen subcommand.
pub fn run() -> ExitCode {
    let cli = cli::Cli::parse();
    logging::init(cli.log_format);
    report(cli::execute(cli.command))
}

/// Log a failure once and map it to the process exit code.
fn report(result: AppResult<()>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_maps_outcome_to_exit_code() {
        assert_eq!(format!("{:?}", report(Ok(()))), format!("{:?}", ExitCode::SUCCESS));
        assert_eq!(
            format!("{:?}", report(Err(AppError::CodeRejected))),
            format!("{:?}", ExitCode::FAILURE)
        );
    }
}
