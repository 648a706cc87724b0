use crate::config::{self, TotpSettings, ENV_TOTP_SECRET};
use crate::error::{AppError, AppResult};
use crate::logging::LogFormat;
use crate::manifest::{Manifest, RepositoryRef};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use hubarchive_totp::totp::core::format_code_display;
use hubarchive_totp::totp::{Algorithm, Totp, TotpParams, MAX_DRIFT_WINDOW};
use secrecy::SecretString;
use serde::Serialize;
use std::path::PathBuf;

/// Second-factor codes and repository listing for the registry archival run
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the one-time code for the configured secret
    Code {
        #[command(flatten)]
        totp: TotpArgs,

        /// Instant to generate for: unix seconds or RFC 3339 (default: now)
        #[arg(long)]
        at: Option<String>,
    },

    /// Check a code from an authenticator app against the configured secret
    Verify {
        /// The code to check
        code: String,

        /// Time-steps accepted on either side of the current one
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(0..=MAX_DRIFT_WINDOW as i64))]
        window: u32,

        #[command(flatten)]
        totp: TotpArgs,

        /// Instant to verify at: unix seconds or RFC 3339 (default: now)
        #[arg(long)]
        at: Option<String>,
    },

    /// List the manifest's repositories and their settings pages
    Repos {
        /// Manifest path (default: REPOSITORIES_FILE or docker_repositories.json)
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Print a JSON array instead of tab-separated lines
        #[arg(long)]
        json: bool,
    },
}

/// Overrides for the DOCKER_TOTP_* variables.
#[derive(Args, Debug, Default)]
pub struct TotpArgs {
    /// Base-32 secret or otpauth:// URI
    #[arg(long)]
    pub secret: Option<String>,

    /// SHA1, SHA256 or SHA512
    #[arg(long)]
    pub algorithm: Option<String>,

    /// Code length
    #[arg(long, allow_negative_numbers = true)]
    pub digits: Option<i64>,

    /// Period in seconds
    #[arg(long, allow_negative_numbers = true)]
    pub period: Option<i64>,
}

impl TotpArgs {
    /// Combine flags with the environment; flags win.
    pub fn resolve<F>(&self, lookup: F) -> AppResult<Totp>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let secret = match &self.secret {
            Some(s) => s.clone(),
            None => non_empty(ENV_TOTP_SECRET).ok_or(AppError::TotpNotConfigured)?,
        };
        let env_params = config::totp_params_from(&non_empty)?;
        let params = self.overlay(env_params)?;
        TotpSettings {
            secret: SecretString::new(secret),
            params,
        }
        .build()
    }

    fn overlay(&self, base: TotpParams) -> AppResult<TotpParams> {
        let algorithm = match &self.algorithm {
            Some(a) => a.parse::<Algorithm>()?,
            None => base.algorithm,
        };
        let digits = self.digits.unwrap_or(base.digits as i64);
        let period = self.period.unwrap_or(base.period as i64);
        Ok(TotpParams::try_new(algorithm, digits, period)?)
    }
}

/// Parse `--at`: unix seconds or an RFC 3339 timestamp.
pub fn parse_instant(raw: &str) -> AppResult<u64> {
    let raw = raw.trim();
    if let Ok(secs) = raw.parse::<u64>() {
        return Ok(secs);
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc).timestamp())
        .and_then(|ts| u64::try_from(ts).ok())
        .ok_or_else(|| AppError::InvalidTime(raw.to_string()))
}

/// One line of `repos --json` output.
#[derive(Debug, Serialize)]
struct RepositoryListing<'a> {
    #[serde(flatten)]
    repository: &'a RepositoryRef,
    settings_url: String,
}

/// Render repositories with their settings pages as a JSON array.
pub fn listing_json(repos: &[RepositoryRef], hub_url: &str, account: &str) -> AppResult<String> {
    let listing: Vec<_> = repos
        .iter()
        .map(|repository| RepositoryListing {
            repository,
            settings_url: repository.settings_url(hub_url, account),
        })
        .collect();
    serde_json::to_string_pretty(&listing).map_err(AppError::Encode)
}

fn now_unix() -> u64 {
    u64::try_from(Utc::now().timestamp()).unwrap_or_default()
}

/// Execute one subcommand, writing results to stdout.
pub fn execute(command: Command) -> AppResult<()> {
    match command {
        Command::Code { totp, at } => {
            let generator = totp.resolve(config::env_lookup)?;
            let at = at.as_deref().map(parse_instant).transpose()?.unwrap_or_else(now_unix);
            let generated = generator.generated_at(at)?;
            tracing::debug!(counter = generated.counter, "generated one-time code");
            println!(
                "{}  (valid {}s, until {})",
                generated.code,
                generated.remaining_seconds,
                generated.valid_until.to_rfc3339()
            );
        }
        Command::Verify {
            code,
            window,
            totp,
            at,
        } => {
            let generator = totp.resolve(config::env_lookup)?;
            let at = at.as_deref().map(parse_instant).transpose()?.unwrap_or_else(now_unix);
            let result = generator.verify_at(&code, window, at)?;
            if result.valid {
                println!("valid (drift {} step(s))", result.drift);
            } else {
                let expected = generator.generate_at(at)?;
                println!("invalid (current code is {})", format_code_display(&expected));
                return Err(AppError::CodeRejected);
            }
        }
        Command::Repos { file, json } => {
            let settings = config::Settings::from_env()?;
            let path = file.unwrap_or_else(|| settings.repositories_file.clone());
            let manifest = Manifest::load(&path)?;
            let repos = manifest.repositories()?;
            tracing::info!(count = repos.len(), manifest = %path.display(), "repositories to archive");
            if json {
                println!("{}", listing_json(&repos, &settings.hub_url, &settings.username)?);
                return Ok(());
            }
            for repo in &repos {
                println!(
                    "{}\t{}",
                    repo.name,
                    repo.settings_url(&settings.hub_url, &settings.username)
                );
            }
        }
    }
    Ok(())
}
