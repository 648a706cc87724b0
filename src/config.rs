//! Runtime settings, read from the process environment.
//!
//! A `.env` file in the working directory is loaded first when present;
//! variables already set in the environment win over it.

use crate::error::{AppError, AppResult};
use hubarchive_totp::totp::{Algorithm, Totp, TotpParams};
use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use std::path::PathBuf;

pub const ENV_USERNAME: &str = "DOCKER_USERNAME";
pub const ENV_PASSWORD: &str = "DOCKER_PASSWORD";
pub const ENV_TOTP_SECRET: &str = "DOCKER_TOTP_SECRET";
pub const ENV_TOTP_ALGORITHM: &str = "DOCKER_TOTP_ALGORITHM";
pub const ENV_TOTP_DIGITS: &str = "DOCKER_TOTP_DIGITS";
pub const ENV_TOTP_PERIOD: &str = "DOCKER_TOTP_PERIOD";
pub const ENV_REPOSITORIES_FILE: &str = "REPOSITORIES_FILE";
pub const ENV_HUB_URL: &str = "DOCKER_HUB_URL";

pub const DEFAULT_REPOSITORIES_FILE: &str = "docker_repositories.json";
pub const DEFAULT_HUB_URL: &str = "https://hub.docker.com";

/// Second-factor settings. The secret may be a bare base-32 string or an
/// `otpauth://` URI; URI parameters take precedence over the separate
/// algorithm/digits/period variables.
pub struct TotpSettings {
    pub secret: SecretString,
    pub params: TotpParams,
}

impl TotpSettings {
    /// Decode the secret and bind it to its parameters.
    pub fn build(&self) -> AppResult<Totp> {
        let secret = self.secret.expose_secret();
        let totp = if secret.trim_start().starts_with("otpauth://") {
            Totp::from_uri(secret)?
        } else {
            Totp::new(secret, self.params)?
        };
        Ok(totp)
    }
}

impl fmt::Debug for TotpSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TotpSettings")
            .field("secret", &"[REDACTED]")
            .field("params", &self.params)
            .finish()
    }
}

/// Everything the archival run needs from its environment.
pub struct Settings {
    pub username: String,
    pub password: SecretString,
    pub totp: Option<TotpSettings>,
    pub repositories_file: PathBuf,
    pub hub_url: String,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("totp", &self.totp)
            .field("repositories_file", &self.repositories_file)
            .field("hub_url", &self.hub_url)
            .finish()
    }
}

impl Settings {
    /// Load `.env` (if any) and read the process environment.
    pub fn from_env() -> AppResult<Self> {
        load_dotenv();
        Self::from_lookup(env_lookup)
    }

    /// Read settings through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let username = non_empty(ENV_USERNAME).ok_or(AppError::MissingVar(ENV_USERNAME))?;
        let password = non_empty(ENV_PASSWORD).ok_or(AppError::MissingVar(ENV_PASSWORD))?;
        let params = totp_params_from(&non_empty)?;
        let totp = non_empty(ENV_TOTP_SECRET).map(|secret| TotpSettings {
            secret: SecretString::new(secret),
            params,
        });

        let repositories_file = non_empty(ENV_REPOSITORIES_FILE)
            .unwrap_or_else(|| DEFAULT_REPOSITORIES_FILE.to_string())
            .into();
        let hub_url = non_empty(ENV_HUB_URL)
            .unwrap_or_else(|| DEFAULT_HUB_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        url::Url::parse(&hub_url).map_err(|e| AppError::InvalidVar {
            name: ENV_HUB_URL,
            reason: e.to_string(),
        })?;

        let settings = Self {
            username: username.trim().to_string(),
            password: SecretString::new(password),
            totp,
            repositories_file,
            hub_url,
        };
        // Fail at startup rather than at the second-factor prompt.
        if let Some(totp) = &settings.totp {
            totp.build()?;
        }
        Ok(settings)
    }

    /// The configured generator, or an error when no secret is set.
    pub fn totp(&self) -> AppResult<Totp> {
        self.totp
            .as_ref()
            .ok_or(AppError::TotpNotConfigured)?
            .build()
    }
}

/// Merge a `.env` file from the working directory into the environment.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => log::debug!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => log::warn!("Ignoring unreadable .env file: {e}"),
    }
}

/// Process-environment lookup.
pub fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Read the algorithm/digits/period variables, falling back to RFC defaults.
pub fn totp_params_from<F>(lookup: &F) -> AppResult<TotpParams>
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = TotpParams::default();
    let algorithm = match lookup(ENV_TOTP_ALGORITHM) {
        Some(v) => v.parse::<Algorithm>()?,
        None => defaults.algorithm,
    };
    let digits = parse_int(lookup, ENV_TOTP_DIGITS)?.unwrap_or(defaults.digits as i64);
    let period = parse_int(lookup, ENV_TOTP_PERIOD)?.unwrap_or(defaults.period as i64);
    Ok(TotpParams::try_new(algorithm, digits, period)?)
}

fn parse_int<F>(lookup: &F, name: &'static str) -> AppResult<Option<i64>>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|v| {
            v.trim().parse::<i64>().map_err(|e| AppError::InvalidVar {
                name,
                reason: format!("'{v}': {e}"),
            })
        })
        .transpose()
}
