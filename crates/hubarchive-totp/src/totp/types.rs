//! Core types for the TOTP generator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Smallest accepted code length.
pub const MIN_DIGITS: u8 = 6;
/// Largest accepted code length. A 31-bit truncated value has at most 10
/// decimal digits.
pub const MAX_DIGITS: u8 = 10;
pub const DEFAULT_DIGITS: u8 = 6;
pub const DEFAULT_PERIOD: u32 = 30;
/// Largest drift window, in time-steps either side, that verification accepts.
pub const MAX_DRIFT_WINDOW: u32 = 10;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Algorithm
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Hash algorithm used for HMAC-based OTP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Algorithm {
    #[default]
    Sha1,
    Sha256,
    Sha512,
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sha1 => write!(f, "SHA1"),
            Self::Sha256 => write!(f, "SHA256"),
            Self::Sha512 => write!(f, "SHA512"),
        }
    }
}

impl Algorithm {
    /// Parse from a case-insensitive string.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "SHA1" | "SHA-1" | "HMACSHA1" | "HMAC-SHA1" => Some(Self::Sha1),
            "SHA256" | "SHA-256" | "HMACSHA256" | "HMAC-SHA256" => Some(Self::Sha256),
            "SHA512" | "SHA-512" | "HMACSHA512" | "HMAC-SHA512" => Some(Self::Sha512),
            _ => None,
        }
    }
}

impl FromStr for Algorithm {
    type Err = TotpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str_loose(s).ok_or_else(|| {
            TotpError::new(TotpErrorKind::InvalidParameters, "Unrecognised hash algorithm")
                .with_detail(format!("got '{s}', expected SHA1, SHA256 or SHA512"))
        })
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Parameters
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Algorithm parameters shared by every code derived from one secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotpParams {
    /// Hash algorithm.
    pub algorithm: Algorithm,
    /// Number of digits in the generated code.
    pub digits: u8,
    /// Time period in seconds.
    pub period: u32,
}

impl Default for TotpParams {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::default(),
            digits: DEFAULT_DIGITS,
            period: DEFAULT_PERIOD,
        }
    }
}

impl TotpParams {
    /// Build parameters from raw signed values, as they arrive from text.
    ///
    /// Zero, negative or oversized values are rejected with
    /// [`TotpErrorKind::InvalidParameters`] instead of being wrapped.
    pub fn try_new(algorithm: Algorithm, digits: i64, period: i64) -> Result<Self, TotpError> {
        let digits = u8::try_from(digits).map_err(|_| invalid_digits(digits))?;
        let period = u32::try_from(period).map_err(|_| invalid_period(period))?;
        let params = Self {
            algorithm,
            digits,
            period,
        };
        params.validate()?;
        Ok(params)
    }

    /// Builder: set algorithm.
    pub fn with_algorithm(mut self, algo: Algorithm) -> Self {
        self.algorithm = algo;
        self
    }

    /// Builder: set digit count.
    pub fn with_digits(mut self, digits: u8) -> Self {
        self.digits = digits;
        self
    }

    /// Builder: set time period.
    pub fn with_period(mut self, period: u32) -> Self {
        self.period = period;
        self
    }

    /// Check the digit count and period are usable.
    pub fn validate(&self) -> Result<(), TotpError> {
        if !(MIN_DIGITS..=MAX_DIGITS).contains(&self.digits) {
            return Err(invalid_digits(self.digits as i64));
        }
        if self.period == 0 {
            return Err(invalid_period(0));
        }
        Ok(())
    }
}

fn invalid_digits(digits: i64) -> TotpError {
    TotpError::new(TotpErrorKind::InvalidParameters, "Unsupported digit count").with_detail(
        format!("got {digits}, expected {MIN_DIGITS}..={MAX_DIGITS}"),
    )
}

fn invalid_period(period: i64) -> TotpError {
    TotpError::new(TotpErrorKind::InvalidParameters, "Period must be positive")
        .with_detail(format!("got {period}"))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Generated code result
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A generated OTP code with associated timing info.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedCode {
    /// The OTP code string (e.g. "123456").
    pub code: String,
    /// The time step used.
    pub counter: u64,
    /// Total period in seconds.
    pub period: u32,
    /// Seconds remaining until the code expires.
    pub remaining_seconds: u32,
    /// First instant at which the next code takes over.
    pub valid_until: DateTime<Utc>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Verification result
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Result of verifying an OTP code against a secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyResult {
    pub valid: bool,
    /// How many time-steps off the match was (0 = exact).
    pub drift: i64,
    /// The counter value that matched (if any).
    pub matched_counter: Option<u64>,
}

impl VerifyResult {
    pub(crate) fn rejected() -> Self {
        Self {
            valid: false,
            drift: 0,
            matched_counter: None,
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Error type
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Error kind for this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TotpErrorKind {
    /// The secret is empty or not valid in its transport encoding.
    InvalidSecret,
    /// Digit count, period, algorithm or instant out of range.
    InvalidParameters,
    /// An `otpauth://` URI could not be parsed.
    InvalidUri,
}

/// Crate-level error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotpError {
    pub kind: TotpErrorKind,
    pub message: String,
    pub detail: Option<String>,
}

impl fmt::Display for TotpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.kind, self.message)?;
        if let Some(d) = &self.detail {
            write!(f, " ({})", d)?;
        }
        Ok(())
    }
}

impl std::error::Error for TotpError {}

impl TotpError {
    pub fn new(kind: TotpErrorKind, msg: impl Into<String>) -> Self {
        Self {
            kind,
            message: msg.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}
