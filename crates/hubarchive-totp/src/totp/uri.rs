//! `otpauth://` URI parsing per the Google Authenticator key-URI format:
//! <https://github.com/google/google-authenticator/wiki/Key-Uri-Format>
//!
//! Format: `otpauth://totp/ISSUER:LABEL?secret=BASE32&issuer=ISSUER&algorithm=SHA1&digits=6&period=30`
//!
//! Only `totp` URIs are accepted. Parameters that are present but malformed
//! are errors; absent parameters take the RFC defaults.

use crate::totp::secret::normalise_base32;
use crate::totp::types::*;

/// The parts of an enrolment URI needed to generate codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpAuthUri {
    /// Issuer, from the `issuer` parameter or the label prefix.
    pub issuer: Option<String>,
    /// Account label (e.g. "user@example.com").
    pub label: String,
    /// Base-32 secret, normalised (uppercase, no spaces/dashes).
    pub secret: String,
    pub params: TotpParams,
}

/// Parse an `otpauth://totp/...` URI.
pub fn parse_otpauth_uri(uri: &str) -> Result<OtpAuthUri, TotpError> {
    let url = url::Url::parse(uri.trim()).map_err(|e| {
        TotpError::new(TotpErrorKind::InvalidUri, format!("Invalid URI: {}", e))
    })?;

    if url.scheme() != "otpauth" {
        return Err(TotpError::new(
            TotpErrorKind::InvalidUri,
            format!("Expected scheme 'otpauth', got '{}'", url.scheme()),
        ));
    }

    match url.host_str() {
        Some("totp") => {}
        other => {
            return Err(TotpError::new(
                TotpErrorKind::InvalidUri,
                format!("Unsupported OTP type: {:?}", other),
            ))
        }
    }

    // Path is "/LABEL" or "/ISSUER:LABEL"
    let path = url.path();
    let path = path.strip_prefix('/').unwrap_or(path);
    let path_decoded = url_decode(path);

    let (path_issuer, label) = match path_decoded.split_once(':') {
        Some((issuer, label)) => (Some(issuer.trim().to_string()), label.trim().to_string()),
        None => (None, path_decoded.trim().to_string()),
    };

    // Query parameters
    let mut secret = None;
    let mut param_issuer = None;
    let mut algorithm = Algorithm::default();
    let mut digits = DEFAULT_DIGITS as i64;
    let mut period = DEFAULT_PERIOD as i64;

    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "secret" => secret = Some(value.to_string()),
            "issuer" => param_issuer = Some(value.to_string()),
            "algorithm" => algorithm = value.parse()?,
            "digits" => digits = parse_number("digits", &value)?,
            "period" => period = parse_number("period", &value)?,
            _ => {} // ignore unknown params (image, color, ...)
        }
    }

    let secret = secret
        .map(|s| normalise_base32(&s))
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            TotpError::new(TotpErrorKind::InvalidSecret, "Missing 'secret' parameter")
        })?;

    let params = TotpParams::try_new(algorithm, digits, period)?;

    // Prefer issuer from query param, then from path prefix
    let issuer = param_issuer.or(path_issuer).filter(|i| !i.is_empty());

    Ok(OtpAuthUri {
        issuer,
        label,
        secret,
        params,
    })
}

fn parse_number(name: &str, value: &str) -> Result<i64, TotpError> {
    value.trim().parse::<i64>().map_err(|_| {
        TotpError::new(TotpErrorKind::InvalidParameters, format!("Malformed '{}' parameter", name))
            .with_detail(value.to_string())
    })
}

fn url_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' if i + 2 < bytes.len() => {
                match (hex_val(bytes[i + 1]), hex_val(bytes[i + 2])) {
                    (Some(hi), Some(lo)) => {
                        out.push(hi << 4 | lo);
                        i += 3;
                        continue;
                    }
                    _ => out.push(b'%'),
                }
            }
            b'+' => out.push(b' '),
            b => out.push(b),
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_val(b: u8) -> Option<u8> {
    (b as char).to_digit(16).map(|d| d as u8)
}
