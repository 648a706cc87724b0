//! Core OTP generation: RFC 4226 (HOTP) and RFC 6238 (TOTP).
//!
//! Implements HMAC-based One-Time Password with SHA-1, SHA-256, and SHA-512,
//! time-step calculation, code verification with configurable drift window,
//! and a few helper utilities. Every wall-clock function has an `_at`
//! counterpart taking the instant explicitly.

use crate::totp::secret::{normalise_base32, SecretKey};
use crate::totp::types::*;
use crate::totp::uri::parse_otpauth_uri;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::{Sha256, Sha512};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Raw HMAC-OTP (RFC 4226 §5.3)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Compute an HOTP code for the given raw key bytes and counter.
///
/// `digits` is not range-checked here; callers go through
/// [`TotpParams::validate`] first.
pub fn hotp_raw(key: &[u8], counter: u64, digits: u8, algo: Algorithm) -> Result<String, TotpError> {
    let hmac_result = compute_hmac(key, &counter.to_be_bytes(), algo)?;
    Ok(truncate(&hmac_result, digits))
}

/// Compute HMAC(key, message) using the specified algorithm.
fn compute_hmac(key: &[u8], data: &[u8], algo: Algorithm) -> Result<Vec<u8>, TotpError> {
    match algo {
        Algorithm::Sha1 => {
            let mut mac = Hmac::<Sha1>::new_from_slice(key).map_err(key_rejected)?;
            mac.update(data);
            Ok(mac.finalize().into_bytes().to_vec())
        }
        Algorithm::Sha256 => {
            let mut mac = Hmac::<Sha256>::new_from_slice(key).map_err(key_rejected)?;
            mac.update(data);
            Ok(mac.finalize().into_bytes().to_vec())
        }
        Algorithm::Sha512 => {
            let mut mac = Hmac::<Sha512>::new_from_slice(key).map_err(key_rejected)?;
            mac.update(data);
            Ok(mac.finalize().into_bytes().to_vec())
        }
    }
}

fn key_rejected(e: hmac::digest::InvalidLength) -> TotpError {
    TotpError::new(TotpErrorKind::InvalidSecret, "Key rejected by HMAC").with_detail(e.to_string())
}

/// Dynamic truncation per RFC 4226 §5.3.
fn truncate(hmac_result: &[u8], digits: u8) -> String {
    let offset = (hmac_result[hmac_result.len() - 1] & 0x0f) as usize;
    let binary = ((hmac_result[offset] as u32 & 0x7f) << 24)
        | ((hmac_result[offset + 1] as u32) << 16)
        | ((hmac_result[offset + 2] as u32) << 8)
        | (hmac_result[offset + 3] as u32);
    // 10^10 does not fit in u32
    let modulus = 10u64.pow(digits as u32);
    let code = binary as u64 % modulus;
    format!("{:0>width$}", code, width = digits as usize)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  HOTP (counter-based, RFC 4226)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Generate an HOTP code from a base-32 encoded secret.
pub fn generate_hotp(secret_b32: &str, counter: u64, params: &TotpParams) -> Result<String, TotpError> {
    params.validate()?;
    let key = SecretKey::from_base32(secret_b32)?;
    hotp_raw(key.as_bytes(), counter, params.digits, params.algorithm)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  TOTP (time-based, RFC 6238)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Compute the current TOTP time-step counter.
pub fn time_step(period: u32) -> u64 {
    time_step_at(current_unix_time(), period)
}

/// Compute the time-step counter for a given unix timestamp.
pub fn time_step_at(unix_seconds: u64, period: u32) -> u64 {
    unix_seconds / period as u64
}

/// Seconds remaining until the current time-step expires.
pub fn seconds_remaining(period: u32) -> u32 {
    seconds_remaining_at(current_unix_time(), period)
}

/// Seconds remaining for a specific timestamp.
pub fn seconds_remaining_at(unix_seconds: u64, period: u32) -> u32 {
    let p = period as u64;
    (p - (unix_seconds % p)) as u32
}

/// Generate a TOTP code from a base-32 secret, at the current time.
pub fn generate_totp(secret_b32: &str, params: &TotpParams) -> Result<String, TotpError> {
    generate_totp_at(secret_b32, params, current_unix_time())
}

/// Generate a TOTP code at an explicit unix timestamp.
pub fn generate_totp_at(
    secret_b32: &str,
    params: &TotpParams,
    unix_seconds: u64,
) -> Result<String, TotpError> {
    params.validate()?;
    let step = time_step_at(unix_seconds, params.period);
    generate_hotp(secret_b32, step, params)
}

/// Generate a TOTP code at an explicit instant.
pub fn generate_totp_at_time(
    secret_b32: &str,
    params: &TotpParams,
    at: DateTime<Utc>,
) -> Result<String, TotpError> {
    generate_totp_at(secret_b32, params, unix_seconds_of(at)?)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Verification
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Verify a code against a base-32 secret at the current time.
///
/// `drift_window` specifies how many time-steps to check on either side of
/// the current one (e.g. 1 checks ±1), at most [`MAX_DRIFT_WINDOW`].
pub fn verify_code(
    secret_b32: &str,
    params: &TotpParams,
    code: &str,
    drift_window: u32,
) -> Result<VerifyResult, TotpError> {
    verify_code_at(secret_b32, params, code, drift_window, current_unix_time())
}

/// Verify at a specific timestamp.
pub fn verify_code_at(
    secret_b32: &str,
    params: &TotpParams,
    code: &str,
    drift_window: u32,
    unix_seconds: u64,
) -> Result<VerifyResult, TotpError> {
    params.validate()?;
    let key = SecretKey::from_base32(secret_b32)?;
    verify_key_at(&key, params, code, drift_window, unix_seconds)
}

fn verify_key_at(
    key: &SecretKey,
    params: &TotpParams,
    code: &str,
    drift_window: u32,
    unix_seconds: u64,
) -> Result<VerifyResult, TotpError> {
    if drift_window > MAX_DRIFT_WINDOW {
        return Err(
            TotpError::new(TotpErrorKind::InvalidParameters, "Drift window too large")
                .with_detail(format!("got {drift_window}, expected at most {MAX_DRIFT_WINDOW}")),
        );
    }
    let code = code.trim().replace(' ', "");
    // Check the code itself (must be digits only, correct length)
    if code.len() != params.digits as usize || !code.chars().all(|c| c.is_ascii_digit()) {
        return Ok(VerifyResult::rejected());
    }

    let base_counter = time_step_at(unix_seconds, params.period);
    let start = base_counter.saturating_sub(drift_window as u64);
    let end = base_counter.saturating_add(drift_window as u64);

    for c in start..=end {
        let generated = hotp_raw(key.as_bytes(), c, params.digits, params.algorithm)?;
        if constant_time_eq(generated.as_bytes(), code.as_bytes()) {
            let drift = c as i64 - base_counter as i64;
            return Ok(VerifyResult {
                valid: true,
                drift,
                matched_counter: Some(c),
            });
        }
    }

    Ok(VerifyResult::rejected())
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Generator bound to one secret
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A decoded secret plus the parameters it was enrolled with.
///
/// Stateless apart from those two values, so a single instance can be
/// shared across threads.
#[derive(Debug, Clone)]
pub struct Totp {
    key: SecretKey,
    params: TotpParams,
}

impl Totp {
    /// Decode a base-32 secret and bind it to `params`.
    pub fn new(secret_b32: &str, params: TotpParams) -> Result<Self, TotpError> {
        params.validate()?;
        let key = SecretKey::from_base32(secret_b32)?;
        Ok(Self { key, params })
    }

    /// Bind an already-decoded key.
    pub fn from_key(key: SecretKey, params: TotpParams) -> Result<Self, TotpError> {
        params.validate()?;
        Ok(Self { key, params })
    }

    /// Build from an `otpauth://totp/...` enrolment URI.
    pub fn from_uri(uri: &str) -> Result<Self, TotpError> {
        let parsed = parse_otpauth_uri(uri)?;
        Self::new(&parsed.secret, parsed.params)
    }

    pub fn params(&self) -> &TotpParams {
        &self.params
    }

    /// Code for the current wall-clock time.
    pub fn generate(&self) -> Result<String, TotpError> {
        self.generate_at(current_unix_time())
    }

    /// Code for an explicit unix timestamp.
    pub fn generate_at(&self, unix_seconds: u64) -> Result<String, TotpError> {
        let step = time_step_at(unix_seconds, self.params.period);
        hotp_raw(self.key.as_bytes(), step, self.params.digits, self.params.algorithm)
    }

    /// Code for an explicit instant.
    pub fn generate_at_time(&self, at: DateTime<Utc>) -> Result<String, TotpError> {
        self.generate_at(unix_seconds_of(at)?)
    }

    /// Code plus timing info for the current time.
    pub fn current(&self) -> Result<GeneratedCode, TotpError> {
        self.generated_at(current_unix_time())
    }

    /// Code plus timing info for an explicit unix timestamp.
    pub fn generated_at(&self, unix_seconds: u64) -> Result<GeneratedCode, TotpError> {
        let period = self.params.period;
        let counter = time_step_at(unix_seconds, period);
        let code = self.generate_at(unix_seconds)?;
        let next_window = counter
            .checked_add(1)
            .and_then(|c| c.checked_mul(period as u64))
            .and_then(|s| i64::try_from(s).ok())
            .and_then(|s| DateTime::<Utc>::from_timestamp(s, 0))
            .ok_or_else(|| {
                TotpError::new(TotpErrorKind::InvalidParameters, "Instant out of range")
                    .with_detail(unix_seconds.to_string())
            })?;
        Ok(GeneratedCode {
            code,
            counter,
            period,
            remaining_seconds: seconds_remaining_at(unix_seconds, period),
            valid_until: next_window,
        })
    }

    /// Verify a code at an explicit unix timestamp.
    pub fn verify_at(&self, code: &str, drift_window: u32, unix_seconds: u64) -> Result<VerifyResult, TotpError> {
        verify_key_at(&self.key, &self.params, code, drift_window, unix_seconds)
    }

    /// Verify a code at the current time.
    pub fn verify(&self, code: &str, drift_window: u32) -> Result<VerifyResult, TotpError> {
        self.verify_at(code, drift_window, current_unix_time())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Utility helpers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Decode a base-32 secret (with or without spaces/dashes, case-insensitive).
pub fn decode_secret(b32: &str) -> Result<Vec<u8>, TotpError> {
    SecretKey::from_base32(b32).map(|k| k.as_bytes().to_vec())
}

/// Check if a string looks like a valid base-32 secret.
pub fn is_valid_base32(s: &str) -> bool {
    let cleaned = normalise_base32(s);
    if cleaned.is_empty() {
        return false;
    }
    cleaned.chars().all(|c| matches!(c, 'A'..='Z' | '2'..='7' | '='))
        && SecretKey::from_base32(&cleaned).is_ok()
}

/// Format an OTP code with a space in the middle (e.g. "123 456").
pub fn format_code_display(code: &str) -> String {
    if code.len() <= 4 {
        return code.to_string();
    }
    let mid = code.len() / 2;
    format!("{} {}", &code[..mid], &code[mid..])
}

/// Current unix timestamp in seconds.
fn current_unix_time() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

fn unix_seconds_of(at: DateTime<Utc>) -> Result<u64, TotpError> {
    u64::try_from(at.timestamp()).map_err(|_| {
        TotpError::new(TotpErrorKind::InvalidParameters, "Instant precedes the Unix epoch")
            .with_detail(at.to_rfc3339())
    })
}

/// Constant-time byte comparison.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    // ── RFC 4226 test vectors (Appendix D) ───────────────────────
    // Secret: "12345678901234567890" (ASCII) → base32: GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ

    const RFC4226_SECRET: &str = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ";

    fn eight(algo: Algorithm) -> TotpParams {
        TotpParams::default().with_digits(8).with_algorithm(algo)
    }

    fn sha256_secret() -> String {
        data_encoding::BASE32_NOPAD.encode(b"12345678901234567890123456789012")
    }

    fn sha512_secret() -> String {
        data_encoding::BASE32_NOPAD.encode(b"1234567890123456789012345678901234567890123456789012345678901234")
    }

    #[test]
    fn rfc4226_hotp_vectors() {
        let expected = [
            "755224", "287082", "359152", "969429", "338314",
            "254676", "287922", "162583", "399871", "520489",
        ];
        let params = TotpParams::default();
        for (counter, exp) in expected.iter().enumerate() {
            let code = generate_hotp(RFC4226_SECRET, counter as u64, &params).unwrap();
            assert_eq!(&code, exp, "HOTP mismatch at counter {}", counter);
        }
    }

    // ── RFC 6238 test vectors (Appendix B) ───────────────────────

    #[test]
    fn rfc6238_totp_sha1() {
        // At T=59s → step 1
        let code = generate_totp_at(RFC4226_SECRET, &eight(Algorithm::Sha1), 59).unwrap();
        assert_eq!(code, "94287082");
    }

    #[test]
    fn rfc6238_full_table() {
        let table: [(u64, &str, &str, &str); 6] = [
            (59, "94287082", "46119246", "90693936"),
            (1111111109, "07081804", "68084774", "25091201"),
            (1111111111, "14050471", "67062674", "99943326"),
            (1234567890, "89005924", "91819424", "93441116"),
            (2000000000, "69279037", "90698825", "38618901"),
            (20000000000, "65353130", "77737706", "47863826"),
        ];
        let s256 = sha256_secret();
        let s512 = sha512_secret();
        for (t, sha1, sha256, sha512) in table {
            assert_eq!(generate_totp_at(RFC4226_SECRET, &eight(Algorithm::Sha1), t).unwrap(), sha1, "SHA1 t={t}");
            assert_eq!(generate_totp_at(&s256, &eight(Algorithm::Sha256), t).unwrap(), sha256, "SHA256 t={t}");
            assert_eq!(generate_totp_at(&s512, &eight(Algorithm::Sha512), t).unwrap(), sha512, "SHA512 t={t}");
        }
    }

    #[test]
    fn rfc6238_via_datetime() {
        let at = Utc.with_ymd_and_hms(2005, 3, 18, 1, 58, 29).unwrap();
        assert_eq!(at.timestamp(), 1111111109);
        let code = generate_totp_at_time(RFC4226_SECRET, &eight(Algorithm::Sha1), at).unwrap();
        assert_eq!(code, "07081804");
    }

    #[test]
    fn pre_epoch_instant_rejected() {
        let at = Utc.with_ymd_and_hms(1969, 12, 31, 23, 59, 0).unwrap();
        let err = generate_totp_at_time(RFC4226_SECRET, &TotpParams::default(), at).unwrap_err();
        assert_eq!(err.kind, TotpErrorKind::InvalidParameters);
    }

    #[test]
    fn adjacent_periods_differ() {
        let p = eight(Algorithm::Sha1);
        assert_eq!(generate_totp_at(RFC4226_SECRET, &p, 29).unwrap(), "84755224");
        assert_eq!(generate_totp_at(RFC4226_SECRET, &p, 30).unwrap(), "94287082");
        assert_eq!(generate_totp_at(RFC4226_SECRET, &p, 59).unwrap(), "94287082");
        assert_eq!(generate_totp_at(RFC4226_SECRET, &p, 60).unwrap(), "37359152");
    }

    #[test]
    fn period_need_not_divide_anything() {
        let p = TotpParams::default().with_period(7);
        // t=13 → step 1, t=14 → step 2
        assert_eq!(generate_totp_at(RFC4226_SECRET, &p, 13).unwrap(), "287082");
        assert_eq!(generate_totp_at(RFC4226_SECRET, &p, 14).unwrap(), "359152");
    }

    // ── Truncation / padding ─────────────────────────────────────

    #[test]
    fn truncate_pads_small_values() {
        let mut digest = [0u8; 20];
        digest[3] = 42; // offset 0 (low nibble of last byte)
        assert_eq!(truncate(&digest, 6), "000042");
        assert_eq!(truncate(&digest, 10), "0000000042");
    }

    #[test]
    fn truncate_masks_top_bit() {
        let mut digest = [0u8; 20];
        digest[19] = 0x02; // offset 2
        digest[2..6].copy_from_slice(&[0xff, 0xff, 0xff, 0xff]);
        // 0x7fffffff = 2147483647
        assert_eq!(truncate(&digest, 10), "2147483647");
        assert_eq!(truncate(&digest, 6), "483647");
    }

    #[test]
    fn ten_digit_codes() {
        let p = TotpParams::default().with_digits(10);
        assert_eq!(generate_hotp(RFC4226_SECRET, 0, &p).unwrap(), "1284755224");
        assert_eq!(generate_hotp(RFC4226_SECRET, 2, &p).unwrap(), "0137359152");
        assert_eq!(generate_hotp(RFC4226_SECRET, 7, &p).unwrap(), "0082162583");
    }

    // ── Time-step helpers ────────────────────────────────────────

    #[test]
    fn time_step_calculation() {
        assert_eq!(time_step_at(0, 30), 0);
        assert_eq!(time_step_at(29, 30), 0);
        assert_eq!(time_step_at(30, 30), 1);
        assert_eq!(time_step_at(59, 30), 1);
        assert_eq!(time_step_at(60, 30), 2);
    }

    #[test]
    fn seconds_remaining_calculation() {
        assert_eq!(seconds_remaining_at(0, 30), 30);
        assert_eq!(seconds_remaining_at(1, 30), 29);
        assert_eq!(seconds_remaining_at(29, 30), 1);
        assert_eq!(seconds_remaining_at(30, 30), 30);
    }

    #[test]
    fn wall_clock_helpers_stay_in_range() {
        assert!(time_step(30) > 0);
        let r = seconds_remaining(30);
        assert!((1..=30).contains(&r));
    }

    // ── Validation ───────────────────────────────────────────────

    #[test]
    fn invalid_secret_rejected() {
        for secret in ["", "!!!INVALID!!!", "   ", "=", "========", "A", "ABC", "ME=A"] {
            let err = generate_totp_at(secret, &TotpParams::default(), 59).unwrap_err();
            assert_eq!(err.kind, TotpErrorKind::InvalidSecret, "secret={secret:?}");
        }
    }

    #[test]
    fn invalid_params_rejected_before_decoding() {
        let p = TotpParams::default().with_digits(0);
        let err = generate_totp_at(RFC4226_SECRET, &p, 59).unwrap_err();
        assert_eq!(err.kind, TotpErrorKind::InvalidParameters);

        // parameters are checked first even when the secret is also bad
        let p = TotpParams::default().with_period(0);
        let err = generate_totp_at("!!!", &p, 59).unwrap_err();
        assert_eq!(err.kind, TotpErrorKind::InvalidParameters);
    }

    // ── Totp value ───────────────────────────────────────────────

    #[test]
    fn totp_matches_free_functions() {
        let totp = Totp::new(RFC4226_SECRET, eight(Algorithm::Sha1)).unwrap();
        assert_eq!(totp.generate_at(59).unwrap(), "94287082");
        assert_eq!(totp.generate_at(1111111109).unwrap(), "07081804");
        assert_eq!(totp.params().digits, 8);
    }

    #[test]
    fn totp_from_raw_key() {
        let key = SecretKey::from_bytes(b"12345678901234567890".to_vec()).unwrap();
        let totp = Totp::from_key(key, eight(Algorithm::Sha1)).unwrap();
        assert_eq!(totp.generate_at(59).unwrap(), "94287082");
    }

    #[test]
    fn totp_from_key_validates_params() {
        let key = SecretKey::from_bytes(b"12345678901234567890".to_vec()).unwrap();
        let err = Totp::from_key(key, TotpParams::default().with_digits(11)).unwrap_err();
        assert_eq!(err.kind, TotpErrorKind::InvalidParameters);
    }

    #[test]
    fn totp_from_uri() {
        let uri = format!("otpauth://totp/Docker:alice?secret={RFC4226_SECRET}&digits=8&issuer=Docker");
        let totp = Totp::from_uri(&uri).unwrap();
        assert_eq!(totp.generate_at(59).unwrap(), "94287082");
    }

    #[test]
    fn generated_code_timing() {
        let totp = Totp::new(RFC4226_SECRET, TotpParams::default()).unwrap();
        let g = totp.generated_at(59).unwrap();
        assert_eq!(g.code, "287082"); // 6-digit at step 1
        assert_eq!(g.counter, 1);
        assert_eq!(g.period, 30);
        assert_eq!(g.remaining_seconds, 1);
        assert_eq!(g.valid_until.timestamp(), 60);
    }

    #[test]
    fn generate_uses_wall_clock() {
        let totp = Totp::new(RFC4226_SECRET, TotpParams::default()).unwrap();
        let code = totp.generate().unwrap();
        assert_eq!(code.len(), 6);
        let current = totp.current().unwrap();
        assert_eq!(current.code.len(), 6);
    }

    // ── Verification ─────────────────────────────────────────────

    #[test]
    fn verify_totp_exact() {
        // At T=59 the code is "287082"
        let vr = verify_code_at(RFC4226_SECRET, &TotpParams::default(), "287082", 0, 59).unwrap();
        assert!(vr.valid);
        assert_eq!(vr.drift, 0);
        assert_eq!(vr.matched_counter, Some(1));
    }

    #[test]
    fn verify_totp_with_drift() {
        // Step 0 code is "755224"; at T=59 (step 1) drift=1 still matches.
        let vr = verify_code_at(RFC4226_SECRET, &TotpParams::default(), "755224", 1, 59).unwrap();
        assert!(vr.valid);
        assert_eq!(vr.drift, -1);

        let vr = verify_code_at(RFC4226_SECRET, &TotpParams::default(), "755224", 0, 59).unwrap();
        assert!(!vr.valid);
    }

    #[test]
    fn verify_accepts_display_format() {
        let totp = Totp::new(RFC4226_SECRET, TotpParams::default()).unwrap();
        let vr = totp.verify_at(&format_code_display("287082"), 0, 59).unwrap();
        assert!(vr.valid);
    }

    #[test]
    fn verify_wrong_code_or_length() {
        let p = TotpParams::default();
        assert!(!verify_code_at(RFC4226_SECRET, &p, "000000", 0, 59).unwrap().valid);
        assert!(!verify_code_at(RFC4226_SECRET, &p, "12345", 0, 59).unwrap().valid);
        assert!(!verify_code_at(RFC4226_SECRET, &p, "28708a", 0, 59).unwrap().valid);
    }

    #[test]
    fn verify_rejects_oversized_window() {
        let totp = Totp::new(RFC4226_SECRET, TotpParams::default()).unwrap();
        let vr = totp.verify_at("287082", MAX_DRIFT_WINDOW, 59).unwrap();
        assert!(vr.valid);
        for window in [MAX_DRIFT_WINDOW + 1, 1_000_000, u32::MAX] {
            let err = totp.verify_at("000001", window, 1_700_000_000).unwrap_err();
            assert_eq!(err.kind, TotpErrorKind::InvalidParameters, "window={window}");
        }
        let err = verify_code_at(RFC4226_SECRET, &TotpParams::default(), "287082", 11, 59).unwrap_err();
        assert_eq!(err.kind, TotpErrorKind::InvalidParameters);
    }

    #[test]
    fn verify_near_epoch_saturates() {
        let vr = verify_code_at(RFC4226_SECRET, &TotpParams::default(), "755224", 5, 0).unwrap();
        assert!(vr.valid);
        assert_eq!(vr.matched_counter, Some(0));
    }

    // ── Helpers ──────────────────────────────────────────────────

    #[test]
    fn decode_secret_roundtrip_bytes() {
        assert_eq!(decode_secret(RFC4226_SECRET).unwrap(), b"12345678901234567890");
        assert!(decode_secret("!!!").is_err());
    }

    #[test]
    fn is_valid_base32_check() {
        assert!(is_valid_base32("JBSWY3DPEHPK3PXP"));
        assert!(is_valid_base32("jbsw y3dp ehpk 3pxp"));
        assert!(!is_valid_base32(""));
        assert!(!is_valid_base32("!!!"));
    }

    #[test]
    fn format_code_split() {
        assert_eq!(format_code_display("123456"), "123 456");
        assert_eq!(format_code_display("12345678"), "1234 5678");
        assert_eq!(format_code_display("1234"), "1234");
    }

    #[test]
    fn constant_time_eq_works() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"ab"));
    }

    #[test]
    fn totp_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Totp>();
    }
}
