//! # hubarchive – TOTP generator
//!
//! Time-based one-time codes for the registry console's second factor:
//!
//! - **RFC 4226 / 6238** – HOTP & TOTP generation with SHA-1, SHA-256, SHA-512
//! - **Injectable time** – every generator has an `_at` variant taking unix
//!   seconds or a `chrono` instant
//! - **otpauth:// URIs** – secrets handed out as enrolment URIs are accepted as-is
//! - **Verification** – drift-window check for confirming a configured secret

pub mod totp;
