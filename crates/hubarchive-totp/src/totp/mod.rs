//! TOTP crate: sub-modules.

pub mod types;
pub mod secret;
pub mod core;
pub mod uri;

// Re-export top-level items for convenience.
pub use types::*;
pub use secret::SecretKey;
pub use self::core::Totp;
pub use uri::{parse_otpauth_uri, OtpAuthUri};
