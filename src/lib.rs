//! # Helix-Seal: envelope encryption and secret hydration
//!
//! `helix-seal` carries the two small, contract-bearing utilities shared across the
//! Helix services:
//!
//! - **Envelope cipher** ([`envelope`]): turns any `serde`-serializable value into a
//!   versioned, self-describing [`EncryptedPayload`] using AES-256-GCM with a key
//!   stretched by scrypt, and back again.
//! - **Secret store** ([`secrets`]): fetches the secret set of a project from
//!   Infisical exactly once, caches it, and mirrors it into the process environment
//!   without overwriting values that were already set.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use helix_seal::envelope::{EnvelopeCipher, KeyMaterial};
//!
//! fn main() -> helix_seal::Result<()> {
//!     let key = KeyMaterial::passphrase("correct horse battery staple");
//!     let cipher = EnvelopeCipher::with_key(key);
//!
//!     let payload = cipher.encrypt(&serde_json::json!({ "plan": "pro" }))?;
//!     let value: serde_json::Value = cipher.decrypt(&payload)?;
//!     assert_eq!(value["plan"], "pro");
//!     Ok(())
//! }
//! ```
//!
//! ```rust,ignore
//! #[tokio::main]
//! async fn main() {
//!     // Never fails: an unconfigured or unreachable secret manager yields no secrets.
//!     helix_seal::secrets::hydrate_env_from_infisical().await;
//!     let url = helix_seal::secrets::get_secret_from_cache("DATABASE_URL", "");
//! }
//! ```

pub mod common;
pub mod error;

#[cfg(feature = "envelope")]
pub mod envelope;

#[cfg(feature = "secrets")]
pub mod secrets;

pub use common::config::ConfigFile;
pub use error::{Error, Result};

#[cfg(feature = "envelope")]
pub use envelope::{EncryptedPayload, EnvelopeCipher, EnvelopeOptions, KeyMaterial, decrypt, encrypt};

#[cfg(feature = "secrets")]
pub use secrets::{SecretMap, SecretSource, SecretStore};

/// The version of the `helix-seal` crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
