//! 信封加密核心模块
//!
//! Encrypts any `serde`-serializable value into an [`EncryptedPayload`]:
//! AES-256-GCM under a 32-byte key that is either supplied raw or stretched
//! from a passphrase with scrypt. Every call draws a fresh salt and IV, so two
//! payloads for the same value never compare equal.

pub mod cipher;
pub mod errors;
pub mod kdf;
pub mod payload;

pub use self::cipher::{EnvelopeCipher, EnvelopeOptions, IV_SIZE, TAG_SIZE, decrypt, encrypt};
pub use self::errors::EnvelopeError;
pub use self::kdf::{KEY_SIZE, KeyMaterial, SALT_SIZE, derive_key};
pub use self::payload::EncryptedPayload;
