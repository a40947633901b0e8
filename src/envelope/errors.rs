use thiserror::Error;

use crate::common::config::ConfigError;

/// 信封加密可能遇到的错误类型
///
/// `Authentication` deliberately carries no detail: a wrong key, a tampered
/// blob and corrupted storage are indistinguishable to the caller.
#[derive(Error, Debug)]
pub enum EnvelopeError {
    #[error("invalid envelope configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("no primary key material: pass one explicitly or set `{env}`")]
    MissingKey { env: String },

    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("unsupported key derivation function: {0}")]
    UnsupportedKdf(String),

    #[error("unsupported payload version: {0}")]
    UnsupportedVersion(u32),

    #[error("payload carries a second encryption layer, which is not supported")]
    UnsupportedLayer,

    #[error("invalid length for `{field}`: expected {expected} bytes, got {actual}")]
    InvalidLength {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("cipher text is too short: {actual} bytes")]
    CiphertextTooShort { actual: usize },

    #[error("base64 decoding of `{field}` failed: {source}")]
    Base64Decode {
        field: &'static str,
        #[source]
        source: base64::DecodeError,
    },

    #[error("key derivation failed: invalid scrypt parameters")]
    KeyDerivation,

    #[error("random number generation failed: {0}")]
    Random(#[from] rand_core::OsError),

    #[error("encryption failed")]
    Encryption,

    #[error("decryption failed")]
    Authentication,

    #[error("serialization error (JSON): {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EnvelopeError {
    /// `true` for structural problems detected before any cryptographic work.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            EnvelopeError::UnsupportedAlgorithm(_)
                | EnvelopeError::UnsupportedKdf(_)
                | EnvelopeError::UnsupportedVersion(_)
                | EnvelopeError::UnsupportedLayer
                | EnvelopeError::InvalidLength { .. }
                | EnvelopeError::CiphertextTooShort { .. }
                | EnvelopeError::Base64Decode { .. }
        )
    }
}
