use thiserror::Error;

/// 密钥源可能遇到的错误类型
///
/// These never reach callers of [`SecretStore`](crate::secrets::SecretStore);
/// the store logs them and degrades to an empty secret set.
#[derive(Error, Debug)]
pub enum SecretSourceError {
    #[cfg(feature = "infisical")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("secret manager returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("failed to decode secret manager response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("authentication with the secret manager failed: {0}")]
    Auth(String),

    #[error("invalid secret source configuration: {0}")]
    Config(String),

    #[error("secret source error: {0}")]
    Other(String),
}
