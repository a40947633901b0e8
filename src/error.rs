//! Defines the crate-wide error type for `helix-seal`.

use thiserror::Error;

use crate::common::config::ConfigError;

#[cfg(feature = "envelope")]
use crate::envelope::errors::EnvelopeError;

#[cfg(feature = "secrets")]
use crate::secrets::errors::SecretSourceError;

/// The main error type for the `helix-seal` crate.
///
/// Each component keeps its own error enum; this type only unifies them for
/// callers that touch more than one component.
#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[cfg(feature = "envelope")]
    #[error("envelope error: {0}")]
    Envelope(#[from] EnvelopeError),

    #[cfg(feature = "secrets")]
    #[error("secret source error: {0}")]
    SecretSource(#[from] SecretSourceError),
}

/// Shorthand for results carrying the crate-wide [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;
