//! Key material and scrypt key derivation.

use scrypt::{Params, scrypt};
use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use zeroize::Zeroizing;

use crate::common::config::ScryptConfig;
use crate::common::utils::from_base64;
use crate::envelope::errors::EnvelopeError;

/// Length of the derived AES-256 key.
pub const KEY_SIZE: usize = 32;

/// Length of the scrypt salt.
pub const SALT_SIZE: usize = 16;

/// Prefix marking an environment value as a base64-encoded raw key.
const RAW_KEY_PREFIX: &str = "base64:";

/// The secret an envelope key is obtained from.
///
/// A raw key is used as-is; a passphrase is always stretched with scrypt, even
/// when it happens to be 32 bytes long.
pub enum KeyMaterial {
    /// Ready-made 256-bit key, bypasses the KDF.
    Raw(Zeroizing<[u8; KEY_SIZE]>),
    /// Passphrase fed to scrypt together with the payload salt.
    Passphrase(SecretString),
}

impl KeyMaterial {
    pub fn raw(key: [u8; KEY_SIZE]) -> Self {
        KeyMaterial::Raw(Zeroizing::new(key))
    }

    pub fn passphrase(passphrase: impl Into<String>) -> Self {
        KeyMaterial::Passphrase(SecretString::from(passphrase.into()))
    }

    /// Interprets a configuration value.
    ///
    /// `base64:<data>` must decode to exactly [`KEY_SIZE`] bytes and becomes a
    /// raw key; every other value is a passphrase.
    pub fn from_env_value(value: &str) -> Result<Self, EnvelopeError> {
        let Some(encoded) = value.strip_prefix(RAW_KEY_PREFIX) else {
            return Ok(Self::passphrase(value));
        };

        let bytes = Zeroizing::new(from_base64(encoded.trim()).map_err(|source| {
            EnvelopeError::Base64Decode {
                field: "primaryKey",
                source,
            }
        })?);
        let key: [u8; KEY_SIZE] =
            bytes
                .as_slice()
                .try_into()
                .map_err(|_| EnvelopeError::InvalidLength {
                    field: "primaryKey",
                    expected: KEY_SIZE,
                    actual: bytes.len(),
                })?;
        Ok(Self::raw(key))
    }

    pub fn is_raw(&self) -> bool {
        matches!(self, KeyMaterial::Raw(_))
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyMaterial::Raw(_) => f.write_str("KeyMaterial::Raw([REDACTED])"),
            KeyMaterial::Passphrase(_) => f.write_str("KeyMaterial::Passphrase([REDACTED])"),
        }
    }
}

/// Produces the 32-byte AES key for `salt`.
pub fn derive_key(
    material: &KeyMaterial,
    salt: &[u8],
    config: &ScryptConfig,
) -> Result<Zeroizing<[u8; KEY_SIZE]>, EnvelopeError> {
    match material {
        KeyMaterial::Raw(key) => Ok(Zeroizing::new(**key)),
        KeyMaterial::Passphrase(passphrase) => {
            let params = Params::new(config.log_n, config.r, config.p, KEY_SIZE)
                .map_err(|_| EnvelopeError::KeyDerivation)?;
            let mut key = Zeroizing::new([0u8; KEY_SIZE]);
            scrypt(
                passphrase.expose_secret().as_bytes(),
                salt,
                &params,
                &mut key[..],
            )
            .map_err(|_| EnvelopeError::KeyDerivation)?;
            Ok(key)
        }
    }
}
