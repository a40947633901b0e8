//! The stored/transmitted form of an encrypted value.
//!
//! The JSON field names, the base64 encodings and the tag-before-ciphertext
//! layout of `cipherText` are a persisted format: payloads written by other
//! services must keep decrypting.

use serde::{Deserialize, Serialize};

use crate::common::utils::{from_base64, to_base64};
use crate::envelope::cipher::{IV_SIZE, TAG_SIZE};
use crate::envelope::errors::EnvelopeError;
use crate::envelope::kdf::SALT_SIZE;

/// The only defined payload format version.
pub const PAYLOAD_VERSION: u32 = 1;

/// Cipher identifier carried by every payload.
pub const ALGORITHM: &str = "aes-256-gcm";

/// KDF identifier carried by every payload.
pub const KDF: &str = "scrypt";

/// Layer count written into new payloads.
///
/// Only the first layer is ever applied; `iv2` and `salt2` stay empty.
pub const DECLARED_LAYERS: u32 = 2;

/// A versioned, self-describing encrypted value.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedPayload {
    pub version: u32,
    pub algorithm: String,
    pub kdf: String,
    pub layers: u32,
    /// base64(tag[16] || ciphertext)
    pub cipher_text: String,
    /// base64, 12 bytes
    pub iv1: String,
    #[serde(default)]
    pub iv2: String,
    /// base64, 16 bytes
    pub salt1: String,
    #[serde(default)]
    pub salt2: String,
}

/// Binary fields of a payload that passed every structural check.
#[cfg_attr(test, derive(Debug))]
pub(crate) struct DecodedPayload {
    pub salt: [u8; SALT_SIZE],
    pub iv: [u8; IV_SIZE],
    pub tag: [u8; TAG_SIZE],
    pub ciphertext: Vec<u8>,
}

impl EncryptedPayload {
    pub(crate) fn single_layer(
        tag_and_ciphertext: &[u8],
        iv: &[u8; IV_SIZE],
        salt: &[u8; SALT_SIZE],
    ) -> Self {
        Self {
            version: PAYLOAD_VERSION,
            algorithm: ALGORITHM.to_string(),
            kdf: KDF.to_string(),
            layers: DECLARED_LAYERS,
            cipher_text: to_base64(tag_and_ciphertext),
            iv1: to_base64(iv),
            iv2: String::new(),
            salt1: to_base64(salt),
            salt2: String::new(),
        }
    }

    /// Serializes the payload to its JSON wire form.
    pub fn to_json(&self) -> Result<String, EnvelopeError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parses a payload from its JSON wire form without validating it.
    pub fn from_json(json: &str) -> Result<Self, EnvelopeError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Runs every structural check and decodes the binary fields.
    pub(crate) fn decode(&self) -> Result<DecodedPayload, EnvelopeError> {
        if self.algorithm != ALGORITHM {
            return Err(EnvelopeError::UnsupportedAlgorithm(self.algorithm.clone()));
        }
        if self.kdf != KDF {
            return Err(EnvelopeError::UnsupportedKdf(self.kdf.clone()));
        }
        if self.version != PAYLOAD_VERSION {
            return Err(EnvelopeError::UnsupportedVersion(self.version));
        }
        if !self.iv2.is_empty() || !self.salt2.is_empty() {
            return Err(EnvelopeError::UnsupportedLayer);
        }

        let salt = decode_exact::<SALT_SIZE>("salt1", &self.salt1)?;
        let iv = decode_exact::<IV_SIZE>("iv1", &self.iv1)?;

        let blob = decode_field("cipherText", &self.cipher_text)?;
        if blob.len() <= TAG_SIZE {
            return Err(EnvelopeError::CiphertextTooShort { actual: blob.len() });
        }
        let (tag, ciphertext) = blob.split_at(TAG_SIZE);
        let mut tag_bytes = [0u8; TAG_SIZE];
        tag_bytes.copy_from_slice(tag);

        Ok(DecodedPayload {
            salt,
            iv,
            tag: tag_bytes,
            ciphertext: ciphertext.to_vec(),
        })
    }
}

fn decode_field(field: &'static str, encoded: &str) -> Result<Vec<u8>, EnvelopeError> {
    from_base64(encoded).map_err(|source| EnvelopeError::Base64Decode { field, source })
}

fn decode_exact<const N: usize>(field: &'static str, encoded: &str) -> Result<[u8; N], EnvelopeError> {
    let bytes = decode_field(field, encoded)?;
    bytes
        .as_slice()
        .try_into()
        .map_err(|_| EnvelopeError::InvalidLength {
            field,
            expected: N,
            actual: bytes.len(),
        })
}
