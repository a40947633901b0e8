//! AES-256-GCM envelope encryption of JSON values.

use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce, Tag};
use rand_core::{OsRng, TryRngCore};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::OnceLock;
use zeroize::Zeroizing;

use crate::common::config::EnvelopeConfig;
use crate::common::utils::env_var;
use crate::envelope::errors::EnvelopeError;
use crate::envelope::kdf::{KeyMaterial, SALT_SIZE, derive_key};
use crate::envelope::payload::EncryptedPayload;

/// AES-GCM IV length.
pub const IV_SIZE: usize = 12;

/// AES-GCM authentication tag length.
pub const TAG_SIZE: usize = 16;

/// Per-call overrides.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvelopeOptions<'a> {
    /// Takes precedence over the cipher's default key and the environment.
    pub primary_key: Option<&'a KeyMaterial>,
}

impl<'a> EnvelopeOptions<'a> {
    pub fn with_key(key: &'a KeyMaterial) -> Self {
        Self {
            primary_key: Some(key),
        }
    }
}

/// Encrypts and decrypts [`EncryptedPayload`]s.
///
/// Key material is resolved per call, first match wins:
/// 1. `EnvelopeOptions::primary_key`
/// 2. the key the cipher was built with
/// 3. the environment variable named by `EnvelopeConfig::primary_key_env`
#[derive(Debug, Default)]
pub struct EnvelopeCipher {
    config: EnvelopeConfig,
    default_key: Option<KeyMaterial>,
}

impl EnvelopeCipher {
    pub fn new(config: EnvelopeConfig) -> Self {
        Self {
            config,
            default_key: None,
        }
    }

    pub fn with_key(key: KeyMaterial) -> Self {
        Self::with_config_and_key(EnvelopeConfig::default(), key)
    }

    pub fn with_config_and_key(config: EnvelopeConfig, key: KeyMaterial) -> Self {
        Self {
            config,
            default_key: Some(key),
        }
    }

    pub fn config(&self) -> &EnvelopeConfig {
        &self.config
    }

    pub fn encrypt<T: Serialize + ?Sized>(&self, data: &T) -> Result<EncryptedPayload, EnvelopeError> {
        self.encrypt_with(data, &EnvelopeOptions::default())
    }

    pub fn decrypt<T: DeserializeOwned>(&self, payload: &EncryptedPayload) -> Result<T, EnvelopeError> {
        self.decrypt_with(payload, &EnvelopeOptions::default())
    }

    /// Serializes `data` to JSON and seals it under a fresh salt and IV.
    pub fn encrypt_with<T: Serialize + ?Sized>(
        &self,
        data: &T,
        options: &EnvelopeOptions<'_>,
    ) -> Result<EncryptedPayload, EnvelopeError> {
        self.with_resolved_key(options, |material| {
            let mut buffer = Zeroizing::new(serde_json::to_vec(data)?);

            let mut salt = [0u8; SALT_SIZE];
            OsRng.try_fill_bytes(&mut salt)?;
            let key = derive_key(material, &salt, &self.config.scrypt)?;

            let mut iv = [0u8; IV_SIZE];
            OsRng.try_fill_bytes(&mut iv)?;

            let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_slice()));
            let tag = cipher
                .encrypt_in_place_detached(Nonce::from_slice(&iv), &[], &mut buffer[..])
                .map_err(|_| EnvelopeError::Encryption)?;

            // 存储格式：[16字节标签][密文]
            let mut blob = Vec::with_capacity(TAG_SIZE + buffer.len());
            blob.extend_from_slice(&tag);
            blob.extend_from_slice(&buffer);

            Ok(EncryptedPayload::single_layer(&blob, &iv, &salt))
        })
    }

    /// Validates `payload`, then opens it and parses the plaintext as JSON.
    ///
    /// Structural problems are reported before any key derivation happens.
    pub fn decrypt_with<T: DeserializeOwned>(
        &self,
        payload: &EncryptedPayload,
        options: &EnvelopeOptions<'_>,
    ) -> Result<T, EnvelopeError> {
        let decoded = payload.decode()?;

        self.with_resolved_key(options, |material| {
            let key = derive_key(material, &decoded.salt, &self.config.scrypt)?;
            let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_slice()));

            let mut buffer = Zeroizing::new(decoded.ciphertext);
            cipher
                .decrypt_in_place_detached(
                    Nonce::from_slice(&decoded.iv),
                    &[],
                    &mut buffer[..],
                    Tag::from_slice(&decoded.tag),
                )
                .map_err(|_| EnvelopeError::Authentication)?;

            Ok(serde_json::from_slice(&buffer)?)
        })
    }

    fn with_resolved_key<R, F>(&self, options: &EnvelopeOptions<'_>, op: F) -> Result<R, EnvelopeError>
    where
        F: FnOnce(&KeyMaterial) -> Result<R, EnvelopeError>,
    {
        if let Some(key) = options.primary_key {
            return op(key);
        }
        if let Some(key) = &self.default_key {
            return op(key);
        }
        match env_var(&self.config.primary_key_env) {
            Some(value) => op(&KeyMaterial::from_env_value(&value)?),
            None => Err(EnvelopeError::MissingKey {
                env: self.config.primary_key_env.clone(),
            }),
        }
    }
}

/// Cipher behind the free functions, configured from `ENVELOPE_*` variables.
static PROCESS_CIPHER: OnceLock<EnvelopeCipher> = OnceLock::new();

/// 进程级默认加密器，首次成功读取配置后固定；配置无效时每次都返回错误
fn process_cipher() -> Result<&'static EnvelopeCipher, EnvelopeError> {
    if let Some(cipher) = PROCESS_CIPHER.get() {
        return Ok(cipher);
    }
    let config = EnvelopeConfig::from_env()?;
    Ok(PROCESS_CIPHER.get_or_init(|| EnvelopeCipher::new(config)))
}

/// Encrypts `data` with the process configuration.
///
/// The configuration is read once from `ENVELOPE_PRIMARY_KEY_ENV` and
/// `ENVELOPE_SCRYPT_*`; the key itself is looked up on every call.
pub fn encrypt<T: Serialize + ?Sized>(
    data: &T,
    options: &EnvelopeOptions<'_>,
) -> Result<EncryptedPayload, EnvelopeError> {
    process_cipher()?.encrypt_with(data, options)
}

/// Decrypts `payload` with the process configuration.
pub fn decrypt<T: DeserializeOwned>(
    payload: &EncryptedPayload,
    options: &EnvelopeOptions<'_>,
) -> Result<T, EnvelopeError> {
    process_cipher()?.decrypt_with(payload, options)
}
