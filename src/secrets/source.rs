//! Abstraction over remote secret managers.

use async_trait::async_trait;

use crate::secrets::SecretMap;
use crate::secrets::errors::SecretSourceError;

/// Defines the interface a secret manager client exposes to the store.
///
/// 中文: 定义密钥管理器客户端向缓存暴露的接口。
#[async_trait]
pub trait SecretSource: Send + Sync {
    /// Fetches every secret visible to this client.
    ///
    /// `Ok(None)` means the client has no configuration to talk to a secret
    /// manager at all. This is an expected outcome, not an error.
    async fn load_all_secrets(&self) -> Result<Option<SecretMap>, SecretSourceError>;

    /// Short name used in log events.
    fn name(&self) -> &str {
        "secret-source"
    }
}

/// A source that is never configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unconfigured;

#[async_trait]
impl SecretSource for Unconfigured {
    async fn load_all_secrets(&self) -> Result<Option<SecretMap>, SecretSourceError> {
        Ok(None)
    }

    fn name(&self) -> &str {
        "unconfigured"
    }
}

/// A source whose configuration could not be read.
///
/// Every load fails with the configuration error, so the store reports
/// [`HydrationOutcome::Failed`](crate::secrets::HydrationOutcome::Failed)
/// instead of treating the source as absent.
#[derive(Debug, Clone)]
pub struct Misconfigured {
    reason: String,
}

impl Misconfigured {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl SecretSource for Misconfigured {
    async fn load_all_secrets(&self) -> Result<Option<SecretMap>, SecretSourceError> {
        Err(SecretSourceError::Config(self.reason.clone()))
    }

    fn name(&self) -> &str {
        "misconfigured"
    }
}
