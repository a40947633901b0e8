//!
//! 集成测试的通用辅助函数
//!
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[cfg(feature = "envelope")]
use helix_seal::common::config::{EnvelopeConfig, ScryptConfig};

#[cfg(feature = "secrets")]
use helix_seal::secrets::{SecretMap, SecretSource, SecretSourceError};

/// (For envelope tests) 低代价的 scrypt 参数，且主密钥环境变量从不设置。
#[cfg(feature = "envelope")]
pub fn fast_envelope_config() -> EnvelopeConfig {
    EnvelopeConfig {
        primary_key_env: "HELIX_SEAL_INTEGRATION_KEY_NEVER_SET".to_string(),
        scrypt: ScryptConfig {
            log_n: 8,
            r: 8,
            p: 1,
        },
    }
}

/// 安装一次测试用日志订阅者
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// 记录调用次数的模拟密钥源
#[cfg(feature = "secrets")]
pub struct CountingSource {
    calls: AtomicUsize,
    delay: Duration,
    response: Result<Option<SecretMap>, String>,
}

#[cfg(feature = "secrets")]
impl CountingSource {
    pub fn returning(pairs: &[(&str, &str)]) -> Arc<Self> {
        let secrets = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            delay: Duration::ZERO,
            response: Ok(Some(secrets)),
        })
    }

    pub fn unconfigured() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            delay: Duration::ZERO,
            response: Ok(None),
        })
    }

    pub fn failing(reason: &str) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            delay: Duration::ZERO,
            response: Err(reason.to_string()),
        })
    }

    /// 每次加载前等待，让并发调用者在加载完成前到达
    pub fn slow(pairs: &[(&str, &str)], delay: Duration) -> Arc<Self> {
        let secrets = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            delay,
            response: Ok(Some(secrets)),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[cfg(feature = "secrets")]
#[async_trait::async_trait]
impl SecretSource for CountingSource {
    async fn load_all_secrets(&self) -> Result<Option<SecretMap>, SecretSourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.response
            .clone()
            .map_err(SecretSourceError::Other)
    }

    fn name(&self) -> &str {
        "counting"
    }
}
