//!
//! # 通用配置模块
//!
//! 包含信封加密与密钥缓存所使用的配置结构。
//! 配置可以从 JSON 文件加载，并由环境变量覆盖。凭据（令牌、主密钥）
//! 永远不会出现在配置文件中，只从环境变量读取。
//!
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::common::utils::env_var;

/// 默认存放信封加密主密钥的环境变量名
pub const DEFAULT_PRIMARY_KEY_ENV: &str = "ENCRYPTION_PRIMARY_KEY";

/// 默认的 Infisical 服务地址
pub const DEFAULT_INFISICAL_SITE_URL: &str = "https://app.infisical.com";

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid value for {name}: {value:?}")]
    InvalidValue { name: String, value: String },
}

/// scrypt 参数（N = 2^log_n）
///
/// 载荷中不记录这些参数，加密端和解密端必须使用相同的值。
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScryptConfig {
    /// CPU/内存代价的以 2 为底的对数
    #[serde(default = "default_log_n")]
    pub log_n: u8,
    /// 块大小
    #[serde(default = "default_block_size")]
    pub r: u32,
    /// 并行度
    #[serde(default = "default_parallelism")]
    pub p: u32,
}

fn default_log_n() -> u8 {
    14 // N = 16384
}
fn default_block_size() -> u32 {
    8
}
fn default_parallelism() -> u32 {
    1
}

impl Default for ScryptConfig {
    fn default() -> Self {
        Self {
            log_n: default_log_n(),
            r: default_block_size(),
            p: default_parallelism(),
        }
    }
}

/// 信封加密配置
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnvelopeConfig {
    /// 未显式提供密钥时，从该环境变量读取进程级默认主密钥
    #[serde(default = "default_primary_key_env")]
    pub primary_key_env: String,
    /// 密钥派生参数
    #[serde(default)]
    pub scrypt: ScryptConfig,
}

fn default_primary_key_env() -> String {
    DEFAULT_PRIMARY_KEY_ENV.to_string()
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            primary_key_env: default_primary_key_env(),
            scrypt: ScryptConfig::default(),
        }
    }
}

/// Infisical 连接配置（不含凭据）
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct InfisicalSettings {
    /// 服务地址
    #[serde(default = "default_site_url")]
    pub site_url: String,
    /// 项目（workspace）标识，缺失时密钥源视为未配置
    #[serde(default)]
    pub project_id: Option<String>,
    /// 环境 slug
    #[serde(default = "default_environment")]
    pub environment: String,
    /// 密钥路径
    #[serde(default = "default_secret_path")]
    pub secret_path: String,
    /// 是否同时拉取导入（imports）的密钥
    #[serde(default = "default_include_imports")]
    pub include_imports: bool,
    /// 请求超时（秒），为空时使用 HTTP 客户端的默认行为
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_site_url() -> String {
    DEFAULT_INFISICAL_SITE_URL.to_string()
}
fn default_environment() -> String {
    "dev".to_string()
}
fn default_secret_path() -> String {
    "/".to_string()
}
fn default_include_imports() -> bool {
    true
}

impl Default for InfisicalSettings {
    fn default() -> Self {
        Self {
            site_url: default_site_url(),
            project_id: None,
            environment: default_environment(),
            secret_path: default_secret_path(),
            include_imports: default_include_imports(),
            timeout_secs: None,
        }
    }
}

/// 完整配置文件，代表了 helix-seal 所有可配置项。
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ConfigFile {
    /// 信封加密配置
    #[serde(default)]
    pub envelope: EnvelopeConfig,
    /// Infisical 配置
    #[serde(default)]
    pub infisical: InfisicalSettings,
}

impl ConfigFile {
    /// 从 JSON 文件加载配置，缺失的字段使用默认值
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// 从默认值出发，应用进程环境变量
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// 用进程环境变量覆盖当前配置
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_vars(env_var)
    }

    /// 用任意变量查找函数覆盖当前配置
    pub fn apply_vars<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.envelope.apply_vars(&lookup)?;
        self.infisical.apply_vars(&lookup)
    }
}

impl EnvelopeConfig {
    /// 从默认值出发，只应用 `ENVELOPE_*` 环境变量
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_vars(env_var)?;
        Ok(config)
    }

    /// 用 `ENVELOPE_*` 变量覆盖当前配置
    pub fn apply_vars<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(name) = lookup("ENVELOPE_PRIMARY_KEY_ENV") {
            self.primary_key_env = name;
        }
        if let Some(log_n) = parse_var(&lookup, "ENVELOPE_SCRYPT_LOG_N")? {
            self.scrypt.log_n = log_n;
        }
        if let Some(r) = parse_var(&lookup, "ENVELOPE_SCRYPT_R")? {
            self.scrypt.r = r;
        }
        if let Some(p) = parse_var(&lookup, "ENVELOPE_SCRYPT_P")? {
            self.scrypt.p = p;
        }
        Ok(())
    }
}

impl InfisicalSettings {
    /// 请求超时
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// 从默认值出发，只应用 `INFISICAL_*` 环境变量
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut settings = Self::default();
        settings.apply_vars(env_var)?;
        Ok(settings)
    }

    /// 用 `INFISICAL_*` 变量覆盖当前配置
    pub fn apply_vars<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("INFISICAL_SITE_URL") {
            self.site_url = url;
        }
        if let Some(project_id) = lookup("INFISICAL_PROJECT_ID") {
            self.project_id = Some(project_id);
        }
        if let Some(environment) = lookup("INFISICAL_ENVIRONMENT") {
            self.environment = environment;
        }
        if let Some(path) = lookup("INFISICAL_SECRET_PATH") {
            self.secret_path = path;
        }
        if let Some(include) = parse_var(&lookup, "INFISICAL_INCLUDE_IMPORTS")? {
            self.include_imports = include;
        }
        if let Some(timeout) = parse_var(&lookup, "INFISICAL_TIMEOUT_SECS")? {
            self.timeout_secs = Some(timeout);
        }
        Ok(())
    }
}

fn parse_var<F, T>(lookup: &F, name: &str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                name: name.to_string(),
                value,
            }),
    }
}
