//! 通用模块，包含配置和共享的编码工具函数

pub mod config;
pub mod utils;

pub use self::config::{ConfigError, ConfigFile};
pub use self::utils::{from_base64, to_base64};
