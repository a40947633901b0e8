use base64::{Engine, engine::general_purpose};

/// 使用标准字母表（带填充）进行 Base64 编码
pub fn to_base64(bytes: impl AsRef<[u8]>) -> String {
    general_purpose::STANDARD.encode(bytes)
}

/// 使用标准字母表（带填充）进行 Base64 解码
pub fn from_base64(encoded: &str) -> Result<Vec<u8>, base64::DecodeError> {
    general_purpose::STANDARD.decode(encoded)
}

/// 读取环境变量，未设置或为空字符串时返回 `None`
///
/// 空值与未设置同等对待，这样部署时留空的变量不会遮蔽密钥管理器中的值。
pub fn env_var(name: &str) -> Option<String> {
    non_empty(std::env::var(name).ok())
}

/// 过滤掉空字符串
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
