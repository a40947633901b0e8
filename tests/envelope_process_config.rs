//!
//! 进程级信封配置测试
//!
//! 自由函数 `encrypt`/`decrypt` 的配置在进程内只读取一次，因此这些断言
//! 放在独立的测试二进制中，并且在第一次调用前设置好环境变量。
//!

use helix_seal::common::config::{EnvelopeConfig, ScryptConfig};
use helix_seal::envelope::{EnvelopeCipher, EnvelopeOptions, KeyMaterial};
use helix_seal::ConfigFile;
use serde_json::{Value, json};

#[test]
fn test_free_functions_follow_envelope_env_overrides() {
    // SAFETY: this binary holds a single test, nothing else touches the environment.
    unsafe {
        std::env::set_var("ENVELOPE_PRIMARY_KEY_ENV", "HELIX_SEAL_SERVICE_KEY");
        std::env::set_var("HELIX_SEAL_SERVICE_KEY", "service-passphrase");
        std::env::set_var("ENVELOPE_SCRYPT_LOG_N", "8");
    }

    let config = ConfigFile::from_env().unwrap().envelope;
    assert_eq!(config.primary_key_env, "HELIX_SEAL_SERVICE_KEY");
    let configured = EnvelopeCipher::new(config);

    // Free encrypt, configured cipher decrypts.
    let payload = helix_seal::encrypt(&json!({ "order": 17 }), &EnvelopeOptions::default()).unwrap();
    let back: Value = configured.decrypt(&payload).unwrap();
    assert_eq!(back, json!({ "order": 17 }));

    // Configured cipher encrypts, free decrypt opens it.
    let payload = configured.encrypt(&json!("reverse")).unwrap();
    let back: String = helix_seal::decrypt(&payload, &EnvelopeOptions::default()).unwrap();
    assert_eq!(back, "reverse");

    // The scrypt override took effect: an explicit cipher with the same
    // passphrase and log_n = 8 opens what the free function wrote.
    let explicit = EnvelopeCipher::with_config_and_key(
        EnvelopeConfig {
            primary_key_env: "HELIX_SEAL_PROCESS_KEY_NEVER_SET".to_string(),
            scrypt: ScryptConfig { log_n: 8, r: 8, p: 1 },
        },
        KeyMaterial::passphrase("service-passphrase"),
    );
    let payload = helix_seal::encrypt(&json!([1, 2, 3]), &EnvelopeOptions::default()).unwrap();
    let back: Value = explicit.decrypt(&payload).unwrap();
    assert_eq!(back, json!([1, 2, 3]));
}
