//! Process-wide secret store backed by Infisical.
//!
//! Services that do not wire a [`SecretStore`] through their own state call
//! these functions instead. The store is built on first use from the
//! `INFISICAL_*` process variables; see
//! [`InfisicalConfig::from_env`](crate::secrets::InfisicalConfig::from_env).

use std::sync::{Arc, OnceLock};
use tracing::warn;

use crate::common::utils::env_var;
use crate::secrets::SecretMap;
use crate::secrets::env::ProcessEnv;
use crate::secrets::infisical::InfisicalClient;
use crate::secrets::source::{Misconfigured, SecretSource};
use crate::secrets::store::SecretStore;

static STORE: OnceLock<SecretStore> = OnceLock::new();

/// The process-wide store.
pub fn global_store() -> &'static SecretStore {
    STORE.get_or_init(|| SecretStore::new(source_from_vars(env_var), Arc::new(ProcessEnv)))
}

/// Builds the Infisical source, or a failing one when its configuration is invalid.
fn source_from_vars<F>(lookup: F) -> Arc<dyn SecretSource>
where
    F: Fn(&str) -> Option<String>,
{
    match InfisicalClient::from_vars(lookup) {
        Ok(client) => Arc::new(client),
        Err(err) => {
            warn!(error = %err, "invalid secret manager configuration, continuing without secrets");
            Arc::new(Misconfigured::new(err.to_string()))
        }
    }
}

/// Loads the secrets once and copies them into the process environment.
///
/// Never fails. Variables already set keep their value.
pub async fn hydrate_env_from_infisical() {
    global_store().hydrate_env().await
}

/// Environment value, then cached value, then `fallback`. Never triggers a load.
///
/// An environment variable holding an empty string counts as unset.
pub fn get_secret_from_cache(name: &str, fallback: &str) -> String {
    global_store().get_secret_from_cache(name, fallback)
}

/// The fetched secret set, loading it first if needed.
pub async fn get_secrets() -> Arc<SecretMap> {
    global_store().get_secrets().await
}
