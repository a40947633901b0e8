//! 密钥缓存模块
//!
//! Loads the secret set of a project from a [`SecretSource`] once, keeps it in
//! memory and mirrors it into an [`EnvTable`]. Loading never fails from the
//! caller's point of view: an unconfigured or unreachable source yields an empty
//! set and the reason is kept in [`SecretStore::outcome`].

pub mod env;
pub mod errors;
pub mod source;
pub mod store;

#[cfg(feature = "infisical")]
pub mod global;
#[cfg(feature = "infisical")]
pub mod infisical;

use std::collections::HashMap;

/// Secret name to secret value.
pub type SecretMap = HashMap<String, String>;

pub use self::env::{EnvTable, MemoryEnv, ProcessEnv};
pub use self::errors::SecretSourceError;
pub use self::source::{Misconfigured, SecretSource, Unconfigured};
pub use self::store::{HydrationOutcome, SecretStore, StoreState};

#[cfg(feature = "infisical")]
pub use self::global::{get_secret_from_cache, get_secrets, global_store, hydrate_env_from_infisical};
#[cfg(feature = "infisical")]
pub use self::infisical::{InfisicalAuth, InfisicalClient, InfisicalConfig};
