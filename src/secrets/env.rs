//! Environment tables the store reads precedence from and hydrates into.

use dashmap::DashMap;
use std::sync::Mutex;
use tracing::warn;

use crate::common::utils::{env_var, non_empty};

/// A table of environment variables.
///
/// A variable counts as set only when it holds a non-empty value.
pub trait EnvTable: Send + Sync {
    fn get(&self, name: &str) -> Option<String>;

    /// Writes `value` unless `name` is already set. Returns whether it wrote.
    fn set_if_absent(&self, name: &str, value: &str) -> bool;
}

/// Serializes check-then-set writes made through [`ProcessEnv`].
static PROCESS_ENV_WRITE: Mutex<()> = Mutex::new(());

/// The environment of the current process.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnv;

impl EnvTable for ProcessEnv {
    fn get(&self, name: &str) -> Option<String> {
        env_var(name)
    }

    fn set_if_absent(&self, name: &str, value: &str) -> bool {
        // Each store has a single loader; this lock covers several stores
        // hydrating the process environment at once.
        let _guard = PROCESS_ENV_WRITE.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if env_var(name).is_some() {
            return false;
        }
        if name.is_empty() || name.contains(|c: char| c == '=' || c == '\0') || value.contains('\0') {
            warn!(name, "skipping secret that cannot be stored as an environment variable");
            return false;
        }
        // SAFETY: hydration runs during startup; the process must not read the
        // environment through libc on other threads while it does.
        unsafe { std::env::set_var(name, value) };
        true
    }
}

/// An in-memory environment, for tests and embedded stores.
#[derive(Debug, Default)]
pub struct MemoryEnv {
    vars: DashMap<String, String>,
}

impl MemoryEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let env = Self::new();
        for (name, value) in vars {
            env.vars.insert(name.into(), value.into());
        }
        env
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl EnvTable for MemoryEnv {
    fn get(&self, name: &str) -> Option<String> {
        non_empty(self.vars.get(name).map(|v| v.value().clone()))
    }

    fn set_if_absent(&self, name: &str, value: &str) -> bool {
        let mut entry = self.vars.entry(name.to_string()).or_default();
        if !entry.is_empty() {
            return false;
        }
        *entry = value.to_string();
        true
    }
}
