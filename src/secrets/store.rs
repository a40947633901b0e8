//! Single-flight, load-once secret cache.

use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::secrets::SecretMap;
use crate::secrets::env::{EnvTable, ProcessEnv};
use crate::secrets::source::SecretSource;

/// Lifecycle of a [`SecretStore`]. `Populated` is terminal.
///
/// 中文: 缓存的生命周期，`Populated` 为终态。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreState {
    /// Nothing requested yet.
    Uninitialized,
    /// One load is in flight; other callers wait for it.
    Loading,
    /// The secret set is resolved, possibly empty.
    Populated,
}

/// How the secret set was resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HydrationOutcome {
    Fetched { count: usize },
    Unconfigured,
    Failed { reason: String },
}

#[derive(Debug)]
struct Snapshot {
    secrets: Arc<SecretMap>,
    outcome: HydrationOutcome,
    loaded_at: DateTime<Utc>,
}

/// Caches the secret set of one [`SecretSource`] and mirrors it into an
/// [`EnvTable`].
///
/// The first call to [`hydrate_env`](Self::hydrate_env) or
/// [`get_secrets`](Self::get_secrets) loads the set; concurrent callers share
/// that single load. Once loaded the set never changes: a failed load stays an
/// empty set for the lifetime of the store.
///
/// 中文: 缓存单个密钥源的密钥集合并写入环境变量表。首次调用时加载，
/// 并发调用共享同一次加载；加载后不再变化。
pub struct SecretStore {
    source: Arc<dyn SecretSource>,
    env: Arc<dyn EnvTable>,
    /// 已解析的快照，读路径无锁
    snapshot: ArcSwapOption<Snapshot>,
    /// 持有者即唯一的加载者
    gate: Mutex<()>,
    loading: AtomicBool,
}

impl SecretStore {
    pub fn new(source: Arc<dyn SecretSource>, env: Arc<dyn EnvTable>) -> Self {
        Self {
            source,
            env,
            snapshot: ArcSwapOption::empty(),
            gate: Mutex::new(()),
            loading: AtomicBool::new(false),
        }
    }

    /// A store hydrating the real process environment.
    pub fn with_process_env(source: Arc<dyn SecretSource>) -> Self {
        Self::new(source, Arc::new(ProcessEnv))
    }

    pub fn state(&self) -> StoreState {
        if self.snapshot.load().is_some() {
            StoreState::Populated
        } else if self.loading.load(Ordering::Acquire) {
            StoreState::Loading
        } else {
            StoreState::Uninitialized
        }
    }

    /// `None` until the store is populated.
    pub fn outcome(&self) -> Option<HydrationOutcome> {
        self.snapshot.load_full().map(|s| s.outcome.clone())
    }

    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.snapshot.load_full().map(|s| s.loaded_at)
    }

    /// Loads the secret set if needed and copies it into the environment.
    ///
    /// Names already set in the environment keep their value. Never fails:
    /// an unconfigured or failing source leaves the environment untouched.
    pub async fn hydrate_env(&self) {
        self.ensure_loaded().await;
    }

    /// The fetched secret set, loading it first if needed.
    ///
    /// Values are exactly what the source returned, regardless of any
    /// environment variable that took precedence during hydration.
    pub async fn get_secrets(&self) -> Arc<SecretMap> {
        self.ensure_loaded().await.secrets.clone()
    }

    /// Resolves `name` from the environment, then the cache, then `fallback`.
    ///
    /// An environment variable holding an empty string counts as unset: the
    /// cached value (or `fallback`) is returned, and hydration fills it in.
    /// Never triggers a load.
    pub fn get_secret_from_cache(&self, name: &str, fallback: &str) -> String {
        if let Some(value) = self.env.get(name) {
            return value;
        }
        self.snapshot
            .load_full()
            .and_then(|s| s.secrets.get(name).cloned())
            .unwrap_or_else(|| fallback.to_string())
    }

    async fn ensure_loaded(&self) -> Arc<Snapshot> {
        if let Some(snapshot) = self.snapshot.load_full() {
            return snapshot;
        }

        let _gate = self.gate.lock().await;
        // 等待期间其他调用者可能已完成加载
        if let Some(snapshot) = self.snapshot.load_full() {
            return snapshot;
        }

        let _loading = LoadingFlag::raise(&self.loading);
        let snapshot = Arc::new(self.load().await);
        self.snapshot.store(Some(snapshot.clone()));
        snapshot
    }

    async fn load(&self) -> Snapshot {
        let source = self.source.name();
        debug!(source, "loading secrets");

        let (secrets, outcome) = match self.source.load_all_secrets().await {
            Ok(Some(secrets)) => {
                let count = secrets.len();
                (secrets, HydrationOutcome::Fetched { count })
            }
            Ok(None) => {
                debug!(source, "secret source not configured, continuing without secrets");
                (SecretMap::new(), HydrationOutcome::Unconfigured)
            }
            Err(err) => {
                warn!(source, error = %err, "failed to load secrets, continuing without them");
                (
                    SecretMap::new(),
                    HydrationOutcome::Failed {
                        reason: err.to_string(),
                    },
                )
            }
        };

        let mut written = 0usize;
        for (name, value) in &secrets {
            if self.env.set_if_absent(name, value) {
                written += 1;
            }
        }
        if let HydrationOutcome::Fetched { count } = outcome {
            info!(
                source,
                count,
                written,
                kept = count - written,
                "hydrated environment from secret source"
            );
        }

        Snapshot {
            secrets: Arc::new(secrets),
            outcome,
            loaded_at: Utc::now(),
        }
    }
}

/// Marks the store as loading until dropped, including when the loading
/// future is cancelled.
struct LoadingFlag<'a>(&'a AtomicBool);

impl<'a> LoadingFlag<'a> {
    fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::Release);
        Self(flag)
    }
}

impl Drop for LoadingFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
