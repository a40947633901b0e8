//!
//! 密钥缓存集成测试
//!
//! 覆盖单次加载、并发去重、环境变量优先级以及未配置/失败时的降级行为。
//!

mod common;

use common::{CountingSource, init_tracing};
use helix_seal::secrets::{
    EnvTable, HydrationOutcome, MemoryEnv, SecretStore, StoreState, Unconfigured,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;

fn store_over(source: Arc<CountingSource>, env: Arc<MemoryEnv>) -> Arc<SecretStore> {
    Arc::new(SecretStore::new(source, env))
}

#[tokio::test]
async fn test_hydrate_twice_fetches_once() {
    init_tracing();
    let source = CountingSource::returning(&[("API_KEY", "k1")]);
    let env = Arc::new(MemoryEnv::new());
    let store = store_over(source.clone(), env.clone());

    store.hydrate_env().await;
    store.hydrate_env().await;
    let secrets = store.get_secrets().await;

    assert_eq!(source.calls(), 1);
    assert_eq!(secrets.get("API_KEY").map(String::as_str), Some("k1"));
    assert_eq!(env.get("API_KEY").as_deref(), Some("k1"));
    assert_eq!(store.state(), StoreState::Populated);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_callers_share_one_load() {
    init_tracing();
    let source = CountingSource::slow(&[("A", "1"), ("B", "2")], Duration::from_millis(50));
    let store = store_over(source.clone(), Arc::new(MemoryEnv::new()));

    let mut tasks = JoinSet::new();
    for i in 0..16 {
        let store = store.clone();
        tasks.spawn(async move {
            if i % 2 == 0 {
                store.hydrate_env().await;
            }
            store.get_secrets().await
        });
    }

    let mut results = Vec::new();
    while let Some(result) = tasks.join_next().await {
        results.push(result.unwrap());
    }

    assert_eq!(source.calls(), 1);
    let first = &results[0];
    assert_eq!(first.len(), 2);
    assert!(results.iter().all(|r| Arc::ptr_eq(r, first)));
}

#[tokio::test]
async fn test_explicit_environment_wins_over_remote() {
    let source = CountingSource::returning(&[("FOO", "remote"), ("BAR", "baz")]);
    let env = Arc::new(MemoryEnv::with_vars([("FOO", "explicit")]));
    let store = store_over(source, env.clone());

    store.hydrate_env().await;

    assert_eq!(store.get_secret_from_cache("FOO", ""), "explicit");
    assert_eq!(store.get_secret_from_cache("BAR", ""), "baz");
    assert_eq!(env.get("FOO").as_deref(), Some("explicit"));
    assert_eq!(env.get("BAR").as_deref(), Some("baz"));

    // The cached set keeps what the source returned.
    let secrets = store.get_secrets().await;
    assert_eq!(secrets["FOO"], "remote");
}

#[tokio::test]
async fn test_cache_falls_back_for_unknown_names() {
    let source = CountingSource::returning(&[("PRESENT", "yes")]);
    let store = store_over(source, Arc::new(MemoryEnv::new()));
    store.hydrate_env().await;

    assert_eq!(store.get_secret_from_cache("PRESENT", "no"), "yes");
    assert_eq!(store.get_secret_from_cache("MISSING", "default"), "default");
    assert_eq!(store.get_secret_from_cache("MISSING", ""), "");
}

#[tokio::test]
async fn test_cache_read_does_not_trigger_load() {
    let source = CountingSource::returning(&[("X", "1")]);
    let store = store_over(source.clone(), Arc::new(MemoryEnv::new()));

    assert_eq!(store.get_secret_from_cache("X", "fallback"), "fallback");
    assert_eq!(source.calls(), 0);
    assert_eq!(store.state(), StoreState::Uninitialized);
}

#[tokio::test]
async fn test_unconfigured_source_yields_empty_set() {
    let source = CountingSource::unconfigured();
    let env = Arc::new(MemoryEnv::new());
    let store = store_over(source.clone(), env.clone());

    store.hydrate_env().await;

    assert!(store.get_secrets().await.is_empty());
    assert!(env.is_empty());
    assert_eq!(store.outcome(), Some(HydrationOutcome::Unconfigured));
    assert_eq!(source.calls(), 1);
}

#[tokio::test]
async fn test_failing_source_degrades_to_fallbacks() {
    init_tracing();
    let source = CountingSource::failing("connection refused");
    let env = Arc::new(MemoryEnv::with_vars([("KEEP", "me")]));
    let store = store_over(source.clone(), env.clone());

    store.hydrate_env().await;

    assert_eq!(store.get_secret_from_cache("TOKEN", "fallback"), "fallback");
    assert_eq!(store.get_secret_from_cache("KEEP", ""), "me");
    assert!(store.get_secrets().await.is_empty());
    assert_eq!(env.len(), 1);
    match store.outcome() {
        Some(HydrationOutcome::Failed { reason }) => assert!(reason.contains("connection refused")),
        other => panic!("unexpected outcome: {other:?}"),
    }

    // A failed load is final: no retry on later calls.
    store.hydrate_env().await;
    assert_eq!(source.calls(), 1);
}

#[tokio::test]
async fn test_store_over_unconfigured_marker() {
    let store = SecretStore::new(Arc::new(Unconfigured), Arc::new(MemoryEnv::new()));
    let secrets = store.get_secrets().await;

    assert!(secrets.is_empty());
    assert_eq!(store.outcome(), Some(HydrationOutcome::Unconfigured));
    assert!(store.loaded_at().is_some());
}
