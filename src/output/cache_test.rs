use std::sync::Arc;

use super::WrapperCache;
use crate::ConcreteSpec;
use crate::DepFlag;

fn wrapper() -> ConcreteSpec {
    let mut spec = ConcreteSpec::new("tracing-compiler-wrapper", "1.0");
    spec.add_dependency_edge(
        Arc::new(ConcreteSpec::new("glibc", "2.39")),
        DepFlag::LINK,
        vec![],
    );
    spec
}

/// # Case 1: store then load reproduces the wrapper's routing key
#[tokio::test]
async fn test_cache_round_trip() {
    let dir = tempfile::tempdir().expect("tempdir should succeed");
    let cache = WrapperCache::new(true, dir.path());

    assert!(cache.load().await.expect("load should succeed").is_none());

    let spec = wrapper();
    cache.store(&spec).await.expect("store should succeed");

    let cached = cache
        .load()
        .await
        .expect("load should succeed")
        .expect("cache should hit");
    assert_eq!(cached.dag_hash(), spec.dag_hash());
}

/// # Case 2: a disabled cache never hits and never writes
#[tokio::test]
async fn test_disabled_cache() {
    let cache = WrapperCache::disabled();
    assert!(cache.load().await.expect("load should succeed").is_none());
    cache
        .store(&wrapper())
        .await
        .expect("store should be a no-op");
}
