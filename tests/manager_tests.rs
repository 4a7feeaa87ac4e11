//! # 缓存管理器集成测试
//!
//! 测试端点注册、失效、统计、键生成以及记忆化包装

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use api_cache::cache::{
    ApiCacheManager, CacheConfig, CacheKeyBuilder, CacheKeyParams, CacheStrategies,
    EvictionStrategy, ManualClock, default_manager, generate_key, memoize, try_generate_key,
};
use api_cache::config::ApiCacheSettings;
use proptest::prelude::*;
use serde_json::{Value, json};
use serial_test::serial;

fn manager_with_clock() -> (ApiCacheManager<Value>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(0));
    (
        ApiCacheManager::with_clock(CacheConfig::default(), clock.clone()),
        clock,
    )
}

#[test]
fn test_cache_response_then_get_cached_response() {
    let (manager, _clock) = manager_with_clock();

    let returned = manager.cache_response("products", "products:{}", json!([1, 2, 3]), None);
    assert_eq!(returned, json!([1, 2, 3]));
    assert_eq!(
        manager.get_cached_response("products", "products:{}"),
        Some(json!([1, 2, 3]))
    );
}

#[test]
fn test_pattern_invalidation() {
    let (manager, _clock) = manager_with_clock();
    let user_42 = CacheKeyBuilder::new("users").param("id", "user:42").build();
    let user_43 = CacheKeyBuilder::new("users").param("id", "user:43").build();

    manager.cache_response("users", &user_42, json!({"name": "Ada"}), None);
    manager.cache_response("users", &user_43, json!({"name": "Grace"}), None);

    assert_eq!(manager.invalidate_cache("users", Some("user:42")), 1);
    assert_eq!(manager.get_cached_response("users", &user_42), None);
    assert!(manager.get_cached_response("users", &user_43).is_some());
}

#[test]
fn test_invalidate_all_caches_empties_every_endpoint() {
    let (manager, _clock) = manager_with_clock();
    for endpoint in ["products", "orders", "settings"] {
        for i in 0..3 {
            manager.cache_response(endpoint, &format!("{endpoint}:{i}"), json!(i), None);
        }
    }

    manager.invalidate_all_caches();

    let stats = manager.get_cache_stats();
    assert_eq!(stats.len(), 3);
    assert!(stats.values().all(|s| s.size == 0));
    assert_eq!(manager.endpoints(), vec!["orders", "products", "settings"]);
}

#[test]
fn test_endpoints_are_isolated() {
    let (manager, _clock) = manager_with_clock();
    manager.cache_response("a", "shared-key", json!("from a"), None);
    manager.cache_response("b", "shared-key", json!("from b"), None);

    manager.invalidate_cache("a", None);
    assert_eq!(manager.get_cached_response("a", "shared-key"), None);
    assert_eq!(
        manager.get_cached_response("b", "shared-key"),
        Some(json!("from b"))
    );
}

#[test]
fn test_per_endpoint_config_from_settings() {
    let settings = ApiCacheSettings::from_toml_str(
        r#"
        [defaults]
        max_size = 2
        strategy = "fifo"

        [endpoints.catalog]
        preset = "long"
        "#,
    )
    .expect("配置应解析成功");
    let clock = Arc::new(ManualClock::new(0));
    let manager: ApiCacheManager<Value> = ApiCacheManager::with_settings(&settings)
        .expect("配置应有效")
        .clock(clock.clone());

    for key in ["a", "b", "c"] {
        manager.cache_response("cart", key, json!(key), None);
    }
    assert_eq!(manager.get_cache("cart", None).keys(), vec!["b", "c"]);
    assert_eq!(*manager.get_cache("catalog", None).config(), CacheStrategies::LONG);

    manager.cache_response("cart", "d", json!("d"), Some(Duration::from_secs(1)));
    clock.advance(Duration::from_secs(2));
    assert_eq!(manager.purge_expired(), 1);
}

#[test]
fn test_try_generate_key_matches_generate_key_for_objects() {
    let params = json!({"page": 3, "q": "boots"});
    let Value::Object(map) = params.clone() else {
        unreachable!()
    };
    assert_eq!(
        try_generate_key("search", &params).expect("对象参数应可生成键"),
        generate_key("search", Some(&map))
    );
}

#[test]
fn test_memoize_with_manager_style_keys() {
    let calls = AtomicUsize::new(0);
    let product = memoize(
        "product",
        |id: u32| {
            calls.fetch_add(1, Ordering::SeqCst);
            json!({ "id": id })
        },
        Some(CacheStrategies::LONG.ttl),
        EvictionStrategy::Lru,
    );

    for _ in 0..5 {
        assert_eq!(product.call(9).expect("调用应成功"), json!({"id": 9}));
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
#[serial]
fn test_default_manager_is_shared() {
    let manager = default_manager();
    manager.cache_response("default-test", "k", json!(true), None);

    assert_eq!(
        default_manager().get_cached_response("default-test", "k"),
        Some(json!(true))
    );
    default_manager().invalidate_cache("default-test", None);
    assert_eq!(default_manager().get_cached_response("default-test", "k"), None);
}

proptest! {
    #[test]
    fn prop_key_ignores_param_insertion_order(
        entries in prop::collection::btree_map("[a-z]{1,8}", any::<i64>(), 0..8)
    ) {
        let forward: CacheKeyParams = entries
            .iter()
            .map(|(k, v)| (k.clone(), json!(v)))
            .collect();
        let reversed: CacheKeyParams = entries
            .iter()
            .rev()
            .map(|(k, v)| (k.clone(), json!(v)))
            .collect();

        prop_assert_eq!(
            generate_key("products", Some(&forward)),
            generate_key("products", Some(&reversed))
        );
    }
}

#[test]
#[serial]
fn test_shipped_dev_config_is_valid() {
    let settings = api_cache::config::load_config_from("config/cache.dev.toml")
        .expect("开发环境配置应可加载");
    let manager: ApiCacheManager<Value> =
        ApiCacheManager::with_settings(&settings).expect("配置应有效");

    assert_eq!(*manager.get_cache("cart", None).config(), CacheStrategies::SHORT);
    assert_eq!(manager.get_cache("products", None).config().max_size, 200);
}

#[test]
fn test_fetch_or_cache_composes_key_lookup_and_store() {
    let (manager, _clock) = manager_with_clock();
    let counter = AtomicUsize::new(0);
    let fetches = &counter;
    let params = json!({"category": "shoes", "page": 1});

    for _ in 0..3 {
        let value = tokio_test::block_on(manager.fetch_or_cache("products", &params, move || async move {
            fetches.fetch_add(1, Ordering::SeqCst);
            Ok::<_, std::io::Error>(json!(["boots", "sneakers"]))
        }))
        .expect("获取应成功");
        assert_eq!(value, json!(["boots", "sneakers"]));
    }

    assert_eq!(counter.load(Ordering::SeqCst), 1);
    let key = try_generate_key("products", &params).expect("键生成应成功");
    assert!(manager.get_cache("products", None).has(&key));
}
