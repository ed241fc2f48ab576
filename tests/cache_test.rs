//! Tests for [`CacheStore`]: TTL lookup and pattern invalidation.

use std::sync::Arc;
use std::time::Duration;

use satchel::cache::{CacheConfig, CacheStore, DEFAULT_TTL, InvalidationPattern, cache_key};
use serde_json::json;

const API: &str = "http://localhost:5000/api";

fn get_key(path: &str) -> String {
    cache_key("GET", &format!("{API}{path}"), None)
}

fn filled_cache() -> CacheStore {
    let cache = CacheStore::default();
    for path in ["/users/me", "/users?role=student", "/tests", "/tests?page=2", "/homework"] {
        cache.put(get_key(path), Arc::new(json!({ "data": path })));
    }
    cache
}

// =========================================================================
// CacheConfig
// =========================================================================

#[test]
fn cache_config_defaults() {
    let config = CacheConfig::default();
    assert_eq!(config.max_entries, 1_000);
    assert_eq!(config.ttl, DEFAULT_TTL);
    assert_eq!(DEFAULT_TTL, Duration::from_secs(300));
}

// =========================================================================
// Lookup
// =========================================================================

#[test]
fn miss_then_hit_returns_identical_payload() {
    let cache = CacheStore::default();
    assert!(cache.get("k").is_none());

    let payload = Arc::new(json!({"data": [1, 2, 3]}));
    cache.put("k", Arc::clone(&payload));

    let first = cache.get("k").unwrap();
    let second = cache.get("k").unwrap();
    assert!(Arc::ptr_eq(&first, &payload));
    assert!(Arc::ptr_eq(&first, &second));
}

#[tokio::test(start_paused = true)]
async fn entry_expires_after_ttl() {
    let cache = CacheStore::new(&CacheConfig::default());
    cache.put("k", Arc::new(json!(1)));

    tokio::time::advance(DEFAULT_TTL - Duration::from_secs(1)).await;
    assert!(cache.get("k").is_some());

    tokio::time::advance(Duration::from_secs(2)).await;
    assert!(cache.get("k").is_none());
    assert!(!cache.contains_fresh("k"));
}

#[tokio::test(start_paused = true)]
async fn expired_entry_is_not_swept_but_overwritten() {
    let cache = CacheStore::new(&CacheConfig::new().ttl(Duration::from_secs(10)));
    cache.put("k", Arc::new(json!("old")));

    tokio::time::advance(Duration::from_secs(11)).await;
    assert!(cache.get("k").is_none());
    assert_eq!(cache.len(), 1, "stale entry stays until overwritten");

    cache.put("k", Arc::new(json!("new")));
    assert_eq!(*cache.get("k").unwrap(), json!("new"));
    assert_eq!(cache.len(), 1);
}

// =========================================================================
// Invalidation
// =========================================================================

#[test]
fn invalidate_single_key() {
    let cache = filled_cache();
    cache.invalidate(&get_key("/tests"));

    assert!(cache.get(&get_key("/tests")).is_none());
    assert!(cache.get(&get_key("/tests?page=2")).is_some());
}

#[test]
fn auth_pattern_leaves_unrelated_keys() {
    let cache = filled_cache();
    let removed = cache.invalidate_by_pattern(InvalidationPattern::Auth);

    assert_eq!(removed, 1);
    assert!(cache.get(&get_key("/users/me")).is_none());
    assert!(cache.get(&get_key("/users?role=student")).is_some());
    assert!(cache.get(&get_key("/tests")).is_some());
    assert!(cache.get(&get_key("/tests?page=2")).is_some());
    assert!(cache.get(&get_key("/homework")).is_some());
}

#[test]
fn user_pattern_removes_all_user_keys() {
    let cache = filled_cache();
    assert_eq!(cache.invalidate_by_pattern(InvalidationPattern::User), 2);
    assert_eq!(cache.len(), 3);
}

#[test]
fn wildcard_pattern_clears_everything() {
    let cache = filled_cache();
    cache.invalidate_by_pattern(InvalidationPattern::All);
    assert!(cache.is_empty());
}

#[test]
fn clear_empties_cache() {
    let cache = filled_cache();
    assert_eq!(cache.len(), 5);
    cache.clear();
    assert!(cache.is_empty());
    assert!(cache.get(&get_key("/homework")).is_none());
}

#[test]
fn put_is_kept_when_cache_is_full() {
    let cache = CacheStore::new(&CacheConfig::new().max_entries(4));
    for i in 0..4 {
        cache.put(format!("hot-{i}"), Arc::new(json!(i)));
    }
    for _ in 0..10 {
        for i in 0..4 {
            assert!(cache.get(&format!("hot-{i}")).is_some());
        }
    }

    for i in 0..100 {
        let key = format!("new-{i}");
        cache.put(key.as_str(), Arc::new(json!(i)));
        assert_eq!(cache.get(&key).as_deref(), Some(&json!(i)), "lost {key}");
        assert_eq!(cache.get(&key).as_deref(), Some(&json!(i)), "lost {key}");
    }
}

#[test]
fn thread_safety() {
    use std::thread;

    let cache = Arc::new(CacheStore::default());
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                for j in 0..50 {
                    cache.put(format!("k{i}-{j}"), Arc::new(json!(j)));
                    let _ = cache.get(&format!("k{i}-{j}"));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(cache.len(), 400);
}
