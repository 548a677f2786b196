// ==============================================
// END-TO-END WALKTHROUGHS (integration)
// ==============================================
//
// Scenario tests driving the public API the way a host application would:
// builder → engine → backend, with the selector picking the backend class.

use std::sync::Arc;
use std::time::Duration;

use cacheplex::prelude::*;

fn build(strategy: &str, max_items: u64, clock: Arc<ManualClock>) -> BoundedCache<&'static str> {
    CacheBuilder::new()
        .strategy(strategy)
        .max_items(max_items)
        .clock(clock)
        .build()
        .unwrap()
}

#[test]
fn lru_walkthrough() {
    let mut cache = build("LRU", 3, ManualClock::shared(0));
    for key in ["A", "B", "C"] {
        cache.put(key, key.as_bytes().to_vec(), None).unwrap();
    }
    cache.get(&"A");
    cache.put("D", b"D".to_vec(), None).unwrap();

    let mut keys = cache.keys();
    keys.sort();
    assert_eq!(keys, vec!["A", "C", "D"]);
}

#[test]
fn fifo_walkthrough() {
    let mut cache = build("FIFO", 3, ManualClock::shared(0));
    for key in ["A", "B", "C"] {
        cache.put(key, vec![0], None).unwrap();
    }
    cache.get(&"A");
    cache.get(&"C");
    cache.put("D", vec![0], None).unwrap();

    let mut keys = cache.keys();
    keys.sort();
    assert_eq!(keys, vec!["B", "C", "D"]);
}

#[test]
fn ttl_walkthrough() {
    let clock = ManualClock::shared(0);
    let mut cache = build("TTL", 3, clock.clone());
    cache.put("A", vec![0], Some(Duration::from_millis(5_000))).unwrap();
    cache.put("B", vec![0], Some(Duration::from_millis(1_000))).unwrap();
    cache.put("C", vec![0], Some(Duration::from_millis(3_000))).unwrap();
    cache.put("D", vec![0], None).unwrap();

    let mut keys = cache.keys();
    keys.sort();
    assert_eq!(keys, vec!["A", "C", "D"]);

    // Once C's TTL has elapsed it goes first, whatever else is tracked.
    clock.advance(Duration::from_millis(3_000));
    cache.put("E", vec![0], Some(Duration::from_millis(60_000))).unwrap();
    assert!(!cache.contains(&"C"));
    assert!(cache.contains(&"A"));
}

#[test]
fn strategy_swap_starts_fresh() {
    let registry = StrategyRegistry::with_builtins();
    let mut cache = build("LFU", 3, ManualClock::shared(0));
    for key in ["A", "B", "C"] {
        cache.put(key, vec![0], None).unwrap();
    }
    for _ in 0..10 {
        cache.get(&"A");
    }

    cache.set_strategy_by_name(&registry, "LRU").unwrap();
    assert_eq!(cache.strategy_name(), "LRU");
    // LFU's frequency counts are gone: only keys touched after the swap are candidates.
    cache.get(&"A");
    cache.put("D", vec![0], None).unwrap();
    assert!(!cache.contains(&"A"), "A is the only key the new LRU knows about");
    assert!(cache.contains(&"B"));
    assert!(cache.contains(&"C"));
    assert!(cache.contains(&"D"));
}

#[test]
fn selector_routes_and_memory_backend_stores() {
    let selector = BackendSelector::default();
    let backend = MemoryBackend::new(
        "volatile",
        CacheBuilder::<String>::new().max_bytes(1024).build().unwrap(),
    );

    let payload = br#"{"user":"ada"}"#;
    let ttl = Some(Duration::from_secs(10 * 60));
    let selection = selector.select(payload.len() as u64, ttl, ValueKind::Text);
    assert_eq!(selection.backend, backend.class());
    assert!(!selection.reason.is_empty());

    backend.put("session:ada", payload, ttl).unwrap();
    assert_eq!(backend.get("session:ada").unwrap().as_deref(), Some(&payload[..]));
    let usage = backend.usage().unwrap();
    assert_eq!(usage.used_bytes, payload.len() as u64);
    assert_eq!(usage.available_bytes, Some(1024 - payload.len() as u64));
}

#[test]
fn shared_engine_behind_one_lock() {
    let backend = Arc::new(MemoryBackend::new(
        "shared",
        CacheBuilder::<String>::new()
            .strategy("Random")
            .seed(7)
            .max_items(100)
            .max_bytes(10_000)
            .build()
            .unwrap(),
    ));
    std::thread::scope(|scope| {
        for t in 0..8 {
            let backend = Arc::clone(&backend);
            scope.spawn(move || {
                for i in 0..500 {
                    let key = format!("{t}-{}", i % 150);
                    backend.put(&key, &[0; 64], None).unwrap();
                    let _ = backend.get(&key).unwrap();
                }
            });
        }
    });
    backend.with_engine(|engine| {
        assert!(engine.len() <= 100);
        assert!(engine.total_bytes() <= 10_000);
        engine.check_invariants().unwrap();
    });
}
