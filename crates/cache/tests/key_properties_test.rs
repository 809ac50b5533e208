//! Property-based tests for key derivation and the memory tier bound

use mlit_cache::{CacheKey, InMemoryTTLCache};
use proptest::prelude::*;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

fn param_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        "[a-zA-Z0-9]{0,12}".prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        any::<bool>().prop_map(Value::from),
        prop::collection::vec("[0-9]{1,4}", 0..4).prop_map(Value::from),
    ]
}

fn params() -> impl Strategy<Value = Vec<(String, Value)>> {
    prop::collection::hash_map("[a-z][a-zA-Z]{0,10}", param_value(), 0..8)
        .prop_map(|map| map.into_iter().collect())
}

proptest! {
    #[test]
    fn test_key_ignores_insertion_order(pairs in params()) {
        let forward: HashMap<String, Value> = pairs.iter().cloned().collect();
        let mut reversed = HashMap::with_capacity(pairs.len());
        for (name, value) in pairs.iter().rev() {
            reversed.insert(name.clone(), value.clone());
        }

        let a = CacheKey::derive("XIT001", &forward).unwrap();
        let b = CacheKey::derive("XIT001", &reversed).unwrap();
        prop_assert_eq!(&a, &b);
        prop_assert_eq!(a.as_str().len(), 64);
        prop_assert_eq!(CacheKey::from_file_name(&a.file_name()), Some(a.clone()));
    }

    #[test]
    fn test_endpoint_is_part_of_key(pairs in params(), suffix in "[0-9]{3}") {
        let params: HashMap<String, Value> = pairs.into_iter().collect();
        let a = CacheKey::derive("XIT001", &params).unwrap();
        let b = CacheKey::derive(&format!("XKT{suffix}"), &params).unwrap();
        prop_assert_ne!(a, b);
    }

    #[test]
    fn test_memory_tier_never_exceeds_capacity(
        capacity in 1usize..16,
        endpoints in prop::collection::vec("[A-Z]{3}[0-9]{3}", 1..64)
    ) {
        let cache = InMemoryTTLCache::new(capacity, Duration::from_secs(60)).unwrap();
        for (i, endpoint) in endpoints.iter().enumerate() {
            let key = CacheKey::derive(endpoint, &HashMap::new()).unwrap();
            cache.insert(key.clone(), i);
            prop_assert!(cache.len() <= capacity);
            prop_assert_eq!(cache.get(&key), Some(i));
        }
    }
}
