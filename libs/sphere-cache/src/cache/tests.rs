//! # Tests for the Level Cache

use super::*;
use crate::approximation::Sphere;
use glam::DVec3;
use std::fs;
use std::sync::Arc;
use tempfile::tempdir;

fn approx(mean: f64, worst: f64) -> Approximation {
    Approximation::new(vec![Sphere::new(DVec3::new(1.0, 2.0, 3.0), 0.5)], mean, mean / 2.0, worst)
}

// =============================================================================
// REPLACEMENT TESTS
// =============================================================================

#[test]
fn test_put_is_idempotent() {
    let cache = LevelCache::open("unused.json");
    assert!(cache.put("arm", 8, 1, approx(0.2, 0.4)));
    assert!(!cache.put("arm", 8, 1, approx(0.2, 0.4)));
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.get("arm", 8, 1).unwrap(), approx(0.2, 0.4));
}

#[test]
fn test_put_keeps_best() {
    let cache = LevelCache::open("unused.json");
    cache.put("arm", 8, 0, approx(0.3, 0.3));
    assert!(cache.put("arm", 8, 0, approx(0.1, 0.9)));
    assert!(!cache.put("arm", 8, 0, approx(0.2, 0.0)));
    assert!(cache.put("arm", 8, 0, approx(0.1, 0.5)));
    assert_eq!(cache.get("arm", 8, 0).unwrap(), approx(0.1, 0.5));
}

#[test]
fn test_best_of_is_order_independent() {
    let values = [approx(0.4, 0.4), approx(0.1, 0.7), approx(0.1, 0.2), approx(0.3, 0.1)];
    let orders: [[usize; 4]; 3] = [[0, 1, 2, 3], [3, 2, 1, 0], [2, 0, 3, 1]];

    for order in orders {
        let cache = LevelCache::open("unused.json");
        for i in order {
            cache.put("leg", 4, 2, values[i].clone());
        }
        assert_eq!(cache.get("leg", 4, 2).unwrap(), approx(0.1, 0.2));
    }
}

#[test]
fn test_concurrent_puts_keep_best() {
    let cache = Arc::new(LevelCache::open("unused.json"));
    std::thread::scope(|scope| {
        for t in 0..8 {
            let cache = Arc::clone(&cache);
            scope.spawn(move || {
                for i in 0..50 {
                    let mean = 1.0 + ((t * 50 + i) % 37) as f64 / 10.0;
                    cache.put("torso", 8, 1, approx(mean, mean));
                }
            });
        }
    });
    assert_eq!(cache.get("torso", 8, 1).unwrap(), approx(1.0, 1.0));
}

#[test]
fn test_keys_are_independent() {
    let cache = LevelCache::open("unused.json");
    cache.put("arm", 8, 0, approx(0.1, 0.1));
    cache.put("arm", 4, 0, approx(0.5, 0.5));
    cache.put("leg", 8, 0, approx(0.9, 0.9));
    assert_eq!(cache.len(), 3);
    assert!(cache.contains("arm", 4, 0));
    assert!(!cache.contains("arm", 4, 1));
    assert!(!cache.contains("hand", 8, 0));
}

#[test]
fn test_get_missing_is_not_found() {
    let cache = LevelCache::open("unused.json");
    assert!(cache.is_empty());
    assert!(matches!(
        cache.get("arm", 8, 0),
        Err(SpherizeError::NotFound { branch_factor: 8, level: 0, .. })
    ));
}

#[test]
fn test_select_walks_down_to_non_empty() {
    let cache = LevelCache::open("unused.json");
    cache.put("arm", 8, 0, approx(0.3, 0.3));
    cache.put("arm", 8, 1, Approximation::empty());
    assert_eq!(cache.select("arm", 8, 1).unwrap(), approx(0.3, 0.3));
    assert_eq!(cache.select("arm", 8, 5).unwrap(), approx(0.3, 0.3));
    assert!(cache.select("arm", 4, 0).is_err());
}

// =============================================================================
// PERSISTENCE TESTS
// =============================================================================

#[test]
fn test_flush_and_restore_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("spheres.json");

    let cache = LevelCache::open(&path);
    cache.put("arm", 8, 0, approx(0.3, 0.3));
    cache.put("arm", 8, 1, approx(0.1, 0.2));
    cache.put("base", 16, 0, Approximation::empty());
    cache.flush().unwrap();

    let restored = LevelCache::restore(&path).unwrap();
    assert_eq!(restored.snapshot(), cache.snapshot());
    assert!(restored.contains("base", 16, 0));
    assert!(restored.get("base", 16, 0).unwrap().is_empty());
}

#[test]
fn test_file_uses_string_integer_keys() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("spheres.json");
    let cache = LevelCache::open(&path);
    cache.put("arm", 8, 1, approx(0.1, 0.2));
    cache.flush().unwrap();

    let text = fs::read_to_string(&path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    let entry = &value["arm"]["8"]["1"];
    assert_eq!(entry["mean_error"], 0.1);
    assert_eq!(entry["primitives"][0]["radius"], 0.5);
    // Four-space indentation
    assert!(text.starts_with("{\n    \"arm\""));
}

#[test]
fn test_flush_overwrites_previous_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("spheres.json");
    fs::write(&path, "stale").unwrap();

    let cache = LevelCache::open(&path);
    assert!(cache.is_empty());
    cache.put("arm", 8, 0, approx(0.1, 0.1));
    cache.flush().unwrap();

    assert_eq!(LevelCache::restore(&path).unwrap().len(), 1);
}

#[test]
fn test_flush_creates_parent_directory() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("spheres.json");
    LevelCache::open(&path).flush().unwrap();
    assert!(path.exists());
}

#[test]
fn test_restore_missing_file_is_empty() {
    let dir = tempdir().unwrap();
    let cache = LevelCache::restore(dir.path().join("absent.json")).unwrap();
    assert!(cache.is_empty());
}

#[test]
fn test_restore_rejects_truncated_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("spheres.json");
    let cache = LevelCache::open(&path);
    cache.put("arm", 8, 0, approx(0.1, 0.1));
    cache.flush().unwrap();

    let text = fs::read_to_string(&path).unwrap();
    fs::write(&path, &text[..text.len() / 2]).unwrap();

    assert!(matches!(
        LevelCache::restore(&path),
        Err(SpherizeError::CorruptCache { .. })
    ));
}

#[test]
fn test_restore_rejects_bad_values() {
    let json = r#"{"arm": {"8": {"0": {"primitives": [], "mean_error": -1.0, "best_error": 0.0, "worst_error": 0.0}}}}"#;
    assert!(matches!(
        LevelCache::from_json("bad.json", json),
        Err(SpherizeError::CorruptCache { .. })
    ));

    let json = r#"{"arm": {"eight": {}}}"#;
    assert!(matches!(
        LevelCache::from_json("bad.json", json),
        Err(SpherizeError::CorruptCache { .. })
    ));
}

#[test]
fn test_put_refuses_values_the_file_cannot_hold() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("spheres.json");
    let cache = LevelCache::open(&path);

    assert!(cache.put("arm", 8, 0, approx(0.2, 0.2)));
    assert!(!cache.put("arm", 8, 0, approx(f64::NAN, 0.0)));
    assert!(!cache.put("arm", 8, 1, approx(-0.5, 0.1)));
    assert!(!cache.put("arm", 8, 2, approx(0.1, f64::INFINITY)));
    let bad_sphere = Approximation::new(vec![Sphere::new(DVec3::ZERO, f64::NAN)], 0.1, 0.1, 0.1);
    assert!(!cache.put("leg", 8, 0, bad_sphere));

    assert_eq!(cache.len(), 1);
    assert_eq!(cache.get("arm", 8, 0).unwrap(), approx(0.2, 0.2));

    cache.flush().unwrap();
    let restored = LevelCache::restore(&path).unwrap();
    assert_eq!(restored.snapshot(), cache.snapshot());
}

#[test]
fn test_json_round_trip() {
    let cache = LevelCache::open("unused.json");
    cache.put("arm", 8, 2, approx(0.1, 0.2));
    let json = cache.to_json().unwrap();
    let parsed = LevelCache::from_json("unused.json", &json).unwrap();
    assert_eq!(parsed.get("arm", 8, 2).unwrap(), approx(0.1, 0.2));
}
