// tests/unit_resource_slot_test.rs
//
// Black-box coverage of `ResourceSlot`'s public API, complementing the
// module's own inline unit tests with scenarios exercised only through
// the crate's published surface (spec.md §4.1, §8).

use clustord::core::slots::{ResourceSlot, SlotType};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

fn slot(pairs: &[(&str, &str)]) -> ResourceSlot {
    let mut m = BTreeMap::new();
    for (k, v) in pairs {
        m.insert(k.to_string(), v.parse::<Decimal>().unwrap());
    }
    ResourceSlot::from_map(m)
}

#[test]
fn new_slot_is_empty() {
    assert!(ResourceSlot::new().is_empty());
}

#[test]
fn a_slot_with_only_zero_amounts_is_empty() {
    let s = slot(&[("cpu", "0"), ("mem", "0")]);
    assert!(s.is_empty());
}

#[test]
fn a_slot_with_any_nonzero_amount_is_not_empty() {
    let s = slot(&[("cpu", "0"), ("mem", "1")]);
    assert!(!s.is_empty());
}

#[test]
fn keys_reflects_every_inserted_slot_name() {
    let s = slot(&[("cpu", "1"), ("mem", "2"), ("cuda.device", "0")]);
    let mut keys: Vec<&String> = s.keys().collect();
    keys.sort();
    assert_eq!(keys, vec!["cpu", "cuda.device", "mem"]);
}

#[test]
fn sub_saturating_clamps_each_component_independently() {
    let a = slot(&[("cpu", "1"), ("mem", "10")]);
    let b = slot(&[("cpu", "5"), ("mem", "2")]);
    let diff = a.sub_saturating(&b);
    assert_eq!(diff.get("cpu"), Decimal::ZERO);
    assert_eq!(diff.get("mem"), Decimal::from(8));
}

#[test]
fn le_treats_a_missing_key_as_zero_capacity() {
    let request = slot(&[("cuda.device", "1")]);
    let capacity = slot(&[("cpu", "4")]);
    assert!(!request.le(&capacity));
}

#[test]
fn from_user_input_parses_fractional_counts() {
    let mut types = BTreeMap::new();
    types.insert("cpu".to_string(), SlotType::Count);
    let mut raw = BTreeMap::new();
    raw.insert("cpu".to_string(), "0.5".to_string());
    let parsed = ResourceSlot::from_user_input(&raw, &types).unwrap();
    assert_eq!(parsed.get("cpu"), Decimal::new(500_000, 6));
}

#[test]
fn from_user_input_parses_kilobyte_suffix() {
    let mut types = BTreeMap::new();
    types.insert("mem".to_string(), SlotType::Bytes);
    let mut raw = BTreeMap::new();
    raw.insert("mem".to_string(), "512k".to_string());
    let parsed = ResourceSlot::from_user_input(&raw, &types).unwrap();
    assert_eq!(parsed.get("mem"), Decimal::from(512u64 * 1024));
}
