// tests/property/resource_slot_test.rs
//
// Property-based checks of `ResourceSlot` arithmetic (spec.md §4.1,
// §8): addition/subtraction over the union of keys, and the
// six-fractional-digit rescaling the source's NUMERIC(24,6) columns
// require.

use clustord::core::slots::ResourceSlot;
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

fn arb_amount() -> impl Strategy<Value = Decimal> {
    (0u32..1_000_000u32).prop_map(Decimal::from)
}

fn arb_slot(slot_names: &'static [&'static str]) -> impl Strategy<Value = ResourceSlot> {
    proptest::collection::vec(arb_amount(), slot_names.len()).prop_map(move |amounts| {
        let mut map = BTreeMap::new();
        for (name, amount) in slot_names.iter().zip(amounts) {
            map.insert(name.to_string(), amount);
        }
        ResourceSlot::from_map(map)
    })
}

const SLOT_NAMES: &[&str] = &["cpu", "mem"];

proptest! {
    #[test]
    fn add_is_commutative(a in arb_slot(SLOT_NAMES), b in arb_slot(SLOT_NAMES)) {
        let ab = a.add(&b);
        let ba = b.add(&a);
        for key in SLOT_NAMES {
            prop_assert_eq!(ab.get(key), ba.get(key));
        }
    }

    #[test]
    fn sub_saturating_never_goes_negative(a in arb_slot(SLOT_NAMES), b in arb_slot(SLOT_NAMES)) {
        let diff = a.sub_saturating(&b);
        for key in SLOT_NAMES {
            prop_assert!(diff.get(key) >= Decimal::ZERO);
        }
    }

    #[test]
    fn add_then_sub_saturating_roundtrips(a in arb_slot(SLOT_NAMES), b in arb_slot(SLOT_NAMES)) {
        let sum = a.add(&b);
        let back = sum.sub_saturating(&b);
        for key in SLOT_NAMES {
            prop_assert_eq!(back.get(key), a.get(key));
        }
    }

    #[test]
    fn le_holds_after_adding_a_non_negative_amount(a in arb_slot(SLOT_NAMES), b in arb_slot(SLOT_NAMES)) {
        let sum = a.add(&b);
        prop_assert!(a.le(&sum));
    }

    #[test]
    fn rescale_is_idempotent(a in arb_slot(SLOT_NAMES)) {
        let twice = ResourceSlot::from_map(SLOT_NAMES.iter().map(|k| (k.to_string(), a.get(k))).collect());
        for key in SLOT_NAMES {
            prop_assert_eq!(a.get(key), twice.get(key));
        }
    }
}
