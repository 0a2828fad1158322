// tests/property/main.rs
//
// Entry point for the `property` test binary (cargo's
// `tests/<name>/main.rs` convention).

mod resource_slot_test;
