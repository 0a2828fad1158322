// tests/integration/main.rs
//
// Entry point for the `integration` test binary (cargo's
// `tests/<name>/main.rs` convention), gathering the shared fixtures and
// every integration test module under one binary.

mod coordinator_round_test;
mod multi_node_scheduling_test;
mod test_helpers;
