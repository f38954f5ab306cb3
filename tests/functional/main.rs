// Test code is allowed to panic on failure
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]

//! Functional tests for the MinecraftServer handlers.
//!
//! These tests drive the reconciler, updater and label propagator against
//! the in-memory store, WITHOUT requiring a live Kubernetes cluster.
//!
//! ```bash
//! # Run all functional tests
//! cargo test --test functional
//!
//! # Run specific test
//! cargo test --test functional test_end_to_end_mc1
//! ```
//!
//! ## Test Categories
//!
//! - **Reconciler tests**: creation order, idempotence, validation gate, resume
//! - **Updater tests**: storage patch isolation
//! - **Label tests**: propagation scope, removals, partial failures
//! - **Scenario tests**: multi-pass lifecycles through the event source

mod fixtures;
mod label_tests;
mod reconciler_tests;
mod scenario_tests;
mod updater_tests;

pub use fixtures::*;
