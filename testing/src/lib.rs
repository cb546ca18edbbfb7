//! Testing utilities for the booking state synchronization engine
//!
//! Provides the [`ReducerTest`] Given/When/Then harness, effect assertion
//! helpers, and a deterministic [`FixedClock`] for tests that touch
//! tracking-log timestamps.

pub mod clock;

pub use clock::FixedClock;
pub use reducer_test::{ReducerTest, assertions};
