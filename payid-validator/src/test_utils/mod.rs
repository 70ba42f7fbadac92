//! Fixture support for integration testing.
//!
//! The mutator here builds a conformant discovery response and then
//! injects selected protocol violations into it, so a test server can
//! exercise each failure path of the validator deterministically.

mod fixtures;

pub use fixtures::{sample_payment_information, MutatedResponse, ResponseMutations};
