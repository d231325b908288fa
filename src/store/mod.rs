// ABOUTME: Store module - per-sample key/value state.
// ABOUTME: Includes typed model access and change tracking for the transcript.

mod changes;
mod store;

pub use changes::*;
pub use store::*;

#[cfg(test)]
mod store_test;
