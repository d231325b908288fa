// ABOUTME: Root module for evalkit - runtime utilities for model evaluations.
// ABOUTME: Re-exports the per-sample accessors and the main error type.

//! Building blocks for running evaluation samples: a per-sample store and
//! transcript, named concurrency gates, subprocess execution, sandbox
//! environments with provider lifecycle hooks, tool registration and
//! dispatch, and limits on tokens, messages and time.

pub mod concurrency;
pub mod config;
pub mod display;
pub mod error;
pub mod limit;
pub mod logging;
pub mod prelude;
pub mod sample;
pub mod sandbox;
pub mod schema;
pub mod store;
pub mod subprocess;
pub mod tool;
pub mod tools;
pub mod trace;
pub mod transcript;

pub use error::EvalError;
pub use sample::{SampleContext, sandbox, sandbox_with, store, transcript};
