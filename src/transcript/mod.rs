// ABOUTME: Transcript module - the per-sample event log.
// ABOUTME: Store, sandbox, tool and limit activity is recorded here.

mod event;
mod transcript;

pub use event::*;
pub use transcript::*;
