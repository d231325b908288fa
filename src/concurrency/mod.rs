// ABOUTME: Concurrency module - named, capacity-bounded admission gates.
// ABOUTME: Used directly by callers and by subprocess/sandbox execution.

mod gate;

pub use gate::{
    ConcurrencyPermit, ConcurrencyRegistry, ConcurrencyStatus, concurrency, concurrency_status,
    concurrency_with_cancel,
};
