// ABOUTME: Subprocess module - runs host commands under a global concurrency
// ABOUTME: cap with optional timeout and per-stream output limit.

mod result;
mod subprocess;

pub use result::ExecResult;
pub use subprocess::{Subprocess, init_max_subprocesses, max_subprocesses};

#[cfg(test)]
mod subprocess_test;
