// ABOUTME: Size and timeout limits enforced on every sandbox environment.

use std::time::Duration;

/// Maximum bytes of output captured per stream from `exec`.
pub const MAX_EXEC_OUTPUT_SIZE: usize = 10 * 1024 * 1024;

/// Maximum size in bytes of a file returned by `read_file`.
pub const MAX_READ_FILE_SIZE: usize = 100 * 1024 * 1024;

/// Timeout ceilings for the retries of a timed out `exec`.
pub const TIMEOUT_RETRY_CEILINGS: [Duration; 2] = [Duration::from_secs(60), Duration::from_secs(30)];

/// Per-attempt timeouts for an `exec` call.
///
/// Without a timeout, or with retries disabled, there is a single attempt.
/// Otherwise the original timeout is followed by one retry per ceiling, each
/// capped at the smaller of the ceiling and the original.
pub fn attempt_timeouts(timeout: Option<Duration>, retry: bool) -> Vec<Option<Duration>> {
    match timeout {
        Some(timeout) if retry => std::iter::once(timeout)
            .chain(TIMEOUT_RETRY_CEILINGS.iter().map(|ceiling| timeout.min(*ceiling)))
            .map(Some)
            .collect(),
        timeout => vec![timeout],
    }
}

/// Truncate `s` to at most `max` bytes on a char boundary.
pub(crate) fn truncate_utf8(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
