//! Constants for the download module (timeouts).

/// Default HTTP connect timeout (15 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 15;

/// Default HTTP read timeout (60 seconds).
pub const READ_TIMEOUT_SECS: u64 = 60;

/// Default deadline for one complete page fetch (60 seconds).
pub const FETCH_TIMEOUT_SECS: u64 = 60;
