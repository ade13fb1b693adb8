//! Tunables for the HTTP layer.

use std::time::Duration;

/// Cap on in-flight requests.
pub const MAX_CONCURRENCY: usize = 512;

/// Request body cap (the old server rejected posts over 1 MiB).
pub const MAX_BODY_SIZE: usize = 1024 * 1024;

/// Per-request timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
