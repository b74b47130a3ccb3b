//! Test utility functions for integration tests
//!
//! Provides common utilities for test setup, logging, and timing.

use std::time::Duration;

use tokio::time::sleep;
use tracing_subscriber::{fmt, EnvFilter};

/// Result type for integration tests
pub type TestResult<T = ()> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Default timeout for test operations
pub const DEFAULT_TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Time given to the dispatchers to drain what was just sent
pub const SETTLE_TIME: Duration = Duration::from_millis(50);

/// Initialize logging for tests
///
/// Uses RUST_LOG environment variable if set, otherwise defaults to "info"
pub fn init_test_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = fmt().with_env_filter(filter).with_test_writer().try_init();
}

/// Lets spawned dispatchers run for [`SETTLE_TIME`].
///
/// Control commands and frames arrive on different sockets, so a test that
/// needs them applied in order waits between the two.
pub async fn settle() {
    sleep(SETTLE_TIME).await;
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;

    #[tokio::test]
    async fn test_settle_waits() {
        let start = Instant::now();
        settle().await;
        assert!(start.elapsed() >= SETTLE_TIME);
    }
}
