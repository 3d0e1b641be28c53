//! Shared helpers for procvisor's integration tests.
//!
//! - [`builders`]: terse construction of descriptors and sub-commands.
//! - [`recorder`]: data/cleanup callbacks that tests can await.

pub mod builders;
pub mod recorder;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

static TRACING: Once = Once::new();

/// Route library logs into the test harness output, once per binary.
///
/// The harness shows them only for failing tests; `RUST_LOG` picks the
/// filter (default `info`).
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        // Another test binary helper may have won the race; that is fine.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

/// Await `fut`, failing the test if a supervised process hangs it for
/// more than five seconds.
pub async fn with_timeout<F, T>(fut: F) -> T
where
    F: Future<Output = T>,
{
    tokio::time::timeout(Duration::from_secs(5), fut)
        .await
        .expect("operation did not finish within 5 seconds")
}
