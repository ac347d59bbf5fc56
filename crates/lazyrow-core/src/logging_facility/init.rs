//! Logging initialization

use super::test_capture::init_test_capture;
use std::sync::Once;
use tracing_subscriber::{util::SubscriberInitExt, EnvFilter};

/// Logging profile configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// Human-readable output, debug level for the lazyrow crates
    Development,
    /// JSON lines, info level
    Production,
    /// No output; events go to the in-memory test capture
    Test,
}

const DEV_FILTER: &str = "lazyrow_core=debug,lazyrow_store=debug,lazyrow_engine=debug";
const PROD_FILTER: &str = "lazyrow_core=info,lazyrow_store=info,lazyrow_engine=info";

static INIT_ONCE: Once = Once::new();

/// Initialize the logging facility
///
/// Only the first call has an effect. `RUST_LOG` overrides the profile's
/// default filter.
pub fn init(profile: Profile) {
    INIT_ONCE.call_once(|| match profile {
        Profile::Development => {
            tracing_subscriber::fmt()
                .with_env_filter(
                    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEV_FILTER)),
                )
                .with_writer(std::io::stderr)
                .try_init()
                .ok();
        }
        Profile::Production => {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(
                    EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| EnvFilter::new(PROD_FILTER)),
                )
                .with_writer(std::io::stderr)
                .try_init()
                .ok();
        }
        Profile::Test => {
            init_test_capture();
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_idempotent() {
        init(Profile::Test);
        init(Profile::Test);
    }

    #[test]
    fn test_test_profile_keeps_capture_working() {
        // Given: The test profile initialized first
        init(Profile::Test);

        // When: A capture handle is taken afterwards and an event is emitted
        let capture = init_test_capture();
        tracing::info!(op = "test_profile_capture_unique", event = "start");

        // Then: The event was captured
        assert_eq!(capture.events_for_op("test_profile_capture_unique").len(), 1);
    }
}
