//! Diagnostic tracing for pulsenet runs.
//!
//! The library crates only emit `tracing` events; nothing is printed until a
//! binary or test installs a subscriber with [`init`].

use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when neither `RUST_LOG` nor the config names one.
pub const DEFAULT_FILTER: &str = "warn";

/// Install a compact stderr subscriber.
///
/// `RUST_LOG` wins when set; otherwise `filter` (usually
/// `SimConfig::log_filter`) applies, then [`DEFAULT_FILTER`]. Fails if a
/// global subscriber is already installed.
///
/// # Example
/// ```bash
/// RUST_LOG=pulsenet_core=trace cargo test -p pulsenet-integration-tests
/// ```
pub fn init(filter: Option<&str>) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter.unwrap_or(DEFAULT_FILTER)));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .try_init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_rejected() {
        assert!(init(Some("debug")).is_ok());
        assert!(init(None).is_err());
    }
}
