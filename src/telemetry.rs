//! Log subscriber setup for binaries and tests.
//!
//! The library itself only emits `tracing` events. These helpers install a
//! global subscriber filtered by `RUST_LOG` (default `info`). Installing
//! twice is a no-op, so tests may call them freely.

use tracing_subscriber::EnvFilter;

fn filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Installs a human-readable subscriber. Returns `false` if one was
/// already installed.
pub fn init_tracing() -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(filter())
        .with_target(false)
        .try_init()
        .is_ok()
}

/// Installs a JSON subscriber, one object per line. Returns `false` if a
/// subscriber was already installed.
pub fn init_json_tracing() -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(filter())
        .json()
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_install_is_harmless() {
        init_tracing();
        assert!(!init_tracing());
        assert!(!init_json_tracing());
    }
}
