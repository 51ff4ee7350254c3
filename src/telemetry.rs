//! Logging setup for embedders and tests.
//!
//! Library code only emits `tracing` events; nothing here is required.
//! Hosts that already run a subscriber keep their own. [`init`] is for
//! binaries and tests that want the standard stderr setup.

use tracing::metadata::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Map a `-v` count onto a default level.
pub fn level_from_verbosity(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::ERROR,
        1 => LevelFilter::INFO,
        _ => LevelFilter::DEBUG,
    }
}

/// Install a compact stderr subscriber, overridable via the `LOG`
/// environment variable.
///
/// Safe to call more than once; calls after the first are no-ops.
pub fn init(verbosity: u8) {
    let filter = EnvFilter::builder()
        .with_default_directive(level_from_verbosity(verbosity).into())
        .with_env_var("LOG")
        .from_env_lossy();
    let _ = tracing_subscriber::fmt()
        .compact()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(true)
        .with_thread_ids(true)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_maps_to_levels() {
        assert_eq!(level_from_verbosity(0), LevelFilter::ERROR);
        assert_eq!(level_from_verbosity(1), LevelFilter::INFO);
        assert_eq!(level_from_verbosity(2), LevelFilter::DEBUG);
        assert_eq!(level_from_verbosity(9), LevelFilter::DEBUG);
    }

    #[test]
    fn repeated_init_is_harmless() {
        init(0);
        init(2);
    }
}
