//! Public surface for the harness.
//!
//! This crate re-exports the config crate, provides the metrics client
//! factory that consumes resolved config, and a small logging helper to keep
//! binary setup consistent.

pub mod metrics;

/// Re-export for convenience.
pub use harness_rs_config as config;

#[inline]
/// Initialize logging using env_logger if the "logging" feature is enabled.
///
/// This is a no-op if the feature is not enabled. Binaries are still expected
/// to call this early in startup to ensure log output is wired up.
pub fn init_logging() {
    #[cfg(feature = "logging")]
    {
        let _ = env_logger::try_init();
    }
}
