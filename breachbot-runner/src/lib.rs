//! BreachBot Runner — live-loop orchestration around `breachbot-core`.
//!
//! This crate builds on `breachbot-core` to provide:
//! - Environment-variable configuration loading
//! - JSON persistence of circuit-breaker state across restarts
//! - The polling trading loop with injectable clock and collaborators
//!
//! A deployment supplies concrete [`CandleFeed`](breachbot_core::feed::CandleFeed),
//! [`AccountProvider`](breachbot_core::account::AccountProvider), and
//! [`ExecutionClient`](breachbot_core::dispatch::ExecutionClient)
//! implementations for its exchange and hands them to [`TradingLoop`].

pub mod config;
pub mod runner;
pub mod state;

pub use config::from_env;
pub use runner::{Clock, CycleError, CycleReport, SystemClock, TradingLoop};

/// Install the global tracing subscriber, filtered by `RUST_LOG`
/// (default `info`). Call once at process start.
pub fn init_telemetry() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn cycle_report_is_send_sync() {
        assert_send::<CycleReport>();
        assert_sync::<CycleReport>();
    }

    #[test]
    fn cycle_error_is_send_sync() {
        assert_send::<CycleError>();
        assert_sync::<CycleError>();
    }
}
