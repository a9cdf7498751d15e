//! breachbot-core — signal generation and order lifecycle for a
//! single-symbol futures strategy.
//!
//! The engine turns a stream of closed candles into sized, risk-approved
//! order intents:
//! - Candle window with ordering/gap enforcement
//! - SMA/EMA/rolling-extreme indicator snapshots
//! - Band-breach signal detection (close outside both moving averages)
//! - Single-slot pending entry executed at the next candle's open
//! - Margin/leverage position sizing with a hard risk-per-trade gate
//! - Consecutive-loss circuit breaker with cooldown re-arm
//! - Order dispatch with bounded retry, backoff, and idempotency tokens
//!
//! All I/O lives behind the collaborator traits ([`feed::CandleFeed`],
//! [`account::AccountProvider`], [`dispatch::ExecutionClient`]); the engine
//! itself is driven one candle at a time by an external supervisor.

pub mod account;
pub mod config;
pub mod dispatch;
pub mod domain;
pub mod engine;
pub mod feed;
pub mod indicators;
pub mod risk;
pub mod signals;
pub mod sizing;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: types crossing the driver boundary are Send + Sync.
    ///
    /// The live driver runs dispatch and candle ingestion on separate
    /// threads; if any of these types regresses, the build breaks here
    /// instead of somewhere in the driver.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        // Domain types
        require_send::<domain::Candle>();
        require_sync::<domain::Candle>();
        require_send::<domain::CandleWindow>();
        require_sync::<domain::CandleWindow>();
        require_send::<domain::Signal>();
        require_sync::<domain::Signal>();
        require_send::<domain::PendingEntry>();
        require_sync::<domain::PendingEntry>();
        require_send::<domain::OrderIntent>();
        require_sync::<domain::OrderIntent>();
        require_send::<domain::OrderRequest>();
        require_sync::<domain::OrderRequest>();
        require_send::<domain::OrderResult>();
        require_sync::<domain::OrderResult>();

        // ID types
        require_send::<domain::ClientOrderId>();
        require_sync::<domain::ClientOrderId>();
        require_send::<domain::ExchangeOrderId>();
        require_sync::<domain::ExchangeOrderId>();

        // Config and state
        require_send::<config::EngineConfig>();
        require_sync::<config::EngineConfig>();
        require_send::<risk::RiskState>();
        require_sync::<risk::RiskState>();
        require_send::<engine::Engine>();
        require_sync::<engine::Engine>();
        require_send::<engine::CandleReport>();
        require_sync::<engine::CandleReport>();

        // Indicators
        require_send::<indicators::IndicatorEngine>();
        require_sync::<indicators::IndicatorEngine>();
        require_send::<indicators::IndicatorSnapshot>();
        require_sync::<indicators::IndicatorSnapshot>();
    }
}
