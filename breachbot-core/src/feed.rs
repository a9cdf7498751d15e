//! Candle feed collaborator contract.
//!
//! The feed produces an append-only, time-ordered sequence of closed candles.
//! It must never re-order or silently fill holes — a missing candle surfaces
//! as a [`WindowError::FeedGap`](crate::domain::WindowError::FeedGap) when the
//! engine appends the fetched history.

use crate::domain::{Candle, Timeframe};
use thiserror::Error;

/// Structured error types for candle fetches.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by exchange (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("feed error: {0}")]
    Other(String),
}

impl FeedError {
    /// Transient failures are worth retrying on the next cycle.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            FeedError::NetworkUnreachable(_) | FeedError::RateLimited { .. }
        )
    }
}

/// Source of closed candles for one symbol and timeframe.
pub trait CandleFeed {
    /// Fetch up to `limit` of the most recent closed candles, oldest first.
    fn fetch(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candle>, FeedError>;
}
