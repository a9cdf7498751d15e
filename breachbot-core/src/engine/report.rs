//! Per-candle outcome types reported to the driver.

use crate::domain::{ClientOrderId, Direction, OrderIntent, Signal};
use crate::sizing::SizingError;
use chrono::{DateTime, Utc};
use std::fmt;

/// Why a drained pending entry did not become an order intent.
#[derive(Debug)]
pub enum SkipReason {
    /// The entry's execution candle never arrived; it is discarded, never
    /// executed late.
    StaleSignal {
        queued_at: DateTime<Utc>,
        expected_at: DateTime<Utc>,
    },
    /// A position is already open; the strategy holds one at a time.
    PositionOpen,
    /// The circuit breaker is in cooldown.
    CircuitBreakerTripped,
    /// Sizing rejected the entry (risk cap or degenerate stop).
    SizingRejected(SizingError),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::StaleSignal {
                queued_at,
                expected_at,
            } => write!(
                f,
                "stale signal: queued at {queued_at}, execution candle {expected_at} never arrived"
            ),
            SkipReason::PositionOpen => f.write_str("position already open"),
            SkipReason::CircuitBreakerTripped => f.write_str("circuit breaker tripped"),
            SkipReason::SizingRejected(err) => write!(f, "sizing rejected: {err}"),
        }
    }
}

/// Everything that happened while processing one closed candle.
#[derive(Debug)]
pub struct CandleReport {
    pub timestamp: DateTime<Utc>,
    /// Risk-approved intent drained from the pending slot, ready to dispatch.
    pub intent: Option<OrderIntent>,
    /// Why the drained entry was skipped, if it was.
    pub skipped: Option<SkipReason>,
    /// Fresh signal detected on this candle (queued for the next open).
    pub signal: Option<Signal>,
    /// True while the window is still short of the indicator minimum.
    pub warming_up: bool,
}

impl CandleReport {
    pub(crate) fn empty(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            intent: None,
            skipped: None,
            signal: None,
            warming_up: false,
        }
    }
}

/// The engine's record of the single open position.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenPosition {
    pub direction: Direction,
    pub size: f64,
    pub entry_price: f64,
    pub client_order_id: ClientOrderId,
    pub opened_at: DateTime<Utc>,
}
