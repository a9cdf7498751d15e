//! Signals and the pending-entry record.

use super::order::OrderSide;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Direction of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// The order side that opens a position in this direction.
    pub fn entry_side(&self) -> OrderSide {
        match self {
            Direction::Long => OrderSide::Buy,
            Direction::Short => OrderSide::Sell,
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            Direction::Long => Direction::Short,
            Direction::Short => Direction::Long,
        }
    }
}

/// A directional bias detected on a closed candle.
///
/// The stop reference is captured at signal time (the 10-candle rolling low
/// for longs, rolling high for shorts) so the eventual entry is protected by
/// the structure that existed when the breach happened, not whatever the
/// market looks like one interval later.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub direction: Direction,
    /// Timestamp of the closed candle that produced this signal.
    pub source_timestamp: DateTime<Utc>,
    /// Stop-loss reference price captured at signal time.
    pub stop_reference: f64,
}

/// A signal queued for execution at the open of the next candle.
///
/// Lifetime is exactly one candle interval: the entry is consumed at the
/// next open or discarded as stale, never carried further.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PendingEntry {
    pub signal: Signal,
}

impl PendingEntry {
    pub fn new(signal: Signal) -> Self {
        Self { signal }
    }

    /// The only timestamp at which this entry may execute.
    pub fn executes_at(&self, interval: Duration) -> DateTime<Utc> {
        self.signal.source_timestamp + interval
    }
}
