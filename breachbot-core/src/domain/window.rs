//! CandleWindow — the trailing candle history the indicators read from.
//!
//! The window enforces the feed contract at the point of ingestion: closed
//! candles only, strictly increasing timestamps, no duplicates, and exact
//! one-interval spacing. A hole in the sequence is a [`WindowError::FeedGap`],
//! never interpolated.

use super::candle::Candle;
use super::timeframe::Timeframe;
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use thiserror::Error;

/// Errors raised when appending a candle to the window.
#[derive(Debug, Error)]
pub enum WindowError {
    #[error("candle at {0} is not closed")]
    NotClosed(DateTime<Utc>),

    #[error("candle at {got} is not after the last candle at {last}")]
    OutOfOrder {
        last: DateTime<Utc>,
        got: DateTime<Utc>,
    },

    #[error("duplicate candle at {0}")]
    Duplicate(DateTime<Utc>),

    #[error("feed gap: expected candle at {expected}, got {got}")]
    FeedGap {
        expected: DateTime<Utc>,
        got: DateTime<Utc>,
    },

    #[error("candle at {0} failed OHLC sanity check")]
    Insane(DateTime<Utc>),
}

/// Fixed-capacity ordered candle history. Oldest candle is evicted on overflow.
#[derive(Debug, Clone)]
pub struct CandleWindow {
    candles: VecDeque<Candle>,
    capacity: usize,
    timeframe: Timeframe,
}

impl CandleWindow {
    pub fn new(capacity: usize, timeframe: Timeframe) -> Self {
        assert!(capacity >= 1, "window capacity must be >= 1");
        Self {
            candles: VecDeque::with_capacity(capacity),
            capacity,
            timeframe,
        }
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.back()
    }

    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    /// Append a closed candle, enforcing ordering and spacing.
    pub fn push(&mut self, candle: Candle) -> Result<(), WindowError> {
        if !candle.is_closed {
            return Err(WindowError::NotClosed(candle.timestamp));
        }
        if !candle.is_sane() {
            return Err(WindowError::Insane(candle.timestamp));
        }
        if let Some(last) = self.candles.back() {
            if candle.timestamp == last.timestamp {
                return Err(WindowError::Duplicate(candle.timestamp));
            }
            if candle.timestamp < last.timestamp {
                return Err(WindowError::OutOfOrder {
                    last: last.timestamp,
                    got: candle.timestamp,
                });
            }
            let expected = last.timestamp + self.timeframe.interval();
            if candle.timestamp != expected {
                return Err(WindowError::FeedGap {
                    expected,
                    got: candle.timestamp,
                });
            }
        }
        if self.candles.len() == self.capacity {
            self.candles.pop_front();
        }
        self.candles.push_back(candle);
        Ok(())
    }

    /// Drop all history. Used when re-seeding after a feed gap.
    pub fn clear(&mut self) {
        self.candles.clear();
    }

    /// The last `n` candles, oldest first. Empty slice semantics via iterator.
    pub fn last_n(&self, n: usize) -> impl Iterator<Item = &Candle> {
        let skip = self.candles.len().saturating_sub(n);
        self.candles.iter().skip(skip)
    }

    /// Closing prices of the last `n` candles, oldest first.
    pub fn last_closes(&self, n: usize) -> impl Iterator<Item = f64> + '_ {
        self.last_n(n).map(|c| c.close)
    }
}
