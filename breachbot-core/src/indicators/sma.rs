//! Simple Moving Average (SMA) over the trailing window.

use crate::domain::CandleWindow;

/// Arithmetic mean of the last `period` closes.
///
/// Returns `None` when the window holds fewer than `period` candles.
pub fn sma(window: &CandleWindow, period: usize) -> Option<f64> {
    assert!(period >= 1, "SMA period must be >= 1");
    if window.len() < period {
        return None;
    }
    let sum: f64 = window.last_closes(period).sum();
    Some(sum / period as f64)
}
