//! Indicator computation for the band-breach strategy.
//!
//! Three reference series feed signal detection: a simple moving average, an
//! exponentially weighted moving average (kept as an incremental stream so
//! the smoothing is never reset per window), and a rolling high/low used as
//! the stop reference. [`IndicatorEngine`] bundles them and produces one
//! immutable [`IndicatorSnapshot`] per closed candle.

pub mod ema;
pub mod rolling;
pub mod sma;
pub mod snapshot;

pub use ema::EmaState;
pub use rolling::{rolling_high, rolling_low};
pub use sma::sma;
pub use snapshot::{IndicatorEngine, IndicatorError, IndicatorSnapshot};

/// Append a synthetic closed candle with the given close at slot `i`.
///
/// Candles are spaced one window interval apart starting at 2024-01-02 00:00,
/// with high = close + 1.0 and low = close - 1.0.
#[cfg(test)]
pub fn push_close(window: &mut crate::domain::CandleWindow, i: usize, close: f64) {
    use crate::domain::Candle;
    use chrono::TimeZone;
    let base = chrono::Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    let candle = Candle {
        timestamp: base + window.timeframe().interval() * i as i32,
        open: close,
        high: close + 1.0,
        low: close - 1.0,
        close,
        volume: 1000.0,
        is_closed: true,
    };
    window.push(candle).expect("synthetic candle rejected");
}

/// Build a 5-minute window preloaded with the given closes.
#[cfg(test)]
pub fn make_window(closes: &[f64]) -> crate::domain::CandleWindow {
    use crate::domain::{CandleWindow, Timeframe};
    let mut window = CandleWindow::new(closes.len().max(1), Timeframe::M5);
    for (i, &close) in closes.iter().enumerate() {
        push_close(&mut window, i, close);
    }
    window
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
