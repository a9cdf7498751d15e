//! Rolling high/low over the trailing window.

use crate::domain::CandleWindow;

/// Minimum low over the last `period` candles.
///
/// Returns `None` when the window holds fewer than `period` candles.
pub fn rolling_low(window: &CandleWindow, period: usize) -> Option<f64> {
    assert!(period >= 1, "rolling period must be >= 1");
    if window.len() < period {
        return None;
    }
    window.last_n(period).map(|c| c.low).reduce(f64::min)
}

/// Maximum high over the last `period` candles.
pub fn rolling_high(window: &CandleWindow, period: usize) -> Option<f64> {
    assert!(period >= 1, "rolling period must be >= 1");
    if window.len() < period {
        return None;
    }
    window.last_n(period).map(|c| c.high).reduce(f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_window, DEFAULT_EPSILON};

    #[test]
    fn rolling_extremes_of_known_candles() {
        // make_window sets high = close + 1, low = close - 1.
        let window = make_window(&[10.0, 14.0, 12.0, 11.0]);
        assert_approx(rolling_high(&window, 3).unwrap(), 15.0, DEFAULT_EPSILON);
        assert_approx(rolling_low(&window, 3).unwrap(), 10.0, DEFAULT_EPSILON);
        // Full window picks up the 14.0 candle's high.
        assert_approx(rolling_high(&window, 4).unwrap(), 15.0, DEFAULT_EPSILON);
        assert_approx(rolling_low(&window, 4).unwrap(), 9.0, DEFAULT_EPSILON);
    }

    #[test]
    fn rolling_requires_full_period() {
        let window = make_window(&[10.0, 11.0]);
        assert!(rolling_low(&window, 3).is_none());
        assert!(rolling_high(&window, 3).is_none());
    }
}
