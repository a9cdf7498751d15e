//! Band-breach signal detection.
//!
//! The most recently closed candle is compared against both moving averages.
//! A close strictly outside both bands is a breach; anything else, including
//! exact equality with either band, is inside and produces no signal — flat
//! markets must not generate spurious entries.

use crate::domain::{Candle, Direction, Signal};
use crate::indicators::IndicatorSnapshot;
use serde::{Deserialize, Serialize};

/// Directional bias classified from one closed candle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Bias {
    Long,
    Short,
    /// Inside the band (or touching it exactly).
    Flat,
}

impl Bias {
    pub fn direction(&self) -> Option<Direction> {
        match self {
            Bias::Long => Some(Direction::Long),
            Bias::Short => Some(Direction::Short),
            Bias::Flat => None,
        }
    }
}

/// Classify a closed candle against its indicator snapshot.
pub fn classify(candle: &Candle, snapshot: &IndicatorSnapshot) -> Bias {
    if candle.close > snapshot.sma && candle.close > snapshot.ema {
        Bias::Long
    } else if candle.close < snapshot.sma && candle.close < snapshot.ema {
        Bias::Short
    } else {
        Bias::Flat
    }
}

/// Detect a signal on a closed candle, capturing the stop reference.
///
/// Long entries are protected by the rolling low at signal time, shorts by
/// the rolling high. Returns `None` for a flat bias — at most one signal per
/// candle, none while the close sits inside the band.
pub fn detect(candle: &Candle, snapshot: &IndicatorSnapshot) -> Option<Signal> {
    let direction = classify(candle, snapshot).direction()?;
    let stop_reference = match direction {
        Direction::Long => snapshot.rolling_low,
        Direction::Short => snapshot.rolling_high,
    };
    Some(Signal {
        direction,
        source_timestamp: candle.timestamp,
        stop_reference,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn candle_with_close(close: f64) -> Candle {
        Candle {
            timestamp: chrono::Utc.with_ymd_and_hms(2024, 1, 2, 12, 0, 0).unwrap(),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1000.0,
            is_closed: true,
        }
    }

    fn snapshot(sma: f64, ema: f64) -> IndicatorSnapshot {
        IndicatorSnapshot {
            sma,
            ema,
            rolling_low: 90.0,
            rolling_high: 110.0,
        }
    }

    #[test]
    fn close_above_both_bands_is_long() {
        let bias = classify(&candle_with_close(105.0), &snapshot(100.0, 101.0));
        assert_eq!(bias, Bias::Long);
    }

    #[test]
    fn close_below_both_bands_is_short() {
        let bias = classify(&candle_with_close(95.0), &snapshot(100.0, 99.0));
        assert_eq!(bias, Bias::Short);
    }

    #[test]
    fn close_between_bands_is_flat() {
        let bias = classify(&candle_with_close(100.0), &snapshot(99.0, 101.0));
        assert_eq!(bias, Bias::Flat);
    }

    #[test]
    fn exact_equality_with_a_band_is_flat() {
        // Equal to the SMA while above the EMA: not a breach.
        assert_eq!(
            classify(&candle_with_close(100.0), &snapshot(100.0, 99.0)),
            Bias::Flat
        );
        // Equal to the EMA while below the SMA: not a breach.
        assert_eq!(
            classify(&candle_with_close(100.0), &snapshot(101.0, 100.0)),
            Bias::Flat
        );
        // Equal to both bands: not a breach.
        assert_eq!(
            classify(&candle_with_close(100.0), &snapshot(100.0, 100.0)),
            Bias::Flat
        );
    }

    #[test]
    fn long_signal_uses_rolling_low_as_stop() {
        let signal = detect(&candle_with_close(120.0), &snapshot(100.0, 101.0)).unwrap();
        assert_eq!(signal.direction, Direction::Long);
        assert_eq!(signal.stop_reference, 90.0);
    }

    #[test]
    fn short_signal_uses_rolling_high_as_stop() {
        let signal = detect(&candle_with_close(80.0), &snapshot(100.0, 99.0)).unwrap();
        assert_eq!(signal.direction, Direction::Short);
        assert_eq!(signal.stop_reference, 110.0);
    }

    #[test]
    fn flat_bias_produces_no_signal() {
        assert!(detect(&candle_with_close(100.0), &snapshot(99.0, 101.0)).is_none());
    }
}
