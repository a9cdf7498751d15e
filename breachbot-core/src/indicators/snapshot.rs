//! IndicatorSnapshot — the reference values computed once per closed candle.

use super::ema::EmaState;
use super::rolling::{rolling_high, rolling_low};
use super::sma::sma;
use crate::domain::CandleWindow;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndicatorError {
    #[error("insufficient history: have {have} candles, need {need}")]
    InsufficientHistory { have: usize, need: usize },
}

/// Computed reference values for one closed candle. Immutable once produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorSnapshot {
    pub sma: f64,
    pub ema: f64,
    pub rolling_low: f64,
    pub rolling_high: f64,
}

/// Computes one [`IndicatorSnapshot`] per closed candle.
///
/// Owns the incremental EMA stream; `observe_close` must be called exactly
/// once for every candle appended to the window, in order.
#[derive(Debug, Clone)]
pub struct IndicatorEngine {
    sma_period: usize,
    stop_lookback: usize,
    ema: EmaState,
}

impl IndicatorEngine {
    pub fn new(sma_period: usize, ema_period: usize, stop_lookback: usize) -> Self {
        Self {
            sma_period,
            stop_lookback,
            ema: EmaState::new(ema_period),
        }
    }

    /// Strategy defaults: SMA 21, EMA 34, 10-candle stop lookback.
    pub fn with_defaults() -> Self {
        Self::new(21, 34, 10)
    }

    /// Candles required before the first snapshot can be produced.
    ///
    /// One extra candle past the longest moving-average period, so the bands
    /// already existed on the candle before the one being classified.
    pub fn min_history(&self) -> usize {
        (self.ema.period() + 1)
            .max(self.sma_period + 1)
            .max(self.stop_lookback)
    }

    /// Feed the close of a newly appended candle into the EMA stream.
    pub fn observe_close(&mut self, close: f64) {
        self.ema.update(close);
    }

    /// Discard EMA state. Used when the window is re-seeded after a feed gap.
    pub fn reset(&mut self) {
        self.ema.reset();
    }

    /// Compute the snapshot for the window's latest candle.
    pub fn snapshot(&self, window: &CandleWindow) -> Result<IndicatorSnapshot, IndicatorError> {
        let need = self.min_history();
        let have = window.len();
        if have < need {
            return Err(IndicatorError::InsufficientHistory { have, need });
        }
        // min_history guarantees every component below is available.
        let sma = sma(window, self.sma_period)
            .ok_or(IndicatorError::InsufficientHistory { have, need })?;
        let ema = self
            .ema
            .value()
            .ok_or(IndicatorError::InsufficientHistory { have, need })?;
        let low = rolling_low(window, self.stop_lookback)
            .ok_or(IndicatorError::InsufficientHistory { have, need })?;
        let high = rolling_high(window, self.stop_lookback)
            .ok_or(IndicatorError::InsufficientHistory { have, need })?;
        Ok(IndicatorSnapshot {
            sma,
            ema,
            rolling_low: low,
            rolling_high: high,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Timeframe;
    use crate::indicators::{assert_approx, make_window, push_close, DEFAULT_EPSILON};
    use crate::domain::CandleWindow;

    fn fed_engine(closes: &[f64]) -> (IndicatorEngine, CandleWindow) {
        let mut engine = IndicatorEngine::with_defaults();
        let mut window = CandleWindow::new(64, Timeframe::M5);
        for (i, &close) in closes.iter().enumerate() {
            push_close(&mut window, i, close);
            engine.observe_close(close);
        }
        (engine, window)
    }

    #[test]
    fn default_min_history_is_35() {
        assert_eq!(IndicatorEngine::with_defaults().min_history(), 35);
    }

    #[test]
    fn snapshot_fails_below_min_history() {
        let closes: Vec<f64> = (0..34).map(|i| 100.0 + i as f64).collect();
        let (engine, window) = fed_engine(&closes);
        match engine.snapshot(&window) {
            Err(IndicatorError::InsufficientHistory { have, need }) => {
                assert_eq!(have, 34);
                assert_eq!(need, 35);
            }
            other => panic!("expected InsufficientHistory, got {other:?}"),
        }
    }

    #[test]
    fn snapshot_at_exactly_min_history() {
        let closes: Vec<f64> = (0..35).map(|i| 100.0 + i as f64).collect();
        let (engine, window) = fed_engine(&closes);
        let snap = engine.snapshot(&window).unwrap();
        // SMA21 of closes 114..134 = 124.
        assert_approx(snap.sma, 124.0, DEFAULT_EPSILON);
        // make_window-style candles: high = close + 1, low = close - 1.
        assert_approx(snap.rolling_high, 135.0, DEFAULT_EPSILON);
        assert_approx(snap.rolling_low, 124.0, DEFAULT_EPSILON);
        assert!(snap.ema.is_finite());
    }

    #[test]
    fn snapshot_sma_matches_flat_series() {
        let closes = vec![100.0; 40];
        let (engine, window) = fed_engine(&closes);
        let snap = engine.snapshot(&window).unwrap();
        assert_approx(snap.sma, 100.0, DEFAULT_EPSILON);
        assert_approx(snap.ema, 100.0, DEFAULT_EPSILON);
    }

    #[test]
    fn small_periods_use_window_helpers() {
        let window = make_window(&[10.0, 11.0, 12.0]);
        let mut engine = IndicatorEngine::new(2, 2, 2);
        for close in [10.0, 11.0, 12.0] {
            engine.observe_close(close);
        }
        let snap = engine.snapshot(&window).unwrap();
        assert_approx(snap.sma, 11.5, DEFAULT_EPSILON);
        assert_approx(snap.rolling_high, 13.0, DEFAULT_EPSILON);
        assert_approx(snap.rolling_low, 10.0, DEFAULT_EPSILON);
    }
}
