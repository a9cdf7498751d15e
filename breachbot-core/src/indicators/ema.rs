//! Exponential Moving Average (EMA) as an incremental stream.
//!
//! Recursive: EMA[t] = alpha * close[t] + (1 - alpha) * EMA[t-1]
//! Seed: SMA of the first `period` closes seen.
//!
//! The state is fed every closed candle exactly once and is never reset per
//! window — resetting on each trailing window would discontinue the smoothing
//! every candle.

#[derive(Debug, Clone)]
pub struct EmaState {
    period: usize,
    alpha: f64,
    seed_sum: f64,
    seen: usize,
    value: Option<f64>,
}

impl EmaState {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "EMA period must be >= 1");
        Self {
            period,
            alpha: 2.0 / (period as f64 + 1.0),
            seed_sum: 0.0,
            seen: 0,
            value: None,
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }

    /// Current EMA value, `None` until the seed window has filled.
    pub fn value(&self) -> Option<f64> {
        self.value
    }

    /// Feed the next close. Returns the updated value once seeded.
    pub fn update(&mut self, close: f64) -> Option<f64> {
        match self.value {
            None => {
                self.seed_sum += close;
                self.seen += 1;
                if self.seen == self.period {
                    self.value = Some(self.seed_sum / self.period as f64);
                }
            }
            Some(prev) => {
                self.value = Some(self.alpha * close + (1.0 - self.alpha) * prev);
            }
        }
        self.value
    }

    /// Discard all state. Used when the candle stream is re-seeded after a gap.
    pub fn reset(&mut self) {
        self.seed_sum = 0.0;
        self.seen = 0;
        self.value = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn ema_period_1_tracks_close() {
        let mut ema = EmaState::new(1);
        assert_approx(ema.update(100.0).unwrap(), 100.0, DEFAULT_EPSILON);
        assert_approx(ema.update(200.0).unwrap(), 200.0, DEFAULT_EPSILON);
    }

    #[test]
    fn ema_3_known_values() {
        // Closes: 10, 11, 12, 13, 14
        // alpha = 2/(3+1) = 0.5
        // Seed after 3 closes: SMA(10,11,12) = 11.0
        // EMA[3] = 0.5*13 + 0.5*11.0 = 12.0
        // EMA[4] = 0.5*14 + 0.5*12.0 = 13.0
        let mut ema = EmaState::new(3);
        assert!(ema.update(10.0).is_none());
        assert!(ema.update(11.0).is_none());
        assert_approx(ema.update(12.0).unwrap(), 11.0, DEFAULT_EPSILON);
        assert_approx(ema.update(13.0).unwrap(), 12.0, DEFAULT_EPSILON);
        assert_approx(ema.update(14.0).unwrap(), 13.0, DEFAULT_EPSILON);
    }

    #[test]
    fn ema_is_not_reset_between_updates() {
        // Feeding the same close forever converges to that close, regardless
        // of how the stream started.
        let mut ema = EmaState::new(3);
        for close in [10.0, 20.0, 30.0] {
            ema.update(close);
        }
        for _ in 0..200 {
            ema.update(50.0);
        }
        assert_approx(ema.value().unwrap(), 50.0, 1e-6);
    }

    #[test]
    fn ema_reset_clears_seed_progress() {
        let mut ema = EmaState::new(3);
        ema.update(10.0);
        ema.update(11.0);
        ema.reset();
        assert!(ema.value().is_none());
        assert!(ema.update(12.0).is_none());
        assert!(ema.update(13.0).is_none());
        assert!(ema.update(14.0).is_some());
    }
}
