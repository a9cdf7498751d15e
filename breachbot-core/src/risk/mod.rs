//! Account-level risk bookkeeping and the circuit breaker.
//!
//! The breaker halts new entries after a run of consecutive losing trades
//! and re-arms after a cooldown interval (or an explicit manual reset).
//! Every transition is a pure function of the loss sequence and the caller's
//! supplied timestamps — no hidden timers, so tests and restarts are
//! deterministic. The whole state serializes, letting the driver persist it
//! across process restarts.

use crate::config::EngineConfig;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Circuit breaker position.
///
/// Tripping transitions to cooldown immediately, so the two collapse into
/// one variant carrying the trip timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BreakerState {
    /// New entries permitted.
    Armed,
    /// Entries blocked until the cooldown elapses.
    Cooldown { tripped_at: DateTime<Utc> },
}

/// Consecutive-loss counter plus breaker state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskState {
    consecutive_losses: u32,
    state: BreakerState,
    loss_threshold: u32,
    cooldown_secs: u64,
}

impl RiskState {
    pub fn new(loss_threshold: u32, cooldown_secs: u64) -> Self {
        assert!(loss_threshold >= 1, "loss threshold must be >= 1");
        Self {
            consecutive_losses: 0,
            state: BreakerState::Armed,
            loss_threshold,
            cooldown_secs,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.loss_threshold, config.cooldown_secs)
    }

    pub fn consecutive_losses(&self) -> u32 {
        self.consecutive_losses
    }

    pub fn state(&self) -> BreakerState {
        self.state
    }

    /// Whether new entries are permitted at `now`.
    ///
    /// Re-arms in place once the cooldown has elapsed, resetting the loss
    /// counter to zero.
    pub fn is_armed(&mut self, now: DateTime<Utc>) -> bool {
        match self.state {
            BreakerState::Armed => true,
            BreakerState::Cooldown { tripped_at } => {
                if now - tripped_at >= Duration::seconds(self.cooldown_secs as i64) {
                    self.rearm();
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Record a losing close. Trips the breaker at the threshold.
    pub fn record_loss(&mut self, now: DateTime<Utc>) {
        self.consecutive_losses += 1;
        if self.consecutive_losses >= self.loss_threshold {
            self.state = BreakerState::Cooldown { tripped_at: now };
        }
    }

    /// Record a winning close. Any win resets the loss counter.
    pub fn record_win(&mut self) {
        self.consecutive_losses = 0;
    }

    /// Manual re-arm, regardless of remaining cooldown.
    pub fn rearm(&mut self) {
        self.state = BreakerState::Armed;
        self.consecutive_losses = 0;
    }

    /// Remaining cooldown at `now` (zero when armed).
    pub fn remaining_cooldown(&self, now: DateTime<Utc>) -> Duration {
        match self.state {
            BreakerState::Armed => Duration::zero(),
            BreakerState::Cooldown { tripped_at } => {
                let end = tripped_at + Duration::seconds(self.cooldown_secs as i64);
                (end - now).max(Duration::zero())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, 12, 0, 0).unwrap() + Duration::seconds(secs)
    }

    #[test]
    fn starts_armed() {
        let mut risk = RiskState::new(3, 60);
        assert!(risk.is_armed(t(0)));
        assert_eq!(risk.consecutive_losses(), 0);
    }

    #[test]
    fn trips_after_threshold_losses() {
        let mut risk = RiskState::new(3, 60);
        risk.record_loss(t(0));
        risk.record_loss(t(1));
        assert!(risk.is_armed(t(2))); // 2 < 3
        risk.record_loss(t(2));
        assert!(!risk.is_armed(t(3))); // 3 >= 3 -> tripped
    }

    #[test]
    fn win_resets_counter() {
        let mut risk = RiskState::new(3, 60);
        risk.record_loss(t(0));
        risk.record_loss(t(1));
        risk.record_win();
        risk.record_loss(t(2)); // 1 loss after reset
        assert!(risk.is_armed(t(3)));
        assert_eq!(risk.consecutive_losses(), 1);
    }

    #[test]
    fn rearms_after_cooldown_with_zeroed_counter() {
        let mut risk = RiskState::new(3, 60);
        for i in 0..3 {
            risk.record_loss(t(i));
        }
        assert!(!risk.is_armed(t(30)));
        assert!(risk.is_armed(t(62)));
        assert_eq!(risk.consecutive_losses(), 0);
    }

    #[test]
    fn manual_rearm_ignores_cooldown() {
        let mut risk = RiskState::new(3, 3600);
        for i in 0..3 {
            risk.record_loss(t(i));
        }
        assert!(!risk.is_armed(t(10)));
        risk.rearm();
        assert!(risk.is_armed(t(11)));
        assert_eq!(risk.consecutive_losses(), 0);
    }

    #[test]
    fn remaining_cooldown_counts_down() {
        let mut risk = RiskState::new(1, 60);
        risk.record_loss(t(0));
        assert_eq!(risk.remaining_cooldown(t(15)), Duration::seconds(45));
        assert_eq!(risk.remaining_cooldown(t(90)), Duration::zero());
    }

    #[test]
    fn state_round_trips_through_json() {
        let mut risk = RiskState::new(3, 60);
        risk.record_loss(t(0));
        risk.record_loss(t(1));
        risk.record_loss(t(2));
        let json = serde_json::to_string(&risk).unwrap();
        let mut restored: RiskState = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, risk);
        assert!(!restored.is_armed(t(10)));
        assert!(restored.is_armed(t(100)));
    }
}
