//! Engine configuration.
//!
//! An explicit, passed configuration struct — the engine carries no ambient
//! globals. Defaults mirror the demo-account strategy parameters.

use crate::domain::{MarginMode, Symbol, Timeframe};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Demo accounts cap leverage at 10x.
pub const MAX_LEVERAGE: u32 = 10;

/// Upper bound on dispatch attempts. Backoff waits run inline on the cycle
/// thread, so the cumulative worst case must stay short of a candle
/// interval.
pub const MAX_DISPATCH_ATTEMPTS: u32 = 6;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("leverage {0} outside 1..={MAX_LEVERAGE}")]
    InvalidLeverage(u32),

    #[error("base margin must be positive, got {0}")]
    InvalidBaseMargin(f64),

    #[error("take-profit percentage must be in (0, 1), got {0}")]
    InvalidTakeProfit(f64),

    #[error("risk-per-trade fraction must be in (0, 1), got {0}")]
    InvalidRiskPerTrade(f64),

    #[error("consecutive-loss threshold must be >= 1")]
    InvalidLossThreshold,

    #[error("dispatch attempts {0} outside 1..={MAX_DISPATCH_ATTEMPTS}")]
    InvalidMaxAttempts(u32),

    #[error("symbol must not be empty")]
    EmptySymbol,
}

/// Full configuration surface of the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub symbol: Symbol,
    pub timeframe: Timeframe,
    pub leverage: u32,
    pub margin_mode: MarginMode,
    /// Margin allocated per trade, in quote currency. Sizing is based on
    /// this, never on the full account balance.
    pub base_margin: f64,
    /// Take-profit distance as a fraction of entry price.
    pub tp_percentage: f64,
    /// Maximum risk-at-stop per trade, as a fraction of account balance.
    pub risk_per_trade: f64,
    /// Consecutive losses that trip the circuit breaker.
    pub loss_threshold: u32,
    /// Cooldown before the breaker re-arms.
    pub cooldown_secs: u64,
    /// Maximum submission attempts per order intent.
    pub max_attempts: u32,
    /// Base delay for exponential backoff between attempts.
    pub backoff_base_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            symbol: "XRP-USDT".into(),
            timeframe: Timeframe::M5,
            leverage: 3,
            margin_mode: MarginMode::Isolated,
            base_margin: 100.0,
            tp_percentage: 0.03,
            risk_per_trade: 0.01,
            loss_threshold: 3,
            cooldown_secs: 3600,
            max_attempts: 3,
            backoff_base_ms: 2000,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.symbol.is_empty() {
            return Err(ConfigError::EmptySymbol);
        }
        if self.leverage == 0 || self.leverage > MAX_LEVERAGE {
            return Err(ConfigError::InvalidLeverage(self.leverage));
        }
        if !(self.base_margin > 0.0) {
            return Err(ConfigError::InvalidBaseMargin(self.base_margin));
        }
        if !(self.tp_percentage > 0.0 && self.tp_percentage < 1.0) {
            return Err(ConfigError::InvalidTakeProfit(self.tp_percentage));
        }
        if !(self.risk_per_trade > 0.0 && self.risk_per_trade < 1.0) {
            return Err(ConfigError::InvalidRiskPerTrade(self.risk_per_trade));
        }
        if self.loss_threshold == 0 {
            return Err(ConfigError::InvalidLossThreshold);
        }
        if self.max_attempts == 0 || self.max_attempts > MAX_DISPATCH_ATTEMPTS {
            return Err(ConfigError::InvalidMaxAttempts(self.max_attempts));
        }
        Ok(())
    }
}
