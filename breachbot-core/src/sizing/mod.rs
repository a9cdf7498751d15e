//! Position sizing and the per-trade risk gate.
//!
//! Sizing is notional: `contracts = base_margin / entry_price`, scaled by
//! leverage. The risk-per-trade rule is a validation gate on the result,
//! never a second sizing source — an intent is accepted or rejected whole,
//! so the caller can log and skip deterministically instead of trading a
//! silently clamped size.

use crate::config::EngineConfig;
use crate::domain::{Direction, OrderIntent, Signal};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SizingError {
    #[error(
        "risk limit exceeded: risk at stop {risk:.4} > cap {cap:.4} \
         (balance {balance:.2} x risk_per_trade {risk_per_trade})"
    )]
    RiskLimitExceeded {
        risk: f64,
        cap: f64,
        balance: f64,
        risk_per_trade: f64,
    },

    #[error("invalid stop {stop} for {direction:?} entry at {entry}")]
    InvalidStop {
        direction: Direction,
        entry: f64,
        stop: f64,
    },

    #[error("entry price must be positive, got {0}")]
    InvalidEntryPrice(f64),
}

/// Take-profit level: entry +/- the configured fraction, sign by direction.
pub fn take_profit(direction: Direction, entry_price: f64, tp_percentage: f64) -> f64 {
    match direction {
        Direction::Long => entry_price * (1.0 + tp_percentage),
        Direction::Short => entry_price * (1.0 - tp_percentage),
    }
}

/// Position size from margin allocation and leverage.
pub fn position_size(base_margin: f64, entry_price: f64, leverage: u32) -> f64 {
    let contracts = base_margin / entry_price;
    contracts * leverage as f64
}

/// Size a signal into an order intent, or reject it.
///
/// The stop must sit on the protective side of the entry (below for longs,
/// above for shorts), and risk-at-stop may not exceed
/// `balance * risk_per_trade`. Boundary equality is accepted.
pub fn build_intent(
    config: &EngineConfig,
    signal: &Signal,
    entry_price: f64,
    balance: f64,
) -> Result<OrderIntent, SizingError> {
    if !(entry_price > 0.0) {
        return Err(SizingError::InvalidEntryPrice(entry_price));
    }

    let stop = signal.stop_reference;
    let wrong_side = match signal.direction {
        Direction::Long => stop >= entry_price,
        Direction::Short => stop <= entry_price,
    };
    if wrong_side {
        return Err(SizingError::InvalidStop {
            direction: signal.direction,
            entry: entry_price,
            stop,
        });
    }

    let size = position_size(config.base_margin, entry_price, config.leverage);
    let risk = size * (entry_price - stop).abs();
    let cap = balance * config.risk_per_trade;
    if risk > cap {
        return Err(SizingError::RiskLimitExceeded {
            risk,
            cap,
            balance,
            risk_per_trade: config.risk_per_trade,
        });
    }

    Ok(OrderIntent {
        symbol: config.symbol.clone(),
        direction: signal.direction,
        size,
        entry_price,
        stop_loss: stop,
        take_profit: take_profit(signal.direction, entry_price, config.tp_percentage),
        leverage: config.leverage,
        margin_mode: config.margin_mode,
        signal_timestamp: signal.source_timestamp,
    })
}
