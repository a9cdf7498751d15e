//! Order intent, wire-facing request, and submission outcome.

use super::ids::{ClientOrderId, ExchangeOrderId};
use super::signal::Direction;
use super::Symbol;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Buy/sell side of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

/// Margin mode for the position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarginMode {
    Isolated,
    Cross,
}

impl fmt::Display for MarginMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarginMode::Isolated => f.write_str("isolated"),
            MarginMode::Cross => f.write_str("cross"),
        }
    }
}

impl FromStr for MarginMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "isolated" => Ok(MarginMode::Isolated),
            "cross" => Ok(MarginMode::Cross),
            other => Err(format!("unknown margin mode '{other}'")),
        }
    }
}

/// Position side field on the order request. The strategy runs in net mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionSide {
    Net,
    Long,
    Short,
}

/// A fully computed, risk-approved order ready for submission.
///
/// Immutable once built; the dispatcher derives the idempotency token from
/// this struct's serialized form, so every retry of the same intent carries
/// the same client order id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderIntent {
    pub symbol: Symbol,
    pub direction: Direction,
    /// Position size in base units (contracts × leverage applied).
    pub size: f64,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub leverage: u32,
    pub margin_mode: MarginMode,
    /// Timestamp of the candle whose signal produced this intent.
    pub signal_timestamp: DateTime<Utc>,
}

impl OrderIntent {
    /// Deterministic idempotency token: blake3 of the serialized intent.
    ///
    /// Two intents for distinct signals differ at least in
    /// `signal_timestamp`, so tokens never collide across trades.
    pub fn client_order_id(&self) -> ClientOrderId {
        let json = serde_json::to_string(self).expect("OrderIntent serialization failed");
        let hash = blake3::hash(json.as_bytes());
        ClientOrderId(hash.to_hex().to_string())
    }

    /// Build the wire-facing request (market entry with attached triggers).
    pub fn to_request(&self) -> OrderRequest {
        OrderRequest {
            symbol: self.symbol.clone(),
            margin_mode: self.margin_mode,
            position_side: PositionSide::Net,
            side: self.direction.entry_side(),
            order_type: OrderType::Market,
            size: self.size,
            stop_loss_trigger: self.stop_loss,
            take_profit_trigger: self.take_profit,
            leverage: self.leverage,
            client_order_id: self.client_order_id(),
        }
    }
}

/// Entry order type. The strategy only ever enters at market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    Market,
}

/// The submission record handed to the execution collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub symbol: Symbol,
    pub margin_mode: MarginMode,
    pub position_side: PositionSide,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub size: f64,
    pub stop_loss_trigger: f64,
    pub take_profit_trigger: f64,
    pub leverage: u32,
    pub client_order_id: ClientOrderId,
}

/// Terminal outcome of a submission.
///
/// Transient failures are not represented here — they are an error variant
/// on the execution client and are retried, never terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderResult {
    Accepted { exchange_order_id: ExchangeOrderId },
    Rejected { reason: String },
}

impl OrderResult {
    pub fn is_accepted(&self) -> bool {
        matches!(self, OrderResult::Accepted { .. })
    }
}
