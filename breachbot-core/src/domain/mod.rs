//! Domain types for the band-breach engine.

pub mod candle;
pub mod ids;
pub mod order;
pub mod signal;
pub mod timeframe;
pub mod window;

pub use candle::Candle;
pub use ids::{ClientOrderId, ExchangeOrderId};
pub use order::{
    MarginMode, OrderIntent, OrderRequest, OrderResult, OrderSide, OrderType, PositionSide,
};
pub use signal::{Direction, PendingEntry, Signal};
pub use timeframe::Timeframe;
pub use window::{CandleWindow, WindowError};

/// Instrument identifier in exchange notation, e.g. "XRP-USDT".
pub type Symbol = String;
