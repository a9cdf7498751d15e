//! Account state collaborator contract.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("account error: {0}")]
    Other(String),
}

/// A point-in-time view of the account, queried once per candle cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccountView {
    /// Total balance in quote currency.
    pub balance: f64,
    /// Number of currently open positions on the traded symbol.
    pub open_positions: usize,
}

impl AccountView {
    pub fn has_open_position(&self) -> bool {
        self.open_positions > 0
    }
}

/// Provider of balance and open positions on demand.
pub trait AccountProvider {
    fn account(&self) -> Result<AccountView, AccountError>;
}
