//! Identifier newtypes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Client-supplied idempotency token attached to every order submission.
///
/// Derived deterministically from the intent contents (see
/// [`OrderIntent::client_order_id`](super::order::OrderIntent::client_order_id)),
/// so a retried submission after an ambiguous failure carries the same token
/// and cannot open a second position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientOrderId(pub String);

impl fmt::Display for ClientOrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Exchange-assigned order identifier, returned on acceptance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExchangeOrderId(pub String);

impl fmt::Display for ExchangeOrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
