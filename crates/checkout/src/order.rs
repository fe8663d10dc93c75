//! Orders and order drafts.
//!
//! An [`Order`] is created exactly once per checkout session and is
//! immutable from the engine's perspective; status transitions happen on
//! the gateway side.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use marigold_core::{AddressId, CurrencyCode, Money, OrderId, OrderStatus, PaymentMethod};

use crate::address::Address;
use crate::cart::CartItem;
use crate::pricing::Totals;

/// Everything the gateway needs to create an order.
#[derive(Debug, Clone)]
pub struct OrderDraft {
    pub address_id: AddressId,
    pub payment_method: PaymentMethod,
    /// Gateway payment reference; `None` for cash-on-delivery.
    pub payment_reference: Option<String>,
    /// Cart snapshot at submission time.
    pub items: Vec<CartItem>,
    pub coupon_code: Option<String>,
    pub totals: Totals,
    pub currency: CurrencyCode,
}

/// A created order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    /// Customer-facing order number (e.g., "MG-10042-317").
    pub order_number: String,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    /// Line items frozen at submission time.
    pub items: Vec<CartItem>,
    /// Delivery address frozen at submission time.
    pub address: Address,
    pub total: Money,
    pub placed_at: DateTime<Utc>,
}
