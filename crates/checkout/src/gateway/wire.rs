//! Wire formats for the commerce gateway REST API.
//!
//! Request and response shapes live here, separate from the domain types,
//! with explicit conversions at the boundary.

use serde::{Deserialize, Serialize};

use marigold_core::{AddressId, CurrencyCode, Money, PaymentMethod, ProductId};

use crate::cart::CartItem;
use crate::gateway::{RemoteCart, RemoteLine};
use crate::order::OrderDraft;
use crate::payment::PaymentOrder;
use crate::pricing::Totals;

/// `POST`/`PUT /cart/items` request body.
#[derive(Debug, Serialize)]
pub(crate) struct LineRequest<'a> {
    pub product_id: ProductId,
    pub name: &'a str,
    pub unit_price: Money,
    pub quantity: u32,
    pub size: Option<&'a str>,
    pub color: Option<&'a str>,
}

impl<'a> From<&'a CartItem> for LineRequest<'a> {
    fn from(item: &'a CartItem) -> Self {
        Self {
            product_id: item.product_id,
            name: &item.name,
            unit_price: item.unit_price,
            quantity: item.quantity,
            size: item.size.as_deref(),
            color: item.color.as_deref(),
        }
    }
}

/// `POST /cart/items` response body.
#[derive(Debug, Deserialize)]
pub(crate) struct LineCreated {
    pub id: String,
}

/// `GET /cart` response body.
#[derive(Debug, Deserialize)]
pub(crate) struct CartPayload {
    #[serde(default)]
    pub lines: Vec<LinePayload>,
    #[serde(default)]
    pub coupon_code: Option<String>,
}

/// One line of the `GET /cart` response.
#[derive(Debug, Deserialize)]
pub(crate) struct LinePayload {
    pub id: String,
    pub product_id: ProductId,
    pub quantity: u32,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

impl From<CartPayload> for RemoteCart {
    fn from(payload: CartPayload) -> Self {
        Self {
            lines: payload
                .lines
                .into_iter()
                .map(|line| RemoteLine {
                    id: line.id,
                    product_id: line.product_id,
                    quantity: line.quantity,
                    size: line.size,
                    color: line.color,
                })
                .collect(),
            coupon_code: payload.coupon_code,
        }
    }
}

/// `POST /cart/coupon` request body.
#[derive(Debug, Serialize)]
pub(crate) struct CouponRequest<'a> {
    pub code: &'a str,
}

/// `POST /payment/orders` request body.
#[derive(Debug, Serialize)]
pub(crate) struct PaymentOrderRequest {
    pub amount: Money,
    pub currency: CurrencyCode,
}

/// `POST /payment/orders` response body.
#[derive(Debug, Deserialize)]
pub(crate) struct PaymentOrderPayload {
    pub reference: String,
    pub amount: Money,
    pub currency: CurrencyCode,
}

impl From<PaymentOrderPayload> for PaymentOrder {
    fn from(payload: PaymentOrderPayload) -> Self {
        Self {
            reference: payload.reference,
            amount: payload.amount,
            currency: payload.currency,
        }
    }
}

/// `POST /orders` request body.
#[derive(Debug, Serialize)]
pub(crate) struct OrderRequest<'a> {
    pub address_id: AddressId,
    pub payment_method: PaymentMethod,
    pub payment_reference: Option<&'a str>,
    pub items: &'a [CartItem],
    pub coupon_code: Option<&'a str>,
    pub totals: &'a Totals,
    pub currency: CurrencyCode,
}

impl<'a> OrderRequest<'a> {
    pub(crate) fn from_draft(draft: &'a OrderDraft) -> Self {
        Self {
            address_id: draft.address_id,
            payment_method: draft.payment_method,
            payment_reference: draft.payment_reference.as_deref(),
            items: &draft.items,
            coupon_code: draft.coupon_code.as_deref(),
            totals: &draft.totals,
            currency: draft.currency,
        }
    }
}
