//! In-memory commerce gateway simulation.
//!
//! Backs the engine when no gateway is configured: addresses live in a
//! local list, payment orders get synthetic references, and orders get
//! synthetic order numbers. Order creation honors the idempotency key the
//! same way the real gateway does, so the submission path behaves
//! identically in both modes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use rand::Rng;
use rand::distr::Alphanumeric;
use tracing::warn;
use uuid::Uuid;

use marigold_core::{AddressId, CurrencyCode, Money, OrderId, OrderStatus};

use crate::address::{Address, AddressDraft};
use crate::cart::CartItem;
use crate::order::{Order, OrderDraft};
use crate::payment::PaymentOrder;

use super::{GatewayError, RemoteCart, RemoteLine};

/// Fully local stand-in for the commerce gateway.
///
/// Clones share state, mirroring the one-backend-per-customer shape of the
/// real gateway.
#[derive(Clone)]
pub struct LocalGateway {
    state: Arc<Mutex<LocalState>>,
}

#[derive(Default)]
struct LocalState {
    lines: Vec<RemoteLine>,
    coupon_code: Option<String>,
    addresses: Vec<Address>,
    orders: HashMap<Uuid, Order>,
    next_line: i64,
    next_address: i64,
    next_order: i64,
}

impl LocalGateway {
    pub(crate) fn new() -> Self {
        warn!("commerce gateway not configured; running offline simulation (nothing is persisted)");
        Self {
            state: Arc::new(Mutex::new(LocalState::default())),
        }
    }

    fn state(&self) -> MutexGuard<'_, LocalState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn fetch_cart(&self) -> RemoteCart {
        let state = self.state();
        RemoteCart {
            lines: state.lines.clone(),
            coupon_code: state.coupon_code.clone(),
        }
    }

    pub(crate) fn upsert_line(&self, item: &CartItem) -> String {
        let mut state = self.state();
        if let Some(remote_id) = &item.remote_id
            && let Some(line) = state.lines.iter_mut().find(|line| &line.id == remote_id)
        {
            line.quantity = item.quantity;
            return remote_id.clone();
        }

        state.next_line += 1;
        let id = format!("line_{}", state.next_line);
        state.lines.push(RemoteLine {
            id: id.clone(),
            product_id: item.product_id,
            quantity: item.quantity,
            size: item.size.clone(),
            color: item.color.clone(),
        });
        id
    }

    pub(crate) fn delete_line(&self, remote_id: &str) {
        self.state().lines.retain(|line| line.id != remote_id);
    }

    pub(crate) fn apply_coupon(&self, code: &str) {
        self.state().coupon_code = Some(code.to_string());
    }

    pub(crate) fn remove_coupon(&self) {
        self.state().coupon_code = None;
    }

    pub(crate) fn list_addresses(&self) -> Vec<Address> {
        self.state().addresses.clone()
    }

    pub(crate) fn create_address(&self, draft: &AddressDraft) -> Address {
        let mut state = self.state();
        if draft.set_default {
            for address in &mut state.addresses {
                address.is_default = false;
            }
        }
        state.next_address += 1;
        let address = Address {
            id: AddressId::new(state.next_address),
            label: draft.label.clone(),
            full_name: draft.full_name.clone(),
            phone: draft.phone.clone(),
            line1: draft.line1.clone(),
            line2: draft.line2.clone(),
            city: draft.city.clone(),
            state: draft.state.clone(),
            pincode: draft.pincode.clone(),
            is_default: draft.set_default,
        };
        state.addresses.push(address.clone());
        address
    }

    pub(crate) fn create_payment_order(
        &self,
        amount: Money,
        currency: CurrencyCode,
    ) -> PaymentOrder {
        PaymentOrder {
            reference: synthetic_reference(),
            amount,
            currency,
        }
    }

    pub(crate) fn create_order(
        &self,
        draft: &OrderDraft,
        idempotency_key: Uuid,
    ) -> Result<Order, GatewayError> {
        let mut state = self.state();
        if let Some(existing) = state.orders.get(&idempotency_key) {
            return Ok(existing.clone());
        }

        let address = state
            .addresses
            .iter()
            .find(|address| address.id == draft.address_id)
            .cloned()
            .ok_or_else(|| GatewayError::Status {
                status: 422,
                message: format!("unknown address {}", draft.address_id),
            })?;

        state.next_order += 1;
        let order = Order {
            id: OrderId::new(state.next_order),
            order_number: synthetic_order_number(state.next_order),
            status: OrderStatus::Created,
            payment_method: draft.payment_method,
            items: draft.items.clone(),
            address,
            total: draft.totals.total,
            placed_at: Utc::now(),
        };

        // Like the real gateway, creating the order consumes the cart.
        state.lines.clear();
        state.coupon_code = None;

        state.orders.insert(idempotency_key, order.clone());
        Ok(order)
    }
}

fn synthetic_reference() -> String {
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(14)
        .map(char::from)
        .collect();
    format!("pay_sim_{suffix}")
}

fn synthetic_order_number(sequence: i64) -> String {
    let suffix: u32 = rand::rng().random_range(0..1_000);
    format!("MG-{}-{suffix:03}", 10_000 + sequence)
}
