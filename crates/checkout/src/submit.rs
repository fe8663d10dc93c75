//! Order submission with at-most-once semantics.
//!
//! One [`OrderSubmitter`] guards one checkout session. The in-flight flag
//! goes up synchronously before the network call, so a duplicated "place
//! order" trigger is rejected immediately instead of racing; a completed
//! submission replays its order instead of creating another one; and the
//! same idempotency key accompanies every retry so the gateway can
//! deduplicate on its side too.

use tracing::{error, info, warn};
use uuid::Uuid;

use marigold_core::PaymentMethod;

use crate::cart::CartStore;
use crate::error::{CheckoutError, Result};
use crate::order::{Order, OrderDraft};
use crate::session::{CheckoutSession, CheckoutStage};

/// Converts one checkout session plus the current cart into exactly one
/// order.
pub struct OrderSubmitter {
    /// Sent with every attempt for this session; lets the gateway drop
    /// duplicates even when the client-side guard is bypassed by a retry
    /// after a lost response.
    idempotency_key: Uuid,
    in_flight: bool,
    completed: Option<Order>,
}

impl Default for OrderSubmitter {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderSubmitter {
    /// Create a submitter for one checkout session.
    #[must_use]
    pub fn new() -> Self {
        Self {
            idempotency_key: Uuid::new_v4(),
            in_flight: false,
            completed: None,
        }
    }

    /// Whether a submission is currently awaiting the gateway.
    #[must_use]
    pub const fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// The order created by this submitter, if any.
    #[must_use]
    pub const fn order(&self) -> Option<&Order> {
        self.completed.as_ref()
    }

    /// Submit the order.
    ///
    /// On success the cart is cleared and the session completed. On failure
    /// both are left untouched so the customer can retry without re-entering
    /// address or payment details.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::SubmissionInFlight`] while a submission is pending
    /// - [`CheckoutError::AddressMissing`] / [`CheckoutError::PaymentNotConfirmed`]
    ///   if the session has not reached confirmation
    /// - [`CheckoutError::GatewayUnavailable`] when the gateway cannot be
    ///   reached; retrying is safe
    /// - [`CheckoutError::OrderRejected`] when the gateway refuses the order;
    ///   not retried automatically
    pub async fn submit(
        &mut self,
        session: &mut CheckoutSession,
        cart: &mut CartStore,
    ) -> Result<Order> {
        if let Some(order) = &self.completed {
            // Duplicate confirmation click after success: replay, don't reorder.
            return Ok(order.clone());
        }
        if self.in_flight {
            return Err(CheckoutError::SubmissionInFlight);
        }

        let address_id = session.address_id().ok_or(CheckoutError::AddressMissing)?;
        match session.stage() {
            CheckoutStage::AwaitingConfirmation => {}
            CheckoutStage::AwaitingAddress => return Err(CheckoutError::AddressMissing),
            CheckoutStage::AwaitingPayment => return Err(CheckoutError::PaymentNotConfirmed),
            CheckoutStage::Completed | CheckoutStage::Abandoned => {
                return Err(CheckoutError::SessionClosed);
            }
        }
        let payment_method = session
            .payment_method()
            .ok_or(CheckoutError::PaymentNotConfirmed)?;
        let payment_reference = session.payment_reference().map(str::to_owned);
        if payment_method == PaymentMethod::Online && payment_reference.is_none() {
            return Err(CheckoutError::PaymentNotConfirmed);
        }
        if cart.is_empty() {
            return Err(CheckoutError::OrderRejected("cart is empty".to_string()));
        }

        let snapshot = cart.snapshot();
        let draft = OrderDraft {
            address_id,
            payment_method,
            payment_reference: payment_reference.clone(),
            items: snapshot.items,
            coupon_code: snapshot.coupon_code,
            totals: snapshot.totals,
            currency: cart.currency(),
        };

        // The guard goes up before the await point: a second "place order"
        // while this request is pending is rejected, not raced.
        self.in_flight = true;
        let gateway = cart.gateway().clone();
        let result = gateway.create_order(&draft, self.idempotency_key).await;
        self.in_flight = false;

        match result {
            Ok(order) => {
                cart.clear();
                session.complete()?;
                self.completed = Some(order.clone());
                info!(order_number = %order.order_number, total = %order.total, "order placed");
                Ok(order)
            }
            Err(err) if err.is_unavailable() => {
                warn!(error = %err, "order submission failed; retry is safe");
                Err(CheckoutError::GatewayUnavailable(err))
            }
            Err(err) => {
                if let Some(reference) = &payment_reference {
                    // Paid but not ordered: the one case that must reach a
                    // human instead of an automatic retry.
                    error!(
                        payment_reference = %reference,
                        error = %err,
                        "payment captured but order creation rejected; contact support for manual reconciliation"
                    );
                }
                Err(CheckoutError::OrderRejected(err.to_string()))
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::address::{AddressBook, AddressDraft};
    use crate::cart::LineInput;
    use crate::coupon::CouponBook;
    use crate::gateway::Gateway;
    use crate::pricing::ShippingPolicy;
    use marigold_core::{CurrencyCode, Money, OrderStatus, ProductId};

    fn line() -> LineInput {
        LineInput {
            product_id: ProductId::new(3),
            name: "Linen Shirt".to_string(),
            unit_price: Money::from_minor(8_999),
            size: Some("L".to_string()),
            color: None,
        }
    }

    fn draft() -> AddressDraft {
        AddressDraft {
            label: "Home".to_string(),
            full_name: "Asha Rao".to_string(),
            phone: "9876543210".to_string(),
            line1: "12 Gandhi Road".to_string(),
            line2: None,
            city: "Bengaluru".to_string(),
            state: "Karnataka".to_string(),
            pincode: "560001".to_string(),
            set_default: true,
        }
    }

    async fn checkout_ready() -> (CheckoutSession, CartStore, AddressBook) {
        let gateway = Gateway::offline();
        let mut cart = CartStore::new(
            gateway.clone(),
            CouponBook::new(),
            ShippingPolicy::default(),
            CurrencyCode::INR,
        );
        cart.add_item(line(), 1).await.unwrap();

        let mut addresses = AddressBook::new(gateway);
        let address_id = addresses.create(draft()).await;

        let mut session = CheckoutSession::new();
        session.select_address(address_id).unwrap();
        session
            .confirm_payment(PaymentMethod::CashOnDelivery, None)
            .unwrap();
        (session, cart, addresses)
    }

    #[tokio::test]
    async fn test_submit_creates_order_and_clears_state() {
        let (mut session, mut cart, _addresses) = checkout_ready().await;
        let mut submitter = OrderSubmitter::new();

        let order = submitter.submit(&mut session, &mut cart).await.unwrap();
        assert_eq!(order.status, OrderStatus::Created);
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.address.pincode, "560001");
        // 89.99 shirt is below the default 999.00 threshold, so the flat
        // 49.00 fee applies.
        assert_eq!(order.total, Money::from_minor(13_899));

        assert!(cart.is_empty());
        assert_eq!(session.stage(), CheckoutStage::Completed);
        assert!(session.payment_reference().is_none());
    }

    #[tokio::test]
    async fn test_double_submit_yields_one_order() {
        let (mut session, mut cart, _addresses) = checkout_ready().await;
        let mut submitter = OrderSubmitter::new();

        let first = submitter.submit(&mut session, &mut cart).await.unwrap();
        let second = submitter.submit(&mut session, &mut cart).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(first.order_number, second.order_number);
    }

    #[tokio::test]
    async fn test_submit_without_address() {
        let gateway = Gateway::offline();
        let mut cart = CartStore::new(
            gateway,
            CouponBook::new(),
            ShippingPolicy::default(),
            CurrencyCode::INR,
        );
        cart.add_item(line(), 1).await.unwrap();
        let mut session = CheckoutSession::new();
        let mut submitter = OrderSubmitter::new();

        let err = submitter.submit(&mut session, &mut cart).await.unwrap_err();
        assert!(matches!(err, CheckoutError::AddressMissing));
        assert!(!cart.is_empty());
    }

    #[tokio::test]
    async fn test_submit_before_payment_confirmation() {
        let (_, mut cart, mut addresses) = checkout_ready().await;
        let address_id = addresses.create(draft()).await;
        let mut session = CheckoutSession::new();
        session.select_address(address_id).unwrap();
        let mut submitter = OrderSubmitter::new();

        let err = submitter.submit(&mut session, &mut cart).await.unwrap_err();
        assert!(matches!(err, CheckoutError::PaymentNotConfirmed));
        assert_eq!(session.stage(), CheckoutStage::AwaitingPayment);
    }

    #[tokio::test]
    async fn test_submit_empty_cart_rejected() {
        let (mut session, mut cart, _addresses) = checkout_ready().await;
        cart.clear();
        let mut submitter = OrderSubmitter::new();

        let err = submitter.submit(&mut session, &mut cart).await.unwrap_err();
        assert!(matches!(err, CheckoutError::OrderRejected(_)));
        // Failure leaves the session where it was for a retry.
        assert_eq!(session.stage(), CheckoutStage::AwaitingConfirmation);
    }
}
