//! The cart store: authoritative cart state and derived totals.
//!
//! The store owns line items and the applied coupon, and recomputes
//! subtotal, discount, shipping, and total after every mutation. Mutations
//! are optimistic: the local change always lands, and the matching gateway
//! sync is attempted afterwards. A sync failure is logged and swallowed;
//! losing the customer's action because a backend is unreachable is the one
//! outcome this store must never produce.
//!
//! Reconciliation with the gateway adopts only fields the server owns
//! (server-assigned line ids). Quantities and cart membership are local
//! truth and are never overwritten by a remote response.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use marigold_core::{CurrencyCode, LineItemId, Money, ProductId};

use crate::coupon::{CouponBook, evaluate};
use crate::error::{CheckoutError, CouponRejection, Result};
use crate::gateway::{Gateway, RemoteCart};
use crate::pricing::{ShippingPolicy, Totals};

/// One cart entry: a product plus quantity and chosen variant.
///
/// Identity is the line item, not the product; the same product in a
/// different size or color is a distinct line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Locally-assigned line id, stable for the life of the cart.
    pub id: LineItemId,
    /// Server-assigned id for this line, once a sync has succeeded.
    pub remote_id: Option<String>,
    pub product_id: ProductId,
    pub name: String,
    /// Unit price in minor currency units, frozen when the line was added.
    pub unit_price: Money,
    pub quantity: u32,
    pub size: Option<String>,
    pub color: Option<String>,
}

impl CartItem {
    /// Line total (`unit_price * quantity`).
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.unit_price.times(self.quantity)
    }

    fn matches(&self, input: &LineInput) -> bool {
        self.product_id == input.product_id
            && self.size == input.size
            && self.color == input.color
    }
}

/// Input for adding a product to the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineInput {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Money,
    pub size: Option<String>,
    pub color: Option<String>,
}

/// The coupon currently applied to the cart.
///
/// Only the resolved code and the computed discount live here; the coupon
/// definition stays in the [`CouponBook`] so rule changes cannot leave a
/// stale discount behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedCoupon {
    pub code: String,
    pub discount: Money,
}

/// Immutable view of the cart taken at order submission time.
#[derive(Debug, Clone)]
pub struct CartSnapshot {
    pub items: Vec<CartItem>,
    pub coupon_code: Option<String>,
    pub totals: Totals,
}

/// Single source of truth for cart contents and derived totals.
///
/// One store is owned by one logical session (one browser tab, one
/// customer); there is no cross-session sharing.
pub struct CartStore {
    gateway: Gateway,
    coupons: CouponBook,
    policy: ShippingPolicy,
    currency: CurrencyCode,
    items: Vec<CartItem>,
    coupon: Option<AppliedCoupon>,
    totals: Totals,
    next_line: i64,
}

impl CartStore {
    /// Create an empty cart.
    #[must_use]
    pub fn new(
        gateway: Gateway,
        coupons: CouponBook,
        policy: ShippingPolicy,
        currency: CurrencyCode,
    ) -> Self {
        Self {
            gateway,
            coupons,
            policy,
            currency,
            items: Vec::new(),
            coupon: None,
            totals: Totals::default(),
            next_line: 1,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Current line items, in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Current derived totals.
    #[must_use]
    pub const fn totals(&self) -> &Totals {
        &self.totals
    }

    /// Code of the applied coupon, if any.
    #[must_use]
    pub fn coupon_code(&self) -> Option<&str> {
        self.coupon.as_ref().map(|c| c.code.as_str())
    }

    /// Whether the cart has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Currency all amounts are denominated in.
    #[must_use]
    pub const fn currency(&self) -> CurrencyCode {
        self.currency
    }

    /// The gateway this cart syncs against.
    #[must_use]
    pub const fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    /// Snapshot of items, coupon, and totals for order submission.
    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            items: self.items.clone(),
            coupon_code: self.coupon_code().map(str::to_owned),
            totals: self.totals,
        }
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add a product to the cart.
    ///
    /// An existing line with the same product, size, and color is
    /// incremented instead of duplicated.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::InvalidQuantity`] if `quantity` is zero.
    pub async fn add_item(&mut self, input: LineInput, quantity: u32) -> Result<LineItemId> {
        if quantity == 0 {
            return Err(CheckoutError::InvalidQuantity(quantity));
        }

        let id = match self.items.iter_mut().find(|item| item.matches(&input)) {
            Some(existing) => {
                existing.quantity = existing.quantity.saturating_add(quantity);
                existing.id
            }
            None => {
                let id = LineItemId::new(self.next_line);
                self.next_line += 1;
                self.items.push(CartItem {
                    id,
                    remote_id: None,
                    product_id: input.product_id,
                    name: input.name,
                    unit_price: input.unit_price,
                    quantity,
                    size: input.size,
                    color: input.color,
                });
                id
            }
        };

        self.recompute();
        self.sync_line(id).await;
        Ok(id)
    }

    /// Set the quantity of a line; zero removes it.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::ItemNotFound`] if the line does not exist.
    pub async fn update_quantity(&mut self, id: LineItemId, quantity: u32) -> Result<()> {
        if !self.items.iter().any(|item| item.id == id) {
            return Err(CheckoutError::ItemNotFound(id));
        }
        if quantity == 0 {
            self.remove_item(id).await;
            return Ok(());
        }

        if let Some(item) = self.items.iter_mut().find(|item| item.id == id) {
            item.quantity = quantity;
        }
        self.recompute();
        self.sync_line(id).await;
        Ok(())
    }

    /// Remove a line from the cart.
    ///
    /// Idempotent: removing an id that is not present is a no-op, so
    /// double-clicks and retried requests are safe.
    pub async fn remove_item(&mut self, id: LineItemId) {
        let Some(position) = self.items.iter().position(|item| item.id == id) else {
            return;
        };
        let removed = self.items.remove(position);
        self.recompute();

        if let Some(remote_id) = removed.remote_id {
            if let Err(e) = self.gateway.delete_line(&remote_id).await {
                warn!(line = %id, error = %e, "cart sync failed, keeping local removal");
            }
        }
    }

    /// Empty the cart and drop the coupon.
    ///
    /// Local-only: the gateway clears its side of the cart when it creates
    /// the order, which is the only caller of this operation.
    pub fn clear(&mut self) {
        self.items.clear();
        self.coupon = None;
        self.recompute();
    }

    /// Apply a coupon code to the cart.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::CouponInvalid`] and leaves the cart
    /// unchanged if the code is unknown, expired, below its minimum, or a
    /// coupon is already applied.
    pub async fn apply_coupon(&mut self, code: &str) -> Result<Money> {
        self.apply_coupon_at(code, Utc::now()).await
    }

    /// [`Self::apply_coupon`] with an explicit clock, for deterministic tests.
    pub async fn apply_coupon_at(&mut self, code: &str, now: DateTime<Utc>) -> Result<Money> {
        if self.coupon.is_some() {
            return Err(CouponRejection::AlreadyApplied.into());
        }
        let coupon = self
            .coupons
            .resolve(code)
            .ok_or(CouponRejection::NotFound)?
            .clone();
        let discount = evaluate(&coupon, self.totals.subtotal, now)?;

        self.coupon = Some(AppliedCoupon {
            code: coupon.code.trim().to_ascii_uppercase(),
            discount,
        });
        self.recompute_at(now);

        if let Err(e) = self.gateway.apply_coupon(&coupon.code).await {
            warn!(code = %coupon.code, error = %e, "coupon sync failed, keeping local discount");
        }
        Ok(self.totals.discount)
    }

    /// Remove the applied coupon, if any. Always succeeds.
    pub async fn remove_coupon(&mut self) {
        if self.coupon.take().is_none() {
            return;
        }
        self.recompute();

        if let Err(e) = self.gateway.remove_coupon().await {
            warn!(error = %e, "coupon sync failed, keeping local removal");
        }
    }

    /// Reconcile with the gateway's view of the cart.
    ///
    /// On gateway failure the local state stays exactly as it is: an
    /// unreachable backend is not the same thing as an intentionally empty
    /// cart.
    pub async fn refresh(&mut self) {
        match self.gateway.fetch_cart().await {
            Ok(remote) => self.reconcile(&remote),
            Err(e) => {
                warn!(error = %e, "cart refresh failed, keeping local state");
            }
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Adopt server-owned fields from a remote cart view.
    ///
    /// Only server-assigned line ids are taken. Quantities the customer has
    /// changed since the last sync, and lines the server does not know
    /// about, are left alone.
    fn reconcile(&mut self, remote: &RemoteCart) {
        for line in &remote.lines {
            let already_mapped = self
                .items
                .iter()
                .any(|item| item.remote_id.as_deref() == Some(line.id.as_str()));
            if already_mapped {
                continue;
            }
            if let Some(item) = self.items.iter_mut().find(|item| {
                item.remote_id.is_none()
                    && item.product_id == line.product_id
                    && item.size == line.size
                    && item.color == line.color
            }) {
                item.remote_id = Some(line.id.clone());
            }
        }
    }

    /// Push one line to the gateway, adopting the server-assigned id.
    ///
    /// Failures are logged and swallowed: the local mutation stands.
    async fn sync_line(&mut self, id: LineItemId) {
        let Some(item) = self.items.iter().find(|item| item.id == id).cloned() else {
            return;
        };
        match self.gateway.upsert_line(&item).await {
            Ok(remote_id) => {
                if let Some(item) = self.items.iter_mut().find(|item| item.id == id) {
                    item.remote_id = Some(remote_id);
                }
            }
            Err(e) => {
                warn!(line = %id, error = %e, "cart sync failed, keeping local change");
            }
        }
    }

    fn recompute(&mut self) {
        self.recompute_at(Utc::now());
    }

    /// Recompute totals from scratch.
    ///
    /// An applied coupon is re-resolved and re-evaluated against the new
    /// subtotal; one that no longer qualifies is dropped so the cart never
    /// carries a discount without a valid coupon behind it.
    fn recompute_at(&mut self, now: DateTime<Utc>) {
        let subtotal = self
            .items
            .iter()
            .fold(Money::ZERO, |acc, item| acc.saturating_add(item.line_total()));

        let mut drop_coupon = false;
        let discount = match &self.coupon {
            Some(applied) => match self.coupons.resolve(&applied.code) {
                Some(definition) => match evaluate(definition, subtotal, now) {
                    Ok(discount) => discount,
                    Err(reason) => {
                        warn!(code = %applied.code, %reason, "applied coupon no longer valid, removing");
                        drop_coupon = true;
                        Money::ZERO
                    }
                },
                None => {
                    warn!(code = %applied.code, "applied coupon no longer exists, removing");
                    drop_coupon = true;
                    Money::ZERO
                }
            },
            None => Money::ZERO,
        };
        if drop_coupon {
            self.coupon = None;
        }

        self.totals = Totals::compute(subtotal, discount, &self.policy);
        if let Some(applied) = &mut self.coupon {
            applied.discount = self.totals.discount;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::coupon::{Coupon, CouponValue};
    use chrono::TimeZone;

    fn book() -> CouponBook {
        [
            Coupon {
                code: "FLAT500".to_string(),
                value: CouponValue::Fixed(Money::from_minor(500)),
                min_subtotal: None,
                expires_at: None,
            },
            Coupon {
                code: "WELCOME10".to_string(),
                value: CouponValue::Percentage(10),
                min_subtotal: None,
                expires_at: None,
            },
            Coupon {
                code: "EXPIRED10".to_string(),
                value: CouponValue::Percentage(10),
                min_subtotal: None,
                expires_at: Some(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()),
            },
            Coupon {
                code: "BIGFLAT".to_string(),
                value: CouponValue::Fixed(Money::from_minor(1_000_000)),
                min_subtotal: None,
                expires_at: None,
            },
        ]
        .into_iter()
        .collect()
    }

    fn store() -> CartStore {
        let policy = ShippingPolicy {
            free_over: Money::from_minor(4_999),
            flat_fee: Money::from_minor(4_900),
        };
        CartStore::new(Gateway::offline(), book(), policy, CurrencyCode::INR)
    }

    fn tee(size: &str) -> LineInput {
        LineInput {
            product_id: ProductId::new(11),
            name: "Classic Tee".to_string(),
            unit_price: Money::from_minor(5_999),
            size: Some(size.to_string()),
            color: Some("Black".to_string()),
        }
    }

    #[tokio::test]
    async fn test_add_merges_matching_variant() {
        let mut cart = store();
        let first = cart.add_item(tee("M"), 1).await.unwrap();
        let second = cart.add_item(tee("M"), 2).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.item_count(), 3);
    }

    #[tokio::test]
    async fn test_add_distinct_variant_is_new_line() {
        let mut cart = store();
        cart.add_item(tee("M"), 1).await.unwrap();
        cart.add_item(tee("L"), 1).await.unwrap();
        assert_eq!(cart.items().len(), 2);
    }

    #[tokio::test]
    async fn test_add_zero_quantity_rejected() {
        let mut cart = store();
        let err = cart.add_item(tee("M"), 0).await.unwrap_err();
        assert!(matches!(err, CheckoutError::InvalidQuantity(0)));
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_subtotal_tracks_mutations() {
        let mut cart = store();
        let id = cart.add_item(tee("M"), 2).await.unwrap();
        assert_eq!(cart.totals().subtotal, Money::from_minor(11_998));

        cart.update_quantity(id, 1).await.unwrap();
        assert_eq!(cart.totals().subtotal, Money::from_minor(5_999));

        cart.remove_item(id).await;
        assert_eq!(cart.totals().subtotal, Money::ZERO);
        assert_eq!(cart.totals().total, Money::ZERO);
    }

    #[tokio::test]
    async fn test_update_unknown_line() {
        let mut cart = store();
        let err = cart
            .update_quantity(LineItemId::new(42), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::ItemNotFound(_)));
    }

    #[tokio::test]
    async fn test_update_to_zero_removes() {
        let mut cart = store();
        let id = cart.add_item(tee("M"), 2).await.unwrap();
        cart.update_quantity(id, 0).await.unwrap();
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_remove_twice_is_noop() {
        let mut cart = store();
        let id = cart.add_item(tee("M"), 1).await.unwrap();
        cart.remove_item(id).await;
        let totals = *cart.totals();
        cart.remove_item(id).await;
        assert_eq!(*cart.totals(), totals);
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_fixed_coupon_scenario() {
        let mut cart = store();
        cart.add_item(tee("M"), 1).await.unwrap();
        cart.apply_coupon("FLAT500").await.unwrap();

        let totals = cart.totals();
        assert_eq!(totals.subtotal, Money::from_minor(5_999));
        assert_eq!(totals.discount, Money::from_minor(500));
        assert_eq!(totals.shipping, Money::ZERO);
        assert_eq!(totals.total, Money::from_minor(5_499));
    }

    #[tokio::test]
    async fn test_coupon_round_trip_restores_totals() {
        let mut cart = store();
        cart.add_item(tee("M"), 2).await.unwrap();
        let before = *cart.totals();

        cart.apply_coupon("WELCOME10").await.unwrap();
        assert!(cart.totals().discount > Money::ZERO);

        cart.remove_coupon().await;
        assert_eq!(*cart.totals(), before);
        assert_eq!(cart.coupon_code(), None);
    }

    #[tokio::test]
    async fn test_discount_clamped_to_subtotal() {
        let mut cart = store();
        cart.add_item(tee("M"), 1).await.unwrap();
        cart.apply_coupon("BIGFLAT").await.unwrap();
        assert_eq!(cart.totals().discount, cart.totals().subtotal);
        assert_eq!(cart.totals().total, Money::ZERO);
    }

    #[tokio::test]
    async fn test_second_coupon_rejected() {
        let mut cart = store();
        cart.add_item(tee("M"), 1).await.unwrap();
        cart.apply_coupon("FLAT500").await.unwrap();
        let err = cart.apply_coupon("WELCOME10").await.unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::CouponInvalid(CouponRejection::AlreadyApplied)
        ));
        assert_eq!(cart.coupon_code(), Some("FLAT500"));
    }

    #[tokio::test]
    async fn test_expired_coupon_leaves_cart_unchanged() {
        let mut cart = store();
        cart.add_item(tee("M"), 1).await.unwrap();
        let before = *cart.totals();

        let err = cart.apply_coupon("EXPIRED10").await.unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::CouponInvalid(CouponRejection::Expired)
        ));
        assert_eq!(*cart.totals(), before);
        assert_eq!(cart.coupon_code(), None);
    }

    #[tokio::test]
    async fn test_unknown_coupon_rejected() {
        let mut cart = store();
        cart.add_item(tee("M"), 1).await.unwrap();
        let err = cart.apply_coupon("NOPE").await.unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::CouponInvalid(CouponRejection::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_sync_adopts_server_line_ids() {
        // The offline gateway assigns line ids just like the real one.
        let mut cart = store();
        cart.add_item(tee("M"), 1).await.unwrap();
        assert!(cart.items().first().unwrap().remote_id.is_some());
    }

    #[tokio::test]
    async fn test_clear_empties_items_and_coupon() {
        let mut cart = store();
        cart.add_item(tee("M"), 1).await.unwrap();
        cart.apply_coupon("FLAT500").await.unwrap();
        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.coupon_code(), None);
        assert_eq!(*cart.totals(), Totals::default());
    }
}
