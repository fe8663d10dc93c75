//! The checkout session: address → payment → confirmation.
//!
//! A session tracks one checkout attempt and nothing else. It lives outside
//! the cart store (different lifetime: abandoning checkout must never touch
//! the cart) and persists its minimal cross-stage state - the selected
//! address id and the payment reference - in a tab-scoped scratchpad that
//! is wiped on successful submission and never read across sessions.

use std::collections::HashMap;

use uuid::Uuid;

use marigold_core::{AddressId, PaymentMethod};

use crate::error::{CheckoutError, Result};

/// Scratchpad keys for in-progress checkout state.
pub mod scratch_keys {
    /// Key for the selected delivery address id.
    pub const ADDRESS_ID: &str = "address_id";

    /// Key for the gateway payment reference.
    pub const PAYMENT_REFERENCE: &str = "payment_reference";
}

/// Tab-scoped key/value store for one checkout attempt.
///
/// Holds only strings, is never persisted, and is cleared as soon as the
/// order is placed.
#[derive(Debug, Clone, Default)]
pub struct Scratchpad {
    values: HashMap<String, String>,
}

impl Scratchpad {
    /// Store a value under a key.
    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        self.values.insert(key.to_string(), value.into());
    }

    /// Read a value by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Remove a value by key.
    pub fn remove(&mut self, key: &str) {
        self.values.remove(key);
    }

    /// Drop everything.
    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Whether nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Where a checkout attempt currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutStage {
    AwaitingAddress,
    AwaitingPayment,
    AwaitingConfirmation,
    /// Order placed; terminal.
    Completed,
    /// Customer navigated away; terminal.
    Abandoned,
}

/// One checkout attempt.
///
/// Stage transitions are guarded: the payment stage requires a selected
/// address, confirmation requires a payment reference or cash-on-delivery,
/// and `Completed` is reached exclusively through order submission.
#[derive(Debug, Clone)]
pub struct CheckoutSession {
    id: Uuid,
    stage: CheckoutStage,
    payment_method: Option<PaymentMethod>,
    scratch: Scratchpad,
}

impl Default for CheckoutSession {
    fn default() -> Self {
        Self::new()
    }
}

impl CheckoutSession {
    /// Start a fresh checkout attempt.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            stage: CheckoutStage::AwaitingAddress,
            payment_method: None,
            scratch: Scratchpad::default(),
        }
    }

    /// Unique id of this attempt.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Current stage.
    #[must_use]
    pub const fn stage(&self) -> CheckoutStage {
        self.stage
    }

    /// The selected delivery address, if any.
    #[must_use]
    pub fn address_id(&self) -> Option<AddressId> {
        self.scratch
            .get(scratch_keys::ADDRESS_ID)?
            .parse::<i64>()
            .ok()
            .map(AddressId::new)
    }

    /// The chosen payment method, if any.
    #[must_use]
    pub const fn payment_method(&self) -> Option<PaymentMethod> {
        self.payment_method
    }

    /// The confirmed payment reference, if any.
    #[must_use]
    pub fn payment_reference(&self) -> Option<&str> {
        self.scratch.get(scratch_keys::PAYMENT_REFERENCE)
    }

    /// Select the delivery address and advance to the payment stage.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::SessionClosed`] once the session is
    /// completed or abandoned.
    pub fn select_address(&mut self, id: AddressId) -> Result<()> {
        self.ensure_open()?;
        self.scratch
            .insert(scratch_keys::ADDRESS_ID, id.to_string());
        self.stage = CheckoutStage::AwaitingPayment;
        Ok(())
    }

    /// Guard for entering the payment stage (e.g. via a deep link).
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::AddressMissing`] - and puts the session
    /// back in `AwaitingAddress` - if no address has been selected, so the
    /// UI redirects instead of silently proceeding.
    pub fn enter_payment(&mut self) -> Result<()> {
        self.ensure_open()?;
        if self.address_id().is_none() {
            self.stage = CheckoutStage::AwaitingAddress;
            return Err(CheckoutError::AddressMissing);
        }
        self.stage = CheckoutStage::AwaitingPayment;
        Ok(())
    }

    /// Record the payment outcome and advance to confirmation.
    ///
    /// Online payments need the reference produced by the payment widget;
    /// cash-on-delivery advances without one.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::AddressMissing`] if the session never
    /// passed the address stage, or [`CheckoutError::PaymentNotConfirmed`]
    /// for an online payment without a reference.
    pub fn confirm_payment(
        &mut self,
        method: PaymentMethod,
        payment_reference: Option<String>,
    ) -> Result<()> {
        self.ensure_open()?;
        if self.address_id().is_none() {
            self.stage = CheckoutStage::AwaitingAddress;
            return Err(CheckoutError::AddressMissing);
        }
        match method {
            PaymentMethod::Online => {
                let reference = payment_reference.ok_or(CheckoutError::PaymentNotConfirmed)?;
                self.scratch
                    .insert(scratch_keys::PAYMENT_REFERENCE, reference);
            }
            PaymentMethod::CashOnDelivery => {
                self.scratch.remove(scratch_keys::PAYMENT_REFERENCE);
            }
        }
        self.payment_method = Some(method);
        self.stage = CheckoutStage::AwaitingConfirmation;
        Ok(())
    }

    /// Abandon the attempt. Terminal, and deliberately cheap: the cart is
    /// untouched and no gateway call is made.
    pub fn abandon(&mut self) {
        if self.stage != CheckoutStage::Completed {
            self.stage = CheckoutStage::Abandoned;
            self.scratch.clear();
        }
    }

    /// Mark the attempt completed. Driven exclusively by order submission.
    pub(crate) fn complete(&mut self) -> Result<()> {
        if self.stage != CheckoutStage::AwaitingConfirmation {
            return Err(CheckoutError::SessionClosed);
        }
        self.scratch.clear();
        self.payment_method = None;
        self.stage = CheckoutStage::Completed;
        Ok(())
    }

    fn ensure_open(&self) -> Result<()> {
        match self.stage {
            CheckoutStage::Completed | CheckoutStage::Abandoned => {
                Err(CheckoutError::SessionClosed)
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deep_link_into_payment_redirects_back() {
        let mut session = CheckoutSession::new();
        let err = session.enter_payment().unwrap_err();
        assert!(matches!(err, CheckoutError::AddressMissing));
        assert_eq!(session.stage(), CheckoutStage::AwaitingAddress);
    }

    #[test]
    fn test_address_then_payment_then_confirmation() {
        let mut session = CheckoutSession::new();
        session.select_address(AddressId::new(7)).unwrap();
        assert_eq!(session.stage(), CheckoutStage::AwaitingPayment);
        assert_eq!(session.address_id(), Some(AddressId::new(7)));

        session
            .confirm_payment(PaymentMethod::Online, Some("pay_ok1".to_string()))
            .unwrap();
        assert_eq!(session.stage(), CheckoutStage::AwaitingConfirmation);
        assert_eq!(session.payment_reference(), Some("pay_ok1"));
    }

    #[test]
    fn test_cash_on_delivery_needs_no_reference() {
        let mut session = CheckoutSession::new();
        session.select_address(AddressId::new(7)).unwrap();
        session
            .confirm_payment(PaymentMethod::CashOnDelivery, None)
            .unwrap();
        assert_eq!(session.stage(), CheckoutStage::AwaitingConfirmation);
        assert_eq!(session.payment_reference(), None);
    }

    #[test]
    fn test_online_without_reference_rejected() {
        let mut session = CheckoutSession::new();
        session.select_address(AddressId::new(7)).unwrap();
        let err = session
            .confirm_payment(PaymentMethod::Online, None)
            .unwrap_err();
        assert!(matches!(err, CheckoutError::PaymentNotConfirmed));
        assert_eq!(session.stage(), CheckoutStage::AwaitingPayment);
    }

    #[test]
    fn test_abandoned_session_rejects_everything() {
        let mut session = CheckoutSession::new();
        session.select_address(AddressId::new(7)).unwrap();
        session.abandon();
        assert_eq!(session.stage(), CheckoutStage::Abandoned);
        assert!(session.scratch.is_empty());

        let err = session.select_address(AddressId::new(8)).unwrap_err();
        assert!(matches!(err, CheckoutError::SessionClosed));
    }

    #[test]
    fn test_complete_requires_confirmation_stage() {
        let mut session = CheckoutSession::new();
        assert!(session.complete().is_err());

        session.select_address(AddressId::new(7)).unwrap();
        session
            .confirm_payment(PaymentMethod::CashOnDelivery, None)
            .unwrap();
        session.complete().unwrap();
        assert_eq!(session.stage(), CheckoutStage::Completed);
        assert!(session.scratch.is_empty());
    }
}
