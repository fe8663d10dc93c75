//! Payment gateway orders and the widget confirmation channel.
//!
//! Online payments go through a third-party widget: the engine creates a
//! gateway payment order, hands its reference to the widget, and waits for
//! the widget's completion callback. That callback is modeled as a
//! single-shot channel so the submitter can await confirmation with a
//! timeout instead of wiring up free-standing global callbacks.

use std::time::Duration;

use tokio::sync::oneshot;

use marigold_core::{CurrencyCode, Money};

use crate::error::{CheckoutError, Result};

/// A payment order created on the gateway, consumed by the payment widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentOrder {
    /// Gateway-assigned reference for this payment attempt.
    pub reference: String,
    /// Amount to collect, in minor units.
    pub amount: Money,
    /// Currency the amount is denominated in.
    pub currency: CurrencyCode,
}

/// Create a confirmation channel for one payment attempt.
///
/// The [`ConfirmationHandle`] goes to the widget's completion callback; the
/// [`PendingConfirmation`] is awaited by the checkout flow. The handle is
/// consumed on use, so a double-firing widget cannot confirm twice.
#[must_use]
pub fn confirmation_channel() -> (ConfirmationHandle, PendingConfirmation) {
    let (tx, rx) = oneshot::channel();
    (ConfirmationHandle { tx }, PendingConfirmation { rx })
}

/// Resolves the payment attempt exactly once.
#[derive(Debug)]
pub struct ConfirmationHandle {
    tx: oneshot::Sender<String>,
}

impl ConfirmationHandle {
    /// Deliver the payment reference from the widget callback.
    ///
    /// Returns `false` if the waiting side has already given up (timed out
    /// or navigated away).
    pub fn confirm(self, payment_reference: impl Into<String>) -> bool {
        self.tx.send(payment_reference.into()).is_ok()
    }
}

/// The engine's side of the confirmation channel.
#[derive(Debug)]
pub struct PendingConfirmation {
    rx: oneshot::Receiver<String>,
}

impl PendingConfirmation {
    /// Wait for the widget to confirm, up to `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::PaymentNotConfirmed`] if the timeout elapses
    /// or the widget is dismissed (handle dropped) without confirming.
    pub async fn wait(self, timeout: Duration) -> Result<String> {
        match tokio::time::timeout(timeout, self.rx).await {
            Ok(Ok(payment_reference)) => Ok(payment_reference),
            // Channel closed: the widget was dismissed without paying.
            Ok(Err(_)) => Err(CheckoutError::PaymentNotConfirmed),
            // Timed out waiting for the callback.
            Err(_) => Err(CheckoutError::PaymentNotConfirmed),
        }
    }
}
