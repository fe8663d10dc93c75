//! Unified error handling for the checkout engine.
//!
//! Validation errors (`InvalidQuantity`, `ItemNotFound`, `CouponInvalid`) are
//! resolved locally and reported inline; they never abort a checkout. Gateway
//! errors on non-critical sync paths are logged and swallowed by the cart
//! store. Errors on the order-submission path always surface to the caller.

use thiserror::Error;

use marigold_core::LineItemId;

use crate::gateway::GatewayError;

/// Engine-level error type for cart and checkout operations.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Quantity must be a positive integer.
    #[error("invalid quantity: {0}")]
    InvalidQuantity(u32),

    /// No cart line with the given id.
    #[error("no cart line with id {0}")]
    ItemNotFound(LineItemId),

    /// Coupon was rejected; the cart is unchanged.
    #[error("coupon rejected: {0}")]
    CouponInvalid(#[from] CouponRejection),

    /// Checkout reached a stage that requires a delivery address.
    #[error("no delivery address selected")]
    AddressMissing,

    /// The commerce gateway could not be reached; the operation may be retried.
    #[error("commerce gateway unavailable: {0}")]
    GatewayUnavailable(#[from] GatewayError),

    /// Payment was not confirmed; return to the payment stage.
    #[error("payment has not been confirmed")]
    PaymentNotConfirmed,

    /// The gateway rejected the order. Terminal: the cart is preserved, but
    /// the same submission must not be retried automatically.
    #[error("order rejected: {0}")]
    OrderRejected(String),

    /// A submission for this session is already in flight.
    #[error("an order submission is already in flight")]
    SubmissionInFlight,

    /// The checkout session has been completed or abandoned.
    #[error("checkout session is closed")]
    SessionClosed,
}

/// Why a coupon code was not applied to the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CouponRejection {
    /// The code does not resolve to a known coupon.
    #[error("coupon code not recognized")]
    NotFound,

    /// The coupon's expiry date is in the past.
    #[error("coupon has expired")]
    Expired,

    /// The cart subtotal is below the coupon's minimum.
    #[error("cart subtotal is below the coupon minimum")]
    BelowMinimum,

    /// A coupon is already applied to the cart.
    #[error("a coupon is already applied")]
    AlreadyApplied,
}

/// Result type alias for [`CheckoutError`].
pub type Result<T> = std::result::Result<T, CheckoutError>;
