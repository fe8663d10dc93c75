//! Marigold Checkout - cart and checkout engine.
//!
//! Owns cart contents, coupon application, monetary totals, the
//! address → payment → confirmation sequence, and at-most-once order
//! submission for the Marigold storefront.
//!
//! # Architecture
//!
//! - [`cart::CartStore`] is the single source of truth for items, the
//!   applied coupon, and derived totals; all amounts are integers in minor
//!   currency units
//! - [`coupon::evaluate`] is a pure, deterministic discount evaluator
//! - [`session::CheckoutSession`] sequences one checkout attempt, outside
//!   the cart's lifetime
//! - [`submit::OrderSubmitter`] turns one session plus a cart snapshot into
//!   exactly one order
//! - [`gateway::Gateway`] talks to the commerce backend over HTTP, or runs
//!   a fully local simulation when none is configured
//!
//! # Example
//!
//! ```rust,ignore
//! use marigold_checkout::{
//!     AddressBook, CartStore, CheckoutSession, CouponBook, EngineConfig, Gateway, LineInput,
//!     OrderSubmitter,
//! };
//! use marigold_core::PaymentMethod;
//!
//! let config = EngineConfig::from_env()?;
//! let gateway = Gateway::connect(&config.gateway)?;
//! let mut cart = CartStore::new(
//!     gateway.clone(),
//!     CouponBook::new(),
//!     config.shipping,
//!     config.currency,
//! );
//!
//! cart.add_item(line_input, 1).await?;
//! cart.apply_coupon("WELCOME10").await?;
//!
//! let mut session = CheckoutSession::new();
//! session.select_address(address_id)?;
//! session.confirm_payment(PaymentMethod::CashOnDelivery, None)?;
//!
//! let order = OrderSubmitter::new().submit(&mut session, &mut cart).await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod address;
pub mod cart;
pub mod config;
pub mod coupon;
pub mod error;
pub mod gateway;
pub mod order;
pub mod payment;
pub mod pricing;
pub mod session;
pub mod submit;

pub use address::{Address, AddressBook, AddressDraft};
pub use cart::{AppliedCoupon, CartItem, CartSnapshot, CartStore, LineInput};
pub use config::{ConfigError, EngineConfig, GatewayConfig};
pub use coupon::{Coupon, CouponBook, CouponValue, evaluate};
pub use error::{CheckoutError, CouponRejection, Result};
pub use gateway::{Gateway, GatewayError, GatewayMode};
pub use order::{Order, OrderDraft};
pub use payment::{
    ConfirmationHandle, PaymentOrder, PendingConfirmation, confirmation_channel,
};
pub use pricing::{ShippingPolicy, Totals};
pub use session::{CheckoutSession, CheckoutStage, Scratchpad};
pub use submit::OrderSubmitter;
