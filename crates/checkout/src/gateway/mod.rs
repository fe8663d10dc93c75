//! The remote commerce gateway boundary.
//!
//! # Architecture
//!
//! - [`HttpGateway`] talks to the real gateway over HTTP/JSON (`reqwest`)
//! - [`LocalGateway`] is a fully functional in-memory simulation used when
//!   no gateway is configured, so the engine stays usable without a backend
//! - [`Gateway`] wraps either behind one API; the mode is fixed at
//!   construction and every offline activation is logged, so demo behavior
//!   is always distinguishable from production. Local and remote state are
//!   never merged across a mode switch.

pub mod http;
pub mod local;
mod wire;

pub use http::HttpGateway;
pub use local::LocalGateway;

use thiserror::Error;
use uuid::Uuid;

use marigold_core::{CurrencyCode, Money, ProductId};

use crate::address::{Address, AddressDraft};
use crate::cart::CartItem;
use crate::config::GatewayConfig;
use crate::order::{Order, OrderDraft};
use crate::payment::PaymentOrder;

/// Errors that can occur when talking to the commerce gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// HTTP transport failed (connect, timeout, or body decode).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The gateway answered with a non-2xx status.
    #[error("gateway returned {status}: {message}")]
    Status { status: u16, message: String },

    /// The client could not be constructed from the configuration.
    #[error("invalid gateway configuration: {0}")]
    Configuration(String),
}

impl GatewayError {
    /// Whether the failure is transient and the request can be retried.
    ///
    /// Transport failures and 5xx/429 answers are retryable; a 4xx is the
    /// gateway rejecting the request itself.
    #[must_use]
    pub const fn is_unavailable(&self) -> bool {
        match self {
            Self::Http(_) => true,
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            Self::Configuration(_) => false,
        }
    }
}

/// Which backing the engine is talking to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayMode {
    Online,
    Offline,
}

/// The gateway's view of the cart.
///
/// Only consumed during reconciliation; the cart store adopts the
/// server-assigned line ids from here and nothing else.
#[derive(Debug, Clone, Default)]
pub struct RemoteCart {
    pub lines: Vec<RemoteLine>,
    pub coupon_code: Option<String>,
}

/// One line of the gateway's cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteLine {
    /// Server-assigned line id.
    pub id: String,
    pub product_id: ProductId,
    pub quantity: u32,
    pub size: Option<String>,
    pub color: Option<String>,
}

/// Commerce gateway handle: online HTTP client or offline simulation.
///
/// Cheaply cloneable; clones share the same backend state.
#[derive(Clone)]
pub struct Gateway {
    backend: Backend,
}

#[derive(Clone)]
enum Backend {
    Online(HttpGateway),
    Offline(LocalGateway),
}

impl Gateway {
    /// Connect according to configuration.
    ///
    /// No configured base URL selects the offline simulation.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn connect(config: &GatewayConfig) -> Result<Self, GatewayError> {
        match &config.base_url {
            Some(base) => {
                let http = HttpGateway::new(base.clone(), config)?;
                tracing::info!(gateway = %base, "commerce gateway connected");
                Ok(Self {
                    backend: Backend::Online(http),
                })
            }
            None => Ok(Self::offline()),
        }
    }

    /// An offline simulation gateway.
    #[must_use]
    pub fn offline() -> Self {
        Self {
            backend: Backend::Offline(LocalGateway::new()),
        }
    }

    /// Which mode this gateway runs in.
    #[must_use]
    pub const fn mode(&self) -> GatewayMode {
        match &self.backend {
            Backend::Online(_) => GatewayMode::Online,
            Backend::Offline(_) => GatewayMode::Offline,
        }
    }

    /// Fetch the gateway's view of the cart.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] if the gateway cannot be reached.
    pub async fn fetch_cart(&self) -> Result<RemoteCart, GatewayError> {
        match &self.backend {
            Backend::Online(http) => http.fetch_cart().await,
            Backend::Offline(local) => Ok(local.fetch_cart()),
        }
    }

    /// Push one cart line, returning the server-assigned line id.
    ///
    /// Creates the line if it has no remote id yet, updates it otherwise.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] if the gateway cannot be reached or
    /// rejects the line.
    pub async fn upsert_line(&self, item: &CartItem) -> Result<String, GatewayError> {
        match &self.backend {
            Backend::Online(http) => match &item.remote_id {
                Some(remote_id) => {
                    http.update_line(remote_id, item).await?;
                    Ok(remote_id.clone())
                }
                None => http.create_line(item).await,
            },
            Backend::Offline(local) => Ok(local.upsert_line(item)),
        }
    }

    /// Delete a cart line by its server-assigned id.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] if the gateway cannot be reached.
    pub async fn delete_line(&self, remote_id: &str) -> Result<(), GatewayError> {
        match &self.backend {
            Backend::Online(http) => http.delete_line(remote_id).await,
            Backend::Offline(local) => {
                local.delete_line(remote_id);
                Ok(())
            }
        }
    }

    /// Record a coupon on the gateway's cart.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] if the gateway cannot be reached.
    pub async fn apply_coupon(&self, code: &str) -> Result<(), GatewayError> {
        match &self.backend {
            Backend::Online(http) => http.apply_coupon(code).await,
            Backend::Offline(local) => {
                local.apply_coupon(code);
                Ok(())
            }
        }
    }

    /// Remove the coupon from the gateway's cart.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] if the gateway cannot be reached.
    pub async fn remove_coupon(&self) -> Result<(), GatewayError> {
        match &self.backend {
            Backend::Online(http) => http.remove_coupon().await,
            Backend::Offline(local) => {
                local.remove_coupon();
                Ok(())
            }
        }
    }

    /// List the customer's delivery addresses.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] if the gateway cannot be reached.
    pub async fn list_addresses(&self) -> Result<Vec<Address>, GatewayError> {
        match &self.backend {
            Backend::Online(http) => http.list_addresses().await,
            Backend::Offline(local) => Ok(local.list_addresses()),
        }
    }

    /// Create a delivery address.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] if the gateway cannot be reached or
    /// rejects the address.
    pub async fn create_address(&self, draft: &AddressDraft) -> Result<Address, GatewayError> {
        match &self.backend {
            Backend::Online(http) => http.create_address(draft).await,
            Backend::Offline(local) => Ok(local.create_address(draft)),
        }
    }

    /// Create a payment order for the given amount.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] if the gateway cannot be reached.
    pub async fn create_payment_order(
        &self,
        amount: Money,
        currency: CurrencyCode,
    ) -> Result<PaymentOrder, GatewayError> {
        match &self.backend {
            Backend::Online(http) => http.create_payment_order(amount, currency).await,
            Backend::Offline(local) => Ok(local.create_payment_order(amount, currency)),
        }
    }

    /// Create an order from a draft.
    ///
    /// The idempotency key identifies the checkout attempt; retries with
    /// the same key must not create a second order.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] if the gateway cannot be reached or
    /// rejects the order.
    pub async fn create_order(
        &self,
        draft: &OrderDraft,
        idempotency_key: Uuid,
    ) -> Result<Order, GatewayError> {
        match &self.backend {
            Backend::Online(http) => http.create_order(draft, idempotency_key).await,
            Backend::Offline(local) => local.create_order(draft, idempotency_key),
        }
    }
}
