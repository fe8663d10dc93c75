//! HTTP client for the commerce gateway.
//!
//! A thin `reqwest` JSON client. Non-2xx responses become typed
//! [`GatewayError::Status`] values with a truncated body for diagnostics;
//! partial success is never assumed.

use std::sync::Arc;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use tracing::instrument;
use url::Url;
use uuid::Uuid;

use marigold_core::{CurrencyCode, Money};

use crate::address::{Address, AddressDraft};
use crate::cart::CartItem;
use crate::config::GatewayConfig;
use crate::order::{Order, OrderDraft};
use crate::payment::PaymentOrder;

use super::wire::{
    CartPayload, CouponRequest, LineCreated, LineRequest, OrderRequest, PaymentOrderPayload,
    PaymentOrderRequest,
};
use super::{GatewayError, RemoteCart};

/// Client for the commerce gateway REST API.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct HttpGateway {
    inner: Arc<HttpGatewayInner>,
}

struct HttpGatewayInner {
    client: reqwest::Client,
    base: String,
}

impl HttpGateway {
    /// Create a new gateway client.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is not a valid header value or the
    /// HTTP client fails to build.
    pub(crate) fn new(base: Url, config: &GatewayConfig) -> Result<Self, GatewayError> {
        let mut headers = HeaderMap::new();
        if let Some(api_key) = &config.api_key {
            let mut value =
                HeaderValue::from_str(&format!("Bearer {}", api_key.expose_secret()))
                    .map_err(|e| {
                        GatewayError::Configuration(format!("invalid API key format: {e}"))
                    })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(HttpGatewayInner {
                client,
                base: base.as_str().trim_end_matches('/').to_string(),
            }),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base)
    }

    /// Map a non-2xx response to a typed error.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, GatewayError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message: String = response
            .text()
            .await
            .unwrap_or_default()
            .chars()
            .take(200)
            .collect();
        Err(GatewayError::Status {
            status: status.as_u16(),
            message,
        })
    }

    // =========================================================================
    // Cart
    // =========================================================================

    #[instrument(skip(self))]
    pub(crate) async fn fetch_cart(&self) -> Result<RemoteCart, GatewayError> {
        let response = self.inner.client.get(self.url("/cart")).send().await?;
        let payload: CartPayload = Self::ensure_success(response).await?.json().await?;
        Ok(payload.into())
    }

    #[instrument(skip(self, item), fields(product = %item.product_id))]
    pub(crate) async fn create_line(&self, item: &CartItem) -> Result<String, GatewayError> {
        let response = self
            .inner
            .client
            .post(self.url("/cart/items"))
            .json(&LineRequest::from(item))
            .send()
            .await?;
        let created: LineCreated = Self::ensure_success(response).await?.json().await?;
        Ok(created.id)
    }

    #[instrument(skip(self, item), fields(product = %item.product_id))]
    pub(crate) async fn update_line(
        &self,
        remote_id: &str,
        item: &CartItem,
    ) -> Result<(), GatewayError> {
        let response = self
            .inner
            .client
            .put(self.url(&format!("/cart/items/{remote_id}")))
            .json(&LineRequest::from(item))
            .send()
            .await?;
        Self::ensure_success(response).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub(crate) async fn delete_line(&self, remote_id: &str) -> Result<(), GatewayError> {
        let response = self
            .inner
            .client
            .delete(self.url(&format!("/cart/items/{remote_id}")))
            .send()
            .await?;
        Self::ensure_success(response).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub(crate) async fn apply_coupon(&self, code: &str) -> Result<(), GatewayError> {
        let response = self
            .inner
            .client
            .post(self.url("/cart/coupon"))
            .json(&CouponRequest { code })
            .send()
            .await?;
        Self::ensure_success(response).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub(crate) async fn remove_coupon(&self) -> Result<(), GatewayError> {
        let response = self
            .inner
            .client
            .delete(self.url("/cart/coupon"))
            .send()
            .await?;
        Self::ensure_success(response).await?;
        Ok(())
    }

    // =========================================================================
    // Addresses
    // =========================================================================

    #[instrument(skip(self))]
    pub(crate) async fn list_addresses(&self) -> Result<Vec<Address>, GatewayError> {
        let response = self.inner.client.get(self.url("/addresses")).send().await?;
        let addresses = Self::ensure_success(response).await?.json().await?;
        Ok(addresses)
    }

    #[instrument(skip(self, draft))]
    pub(crate) async fn create_address(
        &self,
        draft: &AddressDraft,
    ) -> Result<Address, GatewayError> {
        let response = self
            .inner
            .client
            .post(self.url("/addresses"))
            .json(draft)
            .send()
            .await?;
        let address = Self::ensure_success(response).await?.json().await?;
        Ok(address)
    }

    // =========================================================================
    // Payment and Orders
    // =========================================================================

    #[instrument(skip(self))]
    pub(crate) async fn create_payment_order(
        &self,
        amount: Money,
        currency: CurrencyCode,
    ) -> Result<PaymentOrder, GatewayError> {
        let response = self
            .inner
            .client
            .post(self.url("/payment/orders"))
            .json(&PaymentOrderRequest { amount, currency })
            .send()
            .await?;
        let payload: PaymentOrderPayload = Self::ensure_success(response).await?.json().await?;
        Ok(payload.into())
    }

    #[instrument(skip(self, draft), fields(address = %draft.address_id))]
    pub(crate) async fn create_order(
        &self,
        draft: &OrderDraft,
        idempotency_key: Uuid,
    ) -> Result<Order, GatewayError> {
        let response = self
            .inner
            .client
            .post(self.url("/orders"))
            .header("Idempotency-Key", idempotency_key.to_string())
            .json(&OrderRequest::from_draft(draft))
            .send()
            .await?;
        let order = Self::ensure_success(response).await?.json().await?;
        Ok(order)
    }
}
