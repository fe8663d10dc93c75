//! In-process mock of the commerce gateway's REST API.
//!
//! Serves the endpoints the checkout engine consumes, keeps its state
//! inspectable, and can be told to fail requests so tests can drive the
//! engine's failure paths.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use url::Url;

use marigold_checkout::{Address, AddressDraft, CartItem, GatewayConfig, Order, Totals};
use marigold_core::{AddressId, CurrencyCode, Money, OrderId, OrderStatus, PaymentMethod, ProductId};

/// Inspectable state behind the mock endpoints.
#[derive(Default)]
pub struct MockState {
    pub lines: Vec<MockLine>,
    pub coupon_code: Option<String>,
    pub addresses: Vec<Address>,
    /// Orders keyed by the `Idempotency-Key` header they arrived with.
    pub orders: HashMap<String, Order>,
    /// How many times `POST /orders` was hit, including failed attempts.
    pub order_attempts: u32,
    /// Fail the next N `POST /orders` with 503.
    pub fail_orders: u32,
    /// Fail every cart line endpoint with 503 while set.
    pub fail_cart_sync: bool,
    next_line: i64,
    next_address: i64,
    next_order: i64,
}

/// One cart line as the mock stores it.
#[derive(Debug, Clone, Serialize)]
pub struct MockLine {
    pub id: String,
    pub product_id: ProductId,
    pub quantity: u32,
    pub size: Option<String>,
    pub color: Option<String>,
}

/// A running mock gateway bound to an ephemeral local port.
pub struct MockGateway {
    addr: SocketAddr,
    state: Arc<Mutex<MockState>>,
}

impl MockGateway {
    /// Start the mock server.
    pub async fn spawn() -> Self {
        let state = Arc::new(Mutex::new(MockState::default()));
        let app = router(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock gateway");
        let addr = listener.local_addr().expect("mock gateway local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("mock gateway crashed");
        });

        Self { addr, state }
    }

    /// Gateway configuration pointing the engine at this mock.
    #[must_use]
    pub fn config(&self) -> GatewayConfig {
        GatewayConfig {
            base_url: Some(
                Url::parse(&format!("http://{}", self.addr)).expect("valid mock gateway url"),
            ),
            api_key: None,
            timeout: Duration::from_secs(5),
        }
    }

    /// Lock the mock state for inspection or seeding.
    pub fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MockState {
    /// Seed a cart line as if it had been created through the API.
    pub fn seed_line(
        &mut self,
        product_id: ProductId,
        quantity: u32,
        size: Option<&str>,
        color: Option<&str>,
    ) -> String {
        self.next_line += 1;
        let id = format!("srv_{}", self.next_line);
        self.lines.push(MockLine {
            id: id.clone(),
            product_id,
            quantity,
            size: size.map(str::to_owned),
            color: color.map(str::to_owned),
        });
        id
    }
}

type Shared = Arc<Mutex<MockState>>;

fn lock(state: &Shared) -> MutexGuard<'_, MockState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn router(state: Shared) -> Router {
    Router::new()
        .route("/cart", get(get_cart))
        .route("/cart/items", post(create_line))
        .route(
            "/cart/items/{id}",
            axum::routing::put(update_line).delete(delete_line),
        )
        .route("/cart/coupon", post(apply_coupon).delete(remove_coupon))
        .route("/addresses", get(list_addresses).post(create_address))
        .route("/payment/orders", post(create_payment_order))
        .route("/orders", post(create_order))
        .with_state(state)
}

// =============================================================================
// Wire types (mirror of what the engine sends)
// =============================================================================

#[derive(Debug, Deserialize)]
struct LineRequest {
    product_id: ProductId,
    #[allow(dead_code)]
    name: String,
    #[allow(dead_code)]
    unit_price: Money,
    quantity: u32,
    size: Option<String>,
    color: Option<String>,
}

#[derive(Debug, Serialize)]
struct LineCreated {
    id: String,
}

#[derive(Debug, Serialize)]
struct CartResponse {
    lines: Vec<MockLine>,
    coupon_code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CouponRequest {
    code: String,
}

#[derive(Debug, Deserialize)]
struct PaymentOrderRequest {
    amount: Money,
    currency: CurrencyCode,
}

#[derive(Debug, Serialize)]
struct PaymentOrderResponse {
    reference: String,
    amount: Money,
    currency: CurrencyCode,
}

#[derive(Debug, Deserialize)]
struct OrderRequest {
    address_id: AddressId,
    payment_method: PaymentMethod,
    #[allow(dead_code)]
    payment_reference: Option<String>,
    items: Vec<CartItem>,
    #[allow(dead_code)]
    coupon_code: Option<String>,
    totals: Totals,
    #[allow(dead_code)]
    currency: CurrencyCode,
}

// =============================================================================
// Handlers
// =============================================================================

async fn get_cart(State(state): State<Shared>) -> Json<CartResponse> {
    let state = lock(&state);
    Json(CartResponse {
        lines: state.lines.clone(),
        coupon_code: state.coupon_code.clone(),
    })
}

async fn create_line(
    State(state): State<Shared>,
    Json(request): Json<LineRequest>,
) -> Result<Json<LineCreated>, StatusCode> {
    let mut state = lock(&state);
    if state.fail_cart_sync {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }
    let id = state.seed_line(
        request.product_id,
        request.quantity,
        request.size.as_deref(),
        request.color.as_deref(),
    );
    Ok(Json(LineCreated { id }))
}

async fn update_line(
    State(state): State<Shared>,
    Path(id): Path<String>,
    Json(request): Json<LineRequest>,
) -> StatusCode {
    let mut state = lock(&state);
    if state.fail_cart_sync {
        return StatusCode::SERVICE_UNAVAILABLE;
    }
    match state.lines.iter_mut().find(|line| line.id == id) {
        Some(line) => {
            line.quantity = request.quantity;
            StatusCode::NO_CONTENT
        }
        None => StatusCode::NOT_FOUND,
    }
}

async fn delete_line(State(state): State<Shared>, Path(id): Path<String>) -> StatusCode {
    let mut state = lock(&state);
    if state.fail_cart_sync {
        return StatusCode::SERVICE_UNAVAILABLE;
    }
    state.lines.retain(|line| line.id != id);
    StatusCode::NO_CONTENT
}

async fn apply_coupon(
    State(state): State<Shared>,
    Json(request): Json<CouponRequest>,
) -> StatusCode {
    lock(&state).coupon_code = Some(request.code);
    StatusCode::NO_CONTENT
}

async fn remove_coupon(State(state): State<Shared>) -> StatusCode {
    lock(&state).coupon_code = None;
    StatusCode::NO_CONTENT
}

async fn list_addresses(State(state): State<Shared>) -> Json<Vec<Address>> {
    Json(lock(&state).addresses.clone())
}

async fn create_address(
    State(state): State<Shared>,
    Json(draft): Json<AddressDraft>,
) -> Json<Address> {
    let mut state = lock(&state);
    if draft.set_default {
        for address in &mut state.addresses {
            address.is_default = false;
        }
    }
    state.next_address += 1;
    let address = Address {
        id: AddressId::new(state.next_address),
        label: draft.label,
        full_name: draft.full_name,
        phone: draft.phone,
        line1: draft.line1,
        line2: draft.line2,
        city: draft.city,
        state: draft.state,
        pincode: draft.pincode,
        is_default: draft.set_default,
    };
    state.addresses.push(address.clone());
    Json(address)
}

async fn create_payment_order(
    State(state): State<Shared>,
    Json(request): Json<PaymentOrderRequest>,
) -> Json<PaymentOrderResponse> {
    let mut state = lock(&state);
    state.next_order += 1;
    Json(PaymentOrderResponse {
        reference: format!("pay_mock_{}", state.next_order),
        amount: request.amount,
        currency: request.currency,
    })
}

async fn create_order(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(request): Json<OrderRequest>,
) -> Result<Json<Order>, StatusCode> {
    let Some(key) = headers
        .get("Idempotency-Key")
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
    else {
        return Err(StatusCode::BAD_REQUEST);
    };

    let mut state = lock(&state);
    state.order_attempts += 1;

    if state.fail_orders > 0 {
        state.fail_orders -= 1;
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }

    if let Some(existing) = state.orders.get(&key) {
        return Ok(Json(existing.clone()));
    }

    let Some(address) = state
        .addresses
        .iter()
        .find(|address| address.id == request.address_id)
        .cloned()
    else {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    };

    state.next_order += 1;
    let order = Order {
        id: OrderId::new(state.next_order),
        order_number: format!("MG-{:05}", 40_000 + state.next_order),
        status: OrderStatus::Created,
        payment_method: request.payment_method,
        items: request.items,
        address,
        total: request.totals.total,
        placed_at: Utc::now(),
    };

    // Creating the order consumes the gateway-side cart.
    state.lines.clear();
    state.coupon_code = None;

    state.orders.insert(key, order.clone());
    Ok(Json(order))
}
