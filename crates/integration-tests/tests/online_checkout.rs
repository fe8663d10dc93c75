//! Full checkout flow against the mock commerce gateway.

#![allow(clippy::unwrap_used)]

use marigold_checkout::{
    AddressBook, AddressDraft, CartStore, CheckoutSession, CheckoutStage, Coupon, CouponBook,
    CouponValue, Gateway, GatewayMode, LineInput, OrderSubmitter, ShippingPolicy,
};
use marigold_core::{CurrencyCode, Money, OrderStatus, PaymentMethod, ProductId};
use marigold_integration_tests::mock_gateway::MockGateway;

fn coupons() -> CouponBook {
    [Coupon {
        code: "FLAT500".to_string(),
        value: CouponValue::Fixed(Money::from_minor(500)),
        min_subtotal: None,
        expires_at: None,
    }]
    .into_iter()
    .collect()
}

fn policy() -> ShippingPolicy {
    ShippingPolicy {
        free_over: Money::from_minor(4_999),
        flat_fee: Money::from_minor(4_900),
    }
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

fn home_address(set_default: bool) -> AddressDraft {
    AddressDraft {
        label: "Home".to_string(),
        full_name: "Asha Rao".to_string(),
        phone: "9876543210".to_string(),
        line1: "12 Gandhi Road".to_string(),
        line2: None,
        city: "Bengaluru".to_string(),
        state: "Karnataka".to_string(),
        pincode: "560001".to_string(),
        set_default,
    }
}

fn cart_for(mock: &MockGateway) -> (Gateway, CartStore) {
    let gateway = Gateway::connect(&mock.config()).unwrap();
    assert_eq!(gateway.mode(), GatewayMode::Online);
    let cart = CartStore::new(gateway.clone(), coupons(), policy(), CurrencyCode::INR);
    (gateway, cart)
}

#[tokio::test]
async fn test_full_online_checkout() {
    let mock = MockGateway::spawn().await;
    let (gateway, mut cart) = cart_for(&mock);

    // Cart mutations sync to the gateway.
    cart.add_item(tee("M"), 2).await.unwrap();
    cart.add_item(tee("L"), 1).await.unwrap();
    {
        let state = mock.state();
        assert_eq!(state.lines.len(), 2);
        assert_eq!(state.lines.first().unwrap().quantity, 2);
    }
    assert!(cart.items().iter().all(|item| item.remote_id.is_some()));

    // Coupon lands locally and on the gateway.
    cart.apply_coupon("flat500").await.unwrap();
    assert_eq!(cart.totals().discount, Money::from_minor(500));
    assert_eq!(mock.state().coupon_code.as_deref(), Some("FLAT500"));

    // Address persists remotely.
    let mut addresses = AddressBook::new(gateway.clone());
    let address_id = addresses.create(home_address(true)).await;
    assert!(address_id.as_i64() > 0);

    // Address, payment, confirmation.
    let mut session = CheckoutSession::new();
    session.select_address(address_id).unwrap();
    session.enter_payment().unwrap();

    let payment = gateway
        .create_payment_order(cart.totals().total, cart.currency())
        .await
        .unwrap();
    assert!(payment.reference.starts_with("pay_mock_"));
    assert_eq!(payment.amount, cart.totals().total);

    session
        .confirm_payment(PaymentMethod::Online, Some(payment.reference))
        .unwrap();

    // Submission creates exactly one order and clears client state.
    let mut submitter = OrderSubmitter::new();
    let order = submitter.submit(&mut session, &mut cart).await.unwrap();
    assert!(order.order_number.starts_with("MG-"));
    assert_eq!(order.status, OrderStatus::Created);
    assert_eq!(order.items.len(), 2);
    assert_eq!(order.address.pincode, "560001");
    // subtotal 179.97, discount 5.00, free shipping above 49.99
    assert_eq!(order.total, Money::from_minor(17_497));

    assert!(cart.is_empty());
    assert_eq!(session.stage(), CheckoutStage::Completed);

    let state = mock.state();
    assert_eq!(state.orders.len(), 1);
    assert!(state.lines.is_empty());
}

#[tokio::test]
async fn test_refresh_adopts_server_ids_but_not_quantities() {
    let mock = MockGateway::spawn().await;
    let (_gateway, mut cart) = cart_for(&mock);

    // The add happens while the gateway is refusing cart syncs, so the
    // local line has no server id yet.
    mock.state().fail_cart_sync = true;
    cart.add_item(tee("M"), 2).await.unwrap();
    assert!(cart.items().first().unwrap().remote_id.is_none());
    mock.state().fail_cart_sync = false;

    // The gateway knows the same variant under its own id, with a stale
    // quantity from before the outage.
    let server_id = mock
        .state()
        .seed_line(ProductId::new(11), 5, Some("M"), Some("Black"));

    cart.refresh().await;

    let item = cart.items().first().unwrap();
    assert_eq!(item.remote_id.as_deref(), Some(server_id.as_str()));
    // Local truth wins: the stale server quantity is not adopted.
    assert_eq!(item.quantity, 2);
}

#[tokio::test]
async fn test_remote_addresses_keep_single_default() {
    let mock = MockGateway::spawn().await;
    let gateway = Gateway::connect(&mock.config()).unwrap();

    let mut addresses = AddressBook::new(gateway);
    addresses.create(home_address(true)).await;
    let second = addresses
        .create(AddressDraft {
            label: "Work".to_string(),
            ..home_address(true)
        })
        .await;

    let listed = addresses.refresh().await;
    let defaults: Vec<_> = listed.iter().filter(|a| a.is_default).collect();
    assert_eq!(defaults.len(), 1);
    assert_eq!(defaults.first().unwrap().id, second);
}
