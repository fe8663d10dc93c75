//! Scripted checkout against the offline simulation.
//!
//! Walks the full engine surface: cart mutations, coupon application,
//! address creation, the payment-widget confirmation channel, and order
//! submission. Nothing here touches a real backend.

use tracing::info;

use marigold_checkout::{
    AddressBook, AddressDraft, CartStore, CheckoutSession, EngineConfig, Gateway, LineInput,
    OrderSubmitter, confirmation_channel,
};
use marigold_core::{Money, PaymentMethod, ProductId};

use super::demo_coupons;

/// Run the demo checkout.
///
/// # Errors
///
/// Returns an error if any engine operation fails; with the offline
/// gateway that indicates a bug rather than an environment problem.
pub async fn run(cash_on_delivery: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = EngineConfig::from_env()?;
    let gateway = Gateway::offline();
    let mut cart = CartStore::new(
        gateway.clone(),
        demo_coupons(),
        config.shipping,
        config.currency,
    );

    cart.add_item(
        LineInput {
            product_id: ProductId::new(101),
            name: "Classic Tee".to_string(),
            unit_price: Money::from_minor(5_999),
            size: Some("M".to_string()),
            color: Some("Black".to_string()),
        },
        2,
    )
    .await?;
    cart.add_item(
        LineInput {
            product_id: ProductId::new(205),
            name: "Slim Jeans".to_string(),
            unit_price: Money::from_minor(149_900),
            size: Some("32".to_string()),
            color: Some("Indigo".to_string()),
        },
        1,
    )
    .await?;

    let discount = cart.apply_coupon("WELCOME10").await?;
    info!(
        discount = %discount.display(cart.currency()),
        subtotal = %cart.totals().subtotal.display(cart.currency()),
        total = %cart.totals().total.display(cart.currency()),
        "coupon applied"
    );

    let mut addresses = AddressBook::new(gateway.clone());
    let address_id = addresses
        .create(AddressDraft {
            label: "Home".to_string(),
            full_name: "Asha Rao".to_string(),
            phone: "9876543210".to_string(),
            line1: "12 Gandhi Road".to_string(),
            line2: Some("Apartment 4B".to_string()),
            city: "Bengaluru".to_string(),
            state: "Karnataka".to_string(),
            pincode: "560001".to_string(),
            set_default: true,
        })
        .await;

    let mut session = CheckoutSession::new();
    session.select_address(address_id)?;
    session.enter_payment()?;

    if cash_on_delivery {
        session.confirm_payment(PaymentMethod::CashOnDelivery, None)?;
    } else {
        let payment = gateway
            .create_payment_order(cart.totals().total, cart.currency())
            .await?;
        info!(
            reference = %payment.reference,
            amount = %payment.amount.display(payment.currency),
            "payment order created"
        );

        // The simulated widget confirms immediately with the gateway
        // reference; a real one resolves the handle from its callback.
        let (handle, pending) = confirmation_channel();
        handle.confirm(payment.reference.clone());
        let reference = pending.wait(config.payment_timeout).await?;
        session.confirm_payment(PaymentMethod::Online, Some(reference))?;
    }

    let order = OrderSubmitter::new()
        .submit(&mut session, &mut cart)
        .await?;
    info!(
        order_number = %order.order_number,
        status = %order.status,
        payment = %order.payment_method,
        total = %order.total.display(config.currency),
        "order placed"
    );

    Ok(())
}
