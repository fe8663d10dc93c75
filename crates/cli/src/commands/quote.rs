//! Price an ad-hoc basket without checking out.

use thiserror::Error;
use tracing::info;

use marigold_checkout::{CartStore, EngineConfig, Gateway, LineInput};
use marigold_core::{Money, ProductId};

use super::demo_coupons;

/// Errors that can occur while parsing line specs.
#[derive(Debug, Error)]
pub enum QuoteError {
    #[error("invalid line spec '{0}', expected name:unit_price_minor:quantity")]
    BadSpec(String),
}

/// Compute and log totals for the given lines.
///
/// # Errors
///
/// Returns an error for malformed line specs or a rejected coupon.
pub async fn run(lines: &[String], coupon: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let config = EngineConfig::from_env()?;
    let mut cart = CartStore::new(
        Gateway::offline(),
        demo_coupons(),
        config.shipping,
        config.currency,
    );

    for (index, spec) in lines.iter().enumerate() {
        let (name, unit_price, quantity) = parse_spec(spec)?;
        cart.add_item(
            LineInput {
                product_id: ProductId::new(i64::try_from(index).unwrap_or_default() + 1),
                name,
                unit_price,
                size: None,
                color: None,
            },
            quantity,
        )
        .await?;
    }

    if let Some(code) = coupon {
        cart.apply_coupon(code).await?;
    }

    let currency = cart.currency();
    let totals = cart.totals();
    info!(
        subtotal = %totals.subtotal.display(currency),
        discount = %totals.discount.display(currency),
        shipping = %totals.shipping.display(currency),
        total = %totals.total.display(currency),
        "quote"
    );

    Ok(())
}

/// Parse `name:unit_price_minor:quantity`; the name may itself contain
/// colons, so the split happens from the right.
fn parse_spec(spec: &str) -> Result<(String, Money, u32), QuoteError> {
    let mut parts = spec.rsplitn(3, ':');
    let quantity = parts
        .next()
        .and_then(|raw| raw.parse::<u32>().ok())
        .ok_or_else(|| QuoteError::BadSpec(spec.to_string()))?;
    let unit_price = parts
        .next()
        .and_then(|raw| raw.parse::<i64>().ok())
        .map(Money::from_minor)
        .ok_or_else(|| QuoteError::BadSpec(spec.to_string()))?;
    let name = parts
        .next()
        .filter(|name| !name.is_empty())
        .ok_or_else(|| QuoteError::BadSpec(spec.to_string()))?;
    Ok((name.to_string(), unit_price, quantity))
}
