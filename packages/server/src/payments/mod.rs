//! Payment processor integration.

pub mod event;
pub mod gateway;
pub mod signature;
pub mod stripe;

use std::sync::Arc;

use crate::config::PaymentConfig;
use gateway::{DisabledGateway, PaymentGateway};
use stripe::StripeGateway;

/// Build the gateway selected by configuration.
pub fn gateway_from_config(config: &PaymentConfig) -> Result<Arc<dyn PaymentGateway>, reqwest::Error> {
    match config.secret_key.as_deref() {
        Some(key) if !key.trim().is_empty() => {
            Ok(Arc::new(StripeGateway::new(&config.api_base, key)?))
        }
        _ => {
            tracing::warn!("payment.secret_key is not set; checkout is disabled");
            Ok(Arc::new(DisabledGateway))
        }
    }
}
