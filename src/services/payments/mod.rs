pub mod paypal;
pub mod stripe;

pub use paypal::{normalize_checkout_amount, CheckoutAmount, PayPalClient};
pub use stripe::StripeClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

use crate::upstream::UpstreamTimeout;

#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("invalid payment request: {0}")]
    Validation(String),

    #[error("{provider} rejected the request: {message}")]
    Rejected { provider: &'static str, message: String },

    #[error("{0} credentials are not configured")]
    NotConfigured(&'static str),

    #[error(transparent)]
    Timeout(#[from] UpstreamTimeout),

    #[error("{provider} error: {message}")]
    Upstream { provider: &'static str, message: String },

    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

/// Card payment intent in minor currency units.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentIntentRequest {
    pub amount: i64,
    pub currency: String,
    pub metadata: BTreeMap<String, String>,
    pub idempotency_key: Option<String>,
}

impl PaymentIntentRequest {
    /// Check amount and currency shape; the provider validates the code itself.
    pub fn validate(&self) -> Result<(), PaymentError> {
        if self.amount <= 0 {
            return Err(PaymentError::Validation("Invalid amount".to_string()));
        }
        if self.currency.len() != 3 || !self.currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(PaymentError::Validation(format!("Invalid currency '{}'", self.currency)));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderStatus {
    pub id: String,
    pub status: String,
}

#[async_trait]
pub trait PaymentProvider: Send + Sync {
    async fn create_payment_intent(&self, request: PaymentIntentRequest) -> Result<PaymentIntent, PaymentError>;
}

/// Redirect-style checkout (create an order, capture after buyer approval).
#[async_trait]
pub trait CheckoutProvider: Send + Sync {
    async fn create_order(&self, amount: &CheckoutAmount) -> Result<OrderStatus, PaymentError>;

    async fn capture_order(&self, order_id: &str) -> Result<OrderStatus, PaymentError>;
}

/// Derive the provider idempotency key from the caller and the client's key,
/// so two users reusing the same client key never collide.
pub fn scoped_idempotency_key(uid: &str, client_key: &str) -> String {
    let digest = Sha256::digest(format!("{}:{}", uid, client_key).as_bytes());
    format!("{:x}", digest)
}
