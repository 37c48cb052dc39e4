use async_trait::async_trait;
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

use super::{CheckoutProvider, OrderStatus, PaymentError};
use crate::upstream::bounded;

const PROVIDER: &str = "PayPal";

/// Currencies PayPal settles directly.
pub const SUPPORTED_CURRENCIES: [&str; 24] = [
    "USD", "EUR", "GBP", "AUD", "CAD", "JPY", "NZD", "CHF", "SGD", "HKD", "SEK", "DKK", "PLN", "NOK", "HUF",
    "CZK", "ILS", "MXN", "BRL", "PHP", "TWD", "THB", "TRY", "RUB",
];

/// PayPal rejects fractional amounts in these.
const ZERO_DECIMAL_CURRENCIES: [&str; 3] = ["HUF", "JPY", "TWD"];

/// Fixed KES→USD rate: 129 KES = 1 USD.
const KES_PER_USD: i64 = 129;

/// Amount ready to send to PayPal, after currency normalisation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutAmount {
    pub currency_code: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversion_notice: Option<String>,
}

/// Map a requested amount onto a PayPal-settleable currency.
///
/// Supported currencies pass through. KES is converted to USD at the fixed
/// rate. Anything else is relabelled USD without conversion and flagged in
/// the notice.
pub fn normalize_checkout_amount(amount: Decimal, currency: &str) -> Result<CheckoutAmount, PaymentError> {
    if amount <= Decimal::ZERO {
        return Err(PaymentError::Validation("Invalid amount.".to_string()));
    }
    let requested = currency.trim().to_uppercase();
    if requested.is_empty() {
        return Err(PaymentError::Validation("Missing or invalid currency.".to_string()));
    }

    let (currency_code, value, conversion_notice) = if SUPPORTED_CURRENCIES.contains(&requested.as_str()) {
        (requested, amount, None)
    } else if requested == "KES" {
        (
            "USD".to_string(),
            amount / Decimal::from(KES_PER_USD),
            Some(format!("Converted from KES to USD at rate {} KES = 1 USD.", KES_PER_USD)),
        )
    } else {
        tracing::warn!("Currency '{}' is not supported by PayPal. Defaulting to USD.", requested);
        let notice = format!("Converted from {} to USD. (No FX rate applied)", requested);
        ("USD".to_string(), amount, Some(notice))
    };

    let mut value = value;
    value.rescale(if ZERO_DECIMAL_CURRENCIES.contains(&currency_code.as_str()) { 0 } else { 2 });
    if value <= Decimal::ZERO {
        return Err(PaymentError::Validation("Amount is too small after conversion.".to_string()));
    }

    Ok(CheckoutAmount {
        currency_code,
        value: value.to_string(),
        conversion_notice,
    })
}

/// PayPal Orders v2 client using client-credentials OAuth.
#[derive(Clone)]
pub struct PayPalClient {
    http: reqwest::Client,
    api_base: String,
    credentials: Option<(String, String)>,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    name: Option<String>,
    message: Option<String>,
    #[serde(default)]
    details: Vec<ErrorIssue>,
}

#[derive(Debug, Deserialize)]
struct ErrorIssue {
    issue: Option<String>,
}

impl ErrorResponse {
    fn summary(&self) -> String {
        let issue = self.details.iter().find_map(|d| d.issue.clone());
        match (issue, &self.message, &self.name) {
            (Some(issue), _, _) => issue,
            (None, Some(message), _) => message.clone(),
            (None, None, Some(name)) => name.clone(),
            (None, None, None) => "unknown error".to_string(),
        }
    }
}

impl PayPalClient {
    pub fn new(
        http: reqwest::Client,
        api_base: impl Into<String>,
        client_id: Option<String>,
        client_secret: Option<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            credentials: client_id.zip(client_secret),
            timeout,
        }
    }

    async fn access_token(&self) -> Result<String, PaymentError> {
        let (client_id, client_secret) = self.credentials.as_ref().ok_or(PaymentError::NotConfigured(PROVIDER))?;

        let response = bounded(
            self.timeout,
            "PayPal OAuth",
            self.http
                .post(format!("{}/v1/oauth2/token", self.api_base))
                .basic_auth(client_id, Some(client_secret))
                .form(&[("grant_type", "client_credentials")])
                .send(),
        )
        .await??;

        if !response.status().is_success() {
            let status = response.status();
            return Err(PaymentError::Upstream {
                provider: PROVIDER,
                message: format!("authentication failed: HTTP {}", status),
            });
        }

        Ok(response.json::<TokenResponse>().await?.access_token)
    }

    async fn order_call(&self, what: &'static str, url: String, body: serde_json::Value) -> Result<OrderStatus, PaymentError> {
        let token = self.access_token().await?;

        let response = bounded(
            self.timeout,
            what,
            self.http
                .post(url)
                .bearer_auth(token)
                .header("Prefer", "return=representation")
                .json(&body)
                .send(),
        )
        .await??;
        let status = response.status();

        if status.is_success() {
            return Ok(response.json::<OrderStatus>().await?);
        }

        let message = response
            .json::<ErrorResponse>()
            .await
            .map(|e| e.summary())
            .unwrap_or_else(|_| format!("HTTP {}", status));

        match status {
            StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND | StatusCode::UNPROCESSABLE_ENTITY => {
                Err(PaymentError::Rejected { provider: PROVIDER, message })
            }
            _ => Err(PaymentError::Upstream { provider: PROVIDER, message }),
        }
    }
}

#[async_trait]
impl CheckoutProvider for PayPalClient {
    async fn create_order(&self, amount: &CheckoutAmount) -> Result<OrderStatus, PaymentError> {
        let body = json!({
            "intent": "CAPTURE",
            "purchase_units": [{
                "amount": {
                    "currency_code": amount.currency_code,
                    "value": amount.value,
                }
            }],
            "application_context": {
                "shipping_preference": "NO_SHIPPING",
                "user_action": "PAY_NOW",
            }
        });

        let order = self
            .order_call("PayPal order", format!("{}/v2/checkout/orders", self.api_base), body)
            .await?;
        tracing::info!("Created PayPal order {} ({} {})", order.id, amount.value, amount.currency_code);
        Ok(order)
    }

    async fn capture_order(&self, order_id: &str) -> Result<OrderStatus, PaymentError> {
        if order_id.is_empty() || !order_id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(PaymentError::Validation("Invalid order id.".to_string()));
        }

        let order = self
            .order_call(
                "PayPal capture",
                format!("{}/v2/checkout/orders/{}/capture", self.api_base, order_id),
                json!({}),
            )
            .await?;
        tracing::info!("Captured PayPal order {} with status {}", order.id, order.status);
        Ok(order)
    }
}
