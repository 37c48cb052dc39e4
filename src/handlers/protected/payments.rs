use axum::{
    extract::State,
    http::HeaderMap,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::auth::AuthContext;
use crate::error::ApiError;
use crate::middleware::{ApiJson, ApiResponse, ApiResult};
use crate::services::payments::{
    normalize_checkout_amount, scoped_idempotency_key, OrderStatus, PaymentIntent, PaymentIntentRequest,
};
use crate::state::AppState;

pub const IDEMPOTENCY_HEADER: &str = "x-idempotency-key";

#[derive(Debug, Deserialize)]
pub struct IntentRequest {
    pub amount: i64,
    pub currency: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub struct OrderRequest {
    pub amount: Decimal,
    pub currency: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureRequest {
    pub order_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreated {
    pub id: String,
    pub status: String,
    pub currency: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversion_notice: Option<String>,
}

/// POST /api/payment/stripe/intent
///
/// Amount is in minor units. The caller's uid always lands in the metadata,
/// overriding any client-supplied `uid`.
pub async fn stripe_intent(
    State(state): State<AppState>,
    ctx: AuthContext,
    headers: HeaderMap,
    ApiJson(body): ApiJson<IntentRequest>,
) -> ApiResult<PaymentIntent> {
    let mut metadata = body.metadata;
    metadata.insert("uid".to_string(), ctx.uid().to_string());

    let idempotency_key = headers
        .get(IDEMPOTENCY_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(|key| scoped_idempotency_key(ctx.uid(), key));

    let request = PaymentIntentRequest {
        amount: body.amount,
        currency: body
            .currency
            .unwrap_or_else(|| state.config.payments.default_currency.clone())
            .to_lowercase(),
        metadata,
        idempotency_key,
    };
    request.validate()?;

    let intent = state.payments.create_payment_intent(request).await?;
    Ok(ApiResponse::success(intent))
}

/// POST /api/payment/paypal/order
pub async fn paypal_order(
    State(state): State<AppState>,
    ctx: AuthContext,
    ApiJson(body): ApiJson<OrderRequest>,
) -> ApiResult<OrderCreated> {
    let amount = normalize_checkout_amount(body.amount, &body.currency)?;
    let order = state.checkout.create_order(&amount).await?;

    tracing::info!("PayPal order {} created for {}", order.id, ctx.uid());
    Ok(ApiResponse::success(OrderCreated {
        id: order.id,
        status: order.status,
        currency: amount.currency_code,
        value: amount.value,
        conversion_notice: amount.conversion_notice,
    }))
}

/// POST /api/payment/paypal/capture
pub async fn paypal_capture(
    State(state): State<AppState>,
    ctx: AuthContext,
    ApiJson(body): ApiJson<CaptureRequest>,
) -> ApiResult<OrderStatus> {
    let order_id = body.order_id.trim();
    if order_id.is_empty() {
        return Err(ApiError::invalid_field("orderId", "Missing order id."));
    }

    let order = state.checkout.capture_order(order_id).await?;
    tracing::info!("PayPal order {} captured for {} ({})", order.id, ctx.uid(), order.status);
    Ok(ApiResponse::success(order))
}
