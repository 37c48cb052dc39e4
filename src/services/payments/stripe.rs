use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;

use super::{PaymentError, PaymentIntent, PaymentIntentRequest, PaymentProvider};
use crate::upstream::bounded;

const PROVIDER: &str = "Stripe";

/// Minimal Stripe REST client for payment intents.
#[derive(Clone)]
pub struct StripeClient {
    http: reqwest::Client,
    api_base: String,
    secret_key: Option<String>,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct IntentResponse {
    id: String,
    client_secret: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: Option<String>,
}

impl StripeClient {
    pub fn new(http: reqwest::Client, api_base: impl Into<String>, secret_key: Option<String>, timeout: Duration) -> Self {
        Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            secret_key,
            timeout,
        }
    }

    fn form_fields(request: &PaymentIntentRequest) -> Vec<(String, String)> {
        let mut fields = vec![
            ("amount".to_string(), request.amount.to_string()),
            ("currency".to_string(), request.currency.to_lowercase()),
            ("automatic_payment_methods[enabled]".to_string(), "true".to_string()),
        ];
        for (key, value) in &request.metadata {
            fields.push((format!("metadata[{}]", key), value.clone()));
        }
        fields
    }
}

#[async_trait]
impl PaymentProvider for StripeClient {
    async fn create_payment_intent(&self, request: PaymentIntentRequest) -> Result<PaymentIntent, PaymentError> {
        request.validate()?;
        let secret = self.secret_key.as_deref().ok_or(PaymentError::NotConfigured(PROVIDER))?;

        let mut builder = self
            .http
            .post(format!("{}/v1/payment_intents", self.api_base))
            .bearer_auth(secret)
            .form(&Self::form_fields(&request));
        if let Some(key) = request.idempotency_key.as_deref() {
            builder = builder.header("Idempotency-Key", key);
        }

        let response = bounded(self.timeout, "Stripe", builder.send()).await??;
        let status = response.status();

        if status.is_success() {
            let intent: IntentResponse = response.json().await?;
            let client_secret = intent.client_secret.ok_or_else(|| PaymentError::Upstream {
                provider: PROVIDER,
                message: format!("payment intent {} has no client secret", intent.id),
            })?;
            tracing::info!("Created Stripe payment intent {}", intent.id);
            return Ok(PaymentIntent {
                id: intent.id,
                client_secret,
            });
        }

        let message = response
            .json::<ErrorEnvelope>()
            .await
            .ok()
            .and_then(|e| e.error.message)
            .unwrap_or_else(|| format!("HTTP {}", status));

        // 401 and 429 are not caller errors
        if status.is_client_error() && status != StatusCode::UNAUTHORIZED && status != StatusCode::TOO_MANY_REQUESTS {
            Err(PaymentError::Rejected { provider: PROVIDER, message })
        } else {
            Err(PaymentError::Upstream { provider: PROVIDER, message })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        http::HeaderMap,
        routing::post,
        Form, Json, Router,
    };
    use serde_json::json;
    use std::collections::{BTreeMap, HashMap};

    async fn mock_stripe() -> String {
        let app = Router::new().route(
            "/v1/payment_intents",
            post(|headers: HeaderMap, Form(fields): Form<HashMap<String, String>>| async move {
                let authorized = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    == Some("Bearer sk_test_123");
                if !authorized {
                    return (
                        axum::http::StatusCode::UNAUTHORIZED,
                        Json(json!({ "error": { "message": "Invalid API Key", "type": "invalid_request_error" } })),
                    );
                }
                if fields.get("currency").map(String::as_str) == Some("zzz") {
                    return (
                        axum::http::StatusCode::BAD_REQUEST,
                        Json(json!({ "error": { "message": "Invalid currency: zzz", "type": "invalid_request_error" } })),
                    );
                }
                let idem = headers.get("idempotency-key").and_then(|v| v.to_str().ok()).unwrap_or("none").to_string();
                (
                    axum::http::StatusCode::OK,
                    Json(json!({
                        "id": "pi_1",
                        "client_secret": format!(
                            "secret_{}_{}_{}",
                            fields.get("amount").cloned().unwrap_or_default(),
                            fields.get("metadata[uid]").cloned().unwrap_or_default(),
                            idem
                        ),
                    })),
                )
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn request(amount: i64, currency: &str) -> PaymentIntentRequest {
        PaymentIntentRequest {
            amount,
            currency: currency.to_string(),
            metadata: BTreeMap::from([("uid".to_string(), "u1".to_string())]),
            idempotency_key: Some("idem-1".to_string()),
        }
    }

    #[test]
    fn encodes_metadata_as_bracketed_fields() {
        let fields = StripeClient::form_fields(&request(1500, "KES"));
        assert!(fields.contains(&("currency".to_string(), "kes".to_string())));
        assert!(fields.contains(&("metadata[uid]".to_string(), "u1".to_string())));
        assert!(fields.contains(&("automatic_payment_methods[enabled]".to_string(), "true".to_string())));
    }

    #[tokio::test]
    async fn creates_intent_against_api() {
        let base = mock_stripe().await;
        let client = StripeClient::new(reqwest::Client::new(), base, Some("sk_test_123".into()), Duration::from_secs(5));

        let intent = client.create_payment_intent(request(1500, "kes")).await.unwrap();
        assert_eq!(intent.id, "pi_1");
        assert_eq!(intent.client_secret, "secret_1500_u1_idem-1");
    }

    #[tokio::test]
    async fn provider_validation_failures_are_rejections() {
        let base = mock_stripe().await;
        let client = StripeClient::new(reqwest::Client::new(), base, Some("sk_test_123".into()), Duration::from_secs(5));

        let err = client.create_payment_intent(request(1500, "zzz")).await.unwrap_err();
        assert!(matches!(err, PaymentError::Rejected { message, .. } if message.contains("zzz")));
    }

    #[tokio::test]
    async fn bad_api_key_is_upstream_failure() {
        let base = mock_stripe().await;
        let client = StripeClient::new(reqwest::Client::new(), base, Some("sk_wrong".into()), Duration::from_secs(5));

        let err = client.create_payment_intent(request(1500, "kes")).await.unwrap_err();
        assert!(matches!(err, PaymentError::Upstream { .. }));
    }

    #[tokio::test]
    async fn missing_key_is_not_configured() {
        let client = StripeClient::new(reqwest::Client::new(), "http://127.0.0.1:1", None, Duration::from_secs(1));
        let err = client.create_payment_intent(request(1500, "kes")).await.unwrap_err();
        assert!(matches!(err, PaymentError::NotConfigured(_)));
    }

    #[tokio::test]
    async fn validates_before_calling_out() {
        let client = StripeClient::new(reqwest::Client::new(), "http://127.0.0.1:1", Some("sk".into()), Duration::from_secs(1));
        let err = client.create_payment_intent(request(0, "kes")).await.unwrap_err();
        assert!(matches!(err, PaymentError::Validation(_)));
    }
}
