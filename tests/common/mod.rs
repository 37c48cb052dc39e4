#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;

use storefront_gate::auth::{issue_token, Claims};
use storefront_gate::database::{MemoryStore, SeedData};
use storefront_gate::services::payments::{
    CheckoutAmount, CheckoutProvider, OrderStatus, PaymentError, PaymentIntent, PaymentIntentRequest,
    PaymentProvider,
};
use storefront_gate::{app, AppConfig, AppState};

pub const NOTE_U3_UNREAD: &str = "6f1c1f1e-0000-4000-8000-000000000001";
pub const NOTE_U1: &str = "6f1c1f1e-0000-4000-8000-000000000004";

/// Payment providers that record what they were asked to do.
#[derive(Default)]
pub struct FakePayments {
    pub intents: Mutex<Vec<PaymentIntentRequest>>,
    pub orders: Mutex<Vec<CheckoutAmount>>,
}

#[async_trait]
impl PaymentProvider for FakePayments {
    async fn create_payment_intent(&self, request: PaymentIntentRequest) -> Result<PaymentIntent, PaymentError> {
        request.validate()?;
        if request.currency == "zzz" {
            return Err(PaymentError::Rejected {
                provider: "Stripe",
                message: "Invalid currency: zzz".into(),
            });
        }
        let mut intents = self.intents.lock().unwrap();
        intents.push(request);
        Ok(PaymentIntent {
            id: format!("pi_{}", intents.len()),
            client_secret: format!("pi_{}_secret", intents.len()),
        })
    }
}

#[async_trait]
impl CheckoutProvider for FakePayments {
    async fn create_order(&self, amount: &CheckoutAmount) -> Result<OrderStatus, PaymentError> {
        let mut orders = self.orders.lock().unwrap();
        orders.push(amount.clone());
        Ok(OrderStatus {
            id: format!("ORDER{}", orders.len()),
            status: "CREATED".into(),
        })
    }

    async fn capture_order(&self, order_id: &str) -> Result<OrderStatus, PaymentError> {
        if order_id == "UNKNOWN" {
            return Err(PaymentError::Rejected {
                provider: "PayPal",
                message: "RESOURCE_NOT_FOUND".into(),
            });
        }
        Ok(OrderStatus {
            id: order_id.to_string(),
            status: "COMPLETED".into(),
        })
    }
}

/// In-process server on an unused port, backed by the dev seed.
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub config: Arc<AppConfig>,
    pub payments: Arc<FakePayments>,
    client: reqwest::Client,
}

impl TestServer {
    pub async fn start() -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let mut config = AppConfig::development();
        config.server.port = port;
        let config = Arc::new(config);

        let seed = SeedData::load(concat!(env!("CARGO_MANIFEST_DIR"), "/seed/dev.yaml"))?;
        let store = Arc::new(MemoryStore::with_seed(seed));
        let payments = Arc::new(FakePayments::default());

        let pipeline = AppState::pipeline_for(&config, store.clone());
        let state = AppState::new(
            config.clone(),
            pipeline,
            store.clone(),
            store,
            payments.clone(),
            payments.clone(),
        );

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app(state)).await;
        });

        let server = Self {
            port,
            base_url,
            config,
            payments,
            client: reqwest::Client::new(),
        };
        server.wait_ready(Duration::from_secs(5)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = tokio::time::Instant::now() + timeout;
        while tokio::time::Instant::now() < deadline {
            if let Ok(resp) = self.client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn token(&self, uid: &str) -> String {
        issue_token(&self.config.security.jwt_secret, &Claims::new(uid, 1)).expect("sign test token")
    }

    /// Request builder carrying a bearer token for `uid`.
    pub fn as_user(&self, method: reqwest::Method, path: &str, uid: &str) -> reqwest::RequestBuilder {
        self.client.request(method, self.url(path)).bearer_auth(self.token(uid))
    }

    pub fn anonymous(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client.request(method, self.url(path))
    }
}
