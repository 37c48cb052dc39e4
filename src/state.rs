use anyhow::Context;
use std::sync::Arc;

use crate::auth::{AuthPipeline, JwtVerifier, ProfileResolver};
use crate::config::AppConfig;
use crate::database::{DatabaseManager, MemoryStore, NotificationStore, PgStore, ProfileStore, SeedData};
use crate::services::payments::{CheckoutProvider, PayPalClient, PaymentProvider, StripeClient};

/// Everything a handler can reach. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub pipeline: Arc<AuthPipeline>,
    pub profiles: Arc<dyn ProfileStore>,
    pub notifications: Arc<dyn NotificationStore>,
    pub payments: Arc<dyn PaymentProvider>,
    pub checkout: Arc<dyn CheckoutProvider>,
}

impl AppState {
    pub fn new(
        config: Arc<AppConfig>,
        pipeline: Arc<AuthPipeline>,
        profiles: Arc<dyn ProfileStore>,
        notifications: Arc<dyn NotificationStore>,
        payments: Arc<dyn PaymentProvider>,
        checkout: Arc<dyn CheckoutProvider>,
    ) -> Self {
        Self {
            config,
            pipeline,
            profiles,
            notifications,
            payments,
            checkout,
        }
    }

    /// Wire the JWT verifier and profile resolver over `profiles`.
    pub fn pipeline_for(config: &AppConfig, profiles: Arc<dyn ProfileStore>) -> Arc<AuthPipeline> {
        let verifier = JwtVerifier::new(&config.security.jwt_secret, config.security.jwt_issuer.as_deref());
        let resolver = ProfileResolver::new(profiles, config.upstream.store_timeout(), config.security.strict_profiles);
        Arc::new(AuthPipeline::new(Arc::new(verifier), resolver, config.upstream.verify_timeout()))
    }

    /// Build the production wiring: Postgres when `DATABASE_URL` is set,
    /// otherwise the memory store (optionally seeded), plus the real
    /// payment clients.
    pub async fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let config = Arc::new(config);

        let (profiles, notifications): (Arc<dyn ProfileStore>, Arc<dyn NotificationStore>) =
            if config.database.url.is_some() {
                let pool = DatabaseManager::connect(&config.database)
                    .await
                    .context("connecting to database")?;
                DatabaseManager::ensure_schema(&pool).await.context("applying schema")?;
                let store = Arc::new(PgStore::new(pool, config.upstream.store_timeout()));
                (store.clone() as Arc<dyn ProfileStore>, store as Arc<dyn NotificationStore>)
            } else {
                let store = match config.database.seed_file.as_deref() {
                    Some(path) => {
                        let seed = SeedData::load(path)?;
                        tracing::info!(
                            "Seeded memory store with {} profiles and {} notifications from {}",
                            seed.profiles.len(),
                            seed.notifications.len(),
                            path
                        );
                        MemoryStore::with_seed(seed)
                    }
                    None => MemoryStore::new(),
                };
                tracing::warn!("DATABASE_URL not set; using in-memory store");
                let store = Arc::new(store);
                (store.clone() as Arc<dyn ProfileStore>, store as Arc<dyn NotificationStore>)
            };

        let http = reqwest::Client::builder()
            .user_agent(concat!("storefront-gate/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("building HTTP client")?;
        let payment_timeout = config.upstream.payment_timeout();

        let stripe = StripeClient::new(
            http.clone(),
            config.payments.stripe_api_base.clone(),
            config.payments.stripe_secret_key.clone(),
            payment_timeout,
        );
        let paypal = PayPalClient::new(
            http,
            config.payments.paypal_base(),
            config.payments.paypal_client_id.clone(),
            config.payments.paypal_client_secret.clone(),
            payment_timeout,
        );
        if config.payments.stripe_secret_key.is_none() {
            tracing::warn!("STRIPE_SECRET_KEY not set; card payments will return 503");
        }

        let pipeline = Self::pipeline_for(&config, profiles.clone());
        Ok(Self::new(
            config,
            pipeline,
            profiles,
            notifications,
            Arc::new(stripe),
            Arc::new(paypal),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_wiring_without_database_url() {
        let mut config = AppConfig::development();
        config.database.url = None;
        config.database.seed_file = None;

        let state = AppState::from_config(config).await.unwrap();
        assert!(state.profiles.ping().await.is_ok());
        assert!(state.profiles.list_profiles().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_seed_file_fails_startup() {
        let mut config = AppConfig::development();
        config.database.url = None;
        config.database.seed_file = Some("/nonexistent/seed.yaml".into());

        assert!(AppState::from_config(config).await.is_err());
    }
}
