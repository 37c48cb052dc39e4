use std::future::Future;
use std::time::Duration;

/// An external call did not finish within its budget.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{what} did not respond within {limit:?}")]
pub struct UpstreamTimeout {
    pub what: &'static str,
    pub limit: Duration,
}

/// Await `fut`, giving up after `limit`.
pub async fn bounded<F, T>(limit: Duration, what: &'static str, fut: F) -> Result<T, UpstreamTimeout>
where
    F: Future<Output = T>,
{
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| UpstreamTimeout { what, limit })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn passes_through_fast_results() {
        let value = bounded(Duration::from_millis(100), "fast", async { 7 }).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn reports_slow_calls() {
        let err = bounded(Duration::from_millis(10), "slow store", async {
            tokio::time::sleep(Duration::from_millis(200)).await;
        })
        .await
        .unwrap_err();
        assert_eq!(err.what, "slow store");
    }
}
