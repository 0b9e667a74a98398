//! Application catalog
//!
//! Read-only snapshot of the applications a user can launch, split into
//! native (direct link) and portal (brokered grant) sections, plus the
//! resolver that executes access decisions.

mod models;
mod resolver;

pub use models::{AccessGrant, ApplicationDescriptor, Catalog, Category};
pub use resolver::{
    build_launch_url, AccessError, AccessResolver, Navigator, Resolution, SystemNavigator,
};

use std::time::Duration;

use crate::config::RetryConfig;
use crate::gateway::{GatewayClient, GatewayError};

/// Fetch the catalog with bounded retry.
///
/// Backoff is exponential with jitter (base, 2x, 4x, ...). Deterministic
/// failures, an expired session above all, are returned immediately;
/// retrying them cannot change the outcome.
pub async fn fetch(
    gateway: &GatewayClient,
    token: &str,
    retry: &RetryConfig,
) -> Result<Catalog, GatewayError> {
    let attempts = retry.attempts.max(1);

    for attempt in 1..=attempts {
        match gateway.list_applications(token).await {
            Ok(applications) => {
                if attempt > 1 {
                    tracing::debug!(attempt = attempt, "Catalog fetched after retry");
                }
                return Ok(Catalog::new(applications));
            }
            Err(error) => {
                if !error.is_retryable() || attempt == attempts {
                    return Err(error);
                }

                let backoff = retry.base_delay_ms << (attempt - 1);
                let delay = backoff + fastrand::u64(0..=backoff / 2);
                tracing::warn!(
                    attempt = attempt,
                    max_attempts = attempts,
                    delay_ms = delay,
                    error = %error,
                    "Catalog fetch failed, retrying"
                );
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }
        }
    }

    unreachable!("retry loop always returns")
}

/// Degraded fetch for dashboard loads: a failing catalog renders empty
/// rather than breaking the dashboard.
///
/// Session expiry is the one failure that is not degraded: it has to
/// surface so the caller can force a re-login.
pub async fn fetch_or_empty(
    gateway: &GatewayClient,
    token: &str,
    retry: &RetryConfig,
) -> Result<Catalog, GatewayError> {
    match fetch(gateway, token, retry).await {
        Ok(catalog) => Ok(catalog),
        Err(GatewayError::Unauthorized) => Err(GatewayError::Unauthorized),
        Err(error) => {
            tracing::error!(error = %error, "Catalog fetch failed; rendering empty catalog");
            Ok(Catalog::empty())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::MockBackend;

    fn fast_retry(attempts: u32) -> RetryConfig {
        RetryConfig {
            attempts,
            base_delay_ms: 1,
        }
    }

    #[tokio::test]
    async fn test_fetch_returns_snapshot() {
        let backend = MockBackend::spawn().await;
        let gateway = GatewayClient::new(&backend.base_url, 2, 5).unwrap();

        let catalog = fetch(&gateway, MockBackend::VALID_TOKEN, &fast_retry(3))
            .await
            .unwrap();
        assert!(!catalog.native().is_empty());
        assert!(!catalog.portal().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_recovers_from_transient_failures() {
        let backend = MockBackend::spawn().await;
        backend.fail_next_catalog_fetches(2);
        let gateway = GatewayClient::new(&backend.base_url, 2, 5).unwrap();

        let catalog = fetch(&gateway, MockBackend::VALID_TOKEN, &fast_retry(3))
            .await
            .unwrap();
        assert!(!catalog.is_empty());
        assert_eq!(backend.catalog_calls(), 3);
    }

    #[tokio::test]
    async fn test_fetch_gives_up_after_bounded_attempts() {
        let backend = MockBackend::spawn().await;
        backend.fail_next_catalog_fetches(10);
        let gateway = GatewayClient::new(&backend.base_url, 2, 5).unwrap();

        let err = fetch(&gateway, MockBackend::VALID_TOKEN, &fast_retry(3))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Backend { .. }));
        assert_eq!(backend.catalog_calls(), 3);
    }

    #[tokio::test]
    async fn test_fetch_does_not_retry_expired_session() {
        let backend = MockBackend::spawn().await;
        let gateway = GatewayClient::new(&backend.base_url, 2, 5).unwrap();

        let err = fetch(&gateway, "stale-token", &fast_retry(3))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Unauthorized));
        assert_eq!(backend.catalog_calls(), 1);
    }

    #[tokio::test]
    async fn test_fetch_or_empty_degrades_to_empty_catalog() {
        let backend = MockBackend::spawn().await;
        backend.fail_next_catalog_fetches(10);
        let gateway = GatewayClient::new(&backend.base_url, 2, 5).unwrap();

        let catalog = fetch_or_empty(&gateway, MockBackend::VALID_TOKEN, &fast_retry(2))
            .await
            .unwrap();
        assert!(catalog.is_empty());
        assert!(catalog.native().is_empty());
        assert!(catalog.portal().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_or_empty_surfaces_expired_session() {
        let backend = MockBackend::spawn().await;
        let gateway = GatewayClient::new(&backend.base_url, 2, 5).unwrap();

        let err = fetch_or_empty(&gateway, "stale-token", &fast_retry(2))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Unauthorized));
    }
}
