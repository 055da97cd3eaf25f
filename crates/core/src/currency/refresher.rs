//! Periodic rate refresh loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::service::CurrencyService;

/// Keeps the rate cache warm in the background.
///
/// The loop sleeps, refreshes, and repeats until cancelled. A failed refresh
/// is logged by the service and the loop carries on with the old snapshot.
/// The sleep is the only suspension point that observes cancellation, so a
/// snapshot swap is never interrupted half-way.
#[derive(Debug, Clone)]
pub struct RateRefresher {
    service: Arc<CurrencyService>,
    interval: Duration,
}

impl RateRefresher {
    /// Creates a refresher. The first attempt happens one `interval` after
    /// [`RateRefresher::run`] starts; warm the cache before that with
    /// [`CurrencyService::warm_up`].
    #[must_use]
    pub const fn new(service: Arc<CurrencyService>, interval: Duration) -> Self {
        Self { service, interval }
    }

    /// Runs until `shutdown` is cancelled.
    ///
    /// Returns immediately when no provider credential is configured.
    pub async fn run(self, shutdown: CancellationToken) {
        if !self.service.has_provider() {
            info!("Rate refresher not started: no provider credential");
            return;
        }

        info!(interval_secs = self.interval.as_secs(), "Rate refresher started");

        loop {
            tokio::select! {
                () = shutdown.cancelled() => {
                    info!("Rate refresher stopped");
                    return;
                }
                () = tokio::time::sleep(self.interval) => {
                    debug!("Refreshing exchange rates");
                    let _ = self.service.refresh().await;
                }
            }
        }
    }

    /// Spawns [`RateRefresher::run`] onto the current runtime.
    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency::store::RateStore;
    use crate::currency::testing::{FailingProvider, StaticProvider};
    use rust_decimal_macros::dec;

    fn service_with(provider: Arc<dyn crate::currency::RateProvider>) -> Arc<CurrencyService> {
        Arc::new(CurrencyService::new(
            RateStore::new(),
            Some(provider),
            "USD",
            chrono::Duration::hours(1),
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn test_refreshes_every_interval_until_cancelled() {
        let provider = Arc::new(StaticProvider::new([("EUR", dec!(0.92))]));
        let service = service_with(provider.clone());
        let shutdown = CancellationToken::new();

        let handle = RateRefresher::new(service.clone(), Duration::from_secs(3600))
            .spawn(shutdown.clone());

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(provider.calls(), 0);
        assert!(service.store().is_empty());

        tokio::time::sleep(Duration::from_secs(3600)).await;
        assert_eq!(provider.calls(), 1);
        assert_eq!(service.rate("USD", "EUR"), dec!(0.92));

        tokio::time::sleep(Duration::from_secs(3600)).await;
        assert_eq!(provider.calls(), 2);

        shutdown.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_do_not_stop_the_loop() {
        let service = service_with(Arc::new(FailingProvider));
        let shutdown = CancellationToken::new();

        let handle = RateRefresher::new(service.clone(), Duration::from_secs(60))
            .spawn(shutdown.clone());

        tokio::time::sleep(Duration::from_secs(600)).await;
        assert!(!handle.is_finished());
        assert_eq!(service.rate("USD", "EUR"), crate::currency::PARITY_RATE);

        shutdown.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_returns_immediately_without_credential() {
        let service = Arc::new(CurrencyService::new(
            RateStore::new(),
            None,
            "USD",
            chrono::Duration::hours(1),
        ));
        RateRefresher::new(service, Duration::from_secs(3600))
            .run(CancellationToken::new())
            .await;
    }
}
