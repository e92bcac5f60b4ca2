use std::sync::Arc;
use std::time::Duration;

use market_types::ports::MarketRepository;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::order_service::OrderService;

/// Periodically cancels Pending orders whose payment window has passed.
/// The task runs until the returned handle is aborted.
pub fn spawn_expiry_sweep<R: MarketRepository>(
    orders: Arc<OrderService<R>>,
    every: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!(
            interval_secs = every.as_secs(),
            window_minutes = orders.expiry_window().num_minutes(),
            "order expiry sweep started"
        );
        loop {
            ticker.tick().await;
            match orders.expire_stale_orders(chrono::Utc::now()).await {
                Ok(0) => tracing::debug!("expiry sweep found nothing to cancel"),
                Ok(n) => tracing::info!(expired = n, "expired unpaid orders"),
                Err(e) => tracing::error!(error = %e, "expiry sweep failed"),
            }
        }
    })
}
