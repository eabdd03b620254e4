use super::app::Application;
use super::Poller;
use crate::infrastructure::shutdown::Shutdown;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use typed_builder::TypedBuilder;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Refreshes price, balances and transactions on a fixed interval.
///
/// Passes are spawned without waiting for the previous one. The session keeps
/// each result unless a later pass already committed its own.
#[derive(TypedBuilder)]
pub struct DashboardPoller<A, S> {
    app: A,
    shutdown: S,
    #[builder(default = DEFAULT_POLL_INTERVAL)]
    interval: Duration,
}

#[async_trait::async_trait]
impl<A, S> Poller for DashboardPoller<A, S>
where
    A: Application + Clone + 'static,
    S: Shutdown + Send + Sync + 'static,
{
    async fn run(self) {
        let mut shutdown = self.shutdown.subscribe();
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!("Polling every {:?}", self.interval);
        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!("Received shutdown signal, stopping poller");
                    break;
                }
                _ = ticker.tick() => {
                    self.app.refresh_price().await;
                    let app = self.app.clone();
                    tokio::spawn(async move {
                        if !app.refresh().await {
                            tracing::debug!("Refresh pass superseded");
                        }
                    });
                }
            }
        }
    }
}
