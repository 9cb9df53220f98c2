//! Background refresh of access tokens nearing expiry.

use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use super::{ClientInner, PlintoClient};

/// Keeps the auto-refresh task alive. Dropping it stops the task.
#[derive(Debug)]
pub struct AutoRefreshHandle {
    task: JoinHandle<()>,
}

impl AutoRefreshHandle {
    pub fn stop(self) {
        // Drop aborts.
    }

    /// The task also ends on its own once every client clone is dropped.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for AutoRefreshHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

pub(crate) fn spawn(client: &PlintoClient) -> AutoRefreshHandle {
    let weak: Weak<ClientInner> = Arc::downgrade(&client.inner);
    // `interval` panics on a zero period.
    let period = client
        .inner
        .config
        .auto_refresh_interval
        .max(Duration::from_millis(1));
    let buffer = client.inner.config.refresh_buffer;

    let task = tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let Some(inner) = weak.upgrade() else {
                tracing::debug!("Client dropped, stopping auto refresh");
                break;
            };
            let client = PlintoClient { inner };
            match client.refresh_if_expiring(buffer).await {
                Ok(true) => tracing::debug!("Auto refresh renewed the access token"),
                Ok(false) => {}
                Err(err) => tracing::warn!(error = %err, "Auto refresh failed"),
            }
        }
    });

    tracing::debug!(
        interval_secs = period.as_secs(),
        buffer_secs = buffer.as_secs(),
        "Auto refresh started"
    );
    AutoRefreshHandle { task }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::auth::StorageKind;
    use crate::config::ClientConfig;
    use crate::PlintoClient;

    fn client(interval: Duration) -> PlintoClient {
        let config = ClientConfig::builder()
            .base_url("http://127.0.0.1:9")
            .storage(StorageKind::Memory)
            .auto_refresh_interval(interval)
            .build();
        PlintoClient::new(config).unwrap()
    }

    #[tokio::test]
    async fn stops_when_client_is_dropped() {
        let client = client(Duration::from_millis(10));
        let handle = client.start_auto_refresh();
        drop(client);

        tokio::time::timeout(Duration::from_secs(2), async {
            while !handle.is_finished() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("task should end after the client is dropped");
    }

    #[tokio::test]
    async fn idle_without_tokens() {
        let client = client(Duration::from_millis(5));
        let handle = client.start_auto_refresh();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(!handle.is_finished());
        assert!(client.access_token().is_none());
        handle.stop();
    }
}
