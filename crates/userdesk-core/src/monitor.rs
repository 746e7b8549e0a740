//! Connection monitor
//!
//! Periodically probes backend reachability so views can show a live
//! indicator independent of their data fetches. Also checked on demand
//! after a failed fetch, which is what powers the manual retry hint.

use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::client::ApiClient;
use crate::models::ConnectionStatus;

/// How often the background watcher probes the backend
pub const PROBE_INTERVAL: Duration = Duration::from_secs(60);

/// Reachability monitor over the API client's probe endpoint
#[derive(Clone)]
pub struct ConnectionMonitor {
    client: ApiClient,
    interval: Duration,
}

impl ConnectionMonitor {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            interval: PROBE_INTERVAL,
        }
    }

    /// Override the probe interval (tests use short intervals)
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// One-shot reachability check. Any reachable response counts as
    /// connected; any transport failure as failed.
    pub async fn check(&self) -> ConnectionStatus {
        self.client.probe().await
    }

    /// Spawn a background loop that publishes the status on a watch
    /// channel at the configured interval. Receivers see `Checking`
    /// until the first probe completes.
    pub fn watch(self) -> (watch::Receiver<ConnectionStatus>, JoinHandle<()>) {
        let (tx, rx) = watch::channel(ConnectionStatus::Checking);

        let handle = tokio::spawn(async move {
            loop {
                let status = self.check().await;
                if tx.send(status).is_err() {
                    // Nobody is listening anymore
                    return;
                }
                log::debug!("connection probe: {}", status);
                tokio::time::sleep(self.interval).await;
            }
        });

        (rx, handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionStore;
    use httpmock::prelude::*;
    use httpmock::Method::HEAD;

    fn client_for(server: &MockServer) -> ApiClient {
        let session = SessionStore::at(
            tempfile::tempdir().unwrap().path().join("session.json"),
        );
        ApiClient::new(&server.base_url(), session).unwrap()
    }

    #[tokio::test]
    async fn test_check_reports_connected_when_backend_answers() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(HEAD).path("/api/users");
                then.status(200);
            })
            .await;

        let monitor = ConnectionMonitor::new(client_for(&server));

        assert_eq!(monitor.check().await, ConnectionStatus::Connected);
    }

    #[tokio::test]
    async fn test_check_reports_failed_when_unreachable() {
        // Nothing is listening on this port
        let session =
            SessionStore::at(tempfile::tempdir().unwrap().path().join("session.json"));
        let client = ApiClient::new("http://127.0.0.1:1", session).unwrap();
        let monitor = ConnectionMonitor::new(client);

        assert_eq!(monitor.check().await, ConnectionStatus::Failed);
    }

    #[tokio::test]
    async fn test_watch_publishes_status_updates() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(HEAD).path("/api/users");
                then.status(200);
            })
            .await;

        let monitor = ConnectionMonitor::new(client_for(&server))
            .with_interval(Duration::from_millis(10));
        let (mut rx, handle) = monitor.watch();

        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), ConnectionStatus::Connected);

        handle.abort();
    }
}
