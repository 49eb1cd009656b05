use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, warn};

use crate::api::RemoteService;

/// Cadence of the housekeeping ping to the service.
pub const CLEANUP_PERIOD: Duration = Duration::from_secs(5 * 60);

/// Spawns the session-agnostic cleanup cycle: a fire-and-forget ping every
/// five minutes. Failures are logged and never surfaced; the returned handle
/// only exists so the host can abort the loop on shutdown.
pub fn spawn_cleanup_cycle<C: RemoteService>(client: Arc<C>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = interval_at(Instant::now() + CLEANUP_PERIOD, CLEANUP_PERIOD);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            timer.tick().await;
            match client.signal_cleanup().await {
                Ok(()) => debug!("cleanup ping sent"),
                Err(err) => warn!(error = %err, "cleanup ping failed"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ProgressResponse, RequestError};
    use crate::domain::VideoInfo;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FlakyCleanupService {
        pings: AtomicUsize,
    }

    #[async_trait]
    impl RemoteService for FlakyCleanupService {
        async fn analyze(&self, _url: &str) -> crate::api::Result<VideoInfo> {
            unreachable!("cleanup cycle never analyzes")
        }

        async fn start_download(
            &self,
            _url: &str,
            _platform: &str,
            _quality: &str,
        ) -> crate::api::Result<String> {
            unreachable!("cleanup cycle never starts downloads")
        }

        async fn get_progress(&self, _download_id: &str) -> crate::api::Result<ProgressResponse> {
            unreachable!("cleanup cycle never polls")
        }

        async fn signal_cleanup(&self) -> crate::api::Result<()> {
            // Fail every other ping; the loop must keep going regardless.
            if self.pings.fetch_add(1, Ordering::SeqCst) % 2 == 0 {
                Err(RequestError::RemoteRejected("busy".to_string()))
            } else {
                Ok(())
            }
        }

        fn artifact_url(&self, download_id: &str) -> String {
            format!("http://test/download/{download_id}")
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_pings_on_cadence_and_survives_failure() {
        let service = Arc::new(FlakyCleanupService {
            pings: AtomicUsize::new(0),
        });
        let handle = spawn_cleanup_cycle(service.clone());

        tokio::time::sleep(CLEANUP_PERIOD * 3 + Duration::from_secs(1)).await;
        assert_eq!(service.pings.load(Ordering::SeqCst), 3);

        handle.abort();
    }
}
