use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures::FutureExt;
use tracing::{debug, warn};

use crate::api::{RemoteService, RequestError};
use crate::application::poll_scheduler::{PollCallback, PollScheduler};
use crate::application::sink::NotificationSink;
use crate::domain::{DownloadMeta, ProgressSnapshot, Session, Stage, VideoInfo};

#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub active_poll_interval: Duration,
    pub background_poll_interval: Duration,
    /// Consecutive poll-tick transport failures tolerated before the
    /// download is declared failed.
    pub transport_failure_threshold: u32,
    /// How long a finished session lingers after `retrieve_file` before
    /// resetting, so the host can show confirmation.
    pub reset_grace: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            active_poll_interval: Duration::from_millis(1000),
            background_poll_interval: Duration::from_millis(5000),
            transport_failure_threshold: 3,
            reset_grace: Duration::from_secs(2),
        }
    }
}

struct ControllerInner<C, N> {
    client: Arc<C>,
    sink: N,
    config: ControllerConfig,
    session: Mutex<Session>,
    /// Bumped whenever the session is superseded; a response captured under
    /// an older epoch is dropped instead of applied.
    epoch: AtomicU64,
    scheduler: PollScheduler,
}

/// The download lifecycle state machine. Owns the single [`Session`], the
/// poll scheduler and the stale-response epoch; reports every transition
/// through the [`NotificationSink`].
pub struct DownloadController<C, N> {
    inner: Arc<ControllerInner<C, N>>,
}

impl<C, N> Clone for DownloadController<C, N> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: RemoteService, N: NotificationSink> ControllerInner<C, N> {
    fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().expect("session mutex poisoned")
    }

    fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    fn bump_epoch(&self) -> u64 {
        self.epoch.fetch_add(1, Ordering::SeqCst) + 1
    }

    async fn poll_once(self: Arc<Self>, download_id: String, token: u64) {
        if self.epoch() != token {
            return;
        }
        let result = self.client.get_progress(&download_id).await;

        let mut session = self.session();
        if self.epoch() != token
            || session.stage != Stage::Downloading
            || session.id.as_deref() != Some(download_id.as_str())
        {
            debug!("discarding stale progress response");
            return;
        }

        match result {
            Ok(progress) => {
                session.transport_misses = 0;
                if let Some(message) = progress.error.clone() {
                    session.stage = Stage::Failed;
                    drop(session);
                    self.scheduler.stop();
                    self.sink.on_download_error(&message);
                } else if progress.completed {
                    session.stage = Stage::Ready;
                    drop(session);
                    self.scheduler.stop();
                    self.sink.on_download_ready();
                } else {
                    let snapshot = session.apply_progress(&progress.as_update());
                    drop(session);
                    self.sink.on_progress(&snapshot);
                }
            }
            Err(err) => {
                session.transport_misses += 1;
                let misses = session.transport_misses;
                if misses >= self.config.transport_failure_threshold {
                    session.stage = Stage::Failed;
                    drop(session);
                    self.scheduler.stop();
                    self.sink
                        .on_download_error("lost contact with the download service");
                } else {
                    drop(session);
                    warn!(error = %err, misses, "progress poll failed, will retry");
                }
            }
        }
    }
}

impl<C: RemoteService, N: NotificationSink> DownloadController<C, N> {
    pub fn new(client: Arc<C>, sink: N, config: ControllerConfig) -> Self {
        Self {
            inner: Arc::new(ControllerInner {
                client,
                sink,
                config,
                session: Mutex::new(Session::idle()),
                epoch: AtomicU64::new(0),
                scheduler: PollScheduler::new(),
            }),
        }
    }

    /// Submit a URL for analysis. Supersedes any session already in flight:
    /// the poll campaign stops and late responses to earlier requests are
    /// discarded.
    pub async fn submit(&self, url: &str) {
        let url = url.trim().to_string();
        if url.is_empty() {
            self.inner
                .sink
                .on_analysis_error(&invalid_input("please enter a video URL"));
            return;
        }

        self.inner.scheduler.stop();
        let token = self.inner.bump_epoch();
        *self.inner.session() = Session::analyzing(url.clone());
        self.inner.sink.on_analysis_started();

        let result = self.inner.client.analyze(&url).await;

        let mut session = self.inner.session();
        if self.inner.epoch() != token {
            debug!("discarding stale analyze response");
            return;
        }
        match result {
            Ok(info) => {
                session.selected_quality = info.default_quality().map(str::to_string);
                session.video_info = Some(info.clone());
                session.stage = Stage::Analyzed;
                drop(session);
                self.inner.sink.on_analysis_result(&info);
            }
            Err(err) => {
                session.stage = Stage::Idle;
                drop(session);
                self.inner.sink.on_analysis_error(&err.to_string());
            }
        }
    }

    /// Pick one of the qualities reported by analysis. Anything else is
    /// rejected with a single notification and no state change.
    pub fn select_quality(&self, quality: &str) {
        let mut session = self.inner.session();
        let available = session.stage == Stage::Analyzed
            && session
                .video_info
                .as_ref()
                .map(|info| info.available_qualities.iter().any(|q| q == quality))
                .unwrap_or(false);
        if !available {
            drop(session);
            self.inner
                .sink
                .on_download_error(&invalid_input("quality not available for this video"));
            return;
        }
        session.selected_quality = Some(quality.to_string());
    }

    /// Start downloading the analyzed video at the selected quality.
    pub async fn start_download(&self) {
        let token = self.inner.epoch();
        let (url, platform, quality) = {
            let mut session = self.inner.session();
            if session.stage != Stage::Analyzed {
                drop(session);
                self.inner
                    .sink
                    .on_download_error("no video information available");
                return;
            }
            let platform = match session.video_info.as_ref() {
                Some(info) => info.platform.clone(),
                None => {
                    drop(session);
                    self.inner
                        .sink
                        .on_download_error("no video information available");
                    return;
                }
            };
            let quality = match session.selected_quality.clone() {
                Some(quality) => quality,
                None => {
                    drop(session);
                    self.inner
                        .sink
                        .on_download_error(&invalid_input("please select a quality"));
                    return;
                }
            };
            session.stage = Stage::Starting;
            (session.url.clone(), platform, quality)
        };

        let result = self
            .inner
            .client
            .start_download(&url, &platform, &quality)
            .await;

        let mut session = self.inner.session();
        if self.inner.epoch() != token || session.stage != Stage::Starting {
            debug!("discarding stale start_download response");
            return;
        }
        match result {
            Ok(download_id) => {
                session.id = Some(download_id.clone());
                session.stage = Stage::Downloading;
                session.transport_misses = 0;
                let title = session
                    .video_info
                    .as_ref()
                    .map(|info| info.title.clone())
                    .unwrap_or_default();
                drop(session);
                self.inner.sink.on_download_started(&DownloadMeta {
                    download_id: download_id.clone(),
                    title,
                });
                self.start_polling(download_id, token);
            }
            Err(err) => {
                session.stage = Stage::Analyzed;
                drop(session);
                self.inner.sink.on_download_error(&err.to_string());
            }
        }
    }

    fn start_polling(&self, download_id: String, token: u64) {
        let inner = Arc::clone(&self.inner);
        let callback: PollCallback = Arc::new(move || {
            let inner = Arc::clone(&inner);
            let download_id = download_id.clone();
            inner.poll_once(download_id, token).boxed()
        });
        self.inner.scheduler.start(
            callback,
            self.inner.config.active_poll_interval,
            self.inner.config.background_poll_interval,
        );
    }

    /// User-initiated cancel. Stops polling, notifies once, then resets to
    /// idle. No-op when there is nothing to cancel.
    pub fn cancel(&self) {
        self.inner.scheduler.stop();
        {
            let mut session = self.inner.session();
            if session.stage == Stage::Idle {
                return;
            }
            self.inner.bump_epoch();
            session.stage = Stage::Cancelled;
        }
        self.inner.sink.on_download_cancelled();
        *self.inner.session() = Session::idle();
    }

    /// Hand off the finished artifact. Returns its retrieval URL and
    /// schedules a reset to idle after the grace delay; a new submission
    /// during the delay wins over the reset.
    pub fn retrieve_file(&self) -> Option<String> {
        let download_id = {
            let session = self.inner.session();
            if session.stage != Stage::Ready {
                return None;
            }
            session.id.clone()?
        };
        let url = self.inner.client.artifact_url(&download_id);

        let token = self.inner.epoch();
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            tokio::time::sleep(inner.config.reset_grace).await;
            let mut session = inner.session();
            if inner.epoch() == token && session.stage == Stage::Ready {
                inner.bump_epoch();
                *session = Session::idle();
            }
        });

        Some(url)
    }

    /// Discard the current session unconditionally.
    pub fn reset(&self) {
        self.inner.scheduler.stop();
        self.inner.bump_epoch();
        *self.inner.session() = Session::idle();
    }

    /// Retarget the poll cadence when the page is hidden or shown again.
    /// Polling never stops on backgrounding, it only slows down.
    pub fn on_visibility_change(&self, hidden: bool) {
        self.inner.scheduler.on_visibility_change(hidden);
    }

    pub fn stage(&self) -> Stage {
        self.inner.session().stage
    }

    pub fn video_info(&self) -> Option<VideoInfo> {
        self.inner.session().video_info.clone()
    }

    pub fn selected_quality(&self) -> Option<String> {
        self.inner.session().selected_quality.clone()
    }

    pub fn last_progress(&self) -> Option<ProgressSnapshot> {
        self.inner.session().last_progress.clone()
    }
}

fn invalid_input(message: &str) -> String {
    RequestError::InvalidInput(message.to_string()).to_string()
}
