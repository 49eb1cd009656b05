use crate::domain::{DownloadMeta, ProgressSnapshot, VideoInfo};

/// The boundary to the presentation layer. The controller makes exactly one
/// call per state transition; implementations render, the controller never
/// waits on them.
pub trait NotificationSink: Send + Sync + 'static {
    fn on_analysis_started(&self);
    fn on_analysis_result(&self, info: &VideoInfo);
    fn on_analysis_error(&self, message: &str);

    fn on_download_started(&self, meta: &DownloadMeta);
    fn on_progress(&self, snapshot: &ProgressSnapshot);
    fn on_download_ready(&self);
    fn on_download_error(&self, message: &str);
    fn on_download_cancelled(&self);
}
