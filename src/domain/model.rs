/// Qualities offered when the service does not report any.
pub const FALLBACK_QUALITIES: [&str; 5] = ["144p", "360p", "480p", "720p", "1080p"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Analyzing,
    Analyzed,
    Starting,
    Downloading,
    Ready,
    Failed,
    Cancelled,
}

/// Metadata returned by URL analysis. Immutable once stored on a session;
/// a new analysis replaces it wholesale.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoInfo {
    pub title: String,
    pub platform: String,
    pub available_qualities: Vec<String>,
    pub thumbnail_url: Option<String>,
}

impl VideoInfo {
    /// Default selection is the last (highest) listed quality.
    pub fn default_quality(&self) -> Option<&str> {
        self.available_qualities.last().map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSnapshot {
    pub percentage: f64,
    pub status: String,
    pub eta_label: String,
    pub speed_label: String,
    pub downloaded_bytes: u64,
    pub total_bytes: u64,
}

impl Default for ProgressSnapshot {
    fn default() -> Self {
        Self {
            percentage: 0.0,
            status: "Downloading...".to_string(),
            eta_label: "Calculating...".to_string(),
            speed_label: "Calculating...".to_string(),
            downloaded_bytes: 0,
            total_bytes: 0,
        }
    }
}

/// A partial progress report as the service sends it. Absent size and label
/// fields keep their previous values when merged into a [`ProgressSnapshot`];
/// a missing percentage reads as zero and never implies completion.
#[derive(Debug, Clone, Default)]
pub struct ProgressUpdate {
    pub percentage: Option<f64>,
    pub status: Option<String>,
    pub eta_label: Option<String>,
    pub speed_label: Option<String>,
    pub downloaded_bytes: Option<u64>,
    pub total_bytes: Option<u64>,
}

impl ProgressSnapshot {
    pub fn merged(&self, update: &ProgressUpdate) -> Self {
        Self {
            percentage: update.percentage.unwrap_or(0.0).clamp(0.0, 100.0),
            status: update.status.clone().unwrap_or_else(|| self.status.clone()),
            eta_label: update
                .eta_label
                .clone()
                .unwrap_or_else(|| self.eta_label.clone()),
            speed_label: update
                .speed_label
                .clone()
                .unwrap_or_else(|| self.speed_label.clone()),
            downloaded_bytes: update.downloaded_bytes.unwrap_or(self.downloaded_bytes),
            total_bytes: update.total_bytes.unwrap_or(self.total_bytes),
        }
    }
}

/// The single unit of state the controller owns. At most one is live;
/// a new submission replaces the previous session wholesale.
#[derive(Debug, Clone)]
pub struct Session {
    pub url: String,
    pub id: Option<String>,
    pub video_info: Option<VideoInfo>,
    pub selected_quality: Option<String>,
    pub stage: Stage,
    pub last_progress: Option<ProgressSnapshot>,
    /// Consecutive poll ticks that failed at the transport level.
    pub transport_misses: u32,
}

impl Session {
    pub fn idle() -> Self {
        Self {
            url: String::new(),
            id: None,
            video_info: None,
            selected_quality: None,
            stage: Stage::Idle,
            last_progress: None,
            transport_misses: 0,
        }
    }

    pub fn analyzing(url: String) -> Self {
        Self {
            url,
            stage: Stage::Analyzing,
            ..Self::idle()
        }
    }

    pub fn apply_progress(&mut self, update: &ProgressUpdate) -> ProgressSnapshot {
        let merged = self
            .last_progress
            .clone()
            .unwrap_or_default()
            .merged(update);
        self.last_progress = Some(merged.clone());
        merged
    }
}

/// What the presentation layer gets when a download transitions to active.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadMeta {
    pub download_id: String,
    pub title: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_quality_is_last() {
        let info = VideoInfo {
            title: "t".to_string(),
            platform: "youtube".to_string(),
            available_qualities: vec!["360p".to_string(), "720p".to_string()],
            thumbnail_url: None,
        };
        assert_eq!(info.default_quality(), Some("720p"));
    }

    #[test]
    fn test_percentage_clamped_and_defaulted() {
        let mut session = Session::idle();
        let snap = session.apply_progress(&ProgressUpdate {
            percentage: Some(150.0),
            ..Default::default()
        });
        assert_eq!(snap.percentage, 100.0);

        // A missing percentage reads as zero, not as "still at 100".
        let snap = session.apply_progress(&ProgressUpdate::default());
        assert_eq!(snap.percentage, 0.0);
    }

    #[test]
    fn test_missing_sizes_keep_previous_values() {
        let mut session = Session::idle();
        session.apply_progress(&ProgressUpdate {
            percentage: Some(40.0),
            downloaded_bytes: Some(4_000_000),
            total_bytes: Some(10_000_000),
            ..Default::default()
        });
        let snap = session.apply_progress(&ProgressUpdate {
            percentage: Some(50.0),
            ..Default::default()
        });
        assert_eq!(snap.downloaded_bytes, 4_000_000);
        assert_eq!(snap.total_bytes, 10_000_000);
    }

    #[test]
    fn test_labels_fall_back_to_previous() {
        let mut session = Session::idle();
        session.apply_progress(&ProgressUpdate {
            status: Some("Downloading... 10%".to_string()),
            speed_label: Some("2.1 MB/s".to_string()),
            ..Default::default()
        });
        let snap = session.apply_progress(&ProgressUpdate::default());
        assert_eq!(snap.status, "Downloading... 10%");
        assert_eq!(snap.speed_label, "2.1 MB/s");
    }
}
