use serde::{Deserialize, Serialize};

use crate::domain::{ProgressUpdate, VideoInfo, FALLBACK_QUALITIES};

/// Request body for the /get_info endpoint
#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeRequest<'a> {
    pub url: &'a str,
}

/// Response from the /get_info endpoint
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnalyzeResponse {
    pub success: bool,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub qualities: Option<Vec<String>>,
    #[serde(default)]
    pub error: Option<String>,
}

impl AnalyzeResponse {
    pub fn into_video_info(self) -> VideoInfo {
        let qualities = match self.qualities {
            Some(list) if !list.is_empty() => list,
            _ => FALLBACK_QUALITIES.iter().map(|q| q.to_string()).collect(),
        };
        VideoInfo {
            title: self.title.unwrap_or_else(|| "Untitled Video".to_string()),
            platform: self.platform.unwrap_or_else(|| "unknown".to_string()),
            available_qualities: qualities,
            thumbnail_url: self.thumbnail.filter(|t| !t.is_empty()),
        }
    }
}

/// Request body for the /start_download endpoint
#[derive(Debug, Clone, Serialize)]
pub struct StartDownloadRequest<'a> {
    pub url: &'a str,
    pub platform: &'a str,
    pub quality: &'a str,
}

/// Response from the /start_download endpoint
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StartDownloadResponse {
    pub success: bool,
    #[serde(default)]
    pub download_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Response from the /progress/{id} endpoint. Every field is optional;
/// completion is signalled only by an explicit `completed: true`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProgressResponse {
    #[serde(default)]
    pub percentage: Option<f64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub estimated_time: Option<String>,
    #[serde(default)]
    pub speed: Option<String>,
    #[serde(default)]
    pub file_size: Option<u64>,
    #[serde(default)]
    pub downloaded_size: Option<u64>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub error: Option<String>,
}

impl ProgressResponse {
    pub fn as_update(&self) -> ProgressUpdate {
        ProgressUpdate {
            percentage: self.percentage,
            status: self.status.clone(),
            eta_label: self.estimated_time.clone(),
            speed_label: self.speed.clone(),
            downloaded_bytes: self.downloaded_size,
            total_bytes: self.file_size,
        }
    }
}

/// Configuration for the service client
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub base_url: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_qualities_fall_back() {
        let response = AnalyzeResponse {
            success: true,
            title: None,
            platform: Some("tiktok".to_string()),
            thumbnail: Some(String::new()),
            qualities: None,
            error: None,
        };
        let info = response.into_video_info();
        assert_eq!(info.title, "Untitled Video");
        assert_eq!(info.available_qualities, FALLBACK_QUALITIES);
        assert_eq!(info.thumbnail_url, None);
    }

    #[test]
    fn test_empty_quality_list_falls_back() {
        let response = AnalyzeResponse {
            success: true,
            title: Some("clip".to_string()),
            platform: Some("youtube".to_string()),
            thumbnail: None,
            qualities: Some(vec![]),
            error: None,
        };
        assert_eq!(
            response.into_video_info().available_qualities,
            FALLBACK_QUALITIES
        );
    }

    #[test]
    fn test_progress_deserializes_sparse_body() {
        let response: ProgressResponse = serde_json::from_str(r#"{"completed": true}"#).unwrap();
        assert!(response.completed);
        assert_eq!(response.percentage, None);
        assert_eq!(response.error, None);
    }
}
