use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use url::Url;

use super::models::{
    AnalyzeRequest, AnalyzeResponse, ProgressResponse, ServiceConfig, StartDownloadRequest,
    StartDownloadResponse,
};
use crate::domain::VideoInfo;

#[derive(Error, Debug)]
pub enum RequestError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    RemoteRejected(String),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, RequestError>;

/// The backend boundary the controller drives. One request per call, no
/// retries; retry policy belongs to the caller.
#[async_trait]
pub trait RemoteService: Send + Sync + 'static {
    async fn analyze(&self, url: &str) -> Result<VideoInfo>;

    async fn start_download(&self, url: &str, platform: &str, quality: &str) -> Result<String>;

    /// Read-only on the server side; safe to call repeatedly.
    async fn get_progress(&self, download_id: &str) -> Result<ProgressResponse>;

    /// Best-effort housekeeping ping.
    async fn signal_cleanup(&self) -> Result<()>;

    /// URL of the finished artifact; opening it is the host's job.
    fn artifact_url(&self, download_id: &str) -> String;
}

#[derive(Clone)]
pub struct ServiceClient {
    config: ServiceConfig,
    http: Client,
}

impl ServiceClient {
    pub fn new(config: ServiceConfig) -> Self {
        Self {
            config,
            http: Client::new(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl RemoteService for ServiceClient {
    async fn analyze(&self, url: &str) -> Result<VideoInfo> {
        Url::parse(url).map_err(|_| RequestError::InvalidInput("not a valid URL".to_string()))?;

        let response: AnalyzeResponse = self
            .http
            .post(self.endpoint("get_info"))
            .json(&AnalyzeRequest { url })
            .send()
            .await?
            .json()
            .await?;

        if !response.success {
            return Err(RequestError::RemoteRejected(
                response
                    .error
                    .unwrap_or_else(|| "Failed to analyze video".to_string()),
            ));
        }

        Ok(response.into_video_info())
    }

    async fn start_download(&self, url: &str, platform: &str, quality: &str) -> Result<String> {
        let response: StartDownloadResponse = self
            .http
            .post(self.endpoint("start_download"))
            .json(&StartDownloadRequest {
                url,
                platform,
                quality,
            })
            .send()
            .await?
            .json()
            .await?;

        if !response.success {
            return Err(RequestError::RemoteRejected(
                response
                    .error
                    .unwrap_or_else(|| "Failed to start download".to_string()),
            ));
        }

        response.download_id.ok_or_else(|| {
            RequestError::RemoteRejected("service reported success without a download id".to_string())
        })
    }

    async fn get_progress(&self, download_id: &str) -> Result<ProgressResponse> {
        // The body is read regardless of HTTP status: a 404 still carries a
        // JSON `error` field naming the missing download.
        let response = self
            .http
            .get(self.endpoint(&format!("progress/{}", download_id)))
            .send()
            .await?
            .json()
            .await?;
        Ok(response)
    }

    async fn signal_cleanup(&self) -> Result<()> {
        self.http
            .post(self.endpoint("cleanup"))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    fn artifact_url(&self, download_id: &str) -> String {
        self.endpoint(&format!("download/{}", download_id))
    }
}
