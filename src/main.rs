use std::env;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use video_downloader::domain::{DownloadMeta, ProgressSnapshot, Stage, VideoInfo};
use video_downloader::utils::format_file_size;
use video_downloader::{
    spawn_cleanup_cycle, ControllerConfig, DownloadController, NotificationSink, ServiceClient,
    ServiceConfig,
};

/// Console stand-in for the presentation layer.
struct ConsoleSink;

impl NotificationSink for ConsoleSink {
    fn on_analysis_started(&self) {
        println!("Analyzing...");
    }

    fn on_analysis_result(&self, info: &VideoInfo) {
        println!("{} [{}]", info.title, info.platform);
        println!("qualities: {}", info.available_qualities.join(", "));
    }

    fn on_analysis_error(&self, message: &str) {
        eprintln!("analysis failed: {message}");
    }

    fn on_download_started(&self, meta: &DownloadMeta) {
        println!("download {} started: {}", meta.download_id, meta.title);
    }

    fn on_progress(&self, snapshot: &ProgressSnapshot) {
        println!(
            "{:5.1}%  {} / {}  {}  ETA {}",
            snapshot.percentage,
            format_file_size(snapshot.downloaded_bytes),
            format_file_size(snapshot.total_bytes),
            snapshot.speed_label,
            snapshot.eta_label
        );
    }

    fn on_download_ready(&self) {
        println!("Download Ready!");
    }

    fn on_download_error(&self, message: &str) {
        eprintln!("download failed: {message}");
    }

    fn on_download_cancelled(&self) {
        println!("Download cancelled");
    }
}

async fn wait_for_terminal(controller: &DownloadController<ServiceClient, ConsoleSink>) -> Stage {
    loop {
        let stage = controller.stage();
        match stage {
            Stage::Ready | Stage::Failed | Stage::Cancelled | Stage::Idle => return stage,
            _ => tokio::time::sleep(Duration::from_millis(250)).await,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = env::args().skip(1);
    let Some(url) = args.next() else {
        eprintln!("usage: video-downloader <url> [quality]");
        return ExitCode::FAILURE;
    };
    let quality = args.next();

    let base_url =
        env::var("VIDEO_DL_BASE_URL").unwrap_or_else(|_| ServiceConfig::default().base_url);
    let client = Arc::new(ServiceClient::new(ServiceConfig { base_url }));
    let cleanup = spawn_cleanup_cycle(Arc::clone(&client));

    let controller = DownloadController::new(client, ConsoleSink, ControllerConfig::default());

    controller.submit(&url).await;
    if controller.stage() != Stage::Analyzed {
        cleanup.abort();
        return ExitCode::FAILURE;
    }
    if let Some(quality) = quality {
        controller.select_quality(&quality);
    }

    controller.start_download().await;
    if controller.stage() != Stage::Downloading {
        cleanup.abort();
        return ExitCode::FAILURE;
    }

    let outcome = tokio::select! {
        stage = wait_for_terminal(&controller) => stage,
        _ = tokio::signal::ctrl_c() => {
            controller.cancel();
            cleanup.abort();
            return ExitCode::SUCCESS;
        }
    };
    cleanup.abort();

    match outcome {
        Stage::Ready => {
            if let Some(artifact) = controller.retrieve_file() {
                println!("fetch your file at {artifact}");
            }
            ExitCode::SUCCESS
        }
        _ => ExitCode::FAILURE,
    }
}
