//! Client-side controller for an asynchronous media-download service:
//! submit a URL for analysis, start a download at a chosen quality, poll
//! for progress at a visibility-aware cadence, then hand off the finished
//! artifact. The presentation layer plugs in through
//! [`application::NotificationSink`].

pub mod api;
pub mod application;
pub mod domain;
pub mod utils;

pub use api::{RemoteService, RequestError, ServiceClient, ServiceConfig};
pub use application::{
    spawn_cleanup_cycle, ControllerConfig, DownloadController, NotificationSink, PollScheduler,
};
pub use domain::{DownloadMeta, ProgressSnapshot, Session, Stage, VideoInfo};
