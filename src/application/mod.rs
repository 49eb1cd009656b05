pub mod cleanup;
pub mod controller;
pub mod poll_scheduler;
pub mod sink;

pub use cleanup::{spawn_cleanup_cycle, CLEANUP_PERIOD};
pub use controller::{ControllerConfig, DownloadController};
pub use poll_scheduler::{PollCallback, PollScheduler};
pub use sink::NotificationSink;
