pub mod model;

pub use model::{
    DownloadMeta, ProgressSnapshot, ProgressUpdate, Session, Stage, VideoInfo,
    FALLBACK_QUALITIES,
};
