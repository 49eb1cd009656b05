pub mod client;
pub mod models;

pub use client::{RemoteService, RequestError, Result, ServiceClient};
pub use models::{ProgressResponse, ServiceConfig};
