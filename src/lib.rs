pub mod config;
pub mod downloader;
pub mod error;
pub mod fetch;
pub mod metadata;
pub mod pipeline;
pub mod planner;
pub mod progress;
pub mod template;
pub mod types;

pub use config::PipelineConfig;
pub use error::PipelineError;
pub use pipeline::{save_draft, spawn_save_draft};
pub use progress::ProgressSender;
pub use types::{ProgressEvent, RunResult};
