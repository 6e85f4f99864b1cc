// Downloader module - retrieval backends, transcoder and fallback orchestration

pub mod backends;
pub mod errors;
pub mod extractors;
pub mod fetch;
pub mod models;
pub mod orchestrator;
pub mod tools;
pub mod traits;
pub mod transcoder;
pub mod utils;

pub use errors::DownloadError;
pub use models::{CookieSource, NetworkConfig, RetrievalOutcome, VideoInfo};
pub use orchestrator::Downloader;
pub use tools::{ToolInfo, ToolManager, ToolProbe, ToolType};
pub use traits::AudioStrategy;
pub use transcoder::{FfmpegTranscoder, Transcoder};
