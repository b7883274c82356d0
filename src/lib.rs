//! Desktop front-end and usage recipes for yt-dlp.

// Last-used settings persisted between runs
pub mod config;
// yt-dlp invocation (metadata and downloads)
pub mod downloader;
// Error types
pub mod error;
// yt-dlp metadata records
pub mod info;
// On-screen log
pub mod log_pane;
// Form state and format selection
pub mod model;
// The options record passed to yt-dlp
pub mod options;
// Progress events and parsing
pub mod progress;
// UI state driven by worker events
pub mod session;
// Thumbnail fetching module
pub mod thumbnail;
// Background jobs
pub mod worker;

pub use downloader::{MediaBackend, YtDlp};
pub use error::AppError;
pub use options::DownloadOptions;
pub use progress::ProgressEvent;

/// Installs the fmt subscriber; `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("ytdlp_gui=info"));
    // a second call (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .try_init();
}
