use std::path::PathBuf;
use thiserror::Error;

/// Failures from a call into yt-dlp.
#[derive(Error, Debug)]
pub enum AppError {
    /// yt-dlp ran and reported that the download or extraction failed
    #[error("{0}")]
    Download(String),
    #[error("yt-dlp executable not found: {path:?}")]
    BinaryNotFound { path: PathBuf },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid yt-dlp JSON output: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Download cancelled")]
    Cancelled,
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// True when yt-dlp itself reported the failure; everything else is
    /// shown to the user as an unexpected error.
    pub fn is_download_error(&self) -> bool {
        matches!(self, AppError::Download(_))
    }
}

/// Persisted settings could not be read or written.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Config serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("No config directory available on this platform")]
    NoConfigDir,
}

/// Form input rejected before a download starts.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum FormError {
    #[error("Enter a video URL")]
    EmptyUrl,
    #[error("The selected folder does not exist: {0}")]
    MissingFolder(String),
}
