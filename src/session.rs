//! UI state driven by worker events: progress bar, status label, log pane and
//! which buttons are enabled. Kept free of egui so it can be exercised with
//! scripted events.

use tokio_util::sync::CancellationToken;

use crate::{
    log_pane::{LogLevel, LogPane},
    progress::{ProgressEvent, basename, status_line},
    worker::{JobId, WorkerEvent},
};

pub const STATUS_READY: &str = "Ready to download";
pub const STATUS_PREPARING: &str = "Preparing download...";
pub const STATUS_FINISHED: &str = "Finished";
pub const STATUS_STOPPED: &str = "Stopped";
pub const STATUS_DOWNLOAD_ERROR: &str = "Download error";
pub const STATUS_ERROR: &str = "Error";

struct ActiveJob {
    id: JobId,
    cancel: CancellationToken,
}

pub struct Session {
    /// Progress bar value, 0 to 100
    pub progress: f32,
    pub status: String,
    pub log: LogPane,
    active: Option<ActiveJob>,
    next_job: JobId,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            progress: 0.0,
            status: STATUS_READY.to_owned(),
            log: LogPane::new(),
            active: None,
            next_job: 1,
        }
    }
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_downloading(&self) -> bool {
        self.active.is_some()
    }

    pub fn can_start(&self) -> bool {
        self.active.is_none()
    }

    pub fn can_stop(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_job(&self) -> Option<JobId> {
        self.active.as_ref().map(|a| a.id)
    }

    pub fn log(&mut self, level: LogLevel, message: impl Into<String>) {
        self.log.push(level, message);
    }

    /// Marks a download as started. Returns `None` while one is already
    /// running.
    pub fn begin_download(&mut self, url: &str) -> Option<(JobId, CancellationToken)> {
        if self.active.is_some() {
            return None;
        }
        let id = self.next_job;
        self.next_job += 1;
        let cancel = CancellationToken::new();
        self.active = Some(ActiveJob {
            id,
            cancel: cancel.clone(),
        });
        self.progress = 0.0;
        self.status = STATUS_PREPARING.to_owned();
        self.log(LogLevel::Info, format!("Starting download: {url}"));
        Some((id, cancel))
    }

    /// Cancels the running download. Late events from it are ignored.
    pub fn stop(&mut self) {
        let Some(job) = self.active.take() else {
            return;
        };
        self.log(LogLevel::Warning, "Stopping download...");
        job.cancel.cancel();
        self.status = STATUS_STOPPED.to_owned();
        self.progress = 0.0;
    }

    pub fn begin_info(&mut self, url: &str) {
        self.log(LogLevel::Info, format!("Fetching video info: {url}"));
    }

    pub fn clear_log(&mut self) {
        self.log.clear();
    }

    fn is_active(&self, job: JobId) -> bool {
        self.active_job() == Some(job)
    }

    /// Applies one event from a background job.
    pub fn apply(&mut self, event: WorkerEvent) {
        match event {
            WorkerEvent::Progress { job, event } => {
                if self.is_active(job) {
                    self.apply_progress(&event);
                }
            }
            WorkerEvent::DownloadFinished { job, result } => {
                if !self.is_active(job) {
                    return;
                }
                match result {
                    Ok(()) => {
                        self.log(LogLevel::Success, "Download completed successfully!");
                        self.status = STATUS_READY.to_owned();
                    }
                    Err(e) if e.is_download_error() => {
                        self.log(LogLevel::Error, format!("Download error: {e}"));
                        self.status = STATUS_DOWNLOAD_ERROR.to_owned();
                    }
                    Err(e) => {
                        self.log(LogLevel::Error, format!("Unexpected error: {e}"));
                        self.status = STATUS_ERROR.to_owned();
                    }
                }
                self.active = None;
            }
            WorkerEvent::InfoFetched { result, .. } => match result {
                Ok(info) => self.log(
                    LogLevel::Info,
                    format!("Info received:\n{}", info.summary()),
                ),
                Err(e) => self.log(LogLevel::Error, format!("Failed to fetch info: {e}")),
            },
            // the window owns textures
            WorkerEvent::ThumbnailFetched { .. } => {}
        }
    }

    fn apply_progress(&mut self, event: &ProgressEvent) {
        match event {
            ProgressEvent::Downloading { .. } => {
                if let (Some(pct), Some(line)) = (event.percent(), status_line(event)) {
                    self.progress = pct;
                    self.status = line;
                }
            }
            ProgressEvent::Finished { filename } => {
                self.progress = 100.0;
                self.status = STATUS_FINISHED.to_owned();
                self.log(
                    LogLevel::Info,
                    format!("Download finished: {}", basename(filename)),
                );
            }
            ProgressEvent::Error { message } => {
                self.status = STATUS_DOWNLOAD_ERROR.to_owned();
                self.log(LogLevel::Error, format!("Download error: {message}"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    #[test]
    fn starts_idle() {
        let s = Session::new();
        assert!(s.can_start());
        assert!(!s.can_stop());
        assert_eq!(s.status, STATUS_READY);
        assert_eq!(s.progress, 0.0);
    }

    #[test]
    fn second_start_is_ignored() {
        let mut s = Session::new();
        assert!(s.begin_download("u").is_some());
        assert!(s.begin_download("u").is_none());
        assert_eq!(s.log.len(), 1);
    }

    #[test]
    fn stop_cancels_token_and_resets() {
        let mut s = Session::new();
        let (_, token) = s.begin_download("u").unwrap();
        s.progress = 40.0;
        s.stop();
        assert!(token.is_cancelled());
        assert!(s.can_start());
        assert_eq!(s.progress, 0.0);
        assert_eq!(s.status, STATUS_STOPPED);
        assert_eq!(s.log.last().unwrap().level, LogLevel::Warning);
    }

    #[test]
    fn stop_when_idle_does_nothing() {
        let mut s = Session::new();
        s.stop();
        assert!(s.log.is_empty());
        assert_eq!(s.status, STATUS_READY);
    }

    #[test]
    fn unexpected_error_is_reported_generically() {
        let mut s = Session::new();
        let (job, _) = s.begin_download("u").unwrap();
        s.apply(WorkerEvent::DownloadFinished {
            job,
            result: Err(AppError::BinaryNotFound { path: "yt-dlp".into() }),
        });
        assert_eq!(s.status, STATUS_ERROR);
        assert!(s.log.last().unwrap().message.starts_with("Unexpected error:"));
        assert!(s.can_start());
    }

    #[test]
    fn job_ids_increase() {
        let mut s = Session::new();
        let (a, _) = s.begin_download("u").unwrap();
        s.stop();
        let (b, _) = s.begin_download("u").unwrap();
        assert!(b > a);
        assert_eq!(s.active_job(), Some(b));
    }
}
