//! Background jobs started by the window. Jobs never touch UI state; they
//! report everything through a [`WorkerEvent`] channel.

use std::{fmt, sync::Arc};

use eframe::egui::ColorImage;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::{
    downloader::MediaBackend,
    error::AppError,
    info::VideoInfo,
    options::DownloadOptions,
    progress::ProgressEvent,
    thumbnail,
};

/// Identifies one download started by the user
pub type JobId = u64;

/// Messages from background jobs to the UI thread.
pub enum WorkerEvent {
    Progress {
        job: JobId,
        event: ProgressEvent,
    },
    DownloadFinished {
        job: JobId,
        result: Result<(), AppError>,
    },
    InfoFetched {
        url: String,
        result: Result<VideoInfo, AppError>,
    },
    ThumbnailFetched {
        url: String,
        image: ColorImage,
    },
}

impl fmt::Debug for WorkerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerEvent::Progress { job, event } => f
                .debug_struct("Progress")
                .field("job", job)
                .field("event", event)
                .finish(),
            WorkerEvent::DownloadFinished { job, result } => f
                .debug_struct("DownloadFinished")
                .field("job", job)
                .field("result", result)
                .finish(),
            WorkerEvent::InfoFetched { url, result } => f
                .debug_struct("InfoFetched")
                .field("url", url)
                .field("ok", &result.is_ok())
                .finish(),
            WorkerEvent::ThumbnailFetched { url, image } => f
                .debug_struct("ThumbnailFetched")
                .field("url", url)
                .field("size", &image.size)
                .finish(),
        }
    }
}

/// Runs one download and reports its progress and outcome.
pub async fn run_download(
    backend: Arc<dyn MediaBackend>,
    job: JobId,
    urls: Vec<String>,
    options: DownloadOptions,
    cancel: CancellationToken,
    tx: UnboundedSender<WorkerEvent>,
) {
    let progress_tx = tx.clone();
    let options = options.add_hook(move |event| {
        let _ = progress_tx.send(WorkerEvent::Progress {
            job,
            event: event.clone(),
        });
    });

    info!(job, ?urls, "download job started");
    let result = backend.download(&urls, &options, cancel).await;
    match &result {
        Ok(()) => info!(job, "download job finished"),
        Err(e) => warn!(job, error = %e, "download job failed"),
    }
    let _ = tx.send(WorkerEvent::DownloadFinished { job, result });
}

/// Fetches metadata for `url` and reports it.
pub async fn run_info(
    backend: Arc<dyn MediaBackend>,
    url: String,
    tx: UnboundedSender<WorkerEvent>,
) {
    let options = DownloadOptions::new().quiet();
    let result = backend.extract_info(&url, &options).await;
    if let Err(e) = &result {
        warn!(%url, error = %e, "info fetch failed");
    }
    let _ = tx.send(WorkerEvent::InfoFetched { url, result });
}

/// Fetches a preview image. Failures are silent; the preview is optional.
pub fn run_thumbnail(url: String, tx: UnboundedSender<WorkerEvent>) {
    if let Some(image) = thumbnail::fetch_thumbnail(&url) {
        let _ = tx.send(WorkerEvent::ThumbnailFetched { url, image });
    }
}
