//! Calls into yt-dlp: metadata extraction and downloads.

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    process::Stdio,
};

use async_trait::async_trait;
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, BufReader},
    process::{Child, Command},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    error::AppError,
    info::VideoInfo,
    options::DownloadOptions,
    progress::{PROGRESS_TEMPLATE, ProgressEvent, parse_error_line, parse_progress_line},
};

/// The two library entry points the app uses.
#[async_trait]
pub trait MediaBackend: Send + Sync {
    /// Fetches metadata without downloading.
    async fn extract_info(
        &self,
        url: &str,
        options: &DownloadOptions,
    ) -> Result<VideoInfo, AppError>;

    /// Downloads `urls`, reporting progress through the options' hooks.
    /// Returns [`AppError::Cancelled`] once `cancel` fires.
    async fn download(
        &self,
        urls: &[String],
        options: &DownloadOptions,
        cancel: CancellationToken,
    ) -> Result<(), AppError>;
}

/// Default executable name for this platform
pub fn default_binary() -> PathBuf {
    let bin = if cfg!(target_os = "windows") { "yt-dlp.exe" } else { "yt-dlp" };
    PathBuf::from(bin)
}

/// [`MediaBackend`] over the `yt-dlp` command line.
#[derive(Debug, Clone)]
pub struct YtDlp {
    binary: PathBuf,
    /// Where yt-dlp runs; relative output templates land here
    working_dir: Option<PathBuf>,
}

impl Default for YtDlp {
    fn default() -> Self {
        Self::new(None)
    }
}

impl YtDlp {
    /// Uses `binary` when set, otherwise `yt-dlp` from `PATH`. A relative
    /// path such as `./yt-dlp` is pinned to the current directory.
    pub fn new(binary: Option<PathBuf>) -> Self {
        Self {
            binary: binary.map(resolve_binary).unwrap_or_else(default_binary),
            working_dir: None,
        }
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    pub fn working_dir(&self) -> Option<&Path> {
        self.working_dir.as_deref()
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.binary);
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    fn spawn(&self, cmd: &mut Command) -> Result<Child, AppError> {
        cmd.spawn().map_err(|e| match e.kind() {
            ErrorKind::NotFound => AppError::BinaryNotFound {
                path: self.binary.clone(),
            },
            _ => AppError::Io(e),
        })
    }

    /// Output of `yt-dlp --version`.
    pub async fn version(&self) -> Result<String, AppError> {
        let mut cmd = self.command();
        cmd.arg("--version");
        let output = self.spawn(&mut cmd)?.wait_with_output().await?;
        if !output.status.success() {
            return Err(AppError::Other(format!(
                "yt-dlp --version exited with {}",
                output.status
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_owned())
    }
}

/// Bare names go through `PATH`; anything with a directory part is made
/// absolute so a working directory cannot change what it points at.
fn resolve_binary(binary: PathBuf) -> PathBuf {
    if binary.is_absolute() || binary.components().count() < 2 {
        return binary;
    }
    std::path::absolute(&binary).unwrap_or(binary)
}

/// Reads one line, replacing bytes that are not UTF-8. yt-dlp writes in the
/// console code page when its output is a pipe on some platforms.
async fn read_line_lossy<R>(
    reader: &mut R,
    buf: &mut Vec<u8>,
) -> std::io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    if reader.read_until(b'\n', buf).await? == 0 {
        return Ok(None);
    }
    let line = String::from_utf8_lossy(buf);
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_owned()))
}

/// Last `ERROR:` line in yt-dlp's stderr
fn last_error(stderr: &str) -> Option<String> {
    stderr.lines().rev().find_map(|line| match parse_error_line(line) {
        Some(ProgressEvent::Error { message }) => Some(message),
        _ => None,
    })
}

#[async_trait]
impl MediaBackend for YtDlp {
    async fn extract_info(
        &self,
        url: &str,
        options: &DownloadOptions,
    ) -> Result<VideoInfo, AppError> {
        let mut cmd = self.command();
        cmd.args(options.to_args()).arg("-J").arg("--").arg(url);
        debug!(binary = %self.binary.display(), url, "extracting info");

        let output = self.spawn(&mut cmd)?.wait_with_output().await?;
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            let message = last_error(&stderr)
                .unwrap_or_else(|| format!("yt-dlp exited with {}", output.status));
            warn!(url, %message, "info extraction failed");
            return Err(AppError::Download(message));
        }
        Ok(serde_json::from_slice(&output.stdout)?)
    }

    async fn download(
        &self,
        urls: &[String],
        options: &DownloadOptions,
        cancel: CancellationToken,
    ) -> Result<(), AppError> {
        let mut cmd = self.command();
        cmd.args(options.to_args())
            .arg("--newline")
            .arg("--progress")
            .arg("--progress-template")
            .arg(format!("download:{PROGRESS_TEMPLATE}"))
            .arg("--")
            .args(urls);
        info!(count = urls.len(), "starting yt-dlp download");

        let mut child = self.spawn(&mut cmd)?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| AppError::Other("Missing yt-dlp stdout".to_owned()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| AppError::Other("Missing yt-dlp stderr".to_owned()))?;

        // stderr carries ERROR: lines; report them as they happen
        let hooks = options.clone();
        let stderr_task = tokio::spawn(async move {
            let mut reader = BufReader::new(stderr);
            let mut buf = Vec::new();
            let mut last = None;
            while let Ok(Some(line)) = read_line_lossy(&mut reader, &mut buf).await {
                debug!("yt-dlp stderr> {}", line);
                if let Some(event) = parse_error_line(&line) {
                    hooks.notify(&event);
                    if let ProgressEvent::Error { message } = event {
                        last = Some(message);
                    }
                }
            }
            last
        });

        let pump = async {
            let mut reader = BufReader::new(stdout);
            let mut buf = Vec::new();
            while let Some(line) = read_line_lossy(&mut reader, &mut buf).await? {
                debug!("yt-dlp> {}", line);
                if let Some(event) = parse_progress_line(&line) {
                    options.notify(&event);
                }
            }
            Ok::<_, std::io::Error>(child.wait().await?)
        };

        let outcome = tokio::select! {
            status = pump => Some(status),
            () = cancel.cancelled() => None,
        };
        let Some(status) = outcome else {
            info!("download cancelled, killing yt-dlp");
            let _ = child.kill().await;
            stderr_task.abort();
            return Err(AppError::Cancelled);
        };
        let status = status?;

        let last = stderr_task.await.ok().flatten();
        if status.success() {
            info!("yt-dlp finished");
            return Ok(());
        }
        if options.ignore_errors {
            // failures were already delivered to the hooks
            warn!(%status, "yt-dlp reported errors, continuing");
            return Ok(());
        }
        Err(AppError::Download(
            last.unwrap_or_else(|| format!("yt-dlp exited with {status}")),
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{Arc, Mutex},
        time::Duration,
    };

    use super::*;

    /// Writes an executable shell script standing in for yt-dlp.
    #[cfg(unix)]
    fn fake_ytdlp(dir: &Path, body: &str) -> YtDlp {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("yt-dlp");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        YtDlp::new(Some(path))
    }

    type Seen = Arc<Mutex<Vec<ProgressEvent>>>;

    fn recording(options: DownloadOptions) -> (DownloadOptions, Seen) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let options = options.add_hook(move |event| sink.lock().unwrap().push(event.clone()));
        (options, seen)
    }

    #[test]
    fn picks_last_error_line() {
        let stderr = "WARNING: x\nERROR: first\n[info] y\nERROR: second failure\n";
        assert_eq!(last_error(stderr).as_deref(), Some("second failure"));
        assert_eq!(last_error("WARNING: only"), None);
    }

    #[test]
    fn binary_defaults_to_path_lookup() {
        assert_eq!(YtDlp::default().binary(), default_binary().as_path());
        let custom = YtDlp::new(Some(PathBuf::from("/opt/bin/yt-dlp")));
        assert_eq!(custom.binary(), Path::new("/opt/bin/yt-dlp"));
    }

    #[tokio::test]
    async fn missing_binary_is_reported() {
        let backend = YtDlp::new(Some(PathBuf::from("/definitely/not/here/yt-dlp")));
        let err = backend
            .extract_info("https://example.com", &DownloadOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BinaryNotFound { .. }));
    }

    #[test]
    fn relative_binary_is_pinned_to_current_dir() {
        let relative = YtDlp::new(Some(PathBuf::from("./bin/yt-dlp")));
        assert!(relative.binary().is_absolute());
        assert!(relative.binary().ends_with("bin/yt-dlp"));

        let bare = YtDlp::new(Some(PathBuf::from("yt-dlp")));
        assert_eq!(bare.binary(), Path::new("yt-dlp"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn stdout_template_lines_reach_hooks_despite_bad_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let backend = fake_ytdlp(
            dir.path(),
            r"printf '[download] Destination: caf\351.mp4\n'
printf 'ytdlp-gui|downloading|512|1024|NA|2048.0|1|/tmp/caf\351.mp4\n'
echo 'ytdlp-gui|finished|1024|1024|NA|NA|NA|/tmp/clip.mp4'",
        );
        let (options, seen) = recording(DownloadOptions::new());

        backend
            .download(&["u".into()], &options, CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                ProgressEvent::Downloading {
                    downloaded_bytes: 512,
                    total_bytes: Some(1024),
                    total_bytes_estimate: None,
                    speed: Some(2048.0),
                    eta: Some(1),
                    filename: "/tmp/caf\u{FFFD}.mp4".into(),
                },
                ProgressEvent::Finished {
                    filename: "/tmp/clip.mp4".into()
                },
            ]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failed_exit_reports_last_stderr_error() {
        let dir = tempfile::tempdir().unwrap();
        let backend = fake_ytdlp(
            dir.path(),
            r"printf 'ERROR: caf\351 is unavailable\n' >&2
echo 'ERROR: HTTP Error 403: Forbidden' >&2
exit 1",
        );
        let (options, seen) = recording(DownloadOptions::new());

        let err = backend
            .download(&["u".into()], &options, CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Download(ref m) if m == "HTTP Error 403: Forbidden"));
        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                ProgressEvent::Error {
                    message: "caf\u{FFFD} is unavailable".into()
                },
                ProgressEvent::Error {
                    message: "HTTP Error 403: Forbidden".into()
                },
            ]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn ignore_errors_turns_failed_exit_into_ok() {
        let dir = tempfile::tempdir().unwrap();
        let backend = fake_ytdlp(dir.path(), "echo 'ERROR: Unsupported URL' >&2\nexit 1");
        let mut options = DownloadOptions::new();
        options.ignore_errors = true;
        let (options, seen) = recording(options);

        backend
            .download(&["u".into()], &options, CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn cancel_kills_running_download() {
        let dir = tempfile::tempdir().unwrap();
        let backend = fake_ytdlp(
            dir.path(),
            "echo 'ytdlp-gui|downloading|1|10|NA|NA|NA|clip.mp4'\nexec sleep 30",
        );
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let options = DownloadOptions::new().add_hook(move |event| {
            let _ = tx.send(event.clone());
        });
        let cancel = CancellationToken::new();

        let download = {
            let cancel = cancel.clone();
            async move { backend.download(&["u".into()], &options, cancel).await }
        };
        let waiter = async {
            rx.recv().await.unwrap();
            cancel.cancel();
        };
        let (result, ()) = tokio::time::timeout(Duration::from_secs(10), async {
            tokio::join!(download, waiter)
        })
        .await
        .expect("download should stop once cancelled");

        assert!(matches!(result, Err(AppError::Cancelled)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn runs_inside_working_dir() {
        let bin_dir = tempfile::tempdir().unwrap();
        let out_dir = tempfile::tempdir().unwrap();
        let backend =
            fake_ytdlp(bin_dir.path(), "touch ran-here").with_working_dir(out_dir.path());

        backend
            .download(&["u".into()], &DownloadOptions::new(), CancellationToken::new())
            .await
            .unwrap();

        assert!(out_dir.path().join("ran-here").exists());
        assert!(!bin_dir.path().join("ran-here").exists());
    }
}
