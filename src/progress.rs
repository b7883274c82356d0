//! Progress events and the yt-dlp output lines they are parsed from.

use std::path::Path;

/// Tag at the start of every progress-template line
const TAG: &str = "ytdlp-gui";

/// Passed as `--progress-template download:<TEMPLATE>`. Filename stays last
/// so it may itself contain `|`.
pub const PROGRESS_TEMPLATE: &str = "ytdlp-gui|%(progress.status)s|%(progress.downloaded_bytes)s|%(progress.total_bytes)s|%(progress.total_bytes_estimate)s|%(progress.speed)s|%(progress.eta)s|%(progress.filename)s";

/// A status-tagged record emitted by yt-dlp while transferring.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    Downloading {
        downloaded_bytes: u64,
        total_bytes: Option<u64>,
        total_bytes_estimate: Option<u64>,
        /// Bytes per second
        speed: Option<f64>,
        /// Seconds remaining
        eta: Option<u64>,
        filename: String,
    },
    Finished {
        filename: String,
    },
    Error {
        message: String,
    },
}

impl ProgressEvent {
    /// Percent done, when the size is known or estimated.
    pub fn percent(&self) -> Option<f32> {
        match self {
            ProgressEvent::Downloading {
                downloaded_bytes,
                total_bytes,
                total_bytes_estimate,
                ..
            } => {
                let total = total_bytes
                    .filter(|t| *t > 0)
                    .or(total_bytes_estimate.filter(|t| *t > 0))?;
                let pct = *downloaded_bytes as f64 / total as f64 * 100.0;
                Some(pct.min(100.0) as f32)
            }
            ProgressEvent::Finished { .. } => Some(100.0),
            ProgressEvent::Error { .. } => None,
        }
    }
}

fn field<T: std::str::FromStr>(raw: &str) -> Option<T> {
    let raw = raw.trim();
    if raw.is_empty() || raw == "NA" || raw == "None" {
        return None;
    }
    raw.parse().ok()
}

/// yt-dlp prints some integer fields as floats (`12.0`)
fn whole(raw: &str) -> Option<u64> {
    field::<u64>(raw).or_else(|| field::<f64>(raw).filter(|v| *v >= 0.0).map(|v| v as u64))
}

/// Parses one stdout line written with [`PROGRESS_TEMPLATE`].
pub fn parse_progress_line(line: &str) -> Option<ProgressEvent> {
    let rest = line.trim_end_matches(['\r', '\n']).strip_prefix(TAG)?.strip_prefix('|')?;
    let parts: Vec<&str> = rest.splitn(7, '|').collect();
    if parts.len() != 7 {
        return None;
    }
    let filename = parts[6].to_owned();
    match parts[0] {
        "downloading" => Some(ProgressEvent::Downloading {
            downloaded_bytes: whole(parts[1]).unwrap_or(0),
            total_bytes: whole(parts[2]),
            total_bytes_estimate: whole(parts[3]),
            speed: field(parts[4]),
            eta: whole(parts[5]),
            filename,
        }),
        "finished" => Some(ProgressEvent::Finished { filename }),
        "error" => Some(ProgressEvent::Error {
            message: format!("Error while downloading {filename}"),
        }),
        _ => None,
    }
}

/// Maps a yt-dlp `ERROR:` stderr line to an error event.
pub fn parse_error_line(line: &str) -> Option<ProgressEvent> {
    let message = line.trim().strip_prefix("ERROR:")?.trim();
    Some(ProgressEvent::Error {
        message: message.to_owned(),
    })
}

pub fn format_speed(speed: Option<f64>) -> String {
    match speed {
        Some(s) if s > 0.0 => format!("{:.1} MB/s", s / 1024.0 / 1024.0),
        _ => "N/A".to_owned(),
    }
}

pub fn format_eta(eta: Option<u64>) -> String {
    match eta {
        Some(e) if e > 0 => format!("{}:{:02}", e / 60, e % 60),
        _ => "N/A".to_owned(),
    }
}

/// Status label text for a downloading event with a known size.
pub fn status_line(event: &ProgressEvent) -> Option<String> {
    let ProgressEvent::Downloading { speed, eta, .. } = event else {
        return None;
    };
    let pct = event.percent()?;
    Some(format!(
        "{pct:.1}% | {} | ETA: {}",
        format_speed(*speed),
        format_eta(*eta)
    ))
}

/// Final path component of a reported filename.
pub fn basename(filename: &str) -> String {
    Path::new(filename)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| filename.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_downloading_line() {
        let line = "ytdlp-gui|downloading|524288|1048576|NA|1048576.0|42|/tmp/Some Title.mp4";
        let event = parse_progress_line(line).unwrap();
        assert_eq!(
            event,
            ProgressEvent::Downloading {
                downloaded_bytes: 524288,
                total_bytes: Some(1048576),
                total_bytes_estimate: None,
                speed: Some(1048576.0),
                eta: Some(42),
                filename: "/tmp/Some Title.mp4".into(),
            }
        );
        assert_eq!(event.percent(), Some(50.0));
    }

    #[test]
    fn falls_back_to_size_estimate() {
        let line = "ytdlp-gui|downloading|250|NA|1000.0|NA|NA|a.webm";
        let event = parse_progress_line(line).unwrap();
        assert_eq!(event.percent(), Some(25.0));
    }

    #[test]
    fn zero_total_falls_back_to_estimate() {
        let line = "ytdlp-gui|downloading|250|0|500|NA|NA|a.webm";
        let event = parse_progress_line(line).unwrap();
        assert_eq!(event.percent(), Some(50.0));
    }

    #[test]
    fn unknown_size_has_no_percent() {
        let line = "ytdlp-gui|downloading|250|NA|NA|NA|NA|a.webm";
        let event = parse_progress_line(line).unwrap();
        assert_eq!(event.percent(), None);
        assert_eq!(status_line(&event), None);
    }

    #[test]
    fn filename_may_contain_separator() {
        let line = "ytdlp-gui|finished|10|10|NA|NA|NA|/tmp/a | b.mp4";
        assert_eq!(
            parse_progress_line(line),
            Some(ProgressEvent::Finished { filename: "/tmp/a | b.mp4".into() })
        );
    }

    #[test]
    fn ignores_other_output() {
        assert_eq!(parse_progress_line("[youtube] dQw4w9WgXcQ: Downloading webpage"), None);
        assert_eq!(parse_progress_line("ytdlp-gui|downloading|1"), None);
        assert_eq!(parse_progress_line("ytdlp-gui|weird|1|2|3|4|5|f"), None);
    }

    #[test]
    fn error_lines_from_stderr() {
        assert_eq!(
            parse_error_line("ERROR: [youtube] xyz: Video unavailable"),
            Some(ProgressEvent::Error { message: "[youtube] xyz: Video unavailable".into() })
        );
        assert_eq!(parse_error_line("WARNING: something"), None);
    }

    #[test]
    fn speed_and_eta_formatting() {
        assert_eq!(format_speed(Some(1.5 * 1024.0 * 1024.0)), "1.5 MB/s");
        assert_eq!(format_speed(Some(0.0)), "N/A");
        assert_eq!(format_speed(None), "N/A");
        assert_eq!(format_eta(Some(125)), "2:05");
        assert_eq!(format_eta(Some(0)), "N/A");
        assert_eq!(format_eta(None), "N/A");
    }

    #[test]
    fn status_line_matches_label_layout() {
        let event = ProgressEvent::Downloading {
            downloaded_bytes: 1,
            total_bytes: Some(4),
            total_bytes_estimate: None,
            speed: Some(2.0 * 1024.0 * 1024.0),
            eta: Some(61),
            filename: "f".into(),
        };
        assert_eq!(status_line(&event).unwrap(), "25.0% | 2.0 MB/s | ETA: 1:01");
    }

    #[test]
    fn basename_strips_directories() {
        assert_eq!(basename("/home/u/Downloads/clip.mp4"), "clip.mp4");
        assert_eq!(basename("clip.mp4"), "clip.mp4");
    }
}
