//! Metadata returned by `yt-dlp -J`.

use serde::Deserialize;

/// One downloadable stream of a video.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct FormatInfo {
    #[serde(default)]
    pub format_id: Option<String>,
    #[serde(default)]
    pub ext: Option<String>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub vcodec: Option<String>,
    #[serde(default)]
    pub filesize: Option<u64>,
}

impl FormatInfo {
    pub fn describe(&self) -> String {
        format!(
            "{} - {}p - {} - {}",
            self.format_id.as_deref().unwrap_or("N/A"),
            self.height.map(|h| h.to_string()).unwrap_or_else(|| "N/A".to_owned()),
            self.ext.as_deref().unwrap_or("N/A"),
            self.vcodec.as_deref().unwrap_or("N/A"),
        )
    }
}

/// Video (or playlist) metadata.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct VideoInfo {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub uploader: Option<String>,
    /// Seconds; yt-dlp reports a float for some extractors
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub view_count: Option<u64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub formats: Vec<FormatInfo>,
    /// Playlist entries; yt-dlp writes `null` for unavailable ones
    #[serde(default)]
    pub entries: Vec<Option<VideoInfo>>,
}

impl VideoInfo {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn title_or_na(&self) -> &str {
        self.title.as_deref().unwrap_or("N/A")
    }

    pub fn uploader_or_na(&self) -> &str {
        self.uploader.as_deref().unwrap_or("N/A")
    }

    /// Block shown in the log pane after a successful info fetch.
    pub fn summary(&self) -> String {
        format!(
            "Title: {}\nChannel: {}\nDuration: {}\nViews: {}",
            self.title_or_na(),
            self.uploader_or_na(),
            format_duration(self.duration),
            format_views(self.view_count),
        )
    }

    /// First `max_chars` characters of the description.
    pub fn description_preview(&self, max_chars: usize) -> String {
        match &self.description {
            Some(d) => format!("{}...", d.chars().take(max_chars).collect::<String>()),
            None => "N/A".to_owned(),
        }
    }
}

pub fn format_duration(duration: Option<f64>) -> String {
    match duration {
        Some(d) if d >= 1.0 => {
            let secs = d as u64;
            format!("{}:{:02}", secs / 60, secs % 60)
        }
        _ => "N/A".to_owned(),
    }
}

pub fn format_views(views: Option<u64>) -> String {
    let Some(v) = views.filter(|v| *v > 0) else {
        return "N/A".to_owned();
    };
    let digits = v.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
