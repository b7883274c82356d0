use std::{fmt, path::PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    error::FormError,
    options::{DownloadOptions, PostProcessor},
};

/// What kind of stream the user wants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatChoice {
    /// Single-file video, limited by the selected quality
    #[default]
    Video,
    /// Audio only, converted to mp3
    Audio,
    /// Best video and best audio merged
    BestVideo,
    /// Best audio stream as-is
    BestAudio,
}

impl FormatChoice {
    pub const ALL: [FormatChoice; 4] = [
        FormatChoice::Video,
        FormatChoice::Audio,
        FormatChoice::BestVideo,
        FormatChoice::BestAudio,
    ];
}

impl fmt::Display for FormatChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FormatChoice::Video => "video",
            FormatChoice::Audio => "audio",
            FormatChoice::BestVideo => "best video",
            FormatChoice::BestAudio => "best audio",
        })
    }
}

/// Video quality cap; only applies to [`FormatChoice::Video`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quality {
    #[default]
    Best,
    Worst,
    P360,
    P480,
    P720,
    P1080,
    P1440,
    P2160,
}

impl Quality {
    pub const ALL: [Quality; 8] = [
        Quality::Best,
        Quality::Worst,
        Quality::P720,
        Quality::P480,
        Quality::P360,
        Quality::P1080,
        Quality::P1440,
        Quality::P2160,
    ];

    /// Maximum frame height, if this is a resolution cap.
    pub fn height(self) -> Option<u32> {
        match self {
            Quality::Best | Quality::Worst => None,
            Quality::P360 => Some(360),
            Quality::P480 => Some(480),
            Quality::P720 => Some(720),
            Quality::P1080 => Some(1080),
            Quality::P1440 => Some(1440),
            Quality::P2160 => Some(2160),
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quality::Best => f.write_str("best"),
            Quality::Worst => f.write_str("worst"),
            other => write!(f, "{}p", other.height().unwrap_or_default()),
        }
    }
}

/// Format selector expression for a format/quality pair.
pub fn format_selector(format: FormatChoice, quality: Quality) -> String {
    match format {
        FormatChoice::Audio | FormatChoice::BestAudio => "bestaudio/best".to_owned(),
        FormatChoice::BestVideo => "bestvideo+bestaudio/best".to_owned(),
        FormatChoice::Video => match quality.height() {
            Some(h) => format!("best[height<={h}]"),
            None => quality.to_string(),
        },
    }
}

/// Current contents of the download form
#[derive(Debug, Clone, PartialEq)]
pub struct FormState {
    pub url: String,
    pub format: FormatChoice,
    pub quality: Quality,
    pub download_dir: PathBuf,
    pub subtitles: bool,
    pub thumbnail: bool,
    /// Download the whole playlist instead of the single video
    pub playlist: bool,
}

impl FormState {
    pub fn new(download_dir: PathBuf) -> Self {
        Self {
            url: String::new(),
            format: FormatChoice::default(),
            quality: Quality::default(),
            download_dir,
            subtitles: false,
            thumbnail: false,
            playlist: false,
        }
    }

    pub fn trimmed_url(&self) -> &str {
        self.url.trim()
    }

    /// Checks the inputs a download needs.
    pub fn validate(&self) -> Result<(), FormError> {
        if self.trimmed_url().is_empty() {
            return Err(FormError::EmptyUrl);
        }
        if !self.download_dir.is_dir() {
            return Err(FormError::MissingFolder(
                self.download_dir.display().to_string(),
            ));
        }
        Ok(())
    }

    /// Builds the options record for the current selections.
    pub fn to_options(&self) -> DownloadOptions {
        let template = self.download_dir.join("%(title)s.%(ext)s");
        let mut options = DownloadOptions::new()
            .with_format(format_selector(self.format, self.quality))
            .with_output_template(template.to_string_lossy());
        options.no_playlist = Some(!self.playlist);
        options.write_subtitles = self.subtitles;
        options.write_auto_subtitles = self.subtitles;
        options.write_thumbnail = self.thumbnail;
        options.ignore_errors = true;

        if self.format == FormatChoice::Audio {
            options = options.with_postprocessor(PostProcessor::mp3_192());
        }
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> FormState {
        FormState {
            url: "https://www.youtube.com/watch?v=dQw4w9WgXcQ".into(),
            ..FormState::new(PathBuf::from("/media/videos"))
        }
    }

    #[test]
    fn selectors_for_each_choice() {
        assert_eq!(format_selector(FormatChoice::Audio, Quality::P720), "bestaudio/best");
        assert_eq!(format_selector(FormatChoice::BestAudio, Quality::Best), "bestaudio/best");
        assert_eq!(
            format_selector(FormatChoice::BestVideo, Quality::P480),
            "bestvideo+bestaudio/best"
        );
        assert_eq!(format_selector(FormatChoice::Video, Quality::Best), "best");
        assert_eq!(format_selector(FormatChoice::Video, Quality::Worst), "worst");
        assert_eq!(
            format_selector(FormatChoice::Video, Quality::P1080),
            "best[height<=1080]"
        );
    }

    #[test]
    fn default_form_builds_single_video_options() {
        let opts = form().to_options();
        assert_eq!(opts.format.as_deref(), Some("best"));
        assert_eq!(
            opts.output_template,
            Some(
                PathBuf::from("/media/videos")
                    .join("%(title)s.%(ext)s")
                    .to_string_lossy()
                    .into_owned()
            )
        );
        assert_eq!(opts.no_playlist, Some(true));
        assert!(opts.ignore_errors);
        assert!(!opts.write_subtitles);
        assert!(!opts.write_thumbnail);
        assert!(opts.postprocessors.is_empty());
        assert!(opts.progress_hooks.is_empty());
    }

    #[test]
    fn checkboxes_map_to_toggles() {
        let mut f = form();
        f.subtitles = true;
        f.thumbnail = true;
        f.playlist = true;
        let opts = f.to_options();
        assert!(opts.write_subtitles);
        assert!(opts.write_auto_subtitles);
        assert!(opts.write_thumbnail);
        assert_eq!(opts.no_playlist, Some(false));
    }

    #[test]
    fn only_audio_choice_adds_mp3_conversion() {
        let mut f = form();
        f.format = FormatChoice::Audio;
        assert_eq!(f.to_options().postprocessors, vec![PostProcessor::mp3_192()]);
        f.format = FormatChoice::BestAudio;
        assert!(f.to_options().postprocessors.is_empty());
    }

    #[test]
    fn validation() {
        let dir = tempfile::tempdir().unwrap();
        let mut f = FormState::new(dir.path().to_path_buf());
        f.url = "   ".into();
        assert_eq!(f.validate(), Err(FormError::EmptyUrl));

        f.url = " https://vimeo.com/1 ".into();
        assert_eq!(f.validate(), Ok(()));
        assert_eq!(f.trimmed_url(), "https://vimeo.com/1");

        f.download_dir = dir.path().join("nope");
        assert!(matches!(f.validate(), Err(FormError::MissingFolder(_))));
    }

    #[test]
    fn labels() {
        assert_eq!(FormatChoice::BestVideo.to_string(), "best video");
        assert_eq!(Quality::P1440.to_string(), "1440p");
        assert_eq!(Quality::Worst.to_string(), "worst");
    }
}
