//! The options record handed to yt-dlp, and its mapping to command-line flags.

use std::{fmt, sync::Arc};

use crate::progress::ProgressEvent;

/// A registered progress callback. Every hook sees every event.
pub type ProgressHook = Arc<dyn Fn(&ProgressEvent) + Send + Sync>;

/// Post-processing steps yt-dlp runs after a download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostProcessor {
    /// Convert to an audio-only file (needs ffmpeg)
    ExtractAudio {
        codec: String,
        /// Bitrate in kbit/s
        quality: String,
    },
}

impl PostProcessor {
    pub fn mp3_192() -> Self {
        PostProcessor::ExtractAudio {
            codec: "mp3".to_owned(),
            quality: "192".to_owned(),
        }
    }
}

/// Configuration for a single extract/download call.
#[derive(Clone, Default)]
pub struct DownloadOptions {
    pub format: Option<String>,
    pub output_template: Option<String>,
    /// `None` keeps yt-dlp's own playlist default
    pub no_playlist: Option<bool>,
    pub flat_playlist: bool,
    pub write_subtitles: bool,
    pub write_auto_subtitles: bool,
    pub subtitle_langs: Vec<String>,
    pub subtitle_format: Option<String>,
    pub write_thumbnail: bool,
    pub write_all_thumbnails: bool,
    pub write_info_json: bool,
    pub write_description: bool,
    pub restrict_filenames: bool,
    pub no_overwrites: bool,
    pub continue_partial: Option<bool>,
    pub retries: Option<u32>,
    pub fragment_retries: Option<u32>,
    pub ignore_errors: bool,
    pub quiet: bool,
    pub no_warnings: bool,
    pub postprocessors: Vec<PostProcessor>,
    pub progress_hooks: Vec<ProgressHook>,
}

impl fmt::Debug for DownloadOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DownloadOptions")
            .field("format", &self.format)
            .field("output_template", &self.output_template)
            .field("no_playlist", &self.no_playlist)
            .field("flat_playlist", &self.flat_playlist)
            .field("write_subtitles", &self.write_subtitles)
            .field("write_auto_subtitles", &self.write_auto_subtitles)
            .field("subtitle_langs", &self.subtitle_langs)
            .field("subtitle_format", &self.subtitle_format)
            .field("write_thumbnail", &self.write_thumbnail)
            .field("write_all_thumbnails", &self.write_all_thumbnails)
            .field("write_info_json", &self.write_info_json)
            .field("write_description", &self.write_description)
            .field("restrict_filenames", &self.restrict_filenames)
            .field("no_overwrites", &self.no_overwrites)
            .field("continue_partial", &self.continue_partial)
            .field("retries", &self.retries)
            .field("fragment_retries", &self.fragment_retries)
            .field("ignore_errors", &self.ignore_errors)
            .field("quiet", &self.quiet)
            .field("no_warnings", &self.no_warnings)
            .field("postprocessors", &self.postprocessors)
            .field("progress_hooks", &self.progress_hooks.len())
            .finish()
    }
}

impl DownloadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_format(mut self, selector: impl Into<String>) -> Self {
        self.format = Some(selector.into());
        self
    }

    pub fn with_output_template(mut self, template: impl Into<String>) -> Self {
        self.output_template = Some(template.into());
        self
    }

    pub fn with_postprocessor(mut self, pp: PostProcessor) -> Self {
        self.postprocessors.push(pp);
        self
    }

    pub fn with_subtitles(mut self, langs: &[&str], format: &str) -> Self {
        self.write_subtitles = true;
        self.write_auto_subtitles = true;
        self.subtitle_langs = langs.iter().map(|l| (*l).to_owned()).collect();
        self.subtitle_format = Some(format.to_owned());
        self
    }

    pub fn quiet(mut self) -> Self {
        self.quiet = true;
        self.no_warnings = true;
        self
    }

    /// Registers a progress callback.
    pub fn add_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&ProgressEvent) + Send + Sync + 'static,
    {
        self.progress_hooks.push(Arc::new(hook));
        self
    }

    /// Delivers one event to every registered hook.
    pub fn notify(&self, event: &ProgressEvent) {
        for hook in &self.progress_hooks {
            hook(event);
        }
    }

    /// Translates the record into yt-dlp command-line flags. Hooks are not
    /// flags; the backend adds its progress-template arguments separately.
    pub fn to_args(&self) -> Vec<String> {
        let mut args: Vec<String> = Vec::new();
        let mut flag = |name: &str, on: bool| {
            if on {
                args.push(name.to_owned());
            }
        };

        flag("--flat-playlist", self.flat_playlist);
        flag("--write-subs", self.write_subtitles);
        flag("--write-auto-subs", self.write_auto_subtitles);
        flag("--write-thumbnail", self.write_thumbnail);
        flag("--write-all-thumbnails", self.write_all_thumbnails);
        flag("--write-info-json", self.write_info_json);
        flag("--write-description", self.write_description);
        flag("--restrict-filenames", self.restrict_filenames);
        flag("--no-overwrites", self.no_overwrites);
        flag("--ignore-errors", self.ignore_errors);
        flag("--quiet", self.quiet);
        flag("--no-warnings", self.no_warnings);

        if let Some(format) = &self.format {
            args.push("-f".to_owned());
            args.push(format.clone());
        }
        if let Some(template) = &self.output_template {
            args.push("-o".to_owned());
            args.push(template.clone());
        }
        match self.no_playlist {
            Some(true) => args.push("--no-playlist".to_owned()),
            Some(false) => args.push("--yes-playlist".to_owned()),
            None => {}
        }
        if !self.subtitle_langs.is_empty() {
            args.push("--sub-langs".to_owned());
            args.push(self.subtitle_langs.join(","));
        }
        if let Some(sub_format) = &self.subtitle_format {
            args.push("--sub-format".to_owned());
            args.push(sub_format.clone());
        }
        match self.continue_partial {
            Some(true) => args.push("--continue".to_owned()),
            Some(false) => args.push("--no-continue".to_owned()),
            None => {}
        }
        if let Some(n) = self.retries {
            args.push("--retries".to_owned());
            args.push(n.to_string());
        }
        if let Some(n) = self.fragment_retries {
            args.push("--fragment-retries".to_owned());
            args.push(n.to_string());
        }
        for pp in &self.postprocessors {
            match pp {
                PostProcessor::ExtractAudio { codec, quality } => {
                    args.push("-x".to_owned());
                    args.push("--audio-format".to_owned());
                    args.push(codec.clone());
                    args.push("--audio-quality".to_owned());
                    args.push(format!("{quality}K"));
                }
            }
        }
        args
    }
}
