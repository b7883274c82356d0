use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::model::{FormState, FormatChoice, Quality};

const APP_DIR: &str = "ytdlp-gui";
const CONFIG_FILE: &str = "config.toml";

/// Last-used form settings. Fields are optional so that unspecified values
/// fall back to code defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    pub download_dir: Option<PathBuf>,
    pub format: Option<FormatChoice>,
    pub quality: Option<Quality>,
    pub subtitles: Option<bool>,
    pub thumbnail: Option<bool>,
    pub playlist: Option<bool>,
    /// yt-dlp executable; `PATH` lookup when unset
    pub ytdlp_path: Option<PathBuf>,
}

impl Config {
    /// `<config dir>/ytdlp-gui/config.toml`
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let mut p = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        p.push(APP_DIR);
        p.push(CONFIG_FILE);
        Ok(p)
    }

    /// Loads from `path`. A missing file gives the defaults.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Config::default());
        }
        let s = fs::read_to_string(path)?;
        Ok(toml::from_str(&s)?)
    }

    /// Saves to `path`, creating parent directories if needed.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn load() -> Result<Config, ConfigError> {
        Self::load_from(Self::default_path()?)
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(Self::default_path()?)
    }

    /// Initial form contents.
    pub fn form_state(&self) -> FormState {
        let dir = self.download_dir.clone().unwrap_or_else(default_download_dir);
        FormState {
            format: self.format.unwrap_or_default(),
            quality: self.quality.unwrap_or_default(),
            subtitles: self.subtitles.unwrap_or(false),
            thumbnail: self.thumbnail.unwrap_or(false),
            playlist: self.playlist.unwrap_or(false),
            ..FormState::new(dir)
        }
    }

    /// Remembers the form selections; the URL is not persisted.
    pub fn update_from(&mut self, form: &FormState) {
        self.download_dir = Some(form.download_dir.clone());
        self.format = Some(form.format);
        self.quality = Some(form.quality);
        self.subtitles = Some(form.subtitles);
        self.thumbnail = Some(form.thumbnail);
        self.playlist = Some(form.playlist);
    }
}

/// The platform download folder, then `~/Downloads`, then `./downloads`.
pub fn default_download_dir() -> PathBuf {
    dirs::download_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join("Downloads")))
        .unwrap_or_else(|| PathBuf::from("./downloads"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(dir.path().join("config.toml")).unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn save_then_load_keeps_form_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut form = FormState::new(PathBuf::from("/srv/media"));
        form.url = "https://example.com/v".into();
        form.format = FormatChoice::BestVideo;
        form.quality = Quality::P1440;
        form.playlist = true;

        let mut cfg = Config::default();
        cfg.update_from(&form);
        cfg.save_to(&path).unwrap();

        let restored = Config::load_from(&path).unwrap().form_state();
        assert_eq!(restored.url, "");
        assert_eq!(restored.format, FormatChoice::BestVideo);
        assert_eq!(restored.quality, Quality::P1440);
        assert_eq!(restored.download_dir, PathBuf::from("/srv/media"));
        assert!(restored.playlist);
        assert!(!restored.subtitles);
    }

    #[test]
    fn reads_hand_written_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "format = \"best_audio\"\nquality = \"p720\"\nytdlp_path = \"/opt/yt-dlp\"\n",
        )
        .unwrap();
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg.format, Some(FormatChoice::BestAudio));
        assert_eq!(cfg.quality, Some(Quality::P720));
        assert_eq!(cfg.ytdlp_path, Some(PathBuf::from("/opt/yt-dlp")));
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "format = [").unwrap();
        assert!(matches!(Config::load_from(&path), Err(ConfigError::Parse(_))));
    }
}
