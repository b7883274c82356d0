//! Runnable yt-dlp usage recipes. Each recipe builds an options record, makes
//! one library call and prints the result.

use std::{io::Write, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tokio_util::sync::CancellationToken;

use ytdlp_gui::{
    DownloadOptions, MediaBackend, ProgressEvent, YtDlp,
    info::format_views,
    options::PostProcessor,
    progress::format_speed,
};

const SAMPLE_URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";
const SAMPLE_PLAYLIST: &str = "https://www.youtube.com/playlist?list=PLxxxxxx";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Recipe {
    Info,
    Formats,
    Basic,
    Audio,
    Playlist,
    Progress,
    Quality,
    Subtitles,
    Thumbnail,
    Errors,
    Custom,
}

impl Recipe {
    const ALL: [Recipe; 11] = [
        Recipe::Info,
        Recipe::Formats,
        Recipe::Basic,
        Recipe::Audio,
        Recipe::Playlist,
        Recipe::Progress,
        Recipe::Quality,
        Recipe::Subtitles,
        Recipe::Thumbnail,
        Recipe::Errors,
        Recipe::Custom,
    ];
}

#[derive(Parser, Debug)]
#[command(name = "ytdlp-recipes", about = "yt-dlp usage recipes")]
struct Args {
    /// Recipes to run (default: info formats)
    #[arg(value_enum)]
    recipes: Vec<Recipe>,
    /// Run every recipe
    #[arg(long)]
    all: bool,
    /// Video used by the single-video recipes
    #[arg(long, default_value = SAMPLE_URL)]
    url: String,
    /// Playlist used by the playlist recipe
    #[arg(long, default_value = SAMPLE_PLAYLIST)]
    playlist_url: String,
    /// Where downloads land
    #[arg(long, default_value = "examples_output")]
    output_dir: PathBuf,
    /// yt-dlp executable (default: from PATH)
    #[arg(long)]
    ytdlp: Option<PathBuf>,
}

impl Args {
    fn selected(&self) -> Vec<Recipe> {
        if self.all {
            Recipe::ALL.to_vec()
        } else if self.recipes.is_empty() {
            vec![Recipe::Info, Recipe::Formats]
        } else {
            self.recipes.clone()
        }
    }
}

struct Recipes {
    backend: Arc<dyn MediaBackend>,
    url: String,
    playlist_url: String,
}

impl Recipes {
    async fn download(&self, urls: &[String], options: &DownloadOptions) -> Result<()> {
        self.backend
            .download(urls, options, CancellationToken::new())
            .await?;
        Ok(())
    }

    async fn run(&self, recipe: Recipe) -> Result<()> {
        match recipe {
            Recipe::Info => self.info().await,
            Recipe::Formats => self.list_formats().await,
            Recipe::Basic => self.basic().await,
            Recipe::Audio => self.audio().await,
            Recipe::Playlist => self.playlist().await,
            Recipe::Progress => self.with_progress().await,
            Recipe::Quality => self.quality().await,
            Recipe::Subtitles => self.subtitles().await,
            Recipe::Thumbnail => self.thumbnail().await,
            Recipe::Errors => self.errors().await,
            Recipe::Custom => self.custom().await,
        }
    }

    async fn basic(&self) -> Result<()> {
        println!("=== Basic video download ===");
        let options = DownloadOptions::new()
            .with_format("best")
            .with_output_template("%(title)s.%(ext)s");
        self.download(&[self.url.clone()], &options).await?;
        println!("✅ Download finished!");
        Ok(())
    }

    async fn audio(&self) -> Result<()> {
        println!("\n=== Audio extraction ===");
        let options = DownloadOptions::new()
            .with_format("bestaudio/best")
            .with_output_template("%(title)s.%(ext)s")
            .with_postprocessor(PostProcessor::mp3_192());
        self.download(&[self.url.clone()], &options).await?;
        println!("✅ Audio extracted!");
        Ok(())
    }

    async fn info(&self) -> Result<()> {
        println!("\n=== Video info ===");
        let info = self
            .backend
            .extract_info(&self.url, &DownloadOptions::new().quiet())
            .await?;
        println!("Title: {}", info.title_or_na());
        println!("Channel: {}", info.uploader_or_na());
        println!(
            "Duration: {} s",
            info.duration.map(|d| d as u64).unwrap_or(0)
        );
        println!("Views: {}", format_views(info.view_count));
        println!("Description: {}", info.description_preview(100));
        Ok(())
    }

    async fn playlist(&self) -> Result<()> {
        println!("\n=== Playlist download ===");
        let mut options = DownloadOptions::new()
            .with_format("best")
            .with_output_template("%(playlist)s/%(title)s.%(ext)s");
        options.no_playlist = Some(false);
        self.download(&[self.playlist_url.clone()], &options).await?;
        println!("✅ Playlist downloaded!");
        Ok(())
    }

    async fn with_progress(&self) -> Result<()> {
        println!("\n=== Download with progress ===");
        let options = DownloadOptions::new()
            .with_format("best")
            .with_output_template("%(title)s.%(ext)s")
            .add_hook(|event| match event {
                ProgressEvent::Downloading { speed, .. } => {
                    let percent = event
                        .percent()
                        .map(|p| format!("{p:.1}%"))
                        .unwrap_or_else(|| "N/A".to_owned());
                    print!("\rDownloading: {percent} at {}", format_speed(*speed));
                    let _ = std::io::stdout().flush();
                }
                ProgressEvent::Finished { filename } => println!("\n✅ Downloaded: {filename}"),
                ProgressEvent::Error { .. } => {}
            });
        self.download(&[self.url.clone()], &options).await
    }

    async fn quality(&self) -> Result<()> {
        println!("\n=== Quality selection ===");
        let selectors = [
            ("best", "best"),
            ("worst", "worst"),
            ("720p", "best[height<=720]"),
            ("480p", "best[height<=480]"),
            ("best_video_audio", "bestvideo+bestaudio/best"),
        ];
        for (name, selector) in selectors {
            println!("\n📺 Format: {name} ({selector})");
            let mut options = DownloadOptions::new()
                .with_format(selector)
                .with_output_template(format!("{name}_%(title)s.%(ext)s"));
            options.quiet = true;
            match self.backend.extract_info(&self.url, &options).await {
                Ok(info) => {
                    if let Some(f) = info.formats.first() {
                        let na = || "N/A".to_owned();
                        let height = f.height.map(|h| h.to_string()).unwrap_or_else(na);
                        let size = f.filesize.map(|s| s.to_string()).unwrap_or_else(na);
                        println!("  Resolution: {height}p");
                        println!("  Size: {size} bytes");
                        println!("  Codec: {}", f.vcodec.as_deref().unwrap_or("N/A"));
                    }
                }
                Err(e) => println!("  ❌ Error: {e}"),
            }
        }
        Ok(())
    }

    async fn subtitles(&self) -> Result<()> {
        println!("\n=== Subtitles ===");
        let options = DownloadOptions::new()
            .with_format("best")
            .with_output_template("%(title)s.%(ext)s")
            .with_subtitles(&["en", "ru"], "srt");
        self.download(&[self.url.clone()], &options).await?;
        println!("✅ Video and subtitles downloaded!");
        Ok(())
    }

    async fn thumbnail(&self) -> Result<()> {
        println!("\n=== Thumbnail ===");
        let mut options = DownloadOptions::new()
            .with_format("best")
            .with_output_template("%(title)s.%(ext)s");
        options.write_thumbnail = true;
        options.write_all_thumbnails = true;
        self.download(&[self.url.clone()], &options).await?;
        println!("✅ Video and thumbnails downloaded!");
        Ok(())
    }

    async fn errors(&self) -> Result<()> {
        println!("\n=== Error handling ===");
        let urls = [
            self.url.clone(),
            "https://www.youtube.com/watch?v=invalid_url".to_owned(),
            "https://example.com/not_a_video".to_owned(),
        ];
        let mut options = DownloadOptions::new()
            .with_format("best")
            .with_output_template("%(title)s.%(ext)s")
            .add_hook(|event| {
                if let ProgressEvent::Error { message } = event {
                    println!("  ⚠️  {message}");
                }
            });
        options.ignore_errors = true;
        for url in urls {
            println!("\n🔄 Trying: {url}");
            match self.download(&[url], &options).await {
                Ok(()) => println!("✅ Done!"),
                Err(e) => println!("❌ Error: {e}"),
            }
        }
        Ok(())
    }

    async fn custom(&self) -> Result<()> {
        println!("\n=== Custom options ===");
        let mut options = DownloadOptions::new()
            .with_format("best")
            .with_output_template("%(uploader)s - %(title)s [%(id)s].%(ext)s");
        options.restrict_filenames = true;
        options.no_overwrites = true;
        options.continue_partial = Some(true);
        options.retries = Some(3);
        options.fragment_retries = Some(3);
        options.flat_playlist = false;
        options.write_thumbnail = true;
        options.write_info_json = true;
        options.write_description = true;
        self.download(&[self.url.clone()], &options).await?;
        println!("✅ Download with custom options finished!");
        Ok(())
    }

    async fn list_formats(&self) -> Result<()> {
        println!("\n=== Available formats ===");
        let info = self
            .backend
            .extract_info(&self.url, &DownloadOptions::new().quiet())
            .await?;
        println!("📋 {} formats available:", info.formats.len());
        for (i, f) in info.formats.iter().take(10).enumerate() {
            println!("  {}. {}", i + 1, f.describe());
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    ytdlp_gui::init_tracing();
    let args = Args::parse();

    println!("🎬 yt-dlp usage recipes");
    println!("{}", "=".repeat(50));

    std::fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("creating {}", args.output_dir.display()))?;
    let backend = YtDlp::new(args.ytdlp.clone()).with_working_dir(&args.output_dir);
    match backend.version().await {
        Ok(v) => println!("yt-dlp {v}"),
        Err(e) => println!("⚠️  {e}"),
    }

    let recipes = Recipes {
        backend: Arc::new(backend),
        url: args.url.clone(),
        playlist_url: args.playlist_url.clone(),
    };

    let run = async {
        let mut failed = 0;
        for recipe in args.selected() {
            if let Err(e) = recipes.run(recipe).await {
                failed += 1;
                println!("\n❌ Error: {e:#}");
            }
        }
        failed
    };
    tokio::select! {
        failed = run => {
            if failed == 0 {
                println!("\n🎉 All recipes finished!");
            } else {
                println!("\n{failed} recipe(s) failed");
            }
        }
        _ = tokio::signal::ctrl_c() => println!("\n⚠️  Interrupted by user"),
    }

    Ok(())
}
