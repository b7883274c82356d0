//! Main application for the yt-dlp GUI

use std::{path::PathBuf, sync::Arc};

// eframe/egui for GUI application framework
use eframe::{App, Frame, egui};
use egui::{Color32, Key, KeyboardShortcut, Modifiers, RichText, TextureOptions, Visuals};
// OnceCell for single-time runtime initialization
use once_cell::sync::OnceCell;
// Native folder picker and message boxes
use rfd::{FileDialog, MessageButtons, MessageDialog, MessageLevel};
use tokio::{
    runtime::Runtime,
    sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel},
};
use tracing::{info, warn};

use ytdlp_gui::{
    MediaBackend, YtDlp,
    config::Config,
    log_pane::LogLevel,
    model::{FormState, FormatChoice, Quality},
    session::Session,
    worker::{self, WorkerEvent},
};

// Global Tokio runtime stored in a OnceCell for lazy init
static RUNTIME: OnceCell<Arc<Runtime>> = OnceCell::new();

const TITLE: &str = concat!("yt-dlp GUI v", env!("CARGO_PKG_VERSION"));

/// Program entry point: initializes runtime and launches GUI
fn main() -> Result<(), Box<dyn std::error::Error>> {
    ytdlp_gui::init_tracing();

    let runtime = RUNTIME.get_or_try_init(|| Runtime::new().map(Arc::new))?.clone();

    let config = Config::load().unwrap_or_else(|e| {
        warn!(error = %e, "using default settings");
        Config::default()
    });

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(TITLE)
            .with_inner_size([800.0, 700.0])
            .with_min_inner_size([600.0, 500.0]),
        centered: true,
        ..Default::default()
    };
    eframe::run_native(
        TITLE,
        options,
        Box::new(move |cc| {
            cc.egui_ctx.set_visuals(Visuals::dark());
            Box::new(YtDlpApp::new(config, runtime))
        }),
    )?;
    Ok(())
}

/// Application state for the GUI
struct YtDlpApp {
    /// URL, format, quality and checkbox values
    form: FormState,
    /// Text of the folder field; parsed into `form.download_dir`
    folder_input: String,
    /// Settings loaded at startup and saved on exit
    config: Config,
    /// Progress, status label and log pane
    session: Session,
    /// yt-dlp backend shared with background jobs
    backend: Arc<dyn MediaBackend>,
    /// Runtime the background jobs are spawned on
    runtime: Arc<Runtime>,
    /// Handed to every job it starts
    events_tx: UnboundedSender<WorkerEvent>,
    /// Drained once per frame
    events_rx: UnboundedReceiver<WorkerEvent>,
    /// Preview of the last fetched video
    thumbnail: Option<egui::TextureHandle>,
}

impl YtDlpApp {
    fn new(config: Config, runtime: Arc<Runtime>) -> Self {
        let form = config.form_state();
        let (events_tx, events_rx) = unbounded_channel();
        Self {
            folder_input: form.download_dir.display().to_string(),
            form,
            backend: Arc::new(YtDlp::new(config.ytdlp_path.clone())),
            config,
            session: Session::new(),
            runtime,
            events_tx,
            events_rx,
            thumbnail: None,
        }
    }

    fn sync_folder(&mut self) {
        self.form.download_dir = PathBuf::from(self.folder_input.trim());
    }

    fn browse_folder(&mut self) {
        if let Some(folder) = FileDialog::new()
            .set_directory(&self.folder_input)
            .pick_folder()
        {
            self.folder_input = folder.display().to_string();
            self.sync_folder();
        }
    }

    fn fetch_info(&mut self) {
        let url = self.form.trimmed_url().to_owned();
        if url.is_empty() {
            show_error("Enter a video URL");
            return;
        }
        self.session.begin_info(&url);
        self.thumbnail = None;
        self.runtime.spawn(worker::run_info(
            Arc::clone(&self.backend),
            url,
            self.events_tx.clone(),
        ));
    }

    fn start_download(&mut self) {
        if !self.session.can_start() {
            return;
        }
        self.sync_folder();
        if let Err(e) = self.form.validate() {
            show_error(&e.to_string());
            return;
        }
        let url = self.form.trimmed_url().to_owned();
        let options = self.form.to_options();
        let Some((job, cancel)) = self.session.begin_download(&url) else {
            return;
        };
        info!(job, %url, format = ?options.format, "download requested");
        self.runtime.spawn(worker::run_download(
            Arc::clone(&self.backend),
            job,
            vec![url],
            options,
            cancel,
            self.events_tx.clone(),
        ));
    }

    fn spawn_thumbnail(&self, url: String) {
        let tx = self.events_tx.clone();
        self.runtime
            .spawn_blocking(move || worker::run_thumbnail(url, tx));
    }

    /// Drains the worker channel into UI state.
    fn poll_events(&mut self, ctx: &egui::Context) {
        while let Ok(event) = self.events_rx.try_recv() {
            match event {
                WorkerEvent::ThumbnailFetched { image, .. } => {
                    let tex = ctx.load_texture("thumbnail", image, TextureOptions::default());
                    self.thumbnail = Some(tex);
                }
                other => {
                    if let WorkerEvent::InfoFetched { result: Ok(info), .. } = &other {
                        if let Some(url) = info.thumbnail.clone() {
                            self.spawn_thumbnail(url);
                        }
                    }
                    self.session.apply(other);
                }
            }
        }
    }

    fn handle_shortcuts(&mut self, ctx: &egui::Context) {
        let open = KeyboardShortcut::new(Modifiers::COMMAND, Key::O);
        let clear = KeyboardShortcut::new(Modifiers::COMMAND, Key::L);
        let (enter, open, clear, escape) = ctx.input_mut(|i| {
            (
                i.key_pressed(Key::Enter),
                i.consume_shortcut(&open),
                i.consume_shortcut(&clear),
                i.key_pressed(Key::Escape),
            )
        });
        if enter {
            self.start_download();
        }
        if open {
            self.browse_folder();
        }
        if clear {
            self.session.clear_log();
        }
        if escape {
            self.session.stop();
        }
    }

    /// Asks before closing over a running download and saves settings.
    fn handle_close(&mut self, ctx: &egui::Context) {
        if !ctx.input(|i| i.viewport().close_requested()) {
            return;
        }
        if self.session.is_downloading() {
            let quit = MessageDialog::new()
                .set_level(MessageLevel::Warning)
                .set_title("Exit")
                .set_description("A download is in progress. Quit anyway?")
                .set_buttons(MessageButtons::OkCancel)
                .show();
            if !quit {
                ctx.send_viewport_cmd(egui::ViewportCommand::CancelClose);
                return;
            }
            self.session.stop();
        }
        self.sync_folder();
        self.config.update_from(&self.form);
        if let Err(e) = self.config.save() {
            warn!(error = %e, "could not save settings");
        }
    }

    fn url_section(&mut self, ui: &mut egui::Ui) {
        ui.group(|ui| {
            ui.label(RichText::new("Video URL").strong());
            ui.horizontal(|ui| {
                let width = ui.available_width() - 110.0;
                ui.add(
                    egui::TextEdit::singleline(&mut self.form.url)
                        .hint_text("https://www.youtube.com/watch?v=...")
                        .desired_width(width),
                );
                if ui.button("Fetch info").clicked() {
                    self.fetch_info();
                }
            });
        });
    }

    fn settings_section(&mut self, ui: &mut egui::Ui) {
        ui.group(|ui| {
            ui.label(RichText::new("Download settings").strong());
            ui.horizontal(|ui| {
                ui.label("Format:");
                egui::ComboBox::from_id_source("format")
                    .selected_text(self.form.format.to_string())
                    .show_ui(ui, |ui| {
                        for f in FormatChoice::ALL {
                            ui.selectable_value(&mut self.form.format, f, f.to_string());
                        }
                    });
                ui.add_space(20.0);
                ui.label("Quality:");
                egui::ComboBox::from_id_source("quality")
                    .selected_text(self.form.quality.to_string())
                    .show_ui(ui, |ui| {
                        for q in Quality::ALL {
                            ui.selectable_value(&mut self.form.quality, q, q.to_string());
                        }
                    });
            });
            ui.horizontal(|ui| {
                ui.label("Folder:");
                let width = ui.available_width() - 90.0;
                ui.add(egui::TextEdit::singleline(&mut self.folder_input).desired_width(width));
                if ui.button("Browse…").clicked() {
                    self.browse_folder();
                }
            });
        });
    }

    fn options_section(&mut self, ui: &mut egui::Ui) {
        ui.group(|ui| {
            ui.label(RichText::new("Extra options").strong());
            ui.horizontal(|ui| {
                ui.checkbox(&mut self.form.subtitles, "Download subtitles");
                ui.add_space(20.0);
                ui.checkbox(&mut self.form.thumbnail, "Download thumbnail");
                ui.add_space(20.0);
                ui.checkbox(&mut self.form.playlist, "Whole playlist");
            });
        });
    }

    fn controls(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui
                .add_enabled(self.session.can_start(), egui::Button::new("Download"))
                .clicked()
            {
                self.start_download();
            }
            if ui
                .add_enabled(self.session.can_stop(), egui::Button::new("Stop"))
                .clicked()
            {
                self.session.stop();
            }
            if ui.button("Clear log").clicked() {
                self.session.clear_log();
            }
            if ui.button("Open folder").clicked() {
                open_folder(self.folder_input.clone());
            }
        });

        ui.horizontal(|ui| {
            let width = ui.available_width() - 260.0;
            ui.add(
                egui::ProgressBar::new(self.session.progress / 100.0)
                    .desired_width(width.max(100.0))
                    .show_percentage(),
            );
            ui.label(&self.session.status);
        });
    }

    fn log_section(&self, ui: &mut egui::Ui) {
        ui.group(|ui| {
            ui.label(RichText::new("Log").strong());
            egui::ScrollArea::vertical()
                .auto_shrink([false; 2])
                .stick_to_bottom(true)
                .show(ui, |ui| {
                    for entry in self.session.log.entries() {
                        let color = match entry.level {
                            LogLevel::Info => ui.visuals().text_color(),
                            LogLevel::Success => Color32::LIGHT_GREEN,
                            LogLevel::Warning => Color32::YELLOW,
                            LogLevel::Error => Color32::LIGHT_RED,
                        };
                        ui.label(RichText::new(entry.to_string()).monospace().color(color));
                    }
                });
        });
    }
}

/// GUI update loop: called each frame to redraw and handle interactions
impl App for YtDlpApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        self.poll_events(ctx);
        self.handle_shortcuts(ctx);
        self.handle_close(ctx);

        egui::TopBottomPanel::bottom("footer").show(ctx, |ui| {
            ui.label(format!(
                "{TITLE} | YouTube, Vimeo and many other sites supported"
            ));
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.vertical(|ui| {
                    ui.set_max_width((ui.available_width() - 250.0).max(350.0));
                    self.url_section(ui);
                    self.settings_section(ui);
                    self.options_section(ui);
                });
                if let Some(tex) = &self.thumbnail {
                    ui.image(tex);
                }
            });
            ui.add_space(6.0);
            self.controls(ui);
            ui.add_space(6.0);
            self.log_section(ui);
        });

        // Request periodic repaint for progress updates
        ctx.request_repaint_after(std::time::Duration::from_millis(100));
    }
}

fn show_error(message: &str) {
    MessageDialog::new()
        .set_level(MessageLevel::Error)
        .set_title("Error")
        .set_description(message)
        .set_buttons(MessageButtons::Ok)
        .show();
}

/// Opens the download folder in the platform file manager.
fn open_folder(folder: String) {
    std::thread::spawn(move || {
        #[cfg(target_os = "windows")]
        let opener = "explorer";
        #[cfg(target_os = "macos")]
        let opener = "open";
        #[cfg(all(unix, not(target_os = "macos")))]
        let opener = "xdg-open";
        if let Err(e) = std::process::Command::new(opener).arg(&folder).spawn() {
            warn!(%folder, error = %e, "could not open folder");
        }
    });
}
