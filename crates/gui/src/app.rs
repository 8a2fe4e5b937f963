//! Main window

use std::path::{Path, PathBuf};

use color_schemes::{ColorScheme, SchemeRegistry};
use eframe::egui;
use pdf_core::{Color, PdfDocument};
use recolor::{
    default_output_path, render_preview, Config, ConvertOptions, Converter, Mode, PreviewImage,
};
use tracing::{debug, warn};

use crate::dialog::{Dialog, DialogKind};
use crate::worker::{progress_label, ConversionJob, WorkerMessage};

/// Largest size the first-page preview is drawn at
const PREVIEW_SIZE: egui::Vec2 = egui::vec2(400.0, 500.0);

/// The PDF picked for conversion
struct LoadedDocument {
    path: PathBuf,
    pages: usize,
}

pub struct RecolorApp {
    config: Config,
    registry: SchemeRegistry,
    scheme_key: String,
    mode: Mode,
    input_text: String,
    output_text: String,
    loaded: Option<LoadedDocument>,
    preview: Option<egui::TextureHandle>,
    preview_note: String,
    /// Opened on the next frame, once a context exists for the preview texture
    pending_open: Option<PathBuf>,
    job: Option<ConversionJob>,
    status: String,
    dialog: Option<Dialog>,
}

impl RecolorApp {
    pub fn new(config: Config, initial: Option<PathBuf>) -> recolor::Result<Self> {
        let registry = config.registry()?;
        let scheme_key = match registry.get(&config.convert.scheme) {
            Ok(scheme) => scheme.key.clone(),
            Err(e) => {
                warn!(error = %e, "configured scheme unavailable; using the first one");
                registry.names().first().map(|k| k.to_string()).unwrap_or_default()
            }
        };

        Ok(Self {
            mode: config.convert.mode,
            config,
            registry,
            scheme_key,
            input_text: String::new(),
            output_text: String::new(),
            loaded: None,
            preview: None,
            preview_note: "Select a PDF file to see preview".to_string(),
            pending_open: initial,
            job: None,
            status: String::new(),
            dialog: None,
        })
    }

    fn scheme(&self) -> Option<&ColorScheme> {
        self.registry.get(&self.scheme_key).ok()
    }

    fn is_busy(&self) -> bool {
        self.job.is_some()
    }

    /// Validate and load a PDF, then show its first page
    fn open(&mut self, ctx: &egui::Context, path: PathBuf) {
        self.input_text = path.display().to_string();

        let doc = match PdfDocument::open(&path) {
            Ok(doc) => doc,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not open input");
                self.dialog = Some(Dialog::open_failed(&e));
                return;
            }
        };
        let pages = doc.page_count();
        debug!(path = %path.display(), pages, "opened input");

        self.output_text = default_output_path(&path).display().to_string();
        self.refresh_preview(ctx, &path);
        self.loaded = Some(LoadedDocument { path, pages });
    }

    fn refresh_preview(&mut self, ctx: &egui::Context, path: &Path) {
        self.preview = None;
        let rendered = std::fs::read(path)
            .map_err(|e| e.to_string())
            .and_then(|bytes| {
                render_preview(&bytes, self.config.preview.page, self.config.preview.dpi)
                    .map_err(|e| e.to_string())
            })
            .and_then(|image| preview_texture(ctx, &image));

        match rendered {
            Ok(texture) => {
                self.preview = Some(texture);
                self.preview_note.clear();
            }
            Err(e) => {
                warn!(error = %e, "preview failed");
                self.preview_note = format!("Preview error: {e}");
            }
        }
    }

    fn start_conversion(&mut self, ctx: &egui::Context) {
        let Some(loaded) = &self.loaded else {
            self.dialog = Some(Dialog {
                kind: DialogKind::Warning,
                title: "No File".to_string(),
                message: "Please select a PDF file first.".to_string(),
            });
            return;
        };
        let Some(scheme) = self.scheme().cloned() else {
            return;
        };

        let output = match self.output_text.trim() {
            "" => default_output_path(&loaded.path),
            text => PathBuf::from(text),
        };
        let options = ConvertOptions::new(scheme)
            .with_mode(self.mode)
            .with_replace_page_fills(self.config.convert.replace_page_fills)
            .with_compression(self.config.convert.compress);

        let repaint = ctx.clone();
        self.status = "Converting PDF colors...".to_string();
        self.job = Some(ConversionJob::spawn(
            Converter::new(options),
            loaded.path.clone(),
            output,
            move || repaint.request_repaint(),
        ));
    }

    fn poll_job(&mut self) {
        let Some(job) = self.job.as_mut() else {
            return;
        };
        for message in job.poll() {
            match message {
                WorkerMessage::Progress(event) => {
                    if let Some(label) = progress_label(event) {
                        self.status = label;
                    }
                }
                WorkerMessage::Done(dialog) => self.dialog = Some(dialog),
            }
        }
        if job.is_finished() {
            self.job = None;
            self.status.clear();
        }
    }

    fn file_group(&mut self, ui: &mut egui::Ui) -> Option<PathBuf> {
        let mut requested = None;
        ui.group(|ui| {
            ui.label(egui::RichText::new("1. Select PDF File").strong());
            ui.horizontal(|ui| {
                ui.label("Input:");
                let edit = ui.text_edit_singleline(&mut self.input_text);
                let submitted = edit.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                if ui.button("Open").clicked() || submitted {
                    requested = Some(PathBuf::from(self.input_text.trim()));
                }
            });
            ui.horizontal(|ui| {
                ui.label("Output:");
                ui.text_edit_singleline(&mut self.output_text);
            });
            match &self.loaded {
                Some(loaded) => ui.label(format!(
                    "{} ({} pages)",
                    file_label(&loaded.path),
                    loaded.pages
                )),
                None => ui.weak("No file selected (type a path or drop a PDF on the window)"),
            };
        });
        requested
    }

    fn scheme_group(&mut self, ui: &mut egui::Ui) {
        ui.group(|ui| {
            ui.label(egui::RichText::new("2. Choose Color Scheme").strong());
            let keys: Vec<String> = self.registry.names().iter().map(|k| k.to_string()).collect();
            egui::ComboBox::from_id_source("scheme")
                .selected_text(self.scheme_key.as_str())
                .show_ui(ui, |ui| {
                    for key in keys {
                        let label = key.clone();
                        ui.selectable_value(&mut self.scheme_key, key, label);
                    }
                });

            ui.horizontal(|ui| {
                ui.radio_value(&mut self.mode, Mode::Remap, "Keep images (remap)");
                ui.radio_value(&mut self.mode, Mode::Rebuild, "Text only (rebuild)");
            });

            if let Some(scheme) = self.scheme() {
                egui::Frame::none()
                    .fill(color32(scheme.background))
                    .inner_margin(egui::Margin::same(8.0))
                    .show(ui, |ui| {
                        ui.colored_label(color32(scheme.text), scheme.describe());
                    });
            }
        });
    }

    fn preview_group(&self, ui: &mut egui::Ui) {
        ui.group(|ui| {
            ui.label(egui::RichText::new("3. Preview").strong());
            egui::ScrollArea::both().max_height(PREVIEW_SIZE.y).show(ui, |ui| {
                match &self.preview {
                    Some(texture) => {
                        ui.add(egui::Image::new(texture).max_size(PREVIEW_SIZE));
                    }
                    None => {
                        ui.weak(egui::RichText::new(&self.preview_note).italics());
                    }
                }
            });
        });
    }

    fn dialog_window(&mut self, ctx: &egui::Context) {
        let Some(dialog) = &self.dialog else {
            return;
        };
        let mut close = false;
        egui::Window::new(dialog.title.as_str())
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                let color = match dialog.kind {
                    DialogKind::Info => ui.visuals().text_color(),
                    DialogKind::Warning => ui.visuals().warn_fg_color,
                    DialogKind::Error => ui.visuals().error_fg_color,
                };
                ui.colored_label(color, &dialog.message);
                ui.add_space(8.0);
                if ui.button("OK").clicked() {
                    close = true;
                }
            });
        if close {
            self.dialog = None;
        }
    }
}

impl eframe::App for RecolorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_job();

        let dropped = ctx.input(|i| i.raw.dropped_files.first().and_then(|f| f.path.clone()));
        if let Some(path) = self.pending_open.take().or(dropped) {
            if !self.is_busy() {
                self.open(ctx, path);
            }
        }

        let busy = self.is_busy();
        let mut requested = None;
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| ui.heading("PDF Color Scheme Converter"));
            ui.add_space(8.0);

            ui.add_enabled_ui(!busy, |ui| {
                requested = self.file_group(ui);
                self.scheme_group(ui);
            });
            self.preview_group(ui);

            ui.add_space(8.0);
            ui.vertical_centered(|ui| {
                let convert = egui::Button::new("Convert PDF");
                if ui.add_enabled(!busy && self.loaded.is_some(), convert).clicked() {
                    self.start_conversion(ctx);
                }
                if busy {
                    ui.horizontal(|ui| {
                        ui.add(egui::Spinner::new());
                        ui.label(&self.status);
                    });
                }
            });
        });

        if let Some(path) = requested {
            self.open(ctx, path);
        }
        self.dialog_window(ctx);
    }
}

fn preview_texture(ctx: &egui::Context, preview: &PreviewImage) -> Result<egui::TextureHandle, String> {
    let rgba = image::load_from_memory(&preview.png)
        .map_err(|e| e.to_string())?
        .to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    let image = egui::ColorImage::from_rgba_unmultiplied(size, rgba.as_raw());
    Ok(ctx.load_texture("preview", image, egui::TextureOptions::LINEAR))
}

fn color32(color: Color) -> egui::Color32 {
    let [r, g, b] = color.to_rgb8();
    egui::Color32::from_rgb(r, g, b)
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_configured_scheme_is_preselected() {
        let mut config = Config::default();
        config.convert.scheme = "green-tint".to_string();
        config.convert.mode = Mode::Rebuild;

        let app = RecolorApp::new(config, None).unwrap();
        assert_eq!(app.scheme_key, "Green Tint");
        assert_eq!(app.mode, Mode::Rebuild);
        assert!(!app.is_busy());
    }

    #[test]
    fn test_unknown_configured_scheme_falls_back() {
        let mut config = Config::default();
        config.convert.scheme = "Nope".to_string();

        let app = RecolorApp::new(config, None).unwrap();
        assert_eq!(Some(app.scheme_key.as_str()), app.registry.names().first().copied());
    }

    #[test]
    fn test_scheme_colors_convert_to_egui() {
        let white = color32(Color::white());
        assert_eq!(white, egui::Color32::from_rgb(255, 255, 255));
        assert_eq!(file_label(Path::new("/docs/paper.pdf")), "paper.pdf");
    }
}
