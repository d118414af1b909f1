/// Main `eframe::App` implementation for Zorzak.
///
/// This is the top-level UI layout that composes all panels and widgets.
use crate::panels;
use crate::state::AppState;
use crate::widgets;
use std::path::PathBuf;
use tracing::warn;
use zorzak_core::config::DashboardConfig;

/// Pre-built application state.
///
/// Construct this before calling `eframe::run_native` so preloaded files
/// are read, and the first render is queued, before the window opens.
pub struct ZorzakState {
    pub(crate) inner: AppState,
}

impl ZorzakState {
    /// Create the state and upload every file in `preload`.
    ///
    /// Files that cannot be read are reported in the status bar rather than
    /// aborting startup.
    pub fn build(config: DashboardConfig, preload: &[PathBuf]) -> Self {
        let mut state = AppState::new(config);
        for path in preload {
            if let Err(e) = state.add_file_from_path(path) {
                warn!("Skipping {}: {e:#}", path.display());
                state.last_error = Some(format!("{e:#}"));
            }
        }
        state.process_file_messages();
        Self { inner: state }
    }

    pub fn state(&self) -> &AppState {
        &self.inner
    }

    pub fn state_mut(&mut self) -> &mut AppState {
        &mut self.inner
    }
}

/// The Zorzak application.
pub struct ZorzakApp {
    state: AppState,
}

impl ZorzakApp {
    /// Create a new application instance from pre-built state.
    pub fn with_state(cc: &eframe::CreationContext<'_>, state: ZorzakState) -> Self {
        cc.egui_ctx.set_visuals(egui::Visuals::dark());
        Self { state: state.inner }
    }
}

impl eframe::App for ZorzakApp {
    /// Match the GPU clear colour to the panel background so there is no
    /// flash between frames.
    fn clear_color(&self, visuals: &egui::Visuals) -> [f32; 4] {
        visuals.panel_fill.to_normalized_gamma_f32()
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ── Apply theme ───────────────────────────────────────────────────
        if self.state.dark_mode {
            ctx.set_visuals(egui::Visuals::dark());
        } else {
            ctx.set_visuals(egui::Visuals::light());
        }

        // ── Dropped files ─────────────────────────────────────────────────
        let dropped: Vec<PathBuf> = ctx.input(|i| {
            i.raw
                .dropped_files
                .iter()
                .filter_map(|f| f.path.clone())
                .collect()
        });
        for path in dropped {
            if let Err(e) = self.state.add_file_from_path(&path) {
                warn!("Drop failed: {e:#}");
                self.state.last_error = Some(format!("{e:#}"));
            }
        }

        // ── Process background messages ───────────────────────────────────
        self.state.process_file_messages();
        self.state.process_render_messages();

        // Keep polling while a backend is starting up.
        if self.state.is_rendering() {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }

        // ── Top toolbar ───────────────────────────────────────────────────
        egui::TopBottomPanel::top("toolbar")
            .min_height(36.0)
            .show(ctx, |ui| {
                ui.add_space(4.0);
                widgets::toolbar::toolbar(ui, &mut self.state);
                ui.add_space(4.0);
            });

        // ── About dialog ──────────────────────────────────────────────────
        let mut show_about = self.state.show_about;
        egui::Window::new("About Zorzak")
            .open(&mut show_about)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .fixed_size([340.0, 0.0])
            .show(ctx, |ui| {
                let accent = ui.visuals().hyperlink_color;
                let muted = ui.visuals().weak_text_color();

                ui.vertical_centered(|ui| {
                    ui.add_space(8.0);
                    ui.label(
                        egui::RichText::new("Zorzak")
                            .size(24.0)
                            .strong()
                            .color(accent),
                    );
                    ui.add_space(4.0);
                    ui.label(
                        egui::RichText::new(format!("v{}", env!("CARGO_PKG_VERSION")))
                            .size(13.0)
                            .color(muted),
                    );
                    ui.add_space(12.0);
                    ui.label(
                        egui::RichText::new(
                            "Upload Python profiling output and explore it\n\
                             with SnakeViz.",
                        )
                        .size(12.0),
                    );
                    ui.add_space(12.0);
                    ui.separator();
                    ui.add_space(4.0);
                    ui.label(
                        egui::RichText::new("Built with Rust & egui")
                            .size(11.0)
                            .color(muted),
                    );
                    ui.add_space(8.0);
                });
            });
        self.state.show_about = show_about;

        // ── Bottom status bar ─────────────────────────────────────────────
        egui::TopBottomPanel::bottom("status_bar")
            .min_height(24.0)
            .show(ctx, |ui| {
                ui.add_space(2.0);
                widgets::status_bar::status_bar(ui, &self.state);
                ui.add_space(2.0);
            });

        // ── Left sidebar ──────────────────────────────────────────────────
        egui::SidePanel::left("left_panel")
            .default_width(420.0)
            .min_width(280.0)
            .max_width(700.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::upload_panel::upload_panel(ui, &mut self.state);
                ui.add_space(8.0);
                ui.separator();
                ui.add_space(4.0);
                panels::files_panel::files_panel(ui, &mut self.state);
            });

        // ── Central panel (viewer) ────────────────────────────────────────
        egui::CentralPanel::default().show(ctx, |ui| {
            panels::viewer_panel::viewer_panel(ui, &mut self.state);
        });
    }
}
