/// Viewer panel: render status, backend URL and embed HTML for the
/// selected file.
use crate::state::{AppState, ViewState};
use egui::Ui;

/// Draw the viewer for the selected file.
pub fn viewer_panel(ui: &mut Ui, state: &mut AppState) {
    let Some(index) = state.selected else {
        ui.centered_and_justified(|ui| {
            ui.label(
                egui::RichText::new("Upload a .pstats file and select it to visualise it.")
                    .size(13.0)
                    .color(ui.visuals().weak_text_color()),
            );
        });
        return;
    };
    let Some(file) = state.files.get(index).cloned() else {
        return;
    };

    ui.heading(file.name());
    ui.label(
        egui::RichText::new(format!(
            "{} · uploaded {}",
            file.category(),
            file.uploaded_long()
        ))
        .size(12.0)
        .color(ui.visuals().weak_text_color()),
    );
    ui.separator();

    let mut retry = false;
    match state.views.get(&index) {
        None => {
            retry = ui.button("▶ Render").clicked();
        }
        Some(ViewState::Rendering) => {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label(format!("Starting {}...", state.config.backend.program));
            });
        }
        Some(ViewState::Failed(message)) => {
            ui.colored_label(ui.visuals().error_fg_color, message);
            ui.add_space(4.0);
            retry = ui.button("🔄 Retry").clicked();
        }
        Some(ViewState::Ready(view)) => {
            ui.horizontal(|ui| {
                ui.label("Serving at");
                ui.hyperlink(&view.url);
                if ui.button("📋 Copy URL").clicked() {
                    ui.ctx().copy_text(view.url.clone());
                }
            });
            ui.add_space(8.0);
            ui.label(egui::RichText::new("Embed HTML").strong());
            let mut html = view.html.clone();
            ui.add(
                egui::TextEdit::multiline(&mut html)
                    .code_editor()
                    .desired_rows(3)
                    .desired_width(f32::INFINITY)
                    .interactive(false),
            );
            if ui.button("📋 Copy HTML").clicked() {
                ui.ctx().copy_text(view.html.clone());
            }
        }
    }

    if retry {
        state.request_render(index);
    }
}
