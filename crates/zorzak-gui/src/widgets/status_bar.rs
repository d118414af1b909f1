/// Bottom status bar: file count, render activity and the last error.
use crate::state::{AppState, ViewState};
use egui::Ui;

/// Draw the status bar at the bottom of the window.
pub fn status_bar(ui: &mut Ui, state: &AppState) {
    let color_weak = ui.visuals().weak_text_color();
    let color_normal = ui.visuals().text_color();
    let color_error = ui.visuals().error_fg_color;
    let color_success = egui::Color32::from_rgb(0xa6, 0xe3, 0xa1);

    let rendering = state
        .views
        .values()
        .filter(|v| matches!(v, ViewState::Rendering))
        .count();
    let ready = state
        .views
        .values()
        .filter(|v| matches!(v, ViewState::Ready(_)))
        .count();

    ui.horizontal(|ui| {
        if rendering > 0 {
            ui.spinner();
            ui.label(
                egui::RichText::new(format!("Rendering {rendering}..."))
                    .size(12.0)
                    .color(color_normal),
            );
        } else {
            ui.label(egui::RichText::new("Ready").size(12.0).color(color_weak));
        }

        ui.separator();

        let noun = if state.files.len() == 1 { "file" } else { "files" };
        ui.label(
            egui::RichText::new(format!("{} {noun}", state.files.len()))
                .size(12.0)
                .color(color_normal),
        );

        if ready > 0 {
            ui.separator();
            ui.label(
                egui::RichText::new(format!("{ready} serving"))
                    .size(12.0)
                    .color(color_success),
            );
        }

        if let Some(ref error) = state.last_error {
            ui.separator();
            ui.label(
                egui::RichText::new(truncate(error, 120))
                    .size(12.0)
                    .color(color_error),
            )
            .on_hover_text(error);
        }
    });
}

/// Cut `text` to at most `max_chars` characters, ending with "..." when
/// shortened.
fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_owned();
    }
    let kept: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{kept}...")
}
