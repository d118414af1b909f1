/// Top action bar -- branding, re-render, theme toggle and about.
use crate::state::{AppState, ViewState};
use egui::Ui;

/// Draw the toolbar.
pub fn toolbar(ui: &mut Ui, state: &mut AppState) {
    ui.horizontal(|ui| {
        ui.label(
            egui::RichText::new("Zorzak")
                .size(18.0)
                .strong()
                .color(ui.visuals().hyperlink_color),
        );

        ui.separator();

        // Re-render starts another backend for the selected file; the
        // previous one keeps running and keeps its port.
        let can_rerender = state.selected.is_some()
            && !matches!(state.selected_view(), Some(ViewState::Rendering));
        if ui
            .add_enabled(
                can_rerender,
                egui::Button::new("🔄 Re-render").min_size(egui::vec2(90.0, 28.0)),
            )
            .on_hover_text(
                "Start a fresh backend for the selected file.\n\
                 The previous backend keeps running, so each re-render uses another port.",
            )
            .clicked()
        {
            if let Some(index) = state.selected {
                state.request_render(index);
            }
        }

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui.button("ℹ").on_hover_text("About Zorzak").clicked() {
                state.show_about = true;
            }

            let theme_label = if state.dark_mode { "☀" } else { "🌙" };
            let theme_tip = if state.dark_mode {
                "Switch to light mode"
            } else {
                "Switch to dark mode"
            };
            if ui.button(theme_label).on_hover_text(theme_tip).clicked() {
                state.dark_mode = !state.dark_mode;
            }

            ui.separator();

            let range = &state.config.ports;
            let total = usize::from(range.max.saturating_sub(range.min));
            ui.label(
                egui::RichText::new(format!("ports {}/{total} used", state.ports_in_use()))
                    .size(11.0)
                    .color(ui.visuals().weak_text_color()),
            )
            .on_hover_text(format!("Backend port range {}..{}", range.min, range.max));
        });
    });
}
