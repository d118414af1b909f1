/// Files panel: table of uploaded files with a category filter.
use crate::state::{AppState, ViewState};
use egui::Ui;
use egui_extras::{Column, TableBuilder};
use zorzak_core::model::AnalysisFileCategory;

const ROW_HEIGHT: f32 = 22.0;

/// Draw the file table. Clicking a row selects (and renders) that file.
pub fn files_panel(ui: &mut Ui, state: &mut AppState) {
    ui.horizontal(|ui| {
        ui.heading("Files");
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            let label = state.category_filter.map_or("All", |c| c.label());
            egui::ComboBox::from_id_salt("category_filter")
                .selected_text(label)
                .show_ui(ui, |ui| {
                    ui.selectable_value(&mut state.category_filter, None, "All");
                    for category in AnalysisFileCategory::ALL {
                        ui.selectable_value(
                            &mut state.category_filter,
                            Some(category),
                            category.label(),
                        );
                    }
                });
        });
    });
    ui.add_space(4.0);

    let rows = state.visible_files();
    if rows.is_empty() {
        ui.label(
            egui::RichText::new("No files uploaded yet.")
                .size(12.0)
                .color(ui.visuals().weak_text_color()),
        );
        return;
    }

    let mut clicked = None;
    TableBuilder::new(ui)
        .striped(true)
        .sense(egui::Sense::click())
        .column(Column::remainder().at_least(120.0).clip(true))
        .column(Column::auto())
        .column(Column::auto())
        .column(Column::auto())
        .column(Column::exact(18.0))
        .header(ROW_HEIGHT, |mut header| {
            header.col(|ui| {
                ui.strong("Name");
            });
            header.col(|ui| {
                ui.strong("Category");
            });
            header.col(|ui| {
                ui.strong("Size");
            });
            header.col(|ui| {
                ui.strong("Uploaded");
            });
            header.col(|_| {});
        })
        .body(|mut body| {
            for (index, file) in &rows {
                body.row(ROW_HEIGHT, |mut row| {
                    row.set_selected(state.selected == Some(*index));
                    row.col(|ui| {
                        ui.label(file.name());
                    });
                    row.col(|ui| {
                        ui.label(file.category().label());
                    });
                    row.col(|ui| {
                        ui.label(human_size(file.size()));
                    });
                    row.col(|ui| {
                        ui.label(file.uploaded_short())
                            .on_hover_text(file.uploaded_long());
                    });
                    row.col(|ui| match state.views.get(index) {
                        Some(ViewState::Rendering) => {
                            ui.spinner();
                        }
                        Some(ViewState::Failed(message)) => {
                            ui.colored_label(ui.visuals().error_fg_color, "⚠")
                                .on_hover_text(message);
                        }
                        _ => {}
                    });
                    if row.response().clicked() {
                        clicked = Some(*index);
                    }
                });
            }
        });

    if let Some(index) = clicked {
        state.select(index);
    }
}

fn human_size(bytes: usize) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}
