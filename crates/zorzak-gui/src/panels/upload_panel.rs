/// Upload panel: path entry and category picker in the left sidebar.
use crate::state::AppState;
use egui::Ui;
use zorzak_core::model::AnalysisFileCategory;

/// Draw the upload form.
pub fn upload_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Upload");
    ui.add_space(4.0);

    let mut submit = false;
    ui.horizontal(|ui| {
        let edit = ui.add(
            egui::TextEdit::singleline(&mut state.upload_path)
                .hint_text("/path/to/profile.pstats")
                .desired_width(ui.available_width() - 90.0),
        );
        if edit.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
            submit = true;
        }
        if ui
            .add_enabled(
                !state.upload_path.trim().is_empty(),
                egui::Button::new("➕ Add file"),
            )
            .clicked()
        {
            submit = true;
        }
    });

    ui.horizontal(|ui| {
        ui.label("Category");
        egui::ComboBox::from_id_salt("upload_category")
            .selected_text(state.upload_category.label())
            .show_ui(ui, |ui| {
                for category in AnalysisFileCategory::ALL {
                    ui.selectable_value(&mut state.upload_category, category, category.label());
                }
            });
    });

    ui.label(
        egui::RichText::new("Files can also be dropped onto the window.")
            .size(11.0)
            .color(ui.visuals().weak_text_color()),
    );

    if submit {
        state.submit_upload();
    }
}
