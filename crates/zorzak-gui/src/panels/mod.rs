/// Dashboard panels.
pub mod files_panel;
pub mod upload_panel;
pub mod viewer_panel;
