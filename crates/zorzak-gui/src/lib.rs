/// Zorzak GUI: egui-based dashboard frontend.
///
/// This crate contains all UI code. Business logic lives in `zorzak-core`.
pub mod app;
pub mod panels;
pub mod state;
pub mod widgets;
pub mod worker;

pub use app::{ZorzakApp, ZorzakState};
