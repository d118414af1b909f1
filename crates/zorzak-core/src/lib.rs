/// Zorzak Core: output capture, backend launching, and the file model.
///
/// This crate contains all business logic with zero UI dependencies.
/// The dashboard crate only wires these pieces to widgets.
///
/// # Modules
///
/// - [`capture`]: Background tasks with process-wide console capture.
/// - [`launcher`]: Poll captured output for a pattern (e.g. a URL) with a timeout.
/// - [`ports`]: Process-wide free-port allocation.
/// - [`model`]: Uploaded analysis files and the publish/subscribe log.
/// - [`render`]: Category renderers that turn a file into embeddable HTML.
/// - [`config`]: Dashboard configuration.
pub mod capture;
pub mod config;
pub mod launcher;
pub mod model;
pub mod ports;
pub mod render;
