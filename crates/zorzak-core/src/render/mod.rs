/// Renderers turn an uploaded file into something the dashboard can embed.
///
/// Each [`AnalysisFileCategory`] maps to one [`Renderer`] via
/// [`renderer_for`]. Rendering may start a long-lived local backend; the
/// returned [`RenderedView`] carries the URL it reported plus ready-made
/// embed HTML.
pub mod backend;
pub mod snakeviz;

pub use snakeviz::SnakevizRenderer;

use crate::capture::CaptureError;
use crate::config::DashboardConfig;
use crate::model::{AnalysisFile, AnalysisFileCategory};
use crate::ports::PortError;
use std::time::Duration;
use thiserror::Error;

/// Output of a successful render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedView {
    /// Address the backend is serving the visualization on.
    pub url: String,
    /// `<iframe>` embedding `url`.
    pub html: String,
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Ports(#[from] PortError),

    #[error("failed to stage '{name}' for the backend: {source}")]
    TempFile {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Launch(#[from] CaptureError),

    #[error("backend for '{name}' did not report a URL within {timeout:?}")]
    UrlNotFound { name: String, timeout: Duration },
}

/// Produces a view of one analysis file.
pub trait Renderer: Send + Sync {
    fn render(&self, file: &AnalysisFile) -> Result<RenderedView, RenderError>;
}

/// The renderer responsible for `category`.
pub fn renderer_for(category: AnalysisFileCategory, config: &DashboardConfig) -> Box<dyn Renderer> {
    match category {
        AnalysisFileCategory::Pstats => Box::new(SnakevizRenderer::new(config)),
    }
}

/// Render `file` with the renderer for its category.
pub fn render_file(file: &AnalysisFile, config: &DashboardConfig) -> Result<RenderedView, RenderError> {
    renderer_for(file.category(), config).render(file)
}

/// `<iframe>` markup embedding `url` at full width.
pub fn iframe_html(url: &str) -> String {
    format!(
        r#"<iframe src="{}" width="100%" height="800" frameborder="0"></iframe>"#,
        escape_attr(url)
    )
}

fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iframe_embeds_the_url() {
        assert_eq!(
            iframe_html("http://127.0.0.1:8080/snakeviz/x"),
            r#"<iframe src="http://127.0.0.1:8080/snakeviz/x" width="100%" height="800" frameborder="0"></iframe>"#
        );
    }

    #[test]
    fn iframe_escapes_attribute_breakers() {
        let html = iframe_html(r#"http://h/a?b=1&c="><script>"#);
        assert!(html.contains("a?b=1&amp;c=&quot;&gt;&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn port_errors_pass_through_unchanged() {
        let err = RenderError::from(PortError::Exhausted { min: 1, max: 1 });
        assert_eq!(err.to_string(), "no free port in range 1..1");
    }
}
