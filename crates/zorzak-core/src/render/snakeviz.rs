/// SnakeViz renderer for `pstats` files.
///
/// Each render stages the file content in a temporary `.pstats` file,
/// starts a backend on a freshly allocated port and waits for it to print
/// the URL it is serving. The backend keeps running after the render
/// returns; the temporary file is removed once the backend exits.
use super::backend::{expand_args, run_backend};
use super::{iframe_html, RenderError, RenderedView, Renderer};
use crate::capture::TaskArgs;
use crate::config::{BackendConfig, DashboardConfig, LaunchSettings, PortRange};
use crate::launcher::launch_until_pattern;
use crate::model::AnalysisFile;
use crate::ports;
use regex::Regex;
use std::io::Write;
use std::path::Path;
use std::sync::OnceLock;
use tracing::info;

/// Matches `scheme://host[:port]/path` in backend output.
fn url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"https?://[^\s/:]+(?::\d+)?/\S*").expect("URL pattern is valid")
    })
}

#[derive(Debug, Clone)]
pub struct SnakevizRenderer {
    ports: PortRange,
    launch: LaunchSettings,
    backend: BackendConfig,
}

impl SnakevizRenderer {
    pub fn new(config: &DashboardConfig) -> Self {
        Self {
            ports: config.ports,
            launch: config.launch,
            backend: config.backend.clone(),
        }
    }

    /// Command-line arguments for a backend serving `staged` on `port`.
    fn backend_args(&self, staged: &Path, port: u16) -> TaskArgs {
        TaskArgs {
            positional: expand_args(&self.backend.args, staged, port, &self.backend.host),
            ..TaskArgs::new()
        }
    }
}

impl Renderer for SnakevizRenderer {
    fn render(&self, file: &AnalysisFile) -> Result<RenderedView, RenderError> {
        let port = ports::allocate_port_for(&self.backend.host, self.ports.min, self.ports.max)?;

        let stage_err = |source| RenderError::TempFile {
            name: file.name().to_owned(),
            source,
        };
        let mut staged = tempfile::Builder::new()
            .prefix("zorzak-")
            .suffix(".pstats")
            .tempfile()
            .map_err(stage_err)?;
        staged
            .write_all(file.content())
            .and_then(|()| staged.flush())
            .map_err(stage_err)?;
        let staged = staged.into_temp_path();

        let args = self.backend_args(&staged, port);

        info!(
            file = file.name(),
            port,
            program = %self.backend.program,
            "Launching visualization backend"
        );

        let program = self.backend.program.clone();
        let options = self.launch.options();
        let found = launch_until_pattern(
            format!("snakeviz-{port}"),
            move |args: TaskArgs| {
                let result = run_backend(&program, &args.positional);
                // The staged file must outlive the backend that reads it.
                drop(staged);
                result
            },
            args,
            url_pattern(),
            options,
        )?;

        let url = found
            .ok_or_else(|| RenderError::UrlNotFound {
                name: file.name().to_owned(),
                timeout: options.timeout,
            })?
            .as_str()
            .to_owned();

        info!(file = file.name(), %url, "Visualization ready");
        Ok(RenderedView {
            html: iframe_html(&url),
            url,
        })
    }
}
