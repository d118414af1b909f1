/// Background render worker.
///
/// Rendering starts a backend and blocks until it reports a URL, so it never
/// runs on the UI thread. All requests go through one worker thread, which
/// also keeps at most one capture session open at a time.
use crossbeam_channel::{Receiver, Sender};
use std::sync::Arc;
use std::thread;
use tracing::{info, warn};
use zorzak_core::config::DashboardConfig;
use zorzak_core::model::AnalysisFile;
use zorzak_core::render::{render_file, RenderedView};

/// One file to render. `index` is the file's position in upload order.
struct RenderRequest {
    index: usize,
    file: Arc<AnalysisFile>,
}

/// Result of a render request.
#[derive(Debug, Clone)]
pub enum RenderMessage {
    Rendered { index: usize, view: RenderedView },
    Failed { index: usize, message: String },
}

/// Handle to the render thread. Dropping it stops the thread once the
/// current request is done.
pub struct RenderWorker {
    request_tx: Sender<RenderRequest>,
    /// Results, drained by the UI once per frame.
    pub result_rx: Receiver<RenderMessage>,
    _thread: thread::JoinHandle<()>,
}

impl RenderWorker {
    /// Spawn the render thread.
    pub fn start(config: DashboardConfig) -> Self {
        let (request_tx, request_rx) = crossbeam_channel::unbounded::<RenderRequest>();
        let (result_tx, result_rx) = crossbeam_channel::unbounded();

        let thread = thread::Builder::new()
            .name("zorzak-renderer".into())
            .spawn(move || {
                for request in request_rx {
                    let name = request.file.name().to_owned();
                    let message = match render_file(&request.file, &config) {
                        Ok(view) => RenderMessage::Rendered {
                            index: request.index,
                            view,
                        },
                        Err(e) => {
                            warn!(file = %name, "Render failed: {e}");
                            RenderMessage::Failed {
                                index: request.index,
                                message: format!("{name}: {e}"),
                            }
                        }
                    };
                    if result_tx.send(message).is_err() {
                        break;
                    }
                }
                info!("Render worker stopped");
            })
            .expect("failed to spawn render worker thread");

        Self {
            request_tx,
            result_rx,
            _thread: thread,
        }
    }

    /// Queue `file` for rendering. Returns `false` if the worker is gone.
    pub fn request(&self, index: usize, file: Arc<AnalysisFile>) -> bool {
        self.request_tx.send(RenderRequest { index, file }).is_ok()
    }
}
