/// Application state management.
///
/// Centralises all mutable state that the UI reads and writes. New uploads
/// reach the UI through a channel subscriber on the [`FileStore`]; render
/// results come back from the [`RenderWorker`]. Both channels are drained
/// once per frame.
use crate::worker::{RenderMessage, RenderWorker};
use anyhow::Context;
use crossbeam_channel::Receiver;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use zorzak_core::config::DashboardConfig;
use zorzak_core::model::{AnalysisFile, AnalysisFileCategory, ChannelSubscriber, FileStore};
use zorzak_core::render::RenderedView;

/// Maximum messages drained from each channel per frame.
const MAX_MESSAGES_PER_FRAME: usize = 100;

/// Render status of one file.
#[derive(Debug, Clone)]
pub enum ViewState {
    /// Waiting for the backend to report its URL.
    Rendering,
    Ready(RenderedView),
    Failed(String),
}

/// All application state.
pub struct AppState {
    pub config: DashboardConfig,
    pub store: FileStore,
    file_rx: Receiver<Arc<AnalysisFile>>,
    worker: RenderWorker,

    // ── Files ──────────────────────────────────────────
    /// Uploaded files in upload order, as seen by this UI.
    pub files: Vec<Arc<AnalysisFile>>,
    pub selected: Option<usize>,
    /// Render status keyed by position in `files`.
    pub views: HashMap<usize, ViewState>,

    // ── Upload form ────────────────────────────────────
    pub upload_path: String,
    pub upload_category: AnalysisFileCategory,
    pub category_filter: Option<AnalysisFileCategory>,

    // ── UI state ───────────────────────────────────────
    pub last_error: Option<String>,
    pub dark_mode: bool,
    pub show_about: bool,
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Self {
        let mut store = FileStore::new();
        let (subscriber, file_rx) = ChannelSubscriber::<AnalysisFile>::new();
        store.attach(Arc::new(subscriber));
        let worker = RenderWorker::start(config.clone());

        Self {
            config,
            store,
            file_rx,
            worker,
            files: Vec::new(),
            selected: None,
            views: HashMap::new(),
            upload_path: String::new(),
            upload_category: AnalysisFileCategory::Pstats,
            category_filter: None,
            last_error: None,
            dark_mode: true,
            show_about: false,
        }
    }

    /// Add an in-memory file to the store.
    pub fn add_file(
        &mut self,
        name: impl Into<String>,
        category: AnalysisFileCategory,
        content: impl Into<Vec<u8>>,
    ) -> Arc<AnalysisFile> {
        self.store.add(name, category, content)
    }

    /// Read `path` from disk and add it to the store.
    ///
    /// The category is inferred from the extension, falling back to the
    /// category picked in the upload form.
    pub fn add_file_from_path(&mut self, path: &Path) -> anyhow::Result<Arc<AnalysisFile>> {
        let content =
            std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let category = AnalysisFileCategory::from_file_name(&name).unwrap_or(self.upload_category);
        info!(name = %name, %category, size = content.len(), "Uploading file");
        Ok(self.add_file(name, category, content))
    }

    /// Add the file named in the upload form.
    ///
    /// On success the form is cleared; on failure the error is shown in the
    /// status bar and the path is kept for correction.
    pub fn submit_upload(&mut self) {
        let path = self.upload_path.trim().to_owned();
        if path.is_empty() {
            self.last_error = Some("Enter a file path to upload".into());
            return;
        }
        match self.add_file_from_path(Path::new(&path)) {
            Ok(_) => {
                self.upload_path.clear();
                self.last_error = None;
            }
            Err(e) => {
                warn!("Upload failed: {e:#}");
                self.last_error = Some(format!("{e:#}"));
            }
        }
    }

    /// Pull newly published files into `files`. Called once per frame.
    ///
    /// The first file to arrive is selected automatically.
    /// Returns `true` if anything changed.
    pub fn process_file_messages(&mut self) -> bool {
        let mut changed = false;
        for file in self.file_rx.try_iter().take(MAX_MESSAGES_PER_FRAME) {
            self.files.push(file);
            changed = true;
        }
        if changed && self.selected.is_none() {
            self.select(0);
        }
        changed
    }

    /// Select a file and render it if it has not been rendered yet.
    pub fn select(&mut self, index: usize) {
        if index >= self.files.len() {
            return;
        }
        self.selected = Some(index);
        if !self.views.contains_key(&index) {
            self.request_render(index);
        }
    }

    /// Queue a (re-)render of the file at `index`.
    pub fn request_render(&mut self, index: usize) {
        let Some(file) = self.files.get(index).cloned() else {
            return;
        };
        if matches!(self.views.get(&index), Some(ViewState::Rendering)) {
            return;
        }
        if self.worker.request(index, file) {
            self.views.insert(index, ViewState::Rendering);
        } else {
            self.views
                .insert(index, ViewState::Failed("render worker is not running".into()));
        }
    }

    /// Apply finished renders. Called once per frame.
    ///
    /// Returns `true` if anything changed.
    pub fn process_render_messages(&mut self) -> bool {
        let mut changed = false;
        let messages: Vec<RenderMessage> = self
            .worker
            .result_rx
            .try_iter()
            .take(MAX_MESSAGES_PER_FRAME)
            .collect();
        for message in messages {
            changed = true;
            match message {
                RenderMessage::Rendered { index, view } => {
                    self.views.insert(index, ViewState::Ready(view));
                }
                RenderMessage::Failed { index, message } => {
                    self.last_error = Some(message.clone());
                    self.views.insert(index, ViewState::Failed(message));
                }
            }
        }
        changed
    }

    /// `true` while any render is in flight.
    pub fn is_rendering(&self) -> bool {
        self.views
            .values()
            .any(|v| matches!(v, ViewState::Rendering))
    }

    /// Ports of the configured range claimed by backends so far.
    ///
    /// Backends are never stopped, so every render (including a re-render of
    /// the same file) keeps its port until the process exits.
    pub fn ports_in_use(&self) -> usize {
        zorzak_core::ports::global().claimed_in(self.config.ports.min, self.config.ports.max)
    }

    /// Files passing the category filter, with their indices.
    pub fn visible_files(&self) -> Vec<(usize, Arc<AnalysisFile>)> {
        self.files
            .iter()
            .enumerate()
            .filter(|(_, f)| self.category_filter.map_or(true, |c| f.category() == c))
            .map(|(i, f)| (i, f.clone()))
            .collect()
    }

    pub fn selected_file(&self) -> Option<&Arc<AnalysisFile>> {
        self.files.get(self.selected?)
    }

    pub fn selected_view(&self) -> Option<&ViewState> {
        self.views.get(&self.selected?)
    }
}
