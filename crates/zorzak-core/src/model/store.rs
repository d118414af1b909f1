/// In-memory store of uploaded analysis files.
///
/// Files live for the lifetime of the store; there is no delete path and
/// nothing is written to disk.
use super::file::{AnalysisFile, AnalysisFileCategory};
use super::observer::{ObserverError, PublishedLog, Publisher, Subscriber, SubscriberId};
use std::sync::Arc;
use tracing::debug;

/// Upload log for the dashboard. Subscribers hear about every new file.
#[derive(Default)]
pub struct FileStore {
    log: PublishedLog<AnalysisFile>,
}

impl FileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new upload stamped with the current time and notify
    /// subscribers.
    pub fn add(
        &mut self,
        name: impl Into<String>,
        category: AnalysisFileCategory,
        content: impl Into<Vec<u8>>,
    ) -> Arc<AnalysisFile> {
        let file = AnalysisFile::new(name, category, content);
        debug!(
            name = file.name(),
            category = %category,
            size = file.size(),
            "Adding analysis file"
        );
        self.log.publish(file)
    }

    /// Files in upload order, optionally restricted to one category.
    pub fn list(&self, category: Option<AnalysisFileCategory>) -> Vec<Arc<AnalysisFile>> {
        self.log
            .items()
            .iter()
            .filter(|f| category.map_or(true, |c| f.category() == c))
            .cloned()
            .collect()
    }

    /// File at position `index` in upload order.
    pub fn get(&self, index: usize) -> Option<&Arc<AnalysisFile>> {
        self.log.items().get(index)
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    pub fn attach(&mut self, subscriber: Arc<dyn Subscriber<AnalysisFile>>) -> SubscriberId {
        self.log.attach(subscriber)
    }

    pub fn detach(
        &mut self,
        id: SubscriberId,
    ) -> Result<Arc<dyn Subscriber<AnalysisFile>>, ObserverError> {
        self.log.detach(id)
    }
}
