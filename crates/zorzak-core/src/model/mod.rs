/// Data model for uploaded analysis files.
///
/// - [`file`]: the immutable `AnalysisFile` record and its category.
/// - [`observer`]: a minimal synchronous publish/subscribe log.
/// - [`store`]: the in-memory file store the dashboard talks to.
pub mod file;
pub mod observer;
pub mod store;

pub use file::{AnalysisFile, AnalysisFileCategory, UnknownCategory};
pub use observer::{ChannelSubscriber, ObserverError, PublishedLog, Publisher, Subscriber, SubscriberId};
pub use store::FileStore;
