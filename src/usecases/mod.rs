//! Application use cases. Orchestrate domain logic via ports.

pub mod commands;
pub mod dispatcher;
pub mod history_scanner;
pub mod item_processor;
pub mod status;

pub use commands::{DirectUploadHandler, ProcessHistoryHandler, StartHandler};
pub use dispatcher::{Dispatcher, Route, Scope};
pub use history_scanner::{HistoryScanner, ScanReport, ScanSettings};
pub use item_processor::{ItemProcessor, ProcessorSettings};
pub use status::ReplyStatus;
