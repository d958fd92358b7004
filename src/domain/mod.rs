//! Core domain layer. No external I/O dependencies.
//!
//! Entities and business rules live here. Dependencies flow inward.

pub mod analysis;
pub mod caption;
pub mod command;
pub mod entities;
pub mod errors;
pub mod scan;
pub mod summary;

pub use analysis::{AnalysisResult, Track, TrackKind};
pub use entities::{Chat, ChatRef, MediaReference, MediaType, Message, MessageHandle};
pub use errors::{AnalysisError, DomainError};
pub use scan::{FailureReason, ProcessingOutcome, ScanAbort, ScanEnd, ScanProgress};
pub use summary::Summary;
