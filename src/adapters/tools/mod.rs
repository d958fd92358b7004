//! External programs. Implement MediaAnalyzer.

pub mod mediainfo;

pub use mediainfo::MediaInfoCli;
