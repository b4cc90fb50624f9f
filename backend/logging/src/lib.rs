//! Structured logging for StudyBuddy binaries.

pub mod logger;

pub use logger::{build_filter, init_logger, LogOptions};
