#![forbid(unsafe_code)]

pub mod error;
pub mod progress_service;

pub use fiszki_core::Clock;

pub use error::ProgressError;
pub use progress_service::{CategoryProgress, OverallStats, ProgressService};
