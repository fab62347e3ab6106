#![forbid(unsafe_code)]

//! Core domain model and business logic for the adherence tracker.
//!
//! This crate provides:
//! - Domain types (measurements, medications, refills, gaps)
//! - Measurement log
//! - Adherence engine (supply status and gap detection)
//! - Persistence (tracker snapshot, CSV export/import)
//! - Configuration and logging setup

pub mod types;
pub mod error;
pub mod dates;
pub mod measurements;
pub mod engine;
pub mod config;
pub mod logging;
pub mod state;
pub mod export;
pub mod sample;

// Re-export commonly used types
pub use error::{Error, Field, Result, ValidationError};
pub use types::*;
pub use measurements::MeasurementLog;
pub use engine::{find_gaps, AdherenceEngine, DEFAULT_GAP_TOLERANCE_DAYS};
pub use config::Config;
pub use state::{Tracker, TRACKER_FILE};
pub use export::ImportReport;
pub use sample::demo_tracker;
