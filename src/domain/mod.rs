//! Core domain types and models
//!
//! This module contains the domain model for Ferry: the error hierarchy,
//! per-entity-type transfer configuration, the batch job state machine and
//! the field classification map.

pub mod entity;
pub mod errors;
pub mod fields;
pub mod job;
pub mod result;

pub use entity::{Direction, EntityTypeConfig, DEFAULT_RECORDS_PER_FILE, MATCH_ALL_FILTER};
pub use errors::{FerryError, PlatformError};
pub use fields::{FieldLabelMap, METADATA_KEYS};
pub use job::{JobKind, JobStatus, TransferJob};
pub use result::Result;
