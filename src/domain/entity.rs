//! Per-entity-type transfer configuration and run state
//!
//! An [`EntityTypeConfig`] starts life as validated static configuration and
//! is mutated in place as the pipeline discovers files, compresses them and
//! uploads them. It is owned by the pipeline run and passed by reference to
//! each stage; no stage reads a derived field before the producing stage has
//! run.

use std::path::PathBuf;

/// The filter predicate that matches every record on the platform.
pub const MATCH_ALL_FILTER: &str = "1 == 1";

/// Default number of records written into one export chunk file.
pub const DEFAULT_RECORDS_PER_FILE: usize = 2000;

/// Transfer direction for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Remote platform -> local filesystem
    Export,
    /// Local filesystem -> remote platform
    Import,
}

impl Direction {
    /// Label used for per-job-kind artifact folders (`<errors>/<label>/...`).
    pub fn job_label(&self) -> &'static str {
        match self {
            Direction::Export => "Export",
            Direction::Import => "Import",
        }
    }

    /// Skip-line text when the direction's enable flag is off for a type.
    pub fn disabled_reason(&self) -> &'static str {
        match self {
            Direction::Export => "DOWNLOAD FLAG IS FALSE",
            Direction::Import => "UPLOAD FLAG IS FALSE",
        }
    }
}

/// Configuration plus mutable run state for one entity type.
#[derive(Debug, Clone)]
pub struct EntityTypeConfig {
    /// Entity type name, unique within a run
    pub name: String,

    /// Import-side: upload this type's chunk files
    pub upload_data: bool,

    /// Export-side: download this type's records
    pub download_data: bool,

    /// Import-side: remove existing remote records before importing
    pub remove_data: bool,

    /// Import-side: refresh calculated fields after load
    pub refresh_calc_fields: bool,

    /// Removal tuning: let the platform remove via SQL
    pub use_sql_on_remove: bool,

    /// Removal tuning: suppress downstream invalidation
    pub disable_downstream_on_remove: bool,

    /// Export-side: records per produced chunk file
    pub num_records_per_file: usize,

    /// Export-side: query predicate scoping the export
    pub filter: String,

    /// Discovered plain JSON chunk files (populated by the scan stage)
    pub files: Vec<PathBuf>,

    /// Compressed chunk files (populated by the zip stage)
    pub gzip_files: Vec<PathBuf>,

    /// Remote file paths for uploaded chunks (populated by the post stage)
    pub remote_file_urls: Vec<String>,

    /// Total records across this type's chunk files (populated by the scan stage)
    pub record_count: Option<usize>,
}

impl EntityTypeConfig {
    /// Create a config with defaulted flags; callers flip the flags that
    /// apply to their direction.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            upload_data: false,
            download_data: false,
            remove_data: false,
            refresh_calc_fields: false,
            use_sql_on_remove: false,
            disable_downstream_on_remove: false,
            num_records_per_file: DEFAULT_RECORDS_PER_FILE,
            filter: MATCH_ALL_FILTER.to_string(),
            files: Vec::new(),
            gzip_files: Vec::new(),
            remote_file_urls: Vec::new(),
            record_count: None,
        }
    }

    /// Whether this type participates in the given direction.
    pub fn enabled_for(&self, direction: Direction) -> bool {
        match direction {
            Direction::Export => self.download_data,
            Direction::Import => self.upload_data,
        }
    }

    /// Number of chunk files to request from the platform for an export of
    /// `record_count` records. Mirrors the platform convention where 0 means
    /// "server decides", which falls out of rounding small sets down.
    pub fn chunk_count(&self, record_count: u64) -> u64 {
        (record_count as f64 / self.num_records_per_file as f64).round() as u64
    }
}
