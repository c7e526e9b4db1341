//! Configuration management

pub mod loader;
pub mod schema;

pub use loader::load_config;
pub use schema::{
    entities_for_direction, ApplicationConfig, ExportSection, ExportTypeConfig, FerryConfig,
    ImportSection, ImportTypeConfig, LoggingConfig, PlatformConfig, TransferConfig,
};
