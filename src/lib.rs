//! # Ferry - bulk record transfer for remote data platforms
//!
//! Ferry moves bulk record sets between a local filesystem and a remote data
//! platform: it exports records from remote storage into chunked
//! gzip-compressed JSON files, and imports chunked compressed files back
//! into remote storage, tracking the platform's asynchronous
//! export/import/removal jobs through submission, polling and completion.
//!
//! ## Architecture
//!
//! Ferry follows a layered architecture:
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Business logic (staging, codec, scanner, tracker, pipelines)
//! - [`adapters`] - The remote platform gateway and wire decoding
//! - [`domain`] - Core domain types and models
//! - [`config`] - Configuration management
//! - [`console`] - Status-line formatting and confirmation prompts
//! - [`logging`] - Structured logging and observability
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ferry::adapters::platform::HttpPlatformGateway;
//! use ferry::config::load_config;
//! use ferry::console::StdinConfirm;
//! use ferry::core::pipeline::ExportPipeline;
//! use std::sync::Arc;
//! use tokio::sync::watch;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("ferry.toml")?;
//!     let gateway = Arc::new(HttpPlatformGateway::new(&config.platform)?);
//!     let (_cancel_tx, cancel_rx) = watch::channel(false);
//!
//!     let pipeline = ExportPipeline::new(config, gateway, Arc::new(StdinConfirm), cancel_rx);
//!     let summary = pipeline.run().await?;
//!
//!     println!("Exported {} records", summary.total_records());
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Ferry uses the [`domain::FerryError`] type for all errors. Type-level
//! failures are isolated to a status line and the run continues; only
//! configuration errors, duplicate-id detection and a declined directory
//! wipe halt the whole run.
//!
//! ## Logging
//!
//! Ferry uses structured logging with the `tracing` crate:
//!
//! ```rust,no_run
//! tracing::info!(entity_type = "Order", "Kicking off export");
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod console;
pub mod core;
pub mod domain;
pub mod logging;
