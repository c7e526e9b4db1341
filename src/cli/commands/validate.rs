//! Validate config command implementation

use crate::config::load_config;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("Validating configuration file: {config_path}");

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("Configuration is invalid");
                println!("  Error: {e}");
                return Ok(2);
            }
        };

        println!("Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Platform: {}", config.platform.base_url);
        println!(
            "  Tenant/Tag: {}/{}",
            config.platform.tenant, config.platform.tag
        );
        println!("  Poll Interval: {}s", config.transfer.poll_interval_seconds);
        match config.transfer.poll_timeout_seconds {
            Some(seconds) => println!("  Poll Timeout: {seconds}s"),
            None => println!("  Poll Timeout: none (polls until jobs finish)"),
        }
        println!(
            "  Strip Metadata: {}",
            config.transfer.strip_metadata_and_derived
        );
        println!(
            "  Export: {} ({} types -> {})",
            if config.export.enabled { "enabled" } else { "disabled" },
            config.export.types.len(),
            config.export.download_folder
        );
        println!(
            "  Import: {} ({} types <- {})",
            if config.import.enabled { "enabled" } else { "disabled" },
            config.import.types.len(),
            config.import.upload_folder
        );
        println!("  Error Output: {}", config.error_output_folder());

        Ok(0)
    }
}
