//! Init command implementation
//!
//! Generates a starter configuration file.

use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "ferry.toml")]
    pub output: String,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        if Path::new(&self.output).exists() && !self.force {
            println!("Configuration file already exists: {}", self.output);
            println!("Use --force to overwrite");
            return Ok(2);
        }

        fs::write(&self.output, Self::template())?;
        println!("Configuration file created: {}", self.output);
        println!();
        println!("Next steps:");
        println!("  1. Edit {} with your platform settings", self.output);
        println!("  2. Export FERRY_PASSWORD (referenced via ${{FERRY_PASSWORD}})");
        println!("  3. Run `ferry validate-config`");

        Ok(0)
    }

    fn template() -> &'static str {
        r#"# Ferry configuration

[application]
log_level = "info"
# Prompt before wiping error-output folders
prompt_for_warnings = true

[platform]
base_url = "https://your-environment.example.com"
tenant = "your-tenant"
tag = "prod"
username = "your-user"
password = "${FERRY_PASSWORD}"
# error_sleep_seconds = 15
# max_retries = 4

[transfer]
poll_interval_seconds = 15
# poll_timeout_seconds = 3600
strip_metadata_and_derived = true
fail_on_duplicate_ids = true
# error_output_folder = "data/downloads_Errors"
# max_concurrent_transfers = 4

[export]
enabled = true
download_folder = "data/downloads"

[[export.types]]
name = "Order"
download_data = true
refresh_calc_fields = false
num_records_per_file = 2000
filter = "1 == 1"

[import]
enabled = true
upload_folder = "data/uploads"
remove_enabled = true

[[import.types]]
name = "Order"
upload_data = true
remove_data = false
refresh_calc_fields = true
"#
    }
}
