//! Export command implementation

use crate::config::load_config;
use crate::core::pipeline::ExportPipeline;
use crate::domain::FerryError;
use clap::Args;
use tokio::sync::watch;

use super::{build_confirm, build_gateway, exit_code_for};

/// Arguments for the export command
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Skip confirmation prompts
    #[arg(short, long)]
    pub yes: bool,

    /// Only process these entity types (comma-separated)
    #[arg(long)]
    pub types: Option<String>,

    /// Override the polling deadline in seconds (0 disables it)
    #[arg(long, value_name = "SECONDS")]
    pub poll_timeout: Option<u64>,
}

impl ExportArgs {
    /// Execute the export command
    pub async fn execute(
        &self,
        config_path: &str,
        cancel: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!("Starting export command");

        let mut config = load_config(config_path)?;

        if let Some(types) = &self.types {
            let keep: Vec<String> = types.split(',').map(|s| s.trim().to_string()).collect();
            tracing::info!(types = ?keep, "Restricting export to selected types");
            config.export.types.retain(|t| keep.contains(&t.name));
        }

        if let Some(seconds) = self.poll_timeout {
            config.transfer.poll_timeout_seconds = (seconds > 0).then_some(seconds);
        }

        let gateway = build_gateway(&config)?;
        let confirm = build_confirm(self.yes);

        let pipeline = ExportPipeline::new(config, gateway, confirm, cancel);
        match pipeline.run().await {
            Ok(summary) => {
                if summary.has_failures() {
                    eprintln!("Export finished with per-type failures");
                    Ok(1)
                } else {
                    Ok(0)
                }
            }
            Err(e) => {
                report_run_error(&e);
                Ok(exit_code_for(&e))
            }
        }
    }
}

pub(crate) fn report_run_error(error: &FerryError) {
    tracing::error!(error = %error, "Run failed");
    eprintln!("Error: {error}");
}
