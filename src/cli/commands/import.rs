//! Import command implementation

use crate::config::load_config;
use crate::core::pipeline::ImportPipeline;
use clap::Args;
use tokio::sync::watch;

use super::export::report_run_error;
use super::{build_confirm, build_gateway, exit_code_for};

/// Arguments for the import command
#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Skip confirmation prompts
    #[arg(short, long)]
    pub yes: bool,

    /// Only process these entity types (comma-separated)
    #[arg(long)]
    pub types: Option<String>,

    /// Continue past duplicate record ids instead of aborting
    #[arg(long)]
    pub allow_duplicates: bool,

    /// Skip the pre-import removal jobs
    #[arg(long)]
    pub no_remove: bool,
}

impl ImportArgs {
    /// Execute the import command
    pub async fn execute(
        &self,
        config_path: &str,
        cancel: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!("Starting import command");

        let mut config = load_config(config_path)?;

        if let Some(types) = &self.types {
            let keep: Vec<String> = types.split(',').map(|s| s.trim().to_string()).collect();
            tracing::info!(types = ?keep, "Restricting import to selected types");
            config.import.types.retain(|t| keep.contains(&t.name));
        }

        if self.allow_duplicates {
            config.transfer.fail_on_duplicate_ids = false;
        }
        if self.no_remove {
            config.import.remove_enabled = false;
        }

        let gateway = build_gateway(&config)?;
        let confirm = build_confirm(self.yes);

        let pipeline = ImportPipeline::new(config, gateway, confirm, cancel);
        match pipeline.run().await {
            Ok(summary) => {
                if summary.has_failures() {
                    eprintln!("Import finished with per-type failures");
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
