//! Import direction: local chunk files -> remote platform
//!
//! Pre-flight scans the upload folders (duplicate ids fail fast by
//! default), optionally removes existing remote records per type, then per
//! enabled type: compress chunks, upload them to a fresh remote staging
//! directory, submit an import job referencing the uploaded files, poll to
//! completion with live record counts, clean up remote and local staging,
//! and persist queue errors for failed jobs.

use crate::adapters::platform::PlatformGateway;
use crate::config::{entities_for_direction, FerryConfig};
use crate::console::{ConfirmPrompt, Reporter};
use crate::core::codec;
use crate::core::staging;
use crate::core::tracker::{JobTracker, PollSettings};
use crate::domain::{
    Direction, EntityTypeConfig, FieldLabelMap, JobKind, JobStatus, Result, TransferJob,
    MATCH_ALL_FILTER,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;

use super::summary::TransferSummary;
use super::{
    ensure_not_cancelled, run_transfer_pool, scan_direction, write_queue_errors, TransferTask,
    REMOTE_STAGING_PREFIX,
};

/// Orchestrates one import run.
pub struct ImportPipeline {
    config: FerryConfig,
    gateway: Arc<dyn PlatformGateway>,
    confirm: Arc<dyn ConfirmPrompt>,
    cancel: watch::Receiver<bool>,
    reporter: Reporter,
}

impl ImportPipeline {
    pub fn new(
        config: FerryConfig,
        gateway: Arc<dyn PlatformGateway>,
        confirm: Arc<dyn ConfirmPrompt>,
        cancel: watch::Receiver<bool>,
    ) -> Self {
        let reporter =
            Reporter::for_type_names(config.import.types.iter().map(|t| t.name.as_str()));
        Self {
            config,
            gateway,
            confirm,
            cancel,
            reporter,
        }
    }

    fn poll_settings(&self) -> PollSettings {
        PollSettings::new(
            Duration::from_secs(self.config.transfer.poll_interval_seconds),
            self.config
                .transfer
                .poll_timeout_seconds
                .map(Duration::from_secs),
        )
    }

    /// Execute the import run.
    pub async fn run(&self) -> Result<TransferSummary> {
        let started = Instant::now();
        let mut summary = TransferSummary::new(Direction::Import);

        if !self.config.import.enabled {
            tracing::info!("Import direction disabled; nothing to do");
            return Ok(summary.with_duration(started.elapsed()));
        }

        let mut entities = entities_for_direction(&self.config, Direction::Import);
        if entities.is_empty() {
            tracing::warn!("No import types configured");
            return Ok(summary.with_duration(started.elapsed()));
        }

        let upload_root = PathBuf::from(&self.config.import.upload_folder);

        self.reporter.section("SCANNING UPLOAD FOLDER INFO");
        scan_direction(
            &mut entities,
            &upload_root,
            Direction::Import,
            self.config.transfer.fail_on_duplicate_ids,
            &self.reporter,
        )?;

        if self.config.import.remove_enabled {
            self.reporter.section("REMOVING DATA FROM THE ENV");
            let mut tracker = self.submit_remove_jobs(&entities).await?;
            tracker
                .wait_for_completion(self.gateway.as_ref(), &self.reporter, &self.cancel)
                .await?;
        }

        self.reporter.section("ZIPPING IMPORT FILES");
        self.zip_import_files(&mut entities, &upload_root).await?;

        self.reporter.section("CURLING UP IMPORT FILES");
        let staging_dir = self.remote_staging_directory().await?;
        self.post_import_files(&mut entities, &staging_dir).await?;

        self.reporter.section("UPLOADING DATA TO THE ENV");
        let mut tracker = self.submit_import_jobs(&entities, &mut summary).await?;
        tracker
            .wait_for_completion(self.gateway.as_ref(), &self.reporter, &self.cancel)
            .await?;
        self.cleanup_staged_files(&entities, &staging_dir).await?;
        self.record_outcomes(&entities, tracker.jobs(), &mut summary);

        self.reporter.section("GENERATING IMPORT QUEUE ERROR FILES");
        let error_root = PathBuf::from(self.config.error_output_folder());
        let confirmation: Option<&dyn ConfirmPrompt> = self
            .config
            .application
            .prompt_for_warnings
            .then_some(self.confirm.as_ref());
        write_queue_errors(
            self.gateway.as_ref(),
            &self.reporter,
            tracker.jobs(),
            Direction::Import,
            &error_root,
            confirmation,
        )
        .await?;

        let summary = summary.with_duration(started.elapsed());
        summary.log_summary();
        Ok(summary)
    }

    /// Submit a remove-all job for every type flagged for removal, capturing
    /// the record count at submission time for the `removed/initial`
    /// progress line.
    async fn submit_remove_jobs(&self, entities: &[EntityTypeConfig]) -> Result<JobTracker> {
        let mut tracker = JobTracker::new(self.poll_settings());
        for entity in entities {
            let prefix = format!("Kicking off {}", entity.name);
            if !entity.remove_data {
                self.reporter.status(&prefix, "REMOVE FLAG IS FALSE");
                continue;
            }

            let initial = self
                .gateway
                .fetch_count(&entity.name, MATCH_ALL_FILTER)
                .await?;
            let payload = serde_json::json!({
                "spec": {
                    "useSql": entity.use_sql_on_remove,
                    "disableDownstream": entity.disable_downstream_on_remove,
                }
            });
            let error_prefix =
                format!("Unsuccessful kicking off removal of type {}", entity.name);
            let doc = self
                .gateway
                .call(&entity.name, "removeAll", payload, &error_prefix)
                .await?;

            let mut job = TransferJob::from_submission(&entity.name, JobKind::Remove, &doc, None);
            job.initial_fetch_count = Some(initial);
            job.current_fetch_count = Some(initial);
            self.reporter.status(
                &prefix,
                &format!("id={}", job.id.as_deref().unwrap_or("None")),
            );
            tracker.track(job);
        }
        Ok(tracker)
    }

    /// Compress each type's plain JSON chunks, replacing any stale archives
    /// from an earlier run.
    async fn zip_import_files(
        &self,
        entities: &mut [EntityTypeConfig],
        upload_root: &Path,
    ) -> Result<()> {
        let stale: Vec<PathBuf> = entities
            .iter()
            .flat_map(|entity| {
                staging::files_with_suffix(&upload_root.join(&entity.name), ".gz")
            })
            .collect();
        staging::delete_files(&stale)?;

        for entity in entities.iter_mut() {
            let prefix = format!("Zipping {}", entity.name);
            if !entity.upload_data {
                self.reporter
                    .status(&prefix, Direction::Import.disabled_reason());
                continue;
            }
            if entity.files.is_empty() {
                self.reporter.status(&prefix, "NO IMPORT FILES");
                continue;
            }

            let labels: Option<FieldLabelMap> = if self.config.transfer.strip_metadata_and_derived
            {
                Some(self.gateway.fetch_field_labels(&entity.name).await?)
            } else {
                None
            };

            for file in &entity.files {
                ensure_not_cancelled(&self.cancel)?;
                codec::encode_chunk(file, labels.as_ref(), false)?;
            }
            entity.gzip_files =
                staging::files_with_suffix(&upload_root.join(&entity.name), ".gz");
            self.reporter.status(&prefix, "DONE");
        }
        Ok(())
    }

    /// `<remote root>/<staging prefix>/<username>`, owned by this run.
    async fn remote_staging_directory(&self) -> Result<String> {
        let root = self.gateway.remote_root().await?;
        let username = self.gateway.context_username().await?;
        Ok(format!("{root}/{REMOTE_STAGING_PREFIX}/{username}"))
    }

    /// Upload each compressed chunk to the staging directory, keyed by type
    /// and chunk index.
    async fn post_import_files(
        &self,
        entities: &mut [EntityTypeConfig],
        staging_dir: &str,
    ) -> Result<()> {
        self.gateway.delete_remote_directory(staging_dir).await?;

        for entity in entities.iter_mut() {
            let prefix = format!("Posting {}", entity.name);
            if !entity.upload_data {
                self.reporter
                    .status(&prefix, Direction::Import.disabled_reason());
                continue;
            }
            if entity.gzip_files.is_empty() {
                self.reporter.status(&prefix, "NO IMPORT FILES");
                continue;
            }

            let mut remote_urls = Vec::with_capacity(entity.gzip_files.len());
            let mut uploads: Vec<TransferTask> = Vec::with_capacity(entity.gzip_files.len());
            for (index, archive) in entity.gzip_files.iter().enumerate() {
                ensure_not_cancelled(&self.cancel)?;
                let remote_path = format!("{staging_dir}/{}/{index}.json.gz", entity.name);
                remote_urls.push(remote_path.clone());
                let gateway = Arc::clone(&self.gateway);
                let archive = archive.clone();
                uploads.push(Box::pin(async move {
                    gateway.upload_file(&archive, &remote_path).await
                }));
            }
            run_transfer_pool(self.config.transfer.max_concurrent_transfers, uploads).await?;
            entity.remote_file_urls = remote_urls;
            self.reporter.status(&prefix, "DONE");
        }
        Ok(())
    }

    /// Submit an import job per uploaded type, seeding the initial count
    /// from the pre-flight scan so progress reads `current/initial`.
    async fn submit_import_jobs(
        &self,
        entities: &[EntityTypeConfig],
        summary: &mut TransferSummary,
    ) -> Result<JobTracker> {
        let mut tracker = JobTracker::new(self.poll_settings());
        for entity in entities {
            let prefix = format!("Kicking off {}", entity.name);
            if !entity.upload_data {
                self.reporter
                    .status(&prefix, Direction::Import.disabled_reason());
                summary.record_skip(&entity.name, Direction::Import.disabled_reason());
                continue;
            }
            if entity.gzip_files.is_empty() {
                self.reporter.status(&prefix, "NO IMPORT FILES");
                summary.record_skip(&entity.name, "NO IMPORT FILES");
                continue;
            }

            let payload = serde_json::json!({
                "spec": {
                    "targetType": entity.name,
                    "fileList": { "urls": entity.remote_file_urls },
                }
            });
            let error_prefix =
                format!("Unsuccessful kicking off import of type {}", entity.name);
            let doc = self
                .gateway
                .call("Import", "startImport", payload, &error_prefix)
                .await?;

            let mut job = TransferJob::from_submission(&entity.name, JobKind::Import, &doc, None);
            job.initial_fetch_count = entity.record_count.map(|count| count as u64);
            self.reporter.status(
                &prefix,
                &format!("id={}", job.id.as_deref().unwrap_or("None")),
            );
            tracker.track(job);
        }
        Ok(tracker)
    }

    /// Drop the remote staging tree and the local archives now that the
    /// platform has ingested them.
    async fn cleanup_staged_files(
        &self,
        entities: &[EntityTypeConfig],
        staging_dir: &str,
    ) -> Result<()> {
        let remote_files: Vec<String> = entities
            .iter()
            .flat_map(|entity| entity.remote_file_urls.iter().cloned())
            .collect();
        self.gateway.delete_remote_files(&remote_files).await?;
        self.gateway.delete_remote_directory(staging_dir).await?;

        let archives: Vec<PathBuf> = entities
            .iter()
            .flat_map(|entity| entity.gzip_files.iter().cloned())
            .collect();
        staging::delete_files(&archives)
    }

    fn record_outcomes(
        &self,
        entities: &[EntityTypeConfig],
        jobs: &[TransferJob],
        summary: &mut TransferSummary,
    ) {
        for entity in entities {
            let Some(job) = jobs.iter().find(|job| job.entity_type == entity.name) else {
                continue; // skips already recorded at submission
            };
            if job.status() == JobStatus::Completed {
                summary.record_success(&entity.name, entity.record_count.unwrap_or(0));
            } else {
                summary.record_failure(
                    &entity.name,
                    format!("import job finished {}", job.status()),
                );
            }
        }
    }
}
