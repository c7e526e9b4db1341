//! Export direction: remote platform -> local chunk files
//!
//! Per enabled type: count matching records, submit a remote export job
//! scoped by the type's filter and chunk count, poll all jobs to a terminal
//! state, download the produced chunk files, decompress them, reclaim the
//! remote storage, scan the extracted records, and persist queue errors for
//! failed jobs.

use crate::adapters::platform::PlatformGateway;
use crate::config::{entities_for_direction, FerryConfig};
use crate::console::{ConfirmPrompt, Reporter};
use crate::core::codec;
use crate::core::staging;
use crate::core::tracker::{JobTracker, PollSettings};
use crate::domain::{
    Direction, EntityTypeConfig, FieldLabelMap, JobKind, JobStatus, Result, TransferJob,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;

use super::summary::TransferSummary;
use super::{
    ensure_not_cancelled, run_transfer_pool, scan_direction, write_queue_errors, TransferTask,
    REMOTE_EXPORT_PREFIX,
};

/// Orchestrates one export run.
pub struct ExportPipeline {
    config: FerryConfig,
    gateway: Arc<dyn PlatformGateway>,
    confirm: Arc<dyn ConfirmPrompt>,
    cancel: watch::Receiver<bool>,
    reporter: Reporter,
}

impl ExportPipeline {
    pub fn new(
        config: FerryConfig,
        gateway: Arc<dyn PlatformGateway>,
        confirm: Arc<dyn ConfirmPrompt>,
        cancel: watch::Receiver<bool>,
    ) -> Self {
        let reporter =
            Reporter::for_type_names(config.export.types.iter().map(|t| t.name.as_str()));
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

    /// Execute the export run.
    pub async fn run(&self) -> Result<TransferSummary> {
        let started = Instant::now();
        let mut summary = TransferSummary::new(Direction::Export);

        if !self.config.export.enabled {
            tracing::info!("Export direction disabled; nothing to do");
            return Ok(summary.with_duration(started.elapsed()));
        }

        let mut entities = entities_for_direction(&self.config, Direction::Export);
        if entities.is_empty() {
            tracing::warn!("No export types configured");
            return Ok(summary.with_duration(started.elapsed()));
        }

        self.reporter.section("DOWNLOADING DATA FROM THE ENV");
        let mut tracker = self.submit_export_jobs(&entities, &mut summary).await?;
        tracker
            .wait_for_completion(self.gateway.as_ref(), &self.reporter, &self.cancel)
            .await?;
        self.attach_result_files(&mut tracker).await?;

        self.reporter.section("CURLING DOWN GENERATED EXPORT FILES");
        let download_root = PathBuf::from(&self.config.export.download_folder);
        self.fetch_generated_files(tracker.jobs(), &download_root, &mut summary)
            .await?;

        self.reporter.section("EXTRACTING GENERATED EXPORT FILES");
        self.extract_chunks(tracker.jobs(), &download_root).await?;
        self.cleanup_remote_files(tracker.jobs()).await?;

        self.reporter.section("SCANNING DOWNLOAD FOLDER INFO");
        scan_direction(
            &mut entities,
            &download_root,
            Direction::Export,
            self.config.transfer.fail_on_duplicate_ids,
            &self.reporter,
        )?;
        self.record_outcomes(&entities, tracker.jobs(), &mut summary);

        self.reporter.section("GENERATING EXPORT QUEUE ERROR FILES");
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
            Direction::Export,
            &error_root,
            confirmation,
        )
        .await?;

        let summary = summary.with_duration(started.elapsed());
        summary.log_summary();
        Ok(summary)
    }

    /// Submit one export job per enabled type. Disabled types get a skip
    /// line and no job at all.
    async fn submit_export_jobs(
        &self,
        entities: &[EntityTypeConfig],
        summary: &mut TransferSummary,
    ) -> Result<JobTracker> {
        let username = self.gateway.context_username().await?;
        let mut tracker = JobTracker::new(self.poll_settings());

        for entity in entities {
            let prefix = format!("Kicking off {}", entity.name);
            if !entity.download_data {
                self.reporter
                    .status(&prefix, Direction::Export.disabled_reason());
                summary.record_skip(&entity.name, Direction::Export.disabled_reason());
                continue;
            }

            let record_count = self
                .gateway
                .fetch_count(&entity.name, &entity.filter)
                .await?;
            let num_files = entity.chunk_count(record_count);

            let payload = serde_json::json!({
                "spec": {
                    "targetType": entity.name,
                    "contentType": "json",
                    "jsonInclude": "this",
                    "filter": entity.filter,
                    "fileUrlOrEncodedPathPrefix":
                        format!("{REMOTE_EXPORT_PREFIX}/{username}/{}", entity.name),
                    "failIfUrlNotEmpty": false,
                    "contentEncoding": "gzip",
                    "numFiles": num_files,
                }
            });
            let error_prefix = format!("Unsuccessful kicking off export of type {}", entity.name);
            let doc = self
                .gateway
                .call("Export", "startExport", payload, &error_prefix)
                .await?;

            let job = TransferJob::from_submission(
                &entity.name,
                JobKind::Export,
                &doc,
                Some(entity.filter.clone()),
            );
            self.reporter.status(
                &prefix,
                &format!("id={}", job.id.as_deref().unwrap_or("None")),
            );
            tracker.track(job);
        }
        Ok(tracker)
    }

    /// Ask the platform for the chunk files each completed job produced.
    async fn attach_result_files(&self, tracker: &mut JobTracker) -> Result<()> {
        for job in tracker.jobs_mut() {
            if job.status() != JobStatus::Completed {
                continue;
            }
            let error_prefix = format!(
                "Unsuccessful retrieving files for export of type {}",
                job.entity_type
            );
            let payload = serde_json::json!({ "this": { "id": job.id } });
            let doc = self
                .gateway
                .call("Export", "files", payload, &error_prefix)
                .await?;
            job.file_urls = doc.file_urls();
        }
        Ok(())
    }

    /// Download every listed chunk into a fresh per-type directory.
    ///
    /// A 404 is tolerated only when an independent live count confirms zero
    /// matching records; a job can legitimately complete with no output.
    /// The live count can race with concurrent remote mutation; that
    /// imprecision is accepted.
    async fn fetch_generated_files(
        &self,
        jobs: &[TransferJob],
        download_root: &Path,
        summary: &mut TransferSummary,
    ) -> Result<()> {
        staging::reset_directory(download_root, None)?;

        for job in jobs {
            let prefix = format!("Fetching {}", job.entity_type);
            let type_dir = download_root.join(&job.entity_type);
            staging::reset_directory(&type_dir, None)?;

            if job.status() != JobStatus::Completed {
                self.reporter.status(&prefix, "EXPORT JOB FAILED");
                summary.record_failure(&job.entity_type, "EXPORT JOB FAILED");
                continue;
            }
            if job.file_urls.is_empty() {
                self.reporter.status(&prefix, "NO EXPORT FILES");
                continue;
            }

            let filter = job.filter.as_deref().unwrap_or(crate::domain::MATCH_ALL_FILTER);
            let live_count = self.gateway.fetch_count(&job.entity_type, filter).await?;
            let okay_to_skip_not_found = live_count == 0;

            let mut downloads: Vec<TransferTask> = Vec::with_capacity(job.file_urls.len());
            for (index, file_url) in job.file_urls.iter().enumerate() {
                ensure_not_cancelled(&self.cancel)?;
                let gateway = Arc::clone(&self.gateway);
                let file_url = file_url.clone();
                let target = type_dir.join(format!("{index}.json.gz"));
                downloads.push(Box::pin(async move {
                    gateway
                        .download_file(&file_url, &target, okay_to_skip_not_found)
                        .await
                        .map(|_| ())
                }));
            }
            run_transfer_pool(self.config.transfer.max_concurrent_transfers, downloads).await?;
            self.reporter.status(&prefix, "DONE");
        }
        Ok(())
    }

    /// Decompress every downloaded chunk, stripping metadata when configured.
    async fn extract_chunks(&self, jobs: &[TransferJob], download_root: &Path) -> Result<()> {
        for job in jobs {
            let prefix = format!("Extracting {}", job.entity_type);
            let type_dir = download_root.join(&job.entity_type);
            let archives = staging::files_with_suffix(&type_dir, ".gz");
            if archives.is_empty() {
                self.reporter.status(&prefix, "NO EXPORT FILES");
                continue;
            }

            let labels: Option<FieldLabelMap> = if self.config.transfer.strip_metadata_and_derived
            {
                Some(self.gateway.fetch_field_labels(&job.entity_type).await?)
            } else {
                None
            };

            for archive in &archives {
                ensure_not_cancelled(&self.cancel)?;
                codec::decode_chunk(archive, labels.as_ref(), true)?;
            }
            self.reporter.status(&prefix, "DONE");
        }
        Ok(())
    }

    /// Reclaim platform storage for every produced chunk file.
    async fn cleanup_remote_files(&self, jobs: &[TransferJob]) -> Result<()> {
        let remote_files: Vec<String> = jobs
            .iter()
            .flat_map(|job| job.file_urls.iter().cloned())
            .collect();
        self.gateway.delete_remote_files(&remote_files).await
    }

    /// Fold the scan's record counts into the run summary.
    fn record_outcomes(
        &self,
        entities: &[EntityTypeConfig],
        jobs: &[TransferJob],
        summary: &mut TransferSummary,
    ) {
        for entity in entities {
            if !entity.download_data {
                continue; // skip already recorded at submission
            }
            let completed = jobs
                .iter()
                .find(|job| job.entity_type == entity.name)
                .is_some_and(|job| job.status() == JobStatus::Completed);
            if completed {
                summary.record_success(&entity.name, entity.record_count.unwrap_or(0));
            }
            // failures were recorded when the download stage skipped them
        }
    }
}
