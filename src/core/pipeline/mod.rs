//! Transfer pipelines
//!
//! One pipeline per direction, each composing the staging manager, chunk
//! codec, record scanner, batch job tracker and platform gateway. Within a
//! type the stage order is strict; across types there is no ordering
//! guarantee, and type-level failures are reported as a single status line
//! without aborting the run. Only configuration errors, duplicate-id
//! detection (when fail-fast is on), and a declined directory wipe halt
//! everything.

pub mod export;
pub mod import;
pub mod summary;

pub use export::ExportPipeline;
pub use import::ImportPipeline;
pub use summary::{TransferSummary, TypeOutcome};

use crate::adapters::platform::PlatformGateway;
use crate::console::{self, ConfirmPrompt, Reporter};
use crate::core::{scanner, staging};
use crate::domain::{Direction, EntityTypeConfig, FerryError, Result, TransferJob};
use std::fs;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::{watch, Semaphore};
use tokio::task::JoinSet;

/// Remote staging prefix import uploads are keyed under.
pub(crate) const REMOTE_STAGING_PREFIX: &str = "ferry-transfer";

/// Remote prefix export jobs write their chunk files under.
pub(crate) const REMOTE_EXPORT_PREFIX: &str = "ferry-exports";

/// Fail fast when the operator has requested cancellation.
pub(crate) fn ensure_not_cancelled(cancel: &watch::Receiver<bool>) -> Result<()> {
    if *cancel.borrow() {
        return Err(FerryError::Aborted(
            "cancellation requested".to_string(),
        ));
    }
    Ok(())
}

/// One queued chunk transfer.
pub(crate) type TransferTask = Pin<Box<dyn Future<Output = Result<()>> + Send>>;

/// Run chunk transfers through a bounded worker pool.
///
/// At most `limit` transfers are in flight at once. Every task finishes (or
/// the first failure surfaces) before this returns, so a type's chunks are
/// always fully transferred before its next stage runs.
pub(crate) async fn run_transfer_pool(limit: usize, tasks: Vec<TransferTask>) -> Result<()> {
    let semaphore = Arc::new(Semaphore::new(limit.max(1)));
    let mut pool = JoinSet::new();
    for task in tasks {
        let semaphore = Arc::clone(&semaphore);
        pool.spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .map_err(|_| FerryError::Other("transfer pool closed".to_string()))?;
            task.await
        });
    }
    while let Some(joined) = pool.join_next().await {
        joined.map_err(|e| FerryError::Other(format!("transfer task failed: {e}")))??;
    }
    Ok(())
}

/// Scan each enabled type's chunk files under `root`, populating the
/// entity's derived file lists and record count.
///
/// Runs pre-upload and post-download over the same entity list, gated by the
/// prevailing direction's enable flag. Duplicate ids abort the run when
/// `fail_fast` is set; otherwise they are reported and the run continues.
pub(crate) fn scan_direction(
    entities: &mut [EntityTypeConfig],
    root: &Path,
    direction: Direction,
    fail_fast: bool,
    reporter: &Reporter,
) -> Result<()> {
    for entity in entities.iter_mut() {
        let prefix = format!("Scanning {}", entity.name);
        if !entity.enabled_for(direction) {
            reporter.status(&prefix, direction.disabled_reason());
            continue;
        }

        let type_dir = root.join(&entity.name);
        let files = staging::files_with_suffix(&type_dir, ".json");
        let gzip_files = staging::files_with_suffix(&type_dir, ".gz");
        let outcome = scanner::scan_chunk_files(&files)?;

        reporter.status(
            &prefix,
            &format!(
                "Files: {} / Records: {}",
                console::group_digits(files.len() as u64),
                console::group_digits(outcome.total_records as u64)
            ),
        );

        if outcome.has_duplicates() {
            if fail_fast {
                reporter.message(&format!(
                    "Exiting script. {} has duplicate ids: {:?}",
                    entity.name, outcome.duplicate_ids
                ));
                return Err(FerryError::DuplicateIds {
                    entity_type: entity.name.clone(),
                    ids: outcome.duplicate_ids,
                });
            }
            tracing::warn!(
                entity_type = %entity.name,
                duplicates = ?outcome.duplicate_ids,
                "Duplicate record ids found; continuing per policy"
            );
        }

        entity.files = files;
        entity.gzip_files = gzip_files;
        entity.record_count = Some(outcome.total_records);
    }
    Ok(())
}

/// Persist platform-side queue errors for failing/failed jobs.
///
/// The per-kind error folder is reset first (confirmation-gated when the
/// operator asked for warnings); each failed job's errors are fetched from
/// the platform's invalidation-queue store and written verbatim to
/// `<error_root>/<jobKind>/<type>_errors.xml`.
pub(crate) async fn write_queue_errors(
    gateway: &dyn PlatformGateway,
    reporter: &Reporter,
    jobs: &[TransferJob],
    direction: Direction,
    error_root: &Path,
    confirmation: Option<&dyn ConfirmPrompt>,
) -> Result<()> {
    let folder = error_root.join(direction.job_label());
    staging::reset_directory(&folder, confirmation)?;

    for job in jobs {
        let prefix = format!("Generating {}", job.entity_type);
        let failed_with_id = job.status().is_failure() && job.id.is_some();
        if !failed_with_id {
            reporter.status(&prefix, "NO ERRORS");
            continue;
        }

        let id = job.id.as_deref().unwrap_or_default();
        let payload = serde_json::json!({
            "spec": {
                "filter": format!("targetObjId == \"{id}\""),
                "limit": 2000,
            }
        });
        let error_prefix = format!("Failed to fetch queue errors for {}", job.entity_type);
        let doc = gateway
            .call("InvalidationQueueError", "fetch", payload, &error_prefix)
            .await?;

        let artifact = folder.join(format!("{}_errors.xml", job.entity_type));
        fs::write(&artifact, doc.raw())?;
        reporter.status(&prefix, "DONE");
    }
    Ok(())
}
