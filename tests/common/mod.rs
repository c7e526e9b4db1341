//! In-memory platform gateway for pipeline tests
//!
//! Records every interaction so tests can assert on what reached the
//! platform, and serves scripted responses for counts, job statuses and
//! chunk downloads.

use async_trait::async_trait;
use ferry::adapters::platform::{PlatformGateway, WireDocument};
use ferry::domain::{FieldLabelMap, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Default)]
pub struct MockPlatform {
    /// Per-type record counts served by fetch_count
    pub counts: Mutex<HashMap<String, u64>>,
    /// Per-job scripted status sequences; exhausted jobs report "completed"
    pub statuses: Mutex<HashMap<String, Vec<String>>>,
    /// Result file listings per job id
    pub files_by_job: Mutex<HashMap<String, Vec<String>>>,
    /// Downloadable bodies per remote path
    pub chunk_bodies: Mutex<HashMap<String, Vec<u8>>>,
    /// Field labels per type
    pub field_labels: Mutex<HashMap<String, FieldLabelMap>>,

    /// Every type-action call as (type, action, payload)
    pub calls: Mutex<Vec<(String, String, Value)>>,
    /// Every uploaded (local, remote) pair
    pub uploads: Mutex<Vec<(PathBuf, String)>>,
    pub deleted_files: Mutex<Vec<String>>,
    pub deleted_dirs: Mutex<Vec<String>>,

    next_job: Mutex<u32>,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_count(&self, entity_type: &str, count: u64) {
        self.counts
            .lock()
            .unwrap()
            .insert(entity_type.to_string(), count);
    }

    pub fn script_statuses(&self, job_id: &str, statuses: &[&str]) {
        let mut seq: Vec<String> = statuses.iter().map(|s| s.to_string()).collect();
        seq.reverse();
        self.statuses
            .lock()
            .unwrap()
            .insert(job_id.to_string(), seq);
    }

    pub fn set_job_files(&self, job_id: &str, files: &[&str]) {
        self.files_by_job.lock().unwrap().insert(
            job_id.to_string(),
            files.iter().map(|s| s.to_string()).collect(),
        );
    }

    pub fn set_chunk_body(&self, remote_path: &str, body: Vec<u8>) {
        self.chunk_bodies
            .lock()
            .unwrap()
            .insert(remote_path.to_string(), body);
    }

    pub fn set_field_labels(&self, entity_type: &str, labels: FieldLabelMap) {
        self.field_labels
            .lock()
            .unwrap()
            .insert(entity_type.to_string(), labels);
    }

    pub fn actions_named(&self, action: &str) -> Vec<(String, String, Value)> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, a, _)| a == action)
            .cloned()
            .collect()
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.lock().unwrap().len()
    }
}

#[async_trait]
impl PlatformGateway for MockPlatform {
    async fn call(
        &self,
        entity_type: &str,
        action: &str,
        payload: Value,
        _error_prefix: &str,
    ) -> Result<WireDocument> {
        self.calls.lock().unwrap().push((
            entity_type.to_string(),
            action.to_string(),
            payload.clone(),
        ));

        let body = match action {
            "startExport" | "startImport" | "removeAll" => {
                let mut next = self.next_job.lock().unwrap();
                *next += 1;
                format!(r#"{{"id": "job-{}"}}"#, *next)
            }
            "get" => {
                let id = payload["this"]["id"].as_str().unwrap_or_default();
                let status = self
                    .statuses
                    .lock()
                    .unwrap()
                    .get_mut(id)
                    .and_then(Vec::pop)
                    .unwrap_or_else(|| "completed".to_string());
                format!(r#"{{"run": {{"status": {{"status": "{status}"}}}}}}"#)
            }
            "files" => {
                let id = payload["this"]["id"].as_str().unwrap_or_default();
                let urls = self
                    .files_by_job
                    .lock()
                    .unwrap()
                    .get(id)
                    .cloned()
                    .unwrap_or_default();
                let items: Vec<String> = urls
                    .iter()
                    .map(|u| format!("<v><url>{u}</url></v>"))
                    .collect();
                format!("<filesResponse>{}</filesResponse>", items.join(""))
            }
            "fetch" => format!("<queueErrors><source>{entity_type}</source></queueErrors>"),
            _ => "{}".to_string(),
        };
        Ok(WireDocument::parse(&body))
    }

    async fn fetch_count(&self, entity_type: &str, _filter: &str) -> Result<u64> {
        Ok(self
            .counts
            .lock()
            .unwrap()
            .get(entity_type)
            .copied()
            .unwrap_or(0))
    }

    async fn fetch_field_labels(&self, entity_type: &str) -> Result<FieldLabelMap> {
        Ok(self
            .field_labels
            .lock()
            .unwrap()
            .get(entity_type)
            .cloned()
            .unwrap_or_default())
    }

    async fn context_username(&self) -> Result<String> {
        Ok("tester".to_string())
    }

    async fn remote_root(&self) -> Result<String> {
        Ok("azure://root".to_string())
    }

    async fn download_file(
        &self,
        remote_path: &str,
        local_path: &Path,
        tolerate_not_found: bool,
    ) -> Result<bool> {
        let body = self.chunk_bodies.lock().unwrap().get(remote_path).cloned();
        let Some(body) = body else {
            // missing remote file behaves like a platform 404
            if tolerate_not_found {
                return Ok(false);
            }
            return Err(ferry::domain::PlatformError::NotFound(remote_path.to_string()).into());
        };
        if let Some(parent) = local_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(local_path, body)?;
        Ok(true)
    }

    async fn upload_file(&self, local_path: &Path, remote_path: &str) -> Result<()> {
        self.uploads
            .lock()
            .unwrap()
            .push((local_path.to_path_buf(), remote_path.to_string()));
        Ok(())
    }

    async fn delete_remote_files(&self, remote_paths: &[String]) -> Result<()> {
        self.deleted_files
            .lock()
            .unwrap()
            .extend(remote_paths.iter().cloned());
        Ok(())
    }

    async fn delete_remote_directory(&self, remote_path: &str) -> Result<()> {
        self.deleted_dirs
            .lock()
            .unwrap()
            .push(remote_path.to_string());
        Ok(())
    }
}
