//! Platform gateway: the transport seam to the remote data platform
//!
//! [`PlatformGateway`] is the async trait the core components talk through;
//! [`HttpPlatformGateway`] is the production implementation. Transient
//! failures are retried on a fixed sleep interval and surface as a fatal
//! error tagged with a caller-supplied human-readable prefix once retries
//! are exhausted.

use crate::config::PlatformConfig;
use crate::domain::{FerryError, FieldLabelMap, PlatformError, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::{Client, ClientBuilder, StatusCode};
use secrecy::ExposeSecret;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;

use super::wire::WireDocument;

/// Operations the transfer core needs from the remote platform.
#[async_trait]
pub trait PlatformGateway: Send + Sync {
    /// Execute a named type action with a JSON payload and decode the
    /// response. `error_prefix` labels the fatal error raised after retry
    /// exhaustion.
    async fn call(
        &self,
        entity_type: &str,
        action: &str,
        payload: Value,
        error_prefix: &str,
    ) -> Result<WireDocument>;

    /// Count records of a type matching a filter predicate.
    async fn fetch_count(&self, entity_type: &str, filter: &str) -> Result<u64>;

    /// Fetch the labeled-field classification for a type.
    async fn fetch_field_labels(&self, entity_type: &str) -> Result<FieldLabelMap>;

    /// Username of the authenticated platform context.
    async fn context_username(&self) -> Result<String>;

    /// Root path of the platform's file system.
    async fn remote_root(&self) -> Result<String>;

    /// Download a remote file to a local path. Returns `false` when a 404
    /// was tolerated and the file skipped.
    async fn download_file(
        &self,
        remote_path: &str,
        local_path: &Path,
        tolerate_not_found: bool,
    ) -> Result<bool>;

    /// Upload a local file to a remote path.
    async fn upload_file(&self, local_path: &Path, remote_path: &str) -> Result<()>;

    /// Delete a batch of remote files.
    async fn delete_remote_files(&self, remote_paths: &[String]) -> Result<()>;

    /// Recursively delete a remote directory.
    async fn delete_remote_directory(&self, remote_path: &str) -> Result<()>;
}

/// HTTP implementation of [`PlatformGateway`].
pub struct HttpPlatformGateway {
    base_url: String,
    tenant: String,
    tag: String,
    username: Option<String>,
    auth_header: Option<String>,
    client: Client,
    error_sleep: Duration,
    max_retries: usize,
}

impl HttpPlatformGateway {
    /// Build a gateway from platform configuration.
    pub fn new(config: &PlatformConfig) -> Result<Self> {
        let mut builder = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(30));

        if !config.tls_verify {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder.build().map_err(|e| {
            FerryError::Configuration(format!("Failed to build HTTP client: {e}"))
        })?;

        let auth_header = match (&config.username, &config.password) {
            (Some(username), Some(password)) => {
                let credentials = format!("{username}:{}", password.expose_secret());
                let encoded = general_purpose::STANDARD.encode(credentials.as_bytes());
                Some(format!("Basic {encoded}"))
            }
            _ => None,
        };

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            tenant: config.tenant.clone(),
            tag: config.tag.clone(),
            username: config.username.clone(),
            auth_header,
            client,
            error_sleep: Duration::from_secs(config.error_sleep_seconds),
            max_retries: config.max_retries,
        })
    }

    fn type_action_url(&self, entity_type: &str, action: &str) -> String {
        format!(
            "{}/api/1/{}/{}/{}?action={}",
            self.base_url, self.tenant, self.tag, entity_type, action
        )
    }

    fn file_url(&self, remote_path: &str) -> String {
        format!(
            "{}/file/1/{}/{}/{}",
            self.base_url,
            self.tenant,
            self.tag,
            remote_path.trim_start_matches('/')
        )
    }

    fn transient(status: StatusCode) -> bool {
        status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
    }

    /// Run `send` until it succeeds, retrying transient failures on the
    /// fixed sleep interval. 4xx responses (other than 429) fail fast.
    async fn with_retry<F, Fut>(&self, error_prefix: &str, send: F) -> Result<reqwest::Response>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = std::result::Result<reqwest::Response, reqwest::Error>>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let failure = match send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response);
                    }
                    let message = response.text().await.unwrap_or_default();
                    if !Self::transient(status) {
                        return Err(FerryError::Platform(PlatformError::ClientError {
                            status: status.as_u16(),
                            message: format!("{error_prefix}: {message}"),
                        }));
                    }
                    format!("status {status}: {message}")
                }
                Err(e) => e.to_string(),
            };

            if attempt >= self.max_retries {
                return Err(FerryError::Platform(PlatformError::RetriesExhausted {
                    prefix: error_prefix.to_string(),
                    attempts: attempt,
                    last_error: failure,
                }));
            }

            tracing::warn!(
                attempt,
                max_retries = self.max_retries,
                sleep_seconds = self.error_sleep.as_secs(),
                error = %failure,
                "Retrying platform request"
            );
            tokio::time::sleep(self.error_sleep).await;
        }
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        let mut request = self.client.request(method, url);
        if let Some(auth) = &self.auth_header {
            request = request.header("Authorization", auth.clone());
        }
        request
    }

    /// Resolve the concrete file-system type backing the platform, then ask
    /// it a question. Two type-action calls, as the platform requires.
    async fn file_system_type(&self) -> Result<String> {
        let doc = self
            .call(
                "FileSystem",
                "inst",
                Value::Null,
                "Unsuccessful retrieving instance of FileSystem",
            )
            .await?;
        doc.scalar("name").ok_or_else(|| {
            FerryError::Platform(PlatformError::InvalidResponse(
                "FileSystem instance response carried no type name".to_string(),
            ))
        })
    }
}

#[async_trait]
impl PlatformGateway for HttpPlatformGateway {
    async fn call(
        &self,
        entity_type: &str,
        action: &str,
        payload: Value,
        error_prefix: &str,
    ) -> Result<WireDocument> {
        let url = self.type_action_url(entity_type, action);
        tracing::debug!(%url, entity_type, action, "Platform type-action call");

        let response = self
            .with_retry(error_prefix, || {
                let mut request = self.request(reqwest::Method::POST, &url);
                if !payload.is_null() {
                    request = request.json(&payload);
                }
                request.send()
            })
            .await?;

        let body = response.text().await.map_err(|e| {
            FerryError::Platform(PlatformError::InvalidResponse(format!(
                "{error_prefix}: failed reading response body: {e}"
            )))
        })?;

        Ok(WireDocument::parse(&body))
    }

    async fn fetch_count(&self, entity_type: &str, filter: &str) -> Result<u64> {
        let payload = serde_json::json!({ "spec": { "filter": filter } });
        let prefix = format!("Unsuccessful fetchCount of type {entity_type}");
        let doc = self
            .call(entity_type, "fetchCount", payload, &prefix)
            .await?;

        doc.integer("fetchCountResponse")
            .or_else(|| doc.integer("count"))
            .ok_or_else(|| {
                FerryError::Platform(PlatformError::InvalidResponse(format!(
                    "{prefix}: no count in response"
                )))
            })
    }

    async fn fetch_field_labels(&self, entity_type: &str) -> Result<FieldLabelMap> {
        let prefix = format!("Unsuccessful getting field labels for {entity_type}");
        let doc = self
            .call(entity_type, "fieldLabels", serde_json::json!({}), &prefix)
            .await?;
        Ok(FieldLabelMap::from_wire(&doc))
    }

    async fn context_username(&self) -> Result<String> {
        // The configured username is authoritative when present; otherwise
        // ask the platform who we are.
        if let Some(username) = &self.username {
            return Ok(username.clone());
        }
        let doc = self
            .call(
                "Context",
                "get",
                Value::Null,
                "Unsuccessful getting platform context",
            )
            .await?;
        doc.scalar("username").ok_or_else(|| {
            FerryError::Platform(PlatformError::InvalidResponse(
                "Context response carried no username".to_string(),
            ))
        })
    }

    async fn remote_root(&self) -> Result<String> {
        let fs_type = self.file_system_type().await?;
        let doc = self
            .call(
                &fs_type,
                "rootUrl",
                serde_json::json!({ "this": {} }),
                "Unsuccessful retrieving root url of FileSystem",
            )
            .await?;
        doc.scalar("rootUrlResponse")
            .or_else(|| doc.scalar("rootUrl"))
            .map(|root| root.trim_end_matches('/').to_string())
            .ok_or_else(|| {
                FerryError::Platform(PlatformError::InvalidResponse(
                    "rootUrl response carried no root path".to_string(),
                ))
            })
    }

    async fn download_file(
        &self,
        remote_path: &str,
        local_path: &Path,
        tolerate_not_found: bool,
    ) -> Result<bool> {
        let url = self.file_url(remote_path);
        let prefix = format!("Unsuccessful pulling {url}");

        let mut attempt = 0;
        let response = loop {
            attempt += 1;
            match self.request(reqwest::Method::GET, &url).send().await {
                Ok(response) if response.status() == StatusCode::NOT_FOUND => {
                    if tolerate_not_found {
                        tracing::warn!(%url, "Remote file missing; zero matching records confirmed, skipping");
                        return Ok(false);
                    }
                    return Err(FerryError::Platform(PlatformError::NotFound(url)));
                }
                Ok(response) if response.status().is_success() => break response,
                Ok(response) if !Self::transient(response.status()) => {
                    return Err(FerryError::Platform(PlatformError::ClientError {
                        status: response.status().as_u16(),
                        message: prefix,
                    }));
                }
                Ok(response) => {
                    if attempt >= self.max_retries {
                        return Err(FerryError::Platform(PlatformError::RetriesExhausted {
                            prefix,
                            attempts: attempt,
                            last_error: format!("status {}", response.status()),
                        }));
                    }
                }
                Err(e) => {
                    if attempt >= self.max_retries {
                        return Err(FerryError::Platform(PlatformError::RetriesExhausted {
                            prefix,
                            attempts: attempt,
                            last_error: e.to_string(),
                        }));
                    }
                }
            }
            tokio::time::sleep(self.error_sleep).await;
        };

        let bytes = response.bytes().await.map_err(|e| {
            FerryError::Platform(PlatformError::TransferFailed(format!("{prefix}: {e}")))
        })?;

        if let Some(parent) = local_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(local_path, &bytes).await?;
        Ok(true)
    }

    async fn upload_file(&self, local_path: &Path, remote_path: &str) -> Result<()> {
        let url = self.file_url(remote_path);
        let prefix = format!("Unsuccessful pushing {url}");
        let bytes = tokio::fs::read(local_path).await?;

        self.with_retry(&prefix, || {
            self.request(reqwest::Method::PUT, &url)
                .header("Content-Type", "application/x-gzip")
                .body(bytes.clone())
                .send()
        })
        .await?;
        Ok(())
    }

    async fn delete_remote_files(&self, remote_paths: &[String]) -> Result<()> {
        if remote_paths.is_empty() {
            return Ok(());
        }
        let fs_type = self.file_system_type().await?;
        let payload = serde_json::json!({ "this": {}, "files": remote_paths });
        self.call(
            &fs_type,
            "deleteFilesBatch",
            payload,
            "Unsuccessful cleaning up generated files on environment",
        )
        .await?;
        Ok(())
    }

    async fn delete_remote_directory(&self, remote_path: &str) -> Result<()> {
        let fs_type = self.file_system_type().await?;
        let payload = serde_json::json!({
            "this": {},
            "urlOrEncodedPath": remote_path,
            "confirm": true,
        });
        self.call(
            &fs_type,
            "deleteFiles",
            payload,
            "Unsuccessful deleting folder on environment",
        )
        .await?;
        Ok(())
    }
}
