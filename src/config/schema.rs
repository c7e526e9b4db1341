//! Configuration schema types
//!
//! The root [`FerryConfig`] maps to the TOML file. Flags and defaults are
//! validated and defaulted once at load time; per-type tables reject unknown
//! keys so a typo'd flag fails the run before any transfer begins.

use crate::domain::{Direction, EntityTypeConfig, DEFAULT_RECORDS_PER_FILE, MATCH_ALL_FILTER};
use secrecy::Secret;
use serde::Deserialize;

/// Main Ferry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FerryConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Remote platform connection
    pub platform: PlatformConfig,

    /// Transfer engine tuning
    #[serde(default)]
    pub transfer: TransferConfig,

    /// Export (download) direction
    #[serde(default)]
    pub export: ExportSection,

    /// Import (upload) direction
    #[serde(default)]
    pub import: ImportSection,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl FerryConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.platform.validate()?;
        self.transfer.validate()?;
        self.export.validate()?;
        self.import.validate()?;
        Ok(())
    }

    /// Folder queue-error artifacts are written under. Defaults to the
    /// download folder with an `_Errors` suffix.
    pub fn error_output_folder(&self) -> String {
        self.transfer
            .error_output_folder
            .clone()
            .unwrap_or_else(|| format!("{}_Errors", self.export.download_folder))
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Prompt before destructive directory wipes
    #[serde(default = "default_true")]
    pub prompt_for_warnings: bool,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            prompt_for_warnings: true,
        }
    }
}

/// Remote platform connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PlatformConfig {
    /// Platform base URL
    pub base_url: String,

    /// Tenant the type-action API is addressed under
    pub tenant: String,

    /// Environment tag within the tenant
    pub tag: String,

    /// Basic-auth username
    #[serde(default)]
    pub username: Option<String>,

    /// Basic-auth password
    #[serde(default)]
    pub password: Option<Secret<String>>,

    /// Per-request timeout
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Fixed sleep between retries of a failed request
    #[serde(default = "default_error_sleep_seconds")]
    pub error_sleep_seconds: u64,

    /// Attempts before a retryable failure becomes fatal
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Verify TLS certificates
    #[serde(default = "default_true")]
    pub tls_verify: bool,
}

impl PlatformConfig {
    fn validate(&self) -> Result<(), String> {
        url::Url::parse(&self.base_url)
            .map_err(|e| format!("Invalid platform.base_url '{}': {e}", self.base_url))?;
        if self.tenant.is_empty() {
            return Err("platform.tenant must not be empty".to_string());
        }
        if self.tag.is_empty() {
            return Err("platform.tag must not be empty".to_string());
        }
        if self.max_retries == 0 {
            return Err("platform.max_retries must be at least 1".to_string());
        }
        if self.error_sleep_seconds == 0 {
            return Err("platform.error_sleep_seconds must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Transfer engine tuning
#[derive(Debug, Clone, Deserialize)]
pub struct TransferConfig {
    /// Fixed sleep between batch-job poll cycles
    #[serde(default = "default_poll_interval_seconds")]
    pub poll_interval_seconds: u64,

    /// Optional bound on a polling session; unset polls forever
    #[serde(default)]
    pub poll_timeout_seconds: Option<u64>,

    /// Strip metadata and labeled fields from records in transit
    #[serde(default = "default_true")]
    pub strip_metadata_and_derived: bool,

    /// Abort the run when duplicate record ids are found
    #[serde(default = "default_true")]
    pub fail_on_duplicate_ids: bool,

    /// Queue-error artifact folder; defaults to `<download_folder>_Errors`
    #[serde(default)]
    pub error_output_folder: Option<String>,

    /// Bound on concurrent chunk uploads/downloads within a type
    #[serde(default = "default_max_concurrent_transfers")]
    pub max_concurrent_transfers: usize,
}

impl TransferConfig {
    fn validate(&self) -> Result<(), String> {
        if self.poll_interval_seconds == 0 {
            return Err("transfer.poll_interval_seconds must be at least 1".to_string());
        }
        if self.max_concurrent_transfers == 0 {
            return Err("transfer.max_concurrent_transfers must be at least 1".to_string());
        }
        Ok(())
    }
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            poll_interval_seconds: default_poll_interval_seconds(),
            poll_timeout_seconds: None,
            strip_metadata_and_derived: true,
            fail_on_duplicate_ids: true,
            error_output_folder: None,
            max_concurrent_transfers: default_max_concurrent_transfers(),
        }
    }
}

/// Export (download) direction settings
#[derive(Debug, Clone, Deserialize)]
pub struct ExportSection {
    /// Master switch for the export direction
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Local folder chunk files are downloaded into (one subfolder per type)
    #[serde(default = "default_download_folder")]
    pub download_folder: String,

    /// Entity types to export
    #[serde(default)]
    pub types: Vec<ExportTypeConfig>,
}

impl ExportSection {
    fn validate(&self) -> Result<(), String> {
        if self.enabled && self.download_folder.is_empty() {
            return Err("export.download_folder must not be empty".to_string());
        }
        validate_type_names(self.types.iter().map(|t| t.name.as_str()), "export")?;
        for t in &self.types {
            t.validate()?;
        }
        Ok(())
    }
}

impl Default for ExportSection {
    fn default() -> Self {
        Self {
            enabled: true,
            download_folder: default_download_folder(),
            types: Vec::new(),
        }
    }
}

/// Import (upload) direction settings
#[derive(Debug, Clone, Deserialize)]
pub struct ImportSection {
    /// Master switch for the import direction
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Local folder chunk files are read from (one subfolder per type)
    #[serde(default = "default_upload_folder")]
    pub upload_folder: String,

    /// Master switch for pre-import removal jobs
    #[serde(default = "default_true")]
    pub remove_enabled: bool,

    /// Entity types to import
    #[serde(default)]
    pub types: Vec<ImportTypeConfig>,
}

impl ImportSection {
    fn validate(&self) -> Result<(), String> {
        if self.enabled && self.upload_folder.is_empty() {
            return Err("import.upload_folder must not be empty".to_string());
        }
        validate_type_names(self.types.iter().map(|t| t.name.as_str()), "import")?;
        Ok(())
    }
}

impl Default for ImportSection {
    fn default() -> Self {
        Self {
            enabled: true,
            upload_folder: default_upload_folder(),
            remove_enabled: true,
            types: Vec::new(),
        }
    }
}

/// One exported entity type. Unknown keys are rejected.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExportTypeConfig {
    /// Entity type name
    pub name: String,

    /// Download this type's records
    pub download_data: bool,

    /// Refresh calculated fields after transfer
    pub refresh_calc_fields: bool,

    /// Records per produced chunk file
    #[serde(default = "default_records_per_file")]
    pub num_records_per_file: usize,

    /// Query predicate scoping the export
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl ExportTypeConfig {
    fn validate(&self) -> Result<(), String> {
        if self.num_records_per_file == 0 {
            return Err(format!(
                "export type '{}': num_records_per_file must be positive",
                self.name
            ));
        }
        if self.filter.is_empty() {
            return Err(format!("export type '{}': filter must not be empty", self.name));
        }
        Ok(())
    }

    /// Materialize the run-state record for this type.
    pub fn to_entity(&self) -> EntityTypeConfig {
        let mut entity = EntityTypeConfig::new(&self.name);
        entity.download_data = self.download_data;
        entity.refresh_calc_fields = self.refresh_calc_fields;
        entity.num_records_per_file = self.num_records_per_file;
        entity.filter = self.filter.clone();
        entity
    }
}

/// One imported entity type. Unknown keys are rejected.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImportTypeConfig {
    /// Entity type name
    pub name: String,

    /// Upload this type's chunk files
    pub upload_data: bool,

    /// Remove existing remote records before importing
    pub remove_data: bool,

    /// Refresh calculated fields after load
    pub refresh_calc_fields: bool,

    /// Remove via SQL on the platform side
    #[serde(default)]
    pub use_sql_on_remove: bool,

    /// Suppress downstream invalidation on removal
    #[serde(default)]
    pub disable_downstream_on_remove: bool,
}

impl ImportTypeConfig {
    /// Materialize the run-state record for this type.
    pub fn to_entity(&self) -> EntityTypeConfig {
        let mut entity = EntityTypeConfig::new(&self.name);
        entity.upload_data = self.upload_data;
        entity.remove_data = self.remove_data;
        entity.refresh_calc_fields = self.refresh_calc_fields;
        entity.use_sql_on_remove = self.use_sql_on_remove;
        entity.disable_downstream_on_remove = self.disable_downstream_on_remove;
        entity
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Write JSON logs to rolling local files
    #[serde(default)]
    pub local_enabled: bool,

    /// Log file directory
    #[serde(default = "default_log_path")]
    pub local_path: String,

    /// Rotation cadence (daily, hourly)
    #[serde(default = "default_log_rotation")]
    pub local_rotation: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_log_path(),
            local_rotation: default_log_rotation(),
        }
    }
}

/// Build the entity run list for one direction.
pub fn entities_for_direction(config: &FerryConfig, direction: Direction) -> Vec<EntityTypeConfig> {
    match direction {
        Direction::Export => config.export.types.iter().map(ExportTypeConfig::to_entity).collect(),
        Direction::Import => config.import.types.iter().map(ImportTypeConfig::to_entity).collect(),
    }
}

fn validate_type_names<'a, I: Iterator<Item = &'a str>>(
    names: I,
    section: &str,
) -> Result<(), String> {
    let mut seen = std::collections::HashSet::new();
    for name in names {
        if name.is_empty() {
            return Err(format!("{section} type names must not be empty"));
        }
        if !seen.insert(name) {
            return Err(format!("{section} type '{name}' is configured twice"));
        }
    }
    Ok(())
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_timeout_seconds() -> u64 {
    300
}

fn default_error_sleep_seconds() -> u64 {
    15
}

fn default_max_retries() -> usize {
    4
}

fn default_poll_interval_seconds() -> u64 {
    15
}

fn default_max_concurrent_transfers() -> usize {
    4
}

fn default_download_folder() -> String {
    "data/downloads".to_string()
}

fn default_upload_folder() -> String {
    "data/uploads".to_string()
}

fn default_records_per_file() -> usize {
    DEFAULT_RECORDS_PER_FILE
}

fn default_filter() -> String {
    MATCH_ALL_FILTER.to_string()
}

fn default_log_path() -> String {
    "logs".to_string()
}

fn default_log_rotation() -> String {
    "daily".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_toml() -> &'static str {
        r#"
[platform]
base_url = "https://env.example.com"
tenant = "tenant1"
tag = "prod"

[[export.types]]
name = "Order"
download_data = true
refresh_calc_fields = false

[[import.types]]
name = "Order"
upload_data = true
remove_data = false
refresh_calc_fields = true
"#
    }

    #[test]
    fn test_minimal_config_parses_and_validates() {
        let config: FerryConfig = toml::from_str(minimal_toml()).unwrap();
        config.validate().unwrap();

        assert_eq!(config.application.log_level, "info");
        assert_eq!(config.transfer.poll_interval_seconds, 15);
        assert!(config.transfer.poll_timeout_seconds.is_none());

        let export_type = &config.export.types[0];
        assert_eq!(export_type.num_records_per_file, 2000);
        assert_eq!(export_type.filter, "1 == 1");
    }

    #[test]
    fn test_unknown_type_key_rejected() {
        let toml = r#"
[platform]
base_url = "https://env.example.com"
tenant = "tenant1"
tag = "prod"

[[export.types]]
name = "Order"
download_data = true
refresh_calc_fields = false
not_a_real_flag = true
"#;
        assert!(toml::from_str::<FerryConfig>(toml).is_err());
    }

    #[test]
    fn test_missing_required_flag_rejected() {
        let toml = r#"
[platform]
base_url = "https://env.example.com"
tenant = "tenant1"
tag = "prod"

[[import.types]]
name = "Order"
upload_data = true
"#;
        assert!(toml::from_str::<FerryConfig>(toml).is_err());
    }

    #[test]
    fn test_duplicate_type_names_rejected() {
        let toml = r#"
[platform]
base_url = "https://env.example.com"
tenant = "tenant1"
tag = "prod"

[[export.types]]
name = "Order"
download_data = true
refresh_calc_fields = false

[[export.types]]
name = "Order"
download_data = false
refresh_calc_fields = false
"#;
        let config: FerryConfig = toml::from_str(toml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_records_per_file_rejected() {
        let toml = r#"
[platform]
base_url = "https://env.example.com"
tenant = "tenant1"
tag = "prod"

[[export.types]]
name = "Order"
download_data = true
refresh_calc_fields = false
num_records_per_file = 0
"#;
        let config: FerryConfig = toml::from_str(toml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let toml = r#"
[platform]
base_url = "not a url"
tenant = "tenant1"
tag = "prod"
"#;
        let config: FerryConfig = toml::from_str(toml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_error_output_folder_defaults_from_download_folder() {
        let config: FerryConfig = toml::from_str(minimal_toml()).unwrap();
        assert_eq!(config.error_output_folder(), "data/downloads_Errors");
    }

    #[test]
    fn test_entities_for_direction() {
        let config: FerryConfig = toml::from_str(minimal_toml()).unwrap();
        let exports = entities_for_direction(&config, Direction::Export);
        assert_eq!(exports.len(), 1);
        assert!(exports[0].download_data);
        let imports = entities_for_direction(&config, Direction::Import);
        assert!(imports[0].upload_data);
        assert!(!imports[0].remove_data);
    }
}
