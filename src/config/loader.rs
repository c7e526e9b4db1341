//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::FerryConfig;
use crate::domain::errors::FerryError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (`${VAR}` syntax)
/// 3. Parses the TOML into [`FerryConfig`]
/// 4. Applies environment variable overrides (`FERRY_*` prefix)
/// 5. Validates the configuration
pub fn load_config(path: impl AsRef<Path>) -> Result<FerryConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(FerryError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        FerryError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let contents = substitute_env_vars(&contents)?;

    let mut config: FerryConfig = toml::from_str(&contents)
        .map_err(|e| FerryError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config);

    config.validate().map_err(|e| {
        FerryError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format `${VAR_NAME}`
///
/// Comment lines are left untouched. Referencing an unset variable is an
/// error so a missing credential fails at startup, not mid-transfer.
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").unwrap();
    let mut result = String::new();
    let mut missing_vars = Vec::new();

    for line in input.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{var_name}}}");
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.contains(&var_name.to_string()) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(FerryError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

/// Applies environment variable overrides using the `FERRY_*` prefix
///
/// Variables follow the pattern `FERRY_<SECTION>_<KEY>`, for example
/// `FERRY_PLATFORM_BASE_URL` or `FERRY_TRANSFER_POLL_INTERVAL_SECONDS`.
fn apply_env_overrides(config: &mut FerryConfig) {
    if let Ok(val) = std::env::var("FERRY_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }
    if let Ok(val) = std::env::var("FERRY_APPLICATION_PROMPT_FOR_WARNINGS") {
        config.application.prompt_for_warnings = val.parse().unwrap_or(true);
    }

    if let Ok(val) = std::env::var("FERRY_PLATFORM_BASE_URL") {
        config.platform.base_url = val;
    }
    if let Ok(val) = std::env::var("FERRY_PLATFORM_TENANT") {
        config.platform.tenant = val;
    }
    if let Ok(val) = std::env::var("FERRY_PLATFORM_TAG") {
        config.platform.tag = val;
    }
    if let Ok(val) = std::env::var("FERRY_PLATFORM_USERNAME") {
        config.platform.username = Some(val);
    }
    if let Ok(val) = std::env::var("FERRY_PLATFORM_PASSWORD") {
        config.platform.password = Some(secrecy::Secret::new(val));
    }
    if let Ok(val) = std::env::var("FERRY_PLATFORM_TLS_VERIFY") {
        config.platform.tls_verify = val.parse().unwrap_or(true);
    }

    if let Ok(val) = std::env::var("FERRY_TRANSFER_POLL_INTERVAL_SECONDS") {
        if let Ok(seconds) = val.parse() {
            config.transfer.poll_interval_seconds = seconds;
        }
    }
    if let Ok(val) = std::env::var("FERRY_TRANSFER_POLL_TIMEOUT_SECONDS") {
        if let Ok(seconds) = val.parse() {
            config.transfer.poll_timeout_seconds = Some(seconds);
        }
    }
    if let Ok(val) = std::env::var("FERRY_TRANSFER_FAIL_ON_DUPLICATE_IDS") {
        config.transfer.fail_on_duplicate_ids = val.parse().unwrap_or(true);
    }

    if let Ok(val) = std::env::var("FERRY_EXPORT_DOWNLOAD_FOLDER") {
        config.export.download_folder = val;
    }
    if let Ok(val) = std::env::var("FERRY_IMPORT_UPLOAD_FOLDER") {
        config.import.upload_folder = val;
    }
}
