//! Configuration loading integration tests

use ferry::config::load_config;
use ferry::domain::FerryError;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn full_config_round_trips_through_loader() {
    let file = write_config(
        r#"
[application]
log_level = "debug"
prompt_for_warnings = false

[platform]
base_url = "https://env.example.com"
tenant = "tenant1"
tag = "prod"
username = "jsmith"
timeout_seconds = 120
error_sleep_seconds = 5
max_retries = 3

[transfer]
poll_interval_seconds = 10
poll_timeout_seconds = 1800
strip_metadata_and_derived = false
fail_on_duplicate_ids = false
error_output_folder = "out/errors"

[export]
enabled = true
download_folder = "out/downloads"

[[export.types]]
name = "Order"
download_data = true
refresh_calc_fields = false
num_records_per_file = 500
filter = "status == 'open'"

[import]
enabled = false
upload_folder = "out/uploads"
remove_enabled = false

[[import.types]]
name = "Order"
upload_data = true
remove_data = true
refresh_calc_fields = true
use_sql_on_remove = true
disable_downstream_on_remove = true
"#,
    );

    let config = load_config(file.path()).unwrap();

    assert_eq!(config.application.log_level, "debug");
    assert!(!config.application.prompt_for_warnings);
    assert_eq!(config.platform.error_sleep_seconds, 5);
    assert_eq!(config.transfer.poll_timeout_seconds, Some(1800));
    assert!(!config.transfer.fail_on_duplicate_ids);
    assert_eq!(config.error_output_folder(), "out/errors");

    let export_type = &config.export.types[0];
    assert_eq!(export_type.num_records_per_file, 500);
    assert_eq!(export_type.filter, "status == 'open'");

    let import_type = &config.import.types[0];
    assert!(import_type.use_sql_on_remove);
    assert!(import_type.disable_downstream_on_remove);
}

#[test]
fn env_substitution_resolves_placeholders() {
    std::env::set_var("FERRY_IT_PASSWORD", "sekrit");
    let file = write_config(
        r#"
[platform]
base_url = "https://env.example.com"
tenant = "tenant1"
tag = "prod"
username = "jsmith"
password = "${FERRY_IT_PASSWORD}"
"#,
    );

    let config = load_config(file.path()).unwrap();
    assert!(config.platform.password.is_some());
    std::env::remove_var("FERRY_IT_PASSWORD");
}

#[test]
fn missing_env_placeholder_is_a_config_error() {
    std::env::remove_var("FERRY_IT_UNSET");
    let file = write_config(
        r#"
[platform]
base_url = "https://env.example.com"
tenant = "tenant1"
tag = "prod"
password = "${FERRY_IT_UNSET}"
"#,
    );

    let err = load_config(file.path()).unwrap_err();
    assert!(matches!(err, FerryError::Configuration(_)));
    assert!(err.to_string().contains("FERRY_IT_UNSET"));
}

#[test]
fn unknown_per_type_key_fails_before_any_transfer() {
    let file = write_config(
        r#"
[platform]
base_url = "https://env.example.com"
tenant = "tenant1"
tag = "prod"

[[export.types]]
name = "Order"
download_data = true
refresh_calc_fields = false
uplaod_data = true
"#,
    );

    let err = load_config(file.path()).unwrap_err();
    assert!(matches!(err, FerryError::Configuration(_)));
}

#[test]
fn env_override_beats_file_value() {
    std::env::set_var("FERRY_PLATFORM_TAG", "staging");
    let file = write_config(
        r#"
[platform]
base_url = "https://env.example.com"
tenant = "tenant1"
tag = "prod"
"#,
    );

    let config = load_config(file.path()).unwrap();
    assert_eq!(config.platform.tag, "staging");
    std::env::remove_var("FERRY_PLATFORM_TAG");
}
