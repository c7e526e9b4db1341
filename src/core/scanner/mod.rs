//! Record-integrity scanner
//!
//! Walks plain-JSON chunk files for one entity type, accumulating a total
//! record count and flagging identifiers seen more than once. Runs before
//! upload (pre-transfer validation) and after download extraction
//! (post-transfer validation).

use crate::domain::{FerryError, Result};
use serde_json::Value;
use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::PathBuf;

/// Outcome of scanning one entity type's chunk files.
#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    /// Records across all scanned files
    pub total_records: usize,
    /// Identifiers that appeared more than once, sorted
    pub duplicate_ids: Vec<String>,
}

impl ScanOutcome {
    pub fn has_duplicates(&self) -> bool {
        !self.duplicate_ids.is_empty()
    }
}

/// Scan chunk files in the caller-supplied order.
///
/// Paths that no longer exist are skipped silently; upstream cleanup may
/// race with the scan. The first occurrence of an identifier is never
/// flagged. Records without an `id` key count toward the total but are not
/// tracked for duplicates.
pub fn scan_chunk_files(paths: &[PathBuf]) -> Result<ScanOutcome> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut duplicates: BTreeSet<String> = BTreeSet::new();
    let mut total = 0usize;

    for path in paths {
        if !path.is_file() {
            continue;
        }
        let text = fs::read_to_string(path)?;
        let parsed: Value = serde_json::from_str(&text)
            .map_err(|e| FerryError::Codec(format!("{}: {e}", path.display())))?;

        let records = match &parsed {
            Value::Array(records) => records.as_slice(),
            Value::Object(map) => match map.get("data").and_then(Value::as_array) {
                Some(records) => records.as_slice(),
                None => {
                    return Err(FerryError::Codec(format!(
                        "{}: expected a record array",
                        path.display()
                    )))
                }
            },
            _ => {
                return Err(FerryError::Codec(format!(
                    "{}: expected a record array",
                    path.display()
                )))
            }
        };

        total += records.len();
        for record in records {
            if let Some(id) = record_id(record) {
                if !seen.insert(id.clone()) {
                    duplicates.insert(id);
                }
            }
        }
    }

    Ok(ScanOutcome {
        total_records: total,
        duplicate_ids: duplicates.into_iter().collect(),
    })
}

/// Canonical string form of a record's `id`, if any.
fn record_id(record: &Value) -> Option<String> {
    match record.get("id")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn write_chunk(dir: &TempDir, name: &str, records: Value) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, records.to_string()).unwrap();
        path
    }

    #[test]
    fn test_totals_and_duplicates() {
        let tmp = TempDir::new().unwrap();
        let a = write_chunk(&tmp, "a.json", json!([{"id": 1}, {"id": 2}, {"id": 3}]));
        let b = write_chunk(&tmp, "b.json", json!([{"id": 2}, {"id": 4}]));

        let outcome = scan_chunk_files(&[a, b]).unwrap();
        assert_eq!(outcome.total_records, 5);
        assert_eq!(outcome.duplicate_ids, vec!["2"]);
    }

    #[test]
    fn test_first_occurrence_never_flagged() {
        let tmp = TempDir::new().unwrap();
        let a = write_chunk(&tmp, "a.json", json!([{"id": "x"}]));

        let outcome = scan_chunk_files(&[a]).unwrap();
        assert_eq!(outcome.total_records, 1);
        assert!(!outcome.has_duplicates());
    }

    #[test]
    fn test_duplicate_within_single_file() {
        let tmp = TempDir::new().unwrap();
        let a = write_chunk(&tmp, "a.json", json!([{"id": "42"}, {"id": "42"}]));

        let outcome = scan_chunk_files(&[a]).unwrap();
        assert_eq!(outcome.duplicate_ids, vec!["42"]);
    }

    #[test]
    fn test_missing_paths_skipped_silently() {
        let tmp = TempDir::new().unwrap();
        let a = write_chunk(&tmp, "a.json", json!([{"id": 1}]));
        let ghost = tmp.path().join("ghost.json");

        let outcome = scan_chunk_files(&[a, ghost]).unwrap();
        assert_eq!(outcome.total_records, 1);
    }

    #[test]
    fn test_records_without_ids_count_toward_total() {
        let tmp = TempDir::new().unwrap();
        let a = write_chunk(&tmp, "a.json", json!([{"name": "n"}, {"name": "m"}]));

        let outcome = scan_chunk_files(&[a]).unwrap();
        assert_eq!(outcome.total_records, 2);
        assert!(!outcome.has_duplicates());
    }

    #[test]
    fn test_numeric_and_string_ids_share_a_namespace() {
        let tmp = TempDir::new().unwrap();
        let a = write_chunk(&tmp, "a.json", json!([{"id": 7}]));
        let b = write_chunk(&tmp, "b.json", json!([{"id": "7"}]));

        let outcome = scan_chunk_files(&[a, b]).unwrap();
        assert_eq!(outcome.duplicate_ids, vec!["7"]);
    }

    #[test]
    fn test_duplicates_sorted_for_determinism() {
        let tmp = TempDir::new().unwrap();
        let a = write_chunk(
            &tmp,
            "a.json",
            json!([{"id": "z"}, {"id": "a"}, {"id": "z"}, {"id": "a"}]),
        );

        let outcome = scan_chunk_files(&[a]).unwrap();
        assert_eq!(outcome.duplicate_ids, vec!["a", "z"]);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bad.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(scan_chunk_files(&[path]).is_err());
    }
}
