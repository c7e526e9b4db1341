//! Codec and scanner property tests

use ferry::core::codec::{decode_chunk, encode_chunk, strip_record};
use ferry::core::scanner::scan_chunk_files;
use ferry::domain::FieldLabelMap;
use serde_json::{json, Value};
use std::fs;
use tempfile::TempDir;

#[test]
fn decode_of_encode_reproduces_records_without_stripping() {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("chunk.json");
    let records = json!([
        {"id": "r1", "payload": {"deep": [1, 2, {"x": null}]}},
        {"id": "r2", "flag": true, "score": 3.25}
    ]);
    fs::write(&source, records.to_string()).unwrap();

    encode_chunk(&source, None, true).unwrap();
    let count = decode_chunk(&tmp.path().join("chunk.json.gz"), None, true).unwrap();

    assert_eq!(count, 2);
    let restored: Value = serde_json::from_str(&fs::read_to_string(&source).unwrap()).unwrap();
    assert_eq!(restored, records);
}

#[test]
fn stripping_an_already_stripped_set_is_a_no_op() {
    let mut labels = FieldLabelMap::default();
    labels.calc_fields.insert("derived".to_string());

    let mut record = json!({
        "id": "a",
        "meta": {},
        "type": "Order",
        "version": 1,
        "versionEdits": [],
        "derived": 10,
        "kept": "yes"
    });
    strip_record(&mut record, &labels);
    assert_eq!(record, json!({"id": "a", "kept": "yes"}));

    let first_pass = record.clone();
    strip_record(&mut record, &labels);
    assert_eq!(record, first_pass);
}

#[test]
fn scan_counts_and_flags_duplicates_across_files() {
    let tmp = TempDir::new().unwrap();
    let a = tmp.path().join("a.json");
    let b = tmp.path().join("b.json");
    fs::write(&a, json!([{"id": 1}, {"id": 2}, {"id": 3}]).to_string()).unwrap();
    fs::write(&b, json!([{"id": 2}, {"id": 4}]).to_string()).unwrap();

    let outcome = scan_chunk_files(&[a, b]).unwrap();
    assert_eq!(outcome.total_records, 5);
    assert_eq!(outcome.duplicate_ids, vec!["2"]);
}

#[test]
fn scan_skips_paths_that_vanished() {
    let tmp = TempDir::new().unwrap();
    let real = tmp.path().join("real.json");
    fs::write(&real, json!([{"id": "only"}]).to_string()).unwrap();

    let outcome =
        scan_chunk_files(&[tmp.path().join("gone.json"), real]).unwrap();
    assert_eq!(outcome.total_records, 1);
    assert!(outcome.duplicate_ids.is_empty());
}

#[test]
fn extracted_chunk_scans_clean_after_decode() {
    // decode then scan, the way the export pipeline chains them
    let tmp = TempDir::new().unwrap();
    let chunk = tmp.path().join("0.json.gz");
    fs::write(
        &chunk,
        json!({"data": [{"id": "a"}, {"id": "b"}]}).to_string(),
    )
    .unwrap();

    decode_chunk(&chunk, None, true).unwrap();
    let outcome = scan_chunk_files(&[tmp.path().join("0.json")]).unwrap();
    assert_eq!(outcome.total_records, 2);
    assert!(!outcome.has_duplicates());
}
