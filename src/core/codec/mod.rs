//! Chunk codec: gzip-compressed JSON record batches
//!
//! A chunk is one file holding a bounded batch of records for one entity
//! type. In transit chunks are gzip-compressed; at rest they are
//! pretty-printed, key-sorted JSON arrays. Decoding tolerates chunks that
//! were named `.json.gz` but written uncompressed (some platform jobs
//! produce those) by falling back to a plain read when gunzip fails.

use crate::core::staging;
use crate::domain::{FerryError, FieldLabelMap, Result, METADATA_KEYS};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde_json::Value;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Decode a compressed chunk into its plain-JSON sibling.
///
/// Reads `chunk_path` (gzip or, transparently, plain JSON), unwraps the
/// top-level `data` array (a bare array is accepted as-is), strips metadata
/// and labeled fields when `field_labels` is provided, and writes the
/// records as pretty-printed, key-sorted JSON to the sibling path without
/// the `.gz` suffix. Returns the record count.
pub fn decode_chunk(
    chunk_path: &Path,
    field_labels: Option<&FieldLabelMap>,
    delete_original: bool,
) -> Result<usize> {
    let target = plain_sibling(chunk_path)?;

    let raw = fs::read(chunk_path)?;
    let text = match gunzip(&raw) {
        Ok(text) => text,
        // not actually gzipped; treat the bytes as the JSON itself
        Err(_) => String::from_utf8(raw)
            .map_err(|e| FerryError::Codec(format!("{}: {e}", chunk_path.display())))?,
    };

    let mut records = parse_records(&text, chunk_path)?;
    if let Some(labels) = field_labels {
        for record in &mut records {
            strip_record(record, labels);
        }
    }

    let count = records.len();
    let pretty = serde_json::to_string_pretty(&Value::Array(records))?;
    fs::write(&target, pretty)?;

    if delete_original {
        staging::delete_files(&[chunk_path])?;
    }
    Ok(count)
}

/// Encode a plain JSON record file into its gzip sibling (`<path>.gz`).
///
/// The same optional field-stripping as [`decode_chunk`] applies before
/// compression.
pub fn encode_chunk(
    records_path: &Path,
    field_labels: Option<&FieldLabelMap>,
    delete_original: bool,
) -> Result<()> {
    let text = fs::read_to_string(records_path)?;
    let mut records = parse_records(&text, records_path)?;
    if let Some(labels) = field_labels {
        for record in &mut records {
            strip_record(record, labels);
        }
    }

    let target = PathBuf::from(format!("{}.gz", records_path.display()));
    let compact = serde_json::to_string(&Value::Array(records))?;
    let file = fs::File::create(&target)?;
    let mut encoder = GzEncoder::new(file, Compression::default());
    encoder.write_all(compact.as_bytes())?;
    encoder.finish()?;

    if delete_original {
        staging::delete_files(&[records_path])?;
    }
    Ok(())
}

/// Remove metadata keys and every labeled field from a record. Removal of an
/// absent key is a no-op, so stripping is idempotent.
pub fn strip_record(record: &mut Value, labels: &FieldLabelMap) {
    let Some(object) = record.as_object_mut() else {
        return;
    };
    for key in METADATA_KEYS {
        object.remove(key);
    }
    for field in labels.labeled_fields() {
        object.remove(field);
    }
}

fn gunzip(bytes: &[u8]) -> std::io::Result<String> {
    let mut decoder = GzDecoder::new(bytes);
    let mut text = String::new();
    decoder.read_to_string(&mut text)?;
    Ok(text)
}

/// Accept either the platform's `{"data": [...]}` envelope or a bare array.
fn parse_records(text: &str, origin: &Path) -> Result<Vec<Value>> {
    let parsed: Value = serde_json::from_str(text)
        .map_err(|e| FerryError::Codec(format!("{}: {e}", origin.display())))?;
    match parsed {
        Value::Array(records) => Ok(records),
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(records)) => Ok(records),
            _ => Err(FerryError::Codec(format!(
                "{}: expected a record array or a top-level `data` array",
                origin.display()
            ))),
        },
        _ => Err(FerryError::Codec(format!(
            "{}: expected a record array",
            origin.display()
        ))),
    }
}

fn plain_sibling(chunk_path: &Path) -> Result<PathBuf> {
    let name = chunk_path
        .to_str()
        .ok_or_else(|| FerryError::Codec(format!("non-utf8 path {}", chunk_path.display())))?;
    match name.strip_suffix(".gz") {
        Some(stem) => Ok(PathBuf::from(stem)),
        None => Err(FerryError::Codec(format!(
            "{name}: decode target must end in .gz"
        ))),
    }
}
