//! Dual-shape platform response decoding
//!
//! The platform answers type-action calls with either an XML or a JSON body
//! depending on endpoint and platform version. [`WireDocument`] decodes both
//! shapes behind one set of typed accessors so the fallback chain lives in a
//! single place: XML tag extraction first, then JSON, then plain text tag
//! extraction for bodies that are neither.

use serde_json::Value;

/// A parsed platform response body.
///
/// The raw body is retained verbatim so callers can persist it unchanged
/// (queue-error artifacts are written exactly as received).
#[derive(Debug, Clone)]
pub struct WireDocument {
    raw: String,
    json: Option<Value>,
}

impl WireDocument {
    /// Decode a response body. Bodies that open with `<` are treated as XML;
    /// everything else is tried as JSON, falling back to raw tag extraction.
    pub fn parse(body: &str) -> Self {
        let json = if body.trim_start().starts_with('<') {
            None
        } else {
            serde_json::from_str(body).ok()
        };
        Self {
            raw: body.to_string(),
            json,
        }
    }

    /// The body exactly as received.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Extract a scalar value by field name: the first `<tag>` text in XML,
    /// or the first occurrence of the key anywhere in a JSON document.
    pub fn scalar(&self, tag: &str) -> Option<String> {
        match &self.json {
            Some(json) => json_find_scalar(json, tag),
            None => xml_tag_texts(&self.raw, tag).into_iter().next(),
        }
    }

    /// Job identifier from a submission response.
    pub fn job_id(&self) -> Option<String> {
        self.scalar("id")
    }

    /// Innermost run status from a job poll response
    /// (`./run/status/status` in XML, `run.status.status` in JSON).
    pub fn run_status(&self) -> Option<String> {
        match &self.json {
            Some(json) => json
                .pointer("/run/status/status")
                .and_then(Value::as_str)
                .map(str::to_string)
                .or_else(|| json_find_scalar(json, "status")),
            None => xml_tag_texts(&self.raw, "status").into_iter().next(),
        }
    }

    /// Every file URL in a file-listing response.
    pub fn file_urls(&self) -> Vec<String> {
        match &self.json {
            Some(json) => {
                let mut urls = Vec::new();
                json_collect_strings(json, "url", &mut urls);
                if urls.is_empty() {
                    if let Some(arr) = json_find(json, "urls").and_then(Value::as_array) {
                        urls.extend(arr.iter().filter_map(Value::as_str).map(str::to_string));
                    }
                }
                urls
            }
            None => xml_tag_texts(&self.raw, "url"),
        }
    }

    /// A non-negative integer answer, as returned by count queries. Bodies
    /// may quote the number; quotes are ignored.
    pub fn integer(&self, tag: &str) -> Option<u64> {
        if let Some(json) = &self.json {
            if let Some(n) = json.as_u64() {
                return Some(n);
            }
        }
        self.scalar(tag)
            .map(|s| s.trim().trim_matches('"').to_string())
            .and_then(|s| s.parse().ok())
    }

    /// All string values found under the given field name, accepting both a
    /// JSON array value and repeated XML elements.
    pub fn string_array(&self, tag: &str) -> Vec<String> {
        match &self.json {
            Some(json) => match json_find(json, tag) {
                Some(Value::Array(items)) => items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect(),
                Some(Value::String(s)) => vec![s.clone()],
                _ => Vec::new(),
            },
            None => xml_tag_texts(&self.raw, tag),
        }
    }
}

/// Depth-first search for the first occurrence of `key`.
fn json_find<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => {
            if let Some(v) = map.get(key) {
                return Some(v);
            }
            map.values().find_map(|v| json_find(v, key))
        }
        Value::Array(items) => items.iter().find_map(|v| json_find(v, key)),
        _ => None,
    }
}

/// Like [`json_find`], but descends through non-scalar hits until it reaches
/// a scalar (handles `status: { status: "completed" }` nestings).
fn json_find_scalar(value: &Value, key: &str) -> Option<String> {
    let found = json_find(value, key)?;
    match found {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Object(_) | Value::Array(_) => json_find_scalar(found, key),
        Value::Null => None,
    }
}

fn json_collect_strings(value: &Value, key: &str, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (k, v) in map {
                if k == key {
                    if let Some(s) = v.as_str() {
                        out.push(s.to_string());
                    }
                }
                json_collect_strings(v, key, out);
            }
        }
        Value::Array(items) => {
            for v in items {
                json_collect_strings(v, key, out);
            }
        }
        _ => {}
    }
}

/// Extract the text content of every `<tag>` element via a minimal scanner.
/// Nested same-name elements resolve to the innermost text.
fn xml_tag_texts(raw: &str, tag: &str) -> Vec<String> {
    let open_plain = format!("<{tag}>");
    let open_attr = format!("<{tag} ");
    let close = format!("</{tag}>");

    let mut out = Vec::new();
    let mut rest = raw;
    loop {
        let plain_at = rest.find(&open_plain);
        let attr_at = rest.find(&open_attr);
        let open_at = match (plain_at, attr_at) {
            (Some(a), Some(b)) => a.min(b),
            (Some(a), None) => a,
            (None, Some(b)) => b,
            (None, None) => break,
        };
        // position just past the opening tag's '>'
        let content_start = match rest[open_at..].find('>') {
            Some(gt) => open_at + gt + 1,
            None => break,
        };
        // self-closing element carries no text
        if rest[open_at..content_start].ends_with("/>") {
            rest = &rest[content_start..];
            continue;
        }
        let Some(close_rel) = rest[content_start..].find(&close) else {
            break;
        };
        let content = &rest[content_start..content_start + close_rel];
        if content.contains(&open_plain) || content.contains(&open_attr) {
            out.extend(xml_tag_texts(content, tag));
        } else {
            out.push(content.trim().to_string());
        }
        rest = &rest[content_start + close_rel + close.len()..];
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_id_from_xml() {
        let doc = WireDocument::parse("<startExportResponse><id>exp-42</id></startExportResponse>");
        assert_eq!(doc.job_id().as_deref(), Some("exp-42"));
    }

    #[test]
    fn test_job_id_from_json() {
        let doc = WireDocument::parse(r#"{"id": "imp-7", "status": "submitted"}"#);
        assert_eq!(doc.job_id().as_deref(), Some("imp-7"));
    }

    #[test]
    fn test_run_status_from_nested_xml() {
        let doc = WireDocument::parse(
            "<job><run><status><status>completed</status></status></run></job>",
        );
        assert_eq!(doc.run_status().as_deref(), Some("completed"));
    }

    #[test]
    fn test_run_status_from_nested_json() {
        let doc = WireDocument::parse(r#"{"run": {"status": {"status": "failing"}}}"#);
        assert_eq!(doc.run_status().as_deref(), Some("failing"));
    }

    #[test]
    fn test_file_urls_from_xml_listing() {
        let doc = WireDocument::parse(
            "<filesResponse><v><url>a/0.json.gz</url></v><v><url>a/1.json.gz</url></v></filesResponse>",
        );
        assert_eq!(doc.file_urls(), vec!["a/0.json.gz", "a/1.json.gz"]);
    }

    #[test]
    fn test_file_urls_from_json_listing() {
        let doc = WireDocument::parse(
            r#"{"filesResponse": {"v": [{"url": "a/0.json.gz"}, {"url": "a/1.json.gz"}]}}"#,
        );
        assert_eq!(doc.file_urls(), vec!["a/0.json.gz", "a/1.json.gz"]);
    }

    #[test]
    fn test_integer_handles_quoted_bodies() {
        let doc = WireDocument::parse("<fetchCountResponse>\"1234\"</fetchCountResponse>");
        assert_eq!(doc.integer("fetchCountResponse"), Some(1234));

        let doc = WireDocument::parse("17");
        assert_eq!(doc.integer("fetchCountResponse"), Some(17));
    }

    #[test]
    fn test_string_array_both_shapes() {
        let doc = WireDocument::parse(r#"{"calcFieldArr": ["a", "b"]}"#);
        assert_eq!(doc.string_array("calcFieldArr"), vec!["a", "b"]);

        let doc = WireDocument::parse(
            "<m><calcFieldArr>a</calcFieldArr><calcFieldArr>b</calcFieldArr></m>",
        );
        assert_eq!(doc.string_array("calcFieldArr"), vec!["a", "b"]);
    }

    #[test]
    fn test_non_json_non_xml_falls_back_to_tag_extraction() {
        // some endpoints return doubly-encoded payloads; tag scan still works
        let doc = WireDocument::parse("garbage <id>x-1</id> trailing");
        assert_eq!(doc.job_id().as_deref(), Some("x-1"));
    }

    #[test]
    fn test_missing_fields_are_none() {
        let doc = WireDocument::parse("{}");
        assert!(doc.job_id().is_none());
        assert!(doc.run_status().is_none());
        assert!(doc.file_urls().is_empty());
    }

    #[test]
    fn test_raw_is_preserved_verbatim() {
        let body = "<errors><e>bad record</e></errors>";
        let doc = WireDocument::parse(body);
        assert_eq!(doc.raw(), body);
    }

    #[test]
    fn test_self_closing_and_attributed_tags() {
        let doc = WireDocument::parse(r#"<r><url/><url kind="data">a.gz</url></r>"#);
        assert_eq!(doc.file_urls(), vec!["a.gz"]);
    }
}
