//! Field classification for an entity type
//!
//! The platform labels some fields of a type as calculated, foreign-key or
//! timed-value-history. Those fields (plus fixed metadata keys) are stripped
//! from records in transit. The map is fetched once per type per run and is
//! immutable afterwards.

use crate::adapters::platform::wire::WireDocument;
use std::collections::BTreeSet;

/// Record keys stripped regardless of field classification.
pub const METADATA_KEYS: [&str; 4] = ["meta", "type", "version", "versionEdits"];

/// Three disjoint sets of labeled field names for one entity type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldLabelMap {
    pub calc_fields: BTreeSet<String>,
    pub foreign_key_fields: BTreeSet<String>,
    pub timed_value_history_fields: BTreeSet<String>,
}

impl FieldLabelMap {
    /// Decode the platform's field-label response. The wire names
    /// (`calcFieldArr`, `foreignKeyFieldArr`, `timedValueHistoryFieldArr`)
    /// follow the platform's type-system vocabulary.
    pub fn from_wire(doc: &WireDocument) -> Self {
        Self {
            calc_fields: doc.string_array("calcFieldArr").into_iter().collect(),
            foreign_key_fields: doc.string_array("foreignKeyFieldArr").into_iter().collect(),
            timed_value_history_fields: doc
                .string_array("timedValueHistoryFieldArr")
                .into_iter()
                .collect(),
        }
    }

    /// All labeled field names, for stripping.
    pub fn labeled_fields(&self) -> impl Iterator<Item = &str> {
        self.calc_fields
            .iter()
            .chain(self.foreign_key_fields.iter())
            .chain(self.timed_value_history_fields.iter())
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.calc_fields.is_empty()
            && self.foreign_key_fields.is_empty()
            && self.timed_value_history_fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_wire() {
        let doc = WireDocument::parse(
            r#"{"calcFieldArr": ["total"], "foreignKeyFieldArr": ["parent"], "timedValueHistoryFieldArr": []}"#,
        );
        let map = FieldLabelMap::from_wire(&doc);
        assert!(map.calc_fields.contains("total"));
        assert!(map.foreign_key_fields.contains("parent"));
        assert!(map.timed_value_history_fields.is_empty());
        let labeled: Vec<&str> = map.labeled_fields().collect();
        assert_eq!(labeled, vec!["total", "parent"]);
    }

    #[test]
    fn test_empty_map() {
        let map = FieldLabelMap::default();
        assert!(map.is_empty());
        assert_eq!(map.labeled_fields().count(), 0);
    }
}
