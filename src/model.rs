// 📦 Entry Model - entry documents, reference lists and the summary map
//
// Documents are kept as order-preserving JSON: fields this tool does not
// know about (titles, locales, reference metadata) are carried through the
// rewrite unchanged and keep their position.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

// ============================================================================
// REFERENCE KIND
// ============================================================================

/// Which remote collection a reference points into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceKind {
    Category,
    Product,
}

impl ReferenceKind {
    pub const ALL: [ReferenceKind; 2] = [ReferenceKind::Category, ReferenceKind::Product];

    /// Field name on the entry object
    pub fn field(&self) -> &'static str {
        match self {
            ReferenceKind::Category => "category",
            ReferenceKind::Product => "product",
        }
    }

    /// Capitalized name for log lines
    pub fn label(&self) -> &'static str {
        match self {
            ReferenceKind::Category => "Category",
            ReferenceKind::Product => "Product",
        }
    }

    /// Path segment of the lookup endpoint
    pub fn path_segment(&self) -> &'static str {
        match self {
            ReferenceKind::Category => "categories",
            ReferenceKind::Product => "products",
        }
    }
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field())
    }
}

// ============================================================================
// REFERENCE
// ============================================================================

/// Lookup key of one `data` element. Only non-empty strings count.
pub fn reference_key(reference: &Value) -> Option<String> {
    reference
        .get("key")
        .and_then(Value::as_str)
        .filter(|key| !key.is_empty())
        .map(str::to_owned)
}

// ============================================================================
// ENTRY
// ============================================================================

/// Shape of an entry's `category` / `product` field
///
/// `Empty` and `Absent` are different on purpose: `{}` means the references
/// were evaluated and none survived, a missing field was never there.
/// Anything without own keys counts as `Empty`: `{}`, `[]`, `""`, booleans
/// and numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupState {
    /// Field missing or `null`
    Absent,
    /// Field present but holds no keys
    Empty,
    /// Non-empty object, array or string
    Present,
}

impl GroupState {
    pub fn is_vacant(&self) -> bool {
        matches!(self, GroupState::Absent | GroupState::Empty)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Entry {
    fields: Map<String, Value>,
}

impl Entry {
    /// Wrap a JSON value. Only objects are entries.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Entry { fields }),
            _ => None,
        }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }

    pub fn group_state(&self, kind: ReferenceKind) -> GroupState {
        match self.fields.get(kind.field()) {
            None | Some(Value::Null) => GroupState::Absent,
            Some(Value::Object(group)) if !group.is_empty() => GroupState::Present,
            Some(Value::Array(items)) if !items.is_empty() => GroupState::Present,
            Some(Value::String(text)) if !text.is_empty() => GroupState::Present,
            Some(_) => GroupState::Empty,
        }
    }

    /// Lookup keys of `<kind>.data`, positionally.
    ///
    /// `None` when there is nothing to reconcile: the field is missing, or
    /// `data` is not a non-empty array. Elements without a usable key are
    /// reported as `None` in their slot.
    pub fn reference_keys(&self, kind: ReferenceKind) -> Option<Vec<Option<String>>> {
        let data = self.fields.get(kind.field())?.get("data")?.as_array()?;
        if data.is_empty() {
            return None;
        }
        Some(data.iter().map(reference_key).collect())
    }

    /// Rewrite `<kind>.data` from positional lookup results.
    ///
    /// Slot `i` of `resolved` belongs to reference `i`. References with a
    /// resolved id keep their position and every other field; only `id` is
    /// replaced. The rest are removed. When nothing survives the whole group
    /// becomes `{}`.
    ///
    /// Returns the key of the last surviving reference.
    pub fn apply_resolutions(
        &mut self,
        kind: ReferenceKind,
        resolved: Vec<Option<String>>,
    ) -> Option<String> {
        let data = self
            .fields
            .get_mut(kind.field())
            .and_then(|group| group.get_mut("data"))
            .and_then(Value::as_array_mut)?;

        let mut kept = Vec::with_capacity(data.len());
        let mut last_key = None;

        for (mut reference, id) in std::mem::take(data).into_iter().zip(resolved) {
            let Some(id) = id else { continue };
            if let Value::Object(fields) = &mut reference {
                last_key = fields.get("key").and_then(Value::as_str).map(str::to_owned);
                fields.insert("id".to_string(), Value::String(id));
                kept.push(reference);
            }
        }

        if kept.is_empty() {
            self.fields
                .insert(kind.field().to_string(), Value::Object(Map::new()));
        } else {
            *data = kept;
        }

        last_key
    }

    /// True when neither kind holds anything
    pub fn is_unreferenced(&self) -> bool {
        ReferenceKind::ALL
            .iter()
            .all(|kind| self.group_state(*kind).is_vacant())
    }

    pub fn clear_publish_details(&mut self) {
        self.fields
            .insert("publish_details".to_string(), Value::Array(Vec::new()));
    }
}

// ============================================================================
// ENTRY DOCUMENT
// ============================================================================

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("invalid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("document root is not a JSON object")]
    NotAnObject,

    #[error("entry {entry_id} is not a JSON object")]
    MalformedEntry { entry_id: String },
}

/// One `*-entries.json` file: entry-ID → entry, in file order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EntryDocument {
    entries: IndexMap<String, Entry>,
}

impl EntryDocument {
    pub fn from_json(raw: &str) -> Result<Self, DocumentError> {
        let Value::Object(root) = serde_json::from_str::<Value>(raw)? else {
            return Err(DocumentError::NotAnObject);
        };

        let mut entries = IndexMap::with_capacity(root.len());
        for (entry_id, value) in root {
            let entry = Entry::from_value(value)
                .ok_or_else(|| DocumentError::MalformedEntry {
                    entry_id: entry_id.clone(),
                })?;
            entries.insert(entry_id, entry);
        }

        Ok(EntryDocument { entries })
    }

    /// Two-space pretty JSON, no trailing newline
    pub fn to_pretty_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.entries)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries_mut(&mut self) -> impl Iterator<Item = (&String, &mut Entry)> {
        self.entries.iter_mut()
    }
}

// ============================================================================
// SUMMARY MAP
// ============================================================================

/// Keys kept for one entry
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_key: Option<String>,
}

impl SummaryRecord {
    pub fn key(&self, kind: ReferenceKind) -> Option<&str> {
        match kind {
            ReferenceKind::Category => self.category_key.as_deref(),
            ReferenceKind::Product => self.product_key.as_deref(),
        }
    }

    pub fn set_key(&mut self, kind: ReferenceKind, key: String) {
        match kind {
            ReferenceKind::Category => self.category_key = Some(key),
            ReferenceKind::Product => self.product_key = Some(key),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.category_key.is_none() && self.product_key.is_none()
    }
}

/// entry-ID → kept keys, in the order entries were reconciled
pub type SummaryMap = IndexMap<String, SummaryRecord>;

/// Fold `other` into `target`; a record for an existing entry-ID replaces
/// the previous one wholesale.
pub fn merge_summary(target: &mut SummaryMap, other: SummaryMap) {
    for (entry_id, record) in other {
        target.insert(entry_id, record);
    }
}

/// Compact JSON rendering for log lines
pub fn summary_json(summary: &SummaryMap) -> String {
    serde_json::to_string(summary).unwrap_or_else(|_| "{}".to_string())
}

// ============================================================================
// CREDENTIALS
// ============================================================================

/// Opaque bearer token. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        BearerToken(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(***)")
    }
}

/// One token per reference kind, valid for a single run
#[derive(Debug, Clone)]
pub struct Credentials {
    pub category: BearerToken,
    pub product: BearerToken,
}

impl Credentials {
    pub fn token_for(&self, kind: ReferenceKind) -> &BearerToken {
        match kind {
            ReferenceKind::Category => &self.category,
            ReferenceKind::Product => &self.product,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(value: Value) -> Entry {
        Entry::from_value(value).unwrap()
    }

    #[test]
    fn test_reference_keys_positional() {
        let e = entry(json!({
            "category": {"data": [{"key": "k1"}, {"uid": "x"}, {"key": ""}, {"key": "k1"}]}
        }));

        let keys = e.reference_keys(ReferenceKind::Category).unwrap();
        assert_eq!(
            keys,
            vec![Some("k1".to_string()), None, None, Some("k1".to_string())]
        );
        assert!(e.reference_keys(ReferenceKind::Product).is_none());
    }

    #[test]
    fn test_reference_keys_skips_empty_or_odd_shapes() {
        let empty = entry(json!({"category": {"data": []}}));
        assert!(empty.reference_keys(ReferenceKind::Category).is_none());

        let not_array = entry(json!({"category": {"data": "k1"}}));
        assert!(not_array.reference_keys(ReferenceKind::Category).is_none());

        let scalar = entry(json!({"category": 5}));
        assert!(scalar.reference_keys(ReferenceKind::Category).is_none());
    }

    #[test]
    fn test_apply_resolutions_keeps_siblings_and_order() {
        let mut e = entry(json!({
            "title": "Shoes",
            "category": {
                "data": [
                    {"key": "a", "id": "old-a", "_content_type_uid": "cat"},
                    {"key": "b", "id": "old-b"},
                    {"key": "c"}
                ],
                "type": "commercetools"
            }
        }));

        let last = e.apply_resolutions(
            ReferenceKind::Category,
            vec![Some("new-a".into()), None, Some("new-c".into())],
        );

        assert_eq!(last.as_deref(), Some("c"));
        assert_eq!(
            e.into_value(),
            json!({
                "title": "Shoes",
                "category": {
                    "data": [
                        {"key": "a", "id": "new-a", "_content_type_uid": "cat"},
                        {"key": "c", "id": "new-c"}
                    ],
                    "type": "commercetools"
                }
            })
        );
    }

    #[test]
    fn test_apply_resolutions_all_dropped_leaves_empty_record() {
        let mut e = entry(json!({
            "category": {"data": [{"key": "bad"}], "type": "x"},
            "product": {}
        }));

        let last = e.apply_resolutions(ReferenceKind::Category, vec![None]);

        assert!(last.is_none());
        assert_eq!(e.group_state(ReferenceKind::Category), GroupState::Empty);
        assert_eq!(e.as_map().keys().next().map(String::as_str), Some("category"));
        assert!(e.is_unreferenced());
    }

    #[test]
    fn test_group_state() {
        let e = entry(json!({"category": null, "product": {"data": []}}));
        assert_eq!(e.group_state(ReferenceKind::Category), GroupState::Absent);
        assert_eq!(e.group_state(ReferenceKind::Product), GroupState::Present);
        assert!(!e.is_unreferenced());

        let bare = entry(json!({"title": "t"}));
        assert!(bare.is_unreferenced());
    }

    #[test]
    fn test_group_state_keyless_values_are_empty() {
        for value in [json!({}), json!([]), json!(""), json!(false), json!(true), json!(0), json!(7)] {
            let e = entry(json!({"category": value.clone()}));
            assert_eq!(
                e.group_state(ReferenceKind::Category),
                GroupState::Empty,
                "category = {}",
                value
            );
            assert!(e.is_unreferenced());
        }

        for value in [json!(["x"]), json!("k1"), json!({"type": "x"})] {
            let e = entry(json!({"product": value.clone()}));
            assert_eq!(
                e.group_state(ReferenceKind::Product),
                GroupState::Present,
                "product = {}",
                value
            );
            assert!(!e.is_unreferenced());
        }
    }

    #[test]
    fn test_clear_publish_details_in_place() {
        let mut e = entry(json!({"publish_details": ["x"], "title": "t"}));
        e.clear_publish_details();

        assert_eq!(e.as_map().get("publish_details"), Some(&json!([])));
        assert_eq!(
            e.as_map().keys().next().map(String::as_str),
            Some("publish_details")
        );
    }

    #[test]
    fn test_document_parse_errors() {
        assert!(matches!(
            EntryDocument::from_json("{not json"),
            Err(DocumentError::Parse(_))
        ));
        assert!(matches!(
            EntryDocument::from_json("[1, 2]"),
            Err(DocumentError::NotAnObject)
        ));
        match EntryDocument::from_json(r#"{"e1": {}, "e2": "oops"}"#) {
            Err(DocumentError::MalformedEntry { entry_id }) => assert_eq!(entry_id, "e2"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_document_pretty_output() {
        let doc = EntryDocument::from_json(r#"{"b":{"x":1},"a":{}}"#).unwrap();
        let out = doc.to_pretty_json().unwrap();

        assert_eq!(out, "{\n  \"b\": {\n    \"x\": 1\n  },\n  \"a\": {}\n}");
        assert_eq!(doc.len(), 2);
    }

    #[test]
    fn test_summary_merge_last_write_wins() {
        let mut target = SummaryMap::new();
        target.insert(
            "e1".into(),
            SummaryRecord {
                category_key: Some("k1".into()),
                product_key: Some("p1".into()),
            },
        );

        let mut later = SummaryMap::new();
        later.insert(
            "e1".into(),
            SummaryRecord {
                category_key: None,
                product_key: Some("p2".into()),
            },
        );
        merge_summary(&mut target, later);

        assert_eq!(target["e1"].category_key, None);
        assert_eq!(target["e1"].key(ReferenceKind::Product), Some("p2"));
        assert_eq!(summary_json(&target), r#"{"e1":{"productKey":"p2"}}"#);
    }

    #[test]
    fn test_bearer_token_redacted() {
        let creds = Credentials {
            category: BearerToken::new("secret-cat"),
            product: BearerToken::new("secret-prod"),
        };
        let printed = format!("{:?}", creds);

        assert!(!printed.contains("secret"));
        assert_eq!(creds.token_for(ReferenceKind::Product).as_str(), "secret-prod");
    }
}
