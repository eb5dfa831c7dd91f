//! Typed endpoint wrappers over the authorized request layer.
//!
//! The backend's field naming is unstable (`id`/`Id`/`_id`, `name`/`Name`,
//! envelope or no envelope), so each entity has one canonical record type and
//! one mapping function here at the API boundary. Nothing above this layer
//! sees a raw `serde_json::Value`.

mod articles;
mod categories;
mod comments;
mod likes;
mod users;

pub use articles::{Article, ArticleDraft, ArticleQuery, FileUpload};
pub use categories::{Category, CategoryDraft};
pub use comments::{Comment, CommentDraft};
pub use likes::LikeState;
pub use users::{ManagedUser, Paginated, UserQuery};

use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Article identifier (opaque — the backend emits both numeric and string ids).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From, Into)]
#[serde(transparent)]
pub struct ArticleId(pub String);

/// Category identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From, Into)]
#[serde(transparent)]
pub struct CategoryId(pub String);

/// Comment identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From, Into)]
#[serde(transparent)]
pub struct CommentId(pub String);

/// User identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From, Into)]
#[serde(transparent)]
pub struct UserId(pub String);

impl From<&str> for ArticleId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<&str> for CategoryId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<&str> for CommentId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ── Defensive JSON probing ─────────────────────────────────────────

/// First present field among `names`.
pub(crate) fn field<'a>(value: &'a Value, names: &[&str]) -> Option<&'a Value> {
    names
        .iter()
        .find_map(|name| value.get(name))
        .filter(|v| !v.is_null())
}

/// First present field among `names`, as an owned string. Numbers are
/// stringified — the backend emits ids both ways.
pub(crate) fn string_field(value: &Value, names: &[&str]) -> Option<String> {
    field(value, names).and_then(scalar_string)
}

/// A scalar as an owned string: strings pass through, numbers stringify.
pub(crate) fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// First present field among `names`, as a u64. Accepts numeric strings.
pub(crate) fn u64_field(value: &Value, names: &[&str]) -> Option<u64> {
    match field(value, names)? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// First present field among `names`, as a bool. Accepts `"true"`/`"false"`.
pub(crate) fn bool_field(value: &Value, names: &[&str]) -> Option<bool> {
    match field(value, names)? {
        Value::Bool(b) => Some(*b),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// Entity id under any of the backend's spellings, with `extra` names
/// (e.g. `articleId`) probed first.
pub(crate) fn id_field(value: &Value, extra: &[&str]) -> Option<String> {
    string_field(value, extra).or_else(|| string_field(value, &["id", "Id", "_id"]))
}

/// Unwrap the response envelope, if any: `data`/`Data`/`result` when present,
/// else the value itself.
pub(crate) fn payload(value: &Value) -> &Value {
    field(value, &["data", "Data", "result"]).unwrap_or(value)
}

/// Locate the item array in a list response: the payload itself, or one of
/// the backend's list wrappers.
pub(crate) fn items(value: &Value) -> Vec<&Value> {
    let payload = payload(value);
    let array = payload
        .as_array()
        .or_else(|| field(payload, &["items", "Items", "data"]).and_then(Value::as_array));
    array.map(|a| a.iter().collect()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn string_field_probes_in_order() {
        let v = json!({"Name": "second", "name": "first"});
        assert_eq!(string_field(&v, &["name", "Name"]), Some("first".into()));
        assert_eq!(string_field(&v, &["title", "Name"]), Some("second".into()));
        assert_eq!(string_field(&v, &["missing"]), None);
    }

    #[test]
    fn string_field_skips_null() {
        let v = json!({"name": null, "Name": "fallback"});
        assert_eq!(string_field(&v, &["name", "Name"]), Some("fallback".into()));
    }

    #[test]
    fn id_field_handles_numeric_and_variant_ids() {
        assert_eq!(id_field(&json!({"id": 42}), &[]), Some("42".into()));
        assert_eq!(id_field(&json!({"Id": "abc"}), &[]), Some("abc".into()));
        assert_eq!(id_field(&json!({"_id": "x1"}), &[]), Some("x1".into()));
        assert_eq!(
            id_field(&json!({"articleId": "a9", "id": "ignored"}), &["articleId"]),
            Some("a9".into())
        );
    }

    #[test]
    fn payload_unwraps_envelope_or_passes_through() {
        let wrapped = json!({"success": true, "data": {"id": 1}});
        assert_eq!(payload(&wrapped), &json!({"id": 1}));
        let bare = json!({"id": 1});
        assert_eq!(payload(&bare), &bare);
    }

    #[test]
    fn items_finds_arrays_in_all_shapes() {
        assert_eq!(items(&json!([1, 2])).len(), 2);
        assert_eq!(items(&json!({"data": [1, 2, 3]})).len(), 3);
        assert_eq!(items(&json!({"data": {"items": [1]}})).len(), 1);
        assert_eq!(items(&json!({"success": true})).len(), 0);
    }

    #[test]
    fn u64_and_bool_accept_string_encodings() {
        assert_eq!(u64_field(&json!({"count": "7"}), &["count"]), Some(7));
        assert_eq!(u64_field(&json!({"count": 7}), &["count"]), Some(7));
        assert_eq!(bool_field(&json!({"liked": "true"}), &["liked"]), Some(true));
        assert_eq!(bool_field(&json!({"liked": false}), &["liked"]), Some(false));
    }
}
