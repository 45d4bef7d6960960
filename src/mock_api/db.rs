//! The JSON database behind the mock API.
//!
//! The file is one object whose keys are collection names, each holding an
//! array of records:
//!
//! ```json
//! {
//!     "users": [
//!         { "id": "...", "firstName": "...", "createdAt": "..." }
//!     ]
//! }
//! ```

use crate::mock_api::error::StoreError;
use serde::Serialize;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::Path;

pub type Record = Map<String, Value>;

/// Collection created when the database file does not exist yet.
pub const DEFAULT_COLLECTION: &str = "users";

pub const SORT_PARAM: &str = "_sort";
pub const ORDER_PARAM: &str = "_order";
pub const CREATED_AT: &str = "createdAt";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Database {
    collections: BTreeMap<String, Vec<Record>>,
}

impl Database {
    /// A database holding the given empty collections.
    pub fn with_collections<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            collections: names.into_iter().map(|n| (n.into(), Vec::new())).collect(),
        }
    }

    pub fn from_value(value: Value) -> Result<Self, String> {
        let Value::Object(root) = value else {
            return Err("top level must be an object".to_string());
        };
        let mut collections = BTreeMap::new();
        for (name, items) in root {
            let Value::Array(items) = items else {
                return Err(format!("collection `{name}` must be an array"));
            };
            let records = items
                .into_iter()
                .map(|item| match item {
                    Value::Object(record) => Ok(record),
                    _ => Err(format!("collection `{name}` holds a non-object entry")),
                })
                .collect::<Result<Vec<_>, _>>()?;
            collections.insert(name, records);
        }
        Ok(Self { collections })
    }

    /// Loads the file, or starts with an empty `users` collection if it is missing.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Ok(Self::with_collections([DEFAULT_COLLECTION]));
            }
            Err(e) => {
                return Err(StoreError::Load {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })
            }
        };
        let load_err = |message: String| StoreError::Load {
            path: path.to_path_buf(),
            message,
        };
        let value = serde_json::from_str(&raw).map_err(|e| load_err(e.to_string()))?;
        Self::from_value(value).map_err(load_err)
    }

    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        write_json_pretty(path, &self.collections).map_err(|source| StoreError::Persist {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn collection(&self, name: &str) -> Option<&Vec<Record>> {
        self.collections.get(name)
    }

    pub fn collection_mut(&mut self, name: &str) -> Option<&mut Vec<Record>> {
        self.collections.get_mut(name)
    }

    pub fn collection_names(&self) -> impl Iterator<Item = &str> {
        self.collections.keys().map(String::as_str)
    }
}

/// Serializes with 4-space indentation, creating parent directories. The
/// whole document is rendered before the file is touched.
pub fn write_json_pretty<T: Serialize + ?Sized>(path: &Path, value: &T) -> io::Result<()> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
    value.serialize(&mut ser)?;
    out.push(b'\n');

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, out)
}

/// The record's `id` as text; numeric ids compare by their decimal form.
pub fn record_id(record: &Record) -> Option<String> {
    match record.get("id")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// List ordering: `_sort=<field>` (a leading `-` reverses) and `_order=asc|desc`.
/// `_order` on its own sorts by creation time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortSpec {
    pub field: Option<String>,
    pub descending: bool,
}

impl SortSpec {
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        let order_desc = params
            .get(ORDER_PARAM)
            .map(|o| o.eq_ignore_ascii_case("desc"));
        match params.get(SORT_PARAM).filter(|s| !s.is_empty()) {
            Some(sort) => match sort.strip_prefix('-') {
                Some(field) => Self {
                    field: Some(field.to_string()),
                    descending: true,
                },
                None => Self {
                    field: Some(sort.clone()),
                    descending: order_desc.unwrap_or(false),
                },
            },
            None => match order_desc {
                Some(descending) => Self {
                    field: Some(CREATED_AT.to_string()),
                    descending,
                },
                None => Self::default(),
            },
        }
    }

    pub fn apply(&self, records: &mut [Record]) {
        let Some(field) = &self.field else {
            return;
        };
        records.sort_by(|a, b| {
            let ord = compare_values(a.get(field), b.get(field));
            if self.descending {
                ord.reverse()
            } else {
                ord
            }
        });
    }
}

// Missing values sort after present ones, numbers before strings.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Number(_)), Some(_)) => Ordering::Less,
        (Some(_), Some(Value::Number(_))) => Ordering::Greater,
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn records(value: Value) -> Vec<Record> {
        match value {
            Value::Array(items) => items
                .into_iter()
                .filter_map(|v| v.as_object().cloned())
                .collect(),
            _ => panic!("expected array"),
        }
    }

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_order_alone_sorts_by_created_at() {
        let mut rs = records(json!([
            { "id": "a", "createdAt": "2024-01-01T00:00:00.000Z" },
            { "id": "b", "createdAt": "2024-03-01T00:00:00.000Z" },
            { "id": "c", "createdAt": "2024-02-01T00:00:00.000Z" },
        ]));
        SortSpec::from_params(&params(&[("_order", "desc")])).apply(&mut rs);
        let ids: Vec<_> = rs.iter().filter_map(record_id).collect();
        assert_eq!(ids, ["b", "c", "a"]);
    }

    #[test]
    fn test_sort_field_with_minus_prefix() {
        let mut rs = records(json!([
            { "id": 1, "age": 30 },
            { "id": 2, "age": 99 },
            { "id": 3 },
            { "id": 4, "age": 18 },
        ]));
        SortSpec::from_params(&params(&[("_sort", "-age")])).apply(&mut rs);
        let ids: Vec<_> = rs.iter().filter_map(record_id).collect();
        assert_eq!(ids, ["3", "2", "1", "4"]);

        SortSpec::from_params(&params(&[("_sort", "age")])).apply(&mut rs);
        let ids: Vec<_> = rs.iter().filter_map(record_id).collect();
        assert_eq!(ids, ["4", "1", "2", "3"]);
    }

    #[test]
    fn test_missing_file_loads_empty_users() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(db.collection("users"), Some(&Vec::new()));
    }

    #[test]
    fn test_save_uses_four_space_indent_and_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("db.json");
        let db = Database::from_value(json!({ "users": [{ "id": "x", "age": 40 }] })).unwrap();
        db.save(&path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("{\n    \"users\": [\n        {"));
        assert_eq!(Database::load(&path).unwrap(), db);
    }

    #[test]
    fn test_rejects_malformed_documents() {
        assert!(Database::from_value(json!([])).is_err());
        assert!(Database::from_value(json!({ "users": {} })).is_err());
        assert!(Database::from_value(json!({ "users": [1] })).is_err());
    }
}
