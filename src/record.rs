use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::ops::Index;

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// A record addressed by field name, the input and output of the key table layer.
///
/// Fields are kept in name order, so encoding the same record always gives the same bytes. A
/// record never stores a null: setting a field to [`Field::Null`] removes it. Lists drop their
/// null items, an empty list counts as null, and a one-item list is stored as that item, so a
/// record always looks the same as its decoded copy.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, Field>", into = "BTreeMap<String, Field>")]
pub struct Record {
    fields: BTreeMap<String, Field>,
}

/// One field of a [`Record`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Field {
    /// An absent value. Never written to the stream.
    Null,
    /// A leaf value. Must not be a `Value::Container`; use `Field::Record` for nesting.
    Value(Value),
    /// A nested record, encoded as a container chunk.
    Record(Record),
    /// Several values under one name, written as repeated sibling chunks.
    List(Vec<Field>),
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a field, returning whatever was there before. Inserting a null removes the field.
    pub fn insert<K: Into<String>, F: Into<Field>>(&mut self, name: K, field: F) -> Option<Field> {
        let name = name.into();
        match field.into().normalize() {
            Field::Null => self.fields.remove(&name),
            field => self.fields.insert(name, field),
        }
    }

    /// Builder-style insert.
    pub fn with<K: Into<String>, F: Into<Field>>(mut self, name: K, field: F) -> Self {
        self.insert(name, field);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Field> {
        self.fields.remove(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Add a decoded value under `name`. A second value under the same name turns the field into
    /// a list, and later ones are appended to it.
    pub(crate) fn accumulate(&mut self, name: String, field: Field) {
        match self.fields.entry(name) {
            Entry::Vacant(e) => {
                e.insert(field);
            }
            Entry::Occupied(mut e) => match e.get_mut() {
                Field::List(items) => items.push(field),
                existing => {
                    let first = std::mem::replace(existing, Field::Null);
                    *existing = Field::List(vec![first, field]);
                }
            },
        }
    }
}

impl Field {
    /// The form this field takes once stored in a record.
    fn normalize(self) -> Field {
        match self {
            Field::List(items) => {
                let mut items: Vec<Field> = items.into_iter().filter(|f| !f.is_null()).collect();
                match items.len() {
                    0 => Field::Null,
                    1 => items.remove(0),
                    _ => Field::List(items),
                }
            }
            other => other,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Field::Null)
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Field::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Field::Record(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Field]> {
        match self {
            Field::List(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_value()?.as_str()
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_value()?.as_i64()
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.as_value()?.as_f64()
    }
}

impl Index<&str> for Record {
    type Output = Field;

    fn index(&self, name: &str) -> &Field {
        static NULL: Field = Field::Null;
        self.fields.get(name).unwrap_or(&NULL)
    }
}

impl FromIterator<(String, Field)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Field)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (name, field) in iter {
            record.insert(name, field);
        }
        record
    }
}

impl From<BTreeMap<String, Field>> for Record {
    fn from(fields: BTreeMap<String, Field>) -> Self {
        fields.into_iter().collect()
    }
}

impl From<Record> for BTreeMap<String, Field> {
    fn from(record: Record) -> Self {
        record.fields
    }
}

impl From<Record> for Field {
    fn from(v: Record) -> Self {
        Field::Record(v)
    }
}

impl From<Value> for Field {
    fn from(v: Value) -> Self {
        Field::Value(v)
    }
}

macro_rules! impl_from_leaf {
    ($t: ty) => {
        impl From<$t> for Field {
            fn from(v: $t) -> Self {
                Field::Value(Value::from(v))
            }
        }
    };
}

impl_from_leaf!(i8);
impl_from_leaf!(i16);
impl_from_leaf!(i32);
impl_from_leaf!(i64);
impl_from_leaf!(u8);
impl_from_leaf!(u16);
impl_from_leaf!(u32);
impl_from_leaf!(f32);
impl_from_leaf!(f64);
impl_from_leaf!(&str);
impl_from_leaf!(String);
impl_from_leaf!(&[u8]);
impl_from_leaf!(Vec<u8>);
impl_from_leaf!(Vec<i64>);
impl_from_leaf!(Vec<f64>);

impl<T: Into<Field>> From<Option<T>> for Field {
    fn from(v: Option<T>) -> Self {
        v.map_or(Field::Null, Into::into)
    }
}

impl From<Vec<Record>> for Field {
    fn from(v: Vec<Record>) -> Self {
        Field::List(v.into_iter().map(Field::Record).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulate() {
        let mut rec = Record::new();
        rec.accumulate("a".into(), Field::from(1i64));
        assert_eq!(rec["a"], Field::from(1i64));
        rec.accumulate("a".into(), Field::from(2i64));
        rec.accumulate("a".into(), Field::from(3i64));
        assert_eq!(
            rec["a"],
            Field::List(vec![Field::from(1i64), Field::from(2i64), Field::from(3i64)])
        );
        assert!(rec["missing"].is_null());
    }

    #[test]
    fn builder() {
        let rec = Record::new()
            .with("name", "gdscc")
            .with("elevation", -12i64)
            .with("note", Option::<&str>::None)
            .with("site", Record::new().with("x", 1.5f64));
        assert_eq!(rec.len(), 3);
        assert!(rec.get("note").is_none());
        assert_eq!(rec["name"].as_str(), Some("gdscc"));
        assert_eq!(rec["elevation"].as_i64(), Some(-12));
        assert!(rec["note"].is_null());
        assert_eq!(
            rec["site"].as_record().map(|r| r["x"].as_f64()),
            Some(Some(1.5))
        );
    }

    #[test]
    fn nulls_are_absent() {
        let mut rec = Record::new().with("a", 1i64).with("b", Field::Null);
        assert_eq!(rec, Record::new().with("a", 1i64));
        assert_eq!(rec.insert("a", Field::Null), Some(Field::from(1i64)));
        assert!(rec.is_empty());
        assert_eq!(rec, Record::new());

        let rec: Record = vec![("x".to_string(), Field::Null), ("y".to_string(), Field::from(2i64))]
            .into_iter()
            .collect();
        assert_eq!(rec.len(), 1);
    }

    #[test]
    fn lists_normalize() {
        let rec = Record::new()
            .with("empty", Field::List(vec![]))
            .with("nulls", Field::List(vec![Field::Null, Field::Null]))
            .with("one", Field::List(vec![Field::Null, Field::from("only")]))
            .with(
                "two",
                Field::List(vec![Field::from(1i64), Field::Null, Field::from(2i64)]),
            );
        assert_eq!(rec.len(), 2);
        assert_eq!(rec["one"], Field::from("only"));
        assert_eq!(
            rec["two"],
            Field::List(vec![Field::from(1i64), Field::from(2i64)])
        );
    }

    #[test]
    fn json_bridge() {
        let rec = Record::new()
            .with("site", Record::new().with("name", "gdscc"))
            .with("raw", vec![1u8, 2])
            .with("readings", vec![100i64, 250]);
        let json = serde_json::to_string(&rec).unwrap();
        assert!(json.contains(r#""site":{"Record":{"name":{"Value":{"Str":"gdscc"}}}}"#));
        let back: Record = serde_json::from_str(&json).unwrap();
        assert_eq!(back, rec);

        let json = r#"{"gone":"Null","kept":{"Value":{"Int":3}}}"#;
        let with_null: Record = serde_json::from_str(json).unwrap();
        assert_eq!(with_null, Record::new().with("kept", 3i64));
    }
}
