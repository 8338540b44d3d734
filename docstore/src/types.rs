use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Reserved field name addressing the store-assigned document identifier.
pub const DOCUMENT_ID: &str = "__name__";

/// Field-level merge applied by `update_where`. Ordered so update masks are deterministic.
pub type Patch = BTreeMap<String, FieldValue>;

#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Integer(i64),
    String(String),
    Timestamp(DateTime<Utc>),
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            FieldValue::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    // Values of different kinds are unordered.
    fn compare(&self, other: &FieldValue) -> Option<Ordering> {
        match (self, other) {
            (FieldValue::Bool(a), FieldValue::Bool(b)) => Some(a.cmp(b)),
            (FieldValue::Integer(a), FieldValue::Integer(b)) => Some(a.cmp(b)),
            (FieldValue::String(a), FieldValue::String(b)) => Some(a.cmp(b)),
            (FieldValue::Timestamp(a), FieldValue::Timestamp(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::String(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::Timestamp(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Comparison {
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
}

impl Comparison {
    /// Evaluates `stored <op> expected`. A null stored value never satisfies `NotEqual`.
    pub fn matches(&self, stored: &FieldValue, expected: &FieldValue) -> bool {
        match self {
            Comparison::Equal => stored == expected,
            Comparison::NotEqual => *stored != FieldValue::Null && stored != expected,
            Comparison::LessThan => stored.compare(expected) == Some(Ordering::Less),
            Comparison::LessThanOrEqual => matches!(
                stored.compare(expected),
                Some(Ordering::Less | Ordering::Equal)
            ),
            Comparison::GreaterThan => stored.compare(expected) == Some(Ordering::Greater),
            Comparison::GreaterThanOrEqual => matches!(
                stored.compare(expected),
                Some(Ordering::Greater | Ordering::Equal)
            ),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Filter {
    pub field: String,
    pub comparison: Comparison,
    pub value: FieldValue,
}

impl Filter {
    pub fn new<F, V>(field: F, comparison: Comparison, value: V) -> Self
    where
        F: Into<String>,
        V: Into<FieldValue>,
    {
        Filter {
            field: field.into(),
            comparison,
            value: value.into(),
        }
    }

    pub fn eq<F, V>(field: F, value: V) -> Self
    where
        F: Into<String>,
        V: Into<FieldValue>,
    {
        Filter::new(field, Comparison::Equal, value)
    }

    pub fn document_id<I: Into<String>>(id: I) -> Self {
        Filter::eq(DOCUMENT_ID, id.into())
    }

    pub fn is_document_id(&self) -> bool {
        self.field == DOCUMENT_ID
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: BTreeMap<String, FieldValue>,
}

impl Document {
    pub fn new<I: Into<String>>(id: I) -> Self {
        Document {
            id: id.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with<F, V>(mut self, field: F, value: V) -> Self
    where
        F: Into<String>,
        V: Into<FieldValue>,
    {
        self.fields.insert(field.into(), value.into());
        self
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(FieldValue::as_str)
    }

    pub fn get_bool(&self, field: &str) -> Option<bool> {
        self.get(field).and_then(FieldValue::as_bool)
    }
}
