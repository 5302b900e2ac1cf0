use anyhow::{Result, anyhow, bail};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sea_query::Value;

/// Insertion-ordered attribute storage for a single model instance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes {
    entries: Vec<(String, Value)>,
}

impl Attributes {
    /// Creates an empty attribute bag.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Returns the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(name, _)| name == key).map(|(_, value)| value)
    }

    /// Stores `value` under `key`, replacing any existing value in place.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        if let Some(entry) = self.entries.iter_mut().find(|(name, _)| *name == key) {
            entry.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    /// Removes and returns the value stored under `key`.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let pos = self.entries.iter().position(|(name, _)| name == key)?;
        Some(self.entries.remove(pos).1)
    }

    /// Whether a value is stored under `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(name, _)| name == key)
    }

    /// Attribute names in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Name/value pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Number of stored attributes.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no attributes are stored.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attributes = Self::new();
        for (key, value) in iter {
            attributes.set(key, value);
        }
        attributes
    }
}

impl IntoIterator for Attributes {
    type IntoIter = std::vec::IntoIter<(String, Value)>;
    type Item = (String, Value);

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// A single named value in a fetched row.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Column name as returned by the database.
    pub name: String,
    /// Column value.
    pub value: Value,
}

/// A row fetched from the database, keyed by actual column names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    /// Fields in column order.
    pub fields: Vec<Field>,
}

impl Row {
    /// Returns the value of the named field.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|field| field.name == name).map(|field| &field.value)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(name, value)| Field {
                    name: name.into(),
                    value: value.into(),
                })
                .collect(),
        }
    }
}

/// Trait for types that can be extracted from attribute values.
///
/// This trait is implemented for the standard Rust types a model attribute
/// usually holds (`i32`, `String`, `DateTime`, etc.).
pub trait FetchValue: Sized {
    /// Convert the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is missing or cannot be converted to the target type.
    fn fetch(value: Option<&Value>, key: &str) -> Result<Self>;
}

/// Read and write access to a model's attributes.
///
/// Implementors decide how names resolve to storage; the provided methods
/// always go through [`HasAttributes::get_attribute`] and
/// [`HasAttributes::set_attribute`].
pub trait HasAttributes {
    /// Read an attribute, applying any accessor registered for `key`.
    fn get_attribute(&self, key: &str) -> Option<Value>;

    /// Write an attribute, applying any mutator registered for `key`.
    fn set_attribute(&mut self, key: &str, value: Value);

    /// Attribute names exposed when the model is serialised.
    fn visible_keys(&self) -> Vec<String>;

    /// Assign several attributes at once.
    fn fill<I, K, V>(&mut self, attributes: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        for (key, value) in attributes {
            self.set_attribute(key.as_ref(), value.into());
        }
    }

    /// Read an attribute as a concrete type.
    ///
    /// # Errors
    ///
    /// Returns an error if the attribute is missing or has an incompatible type.
    fn get<T: FetchValue>(&self, key: &str) -> Result<T> {
        let value = self.get_attribute(key);
        T::fetch(value.as_ref(), key)
    }

    /// Serialise the visible attributes to a JSON object.
    fn to_json(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        for key in self.visible_keys() {
            let value = self.get_attribute(&key).map_or(serde_json::Value::Null, value_to_json);
            map.insert(key, value);
        }
        serde_json::Value::Object(map)
    }
}

/// Convert an attribute value into its JSON representation.
#[must_use]
pub fn value_to_json(value: Value) -> serde_json::Value {
    use serde_json::Value as Json;

    match value {
        Value::Bool(Some(v)) => Json::Bool(v),
        Value::TinyInt(Some(v)) => Json::Number(v.into()),
        Value::SmallInt(Some(v)) => Json::Number(v.into()),
        Value::Int(Some(v)) => Json::Number(v.into()),
        Value::BigInt(Some(v)) => Json::Number(v.into()),
        Value::TinyUnsigned(Some(v)) => Json::Number(v.into()),
        Value::SmallUnsigned(Some(v)) => Json::Number(v.into()),
        Value::Unsigned(Some(v)) => Json::Number(v.into()),
        Value::BigUnsigned(Some(v)) => Json::Number(v.into()),
        Value::Float(Some(v)) => {
            serde_json::Number::from_f64(f64::from(v)).map_or(Json::Null, Json::Number)
        }
        Value::Double(Some(v)) => serde_json::Number::from_f64(v).map_or(Json::Null, Json::Number),
        Value::String(Some(v)) => Json::String(*v),
        Value::Char(Some(v)) => Json::String(v.to_string()),
        Value::ChronoDate(Some(v)) => Json::String(v.to_string()),
        Value::ChronoTime(Some(v)) => Json::String(v.to_string()),
        Value::ChronoDateTime(Some(v)) => Json::String(v.to_string()),
        Value::ChronoDateTimeUtc(Some(v)) => Json::String(v.to_rfc3339()),
        Value::Bytes(Some(v)) => Json::Array(v.iter().map(|b| Json::Number((*b).into())).collect()),
        _ => Json::Null,
    }
}

// Inbound conversion
impl FetchValue for bool {
    fn fetch(value: Option<&Value>, key: &str) -> Result<Self> {
        match present(value, key)? {
            Value::Bool(Some(v)) => Ok(*v),
            _ => bail!("expected boolean value for '{key}'"),
        }
    }
}

impl FetchValue for i32 {
    fn fetch(value: Option<&Value>, key: &str) -> Result<Self> {
        match present(value, key)? {
            Value::TinyInt(Some(v)) => Ok(Self::from(*v)),
            Value::SmallInt(Some(v)) => Ok(Self::from(*v)),
            Value::Int(Some(v)) => Ok(*v),
            _ => bail!("expected int32 value for '{key}'"),
        }
    }
}

impl FetchValue for i64 {
    fn fetch(value: Option<&Value>, key: &str) -> Result<Self> {
        match present(value, key)? {
            Value::TinyInt(Some(v)) => Ok(Self::from(*v)),
            Value::SmallInt(Some(v)) => Ok(Self::from(*v)),
            Value::Int(Some(v)) => Ok(Self::from(*v)),
            Value::BigInt(Some(v)) => Ok(*v),
            _ => bail!("expected int64 value for '{key}'"),
        }
    }
}

impl FetchValue for u32 {
    fn fetch(value: Option<&Value>, key: &str) -> Result<Self> {
        match present(value, key)? {
            Value::TinyUnsigned(Some(v)) => Ok(Self::from(*v)),
            Value::SmallUnsigned(Some(v)) => Ok(Self::from(*v)),
            Value::Unsigned(Some(v)) => Ok(*v),
            _ => bail!("expected uint32 value for '{key}'"),
        }
    }
}

impl FetchValue for u64 {
    fn fetch(value: Option<&Value>, key: &str) -> Result<Self> {
        match present(value, key)? {
            Value::TinyUnsigned(Some(v)) => Ok(Self::from(*v)),
            Value::SmallUnsigned(Some(v)) => Ok(Self::from(*v)),
            Value::Unsigned(Some(v)) => Ok(Self::from(*v)),
            Value::BigUnsigned(Some(v)) => Ok(*v),
            _ => bail!("expected uint64 value for '{key}'"),
        }
    }
}

impl FetchValue for f32 {
    fn fetch(value: Option<&Value>, key: &str) -> Result<Self> {
        match present(value, key)? {
            Value::Float(Some(v)) => Ok(*v),
            _ => bail!("expected float value for '{key}'"),
        }
    }
}

impl FetchValue for f64 {
    fn fetch(value: Option<&Value>, key: &str) -> Result<Self> {
        match present(value, key)? {
            Value::Float(Some(v)) => Ok(Self::from(*v)),
            Value::Double(Some(v)) => Ok(*v),
            _ => bail!("expected double value for '{key}'"),
        }
    }
}

impl FetchValue for String {
    fn fetch(value: Option<&Value>, key: &str) -> Result<Self> {
        match present(value, key)? {
            Value::String(Some(raw)) => Ok(Self::clone(raw)),
            Value::Char(Some(ch)) => Ok(ch.to_string()),
            _ => bail!("expected string value for '{key}'"),
        }
    }
}

impl FetchValue for Vec<u8> {
    fn fetch(value: Option<&Value>, key: &str) -> Result<Self> {
        match present(value, key)? {
            Value::Bytes(Some(bytes)) => Ok(Self::clone(bytes)),
            _ => bail!("expected binary value for '{key}'"),
        }
    }
}

impl FetchValue for DateTime<Utc> {
    fn fetch(value: Option<&Value>, key: &str) -> Result<Self> {
        match present(value, key)? {
            Value::ChronoDateTimeUtc(Some(dt)) => Ok(**dt),
            Value::ChronoDateTime(Some(dt)) => Ok(Self::from_naive_utc_and_offset(**dt, Utc)),
            Value::String(Some(raw)) => parse_timestamp(raw),
            _ => bail!("expected timestamp value for '{key}'"),
        }
    }
}

impl FetchValue for NaiveDate {
    fn fetch(value: Option<&Value>, key: &str) -> Result<Self> {
        match present(value, key)? {
            Value::ChronoDate(Some(date)) => Ok(**date),
            Value::String(Some(raw)) => Self::parse_from_str(raw, "%Y-%m-%d")
                .map_err(|_e| anyhow!("unsupported date: {raw}; expected \"%Y-%m-%d\" format")),
            _ => bail!("expected date value for '{key}'"),
        }
    }
}

impl FetchValue for serde_json::Value {
    fn fetch(value: Option<&Value>, key: &str) -> Result<Self> {
        match present(value, key)? {
            Value::String(Some(raw)) => Ok(serde_json::from_str(raw)?),
            Value::Bytes(Some(bytes)) => Ok(serde_json::from_slice(bytes)?),
            _ => bail!("expected json compatible value for '{key}'"),
        }
    }
}

impl<T: FetchValue> FetchValue for Option<T> {
    fn fetch(value: Option<&Value>, key: &str) -> Result<Self> {
        match value {
            Some(v) if !is_null(v) => Ok(Some(T::fetch(Some(v), key)?)),
            _ => Ok(None),
        }
    }
}

fn present<'a>(value: Option<&'a Value>, key: &str) -> Result<&'a Value> {
    match value {
        Some(v) if !is_null(v) => Ok(v),
        Some(_) => bail!("attribute '{key}' is null"),
        None => bail!("missing attribute '{key}'"),
    }
}

const fn is_null(value: &Value) -> bool {
    matches!(
        value,
        Value::Bool(None)
            | Value::TinyInt(None)
            | Value::SmallInt(None)
            | Value::Int(None)
            | Value::BigInt(None)
            | Value::TinyUnsigned(None)
            | Value::SmallUnsigned(None)
            | Value::Unsigned(None)
            | Value::BigUnsigned(None)
            | Value::Float(None)
            | Value::Double(None)
            | Value::String(None)
            | Value::Char(None)
            | Value::Bytes(None)
            | Value::ChronoDate(None)
            | Value::ChronoTime(None)
            | Value::ChronoDateTime(None)
            | Value::ChronoDateTimeUtc(None)
    )
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }

    if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f") {
        return Ok(DateTime::<Utc>::from_naive_utc_and_offset(parsed, Utc));
    }

    bail!("unsupported timestamp: {raw}; expected RFC3339 or \"%Y-%m-%d %H:%M:%S%.f\" format")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attributes_keep_insertion_order() {
        let mut attributes = Attributes::new();
        attributes.set("b", 1);
        attributes.set("a", 2);
        attributes.set("b", 3);

        assert_eq!(attributes.keys().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(attributes.get("b"), Some(&Value::Int(Some(3))));
        assert_eq!(attributes.len(), 2);

        assert_eq!(attributes.remove("b"), Some(Value::Int(Some(3))));
        assert!(!attributes.contains("b"));
        assert_eq!(attributes.remove("b"), None);
    }

    #[test]
    fn fetch_numeric_widening() {
        let small = Value::SmallInt(Some(7));
        assert_eq!(i32::fetch(Some(&small), "n").unwrap(), 7);
        assert_eq!(i64::fetch(Some(&small), "n").unwrap(), 7);

        let float = Value::Float(Some(1.5));
        assert!((f64::fetch(Some(&float), "f").unwrap() - 1.5).abs() < f64::EPSILON);

        let unsigned = Value::Unsigned(Some(9));
        assert_eq!(u64::fetch(Some(&unsigned), "u").unwrap(), 9);
    }

    #[test]
    fn fetch_strings_and_dates() {
        let name = Value::from("Name");
        assert_eq!(String::fetch(Some(&name), "name").unwrap(), "Name");

        let date = Value::from("2024-01-15");
        let parsed = NaiveDate::fetch(Some(&date), "day").unwrap();
        assert_eq!(parsed, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());

        let ts = Value::from("2024-01-15 10:30:45");
        let parsed = DateTime::<Utc>::fetch(Some(&ts), "at").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2024-01-15T10:30:45+00:00");

        let json = Value::from(r#"{"a":1}"#);
        let parsed = serde_json::Value::fetch(Some(&json), "doc").unwrap();
        assert_eq!(parsed["a"], 1);
    }

    #[test]
    fn fetch_missing_and_null() {
        let err = i32::fetch(None, "id").unwrap_err();
        assert!(err.to_string().contains("missing attribute 'id'"));

        let null = Value::Int(None);
        let err = i32::fetch(Some(&null), "id").unwrap_err();
        assert!(err.to_string().contains("is null"));

        assert_eq!(Option::<i32>::fetch(Some(&null), "id").unwrap(), None);
        assert_eq!(Option::<i32>::fetch(None, "id").unwrap(), None);
        assert_eq!(Option::<i32>::fetch(Some(&Value::Int(Some(4))), "id").unwrap(), Some(4));
    }

    #[test]
    fn fetch_type_mismatch() {
        let err = bool::fetch(Some(&Value::Int(Some(1))), "flag").unwrap_err();
        assert!(err.to_string().contains("expected boolean"));

        let result = DateTime::<Utc>::fetch(Some(&Value::from("invalid date")), "at");
        assert!(result.unwrap_err().to_string().contains("unsupported timestamp"));
    }

    #[test]
    fn json_conversion() {
        assert_eq!(value_to_json(Value::from(5)), serde_json::json!(5));
        assert_eq!(value_to_json(Value::from("x")), serde_json::json!("x"));
        assert_eq!(value_to_json(Value::Bool(Some(true))), serde_json::json!(true));
        assert_eq!(value_to_json(Value::String(None)), serde_json::Value::Null);
    }
}
