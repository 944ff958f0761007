//! Firestore documents and typed values as they appear in REST responses and
//! in document-change trigger payloads.
//!
//! Every field value is a single-key object naming its type, for example
//! `{"stringValue": "Central Park"}` or `{"integerValue": "42"}`. Integers are
//! carried as decimal strings; non-finite doubles as `"NaN"`, `"Infinity"`, or
//! `"-Infinity"`.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

/// A typed Firestore field value.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Value {
    NullValue,
    BooleanValue(bool),
    IntegerValue(String),
    #[serde(deserialize_with = "double")]
    DoubleValue(f64),
    TimestampValue(DateTime<Utc>),
    StringValue(String),
    BytesValue(String),
    ReferenceValue(String),
    GeoPointValue(LatLng),
    ArrayValue(ArrayValue),
    MapValue(MapValue),
}

/// Reads a `doubleValue`, which is a JSON number or one of the special strings.
fn double<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(f64),
        Text(String),
    }

    match Repr::deserialize(deserializer)? {
        Repr::Number(n) => Ok(n),
        Repr::Text(s) => match s.as_str() {
            "NaN" => Ok(f64::NAN),
            "Infinity" => Ok(f64::INFINITY),
            "-Infinity" => Ok(f64::NEG_INFINITY),
            other => Err(D::Error::custom(format!("invalid doubleValue '{other}'"))),
        },
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LatLng {
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
}

/// `arrayValue`; an empty array is sent as `{}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ArrayValue {
    #[serde(default)]
    pub values: Vec<Value>,
}

/// `mapValue`; an empty map is sent as `{}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MapValue {
    #[serde(default)]
    pub fields: HashMap<String, Value>,
}

/// A stored document.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Full resource name,
    /// `projects/{p}/databases/{d}/documents/{collection}/{id}`.
    pub name: String,
    #[serde(default)]
    pub fields: HashMap<String, Value>,
    #[serde(default)]
    pub create_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub update_time: Option<DateTime<Utc>>,
}

impl Document {
    /// Returns the document id: the last segment of [`Document::name`].
    pub fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or_default()
    }

    /// Returns the collection id: the second-to-last segment of the name.
    pub fn collection(&self) -> Option<&str> {
        self.name.rsplit('/').nth(1)
    }

    /// Returns the named field if it holds a string.
    ///
    /// Fields of any other type read as absent.
    pub fn string_field(&self, field: &str) -> Option<&str> {
        match self.fields.get(field) {
            Some(Value::StringValue(s)) => Some(s),
            _ => None,
        }
    }
}
