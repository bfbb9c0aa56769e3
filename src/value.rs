use std::collections::BTreeMap;
use std::fmt;

use serde::ser::SerializeSeq;
use serde::{Deserialize, Serialize};

use crate::primitive::{AccountId, Xfl};

/// Named arguments handed to the encoder.
pub type Args = BTreeMap<String, Value>;

/// A decoded field value, or an argument to encode.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// Any of the UInt types.
    UInt(u64),
    /// An XFL, converted to the nearest binary float.
    Float(f64),
    /// Text, including rendered account addresses.
    Text(String),
    /// Uppercase hex of a hash or binary window.
    Hex(String),
    /// Repetitions of an Array field.
    Array(Vec<Value>),
    /// One repetition of a multi-field Array element.
    Record(Vec<Field>),
}

impl Value {
    pub fn is_uint(&self) -> bool {
        matches!(self, Value::UInt(_))
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Value::Float(_))
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Value::Text(_))
    }

    pub fn is_hex(&self) -> bool {
        matches!(self, Value::Hex(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    pub fn is_record(&self) -> bool {
        matches!(self, Value::Record(_))
    }

    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Value::UInt(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::Float(v) => Some(v),
            Value::UInt(v) => Some(v as f64),
            _ => None,
        }
    }

    /// Borrow the string of a Text or Hex value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(v) | Value::Hex(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&[Field]> {
        match self {
            Value::Record(v) => Some(v),
            _ => None,
        }
    }

    /// Look up a field of a Record by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.as_record().and_then(|fields| find(fields, name))
    }

    /// Short description of the variant, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::UInt(_) => "integer",
            Value::Float(_) => "number",
            Value::Text(_) => "text",
            Value::Hex(_) => "hex",
            Value::Array(_) => "array",
            Value::Record(_) => "record",
        }
    }

    /// Flatten every leaf value into one string, separated by `delimiter`.
    ///
    /// ```
    /// # use hookstate_codec::Value;
    /// let version = Value::Array(vec![Value::UInt(0), Value::UInt(8), Value::UInt(3)]);
    /// assert_eq!(version.join("."), "0.8.3");
    /// ```
    pub fn join(&self, delimiter: &str) -> String {
        let mut leaves = Vec::new();
        self.collect_leaves(&mut leaves);
        leaves.join(delimiter)
    }

    fn collect_leaves(&self, leaves: &mut Vec<String>) {
        match self {
            Value::Array(items) => items.iter().for_each(|v| v.collect_leaves(leaves)),
            Value::Record(fields) => fields.iter().for_each(|f| f.value.collect_leaves(leaves)),
            leaf => leaves.push(leaf.to_string()),
        }
    }
}

/// Find a field by name in a decoded field list.
pub fn find<'a>(fields: &'a [Field], name: &str) -> Option<&'a Value> {
    fields.iter().find(|f| f.name == name).map(|f| &f.value)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::UInt(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Text(v) | Value::Hex(v) => f.write_str(v),
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Value::Record(fields) => {
                f.write_str("{")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", field.name, field.value)?;
                }
                f.write_str("}")
            }
        }
    }
}

macro_rules! impl_value_from {
    ($t: ty, $p: ident) => {
        impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::$p(v)
            }
        }
    };
}

macro_rules! impl_value_from_integer {
    ($t: ty) => {
        impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::UInt(u64::from(v))
            }
        }
    };
}

impl_value_from!(u64, UInt);
impl_value_from!(f64, Float);
impl_value_from!(String, Text);
impl_value_from!(Vec<Value>, Array);
impl_value_from!(Vec<Field>, Record);
impl_value_from_integer!(u8);
impl_value_from_integer!(u16);
impl_value_from_integer!(u32);

impl<'a> From<&'a str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<AccountId> for Value {
    fn from(v: AccountId) -> Self {
        Value::Text(v.to_address())
    }
}

impl From<Xfl> for Value {
    fn from(v: Xfl) -> Self {
        Value::Float(v.to_f64())
    }
}

/// Arrays serialize as one flat list: the fields of record elements are spliced in, in order,
/// so `{major, minor, patch}` repetitions come out as `[{name, value}, ...]`.
impl serde::Serialize for Value {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::UInt(v) => serializer.serialize_u64(*v),
            Value::Float(v) => serializer.serialize_f64(*v),
            Value::Text(v) | Value::Hex(v) => serializer.serialize_str(v),
            Value::Array(items) => {
                let len = items
                    .iter()
                    .map(|item| item.as_record().map_or(1, |fields| fields.len()))
                    .sum();
                let mut seq = serializer.serialize_seq(Some(len))?;
                for item in items {
                    match item {
                        Value::Record(fields) => {
                            for field in fields {
                                seq.serialize_element(field)?;
                            }
                        }
                        other => seq.serialize_element(other)?,
                    }
                }
                seq.end()
            }
            Value::Record(v) => v.serialize(serializer),
        }
    }
}

/// Reads argument values. Strings become Text, objects become Records in document order.
impl<'de> serde::Deserialize<'de> for Value {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::*;

        struct ValueVisitor;
        impl<'de> Visitor<'de> for ValueVisitor {
            type Value = Value;

            fn expecting(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
                fmt.write_str("a number, string, array, or object")
            }

            fn visit_u64<E: Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(Value::UInt(v))
            }

            fn visit_i64<E: Error>(self, v: i64) -> Result<Self::Value, E> {
                Ok(u64::try_from(v)
                    .map(Value::UInt)
                    .unwrap_or(Value::Float(v as f64)))
            }

            fn visit_f64<E: Error>(self, v: f64) -> Result<Self::Value, E> {
                Ok(Value::Float(v))
            }

            fn visit_str<E: Error>(self, v: &str) -> Result<Self::Value, E> {
                Ok(Value::Text(v.to_string()))
            }

            fn visit_string<E: Error>(self, v: String) -> Result<Self::Value, E> {
                Ok(Value::Text(v))
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut items = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some(item) = access.next_element()? {
                    items.push(item);
                }
                Ok(Value::Array(items))
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut fields = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((name, value)) = access.next_entry::<String, Value>()? {
                    fields.push(Field { name, value });
                }
                Ok(Value::Record(fields))
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}

/// One decoded field: the schema's name and its value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub value: Value,
}

impl Field {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Result of matching a key/data pair against a list of field groups.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NamedRecord {
    /// Name of the field group that matched.
    pub name: String,
    pub key: Vec<Field>,
    pub data: Vec<Field>,
}

/// Result of matching an invoke blob against its value groups.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BlobRecord {
    pub name: String,
    pub values: Vec<Field>,
}
