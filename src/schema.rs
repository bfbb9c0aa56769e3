//! Field schemas: the declarative description of one binary field.
//!
//! A record's layout is an ordered list of [`FieldSchema`]s. Schemas are usually loaded from
//! JSON definitions, but can also be assembled with the builder methods:
//!
//! ```
//! # use hookstate_codec::{FieldSchema, FieldType};
//! let key = vec![
//!     FieldSchema::new(FieldType::VarString, "padding").byte_length(30).exclude(true),
//!     FieldSchema::new(FieldType::VarString, "kind").byte_length(2).pattern("MC"),
//! ];
//! for schema in &key {
//!     schema.check().unwrap();
//! }
//! assert_eq!(hookstate_codec::schema::total_width(&key), Some(32));
//! ```

use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};

use crate::config::ByteOrder;
use crate::error::{Error, Result};
use crate::primitive::{self, AccountId, Xfl, HASH256_BYTES};

#[inline]
fn is_false(v: &bool) -> bool {
    !v
}

/// The closed set of field types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FieldType {
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Hash256,
    #[serde(rename = "AccountID")]
    AccountId,
    #[serde(rename = "XFL")]
    Xfl,
    VarString,
    Array,
}

impl FieldType {
    /// Intrinsic width in bytes, for the types that have one.
    pub fn fixed_width(self) -> Option<usize> {
        match self {
            FieldType::UInt8 => Some(1),
            FieldType::UInt16 => Some(2),
            FieldType::UInt32 => Some(4),
            FieldType::UInt64 => Some(8),
            FieldType::Hash256 => Some(HASH256_BYTES),
            FieldType::AccountId => Some(AccountId::BYTES),
            FieldType::Xfl => Some(Xfl::BYTES),
            FieldType::VarString | FieldType::Array => None,
        }
    }

    pub fn is_uint(self) -> bool {
        matches!(
            self,
            FieldType::UInt8 | FieldType::UInt16 | FieldType::UInt32 | FieldType::UInt64
        )
    }

    /// Name as written in definitions.
    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::UInt8 => "UInt8",
            FieldType::UInt16 => "UInt16",
            FieldType::UInt32 => "UInt32",
            FieldType::UInt64 => "UInt64",
            FieldType::Hash256 => "Hash256",
            FieldType::AccountId => "AccountID",
            FieldType::Xfl => "XFL",
            FieldType::VarString => "VarString",
            FieldType::Array => "Array",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Description of one field in a binary record.
///
/// - `byte_length`: width of a VarString window, or total width of an Array. Fixed-width types
///   may repeat their natural width here but nothing else.
/// - `pattern`: literal the decoded value must equal. When encoding, the literal is written
///   instead of any argument.
/// - `exclude`: consume the bytes but leave the field out of decoded output. Encoding writes
///   zeros unless a pattern is set.
/// - `binary`: a VarString window holds raw bytes, rendered as uppercase hex.
/// - `array`: element schemas of an Array, decoded in order for each repetition.
/// - `array_length`: repetition count of an Array without `byte_length`.
/// - `delimiter`: join string for rendering an Array as one text value, and for splitting a
///   text argument back into elements.
/// - `length_prefix`: a one-byte count precedes the field. For VarString it counts bytes, for
///   Array it counts repetitions.
/// - `field`: name of the operation argument (or return value) this field is bound to.
///
/// Deserializing always runs [`check`][FieldSchema::check], so a loaded schema is well formed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawFieldSchema", into = "RawFieldSchema")]
pub struct FieldSchema {
    pub field_type: FieldType,
    pub name: String,
    pub byte_length: Option<usize>,
    pub pattern: Option<String>,
    pub exclude: bool,
    pub binary: bool,
    pub array: Vec<FieldSchema>,
    pub array_length: Option<usize>,
    pub delimiter: Option<String>,
    pub length_prefix: bool,
    pub field: Option<String>,
}

impl FieldSchema {
    /// Start a schema with nothing but a type and a name.
    pub fn new(field_type: FieldType, name: impl Into<String>) -> Self {
        Self {
            field_type,
            name: name.into(),
            byte_length: None,
            pattern: None,
            exclude: false,
            binary: false,
            array: Vec::new(),
            array_length: None,
            delimiter: None,
            length_prefix: false,
            field: None,
        }
    }

    /// Set the window width (VarString) or total width (Array).
    pub fn byte_length(mut self, byte_length: usize) -> Self {
        self.byte_length = Some(byte_length);
        self
    }

    /// Set the literal this field must hold.
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    /// Set whether the field is left out of decoded output.
    pub fn exclude(mut self, exclude: bool) -> Self {
        self.exclude = exclude;
        self
    }

    /// Set whether a VarString holds raw bytes.
    pub fn binary(mut self, binary: bool) -> Self {
        self.binary = binary;
        self
    }

    /// Append an element schema to an Array.
    pub fn element(mut self, element: FieldSchema) -> Self {
        self.array.push(element);
        self
    }

    /// Set the repetition count of an Array.
    pub fn array_length(mut self, array_length: usize) -> Self {
        self.array_length = Some(array_length);
        self
    }

    /// Set the join string of an Array.
    pub fn delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = Some(delimiter.into());
        self
    }

    /// Set whether a one-byte count precedes the field.
    pub fn length_prefix(mut self, length_prefix: bool) -> Self {
        self.length_prefix = length_prefix;
        self
    }

    /// Bind the field to a named argument.
    pub fn field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Key used to look up this field's value among array element arguments.
    pub(crate) fn element_key(&self) -> &str {
        self.field.as_deref().unwrap_or(&self.name)
    }

    /// Static width in bytes, or `None` when it depends on the data (length prefixes).
    pub fn width(&self) -> Option<usize> {
        if self.length_prefix {
            return None;
        }
        match self.field_type {
            FieldType::VarString => self.byte_length,
            FieldType::Array => match self.byte_length {
                Some(len) => Some(len),
                None => {
                    let count = self.array_length?;
                    total_width(&self.array)?.checked_mul(count)
                }
            },
            fixed => fixed.fixed_width(),
        }
    }

    /// Number of repetitions of an Array. `None` means the count is read from a length prefix.
    pub(crate) fn array_count(&self) -> Result<Option<usize>> {
        if self.length_prefix {
            return Ok(None);
        }
        if let Some(len) = self.byte_length {
            let width = total_width(&self.array)
                .filter(|w| *w > 0)
                .ok_or_else(|| self.bad("byte_length needs fixed-width, non-empty elements"))?;
            return Ok(Some(len / width));
        }
        self.array_length
            .map(Some)
            .ok_or_else(|| self.bad("array needs byte_length, array_length, or length_prefix"))
    }

    fn bad(&self, msg: &str) -> Error {
        Error::BadSchema(format!("field `{}`: {}", self.name, msg))
    }

    /// Verify the schema is internally consistent, including nested element schemas and
    /// pattern literals.
    pub fn check(&self) -> Result<()> {
        if self.field_type != FieldType::Array && !self.array.is_empty() {
            return Err(self.bad("only Array fields may have element schemas"));
        }
        if self.binary && self.field_type != FieldType::VarString {
            return Err(self.bad("only VarString fields may be binary"));
        }
        match self.field_type {
            FieldType::Array => {
                if self.array.is_empty() {
                    return Err(self.bad("Array field has no element schemas"));
                }
                if self.pattern.is_some() {
                    return Err(self.bad("Array fields cannot carry a pattern"));
                }
                for element in self.array.iter() {
                    element.check()?;
                }
                if total_width(&self.array) == Some(0) {
                    return Err(self.bad("array elements must consume at least one byte"));
                }
                if let (false, Some(len)) = (self.length_prefix, self.byte_length) {
                    let width = total_width(&self.array)
                        .filter(|w| *w > 0)
                        .ok_or_else(|| self.bad("byte_length needs fixed-width elements"))?;
                    if len % width != 0 {
                        return Err(self.bad(&format!(
                            "byte_length {} is not a multiple of the element width {}",
                            len, width
                        )));
                    }
                }
                self.array_count()?;
            }
            FieldType::VarString => {
                if self.byte_length.is_none() && !self.length_prefix {
                    return Err(self.bad("VarString needs byte_length or length_prefix"));
                }
            }
            fixed => {
                if self.length_prefix {
                    return Err(self.bad("fixed-width fields cannot have a length prefix"));
                }
                match (self.byte_length, fixed.fixed_width()) {
                    (Some(len), Some(width)) if len != width => {
                        return Err(self.bad(&format!(
                            "{} is {} bytes, not {}",
                            fixed, width, len
                        )))
                    }
                    _ => (),
                }
            }
        }
        if let Some(pattern) = self.pattern.as_deref() {
            self.check_pattern(pattern)?;
        }
        Ok(())
    }

    fn check_pattern(&self, pattern: &str) -> Result<()> {
        let reason = match self.field_type {
            FieldType::Array => None,
            FieldType::Hash256 => primitive::encode_hash256(pattern).err(),
            FieldType::AccountId => AccountId::from_address(pattern).err(),
            FieldType::Xfl => pattern.parse::<Xfl>().err(),
            FieldType::VarString => match primitive::encode_var_string(pattern, self.binary) {
                Ok(bytes) => match self.byte_length {
                    Some(len) if !self.length_prefix && bytes.len() > len => Some(
                        Error::OutOfRange(format!("{} bytes exceed the window", bytes.len())),
                    ),
                    _ if self.length_prefix && bytes.len() > u8::MAX as usize => Some(
                        Error::OutOfRange(format!("{} bytes exceed the prefix", bytes.len())),
                    ),
                    _ => None,
                },
                Err(e) => Some(e),
            },
            uint => {
                let mut scratch = Vec::new();
                match pattern.trim().parse::<u64>() {
                    Ok(v) => primitive::encode_uint(
                        uint.fixed_width().unwrap_or(8),
                        v,
                        ByteOrder::Little,
                        &mut scratch,
                    )
                    .err(),
                    Err(e) => Some(Error::MalformedInput(e.to_string())),
                }
            }
        };
        match reason {
            None => Ok(()),
            Some(e) => Err(self.bad(&format!(
                "pattern {:?} is not a valid {}: {}",
                pattern, self.field_type, e
            ))),
        }
    }
}

/// Sum of the static widths of a schema list, or `None` if any member is variable.
pub fn total_width(schemas: &[FieldSchema]) -> Option<usize> {
    schemas
        .iter()
        .try_fold(0usize, |acc, s| acc.checked_add(s.width()?))
}

/// Serde mirror of [`FieldSchema`], in the key names used by definition files.
#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFieldSchema {
    #[serde(rename = "type")]
    field_type: FieldType,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    byte_length: Option<usize>,
    #[serde(
        default,
        deserialize_with = "deserialize_pattern",
        skip_serializing_if = "Option::is_none"
    )]
    pattern: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    exclude: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    binary: bool,
    #[serde(
        default,
        alias = "array_element_schemas",
        skip_serializing_if = "Vec::is_empty"
    )]
    array: Vec<FieldSchema>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    array_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    delimiter: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    length_prefix: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    field: Option<String>,
}

impl TryFrom<RawFieldSchema> for FieldSchema {
    type Error = Error;

    fn try_from(raw: RawFieldSchema) -> Result<Self> {
        let schema = FieldSchema {
            field_type: raw.field_type,
            name: raw.name,
            byte_length: raw.byte_length,
            pattern: raw.pattern,
            exclude: raw.exclude,
            binary: raw.binary,
            array: raw.array,
            array_length: raw.array_length,
            delimiter: raw.delimiter,
            length_prefix: raw.length_prefix,
            field: raw.field,
        };
        schema.check()?;
        Ok(schema)
    }
}

impl From<FieldSchema> for RawFieldSchema {
    fn from(schema: FieldSchema) -> Self {
        RawFieldSchema {
            field_type: schema.field_type,
            name: schema.name,
            byte_length: schema.byte_length,
            pattern: schema.pattern,
            exclude: schema.exclude,
            binary: schema.binary,
            array: schema.array,
            array_length: schema.array_length,
            delimiter: schema.delimiter,
            length_prefix: schema.length_prefix,
            field: schema.field,
        }
    }
}

/// Patterns are written as strings, bare numbers, or null (no pattern).
fn deserialize_pattern<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error> {
    struct PatternVisitor;

    impl<'de> Visitor<'de> for PatternVisitor {
        type Value = Option<String>;

        fn expecting(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
            write!(fmt, "a string, number, or null pattern")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_string<E: de::Error>(self, v: String) -> std::result::Result<Self::Value, E> {
            Ok(Some(v))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_unit<E: de::Error>(self) -> std::result::Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_none<E: de::Error>(self) -> std::result::Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D: Deserializer<'de>>(
            self,
            deserializer: D,
        ) -> std::result::Result<Self::Value, D::Error> {
            deserializer.deserialize_any(PatternVisitor)
        }
    }

    deserializer.deserialize_any(PatternVisitor)
}
