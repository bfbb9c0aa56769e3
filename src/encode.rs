//! Record encoding: the inverse of decoding, driven by named arguments.

use std::borrow::Cow;

use crate::codec::Codec;
use crate::error::{Error, Result};
use crate::primitive::{self, AccountId, Xfl};
use crate::schema::{FieldSchema, FieldType};
use crate::value::{Args, Field, Value};

/// How a field's argument is located.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Lookup {
    /// Top-level fields: only the `field` reference binds an argument.
    Bound,
    /// Array elements: `field`, falling back to `name`.
    Element,
}

impl Codec {
    /// Encode a record from named arguments.
    ///
    /// Each field takes its bytes from, in order of preference: its pattern, zero padding (when
    /// excluded or bound to no argument), or the argument named by its `field` reference.
    pub fn encode_record(&self, schemas: &[FieldSchema], args: &Args) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.write_fields(&mut buf, schemas, args, Lookup::Bound)?;
        Ok(buf)
    }

    /// [`encode_record`][Codec::encode_record] with uppercase hex output.
    pub fn encode_record_hex(&self, schemas: &[FieldSchema], args: &Args) -> Result<String> {
        self.encode_record(schemas, args).map(hex::encode_upper)
    }

    fn write_fields(
        &self,
        buf: &mut Vec<u8>,
        schemas: &[FieldSchema],
        args: &Args,
        lookup: Lookup,
    ) -> Result<()> {
        for schema in schemas {
            if let Some(pattern) = schema.pattern.as_deref() {
                self.write_literal(buf, schema, pattern)?;
                continue;
            }
            let key = match (schema.exclude, lookup) {
                (true, _) => None,
                (false, Lookup::Bound) => schema.field.as_deref(),
                (false, Lookup::Element) => Some(schema.element_key()),
            };
            match key {
                None => write_padding(buf, schema)?,
                Some(key) => {
                    let value = args
                        .get(key)
                        .ok_or_else(|| Error::MissingArgument(key.to_string()))?;
                    self.write_value(buf, schema, value, key)?;
                }
            }
        }
        Ok(())
    }

    fn write_literal(&self, buf: &mut Vec<u8>, schema: &FieldSchema, pattern: &str) -> Result<()> {
        let value = match schema.field_type {
            t if t.is_uint() => pattern.trim().parse::<u64>().map(Value::UInt).map_err(|_| {
                Error::BadSchema(format!(
                    "field `{}`: pattern {:?} is not an integer",
                    schema.name, pattern
                ))
            })?,
            FieldType::Hash256 => Value::Hex(pattern.to_string()),
            FieldType::VarString if schema.binary => Value::Hex(pattern.to_string()),
            _ => Value::Text(pattern.to_string()),
        };
        self.write_value(buf, schema, &value, &schema.name)
    }

    fn write_value(
        &self,
        buf: &mut Vec<u8>,
        schema: &FieldSchema,
        value: &Value,
        arg: &str,
    ) -> Result<()> {
        let order = self.config.byte_order;
        match schema.field_type {
            FieldType::Array => self.write_array(buf, schema, value, arg),
            FieldType::VarString => {
                let text = value
                    .as_str()
                    .ok_or_else(|| Error::type_mismatch(arg, "text", value.kind()))?;
                let bytes = primitive::encode_var_string(text, schema.binary)?;
                if schema.length_prefix {
                    let len = u8::try_from(bytes.len()).map_err(|_| {
                        Error::OutOfRange(format!(
                            "`{}` is {} bytes, a length prefix holds at most 255",
                            arg,
                            bytes.len()
                        ))
                    })?;
                    buf.push(len);
                    buf.extend_from_slice(&bytes);
                    Ok(())
                } else {
                    let window = schema.byte_length.ok_or_else(|| {
                        Error::BadSchema(format!(
                            "field `{}`: VarString without byte_length",
                            schema.name
                        ))
                    })?;
                    primitive::pad_window(&bytes, window, buf)
                }
            }
            FieldType::Hash256 => {
                let text = value
                    .as_str()
                    .ok_or_else(|| Error::type_mismatch(arg, "hex hash", value.kind()))?;
                buf.extend_from_slice(&primitive::encode_hash256(text)?);
                Ok(())
            }
            FieldType::AccountId => {
                let text = value
                    .as_str()
                    .ok_or_else(|| Error::type_mismatch(arg, "account address", value.kind()))?;
                buf.extend_from_slice(AccountId::from_address(text)?.as_bytes());
                Ok(())
            }
            FieldType::Xfl => {
                primitive::encode_xfl(to_xfl(value, arg)?, order, buf);
                Ok(())
            }
            uint => {
                let v = value
                    .as_u64()
                    .ok_or_else(|| Error::type_mismatch(arg, uint.as_str(), value.kind()))?;
                let width = uint.fixed_width().unwrap_or(8);
                primitive::encode_uint(width, v, order, buf)
                    .map_err(|_| Error::type_mismatch(arg, uint.as_str(), v.to_string()))
            }
        }
    }

    fn write_array(
        &self,
        buf: &mut Vec<u8>,
        schema: &FieldSchema,
        value: &Value,
        arg: &str,
    ) -> Result<()> {
        let items: Cow<[Value]> = match value {
            Value::Array(items) => Cow::Borrowed(items),
            Value::Text(text) if schema.delimiter.is_some() => {
                Cow::Owned(split_delimited(schema, text, arg)?)
            }
            other => return Err(Error::type_mismatch(arg, "array", other.kind())),
        };
        match schema.array_count()? {
            None => {
                let count = u8::try_from(items.len()).map_err(|_| {
                    Error::OutOfRange(format!(
                        "`{}` has {} elements, a length prefix holds at most 255",
                        arg,
                        items.len()
                    ))
                })?;
                buf.push(count);
            }
            Some(count) if count != items.len() => {
                return Err(Error::type_mismatch(
                    arg,
                    format!("{} elements", count),
                    format!("{} elements", items.len()),
                ))
            }
            Some(_) => (),
        }
        for item in items.iter() {
            let element_args: Args = match item {
                Value::Record(fields) => fields
                    .iter()
                    .map(|f| (f.name.clone(), f.value.clone()))
                    .collect(),
                bare if schema.array.len() == 1 => {
                    let mut args = Args::new();
                    args.insert(schema.array[0].element_key().to_string(), bare.clone());
                    args
                }
                other => return Err(Error::type_mismatch(arg, "record", other.kind())),
            };
            self.write_fields(buf, &schema.array, &element_args, Lookup::Element)?;
        }
        Ok(())
    }
}

/// Zero-fill a field's static width. Length-prefixed fields get an empty prefix.
fn write_padding(buf: &mut Vec<u8>, schema: &FieldSchema) -> Result<()> {
    match schema.width() {
        Some(width) => {
            buf.resize(buf.len() + width, 0);
            Ok(())
        }
        None if schema.length_prefix => {
            buf.push(0);
            Ok(())
        }
        None => Err(Error::BadSchema(format!(
            "field `{}` has no static width to pad",
            schema.name
        ))),
    }
}

fn to_xfl(value: &Value, arg: &str) -> Result<Xfl> {
    match value {
        Value::Float(v) => Xfl::from_f64(*v),
        Value::UInt(v) => Xfl::from_parts(false, *v, 0),
        Value::Text(text) => text.parse::<Xfl>().map_err(|e| match e {
            Error::MalformedInput(_) => Error::type_mismatch(arg, "decimal number", text.as_str()),
            e => e,
        }),
        other => Err(Error::type_mismatch(arg, "number", other.kind())),
    }
}

/// Split a delimited text argument into array elements, one piece per element field.
fn split_delimited(schema: &FieldSchema, text: &str, arg: &str) -> Result<Vec<Value>> {
    let delimiter = schema.delimiter.as_deref().unwrap_or_default();
    let pieces: Vec<&str> = if text.is_empty() {
        Vec::new()
    } else {
        text.split(delimiter).collect()
    };
    let per_item = schema.array.len();
    if per_item == 0 || pieces.len() % per_item != 0 {
        return Err(Error::type_mismatch(
            arg,
            format!("a multiple of {} {:?}-separated parts", per_item, delimiter),
            format!("{} parts", pieces.len()),
        ));
    }
    pieces
        .chunks(per_item)
        .map(|chunk| -> Result<Value> {
            let mut fields = chunk
                .iter()
                .zip(schema.array.iter())
                .map(|(piece, element)| -> Result<Field> {
                    let value = if element.field_type.is_uint() {
                        piece.trim().parse::<u64>().map(Value::UInt).map_err(|_| {
                            Error::type_mismatch(arg, element.field_type.as_str(), *piece)
                        })?
                    } else {
                        Value::Text(piece.to_string())
                    };
                    Ok(Field {
                        name: element.element_key().to_string(),
                        value,
                    })
                })
                .collect::<Result<Vec<Field>>>()?;
            Ok(if per_item == 1 {
                fields.remove(0).value
            } else {
                Value::Record(fields)
            })
        })
        .collect()
}

/// Confirm an argument has a shape the given type can encode.
pub(crate) fn check_argument(name: &str, field_type: FieldType, value: &Value) -> Result<()> {
    let ok = match field_type {
        FieldType::UInt8 => value.as_u64().map_or(false, |v| v <= u8::MAX as u64),
        FieldType::UInt16 => value.as_u64().map_or(false, |v| v <= u16::MAX as u64),
        FieldType::UInt32 => value.as_u64().map_or(false, |v| v <= u32::MAX as u64),
        FieldType::UInt64 => value.is_uint(),
        FieldType::Xfl => {
            to_xfl(value, name)?;
            true
        }
        FieldType::AccountId => match value.as_str() {
            Some(text) => {
                AccountId::from_address(text)?;
                true
            }
            None => false,
        },
        FieldType::Hash256 => match value.as_str() {
            Some(text) => primitive::encode_hash256(text).is_ok(),
            None => false,
        },
        FieldType::VarString => value.as_str().is_some(),
        FieldType::Array => value.is_array() || value.is_text(),
    };
    if ok {
        Ok(())
    } else {
        Err(Error::type_mismatch(name, field_type.as_str(), value.to_string()))
    }
}
