//! Record decoding: walk a schema list over a byte string.

use crate::codec::Codec;
use crate::error::{Error, Result};
use crate::primitive::{self, AccountId, Xfl};
use crate::reader::Reader;
use crate::schema::{total_width, FieldSchema, FieldType};
use crate::value::{Field, Value};

/// Field name reported when bytes remain after the last schema.
const END_OF_RECORD: &str = "<end of record>";

impl Codec {
    /// Decode a record, requiring every byte to be consumed.
    ///
    /// Excluded fields are consumed but left out of the result. A pattern that doesn't hold,
    /// or bytes left over at the end, fail with [`Error::SchemaMismatch`]. Running out of bytes
    /// fails with [`Error::TruncatedInput`].
    pub fn decode_record(&self, bytes: &[u8], schemas: &[FieldSchema]) -> Result<Vec<Field>> {
        let mut reader = Reader::new(bytes);
        let fields = self.read_fields(&mut reader, schemas, Some(0))?;
        if !reader.is_empty() {
            return Err(Error::mismatch(
                END_OF_RECORD,
                "no more bytes",
                format!("{} trailing bytes", reader.remaining()),
            ));
        }
        Ok(fields)
    }

    /// [`decode_record`][Codec::decode_record] for hex input.
    pub fn decode_record_hex(&self, hex: &str, schemas: &[FieldSchema]) -> Result<Vec<Field>> {
        let bytes = hex::decode(hex.trim())?;
        self.decode_record(&bytes, schemas)
    }

    /// Decode `schemas` in order. `tail` is the number of bytes known to follow these schemas
    /// in the input, if that is known.
    pub(crate) fn read_fields(
        &self,
        reader: &mut Reader,
        schemas: &[FieldSchema],
        tail: Option<usize>,
    ) -> Result<Vec<Field>> {
        let mut fields = Vec::with_capacity(schemas.len());
        for (i, schema) in schemas.iter().enumerate() {
            // Unpatterned padding is skipped without looking at its contents.
            if schema.exclude && schema.pattern.is_none() {
                if let Some(width) = schema.width() {
                    reader.take(width, &schema.name)?;
                    continue;
                }
            }
            let after = tail.and_then(|t| total_width(&schemas[i + 1..])?.checked_add(t));
            let value = self.read_field(reader, schema, after)?;
            if !schema.exclude {
                fields.push(Field {
                    name: schema.name.clone(),
                    value,
                });
            }
        }
        Ok(fields)
    }

    fn read_field(
        &self,
        reader: &mut Reader,
        schema: &FieldSchema,
        tail: Option<usize>,
    ) -> Result<Value> {
        let name = schema.name.as_str();
        let value = match schema.field_type.fixed_width() {
            Some(width) => {
                let bytes = reader.take(width, name)?;
                match schema.field_type {
                    FieldType::Hash256 => Value::Hex(primitive::decode_hash256(bytes)?),
                    FieldType::AccountId => {
                        Value::Text(AccountId::from_bytes(bytes)?.to_address())
                    }
                    FieldType::Xfl => return self.read_xfl(bytes, schema),
                    _ => Value::UInt(primitive::decode_uint(bytes, self.config.byte_order)?),
                }
            }
            None if schema.field_type == FieldType::Array => {
                return self.read_array(reader, schema, tail)
            }
            None => self.read_var_string(reader, schema)?,
        };
        if let Some(pattern) = schema.pattern.as_deref() {
            check_pattern(schema, pattern, &value)?;
        }
        Ok(value)
    }

    fn read_xfl(&self, bytes: &[u8], schema: &FieldSchema) -> Result<Value> {
        let xfl = primitive::decode_xfl(bytes, self.config.byte_order)?;
        if let Some(pattern) = schema.pattern.as_deref() {
            let expected: Xfl = pattern.parse().map_err(|_| bad_pattern(schema, pattern))?;
            if expected != xfl {
                return Err(Error::mismatch(&schema.name, pattern, xfl.to_string()));
            }
        }
        Ok(Value::Float(xfl.to_f64()))
    }

    fn read_var_string(&self, reader: &mut Reader, schema: &FieldSchema) -> Result<Value> {
        let name = schema.name.as_str();
        let len = if schema.length_prefix {
            reader.read_len(name)?
        } else {
            schema.byte_length.ok_or_else(|| {
                Error::BadSchema(format!("field `{}`: VarString without byte_length", name))
            })?
        };
        let bytes = reader.take(len, name)?;
        let text = primitive::decode_var_string(bytes, schema.binary, self.config.strip_nul)
            .map_err(|e| match (&schema.pattern, e) {
                // Undecodable text can't equal a pattern; let the next candidate try.
                (Some(pattern), Error::MalformedInput(_)) => {
                    Error::mismatch(name, format!("{:?}", pattern), "invalid UTF-8")
                }
                (_, e) => e,
            })?;
        Ok(if schema.binary {
            Value::Hex(text)
        } else {
            Value::Text(text)
        })
    }

    fn read_array(
        &self,
        reader: &mut Reader,
        schema: &FieldSchema,
        tail: Option<usize>,
    ) -> Result<Value> {
        let count = match schema.array_count()? {
            Some(count) => count,
            None => prefixed_count(reader, schema, tail)?,
        };
        if count > 0 && total_width(&schema.array) == Some(0) {
            return Err(Error::BadSchema(format!(
                "field `{}`: array elements consume no bytes",
                schema.name
            )));
        }
        // Every repetition consumes at least a byte, so the input bounds the allocation.
        let mut items = Vec::with_capacity(count.min(reader.remaining()));
        for _ in 0..count {
            let mut fields = self.read_fields(reader, &schema.array, None)?;
            let item = if schema.array.len() == 1 && fields.len() == 1 {
                fields.remove(0).value
            } else {
                Value::Record(fields)
            };
            items.push(item);
        }
        Ok(Value::Array(items))
    }
}

/// Repetitions of a length-prefixed array.
///
/// The leading count byte is taken when it accounts for exactly the bytes left to the array.
/// Otherwise, if those bytes hold a whole number of elements, the count byte is absent and the
/// array fills them. Without a known extent the count byte is always read.
fn prefixed_count(reader: &mut Reader, schema: &FieldSchema, tail: Option<usize>) -> Result<usize> {
    let width = total_width(&schema.array).filter(|w| *w > 0);
    let extent = tail.and_then(|t| reader.remaining().checked_sub(t));
    if let (Some(width), Some(extent)) = (width, extent) {
        let counted = reader
            .peek()
            .and_then(|c| usize::from(c).checked_mul(width)?.checked_add(1))
            == Some(extent);
        if !counted && extent % width == 0 {
            return Ok(extent / width);
        }
    }
    reader.read_len(&schema.name)
}

fn bad_pattern(schema: &FieldSchema, pattern: &str) -> Error {
    Error::BadSchema(format!(
        "field `{}`: pattern {:?} is not a valid {}",
        schema.name, pattern, schema.field_type
    ))
}

fn check_pattern(schema: &FieldSchema, pattern: &str, value: &Value) -> Result<()> {
    let matched = match value {
        Value::UInt(v) => {
            let expected: u64 = pattern
                .trim()
                .parse()
                .map_err(|_| bad_pattern(schema, pattern))?;
            expected == *v
        }
        Value::Hex(v) => v.eq_ignore_ascii_case(pattern.trim()),
        Value::Text(v) => v == pattern,
        _ => false,
    };
    if matched {
        Ok(())
    } else {
        Err(Error::mismatch(
            &schema.name,
            format!("{:?}", pattern),
            format!("{:?}", value.to_string()),
        ))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::{ByteOrder, CodecConfig};

    fn version_schema() -> FieldSchema {
        FieldSchema::new(FieldType::Array, "version")
            .byte_length(3)
            .array_length(3)
            .element(FieldSchema::new(FieldType::UInt8, "major"))
            .element(FieldSchema::new(FieldType::UInt8, "minor"))
            .element(FieldSchema::new(FieldType::UInt8, "patch"))
    }

    #[test]
    fn fixed_fields() {
        let codec = Codec::default();
        let schemas = vec![
            FieldSchema::new(FieldType::UInt32, "count"),
            FieldSchema::new(FieldType::AccountId, "owner"),
            FieldSchema::new(FieldType::Xfl, "fee"),
        ];
        let hex = "41020000B0B4EA2F24C9BFB2DC8E1A33854A846328116BB80080C6A47E8D0354";
        let fields = codec.decode_record_hex(hex, &schemas).unwrap();
        assert_eq!(
            fields,
            vec![
                Field::new("count", 577u32),
                Field::new("owner", "rHfLeAcShzsicdcepwFqM7syUikCQ6dDXi"),
                Field::new("fee", 0.01),
            ]
        );
    }

    #[test]
    fn big_endian_config() {
        let codec = Codec::new(CodecConfig::new().byte_order(ByteOrder::Big));
        let schemas = [FieldSchema::new(FieldType::UInt16, "n")];
        let fields = codec.decode_record_hex("0102", &schemas).unwrap();
        assert_eq!(fields[0].value, Value::UInt(0x0102));
    }

    #[test]
    fn excluded_padding() {
        let codec = Codec::default();
        let schemas = vec![
            FieldSchema::new(FieldType::VarString, "reserved")
                .byte_length(8)
                .exclude(true),
            FieldSchema::new(FieldType::VarString, "token").byte_length(4),
        ];
        let fields = codec
            .decode_record_hex("FFFFFFFFFFFFFFFF45565200", &schemas)
            .unwrap();
        assert_eq!(fields, vec![Field::new("token", "EVR")]);
    }

    #[test]
    fn version_array() {
        let codec = Codec::default();
        let fields = codec
            .decode_record_hex("000803", &[version_schema()])
            .unwrap();
        let version = &fields[0].value;
        let first = &version.as_array().unwrap()[0];
        assert_eq!(first.get("major"), Some(&Value::UInt(0)));
        assert_eq!(first.get("minor"), Some(&Value::UInt(8)));
        assert_eq!(first.get("patch"), Some(&Value::UInt(3)));
        assert_eq!(version.join("."), "0.8.3");
    }

    #[test]
    fn single_field_elements_are_bare() {
        let codec = Codec::default();
        let schema = FieldSchema::new(FieldType::Array, "ids")
            .length_prefix(true)
            .element(FieldSchema::new(FieldType::UInt16, "id"));
        let fields = codec.decode_record_hex("0201000200", &[schema]).unwrap();
        assert_eq!(
            fields[0].value,
            Value::Array(vec![Value::UInt(1), Value::UInt(2)])
        );
    }

    #[test]
    fn prefixed_array_without_count_byte() {
        let codec = Codec::default();
        let schemas = vec![
            FieldSchema::new(FieldType::Array, "ids")
                .length_prefix(true)
                .element(FieldSchema::new(FieldType::UInt16, "id")),
            FieldSchema::new(FieldType::UInt8, "flags"),
        ];
        // Two elements fill the four bytes before the trailing flags byte.
        let fields = codec.decode_record_hex("0700080009", &schemas).unwrap();
        assert_eq!(
            fields[0].value,
            Value::Array(vec![Value::UInt(7), Value::UInt(8)])
        );
        assert_eq!(fields[1].value, Value::UInt(9));
        // A count byte that covers the rest is still honored.
        let fields = codec.decode_record_hex("020700080009", &schemas).unwrap();
        assert_eq!(fields[0].value.as_array().unwrap().len(), 2);
        let empty = codec.decode_record_hex("09", &schemas).unwrap();
        assert_eq!(empty[0].value, Value::Array(vec![]));
    }

    #[test]
    fn zero_width_elements_rejected() {
        let codec = Codec::default();
        let schema = FieldSchema::new(FieldType::Array, "a")
            .array_length(1_000_000)
            .element(FieldSchema::new(FieldType::VarString, "x").byte_length(0));
        assert!(matches!(
            codec.decode_record(&[], &[schema]),
            Err(Error::BadSchema(_))
        ));
    }

    #[test]
    fn length_prefixed_string() {
        let codec = Codec::default();
        let schema = FieldSchema::new(FieldType::VarString, "label").length_prefix(true);
        let fields = codec.decode_record_hex("03616263", &[schema.clone()]).unwrap();
        assert_eq!(fields[0].value, Value::Text("abc".into()));
        assert!(matches!(
            codec.decode_record_hex("0561", &[schema]),
            Err(Error::TruncatedInput { expected: 5, actual: 1, .. })
        ));
    }

    #[test]
    fn binary_window() {
        let codec = Codec::default();
        let schema = FieldSchema::new(FieldType::VarString, "raw")
            .byte_length(3)
            .binary(true);
        let fields = codec.decode_record_hex("00ab00", &[schema]).unwrap();
        assert_eq!(fields[0].value, Value::Hex("00AB00".into()));
    }

    #[test]
    fn patterns() {
        let codec = Codec::default();
        let schemas = vec![
            FieldSchema::new(FieldType::VarString, "topic")
                .byte_length(1)
                .pattern("T"),
            FieldSchema::new(FieldType::UInt8, "kind").pattern("2"),
        ];
        let fields = codec.decode_record_hex("5402", &schemas).unwrap();
        assert_eq!(fields[1].value, Value::UInt(2));
        let err = codec.decode_record_hex("5403", &schemas).unwrap_err();
        assert!(err.is_mismatch());
        let err = codec.decode_record_hex("4C02", &schemas).unwrap_err();
        assert!(err.is_mismatch());
        // Non-UTF-8 bytes under a text pattern are a mismatch, not malformed input.
        let err = codec.decode_record_hex("FF02", &schemas).unwrap_err();
        assert!(err.is_mismatch());
    }

    #[test]
    fn xfl_pattern() {
        let codec = Codec::default();
        let schemas = [FieldSchema::new(FieldType::Xfl, "fee").pattern("0.01")];
        codec
            .decode_record_hex("0080C6A47E8D0354", &schemas)
            .unwrap();
        let err = codec
            .decode_record_hex("0080C6A47E8D8354", &schemas)
            .unwrap_err();
        assert!(err.is_mismatch());
    }

    #[test]
    fn hash_pattern_ignores_case() {
        let codec = Codec::default();
        let hash = "CAC02451AD7EDC2AEE90B81AA94F2D3CA4FC21CD3F6E22BD3C70BF03B21CE64D";
        let schemas = [FieldSchema::new(FieldType::Hash256, "h").pattern(hash.to_lowercase())];
        let fields = codec.decode_record_hex(hash, &schemas).unwrap();
        assert_eq!(fields[0].value, Value::Hex(hash.into()));
    }

    #[test]
    fn consumption() {
        let codec = Codec::default();
        let schemas = [FieldSchema::new(FieldType::UInt16, "n")];
        let err = codec.decode_record_hex("010203", &schemas).unwrap_err();
        assert!(err.is_mismatch());
        let err = codec.decode_record_hex("01", &schemas).unwrap_err();
        assert!(matches!(err, Error::TruncatedInput { .. }));
        assert!(matches!(
            codec.decode_record_hex("0g", &schemas),
            Err(Error::MalformedInput(_))
        ));
    }

    #[test]
    fn empty_schema_list() {
        let codec = Codec::default();
        assert_eq!(codec.decode_record(&[], &[]).unwrap(), vec![]);
        assert!(codec.decode_record(&[0], &[]).unwrap_err().is_mismatch());
    }
}
