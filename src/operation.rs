//! Named read and write operations built from an operation definition.
//!
//! A write operation turns structured arguments into the hook parameters of a transaction. A
//! read operation knows the fixed state key it targets, derives the ledger index for a given
//! account and namespace, and decodes the state data into its declared return values.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::codec::Codec;
use crate::encode::check_argument;
use crate::error::{Error, Result};
use crate::keylet::hook_state_index;
use crate::parser::HookParameter;
use crate::primitive::AccountId;
use crate::schema::{total_width, FieldSchema, FieldType};
use crate::value::{Args, Field};

/// Width of a hook state key and of a namespace.
pub const STATE_KEY_BYTES: usize = 32;

/// One key/data layout of an operation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParameterGroup {
    #[serde(default)]
    pub key: Vec<FieldSchema>,
    #[serde(default)]
    pub data: Vec<FieldSchema>,
}

impl ParameterGroup {
    pub fn new(key: Vec<FieldSchema>, data: Vec<FieldSchema>) -> Self {
        Self { key, data }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WriteDefinition {
    /// Argument names and the types they are encoded as.
    #[serde(default)]
    pub data: BTreeMap<String, FieldType>,
    /// Parameters emitted, in order.
    #[serde(rename = "txn_parameter_definition", alias = "parameter_groups", default)]
    pub parameter_groups: Vec<ParameterGroup>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReadDefinition {
    /// Accepted for symmetry with writes. Reads target a fixed key, so args are never encoded.
    #[serde(default)]
    pub args: BTreeMap<String, FieldType>,
    /// Return names and their types.
    #[serde(default)]
    pub returns: BTreeMap<String, FieldType>,
    #[serde(rename = "hook_state_definition", alias = "state")]
    pub state: ParameterGroup,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OperationDefinition {
    #[serde(default)]
    pub write: BTreeMap<String, WriteDefinition>,
    #[serde(default)]
    pub read: BTreeMap<String, ReadDefinition>,
}

/// Walk top-level schemas and confirm each `field` reference names a declared entry of the
/// same type.
fn check_bindings(
    op: &str,
    schemas: &[FieldSchema],
    declared: &BTreeMap<String, FieldType>,
) -> Result<()> {
    for schema in schemas {
        schema.check()?;
        let field = match schema.field.as_deref() {
            Some(field) if schema.pattern.is_none() && !schema.exclude => field,
            _ => continue,
        };
        match declared.get(field) {
            None => {
                return Err(Error::BadSchema(format!(
                    "operation `{}`: field `{}` refers to undeclared `{}`",
                    op, schema.name, field
                )))
            }
            Some(t) if *t != schema.field_type => {
                return Err(Error::BadSchema(format!(
                    "operation `{}`: `{}` is declared {} but field `{}` is {}",
                    op, field, t, schema.name, schema.field_type
                )))
            }
            Some(_) => (),
        }
    }
    Ok(())
}

/// A compiled write operation.
#[derive(Clone, Debug)]
pub struct WriteOperation {
    name: String,
    codec: Codec,
    data: BTreeMap<String, FieldType>,
    groups: Vec<ParameterGroup>,
}

impl WriteOperation {
    /// Validate a write definition and bind it to a codec.
    pub fn new(codec: Codec, name: impl Into<String>, definition: WriteDefinition) -> Result<Self> {
        let name = name.into();
        for group in definition.parameter_groups.iter() {
            check_bindings(&name, &group.key, &definition.data)?;
            check_bindings(&name, &group.data, &definition.data)?;
        }
        Ok(Self {
            name,
            codec,
            data: definition.data,
            groups: definition.parameter_groups,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared arguments and their types.
    pub fn arguments(&self) -> &BTreeMap<String, FieldType> {
        &self.data
    }

    /// Encode every parameter group into a hex name/value pair.
    ///
    /// All declared arguments are checked before anything is encoded, so a missing or mistyped
    /// argument never yields partial output.
    pub fn build(&self, args: &Args) -> Result<Vec<HookParameter>> {
        for (arg, field_type) in self.data.iter() {
            let value = args
                .get(arg)
                .ok_or_else(|| Error::MissingArgument(arg.clone()))?;
            check_argument(arg, *field_type, value)?;
        }
        let params = self
            .groups
            .iter()
            .map(|group| -> Result<HookParameter> {
                Ok(HookParameter::new(
                    self.codec.encode_record_hex(&group.key, args)?,
                    self.codec.encode_record_hex(&group.data, args)?,
                ))
            })
            .collect::<Result<Vec<_>>>()?;
        debug!(operation = %self.name, parameters = params.len(), "built write operation");
        Ok(params)
    }
}

/// Where to find the state entry of a read operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StateLookup {
    /// The 32-byte state key, in hex.
    pub key: String,
    /// The ledger index of the entry, in hex.
    pub index: String,
}

/// A compiled read operation.
#[derive(Clone, Debug)]
pub struct ReadOperation {
    name: String,
    codec: Codec,
    returns: BTreeMap<String, FieldType>,
    data: Vec<FieldSchema>,
    key: [u8; STATE_KEY_BYTES],
}

impl ReadOperation {
    /// Validate a read definition and encode its fixed state key.
    ///
    /// The key schemas may not bind any argument. Keys shorter than 32 bytes are left-padded
    /// with zeros.
    pub fn new(codec: Codec, name: impl Into<String>, definition: ReadDefinition) -> Result<Self> {
        let name = name.into();
        for schema in definition.state.key.iter() {
            schema.check()?;
            if schema.field.is_some() && schema.pattern.is_none() && !schema.exclude {
                return Err(Error::BadSchema(format!(
                    "operation `{}`: key field `{}` binds an argument",
                    name, schema.name
                )));
            }
        }
        match total_width(&definition.state.key) {
            Some(width) if width <= STATE_KEY_BYTES => (),
            Some(width) => {
                return Err(Error::BadSchema(format!(
                    "operation `{}`: state key is {} bytes, at most {} allowed",
                    name, width, STATE_KEY_BYTES
                )))
            }
            None => {
                return Err(Error::BadSchema(format!(
                    "operation `{}`: state key has no fixed width",
                    name
                )))
            }
        }
        check_bindings(&name, &definition.state.data, &definition.returns)?;

        let encoded = codec.encode_record(&definition.state.key, &Args::new())?;
        let mut key = [0u8; STATE_KEY_BYTES];
        key[STATE_KEY_BYTES - encoded.len()..].copy_from_slice(&encoded);

        Ok(Self {
            name,
            codec,
            returns: definition.returns,
            data: definition.state.data,
            key,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared return values and their types.
    pub fn returns(&self) -> &BTreeMap<String, FieldType> {
        &self.returns
    }

    /// The fixed state key, in hex.
    pub fn state_key(&self) -> String {
        hex::encode_upper(self.key)
    }

    /// Locate the state entry for `account` (an address) in `namespace` (32 bytes of hex).
    pub fn lookup(&self, account: &str, namespace: &str) -> Result<StateLookup> {
        let account = AccountId::from_address(account)?;
        let mut ns = [0u8; STATE_KEY_BYTES];
        hex::decode_to_slice(namespace.trim(), &mut ns).map_err(|e| {
            Error::MalformedInput(format!("namespace is not 32 bytes of hex: {}", e))
        })?;
        let index = hook_state_index(&account, &self.key, &ns);
        debug!(operation = %self.name, account = %account, "computed state lookup");
        Ok(StateLookup {
            key: self.state_key(),
            index: hex::encode_upper(index),
        })
    }

    /// Decode state data and rename bound fields to their return names.
    ///
    /// Fields without a `field` binding are dropped.
    pub fn decode(&self, data: &str) -> Result<Vec<Field>> {
        let fields = self.codec.decode_record_hex(data, &self.data)?;
        let bound = self.data.iter().filter(|s| !s.exclude);
        Ok(bound
            .zip(fields)
            .filter_map(|(schema, field)| {
                schema.field.as_ref().map(|name| Field {
                    name: name.clone(),
                    value: field.value,
                })
            })
            .collect())
    }
}

/// Every operation of a definition, compiled and indexed by name.
#[derive(Clone, Debug, Default)]
pub struct Operations {
    writes: BTreeMap<String, WriteOperation>,
    reads: BTreeMap<String, ReadOperation>,
}

impl Codec {
    /// Compile every write operation of a definition, keyed by name.
    pub fn write_operations(
        &self,
        definition: &OperationDefinition,
    ) -> Result<BTreeMap<String, WriteOperation>> {
        definition
            .write
            .iter()
            .map(|(name, def)| {
                WriteOperation::new(self.clone(), name.clone(), def.clone())
                    .map(|op| (name.clone(), op))
            })
            .collect()
    }

    /// Compile every read operation of a definition, keyed by name.
    pub fn read_operations(
        &self,
        definition: &OperationDefinition,
    ) -> Result<BTreeMap<String, ReadOperation>> {
        definition
            .read
            .iter()
            .map(|(name, def)| {
                ReadOperation::new(self.clone(), name.clone(), def.clone())
                    .map(|op| (name.clone(), op))
            })
            .collect()
    }
}

impl Operations {
    pub fn new(codec: &Codec, definition: &OperationDefinition) -> Result<Self> {
        Ok(Self {
            writes: codec.write_operations(definition)?,
            reads: codec.read_operations(definition)?,
        })
    }

    pub fn write(&self, name: &str) -> Option<&WriteOperation> {
        self.writes.get(name)
    }

    pub fn read(&self, name: &str) -> Option<&ReadOperation> {
        self.reads.get(name)
    }

    pub fn writes(&self) -> impl Iterator<Item = &WriteOperation> {
        self.writes.values()
    }

    pub fn reads(&self) -> impl Iterator<Item = &ReadOperation> {
        self.reads.values()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::value::Value;

    const DEFINITION: &str = r#"{
        "write": {
            "voteToSeat": {
                "data": { "layer": "UInt8", "seatId": "UInt8", "value": "AccountID" },
                "txn_parameter_definition": [
                    { "key": [ { "type": "VarString", "name": "Topic", "pattern": "T", "byte_length": 1 } ],
                      "data": [
                          { "type": "VarString", "name": "Seat", "pattern": "S", "byte_length": 1 },
                          { "type": "UInt8", "name": "Seat ID", "field": "seatId" } ] },
                    { "key": [ { "type": "VarString", "name": "Layer", "pattern": "L", "byte_length": 1 } ],
                      "data": [ { "type": "UInt8", "name": "Layer", "field": "layer" } ] },
                    { "key": [ { "type": "VarString", "name": "Vote", "pattern": "V", "byte_length": 1 } ],
                      "data": [ { "type": "AccountID", "name": "Value", "field": "value" } ] }
                ]
            }
        },
        "read": {
            "currentMemberCount": {
                "args": {},
                "returns": { "count": "UInt8" },
                "hook_state_definition": {
                    "key": [
                        { "type": "VarString", "name": "Empty", "pattern": null, "binary": true, "byte_length": 30 },
                        { "type": "VarString", "name": "Member Count", "byte_length": 2, "pattern": "MC" }
                    ],
                    "data": [ { "type": "UInt8", "name": "Count", "field": "count" } ]
                }
            }
        }
    }"#;

    fn operations() -> Operations {
        let def: OperationDefinition = serde_json::from_str(DEFINITION).unwrap();
        Operations::new(&Codec::default(), &def).unwrap()
    }

    fn vote_args() -> Args {
        let mut args = Args::new();
        args.insert("layer".into(), Value::UInt(1));
        args.insert("seatId".into(), Value::UInt(3));
        args.insert(
            "value".into(),
            "rHfLeAcShzsicdcepwFqM7syUikCQ6dDXi".into(),
        );
        args
    }

    #[test]
    fn write_vote_to_seat() {
        let ops = operations();
        let op = ops.write("voteToSeat").unwrap();
        assert_eq!(op.name(), "voteToSeat");
        let params = op.build(&vote_args()).unwrap();
        assert_eq!(
            params,
            vec![
                HookParameter::new("54", "5303"),
                HookParameter::new("4C", "01"),
                HookParameter::new("56", "B0B4EA2F24C9BFB2DC8E1A33854A846328116BB8"),
            ]
        );
    }

    #[test]
    fn write_fails_fast() {
        let ops = operations();
        let op = ops.write("voteToSeat").unwrap();
        let mut args = vote_args();
        args.remove("value");
        assert_eq!(
            op.build(&args).unwrap_err(),
            Error::MissingArgument("value".into())
        );
        let mut args = vote_args();
        args.insert("layer".into(), Value::UInt(300));
        assert!(matches!(
            op.build(&args).unwrap_err(),
            Error::TypeMismatch { .. }
        ));
        let mut args = vote_args();
        args.insert("value".into(), "rNotAnAddress".into());
        assert!(matches!(
            op.build(&args).unwrap_err(),
            Error::InvalidAddress(_)
        ));
    }

    #[test]
    fn read_current_member_count() {
        let ops = operations();
        let op = ops.read("currentMemberCount").unwrap();
        let key = op.state_key();
        assert_eq!(key, format!("{}4D43", "0".repeat(60)));
        let lookup = op
            .lookup("rHfLeAcShzsicdcepwFqM7syUikCQ6dDXi", &"01".repeat(32))
            .unwrap();
        assert_eq!(lookup.key, key);
        assert_eq!(
            lookup.index,
            "FF41DC7A247F508738FCAF69CD99E169A16DF33D70FA474618FA3CB859C8411A"
        );
        assert_eq!(op.decode("07").unwrap(), vec![Field::new("count", 7u8)]);
        assert!(matches!(
            op.lookup("rHfLeAcShzsicdcepwFqM7syUikCQ6dDXi", "0101"),
            Err(Error::MalformedInput(_))
        ));
        assert!(matches!(
            op.lookup("account", &"01".repeat(32)),
            Err(Error::InvalidAddress(_))
        ));
    }

    #[test]
    fn short_keys_are_left_padded() {
        let def = ReadDefinition {
            state: ParameterGroup::new(
                vec![FieldSchema::new(FieldType::UInt8, "kind").pattern("9")],
                vec![],
            ),
            ..Default::default()
        };
        let op = ReadOperation::new(Codec::default(), "kind", def).unwrap();
        assert_eq!(op.state_key(), format!("{}09", "0".repeat(62)));
    }

    #[test]
    fn bad_definitions() {
        // Bound to an undeclared argument.
        let def = WriteDefinition {
            parameter_groups: vec![ParameterGroup::new(
                vec![],
                vec![FieldSchema::new(FieldType::UInt8, "n").field("missing")],
            )],
            ..Default::default()
        };
        assert!(matches!(
            WriteOperation::new(Codec::default(), "w", def),
            Err(Error::BadSchema(_))
        ));
        // Declared type differs from the field type.
        let mut data = BTreeMap::new();
        data.insert("n".to_string(), FieldType::UInt16);
        let def = WriteDefinition {
            data,
            parameter_groups: vec![ParameterGroup::new(
                vec![],
                vec![FieldSchema::new(FieldType::UInt8, "n").field("n")],
            )],
        };
        assert!(matches!(
            WriteOperation::new(Codec::default(), "w", def),
            Err(Error::BadSchema(_))
        ));
        // Read key bound to an argument.
        let def = ReadDefinition {
            state: ParameterGroup::new(
                vec![FieldSchema::new(FieldType::UInt8, "k").field("k")],
                vec![],
            ),
            ..Default::default()
        };
        assert!(matches!(
            ReadOperation::new(Codec::default(), "r", def),
            Err(Error::BadSchema(_))
        ));
        // Read key wider than a state key.
        let def = ReadDefinition {
            state: ParameterGroup::new(
                vec![FieldSchema::new(FieldType::VarString, "k").byte_length(33)],
                vec![],
            ),
            ..Default::default()
        };
        assert!(matches!(
            ReadOperation::new(Codec::default(), "r", def),
            Err(Error::BadSchema(_))
        ));
    }
}
