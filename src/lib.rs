//! hookstate-codec decodes and encodes the binary payloads that ledger hooks keep in state
//! and exchange through parameters, driven entirely by declarative schemas. The goal is that a
//! JSON definition of a hook's storage layout is all a client needs to read that hook's state
//! and to build transactions for it.
//!
//! It provides:
//!
//! - Typed field codecs: little- or big-endian unsigned integers, 32-byte hashes, 20-byte
//! 	account IDs with checksummed base58 addresses, the XFL decimal float, and fixed-window
//! 	or length-prefixed strings (text or raw bytes)
//! - Field schemas with literal patterns, excluded padding, and arrays of sub-records
//! - First-match selection among candidate layouts, so one key can be told apart from
//! 	another by its discriminant bytes alone
//! - Parsers for hook state entries, hook parameters, transaction parameters, and invoke blobs
//! - Write operations that turn named arguments into transaction hook parameters
//! - Read operations that compute the state key and ledger index of a well-known entry, and
//! 	decode it into named return values
//!
//! # Example
//!
//! ```
//! # use hookstate_codec::*;
//! let definition: Definition = serde_json::from_str(r#"{ "fields": [
//!     { "name": "Layer",
//!       "hookparam_key": [ { "type": "VarString", "name": "topic", "pattern": "L",
//!                            "byte_length": 1, "exclude": true } ],
//!       "hookparam_data": [ { "type": "UInt8", "name": "Layer" } ] }
//! ] }"#).unwrap();
//! let record = hook_parameters_parser(&HookParameter::new("4C", "02"), &definition).unwrap();
//! assert_eq!(record.name, "Layer");
//! assert_eq!(record.data[0].value, Value::UInt(2));
//! ```

use std::collections::BTreeMap;

mod codec;
mod config;
mod decode;
mod definition;
mod encode;
mod error;
pub mod keylet;
mod matcher;
pub mod operation;
mod parser;
pub mod primitive;
mod reader;
pub mod schema;
mod value;

pub use self::codec::Codec;
pub use self::config::{ByteOrder, CodecConfig};
pub use self::definition::{
    BlobDefinition, Definition, FieldGroup, HookParameterDefinition, HookStateDefinition,
    TxnParameterDefinition, ValueGroup,
};
pub use self::error::{Error, Result};
pub use self::operation::{
    OperationDefinition, Operations, ReadDefinition, ReadOperation, StateLookup,
    WriteDefinition, WriteOperation,
};
pub use self::parser::{HookParameter, HookParameterEntry, HookStateEntry};
pub use self::primitive::{AccountId, Xfl};
pub use self::schema::{FieldSchema, FieldType};
pub use self::value::{find, Args, BlobRecord, Field, NamedRecord, Value};

/// Decode a hook state entry with the default codec.
pub fn hook_state_parser(entry: &HookStateEntry, definition: &Definition) -> Result<NamedRecord> {
    Codec::default().parse_hook_state(entry, definition)
}

/// Decode a hook parameter with the default codec.
pub fn hook_parameters_parser(
    parameter: &HookParameter,
    definition: &Definition,
) -> Result<NamedRecord> {
    Codec::default().parse_hook_parameter(parameter, definition)
}

/// Decode a transaction parameter of a `transaction_type` transaction with the default codec.
pub fn txn_parameters_parser(
    parameter: &HookParameter,
    transaction_type: &str,
    definition: &Definition,
) -> Result<NamedRecord> {
    Codec::default().parse_txn_parameter(parameter, transaction_type, definition)
}

/// Decode an invoke blob with the default codec.
pub fn invoke_blob_parser(blob: &str, definition: &BlobDefinition) -> Result<BlobRecord> {
    Codec::default().parse_invoke_blob(blob, definition)
}

/// Compile the write operations of a definition with the default codec.
pub fn write_operations(
    definition: &OperationDefinition,
) -> Result<BTreeMap<String, WriteOperation>> {
    Codec::default().write_operations(definition)
}

/// Compile the read operations of a definition with the default codec.
pub fn read_operations(
    definition: &OperationDefinition,
) -> Result<BTreeMap<String, ReadOperation>> {
    Codec::default().read_operations(definition)
}
