//! Parsers for the payload shapes found on the ledger: hook state entries, hook parameters,
//! transaction parameters, and invoke blobs.

use serde::{Deserialize, Serialize};

use crate::codec::Codec;
use crate::definition::{BlobDefinition, Definition};
use crate::error::Result;
use crate::value::{BlobRecord, NamedRecord};

/// A hook state ledger entry, as returned by ledger queries.
///
/// Only the key and data take part in decoding. The bookkeeping fields are carried so whole
/// entries can be deserialized and passed along.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HookStateEntry {
    #[serde(rename = "HookStateKey")]
    pub key: String,
    #[serde(rename = "HookStateData")]
    pub data: String,
    #[serde(
        rename = "LedgerEntryType",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub ledger_entry_type: Option<String>,
    #[serde(rename = "OwnerNode", default, skip_serializing_if = "Option::is_none")]
    pub owner_node: Option<String>,
    #[serde(rename = "index", default, skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,
}

impl HookStateEntry {
    pub fn new(key: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            data: data.into(),
            ledger_entry_type: None,
            owner_node: None,
            index: None,
        }
    }
}

/// A name/value pair in hex, as attached to hooks and transactions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookParameter {
    #[serde(rename = "HookParameterName")]
    pub name: String,
    #[serde(rename = "HookParameterValue")]
    pub value: String,
}

impl HookParameter {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// The `{"HookParameter": {...}}` wrapper used in transaction JSON.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookParameterEntry {
    #[serde(rename = "HookParameter")]
    pub parameter: HookParameter,
}

impl From<HookParameter> for HookParameterEntry {
    fn from(parameter: HookParameter) -> Self {
        Self { parameter }
    }
}

impl From<HookParameterEntry> for HookParameter {
    fn from(entry: HookParameterEntry) -> Self {
        entry.parameter
    }
}

impl Codec {
    /// Decode a hook state entry with the first matching group of `definition`.
    pub fn parse_hook_state(
        &self,
        entry: &HookStateEntry,
        definition: &Definition,
    ) -> Result<NamedRecord> {
        let key = hex::decode(entry.key.trim())?;
        let data = hex::decode(entry.data.trim())?;
        self.match_record(&definition.fields, &key, &data)
    }

    /// Decode a hook parameter. The name acts as the key and the value as the data.
    pub fn parse_hook_parameter(
        &self,
        parameter: &HookParameter,
        definition: &Definition,
    ) -> Result<NamedRecord> {
        let key = hex::decode(parameter.name.trim())?;
        let data = hex::decode(parameter.value.trim())?;
        self.match_record(&definition.fields, &key, &data)
    }

    /// Decode a transaction parameter, considering only the groups that apply to
    /// `transaction_type`.
    pub fn parse_txn_parameter(
        &self,
        parameter: &HookParameter,
        transaction_type: &str,
        definition: &Definition,
    ) -> Result<NamedRecord> {
        let key = hex::decode(parameter.name.trim())?;
        let data = hex::decode(parameter.value.trim())?;
        let candidates = definition
            .fields
            .iter()
            .filter(|group| group.applies_to(transaction_type));
        self.match_record(candidates, &key, &data)
    }

    /// Decode an invoke blob with the first matching value group.
    pub fn parse_invoke_blob(&self, blob: &str, definition: &BlobDefinition) -> Result<BlobRecord> {
        let bytes = hex::decode(blob.trim())?;
        self.match_blob(&definition.fields, &bytes)
    }
}
