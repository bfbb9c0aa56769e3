//! Definitions: named groups of field schemas that the matcher chooses between.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::schema::FieldSchema;

/// One candidate layout for a key/data pair.
///
/// The key and data lists accept the per-source names used by definition files
/// (`hookstate_key`, `hookparam_data`, `otxnparam_key`, ...).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldGroup {
    pub name: String,
    #[serde(
        default,
        alias = "hookstate_key",
        alias = "hookparam_key",
        alias = "otxnparam_key"
    )]
    pub key: Vec<FieldSchema>,
    #[serde(
        default,
        alias = "hookstate_data",
        alias = "hookparam_data",
        alias = "otxnparam_data"
    )]
    pub data: Vec<FieldSchema>,
    /// Transaction types this group applies to. Empty means all of them.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transaction_types: Vec<String>,
}

impl FieldGroup {
    pub fn new(name: impl Into<String>, key: Vec<FieldSchema>, data: Vec<FieldSchema>) -> Self {
        Self {
            name: name.into(),
            key,
            data,
            transaction_types: Vec::new(),
        }
    }

    /// Restrict the group to one more transaction type.
    pub fn transaction_type(mut self, txn_type: impl Into<String>) -> Self {
        self.transaction_types.push(txn_type.into());
        self
    }

    /// Whether the group is a candidate for the given transaction type.
    pub fn applies_to(&self, txn_type: &str) -> bool {
        self.transaction_types.is_empty() || self.transaction_types.iter().any(|t| t == txn_type)
    }

    pub fn check(&self) -> Result<()> {
        self.key
            .iter()
            .chain(self.data.iter())
            .try_for_each(|s| s.check())
    }
}

/// Ordered candidate list for hook state, hook parameters, or transaction parameters.
///
/// Order matters: the first group that matches wins.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Definition {
    pub fields: Vec<FieldGroup>,
}

pub type HookStateDefinition = Definition;
pub type HookParameterDefinition = Definition;
pub type TxnParameterDefinition = Definition;

impl Definition {
    pub fn new(fields: Vec<FieldGroup>) -> Self {
        Self { fields }
    }

    pub fn check(&self) -> Result<()> {
        self.fields.iter().try_for_each(|g| g.check())
    }
}

/// One candidate layout for an invoke blob.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValueGroup {
    pub name: String,
    pub value: Vec<FieldSchema>,
}

impl ValueGroup {
    pub fn new(name: impl Into<String>, value: Vec<FieldSchema>) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Ordered candidate list for invoke blobs.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BlobDefinition {
    pub fields: Vec<ValueGroup>,
}

impl BlobDefinition {
    pub fn new(fields: Vec<ValueGroup>) -> Self {
        Self { fields }
    }
}
