use crate::config::CodecConfig;

/// Entry point for decoding, matching, and encoding records.
///
/// A codec only carries its [`CodecConfig`]. It holds no other state, so one codec can be
/// shared freely between threads and calls.
///
/// ```
/// # use hookstate_codec::{Codec, FieldSchema, FieldType, Value};
/// let codec = Codec::default();
/// let schemas = [FieldSchema::new(FieldType::UInt32, "count")];
/// let fields = codec.decode_record_hex("41020000", &schemas).unwrap();
/// assert_eq!(fields[0].value, Value::UInt(577));
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Codec {
    pub(crate) config: CodecConfig,
}

impl Codec {
    pub fn new(config: CodecConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }
}
