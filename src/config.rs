use educe::Educe;
use serde::{Deserialize, Serialize};

/// Byte order used for multi-byte integers and XFL words.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ByteOrder {
    Little,
    Big,
}

#[inline]
fn is_true(v: &bool) -> bool {
    *v
}

#[inline]
fn order_is_little(v: &ByteOrder) -> bool {
    *v == ByteOrder::Little
}

/// Settings shared by every decode and encode call of a [`Codec`][crate::Codec].
///
/// The configuration is immutable once handed to a codec. Hook state written by on-ledger
/// hooks is little-endian and stores text in NUL-padded windows, which is what the defaults
/// describe.
///
/// # Defaults
///
/// - byte_order: ByteOrder::Little
/// - strip_nul: true
///
/// # Examples
///
/// ```
/// # use hookstate_codec::{ByteOrder, CodecConfig};
/// let config = CodecConfig::new().byte_order(ByteOrder::Big).strip_nul(false);
/// assert_eq!(config.byte_order, ByteOrder::Big);
/// ```
#[derive(Educe, Clone, Debug, Serialize, Deserialize)]
#[educe(PartialEq, Default)]
#[serde(deny_unknown_fields, default)]
pub struct CodecConfig {
    /// Byte order of UInt16/32/64 and XFL fields.
    #[educe(Default(expression = ByteOrder::Little))]
    #[serde(skip_serializing_if = "order_is_little")]
    pub byte_order: ByteOrder,
    /// Remove NUL bytes from decoded text windows.
    #[educe(Default = true)]
    #[serde(skip_serializing_if = "is_true")]
    pub strip_nul: bool,
}

impl CodecConfig {
    /// Make a new configuration with the defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the byte order for multi-byte fields.
    pub fn byte_order(mut self, byte_order: ByteOrder) -> Self {
        self.byte_order = byte_order;
        self
    }

    /// Set whether NUL bytes are removed from decoded text.
    pub fn strip_nul(mut self, strip_nul: bool) -> Self {
        self.strip_nul = strip_nul;
        self
    }
}
