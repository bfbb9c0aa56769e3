//! Byte-level encoders and decoders for the atomic field types.
//!
//! Each function handles exactly one window of bytes. Locating the window (widths, length
//! prefixes, array repetition) is the job of the record decoder and encoder.

use byteorder::{BigEndian, LittleEndian, ReadBytesExt};

use crate::config::ByteOrder;
use crate::error::{Error, Result};

mod account;
mod xfl;

pub use self::account::AccountId;
pub use self::xfl::Xfl;

/// Width of a Hash256 field.
pub const HASH256_BYTES: usize = 32;

/// Decode an unsigned integer of 1, 2, 4, or 8 bytes.
pub fn decode_uint(bytes: &[u8], order: ByteOrder) -> Result<u64> {
    let mut buf = bytes;
    let v = match (bytes.len(), order) {
        (1, _) => buf.read_u8().map(u64::from),
        (2, ByteOrder::Little) => buf.read_u16::<LittleEndian>().map(u64::from),
        (2, ByteOrder::Big) => buf.read_u16::<BigEndian>().map(u64::from),
        (4, ByteOrder::Little) => buf.read_u32::<LittleEndian>().map(u64::from),
        (4, ByteOrder::Big) => buf.read_u32::<BigEndian>().map(u64::from),
        (8, ByteOrder::Little) => buf.read_u64::<LittleEndian>(),
        (8, ByteOrder::Big) => buf.read_u64::<BigEndian>(),
        (len, _) => {
            return Err(Error::MalformedInput(format!(
                "{} bytes is not an integer width",
                len
            )))
        }
    };
    v.map_err(|e| Error::MalformedInput(e.to_string()))
}

/// Append an unsigned integer of `width` bytes. Fails if the value doesn't fit.
pub fn encode_uint(width: usize, value: u64, order: ByteOrder, buf: &mut Vec<u8>) -> Result<()> {
    let max = match width {
        1 => u8::MAX as u64,
        2 => u16::MAX as u64,
        4 => u32::MAX as u64,
        8 => u64::MAX,
        _ => {
            return Err(Error::OutOfRange(format!(
                "{} bytes is not an integer width",
                width
            )))
        }
    };
    if value > max {
        return Err(Error::OutOfRange(format!(
            "{} does not fit in {} bytes",
            value, width
        )));
    }
    match (width, order) {
        (1, _) => buf.push(value as u8),
        (2, ByteOrder::Little) => buf.extend_from_slice(&(value as u16).to_le_bytes()),
        (2, ByteOrder::Big) => buf.extend_from_slice(&(value as u16).to_be_bytes()),
        (4, ByteOrder::Little) => buf.extend_from_slice(&(value as u32).to_le_bytes()),
        (4, ByteOrder::Big) => buf.extend_from_slice(&(value as u32).to_be_bytes()),
        (_, ByteOrder::Little) => buf.extend_from_slice(&value.to_le_bytes()),
        (_, ByteOrder::Big) => buf.extend_from_slice(&value.to_be_bytes()),
    }
    Ok(())
}

/// Render a 32-byte hash as uppercase hex.
pub fn decode_hash256(bytes: &[u8]) -> Result<String> {
    if bytes.len() != HASH256_BYTES {
        return Err(Error::MalformedInput(format!(
            "hash is {} bytes, expected {}",
            bytes.len(),
            HASH256_BYTES
        )));
    }
    Ok(hex::encode_upper(bytes))
}

/// Parse a 64-character hex hash. Case-insensitive.
pub fn encode_hash256(text: &str) -> Result<[u8; HASH256_BYTES]> {
    let mut out = [0u8; HASH256_BYTES];
    hex::decode_to_slice(text.trim(), &mut out).map_err(|e| {
        Error::MalformedInput(format!("hash `{}` is not 32 bytes of hex: {}", text, e))
    })?;
    Ok(out)
}

/// Decode an XFL word.
pub fn decode_xfl(bytes: &[u8], order: ByteOrder) -> Result<Xfl> {
    if bytes.len() != Xfl::BYTES {
        return Err(Error::MalformedInput(format!(
            "XFL is {} bytes, expected {}",
            bytes.len(),
            Xfl::BYTES
        )));
    }
    Xfl::from_bits(decode_uint(bytes, order)?)
}

pub fn encode_xfl(value: Xfl, order: ByteOrder, buf: &mut Vec<u8>) {
    match order {
        ByteOrder::Little => buf.extend_from_slice(&value.to_bits().to_le_bytes()),
        ByteOrder::Big => buf.extend_from_slice(&value.to_bits().to_be_bytes()),
    }
}

/// Decode a text or binary window.
///
/// Binary windows come back as uppercase hex of every byte. Text windows have their NUL bytes
/// removed when `strip_nul` is set, and must then be valid UTF-8.
pub fn decode_var_string(bytes: &[u8], binary: bool, strip_nul: bool) -> Result<String> {
    if binary {
        return Ok(hex::encode_upper(bytes));
    }
    let text = if strip_nul {
        bytes.iter().copied().filter(|b| *b != 0).collect()
    } else {
        bytes.to_vec()
    };
    String::from_utf8(text)
        .map_err(|e| Error::MalformedInput(format!("text is not valid UTF-8: {}", e)))
}

/// Turn text (or hex, for binary windows) into the raw bytes of a window, without padding.
pub fn encode_var_string(value: &str, binary: bool) -> Result<Vec<u8>> {
    if binary {
        Ok(hex::decode(value.trim())?)
    } else {
        Ok(value.as_bytes().to_vec())
    }
}

/// Place `bytes` at the start of a `window`-byte field, NUL-padding the rest.
pub fn pad_window(bytes: &[u8], window: usize, buf: &mut Vec<u8>) -> Result<()> {
    if bytes.len() > window {
        return Err(Error::OutOfRange(format!(
            "{} bytes do not fit in a {}-byte window",
            bytes.len(),
            window
        )));
    }
    buf.extend_from_slice(bytes);
    buf.resize(buf.len() + (window - bytes.len()), 0);
    Ok(())
}
