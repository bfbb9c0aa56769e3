use byteorder::ReadBytesExt;

use crate::error::{Error, Result};

/// Forward-only cursor over the bytes of one decode call.
#[derive(Clone, Debug)]
pub(crate) struct Reader<'a> {
    data: &'a [u8],
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Reader<'a> {
        Self { data }
    }

    pub fn remaining(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The next byte, without consuming it.
    pub fn peek(&self) -> Option<u8> {
        self.data.first().copied()
    }

    /// Consume exactly `len` bytes. Running out is always fatal, never a mismatch.
    pub fn take(&mut self, len: usize, field: &str) -> Result<&'a [u8]> {
        if len > self.data.len() {
            return Err(Error::TruncatedInput {
                field: field.to_string(),
                expected: len,
                actual: self.data.len(),
            });
        }
        let (head, tail) = self.data.split_at(len);
        self.data = tail;
        Ok(head)
    }

    /// Consume a one-byte length prefix.
    pub fn read_len(&mut self, field: &str) -> Result<usize> {
        self.data
            .read_u8()
            .map(usize::from)
            .map_err(|_| Error::TruncatedInput {
                field: field.to_string(),
                expected: 1,
                actual: 0,
            })
    }
}
