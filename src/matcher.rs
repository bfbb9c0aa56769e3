//! First-match selection among candidate layouts.

use tracing::{debug, trace};

use crate::codec::Codec;
use crate::definition::{FieldGroup, ValueGroup};
use crate::error::{Error, Result};
use crate::schema::{total_width, FieldSchema};
use crate::value::{BlobRecord, NamedRecord};

/// Errors that only mean "this candidate doesn't describe these bytes".
///
/// Truncation and everything else abort the whole match.
fn rejects_candidate(err: &Error) -> bool {
    err.is_mismatch() || matches!(err, Error::MalformedInput(_))
}

/// Compare a schema list's static width against the bytes it would cover.
fn check_width(part: &str, schemas: &[FieldSchema], bytes: &[u8]) -> Result<()> {
    match total_width(schemas) {
        Some(width) if width != bytes.len() => Err(Error::mismatch(
            part,
            format!("{} bytes", width),
            format!("{} bytes", bytes.len()),
        )),
        _ => Ok(()),
    }
}

/// Run `attempt` on each candidate in order and return the first success.
fn first_match<'g, G: 'g, T>(
    candidates: impl IntoIterator<Item = &'g G>,
    name: impl Fn(&G) -> &str,
    mut attempt: impl FnMut(&'g G) -> Result<T>,
) -> Result<T> {
    let mut tried = 0;
    for candidate in candidates {
        tried += 1;
        match attempt(candidate) {
            Ok(found) => {
                debug!(candidate = name(candidate), tried, "schema matched");
                return Ok(found);
            }
            Err(err) if rejects_candidate(&err) => {
                trace!(candidate = name(candidate), reason = %err, "candidate rejected");
            }
            Err(err) => return Err(err),
        }
    }
    debug!(tried, "no schema matched");
    Err(Error::NoMatchingSchema { candidates: tried })
}

impl Codec {
    /// Decode a key/data pair with the first group whose layout fits.
    ///
    /// A group fits when the static widths of its key and data schemas equal the byte counts,
    /// every pattern holds, and both parts are fully consumed. Groups are tried in order.
    ///
    /// If nothing fits but some group's key matched with its data too short, that shortfall is
    /// reported as [`Error::TruncatedInput`] instead of [`Error::NoMatchingSchema`].
    pub fn match_record<'g>(
        &self,
        candidates: impl IntoIterator<Item = &'g FieldGroup>,
        key: &[u8],
        data: &[u8],
    ) -> Result<NamedRecord> {
        let mut short = None;
        let found = first_match(
            candidates,
            |g: &FieldGroup| g.name.as_str(),
            |group| self.try_group(group, key, data, &mut short),
        );
        match (found, short) {
            (Err(Error::NoMatchingSchema { .. }), Some(truncated)) => {
                debug!(reason = %truncated, "known key with short data");
                Err(truncated)
            }
            (found, _) => found,
        }
    }

    /// Decode an invoke blob with the first value group that fits.
    pub fn match_blob<'g>(
        &self,
        candidates: impl IntoIterator<Item = &'g ValueGroup>,
        blob: &[u8],
    ) -> Result<BlobRecord> {
        first_match(
            candidates,
            |g: &ValueGroup| g.name.as_str(),
            |group| {
                check_width("<blob>", &group.value, blob)?;
                Ok(BlobRecord {
                    name: group.name.clone(),
                    values: self.decode_record(blob, &group.value)?,
                })
            },
        )
    }

    fn try_group(
        &self,
        group: &FieldGroup,
        key: &[u8],
        data: &[u8],
        short: &mut Option<Error>,
    ) -> Result<NamedRecord> {
        check_width("<key>", &group.key, key)?;
        let key = self.decode_record(key, &group.key)?;
        match total_width(&group.data) {
            Some(width) if width > data.len() && short.is_none() => {
                *short = Some(Error::TruncatedInput {
                    field: group.name.clone(),
                    expected: width,
                    actual: data.len(),
                });
            }
            _ => (),
        }
        check_width("<data>", &group.data, data)?;
        Ok(NamedRecord {
            name: group.name.clone(),
            key,
            data: self.decode_record(data, &group.data)?,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::schema::FieldType;
    use crate::value::Value;

    fn topic_group(name: &str, topic: &str, kind: &str, data: Vec<FieldSchema>) -> FieldGroup {
        FieldGroup::new(
            name,
            vec![
                FieldSchema::new(FieldType::VarString, "topic")
                    .byte_length(1)
                    .pattern(topic),
                FieldSchema::new(FieldType::UInt8, "kind").pattern(kind),
            ],
            data,
        )
    }

    #[test]
    fn first_fitting_group_wins() {
        let codec = Codec::default();
        let groups = vec![
            topic_group("Lock", "L", "1", vec![FieldSchema::new(FieldType::UInt8, "v")]),
            topic_group("Narrow", "T", "1", vec![FieldSchema::new(FieldType::UInt8, "v")]),
            topic_group("Wide", "T", "1", vec![FieldSchema::new(FieldType::UInt16, "v")]),
            topic_group("Also wide", "T", "1", vec![FieldSchema::new(FieldType::UInt16, "w")]),
        ];
        let record = codec.match_record(&groups, &[b'T', 1], &[5, 0]).unwrap();
        assert_eq!(record.name, "Wide");
        assert_eq!(record.key.len(), 2);
        assert_eq!(record.data[0].value, Value::UInt(5));
    }

    #[test]
    fn none_match() {
        let codec = Codec::default();
        let groups = vec![topic_group("Lock", "L", "1", vec![])];
        let err = codec.match_record(&groups, &[b'T', 1], &[]).unwrap_err();
        assert_eq!(err, Error::NoMatchingSchema { candidates: 1 });
        let empty: Vec<FieldGroup> = Vec::new();
        let err = codec.match_record(&empty, &[b'T', 1], &[]).unwrap_err();
        assert_eq!(err, Error::NoMatchingSchema { candidates: 0 });
    }

    #[test]
    fn truncation_is_fatal() {
        let codec = Codec::default();
        let prefixed = FieldGroup::new(
            "Prefixed",
            vec![FieldSchema::new(FieldType::VarString, "s").length_prefix(true)],
            vec![],
        );
        let fallback = FieldGroup::new(
            "Fallback",
            vec![
                FieldSchema::new(FieldType::UInt8, "a"),
                FieldSchema::new(FieldType::UInt8, "b"),
            ],
            vec![],
        );
        let err = codec
            .match_record(&[prefixed, fallback], &[9, 1], &[])
            .unwrap_err();
        assert!(matches!(err, Error::TruncatedInput { .. }));
    }

    #[test]
    fn short_data_under_known_key() {
        let codec = Codec::default();
        let groups = vec![
            topic_group("Lock", "L", "1", vec![FieldSchema::new(FieldType::UInt8, "v")]),
            topic_group("Rate", "T", "1", vec![FieldSchema::new(FieldType::Xfl, "rate")]),
        ];
        let err = codec
            .match_record(&groups, &[b'T', 1], &[0x55, 0x55, 0x40, 0x25])
            .unwrap_err();
        assert_eq!(
            err,
            Error::TruncatedInput {
                field: "Rate".into(),
                expected: 8,
                actual: 4
            }
        );
        // An unknown key stays a plain miss.
        let err = codec
            .match_record(&groups, &[b'X', 1], &[0x55, 0x55, 0x40, 0x25])
            .unwrap_err();
        assert_eq!(err, Error::NoMatchingSchema { candidates: 2 });
        // A later group that fits still wins over an earlier short one.
        let groups = vec![
            topic_group("Account", "T", "1", vec![FieldSchema::new(FieldType::AccountId, "a")]),
            topic_group("Rate", "T", "1", vec![FieldSchema::new(FieldType::Xfl, "rate")]),
        ];
        let data = hex::decode("0080C6A47E8D0354").unwrap();
        let record = codec.match_record(&groups, &[b'T', 1], &data).unwrap();
        assert_eq!(record.name, "Rate");
    }

    #[test]
    fn malformed_content_moves_on() {
        let codec = Codec::default();
        let as_xfl = FieldGroup::new("Rate", vec![], vec![FieldSchema::new(FieldType::Xfl, "x")]);
        let as_int = FieldGroup::new(
            "Counter",
            vec![],
            vec![FieldSchema::new(FieldType::UInt64, "n")],
        );
        let data = 7u64.to_le_bytes();
        let record = codec.match_record(&[as_xfl, as_int], &[], &data).unwrap();
        assert_eq!(record.name, "Counter");
    }

    #[test]
    fn blob_groups() {
        let codec = Codec::default();
        let groups = vec![
            ValueGroup::new("Short", vec![FieldSchema::new(FieldType::UInt8, "n")]),
            ValueGroup::new("Pair", vec![FieldSchema::new(FieldType::UInt16, "n")]),
        ];
        let record = codec.match_blob(&groups, &[1, 0]).unwrap();
        assert_eq!(record.name, "Pair");
        assert_eq!(record.values[0].value, Value::UInt(1));
    }
}
