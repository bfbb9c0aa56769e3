use std::fmt;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    /// A pattern or structural requirement of a schema was not met by the bytes. This is the
    /// expected outcome when trying a non-matching candidate, and the matcher moves on to the next
    /// one.
    SchemaMismatch {
        field: String,
        expected: String,
        actual: String,
    },
    /// The input ran out before the schema was satisfied.
    TruncatedInput {
        field: String,
        expected: usize,
        actual: usize,
    },
    /// Bytes or text that can never be a valid encoding (bad hex, non-canonical XFL, invalid
    /// UTF-8).
    MalformedInput(String),
    /// A value cannot be represented by the target type.
    OutOfRange(String),
    /// An account address failed its alphabet, length, version, or checksum check.
    InvalidAddress(String),
    /// An argument referenced by a schema was not supplied.
    MissingArgument(String),
    /// A supplied argument has the wrong shape for the type it is encoded as.
    TypeMismatch {
        argument: String,
        expected: String,
        actual: String,
    },
    /// None of the candidate field-groups matched.
    NoMatchingSchema { candidates: usize },
    /// A schema or operation definition violates its own invariants.
    BadSchema(String),
}

impl Error {
    /// True for the soft failure that only rejects one candidate schema.
    pub fn is_mismatch(&self) -> bool {
        matches!(self, Error::SchemaMismatch { .. })
    }

    pub(crate) fn mismatch(
        field: &str,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Error::SchemaMismatch {
            field: field.to_string(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub(crate) fn type_mismatch(
        argument: &str,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Error::TypeMismatch {
            argument: argument.to_string(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::SchemaMismatch {
                ref field,
                ref expected,
                ref actual,
            } => write!(
                f,
                "Schema mismatch on `{}`: expected {}, got {}",
                field, expected, actual
            ),
            Error::TruncatedInput {
                ref field,
                expected,
                actual,
            } => write!(
                f,
                "Input truncated at `{}`: needed {} bytes, only {} remain",
                field, expected, actual
            ),
            Error::MalformedInput(ref err) => write!(f, "Malformed input: {}", err),
            Error::OutOfRange(ref err) => write!(f, "Value out of range: {}", err),
            Error::InvalidAddress(ref err) => write!(f, "Invalid account address: {}", err),
            Error::MissingArgument(ref arg) => write!(f, "Missing argument `{}`", arg),
            Error::TypeMismatch {
                ref argument,
                ref expected,
                ref actual,
            } => write!(
                f,
                "Argument `{}` has the wrong type: expected {}, got {}",
                argument, expected, actual
            ),
            Error::NoMatchingSchema { candidates } => write!(
                f,
                "No schema matched (tried {} candidates)",
                candidates
            ),
            Error::BadSchema(ref err) => write!(f, "Bad schema definition: {}", err),
        }
    }
}

impl std::error::Error for Error {}

impl From<hex::FromHexError> for Error {
    fn from(e: hex::FromHexError) -> Self {
        Error::MalformedInput(format!("invalid hex: {}", e))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn only_mismatch_is_soft() {
        assert!(Error::mismatch("topic", "\"T\"", "\"L\"").is_mismatch());
        let hard = Error::TruncatedInput {
            field: "Account".into(),
            expected: 20,
            actual: 3,
        };
        assert!(!hard.is_mismatch());
        assert!(!Error::NoMatchingSchema { candidates: 2 }.is_mismatch());
    }

    #[test]
    fn display() {
        let err = Error::TruncatedInput {
            field: "Account".into(),
            expected: 20,
            actual: 3,
        };
        assert_eq!(
            err.to_string(),
            "Input truncated at `Account`: needed 20 bytes, only 3 remain"
        );
        let err: Error = hex::decode("zz").unwrap_err().into();
        assert!(matches!(err, Error::MalformedInput(_)));
    }
}
