use std::fmt;

use serde::de::{Expected, Unexpected};

/// Broad classification of a codec failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input, including any of the hardening limits being hit.
    Syntax,
    /// Structurally valid value that is not assignable to the target type.
    TypeMismatch,
    /// Host type the format cannot represent (for example a non-string,
    /// non-integer map key).
    UnsupportedType,
    /// Representable type with an invalid instance (NaN, infinity).
    UnsupportedValue,
    /// Failure raised by a `Serialize` implementation.
    Serialize,
    /// Failure raised by a `Deserialize` implementation.
    Deserialize,
}

/// Position of a decode failure within the input.
///
/// `offset` counts bytes from the start of the input, so multibyte code
/// points advance it by their encoded length. `line` and `column` are
/// one-based; columns count code points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

/// The error type for every fallible operation in this crate.
#[derive(Debug, Clone)]
pub struct Error {
    kind: ErrorKind,
    message: String,
    location: Option<Location>,
}

impl Error {
    pub(crate) fn syntax(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Syntax,
            message: message.into(),
            location: None,
        }
    }

    pub(crate) fn syntax_at(message: impl Into<String>, location: Location) -> Self {
        Self {
            kind: ErrorKind::Syntax,
            message: message.into(),
            location: Some(location),
        }
    }

    pub(crate) fn type_mismatch(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::TypeMismatch,
            message: message.into(),
            location: None,
        }
    }

    pub(crate) fn unsupported_type(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::UnsupportedType,
            message: message.into(),
            location: None,
        }
    }

    pub(crate) fn unsupported_value(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::UnsupportedValue,
            message: message.into(),
            location: None,
        }
    }

    pub(crate) fn serialize(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Serialize,
            message: message.into(),
            location: None,
        }
    }

    pub(crate) fn deserialize(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Deserialize,
            message: message.into(),
            location: None,
        }
    }

    /// Wraps a field-level decode failure with its struct and field names.
    pub(crate) fn in_struct_field(mut self, struct_name: &str, field: &str) -> Self {
        self.message = if struct_name.is_empty() {
            format!("{} (decoding field {field})", self.message)
        } else {
            format!(
                "{} (decoding struct {struct_name} field {field})",
                self.message
            )
        };
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Input position of the failure, when the error came from the
    /// tokenizer or parser.
    pub fn location(&self) -> Option<Location> {
        self.location
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some(loc) => write!(
                f,
                "{} at line {}, column {} (byte {})",
                self.message, loc.line, loc.column, loc.offset
            ),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for Error {}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::serialize(msg.to_string())
    }
}

impl serde::de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::deserialize(msg.to_string())
    }

    fn invalid_type(unexp: Unexpected<'_>, exp: &dyn Expected) -> Self {
        Error::type_mismatch(format!("cannot decode {unexp} into {exp}"))
    }

    fn invalid_value(unexp: Unexpected<'_>, exp: &dyn Expected) -> Self {
        Error::type_mismatch(format!("invalid value {unexp}, expected {exp}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_location() {
        let err = Error::syntax_at(
            "unexpected token",
            Location {
                offset: 7,
                line: 2,
                column: 3,
            },
        );
        assert_eq!(
            err.to_string(),
            "unexpected token at line 2, column 3 (byte 7)"
        );
        assert_eq!(err.kind(), ErrorKind::Syntax);
        assert_eq!(err.location().map(|l| l.offset), Some(7));
    }

    #[test]
    fn display_without_location() {
        let err = Error::type_mismatch("cannot decode bool into i64");
        assert_eq!(err.to_string(), "cannot decode bool into i64");
        assert!(err.location().is_none());
    }
}
