//! Serde-based encoder/decoder for TRON (Token Reduced Object Notation).
//!
//! TRON extends the JSON value grammar with a header of reusable class
//! definitions, so arrays of objects sharing a schema encode as positional
//! constructor calls instead of repeating every key.
//!
//! # Examples
//!
//! Encoding an array of same-shaped structs produces a class header:
//!
//! ```rust
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct User {
//!     name: String,
//!     age: u32,
//! }
//!
//! let users = vec![
//!     User { name: "Alice".to_owned(), age: 30 },
//!     User { name: "Bob".to_owned(), age: 25 },
//! ];
//! let tron = serde_tron::to_string(&users)?;
//! assert_eq!(tron, "class A: name,age\n\n[A(\"Alice\",30),A(\"Bob\",25)]");
//! # Ok::<(), serde_tron::Error>(())
//! ```
//!
//! Decoding accepts the constructor form back, plus plain JSON and
//! brace-less `key: value` pairs at the document root:
//!
//! ```rust
//! use serde::Deserialize;
//!
//! #[derive(Debug, Deserialize, PartialEq)]
//! struct User {
//!     name: String,
//!     age: u32,
//! }
//!
//! let users: Vec<User> =
//!     serde_tron::from_str("class A: name,age\n\n[A(\"Alice\",30)]")?;
//! assert_eq!(users, vec![User { name: "Alice".to_owned(), age: 30 }]);
//!
//! let user: User = serde_tron::from_str("name: \"Ada\"\nage: 37\n")?;
//! assert_eq!(user, User { name: "Ada".to_owned(), age: 37 });
//! # Ok::<(), serde_tron::Error>(())
//! ```
//!
//! Untyped documents parse into a [`Value`] tree that keeps numbers as
//! their raw lexemes, so 64-bit integers survive intact:
//!
//! ```rust
//! let value = serde_tron::parse_str("9223372036854775807")?;
//! assert_eq!(value.as_i64(), Some(9223372036854775807));
//! # Ok::<(), serde_tron::Error>(())
//! ```

mod decode;
mod encode;
mod error;
pub mod limits;
mod num;
mod raw;
mod text;
mod value;

use std::io::Write;

use serde::Serialize;

pub use crate::decode::{from_reader, from_slice, from_str, parse_str, validate_str};
pub use crate::error::{Error, ErrorKind, Location};
pub use crate::raw::RawTron;
pub use crate::value::{Map, Number, Value};

pub type Result<T> = std::result::Result<T, Error>;

/// Encodes a value as compact TRON text.
pub fn to_string<T: Serialize>(value: &T) -> Result<String> {
    bytes_to_string(encode::to_vec(value)?)
}

/// Encodes a value as compact TRON bytes.
pub fn to_vec<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    encode::to_vec(value)
}

/// Like [`to_string`], accepting an indentation prefix and unit. Both
/// parameters are reserved for a future pretty printer; the current
/// output is compact regardless.
pub fn to_string_pretty<T: Serialize>(value: &T, prefix: &str, indent: &str) -> Result<String> {
    bytes_to_string(encode::to_vec_indent(value, prefix, indent)?)
}

/// See [`to_string_pretty`].
pub fn to_vec_pretty<T: Serialize>(value: &T, prefix: &str, indent: &str) -> Result<Vec<u8>> {
    encode::to_vec_indent(value, prefix, indent)
}

/// Encodes a value and writes the bytes out.
pub fn to_writer<T: Serialize, W: Write>(mut writer: W, value: &T) -> Result<()> {
    let bytes = encode::to_vec(value)?;
    writer
        .write_all(&bytes)
        .map_err(|err| Error::serialize(format!("write failed: {err}")))
}

fn bytes_to_string(bytes: Vec<u8>) -> Result<String> {
    debug_assert!(std::str::from_utf8(&bytes).is_ok());
    // The emitter only ever appends valid UTF-8.
    Ok(unsafe { String::from_utf8_unchecked(bytes) })
}
