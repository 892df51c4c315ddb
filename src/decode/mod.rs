//! Decoding pipeline: bytes → tokens → value tree → host type.

pub(crate) mod de;
pub(crate) mod parser;
pub(crate) mod tokenizer;

use std::io::Read;

use serde::de::DeserializeOwned;

use crate::error::{Error, Location};
use crate::value::Value;
use crate::Result;

/// Decodes a TRON document into any `Deserialize` target.
pub fn from_str<T: DeserializeOwned>(input: &str) -> Result<T> {
    let value = parse_str(input)?;
    T::deserialize(de::ValueDeserializer::new(value))
}

/// Like [`from_str`], validating the bytes as UTF-8 first. Invalid bytes
/// are a syntax error at their byte offset; no replacement characters are
/// substituted.
pub fn from_slice<T: DeserializeOwned>(input: &[u8]) -> Result<T> {
    from_str(utf8_input(input)?)
}

/// Reads a whole stream, then decodes it. The input-size limit still
/// applies to what was read.
pub fn from_reader<T: DeserializeOwned, R: Read>(mut reader: R) -> Result<T> {
    let mut buffer = Vec::new();
    reader
        .read_to_end(&mut buffer)
        .map_err(|err| Error::deserialize(format!("read failed: {err}")))?;
    from_slice(&buffer)
}

/// Parses a document into the loosely typed [`Value`] tree. Numbers keep
/// their raw lexemes; class instantiations come back as plain objects.
pub fn parse_str(input: &str) -> Result<Value> {
    let tokens = tokenizer::tokenize(input)?;
    parser::Parser::new(tokens).parse()
}

/// Checks that the input is a well-formed document without materializing a
/// host value.
pub fn validate_str(input: &str) -> Result<()> {
    parse_str(input).map(|_| ())
}

/// Parses a raw fragment destined for verbatim splicing. Fragments must be
/// self-contained values: a class header would not survive being embedded
/// in another document.
pub(crate) fn parse_fragment(input: &str) -> Result<Value> {
    let tokens = tokenizer::tokenize(input)?;
    let (value, classes) = parser::Parser::new(tokens).parse_with_classes()?;
    if !classes.is_empty() {
        return Err(Error::syntax(
            "raw fragment must not contain class definitions",
        ));
    }
    Ok(value)
}

fn utf8_input(input: &[u8]) -> Result<&str> {
    std::str::from_utf8(input).map_err(|err| {
        let offset = err.valid_up_to();
        let valid = &input[..offset];
        let line = valid.iter().filter(|&&b| b == b'\n').count() + 1;
        let column = match valid.iter().rposition(|&b| b == b'\n') {
            // The valid prefix is complete UTF-8, so counting code points
            // in it is sound.
            Some(pos) => String::from_utf8_lossy(&valid[pos + 1..]).chars().count() + 1,
            None => String::from_utf8_lossy(valid).chars().count() + 1,
        };
        Error::syntax_at("invalid UTF-8", Location { offset, line, column })
    })
}
