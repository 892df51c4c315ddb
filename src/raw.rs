//! Verbatim TRON fragments.

use std::fmt;

use serde::de::{Deserialize, Deserializer, Visitor};
use serde::ser::{Serialize, Serializer};

use crate::decode;
use crate::Result;

/// Marker name that routes [`RawTron`] through the codec's private
/// newtype protocol instead of the ordinary string path.
pub(crate) const TOKEN: &str = "$serde_tron::private::RawTron";

/// An owned, syntax-checked TRON fragment.
///
/// Serializing a `RawTron` with this crate splices its text into the
/// output verbatim, which is the raw-marshal hook: a type can produce its
/// own TRON by serializing one of these. Deserializing into a `RawTron`
/// is the matching unmarshal hook: the decoder re-serializes whatever
/// subtree it matched to compact TRON and stores the text.
///
/// Fragments must be self-contained values. Class definitions are
/// rejected at construction because a header cannot be spliced into the
/// middle of another document.
///
/// ```rust
/// use serde::Serialize;
/// use serde_tron::RawTron;
///
/// #[derive(Serialize)]
/// struct Payload {
///     id: u32,
///     body: RawTron,
/// }
///
/// let payload = Payload {
///     id: 7,
///     body: RawTron::from_string("[1,2,3]".to_owned())?,
/// };
/// assert_eq!(serde_tron::to_string(&payload)?, r#"{"id":7,"body":[1,2,3]}"#);
/// # Ok::<(), serde_tron::Error>(())
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawTron {
    tron: Box<str>,
}

impl RawTron {
    /// Validates and wraps a fragment. The text must parse as a single
    /// value with no class header.
    pub fn from_string(tron: String) -> Result<Self> {
        decode::parse_fragment(&tron)?;
        Ok(Self { tron: tron.into() })
    }

    /// The fragment text.
    pub fn get(&self) -> &str {
        &self.tron
    }
}

impl fmt::Display for RawTron {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tron)
    }
}

impl Serialize for RawTron {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_newtype_struct(TOKEN, &RawText(&self.tron))
    }
}

/// Inner payload of the newtype protocol. Foreign serializers see an
/// ordinary string here.
struct RawText<'a>(&'a str);

impl Serialize for RawText<'_> {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.0)
    }
}

impl<'de> Deserialize<'de> for RawTron {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_newtype_struct(TOKEN, RawTronVisitor)
    }
}

struct RawTronVisitor;

impl Visitor<'_> for RawTronVisitor {
    type Value = RawTron;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a TRON fragment")
    }

    fn visit_str<E>(self, v: &str) -> std::result::Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Ok(RawTron {
            tron: v.to_owned().into(),
        })
    }

    fn visit_string<E>(self, v: String) -> std::result::Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Ok(RawTron { tron: v.into() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_on_construction() {
        assert!(RawTron::from_string("[1,2,".to_owned()).is_err());
        assert!(RawTron::from_string("class A: x\n\nA(1)".to_owned()).is_err());
        let raw = RawTron::from_string("{\"a\":1}".to_owned()).unwrap();
        assert_eq!(raw.get(), "{\"a\":1}");
    }
}
