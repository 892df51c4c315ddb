//! Loosely typed representation of a parsed TRON document.
//!
//! [`Value`] is what [`parse_str`](crate::parse_str) returns and what the
//! serde bridge decodes from. Its numbers are [`Number`]s carrying the raw
//! decimal lexeme: nothing is converted to a binary representation until a
//! concrete target type asks for one, which is how 64-bit and larger
//! integers survive a round trip intact.

use std::fmt;

use indexmap::IndexMap;
use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use smol_str::SmolStr;

use crate::num;

/// Insertion-ordered object representation.
pub type Map = IndexMap<String, Value>;

/// Any TRON value.
///
/// Class instantiations do not appear here: the parser resolves
/// `Name(a,b)` into an [`Value::Object`] with the class keys in definition
/// order, so consumers never see the constructor form.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<Value>),
    Object(Map),
}

/// A number kept as its unparsed decimal lexeme.
///
/// Equality is lexeme equality: `1e3` and `1000` are different `Number`s
/// even though they denote the same quantity.
#[derive(Clone, PartialEq, Eq)]
pub struct Number {
    lexeme: SmolStr,
}

impl Number {
    /// Wraps a lexeme the tokenizer has already validated against the JSON
    /// number grammar.
    pub(crate) fn from_lexeme(lexeme: SmolStr) -> Self {
        Self { lexeme }
    }

    /// Builds a number from a finite float. Returns `None` for NaN and
    /// infinities, which the format rejects.
    pub fn from_f64(value: f64) -> Option<Self> {
        num::f64_lexeme(value).map(|lexeme| Self { lexeme })
    }

    /// See [`Number::from_f64`].
    pub fn from_f32(value: f32) -> Option<Self> {
        num::f32_lexeme(value).map(|lexeme| Self { lexeme })
    }

    /// The raw decimal lexeme.
    pub fn as_str(&self) -> &str {
        &self.lexeme
    }

    /// Interprets the lexeme as `i64`. Lexemes carrying a fraction or
    /// exponent never qualify, even when the denoted value is integral.
    pub fn as_i64(&self) -> Option<i64> {
        self.lexeme.parse().ok()
    }

    /// Interprets the lexeme as `u64`, under the same strictness as
    /// [`Number::as_i64`].
    pub fn as_u64(&self) -> Option<u64> {
        self.lexeme.parse().ok()
    }

    /// Interprets the lexeme as `f64`. Values beyond the `f64` range come
    /// back as infinities.
    pub fn as_f64(&self) -> Option<f64> {
        self.lexeme.parse().ok()
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lexeme)
    }
}

impl fmt::Debug for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Number({})", self.lexeme)
    }
}

macro_rules! number_from_int {
    ($($ty:ty)*) => {
        $(
            impl From<$ty> for Number {
                fn from(value: $ty) -> Self {
                    Self { lexeme: num::int_lexeme(value) }
                }
            }

            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::Number(Number::from(value))
                }
            }
        )*
    };
}

number_from_int!(i8 i16 i32 i64 i128 u8 u16 u32 u64 u128);

impl Value {
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<&Number> {
        match self {
            Value::Number(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_number().and_then(Number::as_i64)
    }

    pub fn as_u64(&self) -> Option<u64> {
        self.as_number().and_then(Number::as_u64)
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.as_number().and_then(Number::as_f64)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Map> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Looks up an object entry by key. Returns `None` for non-objects.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_object().and_then(|map| map.get(key))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::Array(value)
    }
}

impl From<Map> for Value {
    fn from(value: Map) -> Self {
        Value::Object(value)
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    serializer.serialize_i64(i)
                } else if let Some(u) = n.as_u64() {
                    serializer.serialize_u64(u)
                } else {
                    match n.as_f64() {
                        Some(f) => serializer.serialize_f64(f),
                        None => Err(serde::ser::Error::custom(format!(
                            "unrepresentable number lexeme {n}"
                        ))),
                    }
                }
            }
            Value::String(s) => serializer.serialize_str(s),
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Object(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (key, value) in map {
                    out.serialize_entry(key, value)?;
                }
                out.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ValueVisitor;

        impl<'de> Visitor<'de> for ValueVisitor {
            type Value = Value;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a TRON value")
            }

            fn visit_unit<E>(self) -> Result<Value, E> {
                Ok(Value::Null)
            }

            fn visit_none<E>(self) -> Result<Value, E> {
                Ok(Value::Null)
            }

            fn visit_some<D>(self, deserializer: D) -> Result<Value, D::Error>
            where
                D: Deserializer<'de>,
            {
                Deserialize::deserialize(deserializer)
            }

            fn visit_bool<E>(self, value: bool) -> Result<Value, E> {
                Ok(Value::Bool(value))
            }

            fn visit_i64<E>(self, value: i64) -> Result<Value, E> {
                Ok(Value::Number(Number::from(value)))
            }

            fn visit_i128<E>(self, value: i128) -> Result<Value, E> {
                Ok(Value::Number(Number::from(value)))
            }

            fn visit_u64<E>(self, value: u64) -> Result<Value, E> {
                Ok(Value::Number(Number::from(value)))
            }

            fn visit_u128<E>(self, value: u128) -> Result<Value, E> {
                Ok(Value::Number(Number::from(value)))
            }

            fn visit_f64<E>(self, value: f64) -> Result<Value, E>
            where
                E: de::Error,
            {
                Number::from_f64(value)
                    .map(Value::Number)
                    .ok_or_else(|| E::custom(format!("non-finite float {value}")))
            }

            fn visit_str<E>(self, value: &str) -> Result<Value, E> {
                Ok(Value::String(value.to_owned()))
            }

            fn visit_string<E>(self, value: String) -> Result<Value, E> {
                Ok(Value::String(value))
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(item) = seq.next_element()? {
                    items.push(item);
                }
                Ok(Value::Array(items))
            }

            fn visit_map<A>(self, mut map: A) -> Result<Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut out = Map::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, value)) = map.next_entry()? {
                    out.insert(key, value);
                }
                Ok(Value::Object(out))
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_coercions_are_lexeme_strict() {
        let n = Number::from(9223372036854775807i64);
        assert_eq!(n.as_i64(), Some(i64::MAX));
        assert_eq!(n.as_str(), "9223372036854775807");

        let frac = Number::from_f64(1.5).unwrap();
        assert_eq!(frac.as_i64(), None);
        assert_eq!(frac.as_f64(), Some(1.5));

        let exp = Number::from_lexeme(SmolStr::new("1e3"));
        assert_eq!(exp.as_i64(), None);
        assert_eq!(exp.as_f64(), Some(1000.0));
    }

    #[test]
    fn negative_zero_lexeme() {
        let n = Number::from_lexeme(SmolStr::new("-0"));
        assert_eq!(n.as_i64(), Some(0));
        assert_eq!(n.as_u64(), None);
    }

    #[test]
    fn accessors() {
        let mut map = Map::new();
        map.insert("a".to_owned(), Value::from(1u8));
        let value = Value::from(map);
        assert_eq!(value.get("a").and_then(Value::as_i64), Some(1));
        assert_eq!(value.get("missing"), None);
        assert!(Value::Null.is_null());
        assert_eq!(Value::from("x").as_str(), Some("x"));
    }
}
