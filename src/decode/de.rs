use serde::de::value::BorrowedStrDeserializer;
use serde::de::{
    self, DeserializeSeed, EnumAccess, Expected, IntoDeserializer, MapAccess, SeqAccess,
    VariantAccess, Visitor,
};
use serde::forward_to_deserialize_any;

use crate::encode;
use crate::error::Error;
use crate::raw;
use crate::value::{Map, Value};

type Result<T> = std::result::Result<T, Error>;

/// serde bridge from a parsed [`Value`] to a concrete target type.
///
/// Numeric coercion works on the raw lexeme: integer targets parse it in
/// base 10 and reject fractions, exponents, and overflow outright, while
/// type-erased targets collapse to `f64` the way a JSON decoder would.
pub(crate) struct ValueDeserializer {
    value: Value,
}

impl ValueDeserializer {
    pub fn new(value: Value) -> Self {
        Self { value }
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_owned(),
        Value::Bool(_) => "bool".to_owned(),
        Value::Number(n) => format!("number {n}"),
        Value::String(_) => "string".to_owned(),
        Value::Array(_) => "array".to_owned(),
        Value::Object(_) => "object".to_owned(),
    }
}

fn mismatch(value: &Value, exp: &dyn Expected) -> Error {
    Error::type_mismatch(format!("cannot decode {} into {}", describe(value), exp))
}

macro_rules! deserialize_integer {
    ($method:ident => $visit:ident as $ty:ty) => {
        fn $method<V>(self, visitor: V) -> Result<V::Value>
        where
            V: Visitor<'de>,
        {
            match &self.value {
                Value::Number(n) => match n.as_str().parse::<$ty>() {
                    Ok(parsed) => visitor.$visit(parsed),
                    Err(_) => Err(mismatch(&self.value, &visitor)),
                },
                Value::Null => visitor.$visit(0),
                _ => Err(mismatch(&self.value, &visitor)),
            }
        }
    };
}

macro_rules! deserialize_float {
    ($method:ident => $visit:ident as $ty:ty) => {
        fn $method<V>(self, visitor: V) -> Result<V::Value>
        where
            V: Visitor<'de>,
        {
            match &self.value {
                Value::Number(n) => match n.as_str().parse::<$ty>() {
                    // Overflow parses to an infinity; the format has no
                    // representation for it, so the value does not fit.
                    Ok(parsed) if parsed.is_finite() => visitor.$visit(parsed),
                    _ => Err(mismatch(&self.value, &visitor)),
                },
                Value::Null => visitor.$visit(0.0),
                _ => Err(mismatch(&self.value, &visitor)),
            }
        }
    };
}

impl<'de> de::Deserializer<'de> for ValueDeserializer {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        match self.value {
            Value::Null => visitor.visit_unit(),
            Value::Bool(b) => visitor.visit_bool(b),
            Value::Number(n) => match n.as_f64() {
                Some(f) if f.is_finite() => visitor.visit_f64(f),
                // A lexeme beyond the f64 range survives as its raw text.
                _ => visitor.visit_str(n.as_str()),
            },
            Value::String(s) => visitor.visit_string(s),
            Value::Array(items) => visitor.visit_seq(SeqDeserializer::new(items)),
            Value::Object(map) => visitor.visit_map(MapDeserializer::new(map)),
        }
    }

    fn deserialize_bool<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        match self.value {
            Value::Bool(b) => visitor.visit_bool(b),
            Value::Null => visitor.visit_bool(false),
            other => Err(mismatch(&other, &visitor)),
        }
    }

    deserialize_integer!(deserialize_i8 => visit_i8 as i8);
    deserialize_integer!(deserialize_i16 => visit_i16 as i16);
    deserialize_integer!(deserialize_i32 => visit_i32 as i32);
    deserialize_integer!(deserialize_i64 => visit_i64 as i64);
    deserialize_integer!(deserialize_i128 => visit_i128 as i128);
    deserialize_integer!(deserialize_u8 => visit_u8 as u8);
    deserialize_integer!(deserialize_u16 => visit_u16 as u16);
    deserialize_integer!(deserialize_u32 => visit_u32 as u32);
    deserialize_integer!(deserialize_u64 => visit_u64 as u64);
    deserialize_integer!(deserialize_u128 => visit_u128 as u128);

    deserialize_float!(deserialize_f32 => visit_f32 as f32);
    deserialize_float!(deserialize_f64 => visit_f64 as f64);

    fn deserialize_char<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.deserialize_str(visitor)
    }

    fn deserialize_str<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        match self.value {
            Value::String(s) => visitor.visit_string(s),
            Value::Null => visitor.visit_str(""),
            other => Err(mismatch(&other, &visitor)),
        }
    }

    fn deserialize_string<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.deserialize_str(visitor)
    }

    fn deserialize_bytes<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        match self.value {
            // Strings decode into byte sequences as their UTF-8 bytes.
            Value::String(s) => visitor.visit_byte_buf(s.into_bytes()),
            Value::Array(items) => visitor.visit_seq(SeqDeserializer::new(items)),
            Value::Null => visitor.visit_byte_buf(Vec::new()),
            other => Err(mismatch(&other, &visitor)),
        }
    }

    fn deserialize_byte_buf<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.deserialize_bytes(visitor)
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        match self.value {
            Value::Null => visitor.visit_none(),
            value => visitor.visit_some(ValueDeserializer::new(value)),
        }
    }

    fn deserialize_unit<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        match self.value {
            Value::Null => visitor.visit_unit(),
            other => Err(mismatch(&other, &visitor)),
        }
    }

    fn deserialize_unit_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.deserialize_unit(visitor)
    }

    fn deserialize_newtype_struct<V>(self, name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        if name == raw::TOKEN {
            // The raw-fragment hook: hand the re-serialized subtree over
            // as compact TRON text.
            return visitor.visit_string(encode::fragment_text(&self.value));
        }
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        match self.value {
            Value::Array(items) => visitor.visit_seq(SeqDeserializer::new(items)),
            Value::Null => visitor.visit_seq(SeqDeserializer::new(Vec::new())),
            other => Err(mismatch(&other, &visitor)),
        }
    }

    fn deserialize_tuple<V>(self, _len: usize, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.deserialize_seq(visitor)
    }

    fn deserialize_map<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        match self.value {
            Value::Object(map) => visitor.visit_map(MapDeserializer::new(map)),
            Value::Null => visitor.visit_map(MapDeserializer::new(Map::new())),
            other => Err(mismatch(&other, &visitor)),
        }
    }

    fn deserialize_struct<V>(
        self,
        name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        match self.value {
            Value::Object(map) => {
                visitor.visit_map(StructDeserializer::new(name, fields, map))
            }
            Value::Null => visitor.visit_map(StructDeserializer::new(name, fields, Map::new())),
            other => Err(mismatch(&other, &visitor)),
        }
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        match self.value {
            Value::String(s) => visitor.visit_enum(s.into_deserializer()),
            Value::Object(map) if map.len() == 1 => match map.into_iter().next() {
                Some((variant, value)) => {
                    visitor.visit_enum(EnumDeserializer { variant, value })
                }
                None => Err(Error::deserialize("enum object lost its entry")),
            },
            other => Err(mismatch(&other, &visitor)),
        }
    }

    fn deserialize_identifier<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.deserialize_str(visitor)
    }

    fn deserialize_ignored_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.deserialize_any(visitor)
    }
}

struct SeqDeserializer {
    iter: std::vec::IntoIter<Value>,
}

impl SeqDeserializer {
    fn new(items: Vec<Value>) -> Self {
        Self {
            iter: items.into_iter(),
        }
    }
}

impl<'de> SeqAccess<'de> for SeqDeserializer {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some(value) => seed.deserialize(ValueDeserializer::new(value)).map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        match self.iter.size_hint() {
            (lower, Some(upper)) if lower == upper => Some(upper),
            _ => None,
        }
    }
}

struct MapDeserializer {
    iter: indexmap::map::IntoIter<String, Value>,
    pending: Option<Value>,
}

impl MapDeserializer {
    fn new(map: Map) -> Self {
        Self {
            iter: map.into_iter(),
            pending: None,
        }
    }
}

impl<'de> MapAccess<'de> for MapDeserializer {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some((key, value)) => {
                self.pending = Some(value);
                seed.deserialize(MapKeyDeserializer { key }).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: DeserializeSeed<'de>,
    {
        match self.pending.take() {
            Some(value) => seed.deserialize(ValueDeserializer::new(value)),
            None => Err(Error::deserialize("map value requested before its key")),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        match self.iter.size_hint() {
            (lower, Some(upper)) if lower == upper => Some(upper),
            _ => None,
        }
    }
}

/// Converts a textual object key into the map's key type: strings pass
/// through, integer keys parse in base 10, and any other key type sees the
/// key as a plain string (its own impl decides what to do with it).
struct MapKeyDeserializer {
    key: String,
}

macro_rules! deserialize_integer_key {
    ($method:ident => $visit:ident as $ty:ty) => {
        fn $method<V>(self, visitor: V) -> Result<V::Value>
        where
            V: Visitor<'de>,
        {
            match self.key.parse::<$ty>() {
                Ok(parsed) => visitor.$visit(parsed),
                Err(_) => Err(Error::type_mismatch(format!(
                    "cannot decode object key {:?} into {}",
                    self.key, &visitor as &dyn Expected
                ))),
            }
        }
    };
}

impl<'de> de::Deserializer<'de> for MapKeyDeserializer {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_string(self.key)
    }

    deserialize_integer_key!(deserialize_i8 => visit_i8 as i8);
    deserialize_integer_key!(deserialize_i16 => visit_i16 as i16);
    deserialize_integer_key!(deserialize_i32 => visit_i32 as i32);
    deserialize_integer_key!(deserialize_i64 => visit_i64 as i64);
    deserialize_integer_key!(deserialize_i128 => visit_i128 as i128);
    deserialize_integer_key!(deserialize_u8 => visit_u8 as u8);
    deserialize_integer_key!(deserialize_u16 => visit_u16 as u16);
    deserialize_integer_key!(deserialize_u32 => visit_u32 as u32);
    deserialize_integer_key!(deserialize_u64 => visit_u64 as u64);
    deserialize_integer_key!(deserialize_u128 => visit_u128 as u128);

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_enum(self.key.into_deserializer())
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    forward_to_deserialize_any! {
        bool f32 f64 char str string bytes byte_buf option unit unit_struct
        seq tuple tuple_struct map struct identifier ignored_any
    }
}

/// Field key as the struct decoder resolved it.
enum FieldKey {
    Known(&'static str),
    Unknown(String),
}

/// MapAccess feeding a derived struct visitor.
///
/// Incoming keys are matched against the struct's field list, preferring
/// an exact hit and falling back to a case-insensitive one; when several
/// input keys land on the same field the later entry wins. Keys matching
/// nothing are passed through untouched and the visitor ignores them.
struct StructDeserializer {
    struct_name: &'static str,
    entries: std::vec::IntoIter<(FieldKey, Value)>,
    pending: Option<(Option<&'static str>, Value)>,
}

impl StructDeserializer {
    fn new(struct_name: &'static str, fields: &'static [&'static str], map: Map) -> Self {
        let mut entries: Vec<(FieldKey, Value)> = Vec::with_capacity(map.len());
        let mut slot_by_field: std::collections::HashMap<&'static str, usize> =
            std::collections::HashMap::with_capacity(fields.len());

        for (key, value) in map {
            let resolved = fields
                .iter()
                .find(|field| **field == key)
                .or_else(|| {
                    let lowered = key.to_lowercase();
                    fields.iter().find(|field| field.to_lowercase() == lowered)
                })
                .copied();

            match resolved {
                Some(field) => match slot_by_field.get(field) {
                    Some(&slot) => entries[slot].1 = value,
                    None => {
                        slot_by_field.insert(field, entries.len());
                        entries.push((FieldKey::Known(field), value));
                    }
                },
                None => entries.push((FieldKey::Unknown(key), value)),
            }
        }

        Self {
            struct_name,
            entries: entries.into_iter(),
            pending: None,
        }
    }
}

impl<'de> MapAccess<'de> for StructDeserializer {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: DeserializeSeed<'de>,
    {
        match self.entries.next() {
            Some((FieldKey::Known(field), value)) => {
                self.pending = Some((Some(field), value));
                seed.deserialize(BorrowedStrDeserializer::new(field)).map(Some)
            }
            Some((FieldKey::Unknown(key), value)) => {
                self.pending = Some((None, value));
                seed.deserialize(MapKeyDeserializer { key }).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: DeserializeSeed<'de>,
    {
        match self.pending.take() {
            Some((field, value)) => seed
                .deserialize(ValueDeserializer::new(value))
                .map_err(|err| match field {
                    Some(field) => err.in_struct_field(self.struct_name, field),
                    None => err,
                }),
            None => Err(Error::deserialize("struct value requested before its key")),
        }
    }
}

struct EnumDeserializer {
    variant: String,
    value: Value,
}

impl<'de> EnumAccess<'de> for EnumDeserializer {
    type Error = Error;
    type Variant = VariantDeserializer;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, Self::Variant)>
    where
        V: DeserializeSeed<'de>,
    {
        let variant = seed.deserialize(MapKeyDeserializer { key: self.variant })?;
        Ok((variant, VariantDeserializer { value: self.value }))
    }
}

struct VariantDeserializer {
    value: Value,
}

impl<'de> VariantAccess<'de> for VariantDeserializer {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        match self.value {
            Value::Null => Ok(()),
            other => Err(Error::type_mismatch(format!(
                "cannot decode {} into unit variant",
                describe(&other)
            ))),
        }
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value>
    where
        T: DeserializeSeed<'de>,
    {
        seed.deserialize(ValueDeserializer::new(self.value))
    }

    fn tuple_variant<V>(self, _len: usize, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        match self.value {
            Value::Array(items) => visitor.visit_seq(SeqDeserializer::new(items)),
            other => Err(Error::type_mismatch(format!(
                "cannot decode {} into tuple variant",
                describe(&other)
            ))),
        }
    }

    fn struct_variant<V>(self, fields: &'static [&'static str], visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        match self.value {
            Value::Object(map) => visitor.visit_map(StructDeserializer::new("", fields, map)),
            other => Err(Error::type_mismatch(format!(
                "cannot decode {} into struct variant",
                describe(&other)
            ))),
        }
    }
}
