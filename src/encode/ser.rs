use serde::ser::{self, Impossible, Serialize};

use crate::error::Error;
use crate::limits;
use crate::num;
use crate::raw;
use crate::value::Number;

type Result<T> = std::result::Result<T, Error>;

/// Intermediate encode tree.
///
/// Unlike the parsed [`Value`](crate::Value), this keeps struct-vs-map
/// provenance: only `Struct` nodes are class candidates, and only `Map`
/// entries get sorted at emission.
pub(crate) enum Node {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    /// Verbatim fragment from the raw-marshal hook.
    Raw(String),
    Array(Vec<Node>),
    Map(Vec<(String, Node)>),
    Struct(Vec<(&'static str, Node)>),
}

/// Builds a [`Node`] tree from any `Serialize` value, enforcing the walk
/// depth limit as it descends.
pub(crate) struct NodeSerializer {
    depth: usize,
}

impl NodeSerializer {
    pub fn new() -> Self {
        Self { depth: 0 }
    }

    fn at(depth: usize) -> Self {
        Self { depth }
    }

    fn descend(&self, levels: usize) -> Result<usize> {
        let depth = self.depth + levels;
        if depth > limits::max_walk_depth() {
            return Err(Error::serialize(
                "maximum walk depth exceeded (deeply nested or circular structure)",
            ));
        }
        Ok(depth)
    }
}

impl ser::Serializer for NodeSerializer {
    type Ok = Node;
    type Error = Error;

    type SerializeSeq = SeqBuilder;
    type SerializeTuple = SeqBuilder;
    type SerializeTupleStruct = SeqBuilder;
    type SerializeTupleVariant = VariantSeqBuilder;
    type SerializeMap = MapBuilder;
    type SerializeStruct = StructBuilder;
    type SerializeStructVariant = VariantStructBuilder;

    fn serialize_bool(self, v: bool) -> Result<Node> {
        Ok(Node::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<Node> {
        Ok(Node::Number(Number::from(v)))
    }

    fn serialize_i16(self, v: i16) -> Result<Node> {
        Ok(Node::Number(Number::from(v)))
    }

    fn serialize_i32(self, v: i32) -> Result<Node> {
        Ok(Node::Number(Number::from(v)))
    }

    fn serialize_i64(self, v: i64) -> Result<Node> {
        Ok(Node::Number(Number::from(v)))
    }

    fn serialize_i128(self, v: i128) -> Result<Node> {
        Ok(Node::Number(Number::from(v)))
    }

    fn serialize_u8(self, v: u8) -> Result<Node> {
        Ok(Node::Number(Number::from(v)))
    }

    fn serialize_u16(self, v: u16) -> Result<Node> {
        Ok(Node::Number(Number::from(v)))
    }

    fn serialize_u32(self, v: u32) -> Result<Node> {
        Ok(Node::Number(Number::from(v)))
    }

    fn serialize_u64(self, v: u64) -> Result<Node> {
        Ok(Node::Number(Number::from(v)))
    }

    fn serialize_u128(self, v: u128) -> Result<Node> {
        Ok(Node::Number(Number::from(v)))
    }

    fn serialize_f32(self, v: f32) -> Result<Node> {
        match Number::from_f32(v) {
            Some(n) => Ok(Node::Number(n)),
            None => Err(Error::unsupported_value(format!("unsupported value: {v}"))),
        }
    }

    fn serialize_f64(self, v: f64) -> Result<Node> {
        match Number::from_f64(v) {
            Some(n) => Ok(Node::Number(n)),
            None => Err(Error::unsupported_value(format!("unsupported value: {v}"))),
        }
    }

    fn serialize_char(self, v: char) -> Result<Node> {
        Ok(Node::String(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<Node> {
        Ok(Node::String(v.to_owned()))
    }

    /// Byte sequences encode as UTF-8 text; invalid bytes are coerced with
    /// replacement characters.
    fn serialize_bytes(self, v: &[u8]) -> Result<Node> {
        Ok(Node::String(String::from_utf8_lossy(v).into_owned()))
    }

    fn serialize_none(self) -> Result<Node> {
        Ok(Node::Null)
    }

    fn serialize_some<T>(self, value: &T) -> Result<Node>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Node> {
        Ok(Node::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Node> {
        Ok(Node::Null)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Node> {
        Ok(Node::String(variant.to_owned()))
    }

    fn serialize_newtype_struct<T>(self, name: &'static str, value: &T) -> Result<Node>
    where
        T: ?Sized + Serialize,
    {
        if name == raw::TOKEN {
            return value.serialize(RawCapture);
        }
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Node>
    where
        T: ?Sized + Serialize,
    {
        let depth = self.descend(1)?;
        let inner = value.serialize(NodeSerializer::at(depth))?;
        Ok(Node::Map(vec![(variant.to_owned(), inner)]))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SeqBuilder> {
        let depth = self.descend(1)?;
        Ok(SeqBuilder {
            depth,
            items: Vec::with_capacity(len.unwrap_or(0)),
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<SeqBuilder> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> Result<SeqBuilder> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<VariantSeqBuilder> {
        let depth = self.descend(2)?;
        Ok(VariantSeqBuilder {
            variant,
            depth,
            items: Vec::with_capacity(len),
        })
    }

    fn serialize_map(self, len: Option<usize>) -> Result<MapBuilder> {
        let depth = self.descend(1)?;
        Ok(MapBuilder {
            depth,
            entries: Vec::with_capacity(len.unwrap_or(0)),
            pending_key: None,
        })
    }

    fn serialize_struct(self, _name: &'static str, len: usize) -> Result<StructBuilder> {
        let depth = self.descend(1)?;
        Ok(StructBuilder {
            depth,
            fields: Vec::with_capacity(len),
        })
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<VariantStructBuilder> {
        let depth = self.descend(2)?;
        Ok(VariantStructBuilder {
            variant,
            depth,
            fields: Vec::with_capacity(len),
        })
    }
}

pub(crate) struct SeqBuilder {
    depth: usize,
    items: Vec<Node>,
}

impl ser::SerializeSeq for SeqBuilder {
    type Ok = Node;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.items.push(value.serialize(NodeSerializer::at(self.depth))?);
        Ok(())
    }

    fn end(self) -> Result<Node> {
        Ok(Node::Array(self.items))
    }
}

impl ser::SerializeTuple for SeqBuilder {
    type Ok = Node;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Node> {
        ser::SerializeSeq::end(self)
    }
}

impl ser::SerializeTupleStruct for SeqBuilder {
    type Ok = Node;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Node> {
        ser::SerializeSeq::end(self)
    }
}

pub(crate) struct VariantSeqBuilder {
    variant: &'static str,
    depth: usize,
    items: Vec<Node>,
}

impl ser::SerializeTupleVariant for VariantSeqBuilder {
    type Ok = Node;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.items.push(value.serialize(NodeSerializer::at(self.depth))?);
        Ok(())
    }

    fn end(self) -> Result<Node> {
        Ok(Node::Map(vec![(
            self.variant.to_owned(),
            Node::Array(self.items),
        )]))
    }
}

pub(crate) struct MapBuilder {
    depth: usize,
    entries: Vec<(String, Node)>,
    pending_key: Option<String>,
}

impl ser::SerializeMap for MapBuilder {
    type Ok = Node;
    type Error = Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.pending_key = Some(key.serialize(MapKeySerializer)?);
        Ok(())
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let key = self
            .pending_key
            .take()
            .ok_or_else(|| Error::serialize("map value serialized before its key"))?;
        let value = value.serialize(NodeSerializer::at(self.depth))?;
        self.entries.push((key, value));
        Ok(())
    }

    fn end(self) -> Result<Node> {
        Ok(Node::Map(self.entries))
    }
}

pub(crate) struct StructBuilder {
    depth: usize,
    fields: Vec<(&'static str, Node)>,
}

impl ser::SerializeStruct for StructBuilder {
    type Ok = Node;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.fields
            .push((key, value.serialize(NodeSerializer::at(self.depth))?));
        Ok(())
    }

    fn end(self) -> Result<Node> {
        Ok(Node::Struct(self.fields))
    }
}

pub(crate) struct VariantStructBuilder {
    variant: &'static str,
    depth: usize,
    fields: Vec<(&'static str, Node)>,
}

impl ser::SerializeStructVariant for VariantStructBuilder {
    type Ok = Node;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.fields
            .push((key, value.serialize(NodeSerializer::at(self.depth))?));
        Ok(())
    }

    fn end(self) -> Result<Node> {
        Ok(Node::Map(vec![(
            self.variant.to_owned(),
            Node::Struct(self.fields),
        )]))
    }
}

/// Stringifies map keys. Strings and chars pass through, integers print in
/// decimal, and anything that serializes itself as a string (the text hook)
/// works transparently; other key shapes are unsupported.
struct MapKeySerializer;

fn key_error(kind: &str) -> Error {
    Error::unsupported_type(format!("map key must be a string or integer, got {kind}"))
}

impl ser::Serializer for MapKeySerializer {
    type Ok = String;
    type Error = Error;

    type SerializeSeq = Impossible<String, Error>;
    type SerializeTuple = Impossible<String, Error>;
    type SerializeTupleStruct = Impossible<String, Error>;
    type SerializeTupleVariant = Impossible<String, Error>;
    type SerializeMap = Impossible<String, Error>;
    type SerializeStruct = Impossible<String, Error>;
    type SerializeStructVariant = Impossible<String, Error>;

    fn serialize_str(self, v: &str) -> Result<String> {
        Ok(v.to_owned())
    }

    fn serialize_char(self, v: char) -> Result<String> {
        Ok(v.to_string())
    }

    fn serialize_i8(self, v: i8) -> Result<String> {
        Ok(num::int_lexeme(v).to_string())
    }

    fn serialize_i16(self, v: i16) -> Result<String> {
        Ok(num::int_lexeme(v).to_string())
    }

    fn serialize_i32(self, v: i32) -> Result<String> {
        Ok(num::int_lexeme(v).to_string())
    }

    fn serialize_i64(self, v: i64) -> Result<String> {
        Ok(num::int_lexeme(v).to_string())
    }

    fn serialize_i128(self, v: i128) -> Result<String> {
        Ok(num::int_lexeme(v).to_string())
    }

    fn serialize_u8(self, v: u8) -> Result<String> {
        Ok(num::int_lexeme(v).to_string())
    }

    fn serialize_u16(self, v: u16) -> Result<String> {
        Ok(num::int_lexeme(v).to_string())
    }

    fn serialize_u32(self, v: u32) -> Result<String> {
        Ok(num::int_lexeme(v).to_string())
    }

    fn serialize_u64(self, v: u64) -> Result<String> {
        Ok(num::int_lexeme(v).to_string())
    }

    fn serialize_u128(self, v: u128) -> Result<String> {
        Ok(num::int_lexeme(v).to_string())
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<String> {
        Ok(variant.to_owned())
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<String>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_bool(self, _v: bool) -> Result<String> {
        Err(key_error("bool"))
    }

    fn serialize_f32(self, _v: f32) -> Result<String> {
        Err(key_error("float"))
    }

    fn serialize_f64(self, _v: f64) -> Result<String> {
        Err(key_error("float"))
    }

    fn serialize_bytes(self, _v: &[u8]) -> Result<String> {
        Err(key_error("bytes"))
    }

    fn serialize_none(self) -> Result<String> {
        Err(key_error("null"))
    }

    fn serialize_some<T>(self, _value: &T) -> Result<String>
    where
        T: ?Sized + Serialize,
    {
        Err(key_error("option"))
    }

    fn serialize_unit(self) -> Result<String> {
        Err(key_error("null"))
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<String> {
        Err(key_error("null"))
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<String>
    where
        T: ?Sized + Serialize,
    {
        Err(key_error("enum"))
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq> {
        Err(key_error("array"))
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple> {
        Err(key_error("array"))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        Err(key_error("array"))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        Err(key_error("enum"))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        Err(key_error("object"))
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeStruct> {
        Err(key_error("object"))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        Err(key_error("enum"))
    }
}

/// Captures the raw-marshal hook payload: the hook's inner value must
/// serialize as a string holding the fragment text.
struct RawCapture;

fn raw_error() -> Error {
    Error::serialize("raw fragment payload must serialize as a string")
}

macro_rules! raw_capture_reject {
    ($($method:ident($($arg:ident: $ty:ty),*);)*) => {
        $(
            fn $method(self $(, $arg: $ty)*) -> Result<Node> {
                $(let _ = $arg;)*
                Err(raw_error())
            }
        )*
    };
}

impl ser::Serializer for RawCapture {
    type Ok = Node;
    type Error = Error;

    type SerializeSeq = Impossible<Node, Error>;
    type SerializeTuple = Impossible<Node, Error>;
    type SerializeTupleStruct = Impossible<Node, Error>;
    type SerializeTupleVariant = Impossible<Node, Error>;
    type SerializeMap = Impossible<Node, Error>;
    type SerializeStruct = Impossible<Node, Error>;
    type SerializeStructVariant = Impossible<Node, Error>;

    fn serialize_str(self, v: &str) -> Result<Node> {
        Ok(Node::Raw(v.to_owned()))
    }

    raw_capture_reject! {
        serialize_bool(v: bool);
        serialize_i8(v: i8);
        serialize_i16(v: i16);
        serialize_i32(v: i32);
        serialize_i64(v: i64);
        serialize_u8(v: u8);
        serialize_u16(v: u16);
        serialize_u32(v: u32);
        serialize_u64(v: u64);
        serialize_f32(v: f32);
        serialize_f64(v: f64);
        serialize_char(v: char);
        serialize_bytes(v: &[u8]);
        serialize_none();
        serialize_unit();
        serialize_unit_struct(name: &'static str);
    }

    fn serialize_some<T>(self, _value: &T) -> Result<Node>
    where
        T: ?Sized + Serialize,
    {
        Err(raw_error())
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
    ) -> Result<Node> {
        Err(raw_error())
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, _value: &T) -> Result<Node>
    where
        T: ?Sized + Serialize,
    {
        Err(raw_error())
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<Node>
    where
        T: ?Sized + Serialize,
    {
        Err(raw_error())
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq> {
        Err(raw_error())
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple> {
        Err(raw_error())
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        Err(raw_error())
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        Err(raw_error())
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        Err(raw_error())
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeStruct> {
        Err(raw_error())
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        Err(raw_error())
    }
}
