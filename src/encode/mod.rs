//! Two-pass encoder.
//!
//! Pass 1 walks the encode tree and tallies every struct schema it sees;
//! pass 2 serializes, binding a schema to a class constructor only when the
//! header plus constructor calls beat plain object syntax. The threshold
//! (at least two keys and at least two occurrences) is part of the format
//! contract.

pub(crate) mod ser;

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::Serialize;

use crate::text;
use crate::value::Value;
use crate::Result;

use self::ser::{Node, NodeSerializer};

/// Encodes a value to compact TRON bytes.
pub fn to_vec<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let node = value.serialize(NodeSerializer::new())?;

    let mut discovery = Discovery::default();
    discovery.walk(&node);

    let table = discovery.into_class_table();
    let mut emitter = Emitter {
        table: &table,
        out: Vec::with_capacity(128),
    };
    emitter.document(&node);
    Ok(emitter.out)
}

/// Indentation-accepting variant. The parameters are reserved: newline
/// tokens are significant separators in the grammar, so an indented body
/// would not re-parse, and output stays compact.
pub(crate) fn to_vec_indent<T: Serialize>(
    value: &T,
    _prefix: &str,
    _indent: &str,
) -> Result<Vec<u8>> {
    to_vec(value)
}

/// Compact text of one parsed subtree, used when a raw-fragment target
/// asks for the serialized form of what was matched. Objects keep their
/// parse order and never rebind to classes.
pub(crate) fn fragment_text(value: &Value) -> String {
    let mut out = Vec::new();
    fragment_node(&mut out, value);
    debug_assert!(std::str::from_utf8(&out).is_ok());
    // Only valid UTF-8 is ever appended.
    unsafe { String::from_utf8_unchecked(out) }
}

fn fragment_node(out: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Null => out.extend_from_slice(b"null"),
        Value::Bool(true) => out.extend_from_slice(b"true"),
        Value::Bool(false) => out.extend_from_slice(b"false"),
        Value::Number(n) => out.extend_from_slice(n.as_str().as_bytes()),
        Value::String(s) => text::append_quoted(out, s),
        Value::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                fragment_node(out, item);
            }
            out.push(b']');
        }
        Value::Object(map) => {
            out.push(b'{');
            for (i, (key, entry)) in map.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                text::append_quoted(out, key);
                out.push(b':');
                fragment_node(out, entry);
            }
            out.push(b'}');
        }
    }
}

struct SchemaEntry {
    keys: Vec<&'static str>,
    count: usize,
}

/// Pass 1 state: schema signature → first-seen key order and occurrence
/// count. Insertion order of the table is first-seen order, which fixes
/// the header order.
#[derive(Default)]
struct Discovery {
    schemas: IndexMap<String, SchemaEntry>,
}

/// The sorted, comma-joined serialized field names of one struct value.
/// Two structs with the same name set share a signature regardless of
/// declaration order.
fn signature(fields: &[(&'static str, Node)]) -> String {
    let mut names: Vec<&str> = fields.iter().map(|(name, _)| *name).collect();
    names.sort_unstable();
    names.join(",")
}

impl Discovery {
    fn walk(&mut self, node: &Node) {
        match node {
            Node::Array(items) => {
                for item in items {
                    self.walk(item);
                }
            }
            Node::Map(entries) => {
                for (_, entry) in entries {
                    self.walk(entry);
                }
            }
            Node::Struct(fields) => {
                if !fields.is_empty() {
                    let entry = self
                        .schemas
                        .entry(signature(fields))
                        .or_insert_with(|| SchemaEntry {
                            keys: fields.iter().map(|(name, _)| *name).collect(),
                            count: 0,
                        });
                    entry.count += 1;
                }
                for (_, field) in fields {
                    self.walk(field);
                }
            }
            Node::Null | Node::Bool(_) | Node::Number(_) | Node::String(_) | Node::Raw(_) => {}
        }
    }

    /// Pass 1.5: keep only schemas worth a class definition and assign
    /// names in first-seen order.
    fn into_class_table(self) -> ClassTable {
        let mut table = ClassTable {
            classes: Vec::new(),
            by_signature: HashMap::new(),
        };
        for (sig, entry) in self.schemas {
            if entry.keys.len() > 1 && entry.count > 1 {
                table.by_signature.insert(sig, table.classes.len());
                table.classes.push(ClassDef {
                    name: class_name(table.classes.len()),
                    keys: entry.keys,
                });
            }
        }
        table
    }
}

struct ClassDef {
    name: String,
    keys: Vec<&'static str>,
}

struct ClassTable {
    classes: Vec<ClassDef>,
    by_signature: HashMap<String, usize>,
}

/// Index → `A,B,...,Z,A1,B1,...,Z1,A2,...`.
fn class_name(index: usize) -> String {
    let letter = (b'A' + (index % 26) as u8) as char;
    let cycle = index / 26;
    if cycle == 0 {
        letter.to_string()
    } else {
        format!("{letter}{cycle}")
    }
}

struct Emitter<'a> {
    table: &'a ClassTable,
    out: Vec<u8>,
}

impl Emitter<'_> {
    fn document(&mut self, node: &Node) {
        for class in &self.table.classes {
            self.out.extend_from_slice(b"class ");
            self.out.extend_from_slice(class.name.as_bytes());
            self.out.extend_from_slice(b": ");
            for (i, key) in class.keys.iter().enumerate() {
                if i > 0 {
                    self.out.push(b',');
                }
                if text::is_valid_identifier(key) {
                    self.out.extend_from_slice(key.as_bytes());
                } else {
                    text::append_quoted(&mut self.out, key);
                }
            }
            self.out.push(b'\n');
        }
        if !self.table.classes.is_empty() {
            self.out.push(b'\n');
        }
        self.node(node);
    }

    fn node(&mut self, node: &Node) {
        match node {
            Node::Null => self.out.extend_from_slice(b"null"),
            Node::Bool(true) => self.out.extend_from_slice(b"true"),
            Node::Bool(false) => self.out.extend_from_slice(b"false"),
            Node::Number(n) => self.out.extend_from_slice(n.as_str().as_bytes()),
            Node::String(s) => text::append_quoted(&mut self.out, s),
            Node::Raw(s) => self.out.extend_from_slice(s.as_bytes()),
            Node::Array(items) => {
                self.out.push(b'[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        self.out.push(b',');
                    }
                    self.node(item);
                }
                self.out.push(b']');
            }
            Node::Map(entries) => {
                self.out.push(b'{');
                let mut order: Vec<usize> = (0..entries.len()).collect();
                order.sort_by(|&a, &b| entries[a].0.cmp(&entries[b].0));
                for (i, idx) in order.into_iter().enumerate() {
                    if i > 0 {
                        self.out.push(b',');
                    }
                    let (key, entry) = &entries[idx];
                    text::append_quoted(&mut self.out, key);
                    self.out.push(b':');
                    self.node(entry);
                }
                self.out.push(b'}');
            }
            Node::Struct(fields) => self.struct_node(fields),
        }
    }

    fn struct_node(&mut self, fields: &[(&'static str, Node)]) {
        if fields.is_empty() {
            self.out.extend_from_slice(b"{}");
            return;
        }

        let table = self.table;
        if let Some(&idx) = table.by_signature.get(&signature(fields)) {
            let class = &table.classes[idx];
            self.out.extend_from_slice(class.name.as_bytes());
            self.out.push(b'(');
            for (i, key) in class.keys.iter().enumerate() {
                if i > 0 {
                    self.out.push(b',');
                }
                match fields.iter().find(|(name, _)| name == key) {
                    Some((_, field)) => self.node(field),
                    // Signature equality guarantees the name set matches.
                    None => self.out.extend_from_slice(b"null"),
                }
            }
            self.out.push(b')');
            return;
        }

        self.out.push(b'{');
        for (i, (key, field)) in fields.iter().enumerate() {
            if i > 0 {
                self.out.push(b',');
            }
            text::append_quoted(&mut self.out, key);
            self.out.push(b':');
            self.node(field);
        }
        self.out.push(b'}');
    }
}
