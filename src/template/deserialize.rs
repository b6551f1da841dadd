//! Template decoding.
//!
//! Records are rebuilt in the order they were emitted, through the target
//! store, so structural sharing is restored on the way in. Each VARIABLE
//! record yields a fresh variable; coordinate records resolve to the target
//! store's X / Y / Z.

use log::debug;
use rustc_hash::{FxHashMap, FxHashSet};

use super::{TEMPLATE_TAG, Template};
use crate::core::error::MalformedTemplate;
use crate::core::opcode::Opcode;
use crate::core::store::{Id, NodeKey, Store, Tables};
use crate::core::tree::Tree;
use crate::graph::ordered::schedule;
use crate::{DEFAULT_MAX_NODES, DEFAULT_MAX_STRING_LEN};

/// Configurable template decoder
///
/// # Example
/// ```
/// use implicit_kernel::{Store, TemplateReader};
///
/// let store = Store::new();
/// let bytes = (store.x() + 1.0).serialize();
/// let t = TemplateReader::new().max_nodes(16).read(&store, &bytes).unwrap();
/// assert_eq!(t.tree.node_count(), 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateReader {
    max_nodes: usize,
    max_string_len: usize,
}

impl Default for TemplateReader {
    fn default() -> Self {
        TemplateReader {
            max_nodes: DEFAULT_MAX_NODES,
            max_string_len: DEFAULT_MAX_STRING_LEN,
        }
    }
}

impl TemplateReader {
    /// Reader with default limits
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Maximum number of node records accepted
    #[must_use]
    pub const fn max_nodes(mut self, limit: usize) -> Self {
        self.max_nodes = limit;
        self
    }

    /// Maximum decoded length, in bytes, of any single string
    #[must_use]
    pub const fn max_string_len(mut self, limit: usize) -> Self {
        self.max_string_len = limit;
        self
    }

    /// Decode `bytes` into a template whose nodes live in `store`.
    ///
    /// The last record is the root. A template with no records decodes to an
    /// empty tree.
    ///
    /// # Errors
    /// Returns [`MalformedTemplate`] for a missing header, truncated input,
    /// an unknown opcode byte, a reference to an id not yet emitted, a record
    /// that breaks a construction contract, or input exceeding the limits.
    pub fn read(&self, store: &Store, bytes: &[u8]) -> Result<Template, MalformedTemplate> {
        let mut cursor = Cursor {
            bytes,
            pos: 0,
            max_string_len: self.max_string_len,
        };
        match cursor.peek() {
            Some(TEMPLATE_TAG) => cursor.pos += 1,
            found => return Err(MalformedTemplate::MissingHeader { found }),
        }
        let name = cursor.string()?;
        let doc = cursor.string()?;

        // Every key in `emitted` is an owned reference, released below
        let mut emitted: Vec<NodeKey> = Vec::new();
        let mut names: FxHashMap<NodeKey, (String, String)> = FxHashMap::default();

        let mut tables = store.lock();
        let decoded = self.read_nodes(&mut cursor, &mut tables, &mut emitted, &mut names);

        let root = match decoded {
            Ok(()) => emitted.last().copied(),
            Err(_) => None,
        };
        let mut template = Template {
            name,
            doc,
            ..Default::default()
        };
        if let Some(root) = root {
            tables.retain(root);
            // Keep metadata only for variables the root actually reaches
            let reachable: FxHashSet<NodeKey> = schedule(&tables, root).into_iter().collect();
            for (key, (var_name, var_doc)) in names {
                if !reachable.contains(&key) {
                    continue;
                }
                let id = Id::from_key(store.id(), key);
                if !var_name.is_empty() {
                    template.var_names.insert(id, var_name);
                }
                if !var_doc.is_empty() {
                    template.var_docs.insert(id, var_doc);
                }
            }
        }
        for key in &emitted {
            tables.release(*key);
        }
        drop(tables);

        decoded?;
        if let Some(root) = root {
            template.tree = Tree::adopt(store.clone(), root);
        }
        debug!(
            "deserialized template '{}': {} records from {} bytes",
            template.name,
            emitted.len(),
            bytes.len()
        );
        Ok(template)
    }

    fn read_nodes(
        &self,
        cursor: &mut Cursor<'_>,
        tables: &mut Tables,
        emitted: &mut Vec<NodeKey>,
        names: &mut FxHashMap<NodeKey, (String, String)>,
    ) -> Result<(), MalformedTemplate> {
        while let Some(byte) = cursor.peek() {
            let offset = cursor.pos;
            if emitted.len() >= self.max_nodes {
                return Err(MalformedTemplate::TooManyNodes {
                    limit: self.max_nodes,
                });
            }
            let op = Opcode::from_byte(byte)
                .ok_or(MalformedTemplate::UnknownOpcode { byte, offset })?;
            cursor.pos += 1;

            let key = match op {
                Opcode::Constant => {
                    let value = f64::from_le_bytes(cursor.array("constant value")?);
                    tables.intern_constant(value)
                }
                Opcode::Variable => {
                    let var_name = cursor.string()?;
                    let var_doc = cursor.string()?;
                    let key = tables.intern_var();
                    names.insert(key, (var_name, var_doc));
                    key
                }
                op => {
                    let rhs = match op.arity() {
                        2 => Some(cursor.reference(emitted)?),
                        _ => None,
                    };
                    let lhs = match op.arity() {
                        0 => None,
                        _ => Some(cursor.reference(emitted)?),
                    };
                    tables
                        .operation(op, lhs, rhs)
                        .map_err(|source| MalformedTemplate::InvalidExpression { offset, source })?
                }
            };
            emitted.push(key);
        }
        Ok(())
    }
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
    max_string_len: usize,
}

impl Cursor<'_> {
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn array<const N: usize>(
        &mut self,
        expected: &'static str,
    ) -> Result<[u8; N], MalformedTemplate> {
        let end = self.pos + N;
        let slice = self
            .bytes
            .get(self.pos..end)
            .ok_or(MalformedTemplate::UnexpectedEnd {
                offset: self.bytes.len(),
                expected,
            })?;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        self.pos = end;
        Ok(out)
    }

    /// Read an operand id and resolve it against the records emitted so far
    fn reference(&mut self, emitted: &[NodeKey]) -> Result<NodeKey, MalformedTemplate> {
        let offset = self.pos;
        let id = u32::from_le_bytes(self.array("operand id")?);
        usize::try_from(id)
            .ok()
            .and_then(|i| emitted.get(i).copied())
            .ok_or(MalformedTemplate::UnassignedReference { id, offset })
    }

    fn string(&mut self) -> Result<String, MalformedTemplate> {
        let start = self.pos;
        match self.peek() {
            Some(b'"') => self.pos += 1,
            Some(byte) => return Err(MalformedTemplate::ExpectedString { byte, offset: start }),
            None => {
                return Err(MalformedTemplate::UnexpectedEnd {
                    offset: start,
                    expected: "string",
                });
            }
        }

        let mut raw = Vec::new();
        loop {
            let Some(c) = self.peek() else {
                return Err(MalformedTemplate::UnterminatedString { offset: start });
            };
            self.pos += 1;
            match c {
                b'"' => break,
                b'\\' => {
                    let Some(escaped) = self.peek() else {
                        return Err(MalformedTemplate::UnterminatedString { offset: start });
                    };
                    self.pos += 1;
                    raw.push(escaped);
                }
                c => raw.push(c),
            }
            if raw.len() > self.max_string_len {
                return Err(MalformedTemplate::StringTooLong {
                    limit: self.max_string_len,
                    offset: start,
                });
            }
        }
        String::from_utf8(raw).map_err(|_| MalformedTemplate::InvalidUtf8 { offset: start })
    }
}
