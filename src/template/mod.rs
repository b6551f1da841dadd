//! Named, documented expression templates and their byte format.
//!
//! A [`Template`] bundles a tree with a name, a doc string, and per-variable
//! names and docs keyed by variable [`Id`]. Its serialized form is:
//!
//! ```text
//! 'T' <string name> <string doc>
//! for each node in tree.ordered():
//!     <u8 opcode>
//!     CONSTANT: <f64, 8 bytes LE>
//!     VARIABLE: <string name> <string doc>
//!     arity 2:  <u32 LE: id of rhs>
//!     arity ≥1: <u32 LE: id of lhs>
//! ```
//!
//! Node ids are sequential in emission order, starting at 0. Strings are
//! wrapped in `"` with `"` and `\` preceded by a `\`; nothing else is escaped.

mod deserialize;
mod serialize;

pub use deserialize::TemplateReader;

use rustc_hash::FxHashMap;

use crate::core::error::MalformedTemplate;
use crate::core::store::{Id, Store};
use crate::core::tree::Tree;

/// Leading byte of every serialized template
pub const TEMPLATE_TAG: u8 = b'T';

/// An expression tree plus human-readable metadata
#[derive(Debug, Clone, Default)]
pub struct Template {
    pub name: String,
    pub doc: String,
    pub tree: Tree,
    /// Names of variables appearing in `tree`
    pub var_names: FxHashMap<Id, String>,
    /// Docs of variables appearing in `tree`
    pub var_docs: FxHashMap<Id, String>,
}

impl Template {
    /// Create a template with no docs or variable metadata
    pub fn new(name: impl Into<String>, tree: Tree) -> Self {
        Template {
            name: name.into(),
            tree,
            ..Default::default()
        }
    }

    /// Set the template doc string
    #[must_use]
    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = doc.into();
        self
    }

    /// Name a variable of the tree.
    ///
    /// Keyed by [`Id`], which includes the store; a variable from another
    /// store never matches a node of `tree` and is not written.
    #[must_use]
    pub fn var_name(mut self, var: &Tree, name: impl Into<String>) -> Self {
        self.var_names.insert(var.id(), name.into());
        self
    }

    /// Document a variable of the tree
    #[must_use]
    pub fn var_doc(mut self, var: &Tree, doc: impl Into<String>) -> Self {
        self.var_docs.insert(var.id(), doc.into());
        self
    }

    /// Name of a variable, if one was recorded
    #[must_use]
    pub fn name_of(&self, var: &Tree) -> Option<&str> {
        self.var_names.get(&var.id()).map(String::as_str)
    }

    /// Doc of a variable, if one was recorded
    #[must_use]
    pub fn doc_of(&self, var: &Tree) -> Option<&str> {
        self.var_docs.get(&var.id()).map(String::as_str)
    }

    /// Encode this template
    #[must_use]
    pub fn serialize(&self) -> Vec<u8> {
        serialize::write_template(self)
    }

    /// Decode a template into `store` with the default reader limits
    ///
    /// # Errors
    /// See [`TemplateReader::read`].
    pub fn deserialize(store: &Store, bytes: &[u8]) -> Result<Template, MalformedTemplate> {
        TemplateReader::new().read(store, bytes)
    }
}

impl Tree {
    /// Encode this tree as an anonymous template (empty name and doc)
    #[must_use]
    pub fn serialize(&self) -> Vec<u8> {
        Template::new("", self.clone()).serialize()
    }
}
