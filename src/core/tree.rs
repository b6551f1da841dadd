//! Reference-counted handle to a canonical node.
//!
//! A [`Tree`] is either empty or points at exactly one node in a [`Store`].
//! Cloning a tree bumps the node's count; dropping the last handle (and the
//! last parent) frees the node. Because the store hash-conses, two trees built
//! the same way from the same operands have the same [`Id`].
//!
//! # Example
//! ```
//! use implicit_kernel::{Opcode, Store, Tree};
//!
//! let store = Store::new();
//! let one = store.constant(1.0);
//! let a = Tree::operation(Opcode::Add, &one, &one).unwrap();
//! let b = Tree::operation(Opcode::Add, &one, &one).unwrap();
//! assert_eq!(a.id(), b.id());
//! ```

use std::fmt;

use crate::core::error::InvalidExpression;
use crate::core::opcode::Opcode;
use crate::core::store::{Id, NodeKey, Store};

/// Owning reference to one live node
struct Handle {
    store: Store,
    key: NodeKey,
}

impl Clone for Handle {
    fn clone(&self) -> Self {
        self.store.lock().retain(self.key);
        Handle {
            store: self.store.clone(),
            key: self.key,
        }
    }
}

impl Drop for Handle {
    fn drop(&mut self) {
        self.store.lock_for_release().release(self.key);
    }
}

/// Handle to a node of an expression graph
#[derive(Clone, Default)]
pub struct Tree {
    handle: Option<Handle>,
}

impl Tree {
    /// Wrap a key whose reference the caller already owns
    pub(crate) fn adopt(store: Store, key: NodeKey) -> Self {
        Tree {
            handle: Some(Handle { store, key }),
        }
    }

    #[inline]
    pub(crate) fn parts(&self) -> Option<(&Store, NodeKey)> {
        self.handle.as_ref().map(|h| (&h.store, h.key))
    }

    /// Canonical constant in the global store
    #[must_use]
    pub fn constant(value: f64) -> Self {
        Store::global().constant(value)
    }

    /// A fresh free variable in the global store
    #[must_use]
    pub fn var() -> Self {
        Store::global().var()
    }

    /// Build `op(a, b)` in the operands' store.
    ///
    /// Pass empty trees for unused slots. Nullary opcodes (which have no
    /// operand to name a store) are built in the global store; use
    /// [`Store::operation`] to target a specific one.
    ///
    /// # Errors
    /// See [`Store::operation`].
    pub fn operation(op: Opcode, a: &Tree, b: &Tree) -> Result<Tree, InvalidExpression> {
        let store = match (a.store(), b.store()) {
            (Some(sa), Some(sb)) if !sa.same(sb) => {
                return Err(InvalidExpression::StoreMismatch);
            }
            (Some(s), _) | (None, Some(s)) => s,
            (None, None) => Store::global(),
        };
        store.operation(op, a, b)
    }

    /// Identity of the underlying node, or [`Id::NULL`] for an empty tree
    #[inline]
    #[must_use]
    pub fn id(&self) -> Id {
        match &self.handle {
            Some(h) => Id::from_key(h.store.id(), h.key),
            None => Id::NULL,
        }
    }

    /// True if this handle points at no node
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handle.is_none()
    }

    /// Store owning the node, if any
    #[inline]
    #[must_use]
    pub fn store(&self) -> Option<&Store> {
        self.handle.as_ref().map(|h| &h.store)
    }

    /// True if both trees are non-empty and live in the same store
    #[must_use]
    pub fn same_store(&self, other: &Tree) -> bool {
        match (self.store(), other.store()) {
            (Some(a), Some(b)) => a.same(b),
            _ => false,
        }
    }

    /// Opcode of the node
    #[must_use]
    pub fn opcode(&self) -> Option<Opcode> {
        let (store, key) = self.parts()?;
        Some(store.lock().node(key).op)
    }

    /// Value of a constant node; `None` for anything else
    #[must_use]
    pub fn value(&self) -> Option<f64> {
        let (store, key) = self.parts()?;
        let tables = store.lock();
        let node = tables.node(key);
        (node.op == Opcode::Constant).then_some(node.value)
    }

    /// Scheduling rank: 0 for nullary nodes, else 1 + deepest operand
    #[must_use]
    pub fn rank(&self) -> Option<usize> {
        let (store, key) = self.parts()?;
        Some(store.lock().node(key).rank)
    }

    /// First operand (empty for nullary nodes)
    #[must_use]
    pub fn lhs(&self) -> Tree {
        self.operand(|n| n.lhs)
    }

    /// Second operand (empty for nullary and unary nodes)
    #[must_use]
    pub fn rhs(&self) -> Tree {
        self.operand(|n| n.rhs)
    }

    fn operand(&self, pick: impl Fn(&crate::core::store::Node) -> Option<NodeKey>) -> Tree {
        let Some((store, key)) = self.parts() else {
            return Tree::default();
        };
        let child = {
            let mut tables = store.lock();
            let child = pick(tables.node(key));
            if let Some(c) = child {
                tables.retain(c);
            }
            child
        };
        match child {
            Some(c) => Tree::adopt(store.clone(), c),
            None => Tree::default(),
        }
    }
}

impl From<f64> for Tree {
    fn from(value: f64) -> Self {
        Tree::constant(value)
    }
}

impl From<i32> for Tree {
    fn from(value: i32) -> Self {
        Tree::constant(f64::from(value))
    }
}

impl PartialEq for Tree {
    /// Identity comparison. Hash-consing makes this structural equality for
    /// everything except free variables.
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for Tree {}

impl std::hash::Hash for Tree {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl fmt::Debug for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Tree")
            .field(&format_args!("{}", self))
            .finish()
    }
}
