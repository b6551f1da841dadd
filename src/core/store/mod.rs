//! Hash-consing node store.
//!
//! The store is the single owner of every node. It guarantees that a given
//! constant value, and a given `(opcode, lhs, rhs)` triple, map to exactly one
//! live node, so identical subexpressions are always shared. Free variables
//! are the exception: every [`Store::var`] call allocates a new node.
//!
//! Nodes are reference counted by the store itself. A count covers both the
//! [`Tree`] handles pointing at the node and the parent nodes using it as an
//! operand. When a count reaches zero the node is removed from the arena and
//! from its dedup table in the same critical section, so a concurrent intern
//! can never observe a half-deleted entry.
//!
//! # Example
//! ```
//! use implicit_kernel::Store;
//!
//! let store = Store::new();
//! let a = store.constant(1.0);
//! let b = store.constant(1.0);
//! assert_eq!(a.id(), b.id());
//! assert_ne!(store.var().id(), store.var().id());
//! ```

mod node;

pub use node::{Id, NodeKey};
pub(crate) use node::{Node, slot};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use log::trace;
use rustc_hash::FxHashMap;
use slotmap::SlotMap;

use crate::core::error::InvalidExpression;
use crate::core::opcode::Opcode;
use crate::core::tree::Tree;

/// Global counter for store IDs
static NEXT_STORE_ID: AtomicU64 = AtomicU64::new(1);

/// The process-wide store, created lazily on first use
static GLOBAL_STORE: OnceLock<Store> = OnceLock::new();

type OpKey = (Opcode, Option<NodeKey>, Option<NodeKey>);

/// Arena plus dedup tables. Every method assumes the store lock is held.
#[derive(Debug, Default)]
pub(crate) struct Tables {
    nodes: SlotMap<NodeKey, Node>,
    // Keyed by bit pattern so that -0.0 and NaN payloads behave as plain keys
    constants: FxHashMap<u64, NodeKey>,
    operations: FxHashMap<OpKey, NodeKey>,
}

impl Tables {
    /// # Panics
    ///
    /// Panics if `key` is not live. Keys only reach here through owning
    /// references, so a miss means the refcount bookkeeping is broken.
    #[inline]
    pub(crate) fn node(&self, key: NodeKey) -> &Node {
        &self.nodes[key]
    }

    #[inline]
    pub(crate) fn retain(&mut self, key: NodeKey) {
        self.nodes[key].refs += 1;
    }

    /// Drop one owning reference, freeing the node and, transitively, any
    /// operands whose last owner it was.
    pub(crate) fn release(&mut self, key: NodeKey) {
        let mut pending = vec![key];
        while let Some(key) = pending.pop() {
            let node = &mut self.nodes[key];
            node.refs -= 1;
            if node.refs > 0 {
                continue;
            }
            let Some(node) = self.nodes.remove(key) else {
                continue;
            };
            match node.op {
                Opcode::Constant => {
                    self.constants.remove(&node.value.to_bits());
                }
                Opcode::Variable => {}
                op => {
                    self.operations.remove(&(op, node.lhs, node.rhs));
                }
            }
            trace!("freed {} node {:?}", node.op, key);
            pending.extend(node.lhs);
            pending.extend(node.rhs);
        }
    }

    /// Canonical node for `value`, with one reference owned by the caller
    pub(crate) fn intern_constant(&mut self, value: f64) -> NodeKey {
        let bits = value.to_bits();
        if let Some(&key) = self.constants.get(&bits) {
            self.retain(key);
            return key;
        }
        let key = self.nodes.insert(Node::leaf(Opcode::Constant, value));
        self.constants.insert(bits, key);
        trace!("interned constant {} as {:?}", value, key);
        key
    }

    /// Fresh variable node, with one reference owned by the caller
    pub(crate) fn intern_var(&mut self) -> NodeKey {
        let key = self.nodes.insert(Node::leaf(Opcode::Variable, 0.0));
        trace!("allocated variable {:?}", key);
        key
    }

    /// Validate and intern an operation node.
    ///
    /// Operands must already be live in this arena. On success the caller
    /// owns one reference to the returned key; on failure nothing changed.
    pub(crate) fn operation(
        &mut self,
        op: Opcode,
        lhs: Option<NodeKey>,
        rhs: Option<NodeKey>,
    ) -> Result<NodeKey, InvalidExpression> {
        self.check(op, lhs, rhs)?;
        Ok(self.intern_operation(op, lhs, rhs))
    }

    fn check(
        &self,
        op: Opcode,
        lhs: Option<NodeKey>,
        rhs: Option<NodeKey>,
    ) -> Result<(), InvalidExpression> {
        if op.is_leaf() {
            return Err(InvalidExpression::LeafOperation(op));
        }
        let expected = op.arity();
        let conforms = match expected {
            0 => lhs.is_none() && rhs.is_none(),
            1 => lhs.is_some() && rhs.is_none(),
            _ => lhs.is_some() && rhs.is_some(),
        };
        if !conforms {
            return Err(InvalidExpression::ArityMismatch {
                op,
                expected,
                lhs: lhs.is_some(),
                rhs: rhs.is_some(),
            });
        }

        if matches!(op, Opcode::Pow | Opcode::NthRoot) {
            let exponent = rhs.map(|k| self.node(k));
            let Some(Node {
                op: Opcode::Constant,
                value,
                ..
            }) = exponent
            else {
                return Err(InvalidExpression::NonConstantExponent { op });
            };
            let value = *value;
            if !value.is_finite() || value != value.round() {
                return Err(InvalidExpression::NonIntegralExponent { op, value });
            }
            if op == Opcode::NthRoot && value <= 0.0 {
                return Err(InvalidExpression::NonPositiveRoot { value });
            }
        }
        Ok(())
    }

    fn intern_operation(
        &mut self,
        op: Opcode,
        lhs: Option<NodeKey>,
        rhs: Option<NodeKey>,
    ) -> NodeKey {
        if let Some(&key) = self.operations.get(&(op, lhs, rhs)) {
            self.retain(key);
            return key;
        }

        let rank = match (lhs, rhs) {
            (None, _) => 0,
            (Some(a), None) => self.node(a).rank + 1,
            (Some(a), Some(b)) => self.node(a).rank.max(self.node(b).rank) + 1,
        };
        // The new node owns its operands
        for operand in lhs.iter().chain(rhs.iter()) {
            self.retain(*operand);
        }
        let key = self.nodes.insert(Node {
            op,
            value: 0.0,
            lhs,
            rhs,
            rank,
            refs: 1,
        });
        self.operations.insert((op, lhs, rhs), key);
        trace!("interned {} as {:?} (rank {})", op, key, rank);
        key
    }

    /// Existing canonical node for a nullary operation, without creating it
    pub(crate) fn find_nullary(&self, op: Opcode) -> Option<NodeKey> {
        self.operations.get(&(op, None, None)).copied()
    }
}

#[derive(Debug)]
struct Shared {
    id: u64,
    tables: Mutex<Tables>,
}

/// Handle to a node store.
///
/// Cloning shares the underlying store. Trees built from different stores
/// never share nodes and cannot be combined.
#[derive(Debug, Clone)]
pub struct Store {
    shared: Arc<Shared>,
}

impl Store {
    /// Create a new, empty, isolated store
    #[must_use]
    pub fn new() -> Self {
        Store {
            shared: Arc::new(Shared {
                id: NEXT_STORE_ID.fetch_add(1, Ordering::Relaxed),
                tables: Mutex::new(Tables::default()),
            }),
        }
    }

    /// The process-wide store used by `Tree::from(f64)` and friends
    pub fn global() -> &'static Store {
        GLOBAL_STORE.get_or_init(Store::new)
    }

    /// Unique ID of this store
    #[must_use]
    pub fn id(&self) -> u64 {
        self.shared.id
    }

    /// True if both handles refer to the same store
    #[inline]
    #[must_use]
    pub fn same(&self, other: &Store) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    /// # Panics
    ///
    /// Panics if the store lock is poisoned.
    pub(crate) fn lock(&self) -> MutexGuard<'_, Tables> {
        self.shared.tables.lock().expect("Node store poisoned")
    }

    /// Lock for release paths, which run in `Drop` and must not panic twice
    pub(crate) fn lock_for_release(&self) -> MutexGuard<'_, Tables> {
        self.shared
            .tables
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Canonical constant node for `value`
    #[must_use]
    pub fn constant(&self, value: f64) -> Tree {
        let key = self.lock().intern_constant(value);
        Tree::adopt(self.clone(), key)
    }

    /// A new free variable, distinct from every other variable
    #[must_use]
    pub fn var(&self) -> Tree {
        let key = self.lock().intern_var();
        Tree::adopt(self.clone(), key)
    }

    /// The X coordinate
    #[must_use]
    pub fn x(&self) -> Tree {
        self.coordinate(Opcode::VarX)
    }

    /// The Y coordinate
    #[must_use]
    pub fn y(&self) -> Tree {
        self.coordinate(Opcode::VarY)
    }

    /// The Z coordinate
    #[must_use]
    pub fn z(&self) -> Tree {
        self.coordinate(Opcode::VarZ)
    }

    fn coordinate(&self, op: Opcode) -> Tree {
        match self.operation(op, &Tree::default(), &Tree::default()) {
            Ok(t) => t,
            Err(e) => unreachable!("coordinate opcodes are nullary: {}", e),
        }
    }

    /// Canonical node for `op` applied to `a` and `b`.
    ///
    /// Pass empty trees for unused operand slots.
    ///
    /// # Errors
    /// Returns [`InvalidExpression`] if the operand pattern does not match the
    /// opcode's arity, if an operand belongs to another store, or if a POW /
    /// NTH_ROOT exponent is not an admissible constant. Nothing is allocated
    /// on failure.
    pub fn operation(&self, op: Opcode, a: &Tree, b: &Tree) -> Result<Tree, InvalidExpression> {
        let lhs = self.key_of(a)?;
        let rhs = self.key_of(b)?;
        let key = self.lock().operation(op, lhs, rhs)?;
        Ok(Tree::adopt(self.clone(), key))
    }

    fn key_of(&self, t: &Tree) -> Result<Option<NodeKey>, InvalidExpression> {
        match t.parts() {
            None => Ok(None),
            Some((store, key)) if store.same(self) => Ok(Some(key)),
            Some(_) => Err(InvalidExpression::StoreMismatch),
        }
    }

    /// Number of live nodes
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().nodes.len()
    }

    /// True when no node is alive
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().nodes.is_empty()
    }

    /// Number of live constant nodes
    #[must_use]
    pub fn constant_count(&self) -> usize {
        self.lock().constants.len()
    }

    /// Number of live operation nodes (coordinates included)
    #[must_use]
    pub fn operation_count(&self) -> usize {
        self.lock().operations.len()
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}
