//! Arena-resident node representation.

use std::fmt;

use slotmap::Key;

use crate::core::opcode::Opcode;

slotmap::new_key_type! {
    /// Stable arena slot of a node. Versioned, so a freed slot that gets
    /// reused never compares equal to the key of the node that lived there.
    pub struct NodeKey;
}

/// A canonical node. Only the store creates, mutates, or frees these.
#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) op: Opcode,
    /// Payload, meaningful only for `Opcode::Constant`
    pub(crate) value: f64,
    pub(crate) lhs: Option<NodeKey>,
    pub(crate) rhs: Option<NodeKey>,
    /// 0 for nullary nodes, else one more than the deepest operand
    pub(crate) rank: usize,
    /// Owning references: live handles plus parent nodes
    pub(crate) refs: usize,
}

impl Node {
    pub(crate) fn leaf(op: Opcode, value: f64) -> Self {
        Node {
            op,
            value,
            lhs: None,
            rhs: None,
            rank: 0,
            refs: 1,
        }
    }
}

/// Arena slot index of a key
pub(crate) fn slot(key: NodeKey) -> u32 {
    // Low 32 bits of the FFI form hold the slot index
    #[allow(
        clippy::cast_possible_truncation,
        reason = "slotmap packs the index into the low 32 bits"
    )]
    let index = key.data().as_ffi() as u32;
    index
}

/// Identity of a node, usable as a map key.
///
/// Carries the owning store's id, so nodes from different stores never
/// compare equal even when they sit in the same arena slot. Only meaningful
/// while the node is alive. Never persisted; the template codec assigns its
/// own sequential ids.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Id(Option<(u64, NodeKey)>);

impl Id {
    /// Identity of an empty handle
    pub const NULL: Id = Id(None);

    #[inline]
    pub(crate) const fn from_key(store: u64, key: NodeKey) -> Self {
        Id(Some((store, key)))
    }

    /// True for the identity of an empty handle
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0.is_none()
    }

    /// Id of the store owning the node
    #[inline]
    #[must_use]
    pub fn store(self) -> Option<u64> {
        self.0.map(|(store, _)| store)
    }

    /// Arena slot index; printed as the variable label by `Display`
    #[must_use]
    pub fn slot(self) -> Option<u32> {
        self.0.map(|(_, k)| slot(k))
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some((store, k)) => write!(f, "Id({}:{:?})", store, k.data()),
            None => write!(f, "Id(null)"),
        }
    }
}
