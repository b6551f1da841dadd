//! Topological scheduling of a tree's reachable nodes.
//!
//! Nodes are discovered breadth-first from the root, each identity once, and
//! bucketed by their precomputed rank. Buckets are emitted in ascending rank
//! order, each in discovery order. Rank strictly increases from operand to
//! consumer, so every node comes after its operands.
//!
//! The order inside a bucket is not canonical; only "operands first" is
//! guaranteed.

use std::collections::{BTreeMap, VecDeque};

use rustc_hash::FxHashSet;

use crate::core::store::{NodeKey, Tables};
use crate::core::tree::Tree;

/// Schedule the nodes reachable from `root`. Caller holds the store lock.
pub(crate) fn schedule(tables: &Tables, root: NodeKey) -> Vec<NodeKey> {
    let mut found: FxHashSet<NodeKey> = FxHashSet::default();
    let mut todo: VecDeque<NodeKey> = VecDeque::from([root]);
    let mut ranks: BTreeMap<usize, Vec<NodeKey>> = BTreeMap::new();

    while let Some(key) = todo.pop_front() {
        if !found.insert(key) {
            continue;
        }
        let node = tables.node(key);
        todo.extend(node.lhs);
        todo.extend(node.rhs);
        ranks.entry(node.rank).or_default().push(key);
    }

    ranks.into_values().flatten().collect()
}

impl Tree {
    /// Every node reachable from this tree, operands before consumers.
    ///
    /// Each distinct node appears exactly once; the root is last. An empty
    /// tree yields an empty list.
    ///
    /// # Example
    /// ```
    /// use implicit_kernel::Store;
    ///
    /// let store = Store::new();
    /// let x = store.x();
    /// let t = &x * &x + 1.0;
    /// let order = t.ordered();
    /// assert_eq!(order.len(), 4); // 1, x, x*x, x*x + 1
    /// assert_eq!(order.last(), Some(&t));
    /// ```
    #[must_use]
    pub fn ordered(&self) -> Vec<Tree> {
        let Some((store, root)) = self.parts() else {
            return Vec::new();
        };
        let keys = {
            let mut tables = store.lock();
            let keys = schedule(&tables, root);
            for key in &keys {
                tables.retain(*key);
            }
            keys
        };
        keys.into_iter()
            .map(|key| Tree::adopt(store.clone(), key))
            .collect()
    }

    /// Number of distinct nodes reachable from this tree
    #[must_use]
    pub fn node_count(&self) -> usize {
        match self.parts() {
            Some((store, root)) => schedule(&store.lock(), root).len(),
            None => 0,
        }
    }
}
