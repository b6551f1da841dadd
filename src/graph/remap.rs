//! Substitution of free variables.
//!
//! The graph is rebuilt in scheduled order, so operands are rewritten before
//! their consumers, and every rebuilt node is interned again. Untouched
//! subgraphs therefore come back as the very same nodes, and a tree that
//! contains none of the targets comes back with its original identity.

use log::debug;
use rustc_hash::FxHashMap;

use super::ordered::schedule;
use crate::core::error::InvalidExpression;
use crate::core::opcode::Opcode;
use crate::core::store::{NodeKey, Store, Tables};
use crate::core::tree::Tree;

/// Rebuild `root` with `seeds` substituted.
///
/// Returns an owned reference to the rebuilt root, or `None` if the root was
/// not rewritten (a leaf that is not itself a target).
fn rebuild(
    tables: &mut Tables,
    root: NodeKey,
    seeds: &[(NodeKey, NodeKey)],
) -> Result<Option<NodeKey>, InvalidExpression> {
    // Every value in `map` is an owned reference, released before returning
    let mut map: FxHashMap<NodeKey, NodeKey> = FxHashMap::default();
    for &(target, replacement) in seeds {
        tables.retain(replacement);
        if let Some(old) = map.insert(target, replacement) {
            tables.release(old);
        }
    }

    let mut result = Ok(());
    for key in schedule(tables, root) {
        if map.contains_key(&key) {
            continue;
        }
        let node = tables.node(key);
        if node.op.arity() == 0 {
            continue;
        }
        let (op, lhs, rhs) = (node.op, node.lhs, node.rhs);
        let lookup = |k: Option<NodeKey>| k.map(|k| map.get(&k).copied().unwrap_or(k));
        let (lhs, rhs) = (lookup(lhs), lookup(rhs));
        match tables.operation(op, lhs, rhs) {
            Ok(rebuilt) => {
                map.insert(key, rebuilt);
            }
            Err(e) => {
                result = Err(e);
                break;
            }
        }
    }

    let out = match result {
        Ok(()) => map.get(&root).copied(),
        Err(_) => None,
    };
    if let Some(k) = out {
        tables.retain(k);
    }
    for (_, owned) in map {
        tables.release(owned);
    }
    result.map(|()| out)
}

fn key_in(store: &Store, t: &Tree) -> Result<Option<NodeKey>, InvalidExpression> {
    match t.parts() {
        None => Ok(None),
        Some((s, key)) if s.same(store) => Ok(Some(key)),
        Some(_) => Err(InvalidExpression::StoreMismatch),
    }
}

impl Tree {
    /// Replace each `target` node with its `replacement`, everywhere in this
    /// tree, and return the rebuilt tree.
    ///
    /// Targets are matched by identity. Empty targets are ignored. If a
    /// target is listed twice, the last replacement wins.
    ///
    /// # Errors
    /// Fails if a replacement is empty, if a target or replacement lives in
    /// another store, or if a rebuilt node would break a construction
    /// contract (e.g. a POW exponent constant replaced by a non-constant).
    pub fn substitute(&self, pairs: &[(&Tree, &Tree)]) -> Result<Tree, InvalidExpression> {
        let Some((store, root)) = self.parts() else {
            return Ok(Tree::default());
        };

        let mut seeds = Vec::with_capacity(pairs.len());
        for (target, replacement) in pairs {
            let replacement =
                key_in(store, replacement)?.ok_or(InvalidExpression::EmptyReplacement)?;
            if let Some(target) = key_in(store, target)? {
                seeds.push((target, replacement));
            }
        }

        let rebuilt = rebuild(&mut store.lock(), root, &seeds)?;
        Ok(match rebuilt {
            Some(key) => Tree::adopt(store.clone(), key),
            None => self.clone(),
        })
    }

    /// Replace the store's X, Y and Z coordinates with the given trees.
    ///
    /// A tree that uses none of the coordinates is returned unchanged.
    ///
    /// # Errors
    /// Fails if a replacement is empty or lives in another store.
    ///
    /// # Example
    /// ```
    /// use implicit_kernel::Store;
    ///
    /// let store = Store::new();
    /// let (x, y, z) = (store.x(), store.y(), store.z());
    /// let sphere = &x * &x + &y * &y + &z * &z - 1.0;
    /// let moved = sphere.remap(&(&x - 2.0), &y, &z).unwrap();
    /// assert_ne!(moved.id(), sphere.id());
    /// ```
    pub fn remap(&self, x: &Tree, y: &Tree, z: &Tree) -> Result<Tree, InvalidExpression> {
        let Some((store, root)) = self.parts() else {
            return Ok(Tree::default());
        };

        let mut seeds = Vec::with_capacity(3);
        {
            // Look the coordinates up without interning them: a coordinate
            // that does not exist cannot appear in this tree.
            let tables = store.lock();
            for (op, replacement) in [(Opcode::VarX, x), (Opcode::VarY, y), (Opcode::VarZ, z)] {
                let replacement =
                    key_in(store, replacement)?.ok_or(InvalidExpression::EmptyReplacement)?;
                if let Some(target) = tables.find_nullary(op) {
                    seeds.push((target, replacement));
                }
            }
        }

        let rebuilt = rebuild(&mut store.lock(), root, &seeds)?;
        let out = match rebuilt {
            Some(key) => Tree::adopt(store.clone(), key),
            None => self.clone(),
        };
        debug!(
            "remap: {} nodes -> {} nodes (root {})",
            self.node_count(),
            out.node_count(),
            if out.id() == self.id() { "unchanged" } else { "rewritten" }
        );
        Ok(out)
    }
}
