//! Display implementation for trees.
//!
//! Trees print as prefix s-expressions, for debugging and log output only:
//! - `(add x 1)`
//! - `%0 = (sin v3); (max %0 (neg %0))`
//!
//! Every operation used more than once inside the tree is printed a single
//! time as a `%n = ...` binding and referenced by its label afterwards, so
//! output grows with the number of distinct nodes rather than the number of
//! paths. Variables print as `v<slot>`, using the arena slot of the node.
//!
//! Rendering walks the graph with an explicit stack, and the text is built
//! before it reaches the formatter, so the store lock is released before any
//! I/O happens.

use std::fmt::{self, Write};

use rustc_hash::FxHashMap;

use crate::core::opcode::Opcode;
use crate::core::store::{NodeKey, Tables, slot};
use crate::core::tree::Tree;
use crate::graph::ordered::schedule;

enum Item {
    Text(&'static str),
    /// Operand position: a label if the node has one, else its expansion
    Operand(NodeKey),
    Expand(NodeKey),
}

/// Write `key` in full, stopping at labelled operands
fn write_expr(
    out: &mut String,
    tables: &Tables,
    key: NodeKey,
    labels: &FxHashMap<NodeKey, usize>,
) -> fmt::Result {
    let mut stack = vec![Item::Expand(key)];
    while let Some(item) = stack.pop() {
        match item {
            Item::Text(s) => out.push_str(s),
            Item::Operand(k) => match labels.get(&k) {
                Some(label) => write!(out, "%{}", label)?,
                None => stack.push(Item::Expand(k)),
            },
            Item::Expand(k) => {
                let node = tables.node(k);
                match node.op {
                    Opcode::Constant => write!(out, "{}", node.value)?,
                    Opcode::Variable => write!(out, "v{}", slot(k))?,
                    op if op.is_coordinate() => out.push_str(op.name()),
                    op => {
                        write!(out, "({}", op)?;
                        // Popped in reverse: " " lhs " " rhs ")"
                        stack.push(Item::Text(")"));
                        if let Some(rhs) = node.rhs {
                            stack.push(Item::Operand(rhs));
                            stack.push(Item::Text(" "));
                        }
                        if let Some(lhs) = node.lhs {
                            stack.push(Item::Operand(lhs));
                            stack.push(Item::Text(" "));
                        }
                    }
                }
            }
        }
    }
    Ok(())
}

/// Render the graph under `root`. Caller holds the store lock.
fn render(tables: &Tables, root: NodeKey) -> Result<String, fmt::Error> {
    let order = schedule(tables, root);

    let mut uses: FxHashMap<NodeKey, usize> = FxHashMap::default();
    for key in &order {
        let node = tables.node(*key);
        for operand in node.lhs.iter().chain(node.rhs.iter()) {
            *uses.entry(*operand).or_default() += 1;
        }
    }

    // Labels follow schedule order, so a binding only refers to earlier ones
    let mut labels: FxHashMap<NodeKey, usize> = FxHashMap::default();
    let mut bound = Vec::new();
    for key in &order {
        let shared = uses.get(key).is_some_and(|&n| n > 1);
        if shared && tables.node(*key).op.arity() > 0 {
            labels.insert(*key, bound.len());
            bound.push(*key);
        }
    }

    let mut out = String::new();
    for (label, key) in bound.iter().enumerate() {
        write!(out, "%{} = ", label)?;
        write_expr(&mut out, tables, *key, &labels)?;
        out.push_str("; ");
    }
    write_expr(&mut out, tables, root, &labels)?;
    Ok(out)
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.parts() {
            None => f.write_str("<empty>"),
            Some((store, key)) => {
                let text = render(&store.lock(), key)?;
                f.write_str(&text)
            }
        }
    }
}
