use log::debug;
use rustc_hash::FxHashMap;

use super::{TEMPLATE_TAG, Template};
use crate::core::opcode::Opcode;
use crate::core::store::{Id, NodeKey};
use crate::graph::ordered::schedule;

/// Append `s` wrapped in quotes, escaping only `"` and `\`
pub(crate) fn write_string(s: &str, out: &mut Vec<u8>) {
    out.push(b'"');
    for &c in s.as_bytes() {
        if c == b'"' || c == b'\\' {
            out.push(b'\\');
        }
        out.push(c);
    }
    out.push(b'"');
}

fn lookup(map: &FxHashMap<Id, String>, id: Id) -> &str {
    map.get(&id).map_or("", String::as_str)
}

pub(super) fn write_template(t: &Template) -> Vec<u8> {
    let mut out = vec![TEMPLATE_TAG];
    write_string(&t.name, &mut out);
    write_string(&t.doc, &mut out);

    let Some((store, root)) = t.tree.parts() else {
        return out;
    };

    let tables = store.lock();
    let order = schedule(&tables, root);
    let mut ids: FxHashMap<NodeKey, u32> = FxHashMap::default();
    ids.reserve(order.len());

    for key in order {
        let node = tables.node(key);
        out.push(node.op.as_byte());

        // Ids are bounded by the number of nodes in one graph
        #[allow(
            clippy::cast_possible_truncation,
            reason = "a graph with more than u32::MAX nodes cannot be built in memory"
        )]
        let next = ids.len() as u32;
        ids.insert(key, next);

        match node.op {
            Opcode::Constant => out.extend_from_slice(&node.value.to_le_bytes()),
            Opcode::Variable => {
                let id = Id::from_key(store.id(), key);
                write_string(lookup(&t.var_names, id), &mut out);
                write_string(lookup(&t.var_docs, id), &mut out);
            }
            _ => {}
        }
        // Operands were scheduled earlier, so their ids are assigned
        if let Some(rhs) = node.rhs {
            out.extend_from_slice(&ids[&rhs].to_le_bytes());
        }
        if let Some(lhs) = node.lhs {
            out.extend_from_slice(&ids[&lhs].to_le_bytes());
        }
    }

    debug!(
        "serialized template '{}': {} nodes, {} bytes",
        t.name,
        ids.len(),
        out.len()
    );
    out
}
