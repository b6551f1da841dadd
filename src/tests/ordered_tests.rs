use rustc_hash::{FxHashMap, FxHashSet};

use crate::{Id, Store, Tree};

/// Each node appears once, after its operands
fn assert_topological(order: &[Tree]) {
    let mut seen: FxHashMap<Id, usize> = FxHashMap::default();
    for (i, n) in order.iter().enumerate() {
        for operand in [n.lhs(), n.rhs()] {
            if operand.is_empty() {
                continue;
            }
            let at = seen.get(&operand.id());
            assert!(at.is_some_and(|&j| j < i), "operand of {} scheduled late", n);
        }
        assert!(seen.insert(n.id(), i).is_none(), "{} scheduled twice", n);
    }
}

#[test]
fn test_operands_precede_consumers() {
    let store = Store::new();
    let (x, y, z) = (store.x(), store.y(), store.z());
    let r = store.var();
    let t = ((&x * &x + &y * &y + &z * &z).sqrt() - &r).max(&(&x - 1.0).abs());

    let order = t.ordered();
    assert_topological(&order);
    assert_eq!(order.last(), Some(&t));
    assert_eq!(order.len(), t.node_count());
}

#[test]
fn test_shared_nodes_listed_once() {
    let store = Store::new();
    let x = store.x();
    let s = x.sin();
    let t = &s * &s + &s;

    let order = t.ordered();
    // x, sin x, sin x * sin x, root
    assert_eq!(order.len(), 4);
    let ids: FxHashSet<Id> = order.iter().map(Tree::id).collect();
    assert_eq!(ids.len(), order.len());
    assert_topological(&order);
}

#[test]
fn test_leaf_root() {
    let store = Store::new();
    let c = store.constant(5.0);
    let order = c.ordered();
    assert_eq!(order, vec![c.clone()]);
    assert_eq!(c.node_count(), 1);
}

#[test]
fn test_empty_tree_schedules_nothing() {
    assert!(Tree::default().ordered().is_empty());
    assert_eq!(Tree::default().node_count(), 0);
}

#[test]
fn test_ranks_ascend_through_schedule() {
    let store = Store::new();
    let x = store.x();
    let t = (x.exp() + x.sin().cos()).sqrt();
    let ranks: Vec<usize> = t.ordered().iter().filter_map(Tree::rank).collect();
    assert!(ranks.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(ranks.first(), Some(&0));
    assert_eq!(t.rank(), Some(4));
}

#[test]
fn test_schedule_keeps_nodes_alive() {
    let store = Store::new();
    let order = {
        let x = store.x();
        (&x + 2.0).ordered()
    };
    // The root and operands survive as long as the scheduled handles do
    assert_eq!(store.len(), 3);
    assert_eq!(order.last().and_then(|t| t.rhs().value()), Some(2.0));
    drop(order);
    assert!(store.is_empty());
}
