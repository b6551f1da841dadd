use rustc_hash::FxHashMap;

use crate::tests::{eval, same_value};
use crate::{InvalidExpression, Opcode, Store, Tree};

fn no_vars() -> FxHashMap<crate::Id, f64> {
    FxHashMap::default()
}

#[test]
fn test_identity_remap_keeps_node() {
    let store = Store::new();
    let (x, y, z) = (store.x(), store.y(), store.z());
    let t = (&x * &y).sin() + &z;
    let same = t.remap(&x, &y, &z).unwrap();
    assert_eq!(same.id(), t.id());
}

#[test]
fn test_remap_without_coordinates_is_noop() {
    let store = Store::new();
    let v = store.var();
    let t = v.exp() * 3.0;
    let before = store.len();
    let out = t
        .remap(&store.constant(1.0), &store.constant(2.0), &store.constant(3.0))
        .unwrap();
    assert_eq!(out.id(), t.id());
    // Coordinates are looked up, never created
    assert_eq!(store.len(), before);
}

#[test_log::test]
fn test_remap_translates() {
    let store = Store::new();
    let (x, y, z) = (store.x(), store.y(), store.z());
    let sphere = (&x * &x + &y * &y + &z * &z).sqrt() - 1.0;
    let moved = sphere.remap(&(&x - 2.0), &y, &(&z * 0.5)).unwrap();

    let vars = no_vars();
    for p in [[2.0, 0.0, 0.0], [0.5, -1.0, 3.0], [-4.0, 2.0, 1.0]] {
        let expected = eval(&sphere, [p[0] - 2.0, p[1], p[2] * 0.5], &vars);
        assert!(same_value(eval(&moved, p, &vars), expected));
    }
    assert!(same_value(eval(&moved, [2.0, 0.0, 0.0], &vars), -1.0));
}

#[test]
fn test_remap_preserves_sharing() {
    let store = Store::new();
    let (x, y, z) = (store.x(), store.y(), store.z());
    let shared = &x + &y;
    let t = &shared * &shared;
    let out = t.remap(&y, &x, &z).unwrap();
    // Still one product of a single shared sum
    assert_eq!(out.node_count(), 4);
    assert_eq!(out.lhs().id(), out.rhs().id());
    assert_eq!(out.lhs().id(), (&y + &x).id());
}

#[test]
fn test_untouched_subgraphs_keep_identity() {
    let store = Store::new();
    let (x, y, z) = (store.x(), store.y(), store.z());
    let left = y.sin().cos();
    let t = &left + &x;
    let out = t.remap(&(&x + 1.0), &y, &z).unwrap();
    assert_eq!(out.lhs().id(), left.id());
    assert_ne!(out.rhs().id(), x.id());
}

#[test]
fn test_remap_idempotent_without_coordinates() {
    let store = Store::new();
    let (x, y, z) = (store.x(), store.y(), store.z());
    let t = x.atan2(&y).max(&z);
    let a = store.var();
    let b = store.var();
    let c = store.var();
    let once = t.remap(&a, &b, &c).unwrap();
    let twice = once.remap(&a, &b, &c).unwrap();
    assert_eq!(once.id(), twice.id());
}

#[test]
fn test_remap_errors() {
    let store = Store::new();
    let (x, y, z) = (store.x(), store.y(), store.z());
    let t = &x + &y;
    assert_eq!(
        t.remap(&Tree::default(), &y, &z).unwrap_err(),
        InvalidExpression::EmptyReplacement
    );
    let other = Store::new();
    assert_eq!(
        t.remap(&x, &other.y(), &z).unwrap_err(),
        InvalidExpression::StoreMismatch
    );
}

#[test]
fn test_remap_empty_tree() {
    let store = Store::new();
    let out = Tree::default().remap(&store.x(), &store.y(), &store.z()).unwrap();
    assert!(out.is_empty());
}

#[test]
fn test_substitute_variable() {
    let store = Store::new();
    let r = store.var();
    let x = store.x();
    let t = &x - &r;
    let out = t.substitute(&[(&r, &store.constant(2.0))]).unwrap();
    assert_eq!(out.id(), (&x - 2.0).id());

    let mut vars = FxHashMap::default();
    vars.insert(r.id(), 2.0);
    assert!(same_value(
        eval(&out, [5.0, 0.0, 0.0], &no_vars()),
        eval(&t, [5.0, 0.0, 0.0], &vars)
    ));
}

#[test]
fn test_substitute_root_and_last_wins() {
    let store = Store::new();
    let r = store.var();
    let one = store.constant(1.0);
    let two = store.constant(2.0);
    let out = r.substitute(&[(&r, &one), (&r, &two)]).unwrap();
    assert_eq!(out.id(), two.id());

    // Empty targets are skipped
    let out = r.substitute(&[(&Tree::default(), &one)]).unwrap();
    assert_eq!(out.id(), r.id());
}

#[test]
fn test_substitute_checks_exponents() {
    let store = Store::new();
    let x = store.x();
    let two = store.constant(2.0);
    let t = x.pow(&two).unwrap();

    assert_eq!(
        t.substitute(&[(&two, &store.y())]).unwrap_err(),
        InvalidExpression::NonConstantExponent { op: Opcode::Pow }
    );
    let cube = t.substitute(&[(&two, &store.constant(3.0))]).unwrap();
    assert_eq!(cube.id(), x.powi(3).unwrap().id());
}

#[test]
fn test_substitute_failure_leaks_nothing() {
    let store = Store::new();
    let t = {
        let x = store.x();
        x.sin().pow(&store.constant(2.0)).unwrap()
    };
    let before = store.len();
    {
        let two = t.rhs();
        let y = store.y();
        assert!(t.substitute(&[(&two, &y)]).is_err());
    }
    assert_eq!(store.len(), before);
    drop(t);
    assert!(store.is_empty());
}

#[test]
fn test_substitute_errors() {
    let store = Store::new();
    let x = store.x();
    let t = x.sin();
    assert_eq!(
        t.substitute(&[(&x, &Tree::default())]).unwrap_err(),
        InvalidExpression::EmptyReplacement
    );
    let other = Store::new();
    assert_eq!(
        t.substitute(&[(&other.x(), &x)]).unwrap_err(),
        InvalidExpression::StoreMismatch
    );
}
