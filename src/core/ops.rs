//! Operator overloading and math methods for [`Tree`].
//!
//! These are thin wrappers over [`Tree::operation`]. The only construction
//! failures they can hit are programmer errors (an empty operand, or operands
//! from two different stores), so they panic with the
//! [`InvalidExpression`](crate::InvalidExpression) message instead of returning
//! a `Result`. `pow` and `nth_root` have data-dependent preconditions and
//! return `Result`.
//!
//! `abs(a)` is built as `max(a, -a)` rather than getting its own opcode, so it
//! shares nodes with any other use of `-a`.

use std::ops::{Add, Div, Mul, Neg, Sub};

use crate::core::error::InvalidExpression;
use crate::core::opcode::Opcode;
use crate::core::store::Store;
use crate::core::tree::Tree;

/// Build a node, panicking on contract violations
fn build(op: Opcode, a: &Tree, b: &Tree) -> Tree {
    match Tree::operation(op, a, b) {
        Ok(t) => t,
        Err(e) => panic!("{}", e),
    }
}

/// Constant in the same store as `like`
fn constant_like(like: &Tree, value: f64) -> Tree {
    like.store().unwrap_or_else(|| Store::global()).constant(value)
}

macro_rules! impl_unary_methods {
    ($($fn_name:ident => $op:expr),* $(,)?) => {
        impl Tree {
            $(
                /// # Panics
                ///
                /// Panics if `self` is empty.
                #[must_use]
                pub fn $fn_name(&self) -> Tree {
                    build($op, self, &Tree::default())
                }
            )*
        }
    };
}

impl_unary_methods!(
    square => Opcode::Square,
    sqrt => Opcode::Sqrt,
    sin => Opcode::Sin,
    cos => Opcode::Cos,
    tan => Opcode::Tan,
    asin => Opcode::Asin,
    acos => Opcode::Acos,
    atan => Opcode::Atan,
    exp => Opcode::Exp,
);

macro_rules! impl_binary_methods {
    ($($fn_name:ident => $op:expr),* $(,)?) => {
        impl Tree {
            $(
                /// # Panics
                ///
                /// Panics if either operand is empty or they live in different stores.
                #[must_use]
                pub fn $fn_name(&self, other: &Tree) -> Tree {
                    build($op, self, other)
                }
            )*
        }
    };
}

impl_binary_methods!(
    min => Opcode::Min,
    max => Opcode::Max,
    atan2 => Opcode::Atan2,
    modulo => Opcode::Mod,
    nanfill => Opcode::NanFill,
);

impl Tree {
    /// `max(self, -self)`
    ///
    /// # Panics
    ///
    /// Panics if `self` is empty.
    #[must_use]
    pub fn abs(&self) -> Tree {
        self.max(&-self)
    }

    /// Raise to an integral constant power (any sign).
    ///
    /// # Errors
    /// Fails if `exponent` is not a constant with an integral value, or on an
    /// arity / store mismatch.
    pub fn pow(&self, exponent: &Tree) -> Result<Tree, InvalidExpression> {
        Tree::operation(Opcode::Pow, self, exponent)
    }

    /// The `n`-th root, for a strictly positive integral constant `n`.
    ///
    /// # Errors
    /// Fails if `n` is not a constant, not integral, or not positive, or on an
    /// arity / store mismatch.
    pub fn nth_root(&self, n: &Tree) -> Result<Tree, InvalidExpression> {
        Tree::operation(Opcode::NthRoot, self, n)
    }

    /// Shorthand for `pow` with an integer exponent built in this tree's store
    ///
    /// # Errors
    /// Fails only if `self` is empty.
    pub fn powi(&self, exponent: i32) -> Result<Tree, InvalidExpression> {
        self.pow(&constant_like(self, f64::from(exponent)))
    }
}

macro_rules! impl_binary_ops {
    ($lhs:ty, $rhs:ty, $to_lhs:expr, $to_rhs:expr) => {
        impl Add<$rhs> for $lhs {
            type Output = Tree;
            fn add(self, rhs: $rhs) -> Tree {
                let (a, b) = ($to_lhs(&self, &rhs), $to_rhs(&self, &rhs));
                build(Opcode::Add, &a, &b)
            }
        }
        impl Sub<$rhs> for $lhs {
            type Output = Tree;
            fn sub(self, rhs: $rhs) -> Tree {
                let (a, b) = ($to_lhs(&self, &rhs), $to_rhs(&self, &rhs));
                build(Opcode::Sub, &a, &b)
            }
        }
        impl Mul<$rhs> for $lhs {
            type Output = Tree;
            fn mul(self, rhs: $rhs) -> Tree {
                let (a, b) = ($to_lhs(&self, &rhs), $to_rhs(&self, &rhs));
                build(Opcode::Mul, &a, &b)
            }
        }
        impl Div<$rhs> for $lhs {
            type Output = Tree;
            fn div(self, rhs: $rhs) -> Tree {
                let (a, b) = ($to_lhs(&self, &rhs), $to_rhs(&self, &rhs));
                build(Opcode::Div, &a, &b)
            }
        }
    };
}

// Tree-Tree (owned and borrowed)
impl_binary_ops!(Tree, Tree, |a: &Tree, _: &Tree| a.clone(), |_: &Tree, b: &Tree| b.clone());
impl_binary_ops!(
    Tree,
    &Tree,
    |a: &Tree, _: &&Tree| a.clone(),
    |_: &Tree, b: &&Tree| (*b).clone()
);
impl_binary_ops!(
    &Tree,
    Tree,
    |a: &&Tree, _: &Tree| (*a).clone(),
    |_: &&Tree, b: &Tree| b.clone()
);
impl_binary_ops!(
    &Tree,
    &Tree,
    |a: &&Tree, _: &&Tree| (*a).clone(),
    |_: &&Tree, b: &&Tree| (*b).clone()
);

// Tree-f64: the literal joins the tree's store
impl_binary_ops!(
    Tree,
    f64,
    |a: &Tree, _: &f64| a.clone(),
    |a: &Tree, b: &f64| constant_like(a, *b)
);
impl_binary_ops!(
    &Tree,
    f64,
    |a: &&Tree, _: &f64| (*a).clone(),
    |a: &&Tree, b: &f64| constant_like(a, *b)
);

// f64-Tree
impl_binary_ops!(
    f64,
    Tree,
    |a: &f64, b: &Tree| constant_like(b, *a),
    |_: &f64, b: &Tree| b.clone()
);
impl_binary_ops!(
    f64,
    &Tree,
    |a: &f64, b: &&Tree| constant_like(b, *a),
    |_: &f64, b: &&Tree| (*b).clone()
);

impl Neg for Tree {
    type Output = Tree;
    fn neg(self) -> Tree {
        build(Opcode::Neg, &self, &Tree::default())
    }
}

impl Neg for &Tree {
    type Output = Tree;
    fn neg(self) -> Tree {
        build(Opcode::Neg, self, &Tree::default())
    }
}

#[cfg(test)]
mod tests {
    use crate::{Opcode, Store};

    #[test]
    fn test_abs_reuses_neg_and_max() {
        let store = Store::new();
        let x = store.x();
        let a = x.abs();
        assert_eq!(a.opcode(), Some(Opcode::Max));
        assert_eq!(a.lhs().id(), x.id());
        assert_eq!(a.rhs().id(), (-&x).id());
    }

    #[test]
    fn test_literals_join_tree_store() {
        let store = Store::new();
        let x = store.x();
        let sum = 2.0 * &x + 1.0;
        assert!(sum.same_store(&x));
        assert_eq!(sum.rhs().value(), Some(1.0));
        assert_eq!(sum.lhs().lhs().value(), Some(2.0));
    }

    #[test]
    #[should_panic(expected = "different stores")]
    fn test_cross_store_operator_panics() {
        let a = Store::new().x();
        let b = Store::new().x();
        let _ = a + b;
    }

    #[test]
    #[should_panic(expected = "takes 1 operand")]
    fn test_empty_operand_panics() {
        let _ = crate::Tree::default().sin();
    }
}
