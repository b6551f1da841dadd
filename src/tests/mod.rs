mod ordered_tests;
mod remap_tests;

use rustc_hash::FxHashMap;

use crate::{Id, Opcode, Tree};

/// Reference evaluator used to compare graphs numerically.
///
/// Walks `tree.ordered()` once; free variables read from `vars`
/// (defaulting to 0).
pub(crate) fn eval(tree: &Tree, xyz: [f64; 3], vars: &FxHashMap<Id, f64>) -> f64 {
    let mut vals: FxHashMap<Id, f64> = FxHashMap::default();
    for n in tree.ordered() {
        let a = vals.get(&n.lhs().id()).copied().unwrap_or(f64::NAN);
        let b = vals.get(&n.rhs().id()).copied().unwrap_or(f64::NAN);
        let v = match n.opcode().expect("scheduled nodes are non-empty") {
            Opcode::Constant => n.value().expect("constant has a value"),
            Opcode::Variable => vars.get(&n.id()).copied().unwrap_or(0.0),
            Opcode::VarX => xyz[0],
            Opcode::VarY => xyz[1],
            Opcode::VarZ => xyz[2],
            Opcode::Square => a * a,
            Opcode::Sqrt => a.sqrt(),
            Opcode::Neg => -a,
            Opcode::Sin => a.sin(),
            Opcode::Cos => a.cos(),
            Opcode::Tan => a.tan(),
            Opcode::Asin => a.asin(),
            Opcode::Acos => a.acos(),
            Opcode::Atan => a.atan(),
            Opcode::Exp => a.exp(),
            Opcode::Add => a + b,
            Opcode::Mul => a * b,
            Opcode::Min => a.min(b),
            Opcode::Max => a.max(b),
            Opcode::Sub => a - b,
            Opcode::Div => a / b,
            Opcode::Atan2 => a.atan2(b),
            Opcode::Pow => a.powf(b),
            Opcode::NthRoot => a.powf(1.0 / b),
            Opcode::Mod => a.rem_euclid(b),
            Opcode::NanFill => {
                if a.is_nan() {
                    b
                } else {
                    a
                }
            }
        };
        vals.insert(n.id(), v);
    }
    vals.get(&tree.id()).copied().unwrap_or(f64::NAN)
}

/// Equality that treats NaN as equal to NaN
pub(crate) fn same_value(a: f64, b: f64) -> bool {
    (a.is_nan() && b.is_nan()) || a == b
}
