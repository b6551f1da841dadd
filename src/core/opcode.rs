//! Opcode catalog
//!
//! Every node in the graph carries one [`Opcode`]. The catalog fixes, for each
//! opcode, its operand count and the byte written for it by the template
//! codec. Byte values are part of the persisted format and must never be
//! renumbered.

use std::fmt;

/// Operator tag for a graph node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Opcode {
    // Leaves
    /// Numeric literal; the value lives in the node
    Constant = 0,
    /// Free variable; never deduplicated
    Variable = 1,

    // Coordinates (nullary operations, canonical per store)
    VarX = 2,
    VarY = 3,
    VarZ = 4,

    // Unary
    Square = 5,
    Sqrt = 6,
    Neg = 7,
    Sin = 8,
    Cos = 9,
    Tan = 10,
    Asin = 11,
    Acos = 12,
    Atan = 13,
    Exp = 14,

    // Binary
    Add = 15,
    Mul = 16,
    Min = 17,
    Max = 18,
    Sub = 19,
    Div = 20,
    Atan2 = 21,
    Pow = 22,
    NthRoot = 23,
    Mod = 24,
    NanFill = 25,
}

impl Opcode {
    /// All opcodes, in byte order
    pub const ALL: [Opcode; 26] = [
        Opcode::Constant,
        Opcode::Variable,
        Opcode::VarX,
        Opcode::VarY,
        Opcode::VarZ,
        Opcode::Square,
        Opcode::Sqrt,
        Opcode::Neg,
        Opcode::Sin,
        Opcode::Cos,
        Opcode::Tan,
        Opcode::Asin,
        Opcode::Acos,
        Opcode::Atan,
        Opcode::Exp,
        Opcode::Add,
        Opcode::Mul,
        Opcode::Min,
        Opcode::Max,
        Opcode::Sub,
        Opcode::Div,
        Opcode::Atan2,
        Opcode::Pow,
        Opcode::NthRoot,
        Opcode::Mod,
        Opcode::NanFill,
    ];

    /// Number of operands a node with this opcode carries (0, 1 or 2)
    #[inline]
    #[must_use]
    pub const fn arity(self) -> usize {
        match self {
            Opcode::Constant | Opcode::Variable | Opcode::VarX | Opcode::VarY | Opcode::VarZ => 0,
            Opcode::Square
            | Opcode::Sqrt
            | Opcode::Neg
            | Opcode::Sin
            | Opcode::Cos
            | Opcode::Tan
            | Opcode::Asin
            | Opcode::Acos
            | Opcode::Atan
            | Opcode::Exp => 1,
            Opcode::Add
            | Opcode::Mul
            | Opcode::Min
            | Opcode::Max
            | Opcode::Sub
            | Opcode::Div
            | Opcode::Atan2
            | Opcode::Pow
            | Opcode::NthRoot
            | Opcode::Mod
            | Opcode::NanFill => 2,
        }
    }

    /// Byte written for this opcode in serialized templates
    #[inline]
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        self as u8
    }

    /// Inverse of [`Opcode::as_byte`]
    #[must_use]
    pub fn from_byte(byte: u8) -> Option<Self> {
        Self::ALL.get(usize::from(byte)).copied()
    }

    /// True for the two designated leaf kinds
    #[inline]
    #[must_use]
    pub const fn is_leaf(self) -> bool {
        matches!(self, Opcode::Constant | Opcode::Variable)
    }

    /// True for the X / Y / Z coordinate opcodes
    #[inline]
    #[must_use]
    pub const fn is_coordinate(self) -> bool {
        matches!(self, Opcode::VarX | Opcode::VarY | Opcode::VarZ)
    }

    /// Lowercase mnemonic used by `Display`
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Opcode::Constant => "const",
            Opcode::Variable => "var",
            Opcode::VarX => "x",
            Opcode::VarY => "y",
            Opcode::VarZ => "z",
            Opcode::Square => "square",
            Opcode::Sqrt => "sqrt",
            Opcode::Neg => "neg",
            Opcode::Sin => "sin",
            Opcode::Cos => "cos",
            Opcode::Tan => "tan",
            Opcode::Asin => "asin",
            Opcode::Acos => "acos",
            Opcode::Atan => "atan",
            Opcode::Exp => "exp",
            Opcode::Add => "add",
            Opcode::Mul => "mul",
            Opcode::Min => "min",
            Opcode::Max => "max",
            Opcode::Sub => "sub",
            Opcode::Div => "div",
            Opcode::Atan2 => "atan2",
            Opcode::Pow => "pow",
            Opcode::NthRoot => "nth-root",
            Opcode::Mod => "mod",
            Opcode::NanFill => "nanfill",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_codes_round_trip() {
        for (i, op) in Opcode::ALL.iter().enumerate() {
            assert_eq!(usize::from(op.as_byte()), i);
            assert_eq!(Opcode::from_byte(op.as_byte()), Some(*op));
        }
        assert_eq!(Opcode::from_byte(26), None);
        assert_eq!(Opcode::from_byte(255), None);
    }

    #[test]
    fn test_arity_table() {
        assert_eq!(Opcode::Constant.arity(), 0);
        assert_eq!(Opcode::Variable.arity(), 0);
        assert_eq!(Opcode::VarZ.arity(), 0);
        assert_eq!(Opcode::Neg.arity(), 1);
        assert_eq!(Opcode::Exp.arity(), 1);
        assert_eq!(Opcode::Add.arity(), 2);
        assert_eq!(Opcode::NanFill.arity(), 2);
    }

    #[test]
    fn test_leaf_and_coordinate_classes() {
        let coords: Vec<Opcode> = Opcode::ALL
            .into_iter()
            .filter(|op| op.is_coordinate())
            .collect();
        assert_eq!(coords, [Opcode::VarX, Opcode::VarY, Opcode::VarZ]);
        assert!(coords.iter().all(|op| op.arity() == 0 && !op.is_leaf()));

        let leaves: Vec<Opcode> = Opcode::ALL
            .into_iter()
            .filter(|op| op.is_leaf())
            .collect();
        assert_eq!(leaves, [Opcode::Constant, Opcode::Variable]);
    }
}
