//! Error types for graph construction and template decoding

use std::fmt;

use super::opcode::Opcode;

/// Contract violations detected while constructing a node.
///
/// These are programmer errors: the graph is rejected before any node is
/// allocated, so an invalid expression can never reach an evaluator.
#[derive(Debug, Clone, PartialEq)]
pub enum InvalidExpression {
    /// Operand pattern does not match the opcode's declared arity
    ArityMismatch {
        op: Opcode,
        expected: usize,
        lhs: bool,
        rhs: bool,
    },
    /// Leaves are created through `constant` / `var`, never `operation`
    LeafOperation(Opcode),
    /// POW / NTH_ROOT exponent must be a constant node
    NonConstantExponent { op: Opcode },
    /// POW / NTH_ROOT exponent must be integral
    NonIntegralExponent { op: Opcode, value: f64 },
    /// NTH_ROOT exponent must be strictly positive
    NonPositiveRoot { value: f64 },
    /// Operands (or substitution targets) belong to different stores
    StoreMismatch,
    /// A substitution replacement was an empty handle
    EmptyReplacement,
}

impl fmt::Display for InvalidExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidExpression::ArityMismatch {
                op,
                expected,
                lhs,
                rhs,
            } => {
                let given = |b: &bool| if *b { "present" } else { "absent" };
                write!(
                    f,
                    "Invalid expression: '{}' takes {} operand(s), but lhs is {} and rhs is {}",
                    op,
                    expected,
                    given(lhs),
                    given(rhs)
                )
            }
            InvalidExpression::LeafOperation(op) => {
                write!(
                    f,
                    "Invalid expression: '{}' is a leaf and cannot be built as an operation",
                    op
                )
            }
            InvalidExpression::NonConstantExponent { op } => {
                write!(
                    f,
                    "Invalid expression: exponent of '{}' must be a constant",
                    op
                )
            }
            InvalidExpression::NonIntegralExponent { op, value } => {
                write!(
                    f,
                    "Invalid expression: exponent of '{}' must be an integer, got {}",
                    op, value
                )
            }
            InvalidExpression::NonPositiveRoot { value } => {
                write!(
                    f,
                    "Invalid expression: root index must be a positive integer, got {}",
                    value
                )
            }
            InvalidExpression::StoreMismatch => {
                write!(f, "Invalid expression: operands come from different stores")
            }
            InvalidExpression::EmptyReplacement => {
                write!(f, "Invalid expression: substitution replacement is empty")
            }
        }
    }
}

impl std::error::Error for InvalidExpression {}

/// Errors raised while decoding a serialized template
#[derive(Debug, Clone, PartialEq)]
pub enum MalformedTemplate {
    /// First byte is not the `'T'` tag
    MissingHeader { found: Option<u8> },
    /// Input ended in the middle of a field
    UnexpectedEnd {
        offset: usize,
        expected: &'static str,
    },
    /// A string field does not start with `"`
    ExpectedString { byte: u8, offset: usize },
    /// A string was opened but never closed
    UnterminatedString { offset: usize },
    /// A record starts with a byte that is not in the opcode catalog
    UnknownOpcode { byte: u8, offset: usize },
    /// An operand refers to a sequential id that has not been emitted yet
    UnassignedReference { id: u32, offset: usize },
    /// String bytes are not valid UTF-8
    InvalidUtf8 { offset: usize },
    /// Node count exceeds the reader's limit
    TooManyNodes { limit: usize },
    /// A single string exceeds the reader's limit
    StringTooLong { limit: usize, offset: usize },
    /// Record decoded cleanly but violates a construction contract
    InvalidExpression {
        offset: usize,
        source: InvalidExpression,
    },
}

impl fmt::Display for MalformedTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MalformedTemplate::MissingHeader { found } => match found {
                Some(b) => write!(
                    f,
                    "Malformed template: expected 'T' header, got byte {:#04x}",
                    b
                ),
                None => write!(f, "Malformed template: input is empty"),
            },
            MalformedTemplate::UnexpectedEnd { offset, expected } => {
                write!(
                    f,
                    "Malformed template: input ends at byte {} while reading {}",
                    offset, expected
                )
            }
            MalformedTemplate::ExpectedString { byte, offset } => {
                write!(
                    f,
                    "Malformed template: expected '\"' at byte {}, got {:#04x}",
                    offset, byte
                )
            }
            MalformedTemplate::UnterminatedString { offset } => {
                write!(
                    f,
                    "Malformed template: string starting at byte {} is never closed",
                    offset
                )
            }
            MalformedTemplate::UnknownOpcode { byte, offset } => {
                write!(
                    f,
                    "Malformed template: unknown opcode {} at byte {}",
                    byte, offset
                )
            }
            MalformedTemplate::UnassignedReference { id, offset } => {
                write!(
                    f,
                    "Malformed template: operand id {} at byte {} refers to no earlier node",
                    id, offset
                )
            }
            MalformedTemplate::InvalidUtf8 { offset } => {
                write!(
                    f,
                    "Malformed template: string starting at byte {} is not valid UTF-8",
                    offset
                )
            }
            MalformedTemplate::TooManyNodes { limit } => {
                write!(f, "Malformed template: more than {} nodes", limit)
            }
            MalformedTemplate::StringTooLong { limit, offset } => {
                write!(
                    f,
                    "Malformed template: string at byte {} is longer than {} bytes",
                    offset, limit
                )
            }
            MalformedTemplate::InvalidExpression { offset, source } => {
                write!(f, "Malformed template: record at byte {}: {}", offset, source)
            }
        }
    }
}

impl std::error::Error for MalformedTemplate {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MalformedTemplate::InvalidExpression { source, .. } => Some(source),
            _ => None,
        }
    }
}
