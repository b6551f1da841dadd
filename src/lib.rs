//! Implicit Surface Expression Graphs
//!
//! Builds and manipulates hash-consed expression graphs for implicit
//! (signed-distance style) functions, ready to hand to an evaluator.
//!
//! # Features
//! - **Global structural sharing**: identical subexpressions are always the
//!   same node, so common-subexpression elimination comes for free
//! - **Validated construction**: arity and POW / NTH_ROOT exponent rules are
//!   checked when a node is built, never later
//! - **Scheduling**: `Tree::ordered` lists nodes operands-first
//! - **Templates**: a compact, self-describing byte format for named,
//!   documented graphs
//! - **Substitution**: `Tree::remap` swaps the X / Y / Z coordinates for
//!   arbitrary subgraphs while preserving sharing
//!
//! # Usage Example
//! ```
//! use implicit_kernel::{Store, Template};
//!
//! let store = Store::new();
//! let (x, y, z) = (store.x(), store.y(), store.z());
//! let r = store.var();
//! let sphere = (&x * &x + &y * &y + &z * &z).sqrt() - &r;
//!
//! let t = Template::new("sphere", sphere).doc("A sphere").var_name(&r, "radius");
//! let bytes = t.serialize();
//! let back = Template::deserialize(&store, &bytes).unwrap();
//! assert_eq!(back.name, "sphere");
//! assert_eq!(back.serialize(), bytes);
//! ```

mod core;
mod graph;
mod template;

#[cfg(feature = "parallel")]
pub mod parallel;

#[cfg(test)]
mod tests;

// Re-export key types for easier usage
pub use crate::core::{Id, InvalidExpression, MalformedTemplate, Opcode, Store, Tree};
pub use template::{TEMPLATE_TAG, Template, TemplateReader};

/// Default maximum number of node records accepted when decoding a template
pub const DEFAULT_MAX_NODES: usize = 1_000_000;
/// Default maximum length, in bytes, of a decoded template string
pub const DEFAULT_MAX_STRING_LEN: usize = 1 << 20;
