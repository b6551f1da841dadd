//! Core types for expression graphs
//!
//! This module contains the fundamental types:
//! - `Opcode` - Operator catalog (arity and byte codes)
//! - `Store` - Hash-consing node store
//! - `Tree` / `Id` - Reference-counted node handles and their identities
//! - `InvalidExpression` / `MalformedTemplate` - Error types
//! - Operator overloading and display formatting for `Tree`

mod display; // Display implementation for Tree
pub(crate) mod error;
pub(crate) mod opcode;
mod ops; // Operator overloading for Tree
pub(crate) mod store;
pub(crate) mod tree;

// Public re-exports (for external API)
pub use error::{InvalidExpression, MalformedTemplate};
pub use opcode::Opcode;
pub use store::{Id, Store};
pub use tree::Tree;
