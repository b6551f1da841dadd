//! Graph algorithms over trees: scheduling and substitution.
//!
//! Both are exposed as methods on [`Tree`](crate::Tree):
//! [`ordered`](crate::Tree::ordered), [`node_count`](crate::Tree::node_count),
//! [`remap`](crate::Tree::remap) and [`substitute`](crate::Tree::substitute).

pub(crate) mod ordered;
mod remap;
