//! Parallel batch operations using Rayon
//!
//! Enable with the `parallel` feature:
//! ```toml
//! implicit-kernel = { version = "0.1", features = ["parallel"] }
//! ```
//!
//! Trees and stores are `Send + Sync`; every intern and release is a single
//! critical section on the owning store, so batches may freely share
//! subgraphs.

use rayon::prelude::*;

use crate::{InvalidExpression, Template, Tree};

/// Serialize every template, in parallel. Output order matches input order.
pub fn serialize_all(templates: &[Template]) -> Vec<Vec<u8>> {
    templates.par_iter().map(Template::serialize).collect()
}

/// Remap every tree with the same coordinate replacements, in parallel.
///
/// # Errors
/// Returns the first [`InvalidExpression`] encountered.
pub fn remap_all(
    trees: &[Tree],
    x: &Tree,
    y: &Tree,
    z: &Tree,
) -> Result<Vec<Tree>, InvalidExpression> {
    trees.par_iter().map(|t| t.remap(x, y, z)).collect()
}

/// Schedule every tree, in parallel
pub fn ordered_all(trees: &[Tree]) -> Vec<Vec<Tree>> {
    trees.par_iter().map(Tree::ordered).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Store;

    #[test]
    fn test_batches_match_sequential() {
        let store = Store::new();
        let (x, y, z) = (store.x(), store.y(), store.z());
        let trees: Vec<Tree> = (0..32_i32)
            .map(|i| (&x - f64::from(i)).square() + y.sin() * &z)
            .collect();
        let templates: Vec<Template> = trees
            .iter()
            .enumerate()
            .map(|(i, t)| Template::new(format!("t{}", i), t.clone()))
            .collect();

        let encoded = serialize_all(&templates);
        for (t, bytes) in templates.iter().zip(&encoded) {
            assert_eq!(&t.serialize(), bytes);
        }

        let shifted = &x + 1.0;
        let moved = remap_all(&trees, &shifted, &y, &z).unwrap();
        for (t, m) in trees.iter().zip(&moved) {
            assert_eq!(t.remap(&shifted, &y, &z).unwrap().id(), m.id());
        }

        let orders = ordered_all(&trees);
        assert!(orders.iter().zip(&trees).all(|(o, t)| o.last() == Some(t)));
    }

    #[test]
    fn test_remap_all_reports_errors() {
        let store = Store::new();
        let trees = vec![store.x().sin(), store.y().cos()];
        let err = remap_all(&trees, &Tree::default(), &store.y(), &store.z()).unwrap_err();
        assert_eq!(err, InvalidExpression::EmptyReplacement);
    }
}
