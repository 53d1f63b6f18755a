//! Cache-friendly, parallel dense matrix multiplication.
//!
//! A product runs as a three-stage pipeline:
//!
//! 1. [`layout`] flattens the left operand row-major and the right operand
//!    column-major, so both factors of every dot product are contiguous.
//! 2. [`reducer`] splits the output rows into contiguous ranges and computes
//!    each range on its own Rayon worker.
//! 3. [`materialize`] hands the result back as nested rows or an `ndarray`.
//!
//! ```
//! let a = vec![vec![1.0, 2.0], vec![3.0, 4.0]];
//! let b = vec![vec![5.0, 6.0], vec![7.0, 8.0]];
//!
//! let c = dotproduct::multiply(&a, &b).unwrap();
//! assert_eq!(c, vec![vec![19.0, 22.0], vec![43.0, 50.0]]);
//! ```
//!
//! Repeated products should go through an [`Engine`], which keeps its worker
//! pool and scratch buffers between calls:
//!
//! ```
//! use dotproduct::{Engine, EngineConfig};
//!
//! let mut engine = Engine::<f64>::new(EngineConfig::default().with_workers(4)).unwrap();
//! let identity = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
//! let m = vec![vec![2.5, -1.0], vec![0.5, 3.0]];
//! assert_eq!(engine.multiply(&m, &identity).unwrap(), m);
//! ```

pub mod config;
pub mod element;
pub mod engine;
pub mod error;
pub mod layout;
pub mod materialize;
pub mod matrix;
pub mod reducer;

use ndarray::{Array2, ArrayView2};

pub use config::EngineConfig;
pub use element::Element;
pub use engine::Engine;
pub use error::{DotProductError, Operand, Result};
pub use materialize::{Narrowing, OutputBuffer};
pub use matrix::{MatrixSource, Shape};
pub use reducer::CancellationToken;

/// Multiplies `left` (m x k) by `right` (k x n) with a one-shot engine
/// configured by [`EngineConfig::from_env`].
pub fn multiply<T: Element>(left: &[Vec<T>], right: &[Vec<T>]) -> Result<Vec<Vec<T>>> {
    Engine::new(EngineConfig::from_env())?.multiply(left, right)
}

/// [`multiply`] for `ndarray` inputs.
pub fn multiply_array<T: Element>(
    left: ArrayView2<'_, T>,
    right: ArrayView2<'_, T>,
) -> Result<Array2<T>> {
    Engine::new(EngineConfig::from_env())?.multiply_array(left, right)
}
