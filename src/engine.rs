//! The multiplication engine: validation, layout, reduction, materialization.

use log::debug;
use ndarray::{Array2, ArrayView2};

use crate::{
    config::EngineConfig,
    element::Element,
    error::{DotProductError, Result},
    layout::ScratchArena,
    materialize::OutputBuffer,
    matrix::{validate_pair, MatrixSource},
    reducer::{partition_rows, reduce, reduce_serial, CancellationToken, Dims},
};

/// Owns a worker pool and a scratch arena reused across calls.
///
/// Multiplication takes `&mut self`: one engine runs one product at a time,
/// so its scratch buffers are never shared by two calls. Use one engine per
/// thread for concurrent products.
pub struct Engine<T> {
    config: EngineConfig,
    pool: rayon::ThreadPool,
    arena: ScratchArena<T>,
}

impl<T: Element> Engine<T> {
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;

        let prefix = config.thread_name_prefix.clone();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.workers)
            .thread_name(move |idx| format!("{prefix}-{idx}"))
            .build()
            .map_err(|e| DotProductError::ThreadPool {
                message: e.to_string(),
            })?;

        debug!(
            "engine ready: {} workers, scratch limit {:?}",
            config.workers, config.max_elements
        );

        Ok(Engine {
            arena: ScratchArena::with_limit(config.max_elements),
            config,
            pool,
        })
    }

    /// Engine with [`EngineConfig::default`].
    pub fn with_defaults() -> Result<Self> {
        Self::new(EngineConfig::default())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn workers(&self) -> usize {
        self.config.workers
    }

    /// Elements currently held by the scratch arena.
    pub fn scratch_capacity(&self) -> usize {
        self.arena.capacity()
    }

    /// Multiplies two nested matrices, `left` (m x k) by `right` (k x n).
    pub fn multiply(&mut self, left: &[Vec<T>], right: &[Vec<T>]) -> Result<Vec<Vec<T>>> {
        self.run(left, right, None).map(|out| out.to_rows())
    }

    /// Like [`multiply`](Self::multiply), stopping early once `token` is
    /// cancelled. A cancelled call returns [`DotProductError::Cancelled`].
    pub fn multiply_cancellable(
        &mut self,
        left: &[Vec<T>],
        right: &[Vec<T>],
        token: &CancellationToken,
    ) -> Result<Vec<Vec<T>>> {
        self.run(left, right, Some(token)).map(|out| out.to_rows())
    }

    /// Multiplies two `ndarray` matrices.
    pub fn multiply_array(
        &mut self,
        left: ArrayView2<'_, T>,
        right: ArrayView2<'_, T>,
    ) -> Result<Array2<T>> {
        self.run(&left, &right, None).map(OutputBuffer::into_array)
    }

    /// Validates, lays out and reduces; the output is allocated only after
    /// every check has passed.
    pub fn run<L, R>(
        &mut self,
        left: &L,
        right: &R,
        cancel: Option<&CancellationToken>,
    ) -> Result<OutputBuffer<T>>
    where
        L: MatrixSource<T> + ?Sized,
        R: MatrixSource<T> + ?Sized,
    {
        let (left_shape, right_shape) = validate_pair(left, right)?;
        let dims = Dims::from_shapes(left_shape, right_shape);

        if dims.m == 0 {
            return Ok(OutputBuffer::zeros(0, dims.n));
        }

        self.arena.prepare(left, left_shape, right, right_shape)?;
        let (row_major, column_major) = self.arena.buffers();

        let mut output = OutputBuffer::zeros(dims.m, dims.n);
        let workers = self.config.workers.min(dims.m);

        debug!(
            "multiply {} @ {} on {} workers, {} rows each",
            left_shape,
            right_shape,
            workers,
            partition_rows(dims.m, workers)
        );

        if workers == 1 {
            reduce_serial(row_major, column_major, dims, output.view_mut(), cancel)?;
        } else {
            let view = output.view_mut();
            self.pool
                .install(|| reduce(row_major, column_major, dims, view, workers, cancel))?;
        }

        Ok(output)
    }
}

impl<T> std::fmt::Debug for Engine<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("pool_threads", &self.pool.current_num_threads())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn engine(workers: usize) -> Engine<f64> {
        Engine::new(EngineConfig::default().with_workers(workers)).unwrap()
    }

    #[test]
    fn test_multiply_square() {
        let mut e = engine(2);
        let a = vec![vec![1.0, 2.0], vec![3.0, 4.0]];
        let b = vec![vec![5.0, 6.0], vec![7.0, 8.0]];
        assert_eq!(
            e.multiply(&a, &b).unwrap(),
            vec![vec![19.0, 22.0], vec![43.0, 50.0]]
        );
    }

    #[test]
    fn test_multiply_row_by_column() {
        let mut e = engine(4);
        let a = vec![vec![1.0, 0.0, 0.0]];
        let b = vec![vec![1.0], vec![2.0], vec![3.0]];
        assert_eq!(e.multiply(&a, &b).unwrap(), vec![vec![1.0]]);
    }

    #[test]
    fn test_reused_engine_shrinking_inputs() {
        let mut e = engine(3);
        let big: Vec<Vec<f64>> = (0..9).map(|i| vec![i as f64; 9]).collect();
        e.multiply(&big, &big).unwrap();

        let a = vec![vec![2.0]];
        let b = vec![vec![3.0, 4.0]];
        assert_eq!(e.multiply(&a, &b).unwrap(), vec![vec![6.0, 8.0]]);
    }

    #[test]
    fn test_multiply_array() {
        let mut e = engine(2);
        let a = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]];
        let b = array![[7.0, 8.0], [9.0, 10.0], [11.0, 12.0]];
        let c = e.multiply_array(a.view(), b.view()).unwrap();
        assert_eq!(c, a.dot(&b));
    }

    #[test]
    fn test_multiply_array_empty_inner() {
        let mut e = engine(2);
        let a: Array2<f64> = Array2::zeros((3, 0));
        let b: Array2<f64> = Array2::zeros((0, 4));
        let c = e.multiply_array(a.view(), b.view()).unwrap();
        assert_eq!(c, Array2::zeros((3, 4)));
    }

    #[test]
    fn test_multiply_array_views_of_different_lifetimes() {
        let mut e = engine(2);
        let a = array![[1.0, 2.0], [3.0, 4.0]];
        let left = a.view();
        let c = {
            let b = array![[5.0, 6.0], [7.0, 8.0]];
            e.multiply_array(left, b.view()).unwrap()
        };
        assert_eq!(c, array![[19.0, 22.0], [43.0, 50.0]]);
    }

    #[test]
    fn test_run_mixes_nested_and_array_operands() {
        let mut e = engine(2);
        let a = vec![vec![1.0, 2.0, 3.0]];
        let b = array![[1.0], [1.0], [1.0]];
        let out = e.run(a.as_slice(), &b.view(), None).unwrap();
        assert_eq!(out.to_rows(), vec![vec![6.0]]);
    }

    #[test]
    fn test_multiply_array_no_rows_still_checks_inner() {
        let mut e = engine(2);
        let a: Array2<f64> = Array2::zeros((0, 3));
        let b: Array2<f64> = Array2::zeros((2, 5));
        assert_eq!(
            e.multiply_array(a.view(), b.view()),
            Err(DotProductError::DimensionMismatch {
                left_columns: 3,
                right_rows: 2,
            })
        );
    }

    #[test]
    fn test_mismatch_rejected() {
        let mut e = engine(2);
        let a = vec![vec![1.0, 2.0]];
        let b = vec![vec![1.0, 2.0]];
        assert_eq!(
            e.multiply(&a, &b),
            Err(DotProductError::DimensionMismatch {
                left_columns: 2,
                right_rows: 1,
            })
        );
    }

    #[test]
    fn test_capacity_rejected_before_work() {
        let mut e = Engine::<f64>::new(EngineConfig::default().with_max_elements(Some(4))).unwrap();
        let a = vec![vec![1.0; 3]; 2];
        let b = vec![vec![1.0; 2]; 3];
        assert!(matches!(
            e.multiply(&a, &b),
            Err(DotProductError::CapacityExceeded { .. })
        ));
        assert_eq!(e.scratch_capacity(), 0);
    }

    #[test]
    fn test_zero_workers_rejected() {
        let err = Engine::<f64>::new(EngineConfig::default().with_workers(0)).unwrap_err();
        assert!(matches!(err, DotProductError::InvalidConfig { .. }));
    }

    #[test]
    fn test_cancelled_call() {
        let mut e = engine(4);
        let a = vec![vec![1.0; 4]; 8];
        let token = CancellationToken::new();
        token.cancel();
        assert!(matches!(
            e.multiply_cancellable(&a, &a[..4], &token),
            Err(DotProductError::Cancelled { total_rows: 8, .. })
        ));

        // the same engine still works afterwards
        let fresh = CancellationToken::new();
        let out = e.multiply_cancellable(&a, &a[..4], &fresh).unwrap();
        assert_eq!(out, vec![vec![4.0; 4]; 8]);
    }

    #[test]
    fn test_integer_engine() {
        let mut e = Engine::<i64>::new(EngineConfig::default().with_workers(2)).unwrap();
        let a = vec![vec![1, 2], vec![3, 4]];
        let b = vec![vec![5, 6], vec![7, 8]];
        assert_eq!(e.multiply(&a, &b).unwrap(), vec![vec![19, 22], vec![43, 50]]);
    }
}
