//! Parallel dot-product reduction over the prepared scratch buffers.
//!
//! The output rows are split into contiguous ranges, one Rayon task per
//! range. A task owns its rows outright, so every output cell has exactly one
//! writer and the two input buffers are only ever read. Within a cell the sum
//! runs over `k` in increasing order, which makes the result independent of
//! how many workers took part.

use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc,
};

use log::{trace, warn};
use ndarray::{parallel::prelude::*, ArrayViewMut2, Axis};

use crate::{
    element::Element,
    error::{DotProductError, Result},
    matrix::Shape,
};

/// Dimensions of one product: `(m x k) @ (k x n)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dims {
    pub m: usize,
    pub k: usize,
    pub n: usize,
}

impl Dims {
    /// Combines validated operand shapes. The inner size is taken from the
    /// left operand, which equals `right.rows` unless the left operand is a
    /// nested matrix with no rows.
    pub fn from_shapes(left: Shape, right: Shape) -> Self {
        Dims {
            m: left.rows,
            k: left.cols,
            n: right.cols,
        }
    }
}

/// Cooperative stop signal shared between a caller and a running reduction.
///
/// Workers look at the flag before starting each row, so a row in progress
/// always completes.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// Rows handed to each worker: `ceil(rows / workers)`, never zero.
pub fn partition_rows(rows: usize, workers: usize) -> usize {
    rows.div_ceil(workers.max(1)).max(1)
}

#[inline(always)]
fn dot<T: Element>(lhs: &[T], rhs: &[T]) -> T {
    lhs.iter()
        .zip(rhs)
        .fold(T::zero(), |acc, (&a, &b)| acc + a * b)
}

#[inline(always)]
fn reduce_row<T: Element>(
    i: usize,
    row_major: &[T],
    column_major: &[T],
    dims: Dims,
    mut out_row: ndarray::ArrayViewMut1<'_, T>,
) {
    let k = dims.k;
    let lhs = &row_major[i * k..(i + 1) * k];
    for (j, cell) in out_row.iter_mut().enumerate() {
        *cell = dot(lhs, &column_major[j * k..(j + 1) * k]);
    }
}

/// Computes `output[i][j] = Σ_p row_major[i*k + p] * column_major[j*k + p]`
/// on the calling thread.
pub fn reduce_serial<T: Element>(
    row_major: &[T],
    column_major: &[T],
    dims: Dims,
    mut output: ArrayViewMut2<'_, T>,
    cancel: Option<&CancellationToken>,
) -> Result<()> {
    debug_assert_eq!(output.dim(), (dims.m, dims.n));

    for (i, out_row) in output.rows_mut().into_iter().enumerate() {
        if cancel.is_some_and(CancellationToken::is_cancelled) {
            warn!("reduction cancelled at row {} of {}", i, dims.m);
            return Err(DotProductError::Cancelled {
                completed_rows: i,
                total_rows: dims.m,
            });
        }
        reduce_row(i, row_major, column_major, dims, out_row);
    }

    Ok(())
}

/// Same contract as [`reduce_serial`], with rows partitioned over `workers`
/// tasks on the current Rayon pool.
pub fn reduce<T: Element>(
    row_major: &[T],
    column_major: &[T],
    dims: Dims,
    mut output: ArrayViewMut2<'_, T>,
    workers: usize,
    cancel: Option<&CancellationToken>,
) -> Result<()> {
    debug_assert_eq!(output.dim(), (dims.m, dims.n));

    let rows_per_worker = partition_rows(dims.m, workers);
    let completed = AtomicUsize::new(0);

    let outcome = output
        .axis_chunks_iter_mut(Axis(0), rows_per_worker)
        .into_par_iter()
        .enumerate()
        .try_for_each(|(worker, mut block)| {
            let first = worker * rows_per_worker;
            trace!(
                "worker {} takes rows {}..{}",
                worker,
                first,
                first + block.nrows()
            );

            for (offset, out_row) in block.rows_mut().into_iter().enumerate() {
                if cancel.is_some_and(CancellationToken::is_cancelled) {
                    return Err(());
                }
                reduce_row(first + offset, row_major, column_major, dims, out_row);
                completed.fetch_add(1, Ordering::Relaxed);
            }
            Ok(())
        });

    outcome.map_err(|()| {
        let completed_rows = completed.load(Ordering::Relaxed);
        warn!(
            "reduction cancelled after {} of {} rows",
            completed_rows, dims.m
        );
        DotProductError::Cancelled {
            completed_rows,
            total_rows: dims.m,
        }
    })
}
