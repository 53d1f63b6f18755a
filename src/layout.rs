//! Layout transformation of the two operands into flat scratch buffers.
//!
//! The left operand is flattened row-major and the right operand
//! column-major, so that for any output cell `(i, j)` both factors of the
//! inner reduction are contiguous:
//!
//! ```text
//! left  (R1 x C1):  row_major[i * C1 + k]    = left[i][k]
//! right (R2 x C2):  column_major[j * R2 + k] = right[k][j]
//! ```

use log::trace;

use crate::{
    element::Element,
    error::{capacity_exceeded, Operand, Result},
    matrix::{MatrixSource, Shape},
};

/// Copies `matrix` into `buffer` in row-major order.
///
/// `buffer` must hold exactly `shape.len()` elements.
pub fn transform_row_major<T, M>(matrix: &M, shape: Shape, buffer: &mut [T])
where
    T: Element,
    M: MatrixSource<T> + ?Sized,
{
    debug_assert_eq!(buffer.len(), shape.len());
    let columns = shape.cols;
    matrix.for_each_cell(|i, k, value| buffer[i * columns + k] = value);
}

/// Copies `matrix` into `buffer` in column-major order.
///
/// `buffer` must hold exactly `shape.len()` elements.
pub fn transform_column_major<T, M>(matrix: &M, shape: Shape, buffer: &mut [T])
where
    T: Element,
    M: MatrixSource<T> + ?Sized,
{
    debug_assert_eq!(buffer.len(), shape.len());
    let rows = shape.rows;
    matrix.for_each_cell(|k, j, value| buffer[j * rows + k] = value);
}

/// Reusable pair of scratch buffers for one in-flight multiplication.
///
/// Buffers grow to the largest operands seen so far and are kept between
/// calls. Every call overwrites exactly the slots its dimensions need, so a
/// smaller call never observes values left behind by a larger one.
#[derive(Debug, Clone)]
pub struct ScratchArena<T> {
    row_major: Vec<T>,
    column_major: Vec<T>,
    limit: Option<usize>,
}

impl<T: Element> ScratchArena<T> {
    /// Creates an arena sized on demand.
    pub fn new() -> Self {
        Self::with_limit(None)
    }

    /// Creates an arena that rejects operands larger than `limit` elements.
    pub fn with_limit(limit: Option<usize>) -> Self {
        ScratchArena {
            row_major: Vec::new(),
            column_major: Vec::new(),
            limit,
        }
    }

    /// Largest operand (in elements) accepted, if bounded.
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Elements currently reserved across both buffers.
    pub fn capacity(&self) -> usize {
        self.row_major.capacity() + self.column_major.capacity()
    }

    /// Fails if an operand of `shape` would not fit this arena.
    pub fn check_capacity(&self, operand: Operand, shape: Shape) -> Result<()> {
        match self.limit {
            Some(limit) if shape.len() > limit => {
                Err(capacity_exceeded(operand, shape.len(), limit))
            }
            _ => Ok(()),
        }
    }

    /// Lays out `left` row-major and `right` column-major.
    ///
    /// Both capacity checks run before either buffer is touched.
    pub fn prepare<L, R>(
        &mut self,
        left: &L,
        left_shape: Shape,
        right: &R,
        right_shape: Shape,
    ) -> Result<()>
    where
        L: MatrixSource<T> + ?Sized,
        R: MatrixSource<T> + ?Sized,
    {
        self.check_capacity(Operand::Left, left_shape)?;
        self.check_capacity(Operand::Right, right_shape)?;

        refill(&mut self.row_major, left_shape.len());
        transform_row_major(left, left_shape, &mut self.row_major);

        refill(&mut self.column_major, right_shape.len());
        transform_column_major(right, right_shape, &mut self.column_major);

        trace!(
            "scratch prepared: left {} row-major, right {} column-major, {} elements reserved",
            left_shape,
            right_shape,
            self.capacity()
        );

        Ok(())
    }

    /// The row-major left buffer and column-major right buffer from the last
    /// [`prepare`](Self::prepare).
    pub fn buffers(&self) -> (&[T], &[T]) {
        (&self.row_major, &self.column_major)
    }
}

impl<T: Element> Default for ScratchArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn refill<T: Element>(buffer: &mut Vec<T>, len: usize) {
    buffer.clear();
    buffer.resize(len, T::zero());
}
