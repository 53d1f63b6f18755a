//! The output buffer and its conversion back into caller representations.

use ndarray::{Array2, ArrayView2, ArrayViewMut2};
use num::{Float, NumCast};

use crate::{
    element::Element,
    error::{DotProductError, Result},
};

/// How float results are narrowed to an integral type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Narrowing {
    /// Drop the fractional part, rounding toward zero.
    #[default]
    Truncate,
    /// Round to the nearest integer, halves away from zero.
    Round,
}

/// Zero-initialized `rows x cols` product, filled in by the reducer.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputBuffer<T> {
    data: Array2<T>,
}

impl<T: Element> OutputBuffer<T> {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        OutputBuffer {
            data: Array2::zeros((rows, cols)),
        }
    }

    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    pub fn view(&self) -> ArrayView2<'_, T> {
        self.data.view()
    }

    pub fn view_mut(&mut self) -> ArrayViewMut2<'_, T> {
        self.data.view_mut()
    }

    /// Nested rows, cell `(i, j)` at `result[i][j]`.
    pub fn to_rows(&self) -> Vec<Vec<T>> {
        self.data.outer_iter().map(|row| row.to_vec()).collect()
    }

    pub fn into_array(self) -> Array2<T> {
        self.data
    }
}

impl<T: Element + Float> OutputBuffer<T> {
    /// Nested rows narrowed to the integral type `I` under `policy`.
    ///
    /// Fails with [`DotProductError::NumericOverflow`] on the first cell that
    /// `I` cannot hold, including NaN and infinities.
    pub fn to_integral_rows<I: NumCast>(&self, policy: Narrowing) -> Result<Vec<Vec<I>>> {
        self.data
            .outer_iter()
            .enumerate()
            .map(|(row, cells)| {
                cells
                    .iter()
                    .enumerate()
                    .map(|(column, &value)| {
                        let narrowed = match policy {
                            Narrowing::Truncate => value.trunc(),
                            Narrowing::Round => value.round(),
                        };
                        I::from(narrowed).ok_or(DotProductError::NumericOverflow { row, column })
                    })
                    .collect::<Result<Vec<I>>>()
            })
            .collect()
    }
}

impl<T> From<OutputBuffer<T>> for Array2<T> {
    fn from(buffer: OutputBuffer<T>) -> Self {
        buffer.data
    }
}
