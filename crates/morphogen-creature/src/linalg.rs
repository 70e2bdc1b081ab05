//! Fixed-shape vector and matrix views over a flat `f32` buffer
//!
//! A view is only a descriptor (offset + shape). The data lives in a buffer the
//! caller owns, typically a genome's brain parameters, and is borrowed as an
//! `ndarray` view for the duration of one operation. Nothing is copied, so
//! mutating the buffer changes what every view over it sees.

use ndarray::{ArrayView1, ArrayView2, ArrayViewMut1, ArrayViewMut2, Zip};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by view construction and view arithmetic.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LinalgError {
    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("buffer of {available} elements cannot hold a window ending at {required}")]
    InsufficientBufferSize { required: usize, available: usize },
}

/// Window validation helpers
pub mod shape {
    use super::LinalgError;

    /// Check that `[offset, offset + len)` fits inside a buffer of `buffer_len`
    pub fn fits_vector(offset: usize, len: usize, buffer_len: usize) -> Result<(), LinalgError> {
        let required = offset + len;
        if required > buffer_len {
            return Err(LinalgError::InsufficientBufferSize {
                required,
                available: buffer_len,
            });
        }
        Ok(())
    }

    /// Check that a `rows x cols` row-major block at `offset` fits
    pub fn fits_matrix(
        offset: usize,
        rows: usize,
        cols: usize,
        buffer_len: usize,
    ) -> Result<(), LinalgError> {
        fits_vector(offset, rows * cols, buffer_len)
    }
}

/// Element-wise activation functions
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Activation {
    Linear,
    Sigmoid,
    Tanh,
    Relu,
}

impl Activation {
    /// Apply activation function to a scalar
    pub fn activate(&self, x: f32) -> f32 {
        match self {
            Self::Linear => x,
            Self::Sigmoid => 1.0 / (1.0 + (-x).exp()),
            Self::Tanh => x.tanh(),
            Self::Relu => x.max(0.0),
        }
    }

    /// Apply activation in place over a vector
    pub fn apply(&self, mut values: ArrayViewMut1<'_, f32>) {
        let activation = *self;
        values.mapv_inplace(|x| activation.activate(x));
    }
}

/// A contiguous vector window into a flat buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorView {
    offset: usize,
    len: usize,
}

impl VectorView {
    /// Create a view, validating it against the buffer it will be used with
    pub fn new(offset: usize, len: usize, buffer_len: usize) -> Result<Self, LinalgError> {
        shape::fits_vector(offset, len, buffer_len)?;
        Ok(Self { offset, len })
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// First index past this window
    pub fn end(&self) -> usize {
        self.offset + self.len
    }

    /// Borrow the window as an ndarray view
    pub fn view<'a>(&self, buffer: &'a [f32]) -> Result<ArrayView1<'a, f32>, LinalgError> {
        shape::fits_vector(self.offset, self.len, buffer.len())?;
        Ok(ArrayView1::from(&buffer[self.offset..self.end()]))
    }

    /// Borrow the window mutably
    pub fn view_mut<'a>(
        &self,
        buffer: &'a mut [f32],
    ) -> Result<ArrayViewMut1<'a, f32>, LinalgError> {
        shape::fits_vector(self.offset, self.len, buffer.len())?;
        let end = self.end();
        Ok(ArrayViewMut1::from(&mut buffer[self.offset..end]))
    }

    pub fn get(&self, buffer: &[f32], index: usize) -> Result<f32, LinalgError> {
        self.check_index(index)?;
        Ok(self.view(buffer)?[index])
    }

    pub fn set(&self, buffer: &mut [f32], index: usize, value: f32) -> Result<(), LinalgError> {
        self.check_index(index)?;
        self.view_mut(buffer)?[index] = value;
        Ok(())
    }

    /// Fill every element of the window with `value`
    pub fn set_all(&self, buffer: &mut [f32], value: f32) -> Result<(), LinalgError> {
        self.view_mut(buffer)?.fill(value);
        Ok(())
    }

    fn check_index(&self, index: usize) -> Result<(), LinalgError> {
        if index >= self.len {
            return Err(LinalgError::IndexOutOfRange {
                index,
                len: self.len,
            });
        }
        Ok(())
    }
}

/// A row-major `rows x cols` matrix window into a flat buffer
///
/// Rows index outputs and columns index inputs, so `mat_vec_into` with a
/// matrix of `cols` columns consumes a vector of length `cols`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixView {
    offset: usize,
    rows: usize,
    cols: usize,
}

impl MatrixView {
    pub fn new(
        offset: usize,
        rows: usize,
        cols: usize,
        buffer_len: usize,
    ) -> Result<Self, LinalgError> {
        shape::fits_matrix(offset, rows, cols, buffer_len)?;
        Ok(Self { offset, rows, cols })
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of elements covered by the window
    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn end(&self) -> usize {
        self.offset + self.len()
    }

    pub fn view<'a>(&self, buffer: &'a [f32]) -> Result<ArrayView2<'a, f32>, LinalgError> {
        shape::fits_matrix(self.offset, self.rows, self.cols, buffer.len())?;
        ArrayView2::from_shape((self.rows, self.cols), &buffer[self.offset..self.end()]).map_err(
            |_| LinalgError::InsufficientBufferSize {
                required: self.end(),
                available: buffer.len(),
            },
        )
    }

    pub fn view_mut<'a>(
        &self,
        buffer: &'a mut [f32],
    ) -> Result<ArrayViewMut2<'a, f32>, LinalgError> {
        let available = buffer.len();
        shape::fits_matrix(self.offset, self.rows, self.cols, available)?;
        let end = self.end();
        ArrayViewMut2::from_shape((self.rows, self.cols), &mut buffer[self.offset..end]).map_err(
            |_| LinalgError::InsufficientBufferSize {
                required: end,
                available,
            },
        )
    }

    pub fn get(&self, buffer: &[f32], row: usize, col: usize) -> Result<f32, LinalgError> {
        self.check_index(row, col)?;
        Ok(self.view(buffer)?[[row, col]])
    }

    pub fn set(
        &self,
        buffer: &mut [f32],
        row: usize,
        col: usize,
        value: f32,
    ) -> Result<(), LinalgError> {
        self.check_index(row, col)?;
        self.view_mut(buffer)?[[row, col]] = value;
        Ok(())
    }

    pub fn set_all(&self, buffer: &mut [f32], value: f32) -> Result<(), LinalgError> {
        self.view_mut(buffer)?.fill(value);
        Ok(())
    }

    fn check_index(&self, row: usize, col: usize) -> Result<(), LinalgError> {
        if row >= self.rows {
            return Err(LinalgError::IndexOutOfRange {
                index: row,
                len: self.rows,
            });
        }
        if col >= self.cols {
            return Err(LinalgError::IndexOutOfRange {
                index: col,
                len: self.cols,
            });
        }
        Ok(())
    }
}

fn check_same_len(expected: usize, actual: usize) -> Result<(), LinalgError> {
    if expected != actual {
        return Err(LinalgError::DimensionMismatch { expected, actual });
    }
    Ok(())
}

/// `out = a + b`
pub fn add_into(
    a: ArrayView1<'_, f32>,
    b: ArrayView1<'_, f32>,
    mut out: ArrayViewMut1<'_, f32>,
) -> Result<(), LinalgError> {
    check_same_len(a.len(), b.len())?;
    check_same_len(a.len(), out.len())?;
    Zip::from(&mut out)
        .and(&a)
        .and(&b)
        .for_each(|o, &x, &y| *o = x + y);
    Ok(())
}

/// `out = a ⊙ b`
pub fn mul_into(
    a: ArrayView1<'_, f32>,
    b: ArrayView1<'_, f32>,
    mut out: ArrayViewMut1<'_, f32>,
) -> Result<(), LinalgError> {
    check_same_len(a.len(), b.len())?;
    check_same_len(a.len(), out.len())?;
    Zip::from(&mut out)
        .and(&a)
        .and(&b)
        .for_each(|o, &x, &y| *o = x * y);
    Ok(())
}

/// `out = a * factor`
pub fn scale_into(
    a: ArrayView1<'_, f32>,
    factor: f32,
    mut out: ArrayViewMut1<'_, f32>,
) -> Result<(), LinalgError> {
    check_same_len(a.len(), out.len())?;
    Zip::from(&mut out).and(&a).for_each(|o, &x| *o = x * factor);
    Ok(())
}

/// `out = a + scalar`
pub fn add_scalar_into(
    a: ArrayView1<'_, f32>,
    scalar: f32,
    mut out: ArrayViewMut1<'_, f32>,
) -> Result<(), LinalgError> {
    check_same_len(a.len(), out.len())?;
    Zip::from(&mut out).and(&a).for_each(|o, &x| *o = x + scalar);
    Ok(())
}

/// Dense product `out[i] = Σ_j m[i, j] · v[j]`
pub fn mat_vec_into(
    m: ArrayView2<'_, f32>,
    v: ArrayView1<'_, f32>,
    mut out: ArrayViewMut1<'_, f32>,
) -> Result<(), LinalgError> {
    let (rows, cols) = m.dim();
    check_same_len(cols, v.len())?;
    check_same_len(rows, out.len())?;
    out.assign(&m.dot(&v));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, array};

    #[test]
    fn test_activation_functions() {
        assert_eq!(Activation::Linear.activate(2.0), 2.0);
        assert!((Activation::Sigmoid.activate(0.0) - 0.5).abs() < 1e-6);
        assert!(Activation::Tanh.activate(0.0).abs() < 1e-6);
        assert_eq!(Activation::Relu.activate(-1.0), 0.0);
        assert_eq!(Activation::Relu.activate(1.5), 1.5);
    }

    #[test]
    fn test_activation_apply_in_place() {
        let mut values = array![-2.0_f32, 0.0, 3.0];
        Activation::Relu.apply(values.view_mut());
        assert_eq!(values, array![0.0, 0.0, 3.0]);
    }

    #[test]
    fn test_vector_view_rejects_oversized_window() {
        let err = VectorView::new(4, 3, 6).unwrap_err();
        assert_eq!(
            err,
            LinalgError::InsufficientBufferSize {
                required: 7,
                available: 6
            }
        );
        assert!(VectorView::new(3, 3, 6).is_ok());
    }

    #[test]
    fn test_matrix_view_rejects_oversized_window() {
        assert!(MatrixView::new(0, 2, 3, 6).is_ok());
        assert!(matches!(
            MatrixView::new(1, 2, 3, 6),
            Err(LinalgError::InsufficientBufferSize { .. })
        ));
    }

    #[test]
    fn test_vector_get_set_aliases_buffer() {
        let mut buffer = vec![0.0_f32; 8];
        let v = VectorView::new(2, 4, buffer.len()).unwrap();

        v.set(&mut buffer, 1, 5.0).unwrap();
        assert_eq!(buffer[3], 5.0);

        // Writes to the raw buffer are visible through the view
        buffer[5] = -1.0;
        assert_eq!(v.get(&buffer, 3).unwrap(), -1.0);
    }

    #[test]
    fn test_vector_bounds_checked() {
        let mut buffer = vec![0.0_f32; 4];
        let v = VectorView::new(0, 2, buffer.len()).unwrap();
        assert_eq!(
            v.get(&buffer, 2),
            Err(LinalgError::IndexOutOfRange { index: 2, len: 2 })
        );
        assert!(v.set(&mut buffer, 5, 1.0).is_err());
    }

    #[test]
    fn test_set_all_only_touches_window() {
        let mut buffer = vec![0.0_f32; 6];
        let v = VectorView::new(1, 3, buffer.len()).unwrap();
        v.set_all(&mut buffer, 2.0).unwrap();
        assert_eq!(buffer, vec![0.0, 2.0, 2.0, 2.0, 0.0, 0.0]);
    }

    #[test]
    fn test_matrix_get_set_row_major() {
        let mut buffer = vec![0.0_f32; 10];
        let m = MatrixView::new(4, 2, 3, buffer.len()).unwrap();
        m.set(&mut buffer, 1, 2, 9.0).unwrap();
        assert_eq!(buffer[4 + 3 + 2], 9.0);
        assert_eq!(m.get(&buffer, 1, 2).unwrap(), 9.0);
        assert!(m.get(&buffer, 2, 0).is_err());
        assert!(m.get(&buffer, 0, 3).is_err());
    }

    #[test]
    fn test_elementwise_ops() {
        let a = array![1.0_f32, 2.0, 3.0];
        let b = array![4.0_f32, 5.0, 6.0];
        let mut out = Array1::<f32>::zeros(3);

        add_into(a.view(), b.view(), out.view_mut()).unwrap();
        assert_eq!(out, array![5.0, 7.0, 9.0]);

        mul_into(a.view(), b.view(), out.view_mut()).unwrap();
        assert_eq!(out, array![4.0, 10.0, 18.0]);

        scale_into(a.view(), -2.0, out.view_mut()).unwrap();
        assert_eq!(out, array![-2.0, -4.0, -6.0]);

        add_scalar_into(a.view(), 0.5, out.view_mut()).unwrap();
        assert_eq!(out, array![1.5, 2.5, 3.5]);
    }

    #[test]
    fn test_elementwise_dimension_mismatch() {
        let a = array![1.0_f32, 2.0, 3.0];
        let b = array![1.0_f32, 2.0];
        let mut out = Array1::<f32>::zeros(3);
        assert_eq!(
            add_into(a.view(), b.view(), out.view_mut()),
            Err(LinalgError::DimensionMismatch {
                expected: 3,
                actual: 2
            })
        );

        let mut short = Array1::<f32>::zeros(2);
        assert!(scale_into(a.view(), 1.0, short.view_mut()).is_err());
    }

    #[test]
    fn test_mat_vec_product() {
        // 2x3 matrix stored row-major after two padding elements
        let buffer = vec![9.0_f32, 9.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let m = MatrixView::new(2, 2, 3, buffer.len()).unwrap();
        let x = array![1.0_f32, 0.0, -1.0];
        let mut out = Array1::<f32>::zeros(2);

        mat_vec_into(m.view(&buffer).unwrap(), x.view(), out.view_mut()).unwrap();
        assert_eq!(out, array![-2.0, -2.0]);
    }

    #[test]
    fn test_mat_vec_dimension_mismatch() {
        let buffer = vec![0.0_f32; 6];
        let m = MatrixView::new(0, 2, 3, buffer.len()).unwrap();
        let x = array![1.0_f32, 2.0];
        let mut out = Array1::<f32>::zeros(2);
        assert!(matches!(
            mat_vec_into(m.view(&buffer).unwrap(), x.view(), out.view_mut()),
            Err(LinalgError::DimensionMismatch { .. })
        ));
    }
}
