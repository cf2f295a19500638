//! Coordinate generators for building test grids.

use ndarray::{Array1, Array2};

/// `n` evenly spaced values from `start` to `stop`, both included.
///
/// # Example
///
/// ```
/// use test_utils::linspace;
///
/// let values = linspace(0.0, 1.0, 5);
/// assert_eq!(values.to_vec(), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
/// ```
pub fn linspace(start: f64, stop: f64, n: usize) -> Array1<f64> {
    Array1::linspace(start, stop, n)
}

/// Two 2-D arrays of shape `(y.len(), x.len())`: x repeated along rows and
/// y repeated along columns.
///
/// # Example
///
/// ```
/// use ndarray::arr1;
/// use test_utils::meshgrid;
///
/// let (xx, yy) = meshgrid(&arr1(&[1.0, 2.0, 3.0]), &arr1(&[10.0, 20.0]));
/// assert_eq!(xx.shape(), &[2, 3]);
/// assert_eq!(xx[[1, 2]], 3.0);
/// assert_eq!(yy[[1, 2]], 20.0);
/// ```
pub fn meshgrid(x: &Array1<f64>, y: &Array1<f64>) -> (Array2<f64>, Array2<f64>) {
    let shape = (y.len(), x.len());
    let xx = Array2::from_shape_fn(shape, |(_, col)| x[col]);
    let yy = Array2::from_shape_fn(shape, |(row, _)| y[row]);
    (xx, yy)
}

/// Data values with a recognizable pattern: `row * 1000 + col`.
pub fn create_test_field(rows: usize, cols: usize) -> Array2<f64> {
    Array2::from_shape_fn((rows, cols), |(row, col)| (row * 1000 + col) as f64)
}
