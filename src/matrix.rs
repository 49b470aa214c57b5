use std::ops::{Index, IndexMut};

use crate::ShapeletError;

/// Pivots smaller than this are treated as zero by [Matrix::inverse].
const SINGULAR_PIVOT: f64 = 1e-300;

/// Small dense matrix used for conversion blocks and convolution kernels.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    /// Row-major / C-ordered matrix data.
    data: Vec<f64>,
    nrows: usize,
    ncols: usize,
}

impl Index<(usize, usize)> for Matrix {
    type Output = f64;

    fn index(&self, index: (usize, usize)) -> &Self::Output {
        &self.data[index.0 * self.ncols + index.1]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    fn index_mut(&mut self, index: (usize, usize)) -> &mut Self::Output {
        &mut self.data[index.0 * self.ncols + index.1]
    }
}

impl Matrix {
    /// Row-major/ C order data
    pub fn try_new(data: Vec<f64>, ncols: usize) -> Result<Self, ShapeletError> {
        if ncols == 0 || data.len() % ncols != 0 {
            return Err(ShapeletError::Dimension(format!(
                "data length {} is not divisible by ncols {}",
                data.len(),
                ncols
            )));
        }
        let nrows = data.len() / ncols;
        Ok(Self { data, nrows, ncols })
    }

    pub fn zeros(nrows: usize, ncols: usize) -> Self {
        Self {
            data: vec![0.0; nrows * ncols],
            nrows,
            ncols,
        }
    }

    pub fn identity(n: usize) -> Self {
        let mut m = Self::zeros(n, n);
        for i in 0..n {
            m[(i, i)] = 1.0;
        }
        m
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn transpose(&self) -> Matrix {
        let mut data = vec![0.0; self.data.len()];
        for r in 0..self.nrows {
            for c in 0..self.ncols {
                data[c * self.nrows + r] = self[(r, c)];
            }
        }
        Matrix {
            data,
            nrows: self.ncols,
            ncols: self.nrows,
        }
    }

    /// `buf = self * coord`.
    pub fn matmul_into(&self, coord: &[f64], buf: &mut [f64]) {
        buf.fill(0.0);
        for (idx, d) in self.data.iter().enumerate() {
            let r = idx / self.ncols;
            let c = idx % self.ncols;
            buf[r] += d * coord[c];
        }
    }

    /// `buf = coordᵀ * self`, i.e. multiplication by a row vector on the left.
    pub fn vecmul_into(&self, coord: &[f64], buf: &mut [f64]) {
        buf.fill(0.0);
        for (idx, d) in self.data.iter().enumerate() {
            let r = idx / self.ncols;
            let c = idx % self.ncols;
            buf[c] += coord[r] * d;
        }
    }

    pub fn matmul(&self, other: &Matrix) -> Result<Matrix, ShapeletError> {
        if self.ncols != other.nrows {
            return Err(ShapeletError::Dimension(format!(
                "cannot multiply {}x{} by {}x{}",
                self.nrows, self.ncols, other.nrows, other.ncols
            )));
        }
        let mut out = Matrix::zeros(self.nrows, other.ncols);
        for r in 0..self.nrows {
            for k in 0..self.ncols {
                let a = self[(r, k)];
                if a == 0.0 {
                    continue;
                }
                let row = &other.data[k * other.ncols..(k + 1) * other.ncols];
                let out_row = &mut out.data[r * other.ncols..(r + 1) * other.ncols];
                for (o, b) in out_row.iter_mut().zip(row.iter()) {
                    *o += a * b;
                }
            }
        }
        Ok(out)
    }

    /// Overwrite the block whose top-left corner is at `(row, col)`.
    ///
    /// Panics if the block does not fit.
    pub fn set_block(&mut self, row: usize, col: usize, block: &Matrix) {
        for r in 0..block.nrows {
            let start = (row + r) * self.ncols + col;
            self.data[start..start + block.ncols]
                .copy_from_slice(&block.data[r * block.ncols..(r + 1) * block.ncols]);
        }
    }

    pub fn is_identity(&self) -> bool {
        if self.nrows != self.ncols {
            return false;
        }
        self.data.iter().enumerate().all(|(idx, v)| {
            let expected = if idx / self.ncols == idx % self.ncols {
                1.0
            } else {
                0.0
            };
            *v == expected
        })
    }

    /// Inverse by Gauss-Jordan elimination with partial pivoting.
    ///
    /// Conditioning is not checked; only an exactly vanishing pivot is reported.
    pub fn inverse(&self) -> Result<Matrix, ShapeletError> {
        if self.nrows != self.ncols {
            return Err(ShapeletError::Dimension(
                "inverse only defined for square matrices".to_string(),
            ));
        }
        let n = self.nrows;
        let mut a = self.data.clone();
        let mut inv = Matrix::identity(n).data;
        for k in 0..n {
            let pivot_row = (k..n)
                .max_by(|&x, &y| a[x * n + k].abs().total_cmp(&a[y * n + k].abs()))
                .unwrap_or(k);
            if a[pivot_row * n + k].abs() < SINGULAR_PIVOT {
                return Err(ShapeletError::Singular);
            }
            if pivot_row != k {
                swap_rows(&mut a, n, k, pivot_row);
                swap_rows(&mut inv, n, k, pivot_row);
            }
            let pivot = a[k * n + k];
            for c in 0..n {
                a[k * n + c] /= pivot;
                inv[k * n + c] /= pivot;
            }
            for r in 0..n {
                if r == k {
                    continue;
                }
                let factor = a[r * n + k];
                if factor == 0.0 {
                    continue;
                }
                for c in 0..n {
                    a[r * n + c] -= factor * a[k * n + c];
                    inv[r * n + c] -= factor * inv[k * n + c];
                }
            }
        }
        Ok(Matrix {
            data: inv,
            nrows: n,
            ncols: n,
        })
    }
}

fn swap_rows(data: &mut [f64], ncols: usize, a: usize, b: usize) {
    for c in 0..ncols {
        data.swap(a * ncols + c, b * ncols + c);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{init_logger, new_rng, random_matrix};
    use approx::{assert_abs_diff_eq, assert_ulps_eq};

    #[test]
    fn test_inverse() {
        init_logger();
        let mut rng = new_rng();
        for ndim in 1..8 {
            let mat = random_matrix(&mut rng, ndim);
            let inv = mat.inverse().unwrap();
            let prod = mat.matmul(&inv).unwrap();
            let eye = Matrix::identity(ndim);
            assert_abs_diff_eq!(prod.as_slice(), eye.as_slice(), epsilon = 1e-9);
        }
    }

    #[test]
    fn test_inverse_singular() {
        #[rustfmt::skip]
        let data = vec![
            1.0, 2.0,
            2.0, 4.0,
        ];
        let mat = Matrix::try_new(data, 2).unwrap();
        assert_eq!(mat.inverse(), Err(ShapeletError::Singular));
    }

    #[test]
    fn test_matmul_into() {
        #[rustfmt::skip]
        let data = vec![
            1.0, 2.0, 3.0,
            4.0, 5.0, 6.0,
            7.0, 8.0, 9.0
        ];
        let mat = Matrix::try_new(data, 3).unwrap();
        let mut out = vec![f64::NAN; 3];
        mat.matmul_into(&[10.0, 100.0, 1000.0], &mut out);
        let expected: [f64; 3] = [3210.0, 6540.0, 9870.0];
        assert_ulps_eq!(out.as_slice(), expected.as_slice());
    }

    #[test]
    fn test_vecmul_into() {
        #[rustfmt::skip]
        let data = vec![
            1.0, 2.0, 3.0,
            4.0, 5.0, 6.0,
            7.0, 8.0, 9.0
        ];
        let mat = Matrix::try_new(data, 3).unwrap();
        let mut out = vec![f64::NAN; 3];
        mat.vecmul_into(&[10.0, 100.0, 1000.0], &mut out);
        let expected: [f64; 3] = [7410.0, 8520.0, 9630.0];
        assert_ulps_eq!(out.as_slice(), expected.as_slice());
    }

    #[test]
    fn test_blocks() {
        let mut mat = Matrix::zeros(4, 4);
        let block = Matrix::try_new(vec![1.0, 2.0, 3.0, 4.0], 2).unwrap();
        mat.set_block(1, 2, &block);
        assert_eq!(mat[(1, 2)], 1.0);
        assert_eq!(mat[(2, 3)], 4.0);
        assert_eq!(mat[(0, 0)], 0.0);
        assert_eq!(mat.transpose()[(3, 2)], 4.0);
    }

    #[test]
    fn test_bad_shape() {
        assert!(Matrix::try_new(vec![1.0; 5], 2).is_err());
        let a = Matrix::zeros(2, 3);
        assert!(a.matmul(&a).is_err());
        assert!(a.inverse().is_err());
    }
}
