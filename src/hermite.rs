use std::f64::consts::{PI, SQRT_2};

use smallvec::smallvec;

use crate::{ShortVec, compute_offset, compute_size};

/// Evaluates and integrates 2D Gauss-Hermite basis functions up to a fixed order.
///
/// The 1D functions are orthonormal:
/// `ψ_n(u) = (2ⁿ n! √π)^(-1/2) H_n(u) exp(-u²/2)`,
/// and the 2D function with index `compute_index(i, j)` is `ψ_i(x) ψ_j(y)`.
///
/// All workspaces are per call, so one evaluator can be shared freely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HermiteEvaluator {
    order: usize,
}

impl HermiteEvaluator {
    pub fn new(order: usize) -> Self {
        Self { order }
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn size(&self) -> usize {
        compute_size(self.order)
    }

    /// `ψ_0(u) ..= ψ_order(u)` via the three-term recurrence.
    fn hermite_1d(&self, u: f64) -> ShortVec<f64> {
        let mut out: ShortVec<f64> = smallvec![0.0; self.order + 1];
        out[0] = PI.powf(-0.25) * (-0.5 * u * u).exp();
        if self.order > 0 {
            out[1] = SQRT_2 * u * out[0];
        }
        for n in 1..self.order {
            let nf = n as f64;
            out[n + 1] =
                (2.0 / (nf + 1.0)).sqrt() * u * out[n] - (nf / (nf + 1.0)).sqrt() * out[n - 1];
        }
        out
    }

    /// `∫ uᵏ ψ_n(u) du` for `n = 0..=order`.
    fn integration_1d(&self, moment: usize) -> ShortVec<f64> {
        let len = self.order + moment + 1;
        let mut level: ShortVec<f64> = smallvec![0.0; len];
        level[0] = SQRT_2 * PI.powf(0.25);
        // odd functions integrate to zero; d/du ψ_n gives the even recurrence
        for n in (2..len).step_by(2) {
            level[n] = ((n - 1) as f64 / n as f64).sqrt() * level[n - 2];
        }
        // u ψ_n = sqrt(n/2) ψ_{n-1} + sqrt((n+1)/2) ψ_{n+1}
        for k in 0..moment {
            let mut next: ShortVec<f64> = smallvec![0.0; len - k - 1];
            for (n, v) in next.iter_mut().enumerate() {
                let up = ((n + 1) as f64 / 2.0).sqrt() * level[n + 1];
                let down = if n > 0 {
                    (n as f64 / 2.0).sqrt() * level[n - 1]
                } else {
                    0.0
                };
                *v = up + down;
            }
            level = next;
        }
        level.truncate(self.order + 1);
        level
    }

    /// Combine per-axis 1D values into the packed 2D layout.
    fn fill_outer(&self, target: &mut [f64], xs: &[f64], ys: &[f64]) {
        for n in 0..=self.order {
            let offset = compute_offset(n);
            for i in 0..=n {
                target[offset + i] = xs[i] * ys[n - i];
            }
        }
    }

    fn sum_outer(&self, coefficients: &[f64], xs: &[f64], ys: &[f64]) -> f64 {
        let mut sum = 0.0;
        for n in 0..=self.order {
            let offset = compute_offset(n);
            for i in 0..=n {
                sum += coefficients[offset + i] * xs[i] * ys[n - i];
            }
        }
        sum
    }

    /// Write every 2D basis function evaluated at `(x, y)` into `target`.
    ///
    /// Panics if `target` is shorter than [Self::size].
    pub fn fill_evaluation(&self, target: &mut [f64], x: f64, y: f64) {
        self.fill_outer(target, &self.hermite_1d(x), &self.hermite_1d(y));
    }

    /// Value at `(x, y)` of the expansion with the given coefficients.
    pub fn sum_evaluation(&self, coefficients: &[f64], x: f64, y: f64) -> f64 {
        self.sum_outer(coefficients, &self.hermite_1d(x), &self.hermite_1d(y))
    }

    /// Write `∫∫ xᵃ yᵇ Ψ dx dy` for every 2D basis function into `target`.
    pub fn fill_integration(&self, target: &mut [f64], x_moment: usize, y_moment: usize) {
        self.fill_outer(
            target,
            &self.integration_1d(x_moment),
            &self.integration_1d(y_moment),
        );
    }

    /// `∫∫ xᵃ yᵇ f(x, y) dx dy` for the expansion with the given coefficients.
    pub fn sum_integration(&self, coefficients: &[f64], x_moment: usize, y_moment: usize) -> f64 {
        self.sum_outer(
            coefficients,
            &self.integration_1d(x_moment),
            &self.integration_1d(y_moment),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FLUX_FACTOR, compute_index};
    use approx::assert_abs_diff_eq;

    const STEP: f64 = 0.01;

    /// Midpoint-rule samples of `[-12, 12]`.
    fn grid() -> impl Iterator<Item = f64> {
        (0..2400).map(|i| -12.0 + (i as f64 + 0.5) * STEP)
    }

    #[test]
    fn test_orthonormal_1d() {
        let h = HermiteEvaluator::new(8);
        let samples: Vec<_> = grid().map(|u| h.hermite_1d(u)).collect();
        for m in 0..=8 {
            for n in 0..=8 {
                let inner: f64 = samples.iter().map(|s| s[m] * s[n]).sum::<f64>() * STEP;
                assert_abs_diff_eq!(inner, if m == n { 1.0 } else { 0.0 }, epsilon = 1e-8);
            }
        }
    }

    #[test]
    fn test_integration_1d_matches_quadrature() {
        let h = HermiteEvaluator::new(7);
        let samples: Vec<_> = grid().map(|u| (u, h.hermite_1d(u))).collect();
        for moment in 0..=3 {
            let exact = h.integration_1d(moment);
            assert_eq!(exact.len(), 8);
            for n in 0..=7 {
                let numeric: f64 = samples
                    .iter()
                    .map(|(u, s)| u.powi(moment as i32) * s[n])
                    .sum::<f64>()
                    * STEP;
                assert_abs_diff_eq!(exact[n], numeric, epsilon = 1e-8);
            }
        }
    }

    #[test]
    fn test_gaussian_integrals() {
        let h = HermiteEvaluator::new(0);
        assert_abs_diff_eq!(h.sum_integration(&[1.0], 0, 0), FLUX_FACTOR, epsilon = 1e-12);
        assert_abs_diff_eq!(h.sum_integration(&[1.0], 1, 0), 0.0, epsilon = 1e-12);
        // unit variance along each axis
        assert_abs_diff_eq!(h.sum_integration(&[1.0], 2, 0), FLUX_FACTOR, epsilon = 1e-12);
        assert_abs_diff_eq!(h.sum_integration(&[1.0], 0, 2), FLUX_FACTOR, epsilon = 1e-12);
        assert_abs_diff_eq!(h.sum_integration(&[1.0], 1, 1), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_sum_matches_fill() {
        let h = HermiteEvaluator::new(4);
        let coefficients: Vec<f64> = (0..h.size()).map(|i| 0.1 * i as f64 - 0.4).collect();
        let mut basis = vec![f64::NAN; h.size()];
        h.fill_evaluation(&mut basis, 0.3, -0.8);
        let dot: f64 = basis.iter().zip(coefficients.iter()).map(|(b, c)| b * c).sum();
        assert_abs_diff_eq!(h.sum_evaluation(&coefficients, 0.3, -0.8), dot, epsilon = 1e-14);

        h.fill_integration(&mut basis, 2, 1);
        let dot: f64 = basis.iter().zip(coefficients.iter()).map(|(b, c)| b * c).sum();
        assert_abs_diff_eq!(h.sum_integration(&coefficients, 2, 1), dot, epsilon = 1e-14);
    }

    #[test]
    fn test_layout_is_x_major() {
        let h = HermiteEvaluator::new(2);
        let mut basis = vec![0.0; h.size()];
        h.fill_evaluation(&mut basis, 0.7, 0.0);
        let xs = h.hermite_1d(0.7);
        let ys = h.hermite_1d(0.0);
        assert_abs_diff_eq!(basis[compute_index(2, 0)], xs[2] * ys[0]);
        assert_abs_diff_eq!(basis[compute_index(0, 2)], xs[0] * ys[2]);
        assert_abs_diff_eq!(basis[compute_index(1, 1)], xs[1] * ys[1]);
    }
}
