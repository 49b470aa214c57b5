//! Bivariate polynomials and the monomial <-> Hermite change of basis.
//!
//! Coefficients share the packed shapelet layout: the coefficient of `xᵃ yᵇ`
//! lives at `compute_index(a, b)`.
use std::f64::consts::{PI, SQRT_2};

use num_traits::Num;

use crate::{compute_index, compute_size, geom::LinearTransform};

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Polynomial2<T> {
    degree: usize,
    coefficients: Vec<T>,
}

impl<T: Num + Copy + From<f64>> Polynomial2<T> {
    pub fn zeros(degree: usize) -> Self {
        Self {
            degree,
            coefficients: vec![T::zero(); compute_size(degree)],
        }
    }

    pub fn constant(value: T) -> Self {
        Self {
            degree: 0,
            coefficients: vec![value],
        }
    }

    /// `cx * x + cy * y`.
    pub fn linear(cx: T, cy: T) -> Self {
        let mut out = Self::zeros(1);
        out.coefficients[compute_index(1, 0)] = cx;
        out.coefficients[compute_index(0, 1)] = cy;
        out
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    /// Coefficient of `xᵃ yᵇ`.
    pub fn get(&self, a: usize, b: usize) -> T {
        if a + b > self.degree {
            return T::zero();
        }
        self.coefficients[compute_index(a, b)]
    }

    pub fn mul(&self, other: &Self) -> Self {
        let mut out = Self::zeros(self.degree + other.degree);
        for (n, m) in terms(self.degree) {
            let lhs = self.get(n, m);
            if lhs.is_zero() {
                continue;
            }
            for (p, q) in terms(other.degree) {
                let idx = compute_index(n + p, m + q);
                out.coefficients[idx] = out.coefficients[idx] + lhs * other.get(p, q);
            }
        }
        out
    }

    /// `self += scale * other`; `other` may not have a higher degree than `self`.
    pub fn add_scaled(&mut self, other: &Self, scale: T) {
        debug_assert!(other.degree <= self.degree);
        for (c, o) in self.coefficients.iter_mut().zip(other.coefficients.iter()) {
            *c = *c + scale * *o;
        }
    }

    pub fn scale(&mut self, scale: T) {
        for c in self.coefficients.iter_mut() {
            *c = *c * scale;
        }
    }

    pub fn map<U, F>(&self, f: F) -> Polynomial2<U>
    where
        F: Fn(T) -> U,
    {
        Polynomial2 {
            degree: self.degree,
            coefficients: self.coefficients.iter().map(|c| f(*c)).collect(),
        }
    }
}

/// Every `(a, b)` with `a + b <= degree`, in packed-layout order.
fn terms(degree: usize) -> impl Iterator<Item = (usize, usize)> {
    (0..=degree).flat_map(|n| (0..=n).map(move |a| (a, n - a)))
}

/// Monomial coefficients of the polynomial parts `h_n` of the orthonormal
/// Hermite functions, `ψ_n(u) = h_n(u) exp(-u²/2)`, and their inverse.
#[derive(Debug, Clone)]
pub(crate) struct HermitePolynomials {
    order: usize,
    /// `h_n(u) = Σ_a forward[n][a] uᵃ`
    forward: Vec<Vec<f64>>,
    /// `uᵃ = Σ_n inverse[a][n] h_n(u)`
    inverse: Vec<Vec<f64>>,
}

impl HermitePolynomials {
    pub fn new(order: usize) -> Self {
        let mut forward: Vec<Vec<f64>> = Vec::with_capacity(order + 1);
        forward.push(vec![PI.powf(-0.25)]);
        if order > 0 {
            forward.push(vec![0.0, SQRT_2 * forward[0][0]]);
        }
        for n in 1..order {
            let nf = n as f64;
            let up = (2.0 / (nf + 1.0)).sqrt();
            let down = (nf / (nf + 1.0)).sqrt();
            let mut next = vec![0.0; n + 2];
            for (a, c) in forward[n].iter().enumerate() {
                next[a + 1] += up * c;
            }
            for (a, c) in forward[n - 1].iter().enumerate() {
                next[a] -= down * c;
            }
            forward.push(next);
        }

        // forward is lower triangular; invert by forward substitution
        let mut inverse: Vec<Vec<f64>> = Vec::with_capacity(order + 1);
        for a in 0..=order {
            let lead = forward[a][a];
            let mut row = vec![0.0; a + 1];
            row[a] = 1.0 / lead;
            for b in 0..a {
                let h = forward[a][b];
                if h == 0.0 {
                    continue;
                }
                for (n, g) in inverse[b].iter().enumerate() {
                    row[n] -= h * g / lead;
                }
            }
            inverse.push(row);
        }
        Self {
            order,
            forward,
            inverse,
        }
    }

    /// `h_x(u₀) h_y(u₁)` with `u = transform * w`, as a polynomial in `w`.
    pub fn compose(&self, x: usize, y: usize, transform: &LinearTransform) -> Polynomial2<f64> {
        let [[l00, l01], [l10, l11]] = transform.matrix();
        let u0 = self.compose_1d(x, &Polynomial2::linear(l00, l01));
        let u1 = self.compose_1d(y, &Polynomial2::linear(l10, l11));
        u0.mul(&u1)
    }

    fn compose_1d(&self, n: usize, arg: &Polynomial2<f64>) -> Polynomial2<f64> {
        let mut out = Polynomial2::zeros(n);
        let mut power = Polynomial2::constant(1.0);
        for (a, c) in self.forward[n].iter().enumerate() {
            if a > 0 {
                power = power.mul(arg);
            }
            if *c != 0.0 {
                out.add_scaled(&power, *c);
            }
        }
        out
    }

    /// Coefficients of `poly` in the basis `h_i(w₀) h_j(w₁)`, in packed layout.
    ///
    /// Panics if the polynomial has a higher degree than this table.
    pub fn expand<T: Num + Copy + From<f64>>(&self, poly: &Polynomial2<T>) -> Vec<T> {
        assert!(poly.degree() <= self.order);
        let mut out = vec![T::zero(); compute_size(poly.degree())];
        for (a, b) in terms(poly.degree()) {
            let c = poly.get(a, b);
            if c.is_zero() {
                continue;
            }
            for (i, gi) in self.inverse[a].iter().enumerate() {
                for (j, gj) in self.inverse[b].iter().enumerate() {
                    let idx = compute_index(i, j);
                    out[idx] = out[idx] + c * T::from(gi * gj);
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HermiteEvaluator;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_polynomial_product() {
        // (1 + x)(x - y) = x - y + x² - xy
        let mut a = Polynomial2::linear(1.0, 0.0);
        a.add_scaled(&Polynomial2::constant(1.0), 1.0);
        let b = Polynomial2::linear(1.0, -1.0);
        let c = a.mul(&b);
        assert_eq!(c.degree(), 2);
        assert_eq!(c.get(1, 0), 1.0);
        assert_eq!(c.get(0, 1), -1.0);
        assert_eq!(c.get(2, 0), 1.0);
        assert_eq!(c.get(1, 1), -1.0);
        assert_eq!(c.get(0, 2), 0.0);
        assert_eq!(c.get(0, 0), 0.0);
    }

    #[test]
    fn test_forward_matches_evaluator() {
        let order = 6;
        let table = HermitePolynomials::new(order);
        let h = HermiteEvaluator::new(order);
        let mut basis = vec![0.0; h.size()];
        let (x, y) = (0.37, -1.2);
        h.fill_evaluation(&mut basis, x, y);
        let envelope = (-0.5 * (x * x + y * y)).exp();
        for (a, b) in terms(order) {
            let poly = table.compose(a, b, &LinearTransform::identity());
            let value: f64 = terms(poly.degree())
                .map(|(p, q)| poly.get(p, q) * x.powi(p as i32) * y.powi(q as i32))
                .sum();
            assert_abs_diff_eq!(value * envelope, basis[compute_index(a, b)], epsilon = 1e-12);
        }
    }

    #[test]
    fn test_expand_inverts_forward() {
        let order = 7;
        let table = HermitePolynomials::new(order);
        for (a, b) in terms(order) {
            let poly = table.compose(a, b, &LinearTransform::identity());
            let expanded = table.expand(&poly);
            for (idx, v) in expanded.iter().enumerate() {
                let expected = if idx == compute_index(a, b) { 1.0 } else { 0.0 };
                assert_abs_diff_eq!(*v, expected, epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn test_rotation_preserves_degree_one_span() {
        // h_1(u) is proportional to u, so a rotated h_1(x) h_0(y)
        // mixes only the two degree-one functions.
        let table = HermitePolynomials::new(1);
        let theta: f64 = 0.8;
        let poly = table.compose(1, 0, &LinearTransform::rotation(theta));
        let expanded = table.expand(&poly);
        assert_abs_diff_eq!(expanded[0], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(expanded[compute_index(1, 0)], theta.cos(), epsilon = 1e-12);
        assert_abs_diff_eq!(expanded[compute_index(0, 1)], -theta.sin(), epsilon = 1e-12);
    }
}
