use num_complex::Complex64;

use crate::Matrix;

/// Polynomial basis of a shapelet expansion.
///
/// Both bases span the same space at a given order; each variant knows how to
/// express itself in terms of the Hermite basis, one degree block at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BasisType {
    /// Products of 1D Gauss-Hermite functions, ordered by increasing power of x.
    #[default]
    Hermite,
    /// Real and imaginary parts of the polar Gauss-Laguerre functions.
    Laguerre,
}

impl BasisType {
    /// The `(n+1) x (n+1)` matrix taking degree-`n` Hermite coefficients to
    /// coefficients in this basis.
    pub fn hermite_block(self, n: usize) -> Matrix {
        match self {
            BasisType::Hermite => Matrix::identity(n + 1),
            BasisType::Laguerre => laguerre_block(n),
        }
    }
}

/// `i^z` for any integer `z`.
pub(crate) fn i_pow(z: i64) -> Complex64 {
    match z.rem_euclid(4) {
        0 => Complex64::new(1.0, 0.0),
        1 => Complex64::new(0.0, 1.0),
        2 => Complex64::new(-1.0, 0.0),
        _ => Complex64::new(0.0, -1.0),
    }
}

fn factorial(n: usize) -> f64 {
    (1..=n).fold(1.0, |acc, k| acc * k as f64)
}

fn binomial(n: usize, k: usize) -> f64 {
    if k > n {
        return 0.0;
    }
    let k = k.min(n - k);
    (0..k).fold(1.0, |acc, j| acc * (n - j) as f64 / (j + 1) as f64)
}

/// Hermite -> Laguerre block for total degree `n`.
///
/// Row `i` of the complex block is the azimuthal index `m = 2i - n`; only rows
/// with `m <= 0` are needed, as the others are their complex conjugates.
/// Each complex row `q` is packed as `Re` into row `2q` and `-Im` into row `2q + 1`,
/// with the purely real `m = 0` row occupying a single slot.
fn laguerre_block(n: usize) -> Matrix {
    let size = n + 1;
    let mut c = vec![Complex64::new(0.0, 0.0); size * size];
    let norm = 2f64.powf(-0.5 * n as f64);
    for i in 0..size {
        let m = 2 * i as i64 - n as i64;
        let p = i;
        let q = n - i;
        // (-i)^m == i^(-m)
        let v1 = i_pow(-m) * norm / (factorial(p) * factorial(q)).sqrt();
        for x in 0..=n {
            let y = n - x;
            let v2 = v1 * (factorial(x) * factorial(y)).sqrt();
            for r in 0..=p.min(x) {
                let s = x - r;
                if s > q {
                    continue;
                }
                c[i * size + x] +=
                    v2 * i_pow(r as i64 - s as i64) * binomial(p, r) * binomial(q, s);
            }
        }
    }

    let mut b = Matrix::zeros(size, size);
    for x in 0..size {
        for q in 0..=(n / 2) {
            let p = n - q;
            let value = c[q * size + x];
            b[(2 * q, x)] = value.re;
            if q < p {
                b[(2 * q + 1, x)] = -value.im;
            }
        }
    }
    b
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_helpers() {
        assert_eq!(factorial(0), 1.0);
        assert_eq!(factorial(5), 120.0);
        assert_eq!(binomial(6, 2), 15.0);
        assert_eq!(binomial(6, 0), 1.0);
        assert_eq!(binomial(2, 3), 0.0);
        assert_eq!(i_pow(-1), Complex64::new(0.0, -1.0));
        assert_eq!(i_pow(6), Complex64::new(-1.0, 0.0));
    }

    #[test]
    fn test_hermite_block_is_identity() {
        for n in 0..6 {
            assert!(BasisType::Hermite.hermite_block(n).is_identity());
        }
    }

    #[test]
    fn test_laguerre_low_orders() {
        assert_abs_diff_eq!(laguerre_block(0).as_slice(), [1.0].as_slice());
        let h = std::f64::consts::FRAC_1_SQRT_2;
        assert_abs_diff_eq!(
            laguerre_block(1).as_slice(),
            [0.0, h, -h, 0.0].as_slice(),
            epsilon = 1e-14
        );
    }

    #[test]
    fn test_laguerre_rows_are_orthogonal() {
        // The complex block is unitary, so the packed rows are orthogonal with
        // squared norm 1/2 (paired rows) or 1 (the real m = 0 row).
        for n in 0..10 {
            let b = laguerre_block(n);
            let bbt = b.matmul(&b.transpose()).unwrap();
            for r in 0..=n {
                for c in 0..=n {
                    let expected = if r != c {
                        0.0
                    } else if n % 2 == 0 && r == n {
                        1.0
                    } else {
                        0.5
                    };
                    assert_abs_diff_eq!(bbt[(r, c)], expected, epsilon = 1e-10);
                }
            }
        }
    }
}
