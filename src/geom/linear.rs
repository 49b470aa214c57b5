use crate::{ShapeletError, geom::Point2};

/// A 2x2 linear map, stored row-major.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearTransform {
    m: [[f64; 2]; 2],
}

impl Default for LinearTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl LinearTransform {
    pub fn new(m: [[f64; 2]; 2]) -> Self {
        Self { m }
    }

    pub fn identity() -> Self {
        Self::scaling(1.0, 1.0)
    }

    pub fn scaling(sx: f64, sy: f64) -> Self {
        Self {
            m: [[sx, 0.0], [0.0, sy]],
        }
    }

    /// Counter-clockwise rotation by `theta` radians.
    pub fn rotation(theta: f64) -> Self {
        let (s, c) = theta.sin_cos();
        Self {
            m: [[c, -s], [s, c]],
        }
    }

    pub fn matrix(&self) -> [[f64; 2]; 2] {
        self.m
    }

    pub fn apply(&self, pt: Point2) -> Point2 {
        [
            self.m[0][0] * pt[0] + self.m[0][1] * pt[1],
            self.m[1][0] * pt[0] + self.m[1][1] * pt[1],
        ]
    }

    /// The map that applies `self` first and then `next`, i.e. `next * self`.
    pub fn then(&self, next: &LinearTransform) -> LinearTransform {
        let a = next.m;
        let b = self.m;
        let mut m = [[0.0; 2]; 2];
        for (r, row) in m.iter_mut().enumerate() {
            for (c, v) in row.iter_mut().enumerate() {
                *v = a[r][0] * b[0][c] + a[r][1] * b[1][c];
            }
        }
        LinearTransform { m }
    }

    pub fn transpose(&self) -> LinearTransform {
        LinearTransform {
            m: [[self.m[0][0], self.m[1][0]], [self.m[0][1], self.m[1][1]]],
        }
    }

    pub fn determinant(&self) -> f64 {
        self.m[0][0] * self.m[1][1] - self.m[0][1] * self.m[1][0]
    }

    pub fn invert(&self) -> Result<LinearTransform, ShapeletError> {
        let det = self.determinant();
        if det == 0.0 {
            return Err(ShapeletError::Singular);
        }
        Ok(LinearTransform {
            m: [
                [self.m[1][1] / det, -self.m[0][1] / det],
                [-self.m[1][0] / det, self.m[0][0] / det],
            ],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::LinearTransform;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_rotation() {
        let r = LinearTransform::rotation(std::f64::consts::FRAC_PI_2);
        let out = r.apply([1.0, 0.0]);
        assert_abs_diff_eq!(out.as_slice(), [0.0, 1.0].as_slice(), epsilon = 1e-12);
        assert_abs_diff_eq!(r.determinant(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_then_applies_in_order() {
        let s = LinearTransform::scaling(2.0, 3.0);
        let r = LinearTransform::rotation(0.4);
        let pt = [0.3, -1.2];
        let composed = s.then(&r).apply(pt);
        let stepwise = r.apply(s.apply(pt));
        assert_abs_diff_eq!(composed.as_slice(), stepwise.as_slice(), epsilon = 1e-12);
    }

    #[test]
    fn test_invert() {
        let t = LinearTransform::new([[2.0, 0.5], [-1.0, 3.0]]);
        let inv = t.invert().unwrap();
        let eye = t.then(&inv);
        assert_abs_diff_eq!(eye.matrix()[0].as_slice(), [1.0, 0.0].as_slice(), epsilon = 1e-12);
        assert_abs_diff_eq!(eye.matrix()[1].as_slice(), [0.0, 1.0].as_slice(), epsilon = 1e-12);
        assert!(LinearTransform::scaling(0.0, 1.0).invert().is_err());
    }
}
