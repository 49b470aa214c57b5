use crate::{
    ShapeletError,
    geom::{LinearTransform, Point2},
};

/// `x -> linear * x + translation`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AffineTransform {
    linear: LinearTransform,
    translation: Point2,
}

impl AffineTransform {
    pub fn new(linear: LinearTransform, translation: Point2) -> Self {
        Self {
            linear,
            translation,
        }
    }

    pub fn linear(&self) -> &LinearTransform {
        &self.linear
    }

    pub fn translation(&self) -> Point2 {
        self.translation
    }

    pub fn apply(&self, pt: Point2) -> Point2 {
        let out = self.linear.apply(pt);
        [out[0] + self.translation[0], out[1] + self.translation[1]]
    }

    /// The map that applies `self` first and then `next`.
    pub fn then(&self, next: &AffineTransform) -> AffineTransform {
        AffineTransform {
            linear: self.linear.then(&next.linear),
            translation: next.apply(self.translation),
        }
    }

    pub fn invert(&self) -> Result<AffineTransform, ShapeletError> {
        let linear = self.linear.invert()?;
        let t = linear.apply(self.translation);
        Ok(AffineTransform {
            linear,
            translation: [-t[0], -t[1]],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::AffineTransform;
    use crate::{
        geom::LinearTransform,
        tests::{SMALL_NUMBER, new_rng, random_vec},
    };
    use approx::assert_abs_diff_eq;

    fn make_transform() -> AffineTransform {
        AffineTransform::new(
            LinearTransform::new([[1.5, 0.2], [-0.3, 0.8]]),
            [20.0, -3.0],
        )
    }

    #[test]
    fn test_inverse() {
        let t = make_transform();
        let inv = t.invert().unwrap();
        let mut rng = new_rng();
        for _ in 0..100 {
            let v = random_vec(&mut rng, 2);
            let pt = [v[0] * 100.0, v[1] * 100.0];
            let back = inv.apply(t.apply(pt));
            assert_abs_diff_eq!(pt.as_slice(), back.as_slice(), epsilon = SMALL_NUMBER);
        }
    }

    #[test]
    fn test_then() {
        let a = make_transform();
        let b = AffineTransform::new(LinearTransform::rotation(1.0), [0.5, 0.25]);
        let pt = [3.0, -7.0];
        let composed = a.then(&b).apply(pt);
        let stepwise = b.apply(a.apply(pt));
        assert_abs_diff_eq!(composed.as_slice(), stepwise.as_slice(), epsilon = SMALL_NUMBER);
    }
}
