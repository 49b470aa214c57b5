use crate::geom::{AffineTransform, LinearTransform, Point2};

/// Ellipse core given by semi-major axis `a`, semi-minor axis `b`
/// and position angle `theta` (radians, counter-clockwise from +x).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Axes {
    pub a: f64,
    pub b: f64,
    pub theta: f64,
}

impl Default for Axes {
    fn default() -> Self {
        Self::circle(1.0)
    }
}

impl Axes {
    pub fn new(a: f64, b: f64, theta: f64) -> Self {
        Self { a, b, theta }
    }

    pub fn circle(radius: f64) -> Self {
        Self::new(radius, radius, 0.0)
    }

    pub fn to_quadrupole(&self) -> Quadrupole {
        let (s, c) = self.theta.sin_cos();
        let a2 = self.a * self.a;
        let b2 = self.b * self.b;
        Quadrupole {
            ixx: c * c * a2 + s * s * b2,
            iyy: s * s * a2 + c * c * b2,
            ixy: c * s * (a2 - b2),
        }
    }

    /// Linear part of the map taking this ellipse onto the unit circle:
    /// rotate by `-theta`, then scale by `(1/a, 1/b)`.
    pub fn grid_transform(&self) -> LinearTransform {
        LinearTransform::rotation(-self.theta)
            .then(&LinearTransform::scaling(1.0 / self.a, 1.0 / self.b))
    }
}

/// Second-moment tensor `[[ixx, ixy], [ixy, iyy]]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Quadrupole {
    pub ixx: f64,
    pub iyy: f64,
    pub ixy: f64,
}

impl Quadrupole {
    pub fn new(ixx: f64, iyy: f64, ixy: f64) -> Self {
        Self { ixx, iyy, ixy }
    }

    pub fn from_matrix(m: [[f64; 2]; 2]) -> Self {
        Self::new(m[0][0], m[1][1], 0.5 * (m[0][1] + m[1][0]))
    }

    pub fn matrix(&self) -> [[f64; 2]; 2] {
        [[self.ixx, self.ixy], [self.ixy, self.iyy]]
    }

    /// NaN axes for tensors that are not positive semi-definite.
    pub fn to_axes(&self) -> Axes {
        let xx_p_yy = self.ixx + self.iyy;
        let xx_m_yy = self.ixx - self.iyy;
        let t = xx_m_yy.hypot(2.0 * self.ixy);
        Axes {
            a: (0.5 * (xx_p_yy + t)).sqrt(),
            b: (0.5 * (xx_p_yy - t)).sqrt(),
            theta: 0.5 * (2.0 * self.ixy).atan2(xx_m_yy),
        }
    }
}

impl std::ops::Add for Quadrupole {
    type Output = Quadrupole;

    fn add(self, rhs: Quadrupole) -> Quadrupole {
        Quadrupole {
            ixx: self.ixx + rhs.ixx,
            iyy: self.iyy + rhs.iyy,
            ixy: self.ixy + rhs.ixy,
        }
    }
}

/// An elliptical Gaussian envelope: a core shape plus a center.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Ellipse {
    core: Axes,
    center: Point2,
}

impl Ellipse {
    pub fn new(core: Axes, center: Point2) -> Self {
        Self { core, center }
    }

    pub fn from_quadrupole(core: Quadrupole, center: Point2) -> Self {
        Self::new(core.to_axes(), center)
    }

    pub fn core(&self) -> &Axes {
        &self.core
    }

    pub fn center(&self) -> Point2 {
        self.center
    }

    pub fn set_center(&mut self, center: Point2) {
        self.center = center;
    }

    pub fn quadrupole(&self) -> Quadrupole {
        self.core.to_quadrupole()
    }

    /// Affine map from the plane into the frame where this ellipse is the unit
    /// circle centered on the origin.
    pub fn grid_transform(&self) -> AffineTransform {
        let linear = self.core.grid_transform();
        let t = linear.apply(self.center);
        AffineTransform::new(linear, [-t[0], -t[1]])
    }

    /// Envelope of the convolution of two Gaussians with these envelopes.
    pub fn convolve(&self, other: &Ellipse) -> Ellipse {
        Ellipse::from_quadrupole(
            self.quadrupole() + other.quadrupole(),
            [
                self.center[0] + other.center[0],
                self.center[1] + other.center[1],
            ],
        )
    }
}
