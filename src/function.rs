use std::sync::Arc;

#[cfg(feature = "ndarray")]
use ndarray::ArrayViewMut2;

use crate::{
    BasisType, ConversionCache, FLUX_FACTOR, HermiteConvolution, HermiteEvaluator, ShapeletError,
    compute_size,
    error::validate_size,
    geom::{AffineTransform, Axes, Ellipse, Point2, Quadrupole},
};

/// A 2D function expanded in shapelets of one basis type,
/// weighted by an elliptical Gaussian envelope.
#[derive(Debug, PartialEq)]
pub struct ShapeletFunction {
    order: usize,
    basis_type: BasisType,
    ellipse: Ellipse,
    coefficients: Vec<f64>,
}

impl Default for ShapeletFunction {
    fn default() -> Self {
        Self::new(0, BasisType::Hermite)
    }
}

impl Clone for ShapeletFunction {
    fn clone(&self) -> Self {
        Self {
            order: self.order,
            basis_type: self.basis_type,
            ellipse: self.ellipse,
            coefficients: self.coefficients.clone(),
        }
    }

    /// Reuses the coefficient storage when the orders match.
    fn clone_from(&mut self, source: &Self) {
        self.order = source.order;
        self.basis_type = source.basis_type;
        self.ellipse = source.ellipse;
        self.coefficients.clone_from(&source.coefficients);
    }
}

impl ShapeletFunction {
    /// Zero-filled expansion on the unit circle at the origin.
    pub fn new(order: usize, basis_type: BasisType) -> Self {
        Self::with_ellipse(order, basis_type, Ellipse::default())
    }

    pub fn with_coefficients(
        order: usize,
        basis_type: BasisType,
        coefficients: Vec<f64>,
    ) -> Result<Self, ShapeletError> {
        Self::with_ellipse_and_coefficients(order, basis_type, Ellipse::default(), coefficients)
    }

    /// Zero-filled expansion on a circular envelope.
    pub fn with_radius(order: usize, basis_type: BasisType, radius: f64, center: Point2) -> Self {
        Self::with_ellipse(order, basis_type, Ellipse::new(Axes::circle(radius), center))
    }

    pub fn with_radius_and_coefficients(
        order: usize,
        basis_type: BasisType,
        radius: f64,
        center: Point2,
        coefficients: Vec<f64>,
    ) -> Result<Self, ShapeletError> {
        Self::with_ellipse_and_coefficients(
            order,
            basis_type,
            Ellipse::new(Axes::circle(radius), center),
            coefficients,
        )
    }

    pub fn with_ellipse(order: usize, basis_type: BasisType, ellipse: Ellipse) -> Self {
        Self {
            order,
            basis_type,
            ellipse,
            coefficients: vec![0.0; compute_size(order)],
        }
    }

    pub fn with_ellipse_and_coefficients(
        order: usize,
        basis_type: BasisType,
        ellipse: Ellipse,
        coefficients: Vec<f64>,
    ) -> Result<Self, ShapeletError> {
        validate_size(compute_size(order), coefficients.len())?;
        Ok(Self {
            order,
            basis_type,
            ellipse,
            coefficients,
        })
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn basis_type(&self) -> BasisType {
        self.basis_type
    }

    /// Convert the coefficients so that the same function is represented in `basis_type`.
    pub fn change_basis_type(&mut self, basis_type: BasisType) -> Result<(), ShapeletError> {
        ConversionCache::global().convert_coefficient_vector(
            &mut self.coefficients,
            self.basis_type,
            basis_type,
            self.order,
        )?;
        self.basis_type = basis_type;
        Ok(())
    }

    pub fn ellipse(&self) -> &Ellipse {
        &self.ellipse
    }

    pub fn ellipse_mut(&mut self) -> &mut Ellipse {
        &mut self.ellipse
    }

    pub fn set_ellipse(&mut self, ellipse: Ellipse) {
        self.ellipse = ellipse;
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn coefficients_mut(&mut self) -> &mut [f64] {
        &mut self.coefficients
    }

    /// Replace the coefficients, which must match the current order.
    pub fn set_coefficients(&mut self, coefficients: Vec<f64>) -> Result<(), ShapeletError> {
        validate_size(compute_size(self.order), coefficients.len())?;
        self.coefficients = coefficients;
        Ok(())
    }

    /// Move the envelope center by `offset`.
    pub fn shift_in_place(&mut self, offset: Point2) {
        let [x, y] = self.ellipse.center();
        self.ellipse.set_center([x + offset[0], y + offset[1]]);
    }

    /// Scale the coefficients so that the function integrates to [FLUX_FACTOR].
    ///
    /// A pure Gaussian ends up with a unit zeroth coefficient.
    /// A function with zero flux ends up non-finite.
    pub fn normalize(&mut self) -> Result<(), ShapeletError> {
        self.normalize_to(FLUX_FACTOR)
    }

    /// Scale the coefficients so that the function integrates to `value`.
    pub fn normalize_to(&mut self, value: f64) -> Result<(), ShapeletError> {
        let flux = self.evaluate()?.integrate();
        let factor = value / flux;
        for c in self.coefficients.iter_mut() {
            *c *= factor;
        }
        Ok(())
    }

    /// Convolve with `other`, giving a Hermite-basis function of the summed order.
    pub fn convolve(&self, other: &ShapeletFunction) -> Result<ShapeletFunction, ShapeletError> {
        let convolution = HermiteConvolution::new(self.order, other)?;
        let mut coefficients = self.coefficients.clone();
        ConversionCache::global().convert_coefficient_vector(
            &mut coefficients,
            self.basis_type,
            BasisType::Hermite,
            self.order,
        )?;
        let mut ellipse = self.ellipse;
        let matrix = convolution.evaluate(&mut ellipse)?;
        let mut result = ShapeletFunction::with_ellipse(
            convolution.row_order(),
            BasisType::Hermite,
            ellipse,
        );
        matrix.matmul_into(&coefficients, &mut result.coefficients);
        Ok(result)
    }

    /// Bind an evaluator to the current state of this function.
    pub fn evaluate(&self) -> Result<ShapeletFunctionEvaluator, ShapeletError> {
        ShapeletFunctionEvaluator::new(self)
    }
}

/// Evaluates a [ShapeletFunction] at points, over images and through its moments.
///
/// Holds a snapshot of the function: later changes to the function are only
/// picked up by [Self::update].
#[derive(Debug, Clone)]
pub struct ShapeletFunctionEvaluator {
    transform: AffineTransform,
    normalization: f64,
    /// Always in the Hermite basis.
    coefficients: Vec<f64>,
    hermite: HermiteEvaluator,
    cache: Arc<ConversionCache>,
}

impl ShapeletFunctionEvaluator {
    pub fn new(function: &ShapeletFunction) -> Result<Self, ShapeletError> {
        Self::with_cache(function, ConversionCache::global())
    }

    pub fn with_cache(
        function: &ShapeletFunction,
        cache: Arc<ConversionCache>,
    ) -> Result<Self, ShapeletError> {
        let mut evaluator = Self {
            transform: AffineTransform::default(),
            normalization: 1.0,
            coefficients: Vec::with_capacity(compute_size(function.order())),
            hermite: HermiteEvaluator::new(function.order()),
            cache,
        };
        evaluator.bind(function)?;
        Ok(evaluator)
    }

    /// Rebind to `function`, which must have the same order.
    pub fn update(&mut self, function: &ShapeletFunction) -> Result<(), ShapeletError> {
        if function.order() != self.order() {
            return Err(ShapeletError::OrderMismatch {
                expected: self.order(),
                actual: function.order(),
            });
        }
        self.bind(function)
    }

    fn bind(&mut self, function: &ShapeletFunction) -> Result<(), ShapeletError> {
        self.transform = function.ellipse().grid_transform();
        self.normalization = self.transform.linear().determinant().abs();
        self.coefficients.clone_from(&function.coefficients);
        self.cache.convert_coefficient_vector(
            &mut self.coefficients,
            function.basis_type(),
            BasisType::Hermite,
            function.order(),
        )
    }

    pub fn order(&self) -> usize {
        self.hermite.order()
    }

    pub fn evaluate(&self, x: f64, y: f64) -> f64 {
        self.evaluate_point([x, y])
    }

    pub fn evaluate_point(&self, point: Point2) -> f64 {
        let [u, v] = self.transform.apply(point);
        self.normalization * self.hermite.sum_evaluation(&self.coefficients, u, v)
    }

    /// Add the function, sampled at pixel centers, to `image`.
    ///
    /// Rows run along y and columns along x;
    /// pixel `(row, col)` sits at `(col + xy0[0], row + xy0[1])`.
    #[cfg(feature = "ndarray")]
    pub fn add_to_image(&self, mut image: ArrayViewMut2<f64>, xy0: [i32; 2]) {
        let (x0, y0) = (f64::from(xy0[0]), f64::from(xy0[1]));
        for ((row, col), value) in image.indexed_iter_mut() {
            *value += self.evaluate(col as f64 + x0, row as f64 + y0);
        }
    }

    /// Total flux.
    pub fn integrate(&self) -> f64 {
        self.hermite.sum_integration(&self.coefficients, 0, 0)
    }

    /// Flux, flux-weighted centroid and central second moments.
    pub fn compute_moments(&self) -> Result<Moments, ShapeletError> {
        let m0 = self.hermite.sum_integration(&self.coefficients, 0, 0);
        let m1 = [
            self.hermite.sum_integration(&self.coefficients, 1, 0),
            self.hermite.sum_integration(&self.coefficients, 0, 1),
        ];
        let mxy = self.hermite.sum_integration(&self.coefficients, 1, 1);
        let m2 = [
            [self.hermite.sum_integration(&self.coefficients, 2, 0), mxy],
            [mxy, self.hermite.sum_integration(&self.coefficients, 0, 2)],
        ];

        // moments above are in the unit-circle frame u = A x + b
        let a = self.transform.linear().invert()?;
        let b = self.transform.translation();
        let q1 = a.apply([m1[0] - b[0] * m0, m1[1] - b[1] * m0]);
        let mut centered = [[0.0; 2]; 2];
        for (i, row) in centered.iter_mut().enumerate() {
            for (j, v) in row.iter_mut().enumerate() {
                *v = m2[i][j] + b[i] * b[j] * m0 - m1[i] * b[j] - b[i] * m1[j];
            }
        }
        let a = a.matrix();
        let mut q2 = [[0.0; 2]; 2];
        for (i, row) in q2.iter_mut().enumerate() {
            for (j, v) in row.iter_mut().enumerate() {
                for k in 0..2 {
                    for l in 0..2 {
                        *v += a[i][k] * centered[k][l] * a[j][l];
                    }
                }
            }
        }

        let centroid = [q1[0] / m0, q1[1] / m0];
        for (i, row) in q2.iter_mut().enumerate() {
            for (j, v) in row.iter_mut().enumerate() {
                *v = *v / m0 - centroid[i] * centroid[j];
            }
        }
        Ok(Moments {
            flux: m0,
            center: centroid,
            quadrupole: Quadrupole::from_matrix(q2),
        })
    }
}

/// Zeroth, first and central second moments of a [ShapeletFunction].
///
/// The quadrupole is kept as computed: expansions with negative lobes can have
/// a second-moment tensor that is not positive definite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Moments {
    flux: f64,
    center: Point2,
    quadrupole: Quadrupole,
}

impl Moments {
    pub fn flux(&self) -> f64 {
        self.flux
    }

    pub fn center(&self) -> Point2 {
        self.center
    }

    pub fn quadrupole(&self) -> Quadrupole {
        self.quadrupole
    }

    /// The ellipse with these moments.
    ///
    /// Its axes are NaN unless the quadrupole is positive semi-definite.
    pub fn ellipse(&self) -> Ellipse {
        Ellipse::from_quadrupole(self.quadrupole, self.center)
    }
}
