use std::f64::consts::PI;

use num_complex::Complex64;

use crate::{
    BasisType, ConversionCache, Matrix, ShapeletError, ShapeletFunction, basis::i_pow,
    compute_index, compute_offset, compute_size,
    geom::{Ellipse, LinearTransform},
    polynomial::{HermitePolynomials, Polynomial2},
};

/// `(-i)^n`.
fn minus_i_pow(n: usize) -> Complex64 {
    i_pow(-(n as i64))
}

/// A parametrized matrix that convolves Hermite-basis expansions with a fixed
/// point-spread function.
///
/// For an expansion of order [Self::col_order] with envelope `E`, the matrix
/// returned by [Self::evaluate] maps its coefficients to those of the convolved
/// expansion, which has order [Self::row_order] and the envelope written back
/// into `E`.
///
/// The matrix is built in Fourier space. The transform of
/// `|det A| Ψ_j(A (x - μ))` is `exp(-ik·μ) 2π (-i)^|j| Ψ_j(A⁻ᵀ k)`; Gaussian
/// covariances add under multiplication, and after substituting `k = A_hᵀ w` for
/// the convolved envelope `A_h` all Gaussian factors cancel, leaving an exact
/// identity between polynomials in `w`.
#[derive(Debug, Clone)]
pub struct HermiteConvolution {
    col_order: usize,
    psf_order: usize,
    psf_ellipse: Ellipse,
    /// PSF coefficients, always in the Hermite basis.
    psf_coefficients: Vec<f64>,
    polynomials: HermitePolynomials,
}

impl HermiteConvolution {
    /// Build a convolution against `psf` using the global conversion cache.
    pub fn new(col_order: usize, psf: &ShapeletFunction) -> Result<Self, ShapeletError> {
        Self::with_cache(col_order, psf, &ConversionCache::global())
    }

    /// Build a convolution against `psf`.
    ///
    /// A Laguerre-basis PSF is converted into a private Hermite copy.
    pub fn with_cache(
        col_order: usize,
        psf: &ShapeletFunction,
        cache: &ConversionCache,
    ) -> Result<Self, ShapeletError> {
        let mut psf_coefficients = psf.coefficients().to_vec();
        cache.convert_coefficient_vector(
            &mut psf_coefficients,
            psf.basis_type(),
            BasisType::Hermite,
            psf.order(),
        )?;
        let row_order = col_order + psf.order();
        Ok(Self {
            col_order,
            psf_order: psf.order(),
            psf_ellipse: *psf.ellipse(),
            psf_coefficients,
            polynomials: HermitePolynomials::new(row_order),
        })
    }

    /// Order of the to-be-convolved expansion.
    pub fn col_order(&self) -> usize {
        self.col_order
    }

    /// Order of the convolved expansion.
    pub fn row_order(&self) -> usize {
        self.col_order + self.psf_order
    }

    /// Build the convolution matrix for an expansion with envelope `ellipse`,
    /// replacing `ellipse` with the envelope of the convolved expansion.
    ///
    /// The result has `compute_size(row_order)` rows and `compute_size(col_order)` columns.
    pub fn evaluate(&self, ellipse: &mut Ellipse) -> Result<Matrix, ShapeletError> {
        let convolved = ellipse.convolve(&self.psf_ellipse);
        let a_f = *ellipse.grid_transform().linear();
        let a_g = *self.psf_ellipse.grid_transform().linear();
        let a_h = *convolved.grid_transform().linear();
        // relative transforms (A_h A⁻¹)ᵀ of each envelope against the result
        let l_f = a_f.invert()?.then(&a_h).transpose();
        let l_g = a_g.invert()?.then(&a_h).transpose();
        log::debug!(
            "Building {}x{} convolution matrix",
            compute_size(self.row_order()),
            compute_size(self.col_order)
        );

        let psf_poly = self.psf_polynomial(&l_g);
        let mut matrix = Matrix::zeros(
            compute_size(self.row_order()),
            compute_size(self.col_order),
        );
        for n in 0..=self.col_order {
            let phase = minus_i_pow(n) * (2.0 * PI);
            for x in 0..=n {
                let col = compute_index(x, n - x);
                let mut product = self
                    .polynomials
                    .compose(x, n - x, &l_f)
                    .map(|c| Complex64::new(c, 0.0))
                    .mul(&psf_poly);
                product.scale(phase);
                let expanded = self.polynomials.expand(&product);
                for degree in 0..=product.degree() {
                    // i^|i| undoes the (-i)^|i| on the output side
                    let unphase = minus_i_pow(degree).conj();
                    let offset = compute_offset(degree);
                    for i in 0..=degree {
                        matrix[(offset + i, col)] = (expanded[offset + i] * unphase).re;
                    }
                }
            }
        }
        *ellipse = convolved;
        Ok(matrix)
    }

    /// `Σ_l d_l (-i)^|l| h_l(L_g w)`.
    fn psf_polynomial(&self, l_g: &LinearTransform) -> Polynomial2<Complex64> {
        let mut out = Polynomial2::zeros(self.psf_order);
        for n in 0..=self.psf_order {
            let phase = minus_i_pow(n);
            for x in 0..=n {
                let d = self.psf_coefficients[compute_index(x, n - x)];
                if d == 0.0 {
                    continue;
                }
                let term = self
                    .polynomials
                    .compose(x, n - x, l_g)
                    .map(|c| Complex64::new(c, 0.0));
                out.add_scaled(&term, phase * d);
            }
        }
        out
    }
}
