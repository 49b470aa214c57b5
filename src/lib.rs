//! Gauss-Hermite and Gauss-Laguerre ("shapelet") expansions of 2D intensity
//! distributions: basis conversion, analytic convolution, evaluation and moments.
//!
//! A coefficient vector of order `n` has [compute_size]`(n)` elements,
//! laid out as consecutive blocks of degree `0..=n`; the block of degree `d`
//! holds `d + 1` coefficients and starts at [compute_offset]`(d)`.
use smallvec::SmallVec;


mod basis;
pub use basis::BasisType;
mod conversion;
pub use conversion::{
    ConversionCache, ConversionMatrix, convert_coefficient_vector, convert_operation_vector,
};
mod convolution;
pub use convolution::HermiteConvolution;
mod error;
pub use error::ShapeletError;
mod function;
pub use function::{Moments, ShapeletFunction, ShapeletFunctionEvaluator};
pub mod geom;
mod hermite;
pub use hermite::HermiteEvaluator;
mod matrix;
pub use matrix::Matrix;
mod polynomial;

/// Integral over the plane of the zeroth 2D Hermite basis function, `2√π`.
pub const FLUX_FACTOR: f64 = 3.544_907_701_811_032;

/// Largest order for which conversion blocks are built.
///
/// Factorials and binomials stay far from overflow here, and the
/// Hermite -> Laguerre blocks stay well-conditioned.
pub const MAX_ORDER: usize = 32;

/// Stack capacity for per-order scratch vectors.
pub const SCRATCH_SIZE: usize = 16;

/// A short vector for per-call workspaces,
/// which only spills to the heap for high orders.
type ShortVec<T> = SmallVec<[T; SCRATCH_SIZE]>;

/// Number of coefficients in an expansion of the given order.
pub fn compute_size(order: usize) -> usize {
    (order + 1) * (order + 2) / 2
}

/// Index of the first coefficient of total degree `n`.
pub fn compute_offset(n: usize) -> usize {
    n * (n + 1) / 2
}

/// Index of the Hermite coefficient with x-degree `x` and y-degree `y`.
pub fn compute_index(x: usize, y: usize) -> usize {
    compute_offset(x + y) + x
}
