//! Minimal 2D geometry for Gaussian envelopes.
//!
//! Ellipses are stored as [Axes] so that the orientation of a circular envelope
//! survives round trips; that orientation fixes the axes of the Hermite basis.
mod affine;
pub use affine::AffineTransform;
mod ellipse;
pub use ellipse::{Axes, Ellipse, Quadrupole};
mod linear;
pub use linear::LinearTransform;

/// A point or offset in the plane, `[x, y]`.
pub type Point2 = [f64; 2];
