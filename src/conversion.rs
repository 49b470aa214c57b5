//! Conversion of coefficient vectors between the Hermite and Laguerre bases.
//!
//! Per-order blocks are built lazily and kept in a [ConversionCache].
//! The cache only ever grows: once a block exists it is never rebuilt.
use std::sync::{Arc, LazyLock, PoisonError, RwLock, RwLockReadGuard};

use crate::{
    BasisType, MAX_ORDER, Matrix, ShapeletError, ShortVec, compute_size, error::validate_size,
};

static GLOBAL_CACHE: LazyLock<Arc<ConversionCache>> =
    LazyLock::new(|| Arc::new(ConversionCache::new()));

#[derive(Debug, Default)]
struct Blocks {
    /// Hermite -> Laguerre, indexed by degree.
    h2l: Vec<Matrix>,
    /// Laguerre -> Hermite, indexed by degree.
    l2h: Vec<Matrix>,
}

impl Blocks {
    /// Per-degree blocks for `input -> output`, or `None` for the identity.
    fn select(&self, input: BasisType, output: BasisType) -> Option<&[Matrix]> {
        match (input, output) {
            (BasisType::Hermite, BasisType::Laguerre) => Some(&self.h2l),
            (BasisType::Laguerre, BasisType::Hermite) => Some(&self.l2h),
            _ => None,
        }
    }
}

/// Grow-only store of per-degree conversion blocks.
///
/// Reads share a lock; growth takes it exclusively, so a cache may be shared
/// between threads behind an [Arc].
#[derive(Debug, Default)]
pub struct ConversionCache {
    blocks: RwLock<Blocks>,
}

impl ConversionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared default cache used by the convenience entry points.
    pub fn global() -> Arc<ConversionCache> {
        Arc::clone(&GLOBAL_CACHE)
    }

    fn read(&self) -> RwLockReadGuard<'_, Blocks> {
        // blocks are pushed fully built, so a poisoned lock still holds valid data
        self.blocks.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Highest degree for which blocks have been built, if any.
    pub fn max_order(&self) -> Option<usize> {
        self.read().h2l.len().checked_sub(1)
    }

    /// Build the blocks for every degree up to and including `order`.
    pub fn ensure(&self, order: usize) -> Result<(), ShapeletError> {
        if order > MAX_ORDER {
            return Err(ShapeletError::OrderTooLarge {
                order,
                max: MAX_ORDER,
            });
        }
        if self.read().h2l.len() > order {
            return Ok(());
        }
        let mut blocks = self.blocks.write().unwrap_or_else(PoisonError::into_inner);
        let start = blocks.h2l.len();
        if start > order {
            // another writer got here first
            return Ok(());
        }
        log::debug!("Growing conversion cache from {start} to {} degrees", order + 1);
        for n in start..=order {
            let h2l = BasisType::Laguerre.hermite_block(n);
            let l2h = h2l.inverse()?;
            log::trace!("Built conversion blocks for degree {n}");
            blocks.h2l.push(h2l);
            blocks.l2h.push(l2h);
        }
        Ok(())
    }

    /// The `(n+1) x (n+1)` block converting degree-`n` coefficients from `input` to `output`.
    pub fn block(
        &self,
        input: BasisType,
        output: BasisType,
        n: usize,
    ) -> Result<Matrix, ShapeletError> {
        if input == output {
            return Ok(Matrix::identity(n + 1));
        }
        self.ensure(n)?;
        let blocks = self.read();
        match blocks.select(input, output) {
            Some(b) => Ok(b[n].clone()),
            None => Ok(Matrix::identity(n + 1)),
        }
    }

    /// Convert a coefficient vector in place. Does nothing if the bases match.
    pub fn convert_coefficient_vector(
        &self,
        array: &mut [f64],
        input: BasisType,
        output: BasisType,
        order: usize,
    ) -> Result<(), ShapeletError> {
        if input == output {
            return Ok(());
        }
        ConversionMatrix::new(self, input, output, order)?.multiply_on_left(array)
    }

    /// Convert an operation vector (a linear functional on coefficient vectors) in place.
    ///
    /// The dot product of an operation vector with a coefficient vector is
    /// unchanged when both are converted between the same pair of bases.
    pub fn convert_operation_vector(
        &self,
        array: &mut [f64],
        input: BasisType,
        output: BasisType,
        order: usize,
    ) -> Result<(), ShapeletError> {
        if input == output {
            return Ok(());
        }
        ConversionMatrix::new(self, output, input, order)?.multiply_on_right(array)
    }
}

/// [ConversionCache::convert_coefficient_vector] on the global cache.
pub fn convert_coefficient_vector(
    array: &mut [f64],
    input: BasisType,
    output: BasisType,
    order: usize,
) -> Result<(), ShapeletError> {
    ConversionCache::global().convert_coefficient_vector(array, input, output, order)
}

/// [ConversionCache::convert_operation_vector] on the global cache.
pub fn convert_operation_vector(
    array: &mut [f64],
    input: BasisType,
    output: BasisType,
    order: usize,
) -> Result<(), ShapeletError> {
    ConversionCache::global().convert_operation_vector(array, input, output, order)
}

/// Block-diagonal transform between two bases of the same order.
///
/// This is a view over the blocks held by a [ConversionCache];
/// constructing it makes sure they exist.
#[derive(Debug, Clone, Copy)]
pub struct ConversionMatrix<'c> {
    cache: &'c ConversionCache,
    order: usize,
    input: BasisType,
    output: BasisType,
}

impl<'c> ConversionMatrix<'c> {
    /// Grows `cache` up to `order` when the bases differ.
    ///
    /// Identity views never read the cache, so they neither grow it nor
    /// enforce [MAX_ORDER].
    pub fn new(
        cache: &'c ConversionCache,
        input: BasisType,
        output: BasisType,
        order: usize,
    ) -> Result<Self, ShapeletError> {
        if input != output {
            cache.ensure(order)?;
        }
        Ok(Self {
            cache,
            order,
            input,
            output,
        })
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn input(&self) -> BasisType {
        self.input
    }

    pub fn output(&self) -> BasisType {
        self.output
    }

    pub fn get_block(&self, n: usize) -> Result<Matrix, ShapeletError> {
        self.cache.block(self.input, self.output, n)
    }

    /// The full `compute_size(order)` square block-diagonal matrix.
    pub fn build_dense_matrix(&self) -> Result<Matrix, ShapeletError> {
        let size = compute_size(self.order);
        if self.input == self.output {
            return Ok(Matrix::identity(size));
        }
        let mut out = Matrix::zeros(size, size);
        let blocks = self.cache.read();
        if let Some(selected) = blocks.select(self.input, self.output) {
            let mut offset = 0;
            for block in selected.iter().take(self.order + 1) {
                out.set_block(offset, offset, block);
                offset += block.nrows();
            }
        }
        Ok(out)
    }

    /// `array <- M * array`, applied block by block.
    pub fn multiply_on_left(&self, array: &mut [f64]) -> Result<(), ShapeletError> {
        self.apply(array, Matrix::matmul_into)
    }

    /// `arrayᵀ <- arrayᵀ * M`, applied block by block.
    pub fn multiply_on_right(&self, array: &mut [f64]) -> Result<(), ShapeletError> {
        self.apply(array, Matrix::vecmul_into)
    }

    fn apply<F>(&self, array: &mut [f64], product: F) -> Result<(), ShapeletError>
    where
        F: Fn(&Matrix, &[f64], &mut [f64]),
    {
        validate_size(compute_size(self.order), array.len())?;
        if self.input == self.output {
            return Ok(());
        }
        let blocks = self.cache.read();
        let Some(selected) = blocks.select(self.input, self.output) else {
            return Ok(());
        };
        let mut buf: ShortVec<f64> = ShortVec::new();
        let mut offset = 0;
        for block in selected.iter().take(self.order + 1) {
            let n = block.nrows();
            let segment = &mut array[offset..offset + n];
            buf.clear();
            buf.resize(n, 0.0);
            product(block, &*segment, buf.as_mut_slice());
            segment.copy_from_slice(&buf);
            offset += n;
        }
        Ok(())
    }
}
