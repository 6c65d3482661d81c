//! Latin square generator.
//!
//! A Latin square of order `t` assigns `t` treatments to a `t × t` grid so
//! that every treatment appears exactly once in each row and each column,
//! blocking two field gradients at once. Row and column counts are equal by
//! construction; the dedicated constructor takes a single size for that
//! reason.
//!
//! ## Algorithm
//!
//! Start from the cyclic square `base[i][j] = (i + j) mod t`, then apply
//! three independent random permutations: one to the rows, one to the
//! columns, and one to the treatment labels. Every square produced this way
//! satisfies the Latin property; the three shuffles give a uniformly chosen
//! member of the cyclic square's isotopy class, which is the standard
//! randomization for field use.

use ndarray::Array2;
use rand::seq::SliceRandom;
use rand::Rng;

use super::{resolve_labels, DesignType, FieldLayout, Generate};
use crate::error::{Error, Result};

/// Generator for Latin square designs.
#[derive(Debug, Clone)]
pub struct LatinSquare {
    size: usize,
    labels: Option<Vec<String>>,
}

impl LatinSquare {
    /// Create a new Latin square generator of the given order.
    ///
    /// # Panics
    ///
    /// Panics if `size` is zero.
    #[must_use]
    pub fn new(size: usize) -> Self {
        Self::try_new(size).expect("size must be positive")
    }

    /// Create a new Latin square generator, returning an error on invalid size.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameters` if `size` is zero.
    pub fn try_new(size: usize) -> Result<Self> {
        if size == 0 {
            return Err(Error::invalid_parameters(
                "Latin square size must be positive",
            ));
        }
        Ok(Self { size, labels: None })
    }

    /// Use custom treatment labels instead of the default `T1..Tt`.
    #[must_use]
    pub fn with_labels(mut self, labels: Vec<String>) -> Self {
        self.labels = Some(labels);
        self
    }

    /// The order of the square (treatments, rows and columns alike).
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }
}

impl Generate for LatinSquare {
    fn design_type(&self) -> DesignType {
        DesignType::LatinSquare
    }

    fn treatments(&self) -> usize {
        self.size
    }

    fn plots(&self) -> usize {
        self.size * self.size
    }

    fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<FieldLayout> {
        let labels = resolve_labels(self.labels.as_deref(), self.size)?;

        let t = self.size;
        let mut row_perm: Vec<usize> = (0..t).collect();
        let mut col_perm: Vec<usize> = (0..t).collect();
        let mut sym_perm: Vec<usize> = (0..t).collect();
        row_perm.shuffle(rng);
        col_perm.shuffle(rng);
        sym_perm.shuffle(rng);

        let mut plots = Array2::zeros((t, t));
        for i in 0..t {
            for j in 0..t {
                plots[[i, j]] = sym_perm[(row_perm[i] + col_perm[j]) % t];
            }
        }

        Ok(FieldLayout::new(DesignType::LatinSquare, labels, t, plots))
    }
}
