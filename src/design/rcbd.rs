//! Randomized Complete Block Design generator.
//!
//! In an RCBD every block contains every treatment exactly once, and the
//! order of treatments within each block is randomized independently of
//! every other block. Blocks absorb a known source of field variation
//! (fertility gradient, slope, moisture) so the residual measures only
//! plot-to-plot noise.
//!
//! ## Example
//!
//! ```
//! use fieldstat::design::{Generate, Rcbd};
//! use rand::SeedableRng;
//!
//! let mut rng = rand::rngs::StdRng::seed_from_u64(7);
//! let layout = Rcbd::new(8, 4).generate(&mut rng).unwrap();
//!
//! assert_eq!(layout.rows(), 4);   // blocks
//! assert_eq!(layout.cols(), 8);   // plots per block
//! layout.verify().unwrap();
//! ```

use ndarray::Array2;
use rand::seq::SliceRandom;
use rand::Rng;

use super::{resolve_labels, DesignType, FieldLayout, Generate};
use crate::error::{Error, Result};

/// Generator for randomized complete block designs.
#[derive(Debug, Clone)]
pub struct Rcbd {
    treatments: usize,
    replications: usize,
    labels: Option<Vec<String>>,
}

impl Rcbd {
    /// Create a new RCBD generator.
    ///
    /// # Panics
    ///
    /// Panics if either count is zero.
    #[must_use]
    pub fn new(treatments: usize, replications: usize) -> Self {
        Self::try_new(treatments, replications).expect("counts must be positive")
    }

    /// Create a new RCBD generator, returning an error on invalid counts.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameters` if either count is zero.
    pub fn try_new(treatments: usize, replications: usize) -> Result<Self> {
        if treatments == 0 || replications == 0 {
            return Err(Error::invalid_parameters(
                "treatment and replication counts must be positive",
            ));
        }
        Ok(Self {
            treatments,
            replications,
            labels: None,
        })
    }

    /// Use custom treatment labels instead of the default `T1..Tt`.
    #[must_use]
    pub fn with_labels(mut self, labels: Vec<String>) -> Self {
        self.labels = Some(labels);
        self
    }

    /// Number of blocks (replications).
    #[must_use]
    pub fn replications(&self) -> usize {
        self.replications
    }
}

impl Generate for Rcbd {
    fn design_type(&self) -> DesignType {
        DesignType::Rcbd
    }

    fn treatments(&self) -> usize {
        self.treatments
    }

    fn plots(&self) -> usize {
        self.treatments * self.replications
    }

    fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<FieldLayout> {
        let labels = resolve_labels(self.labels.as_deref(), self.treatments)?;

        let t = self.treatments;
        let mut plots = Array2::zeros((self.replications, t));
        let mut order: Vec<usize> = (0..t).collect();

        // Each block is randomized independently.
        for block in 0..self.replications {
            order.shuffle(rng);
            for (pos, &idx) in order.iter().enumerate() {
                plots[[block, pos]] = idx;
            }
        }

        Ok(FieldLayout::new(
            DesignType::Rcbd,
            labels,
            self.replications,
            plots,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    #[test]
    fn test_rcbd_invalid_counts() {
        assert!(Rcbd::try_new(0, 4).is_err());
        assert!(Rcbd::try_new(8, 0).is_err());
    }

    #[test]
    fn test_rcbd_each_block_complete() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(11);
        let layout = Rcbd::new(8, 4).generate(&mut rng).unwrap();

        assert_eq!(layout.design(), DesignType::Rcbd);
        assert_eq!(layout.rows() * layout.cols(), 32);
        layout.verify().unwrap();

        // Every block holds every treatment exactly once.
        for row in layout.plots().rows() {
            let mut seen = vec![false; 8];
            for &idx in row {
                assert!(!seen[idx]);
                seen[idx] = true;
            }
        }
    }

    #[test]
    fn test_rcbd_seeded_determinism() {
        let rcbd = Rcbd::new(6, 3);
        let a = rcbd
            .generate(&mut Xoshiro256PlusPlus::seed_from_u64(99))
            .unwrap();
        let b = rcbd
            .generate(&mut Xoshiro256PlusPlus::seed_from_u64(99))
            .unwrap();
        assert_eq!(a.plots(), b.plots());
    }

    #[test]
    fn test_rcbd_blocks_randomized_independently() {
        // With 8 treatments and 16 blocks the odds of every block drawing the
        // same permutation are astronomically small.
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(5);
        let layout = Rcbd::new(8, 16).generate(&mut rng).unwrap();
        let first: Vec<usize> = layout.plots().row(0).to_vec();
        let all_same = layout
            .plots()
            .rows()
            .into_iter()
            .all(|row| row.to_vec() == first);
        assert!(!all_same);
    }

    #[test]
    fn test_rcbd_custom_labels() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(3);
        let layout = Rcbd::new(2, 2)
            .with_labels(vec!["KDML105".into(), "RD6".into()])
            .generate(&mut rng)
            .unwrap();
        assert_eq!(layout.treatments(), &["KDML105", "RD6"]);

        let bad = Rcbd::new(3, 2)
            .with_labels(vec!["only-one".into()])
            .generate(&mut rng);
        assert!(bad.is_err());
    }
}
