//! Randomized field-layout generation.
//!
//! This module provides generators for the classical experimental designs
//! used in agricultural variety trials. Each generator validates its
//! parameters up front and then produces a randomized [`FieldLayout`].
//!
//! ## Available Designs
//!
//! | Design | Layout shape | Constraint |
//! |--------|--------------|------------|
//! | [`Crd`] | r × t | none (full randomization) |
//! | [`Rcbd`] | r × t | every treatment once per block |
//! | [`LatinSquare`] | t × t | every treatment once per row and column |
//! | [`AlphaLattice`] | (r·t/k) × k | incomplete blocks of size k, equal replication |
//!
//! ## Randomness
//!
//! All generators implement the [`Generate`] trait and take the random number
//! generator as an argument, so callers can pass a seeded generator for
//! reproducible layouts:
//!
//! ```
//! use fieldstat::design::{Generate, Rcbd};
//! use rand::SeedableRng;
//!
//! let rcbd = Rcbd::new(6, 3);
//! let mut rng = rand::rngs::StdRng::seed_from_u64(42);
//! let layout = rcbd.generate(&mut rng).unwrap();
//!
//! assert_eq!(layout.rows(), 3);
//! assert_eq!(layout.cols(), 6);
//! layout.verify().unwrap();
//! ```

mod alpha;
mod crd;
mod latin;
mod rcbd;

pub use alpha::AlphaLattice;
pub use crd::Crd;
pub use latin::LatinSquare;
pub use rcbd::Rcbd;

use ndarray::Array2;
use rand::Rng;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The experimental design family of a layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DesignType {
    /// Completely Randomized Design.
    Crd,
    /// Randomized Complete Block Design.
    Rcbd,
    /// Latin square (row and column blocking).
    LatinSquare,
    /// Alpha lattice (resolvable incomplete blocks).
    AlphaLattice,
}

impl fmt::Display for DesignType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Crd => "CRD",
            Self::Rcbd => "RCBD",
            Self::LatinSquare => "Latin square",
            Self::AlphaLattice => "alpha lattice",
        };
        write!(f, "{name}")
    }
}

/// Trait implemented by all layout generators.
pub trait Generate {
    /// The design family this generator produces.
    fn design_type(&self) -> DesignType;

    /// Number of treatments in the generated layout.
    fn treatments(&self) -> usize;

    /// Total number of plots in the generated layout.
    fn plots(&self) -> usize;

    /// Generate a randomized layout using the supplied generator.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameters` if custom labels do not match the
    /// treatment count.
    fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<FieldLayout>;
}

/// A randomized assignment of treatments to field plots.
///
/// The grid stores treatment *indices*; [`FieldLayout::treatments`] maps an
/// index back to its label. Row/column meaning depends on the design:
/// for RCBD each row is a block, for a Latin square rows and columns are the
/// two blocking directions, for an alpha lattice each row is one incomplete
/// block, and for CRD the grid is purely a physical arrangement.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FieldLayout {
    design: DesignType,
    treatments: Vec<String>,
    replications: usize,
    plots: Array2<usize>,
}

impl FieldLayout {
    pub(crate) fn new(
        design: DesignType,
        treatments: Vec<String>,
        replications: usize,
        plots: Array2<usize>,
    ) -> Self {
        Self {
            design,
            treatments,
            replications,
            plots,
        }
    }

    /// The design family of this layout.
    #[must_use]
    pub fn design(&self) -> DesignType {
        self.design
    }

    /// Treatment labels, indexed by the values stored in the grid.
    #[must_use]
    pub fn treatments(&self) -> &[String] {
        &self.treatments
    }

    /// Number of distinct treatments.
    #[must_use]
    pub fn num_treatments(&self) -> usize {
        self.treatments.len()
    }

    /// Number of replications of each treatment.
    #[must_use]
    pub fn replications(&self) -> usize {
        self.replications
    }

    /// The plot grid of treatment indices.
    #[must_use]
    pub fn plots(&self) -> &Array2<usize> {
        &self.plots
    }

    /// Number of grid rows.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.plots.nrows()
    }

    /// Number of grid columns.
    #[must_use]
    pub fn cols(&self) -> usize {
        self.plots.ncols()
    }

    /// The treatment label assigned to a plot position.
    ///
    /// # Panics
    ///
    /// Panics if the position is out of bounds.
    #[must_use]
    pub fn treatment_at(&self, row: usize, col: usize) -> &str {
        &self.treatments[self.plots[[row, col]]]
    }

    /// Re-check the structural constraint of the layout's design type.
    ///
    /// Generators always produce valid layouts; this is the independent check
    /// used by tests and by callers that deserialize layouts.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameters` describing the first violated constraint.
    pub fn verify(&self) -> Result<()> {
        let t = self.num_treatments();
        match self.design {
            DesignType::Rcbd => {
                for (b, row) in self.plots.rows().into_iter().enumerate() {
                    check_permutation(row.iter().copied(), t, &format!("block {}", b + 1))?;
                }
                Ok(())
            }
            DesignType::LatinSquare => {
                for (i, row) in self.plots.rows().into_iter().enumerate() {
                    check_permutation(row.iter().copied(), t, &format!("row {}", i + 1))?;
                }
                for (j, col) in self.plots.columns().into_iter().enumerate() {
                    check_permutation(col.iter().copied(), t, &format!("column {}", j + 1))?;
                }
                Ok(())
            }
            DesignType::Crd => {
                let mut counts = vec![0usize; t];
                for &idx in &self.plots {
                    counts[idx] += 1;
                }
                for (idx, &count) in counts.iter().enumerate() {
                    if count != self.replications {
                        return Err(Error::invalid_parameters(format!(
                            "treatment '{}' appears {} times, expected {}",
                            self.treatments[idx], count, self.replications
                        )));
                    }
                }
                Ok(())
            }
            DesignType::AlphaLattice => {
                let blocks_per_rep = self.rows() / self.replications;
                for rep in 0..self.replications {
                    let start = rep * blocks_per_rep;
                    let slice = self.plots.slice(ndarray::s![start..start + blocks_per_rep, ..]);
                    check_permutation(slice.iter().copied(), t, &format!("replicate {}", rep + 1))?;
                }
                Ok(())
            }
        }
    }

    /// Pairwise treatment-concurrence diagnostic for incomplete-block layouts.
    ///
    /// Exact pairwise balance is not achievable for arbitrary alpha-lattice
    /// parameters, so the achieved concurrence is reported rather than
    /// asserted. Complete-block designs have nothing to report.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameters` for layouts that are not alpha lattices.
    pub fn concurrence_report(&self) -> Result<ConcurrenceReport> {
        if self.design != DesignType::AlphaLattice {
            return Err(Error::invalid_parameters(format!(
                "concurrence is only defined for incomplete-block designs, not {}",
                self.design
            )));
        }

        let t = self.num_treatments();
        let mut counts = Array2::zeros((t, t));
        for row in self.plots.rows() {
            for (i, &a) in row.iter().enumerate() {
                for &b in row.iter().skip(i + 1) {
                    counts[[a, b]] += 1;
                    counts[[b, a]] += 1;
                }
            }
        }

        let k = self.cols();
        let ideal = self.replications as f64 * (k - 1) as f64 / (t - 1) as f64;

        let mut min = usize::MAX;
        let mut max = 0usize;
        let mut max_deviation = 0.0f64;
        for i in 0..t {
            for j in 0..t {
                if i == j {
                    continue;
                }
                let c: usize = counts[[i, j]];
                min = min.min(c);
                max = max.max(c);
                max_deviation = max_deviation.max((c as f64 - ideal).abs());
            }
        }

        Ok(ConcurrenceReport {
            counts,
            ideal,
            min,
            max,
            max_deviation,
        })
    }
}

/// How often each treatment pair shares an incomplete block.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ConcurrenceReport {
    /// Symmetric t×t matrix of pair concurrence counts (diagonal unused).
    pub counts: Array2<usize>,
    /// Ideal average concurrence r(k−1)/(t−1) for a balanced design.
    pub ideal: f64,
    /// Smallest observed pair concurrence.
    pub min: usize,
    /// Largest observed pair concurrence.
    pub max: usize,
    /// Largest absolute deviation from the ideal average.
    pub max_deviation: f64,
}

/// Default treatment labels `T1..Tt`.
pub(crate) fn default_labels(t: usize) -> Vec<String> {
    (1..=t).map(|i| format!("T{i}")).collect()
}

/// Resolve optional custom labels against the treatment count.
pub(crate) fn resolve_labels(custom: Option<&[String]>, t: usize) -> Result<Vec<String>> {
    match custom {
        None => Ok(default_labels(t)),
        Some(labels) if labels.len() == t => Ok(labels.to_vec()),
        Some(labels) => Err(Error::invalid_parameters(format!(
            "{} treatment labels provided for {} treatments",
            labels.len(),
            t
        ))),
    }
}

fn check_permutation(values: impl Iterator<Item = usize>, t: usize, place: &str) -> Result<()> {
    let mut counts = vec![0usize; t];
    let mut total = 0usize;
    for idx in values {
        counts[idx] += 1;
        total += 1;
    }
    if total != t {
        return Err(Error::invalid_parameters(format!(
            "{place} holds {total} plots, expected {t}"
        )));
    }
    if let Some(idx) = counts.iter().position(|&c| c != 1) {
        return Err(Error::invalid_parameters(format!(
            "treatment index {idx} appears {} times in {place}",
            counts[idx]
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    #[test]
    fn test_design_type_display() {
        assert_eq!(DesignType::Rcbd.to_string(), "RCBD");
        assert_eq!(DesignType::AlphaLattice.to_string(), "alpha lattice");
    }

    #[test]
    fn test_concurrence_rejected_for_complete_designs() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(1);
        let layout = Rcbd::new(4, 2).generate(&mut rng).unwrap();
        assert!(layout.concurrence_report().is_err());
    }

    #[test]
    fn test_resolve_labels() {
        assert_eq!(default_labels(3), vec!["T1", "T2", "T3"]);

        let custom = vec!["KDML105".to_owned(), "RD6".to_owned()];
        assert_eq!(resolve_labels(Some(&custom), 2).unwrap(), custom);
        assert!(resolve_labels(Some(&custom), 3).is_err());
    }
}
