//! Completely Randomized Design generator.
//!
//! A CRD has no blocking structure: the `t × r` plot pool (each treatment
//! repeated `r` times) is assigned to positions by a single random
//! permutation. The grid returned is an `r × t` physical arrangement for
//! convenience only; rows carry no statistical meaning.
//!
//! CRD suits homogeneous environments (growth chambers, uniform paddies)
//! where blocking would waste degrees of freedom.

use ndarray::Array2;
use rand::seq::SliceRandom;
use rand::Rng;

use super::{resolve_labels, DesignType, FieldLayout, Generate};
use crate::error::{Error, Result};

/// Generator for completely randomized designs.
#[derive(Debug, Clone)]
pub struct Crd {
    treatments: usize,
    replications: usize,
    labels: Option<Vec<String>>,
}

impl Crd {
    /// Create a new CRD generator.
    ///
    /// # Panics
    ///
    /// Panics if either count is zero.
    #[must_use]
    pub fn new(treatments: usize, replications: usize) -> Self {
        Self::try_new(treatments, replications).expect("counts must be positive")
    }

    /// Create a new CRD generator, returning an error on invalid counts.
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

    /// Number of replications of each treatment.
    #[must_use]
    pub fn replications(&self) -> usize {
        self.replications
    }
}

impl Generate for Crd {
    fn design_type(&self) -> DesignType {
        DesignType::Crd
    }

    fn treatments(&self) -> usize {
        self.treatments
    }

    fn plots(&self) -> usize {
        self.treatments * self.replications
    }

    fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<FieldLayout> {
        let labels = resolve_labels(self.labels.as_deref(), self.treatments)?;

        // One flat pool, one permutation.
        let mut pool: Vec<usize> = (0..self.treatments)
            .flat_map(|idx| std::iter::repeat(idx).take(self.replications))
            .collect();
        pool.shuffle(rng);

        let plots = Array2::from_shape_vec((self.replications, self.treatments), pool)
            .expect("pool length is replications * treatments");

        Ok(FieldLayout::new(
            DesignType::Crd,
            labels,
            self.replications,
            plots,
        ))
    }
}
