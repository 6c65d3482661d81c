//! # Fieldstat
//!
//! A statistics toolkit for agricultural field trials: randomized design
//! generation, analysis of variance, post-hoc mean comparison, and
//! multi-environment stability analysis.
//!
//! ## Overview
//!
//! A variety trial walks through the same pipeline every season:
//! - **Design**: randomize treatments into a field layout (CRD, RCBD,
//!   Latin square, or alpha lattice)
//! - **ANOVA**: partition the harvested responses into treatment, block,
//!   and residual variation, with F-test, CV, and LSD
//! - **Mean comparison**: group treatment means with significance letters
//!   (LSD, Tukey HSD, or Duncan)
//! - **Stability**: regress each genotype on an environment index across
//!   sites (Eberhart & Russell)
//!
//! ## Quick Start
//!
//! Generate a randomized complete block design, then analyze the trial:
//!
//! ```rust
//! use fieldstat::design::{Generate, Rcbd};
//! use fieldstat::dataset::{Observation, TrialDataset};
//! use fieldstat::{anova, DEFAULT_ALPHA};
//!
//! // Lay out 4 treatments in 3 blocks.
//! let layout = Rcbd::new(4, 3).generate(&mut rand::thread_rng()).unwrap();
//! assert_eq!(layout.plots().dim(), (3, 4));
//!
//! // Analyze the recorded responses.
//! let mut data = TrialDataset::new();
//! let noise = [0.3, -0.1, -0.2];
//! for (t, (trt, base)) in [("A", 12.0), ("B", 15.0), ("C", 9.0)].into_iter().enumerate() {
//!     for i in 0..3 {
//!         let obs = Observation::new(trt, format!("R{}", i + 1), base + noise[(i + t) % 3]);
//!         data.push(obs).unwrap();
//!     }
//! }
//! let result = anova::rcbd(&data, DEFAULT_ALPHA).unwrap();
//! assert!(result.is_significant);
//! ```
//!
//! ## Conventions
//!
//! Field layouts are `replications × treatments` matrices of treatment
//! indices (`ndarray::Array2<usize>`); datasets are flat observation lists
//! keyed by treatment, block, and (optionally) site labels. All analyses
//! take a significance level strictly between 0 and 1; [`DEFAULT_ALPHA`]
//! is the conventional 0.05.
//!
//! ## Features
//!
//! - `serde`: Enable serialization/deserialization of layouts and results

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
// Statistical formulas juggle counts and sums; the truncating casts are all
// usize -> f64 on small dimensions.
#![allow(clippy::cast_precision_loss)]

pub mod anova;
pub mod compare;
pub mod dataset;
pub mod design;
pub mod error;
pub mod stability;

/// Conventional significance level used throughout agricultural trials.
pub const DEFAULT_ALPHA: f64 = 0.05;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::anova::{
        significance_stars, AnovaResult, AnovaRow, CvQuality, Source, TreatmentMean,
    };
    pub use crate::compare::{assign_letters, group_means, GroupedMean, MeanTest};
    pub use crate::dataset::{Observation, SummaryStats, TrialDataset};
    pub use crate::design::{
        AlphaLattice, ConcurrenceReport, Crd, DesignType, FieldLayout, Generate, LatinSquare, Rcbd,
    };
    pub use crate::error::{Error, Result};
    pub use crate::stability::{
        eberhart_russell, StabilityClass, StabilityEntry, StabilityResult, STABILITY_ALPHA,
    };
    pub use crate::DEFAULT_ALPHA;
}

// Re-export commonly used items at crate root
pub use anova::AnovaResult;
pub use compare::{group_means, MeanTest};
pub use dataset::{Observation, TrialDataset};
pub use design::{DesignType, FieldLayout, Generate};
pub use error::{Error, Result};
pub use stability::eberhart_russell;
