//! Multi-environment stability analysis (Eberhart & Russell).
//!
//! For a trial repeated across sites or seasons, each genotype's mean
//! response is regressed on an *environment index*: how much better or
//! worse each site was than the overall average. The regression slope `b_i`
//! measures responsiveness (`b_i ≈ 1` is average), and the deviation mean
//! square `s²_di` measures how predictably the genotype follows the index.
//!
//! A genotype is classified stable when its slope is not significantly
//! different from 1 *and* its deviations are not significantly different
//! from zero; otherwise it is labeled by the dominant cause of instability.
//!
//! ## Example
//!
//! ```
//! use fieldstat::dataset::{Observation, TrialDataset};
//! use fieldstat::stability::{self, StabilityClass};
//!
//! // Every genotype tracks the environment exactly: all stable.
//! let mut data = TrialDataset::new();
//! for (site, effect) in [("S1", -3.0), ("S2", 0.0), ("S3", 3.0)] {
//!     for genotype in ["G1", "G2"] {
//!         for block in ["R1", "R2"] {
//!             let obs = Observation::with_site(genotype, block, site, 5.0 + effect);
//!             data.push(obs).unwrap();
//!         }
//!     }
//! }
//!
//! let result = stability::eberhart_russell(&data, 0.05).unwrap();
//! for entry in &result.entries {
//!     assert_eq!(entry.classification, StabilityClass::Stable);
//! }
//! ```

use std::collections::HashMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::anova::stats;
use crate::dataset::TrialDataset;
use crate::error::{Error, Result};

/// Conventional significance level for stability classification.
pub const STABILITY_ALPHA: f64 = 0.05;

/// Minimum number of environments for the regression to carry a deviation
/// term (two parameters plus at least one residual degree of freedom).
pub const MIN_SITES: usize = 3;

/// Relative tolerance used for the deviation check when no pooled error is
/// available (unreplicated cells).
const DEVIATION_TOLERANCE: f64 = 1e-8;

/// Stability classification of a genotype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum StabilityClass {
    /// Slope ≈ 1 and negligible deviation from regression.
    Stable,
    /// Slope significantly different from 1 (over- or under-responsive).
    UnstableSlope,
    /// Significant deviation mean square (unpredictable across sites).
    UnstableDeviation,
}

/// Stability parameters for one genotype.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StabilityEntry {
    /// Genotype label.
    pub genotype: String,
    /// Mean response across all sites.
    pub mean: f64,
    /// Regression slope `b_i` on the environment index.
    pub slope: f64,
    /// Standard error of the slope.
    pub slope_se: f64,
    /// Two-tailed p-value for H0: slope = 1.
    pub slope_p: f64,
    /// Deviation mean square `s²_di`.
    pub deviation_ms: f64,
    /// P-value of the deviation F-test against pooled error, when pooled
    /// error is available.
    pub deviation_p: Option<f64>,
    /// Overall classification.
    pub classification: StabilityClass,
}

/// Complete result of a stability analysis.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StabilityResult {
    /// Per-genotype stability parameters, in first-appearance order.
    pub entries: Vec<StabilityEntry>,
    /// Environment index per site (site grand mean − overall grand mean),
    /// in first-appearance order.
    pub environment_index: Vec<(String, f64)>,
    /// Overall grand mean.
    pub grand_mean: f64,
    /// Pooled error mean square from within-cell replication, when present.
    pub pooled_error_ms: Option<f64>,
    /// Significance level used for classification.
    pub alpha: f64,
}

/// Eberhart–Russell stability analysis over a multi-site dataset.
///
/// # Errors
///
/// - `InvalidParameters` for `alpha` outside (0, 1) or observations without
///   a site label.
/// - `InsufficientSites` when fewer than [`MIN_SITES`] sites are present.
/// - `InsufficientData` when a genotype has no observation at some site.
/// - `DegenerateData` when all sites share the same mean (the environment
///   index has zero variance and no slope can be estimated).
pub fn eberhart_russell(data: &TrialDataset, alpha: f64) -> Result<StabilityResult> {
    if !(alpha > 0.0 && alpha < 1.0) {
        return Err(Error::invalid_parameters(format!(
            "significance level {alpha} must lie strictly between 0 and 1"
        )));
    }
    if data.observations().iter().any(|o| o.site.is_none()) {
        return Err(Error::invalid_parameters(
            "stability analysis requires a site label on every observation",
        ));
    }

    let sites = data.sites();
    if sites.len() < MIN_SITES {
        return Err(Error::InsufficientSites {
            found: sites.len(),
            required: MIN_SITES,
        });
    }

    let genotypes = data.treatments();
    let num_sites = sites.len();

    // Cell responses keyed by (genotype, site).
    let mut cells: HashMap<(&str, &str), Vec<f64>> = HashMap::new();
    for obs in data.observations() {
        let site = obs.site.as_deref().expect("checked above");
        cells
            .entry((obs.treatment.as_str(), site))
            .or_default()
            .push(obs.response);
    }

    for &g in &genotypes {
        for &s in &sites {
            if !cells.contains_key(&(g, s)) {
                return Err(Error::insufficient_data(format!(
                    "genotype '{g}' has no observation at site '{s}'"
                )));
            }
        }
    }

    let grand_mean =
        data.observations().iter().map(|o| o.response).sum::<f64>() / data.len() as f64;

    // Site means and environment index.
    let mut site_means: HashMap<&str, f64> = HashMap::new();
    for &s in &sites {
        let (sum, count) = data
            .observations()
            .iter()
            .filter(|o| o.site.as_deref() == Some(s))
            .fold((0.0, 0usize), |(sum, count), o| (sum + o.response, count + 1));
        site_means.insert(s, sum / count as f64);
    }
    let index: Vec<f64> = sites.iter().map(|&s| site_means[s] - grand_mean).collect();

    let index_mean = index.iter().sum::<f64>() / num_sites as f64;
    let index_ss: f64 = index.iter().map(|i| (i - index_mean).powi(2)).sum();
    if index_ss <= 0.0 {
        return Err(Error::degenerate_data(
            "all sites have the same mean; environment index has zero variance",
        ));
    }

    // Pooled error from within-cell replication, on a per-mean basis.
    let mut pooled_ss = 0.0;
    let mut pooled_df = 0usize;
    let mut total_cells = 0usize;
    let mut total_obs = 0usize;
    for responses in cells.values() {
        let n = responses.len();
        let mean = responses.iter().sum::<f64>() / n as f64;
        pooled_ss += responses.iter().map(|y| (y - mean).powi(2)).sum::<f64>();
        pooled_df += n - 1;
        total_cells += 1;
        total_obs += n;
    }
    let mean_reps = total_obs as f64 / total_cells as f64;
    let pooled_error_ms = if pooled_df > 0 {
        Some(pooled_ss / pooled_df as f64)
    } else {
        None
    };

    let deviation_df = num_sites - 2;
    let mut entries = Vec::with_capacity(genotypes.len());

    for &g in &genotypes {
        let cell_means: Vec<f64> = sites
            .iter()
            .map(|&s| {
                let responses = &cells[&(g, s)];
                responses.iter().sum::<f64>() / responses.len() as f64
            })
            .collect();
        let mean = cell_means.iter().sum::<f64>() / num_sites as f64;

        // OLS of cell mean on environment index.
        let slope = sites
            .iter()
            .enumerate()
            .map(|(j, _)| (index[j] - index_mean) * (cell_means[j] - mean))
            .sum::<f64>()
            / index_ss;

        let deviation_ss: f64 = sites
            .iter()
            .enumerate()
            .map(|(j, _)| {
                let fitted = mean + slope * (index[j] - index_mean);
                (cell_means[j] - fitted).powi(2)
            })
            .sum();
        let deviation_ms = deviation_ss / deviation_df as f64;

        let slope_se = (deviation_ms / index_ss).sqrt();
        let slope_p = if slope_se > 0.0 {
            stats::t_p_value((slope - 1.0) / slope_se, deviation_df)
        } else if (slope - 1.0).abs() < 1e-9 {
            1.0
        } else {
            // A perfect linear fit with a slope away from 1 is as
            // significant as it gets.
            0.0
        };

        let deviation_p = match pooled_error_ms {
            Some(pooled_ms) if pooled_ms > 0.0 => Some(stats::f_p_value(
                deviation_ms / (pooled_ms / mean_reps),
                deviation_df,
                pooled_df,
            )),
            _ => None,
        };
        let deviation_significant = match deviation_p {
            Some(p) => p < alpha,
            None => deviation_ms > DEVIATION_TOLERANCE * (1.0 + grand_mean * grand_mean),
        };
        let slope_significant = slope_p < alpha;

        let classification = match (slope_significant, deviation_significant) {
            (false, false) => StabilityClass::Stable,
            (true, false) => StabilityClass::UnstableSlope,
            (false, true) => StabilityClass::UnstableDeviation,
            (true, true) => {
                // Dominant cause: whichever test is further into its tail.
                let dev_p = deviation_p.unwrap_or(0.0);
                if slope_p <= dev_p {
                    StabilityClass::UnstableSlope
                } else {
                    StabilityClass::UnstableDeviation
                }
            }
        };

        entries.push(StabilityEntry {
            genotype: g.to_owned(),
            mean,
            slope,
            slope_se,
            slope_p,
            deviation_ms,
            deviation_p,
            classification,
        });
    }

    Ok(StabilityResult {
        entries,
        environment_index: sites
            .iter()
            .zip(&index)
            .map(|(&s, &i)| (s.to_owned(), i))
            .collect(),
        grand_mean,
        pooled_error_ms,
        alpha,
    })
}
