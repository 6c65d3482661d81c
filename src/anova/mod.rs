//! Analysis of variance for field-trial designs.
//!
//! Two model shapes cover the classical designs:
//!
//! - [`rcbd`]: the two-way additive model
//!   `response = grand mean + treatment + block + residual` with one
//!   observation per (treatment, block) cell. This is the analysis for RCBD
//!   data and for Latin-square data analyzed on its recorded blocking factor.
//! - [`crd`]: the one-way model `response = grand mean + treatment + residual`
//!   with no blocking term.
//!
//! Sums of squares use the method-of-moments formulas: treatment SS from
//! treatment-mean deviations weighted by replication, block SS analogously,
//! total SS from grand-mean deviations, residual SS by subtraction.
//!
//! ## Example
//!
//! ```
//! use fieldstat::anova;
//! use fieldstat::dataset::{Observation, TrialDataset};
//!
//! let mut data = TrialDataset::new();
//! let noise = [0.3, -0.1, -0.4, 0.2];
//! for (t, (trt, mean)) in [("A", 50.0), ("B", 44.0), ("C", 38.0)].into_iter().enumerate() {
//!     for i in 0..4 {
//!         let obs = Observation::new(trt, format!("R{}", i + 1), mean + noise[(i + t) % 4]);
//!         data.push(obs).unwrap();
//!     }
//! }
//!
//! let result = anova::rcbd(&data, 0.05).unwrap();
//! assert!(result.is_significant);
//! assert!(result.cv < 5.0);
//! ```

pub mod stats;
mod types;

pub use types::{
    significance_stars, AnovaResult, AnovaRow, CvQuality, Source, TreatmentMean, CV_ACCEPTABLE,
    CV_EXCELLENT, CV_GOOD,
};

use std::collections::HashMap;

use crate::dataset::TrialDataset;
use crate::error::{Error, Result};

/// Two-way ANOVA for a randomized complete block design.
///
/// Requires a balanced dataset: every treatment observed exactly once in
/// every block.
///
/// # Errors
///
/// - `InvalidParameters` for `alpha` outside (0, 1) or duplicated plots.
/// - `InsufficientData` for an empty dataset, a missing (treatment, block)
///   cell, fewer than two treatments or blocks, or residual df ≤ 0.
/// - `DegenerateData` when the grand mean or the residual mean square is
///   zero, leaving CV or F undefined.
pub fn rcbd(data: &TrialDataset, alpha: f64) -> Result<AnovaResult> {
    check_alpha(alpha)?;
    if data.is_empty() {
        return Err(Error::insufficient_data("dataset is empty"));
    }
    data.check_complete_blocks()?;

    let treatments = data.treatments();
    let blocks = data.blocks();
    let t = treatments.len();
    let r = blocks.len();

    if t < 2 {
        return Err(Error::insufficient_data(
            "at least two treatments are required",
        ));
    }
    if r < 2 {
        return Err(Error::insufficient_data(
            "unreplicated design: a single block leaves no residual degrees of freedom",
        ));
    }

    let n = data.len();
    let grand_mean = data.observations().iter().map(|o| o.response).sum::<f64>() / n as f64;

    let treatment_df = t - 1;
    let block_df = r - 1;
    let total_df = n - 1;
    let residual_df = treatment_df * block_df;

    let mut treatment_sums: HashMap<&str, f64> = HashMap::new();
    let mut block_sums: HashMap<&str, f64> = HashMap::new();
    let mut total_ss = 0.0;
    for obs in data.observations() {
        *treatment_sums.entry(obs.treatment.as_str()).or_insert(0.0) += obs.response;
        *block_sums.entry(obs.block.as_str()).or_insert(0.0) += obs.response;
        total_ss += (obs.response - grand_mean).powi(2);
    }

    let treatment_ss: f64 = treatments
        .iter()
        .map(|trt| {
            let mean = treatment_sums[trt] / r as f64;
            r as f64 * (mean - grand_mean).powi(2)
        })
        .sum();
    let block_ss: f64 = blocks
        .iter()
        .map(|blk| {
            let mean = block_sums[blk] / t as f64;
            t as f64 * (mean - grand_mean).powi(2)
        })
        .sum();
    let residual_ss = (total_ss - treatment_ss - block_ss).max(0.0);

    let rows = vec![
        (Source::Treatment, treatment_df, treatment_ss),
        (Source::Block, block_df, block_ss),
        (Source::Residual, residual_df, residual_ss),
        (Source::Total, total_df, total_ss),
    ];

    finish(data, rows, grand_mean, residual_ss, residual_df, r, alpha)
}

/// One-way ANOVA for a completely randomized design.
///
/// Block labels in the dataset are ignored; the dataset may be unbalanced
/// (unequal replication per treatment).
///
/// # Errors
///
/// - `InvalidParameters` for `alpha` outside (0, 1).
/// - `InsufficientData` for an empty dataset, fewer than two treatments, or
///   residual df ≤ 0 (no treatment replicated).
/// - `DegenerateData` when the grand mean or the residual mean square is
///   zero, leaving CV or F undefined.
pub fn crd(data: &TrialDataset, alpha: f64) -> Result<AnovaResult> {
    check_alpha(alpha)?;
    if data.is_empty() {
        return Err(Error::insufficient_data("dataset is empty"));
    }

    let treatments = data.treatments();
    let t = treatments.len();
    if t < 2 {
        return Err(Error::insufficient_data(
            "at least two treatments are required",
        ));
    }

    let n = data.len();
    let treatment_df = t - 1;
    let total_df = n - 1;
    if total_df <= treatment_df {
        return Err(Error::insufficient_data(
            "unreplicated design: no residual degrees of freedom",
        ));
    }
    let residual_df = total_df - treatment_df;

    let grand_mean = data.observations().iter().map(|o| o.response).sum::<f64>() / n as f64;

    let mut sums: HashMap<&str, (f64, usize)> = HashMap::new();
    let mut total_ss = 0.0;
    for obs in data.observations() {
        let entry = sums.entry(obs.treatment.as_str()).or_insert((0.0, 0));
        entry.0 += obs.response;
        entry.1 += 1;
        total_ss += (obs.response - grand_mean).powi(2);
    }

    let treatment_ss: f64 = treatments
        .iter()
        .map(|trt| {
            let (sum, count) = sums[trt];
            let mean = sum / count as f64;
            count as f64 * (mean - grand_mean).powi(2)
        })
        .sum();
    let residual_ss = (total_ss - treatment_ss).max(0.0);

    // Effective replication for the LSD: harmonic mean of per-treatment
    // counts, which reduces to the common count for balanced data.
    let harmonic_r = t as f64 / treatments.iter().map(|trt| 1.0 / sums[trt].1 as f64).sum::<f64>();

    let rows = vec![
        (Source::Treatment, treatment_df, treatment_ss),
        (Source::Residual, residual_df, residual_ss),
        (Source::Total, total_df, total_ss),
    ];

    finish_with_reps(
        data,
        rows,
        grand_mean,
        residual_ss,
        residual_df,
        harmonic_r,
        treatments.iter().map(|trt| sums[trt].1).min().unwrap_or(0),
        alpha,
    )
}

fn check_alpha(alpha: f64) -> Result<()> {
    if !(alpha > 0.0 && alpha < 1.0) {
        return Err(Error::invalid_parameters(format!(
            "significance level {alpha} must lie strictly between 0 and 1"
        )));
    }
    Ok(())
}

fn finish(
    data: &TrialDataset,
    rows: Vec<(Source, usize, f64)>,
    grand_mean: f64,
    residual_ss: f64,
    residual_df: usize,
    reps: usize,
    alpha: f64,
) -> Result<AnovaResult> {
    finish_with_reps(
        data,
        rows,
        grand_mean,
        residual_ss,
        residual_df,
        reps as f64,
        reps,
        alpha,
    )
}

#[allow(clippy::too_many_arguments)]
fn finish_with_reps(
    data: &TrialDataset,
    rows: Vec<(Source, usize, f64)>,
    grand_mean: f64,
    residual_ss: f64,
    residual_df: usize,
    effective_reps: f64,
    num_reps: usize,
    alpha: f64,
) -> Result<AnovaResult> {
    if residual_df == 0 {
        return Err(Error::insufficient_data(
            "unreplicated design: no residual degrees of freedom",
        ));
    }

    let residual_ms = residual_ss / residual_df as f64;
    if residual_ms <= 0.0 {
        return Err(Error::degenerate_data(
            "residual mean square is zero; F-statistic is undefined",
        ));
    }
    if grand_mean.abs() < f64::EPSILON {
        return Err(Error::degenerate_data(
            "grand mean is zero; coefficient of variation is undefined",
        ));
    }

    let (treatment_df, treatment_ss) = rows
        .iter()
        .find(|(s, _, _)| *s == Source::Treatment)
        .map(|&(_, df, ss)| (df, ss))
        .expect("treatment row is always present");

    let treatment_ms = treatment_ss / treatment_df as f64;
    let f_treatment = treatment_ms / residual_ms;
    let p_treatment = stats::f_p_value(f_treatment, treatment_df, residual_df);

    let cv = 100.0 * residual_ms.sqrt() / grand_mean.abs();
    let se_diff = (2.0 * residual_ms / effective_reps).sqrt();
    let lsd = stats::t_critical(alpha, residual_df) * se_diff;

    let table = rows
        .into_iter()
        .map(|(source, df, sum_sq)| {
            let mean_sq = if df > 0 { sum_sq / df as f64 } else { 0.0 };
            let (f_value, p_value) = if source == Source::Treatment {
                (Some(f_treatment), Some(p_treatment))
            } else {
                (None, None)
            };
            AnovaRow {
                source,
                df,
                sum_sq,
                mean_sq,
                f_value,
                p_value,
            }
        })
        .collect();

    let treatment_means = data
        .summary_by_treatment()
        .into_iter()
        .map(|(treatment, s)| TreatmentMean {
            treatment,
            mean: s.mean,
            std_dev: s.std_dev,
            n: s.n,
            se: s.se,
        })
        .collect();

    Ok(AnovaResult {
        rows: table,
        treatment_means,
        grand_mean,
        cv,
        residual_ms,
        residual_df,
        f_treatment,
        p_treatment,
        is_significant: p_treatment < alpha,
        alpha,
        se_diff,
        lsd,
        num_treatments: treatment_df + 1,
        num_reps,
    })
}
