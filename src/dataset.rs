//! Trial dataset types and validation.
//!
//! A [`TrialDataset`] is an ordered sequence of field observations, each
//! carrying a treatment label, a block (replication) label, a numeric response
//! and, for multi-environment trials, an optional site label.
//!
//! The dataset is the single input to every analysis in the crate. It is a
//! plain in-memory structure: parsing (CSV or otherwise) and persistence are
//! the caller's concern.
//!
//! ## Example
//!
//! ```
//! use fieldstat::dataset::{Observation, TrialDataset};
//!
//! let mut data = TrialDataset::new();
//! for (trt, block, y) in [("A", "R1", 4.2), ("B", "R1", 5.1), ("A", "R2", 4.4), ("B", "R2", 5.3)] {
//!     data.push(Observation::new(trt, block, y)).unwrap();
//! }
//!
//! let info = data.design_info();
//! assert_eq!(info.num_treatments, 2);
//! assert_eq!(info.num_reps, 2);
//! assert!(info.is_balanced);
//! ```

use std::collections::{HashMap, HashSet};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A single field-plot observation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Observation {
    /// Treatment (genotype/variety) label.
    pub treatment: String,
    /// Block or replication label.
    pub block: String,
    /// Site (environment) label for multi-environment trials.
    pub site: Option<String>,
    /// Measured response (e.g. yield).
    pub response: f64,
}

impl Observation {
    /// Create a single-site observation.
    #[must_use]
    pub fn new(treatment: impl Into<String>, block: impl Into<String>, response: f64) -> Self {
        Self {
            treatment: treatment.into(),
            block: block.into(),
            site: None,
            response,
        }
    }

    /// Create a multi-environment observation with a site label.
    #[must_use]
    pub fn with_site(
        treatment: impl Into<String>,
        block: impl Into<String>,
        site: impl Into<String>,
        response: f64,
    ) -> Self {
        Self {
            treatment: treatment.into(),
            block: block.into(),
            site: Some(site.into()),
            response,
        }
    }
}

/// Structural description of the design carried by a dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DesignInfo {
    /// Number of distinct treatments.
    pub num_treatments: usize,
    /// Number of distinct blocks (replications).
    pub num_reps: usize,
    /// Number of observations actually present.
    pub total_plots: usize,
    /// `num_treatments * num_reps`, the plot count of a complete design.
    pub expected_plots: usize,
    /// Whether every treatment appears in every block exactly once.
    pub is_balanced: bool,
}

/// Summary statistics for a set of responses.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SummaryStats {
    /// Number of observations.
    pub n: usize,
    /// Arithmetic mean.
    pub mean: f64,
    /// Sample standard deviation (0 when n < 2).
    pub std_dev: f64,
    /// Standard error of the mean.
    pub se: f64,
    /// Minimum response.
    pub min: f64,
    /// Maximum response.
    pub max: f64,
}

/// An ordered collection of trial observations.
///
/// Observations are stored in insertion order; label accessors preserve
/// first-appearance order so downstream tables read the way the data was
/// entered.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TrialDataset {
    observations: Vec<Observation>,
}

impl TrialDataset {
    /// Create an empty dataset.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a dataset from an iterator of observations.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameters` if any response is non-finite.
    pub fn from_records(records: impl IntoIterator<Item = Observation>) -> Result<Self> {
        let mut data = Self::new();
        for obs in records {
            data.push(obs)?;
        }
        Ok(data)
    }

    /// Append an observation.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameters` if the response is NaN or infinite, or if
    /// a treatment or block label is empty.
    pub fn push(&mut self, obs: Observation) -> Result<()> {
        if !obs.response.is_finite() {
            return Err(Error::invalid_parameters(format!(
                "response for treatment '{}' in block '{}' is not finite",
                obs.treatment, obs.block
            )));
        }
        if obs.treatment.is_empty() || obs.block.is_empty() {
            return Err(Error::invalid_parameters(
                "treatment and block labels must be non-empty",
            ));
        }
        self.observations.push(obs);
        Ok(())
    }

    /// Number of observations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Whether the dataset is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// All observations, in insertion order.
    #[must_use]
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// Distinct treatment labels in first-appearance order.
    #[must_use]
    pub fn treatments(&self) -> Vec<&str> {
        unique_in_order(self.observations.iter().map(|o| o.treatment.as_str()))
    }

    /// Distinct block labels in first-appearance order.
    #[must_use]
    pub fn blocks(&self) -> Vec<&str> {
        unique_in_order(self.observations.iter().map(|o| o.block.as_str()))
    }

    /// Distinct site labels in first-appearance order.
    ///
    /// Observations without a site label are ignored.
    #[must_use]
    pub fn sites(&self) -> Vec<&str> {
        unique_in_order(
            self.observations
                .iter()
                .filter_map(|o| o.site.as_deref()),
        )
    }

    /// Structural design information derived from the labels present.
    #[must_use]
    pub fn design_info(&self) -> DesignInfo {
        let num_treatments = self.treatments().len();
        let num_reps = self.blocks().len();
        let total_plots = self.len();
        let expected_plots = num_treatments * num_reps;

        DesignInfo {
            num_treatments,
            num_reps,
            total_plots,
            expected_plots,
            is_balanced: total_plots == expected_plots && self.check_complete_blocks().is_ok(),
        }
    }

    /// Verify that every treatment appears in every block exactly once
    /// (within each site, for multi-environment data).
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameters` for a duplicated `(treatment, block)` plot
    /// and `InsufficientData` for a missing one.
    pub fn check_complete_blocks(&self) -> Result<()> {
        // Cell counts keyed by (site, treatment, block).
        let mut cells: HashMap<(Option<&str>, &str, &str), usize> = HashMap::new();
        for obs in &self.observations {
            *cells
                .entry((obs.site.as_deref(), obs.treatment.as_str(), obs.block.as_str()))
                .or_insert(0) += 1;
        }

        for ((site, treatment, block), count) in &cells {
            if *count > 1 {
                let place = match site {
                    Some(s) => format!(" at site '{s}'"),
                    None => String::new(),
                };
                return Err(Error::invalid_parameters(format!(
                    "duplicate plot: treatment '{treatment}' appears {count} times in block '{block}'{place}"
                )));
            }
        }

        let sites: Vec<Option<&str>> = if self.sites().is_empty() {
            vec![None]
        } else {
            self.sites().into_iter().map(Some).collect()
        };

        for site in sites {
            for treatment in self.treatments() {
                for block in self.blocks() {
                    if !cells.contains_key(&(site, treatment, block)) {
                        return Err(Error::insufficient_data(format!(
                            "treatment '{treatment}' has no observation in block '{block}'"
                        )));
                    }
                }
            }
        }

        Ok(())
    }

    /// Summary statistics over all responses.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientData` if the dataset is empty.
    pub fn summary(&self) -> Result<SummaryStats> {
        summarize(self.observations.iter().map(|o| o.response))
    }

    /// Summary statistics per treatment, in first-appearance order.
    #[must_use]
    pub fn summary_by_treatment(&self) -> Vec<(String, SummaryStats)> {
        self.treatments()
            .into_iter()
            .map(|trt| {
                let stats = summarize(
                    self.observations
                        .iter()
                        .filter(|o| o.treatment == trt)
                        .map(|o| o.response),
                )
                .expect("treatment label implies at least one observation");
                (trt.to_owned(), stats)
            })
            .collect()
    }
}

fn unique_in_order<'a>(labels: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for label in labels {
        if seen.insert(label) {
            out.push(label);
        }
    }
    out
}

fn summarize(responses: impl Iterator<Item = f64>) -> Result<SummaryStats> {
    let values: Vec<f64> = responses.collect();
    let n = values.len();
    if n == 0 {
        return Err(Error::insufficient_data("no observations to summarize"));
    }

    let mean = values.iter().sum::<f64>() / n as f64;
    let std_dev = if n > 1 {
        let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
        (ss / (n - 1) as f64).sqrt()
    } else {
        0.0
    };
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    Ok(SummaryStats {
        n,
        mean,
        std_dev,
        se: std_dev / (n as f64).sqrt(),
        min,
        max,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn balanced_2x2() -> TrialDataset {
        TrialDataset::from_records([
            Observation::new("A", "R1", 4.0),
            Observation::new("B", "R1", 6.0),
            Observation::new("A", "R2", 5.0),
            Observation::new("B", "R2", 7.0),
        ])
        .unwrap()
    }

    #[test]
    fn test_labels_in_first_appearance_order() {
        let data = balanced_2x2();
        assert_eq!(data.treatments(), vec!["A", "B"]);
        assert_eq!(data.blocks(), vec!["R1", "R2"]);
        assert!(data.sites().is_empty());
    }

    #[test]
    fn test_design_info_balanced() {
        let info = balanced_2x2().design_info();
        assert_eq!(info.num_treatments, 2);
        assert_eq!(info.num_reps, 2);
        assert_eq!(info.total_plots, 4);
        assert_eq!(info.expected_plots, 4);
        assert!(info.is_balanced);
    }

    #[test]
    fn test_design_info_unbalanced() {
        let mut data = balanced_2x2();
        data.push(Observation::new("C", "R1", 1.0)).unwrap();
        let info = data.design_info();
        assert_eq!(info.num_treatments, 3);
        assert!(!info.is_balanced);
    }

    #[test]
    fn test_rejects_non_finite_response() {
        let mut data = TrialDataset::new();
        let err = data.push(Observation::new("A", "R1", f64::NAN)).unwrap_err();
        assert!(matches!(err, Error::InvalidParameters { .. }));
    }

    #[test]
    fn test_duplicate_plot_detected() {
        let mut data = balanced_2x2();
        data.push(Observation::new("A", "R1", 4.1)).unwrap();
        let err = data.check_complete_blocks().unwrap_err();
        assert!(matches!(err, Error::InvalidParameters { .. }));
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_missing_plot_detected() {
        let data = TrialDataset::from_records([
            Observation::new("A", "R1", 4.0),
            Observation::new("B", "R1", 6.0),
            Observation::new("A", "R2", 5.0),
        ])
        .unwrap();
        let err = data.check_complete_blocks().unwrap_err();
        assert!(matches!(err, Error::InsufficientData { .. }));
    }

    #[test]
    fn test_summary_stats() {
        let data = balanced_2x2();
        let stats = data.summary().unwrap();
        assert_eq!(stats.n, 4);
        assert!((stats.mean - 5.5).abs() < 1e-12);
        assert!((stats.min - 4.0).abs() < 1e-12);
        assert!((stats.max - 7.0).abs() < 1e-12);

        let by_trt = data.summary_by_treatment();
        assert_eq!(by_trt.len(), 2);
        assert!((by_trt[0].1.mean - 4.5).abs() < 1e-12);
        assert!((by_trt[1].1.mean - 6.5).abs() < 1e-12);
    }

    #[test]
    fn test_empty_summary_fails() {
        let err = TrialDataset::new().summary().unwrap_err();
        assert!(matches!(err, Error::InsufficientData { .. }));
    }

    #[test]
    fn test_sites() {
        let data = TrialDataset::from_records([
            Observation::with_site("A", "R1", "Khon Kaen", 4.0),
            Observation::with_site("A", "R1", "Ubon", 5.0),
        ])
        .unwrap();
        assert_eq!(data.sites(), vec!["Khon Kaen", "Ubon"]);
    }
}
