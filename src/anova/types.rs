//! ANOVA result types.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// CV below this is rated excellent (%).
pub const CV_EXCELLENT: f64 = 10.0;
/// CV below this (and at least [`CV_EXCELLENT`]) is rated good (%).
pub const CV_GOOD: f64 = 15.0;
/// CV below this (and at least [`CV_GOOD`]) is rated acceptable (%); anything
/// higher is rated poor.
pub const CV_ACCEPTABLE: f64 = 20.0;

/// A source of variation in the decomposition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Source {
    /// Treatment (genotype/variety) effect.
    Treatment,
    /// Block (replication) effect.
    Block,
    /// Residual (experimental error).
    Residual,
    /// Total variation.
    Total,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Treatment => "Treatment",
            Self::Block => "Block",
            Self::Residual => "Residual",
            Self::Total => "Total",
        };
        write!(f, "{name}")
    }
}

/// One row of the ANOVA decomposition table.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AnovaRow {
    /// The source of variation.
    pub source: Source,
    /// Degrees of freedom.
    pub df: usize,
    /// Sum of squares.
    pub sum_sq: f64,
    /// Mean square (SS / df).
    pub mean_sq: f64,
    /// F-statistic; only the treatment row carries one.
    pub f_value: Option<f64>,
    /// Upper-tail p-value; only the treatment row carries one.
    pub p_value: Option<f64>,
}

/// Per-treatment mean summary.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TreatmentMean {
    /// Treatment label.
    pub treatment: String,
    /// Mean response.
    pub mean: f64,
    /// Sample standard deviation across replications (0 when n < 2).
    pub std_dev: f64,
    /// Number of observations.
    pub n: usize,
    /// Standard error of the mean.
    pub se: f64,
}

/// Complete result of an analysis of variance.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AnovaResult {
    /// Decomposition table rows (treatment, block where present, residual, total).
    pub rows: Vec<AnovaRow>,
    /// Per-treatment means in first-appearance order.
    pub treatment_means: Vec<TreatmentMean>,
    /// Grand mean of all responses.
    pub grand_mean: f64,
    /// Coefficient of variation, percent.
    pub cv: f64,
    /// Residual mean square (experimental error variance).
    pub residual_ms: f64,
    /// Residual degrees of freedom.
    pub residual_df: usize,
    /// Treatment F-statistic.
    pub f_treatment: f64,
    /// Treatment p-value.
    pub p_treatment: f64,
    /// Whether the treatment effect is significant at `alpha`.
    pub is_significant: bool,
    /// Significance level the analysis was run at.
    pub alpha: f64,
    /// Standard error of a difference between two treatment means.
    pub se_diff: f64,
    /// Least significant difference at `alpha`.
    pub lsd: f64,
    /// Number of treatments.
    pub num_treatments: usize,
    /// Number of replications.
    pub num_reps: usize,
}

impl AnovaResult {
    /// Look up a decomposition row by source.
    #[must_use]
    pub fn row(&self, source: Source) -> Option<&AnovaRow> {
        self.rows.iter().find(|r| r.source == source)
    }

    /// Quality rating of the experiment's precision from its CV.
    #[must_use]
    pub fn cv_quality(&self) -> CvQuality {
        CvQuality::classify(self.cv)
    }
}

/// Conventional quality bands for the coefficient of variation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CvQuality {
    /// CV < 10%.
    Excellent,
    /// 10% ≤ CV < 15%.
    Good,
    /// 15% ≤ CV < 20%.
    Acceptable,
    /// CV ≥ 20%.
    Poor,
}

impl CvQuality {
    /// Classify a CV percentage into its quality band.
    #[must_use]
    pub fn classify(cv: f64) -> Self {
        if cv < CV_EXCELLENT {
            Self::Excellent
        } else if cv < CV_GOOD {
            Self::Good
        } else if cv < CV_ACCEPTABLE {
            Self::Acceptable
        } else {
            Self::Poor
        }
    }
}

impl fmt::Display for CvQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Acceptable => "acceptable",
            Self::Poor => "poor",
        };
        write!(f, "{name}")
    }
}

/// Conventional significance stars for a p-value.
///
/// `***` below 0.001, `**` below 0.01, `*` below 0.05, `ns` otherwise.
#[must_use]
pub fn significance_stars(p_value: f64) -> &'static str {
    if p_value < 0.001 {
        "***"
    } else if p_value < 0.01 {
        "**"
    } else if p_value < 0.05 {
        "*"
    } else {
        "ns"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cv_quality_bands() {
        assert_eq!(CvQuality::classify(4.2), CvQuality::Excellent);
        assert_eq!(CvQuality::classify(10.0), CvQuality::Good);
        assert_eq!(CvQuality::classify(15.0), CvQuality::Acceptable);
        assert_eq!(CvQuality::classify(20.0), CvQuality::Poor);
        assert_eq!(CvQuality::classify(35.0), CvQuality::Poor);
    }

    #[test]
    fn test_significance_stars() {
        assert_eq!(significance_stars(0.0005), "***");
        assert_eq!(significance_stars(0.005), "**");
        assert_eq!(significance_stars(0.03), "*");
        assert_eq!(significance_stars(0.2), "ns");
    }

    #[test]
    fn test_source_display() {
        assert_eq!(Source::Treatment.to_string(), "Treatment");
        assert_eq!(Source::Residual.to_string(), "Residual");
    }
}
