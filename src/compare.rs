//! Post-hoc mean comparison with letter grouping.
//!
//! After a significant ANOVA, treatment means are partitioned into
//! significance groups: two treatments share a letter exactly when their
//! means are *not* significantly different under the chosen test.
//!
//! ## Tests
//!
//! | Test | Critical difference |
//! |------|--------------------|
//! | [`MeanTest::Lsd`] | t(α/2 per tail, df) · √(2·MS/r) |
//! | [`MeanTest::TukeyHsd`] | q(α; k, df) · √(MS/r) |
//! | [`MeanTest::Duncan`] | q_D(α; p, df) · √(MS/r), p = rank span |
//!
//! ## Letter assignment
//!
//! The standard overlapping-letter procedure: sort means descending, find
//! every maximal run of mutually non-significant means, drop runs contained
//! in a longer one, and give each surviving run a letter in order. A mean
//! covered by several runs carries several letters. Dropping contained runs
//! is what keeps the letter count per mean minimal.
//!
//! ## Example
//!
//! ```
//! use fieldstat::anova;
//! use fieldstat::compare::{group_means, MeanTest};
//! use fieldstat::dataset::{Observation, TrialDataset};
//!
//! let mut data = TrialDataset::new();
//! let noise = [0.4, -0.4, 0.6, -0.6];
//! for (t, (trt, mean)) in [("A", 52.0), ("B", 44.0), ("C", 36.0)].into_iter().enumerate() {
//!     for i in 0..4 {
//!         let resp = mean + noise[(i + t) % 4];
//!         data.push(Observation::new(trt, format!("R{}", i + 1), resp)).unwrap();
//!     }
//! }
//!
//! let result = anova::rcbd(&data, 0.05).unwrap();
//! let groups = group_means(&result, MeanTest::Lsd).unwrap();
//! assert_eq!(groups[0].letters, "a");
//! assert_eq!(groups[2].letters, "c");
//! ```

use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::anova::{stats, AnovaResult};
use crate::error::{Error, Result};

/// The mean-separation test to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MeanTest {
    /// Fisher's least significant difference.
    Lsd,
    /// Tukey's honestly significant difference.
    TukeyHsd,
    /// Duncan's multiple range test.
    Duncan,
}

impl FromStr for MeanTest {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "lsd" => Ok(Self::Lsd),
            "tukey" | "tukey-hsd" | "hsd" => Ok(Self::TukeyHsd),
            "duncan" | "dmrt" => Ok(Self::Duncan),
            _ => Err(Error::unknown_test(s)),
        }
    }
}

/// A treatment mean with its significance-group letters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GroupedMean {
    /// Treatment label.
    pub treatment: String,
    /// Mean response.
    pub mean: f64,
    /// Number of observations behind the mean.
    pub n: usize,
    /// Significance-group letters, e.g. `"a"`, `"ab"`.
    pub letters: String,
}

/// Assign significance-group letters to the treatment means of an ANOVA.
///
/// Returns the means in descending order with their letters.
///
/// # Errors
///
/// Returns `InsufficientData` if the result carries no residual degrees of
/// freedom (never produced by this crate's ANOVA functions, but possible for
/// deserialized results).
pub fn group_means(result: &AnovaResult, test: MeanTest) -> Result<Vec<GroupedMean>> {
    if result.residual_df == 0 {
        return Err(Error::insufficient_data(
            "no residual degrees of freedom for mean comparison",
        ));
    }

    let mut means: Vec<(&str, f64, usize)> = result
        .treatment_means
        .iter()
        .map(|tm| (tm.treatment.as_str(), tm.mean, tm.n))
        .collect();
    means.sort_by(|a, b| b.1.partial_cmp(&a.1).expect("responses are finite"));

    let k = means.len();
    let df = result.residual_df;
    let alpha = result.alpha;
    // se_diff already folds in the (effective) replication, so the
    // studentized-range thresholds use se_diff / sqrt(2) = sqrt(MS/r).
    let se_mean = result.se_diff / std::f64::consts::SQRT_2;

    let values: Vec<f64> = means.iter().map(|&(_, m, _)| m).collect();
    let threshold: Box<dyn Fn(usize, usize) -> f64> = match test {
        MeanTest::Lsd => {
            let lsd = stats::t_critical(alpha, df) * result.se_diff;
            Box::new(move |_, _| lsd)
        }
        MeanTest::TukeyHsd => {
            let hsd = stats::studentized_range_critical(alpha, k, df) * se_mean;
            Box::new(move |_, _| hsd)
        }
        MeanTest::Duncan => {
            // Critical difference widens with the rank span between the pair.
            Box::new(move |i, j| stats::duncan_critical(alpha, j - i + 1, df) * se_mean)
        }
    };

    let differ = move |i: usize, j: usize| (values[i] - values[j]).abs() > threshold(i, j);
    let letters = assign_letters(k, &differ);

    Ok(means
        .into_iter()
        .zip(letters)
        .map(|((treatment, mean, n), letters)| GroupedMean {
            treatment: treatment.to_owned(),
            mean,
            n,
            letters,
        })
        .collect())
}

/// Overlapping-letter assignment over `count` means sorted descending.
///
/// `differ(i, j)` (for `i < j`) reports whether the means at ranks `i` and
/// `j` are significantly different. The function is pure: all grouping state
/// lives within the call.
#[must_use]
pub fn assign_letters(count: usize, differ: &dyn Fn(usize, usize) -> bool) -> Vec<String> {
    if count == 0 {
        return Vec::new();
    }

    // Maximal run of non-significance starting at each rank.
    let mut runs: Vec<(usize, usize)> = Vec::with_capacity(count);
    for i in 0..count {
        let mut end = i;
        for j in (i + 1)..count {
            if !differ(i, j) {
                end = j;
            }
        }
        runs.push((i, end));
    }

    // Drop runs contained in an earlier (necessarily longer) run.
    let mut surviving: Vec<(usize, usize)> = Vec::new();
    for &(start, end) in &runs {
        if !surviving.iter().any(|&(s, e)| s <= start && end <= e) {
            surviving.push((start, end));
        }
    }

    let mut letters = vec![String::new(); count];
    for (group, &(start, end)) in surviving.iter().enumerate() {
        let letter = group_letter(group);
        for slot in letters.iter_mut().take(end + 1).skip(start) {
            slot.push_str(&letter);
        }
    }
    letters
}

/// Letter for the nth group: a..z, then aa, ab, ...
fn group_letter(group: usize) -> String {
    const ALPHABET: usize = 26;
    if group < ALPHABET {
        char::from(b'a' + group as u8).to_string()
    } else {
        let first = (group / ALPHABET - 1) % ALPHABET;
        let second = group % ALPHABET;
        format!(
            "{}{}",
            char::from(b'a' + first as u8),
            char::from(b'a' + second as u8)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anova;
    use crate::dataset::{Observation, TrialDataset};

    /// 8 treatments × 4 blocks, means 50 down to 36 in steps of 2, residual
    /// mean square exactly 1.0 (residuals form a rank-one pattern orthogonal
    /// to treatments and blocks).
    fn graded_rcbd() -> TrialDataset {
        let means = [50.0, 48.0, 46.0, 44.0, 42.0, 40.0, 38.0, 36.0];
        let u = [1.0, -1.0, 1.0, -1.0, 1.0, -1.0, 1.0, -1.0];
        let b = (5.0_f64).sqrt() / 4.0;
        let v = [1.0, -1.0, b, -b];
        let mut data = TrialDataset::new();
        for (i, &mean) in means.iter().enumerate() {
            for (j, &vj) in v.iter().enumerate() {
                data.push(Observation::new(
                    format!("T{}", i + 1),
                    format!("R{}", j + 1),
                    mean + u[i] * vj,
                ))
                .unwrap();
            }
        }
        data
    }

    #[test]
    fn test_mean_test_from_str() {
        assert_eq!(MeanTest::from_str("lsd").unwrap(), MeanTest::Lsd);
        assert_eq!(MeanTest::from_str("Tukey").unwrap(), MeanTest::TukeyHsd);
        assert_eq!(MeanTest::from_str("DMRT").unwrap(), MeanTest::Duncan);

        let err = MeanTest::from_str("scheffe").unwrap_err();
        assert!(matches!(err, Error::UnknownTest { .. }));
    }

    #[test]
    fn test_graded_means_fully_separated() {
        let result = anova::rcbd(&graded_rcbd(), 0.05).unwrap();

        // Adjacent means differ by 2.0 and the LSD is about 1.47, so every
        // treatment lands in its own group under LSD.
        let groups = group_means(&result, MeanTest::Lsd).unwrap();
        let expected = ["a", "b", "c", "d", "e", "f", "g", "h"];
        for (g, want) in groups.iter().zip(expected) {
            assert_eq!(g.letters, want, "treatment {}", g.treatment);
        }
        // Sorted descending.
        assert_eq!(groups[0].treatment, "T1");
        assert!((groups[0].mean - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_duncan_and_tukey_run_on_graded_data() {
        let result = anova::rcbd(&graded_rcbd(), 0.05).unwrap();

        // Duncan: adjacent critical difference q_D(2, 21) * sqrt(1/4) ~ 1.47,
        // still below the 2.0 spacing.
        let duncan = group_means(&result, MeanTest::Duncan).unwrap();
        assert!(duncan.iter().all(|g| g.letters.len() == 1));

        // Tukey is the most conservative: q(8, 21) * 0.5 ~ 2.36 exceeds the
        // spacing, so adjacent means now share letters.
        let tukey = group_means(&result, MeanTest::TukeyHsd).unwrap();
        assert!(tukey.iter().all(|g| !g.letters.is_empty()));
        assert!(tukey.iter().any(|g| g.letters.len() > 1));
    }

    #[test]
    fn test_letter_sharing_is_symmetric_and_total() {
        let result = anova::rcbd(&graded_rcbd(), 0.05).unwrap();
        for test in [MeanTest::Lsd, MeanTest::TukeyHsd, MeanTest::Duncan] {
            let groups = group_means(&result, test).unwrap();
            for g in &groups {
                assert!(!g.letters.is_empty(), "unlabeled mean under {test:?}");
            }
            // Sharing is symmetric by construction of the letter strings;
            // verify anyway on every pair.
            for a in &groups {
                for b in &groups {
                    let shared_ab = a.letters.chars().any(|c| b.letters.contains(c));
                    let shared_ba = b.letters.chars().any(|c| a.letters.contains(c));
                    assert_eq!(shared_ab, shared_ba);
                }
            }
        }
    }

    #[test]
    fn test_overlapping_groups() {
        // Three ranks; adjacent pairs not significant, outer pair significant.
        let differ = |i: usize, j: usize| j - i >= 2;
        let letters = assign_letters(3, &differ);
        assert_eq!(letters, vec!["a", "ab", "b"]);
    }

    #[test]
    fn test_all_equal_single_group() {
        let differ = |_: usize, _: usize| false;
        let letters = assign_letters(4, &differ);
        assert!(letters.iter().all(|l| l == "a"));
    }

    #[test]
    fn test_all_distinct_groups() {
        let differ = |_: usize, _: usize| true;
        let letters = assign_letters(3, &differ);
        assert_eq!(letters, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_assign_letters_empty() {
        let differ = |_: usize, _: usize| true;
        assert!(assign_letters(0, &differ).is_empty());
    }

    #[test]
    fn test_group_letter_wraps_past_z() {
        assert_eq!(group_letter(0), "a");
        assert_eq!(group_letter(25), "z");
        assert_eq!(group_letter(26), "aa");
        assert_eq!(group_letter(27), "ab");
    }
}
