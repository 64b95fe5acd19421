//! Pattern Quality Score (PQS).
//!
//! `0.4 * outlier_strength + 0.3 * internal_coherence + 0.4 * human_guessability
//! - 0.5 * obscurity_penalty`
//!
//! The scale is roughly 0 to 4. The weights are fixed, they define what a good puzzle is.

use crate::{
    features::FeatureTable,
    patterns::CandidatePattern,
    stats::{mean, std},
    types::{letters, RARE},
};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

const OUTLIER_WEIGHT: f64 = 0.4;
const COHERENCE_WEIGHT: f64 = 0.3;
const GUESSABILITY_WEIGHT: f64 = 0.4;
const OBSCURITY_WEIGHT: f64 = 0.5;

/// The outlier strength needs at least this many rows with a finite value
const MIN_POPULATION: usize = 10;

/// Values of the primary metric, for the whole table and for the selected words
fn primary_values(candidate: &CandidatePattern, table: &FeatureTable) -> (Vec<f64>, Vec<f64>) {
    let column = table.column(candidate.metric_a);
    let population = column
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .collect::<Vec<_>>();
    let selected = candidate
        .words
        .iter()
        .filter_map(|word| table.row_of(word))
        .map(|row| column[row])
        .filter(|v| v.is_finite())
        .collect::<Vec<_>>();
    (population, selected)
}

/// How far the selection's mean is from the table's mean, in standard deviations
#[must_use]
pub fn outlier_strength(candidate: &CandidatePattern, table: &FeatureTable) -> f64 {
    if candidate.words.is_empty() {
        return 0.0;
    }
    let (population, selected) = primary_values(candidate, table);
    if population.len() < MIN_POPULATION || selected.is_empty() {
        return 0.0;
    }
    let std_all = std(&population);
    if std_all == 0.0 {
        return 0.0;
    }
    (mean(&selected) - mean(&population)).abs() / std_all
}

/// How tightly the selection clusters on the primary metric, relative to the whole table
#[must_use]
pub fn internal_coherence(candidate: &CandidatePattern, table: &FeatureTable) -> f64 {
    if candidate.words.is_empty() {
        return 0.0;
    }
    let (population, selected) = primary_values(candidate, table);
    if selected.len() < 2 {
        return 1.0;
    }
    let std_all = std(&population);
    if std_all == 0.0 {
        return 1.0;
    }
    (1.0 - std(&selected) / std_all).max(0.0)
}

#[allow(clippy::cast_precision_loss)]
fn as_f64(n: usize) -> f64 {
    n as f64
}

/// Favors selections of recognizable words, 4 to 10 letters on average and nothing extreme
#[must_use]
pub fn human_guessability(candidate: &CandidatePattern) -> f64 {
    if candidate.words.is_empty() {
        return 0.0;
    }
    let lengths = candidate
        .words
        .iter()
        .map(|w| as_f64(w.len()))
        .collect::<Vec<_>>();
    let mean_length = mean(&lengths);

    let length_score = if (4.0..=10.0).contains(&mean_length) {
        1.0
    } else if (3.0..=12.0).contains(&mean_length) {
        0.7
    } else {
        0.4
    };

    let weird = lengths.iter().filter(|&&l| l < 3.0 || l > 14.0).count();
    let weird_share = as_f64(weird) / as_f64(lengths.len());
    (length_score - weird_share * 0.3).max(0.0)
}

/// Penalizes very long words and words with many rare letters, in [0, 1]
#[must_use]
pub fn obscurity_penalty(candidate: &CandidatePattern) -> f64 {
    if candidate.words.is_empty() {
        return 0.0;
    }
    let penalty = candidate
        .words
        .iter()
        .map(|word| {
            let long = if word.len() > 12 { 0.2 } else { 0.0 };
            let rare = letters(word).filter(|&l| RARE.contains(l)).count();
            long + 0.05 * (as_f64(rare) / as_f64(word.len().max(1)))
        })
        .sum::<f64>();
    (penalty / as_f64(candidate.words.len())).min(1.0)
}

/// All parts of a pattern's score
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PqsBreakdown {
    /// See [`outlier_strength`]
    pub outlier_strength: f64,
    /// See [`internal_coherence`]
    pub internal_coherence: f64,
    /// See [`human_guessability`]
    pub human_guessability: f64,
    /// See [`obscurity_penalty`]
    pub obscurity_penalty: f64,
}

impl PqsBreakdown {
    /// Score all parts of a candidate
    #[must_use]
    pub fn of(candidate: &CandidatePattern, table: &FeatureTable) -> Self {
        Self {
            outlier_strength: outlier_strength(candidate, table),
            internal_coherence: internal_coherence(candidate, table),
            human_guessability: human_guessability(candidate),
            obscurity_penalty: obscurity_penalty(candidate),
        }
    }

    /// The weighted total
    #[must_use]
    pub fn total(&self) -> f64 {
        self.outlier_strength * OUTLIER_WEIGHT
            + self.internal_coherence * COHERENCE_WEIGHT
            + self.human_guessability * GUESSABILITY_WEIGHT
            - self.obscurity_penalty * OBSCURITY_WEIGHT
    }
}

/// The Pattern Quality Score of a candidate, higher is better
#[must_use]
pub fn pqs(candidate: &CandidatePattern, table: &FeatureTable) -> f64 {
    PqsBreakdown::of(candidate, table).total()
}

/// How hard a puzzle is expected to be
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// PQS of at least 2.2
    Easy,
    /// PQS of at least 1.4
    Medium,
    /// Everything else
    Hard,
}

impl Difficulty {
    /// Band a PQS into a difficulty
    #[must_use]
    pub fn from_pqs(pqs: f64) -> Self {
        if pqs >= 2.2 {
            Self::Easy
        } else if pqs >= 1.4 {
            Self::Medium
        } else {
            Self::Hard
        }
    }

    /// Lowercase label
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }
}

impl Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Thresholds for [`filter_and_rank`]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RankParams {
    /// Candidates scoring below this are dropped
    pub min_pqs: f64,
    /// Fewest words a puzzle may show
    pub min_words: usize,
    /// Most words a puzzle may show
    pub max_words: usize,
}

impl Default for RankParams {
    fn default() -> Self {
        Self {
            min_pqs: 0.7,
            min_words: 4,
            max_words: 12,
        }
    }
}

/// A candidate together with its score
#[derive(Clone, Debug, PartialEq)]
pub struct Ranked {
    /// The pattern
    pub candidate: CandidatePattern,
    /// Its Pattern Quality Score
    pub pqs: f64,
}

/// Score all candidates, drop those with a bad word count or a low score, and sort the rest by
/// descending score. Candidates with equal scores keep their relative order.
#[must_use]
pub fn filter_and_rank(
    candidates: Vec<CandidatePattern>,
    table: &FeatureTable,
    params: &RankParams,
) -> Vec<Ranked> {
    let total = candidates.len();
    let mut ranked = candidates
        .into_iter()
        .filter(|c| (params.min_words..=params.max_words).contains(&c.words.len()))
        .filter_map(|candidate| {
            let pqs = pqs(&candidate, table);
            if pqs >= params.min_pqs {
                Some(Ranked { candidate, pqs })
            } else {
                log::debug!("dropping '{}' with pqs {pqs:.3}", candidate.rule);
                None
            }
        })
        .collect::<Vec<_>>();
    ranked.sort_by(|a, b| b.pqs.total_cmp(&a.pqs));

    log::debug!("{} of {total} candidates passed ranking", ranked.len());
    ranked
}
