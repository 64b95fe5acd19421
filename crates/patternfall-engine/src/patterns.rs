//! Pattern templates: reusable rules that discover word sets in the feature table.
//!
//! Every template scans the table and returns zero or more [`CandidatePattern`]s, each a small
//! set of words together with the hidden rule that selected them. Metrics without enough
//! usable rows are skipped silently, a template never fails.

use crate::{
    features::{FeatureTable, Metric},
    stats::{even_spaced, mean, percentile, z_scores},
};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fmt::{self, Display},
};

/// A pattern needs at least this many matching words to be a puzzle
pub const MIN_MATCHES: usize = 4;

/// The family of algorithms that produced a pattern
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TemplateId {
    /// Extreme values of a single metric
    #[serde(rename = "extreme_outliers")]
    ExtremeOutliers,
    /// Very high values of a metric among words that satisfy a side constraint
    #[serde(rename = "constrained_extremes")]
    ConstrainedExtremes,
    /// One metric high while another one is low
    #[serde(rename = "ratio_anomaly")]
    RatioAnomaly,
}

impl TemplateId {
    /// The stable identifier, as stored in the history
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ExtremeOutliers => "extreme_outliers",
            Self::ConstrainedExtremes => "constrained_extremes",
            Self::RatioAnomaly => "ratio_anomaly",
        }
    }
}

impl Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Which tail of a distribution to look at
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// The largest values
    High,
    /// The smallest values
    Low,
}

impl Direction {
    const fn superlative(self) -> &'static str {
        match self {
            Self::High => "highest",
            Self::Low => "lowest",
        }
    }

    fn passes(self, value: f64, threshold: f64) -> bool {
        match self {
            Self::High => value >= threshold,
            Self::Low => value <= threshold,
        }
    }

    /// Order rows from the most to the least extreme, ties stay in table order
    fn sort(self, rows: &mut [usize], values: &[f64]) {
        match self {
            Self::High => rows.sort_by(|&a, &b| values[b].total_cmp(&values[a])),
            Self::Low => rows.sort_by(|&a, &b| values[a].total_cmp(&values[b])),
        }
    }
}

/// A side condition on the population, `metric >= min`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Constraint {
    /// The constrained metric
    pub metric: Metric,
    /// Inclusive lower bound
    pub min: f64,
}

impl Constraint {
    fn accepts(self, table: &FeatureTable, row: usize) -> bool {
        table.value(row, self.metric) >= self.min
    }
}

impl Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}>={}", self.metric, self.min)
    }
}

/// One proposed puzzle before scoring
#[derive(Clone, Debug, PartialEq)]
pub struct CandidatePattern {
    /// The words shown to the player
    pub words: Vec<String>,
    /// The hidden rule, in plain English
    pub rule: String,
    /// The template that found this pattern
    pub template: TemplateId,
    /// The metric the rule is about
    pub metric_a: Metric,
    /// The second metric of compound rules
    pub metric_b: Option<Metric>,
    /// The percentile that was used as cutoff
    pub percentile: Option<f64>,
    /// The value of the cutoff, in units of `metric_a`
    pub threshold: Option<f64>,
    /// Description of a side constraint on the population
    pub constraint: Option<String>,
    /// Diagnostics from the template
    pub raw_scores: BTreeMap<&'static str, f64>,
}

/// Parameters for [`extreme_outliers`]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExtremeOutlierParams {
    /// Percentile used for [`Direction::High`]
    pub percentile_high: f64,
    /// Percentile used for [`Direction::Low`]
    pub percentile_low: f64,
    /// Shortest eligible word
    pub min_word_length: usize,
    /// Longest eligible word
    pub max_word_length: usize,
    /// At most this many words per pattern
    pub max_candidates: usize,
    /// Metrics with fewer eligible rows are skipped
    pub min_rows: usize,
}

impl Default for ExtremeOutlierParams {
    fn default() -> Self {
        Self {
            percentile_high: 99.9,
            percentile_low: 0.1,
            min_word_length: 5,
            max_word_length: 18,
            max_candidates: 8,
            min_rows: 20,
        }
    }
}

/// Parameters for [`constrained_extremes`]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConstrainedParams {
    /// Only words satisfying this are considered
    pub constraint: Constraint,
    /// Percentile used as the high cutoff
    pub percentile: f64,
    /// Shortest eligible word
    pub min_word_length: usize,
    /// Longest eligible word
    pub max_word_length: usize,
    /// At most this many words per pattern
    pub max_candidates: usize,
    /// The whole template is skipped if fewer words satisfy the constraint
    pub min_population: usize,
    /// Metrics with fewer eligible rows are skipped
    pub min_rows: usize,
}

impl Default for ConstrainedParams {
    fn default() -> Self {
        Self {
            constraint: Constraint {
                metric: Metric::UniqueLetters,
                min: 6.0,
            },
            percentile: 99.0,
            min_word_length: 5,
            max_word_length: 18,
            max_candidates: 8,
            min_population: 30,
            min_rows: 10,
        }
    }
}

/// Parameters for [`ratio_anomalies`]
#[derive(Clone, Debug, PartialEq)]
pub struct RatioParams {
    /// Pairs of `(high, low)` metrics
    pub pairs: Vec<(Metric, Metric)>,
    /// Percentile of the combined score used as cutoff
    pub percentile: f64,
    /// Shortest eligible word
    pub min_word_length: usize,
    /// Longest eligible word
    pub max_word_length: usize,
    /// At most this many words per pattern
    pub max_candidates: usize,
    /// The whole template is skipped if fewer words have an eligible length
    pub min_population: usize,
    /// Pairs with fewer eligible rows are skipped
    pub min_rows: usize,
}

impl Default for RatioParams {
    fn default() -> Self {
        Self {
            pairs: vec![
                // long but few unique letters
                (Metric::Length, Metric::UniqueLetters),
                // long but low entropy
                (Metric::Length, Metric::Entropy),
                // long but one letter dominates
                (Metric::Length, Metric::MaxLetterFrequency),
                // high entropy but short
                (Metric::Entropy, Metric::Length),
                (Metric::VowelRatio, Metric::ConsonantRuns),
            ],
            percentile: 99.0,
            min_word_length: 5,
            max_word_length: 18,
            max_candidates: 8,
            min_population: 50,
            min_rows: 20,
        }
    }
}

fn length_in(table: &FeatureTable, row: usize, min: usize, max: usize) -> bool {
    let len = table.value(row, Metric::Length);
    #[allow(clippy::cast_precision_loss)]
    let (min, max) = (min as f64, max as f64);
    len >= min && len <= max
}

/// Keep at most `max` rows, evenly spread over the ordered list
fn spread(rows: &[usize], max: usize) -> Vec<usize> {
    even_spaced(rows.len(), max)
        .into_iter()
        .map(|i| rows[i])
        .collect()
}

fn words_of(table: &FeatureTable, rows: &[usize]) -> Vec<String> {
    rows.iter().map(|&row| table.word(row).to_owned()).collect()
}

fn values_of(values: &[f64], rows: &[usize]) -> Vec<f64> {
    rows.iter().map(|&row| values[row]).collect()
}

/// Words at the extreme (high or low) of a single metric, among words of moderate length
#[must_use]
pub fn extreme_outliers(
    table: &FeatureTable,
    metrics: &[Metric],
    direction: Direction,
    params: &ExtremeOutlierParams,
) -> Vec<CandidatePattern> {
    let eligible = (0..table.len())
        .filter(|&row| length_in(table, row, params.min_word_length, params.max_word_length))
        .collect::<Vec<_>>();

    let p = match direction {
        Direction::High => params.percentile_high,
        Direction::Low => params.percentile_low,
    };

    let mut candidates = Vec::new();
    for &metric in metrics {
        let column = table.column(metric);
        let valid = eligible
            .iter()
            .copied()
            .filter(|&row| column[row].is_finite())
            .collect::<Vec<_>>();
        if valid.len() < params.min_rows {
            log::debug!("extreme {direction:?} {metric}: only {} rows", valid.len());
            continue;
        }

        let threshold = percentile(&values_of(column, &valid), p);
        let mut rows = valid
            .into_iter()
            .filter(|&row| direction.passes(column[row], threshold))
            .collect::<Vec<_>>();
        if rows.len() < MIN_MATCHES {
            continue;
        }
        direction.sort(&mut rows, column);
        let rows = spread(&rows, params.max_candidates);

        candidates.push(CandidatePattern {
            words: words_of(table, &rows),
            rule: format!("Words with {} {metric}", direction.superlative()),
            template: TemplateId::ExtremeOutliers,
            metric_a: metric,
            metric_b: None,
            percentile: Some(p),
            threshold: Some(threshold),
            constraint: Some(format!("length>={}", params.min_word_length)),
            raw_scores: BTreeMap::from([("outlier_strength", mean(&values_of(column, &rows)))]),
        });
    }

    log::debug!(
        "extreme outliers ({direction:?}) found {} candidates",
        candidates.len()
    );
    candidates
}

/// Very high values of a metric, among words that satisfy a side constraint.
///
/// This produces compound rules such as "many unique letters and high entropy".
#[must_use]
pub fn constrained_extremes(
    table: &FeatureTable,
    metrics: &[Metric],
    params: &ConstrainedParams,
) -> Vec<CandidatePattern> {
    let constraint = params.constraint;
    let population = (0..table.len())
        .filter(|&row| {
            constraint.accepts(table, row)
                && length_in(table, row, params.min_word_length, params.max_word_length)
        })
        .collect::<Vec<_>>();
    if population.len() < params.min_population {
        log::debug!(
            "constrained extremes: only {} words satisfy {constraint}",
            population.len()
        );
        return Vec::new();
    }

    let mut candidates = Vec::new();
    for &metric in metrics.iter().filter(|&&m| m != constraint.metric) {
        let column = table.column(metric);
        let valid = population
            .iter()
            .copied()
            .filter(|&row| column[row].is_finite())
            .collect::<Vec<_>>();
        if valid.len() < params.min_rows {
            continue;
        }

        let threshold = percentile(&values_of(column, &valid), params.percentile);
        let mut rows = valid
            .into_iter()
            .filter(|&row| column[row] >= threshold)
            .collect::<Vec<_>>();
        if rows.len() < MIN_MATCHES {
            continue;
        }
        Direction::High.sort(&mut rows, column);
        let rows = spread(&rows, params.max_candidates);

        candidates.push(CandidatePattern {
            words: words_of(table, &rows),
            rule: format!(
                "Words with very high {metric} among words that have {} ≥ {}",
                constraint.metric, constraint.min
            ),
            template: TemplateId::ConstrainedExtremes,
            metric_a: metric,
            metric_b: Some(constraint.metric),
            percentile: Some(params.percentile),
            threshold: Some(threshold),
            constraint: Some(constraint.to_string()),
            raw_scores: BTreeMap::from([("outlier_strength", mean(&values_of(column, &rows)))]),
        });
    }

    log::debug!("constrained extremes found {} candidates", candidates.len());
    candidates
}

/// Words where one metric is unusually high while another one is unusually low.
///
/// Both metrics are standardized within the eligible population, the combined anomaly is
/// `z(a) - z(b)`.
#[must_use]
pub fn ratio_anomalies(
    table: &FeatureTable,
    metrics: &[Metric],
    params: &RatioParams,
) -> Vec<CandidatePattern> {
    let population = (0..table.len())
        .filter(|&row| length_in(table, row, params.min_word_length, params.max_word_length))
        .collect::<Vec<_>>();
    if population.len() < params.min_population {
        log::debug!("ratio anomalies: only {} eligible words", population.len());
        return Vec::new();
    }

    let mut candidates = Vec::new();
    for &(metric_a, metric_b) in &params.pairs {
        if !metrics.contains(&metric_a) || !metrics.contains(&metric_b) {
            continue;
        }
        let (col_a, col_b) = (table.column(metric_a), table.column(metric_b));
        let valid = population
            .iter()
            .copied()
            .filter(|&row| col_a[row].is_finite() && col_b[row].is_finite())
            .collect::<Vec<_>>();
        if valid.len() < params.min_rows {
            continue;
        }

        let za = z_scores(&values_of(col_a, &valid));
        let zb = z_scores(&values_of(col_b, &valid));
        let combined = za.iter().zip(&zb).map(|(a, b)| a - b).collect::<Vec<_>>();

        let threshold = percentile(&combined, params.percentile);
        // positions into `valid` and `combined`
        let mut selected = (0..valid.len())
            .filter(|&i| combined[i] >= threshold)
            .collect::<Vec<_>>();
        if selected.len() < MIN_MATCHES {
            continue;
        }
        Direction::High.sort(&mut selected, &combined);
        let selected = spread(&selected, params.max_candidates);
        let rows = selected.iter().map(|&i| valid[i]).collect::<Vec<_>>();

        candidates.push(CandidatePattern {
            words: words_of(table, &rows),
            rule: format!(
                "Words with unusually high {metric_a} and low {metric_b} (ratio anomaly)"
            ),
            template: TemplateId::RatioAnomaly,
            metric_a,
            metric_b: Some(metric_b),
            percentile: Some(params.percentile),
            threshold: None,
            constraint: None,
            raw_scores: BTreeMap::from([("combo_z", mean(&values_of(&combined, &selected)))]),
        });
    }

    log::debug!("ratio anomalies found {} candidates", candidates.len());
    candidates
}

/// Run every template with its default parameters and concatenate the results.
///
/// Each family (extreme high, extreme low, constrained, ratio) contributes at most
/// `max_per_template` candidates.
#[must_use]
pub fn run_all_templates(
    table: &FeatureTable,
    metrics: &[Metric],
    max_per_template: usize,
) -> Vec<CandidatePattern> {
    let extreme = ExtremeOutlierParams::default();
    let families = [
        extreme_outliers(table, metrics, Direction::High, &extreme),
        extreme_outliers(table, metrics, Direction::Low, &extreme),
        constrained_extremes(table, metrics, &ConstrainedParams::default()),
        ratio_anomalies(table, metrics, &RatioParams::default()),
    ];

    families
        .into_iter()
        .flat_map(|family| family.into_iter().take(max_per_template))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{features::build_feature_table, testing::sample_table};

    const PALINDROMISH: [&str; 6] = ["kayak", "level", "civic", "radar", "zebra", "quilt"];

    const LONGER: [&str; 30] = [
        "planet", "orange", "silver", "garden", "rocket", "window", "bridge", "candle", "forest",
        "market", "blanket", "cabinet", "diamond", "harvest", "journey", "kitchen", "lantern",
        "machine", "pilgrim", "quarrel", "absolute", "baseline", "calendar", "daughter",
        "elephant", "fragment", "generous", "hospital", "magnitude", "navigator",
    ];

    fn five_letter_table() -> FeatureTable {
        let words = PALINDROMISH.iter().chain(&LONGER).copied().collect::<Vec<_>>();
        build_feature_table(&words, None).unwrap().0
    }

    #[test]
    fn test_shortest_words_are_found() {
        let table = five_letter_table();
        let candidates = extreme_outliers(
            &table,
            &[Metric::Length],
            Direction::Low,
            &ExtremeOutlierParams::default(),
        );

        assert_eq!(candidates.len(), 1);
        let candidate = &candidates[0];
        assert_eq!(candidate.rule, "Words with lowest length");
        assert!(candidate
            .words
            .iter()
            .all(|w| PALINDROMISH.contains(&w.as_str())));
        assert_eq!(candidate.words.len(), 6);
        assert_eq!(candidate.template, TemplateId::ExtremeOutliers);
        assert_eq!(candidate.metric_a, Metric::Length);
        assert_eq!(candidate.metric_b, None);
        assert_eq!(candidate.percentile, Some(0.1));
        assert_eq!(candidate.constraint.as_deref(), Some("length>=5"));
        assert_eq!(candidate.raw_scores["outlier_strength"], 5.0);
    }

    #[test]
    fn test_extreme_outliers_respect_threshold() {
        let table = sample_table();
        let params = ExtremeOutlierParams::default();
        for direction in [Direction::High, Direction::Low] {
            let candidates = extreme_outliers(&table, &Metric::ALL, direction, &params);
            assert!(!candidates.is_empty());
            for candidate in candidates {
                let threshold = candidate.threshold.unwrap();
                assert!(candidate.rule.starts_with(match direction {
                    Direction::High => "Words with highest ",
                    Direction::Low => "Words with lowest ",
                }));
                assert!((MIN_MATCHES..=params.max_candidates).contains(&candidate.words.len()));
                for word in &candidate.words {
                    let row = table.row_of(word).unwrap();
                    let value = table.value(row, candidate.metric_a);
                    match direction {
                        Direction::High => assert!(value >= threshold),
                        Direction::Low => assert!(value <= threshold),
                    }
                    assert!((5..=18).contains(&word.len()), "{word} has a bad length");
                }
            }
        }
    }

    #[test]
    fn test_extreme_outliers_spread_over_tail() {
        // 20 words sharing the minimum length of 5, the rest is longer
        let mut words = (0..20)
            .map(|i| {
                let a = char::from(b'a' + i);
                format!("{a}{a}bcd")
            })
            .collect::<Vec<_>>();
        words.extend(LONGER.iter().map(|w| (*w).to_owned()));
        let (table, _) = build_feature_table(&words, None).unwrap();

        let candidates = extreme_outliers(
            &table,
            &[Metric::Length],
            Direction::Low,
            &ExtremeOutlierParams::default(),
        );
        assert_eq!(candidates.len(), 1);
        // step is 20 / 8 = 2.5, picks rows 0, 2, 5, 7, 10, 12, 15, 17
        let expected = [0, 2, 5, 7, 10, 12, 15, 17]
            .iter()
            .map(|&i| words[i].clone())
            .collect::<Vec<_>>();
        assert_eq!(candidates[0].words, expected);
    }

    #[test]
    fn test_extreme_outliers_skip_small_tables() {
        let (table, _) = build_feature_table(&PALINDROMISH, None).unwrap();
        let candidates = extreme_outliers(
            &table,
            &Metric::ALL,
            Direction::High,
            &ExtremeOutlierParams::default(),
        );
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_no_metrics_no_candidates() {
        let table = sample_table();
        assert!(run_all_templates(&table, &[], 40).is_empty());
    }

    #[test]
    fn test_constrained_extremes() {
        let table = sample_table();
        let params = ConstrainedParams::default();
        let candidates = constrained_extremes(&table, &Metric::ALL, &params);
        assert!(!candidates.is_empty());
        for candidate in candidates {
            assert_ne!(candidate.metric_a, Metric::UniqueLetters);
            assert_eq!(candidate.metric_b, Some(Metric::UniqueLetters));
            assert_eq!(candidate.constraint.as_deref(), Some("unique_letters>=6"));
            assert!(candidate.rule.ends_with("among words that have unique_letters ≥ 6"));
            let threshold = candidate.threshold.unwrap();
            for word in &candidate.words {
                let row = table.row_of(word).unwrap();
                assert!(table.value(row, Metric::UniqueLetters) >= 6.0);
                assert!(table.value(row, candidate.metric_a) >= threshold);
            }
        }
    }

    #[test]
    fn test_constrained_extremes_need_population() {
        let table = five_letter_table();
        let params = ConstrainedParams {
            constraint: Constraint {
                metric: Metric::Length,
                min: 10.0,
            },
            ..ConstrainedParams::default()
        };
        assert!(constrained_extremes(&table, &Metric::ALL, &params).is_empty());
    }

    #[test]
    fn test_ratio_anomalies() {
        let table = sample_table();
        let candidates = ratio_anomalies(&table, &Metric::ALL, &RatioParams::default());
        assert!(!candidates.is_empty());
        for candidate in &candidates {
            assert_eq!(candidate.template, TemplateId::RatioAnomaly);
            assert!(candidate.metric_b.is_some());
            assert!(candidate.constraint.is_none());
            assert!(candidate.rule.ends_with("(ratio anomaly)"));
            assert!(candidate.raw_scores["combo_z"] > 0.0);
        }
    }

    #[test]
    fn test_ratio_anomalies_skip_missing_metrics() {
        let table = sample_table();
        let candidates = ratio_anomalies(&table, &[Metric::Length], &RatioParams::default());
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_run_all_templates_caps_families() {
        let table = sample_table();
        let all = run_all_templates(&table, &Metric::ALL, 40);
        let capped = run_all_templates(&table, &Metric::ALL, 2);
        assert!(capped.len() <= 8);
        assert!(capped.len() < all.len());
        assert!(all.iter().any(|c| c.template == TemplateId::ExtremeOutliers));
        assert!(all.iter().any(|c| c.template == TemplateId::RatioAnomaly));
    }

    #[test]
    fn test_template_ids() {
        assert_eq!(TemplateId::ExtremeOutliers.to_string(), "extreme_outliers");
        assert_eq!(
            serde_json::to_string(&TemplateId::RatioAnomaly).unwrap(),
            r#""ratio_anomaly""#
        );
    }
}
