//! Choose the daily puzzle from the ranked candidates, honoring what has been published before.

use crate::{
    history::{recent_signatures, word_use_counts, RuleSignature, UsedPattern},
    scoring::Ranked,
};
use chrono::NaiveDate;
use fxhash::FxHasher64;
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use std::{cmp::Ordering, hash::Hasher};

/// How long rules and words are kept out of the daily puzzle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SelectionPolicy {
    /// A rule signature is not reused within this many days
    pub no_reuse_days: u32,
    /// Window for counting word appearances
    pub word_window_days: u32,
    /// Words that appeared this often within the window are excluded
    pub max_word_reuse: usize,
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self {
            no_reuse_days: 30,
            word_window_days: 31,
            max_word_reuse: 2,
        }
    }
}

/// A random generator that is the same for every run on `date`
#[must_use]
pub fn daily_rng(date: NaiveDate) -> StdRng {
    let mut hasher = FxHasher64::default();
    hasher.write(date.format("%Y-%m-%d").to_string().as_bytes());
    StdRng::seed_from_u64(hasher.finish())
}

/// The daily pick: the best candidate that uses neither a recent rule nor an overused word.
///
/// `ranked` must be sorted by descending score. If several of the best survivors share the exact
/// same score, the date decides between them, so that the pick is stable for a day.
#[must_use]
pub fn select_daily<'a>(
    ranked: &'a [Ranked],
    history: &[UsedPattern],
    today: NaiveDate,
    policy: &SelectionPolicy,
) -> Option<&'a Ranked> {
    let recent = recent_signatures(history, today, policy.no_reuse_days);
    let word_uses = word_use_counts(history, today, policy.word_window_days);

    let is_allowed = |r: &&Ranked| {
        let signature = RuleSignature::of(&r.candidate);
        if recent.contains(&signature) {
            log::debug!("skipping recently used rule {signature}");
            return false;
        }
        let overused = r.candidate.words.iter().find(|w| {
            word_uses.get(w.as_str()).copied().unwrap_or_default() >= policy.max_word_reuse
        });
        if let Some(word) = overused {
            log::debug!("skipping '{}', '{word}' was used too often", r.candidate.rule);
            return false;
        }
        true
    };

    let mut survivors = ranked.iter().filter(is_allowed);
    let best = survivors.next()?;
    let mut ties = vec![best];
    ties.extend(survivors.take_while(|r| r.pqs.total_cmp(&best.pqs) == Ordering::Equal));

    let pick = ties.choose(&mut daily_rng(today)).copied();
    if let Some(pick) = pick {
        log::info!(
            "selected '{}' (pqs {:.3}) for {today} out of {} candidates",
            pick.candidate.rule,
            pick.pqs,
            ranked.len()
        );
    }
    pick
}

/// A practice pick: any ranked candidate, uniformly at random, ignoring the history
pub fn select_random<'a, R>(ranked: &'a [Ranked], rng: &mut R) -> Option<&'a Ranked>
where
    R: Rng + ?Sized,
{
    ranked.choose(rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        features::Metric,
        patterns::{CandidatePattern, TemplateId},
    };
    use std::collections::BTreeMap;

    fn ranked(metric: Metric, words: &[&str], pqs: f64) -> Ranked {
        Ranked {
            candidate: CandidatePattern {
                words: words.iter().map(|w| (*w).to_owned()).collect(),
                rule: format!("Words with highest {metric}"),
                template: TemplateId::ExtremeOutliers,
                metric_a: metric,
                metric_b: None,
                percentile: Some(99.9),
                threshold: None,
                constraint: Some(String::from("length>=5")),
                raw_scores: BTreeMap::new(),
            },
            pqs,
        }
    }

    fn today() -> NaiveDate {
        "2024-06-15".parse().unwrap()
    }

    fn published(r: &Ranked, date: &str) -> UsedPattern {
        UsedPattern::of(r, date.parse().unwrap())
    }

    #[test]
    fn test_empty_history_picks_best() {
        let pool = [
            ranked(Metric::Length, &["alpha"], 2.0),
            ranked(Metric::Entropy, &["gamma"], 1.0),
        ];
        let pick = select_daily(&pool, &[], today(), &SelectionPolicy::default()).unwrap();
        assert_eq!(pick.candidate.metric_a, Metric::Length);
    }

    #[test]
    fn test_recent_rule_is_skipped() {
        let pool = [
            ranked(Metric::Length, &["alpha"], 2.0),
            ranked(Metric::Entropy, &["gamma"], 1.0),
        ];
        let history = [published(&pool[0], "2024-06-01")];
        let pick = select_daily(&pool, &history, today(), &SelectionPolicy::default()).unwrap();
        assert_eq!(pick.candidate.metric_a, Metric::Entropy);
    }

    #[test]
    fn test_old_rule_is_allowed_again() {
        let pool = [ranked(Metric::Length, &["alpha"], 2.0)];
        let history = [published(&pool[0], "2024-05-01")];
        assert!(select_daily(&pool, &history, today(), &SelectionPolicy::default()).is_some());
    }

    #[test]
    fn test_overused_word_is_skipped() {
        let pool = [
            ranked(Metric::Length, &["kayak", "level"], 2.0),
            ranked(Metric::Entropy, &["civic", "radar"], 1.0),
        ];
        let other = ranked(Metric::VowelRatio, &["kayak", "zebra"], 1.0);
        let history = [
            published(&other, "2024-06-01"),
            published(&other, "2024-06-10"),
        ];
        let pick = select_daily(&pool, &history, today(), &SelectionPolicy::default()).unwrap();
        assert!(!pick.candidate.words.contains(&String::from("kayak")));
    }

    #[test]
    fn test_word_used_once_is_fine() {
        let pool = [ranked(Metric::Length, &["kayak", "level"], 2.0)];
        let other = ranked(Metric::VowelRatio, &["kayak"], 1.0);
        let history = [published(&other, "2024-06-10")];
        assert!(select_daily(&pool, &history, today(), &SelectionPolicy::default()).is_some());
    }

    #[test]
    fn test_exhausted_pool() {
        let pool = [ranked(Metric::Length, &["alpha"], 2.0)];
        let history = [published(&pool[0], "2024-06-14")];
        assert!(select_daily(&pool, &history, today(), &SelectionPolicy::default()).is_none());
        assert!(select_daily(&[], &[], today(), &SelectionPolicy::default()).is_none());
    }

    #[test]
    fn test_ties_are_stable_for_a_date() {
        let pool = [
            ranked(Metric::Length, &["alpha"], 1.5),
            ranked(Metric::Entropy, &["gamma"], 1.5),
            ranked(Metric::VowelRatio, &["delta"], 1.5),
            ranked(Metric::ConsonantRuns, &["omega"], 1.0),
        ];
        let policy = SelectionPolicy::default();
        let first = select_daily(&pool, &[], today(), &policy).unwrap();
        for _ in 0..5 {
            let again = select_daily(&pool, &[], today(), &policy).unwrap();
            assert_eq!(again.candidate, first.candidate);
        }
        assert_ne!(first.candidate.metric_a, Metric::ConsonantRuns);
    }

    #[test]
    fn test_daily_rng_depends_on_date() {
        let a = daily_rng(today()).gen::<u64>();
        let b = daily_rng(today()).gen::<u64>();
        let c = daily_rng("2024-06-16".parse().unwrap()).gen::<u64>();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_random_ignores_history() {
        let pool = [ranked(Metric::Length, &["alpha"], 2.0)];
        let mut rng = StdRng::seed_from_u64(7);
        let pick = select_random(&pool, &mut rng).unwrap();
        assert_eq!(pick.candidate.metric_a, Metric::Length);
        assert!(select_random(&[], &mut rng).is_none());
    }
}
