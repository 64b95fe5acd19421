//! The append-only log of puzzles that have been published as a daily puzzle.
//!
//! Every line of the log is one JSON object. The log is only ever appended to, and reading it
//! never fails: a log that cannot be read or parsed is reported and treated as empty, so that a
//! damaged log cannot stop the daily puzzle.

use crate::{
    error::{Error, Result},
    features::Metric,
    patterns::CandidatePattern,
    scoring::Ranked,
};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::{
    collections::{HashMap, HashSet},
    fmt::{self, Display},
    fs::OpenOptions,
    io::Write,
    path::{Path, PathBuf},
};

/// Identifies a rule independent of the words that were shown for it.
///
/// Rendered as `template|metric_a|metric_b|constraint`, absent parts are empty.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleSignature(String);

impl RuleSignature {
    /// Build a signature from its parts
    #[must_use]
    pub fn new(
        template: &str,
        metric_a: &str,
        metric_b: Option<&str>,
        constraint: Option<&str>,
    ) -> Self {
        Self(format!(
            "{template}|{metric_a}|{}|{}",
            metric_b.unwrap_or_default(),
            constraint.unwrap_or_default()
        ))
    }

    /// The signature of a candidate pattern
    #[must_use]
    pub fn of(pattern: &CandidatePattern) -> Self {
        Self::new(
            pattern.template.as_str(),
            pattern.metric_a.name(),
            pattern.metric_b.map(Metric::name),
            pattern.constraint.as_deref(),
        )
    }

    /// The rendered signature
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for RuleSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One published daily puzzle.
///
/// Template and metrics are kept as plain names, so that the log stays readable when the set of
/// metrics changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UsedPattern {
    /// The day the puzzle was published for
    pub date: NaiveDate,
    /// The rule as shown to players
    pub rule: String,
    /// Template that produced the pattern
    pub template_id: String,
    /// Primary metric
    pub metric_a: String,
    /// Secondary metric, if any
    pub metric_b: Option<String>,
    /// Side constraint, if any
    pub constraint_desc: Option<String>,
    /// The words that were shown
    pub words: Vec<String>,
    /// The quality score at the time of publishing
    pub pqs: f64,
}

impl UsedPattern {
    /// The record for publishing `ranked` on `date`
    #[must_use]
    pub fn of(ranked: &Ranked, date: NaiveDate) -> Self {
        let pattern = &ranked.candidate;
        Self {
            date,
            rule: pattern.rule.clone(),
            template_id: pattern.template.as_str().to_owned(),
            metric_a: pattern.metric_a.name().to_owned(),
            metric_b: pattern.metric_b.map(|m| m.name().to_owned()),
            constraint_desc: pattern.constraint.clone(),
            words: pattern.words.clone(),
            pqs: ranked.pqs,
        }
    }

    /// The signature of the published rule
    #[must_use]
    pub fn signature(&self) -> RuleSignature {
        RuleSignature::new(
            &self.template_id,
            &self.metric_a,
            self.metric_b.as_deref(),
            self.constraint_desc.as_deref(),
        )
    }
}

/// The history log file
#[derive(Clone, Debug)]
pub struct HistoryLog {
    path: PathBuf,
}

impl HistoryLog {
    /// A log at `path`, the file is created on the first append
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the log
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All records in the order they were appended.
    ///
    /// A missing log is an empty history. A log that cannot be read or has a malformed line is
    /// logged as a warning and also treated as empty.
    #[must_use]
    pub fn read(&self) -> Vec<UsedPattern> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                log::warn!(
                    "could not read history at {}, treating it as empty: {e}",
                    self.path.display()
                );
                return Vec::new();
            }
        };

        let records = content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(no, line)| {
                serde_json::from_str::<UsedPattern>(line).map_err(|e| (no + 1, e))
            })
            .collect::<std::result::Result<Vec<_>, _>>();

        match records {
            Ok(records) => records,
            Err((line, e)) => {
                log::warn!(
                    "malformed history at {}:{line}, treating it as empty: {e}",
                    self.path.display()
                );
                Vec::new()
            }
        }
    }

    /// Append one record to the log with a single write
    ///
    /// # Errors
    ///
    /// [`Error::Io`] if the log cannot be opened or written
    pub fn append(&self, record: &UsedPattern) -> Result<()> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| Error::io(&self.path, e))?;
        file.write_all(&line).map_err(|e| Error::io(&self.path, e))?;

        log::debug!(
            "appended '{}' for {} to {}",
            record.rule,
            record.date,
            self.path.display()
        );
        Ok(())
    }
}

/// First day that is inside a window of `days` days ending at `today`
fn window_start(today: NaiveDate, days: u32) -> NaiveDate {
    today
        .checked_sub_signed(Duration::days(i64::from(days)))
        .unwrap_or(NaiveDate::MIN)
}

/// Signatures of all rules published in the last `days` days
#[must_use]
pub fn recent_signatures(
    records: &[UsedPattern],
    today: NaiveDate,
    days: u32,
) -> HashSet<RuleSignature> {
    let start = window_start(today, days);
    records
        .iter()
        .filter(|r| r.date >= start)
        .map(UsedPattern::signature)
        .collect()
}

/// How many published puzzles of the last `days` days contained each word
#[must_use]
pub fn word_use_counts(
    records: &[UsedPattern],
    today: NaiveDate,
    days: u32,
) -> HashMap<String, usize> {
    let start = window_start(today, days);
    let mut counts = HashMap::new();
    for record in records.iter().filter(|r| r.date >= start) {
        let words = record.words.iter().collect::<HashSet<_>>();
        for word in words {
            *counts.entry(word.clone()).or_default() += 1;
        }
    }
    counts
}
