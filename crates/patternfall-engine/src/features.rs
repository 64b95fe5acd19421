//! Lexical statistics for every word, materialized as a column-oriented table.
//!
//! Each word is a row and each [`Metric`] is a column. All metrics are pure functions of the
//! word, except for [`Metric::CorpusFrequency`] which consults an optional
//! [`FrequencyOracle`].

use crate::{
    error::{Error, Result},
    frequency::FrequencyOracle,
    prepare::{build_index, validate_word},
    store::write_atomic,
    types::{letters, Letter, LetterCounts, LetterSet},
};
use fst::Map;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::{
    fmt::{self, Display},
    hash::Hasher,
    path::Path,
    str::FromStr,
};

/// One column of the feature table
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Number of letters
    Length,
    /// Number of distinct letters
    UniqueLetters,
    /// Shannon entropy of the letter distribution, in bits
    Entropy,
    /// Count of the most repeated letter
    MaxLetterFrequency,
    /// Share of letters that are vowels
    VowelRatio,
    /// How common the word is in real usage
    CorpusFrequency,
    /// Standard deviation of the gaps between consecutive vowels
    VowelSpacingStd,
    /// Share of positions that agree with the word's own sorted letters
    AlphabeticOrderScore,
    /// How common the adjacent letter pairs are
    BigramProbability,
    /// How unusual the adjacent letter pairs are
    EditDensity,
    /// Number of maximal blocks of consonants
    ConsonantRuns,
}

impl Metric {
    /// All metrics, in column order
    pub const ALL: [Self; 11] = [
        Self::Length,
        Self::UniqueLetters,
        Self::Entropy,
        Self::MaxLetterFrequency,
        Self::VowelRatio,
        Self::CorpusFrequency,
        Self::VowelSpacingStd,
        Self::AlphabeticOrderScore,
        Self::BigramProbability,
        Self::EditDensity,
        Self::ConsonantRuns,
    ];

    /// The column name, also used in rule descriptions and as the guess-check token
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Length => "length",
            Self::UniqueLetters => "unique_letters",
            Self::Entropy => "entropy",
            Self::MaxLetterFrequency => "max_letter_frequency",
            Self::VowelRatio => "vowel_ratio",
            Self::CorpusFrequency => "corpus_frequency",
            Self::VowelSpacingStd => "vowel_spacing_std",
            Self::AlphabeticOrderScore => "alphabetic_order_score",
            Self::BigramProbability => "bigram_probability",
            Self::EditDensity => "edit_density",
            Self::ConsonantRuns => "consonant_runs",
        }
    }

    /// The position of this metric's column in the table
    #[must_use]
    pub const fn column(self) -> usize {
        self as usize
    }

    /// Compute this metric for a single word
    ///
    /// Without an oracle, the corpus frequency falls back to [`corpus_frequency_proxy`].
    #[must_use]
    pub fn compute(self, word: &str, oracle: Option<&dyn FrequencyOracle>) -> f64 {
        match self {
            Self::Length => length(word),
            Self::UniqueLetters => unique_letters(word),
            Self::Entropy => entropy(word),
            Self::MaxLetterFrequency => max_letter_frequency(word),
            Self::VowelRatio => vowel_ratio(word),
            Self::CorpusFrequency => oracle.map_or_else(
                || corpus_frequency_proxy(word),
                |oracle| oracle.frequency(word),
            ),
            Self::VowelSpacingStd => vowel_spacing_std(word),
            Self::AlphabeticOrderScore => alphabetic_order_score(word),
            Self::BigramProbability => bigram_probability(word),
            Self::EditDensity => edit_density(word),
            Self::ConsonantRuns => consonant_runs(word),
        }
    }
}

impl Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// The given name is not a known metric
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownMetric(pub String);

impl Display for UnknownMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown metric '{}'", self.0)
    }
}

impl std::error::Error for UnknownMetric {}

impl FromStr for Metric {
    type Err = UnknownMetric;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.name() == s)
            .ok_or_else(|| UnknownMetric(s.to_owned()))
    }
}

// --- letter stats ---

#[allow(clippy::cast_precision_loss)]
fn as_f64(n: usize) -> f64 {
    n as f64
}

/// Number of letters
#[must_use]
pub fn length(word: &str) -> f64 {
    as_f64(word.len())
}

/// Number of distinct letters
#[must_use]
pub fn unique_letters(word: &str) -> f64 {
    as_f64(LetterSet::of(word).len())
}

/// Count of the most repeated letter
#[must_use]
pub fn max_letter_frequency(word: &str) -> f64 {
    f64::from(LetterCounts::of(word).max())
}

/// Share of vowels among all letters, 0 for an empty word
#[must_use]
pub fn vowel_ratio(word: &str) -> f64 {
    if word.is_empty() {
        return 0.0;
    }
    as_f64(letters(word).filter(|l| l.is_vowel()).count()) / as_f64(word.len())
}

/// Shannon entropy of the letter distribution, in bits
#[must_use]
pub fn entropy(word: &str) -> f64 {
    let counts = LetterCounts::of(word);
    if counts.total() == 0 {
        return 0.0;
    }
    let n = as_f64(counts.total());
    let sum = counts
        .non_zero()
        .map(|c| {
            let p = f64::from(c) / n;
            p * p.log2()
        })
        .sum::<f64>();
    // a single repeated letter sums to -0.0
    (-sum).abs()
}

/// Number of maximal runs of consonants
#[must_use]
pub fn consonant_runs(word: &str) -> f64 {
    let mut runs = 0;
    let mut in_run = false;
    for b in word.bytes() {
        let is_consonant = Letter::try_new(b).map_or(false, |l| !l.is_vowel());
        if is_consonant && !in_run {
            runs += 1;
        }
        in_run = is_consonant;
    }
    as_f64(runs)
}

/// Standard deviation of the distances between consecutive vowels
///
/// Words with fewer than two gaps (i.e. fewer than three vowels) have no spread and return 0.
#[must_use]
pub fn vowel_spacing_std(word: &str) -> f64 {
    let positions = word
        .bytes()
        .enumerate()
        .filter(|&(_, b)| Letter::try_new(b).map_or(false, |l| l.is_vowel()))
        .map(|(pos, _)| pos)
        .collect::<SmallVec<[usize; 20]>>();

    let gaps = positions
        .windows(2)
        .map(|w| as_f64(w[1] - w[0]))
        .collect::<SmallVec<[f64; 20]>>();

    if gaps.len() > 1 {
        crate::stats::std(&gaps)
    } else {
        0.0
    }
}

/// Share of positions where the word agrees with its own letters sorted, 1 for short words
#[must_use]
pub fn alphabetic_order_score(word: &str) -> f64 {
    if word.len() < 2 {
        return 1.0;
    }
    let mut sorted = word.bytes().collect::<SmallVec<[u8; 20]>>();
    sorted.sort_unstable();
    let matches = word.bytes().zip(sorted).filter(|(a, b)| a == b).count();
    as_f64(matches) / as_f64(word.len())
}

// --- letter pair proxies ---

/// English letters from most to least frequent
const FREQUENCY_ORDER: &[u8; 26] = b"etaoinshrdlcumwfgypbvkjxqz";

fn frequency_rank(b: u8) -> u32 {
    FREQUENCY_ORDER
        .iter()
        .position(|&f| f == b.to_ascii_lowercase())
        .and_then(|rank| u32::try_from(rank).ok())
        .unwrap_or(25)
}

/// Mean over all adjacent letter pairs of the sum of both letters' frequency ranks
fn mean_pair_rank(word: &str) -> f64 {
    let ranks = word
        .as_bytes()
        .windows(2)
        .map(|pair| f64::from(frequency_rank(pair[0]) + frequency_rank(pair[1])))
        .collect::<SmallVec<[f64; 20]>>();
    crate::stats::mean(&ranks)
}

/// Proxy for how common the letter pairs are, roughly in [0, 1]; low means a weird word
#[must_use]
pub fn bigram_probability(word: &str) -> f64 {
    if word.len() < 2 {
        return 0.0;
    }
    1.0 - mean_pair_rank(word) / 50.0
}

/// Proxy for how unusual the letter pairs are; high means a weird word
#[must_use]
pub fn edit_density(word: &str) -> f64 {
    if word.len() < 2 {
        return 0.0;
    }
    mean_pair_rank(word) / 25.0
}

// --- usage ---

/// Structural stand-in for corpus frequency: words near 5 letters and 3 bits of entropy score higher
#[must_use]
pub fn corpus_frequency_proxy(word: &str) -> f64 {
    let n = length(word);
    let e = entropy(word);
    1.0 / (1.0 + (n - 5.0).abs() + (e - 3.0).abs())
}

/// A dense table of all [`Metric`]s for a list of unique words
pub struct FeatureTable {
    words: Vec<String>,
    columns: Vec<Vec<f64>>,
    index: Map<Vec<u8>>,
    fingerprint: u64,
}

/// Compute every metric for every word
///
/// Returns the table and the feature names in column order.
///
/// # Errors
///
/// - [`Error::InvalidWord`] for words that are not 3 to 20 lowercase letters
/// - [`Error::DuplicateWord`] if a word appears more than once
pub fn build_feature_table<W>(
    words: &[W],
    oracle: Option<&dyn FrequencyOracle>,
) -> Result<(FeatureTable, Vec<&'static str>)>
where
    W: AsRef<str>,
{
    for word in words {
        validate_word(word.as_ref())?;
    }

    let columns = Metric::ALL
        .iter()
        .map(|metric| {
            words
                .iter()
                .map(|word| metric.compute(word.as_ref(), oracle))
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();

    let words = words
        .iter()
        .map(|w| w.as_ref().to_owned())
        .collect::<Vec<_>>();
    let table = FeatureTable::from_parts(words, columns)?;
    log::info!(
        "built feature table with {} words and {} features",
        table.len(),
        Metric::ALL.len()
    );

    Ok((table, table_feature_names()))
}

fn table_feature_names() -> Vec<&'static str> {
    Metric::ALL.iter().map(|m| m.name()).collect()
}

/// On-disk form of the table, the index is rebuilt on load
#[derive(Serialize, Deserialize)]
struct TableArtifact {
    fingerprint: u64,
    feature_names: Vec<Metric>,
    words: Vec<String>,
    columns: Vec<Vec<f64>>,
}

impl FeatureTable {
    fn from_parts(words: Vec<String>, columns: Vec<Vec<f64>>) -> Result<Self> {
        let index = build_index(words.as_slice())?;
        let fingerprint = fingerprint(&words, &columns);
        Ok(Self {
            words,
            columns,
            index,
            fingerprint,
        })
    }

    /// Number of rows
    #[must_use]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Returns true iff the table has no rows
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// The word label column
    #[must_use]
    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// The word in the given row
    ///
    /// # Panics
    ///
    /// Panics if the row is out of bounds
    #[must_use]
    pub fn word(&self, row: usize) -> &str {
        &self.words[row]
    }

    /// All values of one metric, in row order
    #[must_use]
    pub fn column(&self, metric: Metric) -> &[f64] {
        &self.columns[metric.column()]
    }

    /// A single value
    ///
    /// # Panics
    ///
    /// Panics if the row is out of bounds
    #[must_use]
    pub fn value(&self, row: usize, metric: Metric) -> f64 {
        self.columns[metric.column()][row]
    }

    /// The row of a word, if it is part of the table
    #[must_use]
    pub fn row_of(&self, word: &str) -> Option<usize> {
        self.index.get(word).and_then(|row| usize::try_from(row).ok())
    }

    /// The metrics that have a column in this table
    #[must_use]
    pub const fn metrics(&self) -> &'static [Metric] {
        &Metric::ALL
    }

    /// The metric names, in column order
    #[must_use]
    pub fn feature_names(&self) -> Vec<&'static str> {
        table_feature_names()
    }

    /// Content hash over words and values, stored with the cache artifact
    #[must_use]
    pub const fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    /// Write the table as a cache artifact, replacing any existing one atomically
    ///
    /// # Errors
    ///
    /// [`Error::Io`] or [`Error::Json`] if the artifact cannot be written
    pub fn save(&self, path: &Path) -> Result<()> {
        let artifact = TableArtifact {
            fingerprint: self.fingerprint,
            feature_names: Metric::ALL.to_vec(),
            words: self.words.clone(),
            columns: self.columns.clone(),
        };
        let bytes = serde_json::to_vec(&artifact)?;
        write_atomic(path, &bytes)?;
        log::info!(
            "saved feature table {:016x} to {}",
            self.fingerprint,
            path.display()
        );
        Ok(())
    }

    /// Load a cache artifact written by [`FeatureTable::save`]
    ///
    /// # Errors
    ///
    /// - [`Error::MissingFeatureTable`] if there is no artifact at `path`
    /// - [`Error::CorruptFeatureTable`] if it cannot be decoded or does not match its fingerprint
    /// - [`Error::Io`] if it cannot be read
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::MissingFeatureTable {
                    path: path.to_path_buf(),
                })
            }
            Err(e) => return Err(Error::io(path, e)),
        };

        let corrupt = |reason: String| Error::CorruptFeatureTable {
            path: path.to_path_buf(),
            reason,
        };

        let artifact = serde_json::from_slice::<TableArtifact>(&bytes)
            .map_err(|e| corrupt(e.to_string()))?;

        if artifact.feature_names != Metric::ALL {
            return Err(corrupt(String::from(
                "feature set differs, the table needs to be rebuilt",
            )));
        }
        if artifact.columns.len() != Metric::ALL.len()
            || artifact
                .columns
                .iter()
                .any(|c| c.len() != artifact.words.len())
        {
            return Err(corrupt(String::from("columns do not match the word list")));
        }

        let table = Self::from_parts(artifact.words, artifact.columns)
            .map_err(|e| corrupt(e.to_string()))?;
        if table.fingerprint != artifact.fingerprint {
            return Err(corrupt(format!(
                "fingerprint mismatch, expected {:016x} but content hashes to {:016x}",
                artifact.fingerprint, table.fingerprint
            )));
        }

        log::debug!(
            "loaded feature table {:016x} with {} words from {}",
            table.fingerprint,
            table.len(),
            path.display()
        );
        Ok(table)
    }
}

impl fmt::Debug for FeatureTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeatureTable")
            .field("rows", &self.words.len())
            .field("fingerprint", &format_args!("{:016x}", self.fingerprint))
            .finish()
    }
}

fn fingerprint(words: &[String], columns: &[Vec<f64>]) -> u64 {
    let mut hasher = fxhash::FxHasher64::default();
    for metric in Metric::ALL {
        hasher.write(metric.name().as_bytes());
        hasher.write_u8(0xff);
    }
    for word in words {
        hasher.write(word.as_bytes());
        hasher.write_u8(0xff);
    }
    for value in columns.iter().flatten() {
        hasher.write_u64(value.to_bits());
    }
    hasher.finish()
}
