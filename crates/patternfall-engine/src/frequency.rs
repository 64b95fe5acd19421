//! Corpus frequency lookups that feed the `corpus_frequency` column

use crate::error::{Error, Result};
use fst::Map;
use std::{
    collections::HashMap,
    fmt,
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

/// Maps a lowercase word to how common it is in real usage, in [0, 1].
///
/// A word without an entry has a frequency of `0.0`.
pub trait FrequencyOracle {
    /// The normalized frequency of `word`
    fn frequency(&self, word: &str) -> f64;
}

impl FrequencyOracle for HashMap<String, f64> {
    fn frequency(&self, word: &str) -> f64 {
        self.get(word).copied().unwrap_or_default()
    }
}

impl<T: FrequencyOracle + ?Sized> FrequencyOracle for &T {
    fn frequency(&self, word: &str) -> f64 {
        (**self).frequency(word)
    }
}

/// Log-scaled word frequencies from a word count corpus, stored in an FST.
///
/// Values are kept as the bit pattern of the `f64`, so lookups return exactly what was computed.
pub struct CorpusFrequency {
    map: Map<Vec<u8>>,
}

impl CorpusFrequency {
    /// Normalize raw word counts so that the most common word has a frequency of 1.0
    ///
    /// Words are lowercased, non-alphabetic words are dropped, the last count of a duplicate
    /// word wins.
    ///
    /// # Errors
    ///
    /// [`Error::DuplicateWord`] if the index could not be built
    pub fn from_counts<I, W>(counts: I) -> Result<Self>
    where
        I: IntoIterator<Item = (W, u64)>,
        W: AsRef<str>,
    {
        let mut raw = HashMap::<String, u64>::new();
        for (word, count) in counts {
            let word = word.as_ref().trim();
            if word.is_empty() || !word.bytes().all(|b| b.is_ascii_alphabetic()) {
                continue;
            }
            let _ = raw.insert(word.to_ascii_lowercase(), count);
        }

        let max_count = raw.values().copied().max().unwrap_or_default();

        // counts are far below 2^53, the conversion is exact enough for a log scale
        #[allow(clippy::cast_precision_loss)]
        let scale = |count: u64| 1.0 + (count as f64 + 1.0).log10();
        let denominator = scale(max_count);

        let mut entries = raw
            .into_iter()
            .map(|(word, count)| (word, (scale(count) / denominator).to_bits()))
            .collect::<Vec<_>>();
        entries.sort_unstable();

        let map = Map::from_iter(entries).map_err(Error::DuplicateWord)?;
        Ok(Self { map })
    }

    /// Load a `word<TAB>count` file, e.g. `count_1w.txt` from the Google web corpus
    ///
    /// Blank lines, `#` comments, lines that are not valid UTF-8 and lines that don't parse
    /// are skipped.
    ///
    /// # Errors
    ///
    /// [`Error::Io`] if the file cannot be read
    pub fn load(file: &Path) -> Result<Self> {
        let lines = BufReader::new(File::open(file).map_err(|e| Error::io(file, e))?);
        let mut counts = Vec::with_capacity(1 << 16);
        let valid_lines = lines
            .split(b'\n')
            .map_while(std::result::Result::ok)
            .filter_map(|line| String::from_utf8(line).ok());
        for line in valid_lines {
            if let Some((word, count)) = parse_count_line(&line) {
                counts.push((word.to_owned(), count));
            }
        }
        let corpus = Self::from_counts(counts)?;
        log::info!(
            "loaded corpus frequency for {} words from {}",
            corpus.len(),
            file.display()
        );
        Ok(corpus)
    }

    /// Number of words with a known frequency
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns true iff no word has a known frequency
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl FrequencyOracle for CorpusFrequency {
    fn frequency(&self, word: &str) -> f64 {
        self.map.get(word).map_or(0.0, f64::from_bits)
    }
}

impl fmt::Debug for CorpusFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CorpusFrequency")
            .field("words", &self.map.len())
            .finish()
    }
}

fn parse_count_line(line: &str) -> Option<(&str, u64)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let mut fields = line.split('\t');
    let (word, count) = (fields.next()?, fields.next()?);
    if fields.next().is_some() {
        return None;
    }
    Some((word.trim(), count.trim().parse().ok()?))
}
