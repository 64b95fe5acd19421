//! Various methods to prepare a raw word list into the universe of candidate words

use crate::error::{Error, Result};
use fst::Map;
use std::{
    collections::HashSet,
    fs::File,
    io::{BufRead, BufReader},
    ops::RangeInclusive,
    path::Path,
};

/// Accepted word lengths, inclusive
pub const WORD_LENGTH: RangeInclusive<usize> = 3..=20;

/// Where most unix systems keep their dictionary
pub const DEFAULT_WORD_LIST: &str = "/usr/share/dict/words";

fn valid_word(word: &str) -> bool {
    WORD_LENGTH.contains(&word.len()) && word.bytes().all(|b| b.is_ascii_lowercase())
}

/// Reject a word that the feature functions are not defined for
///
/// # Errors
///
/// [`Error::InvalidWord`] unless the word has 3 to 20 lowercase ASCII letters
pub fn validate_word(word: &str) -> Result<()> {
    if valid_word(word) {
        Ok(())
    } else {
        Err(Error::InvalidWord(word.to_owned()))
    }
}

/// Clean a word list by lowercasing, removing all words that are not alphabetic or of the wrong
/// length, and removing duplicates. The first occurrence of a word determines its position.
pub fn clean_word_list<I>(words: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut seen = HashSet::with_capacity(1024);
    let mut cleaned = Vec::with_capacity(1024);

    for word in words {
        let word = word.as_ref().trim();
        // cheap check before allocating, non-ascii words are never valid
        if word.is_empty() || !word.is_ascii() {
            continue;
        }
        let word = word.to_ascii_lowercase();
        if valid_word(&word) && seen.insert(word.clone()) {
            cleaned.push(word);
        }
    }

    cleaned
}

/// Load a word list file with one word per line and clean it
///
/// Lines that are not valid UTF-8 are skipped.
///
/// # Errors
///
/// [`Error::Io`] if the file cannot be opened
pub fn load_word_list(file: &Path) -> Result<Vec<String>> {
    let lines = BufReader::new(File::open(file).map_err(|e| Error::io(file, e))?);
    let words = clean_word_list(
        lines
            .split(b'\n')
            .map_while(std::result::Result::ok)
            .filter_map(|line| String::from_utf8(line).ok()),
    );
    log::debug!("loaded {} words from {}", words.len(), file.display());
    Ok(words)
}

/// Build an FST that maps every word to its row in the given list
///
/// # Errors
///
/// [`Error::DuplicateWord`] if the words contain duplicates
pub fn build_index<W>(words: &[W]) -> Result<Map<Vec<u8>>>
where
    W: AsRef<str>,
{
    let mut entries = words
        .iter()
        .enumerate()
        .map(|(row, word)| (word.as_ref(), row as u64))
        .collect::<Vec<_>>();
    entries.sort_unstable();
    Map::from_iter(entries).map_err(Error::DuplicateWord)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_clean_word_list() {
        let words = clean_word_list([
            "Kayak", "level", "it", "don't", "level", "café", "  radar ", "", "KAYAK",
            "abcdefghijklmnopqrstu",
        ]);
        assert_eq!(words, vec!["kayak", "level", "radar"]);
    }

    #[test]
    fn test_clean_keeps_bounds() {
        let words = clean_word_list(["abc", "abcdefghijklmnopqrst"]);
        assert_eq!(words.len(), 2);
    }

    #[test]
    fn test_validate_word() {
        assert!(validate_word("civic").is_ok());
        assert!(matches!(validate_word("ox"), Err(Error::InvalidWord(w)) if w == "ox"));
        assert!(validate_word("Civic").is_err());
        assert!(validate_word("co-op").is_err());
    }

    #[test]
    fn test_load_word_list() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"zebra\nQuilt\n\xff\xfe\nzebra\nab\n").unwrap();

        let words = load_word_list(file.path()).unwrap();
        assert_eq!(words, vec!["zebra", "quilt"]);
    }

    #[test]
    fn test_load_missing_word_list() {
        let err = load_word_list(Path::new("/does/not/exist")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn test_build_index() {
        let index = build_index(&["zebra", "kayak", "quilt"]).unwrap();
        assert_eq!(index.get("zebra"), Some(0));
        assert_eq!(index.get("kayak"), Some(1));
        assert_eq!(index.get("quilt"), Some(2));
        assert_eq!(index.get("level"), None);
    }

    #[test]
    fn test_build_index_duplicates() {
        let err = build_index(&["kayak", "kayak"]).unwrap_err();
        assert!(matches!(err, Error::DuplicateWord(_)));
    }
}
