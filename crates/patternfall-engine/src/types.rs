//! Letter primitives shared by the feature functions

/// A possible letter, can only be lowercase ASCII characters, i.e. [a-z]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Letter(u8);

impl Letter {
    /// Create a new letter
    ///
    /// Returns None if the letter is not in [a-zA-Z]
    #[must_use]
    pub const fn try_new(b: u8) -> Option<Self> {
        match b {
            b'a'..=b'z' => Some(Self(b - b'a')),
            b'A'..=b'Z' => Some(Self(b - b'A')),
            _ => None,
        }
    }

    /// Create a new letter
    ///
    /// # Panics
    /// Panics if the letter is not in [a-zA-Z]
    #[must_use]
    pub const fn new(b: u8) -> Self {
        match b {
            b'a'..=b'z' => Self(b - b'a'),
            b'A'..=b'Z' => Self(b - b'A'),
            _ => panic!("Invalid letter, only accept [a-zA-Z]"),
        }
    }

    /// The 0-based position of this letter in the alphabet
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Test if this letter is one of `a`, `e`, `i`, `o`, `u`
    #[must_use]
    pub const fn is_vowel(self) -> bool {
        VOWELS.contains(self)
    }
}

/// Iterate over the letters of a word, skipping everything that is not in [a-zA-Z]
pub fn letters(word: &str) -> impl Iterator<Item = Letter> + '_ {
    word.bytes().filter_map(Letter::try_new)
}

/// A set of letters
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(transparent)]
pub struct LetterSet(u32);

/// The vowels `a`, `e`, `i`, `o`, and `u`
pub const VOWELS: LetterSet = LetterSet::from_bytes(b"aeiou");

/// Letters that make a word look obscure to most players
pub const RARE: LetterSet = LetterSet::from_bytes(b"jqxzkv");

impl LetterSet {
    /// Create an empty set
    #[must_use]
    pub const fn new() -> Self {
        Self(0)
    }

    /// Create a set from a list of ASCII letters
    ///
    /// # Panics
    /// Panics if any byte is not in [a-zA-Z]
    #[must_use]
    pub const fn from_bytes(bytes: &[u8]) -> Self {
        let mut set = Self::new();
        let mut i = 0;
        while i < bytes.len() {
            set = set.add(Letter::new(bytes[i]));
            i += 1;
        }
        set
    }

    /// Collect the distinct letters of a word
    #[must_use]
    pub fn of(word: &str) -> Self {
        letters(word).fold(Self::new(), Self::add)
    }

    /// Test if a letter is contained in this set, O(1)
    #[must_use]
    pub const fn contains(self, letter: Letter) -> bool {
        (self.0 >> letter.0) & 1 == 1
    }

    /// Add a letter to this set, O(1)
    #[must_use]
    pub const fn add(self, letter: Letter) -> Self {
        Self(self.0 | (1 << letter.0))
    }

    /// Return the number of distinct letters in this set, O(1)
    #[must_use]
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Returns true iff the set is empty
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl Default for LetterSet {
    fn default() -> Self {
        Self::new()
    }
}

/// Occurrence count of every letter in a single word
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LetterCounts {
    counts: [u8; 26],
    total: usize,
}

impl LetterCounts {
    /// Count the letters of a word, ignoring anything not in [a-zA-Z]
    #[must_use]
    pub fn of(word: &str) -> Self {
        let mut counts = [0_u8; 26];
        let mut total = 0;
        for letter in letters(word) {
            counts[letter.index()] = counts[letter.index()].saturating_add(1);
            total += 1;
        }
        Self { counts, total }
    }

    /// The number of counted letters
    #[must_use]
    pub const fn total(&self) -> usize {
        self.total
    }

    /// The count of the most frequent letter, 0 for an empty word
    #[must_use]
    pub fn max(&self) -> u8 {
        self.counts.iter().copied().max().unwrap_or_default()
    }

    /// Iterate over all non-zero counts in alphabetical order
    pub fn non_zero(&self) -> impl Iterator<Item = u8> + '_ {
        self.counts.iter().copied().filter(|&c| c > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letter_try_new() {
        assert_eq!(Letter::try_new(b'a'), Some(Letter(0)));
        assert_eq!(Letter::try_new(b'z'), Some(Letter(25)));
        assert_eq!(Letter::try_new(b'A'), Some(Letter(0)));
        assert_eq!(Letter::try_new(b'Z'), Some(Letter(25)));
        assert_eq!(Letter::try_new(b' '), None);
        assert_eq!(Letter::try_new(b'0'), None);
        assert_eq!(Letter::try_new(b'-'), None);
        assert_eq!(Letter::try_new(b'\''), None);
    }

    #[test]
    #[should_panic(expected = "Invalid letter, only accept [a-zA-Z]")]
    const fn test_letter_new_invalid() {
        let _ = Letter::new(b' ');
    }

    #[test]
    fn test_vowels() {
        let vowels = letters("abcdefghijklmnopqrstuvwxyz")
            .filter(|l| l.is_vowel())
            .collect::<Vec<_>>();
        assert_eq!(vowels, letters("AEIOU").collect::<Vec<_>>());
    }

    #[test]
    fn test_set_len() {
        assert_eq!(LetterSet::new().len(), 0);
        assert!(LetterSet::new().is_empty());
        assert_eq!(LetterSet::of("kayak").len(), 3);
        assert_eq!(LetterSet::of("Kayak").len(), 3);
        assert_eq!(LetterSet::of("abcdefghijklmnopqrstuvwxyz").len(), 26);
    }

    #[test]
    fn test_rare() {
        assert!(RARE.contains(Letter::new(b'q')));
        assert!(RARE.contains(Letter::new(b'k')));
        assert!(!RARE.contains(Letter::new(b'e')));
        assert_eq!(RARE.len(), 6);
    }

    #[test]
    fn test_counts() {
        let counts = LetterCounts::of("mississippi");
        assert_eq!(counts.total(), 11);
        assert_eq!(counts.max(), 4);
        // i, m, p, s in alphabetical order
        assert_eq!(counts.non_zero().collect::<Vec<_>>(), vec![4, 1, 2, 4]);
    }

    #[test]
    fn test_counts_empty() {
        let counts = LetterCounts::of("");
        assert_eq!(counts.total(), 0);
        assert_eq!(counts.max(), 0);
        assert_eq!(counts.non_zero().count(), 0);
    }
}
