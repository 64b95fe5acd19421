/*!
An engine for daily "spot the hidden rule" word puzzles.

Every word of a word list is described by a set of lexical [`Metric`]s, stored in a
[`FeatureTable`]. Pattern templates look for small groups of words that are extreme in one of
those metrics, every group is scored by its Pattern Quality Score, and the best one that has not
been used recently becomes the puzzle of the day. Players see the words and up to three hints and
have to find the rule.

The [`Engine`] is the handle that owns the data directory with the cached table, the history of
published puzzles and the current daily puzzle.

# Example

```rust
use patternfall_engine::{build_feature_table, Engine, EngineConfig, Error, Metric};

# fn main() -> Result<(), Box<dyn std::error::Error>> {
let words = ["kayak", "level", "civic", "radar", "zebra", "quilt"];

// Compute all metrics for all words
let (table, names) = build_feature_table(&words, None)?;
assert_eq!(names.len(), Metric::ALL.len());
assert_eq!(names[0], "length");

let zebra = table.row_of("zebra").unwrap();
assert_eq!(table.value(zebra, Metric::Length), 5.0);
assert_eq!(table.value(zebra, Metric::UniqueLetters), 5.0);

// An engine over an empty data directory has no table to work with
let dir = tempfile::tempdir()?;
let engine = Engine::open(EngineConfig {
    data_dir: dir.path().to_path_buf(),
    ..EngineConfig::default()
});
assert!(matches!(
    engine.generate_daily(),
    Err(Error::MissingFeatureTable { .. })
));

// After building the table, generation runs, but six words are too few for any pattern
let _ = engine.rebuild_table(&words, None)?;
assert_eq!(engine.generate_daily()?, None);
assert_eq!(engine.load_today(), None);
# Ok(())
# }
```
*/

#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![warn(
    bad_style,
    dead_code,
    improper_ctypes,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    no_mangle_generic_items,
    non_shorthand_field_patterns,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    rust_2018_idioms,
    trivial_casts,
    trivial_numeric_casts,
    unconditional_recursion,
    unsafe_code,
    unused_allocation,
    unused_comparisons,
    unused_crate_dependencies,
    unused_extern_crates,
    unused_import_braces,
    unused_parens,
    unused_qualifications,
    unused_results,
    unused,
    while_true
)]

pub mod engine;
pub mod error;
pub mod features;
pub mod frequency;
pub mod hints;
pub mod history;
pub mod patterns;
pub mod prepare;
pub mod scoring;
pub mod selector;
pub mod stats;
pub mod store;
pub mod types;

pub use engine::{Engine, EngineConfig, PuzzlePayload};
pub use error::{Error, Result};
pub use features::{build_feature_table, FeatureTable, Metric};
pub use frequency::{CorpusFrequency, FrequencyOracle};
pub use patterns::{CandidatePattern, TemplateId};
pub use scoring::{Difficulty, RankParams, Ranked};
pub use selector::SelectionPolicy;

#[cfg(test)]
pub(crate) mod testing {
    use crate::{features::FeatureTable, prepare::clean_word_list};
    use rand::{rngs::StdRng, Rng, SeedableRng};

    const CONSONANTS: &[u8] = b"bcdfghjklmnpqrstvwxyz";
    const VOWELS: &[u8] = b"aeiou";

    /// About 1200 pronounceable-ish words of 3 to 14 letters, the same for every call
    pub(crate) fn sample_words() -> Vec<String> {
        let mut rng = StdRng::seed_from_u64(0x2545_f491_4f6c_dd1d);
        let words = (0..1200).map(|_| {
            let len = rng.gen_range(3..=14);
            (0..len)
                .map(|_| {
                    let letters = if rng.gen_bool(0.4) { VOWELS } else { CONSONANTS };
                    char::from(letters[rng.gen_range(0..letters.len())])
                })
                .collect::<String>()
        });
        clean_word_list(words.collect::<Vec<_>>())
    }

    pub(crate) fn sample_table() -> FeatureTable {
        crate::features::build_feature_table(&sample_words(), None)
            .unwrap()
            .0
    }
}
