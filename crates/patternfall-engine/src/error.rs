//! Errors that are surfaced to callers of the engine

use std::path::PathBuf;
use thiserror::Error;

/// A specialized [`Result`](std::result::Result) for engine operations
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Everything that can go wrong while building tables or generating puzzles.
///
/// Running out of candidates is not an error, generation returns `Ok(None)` instead.
#[derive(Error, Debug)]
pub enum Error {
    /// The cached feature table has not been built yet
    #[error("feature table not found at '{}', rebuild it with `patternfall build`", path.display())]
    MissingFeatureTable {
        /// Where the table was expected
        path: PathBuf,
    },

    /// The cached feature table exists but cannot be used
    #[error("feature table at '{}' is corrupt: {reason}", path.display())]
    CorruptFeatureTable {
        /// Location of the artifact
        path: PathBuf,
        /// What is wrong with it
        reason: String,
    },

    /// A word outside of the supported domain was given to the table builder
    #[error("invalid word '{0}', words must be 3 to 20 letters in [a-z]")]
    InvalidWord(String),

    /// A word was given twice to an index
    #[error("duplicate word in the index input")]
    DuplicateWord(#[source] fst::Error),

    /// Reading or writing an artifact failed
    #[error("i/o failure on '{}'", path.display())]
    Io {
        /// The file being accessed
        path: PathBuf,
        /// The underlying error
        #[source]
        source: std::io::Error,
    },

    /// An artifact could not be encoded
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
