//! Files kept in the data directory.

use crate::{
    engine::PuzzlePayload,
    error::{Error, Result},
    history::HistoryLog,
};
use chrono::NaiveDate;
use std::{
    io::Write,
    path::{Path, PathBuf},
};
use tempfile::NamedTempFile;

/// Cache artifact of the feature table
pub const FEATURE_TABLE_FILE: &str = "feature_table.json";
/// Log of published daily puzzles
pub const HISTORY_FILE: &str = "used_patterns.jsonl";
/// The current daily puzzle
pub const TODAY_FILE: &str = "today.json";

/// Replace the file at `path` with `bytes`, readers see either the old or the new content
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;

    let mut file = NamedTempFile::new_in(dir).map_err(|e| Error::io(dir, e))?;
    file.write_all(bytes).map_err(|e| Error::io(file.path(), e))?;
    let _ = file.persist(path).map_err(|e| Error::io(path, e.error))?;
    Ok(())
}

/// The data directory with the table cache, the history log and the current puzzle
#[derive(Clone, Debug)]
pub struct Store {
    dir: PathBuf,
}

impl Store {
    /// A store in `dir`, the directory is created on the first write
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The data directory
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where the feature table is cached
    #[must_use]
    pub fn feature_table_path(&self) -> PathBuf {
        self.dir.join(FEATURE_TABLE_FILE)
    }

    /// Where today's puzzle is kept
    #[must_use]
    pub fn today_path(&self) -> PathBuf {
        self.dir.join(TODAY_FILE)
    }

    /// The history log
    #[must_use]
    pub fn history(&self) -> HistoryLog {
        HistoryLog::new(self.dir.join(HISTORY_FILE))
    }

    /// Remove the stored puzzle, a missing record is fine
    pub fn discard_today(&self) {
        let path = self.today_path();
        match std::fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => log::warn!("could not remove {}: {e}", path.display()),
        }
    }

    /// The stored puzzle, if it was published for `today`.
    ///
    /// A missing, unreadable or outdated record is `None`.
    #[must_use]
    pub fn load_today(&self, today: NaiveDate) -> Option<PuzzlePayload> {
        let path = self.today_path();
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                log::warn!("could not read {}: {e}", path.display());
                return None;
            }
        };

        match serde_json::from_slice::<PuzzlePayload>(&bytes) {
            Ok(payload) if payload.date == Some(today) => Some(payload),
            Ok(payload) => {
                log::debug!(
                    "stored puzzle is from {}, not {today}",
                    payload
                        .date
                        .map_or_else(|| String::from("an unknown day"), |d| d.to_string())
                );
                None
            }
            Err(e) => {
                log::warn!("ignoring unreadable {}: {e}", path.display());
                None
            }
        }
    }

    /// Replace the stored puzzle
    ///
    /// # Errors
    ///
    /// [`Error::Io`] or [`Error::Json`] if the record cannot be written
    pub fn save_today(&self, payload: &PuzzlePayload) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(payload)?;
        write_atomic(&self.today_path(), &bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{features::Metric, patterns::TemplateId, scoring::Difficulty};

    fn payload(date: Option<NaiveDate>) -> PuzzlePayload {
        PuzzlePayload {
            words: vec![String::from("kayak"), String::from("civic")],
            rule: String::from("Words with lowest length"),
            hints: [
                String::from("one"),
                String::from("two"),
                String::from("three"),
            ],
            difficulty: Difficulty::Medium,
            metric: Metric::Length,
            template_id: TemplateId::ExtremeOutliers,
            pqs: 1.62,
            date,
        }
    }

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_write_atomic_replaces() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("file.json");
        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"second");
        assert_eq!(std::fs::read_dir(path.parent().unwrap()).unwrap().count(), 1);
    }

    #[test]
    fn test_today_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path());
        let today = day("2024-05-17");

        assert_eq!(store.load_today(today), None);
        store.save_today(&payload(Some(today))).unwrap();
        assert_eq!(store.load_today(today), Some(payload(Some(today))));
    }

    #[test]
    fn test_stale_today_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path());
        store.save_today(&payload(Some(day("2024-05-16")))).unwrap();
        assert_eq!(store.load_today(day("2024-05-17")), None);

        store.save_today(&payload(None)).unwrap();
        assert_eq!(store.load_today(day("2024-05-17")), None);
    }

    #[test]
    fn test_garbage_today_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path());
        std::fs::write(store.today_path(), b"[1, 2, 3]").unwrap();
        assert_eq!(store.load_today(day("2024-05-17")), None);
    }

    #[test]
    fn test_paths() {
        let store = Store::new("data");
        assert_eq!(store.feature_table_path(), Path::new("data/feature_table.json"));
        assert_eq!(store.today_path(), Path::new("data/today.json"));
        assert_eq!(store.history().path(), Path::new("data/used_patterns.jsonl"));
    }
}
