//! The engine handle that ties the table, the templates and the history together.

use crate::{
    error::Result,
    features::{build_feature_table, FeatureTable, Metric},
    frequency::FrequencyOracle,
    hints::generate_hints,
    history::UsedPattern,
    patterns::{run_all_templates, TemplateId},
    scoring::{filter_and_rank, Difficulty, RankParams, Ranked},
    selector::{select_daily, select_random, SelectionPolicy},
    store::Store,
};
use chrono::{NaiveDate, Utc};
use parking_lot::Mutex;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, sync::Arc};

/// Default location of the data directory
pub const DEFAULT_DATA_DIR: &str = "data";

/// Settings for an [`Engine`]
#[derive(Clone, Debug, PartialEq)]
pub struct EngineConfig {
    /// Where the table cache, the history and today's puzzle are kept
    pub data_dir: PathBuf,
    /// Filter applied to the generated candidates
    pub rank: RankParams,
    /// Reuse limits for the daily puzzle
    pub policy: SelectionPolicy,
    /// Every template family contributes at most this many candidates
    pub max_per_template: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            rank: RankParams::default(),
            policy: SelectionPolicy::default(),
            max_per_template: 40,
        }
    }
}

/// A puzzle as it is handed out to players.
///
/// `rule` is the answer and should only be shown once the player gives up or solves it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PuzzlePayload {
    /// The words of the puzzle
    pub words: Vec<String>,
    /// The hidden rule
    pub rule: String,
    /// Hints, from vague to specific
    pub hints: [String; 3],
    /// How hard the puzzle is expected to be
    pub difficulty: Difficulty,
    /// The primary metric of the rule
    pub metric: Metric,
    /// The template that found the pattern
    pub template_id: TemplateId,
    /// Quality score, rounded to two decimals
    pub pqs: f64,
    /// The day this puzzle was published for, `None` for practice puzzles
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

impl PuzzlePayload {
    /// The payload for a ranked candidate
    #[must_use]
    pub fn new(ranked: &Ranked, date: Option<NaiveDate>) -> Self {
        let pattern = &ranked.candidate;
        Self {
            words: pattern.words.clone(),
            rule: pattern.rule.clone(),
            hints: generate_hints(pattern),
            difficulty: Difficulty::from_pqs(ranked.pqs),
            metric: pattern.metric_a,
            template_id: pattern.template,
            pqs: (ranked.pqs * 100.0).round() / 100.0,
            date,
        }
    }
}

/// The current day in UTC
#[must_use]
pub fn today() -> NaiveDate {
    Utc::now().naive_utc().date()
}

/// Generates and stores puzzles.
///
/// The feature table is loaded from the data directory on first use and kept in memory.
/// Daily generation is serialized through the engine, so that concurrent calls append to the
/// history at most once per day.
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    store: Store,
    table: Mutex<Option<Arc<FeatureTable>>>,
    daily: Mutex<()>,
}

impl Engine {
    /// An engine over `config.data_dir`. Nothing is read until it is needed.
    #[must_use]
    pub fn open(config: EngineConfig) -> Self {
        let store = Store::new(config.data_dir.clone());
        Self {
            config,
            store,
            table: Mutex::new(None),
            daily: Mutex::new(()),
        }
    }

    /// The settings of this engine
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The data directory
    #[must_use]
    pub const fn store(&self) -> &Store {
        &self.store
    }

    /// The feature table, loaded from the cache on first use
    ///
    /// # Errors
    ///
    /// [`Error::MissingFeatureTable`](crate::Error::MissingFeatureTable) if no table has been
    /// built yet, other errors if the cache cannot be read
    pub fn table(&self) -> Result<Arc<FeatureTable>> {
        let mut table = self.table.lock();
        if let Some(table) = table.as_ref() {
            return Ok(Arc::clone(table));
        }
        let loaded = Arc::new(FeatureTable::load(&self.store.feature_table_path())?);
        *table = Some(Arc::clone(&loaded));
        Ok(loaded)
    }

    /// Build the feature table from `words`, save it, and use it from now on
    ///
    /// # Errors
    ///
    /// If a word is invalid or the table cannot be saved
    pub fn rebuild_table<W>(
        &self,
        words: &[W],
        oracle: Option<&dyn FrequencyOracle>,
    ) -> Result<Arc<FeatureTable>>
    where
        W: AsRef<str>,
    {
        let (table, _) = build_feature_table(words, oracle)?;
        table.save(&self.store.feature_table_path())?;
        let table = Arc::new(table);
        *self.table.lock() = Some(Arc::clone(&table));
        Ok(table)
    }

    /// Every candidate that passes the quality filter, best first
    ///
    /// # Errors
    ///
    /// If the feature table cannot be loaded
    pub fn ranked_candidates(&self) -> Result<Vec<Ranked>> {
        let table = self.table()?;
        Ok(self.rank(&table))
    }

    fn rank(&self, table: &FeatureTable) -> Vec<Ranked> {
        let candidates = run_all_templates(table, table.metrics(), self.config.max_per_template);
        filter_and_rank(candidates, table, &self.config.rank)
    }

    /// The daily puzzle for the current UTC day, see [`Engine::generate_daily_on`]
    ///
    /// # Errors
    ///
    /// See [`Engine::generate_daily_on`]
    pub fn generate_daily(&self) -> Result<Option<PuzzlePayload>> {
        self.generate_daily_on(today())
    }

    /// The daily puzzle for `date`.
    ///
    /// If a puzzle has already been stored for `date`, it is returned as is. Otherwise a new
    /// one is selected, stored as today's puzzle and appended to the history. Either both
    /// writes happen or neither does. Returns `None` if no candidate is eligible.
    ///
    /// # Errors
    ///
    /// [`Error::MissingFeatureTable`](crate::Error::MissingFeatureTable) if no table has been
    /// built yet, [`Error::Io`](crate::Error::Io) if the puzzle cannot be stored
    pub fn generate_daily_on(&self, date: NaiveDate) -> Result<Option<PuzzlePayload>> {
        let _guard = self.daily.lock();

        if let Some(stored) = self.store.load_today(date) {
            log::debug!("reusing the stored puzzle for {date}");
            return Ok(Some(stored));
        }

        let table = self.table()?;
        let ranked = self.rank(&table);
        let history = self.store.history();
        let records = history.read();

        let pick = match select_daily(&ranked, &records, date, &self.config.policy) {
            Some(pick) => pick,
            None => {
                log::warn!(
                    "no eligible candidate for {date} out of {} ranked",
                    ranked.len()
                );
                return Ok(None);
            }
        };

        let payload = PuzzlePayload::new(pick, Some(date));
        self.store.save_today(&payload)?;
        if let Err(e) = history.append(&UsedPattern::of(pick, date)) {
            self.store.discard_today();
            return Err(e);
        }
        Ok(Some(payload))
    }

    /// A practice puzzle from the whole ranked pool, see [`Engine::generate_random_puzzle_with`]
    ///
    /// # Errors
    ///
    /// If the feature table cannot be loaded
    pub fn generate_random_puzzle(&self) -> Result<Option<PuzzlePayload>> {
        self.generate_random_puzzle_with(&mut rand::thread_rng())
    }

    /// A practice puzzle chosen with `rng`. Recently used rules are allowed and nothing is
    /// written.
    ///
    /// # Errors
    ///
    /// If the feature table cannot be loaded
    pub fn generate_random_puzzle_with<R>(&self, rng: &mut R) -> Result<Option<PuzzlePayload>>
    where
        R: Rng + ?Sized,
    {
        let table = self.table()?;
        let ranked = self.rank(&table);
        Ok(select_random(&ranked, rng).map(|pick| PuzzlePayload::new(pick, None)))
    }

    /// The stored puzzle for the current UTC day
    #[must_use]
    pub fn load_today(&self) -> Option<PuzzlePayload> {
        self.load_today_on(today())
    }

    /// The stored puzzle for `date`, nothing is generated
    #[must_use]
    pub fn load_today_on(&self, date: NaiveDate) -> Option<PuzzlePayload> {
        self.store.load_today(date)
    }
}
