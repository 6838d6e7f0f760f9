use crate::error::{Error, Result};

/// Default cap on the number of levels a node can occupy.
pub const SKIPLIST_MAXLEVEL: usize = 32;

/// Default chance that a node is promoted one more level.
pub const SKIPLIST_P: f64 = 0.25;

/// Hard ceiling for `Config::max_level`.
pub const MAX_LEVEL_LIMIT: usize = 64;

/// Tuning knobs for a `SortedSet`.
///
/// ```
/// use convenient_zset::{Config, SortedSet};
///
/// let config = Config::default().with_max_level(16).with_seed(7);
/// let zset = SortedSet::with_config(config).unwrap();
/// assert!(zset.is_empty());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    pub max_level: usize,
    pub probability: f64,
    /// `None` seeds the level generator from OS entropy.
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_level: SKIPLIST_MAXLEVEL,
            probability: SKIPLIST_P,
            seed: None,
        }
    }
}

impl Config {
    pub fn with_max_level(mut self, max_level: usize) -> Self {
        self.max_level = max_level;
        self
    }

    pub fn with_probability(mut self, probability: f64) -> Self {
        self.probability = probability;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_level == 0 || self.max_level > MAX_LEVEL_LIMIT {
            return Err(Error::InvalidMaxLevel(self.max_level));
        }
        // Written so that NaN fails too.
        if !(self.probability >= 0.0 && self.probability < 1.0) {
            return Err(Error::InvalidProbability(self.probability));
        }
        Ok(())
    }
}
