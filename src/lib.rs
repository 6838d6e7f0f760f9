//! A sorted set of unique string members, each carrying an `f64` score.
//!
//! Entries are ordered by `(score, member)`: equal scores fall back to the
//! member order (byte-wise by default). A rank-augmented skiplist answers
//! ordering and positional queries in O(log n), while a hash index answers
//! score lookups in O(1).
//!
//! ```
//! use convenient_zset::SortedSet;
//!
//! let mut board = SortedSet::new();
//! board.add("alice", 30.0).unwrap();
//! board.add("bob", 10.0).unwrap();
//! board.add("carol", 20.0).unwrap();
//!
//! assert_eq!(board.rank("alice", true), Some(0));
//! assert_eq!(board.get_by_rank(0, false), Some(("bob", 10.0)));
//! assert_eq!(
//!     board.range_by_score(15.0, 30.0, 0, -1),
//!     vec![("carol", 20.0), ("alice", 30.0)]
//! );
//! ```
//!
//! The structure does no locking of its own. Share it across threads behind a
//! `Mutex` or `RwLock`.
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::convert::TryFrom;
use std::fmt;
use tracing::debug;

mod comparator;
mod config;
mod error;
mod iter;
mod level;
mod skiplist;

pub use crate::comparator::{Comparator, Lexicographic};
pub use crate::config::{Config, MAX_LEVEL_LIMIT, SKIPLIST_MAXLEVEL, SKIPLIST_P};
pub use crate::error::{Error, Result};
pub use crate::iter::{Iter, IterRangeWith, RangeHint};

use crate::level::LevelGenerator;
use crate::skiplist::SkipList;

/// Sorted set backed by a skiplist plus a member → score index.
///
/// `C` breaks ties between equal scores, `R` drives the random node levels.
pub struct SortedSet<C = Lexicographic, R = StdRng> {
    index: HashMap<String, f64>,
    list: SkipList<C, R>,
}

impl SortedSet {
    /// Empty set with the default `Config`, seeded from OS entropy.
    pub fn new() -> Self {
        SortedSet::build(Config::default(), Lexicographic, StdRng::from_entropy())
    }

    /// Empty set whose skiplist shape is reproducible for a given `seed`.
    pub fn with_seed(seed: u64) -> Self {
        SortedSet::build(
            Config::default().with_seed(seed),
            Lexicographic,
            StdRng::seed_from_u64(seed),
        )
    }

    pub fn with_config(config: Config) -> Result<Self> {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        config.validate()?;
        Ok(SortedSet::build(config, Lexicographic, rng))
    }
}

impl Default for SortedSet {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Comparator, R: Rng> SortedSet<C, R> {
    /// Empty set with an injected comparator and random source.
    ///
    /// `rng` is used as given, so `config.seed` must be `None`. Seed the
    /// random source itself instead.
    pub fn from_parts(config: Config, comparator: C, rng: R) -> Result<Self> {
        config.validate()?;
        if let Some(seed) = config.seed {
            return Err(Error::SeedWithInjectedRng(seed));
        }
        Ok(SortedSet::build(config, comparator, rng))
    }

    fn build(config: Config, comparator: C, rng: R) -> Self {
        let levels = LevelGenerator::new(rng, config.probability, config.max_level);
        SortedSet {
            index: HashMap::new(),
            list: SkipList::new(comparator, levels),
        }
    }

    /// Adds `member` with `score`, or moves it to `score` if already present.
    ///
    /// Returns `Ok(true)` only when `member` is new. An existing member yields
    /// `Ok(false)` whether or not its score changed. NaN scores are rejected
    /// and leave the set untouched.
    pub fn add(&mut self, member: impl Into<String>, score: f64) -> Result<bool> {
        let member = member.into();
        if score.is_nan() {
            debug!(member = %member, "rejecting NaN score");
            return Err(Error::NanScore { member });
        }
        match self.index.get_mut(&member) {
            Some(current) if *current == score => Ok(false),
            Some(current) => {
                let old = std::mem::replace(current, score);
                debug!(member = %member, old, new = score, "moving member");
                let deleted = self.list.delete(old, &member);
                if !deleted {
                    debug!(member = %member, old, "member indexed but missing from skiplist");
                }
                debug_assert!(deleted, "index and skiplist disagree on {:?}", member);
                self.list.insert(score, member);
                Ok(false)
            }
            None => {
                self.list.insert(score, member.clone());
                self.index.insert(member, score);
                Ok(true)
            }
        }
    }

    /// Removes `member`, returning whether it was present.
    pub fn remove(&mut self, member: &str) -> bool {
        match self.index.remove(member) {
            Some(score) => {
                let deleted = self.list.delete(score, member);
                if !deleted {
                    debug!(member = %member, score, "member indexed but missing from skiplist");
                }
                debug_assert!(deleted, "index and skiplist disagree on {:?}", member);
                true
            }
            None => false,
        }
    }

    #[inline]
    pub fn score(&self, member: &str) -> Option<f64> {
        self.index.get(member).copied()
    }

    #[inline]
    pub fn contains(&self, member: &str) -> bool {
        self.index.contains_key(member)
    }

    /// 0-based position of `member`. With `reverse`, the highest score is
    /// rank 0.
    pub fn rank(&self, member: &str, reverse: bool) -> Option<usize> {
        let score = self.score(member)?;
        let rank = match self.list.rank(score, member) {
            0 => return None,
            rank => rank - 1,
        };
        if reverse {
            Some(self.len() - rank - 1)
        } else {
            Some(rank)
        }
    }

    /// Entry at the 0-based `rank`. Negative ranks and ranks past the end
    /// give `None`.
    pub fn get_by_rank(&self, rank: isize, reverse: bool) -> Option<(&str, f64)> {
        let len = self.len();
        let rank = usize::try_from(rank).ok().filter(|&rank| rank < len)?;
        let rank = if reverse { len - 1 - rank } else { rank };
        self.list
            .element_by_rank(rank + 1)
            .map(|node| (node.member.as_str(), node.score))
    }

    /// Entries with `min <= score <= max` in ascending order.
    ///
    /// The first `offset` entries of the range are skipped (negative counts as
    /// 0), then at most `count` are returned (negative means no limit). A NaN
    /// bound matches nothing.
    pub fn range_by_score(
        &self,
        min: f64,
        max: f64,
        offset: isize,
        count: isize,
    ) -> Vec<(&str, f64)> {
        if min.is_nan() || max.is_nan() {
            return Vec::new();
        }
        let offset = usize::try_from(offset).unwrap_or(0);
        let in_range = self
            .range_with(move |_, score| {
                if score < min {
                    RangeHint::SmallerThanRange
                } else if score > max {
                    RangeHint::LargerThanRange
                } else {
                    RangeHint::InRange
                }
            })
            .skip(offset);
        match usize::try_from(count) {
            Ok(count) => in_range.take(count).collect(),
            Err(_) => in_range.collect(),
        }
    }

    /// Iterate over a custom range. `f` must classify entries monotonically:
    /// every `SmallerThanRange` entry sorts before every `InRange` entry, which
    /// sort before every `LargerThanRange` entry.
    ///
    /// ```
    /// use convenient_zset::{RangeHint, SortedSet};
    ///
    /// let mut zs = SortedSet::new();
    /// for (member, score) in &[("a", 1.0), ("b", 2.0), ("c", 3.0)] {
    ///     zs.add(*member, *score).unwrap();
    /// }
    /// let middle: Vec<_> = zs
    ///     .range_with(|_, score| {
    ///         if score < 2.0 {
    ///             RangeHint::SmallerThanRange
    ///         } else if score > 2.0 {
    ///             RangeHint::LargerThanRange
    ///         } else {
    ///             RangeHint::InRange
    ///         }
    ///     })
    ///     .collect();
    /// assert_eq!(middle, vec![("b", 2.0)]);
    /// ```
    pub fn range_with<F>(&self, f: F) -> IterRangeWith<'_, F>
    where
        F: Fn(&str, f64) -> RangeHint,
    {
        self.list.range_with(f)
    }

    /// All entries, lowest score first. Use `.rev()` for highest first.
    pub fn iter(&self) -> Iter<'_> {
        self.list.iter()
    }

    pub fn first(&self) -> Option<(&str, f64)> {
        self.list
            .first()
            .map(|node| (node.member.as_str(), node.score))
    }

    pub fn last(&self) -> Option<(&str, f64)> {
        self.list
            .last()
            .map(|node| (node.member.as_str(), node.score))
    }

    /// Remove and return up to `count` entries with the lowest scores.
    pub fn pop_min(&mut self, count: usize) -> Vec<(String, f64)> {
        let mut popped = Vec::with_capacity(count.min(self.len()));
        while popped.len() < count {
            match self.list.pop_first() {
                Some((member, score)) => {
                    self.index.remove(&member);
                    popped.push((member, score));
                }
                None => break,
            }
        }
        popped
    }

    /// Remove and return up to `count` entries with the highest scores.
    pub fn pop_max(&mut self, count: usize) -> Vec<(String, f64)> {
        let mut popped = Vec::with_capacity(count.min(self.len()));
        while popped.len() < count {
            match self.list.pop_last() {
                Some((member, score)) => {
                    self.index.remove(&member);
                    popped.push((member, score));
                }
                None => break,
            }
        }
        popped
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.list.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<C, R> fmt::Debug for SortedSet<C, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.list, f)
    }
}
