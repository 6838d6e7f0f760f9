use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// NaN has no place in the (score, member) ordering.
    #[error("score for member {member:?} is NaN")]
    NanScore { member: String },

    #[error("max level must be between 1 and {limit}, got {0}", limit = crate::config::MAX_LEVEL_LIMIT)]
    InvalidMaxLevel(usize),

    #[error("level probability must be in [0, 1), got {0}")]
    InvalidProbability(f64),

    /// `from_parts` takes its random source as given, so a seed has nowhere
    /// to go.
    #[error("seed {0} cannot apply to an injected random source")]
    SeedWithInjectedRng(u64),
}
