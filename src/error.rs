//! The error type returned by every fallible operation of this crate.

/// Errors that can occur while building ratings or rating a player.
///
/// A rating calculation either fully succeeds or fails with one of these,
/// partial results are never returned.
#[derive(Clone, Copy, PartialEq, Debug, thiserror::Error)]
pub enum RatingError {
    #[error("at least one opponent required")]
    NoOpponents,

    #[error("rating must be finite: {rating}")]
    InvalidRating { rating: f64 },

    #[error("deviation must be finite and > 0: {deviation}")]
    InvalidDeviation { deviation: f64 },

    #[error("volatility must be finite and > 0: {volatility}")]
    InvalidVolatility { volatility: f64 },

    #[error("invalid opponent at index {index}: {reason}")]
    InvalidOpponent {
        index: usize,
        reason: InvalidOpponentReason,
    },

    #[error("volatility change (tau) must be finite and > 0: {volatility_change}")]
    InvalidVolatilityChange { volatility_change: f64 },

    #[error("invalid parameters: {reason}")]
    InvalidParameters { reason: &'static str },

    #[error("no volatility bracket found after {attempts} attempts")]
    BracketNotFound { attempts: u32 },

    #[error("volatility did not converge within {iterations} iterations")]
    NotConverged { iterations: u32 },

    #[error("volatility out of the representable range: {volatility}")]
    VolatilityOutOfRange { volatility: f64 },

    #[error("estimated variance is not finite: {estimated_variance}")]
    DegenerateVariance { estimated_variance: f64 },
}

/// Why an [`Opponent`][crate::algorithm::Opponent] was rejected.
#[derive(Clone, Copy, PartialEq, Debug, thiserror::Error)]
pub enum InvalidOpponentReason {
    #[error("rating must be finite: {0}")]
    Rating(f64),

    #[error("deviation must be finite and >= 0: {0}")]
    Deviation(f64),

    #[error("score must be within [0, 1]: {0}")]
    Score(f64),
}
