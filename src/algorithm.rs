//! The Glicko-2 rating pipeline, following the steps of [Glickman's paper](http://www.glicko.net/glicko/glicko2.pdf).
//!
//! [`rate_player`] works with ratings on the public Glicko scale,
//! [`rate_player_scaled`] with ratings that are already scaled to the internal Glicko-2 scale.

use std::f64::consts::PI;

use tracing::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::InvalidOpponentReason;
use crate::{
    scale, volatility, FromWithParameters, IntoWithParameters, Parameters, Rating, RatingError,
    ScaledRating,
};

/// An opponent faced during the rating period, together with the score the player achieved against them.
///
/// Only the opponent's rating and deviation matter for the calculation, their volatility is never used.
#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Opponent {
    rating: f64,
    deviation: f64,
    score: f64,
}

impl From<(f64, f64, f64)> for Opponent {
    /// Creates an [`Opponent`] from a `(rating, deviation, score)` tuple.
    fn from((rating, deviation, score): (f64, f64, f64)) -> Self {
        Opponent::new(rating, deviation, score)
    }
}

impl Opponent {
    /// Creates a new [`Opponent`].
    ///
    /// `score` is `1.0` for a win of the player, `0.0` for a loss and `0.5` for a draw,
    /// but any value in `[0, 1]` is accepted.
    /// The values are validated once the opponent is used to rate a player.
    #[must_use]
    pub fn new(rating: f64, deviation: f64, score: f64) -> Self {
        Opponent {
            rating,
            deviation,
            score,
        }
    }

    /// Creates a new [`Opponent`] with the player's score taken from `result`.
    #[must_use]
    pub fn from_result<S: Score + ?Sized>(rating: f64, deviation: f64, result: &S) -> Self {
        Opponent::new(rating, deviation, result.player_score())
    }

    /// The opponent's rating.
    #[must_use]
    pub fn rating(&self) -> f64 {
        self.rating
    }

    /// The opponent's rating deviation.
    #[must_use]
    pub fn deviation(&self) -> f64 {
        self.deviation
    }

    /// The score the player achieved against this opponent.
    #[must_use]
    pub fn score(&self) -> f64 {
        self.score
    }
}

/// An [`Opponent`] scaled to the internal Glicko-2 scale.
#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScaledOpponentRating {
    rating: f64,
    deviation: f64,
    score: f64,
}

impl FromWithParameters<Opponent> for ScaledOpponentRating {
    fn from_with_parameters(opponent: Opponent, parameters: Parameters) -> Self {
        let (rating, deviation) = scale(
            opponent.rating,
            opponent.deviation,
            parameters.baseline_rating(),
        );

        ScaledOpponentRating {
            rating,
            deviation,
            score: opponent.score,
        }
    }
}

impl ScaledOpponentRating {
    /// Creates a new [`ScaledOpponentRating`] with μⱼ `rating` and φⱼ `deviation`.
    #[must_use]
    pub fn new(rating: f64, deviation: f64, score: f64) -> Self {
        ScaledOpponentRating {
            rating,
            deviation,
            score,
        }
    }

    /// The opponent's rating (μⱼ).
    #[must_use]
    pub fn rating(&self) -> f64 {
        self.rating
    }

    /// The opponent's rating deviation (φⱼ).
    #[must_use]
    pub fn deviation(&self) -> f64 {
        self.deviation
    }

    /// The score the player achieved against this opponent.
    #[must_use]
    pub fn score(&self) -> f64 {
        self.score
    }

    fn validate(&self) -> Result<(), InvalidOpponentReason> {
        if !self.rating.is_finite() {
            return Err(InvalidOpponentReason::Rating(self.rating));
        }

        if !(self.deviation.is_finite() && self.deviation >= 0.0) {
            return Err(InvalidOpponentReason::Deviation(self.deviation));
        }

        if !(0.0..=1.0).contains(&self.score) {
            return Err(InvalidOpponentReason::Score(self.score));
        }

        Ok(())
    }
}

/// A scaled opponent with the per-opponent terms of "Step 3." and "Step 4." precomputed
/// relative to the rating of the player being rated.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct ScaledOpponent {
    rating: f64,
    deviation: f64,
    impact: f64,
    expected_score: f64,
    score: f64,
}

impl ScaledOpponent {
    /// Computes `g(φⱼ)` and `E(μ, μⱼ, φⱼ)` for `opponent` against a player with scaled rating `player_rating` (μ).
    #[must_use]
    pub fn new(player_rating: f64, opponent: ScaledOpponentRating) -> Self {
        let impact = impact(opponent.deviation);

        ScaledOpponent {
            rating: opponent.rating,
            deviation: opponent.deviation,
            impact,
            expected_score: calculate_e(impact, player_rating, opponent.rating),
            score: opponent.score,
        }
    }

    /// μⱼ
    #[must_use]
    pub fn rating(&self) -> f64 {
        self.rating
    }

    /// φⱼ
    #[must_use]
    pub fn deviation(&self) -> f64 {
        self.deviation
    }

    /// `g(φⱼ)`
    #[must_use]
    pub fn impact(&self) -> f64 {
        self.impact
    }

    /// `E(μ, μⱼ, φⱼ)`
    #[must_use]
    pub fn expected_score(&self) -> f64 {
        self.expected_score
    }

    /// The score the player achieved against this opponent.
    #[must_use]
    pub fn score(&self) -> f64 {
        self.score
    }
}

/// A game outcome that can be turned into scores for both sides.
pub trait Score {
    /// The score of the player being rated, in `[0, 1]`.
    fn player_score(&self) -> f64;
    /// The score of the opponent, in `[0, 1]`.
    fn opponent_score(&self) -> f64;
}

/// The outcome of a game from the perspective of the player being rated.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MatchResult {
    Win,
    Draw,
    Loss,
}

impl Score for MatchResult {
    fn player_score(&self) -> f64 {
        match self {
            MatchResult::Win => 1.0,
            MatchResult::Draw => 0.5,
            MatchResult::Loss => 0.0,
        }
    }

    fn opponent_score(&self) -> f64 {
        self.invert().player_score()
    }
}

impl MatchResult {
    /// The same outcome from the perspective of the opponent.
    #[must_use]
    pub fn invert(self) -> Self {
        match self {
            MatchResult::Win => MatchResult::Loss,
            MatchResult::Draw => MatchResult::Draw,
            MatchResult::Loss => MatchResult::Win,
        }
    }
}

/// The function `g(φ)` from "Step 3." in [Glickman's paper](http://www.glicko.net/glicko/glicko2.pdf).
///
/// Always in `(0, 1]`, and decreasing in `deviation`:
/// opponents with an uncertain rating carry less weight.
#[must_use]
pub fn impact(deviation: f64) -> f64 {
    1.0 / f64::sqrt(1.0 + 3.0 * deviation * deviation / (PI * PI))
}

/// The function `E(μ, μⱼ, φⱼ)` from "Step 3." in [Glickman's paper](http://www.glicko.net/glicko/glicko2.pdf),
/// the expected score of a player with scaled rating `player_rating` against an opponent.
#[must_use]
pub fn expected_score(player_rating: f64, opponent_rating: f64, opponent_deviation: f64) -> f64 {
    calculate_e(impact(opponent_deviation), player_rating, opponent_rating)
}

#[must_use]
fn calculate_e(g: f64, player_rating: f64, opponent_rating: f64) -> f64 {
    1.0 / (1.0 + f64::exp(-g * (player_rating - opponent_rating)))
}

/// Rates a player with ratings on the public Glicko scale.
///
/// # Arguments
///
/// * `player` - The rating of the player **at the onset of the rating period**
/// * `opponents` - All opponents the player faced in the rating period, with the player's scores
/// * `parameters`
///
/// # Errors
///
/// This function returns an error if
/// * `parameters` are invalid (see [`Parameters::validate`]),
/// * `opponents` is empty,
/// * an opponent has a non-finite rating, a negative deviation, or a score outside of `[0, 1]`,
/// * every expected score is exactly `0` or `1`, so the estimated variance is not finite,
/// * the volatility calculation does not converge within [`Parameters::max_iterations`],
///   or leaves the range of finite, positive values.
pub fn rate_player(
    player: Rating,
    opponents: &[Opponent],
    parameters: Parameters,
) -> Result<Rating, RatingError> {
    parameters.validate()?;

    // Step 2.
    let player: ScaledRating = player.into_with_parameters(parameters);
    let opponents: Vec<ScaledOpponentRating> = opponents
        .iter()
        .map(|&opponent| opponent.into_with_parameters(parameters))
        .collect();

    let new_rating = rate_validated_parameters(player, &opponents, parameters)?;

    // Step 8.
    Ok(new_rating.into_with_parameters(parameters))
}

/// Rates a player with ratings on the internal Glicko-2 scale.
/// The baseline rating of `parameters` is not used.
///
/// See [`rate_player`] for more documentation.
///
/// # Errors
///
/// This function returns an error for the same reasons as [`rate_player`],
/// and additionally if `player` is invalid (see [`ScaledRating::new`]).
pub fn rate_player_scaled(
    player: ScaledRating,
    opponents: &[ScaledOpponentRating],
    parameters: Parameters,
) -> Result<ScaledRating, RatingError> {
    parameters.validate()?;
    player.validate()?;

    rate_validated_parameters(player, opponents, parameters)
}

#[tracing::instrument(level = "debug", skip_all, fields(opponents = opponents.len()))]
fn rate_validated_parameters(
    player_rating: ScaledRating,
    opponents: &[ScaledOpponentRating],
    parameters: Parameters,
) -> Result<ScaledRating, RatingError> {
    if opponents.is_empty() {
        return Err(RatingError::NoOpponents);
    }

    for (index, opponent) in opponents.iter().enumerate() {
        opponent
            .validate()
            .map_err(|reason| RatingError::InvalidOpponent { index, reason })?;
    }

    let opponents: Vec<ScaledOpponent> = opponents
        .iter()
        .map(|&opponent| ScaledOpponent::new(player_rating.rating(), opponent))
        .collect();

    // Step 3.
    let estimated_variance = calculate_estimated_variance(&opponents);

    if !estimated_variance.is_finite() {
        return Err(RatingError::DegenerateVariance { estimated_variance });
    }

    // Step 4.
    let estimated_improvement = calculate_estimated_improvement(estimated_variance, &opponents);

    // Step 5.
    let new_volatility = volatility::calculate_new_volatility(
        estimated_improvement,
        estimated_variance,
        player_rating,
        parameters,
    )?;

    // Step 6.
    let pre_rating_period_value = calculate_pre_rating_period_value(new_volatility, player_rating);

    // Step 7.
    let new_deviation = calculate_new_rating_deviation(pre_rating_period_value, estimated_variance);

    let new_rating = calculate_new_rating(new_deviation, player_rating, &opponents);

    debug!(
        estimated_variance,
        estimated_improvement, new_rating, new_deviation, new_volatility, "rated player"
    );

    Ok(ScaledRating {
        rating: new_rating,
        deviation: new_deviation,
        volatility: new_volatility,
    })
}

/// Step 3.
///
/// This function returns [`f64::INFINITY`] if `opponents` is empty, so callers need to check that first.
#[must_use]
fn calculate_estimated_variance(opponents: &[ScaledOpponent]) -> f64 {
    1.0 / opponents
        .iter()
        .map(|opponent| {
            let g = opponent.impact;
            let e = opponent.expected_score;

            g * g * e * (1.0 - e)
        })
        .sum::<f64>()
}

/// `Σⱼ g(φⱼ)(sⱼ - E(μ, μⱼ, φⱼ))`, shared by "Step 4." and "Step 7.".
#[must_use]
fn score_residual_sum(opponents: &[ScaledOpponent]) -> f64 {
    opponents
        .iter()
        .map(|opponent| opponent.impact * (opponent.score - opponent.expected_score))
        .sum()
}

/// Step 4.
#[must_use]
fn calculate_estimated_improvement(estimated_variance: f64, opponents: &[ScaledOpponent]) -> f64 {
    estimated_variance * score_residual_sum(opponents)
}

/// Step 6.
#[must_use]
fn calculate_pre_rating_period_value(new_volatility: f64, player_rating: ScaledRating) -> f64 {
    let current_deviation = player_rating.deviation();

    f64::sqrt(current_deviation * current_deviation + new_volatility * new_volatility)
}

/// Step 7.1.
#[must_use]
fn calculate_new_rating_deviation(pre_rating_period_value: f64, estimated_variance: f64) -> f64 {
    1.0 / f64::sqrt(
        1.0 / (pre_rating_period_value * pre_rating_period_value) + 1.0 / estimated_variance,
    )
}

/// Step 7.2.
#[must_use]
fn calculate_new_rating(
    new_deviation: f64,
    player_rating: ScaledRating,
    opponents: &[ScaledOpponent],
) -> f64 {
    player_rating.rating() + new_deviation * new_deviation * score_residual_sum(opponents)
}
