//! This crate provides a lightweight implementation of the [Glicko-2](https://www.glicko.net/glicko/glicko2.pdf) rating system.
//!
//! Rating a player is a pure function: given the player's rating at the onset of a rating period
//! and the opponents faced during that period, it returns the player's rating after the period.
//! No player state is kept between calls, so managing players and match history
//! (and rating many players in parallel) is left to the caller.
//!
//! The [`rate`] function is the simplest entry point:
//!
//! ```
//! use glicko2_lite::algorithm::Opponent;
//! use glicko2_lite::{rate, Parameters};
//!
//! let opponents = [
//!     Opponent::from((1400.0, 30.0, 1.0)),
//!     Opponent::from((1550.0, 100.0, 0.0)),
//!     Opponent::from((1700.0, 300.0, 0.0)),
//! ];
//!
//! let rating = rate(1500.0, 200.0, 0.06, &opponents, Some(Parameters::default())).unwrap();
//!
//! assert!((rating.rating() - 1464.05).abs() < 0.01);
//! assert!((rating.deviation() - 151.52).abs() < 0.01);
//! ```
//!
//! The [`algorithm`] module exposes the typed pipeline, both for ratings on the public scale
//! and for ratings that are already scaled to the internal Glicko-2 scale.

#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![deny(
    rustdoc::broken_intra_doc_links,
    rustdoc::private_intra_doc_links,
    rustdoc::invalid_codeblock_attributes,
    rustdoc::invalid_rust_codeblocks
)]
#![forbid(unsafe_code)]

use constants::RATING_SCALING_RATIO;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub mod algorithm;
pub mod constants;
pub mod error;
mod volatility;

pub use error::{InvalidOpponentReason, RatingError};

/// Trait to convert between two types with [`Parameters`].
/// Usually used to convert between the internal rating scaling and the public Glicko rating scaling.
///
/// A blanket implementation [`FromWithParameters<T>`] for any `T` is provided.
pub trait FromWithParameters<T: ?Sized> {
    /// Performs the conversion
    fn from_with_parameters(_: T, parameters: Parameters) -> Self;
}

impl<T> FromWithParameters<T> for T {
    fn from_with_parameters(t: T, _: Parameters) -> Self {
        t
    }
}

/// Trait to convert between two types with [`Parameters`].
///
/// This trait is automatically provided for any type `T` where [`FromWithParameters<T>`] is implemented.
pub trait IntoWithParameters<T> {
    /// Performs the conversion
    fn into_with_parameters(self, parameters: Parameters) -> T;
}

impl<T, U> IntoWithParameters<U> for T
where
    U: FromWithParameters<T>,
{
    fn into_with_parameters(self, parameters: Parameters) -> U {
        U::from_with_parameters(self, parameters)
    }
}

/// Scales a public rating and deviation to the internal Glicko-2 scale, returning `(mu, phi)`.
///
/// See "Step 2." in [Glickman's paper](http://www.glicko.net/glicko/glicko2.pdf).
#[must_use]
pub fn scale(rating: f64, deviation: f64, baseline_rating: f64) -> (f64, f64) {
    (
        (rating - baseline_rating) / RATING_SCALING_RATIO,
        deviation / RATING_SCALING_RATIO,
    )
}

/// Inverse of [`scale`], returning `(rating, deviation)` on the public scale.
///
/// See "Step 8." in [Glickman's paper](http://www.glicko.net/glicko/glicko2.pdf).
#[must_use]
pub fn unscale(mu: f64, phi: f64, baseline_rating: f64) -> (f64, f64) {
    (
        mu * RATING_SCALING_RATIO + baseline_rating,
        phi * RATING_SCALING_RATIO,
    )
}

/// Rates a player after a rating period.
///
/// This is a wrapper for [`algorithm::rate_player`] taking the player's rating as plain numbers.
/// Passing `None` as `parameters` is the same as passing [`Parameters::default()`].
///
/// # Errors
///
/// Returns an error if the player's rating is invalid (see [`Rating::new`]),
/// or for any of the reasons listed on [`algorithm::rate_player`].
pub fn rate(
    rating: f64,
    deviation: f64,
    volatility: f64,
    opponents: &[algorithm::Opponent],
    parameters: Option<Parameters>,
) -> Result<Rating, RatingError> {
    let player = Rating::new(rating, deviation, volatility)?;

    algorithm::rate_player(player, opponents, parameters.unwrap_or_default())
}

fn validate_rating_triple(
    rating: f64,
    deviation: f64,
    volatility: f64,
) -> Result<(), RatingError> {
    if !rating.is_finite() {
        return Err(RatingError::InvalidRating { rating });
    }

    if !(deviation.is_finite() && deviation > 0.0) {
        return Err(RatingError::InvalidDeviation { deviation });
    }

    if !(volatility.is_finite() && volatility > 0.0) {
        return Err(RatingError::InvalidVolatility { volatility });
    }

    Ok(())
}

/// A Glicko-2 skill rating.
#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawRating"))]
pub struct Rating {
    rating: f64,
    deviation: f64,
    volatility: f64,
}

impl FromWithParameters<ScaledRating> for Rating {
    fn from_with_parameters(scaled: ScaledRating, parameters: Parameters) -> Self {
        let (rating, deviation) = unscale(
            scaled.rating,
            scaled.deviation,
            parameters.baseline_rating,
        );

        Rating {
            rating,
            deviation,
            volatility: scaled.volatility,
        }
    }
}

impl Rating {
    /// Creates a new [`Rating`] with the specified parameters.
    ///
    /// # Errors
    ///
    /// This function returns an error if `rating` is not finite, or if `deviation` or `volatility` is not finite and > 0.
    pub fn new(rating: f64, deviation: f64, volatility: f64) -> Result<Self, RatingError> {
        validate_rating_triple(rating, deviation, volatility)?;

        Ok(Rating {
            rating,
            deviation,
            volatility,
        })
    }

    /// The rating value.
    #[must_use]
    pub fn rating(&self) -> f64 {
        self.rating
    }

    /// The rating deviation.
    #[must_use]
    pub fn deviation(&self) -> f64 {
        self.deviation
    }

    /// The rating volatility.
    #[must_use]
    pub fn volatility(&self) -> f64 {
        self.volatility
    }
}

#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct RawRating {
    rating: f64,
    deviation: f64,
    volatility: f64,
}

#[cfg(feature = "serde")]
impl TryFrom<RawRating> for Rating {
    type Error = RatingError;

    fn try_from(raw: RawRating) -> Result<Self, Self::Error> {
        Rating::new(raw.rating, raw.deviation, raw.volatility)
    }
}

/// A Glicko-2 rating scaled to the internal rating scale.
/// See "Step 2." and "Step 8." in [Glickmans' paper](http://www.glicko.net/glicko/glicko2.pdf).
///
/// The rating and deviation are called μ and φ in the paper. The volatility is not scaled.
#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScaledRating {
    rating: f64,
    deviation: f64,
    volatility: f64,
}

impl FromWithParameters<Rating> for ScaledRating {
    fn from_with_parameters(rating: Rating, parameters: Parameters) -> Self {
        let (scaled_rating, scaled_deviation) =
            scale(rating.rating, rating.deviation, parameters.baseline_rating);

        ScaledRating {
            rating: scaled_rating,
            deviation: scaled_deviation,
            volatility: rating.volatility,
        }
    }
}

impl ScaledRating {
    /// Creates a new [`ScaledRating`] with the specified parameters.
    ///
    /// # Errors
    ///
    /// This function returns an error if `rating` is not finite, or if `deviation` or `volatility` is not finite and > 0.
    pub fn new(rating: f64, deviation: f64, volatility: f64) -> Result<Self, RatingError> {
        validate_rating_triple(rating, deviation, volatility)?;

        Ok(ScaledRating {
            rating,
            deviation,
            volatility,
        })
    }

    /// The rating value (μ).
    #[must_use]
    pub fn rating(&self) -> f64 {
        self.rating
    }

    /// The rating deviation (φ).
    #[must_use]
    pub fn deviation(&self) -> f64 {
        self.deviation
    }

    /// The rating volatility (σ).
    #[must_use]
    pub fn volatility(&self) -> f64 {
        self.volatility
    }

    /// Checks the invariants of [`ScaledRating::new`] again.
    /// Needed for values that were deserialized.
    pub(crate) fn validate(&self) -> Result<(), RatingError> {
        validate_rating_triple(self.rating, self.deviation, self.volatility)
    }
}

/// The parameters used by the Glicko-2 algorithm.
#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Parameters {
    baseline_rating: f64,
    volatility_change: f64,
    convergence_tolerance: f64,
    max_iterations: u32,
}

impl Parameters {
    /// Creates [`Parameters`] with the given baseline rating and volatility change.
    /// The solver settings use [`constants::DEFAULT_CONVERGENCE_TOLERANCE`] and [`constants::DEFAULT_MAX_ITERATIONS`].
    ///
    /// # Arguments
    ///
    /// * `baseline_rating` - The public rating that maps to `0.0` on the internal scale. See also [`constants::DEFAULT_BASELINE_RATING`].
    /// * `volatility_change` - Also called "system constant" or "τ".
    /// This constant constraints change in volatility over time.
    /// Reasonable choices are between 0.3 and 1.2.
    /// See also "Step 1." in [Glickman's paper](http://www.glicko.net/glicko/glicko2.pdf) and [`constants::DEFAULT_VOLATILITY_CHANGE`].
    ///
    /// The values are checked by [`Parameters::validate`] once they are used to rate a player.
    #[must_use]
    pub fn new(baseline_rating: f64, volatility_change: f64) -> Self {
        Parameters {
            baseline_rating,
            volatility_change,
            ..Parameters::default()
        }
    }

    /// Creates [`Parameters`] with the same parameters as `self`, only changing the baseline rating to `baseline_rating`.
    #[must_use]
    pub fn with_baseline_rating(self, baseline_rating: f64) -> Self {
        Parameters {
            baseline_rating,
            ..self
        }
    }

    /// Creates [`Parameters`] with the same parameters as `self`, only changing the volatility change to `volatility_change`.
    #[must_use]
    pub fn with_volatility_change(self, volatility_change: f64) -> Self {
        Parameters {
            volatility_change,
            ..self
        }
    }

    /// Creates [`Parameters`] with the same parameters as `self`, only changing the convergence tolerance to `convergence_tolerance`.
    #[must_use]
    pub fn with_convergence_tolerance(self, convergence_tolerance: f64) -> Self {
        Parameters {
            convergence_tolerance,
            ..self
        }
    }

    /// Creates [`Parameters`] with the same parameters as `self`, only changing the iteration cap to `max_iterations`.
    #[must_use]
    pub fn with_max_iterations(self, max_iterations: u32) -> Self {
        Parameters {
            max_iterations,
            ..self
        }
    }

    /// The public rating that maps to `0.0` on the internal scale.
    ///
    /// See also [`constants::DEFAULT_BASELINE_RATING`].
    #[must_use]
    pub fn baseline_rating(&self) -> f64 {
        self.baseline_rating
    }

    /// `volatility_change` - Also called "system constant" or "τ".
    /// This constant constraints change in volatility over time.
    /// Reasonable choices are between 0.3 and 1.2.
    /// Small values prevent volatility and therefore rating from changing too much after improbable results.
    ///
    /// See also "Step 1." in [Glickman's paper](http://www.glicko.net/glicko/glicko2.pdf) and [`constants::DEFAULT_VOLATILITY_CHANGE`].
    #[must_use]
    pub fn volatility_change(&self) -> f64 {
        self.volatility_change
    }

    /// The cutoff value for the converging loop algorithm in "Step 5.1." in [Glickman's paper](http://www.glicko.net/glicko/glicko2.pdf).
    ///
    /// See also [`constants::DEFAULT_CONVERGENCE_TOLERANCE`].
    #[must_use]
    pub fn convergence_tolerance(&self) -> f64 {
        self.convergence_tolerance
    }

    /// The maximum number of iterations for each loop of "Step 5." in [Glickman's paper](http://www.glicko.net/glicko/glicko2.pdf).
    ///
    /// See also [`constants::DEFAULT_MAX_ITERATIONS`].
    #[must_use]
    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    /// Checks that these parameters can be used to rate a player.
    ///
    /// # Errors
    ///
    /// This function returns an error if the baseline rating is not finite,
    /// if the volatility change or the convergence tolerance is not finite and > 0,
    /// or if the iteration cap is 0.
    pub fn validate(&self) -> Result<(), RatingError> {
        if !self.baseline_rating.is_finite() {
            return Err(RatingError::InvalidParameters {
                reason: "baseline rating must be finite",
            });
        }

        if !(self.volatility_change.is_finite() && self.volatility_change > 0.0) {
            return Err(RatingError::InvalidVolatilityChange {
                volatility_change: self.volatility_change,
            });
        }

        if !(self.convergence_tolerance.is_finite() && self.convergence_tolerance > 0.0) {
            return Err(RatingError::InvalidParameters {
                reason: "convergence tolerance must be finite and > 0",
            });
        }

        if self.max_iterations == 0 {
            return Err(RatingError::InvalidParameters {
                reason: "max iterations must be > 0",
            });
        }

        Ok(())
    }
}

impl Default for Parameters {
    /// Creates a default version of this struct with the parameters defined in [`constants`].
    fn default() -> Self {
        Parameters {
            baseline_rating: constants::DEFAULT_BASELINE_RATING,
            volatility_change: constants::DEFAULT_VOLATILITY_CHANGE,
            convergence_tolerance: constants::DEFAULT_CONVERGENCE_TOLERANCE,
            max_iterations: constants::DEFAULT_MAX_ITERATIONS,
        }
    }
}
