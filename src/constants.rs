//! Various constants defined or recommended in [Glickman's paper](http://www.glicko.net/glicko/glicko2.pdf),
//! including defaults for [`Parameters`][crate::Parameters].

/// Constant for converting between the original Glicko scale, and the internal Glicko-2 scale.
///
/// See also "Step 2." and "Step 8." in [Glickman's paper](http://www.glicko.net/glicko/glicko2.pdf).
pub const RATING_SCALING_RATIO: f64 = 173.7178;

/// Default baseline rating as defined by "Step 1." in [Glickman's paper](http://www.glicko.net/glicko/glicko2.pdf).
/// A rating equal to the baseline sits at `0.0` on the internal scale.
pub const DEFAULT_BASELINE_RATING: f64 = 1500.0;

/// Default system constant, the value used in the worked example of [Glickman's paper](http://www.glicko.net/glicko/glicko2.pdf).
/// Reasonable choices are between `0.3` and `1.2`, so this might need to be fine-tuned for your application.
pub const DEFAULT_VOLATILITY_CHANGE: f64 = 0.5;

/// Default cutoff value for the converging loop algorithm as recommended by "Step 5.1." in [Glickman's paper](http://www.glicko.net/glicko/glicko2.pdf).
/// Higher values may result in slightly better performance at the cost of less accuracy.
pub const DEFAULT_CONVERGENCE_TOLERANCE: f64 = 0.000_001;

/// Default maximum number of iterations for both loops of "Step 5." in [Glickman's paper](http://www.glicko.net/glicko/glicko2.pdf).
/// This is a fail-safe so we don't enter an infinite loop (even tho that shouldn't happen for reasonable parameters).
/// Exceeding it is reported as an error instead of returning an unconverged volatility.
pub const DEFAULT_MAX_ITERATIONS: u32 = 100;
