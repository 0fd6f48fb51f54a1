//! "Step 5." of [Glickman's paper](http://www.glicko.net/glicko/glicko2.pdf):
//! solving for the new volatility with the Illinois algorithm.

use tracing::{trace, warn};

use crate::{Parameters, RatingError, ScaledRating};

/// The function `f(x)` whose root is `ln(σ'²)`.
/// Holds everything `f` closes over in the paper.
#[derive(Clone, Copy, PartialEq, Debug)]
pub(crate) struct VolatilityObjective {
    deviation_sq: f64,
    estimated_variance: f64,
    estimated_improvement_sq: f64,
    /// `a = ln(σ²)`
    a: f64,
    volatility_change_sq: f64,
}

impl VolatilityObjective {
    #[must_use]
    pub(crate) fn new(
        estimated_improvement: f64,
        estimated_variance: f64,
        player_rating: ScaledRating,
        volatility_change: f64,
    ) -> Self {
        let deviation = player_rating.deviation();
        let volatility = player_rating.volatility();

        VolatilityObjective {
            deviation_sq: deviation * deviation,
            estimated_variance,
            estimated_improvement_sq: estimated_improvement * estimated_improvement,
            a: f64::ln(volatility * volatility),
            volatility_change_sq: volatility_change * volatility_change,
        }
    }

    #[must_use]
    pub(crate) fn a(&self) -> f64 {
        self.a
    }

    #[must_use]
    pub(crate) fn evaluate(&self, x: f64) -> f64 {
        let x_exp = f64::exp(x);

        let tmp_1 = x_exp
            * (self.estimated_improvement_sq - self.deviation_sq - self.estimated_variance - x_exp);

        let tmp_2 = 2.0 * {
            let tmp = self.deviation_sq + self.estimated_variance + x_exp;
            tmp * tmp
        };

        let tmp_3 = x - self.a;

        tmp_1 / tmp_2 - tmp_3 / self.volatility_change_sq
    }

    /// Whether `δ² > φ² + v`, in which case the upper bracket can be computed directly.
    #[must_use]
    fn improvement_exceeds_variance(&self) -> bool {
        self.estimated_improvement_sq > self.deviation_sq + self.estimated_variance
    }
}

/// The bracket `[a, b]` of "Step 5.4." together with the (possibly halved) function values at its ends.
#[derive(Clone, Copy, PartialEq, Debug)]
struct Bracket {
    a: f64,
    f_a: f64,
    b: f64,
    f_b: f64,
}

impl Bracket {
    /// Step 5.4. (a) to (c).
    #[must_use]
    fn illinois_step(self, f: &VolatilityObjective) -> Self {
        let Bracket {
            mut a,
            mut f_a,
            b,
            f_b,
        } = self;

        // (a)
        let c = a + (a - b) * f_a / (f_b - f_a);
        let f_c = f.evaluate(c);

        // (b)
        if f_c * f_b <= 0.0 {
            a = b;
            f_a = f_b;
        } else {
            f_a /= 2.0;
        }

        // (c)
        Bracket {
            a,
            f_a,
            b: c,
            f_b: f_c,
        }
    }

    #[must_use]
    fn is_finite(&self) -> bool {
        self.a.is_finite() && self.f_a.is_finite() && self.b.is_finite() && self.f_b.is_finite()
    }
}

/// Step 5.
///
/// Expects `parameters` to be validated already.
#[allow(clippy::neg_cmp_op_on_partial_ord)]
pub(crate) fn calculate_new_volatility(
    estimated_improvement: f64,
    estimated_variance: f64,
    player_rating: ScaledRating,
    parameters: Parameters,
) -> Result<f64, RatingError> {
    let volatility_change = parameters.volatility_change();
    let max_iterations = parameters.max_iterations();

    // 1.
    let f = VolatilityObjective::new(
        estimated_improvement,
        estimated_variance,
        player_rating,
        volatility_change,
    );

    // σ² under- or overflowed.
    if !f.a().is_finite() {
        return Err(RatingError::VolatilityOutOfRange {
            volatility: player_rating.volatility(),
        });
    }

    // 2.
    let a = f.a();

    let b = if f.improvement_exceeds_variance() {
        f64::ln(f.estimated_improvement_sq - f.deviation_sq - f.estimated_variance)
    } else {
        find_lower_bracket(&f, volatility_change, max_iterations)?
    };

    // 3.
    let mut bracket = Bracket {
        a,
        f_a: f.evaluate(a),
        b,
        f_b: f.evaluate(b),
    };

    // 4.
    let mut iterations = 0;

    // Negated so a NaN bracket keeps iterating into the error below.
    while !(f64::abs(bracket.b - bracket.a) <= parameters.convergence_tolerance()) {
        if iterations == max_iterations || !bracket.is_finite() {
            warn!(
                iterations,
                a = bracket.a,
                b = bracket.b,
                "volatility iteration did not converge"
            );

            return Err(RatingError::NotConverged { iterations });
        }
        iterations += 1;

        bracket = bracket.illinois_step(&f);

        trace!(
            iterations,
            a = bracket.a,
            b = bracket.b,
            f_a = bracket.f_a,
            f_b = bracket.f_b,
            "volatility iteration"
        );

        // (d) checked by loop
    }

    // 5.
    let new_volatility = f64::exp(bracket.a / 2.0);

    if new_volatility.is_finite() && new_volatility > 0.0 {
        Ok(new_volatility)
    } else {
        Err(RatingError::VolatilityOutOfRange {
            volatility: new_volatility,
        })
    }
}

/// Step 5.2. when `δ² <= φ² + v`: steps down from `a` in multiples of τ until `f` is no longer negative.
fn find_lower_bracket(
    f: &VolatilityObjective,
    volatility_change: f64,
    max_attempts: u32,
) -> Result<f64, RatingError> {
    for k in 1..=max_attempts {
        // (ii)
        let estimated_b = f.a() - f64::from(k) * volatility_change;

        if f.evaluate(estimated_b) >= 0.0 {
            return Ok(estimated_b);
        }
    }

    warn!(
        attempts = max_attempts,
        volatility_change, "no lower bracket found for volatility"
    );

    Err(RatingError::BracketNotFound {
        attempts: max_attempts,
    })
}

#[cfg(test)]
mod test {
    use approx::assert_abs_diff_eq;

    use super::{calculate_new_volatility, find_lower_bracket, Bracket, VolatilityObjective};
    use crate::{Parameters, RatingError, ScaledRating};

    fn paper_player() -> ScaledRating {
        ScaledRating::new(0.0, 1.1513, 0.06).unwrap()
    }

    /// Intermediate values of the example in [Glickman's paper](http://www.glicko.net/glicko/glicko2.pdf).
    #[test]
    fn test_paper_intermediate_values() {
        let parameters = Parameters::default().with_volatility_change(0.5);

        let new_volatility =
            calculate_new_volatility(-0.4834, 1.7785, paper_player(), parameters).unwrap();

        assert_abs_diff_eq!(new_volatility, 0.05999, epsilon = 0.0001);
    }

    #[test]
    fn test_objective_vanishes_near_prior_when_no_surprise() {
        let f = VolatilityObjective::new(0.0, 1.7785, paper_player(), 0.5);

        // At x = a only the first term remains, and it is negative unless δ² is large.
        assert!(f.evaluate(f.a()) < 0.0);
        // Far below a the second term dominates.
        assert!(f.evaluate(f.a() - 10.0) > 0.0);
    }

    #[test]
    fn test_lower_bracket_changes_sign() {
        let f = VolatilityObjective::new(-0.4834, 1.7785, paper_player(), 0.5);

        let b = find_lower_bracket(&f, 0.5, 100).unwrap();

        assert!(b < f.a());
        assert!(f.evaluate(b) >= 0.0);
        assert!(f.evaluate(b + 0.5) < 0.0);
    }

    #[test]
    fn test_large_improvement_raises_volatility() {
        let player = ScaledRating::new(0.0, 0.1, 0.06).unwrap();
        let parameters = Parameters::default();

        let new_volatility = calculate_new_volatility(2.0, 0.5, player, parameters).unwrap();

        assert!(new_volatility > player.volatility());
        assert!(new_volatility.is_finite());
    }

    #[test]
    fn test_iteration_cap() {
        let parameters = Parameters::default().with_max_iterations(1);

        assert_eq!(
            calculate_new_volatility(-0.4834, 1.7785, paper_player(), parameters),
            Err(RatingError::NotConverged { iterations: 1 })
        );
    }

    #[test]
    fn test_bracket_search_cap() {
        // With a huge prior volatility and a large τ, f stays negative for the first couple of steps.
        let player = ScaledRating::new(0.0, 1.0, 1_000_000.0).unwrap();
        let parameters = Parameters::default()
            .with_volatility_change(5.0)
            .with_max_iterations(2);

        assert_eq!(
            calculate_new_volatility(0.0, 1.0, player, parameters),
            Err(RatingError::BracketNotFound { attempts: 2 })
        );
    }

    #[test]
    fn test_root_at_retained_end_takes_regula_falsi_update() {
        let f = VolatilityObjective::new(-0.4834, 1.7785, paper_player(), 0.5);
        let a = f.a();
        let b = a - 0.5;

        // f(b) = 0 makes f(c) * f(b) = 0, which must count as a sign change.
        let bracket = Bracket {
            a,
            f_a: 1.0,
            b,
            f_b: 0.0,
        }
        .illinois_step(&f);

        assert_abs_diff_eq!(bracket.a, b);
        assert_abs_diff_eq!(bracket.f_a, 0.0);
        // The secant step lands on b itself.
        assert_abs_diff_eq!(bracket.b, b, epsilon = 1e-12);
    }

    #[test]
    fn test_same_sign_halves_retained_value() {
        let f = VolatilityObjective::new(-0.4834, 1.7785, paper_player(), 0.5);
        let a = f.a();
        let b = find_lower_bracket(&f, 0.5, 100).unwrap();

        let start = Bracket {
            a,
            f_a: f.evaluate(a),
            b,
            f_b: f.evaluate(b),
        };
        let next = start.illinois_step(&f);

        if next.f_b * start.f_b <= 0.0 {
            assert_abs_diff_eq!(next.a, start.b);
            assert_abs_diff_eq!(next.f_a, start.f_b);
        } else {
            assert_abs_diff_eq!(next.a, start.a);
            assert_abs_diff_eq!(next.f_a, start.f_a / 2.0);
        }
        assert!(f64::abs(next.b - next.a) < f64::abs(start.b - start.a));
    }

    #[test]
    fn test_unrepresentable_volatility() {
        let parameters = Parameters::default();

        for volatility in [1e-200, 1e200] {
            let player = ScaledRating::new(0.0, 0.3, volatility).unwrap();

            assert_eq!(
                calculate_new_volatility(2.0, 0.5, player, parameters),
                Err(RatingError::VolatilityOutOfRange { volatility })
            );
        }
    }
}
