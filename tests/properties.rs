use approx::assert_abs_diff_eq;
use glicko2_lite::algorithm::{expected_score, impact, rate_player, Opponent};
use glicko2_lite::constants::RATING_SCALING_RATIO;
use glicko2_lite::{rate, scale, unscale, Parameters, Rating};
use proptest::prelude::*;

fn player_strategy() -> impl Strategy<Value = Rating> {
    (1000.0f64..2000.0, 30.0f64..350.0, 0.03f64..0.1).prop_map(
        |(rating, deviation, volatility)| Rating::new(rating, deviation, volatility).unwrap(),
    )
}

fn opponents_strategy() -> impl Strategy<Value = Vec<Opponent>> {
    prop::collection::vec(
        (1000.0f64..2000.0, 0.0f64..350.0, 0.0f64..=1.0)
            .prop_map(|(rating, deviation, score)| Opponent::new(rating, deviation, score)),
        1..8,
    )
}

proptest! {
    #[test]
    fn better_score_never_lowers_rating(
        player in player_strategy(),
        opponent_rating in 1000.0f64..2000.0,
        opponent_deviation in 30.0f64..350.0,
        low in 0.0f64..=1.0,
        high in 0.0f64..=1.0,
        volatility_change in 0.3f64..1.2,
    ) {
        let (low, high) = if low <= high { (low, high) } else { (high, low) };
        let parameters = Parameters::default().with_volatility_change(volatility_change);

        let worse = rate_player(player, &[Opponent::new(opponent_rating, opponent_deviation, low)], parameters).unwrap();
        let better = rate_player(player, &[Opponent::new(opponent_rating, opponent_deviation, high)], parameters).unwrap();

        // The volatility is only solved up to the convergence tolerance.
        prop_assert!(better.rating() >= worse.rating() - 1e-4);
    }

    #[test]
    fn deviation_never_exceeds_inflated_prior(
        player in player_strategy(),
        opponents in opponents_strategy(),
    ) {
        let new_rating = rate_player(player, &opponents, Parameters::default()).unwrap();

        let phi = player.deviation() / RATING_SCALING_RATIO;
        let phi_star = f64::sqrt(phi * phi + new_rating.volatility() * new_rating.volatility());

        prop_assert!(new_rating.deviation() <= phi_star * RATING_SCALING_RATIO + 1e-9);
        prop_assert!(new_rating.deviation() > 0.0);
        prop_assert!(new_rating.volatility() > 0.0);
        prop_assert!(new_rating.rating().is_finite());
    }

    #[test]
    fn default_parameters_are_idempotent(
        player in player_strategy(),
        opponents in opponents_strategy(),
    ) {
        let implicit = rate(player.rating(), player.deviation(), player.volatility(), &opponents, None).unwrap();
        let default = rate(player.rating(), player.deviation(), player.volatility(), &opponents, Some(Parameters::default())).unwrap();
        let explicit = rate(player.rating(), player.deviation(), player.volatility(), &opponents, Some(Parameters::new(1500.0, 0.5))).unwrap();

        prop_assert_eq!(implicit, default);
        prop_assert_eq!(implicit, explicit);
    }

    #[test]
    fn expected_scores_are_complementary(
        a in -3.0f64..3.0,
        b in -3.0f64..3.0,
        deviation in 0.0f64..3.0,
    ) {
        let forward = expected_score(a, b, deviation);
        let backward = expected_score(b, a, deviation);

        prop_assert!(forward > 0.0 && forward < 1.0);
        prop_assert!((forward + backward - 1.0).abs() < 1e-12);
    }

    #[test]
    fn impact_is_bounded(deviation in 0.0f64..100.0) {
        let g = impact(deviation);

        prop_assert!(g > 0.0 && g <= 1.0);
    }

    #[test]
    fn scale_round_trip(
        rating in -5000.0f64..5000.0,
        deviation in 0.0f64..1000.0,
        baseline in -3000.0f64..3000.0,
    ) {
        let (mu, phi) = scale(rating, deviation, baseline);
        let (back_rating, back_deviation) = unscale(mu, phi, baseline);

        prop_assert!((back_rating - rating).abs() < 1e-9);
        prop_assert!((back_deviation - deviation).abs() < 1e-9);
    }
}

#[test]
fn reference_scenario() {
    let opponents = [
        Opponent::from((1400.0, 30.0, 1.0)),
        Opponent::from((1550.0, 100.0, 0.0)),
        Opponent::from((1700.0, 300.0, 0.0)),
    ];

    let new_rating = rate(
        1500.0,
        200.0,
        0.06,
        &opponents,
        Some(Parameters::default().with_volatility_change(0.5)),
    )
    .unwrap();

    assert_abs_diff_eq!(new_rating.rating(), 1464.0, epsilon = 0.1);
    assert_abs_diff_eq!(new_rating.deviation(), 151.52, epsilon = 0.01);
    assert_abs_diff_eq!(new_rating.volatility(), 0.05999, epsilon = 0.00001);
}

#[test]
fn mirrored_match() {
    let parameters = Parameters::default();
    let a = Rating::new(1620.0, 120.0, 0.06).unwrap();
    let b = Rating::new(1480.0, 120.0, 0.06).unwrap();

    let new_a = rate_player(a, &[Opponent::new(b.rating(), b.deviation(), 0.7)], parameters).unwrap();
    let new_b = rate_player(b, &[Opponent::new(a.rating(), a.deviation(), 0.3)], parameters).unwrap();

    // With equal deviations the expected scores sum to 1, so both residuals have the same size
    // and the rating changes are equal and opposite.
    assert_abs_diff_eq!(
        new_a.rating() - a.rating(),
        -(new_b.rating() - b.rating()),
        epsilon = 1e-6
    );
    assert_abs_diff_eq!(new_a.deviation(), new_b.deviation(), epsilon = 1e-6);
}

#[test]
fn invalid_player_is_rejected() {
    let opponents = [Opponent::from((1400.0, 30.0, 1.0))];

    assert!(rate(1500.0, 0.0, 0.06, &opponents, None).is_err());
    assert!(rate(1500.0, 200.0, 0.0, &opponents, None).is_err());
    assert!(rate(f64::NAN, 200.0, 0.06, &opponents, None).is_err());
}
