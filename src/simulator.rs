use rand::distributions::Distribution;
use rand::Rng;
use statrs::distribution::Poisson;

use crate::diagnostics::{Diagnostics, Warning};
use crate::model::{LeagueAverages, MatchRates, RateEstimate, ScoringModel};
use crate::records::{FixtureRecord, Side, SimulatedResult};

/// Draw one goal count from a Poisson distribution with mean `rate`.
///
/// A non-positive rate always yields zero goals.
pub fn draw_goals<R: Rng>(rate: f64, rng: &mut R) -> u32 {
    if !(rate > 0.0) {
        return 0;
    }
    match Poisson::new(rate) {
        Ok(dist) => Distribution::<f64>::sample(&dist, rng) as u32,
        Err(_) => 0,
    }
}

/// Rate to simulate with for one side, substituting the league average
/// (and recording why) when the model has no estimate.
pub fn resolve_rate(
    fixture: &FixtureRecord,
    rates: &MatchRates,
    side: Side,
    averages: &LeagueAverages,
    diagnostics: &mut Diagnostics,
) -> f64 {
    match rates.get(side) {
        RateEstimate::Available(rate) => *rate,
        RateEstimate::Unavailable(unseen) => {
            let rate = averages.rate(side);
            diagnostics.push(Warning::FallbackRate {
                home_team: fixture.home_team.clone(),
                away_team: fixture.away_team.clone(),
                side,
                unseen: unseen.clone(),
                rate,
            });
            rate
        }
    }
}

/// Monte Carlo scoreline for one fixture.
///
/// Home goals are drawn before away goals, both from `rng`, so a seeded
/// generator reproduces the same sequence of results.
pub fn simulate_fixture<R: Rng>(
    fixture: &FixtureRecord,
    model: &ScoringModel,
    averages: &LeagueAverages,
    rng: &mut R,
    diagnostics: &mut Diagnostics,
) -> SimulatedResult {
    let rates = model.predict(&fixture.home_team, &fixture.away_team);

    let lambda_home = resolve_rate(fixture, &rates, Side::Home, averages, diagnostics);
    let lambda_away = resolve_rate(fixture, &rates, Side::Away, averages, diagnostics);

    let home_goals = draw_goals(lambda_home, rng);
    let away_goals = draw_goals(lambda_away, rng);

    log::debug!(
        "{} {} - {} {} (rates {:.3} / {:.3})",
        fixture.home_team,
        home_goals,
        away_goals,
        fixture.away_team,
        lambda_home,
        lambda_away
    );

    SimulatedResult {
        home_team: fixture.home_team.clone(),
        away_team: fixture.away_team.clone(),
        home_goals,
        away_goals,
    }
}
