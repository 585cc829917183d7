//! League Projector - projects the final league table from the remaining schedule.
//!
//! Fits Poisson scoring-rate models from historical results, simulates each
//! unplayed fixture, and rolls the scorelines into a ranked table. Optional
//! Python bindings are built with the `python` feature.

pub mod constants;
pub mod diagnostics;
pub mod error;
pub mod ledger;
pub mod model;
pub mod names;
pub mod outlook;
pub mod projection;
pub mod ranking;
pub mod records;
pub mod simulator;
pub mod tables;

#[cfg(feature = "python")]
mod python;

pub use diagnostics::{Diagnostics, UnseenTeam, Warning};
pub use error::{ProjectionError, Result};
pub use ledger::StandingsLedger;
pub use model::{FitOptions, LeagueAverages, MatchRates, RateEstimate, ScoringModel};
pub use names::TeamNameMap;
pub use outlook::{project_outlook, SeasonOutlook, TeamOutlook};
pub use projection::{
    project, project_with_rng, PreparedSeason, Projection, ProjectionConfig, ProjectionInput, SeasonRun,
};
pub use ranking::{rank, rank_rows};
pub use records::{FixtureRecord, MatchRecord, Outcome, RankedRow, Side, SimulatedResult, StandingsRow};
pub use simulator::simulate_fixture;
