/// Points for a win
pub const POINTS_FOR_WIN: i32 = 3;

/// Points for a draw
pub const POINTS_FOR_DRAW: i32 = 1;

/// Maximum IRLS iterations when fitting a scoring-rate model
pub const DEFAULT_MAX_ITERATIONS: usize = 100;

/// Absolute change in deviance below which IRLS is considered converged
pub const DEFAULT_TOLERANCE: f64 = 1e-8;

/// Relative cutoff for singular values in the weighted least squares solve
pub const SINGULAR_VALUE_CUTOFF: f64 = 1e-12;

/// Linear predictor bound; keeps `exp(eta)` finite while zero-count levels drift
pub const MAX_ABS_LINEAR_PREDICTOR: f64 = 700.0;

/// Minimum number of distinct teams a training corpus must name
pub const MIN_TRAINING_TEAMS: usize = 2;

/// Team aliases applied when no explicit mapping is configured
pub const DEFAULT_TEAM_ALIASES: [(&str, &str); 1] = [("AFC Bournemouth", "Bournemouth")];

/// Message attached to a completed projection
pub const SUCCESS_MESSAGE: &str = "Simulation completed successfully.";

/// Column names of the historical results table
pub mod history_columns {
    pub const HOME_TEAM: &str = "HomeTeam";
    pub const AWAY_TEAM: &str = "AwayTeam";
    pub const HOME_GOALS: &str = "FTHG";
    pub const AWAY_GOALS: &str = "FTAG";
}

/// Column names of the fixtures table
pub mod fixture_columns {
    pub const HOME_TEAM: &str = "HomeTeam";
    pub const AWAY_TEAM: &str = "AwayTeam";
}

/// Column names of the current standings table
pub mod standings_columns {
    pub const TEAM: &str = "Team";
    pub const PLAYED: &str = "P";
    pub const WON: &str = "W";
    pub const DRAWN: &str = "D";
    pub const LOST: &str = "L";
    pub const GOALS_FOR: &str = "F";
    pub const GOALS_AGAINST: &str = "A";
    pub const GOAL_DIFFERENCE: &str = "GD";
    pub const POINTS: &str = "Points";
}
