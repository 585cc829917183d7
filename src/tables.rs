//! Column-keyed input tables.
//!
//! Upstream readers hand over each table as a list of records (column name to
//! cell), e.g. `DataFrame.to_json(orient="records")`. This module checks the
//! required columns and converts cells into typed records.

use serde_json::{Map, Value};

use crate::constants::{fixture_columns, history_columns, standings_columns};
use crate::error::{ProjectionError, Result};
use crate::records::{FixtureRecord, MatchRecord, StandingsRow};

pub type Record = Map<String, Value>;

/// Parse a JSON array of objects into records.
pub fn records_from_json(json: &str, table: &str) -> Result<Vec<Record>> {
    let value: Value = serde_json::from_str(json)
        .map_err(|e| ProjectionError::validation(format!("{} table is not valid JSON: {}", table, e)))?;

    let Value::Array(items) = value else {
        return Err(ProjectionError::validation(format!(
            "{} table must be a JSON array of records",
            table
        )));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Object(record) => Ok(record),
            _ => Err(ProjectionError::validation(format!(
                "{} table row {} is not an object",
                table, i
            ))),
        })
        .collect()
}

/// Historical results. Missing team columns are a validation error; a
/// missing or non-numeric goal column means the model cannot be fit.
pub fn parse_matches(records: &[Record]) -> Result<Vec<MatchRecord>> {
    require_columns(records, "historical results", &[history_columns::HOME_TEAM, history_columns::AWAY_TEAM])?;

    records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            Ok(MatchRecord {
                home_team: team_cell(record, history_columns::HOME_TEAM, "historical results", i)?,
                away_team: team_cell(record, history_columns::AWAY_TEAM, "historical results", i)?,
                home_goals: goal_cell(record, history_columns::HOME_GOALS, i)?,
                away_goals: goal_cell(record, history_columns::AWAY_GOALS, i)?,
            })
        })
        .collect()
}

/// Remaining fixtures.
pub fn parse_fixtures(records: &[Record]) -> Result<Vec<FixtureRecord>> {
    require_columns(records, "fixtures", &[fixture_columns::HOME_TEAM, fixture_columns::AWAY_TEAM])?;

    records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            Ok(FixtureRecord {
                home_team: team_cell(record, fixture_columns::HOME_TEAM, "fixtures", i)?,
                away_team: team_cell(record, fixture_columns::AWAY_TEAM, "fixtures", i)?,
            })
        })
        .collect()
}

/// Current standings. The team column is checked first, then the counts.
pub fn parse_standings(records: &[Record]) -> Result<Vec<StandingsRow>> {
    require_columns(records, "standings", &[standings_columns::TEAM])?;
    require_columns(
        records,
        "standings",
        &[
            standings_columns::PLAYED,
            standings_columns::WON,
            standings_columns::DRAWN,
            standings_columns::LOST,
            standings_columns::GOALS_FOR,
            standings_columns::GOALS_AGAINST,
            standings_columns::GOAL_DIFFERENCE,
            standings_columns::POINTS,
        ],
    )?;

    records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let count = |column: &str| count_cell(record, column, i);
            let signed = |column: &str| signed_cell(record, column, i);

            Ok(StandingsRow {
                team: team_cell(record, standings_columns::TEAM, "standings", i)?,
                played: count(standings_columns::PLAYED)?,
                won: count(standings_columns::WON)?,
                drawn: count(standings_columns::DRAWN)?,
                lost: count(standings_columns::LOST)?,
                goals_for: count(standings_columns::GOALS_FOR)?,
                goals_against: count(standings_columns::GOALS_AGAINST)?,
                goal_difference: signed(standings_columns::GOAL_DIFFERENCE)?,
                points: signed(standings_columns::POINTS)?,
            })
        })
        .collect()
}

fn require_columns(records: &[Record], table: &str, columns: &[&str]) -> Result<()> {
    for (i, record) in records.iter().enumerate() {
        let missing: Vec<&str> = columns
            .iter()
            .copied()
            .filter(|c| !record.contains_key(*c))
            .collect();
        if !missing.is_empty() {
            return Err(ProjectionError::validation(format!(
                "{} table row {} is missing column(s): {}",
                table,
                i,
                missing.join(", ")
            )));
        }
    }
    Ok(())
}

fn team_cell(record: &Record, column: &str, table: &str, row: usize) -> Result<String> {
    let name = match record.get(column) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    };
    if name.is_empty() {
        return Err(ProjectionError::validation(format!(
            "{} table row {}: '{}' must be a non-empty team name",
            table, row, column
        )));
    }
    Ok(name)
}

/// Integral value of a numeric or numeric-string cell.
fn integer_cell(value: &Value) -> Option<i64> {
    let as_float = match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Some(i);
            }
            n.as_f64()?
        }
        Value::String(s) => {
            let s = s.trim();
            if let Ok(i) = s.parse::<i64>() {
                return Some(i);
            }
            s.parse::<f64>().ok()?
        }
        _ => return None,
    };

    if as_float.is_finite() && as_float.fract() == 0.0 && as_float.abs() < i64::MAX as f64 {
        Some(as_float as i64)
    } else {
        None
    }
}

fn goal_cell(record: &Record, column: &str, row: usize) -> Result<u32> {
    let value = record.get(column).ok_or_else(|| {
        ProjectionError::model_fit(format!("historical results are missing goal column '{}'", column))
    })?;

    integer_cell(value)
        .and_then(|g| u32::try_from(g).ok())
        .ok_or_else(|| {
            ProjectionError::model_fit(format!(
                "historical results row {}: '{}' must be a non-negative whole number, got {}",
                row, column, value
            ))
        })
}

/// Counts are capped at `i32::MAX` so `F - A` always fits the GD column.
fn count_cell(record: &Record, column: &str, row: usize) -> Result<u32> {
    record
        .get(column)
        .and_then(integer_cell)
        .and_then(|v| i32::try_from(v).ok())
        .and_then(|v| u32::try_from(v).ok())
        .ok_or_else(|| {
            ProjectionError::validation(format!(
                "standings row {}: '{}' must be a whole number between 0 and {}",
                row,
                column,
                i32::MAX
            ))
        })
}

fn signed_cell(record: &Record, column: &str, row: usize) -> Result<i32> {
    record
        .get(column)
        .and_then(integer_cell)
        .and_then(|v| i32::try_from(v).ok())
        .ok_or_else(|| {
            ProjectionError::validation(format!(
                "standings row {}: '{}' must be a whole number",
                row, column
            ))
        })
}
