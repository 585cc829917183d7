//! Python bindings.
//!
//! Tables cross the boundary as record-oriented JSON
//! (`DataFrame.to_json(orient="records")`) and results come back as JSON.

use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::ProjectionError;
use crate::names::TeamNameMap;
use crate::outlook::project_outlook;
use crate::projection::{project, ProjectionConfig, ProjectionInput};

impl From<ProjectionError> for PyErr {
    fn from(err: ProjectionError) -> Self {
        match err {
            ProjectionError::Validation(_) => PyValueError::new_err(err.to_string()),
            ProjectionError::ModelFit(_) => PyRuntimeError::new_err(err.to_string()),
        }
    }
}

fn build_config(
    aliases: Option<HashMap<String, String>>,
    aliases_file: Option<PathBuf>,
    seed: Option<u64>,
) -> ProjectionConfig {
    ProjectionConfig {
        seed,
        aliases: match aliases {
            Some(map) => map.into_iter().collect::<TeamNameMap>(),
            None => TeamNameMap::with_defaults(),
        },
        aliases_file,
        ..ProjectionConfig::default()
    }
}

fn serialize_err(e: serde_json::Error) -> PyErr {
    PyRuntimeError::new_err(format!("Failed to serialize result: {}", e))
}

/// Fit, simulate the remaining fixtures once, and rank the final table.
#[pyfunction]
#[pyo3(name = "project", signature = (matches, standings, fixtures, aliases = None, aliases_file = None, seed = None))]
fn py_project(
    py: Python<'_>,
    matches: &str,
    standings: &str,
    fixtures: &str,
    aliases: Option<HashMap<String, String>>,
    aliases_file: Option<PathBuf>,
    seed: Option<u64>,
) -> PyResult<String> {
    let input = ProjectionInput::from_json(matches, standings, fixtures)?;
    let config = build_config(aliases, aliases_file, seed);

    let projection = py.allow_threads(|| project(input, &config))?;
    projection.to_json().map_err(serialize_err)
}

/// Aggregate finishing positions over many simulated seasons.
#[pyfunction]
#[pyo3(name = "project_outlook", signature = (matches, standings, fixtures, runs, aliases = None, aliases_file = None, seed = None))]
fn py_project_outlook(
    py: Python<'_>,
    matches: &str,
    standings: &str,
    fixtures: &str,
    runs: usize,
    aliases: Option<HashMap<String, String>>,
    aliases_file: Option<PathBuf>,
    seed: Option<u64>,
) -> PyResult<String> {
    let input = ProjectionInput::from_json(matches, standings, fixtures)?;
    let config = build_config(aliases, aliases_file, seed);

    let outlook = py.allow_threads(|| project_outlook(input, &config, runs))?;
    outlook.to_json().map_err(serialize_err)
}

/// Python module definition
#[pymodule]
fn league_projector(m: &Bound<'_, PyModule>) -> PyResult<()> {
    let _ = env_logger::try_init();

    m.add_function(wrap_pyfunction!(py_project, m)?)?;
    m.add_function(wrap_pyfunction!(py_project_outlook, m)?)?;

    m.add("SUCCESS_MESSAGE", crate::constants::SUCCESS_MESSAGE)?;

    Ok(())
}
