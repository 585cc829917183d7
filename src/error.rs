use thiserror::Error;

/// Fatal failures of a projection request.
///
/// Anything recoverable (unseen teams, fixtures naming teams outside the
/// table) is reported through [`crate::diagnostics::Diagnostics`] instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProjectionError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Model fit error: {0}")]
    ModelFit(String),
}

impl ProjectionError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ProjectionError::Validation(msg.into())
    }

    pub fn model_fit(msg: impl Into<String>) -> Self {
        ProjectionError::ModelFit(msg.into())
    }

    /// Stable name of the error kind, for callers mapping errors onto a protocol.
    pub fn kind(&self) -> &'static str {
        match self {
            ProjectionError::Validation(_) => "ValidationError",
            ProjectionError::ModelFit(_) => "ModelFitError",
        }
    }
}

pub type Result<T> = std::result::Result<T, ProjectionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        assert_eq!(ProjectionError::validation("x").kind(), "ValidationError");
        assert_eq!(ProjectionError::model_fit("x").kind(), "ModelFitError");
    }

    #[test]
    fn test_display_includes_message() {
        let err = ProjectionError::validation("duplicate team 'A'");
        assert_eq!(err.to_string(), "Validation error: duplicate team 'A'");
    }
}
