//! Tournament error types.

use crate::bracket::{MatchId, TeamNumber};
use crate::db::StoreError;
use crate::registration::ValidationErrors;
use thiserror::Error;

/// Tournament errors
#[derive(Debug, Error)]
pub enum TournamentError {
    /// Registration or team edit failed field validation
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// Match not found
    #[error("Match not found: {0}")]
    MatchNotFound(MatchId),

    /// Team not found
    #[error("Team not found: {0}")]
    TeamNotFound(TeamNumber),

    /// Score is negative or out of range
    #[error("Invalid score: {0}")]
    InvalidScore(i64),

    /// Status is not one of upcoming, live, finished
    #[error("Unknown match status: {0}")]
    UnknownStatus(String),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

impl From<ValidationErrors> for TournamentError {
    fn from(errors: ValidationErrors) -> Self {
        TournamentError::Validation(errors)
    }
}

impl TournamentError {
    /// Get a client-safe error message that doesn't leak storage details
    pub fn client_message(&self) -> String {
        match self {
            TournamentError::Storage(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }

    /// Field errors, when this is a validation failure
    pub fn field_errors(&self) -> Option<&ValidationErrors> {
        match self {
            TournamentError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

/// Result type for tournament operations
pub type TournamentResult<T> = Result<T, TournamentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_errors_are_sanitized() {
        let err = TournamentError::Storage(StoreError::Corrupt {
            entity: "match",
            reason: "status 'paused'".to_string(),
        });
        assert_eq!(err.client_message(), "Internal server error");
    }

    #[test]
    fn test_domain_errors_pass_through() {
        assert_eq!(
            TournamentError::MatchNotFound(42).client_message(),
            "Match not found: 42"
        );
        assert_eq!(
            TournamentError::InvalidScore(-3).client_message(),
            "Invalid score: -3"
        );
    }
}
