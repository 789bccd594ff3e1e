//! Archive error taxonomy.
//!
//! Callers map kinds to external responses: `NotFound` -> 404,
//! `AlreadyArchived` / `Validation` -> 400, `TransactionFailure` -> 500.

use crate::model::{EntityKind, ModelValidationError};
use crate::repo::RepoError;
use crate::uow::TransactionError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type ArchiveResult<T> = Result<T, ArchiveError>;

/// Input or snapshot rejected before it reached the archive store.
#[derive(Debug, Clone, PartialEq)]
pub enum ArchiveValidationError {
    BlankActor,
    ActorTooLong { max_chars: usize },
    /// Actor contains characters outside the allowed identity alphabet.
    InvalidActor(String),
    ReasonTooLong { max_chars: usize },
    /// Snapshot built from live data violates a model rule.
    Snapshot(ModelValidationError),
    InvertedDateRange { start: i64, end: i64 },
    /// Caller's grade copy no longer matches the stored row.
    StaleGrade { grade_id: Uuid },
}

impl Display for ArchiveValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankActor => write!(f, "archived_by must not be blank"),
            Self::ActorTooLong { max_chars } => {
                write!(f, "archived_by exceeds {max_chars} characters")
            }
            Self::InvalidActor(value) => write!(f, "archived_by `{value}` is not a valid actor"),
            Self::ReasonTooLong { max_chars } => {
                write!(f, "reason exceeds {max_chars} characters")
            }
            Self::Snapshot(err) => write!(f, "invalid archive snapshot: {err}"),
            Self::InvertedDateRange { start, end } => {
                write!(f, "date range start {start} is after end {end}")
            }
            Self::StaleGrade { grade_id } => {
                write!(f, "grade {grade_id} changed since it was read")
            }
        }
    }
}

impl Error for ArchiveValidationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Snapshot(err) => Some(err),
            _ => None,
        }
    }
}

/// Error returned by the archive engine and the archive query service.
#[derive(Debug)]
pub enum ArchiveError {
    /// Referenced live entity (or archive record) does not exist.
    NotFound { entity: EntityKind, id: Uuid },
    /// The original id already has an archive record.
    AlreadyArchived {
        entity: EntityKind,
        original_id: Uuid,
    },
    Validation(ArchiveValidationError),
    /// The unit of work could not complete; nothing was committed.
    TransactionFailure(TransactionError),
}

impl ArchiveError {
    /// Stable code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::AlreadyArchived { .. } => "already_archived",
            Self::Validation(_) => "validation_failed",
            Self::TransactionFailure(_) => "transaction_failed",
        }
    }
}

impl Display for ArchiveError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::AlreadyArchived {
                entity,
                original_id,
            } => write!(f, "{entity} already archived: {original_id}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::TransactionFailure(err) => write!(f, "archive transaction failed: {err}"),
        }
    }
}

impl Error for ArchiveError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NotFound { .. } => None,
            Self::AlreadyArchived { .. } => None,
            Self::Validation(err) => Some(err),
            Self::TransactionFailure(err) => Some(err),
        }
    }
}

impl From<ArchiveValidationError> for ArchiveError {
    fn from(value: ArchiveValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<ModelValidationError> for ArchiveError {
    fn from(value: ModelValidationError) -> Self {
        Self::Validation(ArchiveValidationError::Snapshot(value))
    }
}

impl From<TransactionError> for ArchiveError {
    fn from(value: TransactionError) -> Self {
        Self::TransactionFailure(value)
    }
}

impl From<RepoError> for ArchiveError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { entity, id } => Self::NotFound { entity, id },
            RepoError::Validation(err) => err.into(),
            other => Self::TransactionFailure(TransactionError::Store(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ArchiveError, ArchiveValidationError};
    use crate::model::{EntityKind, ModelValidationError};
    use crate::repo::RepoError;
    use crate::uow::TransactionError;
    use uuid::Uuid;

    #[test]
    fn repo_not_found_keeps_entity_and_id() {
        let id = Uuid::new_v4();
        let err: ArchiveError = RepoError::NotFound {
            entity: EntityKind::Student,
            id,
        }
        .into();
        assert!(matches!(
            err,
            ArchiveError::NotFound { entity: EntityKind::Student, id: found } if found == id
        ));
        assert_eq!(err.code(), "not_found");
    }

    #[test]
    fn repo_validation_becomes_snapshot_validation() {
        let err: ArchiveError =
            RepoError::Validation(ModelValidationError::GradeValueOutOfRange(120.0)).into();
        assert!(matches!(
            err,
            ArchiveError::Validation(ArchiveValidationError::Snapshot(_))
        ));
    }

    #[test]
    fn invalid_data_is_a_transaction_failure() {
        let err: ArchiveError = RepoError::InvalidData("bad row".to_string()).into();
        assert!(matches!(
            err,
            ArchiveError::TransactionFailure(TransactionError::Store(_))
        ));
        assert_eq!(err.code(), "transaction_failed");
    }
}
