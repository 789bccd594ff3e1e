//! Core domain logic for the gradebook: live academic records, cascading
//! archival under one unit of work, and read paths over the archive store.

pub mod archive;
pub mod clock;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod uow;

pub use archive::{ArchiveEngine, ArchiveError, ArchiveResult, ArchiveValidationError};
pub use clock::{Clock, ManualClock, SystemClock};
pub use db::{ensure_schema_ready, open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::archive::{
    ArchiveRecordId, ArchiveStatistics, ArchivedGrade, ArchivedStudent, ArchivedStudentGroup,
};
pub use model::catalog::{Subject, SubjectId, Teacher, TeacherId};
pub use model::grade::{Grade, GradeId, GradeKind};
pub use model::group::{GroupId, StudentGroup};
pub use model::student::{Student, StudentId, StudyForm};
pub use model::{EntityKind, ModelValidationError};
pub use repo::grade_repo::GradeScope;
pub use repo::{RepoError, RepoResult};
pub use service::{ArchiveQueryService, GradeService, GradeServiceError};
pub use uow::{
    run_in_transaction, CancellationToken, TransactionError, TransactionOptions, UnitOfWork,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
