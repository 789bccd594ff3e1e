//! Read path and maintenance over the archive store.
//!
//! # Responsibility
//! - Listing, lookup, search, by-parent and date-range queries.
//! - Aggregate statistics.
//! - Permanent deletion of single archive records.
//!
//! # Invariants
//! - Every query is one statement, so it reads one consistent snapshot.
//! - Deletion removes exactly one record and never touches live data.

use crate::archive::{ArchiveResult, ArchiveValidationError};
use crate::model::archive::{
    ArchiveRecordId, ArchiveStatistics, ArchivedGrade, ArchivedStudent, ArchivedStudentGroup,
};
use crate::model::group::GroupId;
use crate::model::student::StudentId;
use crate::repo::archive_repo::{ArchiveRepository, SqliteArchiveRepository};
use log::info;
use rusqlite::Connection;

/// Query service over an archive repository.
pub struct ArchiveQueryService<R: ArchiveRepository> {
    repo: R,
}

impl<'conn> ArchiveQueryService<SqliteArchiveRepository<'conn>> {
    /// Builds a service over `conn`, failing when the schema is not ready.
    pub fn try_new(conn: &'conn Connection) -> ArchiveResult<Self> {
        Ok(Self::new(SqliteArchiveRepository::try_new(conn)?))
    }
}

impl<R: ArchiveRepository> ArchiveQueryService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// All archived groups, newest first.
    pub fn get_all_archived_groups(&self) -> ArchiveResult<Vec<ArchivedStudentGroup>> {
        Ok(self.repo.list_archived_groups()?)
    }

    pub fn get_all_archived_students(&self) -> ArchiveResult<Vec<ArchivedStudent>> {
        Ok(self.repo.list_archived_students()?)
    }

    pub fn get_all_archived_grades(&self) -> ArchiveResult<Vec<ArchivedGrade>> {
        Ok(self.repo.list_archived_grades()?)
    }

    pub fn get_archived_group(
        &self,
        record_id: ArchiveRecordId,
    ) -> ArchiveResult<Option<ArchivedStudentGroup>> {
        Ok(self.repo.get_archived_group(record_id)?)
    }

    pub fn get_archived_student(
        &self,
        record_id: ArchiveRecordId,
    ) -> ArchiveResult<Option<ArchivedStudent>> {
        Ok(self.repo.get_archived_student(record_id)?)
    }

    pub fn get_archived_grade(
        &self,
        record_id: ArchiveRecordId,
    ) -> ArchiveResult<Option<ArchivedGrade>> {
        Ok(self.repo.get_archived_grade(record_id)?)
    }

    pub fn find_archived_group_by_original_id(
        &self,
        original_group_id: GroupId,
    ) -> ArchiveResult<Option<ArchivedStudentGroup>> {
        Ok(self
            .repo
            .find_archived_group_by_original_id(original_group_id)?)
    }

    /// Substring search over group code and name.
    ///
    /// Case folding covers ASCII only. A blank term matches nothing.
    pub fn search_archived_groups(&self, term: &str) -> ArchiveResult<Vec<ArchivedStudentGroup>> {
        let term = term.trim();
        if term.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.repo.search_archived_groups(term)?)
    }

    /// Substring search over student number; same rules as group search.
    pub fn search_archived_students(&self, term: &str) -> ArchiveResult<Vec<ArchivedStudent>> {
        let term = term.trim();
        if term.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.repo.search_archived_students(term)?)
    }

    pub fn get_archived_students_by_group_id(
        &self,
        original_group_id: GroupId,
    ) -> ArchiveResult<Vec<ArchivedStudent>> {
        Ok(self.repo.list_archived_students_by_group(original_group_id)?)
    }

    pub fn get_archived_grades_by_student_id(
        &self,
        original_student_id: StudentId,
    ) -> ArchiveResult<Vec<ArchivedGrade>> {
        Ok(self.repo.list_archived_grades_by_student(original_student_id)?)
    }

    /// Groups archived within `[start, end]`, both ends inclusive.
    pub fn get_archived_groups_by_date_range(
        &self,
        start: i64,
        end: i64,
    ) -> ArchiveResult<Vec<ArchivedStudentGroup>> {
        if start > end {
            return Err(ArchiveValidationError::InvertedDateRange { start, end }.into());
        }
        Ok(self.repo.list_archived_groups_between(start, end)?)
    }

    pub fn get_archive_statistics(&self) -> ArchiveResult<ArchiveStatistics> {
        Ok(self.repo.archive_statistics()?)
    }

    /// Permanently deletes one archived group record.
    ///
    /// Records of the group's students and grades are kept.
    pub fn delete_archived_group(&self, record_id: ArchiveRecordId) -> ArchiveResult<()> {
        self.repo.delete_archived_group(record_id)?;
        log_deleted("archived_student_group", record_id);
        Ok(())
    }

    pub fn delete_archived_student(&self, record_id: ArchiveRecordId) -> ArchiveResult<()> {
        self.repo.delete_archived_student(record_id)?;
        log_deleted("archived_student", record_id);
        Ok(())
    }

    pub fn delete_archived_grade(&self, record_id: ArchiveRecordId) -> ArchiveResult<()> {
        self.repo.delete_archived_grade(record_id)?;
        log_deleted("archived_grade", record_id);
        Ok(())
    }
}

fn log_deleted(kind: &str, record_id: ArchiveRecordId) {
    info!(
        "event=archive_record_delete module=archive_query status=ok kind={} id={}",
        kind, record_id
    );
}

#[cfg(test)]
mod tests {
    use super::ArchiveQueryService;
    use crate::archive::{ArchiveError, ArchiveValidationError};
    use crate::db::open_db_in_memory;
    use crate::model::EntityKind;
    use rusqlite::Connection;
    use uuid::Uuid;

    #[test]
    fn try_new_requires_bootstrapped_schema() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(matches!(
            ArchiveQueryService::try_new(&conn),
            Err(ArchiveError::TransactionFailure(_))
        ));
    }

    #[test]
    fn blank_search_terms_return_nothing() {
        let conn = open_db_in_memory().unwrap();
        let service = ArchiveQueryService::try_new(&conn).unwrap();
        assert!(service.search_archived_groups("  ").unwrap().is_empty());
        assert!(service.search_archived_students("").unwrap().is_empty());
    }

    #[test]
    fn inverted_date_range_is_a_validation_failure() {
        let conn = open_db_in_memory().unwrap();
        let service = ArchiveQueryService::try_new(&conn).unwrap();
        let err = service
            .get_archived_groups_by_date_range(20, 10)
            .unwrap_err();
        assert!(matches!(
            err,
            ArchiveError::Validation(ArchiveValidationError::InvertedDateRange { start: 20, end: 10 })
        ));
    }

    #[test]
    fn deleting_unknown_record_is_not_found() {
        let conn = open_db_in_memory().unwrap();
        let service = ArchiveQueryService::try_new(&conn).unwrap();
        let err = service.delete_archived_grade(Uuid::new_v4()).unwrap_err();
        assert!(matches!(
            err,
            ArchiveError::NotFound {
                entity: EntityKind::ArchivedGrade,
                ..
            }
        ));
    }
}
