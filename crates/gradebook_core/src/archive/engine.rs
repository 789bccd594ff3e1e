//! Cascading archival of groups, students and grades.
//!
//! # Responsibility
//! - Move live rows into the archive store, bottom-up, inside one unit of
//!   work per call.
//! - Guard against double archival and missing roots before any mutation.
//!
//! # Invariants
//! - Children are archived and deleted before their parent.
//! - Every record of one call shares actor and reason, and no child is
//!   stamped later than its parent.
//! - Any error rolls back the whole call.

use crate::archive::error::{ArchiveError, ArchiveResult, ArchiveValidationError};
use crate::archive::request::ArchiveRequest;
use crate::clock::{CascadeClock, Clock, SystemClock};
use crate::db::ensure_schema_ready;
use crate::logging::sanitize_message;
use crate::model::archive::{ArchiveStamp, ArchivedGrade, ArchivedStudent, ArchivedStudentGroup};
use crate::model::grade::{Grade, GradeId};
use crate::model::group::{GroupId, StudentGroup};
use crate::model::student::{Student, StudentId};
use crate::model::EntityKind;
use crate::repo::archive_repo::ArchiveRepository;
use crate::repo::catalog_repo::CatalogRepository;
use crate::repo::grade_repo::GradeRepository;
use crate::repo::group_repo::GroupRepository;
use crate::repo::student_repo::StudentRepository;
use crate::repo::RepoError;
use crate::uow::{run_in_transaction, TransactionOptions, UnitOfWork};
use log::{error, info, warn};
use rusqlite::Connection;
use std::time::Instant;
use uuid::Uuid;

const MAX_LOGGED_ACTOR_CHARS: usize = 64;

/// Archive engine bound to one connection.
///
/// Each public call runs in its own unit of work on `conn`.
pub struct ArchiveEngine<'conn, C: Clock = SystemClock> {
    conn: &'conn Connection,
    clock: C,
    options: TransactionOptions,
}

impl<'conn> ArchiveEngine<'conn, SystemClock> {
    /// Creates an engine stamped by wall time.
    ///
    /// Fails when `conn` was not bootstrapped with the current schema.
    pub fn try_new(conn: &'conn Connection) -> ArchiveResult<Self> {
        Self::with_clock(conn, SystemClock)
    }
}

impl<'conn, C: Clock> ArchiveEngine<'conn, C> {
    pub fn with_clock(conn: &'conn Connection, clock: C) -> ArchiveResult<Self> {
        ensure_schema_ready(conn).map_err(RepoError::from)?;
        Ok(Self {
            conn,
            clock,
            options: TransactionOptions::default(),
        })
    }

    /// Applies `options` (deadline, cancellation) to every later call.
    pub fn with_options(mut self, options: TransactionOptions) -> Self {
        self.options = options;
        self
    }

    /// Archives one grade.
    ///
    /// # Errors
    /// - `AlreadyArchived` when the grade already has an archive record.
    /// - `NotFound` when no live grade has `grade_id`.
    pub fn archive_grade(
        &self,
        grade_id: GradeId,
        archived_by: &str,
        reason: &str,
    ) -> ArchiveResult<()> {
        self.run(
            "archive_grade",
            grade_id,
            archived_by,
            reason,
            |cascade| cascade.archive_grade_by_id(grade_id).map(|_| ()),
        )
    }

    /// Archives one student together with all of their grades.
    ///
    /// The student's group is read for its code and name but never modified.
    pub fn archive_student(
        &self,
        student_id: StudentId,
        archived_by: &str,
        reason: &str,
    ) -> ArchiveResult<()> {
        self.run(
            "archive_student",
            student_id,
            archived_by,
            reason,
            |cascade| cascade.archive_student_by_id(student_id).map(|_| ()),
        )
    }

    /// Archives a group, every student in it and all of their grades.
    pub fn archive_student_group(
        &self,
        group_id: GroupId,
        archived_by: &str,
        reason: &str,
    ) -> ArchiveResult<()> {
        self.run(
            "archive_student_group",
            group_id,
            archived_by,
            reason,
            |cascade| cascade.archive_group_by_id(group_id).map(|_| ()),
        )
    }

    /// Archives `grade` and returns the stored snapshot.
    ///
    /// The caller's copy must equal the stored row; a copy that has drifted
    /// fails with `Validation(StaleGrade)` and nothing is archived.
    pub fn archive_specific_grade(
        &self,
        grade: &Grade,
        archived_by: &str,
        reason: &str,
    ) -> ArchiveResult<ArchivedGrade> {
        self.run(
            "archive_specific_grade",
            grade.id,
            archived_by,
            reason,
            |cascade| cascade.archive_grade_copy(grade),
        )
    }

    fn run<T>(
        &self,
        event: &'static str,
        root_id: Uuid,
        archived_by: &str,
        reason: &str,
        step: impl FnOnce(&mut Cascade<'_, '_, C>) -> ArchiveResult<T>,
    ) -> ArchiveResult<T> {
        let started_at = Instant::now();
        let result = ArchiveRequest::new(archived_by, reason)
            .map_err(ArchiveError::from)
            .and_then(|request| {
                run_in_transaction(self.conn, &self.options, |uow| {
                    let mut cascade = Cascade::new(uow, &request, &self.clock);
                    let value = step(&mut cascade)?;
                    Ok::<_, ArchiveError>((value, cascade.counts))
                })
            });
        let duration_ms = started_at.elapsed().as_millis();

        match result {
            Ok((value, counts)) => {
                info!(
                    "event={} module=archive status=ok id={} groups={} students={} grades={} actor={} duration_ms={}",
                    event,
                    root_id,
                    counts.groups,
                    counts.students,
                    counts.grades,
                    sanitize_message(archived_by.trim(), MAX_LOGGED_ACTOR_CHARS),
                    duration_ms
                );
                Ok(value)
            }
            Err(err) => {
                if matches!(err, ArchiveError::TransactionFailure(_)) {
                    error!(
                        "event={} module=archive status=error id={} error_code={} duration_ms={} error={}",
                        event,
                        root_id,
                        err.code(),
                        duration_ms,
                        err
                    );
                } else {
                    warn!(
                        "event={} module=archive status=error id={} error_code={} duration_ms={}",
                        event,
                        root_id,
                        err.code(),
                        duration_ms
                    );
                }
                Err(err)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct CascadeCounts {
    groups: u32,
    students: u32,
    grades: u32,
}

/// State of one in-flight archive call.
struct Cascade<'a, 'u, C: Clock> {
    uow: &'a UnitOfWork<'u>,
    request: &'a ArchiveRequest,
    clock: CascadeClock<'a, C>,
    counts: CascadeCounts,
}

impl<'a, 'u, C: Clock> Cascade<'a, 'u, C> {
    fn new(uow: &'a UnitOfWork<'u>, request: &'a ArchiveRequest, clock: &'a C) -> Self {
        Self {
            uow,
            request,
            clock: CascadeClock::new(clock),
            counts: CascadeCounts::default(),
        }
    }

    fn stamp(&mut self) -> ArchiveStamp {
        self.request.stamp(self.clock.next_ms())
    }

    fn archive_group_by_id(&mut self, group_id: GroupId) -> ArchiveResult<ArchivedStudentGroup> {
        self.uow.checkpoint()?;
        if self.uow.archive().is_group_archived(group_id)? {
            return Err(ArchiveError::AlreadyArchived {
                entity: EntityKind::StudentGroup,
                original_id: group_id,
            });
        }
        let group = self
            .uow
            .groups()
            .get_group(group_id)?
            .ok_or(ArchiveError::NotFound {
                entity: EntityKind::StudentGroup,
                id: group_id,
            })?;

        let students = self.uow.students().list_students_by_group(group.id)?;
        for student in &students {
            self.archive_loaded_student(student, Some(&group))?;
        }

        self.uow.checkpoint()?;
        let snapshot =
            ArchivedStudentGroup::snapshot(&group, count_u32(students.len()), &self.stamp());
        snapshot.validate()?;
        self.uow.archive().insert_archived_group(&snapshot)?;
        self.uow.groups().delete_group(group.id)?;
        self.counts.groups += 1;
        Ok(snapshot)
    }

    fn archive_student_by_id(&mut self, student_id: StudentId) -> ArchiveResult<ArchivedStudent> {
        self.uow.checkpoint()?;
        self.ensure_student_not_archived(student_id)?;
        let student = self.load_student(student_id)?;
        let group = match student.group_id {
            Some(group_id) => self.uow.groups().get_group(group_id)?,
            None => None,
        };
        self.archive_loaded_student(&student, group.as_ref())
    }

    fn archive_loaded_student(
        &mut self,
        student: &Student,
        group: Option<&StudentGroup>,
    ) -> ArchiveResult<ArchivedStudent> {
        self.uow.checkpoint()?;
        self.ensure_student_not_archived(student.id)?;

        let grades = self.uow.grades().list_grades_by_student(student.id)?;
        for grade in &grades {
            self.archive_loaded_grade(grade, student)?;
        }

        self.uow.checkpoint()?;
        let snapshot =
            ArchivedStudent::snapshot(student, group, count_u32(grades.len()), &self.stamp());
        snapshot.validate()?;
        self.uow.archive().insert_archived_student(&snapshot)?;
        self.uow.students().delete_student(student.id)?;
        self.counts.students += 1;
        Ok(snapshot)
    }

    fn archive_grade_by_id(&mut self, grade_id: GradeId) -> ArchiveResult<ArchivedGrade> {
        self.uow.checkpoint()?;
        self.ensure_grade_not_archived(grade_id)?;
        let grade = self.load_grade(grade_id)?;
        let owner = self.load_student(grade.student_id)?;
        self.archive_loaded_grade(&grade, &owner)
    }

    fn archive_grade_copy(&mut self, grade: &Grade) -> ArchiveResult<ArchivedGrade> {
        self.uow.checkpoint()?;
        self.ensure_grade_not_archived(grade.id)?;
        let stored = self.load_grade(grade.id)?;
        if stored != *grade {
            return Err(ArchiveValidationError::StaleGrade { grade_id: grade.id }.into());
        }
        let owner = self.load_student(stored.student_id)?;
        self.archive_loaded_grade(&stored, &owner)
    }

    fn archive_loaded_grade(&mut self, grade: &Grade, owner: &Student) -> ArchiveResult<ArchivedGrade> {
        self.uow.checkpoint()?;
        self.ensure_grade_not_archived(grade.id)?;

        let catalog = self.uow.catalog();
        let teacher = catalog
            .get_teacher(grade.teacher_id)?
            .ok_or(ArchiveError::NotFound {
                entity: EntityKind::Teacher,
                id: grade.teacher_id,
            })?;
        let subject = catalog
            .get_subject(grade.subject_id)?
            .ok_or(ArchiveError::NotFound {
                entity: EntityKind::Subject,
                id: grade.subject_id,
            })?;

        let snapshot = ArchivedGrade::snapshot(grade, owner, &teacher, &subject, &self.stamp());
        snapshot.validate()?;
        self.uow.archive().insert_archived_grade(&snapshot)?;
        self.uow.grades().delete_grade(grade.id)?;
        self.counts.grades += 1;
        Ok(snapshot)
    }

    fn load_grade(&self, grade_id: GradeId) -> ArchiveResult<Grade> {
        self.uow
            .grades()
            .get_grade(grade_id)?
            .ok_or(ArchiveError::NotFound {
                entity: EntityKind::Grade,
                id: grade_id,
            })
    }

    fn load_student(&self, student_id: StudentId) -> ArchiveResult<Student> {
        self.uow
            .students()
            .get_student(student_id)?
            .ok_or(ArchiveError::NotFound {
                entity: EntityKind::Student,
                id: student_id,
            })
    }

    fn ensure_student_not_archived(&self, student_id: StudentId) -> ArchiveResult<()> {
        if self.uow.archive().is_student_archived(student_id)? {
            return Err(ArchiveError::AlreadyArchived {
                entity: EntityKind::Student,
                original_id: student_id,
            });
        }
        Ok(())
    }

    fn ensure_grade_not_archived(&self, grade_id: GradeId) -> ArchiveResult<()> {
        if self.uow.archive().is_grade_archived(grade_id)? {
            return Err(ArchiveError::AlreadyArchived {
                entity: EntityKind::Grade,
                original_id: grade_id,
            });
        }
        Ok(())
    }
}

fn count_u32(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}
