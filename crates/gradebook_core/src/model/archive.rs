//! Archive snapshot records.
//!
//! # Responsibility
//! - Define the frozen, denormalized shapes written by the archive engine.
//! - Build snapshots from live entities at archive time.
//!
//! # Invariants
//! - Records are write-once; nothing in core mutates a persisted snapshot.
//! - `original_*_id` values are lookup keys only. They do not point at live
//!   rows, which are gone once the snapshot commits.
//! - Names and codes are copied at snapshot time and never re-joined.

use crate::model::catalog::{Subject, SubjectId, Teacher, TeacherId};
use crate::model::grade::{Grade, GradeId, GradeKind, MAX_COMMENT_CHARS};
use crate::model::group::{GroupId, StudentGroup};
use crate::model::student::{Student, StudentId, StudyForm};
use crate::model::validation::{
    optional_text, require_grade_value, require_id, require_text, require_timestamp,
    MAX_CODE_CHARS, MAX_NAME_CHARS,
};
use crate::model::{EntityKind, ModelValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ArchiveRecordId = Uuid;

/// Actor, time and reason attached to one archive record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveStamp {
    pub archived_by: String,
    /// Epoch ms.
    pub archived_at: i64,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchivedStudentGroup {
    pub id: ArchiveRecordId,
    pub original_group_id: GroupId,
    pub code: String,
    pub name: String,
    pub specialization: Option<String>,
    pub capacity: u32,
    pub was_active: bool,
    /// Students archived together with the group.
    pub student_count: u32,
    pub original_created_at: i64,
    pub archived_by: String,
    pub archived_at: i64,
    pub reason: Option<String>,
}

impl ArchivedStudentGroup {
    pub fn snapshot(group: &StudentGroup, student_count: u32, stamp: &ArchiveStamp) -> Self {
        Self {
            id: Uuid::new_v4(),
            original_group_id: group.id,
            code: group.code.clone(),
            name: group.name.clone(),
            specialization: group.specialization.clone(),
            capacity: group.capacity,
            was_active: group.is_active,
            student_count,
            original_created_at: group.created_at,
            archived_by: stamp.archived_by.clone(),
            archived_at: stamp.archived_at,
            reason: stamp.reason.clone(),
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        const ENTITY: EntityKind = EntityKind::ArchivedStudentGroup;
        require_id(ENTITY, "id", self.id)?;
        require_id(ENTITY, "original_group_id", self.original_group_id)?;
        require_text(ENTITY, "code", &self.code, MAX_CODE_CHARS)?;
        require_text(ENTITY, "name", &self.name, MAX_NAME_CHARS)?;
        validate_audit(ENTITY, &self.archived_by, self.archived_at)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchivedStudent {
    pub id: ArchiveRecordId,
    pub original_student_id: StudentId,
    /// Group the student belonged to at archive time, if any.
    pub original_group_id: Option<GroupId>,
    pub group_code: Option<String>,
    pub group_name: Option<String>,
    pub student_number: String,
    pub first_name: String,
    pub last_name: String,
    pub enrollment_year: i32,
    pub study_form: StudyForm,
    /// Grades archived together with the student.
    pub grade_count: u32,
    pub archived_by: String,
    pub archived_at: i64,
    pub reason: Option<String>,
}

impl ArchivedStudent {
    /// `group` is the live group the student points at, if it still exists.
    pub fn snapshot(
        student: &Student,
        group: Option<&StudentGroup>,
        grade_count: u32,
        stamp: &ArchiveStamp,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            original_student_id: student.id,
            original_group_id: student.group_id,
            group_code: group.map(|value| value.code.clone()),
            group_name: group.map(|value| value.name.clone()),
            student_number: student.student_number.clone(),
            first_name: student.first_name.clone(),
            last_name: student.last_name.clone(),
            enrollment_year: student.enrollment_year,
            study_form: student.study_form,
            grade_count,
            archived_by: stamp.archived_by.clone(),
            archived_at: stamp.archived_at,
            reason: stamp.reason.clone(),
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        const ENTITY: EntityKind = EntityKind::ArchivedStudent;
        require_id(ENTITY, "id", self.id)?;
        require_id(ENTITY, "original_student_id", self.original_student_id)?;
        require_text(ENTITY, "student_number", &self.student_number, MAX_CODE_CHARS)?;
        require_text(ENTITY, "first_name", &self.first_name, MAX_NAME_CHARS)?;
        require_text(ENTITY, "last_name", &self.last_name, MAX_NAME_CHARS)?;
        validate_audit(ENTITY, &self.archived_by, self.archived_at)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchivedGrade {
    pub id: ArchiveRecordId,
    pub original_grade_id: GradeId,
    pub original_student_id: StudentId,
    pub student_number: String,
    pub student_name: String,
    pub teacher_id: TeacherId,
    pub teacher_name: String,
    pub subject_id: SubjectId,
    pub subject_code: String,
    pub subject_name: String,
    pub value: f64,
    pub kind: GradeKind,
    pub is_final: bool,
    pub grade_date: i64,
    pub comment: Option<String>,
    pub archived_by: String,
    pub archived_at: i64,
    pub reason: Option<String>,
}

impl ArchivedGrade {
    pub fn snapshot(
        grade: &Grade,
        student: &Student,
        teacher: &Teacher,
        subject: &Subject,
        stamp: &ArchiveStamp,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            original_grade_id: grade.id,
            original_student_id: grade.student_id,
            student_number: student.student_number.clone(),
            student_name: student.full_name(),
            teacher_id: teacher.id,
            teacher_name: teacher.full_name(),
            subject_id: subject.id,
            subject_code: subject.code.clone(),
            subject_name: subject.name.clone(),
            value: grade.value,
            kind: grade.kind,
            is_final: grade.is_final,
            grade_date: grade.grade_date,
            comment: grade.comment.clone(),
            archived_by: stamp.archived_by.clone(),
            archived_at: stamp.archived_at,
            reason: stamp.reason.clone(),
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        const ENTITY: EntityKind = EntityKind::ArchivedGrade;
        require_id(ENTITY, "id", self.id)?;
        require_id(ENTITY, "original_grade_id", self.original_grade_id)?;
        require_id(ENTITY, "original_student_id", self.original_student_id)?;
        require_text(ENTITY, "student_number", &self.student_number, MAX_CODE_CHARS)?;
        require_text(ENTITY, "student_name", &self.student_name, MAX_NAME_CHARS)?;
        require_text(ENTITY, "teacher_name", &self.teacher_name, MAX_NAME_CHARS)?;
        require_text(ENTITY, "subject_code", &self.subject_code, MAX_CODE_CHARS)?;
        require_text(ENTITY, "subject_name", &self.subject_name, MAX_NAME_CHARS)?;
        require_grade_value(self.value)?;
        require_timestamp(ENTITY, "grade_date", self.grade_date)?;
        optional_text(ENTITY, "comment", self.comment.as_deref(), MAX_COMMENT_CHARS)?;
        validate_audit(ENTITY, &self.archived_by, self.archived_at)
    }
}

/// Aggregate view over the whole archive store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveStatistics {
    pub total_groups: u64,
    pub total_students: u64,
    pub total_grades: u64,
    /// Latest `archived_at` across all three kinds; `None` when empty.
    pub last_archive_date: Option<i64>,
}

fn validate_audit(
    entity: EntityKind,
    archived_by: &str,
    archived_at: i64,
) -> Result<(), ModelValidationError> {
    require_text(entity, "archived_by", archived_by, MAX_NAME_CHARS)?;
    require_timestamp(entity, "archived_at", archived_at)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stamp() -> ArchiveStamp {
        ArchiveStamp {
            archived_by: "registrar".to_string(),
            archived_at: 1_700_000_000_000,
            reason: Some("graduated".to_string()),
        }
    }

    #[test]
    fn grade_snapshot_denormalizes_names_and_codes() {
        let teacher = Teacher::new("Ada", "Lovelace");
        let subject = Subject::new("MATH-101", "Analysis I", 6);
        let student = Student::new("S-0001", "Jan", "Kowalski", 2021);
        let grade = Grade::new(
            student.id,
            teacher.id,
            subject.id,
            88.5,
            GradeKind::Exam,
            1_690_000_000_000,
        )
        .finalized();

        let archived = ArchivedGrade::snapshot(&grade, &student, &teacher, &subject, &stamp());

        assert_eq!(archived.original_grade_id, grade.id);
        assert_eq!(archived.original_student_id, student.id);
        assert_eq!(archived.student_name, "Jan Kowalski");
        assert_eq!(archived.teacher_name, "Ada Lovelace");
        assert_eq!(archived.subject_code, "MATH-101");
        assert_eq!(archived.subject_name, "Analysis I");
        assert!(archived.is_final);
        assert_ne!(archived.id, grade.id);
        archived.validate().unwrap();
    }

    #[test]
    fn student_snapshot_without_group_keeps_group_fields_empty() {
        let student = Student::new("S-0002", "Ewa", "Nowak", 2022);
        let archived = ArchivedStudent::snapshot(&student, None, 0, &stamp());

        assert_eq!(archived.original_group_id, None);
        assert_eq!(archived.group_code, None);
        assert_eq!(archived.group_name, None);
        archived.validate().unwrap();
    }

    #[test]
    fn snapshot_validation_rejects_blank_actor() {
        let group = StudentGroup::new("CS-21A", "Computer Science 21A", 30);
        let mut bad = stamp();
        bad.archived_by = "  ".to_string();

        let err = ArchivedStudentGroup::snapshot(&group, 0, &bad)
            .validate()
            .unwrap_err();
        assert_eq!(
            err,
            ModelValidationError::BlankField {
                entity: EntityKind::ArchivedStudentGroup,
                field: "archived_by"
            }
        );
    }
}
