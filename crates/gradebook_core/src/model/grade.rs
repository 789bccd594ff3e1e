//! Grade domain model.
//!
//! # Invariants
//! - `value` is finite and within `0.0..=100.0`.
//! - A grade references exactly one student, teacher and subject.

use crate::model::catalog::{SubjectId, TeacherId};
use crate::model::student::StudentId;
use crate::model::validation::{
    optional_text, require_grade_value, require_id, require_timestamp,
};
use crate::model::{EntityKind, ModelValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type GradeId = Uuid;

pub(crate) const MAX_COMMENT_CHARS: usize = 1000;

/// Assessment type a grade was given for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradeKind {
    Exam,
    Test,
    Coursework,
    Lab,
    Oral,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grade {
    pub id: GradeId,
    pub student_id: StudentId,
    pub teacher_id: TeacherId,
    pub subject_id: SubjectId,
    pub value: f64,
    pub kind: GradeKind,
    /// Final grades are the default scope of average computation.
    pub is_final: bool,
    /// Epoch ms of the assessment.
    pub grade_date: i64,
    pub comment: Option<String>,
}

impl Grade {
    pub fn new(
        student_id: StudentId,
        teacher_id: TeacherId,
        subject_id: SubjectId,
        value: f64,
        kind: GradeKind,
        grade_date: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            student_id,
            teacher_id,
            subject_id,
            value,
            kind,
            is_final: false,
            grade_date,
            comment: None,
        }
    }

    /// Builder-style final flag.
    pub fn finalized(mut self) -> Self {
        self.is_final = true;
        self
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        const ENTITY: EntityKind = EntityKind::Grade;
        require_id(ENTITY, "id", self.id)?;
        require_id(ENTITY, "student_id", self.student_id)?;
        require_id(ENTITY, "teacher_id", self.teacher_id)?;
        require_id(ENTITY, "subject_id", self.subject_id)?;
        require_grade_value(self.value)?;
        require_timestamp(ENTITY, "grade_date", self.grade_date)?;
        optional_text(ENTITY, "comment", self.comment.as_deref(), MAX_COMMENT_CHARS)?;
        Ok(())
    }
}
