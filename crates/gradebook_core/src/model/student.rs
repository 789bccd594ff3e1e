//! Student domain model.
//!
//! # Invariants
//! - `student_number` is unique case-insensitively across live students.
//! - `group_id == None` means the student is not assigned to any group.

use crate::model::group::GroupId;
use crate::model::validation::{require_id, require_text, MAX_CODE_CHARS, MAX_NAME_CHARS};
use crate::model::{EntityKind, ModelValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type StudentId = Uuid;

const MIN_ENROLLMENT_YEAR: i32 = 1900;
const MAX_ENROLLMENT_YEAR: i32 = 2200;

/// Mode of study.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StudyForm {
    FullTime,
    PartTime,
    Distance,
}

/// Live student record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub student_number: String,
    pub first_name: String,
    pub last_name: String,
    pub enrollment_year: i32,
    pub study_form: StudyForm,
    pub group_id: Option<GroupId>,
}

impl Student {
    /// Creates an unassigned full-time student with a generated id.
    pub fn new(
        student_number: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        enrollment_year: i32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            student_number: student_number.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            enrollment_year,
            study_form: StudyForm::FullTime,
            group_id: None,
        }
    }

    /// Builder-style group assignment.
    pub fn in_group(mut self, group_id: GroupId) -> Self {
        self.group_id = Some(group_id);
        self
    }

    /// `"First Last"`, as denormalized into archived grades.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        const ENTITY: EntityKind = EntityKind::Student;
        require_id(ENTITY, "id", self.id)?;
        require_text(ENTITY, "student_number", &self.student_number, MAX_CODE_CHARS)?;
        require_text(ENTITY, "first_name", &self.first_name, MAX_NAME_CHARS)?;
        require_text(ENTITY, "last_name", &self.last_name, MAX_NAME_CHARS)?;
        if !(MIN_ENROLLMENT_YEAR..=MAX_ENROLLMENT_YEAR).contains(&self.enrollment_year) {
            return Err(ModelValidationError::EnrollmentYearOutOfRange(
                self.enrollment_year,
            ));
        }
        if let Some(group_id) = self.group_id {
            require_id(ENTITY, "group_id", group_id)?;
        }
        Ok(())
    }
}
