//! Domain model for live academic records and their archive snapshots.
//!
//! # Responsibility
//! - Define canonical data structures used by repositories and the archive
//!   engine.
//! - Keep validation rules next to the data they protect.
//!
//! # Invariants
//! - Every record is identified by a stable, non-nil UUID.
//! - Ownership edges point child -> parent only (`Student::group_id`,
//!   `Grade::student_id`); "children of" is always a query.
//! - Archive records are frozen values, never re-derived from live rows.

pub mod archive;
pub mod catalog;
pub mod grade;
pub mod group;
pub mod student;
mod validation;

pub use validation::ModelValidationError;

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Entity families known to the record store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    StudentGroup,
    Student,
    Teacher,
    Subject,
    Grade,
    ArchivedStudentGroup,
    ArchivedStudent,
    ArchivedGrade,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::StudentGroup => "student_group",
            Self::Student => "student",
            Self::Teacher => "teacher",
            Self::Subject => "subject",
            Self::Grade => "grade",
            Self::ArchivedStudentGroup => "archived_student_group",
            Self::ArchivedStudent => "archived_student",
            Self::ArchivedGrade => "archived_grade",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
