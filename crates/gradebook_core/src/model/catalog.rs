//! Teachers and subjects.
//!
//! Grades reference both, but archival never cascades into them: archived
//! grades copy the names they need instead.

use crate::model::validation::{
    optional_text, require_id, require_text, MAX_CODE_CHARS, MAX_NAME_CHARS,
};
use crate::model::{EntityKind, ModelValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type TeacherId = Uuid;
pub type SubjectId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Teacher {
    pub id: TeacherId,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub department: Option<String>,
}

impl Teacher {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: None,
            department: None,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        const ENTITY: EntityKind = EntityKind::Teacher;
        require_id(ENTITY, "id", self.id)?;
        require_text(ENTITY, "first_name", &self.first_name, MAX_NAME_CHARS)?;
        require_text(ENTITY, "last_name", &self.last_name, MAX_NAME_CHARS)?;
        optional_text(ENTITY, "email", self.email.as_deref(), MAX_NAME_CHARS)?;
        optional_text(ENTITY, "department", self.department.as_deref(), MAX_NAME_CHARS)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: SubjectId,
    /// Unique course code, e.g. `MATH-101`.
    pub code: String,
    pub name: String,
    pub credits: u32,
}

impl Subject {
    pub fn new(code: impl Into<String>, name: impl Into<String>, credits: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            code: code.into(),
            name: name.into(),
            credits,
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        const ENTITY: EntityKind = EntityKind::Subject;
        require_id(ENTITY, "id", self.id)?;
        require_text(ENTITY, "code", &self.code, MAX_CODE_CHARS)?;
        require_text(ENTITY, "name", &self.name, MAX_NAME_CHARS)?;
        Ok(())
    }
}
