//! Student group domain model.
//!
//! # Invariants
//! - `code` is unique case-insensitively across live groups.
//! - `capacity` is at least one seat. Occupancy is derived from
//!   `students.group_id`, never stored on the group.

use crate::model::validation::{
    optional_text, require_id, require_text, MAX_CODE_CHARS, MAX_NAME_CHARS,
};
use crate::model::{EntityKind, ModelValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type GroupId = Uuid;

/// Live student group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentGroup {
    pub id: GroupId,
    /// Short unique code, e.g. `CS-21A`.
    pub code: String,
    pub name: String,
    pub specialization: Option<String>,
    pub capacity: u32,
    pub is_active: bool,
    /// Epoch ms, assigned by the store on insert.
    pub created_at: i64,
    /// Epoch ms, bumped by the store on update.
    pub updated_at: i64,
}

impl StudentGroup {
    /// Creates an active group with a generated id.
    pub fn new(code: impl Into<String>, name: impl Into<String>, capacity: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            code: code.into(),
            name: name.into(),
            specialization: None,
            capacity,
            is_active: true,
            created_at: 0,
            updated_at: 0,
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        const ENTITY: EntityKind = EntityKind::StudentGroup;
        require_id(ENTITY, "id", self.id)?;
        require_text(ENTITY, "code", &self.code, MAX_CODE_CHARS)?;
        require_text(ENTITY, "name", &self.name, MAX_NAME_CHARS)?;
        optional_text(
            ENTITY,
            "specialization",
            self.specialization.as_deref(),
            MAX_NAME_CHARS,
        )?;
        if self.capacity == 0 {
            return Err(ModelValidationError::InvalidCapacity(self.capacity));
        }
        Ok(())
    }
}
