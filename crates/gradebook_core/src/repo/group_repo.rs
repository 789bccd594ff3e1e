//! Student group repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Deleting a group that still has students fails at the store level
//!   (`students.group_id` foreign key); callers move or archive students
//!   first.
//! - Student occupancy is computed from `students`, never cached.

use crate::model::group::{GroupId, StudentGroup};
use crate::model::EntityKind;
use crate::repo::{bool_to_int, parse_bool, parse_count, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};

const GROUP_SELECT_SQL: &str = "SELECT
    id,
    code,
    name,
    specialization,
    capacity,
    is_active,
    created_at,
    updated_at
FROM student_groups";

/// Repository interface for student group operations.
pub trait GroupRepository {
    /// Inserts one group and returns the stored row (with store timestamps).
    fn insert_group(&self, group: &StudentGroup) -> RepoResult<StudentGroup>;
    fn update_group(&self, group: &StudentGroup) -> RepoResult<()>;
    fn get_group(&self, id: GroupId) -> RepoResult<Option<StudentGroup>>;
    fn group_exists(&self, id: GroupId) -> RepoResult<bool>;
    /// Lists groups ordered by `code`.
    fn list_groups(&self) -> RepoResult<Vec<StudentGroup>>;
    fn delete_group(&self, id: GroupId) -> RepoResult<()>;
    /// Number of live students currently assigned to the group.
    fn count_students(&self, id: GroupId) -> RepoResult<u32>;
}

/// SQLite-backed student group repository.
pub struct SqliteGroupRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteGroupRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl GroupRepository for SqliteGroupRepository<'_> {
    fn insert_group(&self, group: &StudentGroup) -> RepoResult<StudentGroup> {
        group.validate()?;

        self.conn.execute(
            "INSERT INTO student_groups (
                id,
                code,
                name,
                specialization,
                capacity,
                is_active
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                group.id.to_string(),
                group.code.trim(),
                group.name.as_str(),
                group.specialization.as_deref(),
                group.capacity,
                bool_to_int(group.is_active),
            ],
        )?;

        self.get_group(group.id)?.ok_or(RepoError::NotFound {
            entity: EntityKind::StudentGroup,
            id: group.id,
        })
    }

    fn update_group(&self, group: &StudentGroup) -> RepoResult<()> {
        group.validate()?;

        let changed = self.conn.execute(
            "UPDATE student_groups
             SET
                code = ?1,
                name = ?2,
                specialization = ?3,
                capacity = ?4,
                is_active = ?5,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?6;",
            params![
                group.code.trim(),
                group.name.as_str(),
                group.specialization.as_deref(),
                group.capacity,
                bool_to_int(group.is_active),
                group.id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: EntityKind::StudentGroup,
                id: group.id,
            });
        }
        Ok(())
    }

    fn get_group(&self, id: GroupId) -> RepoResult<Option<StudentGroup>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{GROUP_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_group_row(row)?));
        }
        Ok(None)
    }

    fn group_exists(&self, id: GroupId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM student_groups WHERE id = ?1);",
            [id.to_string()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn list_groups(&self) -> RepoResult<Vec<StudentGroup>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{GROUP_SELECT_SQL} ORDER BY code ASC, id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut groups = Vec::new();
        while let Some(row) = rows.next()? {
            groups.push(parse_group_row(row)?);
        }
        Ok(groups)
    }

    fn delete_group(&self, id: GroupId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM student_groups WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: EntityKind::StudentGroup,
                id,
            });
        }
        Ok(())
    }

    fn count_students(&self, id: GroupId) -> RepoResult<u32> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM students WHERE group_id = ?1;",
            [id.to_string()],
            |row| row.get(0),
        )?;
        parse_count(count, "students.group_id")
    }
}

fn parse_group_row(row: &Row<'_>) -> RepoResult<StudentGroup> {
    let id_text: String = row.get("id")?;
    let capacity: i64 = row.get("capacity")?;

    let group = StudentGroup {
        id: parse_uuid(&id_text, "student_groups.id")?,
        code: row.get("code")?,
        name: row.get("name")?,
        specialization: row.get("specialization")?,
        capacity: parse_count(capacity, "student_groups.capacity")?,
        is_active: parse_bool(row.get("is_active")?, "student_groups.is_active")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    };
    group.validate()?;
    Ok(group)
}
