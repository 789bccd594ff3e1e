//! Teacher/subject repository contracts and SQLite implementation.

use crate::model::catalog::{Subject, SubjectId, Teacher, TeacherId};
use crate::repo::{parse_count, parse_uuid, RepoResult};
use rusqlite::{params, Connection, OptionalExtension};

/// Repository interface for the teacher and subject catalog.
pub trait CatalogRepository {
    fn insert_teacher(&self, teacher: &Teacher) -> RepoResult<TeacherId>;
    fn get_teacher(&self, id: TeacherId) -> RepoResult<Option<Teacher>>;
    fn insert_subject(&self, subject: &Subject) -> RepoResult<SubjectId>;
    fn get_subject(&self, id: SubjectId) -> RepoResult<Option<Subject>>;
}

/// SQLite-backed catalog repository.
pub struct SqliteCatalogRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCatalogRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl CatalogRepository for SqliteCatalogRepository<'_> {
    fn insert_teacher(&self, teacher: &Teacher) -> RepoResult<TeacherId> {
        teacher.validate()?;
        self.conn.execute(
            "INSERT INTO teachers (id, first_name, last_name, email, department)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                teacher.id.to_string(),
                teacher.first_name.as_str(),
                teacher.last_name.as_str(),
                teacher.email.as_deref(),
                teacher.department.as_deref(),
            ],
        )?;
        Ok(teacher.id)
    }

    fn get_teacher(&self, id: TeacherId) -> RepoResult<Option<Teacher>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, first_name, last_name, email, department
                 FROM teachers
                 WHERE id = ?1;",
                [id.to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, Option<String>>(3)?,
                        row.get::<_, Option<String>>(4)?,
                    ))
                },
            )
            .optional()?;

        let Some((id_text, first_name, last_name, email, department)) = row else {
            return Ok(None);
        };
        let teacher = Teacher {
            id: parse_uuid(&id_text, "teachers.id")?,
            first_name,
            last_name,
            email,
            department,
        };
        teacher.validate()?;
        Ok(Some(teacher))
    }

    fn insert_subject(&self, subject: &Subject) -> RepoResult<SubjectId> {
        subject.validate()?;
        self.conn.execute(
            "INSERT INTO subjects (id, code, name, credits)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                subject.id.to_string(),
                subject.code.trim(),
                subject.name.as_str(),
                subject.credits,
            ],
        )?;
        Ok(subject.id)
    }

    fn get_subject(&self, id: SubjectId) -> RepoResult<Option<Subject>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, code, name, credits
                 FROM subjects
                 WHERE id = ?1;",
                [id.to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, i64>(3)?,
                    ))
                },
            )
            .optional()?;

        let Some((id_text, code, name, credits)) = row else {
            return Ok(None);
        };
        let subject = Subject {
            id: parse_uuid(&id_text, "subjects.id")?,
            code,
            name,
            credits: parse_count(credits, "subjects.credits")?,
        };
        subject.validate()?;
        Ok(Some(subject))
    }
}
