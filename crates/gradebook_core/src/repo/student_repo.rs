//! Student repository contracts and SQLite implementation.
//!
//! # Invariants
//! - `group_id` must reference a live group when set (foreign key).
//! - Students of one group are listed in `student_number` order so cascades
//!   are deterministic.

use crate::model::group::GroupId;
use crate::model::student::{Student, StudentId, StudyForm};
use crate::model::EntityKind;
use crate::repo::{parse_optional_uuid, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};

const STUDENT_SELECT_SQL: &str = "SELECT
    id,
    student_number,
    first_name,
    last_name,
    enrollment_year,
    study_form,
    group_id
FROM students";

/// Repository interface for student operations.
pub trait StudentRepository {
    fn insert_student(&self, student: &Student) -> RepoResult<StudentId>;
    fn update_student(&self, student: &Student) -> RepoResult<()>;
    fn get_student(&self, id: StudentId) -> RepoResult<Option<Student>>;
    fn student_exists(&self, id: StudentId) -> RepoResult<bool>;
    /// Lists live students assigned to `group_id`, ordered by number.
    fn list_students_by_group(&self, group_id: GroupId) -> RepoResult<Vec<Student>>;
    fn delete_student(&self, id: StudentId) -> RepoResult<()>;
}

/// SQLite-backed student repository.
pub struct SqliteStudentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteStudentRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl StudentRepository for SqliteStudentRepository<'_> {
    fn insert_student(&self, student: &Student) -> RepoResult<StudentId> {
        student.validate()?;

        self.conn.execute(
            "INSERT INTO students (
                id,
                student_number,
                first_name,
                last_name,
                enrollment_year,
                study_form,
                group_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                student.id.to_string(),
                student.student_number.trim(),
                student.first_name.as_str(),
                student.last_name.as_str(),
                student.enrollment_year,
                study_form_to_db(student.study_form),
                student.group_id.map(|value| value.to_string()),
            ],
        )?;

        Ok(student.id)
    }

    fn update_student(&self, student: &Student) -> RepoResult<()> {
        student.validate()?;

        let changed = self.conn.execute(
            "UPDATE students
             SET
                student_number = ?1,
                first_name = ?2,
                last_name = ?3,
                enrollment_year = ?4,
                study_form = ?5,
                group_id = ?6,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?7;",
            params![
                student.student_number.trim(),
                student.first_name.as_str(),
                student.last_name.as_str(),
                student.enrollment_year,
                study_form_to_db(student.study_form),
                student.group_id.map(|value| value.to_string()),
                student.id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: EntityKind::Student,
                id: student.id,
            });
        }
        Ok(())
    }

    fn get_student(&self, id: StudentId) -> RepoResult<Option<Student>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{STUDENT_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_student_row(row)?));
        }
        Ok(None)
    }

    fn student_exists(&self, id: StudentId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM students WHERE id = ?1);",
            [id.to_string()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn list_students_by_group(&self, group_id: GroupId) -> RepoResult<Vec<Student>> {
        let mut stmt = self.conn.prepare(&format!(
            "{STUDENT_SELECT_SQL}
             WHERE group_id = ?1
             ORDER BY student_number ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([group_id.to_string()])?;
        let mut students = Vec::new();
        while let Some(row) = rows.next()? {
            students.push(parse_student_row(row)?);
        }
        Ok(students)
    }

    fn delete_student(&self, id: StudentId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM students WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: EntityKind::Student,
                id,
            });
        }
        Ok(())
    }
}

fn parse_student_row(row: &Row<'_>) -> RepoResult<Student> {
    let id_text: String = row.get("id")?;
    let form_text: String = row.get("study_form")?;
    let study_form = parse_study_form(&form_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid study form `{form_text}` in students.study_form"
        ))
    })?;

    let student = Student {
        id: parse_uuid(&id_text, "students.id")?,
        student_number: row.get("student_number")?,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        enrollment_year: row.get("enrollment_year")?,
        study_form,
        group_id: parse_optional_uuid(row.get("group_id")?, "students.group_id")?,
    };
    student.validate()?;
    Ok(student)
}

pub(crate) fn study_form_to_db(form: StudyForm) -> &'static str {
    match form {
        StudyForm::FullTime => "full_time",
        StudyForm::PartTime => "part_time",
        StudyForm::Distance => "distance",
    }
}

pub(crate) fn parse_study_form(value: &str) -> Option<StudyForm> {
    match value {
        "full_time" => Some(StudyForm::FullTime),
        "part_time" => Some(StudyForm::PartTime),
        "distance" => Some(StudyForm::Distance),
        _ => None,
    }
}
