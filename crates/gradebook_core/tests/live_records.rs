mod common;

use common::seed_group;
use gradebook_core::repo::group_repo::{GroupRepository, SqliteGroupRepository};
use gradebook_core::repo::student_repo::{SqliteStudentRepository, StudentRepository};
use gradebook_core::{open_db_in_memory, EntityKind, RepoError, Student, StudentGroup, StudyForm};
use uuid::Uuid;

#[test]
fn update_group_rewrites_fields_and_keeps_created_at() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteGroupRepository::new(&conn);
    let stored = repo
        .insert_group(&StudentGroup::new("CS-1", "Computer Science", 30))
        .unwrap();

    let mut edited = stored.clone();
    edited.name = "Applied Computing".to_string();
    edited.capacity = 25;
    edited.is_active = false;
    repo.update_group(&edited).unwrap();

    let loaded = repo.get_group(stored.id).unwrap().unwrap();
    assert_eq!(loaded.name, "Applied Computing");
    assert_eq!(loaded.capacity, 25);
    assert!(!loaded.is_active);
    assert_eq!(loaded.created_at, stored.created_at);
    assert!(loaded.updated_at >= stored.updated_at);
}

#[test]
fn update_group_for_unsaved_group_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let unsaved = StudentGroup::new("CS-1", "Computer Science", 30);

    let err = SqliteGroupRepository::new(&conn)
        .update_group(&unsaved)
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::NotFound { entity: EntityKind::StudentGroup, id } if id == unsaved.id
    ));
}

#[test]
fn list_groups_orders_by_code() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteGroupRepository::new(&conn);
    for code in ["MA-1", "BIO-2", "CS-1"] {
        repo.insert_group(&StudentGroup::new(code, format!("Group {code}"), 20))
            .unwrap();
    }

    let codes: Vec<String> = repo
        .list_groups()
        .unwrap()
        .into_iter()
        .map(|group| group.code)
        .collect();
    assert_eq!(codes, ["BIO-2", "CS-1", "MA-1"]);
}

#[test]
fn group_exists_tracks_insert_and_delete() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteGroupRepository::new(&conn);
    let group = repo
        .insert_group(&StudentGroup::new("CS-1", "Computer Science", 30))
        .unwrap();

    assert!(repo.group_exists(group.id).unwrap());
    assert!(!repo.group_exists(Uuid::new_v4()).unwrap());

    repo.delete_group(group.id).unwrap();
    assert!(!repo.group_exists(group.id).unwrap());
}

#[test]
fn moving_a_student_out_of_a_group_frees_a_seat() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed_group(&conn, "CS-1");
    let groups = SqliteGroupRepository::new(&conn);
    let students = SqliteStudentRepository::new(&conn);
    assert_eq!(groups.count_students(fixture.group.id).unwrap(), 2);

    let moved = Student {
        group_id: None,
        study_form: StudyForm::PartTime,
        ..fixture.s2.clone()
    };
    students.update_student(&moved).unwrap();

    assert_eq!(students.get_student(moved.id).unwrap(), Some(moved));
    assert_eq!(groups.count_students(fixture.group.id).unwrap(), 1);
}

#[test]
fn update_student_for_unsaved_student_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let unsaved = Student::new("N-1", "Alan", "Turing", 2022);

    let err = SqliteStudentRepository::new(&conn)
        .update_student(&unsaved)
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::NotFound { entity: EntityKind::Student, id } if id == unsaved.id
    ));
}
