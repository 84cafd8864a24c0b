//! Repository for the `students` section.

use seatplan_core::roster::Roster;
use seatplan_core::student::Student;

use super::{read_section, write_section};
use crate::error::StoreError;
use crate::store::{sections, SectionStore};

/// Persists the roster as an ordered list of student records.
pub struct StudentRepo;

impl StudentRepo {
    /// Load the roster. Duplicate ids or names in the stored list are an
    /// error rather than silently dropped.
    pub fn load(store: &dyn SectionStore) -> Result<Roster, StoreError> {
        let students: Vec<Student> = read_section(store, sections::STUDENTS)?.unwrap_or_default();
        Ok(Roster::from_students(students)?)
    }

    pub fn save(store: &mut dyn SectionStore, roster: &Roster) -> Result<(), StoreError> {
        write_section(store, sections::STUDENTS, roster.students())
    }
}
