//! The roster store: ordered student records with case-insensitive unique
//! names.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;
use crate::student::{
    validate_preferences, validate_student_name, NewStudent, Student, StudentUpdate,
};
use crate::types::StudentId;

/// Ordered collection of students. Order is insertion order and is preserved
/// across remove/restore so history replays are exact.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Roster {
    students: Vec<Student>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a roster from previously stored records, rejecting duplicate
    /// ids and names.
    pub fn from_students(students: Vec<Student>) -> Result<Self, CoreError> {
        let mut roster = Self::new();
        for student in students {
            roster.insert(student)?;
        }
        Ok(roster)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn students(&self) -> &[Student] {
        &self.students
    }

    /// Students whose attendance is `present`, in roster order.
    pub fn present_students(&self) -> Vec<&Student> {
        self.students.iter().filter(|s| s.is_present()).collect()
    }

    pub fn get(&self, id: StudentId) -> Option<&Student> {
        self.students.iter().find(|s| s.id == id)
    }

    /// Case-insensitive lookup by name.
    pub fn get_by_name(&self, name: &str) -> Option<&Student> {
        let needle = name.trim().to_lowercase();
        self.students
            .iter()
            .find(|s| s.name.to_lowercase() == needle)
    }

    pub fn name_of(&self, id: StudentId) -> Option<&str> {
        self.get(id).map(|s| s.name.as_str())
    }

    pub fn contains(&self, id: StudentId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }

    fn position(&self, id: StudentId) -> Option<usize> {
        self.students.iter().position(|s| s.id == id)
    }

    fn ensure_unique_name(&self, name: &str, except: Option<StudentId>) -> Result<(), CoreError> {
        let needle = name.trim().to_lowercase();
        let clash = self
            .students
            .iter()
            .any(|s| Some(s.id) != except && s.name.to_lowercase() == needle);
        if clash {
            return Err(CoreError::Validation(format!(
                "A student named '{}' already exists",
                name.trim()
            )));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Add a new student, assigning its id and creation time.
    pub fn add(&mut self, input: NewStudent) -> Result<Student, CoreError> {
        validate_student_name(&input.name)?;
        self.ensure_unique_name(&input.name, None)?;

        let id = Uuid::new_v4();
        validate_preferences(id, &input.preferences)?;

        let student = Student {
            id,
            name: input.name.trim().to_string(),
            attendance: input.attendance,
            notes: input.notes,
            preferences: input.preferences,
            created_at: Utc::now(),
            updated_at: None,
        };
        self.students.push(student.clone());
        Ok(student)
    }

    /// Append a stored record verbatim (id and timestamps kept).
    pub fn insert(&mut self, student: Student) -> Result<(), CoreError> {
        let index = self.students.len();
        self.restore(index, student)
    }

    /// Put a stored record back at `index` (clamped to the roster length).
    pub fn restore(&mut self, index: usize, student: Student) -> Result<(), CoreError> {
        if self.contains(student.id) {
            return Err(CoreError::Validation(format!(
                "Student id {} is already on the roster",
                student.id
            )));
        }
        validate_student_name(&student.name)?;
        self.ensure_unique_name(&student.name, None)?;
        let index = index.min(self.students.len());
        self.students.insert(index, student);
        Ok(())
    }

    /// Apply a partial update. Returns the record before and after the change.
    pub fn update(
        &mut self,
        id: StudentId,
        update: StudentUpdate,
    ) -> Result<(Student, Student), CoreError> {
        let index = self
            .position(id)
            .ok_or_else(|| CoreError::not_found("student", id))?;

        if let Some(name) = &update.name {
            validate_student_name(name)?;
            self.ensure_unique_name(name, Some(id))?;
        }
        if let Some(preferences) = &update.preferences {
            validate_preferences(id, preferences)?;
        }

        let before = self.students[index].clone();
        let student = &mut self.students[index];
        if let Some(name) = update.name {
            student.name = name.trim().to_string();
        }
        if let Some(attendance) = update.attendance {
            student.attendance = attendance;
        }
        if let Some(notes) = update.notes {
            student.notes = notes;
        }
        if let Some(preferences) = update.preferences {
            student.preferences = preferences;
        }
        student.updated_at = Some(Utc::now());

        Ok((before, student.clone()))
    }

    /// Overwrite the record with the same id (used by history replay).
    pub fn replace(&mut self, student: Student) -> Result<(), CoreError> {
        let index = self
            .position(student.id)
            .ok_or_else(|| CoreError::not_found("student", student.id))?;
        self.ensure_unique_name(&student.name, Some(student.id))?;
        self.students[index] = student;
        Ok(())
    }

    /// Remove a student. Returns its former index and record.
    pub fn remove(&mut self, id: StudentId) -> Result<(usize, Student), CoreError> {
        let index = self
            .position(id)
            .ok_or_else(|| CoreError::not_found("student", id))?;
        Ok((index, self.students.remove(index)))
    }

    /// Remove every student, returning the removed records.
    pub fn clear(&mut self) -> Vec<Student> {
        std::mem::take(&mut self.students)
    }
}
