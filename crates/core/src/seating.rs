//! The seating map: which student sits at which desk.
//!
//! # Invariants
//!
//! 1. A student occupies at most one desk.
//! 2. A desk holds at most one student; assigning overwrites, never merges.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{DeskId, StudentId};

/// Desk → student assignment, ordered by desk id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeatingMap {
    seats: BTreeMap<DeskId, StudentId>,
}

impl SeatingMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a map from raw pairs, keeping the last desk listed for any
    /// student that appears twice.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (DeskId, StudentId)>) -> Self {
        let mut map = Self::new();
        for (desk, student) in pairs {
            map.assign(student, desk);
        }
        map
    }

    pub fn student_at(&self, desk: &str) -> Option<StudentId> {
        self.seats.get(desk).copied()
    }

    pub fn desk_of(&self, student: StudentId) -> Option<&DeskId> {
        self.seats
            .iter()
            .find_map(|(desk, s)| (*s == student).then_some(desk))
    }

    pub fn is_seated(&self, student: StudentId) -> bool {
        self.desk_of(student).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DeskId, &StudentId)> {
        self.seats.iter()
    }

    pub fn len(&self) -> usize {
        self.seats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    /// Move `student` to `desk`.
    ///
    /// The student is first removed from any desk they occupy, then whoever
    /// sat at `desk` is evicted. Returns the evicted student, if any.
    pub fn assign(&mut self, student: StudentId, desk: impl Into<DeskId>) -> Option<StudentId> {
        let desk = desk.into();
        self.remove(student);
        let evicted = self.seats.insert(desk, student);
        evicted.filter(|e| *e != student)
    }

    /// Vacate a desk. No-op if it is already empty.
    pub fn clear(&mut self, desk: &str) -> Option<StudentId> {
        self.seats.remove(desk)
    }

    /// Vacate whichever desk `student` occupies. Returns that desk.
    pub fn remove(&mut self, student: StudentId) -> Option<DeskId> {
        let desk = self.desk_of(student)?.clone();
        self.seats.remove(&desk);
        Some(desk)
    }

    /// Vacate every desk.
    pub fn clear_all(&mut self) {
        self.seats.clear();
    }

    /// Drop entries whose desk fails `keep_desk` or whose student fails
    /// `keep_student`. Returns the removed entries.
    pub fn retain(
        &mut self,
        mut keep_desk: impl FnMut(&str) -> bool,
        mut keep_student: impl FnMut(StudentId) -> bool,
    ) -> Vec<(DeskId, StudentId)> {
        let mut removed = Vec::new();
        self.seats.retain(|desk, student| {
            let keep = keep_desk(desk) && keep_student(*student);
            if !keep {
                removed.push((desk.clone(), *student));
            }
            keep
        });
        removed
    }

    /// Desks whose occupant differs between `self` and `other`, sorted.
    pub fn changed_desks(&self, other: &SeatingMap) -> Vec<DeskId> {
        let mut desks: Vec<DeskId> = self
            .seats
            .keys()
            .chain(other.seats.keys())
            .filter(|desk| self.seats.get(*desk) != other.seats.get(*desk))
            .cloned()
            .collect();
        desks.sort();
        desks.dedup();
        desks
    }
}
