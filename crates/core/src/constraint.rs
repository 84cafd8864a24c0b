//! Pairwise seating rules and validation of a seating map against them.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;
use crate::layout::Layout;
use crate::seating::SeatingMap;
use crate::types::{ConstraintId, DeskId, StudentId, Timestamp};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConstraintKind {
    CannotSitTogether,
    MustSitTogether,
    /// Informational only; never reported as violated.
    PreferredArea,
}

impl ConstraintKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ConstraintKind::CannotSitTogether => "cannot-sit-together",
            ConstraintKind::MustSitTogether => "must-sit-together",
            ConstraintKind::PreferredArea => "preferred-area",
        }
    }

    /// Kinds relating two students.
    pub fn is_binary(self) -> bool {
        !matches!(self, ConstraintKind::PreferredArea)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraint {
    pub id: ConstraintId,
    #[serde(rename = "type")]
    pub kind: ConstraintKind,
    pub student1: StudentId,
    pub student2: Option<StudentId>,
    pub created_at: Timestamp,
}

impl Constraint {
    pub fn involves(&self, student: StudentId) -> bool {
        self.student1 == student || self.student2 == Some(student)
    }

    /// Undirected equality on kind and students.
    pub fn same_rule(&self, kind: ConstraintKind, a: StudentId, b: Option<StudentId>) -> bool {
        self.kind == kind
            && ((self.student1 == a && self.student2 == b)
                || (Some(self.student1) == b && self.student2 == Some(a)))
    }
}

/// Input for creating a constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewConstraint {
    #[serde(rename = "type")]
    pub kind: ConstraintKind,
    pub student1: StudentId,
    #[serde(default)]
    pub student2: Option<StudentId>,
}

impl NewConstraint {
    pub fn cannot_sit_together(a: StudentId, b: StudentId) -> Self {
        Self {
            kind: ConstraintKind::CannotSitTogether,
            student1: a,
            student2: Some(b),
        }
    }

    pub fn must_sit_together(a: StudentId, b: StudentId) -> Self {
        Self {
            kind: ConstraintKind::MustSitTogether,
            student1: a,
            student2: Some(b),
        }
    }

    pub fn preferred_area(student: StudentId) -> Self {
        Self {
            kind: ConstraintKind::PreferredArea,
            student1: student,
            student2: None,
        }
    }
}

/// A constraint that the seating map currently breaks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub constraint_id: ConstraintId,
    pub kind: ConstraintKind,
    pub desks: (DeskId, DeskId),
    pub message: String,
}

// ---------------------------------------------------------------------------
// Constraint set
// ---------------------------------------------------------------------------

/// Ordered set of constraints. Constraints that reference removed students are
/// kept but can never be violated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConstraintSet {
    constraints: Vec<Constraint>,
}

impl ConstraintSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Constraint> {
        self.constraints.iter()
    }

    pub fn as_slice(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    pub fn get(&self, id: ConstraintId) -> Option<&Constraint> {
        self.constraints.iter().find(|c| c.id == id)
    }

    /// Constraints mentioning `student`.
    pub fn involving(&self, student: StudentId) -> Vec<&Constraint> {
        self.constraints.iter().filter(|c| c.involves(student)).collect()
    }

    /// Validate and add a constraint.
    pub fn add(&mut self, input: NewConstraint) -> Result<Constraint, CoreError> {
        self.validate_new(&input)?;
        let constraint = Constraint {
            id: Uuid::new_v4(),
            kind: input.kind,
            student1: input.student1,
            student2: input.student2,
            created_at: Utc::now(),
        };
        self.constraints.push(constraint.clone());
        Ok(constraint)
    }

    /// Put a stored constraint back at `index` (clamped).
    pub fn restore(&mut self, index: usize, constraint: Constraint) -> Result<(), CoreError> {
        if self.get(constraint.id).is_some() {
            return Err(CoreError::Validation(format!(
                "Constraint {} already exists",
                constraint.id
            )));
        }
        let index = index.min(self.constraints.len());
        self.constraints.insert(index, constraint);
        Ok(())
    }

    /// Remove a constraint, returning its former index and record.
    pub fn remove(&mut self, id: ConstraintId) -> Result<(usize, Constraint), CoreError> {
        let index = self
            .constraints
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| CoreError::not_found("constraint", id))?;
        Ok((index, self.constraints.remove(index)))
    }

    pub fn clear(&mut self) -> Vec<Constraint> {
        std::mem::take(&mut self.constraints)
    }

    fn validate_new(&self, input: &NewConstraint) -> Result<(), CoreError> {
        match (input.kind.is_binary(), input.student2) {
            (true, None) => {
                return Err(CoreError::Validation(format!(
                    "A {} constraint needs a second student",
                    input.kind.as_str()
                )))
            }
            (false, Some(_)) => {
                return Err(CoreError::Validation(
                    "A preferred-area constraint takes a single student".to_string(),
                ))
            }
            _ => {}
        }
        if input.student2 == Some(input.student1) {
            return Err(CoreError::Validation(
                "A constraint must reference two different students".to_string(),
            ));
        }
        if self
            .constraints
            .iter()
            .any(|c| c.same_rule(input.kind, input.student1, input.student2))
        {
            return Err(CoreError::Validation(
                "This constraint already exists".to_string(),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Check every constraint against `seating`. Constraints whose students are
/// not both seated are skipped.
pub fn validate(seating: &SeatingMap, constraints: &ConstraintSet, layout: &Layout) -> Vec<Violation> {
    constraints
        .iter()
        .filter_map(|constraint| check(constraint, seating, layout))
        .collect()
}

fn check(constraint: &Constraint, seating: &SeatingMap, layout: &Layout) -> Option<Violation> {
    if !constraint.kind.is_binary() {
        return None;
    }
    let desk1 = seating.desk_of(constraint.student1)?;
    let desk2 = seating.desk_of(constraint.student2?)?;
    let adjacent = layout.are_adjacent(desk1, desk2);

    let message = match (constraint.kind, adjacent) {
        (ConstraintKind::CannotSitTogether, true) => {
            "Students are sitting together but should not be"
        }
        (ConstraintKind::MustSitTogether, false) => {
            "Students should be sitting together but are not"
        }
        _ => return None,
    };

    Some(Violation {
        constraint_id: constraint.id,
        kind: constraint.kind,
        desks: (desk1.clone(), desk2.clone()),
        message: message.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn ids() -> (StudentId, StudentId, StudentId) {
        (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4())
    }

    // -----------------------------------------------------------------------
    // Creation rules
    // -----------------------------------------------------------------------

    #[test]
    fn duplicate_is_rejected_in_either_direction() {
        let (a, b, _) = ids();
        let mut set = ConstraintSet::new();
        set.add(NewConstraint::cannot_sit_together(a, b)).unwrap();
        assert_matches!(
            set.add(NewConstraint::cannot_sit_together(b, a)),
            Err(CoreError::Validation(_))
        );
        // Same pair, different kind is a different rule.
        assert!(set.add(NewConstraint::must_sit_together(b, a)).is_ok());
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn self_reference_is_rejected() {
        let (a, _, _) = ids();
        let mut set = ConstraintSet::new();
        assert!(set.add(NewConstraint::must_sit_together(a, a)).is_err());
        assert!(set.is_empty());
    }

    #[test]
    fn binary_kind_requires_second_student() {
        let (a, b, _) = ids();
        let mut set = ConstraintSet::new();
        let missing = NewConstraint {
            kind: ConstraintKind::MustSitTogether,
            student1: a,
            student2: None,
        };
        assert!(set.add(missing).is_err());

        let extra = NewConstraint {
            kind: ConstraintKind::PreferredArea,
            student1: a,
            student2: Some(b),
        };
        assert!(set.add(extra).is_err());
        assert!(set.add(NewConstraint::preferred_area(a)).is_ok());
    }

    #[test]
    fn remove_and_restore_keep_position() {
        let (a, b, c) = ids();
        let mut set = ConstraintSet::new();
        set.add(NewConstraint::cannot_sit_together(a, b)).unwrap();
        let middle = set.add(NewConstraint::cannot_sit_together(b, c)).unwrap();
        set.add(NewConstraint::cannot_sit_together(a, c)).unwrap();
        let snapshot = set.clone();

        let (index, removed) = set.remove(middle.id).unwrap();
        assert_eq!(index, 1);
        set.restore(index, removed).unwrap();
        assert_eq!(set, snapshot);
        assert_matches!(set.remove(Uuid::new_v4()), Err(CoreError::NotFound { .. }));
    }

    #[test]
    fn kind_serializes_kebab_case() {
        let (a, b, _) = ids();
        let mut set = ConstraintSet::new();
        let c = set.add(NewConstraint::cannot_sit_together(a, b)).unwrap();
        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(json["type"], "cannot-sit-together");
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    #[test]
    fn cannot_sit_together_violated_only_when_adjacent() {
        let layout = Layout::standard();
        let (a, b, _) = ids();
        let mut set = ConstraintSet::new();
        set.add(NewConstraint::cannot_sit_together(a, b)).unwrap();

        let mut seating = SeatingMap::new();
        seating.assign(a, "left-0");
        seating.assign(b, "left-1");
        let violations = validate(&seating, &set, &layout);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ConstraintKind::CannotSitTogether);

        seating.assign(b, "right-3");
        assert!(validate(&seating, &set, &layout).is_empty());
    }

    #[test]
    fn must_sit_together_violated_when_apart() {
        let layout = Layout::standard();
        let (a, b, _) = ids();
        let mut set = ConstraintSet::new();
        set.add(NewConstraint::must_sit_together(a, b)).unwrap();

        let mut seating = SeatingMap::new();
        seating.assign(a, "left-0");
        seating.assign(b, "middle-8");
        assert_eq!(validate(&seating, &set, &layout).len(), 1);

        seating.assign(b, "left-1");
        assert!(validate(&seating, &set, &layout).is_empty());
    }

    #[test]
    fn unseated_students_and_preferred_area_never_violate() {
        let layout = Layout::standard();
        let (a, b, c) = ids();
        let mut set = ConstraintSet::new();
        set.add(NewConstraint::must_sit_together(a, b)).unwrap();
        set.add(NewConstraint::preferred_area(c)).unwrap();

        let mut seating = SeatingMap::new();
        seating.assign(a, "left-0");
        seating.assign(c, "left-1");
        assert!(validate(&seating, &set, &layout).is_empty());
    }

    #[test]
    fn all_violations_are_reported() {
        let layout = Layout::standard();
        let (a, b, c) = ids();
        let mut set = ConstraintSet::new();
        set.add(NewConstraint::cannot_sit_together(a, b)).unwrap();
        set.add(NewConstraint::cannot_sit_together(b, c)).unwrap();

        let mut seating = SeatingMap::new();
        seating.assign(a, "left-0");
        seating.assign(b, "left-1");
        seating.assign(c, "left-2");
        assert_eq!(validate(&seating, &set, &layout).len(), 2);
    }
}
