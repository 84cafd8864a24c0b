/// Stable student identifier, assigned when the student is added.
pub type StudentId = uuid::Uuid;

/// Constraint identifier, assigned when the constraint is created.
pub type ConstraintId = uuid::Uuid;

/// Desk identifier, unique within a layout (`"<section>-<index>"` for grid desks).
pub type DeskId = String;

/// Section name, e.g. `"left"`, `"middle"`, `"right"`.
pub type SectionId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
