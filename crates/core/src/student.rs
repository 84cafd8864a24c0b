//! Student records, attendance, and per-student seating preferences.
//!
//! Names are display attributes only. Every relation (seating, constraints,
//! partner preferences) refers to students by [`StudentId`].

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{SectionId, StudentId, Timestamp};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum allowed length (in characters) for a student name.
pub const MAX_STUDENT_NAME_LENGTH: usize = 100;

/// Section weight used when a student has not configured one.
pub const DEFAULT_SECTION_WEIGHT: f64 = 1.0;

/// Each preferred partner raises a student's placement priority by this much.
pub const PARTNER_PRIORITY_FACTOR: f64 = 0.5;

// ---------------------------------------------------------------------------
// Attendance
// ---------------------------------------------------------------------------

/// Attendance state. Only [`Attendance::Present`] students are seated by the
/// engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Attendance {
    #[default]
    Present,
    Absent,
    Late,
}

impl Attendance {
    pub fn as_str(self) -> &'static str {
        match self {
            Attendance::Present => "present",
            Attendance::Absent => "absent",
            Attendance::Late => "late",
        }
    }
}

impl fmt::Display for Attendance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Attendance {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "present" => Ok(Attendance::Present),
            "absent" => Ok(Attendance::Absent),
            "late" => Ok(Attendance::Late),
            other => Err(CoreError::Validation(format!(
                "Invalid attendance '{other}'. Must be one of: present, absent, late"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Preferences
// ---------------------------------------------------------------------------

/// Per-student placement preferences consumed by the weighted engine path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub preferred_partners: BTreeSet<StudentId>,
    pub avoid_partners: BTreeSet<StudentId>,
    pub section_preference: Option<SectionId>,
    pub section_weight: f64,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            preferred_partners: BTreeSet::new(),
            avoid_partners: BTreeSet::new(),
            section_preference: None,
            section_weight: DEFAULT_SECTION_WEIGHT,
        }
    }
}

impl Preferences {
    /// Returns `true` if any preference would influence placement.
    pub fn is_set(&self) -> bool {
        !self.preferred_partners.is_empty()
            || !self.avoid_partners.is_empty()
            || self.section_preference.is_some()
    }

    /// Greedy placement priority: more constrained students go first.
    pub fn priority(&self) -> f64 {
        self.section_weight + PARTNER_PRIORITY_FACTOR * self.preferred_partners.len() as f64
    }
}

// ---------------------------------------------------------------------------
// Student
// ---------------------------------------------------------------------------

/// A student on the roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub name: String,
    #[serde(default)]
    pub attendance: Attendance,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub preferences: Preferences,
    pub created_at: Timestamp,
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
}

impl Student {
    pub fn is_present(&self) -> bool {
        self.attendance == Attendance::Present
    }
}

/// Input for adding a student. The id and timestamps are assigned by the
/// roster.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewStudent {
    pub name: String,
    #[serde(default)]
    pub attendance: Attendance,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub preferences: Preferences,
}

impl NewStudent {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_attendance(mut self, attendance: Attendance) -> Self {
        self.attendance = attendance;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn with_preferences(mut self, preferences: Preferences) -> Self {
        self.preferences = preferences;
        self
    }
}

/// Partial update applied in place by [`Roster::update`](crate::roster::Roster::update).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudentUpdate {
    pub name: Option<String>,
    pub attendance: Option<Attendance>,
    pub notes: Option<String>,
    pub preferences: Option<Preferences>,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a student name: non-empty after trimming and within
/// [`MAX_STUDENT_NAME_LENGTH`] characters.
pub fn validate_student_name(name: &str) -> Result<(), CoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(
            "Student name must not be empty".to_string(),
        ));
    }
    let len = trimmed.chars().count();
    if len > MAX_STUDENT_NAME_LENGTH {
        return Err(CoreError::Validation(format!(
            "Student name must not exceed {MAX_STUDENT_NAME_LENGTH} characters, got {len}"
        )));
    }
    Ok(())
}

/// Validate preferences for the student `owner`.
pub fn validate_preferences(owner: StudentId, preferences: &Preferences) -> Result<(), CoreError> {
    if !preferences.section_weight.is_finite() || preferences.section_weight <= 0.0 {
        return Err(CoreError::Validation(format!(
            "Section weight must be a positive number, got {}",
            preferences.section_weight
        )));
    }
    if preferences.preferred_partners.contains(&owner) || preferences.avoid_partners.contains(&owner)
    {
        return Err(CoreError::Validation(
            "A student cannot list themselves as a partner".to_string(),
        ));
    }
    if let Some(both) = preferences
        .preferred_partners
        .intersection(&preferences.avoid_partners)
        .next()
    {
        return Err(CoreError::Validation(format!(
            "Student {both} is both a preferred and an avoided partner"
        )));
    }
    if let Some(section) = &preferences.section_preference {
        if section.trim().is_empty() {
            return Err(CoreError::Validation(
                "Section preference must not be blank".to_string(),
            ));
        }
    }
    Ok(())
}
