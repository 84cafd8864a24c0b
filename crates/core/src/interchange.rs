//! Import and export of classroom data.
//!
//! Exports: a JSON [`ExportBundle`] (students, seating, constraints), a full
//! [`Backup`] of the classroom state, and lossy CSV / plain-text projections.
//! Imports accept JSON (a bundle or a bare list of names), CSV with a name
//! column, or loose text, and merge into an existing classroom by student
//! name.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use chrono::Utc;
use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::classroom::{Applied, Classroom, ClassroomState, Command, DispatchOutcome};
use crate::constraint::{Constraint, ConstraintKind, NewConstraint};
use crate::error::CoreError;
use crate::history::{HistoryConfig, HistoryLog};
use crate::layout::Layout;
use crate::roster::Roster;
use crate::seating::SeatingMap;
use crate::student::{
    Attendance, NewStudent, Preferences, Student, StudentUpdate, DEFAULT_SECTION_WEIGHT,
};
use crate::types::{DeskId, SectionId, StudentId, Timestamp};

/// Format version written into bundles and backups.
pub const FORMAT_VERSION: &str = "1.0";

static NUMBERED_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\s*").expect("valid regex"));

static ATTENDANCE_SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\((present|absent|late)\)$").expect("valid regex"));

/// Headings and labels written by the text exports that never name a
/// student.
const TEXT_HEADINGS: &[&str] = &["student list", "seating chart"];
const TEXT_LABELS: &[&str] = &["attendance", "notes", "total students", "total seated", "generated"];

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

/// Students, seating, and constraints of a classroom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportBundle {
    pub version: String,
    pub exported_at: Timestamp,
    pub active_layout: String,
    pub students: Vec<Student>,
    pub seating: SeatingMap,
    pub constraints: Vec<Constraint>,
}

impl ExportBundle {
    pub fn from_classroom(classroom: &Classroom) -> Self {
        Self {
            version: FORMAT_VERSION.to_string(),
            exported_at: Utc::now(),
            active_layout: classroom.layouts().active_key().to_string(),
            students: classroom.roster().students().to_vec(),
            seating: classroom.seating().clone(),
            constraints: classroom.constraints().as_slice().to_vec(),
        }
    }

    pub fn to_json(&self) -> Result<String, CoreError> {
        serde_json::to_string_pretty(self).map_err(|e| CoreError::Internal(e.to_string()))
    }
}

/// Complete classroom state, layouts and preferences included. History is
/// not part of a backup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Backup {
    pub version: String,
    pub timestamp: Timestamp,
    pub data: ClassroomState,
}

impl Backup {
    pub fn capture(classroom: &Classroom) -> Self {
        Self {
            version: FORMAT_VERSION.to_string(),
            timestamp: Utc::now(),
            data: classroom.state().clone(),
        }
    }

    pub fn to_json(&self) -> Result<String, CoreError> {
        serde_json::to_string_pretty(self).map_err(|e| CoreError::Internal(e.to_string()))
    }

    pub fn from_json(content: &str) -> Result<Self, CoreError> {
        let backup: Backup = serde_json::from_str(content)
            .map_err(|e| CoreError::Validation(format!("Invalid backup file: {e}")))?;
        if backup.version != FORMAT_VERSION {
            tracing::warn!(version = %backup.version, "Restoring backup written by a different format version");
        }
        Ok(backup)
    }

    /// Rebuild a classroom with an empty history.
    pub fn restore(self, config: HistoryConfig) -> Classroom {
        Classroom::from_parts(self.data, HistoryLog::new(config))
    }
}

/// Roster as CSV: `Name,Attendance,Notes`.
pub fn students_to_csv(roster: &Roster) -> Result<String, CoreError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["Name", "Attendance", "Notes"]).map_err(csv_error)?;
    for student in roster.students() {
        writer
            .write_record([student.name.as_str(), student.attendance.as_str(), student.notes.as_str()])
            .map_err(csv_error)?;
    }
    finish_csv(writer)
}

/// Seating as CSV: `Desk ID,Student Name,Attendance,Notes`, ordered by desk.
pub fn seating_to_csv(seating: &SeatingMap, roster: &Roster) -> Result<String, CoreError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(["Desk ID", "Student Name", "Attendance", "Notes"])
        .map_err(csv_error)?;
    for (desk, student_id) in seating.iter() {
        let student = roster.get(*student_id);
        writer
            .write_record([
                desk.as_str(),
                student.map_or("", |s| s.name.as_str()),
                student.map_or(Attendance::Present, |s| s.attendance).as_str(),
                student.map_or("", |s| s.notes.as_str()),
            ])
            .map_err(csv_error)?;
    }
    finish_csv(writer)
}

fn finish_csv(writer: csv::Writer<Vec<u8>>) -> Result<String, CoreError> {
    let bytes = writer
        .into_inner()
        .map_err(|e| CoreError::Internal(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| CoreError::Internal(e.to_string()))
}

fn csv_error(e: csv::Error) -> CoreError {
    CoreError::Internal(format!("CSV write failed: {e}"))
}

/// Numbered roster listing.
pub fn students_to_text(roster: &Roster) -> String {
    let mut lines = vec!["Student List".to_string(), "============".to_string(), String::new()];
    for (i, student) in roster.students().iter().enumerate() {
        lines.push(format!("{}. {}", i + 1, student.name));
        if student.attendance != Attendance::Present {
            lines.push(format!("   Attendance: {}", student.attendance));
        }
        if !student.notes.is_empty() {
            lines.push(format!("   Notes: {}", student.notes));
        }
        lines.push(String::new());
    }
    lines.push(format!("Total Students: {}", roster.len()));
    lines.push(format!("Generated: {}", Utc::now().format("%Y-%m-%d %H:%M")));
    lines.join("\n")
}

/// Seating chart grouped by section in layout order.
pub fn seating_to_text(seating: &SeatingMap, roster: &Roster, layout: &Layout) -> String {
    let mut lines = vec!["Seating Chart".to_string(), "=============".to_string(), String::new()];
    for section in layout.sections() {
        let seated: Vec<String> = layout
            .desks
            .iter()
            .filter(|d| d.section == section)
            .filter_map(|desk| {
                let student = seating.student_at(&desk.id)?;
                let (name, attendance) = roster
                    .get(student)
                    .map_or(("unknown student", Attendance::Present), |s| (s.name.as_str(), s.attendance));
                let status = match attendance {
                    Attendance::Present => String::new(),
                    other => format!(" ({other})"),
                };
                Some(format!("  {}: {name}{status}", desk.id))
            })
            .collect();
        if seated.is_empty() {
            continue;
        }
        lines.push(format!("{}:", section.to_uppercase()));
        lines.extend(seated);
        lines.push(String::new());
    }
    lines.push(format!("Total Seated: {}", seating.len()));
    lines.push(format!("Generated: {}", Utc::now().format("%Y-%m-%d %H:%M")));
    lines.join("\n")
}

// ---------------------------------------------------------------------------
// Import parsing
// ---------------------------------------------------------------------------

/// A student record from an import file. `id` is the id in the exporting
/// classroom and is only used to resolve seating and constraint references.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ImportedStudent {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub attendance: Attendance,
    #[serde(default)]
    pub notes: String,
    /// Absent in name lists and CSV; existing preferences are then kept.
    #[serde(default)]
    pub preferences: Option<ImportedPreferences>,
}

impl ImportedStudent {
    fn named(name: &str) -> Self {
        Self {
            id: None,
            name: name.trim().to_string(),
            attendance: Attendance::Present,
            notes: String::new(),
            preferences: None,
        }
    }
}

/// Placement preferences from an import file. Partner references are ids
/// from the exporting classroom or plain names.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ImportedPreferences {
    pub preferred_partners: Vec<String>,
    pub avoid_partners: Vec<String>,
    pub section_preference: Option<SectionId>,
    pub section_weight: f64,
}

impl Default for ImportedPreferences {
    fn default() -> Self {
        Self {
            preferred_partners: Vec::new(),
            avoid_partners: Vec::new(),
            section_preference: None,
            section_weight: DEFAULT_SECTION_WEIGHT,
        }
    }
}

/// A constraint from an import file. Student references are ids from the
/// exporting classroom or plain names.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ImportedConstraint {
    #[serde(rename = "type")]
    pub kind: ConstraintKind,
    pub student1: String,
    #[serde(default)]
    pub student2: Option<String>,
}

/// Parsed import content, not yet applied.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ImportData {
    pub students: Vec<ImportedStudent>,
    /// Desk → student reference (id or name).
    #[serde(default)]
    pub seating: BTreeMap<DeskId, String>,
    #[serde(default)]
    pub constraints: Vec<ImportedConstraint>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonImport {
    Names(Vec<String>),
    Bundle(ImportData),
}

/// Parse a JSON export bundle or a plain array of names.
pub fn parse_json(content: &str) -> Result<ImportData, CoreError> {
    let parsed: JsonImport = serde_json::from_str(content)
        .map_err(|e| CoreError::Validation(format!("Invalid JSON import: {e}")))?;
    Ok(match parsed {
        JsonImport::Names(names) => ImportData {
            students: names
                .iter()
                .filter(|n| !n.trim().is_empty())
                .map(|n| ImportedStudent::named(n))
                .collect(),
            ..Default::default()
        },
        JsonImport::Bundle(data) => data,
    })
}

/// Parse CSV with a header row. The first column whose header contains
/// "name" holds names; optional `attendance` and `notes` columns are read.
pub fn parse_csv(content: &str) -> Result<ImportData, CoreError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());
    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| CoreError::Validation(format!("Invalid CSV import: {e}")))?
        .iter()
        .map(str::to_lowercase)
        .collect();
    let column = |label: &str| headers.iter().position(|h| h == label);
    let name_col = headers
        .iter()
        .position(|h| h.contains("name"))
        .ok_or_else(|| CoreError::Validation("CSV file must have a \"Name\" column".to_string()))?;
    let attendance_col = column("attendance");
    let notes_col = column("notes");

    let mut students = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| CoreError::Validation(format!("Invalid CSV import: {e}")))?;
        let Some(name) = record.get(name_col).filter(|n| !n.is_empty()) else {
            continue;
        };
        let attendance = attendance_col
            .and_then(|i| record.get(i))
            .filter(|v| !v.is_empty())
            .map(|v| {
                v.parse().unwrap_or_else(|_| {
                    tracing::warn!(value = v, student = name, "Unknown attendance value, using present");
                    Attendance::Present
                })
            })
            .unwrap_or_default();
        students.push(ImportedStudent {
            id: None,
            name: name.to_string(),
            attendance,
            notes: notes_col.and_then(|i| record.get(i)).unwrap_or_default().to_string(),
            preferences: None,
        });
    }
    if students.is_empty() {
        return Err(CoreError::Validation(
            "CSV file must have a header and at least one data row".to_string(),
        ));
    }
    Ok(ImportData {
        students,
        ..Default::default()
    })
}

/// Extract names from loose text: numbered lists, `label: name` lines (as in
/// the seating chart export), or one name per line.
pub fn parse_text(content: &str) -> ImportData {
    let students = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.contains('='))
        .filter(|line| !TEXT_HEADINGS.contains(&line.to_lowercase().as_str()))
        .filter_map(|line| {
            if NUMBERED_LINE_RE.is_match(line) {
                let name = NUMBERED_LINE_RE.replace(line, "");
                return (!name.trim().is_empty()).then(|| name.trim().to_string());
            }
            if let Some((label, value)) = line.split_once(':') {
                let label = label.trim().to_lowercase();
                if TEXT_LABELS.contains(&label.as_str()) {
                    return None;
                }
                let name = ATTENDANCE_SUFFIX_RE.replace(value.trim(), "");
                return (!name.is_empty()).then(|| name.to_string());
            }
            Some(line.to_string())
        })
        .map(|name| ImportedStudent::named(&name))
        .collect();
    ImportData {
        students,
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// Import application
// ---------------------------------------------------------------------------

/// Counts and per-command outcomes of an applied import.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportReport {
    pub added: usize,
    pub updated: usize,
    pub seated: usize,
    /// Students whose placement preferences were replaced.
    pub preferences_set: usize,
    pub constraints_added: usize,
    /// Records that could not be applied (invalid, duplicate, unresolved).
    pub skipped: usize,
    pub outcomes: Vec<DispatchOutcome>,
}

impl ImportReport {
    pub fn changed_anything(&self) -> bool {
        self.added + self.updated + self.seated + self.preferences_set + self.constraints_added > 0
    }
}

impl Classroom {
    /// Merge imported data by name: existing students get attendance and
    /// notes updated, unknown names are added. Preferences, seating, and
    /// constraints are then resolved against the merged roster. Each change
    /// is its own history entry.
    pub fn import<R: Rng + ?Sized>(&mut self, data: ImportData, rng: &mut R) -> Result<ImportReport, CoreError> {
        let mut report = ImportReport::default();

        // Imported id (or name) → local id.
        let mut resolved: BTreeMap<String, StudentId> = BTreeMap::new();
        let mut pending_preferences: Vec<(StudentId, ImportedPreferences)> = Vec::new();

        for imported in data.students {
            let name = imported.name.trim().to_string();
            let existing = self.roster().get_by_name(&name).map(|s| s.id);
            let command = match existing {
                Some(id) => Command::UpdateStudent {
                    id,
                    update: StudentUpdate {
                        attendance: Some(imported.attendance),
                        notes: Some(imported.notes.clone()),
                        ..Default::default()
                    },
                },
                None => Command::AddStudent(
                    NewStudent::named(name.clone())
                        .with_attendance(imported.attendance)
                        .with_notes(imported.notes.clone()),
                ),
            };
            match self.dispatch(command, rng) {
                Ok(outcome) => {
                    if existing.is_some() {
                        report.updated += 1;
                    } else {
                        report.added += 1;
                    }
                    report.outcomes.push(outcome);
                }
                Err(CoreError::Validation(reason)) => {
                    tracing::warn!(student = %name, %reason, "Skipping imported student");
                    report.skipped += 1;
                    continue;
                }
                Err(e) => return Err(e),
            }
            if let Some(local) = self.roster().get_by_name(&name).map(|s| s.id) {
                resolved.insert(name.to_lowercase(), local);
                if let Some(id) = imported.id {
                    resolved.insert(id, local);
                }
                if let Some(preferences) = imported.preferences {
                    pending_preferences.push((local, preferences));
                }
            }
        }

        let lookup = |reference: &str, classroom: &Classroom| -> Option<StudentId> {
            resolved
                .get(reference)
                .or_else(|| resolved.get(&reference.trim().to_lowercase()))
                .copied()
                .or_else(|| classroom.roster().get_by_name(reference).map(|s| s.id))
        };

        let resolve_all = |references: &[String], classroom: &Classroom| -> BTreeSet<StudentId> {
            references
                .iter()
                .filter_map(|reference| {
                    let found = lookup(reference, classroom);
                    if found.is_none() {
                        tracing::warn!(partner = %reference, "Imported preference references an unknown student");
                    }
                    found
                })
                .collect()
        };

        for (owner, imported) in pending_preferences {
            let preferences = Preferences {
                preferred_partners: resolve_all(&imported.preferred_partners, &*self),
                avoid_partners: resolve_all(&imported.avoid_partners, &*self),
                section_preference: imported.section_preference,
                section_weight: imported.section_weight,
            };
            if self.roster().get(owner).map(|s| &s.preferences) == Some(&preferences) {
                continue;
            }
            match self.dispatch(Command::SetPreferences { id: owner, preferences }, rng) {
                Ok(outcome) => {
                    if matches!(outcome.applied, Applied::Recorded { .. }) {
                        report.preferences_set += 1;
                    }
                    report.outcomes.push(outcome);
                }
                Err(CoreError::Validation(reason)) => {
                    tracing::warn!(student = %owner, %reason, "Skipping imported preferences");
                    report.skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }

        if !data.seating.is_empty() {
            let mut seating = self.seating().clone();
            let mut placed: Vec<(DeskId, StudentId)> = Vec::new();
            for (desk, reference) in &data.seating {
                match lookup(reference, &*self) {
                    Some(student) => {
                        seating.assign(student, desk.clone());
                        placed.push((desk.clone(), student));
                    }
                    None => {
                        tracing::warn!(%desk, student = %reference, "Imported seat references an unknown student");
                        report.skipped += 1;
                    }
                }
            }
            let outcome = self.dispatch(Command::ImportSeating(seating), rng)?;
            // Seats on desks missing from the active layout are dropped by
            // the dispatch, as are seats a later record moved the student off.
            let kept = placed
                .iter()
                .filter(|(desk, student)| self.seating().student_at(desk) == Some(*student))
                .count();
            report.skipped += placed.len() - kept;
            report.seated = if outcome.is_noop() { 0 } else { kept };
            report.outcomes.push(outcome);
        }

        for imported in data.constraints {
            let student1 = lookup(&imported.student1, &*self);
            let student2 = match imported.student2.as_deref() {
                Some(reference) => lookup(reference, &*self).map(Some),
                None => Some(None),
            };
            let (Some(student1), Some(student2)) = (student1, student2) else {
                tracing::warn!(kind = imported.kind.as_str(), "Imported constraint references an unknown student");
                report.skipped += 1;
                continue;
            };
            let input = NewConstraint {
                kind: imported.kind,
                student1,
                student2,
            };
            match self.dispatch(Command::AddConstraint(input), rng) {
                Ok(outcome) => {
                    if matches!(outcome.applied, Applied::Recorded { .. }) {
                        report.constraints_added += 1;
                    }
                    report.outcomes.push(outcome);
                }
                Err(CoreError::Validation(reason)) => {
                    tracing::debug!(%reason, "Skipping imported constraint");
                    report.skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }

        tracing::info!(
            added = report.added,
            updated = report.updated,
            seated = report.seated,
            preferences = report.preferences_set,
            constraints = report.constraints_added,
            skipped = report.skipped,
            "Import applied"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(1)
    }

    fn classroom(names: &[&str]) -> Classroom {
        let mut c = Classroom::default();
        for name in names {
            c.dispatch(Command::AddStudent(NewStudent::named(*name)), &mut rng())
                .unwrap();
        }
        c
    }

    fn id(c: &Classroom, name: &str) -> StudentId {
        c.roster().get_by_name(name).unwrap().id
    }

    // -----------------------------------------------------------------------
    // Export
    // -----------------------------------------------------------------------

    #[test]
    fn students_csv_quotes_commas() {
        let mut c = classroom(&["Ann"]);
        let ann = id(&c, "Ann");
        c.dispatch(
            Command::UpdateStudent {
                id: ann,
                update: StudentUpdate {
                    notes: Some("front row, left".into()),
                    attendance: Some(Attendance::Late),
                    ..Default::default()
                },
            },
            &mut rng(),
        )
        .unwrap();
        let csv = students_to_csv(c.roster()).unwrap();
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines[0], "Name,Attendance,Notes");
        assert_eq!(lines[1], "Ann,late,\"front row, left\"");
    }

    #[test]
    fn seating_text_groups_by_section() {
        let mut c = classroom(&["Ann", "Bob"]);
        let (ann, bob) = (id(&c, "Ann"), id(&c, "Bob"));
        c.dispatch(Command::AssignSeat { student: ann, desk: "right-3".into() }, &mut rng())
            .unwrap();
        c.dispatch(Command::AssignSeat { student: bob, desk: "left-3".into() }, &mut rng())
            .unwrap();
        let text = seating_to_text(c.seating(), c.roster(), c.active_layout());
        let left = text.find("LEFT:").unwrap();
        let right = text.find("RIGHT:").unwrap();
        assert!(left < right);
        assert!(text.contains("  left-3: Bob"));
        assert!(!text.contains("MIDDLE:"));
        assert!(text.contains("Total Seated: 2"));
    }

    #[test]
    fn backup_restores_state_without_history() {
        let mut c = classroom(&["Ann", "Bob"]);
        c.dispatch(Command::GenerateSeating, &mut rng()).unwrap();
        let json = Backup::capture(&c).to_json().unwrap();
        let restored = Backup::from_json(&json).unwrap().restore(HistoryConfig::default());
        assert_eq!(restored.state(), c.state());
        assert!(restored.history().is_empty());
        assert_matches!(Backup::from_json("{}"), Err(CoreError::Validation(_)));
    }

    // -----------------------------------------------------------------------
    // Parsing
    // -----------------------------------------------------------------------

    #[test]
    fn json_accepts_plain_name_list() {
        let data = parse_json(r#"["Ann", " ", "Bob"]"#).unwrap();
        let names: Vec<_> = data.students.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Ann", "Bob"]);
        assert_matches!(parse_json(r#"{"nope": 1}"#), Err(CoreError::Validation(_)));
    }

    #[test]
    fn csv_requires_name_column() {
        assert_matches!(parse_csv("Desk,Notes\na,b\n"), Err(CoreError::Validation(_)));
        assert_matches!(parse_csv("Name\n"), Err(CoreError::Validation(_)));

        let data = parse_csv("Name,Attendance,Notes\nAnn,absent,\nBob,,glasses\n,,\n").unwrap();
        assert_eq!(data.students.len(), 2);
        assert_eq!(data.students[0].attendance, Attendance::Absent);
        assert_eq!(data.students[1].attendance, Attendance::Present);
        assert_eq!(data.students[1].notes, "glasses");
    }

    #[test]
    fn text_export_parses_back_to_names() {
        let mut c = classroom(&["Ann", "Bob"]);
        let bob = id(&c, "Bob");
        c.dispatch(
            Command::UpdateStudent {
                id: bob,
                update: StudentUpdate {
                    attendance: Some(Attendance::Absent),
                    notes: Some("allergic".into()),
                    ..Default::default()
                },
            },
            &mut rng(),
        )
        .unwrap();
        let data = parse_text(&students_to_text(c.roster()));
        let names: Vec<_> = data.students.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Ann", "Bob"]);
    }

    #[test]
    fn seating_text_parses_back_to_names() {
        let mut c = classroom(&["Ann"]);
        let ann = id(&c, "Ann");
        c.dispatch(Command::AssignSeat { student: ann, desk: "left-0".into() }, &mut rng())
            .unwrap();
        c.dispatch(
            Command::UpdateStudent {
                id: ann,
                update: StudentUpdate {
                    attendance: Some(Attendance::Late),
                    ..Default::default()
                },
            },
            &mut rng(),
        )
        .unwrap();
        let text = seating_to_text(c.seating(), c.roster(), c.active_layout());
        let data = parse_text(&text);
        let names: Vec<_> = data.students.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Ann"]);
    }

    // -----------------------------------------------------------------------
    // Applying imports
    // -----------------------------------------------------------------------

    #[test]
    fn import_merges_by_name() {
        let mut c = classroom(&["Ann"]);
        let data = parse_csv("Name,Attendance,Notes\nann,late,moved\nBob,present,\n").unwrap();
        let report = c.import(data, &mut rng()).unwrap();
        assert_eq!((report.added, report.updated), (1, 1));
        assert_eq!(c.roster().len(), 2);
        let ann = c.roster().get_by_name("Ann").unwrap();
        assert_eq!(ann.attendance, Attendance::Late);
        assert_eq!(ann.notes, "moved");
        assert_eq!(c.history().len(), 3);
    }

    #[test]
    fn bundle_round_trips_into_an_empty_classroom() {
        let mut source = classroom(&["Ann", "Bob", "Cal"]);
        let (ann, bob, cal) = (id(&source, "Ann"), id(&source, "Bob"), id(&source, "Cal"));
        source
            .dispatch(Command::AddConstraint(NewConstraint::cannot_sit_together(ann, bob)), &mut rng())
            .unwrap();
        source
            .dispatch(
                Command::SetPreferences {
                    id: ann,
                    preferences: Preferences {
                        preferred_partners: BTreeSet::from([cal]),
                        avoid_partners: BTreeSet::from([bob]),
                        section_preference: Some("right".into()),
                        section_weight: 2.0,
                    },
                },
                &mut rng(),
            )
            .unwrap();
        source.dispatch(Command::GenerateSeating, &mut rng()).unwrap();
        let json = ExportBundle::from_classroom(&source).to_json().unwrap();

        let mut target = Classroom::default();
        let report = target.import(parse_json(&json).unwrap(), &mut rng()).unwrap();
        assert_eq!(report.added, 3);
        assert_eq!(report.preferences_set, 1);
        assert_eq!(report.seated, 3);
        assert_eq!(report.constraints_added, 1);
        assert_eq!(report.skipped, 0);

        let prefs = &target.roster().get_by_name("Ann").unwrap().preferences;
        let local_bob = target.roster().get_by_name("Bob").unwrap().id;
        let local_cal = target.roster().get_by_name("Cal").unwrap().id;
        assert_eq!(prefs.preferred_partners, BTreeSet::from([local_cal]));
        assert_eq!(prefs.avoid_partners, BTreeSet::from([local_bob]));
        assert_eq!(prefs.section_preference.as_deref(), Some("right"));
        assert_eq!(prefs.section_weight, 2.0);
        assert!(!target.roster().get_by_name("Bob").unwrap().preferences.is_set());

        // Ids differ between classrooms; names and desks line up.
        for (desk, student) in source.seating().iter() {
            let name = source.roster().name_of(*student).unwrap();
            let local = target.seating().student_at(desk).unwrap();
            assert_eq!(target.roster().name_of(local), Some(name));
        }
        assert!(target.roster().get(ann).is_none());
    }

    #[test]
    fn import_skips_unresolvable_references() {
        let mut c = classroom(&["Ann"]);
        let json = r#"{
            "students": [{"name": "Bob"}],
            "seating": {"left-0": "Bob", "left-1": "Zed"},
            "constraints": [
                {"type": "must-sit-together", "student1": "Ann", "student2": "Bob"},
                {"type": "cannot-sit-together", "student1": "Ann", "student2": "Zed"}
            ]
        }"#;
        let report = c.import(parse_json(json).unwrap(), &mut rng()).unwrap();
        assert_eq!(report.added, 1);
        assert_eq!(report.seated, 1);
        assert_eq!(report.constraints_added, 1);
        assert_eq!(report.skipped, 2);
        assert!(report.changed_anything());
    }

    #[test]
    fn seats_on_unknown_desks_are_not_counted() {
        let mut c = classroom(&["Ann", "Bob", "Cal"]);
        let json = r#"{
            "students": [],
            "seating": {"middle-0": "Ann", "right-0": "Bob", "back-9": "Cal"}
        }"#;
        let report = c.import(parse_json(json).unwrap(), &mut rng()).unwrap();
        assert_eq!(c.seating().len(), 2);
        assert_eq!(report.seated, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(c.seating().student_at("middle-0"), Some(id(&c, "Ann")));
        assert_eq!(c.seating().student_at("right-0"), Some(id(&c, "Bob")));
    }

    #[test]
    fn preferences_accept_partner_names_and_skip_unknown_ones() {
        let mut c = classroom(&["Ann", "Bob"]);
        let json = r#"{
            "students": [{
                "name": "Ann",
                "preferences": {"preferred_partners": ["bob", "Zed"], "section_preference": "left"}
            }]
        }"#;
        let report = c.import(parse_json(json).unwrap(), &mut rng()).unwrap();
        assert_eq!((report.updated, report.preferences_set), (1, 1));
        let prefs = &c.roster().get_by_name("Ann").unwrap().preferences;
        assert_eq!(prefs.preferred_partners, BTreeSet::from([id(&c, "Bob")]));
        assert_eq!(prefs.section_weight, 1.0);

        // Re-importing the same preferences records nothing new.
        let entries = c.history().len();
        let report = c.import(parse_json(json).unwrap(), &mut rng()).unwrap();
        assert_eq!(report.preferences_set, 0);
        assert_eq!(c.history().len(), entries + 1);
    }
}
